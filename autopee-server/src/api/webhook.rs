//! SePay webhook receiver.
//!
//! `POST /sepay` acknowledges with `201` once the transaction is settled and
//! `200` for a delivery that was already processed. Any failure answers `500`
//! so SePay retries; the retry reprocesses the stored transaction.

use autopee_core::processor::{IngestOutcome, ProcessError};
use autopee_core::utils::clock;
use autopee_sdk::objects::{SepayWebhookPayload, WebhookAck};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use super::extractors::SepayApiKey;
use super::internal_error;
use crate::state::AppState;

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route("/sepay", post(sepay_webhook))
}

async fn sepay_webhook(
    state: State<AppState>,
    _key: SepayApiKey,
    Json(payload): Json<SepayWebhookPayload>,
) -> Result<impl IntoResponse, WebhookError> {
    tracing::info!(
        provider_id = payload.id,
        gateway = %payload.gateway,
        transfer_type = %payload.transfer_type,
        amount = %payload.transfer_amount,
        "SePay delivery received"
    );

    match state.transactions.ingest(&payload, clock::utc_now()).await? {
        IngestOutcome::Duplicate { .. } => Ok((StatusCode::OK, Json(WebhookAck::duplicate()))),
        IngestOutcome::Processed(_) => Ok((StatusCode::CREATED, Json(WebhookAck::ok()))),
    }
}

#[derive(Debug)]
struct WebhookError(ProcessError);

impl From<ProcessError> for WebhookError {
    fn from(err: ProcessError) -> Self {
        WebhookError(err)
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        internal_error("Webhook", &self.0)
    }
}
