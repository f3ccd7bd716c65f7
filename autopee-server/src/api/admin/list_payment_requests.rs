use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use autopee_core::entities::payment_requests::ListPaymentRequests;
use autopee_core::utils::clock;
use autopee_sdk::objects::admin::ListPaymentRequestsQuery;
use autopee_sdk::objects::clamp_pagination;
use kanau::processor::Processor;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, payment_request_to_admin_response};

/// `GET /payment-requests`: list payment requests, newest first.
pub async fn list_payment_requests(
    state: State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ListPaymentRequestsQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let requests = state
        .processor()
        .process(ListPaymentRequests {
            limit,
            offset,
            status: query.status.map(Into::into),
            user_id: query.user_id,
        })
        .await
        .map_err(AdminApiError::Database)?;

    let now = clock::utc_now();
    Ok(Json(
        requests
            .iter()
            .map(|r| payment_request_to_admin_response(r, now))
            .collect::<Vec<_>>(),
    ))
}
