//! Admin API handlers.
//!
//! These endpoints are called by the admin dashboard and require the
//! `Autopee-Admin-Authorization` header with the plaintext admin secret.
//!
//! # Endpoints
//!
//! - `GET  /transactions`                  - list transactions (paginated, filterable)
//! - `GET  /payment-requests`              - list payment requests (paginated, filterable)
//! - `POST /transactions/{id}/reconcile`   - assign an unresolved transfer to a user
//! - `GET  /users/{user_id}`               - user and wallet balance

use autopee_core::entities::payment_requests::PaymentRequest;
use autopee_core::entities::transactions::TransactionRecord;
use autopee_core::ledger::LedgerError;
use autopee_core::processor::ProcessError;
use autopee_core::utils::clock;
use autopee_sdk::objects::admin::{AdminPaymentRequestResponse, AdminTransactionResponse};
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use super::{error_response, internal_error};
use crate::state::AppState;

mod list_payment_requests;
mod list_transactions;
mod reconcile;
mod show_user;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions::list_transactions),
        )
        .route(
            "/payment-requests",
            get(list_payment_requests::list_payment_requests),
        )
        .route(
            "/transactions/{id}/reconcile",
            post(reconcile::reconcile_transaction),
        )
        .route("/users/{user_id}", get(show_user::show_user))
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    Database(sqlx::Error),
    NotFound(&'static str),
    Reconcile(ProcessError),
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> Response {
        match self {
            AdminApiError::Database(e) => internal_error("Admin API", &e),
            AdminApiError::NotFound(what) => error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{what} not found"),
            ),
            AdminApiError::Reconcile(e) => reconcile_error(e),
        }
    }
}

fn reconcile_error(err: ProcessError) -> Response {
    let message = err.to_string();
    match err {
        ProcessError::TransactionNotFound(_)
        | ProcessError::UserNotFound(_)
        | ProcessError::Ledger(LedgerError::UserNotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, "not_found", message)
        }
        ProcessError::Ledger(LedgerError::NotReconcilable(_))
        | ProcessError::Ledger(LedgerError::AlreadyProcessed(_)) => {
            error_response(StatusCode::CONFLICT, "not_reconcilable", message)
        }
        ProcessError::PaymentRequestNotPending(_) | ProcessError::PaymentRequestOwner { .. } => {
            error_response(StatusCode::CONFLICT, "payment_request_mismatch", message)
        }
        ProcessError::Ledger(LedgerError::Database(e)) => internal_error("Admin API", &e),
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub(crate) fn transaction_to_admin_response(t: &TransactionRecord) -> AdminTransactionResponse {
    AdminTransactionResponse {
        id: t.id,
        provider_id: t.provider_id,
        gateway: t.gateway.clone(),
        transaction_date: t.transaction_date.map(clock::bank_unix),
        account_number: t.account_number.clone(),
        code: t.code.clone(),
        content: t.content.clone(),
        transfer_type: t.transfer_type.into(),
        transfer_amount: t.transfer_amount,
        reference_code: t.reference_code.clone(),
        user_id: t.user_id.clone(),
        payment_request_id: t.payment_request_id,
        status: t.status.into(),
        created_at: clock::unix(t.created_at),
        processed_at: t.processed_at.map(clock::unix),
    }
}

pub(crate) fn payment_request_to_admin_response(
    r: &PaymentRequest,
    now: time::PrimitiveDateTime,
) -> AdminPaymentRequestResponse {
    AdminPaymentRequestResponse {
        id: r.id,
        user_id: r.user_id.clone(),
        payment_code: r.payment_code.clone(),
        amount: r.amount,
        status: autopee_core::deposits::effective_status(r, now).into(),
        transaction_id: r.transaction_id,
        created_at: clock::unix(r.created_at),
        expires_at: clock::unix(r.expires_at),
        completed_at: r.completed_at.map(clock::unix),
    }
}
