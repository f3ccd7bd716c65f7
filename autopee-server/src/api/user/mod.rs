//! User API handlers.
//!
//! These endpoints are called by the Autopee frontend or by scripts holding
//! an API token, and require `Authorization: Bearer <token>`.
//!
//! # Endpoints
//!
//! - `POST   /payment/deposit`                        - open a payment request
//! - `GET    /payment/deposit/{payment_code}/status`  - poll a payment request
//! - `POST   /payment/deposit/{payment_code}/cancel`  - cancel a payment request
//! - `GET    /wallet`                                 - balance
//! - `GET    /wallet/transactions`                    - credited transactions
//! - `GET    /wallet/deposits`                        - payment requests
//! - `POST   /tokens`                                 - mint an API token
//! - `GET    /tokens`                                 - list API tokens
//! - `DELETE /tokens/{token_id}`                      - revoke an API token

use autopee_core::deposits::DepositError;
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use super::{error_response, internal_error};
use crate::state::AppState;

mod deposit;
mod tokens;
mod wallet;

/// Build the User API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payment/deposit", post(deposit::create_deposit))
        .route(
            "/payment/deposit/{payment_code}/status",
            get(deposit::deposit_status),
        )
        .route(
            "/payment/deposit/{payment_code}/cancel",
            post(deposit::cancel_deposit),
        )
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/transactions", get(wallet::list_transactions))
        .route("/wallet/deposits", get(wallet::list_deposits))
        .route("/tokens", post(tokens::create_token).get(tokens::list_tokens))
        .route("/tokens/{token_id}", delete(tokens::revoke_token))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in User API handlers.
#[derive(Debug)]
enum UserApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// A deposit lifecycle operation was refused or failed.
    Deposit(DepositError),
    /// The caller has no wallet row yet.
    WalletNotFound,
    /// The token does not exist or belongs to someone else.
    TokenNotFound,
    /// The request body failed validation.
    InvalidRequest(String),
}

impl From<DepositError> for UserApiError {
    fn from(err: DepositError) -> Self {
        UserApiError::Deposit(err)
    }
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        match self {
            UserApiError::Database(e) => internal_error("User API", &e),
            UserApiError::Deposit(DepositError::AmountOutOfRange { min, max }) => error_response(
                StatusCode::BAD_REQUEST,
                "amount_out_of_range",
                format!("amount must be between {min} and {max}"),
            ),
            UserApiError::Deposit(DepositError::NotFound) => error_response(
                StatusCode::NOT_FOUND,
                "deposit_not_found",
                "payment request not found",
            ),
            UserApiError::Deposit(DepositError::NotPending(status)) => error_response(
                StatusCode::CONFLICT,
                "deposit_not_pending",
                format!("payment request is {status}"),
            ),
            UserApiError::Deposit(e) => internal_error("User API", &e),
            UserApiError::WalletNotFound => {
                error_response(StatusCode::NOT_FOUND, "wallet_not_found", "wallet not found")
            }
            UserApiError::TokenNotFound => error_response(
                StatusCode::NOT_FOUND,
                "token_not_found",
                "API token not found",
            ),
            UserApiError::InvalidRequest(message) => {
                error_response(StatusCode::BAD_REQUEST, "invalid_request", message)
            }
        }
    }
}
