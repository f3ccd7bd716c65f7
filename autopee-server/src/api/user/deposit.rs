use autopee_core::deposits::{self, Deposits};
use autopee_core::utils::clock;
use autopee_sdk::objects::CreateDepositRequest;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::UserApiError;
use crate::api::extractors::AuthUser;
use crate::state::AppState;

/// `POST /payment/deposit`: open a payment request.
///
/// Returns the payment code the user must put in the transfer memo, together
/// with the bank account and a VietQR image URL.
pub(super) async fn create_deposit(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateDepositRequest>,
) -> Result<impl IntoResponse, UserApiError> {
    let processor = state.processor();
    let config = state.config.payment.read().await.clone();
    let now = clock::utc_now();

    let request = Deposits::new(&processor)
        .create(&user_id, body.amount, &config, now)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(deposits::to_response(&request, &config, now)?),
    ))
}

/// `GET /payment/deposit/{payment_code}/status`: poll a payment request.
pub(super) async fn deposit_status(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(payment_code): Path<String>,
) -> Result<impl IntoResponse, UserApiError> {
    let processor = state.processor();
    let now = clock::utc_now();

    let request = Deposits::new(&processor)
        .status(&user_id, &payment_code, now)
        .await?;

    let config = state.config.payment.read().await;
    Ok(Json(deposits::to_response(&request, &config, now)?))
}

/// `POST /payment/deposit/{payment_code}/cancel`: cancel a pending request.
///
/// Answers `409` once the request has completed, expired or was cancelled.
pub(super) async fn cancel_deposit(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(payment_code): Path<String>,
) -> Result<impl IntoResponse, UserApiError> {
    let processor = state.processor();
    let now = clock::utc_now();

    let request = Deposits::new(&processor)
        .cancel(&user_id, &payment_code, now)
        .await?;

    let config = state.config.payment.read().await;
    Ok(Json(deposits::to_response(&request, &config, now)?))
}
