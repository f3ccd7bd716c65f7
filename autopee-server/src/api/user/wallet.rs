use autopee_core::deposits::{self, Deposits};
use autopee_core::entities::transactions::ListUserTransactions;
use autopee_core::entities::users::GetUserById;
use autopee_core::utils::clock;
use autopee_sdk::objects::{PageQuery, WalletResponse, WalletTransactionResponse, clamp_pagination};
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use kanau::processor::Processor;

use super::UserApiError;
use crate::api::extractors::AuthUser;
use crate::state::AppState;

/// `GET /wallet`: current balance.
pub(super) async fn get_wallet(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, UserApiError> {
    let user = state
        .processor()
        .process(GetUserById { id: user_id })
        .await
        .map_err(UserApiError::Database)?
        .ok_or(UserApiError::WalletNotFound)?;

    Ok(Json(WalletResponse {
        user_id: user.id,
        balance: user.wallet_balance,
    }))
}

/// `GET /wallet/transactions`: inbound transfers credited to the caller, newest first.
pub(super) async fn list_transactions(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, UserApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let records = state
        .processor()
        .process(ListUserTransactions {
            user_id,
            limit,
            offset,
        })
        .await
        .map_err(UserApiError::Database)?;

    let page: Vec<_> = records
        .into_iter()
        .map(|t| WalletTransactionResponse {
            id: t.id,
            gateway: t.gateway,
            transfer_type: t.transfer_type.into(),
            transfer_amount: t.transfer_amount,
            content: t.content,
            reference_code: t.reference_code,
            transaction_date: t.transaction_date.map(clock::bank_unix),
            processed_at: t.processed_at.map(clock::unix),
        })
        .collect();

    Ok(Json(page))
}

/// `GET /wallet/deposits`: the caller's payment requests, newest first.
pub(super) async fn list_deposits(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, UserApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);
    let processor = state.processor();
    let now = clock::utc_now();

    let requests = Deposits::new(&processor)
        .list(&user_id, limit, offset)
        .await?;

    let config = state.config.payment.read().await;
    let page = requests
        .iter()
        .map(|r| deposits::to_response(r, &config, now))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(page))
}
