use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use autopee_core::entities::users::GetUserById;
use autopee_core::utils::clock;
use autopee_sdk::objects::admin::AdminUserResponse;
use kanau::processor::Processor;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `GET /users/{user_id}`: a user and their wallet balance.
pub async fn show_user(
    state: State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    let user = state
        .processor()
        .process(GetUserById { id: user_id })
        .await
        .map_err(AdminApiError::Database)?
        .ok_or(AdminApiError::NotFound("user"))?;

    Ok(Json(AdminUserResponse {
        user_id: user.id,
        email: user.email,
        balance: user.wallet_balance,
        created_at: clock::unix(user.created_at),
    }))
}
