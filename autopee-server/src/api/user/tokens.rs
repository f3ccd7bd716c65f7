use autopee_core::entities::api_tokens::{
    ApiToken, ApiTokenInsert, ListUserApiTokens, RevokeApiToken,
};
use autopee_core::utils::{api_token, clock};
use autopee_sdk::objects::token::{CreateTokenRequest, CreatedTokenResponse, TokenResponse};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;
use uuid::Uuid;

use super::UserApiError;
use crate::api::extractors::AuthUser;
use crate::state::AppState;

const MAX_TOKEN_NAME_LEN: usize = 64;

fn to_response(token: &ApiToken) -> TokenResponse {
    TokenResponse {
        id: token.id,
        name: token.name.clone(),
        created_at: clock::unix(token.created_at),
        last_used_at: token.last_used_at.map(clock::unix),
        revoked_at: token.revoked_at.map(clock::unix),
    }
}

/// `POST /tokens`: mint an API token.
///
/// The plaintext token is only ever returned by this call.
pub(super) async fn create_token(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateTokenRequest>,
) -> Result<impl IntoResponse, UserApiError> {
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > MAX_TOKEN_NAME_LEN {
        return Err(UserApiError::InvalidRequest(format!(
            "token name must be 1-{MAX_TOKEN_NAME_LEN} characters"
        )));
    }

    let token = api_token::generate();
    let record = state
        .processor()
        .process(ApiTokenInsert {
            user_id,
            name: name.to_string(),
            token_hash: api_token::hash(&token),
            now: clock::utc_now(),
        })
        .await
        .map_err(UserApiError::Database)?;

    tracing::info!(token_id = %record.id, user_id = %record.user_id, "API token created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedTokenResponse {
            id: record.id,
            name: record.name,
            token,
            created_at: clock::unix(record.created_at),
        }),
    ))
}

/// `GET /tokens`: list the caller's tokens, revoked ones included.
pub(super) async fn list_tokens(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, UserApiError> {
    let tokens = state
        .processor()
        .process(ListUserApiTokens { user_id })
        .await
        .map_err(UserApiError::Database)?;

    Ok(Json(tokens.iter().map(to_response).collect::<Vec<_>>()))
}

/// `DELETE /tokens/{token_id}`: revoke one of the caller's tokens.
pub(super) async fn revoke_token(
    state: State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(token_id): Path<Uuid>,
) -> Result<impl IntoResponse, UserApiError> {
    let revoked = state
        .processor()
        .process(RevokeApiToken {
            id: token_id,
            user_id,
            now: clock::utc_now(),
        })
        .await
        .map_err(UserApiError::Database)?
        .ok_or(UserApiError::TokenNotFound)?;

    tracing::info!(token_id = %revoked.id, "API token revoked");

    Ok(Json(to_response(&revoked)))
}
