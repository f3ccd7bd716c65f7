//! Bearer credential resolution.
//!
//! A bearer token is either an internal `autopee_` API token, looked up by
//! hash, or a Firebase ID token whose uid is upserted into `users`.

pub mod firebase;

pub use firebase::{FirebaseError, FirebaseVerifier};

use autopee_core::entities::api_tokens::AuthenticateApiToken;
use autopee_core::entities::users::UpsertUser;
use autopee_core::utils::{api_token, clock};
use autopee_sdk::auth::BearerKind;
use kanau::processor::Processor;
use thiserror::Error;

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum BearerAuthError {
    #[error("invalid or revoked API token")]
    InvalidApiToken,

    #[error("invalid ID token: {0}")]
    InvalidIdToken(FirebaseError),

    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(FirebaseError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<FirebaseError> for BearerAuthError {
    fn from(err: FirebaseError) -> Self {
        if err.is_unavailable() {
            BearerAuthError::ProviderUnavailable(err)
        } else {
            BearerAuthError::InvalidIdToken(err)
        }
    }
}

/// Resolve a bearer credential to the user id it acts for.
pub async fn authenticate(state: &AppState, token: &str) -> Result<String, BearerAuthError> {
    let processor = state.processor();
    let now = clock::utc_now();

    match BearerKind::of(token) {
        BearerKind::ApiToken => {
            if !api_token::is_well_formed(token) {
                return Err(BearerAuthError::InvalidApiToken);
            }
            processor
                .process(AuthenticateApiToken {
                    token_hash: api_token::hash(token),
                    now,
                })
                .await?
                .ok_or(BearerAuthError::InvalidApiToken)
        }
        BearerKind::FirebaseIdToken => {
            let firebase = state.config.firebase.read().await.clone();
            let identity = state.firebase.verify(token, &firebase).await?;
            let user = processor
                .process(UpsertUser {
                    id: identity.uid,
                    email: identity.email,
                    now,
                })
                .await?;
            Ok(user.id)
        }
    }
}
