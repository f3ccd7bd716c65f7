//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `SepayApiKey` - checks `Authorization: Apikey <key>` on webhook deliveries.
//! - `AuthUser` - resolves `Authorization: Bearer <token>` to a user id.
//! - `AdminAuth` - verifies the `Autopee-Admin-Authorization` secret.

use autopee_sdk::auth::{ADMIN_AUTH_HEADER, BEARER_SCHEME, SEPAY_APIKEY_SCHEME, strip_scheme};
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use super::{error_response, internal_error};
use crate::auth::{self, BearerAuthError};
use crate::state::AppState;

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

// ---------------------------------------------------------------------------
// SepayApiKey - webhook authentication
// ---------------------------------------------------------------------------

/// Passes when no SePay API key is configured, or the request carries it.
pub struct SepayApiKey;

#[derive(Debug)]
pub struct SepayApiKeyRejection;

impl IntoResponse for SepayApiKeyRejection {
    fn into_response(self) -> Response {
        error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_api_key",
            "missing or invalid SePay API key",
        )
    }
}

impl FromRequestParts<AppState> for SepayApiKey {
    type Rejection = SepayApiKeyRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = header_str(parts, AUTHORIZATION.as_str())
            .and_then(|value| strip_scheme(value, SEPAY_APIKEY_SCHEME));

        if state.config.sepay.read().await.accepts(presented) {
            Ok(SepayApiKey)
        } else {
            tracing::warn!("Rejected webhook delivery with bad API key");
            Err(SepayApiKeyRejection)
        }
    }
}

// ---------------------------------------------------------------------------
// AuthUser - bearer authentication
// ---------------------------------------------------------------------------

/// The authenticated user id behind a bearer token.
pub struct AuthUser(pub String);

#[derive(Debug)]
pub enum AuthUserRejection {
    MissingToken,
    Auth(BearerAuthError),
}

impl IntoResponse for AuthUserRejection {
    fn into_response(self) -> Response {
        match self {
            AuthUserRejection::MissingToken => error_response(
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "missing bearer token",
            ),
            AuthUserRejection::Auth(BearerAuthError::InvalidApiToken) => error_response(
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "invalid or revoked API token",
            ),
            AuthUserRejection::Auth(BearerAuthError::InvalidIdToken(e)) => {
                tracing::debug!(error = %e, "Rejected ID token");
                error_response(StatusCode::UNAUTHORIZED, "invalid_token", "invalid ID token")
            }
            AuthUserRejection::Auth(BearerAuthError::ProviderUnavailable(e)) => {
                tracing::error!(error = %e, "Firebase signing keys unavailable");
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "auth_unavailable",
                    "identity provider unavailable",
                )
            }
            AuthUserRejection::Auth(BearerAuthError::Database(e)) => internal_error("Auth", &e),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthUserRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = header_str(parts, AUTHORIZATION.as_str())
            .and_then(|value| strip_scheme(value, BEARER_SCHEME))
            .ok_or(AuthUserRejection::MissingToken)?;

        let user_id = auth::authenticate(state, token)
            .await
            .map_err(AuthUserRejection::Auth)?;
        Ok(AuthUser(user_id))
    }
}

// ---------------------------------------------------------------------------
// AdminAuth - admin secret
// ---------------------------------------------------------------------------

/// Marker proving the request carried the admin secret.
pub struct AdminAuth;

#[derive(Debug)]
pub enum AdminAuthRejection {
    MissingHeader,
    InvalidSecret,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            AdminAuthRejection::MissingHeader => error_response(
                StatusCode::UNAUTHORIZED,
                "missing_admin_secret",
                "missing Autopee-Admin-Authorization header",
            ),
            AdminAuthRejection::InvalidSecret => error_response(
                StatusCode::UNAUTHORIZED,
                "invalid_admin_secret",
                "admin secret verification failed",
            ),
        }
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = header_str(parts, ADMIN_AUTH_HEADER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AdminAuthRejection::MissingHeader)?;

        if state.config.admin.read().await.accepts(secret) {
            Ok(AdminAuth)
        } else {
            tracing::warn!("Rejected admin request with bad secret");
            Err(AdminAuthRejection::InvalidSecret)
        }
    }
}
