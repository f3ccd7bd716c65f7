//! API token management types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
}

/// Returned once, on creation. The plaintext token is never shown again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTokenResponse {
    pub id: Uuid,
    pub name: String,
    pub token: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: i64,
    pub last_used_at: Option<i64>,
    pub revoked_at: Option<i64>,
}
