use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ApiToken {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub created_at: time::PrimitiveDateTime,
    pub last_used_at: Option<time::PrimitiveDateTime>,
    pub revoked_at: Option<time::PrimitiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct ApiTokenInsert {
    pub user_id: String,
    pub name: String,
    /// Hex SHA-256 of the plaintext token.
    pub token_hash: String,
    pub now: time::PrimitiveDateTime,
}

impl Processor<ApiTokenInsert> for DatabaseProcessor {
    type Output = ApiToken;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ApiTokenInsert")]
    async fn process(&self, insert: ApiTokenInsert) -> Result<ApiToken, sqlx::Error> {
        sqlx::query_as::<_, ApiToken>(
            r#"
            INSERT INTO api_tokens (id, user_id, name, token_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, created_at, last_used_at, revoked_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(insert.user_id)
        .bind(insert.name)
        .bind(insert.token_hash)
        .bind(insert.now)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Resolve a token hash to its owner, touching `last_used_at`.
///
/// Revoked tokens resolve to `None`.
pub struct AuthenticateApiToken {
    pub token_hash: String,
    pub now: time::PrimitiveDateTime,
}

impl Processor<AuthenticateApiToken> for DatabaseProcessor {
    type Output = Option<String>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AuthenticateApiToken")]
    async fn process(&self, query: AuthenticateApiToken) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            UPDATE api_tokens
            SET last_used_at = $2
            WHERE token_hash = $1 AND revoked_at IS NULL
            RETURNING user_id
            "#,
        )
        .bind(query.token_hash)
        .bind(query.now)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct ListUserApiTokens {
    pub user_id: String,
}

impl Processor<ListUserApiTokens> for DatabaseProcessor {
    type Output = Vec<ApiToken>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListUserApiTokens")]
    async fn process(&self, query: ListUserApiTokens) -> Result<Vec<ApiToken>, sqlx::Error> {
        sqlx::query_as::<_, ApiToken>(
            r#"
            SELECT id, user_id, name, created_at, last_used_at, revoked_at
            FROM api_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Revoke a token owned by `user_id`. Returns `None` if no such active token exists.
pub struct RevokeApiToken {
    pub id: Uuid,
    pub user_id: String,
    pub now: time::PrimitiveDateTime,
}

impl Processor<RevokeApiToken> for DatabaseProcessor {
    type Output = Option<ApiToken>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:RevokeApiToken")]
    async fn process(&self, cmd: RevokeApiToken) -> Result<Option<ApiToken>, sqlx::Error> {
        sqlx::query_as::<_, ApiToken>(
            r#"
            UPDATE api_tokens
            SET revoked_at = $3
            WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL
            RETURNING id, user_id, name, created_at, last_used_at, revoked_at
            "#,
        )
        .bind(cmd.id)
        .bind(cmd.user_id)
        .bind(cmd.now)
        .fetch_optional(&self.pool)
        .await
    }
}
