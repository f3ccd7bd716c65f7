use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub wallet_balance: Decimal,
    pub created_at: time::PrimitiveDateTime,
}

#[derive(Debug, Clone)]
/// Create the user on first sight, refreshing the email on later logins.
pub struct UpsertUser {
    pub id: String,
    pub email: Option<String>,
    pub now: time::PrimitiveDateTime,
}

impl Processor<UpsertUser> for DatabaseProcessor {
    type Output = User;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpsertUser")]
    async fn process(&self, cmd: UpsertUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET email = COALESCE(EXCLUDED.email, users.email)
            RETURNING id, email, wallet_balance, created_at
            "#,
        )
        .bind(cmd.id)
        .bind(cmd.email)
        .bind(cmd.now)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetUserById {
    pub id: String,
}

impl Processor<GetUserById> for DatabaseProcessor {
    type Output = Option<User>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserById")]
    async fn process(&self, query: GetUserById) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, wallet_balance, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct UserExists {
    pub id: String,
}

impl Processor<UserExists> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UserExists")]
    async fn process(&self, query: UserExists) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(query.id)
            .fetch_one(&self.pool)
            .await
    }
}

impl User {
    /// Add `amount` to the user's balance within a transaction.
    ///
    /// Returns `false` when the user does not exist.
    pub async fn credit_wallet_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: &str,
        amount: Decimal,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET wallet_balance = wallet_balance + $2
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
