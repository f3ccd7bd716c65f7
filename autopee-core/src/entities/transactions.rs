use crate::entities::{TransactionStatus, TransferDirection};
use crate::framework::DatabaseProcessor;
use autopee_sdk::objects::SepayWebhookPayload;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A bank transaction reported by SePay.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TransactionRecord {
    pub id: i64,
    pub provider_id: i64,
    pub gateway: String,
    /// Bank-local time as reported by the provider.
    pub transaction_date: Option<time::PrimitiveDateTime>,
    pub account_number: String,
    pub code: Option<String>,
    pub content: String,
    pub transfer_type: TransferDirection,
    pub transfer_amount: Decimal,
    pub accumulated: Decimal,
    pub reference_code: Option<String>,
    pub description: String,
    pub user_id: Option<String>,
    pub payment_request_id: Option<Uuid>,
    pub status: TransactionStatus,
    pub created_at: time::PrimitiveDateTime,
    pub processed_at: Option<time::PrimitiveDateTime>,
}

impl TransactionRecord {
    pub fn is_inbound(&self) -> bool {
        self.transfer_type == TransferDirection::In
    }
}

/// Data for inserting a new transaction.
#[derive(Debug, Clone)]
pub struct TransactionInsert {
    pub provider_id: i64,
    pub gateway: String,
    pub transaction_date: Option<time::PrimitiveDateTime>,
    pub account_number: String,
    pub code: Option<String>,
    pub content: String,
    pub transfer_type: TransferDirection,
    pub transfer_amount: Decimal,
    pub accumulated: Decimal,
    pub reference_code: Option<String>,
    pub description: String,
    pub now: time::PrimitiveDateTime,
}

impl TransactionInsert {
    pub fn from_payload(payload: &SepayWebhookPayload, now: time::PrimitiveDateTime) -> Self {
        Self {
            provider_id: payload.id,
            gateway: payload.gateway.clone(),
            transaction_date: payload.parsed_transaction_date(),
            account_number: payload.account_number.clone(),
            code: payload.explicit_code().map(str::to_owned),
            content: payload.content.clone(),
            transfer_type: payload.transfer_type.into(),
            transfer_amount: payload.transfer_amount,
            accumulated: payload.accumulated,
            reference_code: payload.reference_code.clone(),
            description: payload.description.clone(),
            now,
        }
    }
}

impl Processor<TransactionInsert> for DatabaseProcessor {
    type Output = Option<TransactionRecord>;
    type Error = sqlx::Error;
    /// Returns `None` when a transaction with the same `provider_id` already exists.
    #[tracing::instrument(skip_all, err, name = "SQL:TransactionInsert")]
    async fn process(&self, insert: TransactionInsert) -> Result<Option<TransactionRecord>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRecord>(
            r#"
            INSERT INTO transactions (
                provider_id, gateway, transaction_date, account_number, code, content,
                transfer_type, transfer_amount, accumulated, reference_code, description,
                status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending', $12)
            ON CONFLICT (provider_id) DO NOTHING
            RETURNING id, provider_id, gateway, transaction_date, account_number, code, content,
                   transfer_type, transfer_amount, accumulated, reference_code, description,
                   user_id, payment_request_id, status, created_at, processed_at
            "#,
        )
        .bind(insert.provider_id)
        .bind(insert.gateway)
        .bind(insert.transaction_date)
        .bind(insert.account_number)
        .bind(insert.code)
        .bind(insert.content)
        .bind(insert.transfer_type)
        .bind(insert.transfer_amount)
        .bind(insert.accumulated)
        .bind(insert.reference_code)
        .bind(insert.description)
        .bind(insert.now)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetTransactionByProviderId {
    pub provider_id: i64,
}

impl Processor<GetTransactionByProviderId> for DatabaseProcessor {
    type Output = Option<TransactionRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetTransactionByProviderId")]
    async fn process(
        &self,
        query: GetTransactionByProviderId,
    ) -> Result<Option<TransactionRecord>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, provider_id, gateway, transaction_date, account_number, code, content,
                   transfer_type, transfer_amount, accumulated, reference_code, description,
                   user_id, payment_request_id, status, created_at, processed_at
            FROM transactions
            WHERE provider_id = $1
            "#,
        )
        .bind(query.provider_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetTransactionById {
    pub id: i64,
}

impl Processor<GetTransactionById> for DatabaseProcessor {
    type Output = Option<TransactionRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetTransactionById")]
    async fn process(&self, query: GetTransactionById) -> Result<Option<TransactionRecord>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, provider_id, gateway, transaction_date, account_number, code, content,
                   transfer_type, transfer_amount, accumulated, reference_code, description,
                   user_id, payment_request_id, status, created_at, processed_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// List transactions for the admin dashboard, newest first.
pub struct ListTransactions {
    pub limit: i64,
    pub offset: i64,
    pub status: Option<TransactionStatus>,
    /// Only rows without a resolved user.
    pub unresolved_only: bool,
}

impl Processor<ListTransactions> for DatabaseProcessor {
    type Output = Vec<TransactionRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListTransactions")]
    async fn process(&self, query: ListTransactions) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        let mut builder = sqlx::QueryBuilder::new(
            "SELECT id, provider_id, gateway, transaction_date, account_number, code, content, \
             transfer_type, transfer_amount, accumulated, reference_code, description, \
             user_id, payment_request_id, status, created_at, processed_at \
             FROM transactions WHERE TRUE",
        );
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if query.unresolved_only {
            builder.push(" AND user_id IS NULL");
        }
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
        builder
            .build_query_as::<TransactionRecord>()
            .fetch_all(&self.pool)
            .await
    }
}

/// Outbound transfers can carry a user id (a code naming the user) but never
/// move the wallet, so they stay out of the history.
const USER_CREDITS_SQL: &str = r#"
    SELECT id, provider_id, gateway, transaction_date, account_number, code, content,
           transfer_type, transfer_amount, accumulated, reference_code, description,
           user_id, payment_request_id, status, created_at, processed_at
    FROM transactions
    WHERE user_id = $1
      AND status = 'processed'
      AND transfer_type = 'in'
    ORDER BY created_at DESC, id DESC
    LIMIT $2 OFFSET $3
"#;

#[derive(Debug, Clone)]
/// Inbound transactions credited to one user, newest first.
pub struct ListUserTransactions {
    pub user_id: String,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListUserTransactions> for DatabaseProcessor {
    type Output = Vec<TransactionRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListUserTransactions")]
    async fn process(&self, query: ListUserTransactions) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRecord>(USER_CREDITS_SQL)
            .bind(query.user_id)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Mark a transaction as failed unless it has already been processed.
pub struct MarkTransactionFailed {
    pub id: i64,
}

impl Processor<MarkTransactionFailed> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkTransactionFailed")]
    async fn process(&self, cmd: MarkTransactionFailed) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'failed'
            WHERE id = $1 AND status <> 'processed'
            "#,
        )
        .bind(cmd.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

impl TransactionRecord {
    /// Take the processing lock on a transaction that has not been processed yet.
    ///
    /// Returns `false` if another delivery already processed it.
    pub async fn begin_processing_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: i64,
        now: time::PrimitiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'processed', processed_at = $2
            WHERE id = $1 AND status <> 'processed'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Lock a processed, inbound, unresolved transaction for manual reconciliation.
    ///
    /// Returns `false` if the transaction is not eligible.
    pub async fn begin_reconcile_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: i64,
        now: time::PrimitiveDateTime,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET processed_at = $2
            WHERE id = $1
              AND status = 'processed'
              AND user_id IS NULL
              AND transfer_type = 'in'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Record the resolution of a transaction.
    pub async fn set_resolution_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: i64,
        user_id: Option<&str>,
        payment_request_id: Option<Uuid>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET user_id = $2, payment_request_id = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(payment_request_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_history_excludes_outbound() {
        let sql = USER_CREDITS_SQL.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(sql.contains("WHERE user_id = $1 AND status = 'processed' AND transfer_type = 'in'"));
    }
}
