use crate::entities::PaymentRequestStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PaymentRequest {
    pub id: Uuid,
    pub user_id: String,
    pub payment_code: String,
    pub amount: Decimal,
    pub status: PaymentRequestStatus,
    pub expires_at: time::PrimitiveDateTime,
    pub transaction_id: Option<i64>,
    pub created_at: time::PrimitiveDateTime,
    pub completed_at: Option<time::PrimitiveDateTime>,
}

/// A pending payment request as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PendingPayment {
    pub id: Uuid,
    pub user_id: String,
    pub payment_code: String,
    pub amount: Decimal,
    pub created_at: time::PrimitiveDateTime,
}

/// Data for inserting a new payment request.
#[derive(Debug, Clone)]
pub struct PaymentRequestInsert {
    pub user_id: String,
    pub payment_code: String,
    pub amount: Decimal,
    pub expires_at: time::PrimitiveDateTime,
    pub now: time::PrimitiveDateTime,
}

impl Processor<PaymentRequestInsert> for DatabaseProcessor {
    type Output = Option<PaymentRequest>;
    type Error = sqlx::Error;
    /// Returns `None` if the payment code is already taken.
    #[tracing::instrument(skip_all, err, name = "SQL:PaymentRequestInsert")]
    async fn process(&self, insert: PaymentRequestInsert) -> Result<Option<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            INSERT INTO payment_requests (id, user_id, payment_code, amount, status, expires_at, created_at)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6)
            ON CONFLICT (payment_code) DO NOTHING
            RETURNING id, user_id, payment_code, amount, status, expires_at, transaction_id,
                   created_at, completed_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(insert.user_id)
        .bind(insert.payment_code)
        .bind(insert.amount)
        .bind(insert.expires_at)
        .bind(insert.now)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Exact payment code lookup among pending requests.
pub struct GetPendingByCode {
    pub payment_code: String,
}

impl Processor<GetPendingByCode> for DatabaseProcessor {
    type Output = Option<PendingPayment>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPendingByCode")]
    async fn process(&self, query: GetPendingByCode) -> Result<Option<PendingPayment>, sqlx::Error> {
        sqlx::query_as::<_, PendingPayment>(
            r#"
            SELECT id, user_id, payment_code, amount, created_at
            FROM payment_requests
            WHERE payment_code = $1 AND status = 'pending'
            "#,
        )
        .bind(query.payment_code)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Most recent pending requests, optionally restricted to one amount.
pub struct ListRecentPending {
    pub amount: Option<Decimal>,
    pub limit: i64,
}

impl Processor<ListRecentPending> for DatabaseProcessor {
    type Output = Vec<PendingPayment>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListRecentPending")]
    async fn process(&self, query: ListRecentPending) -> Result<Vec<PendingPayment>, sqlx::Error> {
        sqlx::query_as::<_, PendingPayment>(
            r#"
            SELECT id, user_id, payment_code, amount, created_at
            FROM payment_requests
            WHERE status = 'pending'
              AND ($1::numeric IS NULL OR amount = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(query.amount)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Newest pending request for an exact amount created at or after `since`.
pub struct GetLatestPendingSince {
    pub amount: Decimal,
    pub since: time::PrimitiveDateTime,
}

impl Processor<GetLatestPendingSince> for DatabaseProcessor {
    type Output = Option<PendingPayment>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLatestPendingSince")]
    async fn process(&self, query: GetLatestPendingSince) -> Result<Option<PendingPayment>, sqlx::Error> {
        sqlx::query_as::<_, PendingPayment>(
            r#"
            SELECT id, user_id, payment_code, amount, created_at
            FROM payment_requests
            WHERE status = 'pending'
              AND amount = $1
              AND created_at >= $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(query.amount)
        .bind(query.since)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Look up a payment request owned by `user_id`, whatever its status.
pub struct GetUserPaymentRequest {
    pub user_id: String,
    pub payment_code: String,
}

impl Processor<GetUserPaymentRequest> for DatabaseProcessor {
    type Output = Option<PaymentRequest>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserPaymentRequest")]
    async fn process(&self, query: GetUserPaymentRequest) -> Result<Option<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            SELECT id, user_id, payment_code, amount, status, expires_at, transaction_id,
                   created_at, completed_at
            FROM payment_requests
            WHERE payment_code = $1 AND user_id = $2
            "#,
        )
        .bind(query.payment_code)
        .bind(query.user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Move a pending request to a terminal, non-completed status.
///
/// Only applies while the request is still pending; returns the updated row
/// or `None` if it had already left `pending`.
pub struct ClosePendingRequest {
    pub id: Uuid,
    pub status: PaymentRequestStatus,
}

impl Processor<ClosePendingRequest> for DatabaseProcessor {
    type Output = Option<PaymentRequest>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ClosePendingRequest")]
    async fn process(&self, cmd: ClosePendingRequest) -> Result<Option<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            UPDATE payment_requests
            SET status = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING id, user_id, payment_code, amount, status, expires_at, transaction_id,
                   created_at, completed_at
            "#,
        )
        .bind(cmd.id)
        .bind(cmd.status)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct ListPaymentRequests {
    pub limit: i64,
    pub offset: i64,
    pub status: Option<PaymentRequestStatus>,
    pub user_id: Option<String>,
}

impl Processor<ListPaymentRequests> for DatabaseProcessor {
    type Output = Vec<PaymentRequest>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListPaymentRequests")]
    async fn process(&self, query: ListPaymentRequests) -> Result<Vec<PaymentRequest>, sqlx::Error> {
        let mut builder = sqlx::QueryBuilder::new(
            "SELECT id, user_id, payment_code, amount, status, expires_at, transaction_id, \
             created_at, completed_at FROM payment_requests WHERE TRUE",
        );
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);
        builder
            .build_query_as::<PaymentRequest>()
            .fetch_all(&self.pool)
            .await
    }
}

impl PaymentRequest {
    /// Complete a pending request within a transaction.
    ///
    /// The update is conditional on the request still being pending, so a
    /// request completes at most once. Returns the owning user on success.
    pub async fn complete_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        transaction_id: i64,
        now: time::PrimitiveDateTime,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            UPDATE payment_requests
            SET status = 'completed', transaction_id = $2, completed_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING user_id
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .bind(now)
        .fetch_optional(&mut **tx)
        .await
    }
}
