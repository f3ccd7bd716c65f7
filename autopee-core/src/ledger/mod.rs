//! The storage seam between the matching/settlement logic and the database.
//!
//! [`PaymentLookup`] covers the read side the matcher needs, [`WalletLedger`]
//! adds recording and settlement of bank transactions. [`PgLedger`] is the
//! production implementation; tests use an in-memory one.

mod postgres;
#[cfg(test)]
pub(crate) mod memory;

pub use postgres::PgLedger;

use crate::entities::payment_requests::PendingPayment;
use crate::entities::transactions::{TransactionInsert, TransactionRecord};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by ledger implementations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Settlement was asked to credit a user that does not exist.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Another delivery processed this transaction first.
    #[error("transaction {0} already processed")]
    AlreadyProcessed(i64),

    /// The transaction is not an unresolved, processed, inbound transfer.
    #[error("transaction {0} cannot be reconciled")]
    NotReconcilable(i64),
}

/// Result of recording an incoming delivery.
#[derive(Debug, Clone)]
pub enum Recorded {
    /// First time this provider id is seen.
    New(TransactionRecord),
    /// Seen before but never processed successfully.
    Retry(TransactionRecord),
    /// Already processed; carries the existing transaction id.
    Duplicate(i64),
}

/// How a settlement guards the transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleMode {
    /// Normal webhook processing: the transaction must not be processed yet.
    Ingest,
    /// Manual assignment: the transaction must be processed, inbound and unresolved.
    Reconcile,
}

/// Everything settlement needs to apply one resolved transaction.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub transaction_id: i64,
    pub mode: SettleMode,
    /// User the transaction resolved to, credited or not.
    pub user_id: Option<String>,
    /// Request to complete. Only set together with `credit`.
    pub payment_request_id: Option<Uuid>,
    /// Amount to add to the user's wallet.
    pub credit: Option<Decimal>,
    pub now: time::PrimitiveDateTime,
}

/// What settlement actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementResult {
    /// User stamped on the transaction.
    pub user_id: Option<String>,
    /// Request completed by this settlement.
    pub payment_request_id: Option<Uuid>,
    pub credited: Option<Decimal>,
    /// The request had already left `pending` when we tried to claim it.
    pub claim_lost: bool,
}

/// Read access the matcher needs.
#[async_trait]
pub trait PaymentLookup: Send + Sync {
    async fn user_exists(&self, user_id: &str) -> Result<bool, LedgerError>;

    /// Exact code lookup among pending requests.
    async fn pending_by_code(&self, code: &str) -> Result<Option<PendingPayment>, LedgerError>;

    /// Up to `limit` most recent pending requests, optionally for one amount only.
    async fn recent_pending(
        &self,
        amount: Option<Decimal>,
        limit: i64,
    ) -> Result<Vec<PendingPayment>, LedgerError>;

    /// Newest pending request for `amount` created at or after `since`.
    async fn latest_pending_since(
        &self,
        amount: Decimal,
        since: time::PrimitiveDateTime,
    ) -> Result<Option<PendingPayment>, LedgerError>;
}

/// Recording and settlement of bank transactions.
#[async_trait]
pub trait WalletLedger: PaymentLookup {
    /// Persist a delivery, deduplicating on the provider id.
    async fn record(&self, insert: TransactionInsert) -> Result<Recorded, LedgerError>;

    async fn transaction(&self, id: i64) -> Result<Option<TransactionRecord>, LedgerError>;

    /// Apply a settlement atomically: claim the request, credit the wallet
    /// and stamp the transaction, or do nothing at all.
    async fn settle(&self, settlement: Settlement) -> Result<SettlementResult, LedgerError>;

    /// Mark a transaction failed unless it was processed in the meantime.
    async fn mark_failed(&self, transaction_id: i64) -> Result<(), LedgerError>;
}
