use super::{
    LedgerError, PaymentLookup, Recorded, SettleMode, Settlement, SettlementResult, WalletLedger,
};
use crate::entities::TransactionStatus;
use crate::entities::payment_requests::{
    GetLatestPendingSince, GetPendingByCode, ListRecentPending, PaymentRequest, PendingPayment,
};
use crate::entities::transactions::{
    GetTransactionById, GetTransactionByProviderId, MarkTransactionFailed, TransactionInsert,
    TransactionRecord,
};
use crate::entities::users::{User, UserExists};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::warn;

/// [`WalletLedger`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgLedger {
    processor: DatabaseProcessor,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl PaymentLookup for PgLedger {
    async fn user_exists(&self, user_id: &str) -> Result<bool, LedgerError> {
        let exists = self
            .processor
            .process(UserExists {
                id: user_id.to_owned(),
            })
            .await?;
        Ok(exists)
    }

    async fn pending_by_code(&self, code: &str) -> Result<Option<PendingPayment>, LedgerError> {
        let pending = self
            .processor
            .process(GetPendingByCode {
                payment_code: code.to_owned(),
            })
            .await?;
        Ok(pending)
    }

    async fn recent_pending(
        &self,
        amount: Option<Decimal>,
        limit: i64,
    ) -> Result<Vec<PendingPayment>, LedgerError> {
        let pending = self
            .processor
            .process(ListRecentPending { amount, limit })
            .await?;
        Ok(pending)
    }

    async fn latest_pending_since(
        &self,
        amount: Decimal,
        since: time::PrimitiveDateTime,
    ) -> Result<Option<PendingPayment>, LedgerError> {
        let pending = self
            .processor
            .process(GetLatestPendingSince { amount, since })
            .await?;
        Ok(pending)
    }
}

#[async_trait]
impl WalletLedger for PgLedger {
    async fn record(&self, insert: TransactionInsert) -> Result<Recorded, LedgerError> {
        let provider_id = insert.provider_id;
        if let Some(record) = self.processor.process(insert).await? {
            return Ok(Recorded::New(record));
        }

        let existing = self
            .processor
            .process(GetTransactionByProviderId { provider_id })
            .await?
            // The row was inserted concurrently and rolled back; treat as new contention.
            .ok_or(LedgerError::Database(sqlx::Error::RowNotFound))?;

        match existing.status {
            TransactionStatus::Processed => Ok(Recorded::Duplicate(existing.id)),
            TransactionStatus::Pending | TransactionStatus::Failed => Ok(Recorded::Retry(existing)),
        }
    }

    async fn transaction(&self, id: i64) -> Result<Option<TransactionRecord>, LedgerError> {
        let record = self.processor.process(GetTransactionById { id }).await?;
        Ok(record)
    }

    async fn settle(&self, settlement: Settlement) -> Result<SettlementResult, LedgerError> {
        let Settlement {
            transaction_id,
            mode,
            mut user_id,
            payment_request_id,
            mut credit,
            now,
        } = settlement;

        let mut tx = self.processor.pool.begin().await?;

        // Lock the transaction row first so concurrent retries serialize here.
        let locked = match mode {
            SettleMode::Ingest => {
                TransactionRecord::begin_processing_tx(&mut tx, transaction_id, now).await?
            }
            SettleMode::Reconcile => {
                TransactionRecord::begin_reconcile_tx(&mut tx, transaction_id, now).await?
            }
        };
        if !locked {
            tx.rollback().await?;
            return Err(match mode {
                SettleMode::Ingest => LedgerError::AlreadyProcessed(transaction_id),
                SettleMode::Reconcile => LedgerError::NotReconcilable(transaction_id),
            });
        }

        let mut completed_request = None;
        let mut claim_lost = false;
        if let Some(request_id) = payment_request_id {
            match PaymentRequest::complete_tx(&mut tx, request_id, transaction_id, now).await? {
                Some(owner) => {
                    user_id = Some(owner);
                    completed_request = Some(request_id);
                }
                None => {
                    warn!(
                        transaction_id,
                        payment_request_id = %request_id,
                        "Payment request left pending before it could be claimed"
                    );
                    claim_lost = true;
                    user_id = None;
                    credit = None;
                }
            }
        }

        let credited = match (&user_id, credit) {
            (Some(uid), Some(amount)) => {
                if !User::credit_wallet_tx(&mut tx, uid, amount).await? {
                    tx.rollback().await?;
                    return Err(LedgerError::UserNotFound(uid.clone()));
                }
                Some(amount)
            }
            _ => None,
        };

        TransactionRecord::set_resolution_tx(
            &mut tx,
            transaction_id,
            user_id.as_deref(),
            completed_request,
        )
        .await?;

        tx.commit().await?;

        Ok(SettlementResult {
            user_id,
            payment_request_id: completed_request,
            credited,
            claim_lost,
        })
    }

    async fn mark_failed(&self, transaction_id: i64) -> Result<(), LedgerError> {
        self.processor
            .process(MarkTransactionFailed { id: transaction_id })
            .await?;
        Ok(())
    }
}
