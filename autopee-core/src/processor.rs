//! Transaction processor.
//!
//! Turns a SePay delivery into a settled ledger entry:
//! - record the delivery, deduplicating on the provider transaction id
//! - resolve the user / payment request with the [`PaymentMatcher`]
//! - for inbound transfers, credit the wallet and complete the request
//! - stamp the transaction `processed`, or `failed` if anything went wrong
//!
//! Manual reconciliation of unresolved transfers goes through the same
//! settlement path.

use crate::entities::transactions::{TransactionInsert, TransactionRecord};
use crate::ledger::{LedgerError, Recorded, SettleMode, Settlement, WalletLedger};
use crate::matcher::{MatchInput, MatchStrategy, PaymentMatcher};
use autopee_sdk::objects::SepayWebhookPayload;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Errors that can occur while processing a transaction.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("transaction {0} not found")]
    TransactionNotFound(i64),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("payment request {0} is not pending")]
    PaymentRequestNotPending(String),

    #[error("payment request {payment_code} does not belong to user {user_id}")]
    PaymentRequestOwner {
        payment_code: String,
        user_id: String,
    },
}

/// What processing did to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReport {
    pub transaction_id: i64,
    pub user_id: Option<String>,
    pub payment_request_id: Option<Uuid>,
    pub strategy: Option<MatchStrategy>,
    pub credited: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The delivery had already been processed; nothing changed.
    Duplicate { transaction_id: i64 },
    Processed(SettlementReport),
}

/// Manual assignment of an unresolved transaction.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub transaction_id: i64,
    pub user_id: String,
    pub payment_code: Option<String>,
}

pub struct TransactionProcessor<L> {
    ledger: L,
}

impl<L: WalletLedger> TransactionProcessor<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Record and process one webhook delivery.
    ///
    /// On failure the transaction is left `failed` so that the provider's
    /// retry of the same id is processed again instead of being treated as
    /// a duplicate.
    #[tracing::instrument(skip_all, fields(provider_id = payload.id))]
    pub async fn ingest(
        &self,
        payload: &SepayWebhookPayload,
        now: time::PrimitiveDateTime,
    ) -> Result<IngestOutcome, ProcessError> {
        let record = match self
            .ledger
            .record(TransactionInsert::from_payload(payload, now))
            .await?
        {
            Recorded::Duplicate(transaction_id) => {
                info!(transaction_id, "Duplicate delivery ignored");
                return Ok(IngestOutcome::Duplicate { transaction_id });
            }
            Recorded::New(record) => record,
            Recorded::Retry(record) => {
                info!(
                    transaction_id = record.id,
                    status = ?record.status,
                    "Reprocessing transaction from an earlier failed delivery"
                );
                record
            }
        };

        match self.process(&record, now).await {
            Ok(report) => Ok(IngestOutcome::Processed(report)),
            Err(ProcessError::Ledger(LedgerError::AlreadyProcessed(transaction_id))) => {
                info!(transaction_id, "Concurrent delivery processed it first");
                Ok(IngestOutcome::Duplicate { transaction_id })
            }
            Err(e) => {
                if let Err(mark_err) = self.ledger.mark_failed(record.id).await {
                    error!(
                        transaction_id = record.id,
                        error = %mark_err,
                        "Failed to mark transaction as failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        record: &TransactionRecord,
        now: time::PrimitiveDateTime,
    ) -> Result<SettlementReport, ProcessError> {
        let outcome = PaymentMatcher::new(&self.ledger)
            .resolve(&MatchInput {
                code: record.code.as_deref(),
                content: &record.content,
                transfer_amount: record.transfer_amount,
                transfer_type: record.transfer_type,
                now,
            })
            .await?;

        let creditable = record.is_inbound() && record.transfer_amount > Decimal::ZERO;
        let credit = (creditable && outcome.user_id.is_some()).then_some(record.transfer_amount);
        let payment_request_id = credit
            .and(outcome.payment_request.as_ref())
            .map(|request| request.id);

        let result = self
            .ledger
            .settle(Settlement {
                transaction_id: record.id,
                mode: SettleMode::Ingest,
                user_id: outcome.user_id.clone(),
                payment_request_id,
                credit,
                now,
            })
            .await?;

        let strategy = if result.claim_lost {
            None
        } else {
            outcome.strategy
        };

        match (&result.user_id, result.credited) {
            (Some(user_id), Some(amount)) => info!(
                transaction_id = record.id,
                user_id = %user_id,
                amount = %amount,
                strategy = ?strategy,
                "Wallet credited"
            ),
            (Some(user_id), None) => info!(
                transaction_id = record.id,
                user_id = %user_id,
                transfer_type = ?record.transfer_type,
                "Transaction resolved without credit"
            ),
            (None, _) => warn!(
                transaction_id = record.id,
                amount = %record.transfer_amount,
                content = %record.content,
                "Transaction unresolved, left for manual reconciliation"
            ),
        }

        Ok(SettlementReport {
            transaction_id: record.id,
            user_id: result.user_id,
            payment_request_id: result.payment_request_id,
            strategy,
            credited: result.credited,
        })
    }

    /// Assign an unresolved inbound transaction to a user, crediting the
    /// wallet and optionally completing one of the user's pending requests.
    #[tracing::instrument(skip_all, fields(transaction_id = req.transaction_id, user_id = %req.user_id))]
    pub async fn reconcile(
        &self,
        req: Reconciliation,
        now: time::PrimitiveDateTime,
    ) -> Result<SettlementReport, ProcessError> {
        let record = self
            .ledger
            .transaction(req.transaction_id)
            .await?
            .ok_or(ProcessError::TransactionNotFound(req.transaction_id))?;

        if !self.ledger.user_exists(&req.user_id).await? {
            return Err(ProcessError::UserNotFound(req.user_id));
        }

        let payment_request_id = match &req.payment_code {
            Some(code) => {
                let request = self
                    .ledger
                    .pending_by_code(code)
                    .await?
                    .ok_or_else(|| ProcessError::PaymentRequestNotPending(code.clone()))?;
                if request.user_id != req.user_id {
                    return Err(ProcessError::PaymentRequestOwner {
                        payment_code: code.clone(),
                        user_id: req.user_id,
                    });
                }
                Some(request.id)
            }
            None => None,
        };

        let result = self
            .ledger
            .settle(Settlement {
                transaction_id: record.id,
                mode: SettleMode::Reconcile,
                user_id: Some(req.user_id.clone()),
                payment_request_id,
                credit: Some(record.transfer_amount),
                now,
            })
            .await?;

        if result.claim_lost {
            // Nothing was credited, the transaction stays unresolved.
            return Err(ProcessError::PaymentRequestNotPending(
                req.payment_code.unwrap_or_default(),
            ));
        }

        info!(
            amount = %record.transfer_amount,
            payment_request_id = ?result.payment_request_id,
            "Transaction reconciled manually"
        );

        Ok(SettlementReport {
            transaction_id: record.id,
            user_id: result.user_id,
            payment_request_id: result.payment_request_id,
            strategy: None,
            credited: result.credited,
        })
    }
}
