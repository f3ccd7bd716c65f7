//! In-memory ledger mirroring the PostgreSQL semantics, for tests.

use super::{
    LedgerError, PaymentLookup, Recorded, SettleMode, Settlement, SettlementResult, WalletLedger,
};
use crate::entities::payment_requests::PendingPayment;
use crate::entities::transactions::{TransactionInsert, TransactionRecord};
use crate::entities::{PaymentRequestStatus, TransactionStatus, TransferDirection};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub(crate) struct MemoryRequest {
    pub pending: PendingPayment,
    pub status: PaymentRequestStatus,
    pub transaction_id: Option<i64>,
}

#[derive(Default)]
struct State {
    balances: HashMap<String, Decimal>,
    requests: Vec<MemoryRequest>,
    transactions: Vec<TransactionRecord>,
    fail_next_settle: bool,
    complete_before_next_settle: Option<Uuid>,
}

#[derive(Default)]
pub(crate) struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user_id: &str, balance: Decimal) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(user_id.to_owned(), balance);
    }

    pub fn add_request(
        &self,
        user_id: &str,
        payment_code: &str,
        amount: Decimal,
        created_at: time::PrimitiveDateTime,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().requests.push(MemoryRequest {
            pending: PendingPayment {
                id,
                user_id: user_id.to_owned(),
                payment_code: payment_code.to_owned(),
                amount,
                created_at,
            },
            status: PaymentRequestStatus::Pending,
            transaction_id: None,
        });
        id
    }

    pub fn set_request_status(&self, id: Uuid, status: PaymentRequestStatus) {
        let mut state = self.state.lock().unwrap();
        if let Some(r) = state.requests.iter_mut().find(|r| r.pending.id == id) {
            r.status = status;
        }
    }

    pub fn balance(&self, user_id: &str) -> Option<Decimal> {
        self.state.lock().unwrap().balances.get(user_id).copied()
    }

    pub fn request(&self, id: Uuid) -> Option<MemoryRequest> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| r.pending.id == id)
            .cloned()
    }

    pub fn transaction_by_provider(&self, provider_id: i64) -> Option<TransactionRecord> {
        self.state
            .lock()
            .unwrap()
            .transactions
            .iter()
            .find(|t| t.provider_id == provider_id)
            .cloned()
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().unwrap().transactions.len()
    }

    /// Make the next settlement fail with a database error.
    pub fn fail_next_settle(&self) {
        self.state.lock().unwrap().fail_next_settle = true;
    }

    /// Complete `request_id` right before the next settlement claims it, as a
    /// concurrent delivery would between matching and settling.
    pub fn complete_before_next_settle(&self, request_id: Uuid) {
        self.state.lock().unwrap().complete_before_next_settle = Some(request_id);
    }

    fn pending(state: &State) -> impl Iterator<Item = &MemoryRequest> {
        state
            .requests
            .iter()
            .filter(|r| r.status == PaymentRequestStatus::Pending)
    }
}

#[async_trait]
impl PaymentLookup for MemoryLedger {
    async fn user_exists(&self, user_id: &str) -> Result<bool, LedgerError> {
        Ok(self.state.lock().unwrap().balances.contains_key(user_id))
    }

    async fn pending_by_code(&self, code: &str) -> Result<Option<PendingPayment>, LedgerError> {
        let state = self.state.lock().unwrap();
        Ok(Self::pending(&state)
            .find(|r| r.pending.payment_code == code)
            .map(|r| r.pending.clone()))
    }

    async fn recent_pending(
        &self,
        amount: Option<Decimal>,
        limit: i64,
    ) -> Result<Vec<PendingPayment>, LedgerError> {
        let state = self.state.lock().unwrap();
        let mut pending: Vec<PendingPayment> = Self::pending(&state)
            .filter(|r| amount.is_none_or(|a| r.pending.amount == a))
            .map(|r| r.pending.clone())
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn latest_pending_since(
        &self,
        amount: Decimal,
        since: time::PrimitiveDateTime,
    ) -> Result<Option<PendingPayment>, LedgerError> {
        let state = self.state.lock().unwrap();
        Ok(Self::pending(&state)
            .filter(|r| r.pending.amount == amount && r.pending.created_at >= since)
            .max_by_key(|r| r.pending.created_at)
            .map(|r| r.pending.clone()))
    }
}

#[async_trait]
impl WalletLedger for MemoryLedger {
    async fn record(&self, insert: TransactionInsert) -> Result<Recorded, LedgerError> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .transactions
            .iter()
            .find(|t| t.provider_id == insert.provider_id)
        {
            return Ok(match existing.status {
                TransactionStatus::Processed => Recorded::Duplicate(existing.id),
                _ => Recorded::Retry(existing.clone()),
            });
        }
        let record = TransactionRecord {
            id: state.transactions.len() as i64 + 1,
            provider_id: insert.provider_id,
            gateway: insert.gateway,
            transaction_date: insert.transaction_date,
            account_number: insert.account_number,
            code: insert.code,
            content: insert.content,
            transfer_type: insert.transfer_type,
            transfer_amount: insert.transfer_amount,
            accumulated: insert.accumulated,
            reference_code: insert.reference_code,
            description: insert.description,
            user_id: None,
            payment_request_id: None,
            status: TransactionStatus::Pending,
            created_at: insert.now,
            processed_at: None,
        };
        state.transactions.push(record.clone());
        Ok(Recorded::New(record))
    }

    async fn transaction(&self, id: i64) -> Result<Option<TransactionRecord>, LedgerError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn settle(&self, settlement: Settlement) -> Result<SettlementResult, LedgerError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next_settle) {
            return Err(LedgerError::Database(sqlx::Error::PoolTimedOut));
        }
        if let Some(request_id) = state.complete_before_next_settle.take() {
            if let Some(request) = state.requests.iter_mut().find(|r| r.pending.id == request_id) {
                request.status = PaymentRequestStatus::Completed;
            }
        }

        let tx_index = state
            .transactions
            .iter()
            .position(|t| t.id == settlement.transaction_id)
            .ok_or(LedgerError::Database(sqlx::Error::RowNotFound))?;
        let current = &state.transactions[tx_index];
        let eligible = match settlement.mode {
            SettleMode::Ingest => current.status != TransactionStatus::Processed,
            SettleMode::Reconcile => {
                current.status == TransactionStatus::Processed
                    && current.user_id.is_none()
                    && current.transfer_type == TransferDirection::In
            }
        };
        if !eligible {
            return Err(match settlement.mode {
                SettleMode::Ingest => LedgerError::AlreadyProcessed(settlement.transaction_id),
                SettleMode::Reconcile => LedgerError::NotReconcilable(settlement.transaction_id),
            });
        }

        let mut user_id = settlement.user_id;
        let mut credit = settlement.credit;
        let mut completed_request = None;
        let mut claim_lost = false;
        let mut claim_index = None;
        if let Some(request_id) = settlement.payment_request_id {
            match state.requests.iter().position(|r| {
                r.pending.id == request_id && r.status == PaymentRequestStatus::Pending
            }) {
                Some(i) => {
                    user_id = Some(state.requests[i].pending.user_id.clone());
                    completed_request = Some(request_id);
                    claim_index = Some(i);
                }
                None => {
                    claim_lost = true;
                    user_id = None;
                    credit = None;
                }
            }
        }

        let credited = match (&user_id, credit) {
            (Some(uid), Some(amount)) => {
                let balance = state
                    .balances
                    .get_mut(uid)
                    .ok_or_else(|| LedgerError::UserNotFound(uid.clone()))?;
                *balance += amount;
                Some(amount)
            }
            _ => None,
        };

        // Nothing is written above the credit, so an unknown user leaves no trace.
        if let Some(i) = claim_index {
            state.requests[i].status = PaymentRequestStatus::Completed;
            state.requests[i].transaction_id = Some(settlement.transaction_id);
        }
        let record = &mut state.transactions[tx_index];
        record.status = TransactionStatus::Processed;
        record.processed_at = Some(settlement.now);
        record.user_id = user_id.clone();
        record.payment_request_id = completed_request;

        Ok(SettlementResult {
            user_id,
            payment_request_id: completed_request,
            credited,
            claim_lost,
        })
    }

    async fn mark_failed(&self, transaction_id: i64) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        if let Some(t) = state
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction_id && t.status != TransactionStatus::Processed)
        {
            t.status = TransactionStatus::Failed;
        }
        Ok(())
    }
}
