//! Wallet balance and history types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::sepay::TransferType;

/// Processing status of a recorded bank transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processed,
    Failed,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Processed => write!(f, "processed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub user_id: String,
    pub balance: Decimal,
}

/// A bank transaction credited to the caller's wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransactionResponse {
    pub id: i64,
    pub gateway: String,
    pub transfer_type: TransferType,
    pub transfer_amount: Decimal,
    pub content: String,
    pub reference_code: Option<String>,
    pub transaction_date: Option<i64>,
    pub processed_at: Option<i64>,
}
