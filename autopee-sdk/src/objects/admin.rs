//! Admin API request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deposit::PaymentRequestStatus;
use super::sepay::TransferType;
use super::wallet::TransactionStatus;
use super::default_limit;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Full transaction record, including reconciliation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminTransactionResponse {
    pub id: i64,
    pub provider_id: i64,
    pub gateway: String,
    pub transaction_date: Option<i64>,
    pub account_number: String,
    pub code: Option<String>,
    pub content: String,
    pub transfer_type: TransferType,
    pub transfer_amount: Decimal,
    pub reference_code: Option<String>,
    pub user_id: Option<String>,
    pub payment_request_id: Option<Uuid>,
    pub status: TransactionStatus,
    pub created_at: i64,
    pub processed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPaymentRequestResponse {
    pub id: Uuid,
    pub user_id: String,
    pub payment_code: String,
    pub amount: Decimal,
    pub status: PaymentRequestStatus,
    pub transaction_id: Option<i64>,
    pub created_at: i64,
    pub expires_at: i64,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub balance: Decimal,
    pub created_at: i64,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /admin/transactions/{id}/reconcile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// User whose wallet receives the transfer.
    pub user_id: String,
    /// Pending payment request to complete along with the credit.
    #[serde(default)]
    pub payment_code: Option<String>,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Query parameters for listing transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTransactionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub status: Option<TransactionStatus>,
    /// Only transactions without a resolved user.
    #[serde(default)]
    pub unresolved: bool,
}

/// Query parameters for listing payment requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPaymentRequestsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub status: Option<PaymentRequestStatus>,
    pub user_id: Option<String>,
}
