pub mod api_tokens;
pub mod payment_requests;
pub mod transactions;
pub mod users;

use autopee_sdk::objects::{
    PaymentRequestStatus as SdkPaymentRequestStatus, TransactionStatus as SdkTransactionStatus,
    TransferType,
};

/// Transfer direction for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `autopee_sdk::objects::TransferType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "transfer_direction")]
pub enum TransferDirection {
    In,
    Out,
}

impl From<TransferDirection> for TransferType {
    fn from(value: TransferDirection) -> Self {
        match value {
            TransferDirection::In => TransferType::In,
            TransferDirection::Out => TransferType::Out,
        }
    }
}

impl From<TransferType> for TransferDirection {
    fn from(value: TransferType) -> Self {
        match value {
            TransferType::In => TransferDirection::In,
            TransferType::Out => TransferDirection::Out,
        }
    }
}

/// Transaction processing status for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "transaction_status")]
pub enum TransactionStatus {
    Pending,
    Processed,
    Failed,
}

impl From<TransactionStatus> for SdkTransactionStatus {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Pending => SdkTransactionStatus::Pending,
            TransactionStatus::Processed => SdkTransactionStatus::Processed,
            TransactionStatus::Failed => SdkTransactionStatus::Failed,
        }
    }
}

impl From<SdkTransactionStatus> for TransactionStatus {
    fn from(value: SdkTransactionStatus) -> Self {
        match value {
            SdkTransactionStatus::Pending => TransactionStatus::Pending,
            SdkTransactionStatus::Processed => TransactionStatus::Processed,
            SdkTransactionStatus::Failed => TransactionStatus::Failed,
        }
    }
}

/// Payment request status for database operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "payment_request_status")]
pub enum PaymentRequestStatus {
    Pending,
    Completed,
    Expired,
    Cancelled,
}

impl std::fmt::Display for PaymentRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&SdkPaymentRequestStatus::from(*self), f)
    }
}

impl From<PaymentRequestStatus> for SdkPaymentRequestStatus {
    fn from(value: PaymentRequestStatus) -> Self {
        match value {
            PaymentRequestStatus::Pending => SdkPaymentRequestStatus::Pending,
            PaymentRequestStatus::Completed => SdkPaymentRequestStatus::Completed,
            PaymentRequestStatus::Expired => SdkPaymentRequestStatus::Expired,
            PaymentRequestStatus::Cancelled => SdkPaymentRequestStatus::Cancelled,
        }
    }
}

impl From<SdkPaymentRequestStatus> for PaymentRequestStatus {
    fn from(value: SdkPaymentRequestStatus) -> Self {
        match value {
            SdkPaymentRequestStatus::Pending => PaymentRequestStatus::Pending,
            SdkPaymentRequestStatus::Completed => PaymentRequestStatus::Completed,
            SdkPaymentRequestStatus::Expired => PaymentRequestStatus::Expired,
            SdkPaymentRequestStatus::Cancelled => PaymentRequestStatus::Cancelled,
        }
    }
}
