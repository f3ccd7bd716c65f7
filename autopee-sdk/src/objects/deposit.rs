//! Deposit (payment request) lifecycle types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status of a payment request.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRequestStatus {
    Pending,
    Completed,
    Expired,
    Cancelled,
}

impl PaymentRequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentRequestStatus::Pending)
    }
}

impl std::fmt::Display for PaymentRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentRequestStatus::Pending => write!(f, "pending"),
            PaymentRequestStatus::Completed => write!(f, "completed"),
            PaymentRequestStatus::Expired => write!(f, "expired"),
            PaymentRequestStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// `POST /payment/deposit` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDepositRequest {
    pub amount: Decimal,
}

/// Bank transfer instructions shown to the user after creating a deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInstructions {
    pub bank_name: String,
    pub bank_account: String,
    /// Text the user must put in the transfer memo.
    pub memo: String,
    /// VietQR image encoding account, amount and memo.
    pub qr_url: String,
}

/// A payment request as seen by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositResponse {
    pub payment_code: String,
    pub amount: Decimal,
    pub status: PaymentRequestStatus,
    pub created_at: i64,
    pub expires_at: i64,
    pub completed_at: Option<i64>,
    /// Only present in the response to `POST /payment/deposit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferInstructions>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentRequestStatus::Cancelled).unwrap(),
            r#""cancelled""#
        );
        let parsed: PaymentRequestStatus = serde_json::from_str(r#""completed""#).unwrap();
        assert_eq!(parsed, PaymentRequestStatus::Completed);
        assert!(parsed.is_terminal());
        assert!(!PaymentRequestStatus::Pending.is_terminal());
    }

    #[test]
    fn test_create_request_accepts_number_and_string() {
        let a: CreateDepositRequest = serde_json::from_str(r#"{"amount": 50000}"#).unwrap();
        let b: CreateDepositRequest = serde_json::from_str(r#"{"amount": "50000"}"#).unwrap();
        assert_eq!(a, b);
    }
}
