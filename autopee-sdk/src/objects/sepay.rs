//! SePay bank-transfer webhook payload.
//!
//! SePay posts one JSON object per bank transaction to the configured
//! webhook URL and retries until it receives a 2xx answer.
//!
//! ```json
//! {
//!   "id": 92704,
//!   "gateway": "Vietcombank",
//!   "transactionDate": "2023-03-25 14:02:37",
//!   "accountNumber": "0123499999",
//!   "code": null,
//!   "content": "chuyen tien mua iphone",
//!   "transferType": "in",
//!   "transferAmount": 2277000,
//!   "accumulated": 19077000,
//!   "subAccount": null,
//!   "referenceCode": "MBVCB.3278907687",
//!   "description": ""
//! }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use time::macros::format_description;

/// Direction of a bank transfer relative to the receiving account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    In,
    Out,
}

impl std::fmt::Display for TransferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferType::In => write!(f, "in"),
            TransferType::Out => write!(f, "out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SepayWebhookPayload {
    /// SePay's transaction id, unique per bank transaction.
    pub id: i64,
    #[serde(default)]
    pub gateway: String,
    /// Bank-local time, `YYYY-MM-DD hh:mm:ss`.
    #[serde(default)]
    pub transaction_date: String,
    #[serde(default)]
    pub account_number: String,
    /// Payment code SePay extracted from the memo, if any.
    #[serde(default)]
    pub code: Option<String>,
    /// Free-text transfer memo.
    #[serde(default)]
    pub content: String,
    pub transfer_type: TransferType,
    pub transfer_amount: Decimal,
    #[serde(default)]
    pub accumulated: Decimal,
    #[serde(default)]
    pub sub_account: Option<String>,
    #[serde(default)]
    pub reference_code: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl SepayWebhookPayload {
    /// Parse [`transaction_date`](Self::transaction_date).
    ///
    /// Returns `None` when SePay sent an empty or malformed value.
    pub fn parsed_transaction_date(&self) -> Option<PrimitiveDateTime> {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        PrimitiveDateTime::parse(self.transaction_date.trim(), format).ok()
    }

    /// The explicit code, with blank strings treated as absent.
    pub fn explicit_code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Body returned to SePay. Anything but `success: true` with a 2xx status
/// makes SePay retry the delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            success: true,
            message: Some("duplicate transaction".to_string()),
        }
    }
}
