pub mod admin;
pub mod deposit;
pub mod error;
pub mod sepay;
pub mod token;
pub mod wallet;

pub use deposit::{CreateDepositRequest, DepositResponse, PaymentRequestStatus};
pub use error::ErrorBody;
pub use sepay::{SepayWebhookPayload, TransferType, WebhookAck};
pub use wallet::{TransactionStatus, WalletResponse, WalletTransactionResponse};

use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 200;
const MAX_OFFSET: i64 = 100_000;

/// Plain `limit` / `offset` query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

pub(crate) fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamp limit and offset to safe maximums.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.clamp(0, MAX_OFFSET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_pagination() {
        assert_eq!(clamp_pagination(20, 0), (20, 0));
        assert_eq!(clamp_pagination(0, -5), (1, 0));
        assert_eq!(clamp_pagination(10_000, 1_000_000), (200, 100_000));
    }

    #[test]
    fn test_page_query_defaults() {
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit, 20);
        assert_eq!(q.offset, 0);
    }
}
