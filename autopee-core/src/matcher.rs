//! Payment code matcher.
//!
//! Resolves the user (and, usually, the payment request) behind a bank
//! transfer from its explicit code, its free-text memo and its amount.
//! Strategies run in a fixed order and the first hit wins:
//!
//! 1. the explicit code is a user id
//! 2. the explicit code is a pending payment code
//! 3. a whitespace-separated memo token (12+ chars) is a pending payment code
//! 4. a recent pending payment code appears anywhere in the memo
//! 5. the first 8 characters of a recent pending payment code appear in the memo
//! 6. an inbound transfer has the same amount as a request created in the
//!    last 5 minutes
//!
//! Strategy 6 does not look at the memo at all, so every hit is logged for
//! manual audit.

use crate::entities::TransferDirection;
use crate::entities::payment_requests::PendingPayment;
use crate::ledger::{LedgerError, PaymentLookup};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Minimum length of a memo token considered as a payment code.
pub const MIN_TOKEN_LEN: usize = 12;

/// How many recent pending requests the substring strategies scan.
pub const CANDIDATE_LIMIT: i64 = 20;

/// Length of the code prefix used by the fuzzy strategy.
pub const FUZZY_PREFIX_LEN: usize = 8;

/// Window for the amount-only fallback.
pub const AMOUNT_WINDOW: time::Duration = time::Duration::minutes(5);

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    UserId,
    ExactCode,
    ContentToken,
    ContentSubstring,
    CodePrefix,
    AmountWindow,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MatchStrategy::UserId => "user_id",
            MatchStrategy::ExactCode => "exact_code",
            MatchStrategy::ContentToken => "content_token",
            MatchStrategy::ContentSubstring => "content_substring",
            MatchStrategy::CodePrefix => "code_prefix",
            MatchStrategy::AmountWindow => "amount_window",
        };
        f.write_str(name)
    }
}

/// The transaction fields the matcher looks at.
#[derive(Debug, Clone)]
pub struct MatchInput<'a> {
    pub code: Option<&'a str>,
    pub content: &'a str,
    pub transfer_amount: Decimal,
    pub transfer_type: TransferDirection,
    pub now: time::PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub user_id: Option<String>,
    pub payment_request: Option<PendingPayment>,
    pub strategy: Option<MatchStrategy>,
}

impl MatchOutcome {
    pub fn unresolved() -> Self {
        Self {
            user_id: None,
            payment_request: None,
            strategy: None,
        }
    }

    fn user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_owned()),
            payment_request: None,
            strategy: Some(MatchStrategy::UserId),
        }
    }

    fn request(request: PendingPayment, strategy: MatchStrategy) -> Self {
        Self {
            user_id: Some(request.user_id.clone()),
            payment_request: Some(request),
            strategy: Some(strategy),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Runs the matching strategies against a [`PaymentLookup`].
pub struct PaymentMatcher<'a, L: ?Sized> {
    lookup: &'a L,
}

impl<'a, L: PaymentLookup + ?Sized> PaymentMatcher<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    pub async fn resolve(&self, input: &MatchInput<'_>) -> Result<MatchOutcome, LedgerError> {
        let code = input.code.map(str::trim).filter(|c| !c.is_empty());

        if let Some(code) = code {
            if self.lookup.user_exists(code).await? {
                return Ok(MatchOutcome::user(code));
            }
            if let Some(request) = self.lookup.pending_by_code(code).await? {
                return Ok(MatchOutcome::request(request, MatchStrategy::ExactCode));
            }
        }

        for token in code_tokens(input.content) {
            if let Some(request) = self.lookup.pending_by_code(token).await? {
                return Ok(MatchOutcome::request(request, MatchStrategy::ContentToken));
            }
        }

        if !input.content.trim().is_empty() {
            let amount_filter =
                (input.transfer_amount > Decimal::ZERO).then_some(input.transfer_amount);
            let candidates = self
                .lookup
                .recent_pending(amount_filter, CANDIDATE_LIMIT)
                .await?;

            if let Some(request) = find_by_substring(input.content, &candidates) {
                return Ok(MatchOutcome::request(
                    request.clone(),
                    MatchStrategy::ContentSubstring,
                ));
            }
            if let Some(request) = find_by_prefix(input.content, &candidates) {
                return Ok(MatchOutcome::request(
                    request.clone(),
                    MatchStrategy::CodePrefix,
                ));
            }
        }

        if input.transfer_type == TransferDirection::In && input.transfer_amount > Decimal::ZERO {
            let since = input.now - AMOUNT_WINDOW;
            if let Some(request) = self
                .lookup
                .latest_pending_since(input.transfer_amount, since)
                .await?
            {
                warn!(
                    payment_code = %request.payment_code,
                    user_id = %request.user_id,
                    amount = %input.transfer_amount,
                    content = %input.content,
                    "Matched transfer by amount and time window only, audit manually"
                );
                return Ok(MatchOutcome::request(request, MatchStrategy::AmountWindow));
            }
        }

        debug!(
            amount = %input.transfer_amount,
            content = %input.content,
            "No payment request matched"
        );
        Ok(MatchOutcome::unresolved())
    }
}

/// Memo tokens long enough to be payment codes, in order, without repeats.
fn code_tokens(content: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for token in content.split_whitespace() {
        if token.chars().count() >= MIN_TOKEN_LEN && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

fn find_by_substring<'c>(
    content: &str,
    candidates: &'c [PendingPayment],
) -> Option<&'c PendingPayment> {
    candidates
        .iter()
        .find(|c| !c.payment_code.is_empty() && content.contains(c.payment_code.as_str()))
}

fn find_by_prefix<'c>(
    content: &str,
    candidates: &'c [PendingPayment],
) -> Option<&'c PendingPayment> {
    candidates.iter().find(|c| {
        let prefix: String = c.payment_code.chars().take(FUZZY_PREFIX_LEN).collect();
        !prefix.is_empty() && content.contains(prefix.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::MemoryLedger;
    use time::macros::datetime;

    const NOW: time::PrimitiveDateTime = datetime!(2026-10-17 10:00:00);

    fn input<'a>(code: Option<&'a str>, content: &'a str, amount: i64) -> MatchInput<'a> {
        MatchInput {
            code,
            content,
            transfer_amount: Decimal::from(amount),
            transfer_type: TransferDirection::In,
            now: NOW,
        }
    }

    fn ledger_with_request(created_at: time::PrimitiveDateTime) -> MemoryLedger {
        let ledger = MemoryLedger::new();
        ledger.add_user("uid-alice", Decimal::ZERO);
        ledger.add_request(
            "uid-alice",
            "ABC12345XYZ999",
            Decimal::from(50_000),
            created_at,
        );
        ledger
    }

    #[tokio::test]
    async fn test_code_is_user_id() {
        let ledger = ledger_with_request(NOW);
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(Some("uid-alice"), "ABC12345XYZ999", 50_000))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, Some(MatchStrategy::UserId));
        assert_eq!(outcome.user_id.as_deref(), Some("uid-alice"));
        assert!(outcome.payment_request.is_none());
    }

    #[tokio::test]
    async fn test_code_is_payment_code() {
        let ledger = ledger_with_request(NOW);
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(Some("ABC12345XYZ999"), "", 1))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, Some(MatchStrategy::ExactCode));
        assert_eq!(
            outcome.payment_request.unwrap().payment_code,
            "ABC12345XYZ999"
        );
    }

    #[tokio::test]
    async fn test_content_token() {
        let ledger = ledger_with_request(NOW - time::Duration::hours(2));
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(
                None,
                "NGUYEN VAN A ABC12345XYZ999 chuyen tien",
                50_000,
            ))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, Some(MatchStrategy::ContentToken));
        assert_eq!(outcome.user_id.as_deref(), Some("uid-alice"));
    }

    #[tokio::test]
    async fn test_unknown_explicit_code_falls_through_to_content() {
        let ledger = ledger_with_request(NOW - time::Duration::hours(2));
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(
                Some("ZZZ"),
                "NGUYEN VAN A ABC12345XYZ999 chuyen tien",
                50_000,
            ))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, Some(MatchStrategy::ContentToken));
    }

    #[tokio::test]
    async fn test_content_substring_when_glued_to_other_text() {
        let ledger = ledger_with_request(NOW - time::Duration::hours(2));
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(None, "MBVCB.123.ABC12345XYZ999.CT", 50_000))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, Some(MatchStrategy::ContentSubstring));
    }

    #[tokio::test]
    async fn test_substring_respects_amount_filter() {
        let ledger = ledger_with_request(NOW - time::Duration::hours(2));
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(None, "MBVCB.123.ABC12345XYZ999.CT", 49_000))
            .await
            .unwrap();
        assert_eq!(outcome, MatchOutcome::unresolved());
    }

    #[tokio::test]
    async fn test_code_prefix_fuzzy_match() {
        let ledger = ledger_with_request(NOW - time::Duration::hours(2));
        // The bank truncated the memo after 8 characters of the code.
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(None, "CK ABC12345", 50_000))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, Some(MatchStrategy::CodePrefix));
    }

    #[tokio::test]
    async fn test_shared_prefix_alone_does_not_match() {
        let ledger = MemoryLedger::new();
        ledger.add_user("uid-alice", Decimal::ZERO);
        ledger.add_user("uid-bob", Decimal::ZERO);
        ledger.add_request(
            "uid-alice",
            "AUTOKX7PQ2MNB4RT",
            Decimal::from(50_000),
            NOW - time::Duration::hours(3),
        );
        ledger.add_request(
            "uid-bob",
            "AUTOW9HC3VDL8ZEY",
            Decimal::from(50_000),
            NOW - time::Duration::hours(1),
        );

        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(None, "CK AUTO-ZZZZ", 50_000))
            .await
            .unwrap();
        assert_eq!(outcome, MatchOutcome::unresolved());

        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(None, "CK AUTOKX7P", 50_000))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, Some(MatchStrategy::CodePrefix));
        assert_eq!(outcome.user_id.as_deref(), Some("uid-alice"));
    }

    #[tokio::test]
    async fn test_amount_window_fallback() {
        let ledger = ledger_with_request(NOW - time::Duration::minutes(3));
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(None, "chuyen tien 50000", 50_000))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, Some(MatchStrategy::AmountWindow));
        assert_eq!(outcome.user_id.as_deref(), Some("uid-alice"));
    }

    #[tokio::test]
    async fn test_amount_window_expired() {
        let ledger = ledger_with_request(NOW - time::Duration::minutes(6));
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(None, "chuyen tien 50000", 50_000))
            .await
            .unwrap();
        assert!(!outcome.is_resolved());
    }

    #[tokio::test]
    async fn test_amount_window_ignores_outbound() {
        let ledger = ledger_with_request(NOW - time::Duration::minutes(1));
        let mut outbound = input(None, "chuyen tien 50000", 50_000);
        outbound.transfer_type = TransferDirection::Out;
        let outcome = PaymentMatcher::new(&ledger).resolve(&outbound).await.unwrap();
        assert!(!outcome.is_resolved());
    }

    #[tokio::test]
    async fn test_amount_window_picks_most_recent() {
        let ledger = ledger_with_request(NOW - time::Duration::minutes(4));
        ledger.add_user("uid-bob", Decimal::ZERO);
        ledger.add_request(
            "uid-bob",
            "BOB99999999999",
            Decimal::from(50_000),
            NOW - time::Duration::minutes(1),
        );
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(None, "nap tien", 50_000))
            .await
            .unwrap();
        assert_eq!(outcome.user_id.as_deref(), Some("uid-bob"));
    }

    #[tokio::test]
    async fn test_completed_requests_are_not_candidates() {
        let ledger = MemoryLedger::new();
        ledger.add_user("uid-alice", Decimal::ZERO);
        let id = ledger.add_request(
            "uid-alice",
            "ABC12345XYZ999",
            Decimal::from(50_000),
            NOW,
        );
        ledger.set_request_status(id, crate::entities::PaymentRequestStatus::Completed);
        let outcome = PaymentMatcher::new(&ledger)
            .resolve(&input(Some("ABC12345XYZ999"), "ABC12345XYZ999", 50_000))
            .await
            .unwrap();
        assert!(!outcome.is_resolved());
    }

    #[test]
    fn test_code_tokens() {
        assert_eq!(
            code_tokens("a ABC12345XYZ999  short ABC12345XYZ999 DEF12345XYZ000"),
            vec!["ABC12345XYZ999", "DEF12345XYZ000"]
        );
        assert!(code_tokens("").is_empty());
        assert!(code_tokens("ELEVENCHARS").is_empty());
        assert_eq!(code_tokens("TWELVECHARSS"), vec!["TWELVECHARSS"]);
    }
}
