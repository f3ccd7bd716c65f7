//! Deposit policy.

use rust_decimal::Decimal;

/// Rules for creating payment requests and the bank account they point to.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub code_prefix: String,
    pub expires_in: time::Duration,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Receiving bank account number.
    pub bank_account: String,
    /// Bank short name as understood by VietQR (e.g. `MBBank`).
    pub bank_name: String,
}

impl PaymentConfig {
    pub fn amount_in_range(&self, amount: Decimal) -> bool {
        amount >= self.min_amount && amount <= self.max_amount
    }
}
