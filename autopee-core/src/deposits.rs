//! Payment request lifecycle: create, poll, cancel.
//!
//! Requests move `pending -> completed | expired | cancelled` and never leave a
//! terminal state. Expiry is applied lazily: a pending request past its
//! `expires_at` is flipped to `expired` the next time someone reads it.

use crate::config::PaymentConfig;
use crate::entities::PaymentRequestStatus;
use crate::entities::payment_requests::{
    ClosePendingRequest, GetUserPaymentRequest, ListPaymentRequests, PaymentRequest,
    PaymentRequestInsert,
};
use crate::framework::DatabaseProcessor;
use crate::utils::{clock, payment_code};
use autopee_sdk::objects::DepositResponse;
use autopee_sdk::objects::deposit::TransferInstructions;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// SePay's VietQR image endpoint.
pub const QR_IMAGE_BASE: &str = "https://qr.sepay.vn/img";

/// Attempts at finding an unused payment code.
const CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum DepositError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("amount must be between {min} and {max}")]
    AmountOutOfRange { min: Decimal, max: Decimal },

    #[error("payment request not found")]
    NotFound,

    #[error("payment request is {0}")]
    NotPending(PaymentRequestStatus),

    #[error("could not allocate a unique payment code")]
    CodeExhausted,

    #[error("invalid QR url: {0}")]
    QrUrl(#[from] url::ParseError),
}

/// Status a request has at `now`, taking unswept expiry into account.
pub fn effective_status(
    request: &PaymentRequest,
    now: time::PrimitiveDateTime,
) -> PaymentRequestStatus {
    match request.status {
        PaymentRequestStatus::Pending if request.expires_at <= now => {
            PaymentRequestStatus::Expired
        }
        status => status,
    }
}

pub fn validate_amount(config: &PaymentConfig, amount: Decimal) -> Result<(), DepositError> {
    if config.amount_in_range(amount) {
        Ok(())
    } else {
        Err(DepositError::AmountOutOfRange {
            min: config.min_amount,
            max: config.max_amount,
        })
    }
}

/// Bank transfer details for a payment code, including the VietQR image.
pub fn transfer_instructions(
    config: &PaymentConfig,
    payment_code: &str,
    amount: Decimal,
) -> Result<TransferInstructions, url::ParseError> {
    let amount = amount.normalize().to_string();
    let qr_url = Url::parse_with_params(
        QR_IMAGE_BASE,
        &[
            ("acc", config.bank_account.as_str()),
            ("bank", config.bank_name.as_str()),
            ("amount", amount.as_str()),
            ("des", payment_code),
        ],
    )?;
    Ok(TransferInstructions {
        bank_name: config.bank_name.clone(),
        bank_account: config.bank_account.clone(),
        memo: payment_code.to_string(),
        qr_url: qr_url.to_string(),
    })
}

/// Wire view of a request. Transfer instructions are only attached while the
/// request can still be paid.
pub fn to_response(
    request: &PaymentRequest,
    config: &PaymentConfig,
    now: time::PrimitiveDateTime,
) -> Result<DepositResponse, DepositError> {
    let status = effective_status(request, now);
    let transfer = match status {
        PaymentRequestStatus::Pending => Some(transfer_instructions(
            config,
            &request.payment_code,
            request.amount,
        )?),
        _ => None,
    };
    Ok(DepositResponse {
        payment_code: request.payment_code.clone(),
        amount: request.amount,
        status: status.into(),
        created_at: clock::unix(request.created_at),
        expires_at: clock::unix(request.expires_at),
        completed_at: request.completed_at.map(clock::unix),
        transfer,
    })
}

/// Deposit operations on behalf of one user.
pub struct Deposits<'a> {
    processor: &'a DatabaseProcessor,
}

impl<'a> Deposits<'a> {
    pub fn new(processor: &'a DatabaseProcessor) -> Self {
        Self { processor }
    }

    /// Open a new pending request with a freshly generated payment code.
    #[tracing::instrument(skip_all, fields(user_id = %user_id, amount = %amount))]
    pub async fn create(
        &self,
        user_id: &str,
        amount: Decimal,
        config: &PaymentConfig,
        now: time::PrimitiveDateTime,
    ) -> Result<PaymentRequest, DepositError> {
        validate_amount(config, amount)?;
        let expires_at = now + config.expires_in;

        for attempt in 1..=CODE_ATTEMPTS {
            let code = payment_code::generate(&config.code_prefix);
            let inserted = self
                .processor
                .process(PaymentRequestInsert {
                    user_id: user_id.to_string(),
                    payment_code: code.clone(),
                    amount,
                    expires_at,
                    now,
                })
                .await?;
            match inserted {
                Some(request) => {
                    info!(payment_code = %request.payment_code, "Payment request created");
                    return Ok(request);
                }
                None => warn!(attempt, payment_code = %code, "Payment code collision"),
            }
        }
        Err(DepositError::CodeExhausted)
    }

    /// Fetch one of the user's requests, expiring it if its time has passed.
    #[tracing::instrument(skip_all, fields(user_id = %user_id, payment_code = %code))]
    pub async fn status(
        &self,
        user_id: &str,
        code: &str,
        now: time::PrimitiveDateTime,
    ) -> Result<PaymentRequest, DepositError> {
        let request = self.fetch(user_id, code).await?;
        if request.status == PaymentRequestStatus::Pending && request.expires_at <= now {
            return self.close(request, PaymentRequestStatus::Expired).await;
        }
        Ok(request)
    }

    /// Cancel a pending, unexpired request.
    #[tracing::instrument(skip_all, fields(user_id = %user_id, payment_code = %code))]
    pub async fn cancel(
        &self,
        user_id: &str,
        code: &str,
        now: time::PrimitiveDateTime,
    ) -> Result<PaymentRequest, DepositError> {
        let request = self.status(user_id, code, now).await?;
        if request.status != PaymentRequestStatus::Pending {
            return Err(DepositError::NotPending(request.status));
        }
        let closed = self.close(request, PaymentRequestStatus::Cancelled).await?;
        match closed.status {
            PaymentRequestStatus::Cancelled => {
                info!("Payment request cancelled");
                Ok(closed)
            }
            other => Err(DepositError::NotPending(other)),
        }
    }

    pub async fn list(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentRequest>, DepositError> {
        Ok(self
            .processor
            .process(ListPaymentRequests {
                limit,
                offset,
                status: None,
                user_id: Some(user_id.to_string()),
            })
            .await?)
    }

    async fn fetch(&self, user_id: &str, code: &str) -> Result<PaymentRequest, DepositError> {
        self.processor
            .process(GetUserPaymentRequest {
                user_id: user_id.to_string(),
                payment_code: code.to_string(),
            })
            .await?
            .ok_or(DepositError::NotFound)
    }

    /// Conditionally move a pending request to `status`. If it left `pending`
    /// concurrently, the current row is returned instead.
    async fn close(
        &self,
        request: PaymentRequest,
        status: PaymentRequestStatus,
    ) -> Result<PaymentRequest, DepositError> {
        let updated = self
            .processor
            .process(ClosePendingRequest {
                id: request.id,
                status,
            })
            .await?;
        match updated {
            Some(updated) => Ok(updated),
            None => self.fetch(&request.user_id, &request.payment_code).await,
        }
    }
}
