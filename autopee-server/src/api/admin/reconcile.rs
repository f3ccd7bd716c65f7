use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use autopee_core::entities::transactions::GetTransactionById;
use autopee_core::processor::Reconciliation;
use autopee_core::utils::clock;
use autopee_sdk::objects::admin::ReconcileRequest;
use kanau::processor::Processor;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, transaction_to_admin_response};

/// `POST /transactions/{id}/reconcile`: credit an unresolved inbound
/// transfer to a user.
///
/// Only transactions that were processed without a resolved user qualify.
/// When `payment_code` is given, that pending request of the same user is
/// completed along with the credit.
pub async fn reconcile_transaction(
    state: State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
    Json(body): Json<ReconcileRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let payment_code = body
        .payment_code
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty());

    state
        .transactions
        .reconcile(
            Reconciliation {
                transaction_id: id,
                user_id: body.user_id.trim().to_string(),
                payment_code,
            },
            clock::utc_now(),
        )
        .await
        .map_err(AdminApiError::Reconcile)?;

    let updated = state
        .processor()
        .process(GetTransactionById { id })
        .await
        .map_err(AdminApiError::Database)?
        .ok_or(AdminApiError::NotFound("transaction"))?;

    Ok(Json(transaction_to_admin_response(&updated)))
}
