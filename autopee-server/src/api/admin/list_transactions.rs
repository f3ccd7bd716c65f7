use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use autopee_core::entities::transactions::ListTransactions;
use autopee_sdk::objects::admin::ListTransactionsQuery;
use autopee_sdk::objects::clamp_pagination;
use kanau::processor::Processor;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, transaction_to_admin_response};

/// `GET /transactions`: list transactions, newest first.
///
/// `unresolved=true` narrows the list to transfers no user could be matched
/// to, the queue for manual reconciliation.
pub async fn list_transactions(
    state: State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let records = state
        .processor()
        .process(ListTransactions {
            limit,
            offset,
            status: query.status.map(Into::into),
            unresolved_only: query.unresolved,
        })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(
        records
            .iter()
            .map(transaction_to_admin_response)
            .collect::<Vec<_>>(),
    ))
}
