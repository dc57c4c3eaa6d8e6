use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::rest::error::ApiError;
use crate::storage::{TransactionQuery, TransactionRow};
use crate::AppContext;

/// `GET /api/transactions` — list the transaction log, newest first.
/// All query params are optional and ANDed: `partner_id`, `message_type`,
/// `direction`, `status`, `from`, `to`.
pub async fn list_transactions(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<Vec<TransactionRow>>, ApiError> {
    let rows = ctx.storage.list_transactions(&params).await?;
    Ok(Json(rows))
}

/// `GET /api/transactions/errors` — every transaction whose status is not
/// the success code.
pub async fn list_errors(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<TransactionRow>>, ApiError> {
    let rows = ctx.storage.list_error_transactions().await?;
    Ok(Json(rows))
}
