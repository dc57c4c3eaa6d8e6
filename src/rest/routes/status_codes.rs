use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::rest::error::ApiError;
use crate::storage::StatusCodeRow;
use crate::AppContext;

pub async fn list_codes(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<StatusCodeRow>>, ApiError> {
    let codes = ctx.storage.list_status_codes().await?;
    Ok(Json(codes))
}

pub async fn get_code(
    State(ctx): State<Arc<AppContext>>,
    Path(code): Path<i64>,
) -> Result<Json<StatusCodeRow>, ApiError> {
    match ctx.storage.get_status_code(code).await? {
        Some(row) => Ok(Json(row)),
        None => Err(ApiError::NotFound(format!("status code {code} not found"))),
    }
}
