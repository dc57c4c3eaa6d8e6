use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::auth::verify_password;
use crate::rest::error::ApiError;
use crate::AppContext;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/token` — exchange username/password for a bearer token.
pub async fn issue_token(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = ctx.storage.find_user(&body.username).await?;
    let valid = user
        .as_ref()
        .map(|u| u.is_active && verify_password(&body.password, &u.password_digest))
        .unwrap_or(false);
    if !valid {
        return Err(ApiError::Unauthorized("bad credentials".to_string()));
    }

    let token = ctx.tokens.issue(&body.username).await;
    info!(username = %body.username, "issued bearer token");
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
    })))
}
