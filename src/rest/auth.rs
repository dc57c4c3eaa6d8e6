//! Access-gate middleware.
//!
//! Every gated route accepts either credential:
//!   - `X-API-Key: <key>` matching the configured shared key, or
//!   - `Authorization: Bearer <token>` with a token issued by
//!     `POST /api/auth/token`.
//!
//! A missing or invalid credential short-circuits with 401 before any
//! handler logic runs.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::auth::bearer_token;
use crate::AppContext;

pub async fn require_access(
    State(ctx): State<Arc<AppContext>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(key) = req.headers().get("x-api-key").and_then(|v| v.to_str().ok()) {
        if key == ctx.config.api_key {
            return next.run(req).await;
        }
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);
    if let Some(token) = token {
        if ctx.tokens.validate(token).await.is_some() {
            return next.run(req).await;
        }
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid or missing API key or bearer token" })),
    )
        .into_response()
}
