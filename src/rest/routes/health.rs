use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppContext;

pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let uptime = ctx.started_at.elapsed().as_secs();
    let db_ok = sqlx::query("SELECT 1")
        .execute(&ctx.storage.pool())
        .await
        .is_ok();
    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "uptime_secs": uptime,
        "version": env!("CARGO_PKG_VERSION"),
        "db_ok": db_ok,
    }))
}
