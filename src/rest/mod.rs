// rest/mod.rs — HTTP API server.
//
// Axum server exposing the reporting API. CORS is permissive (internal
// network). Everything except /api/health and /api/auth/token sits behind
// the access-gate middleware (API key or bearer token).
//
// Endpoints:
//   GET  /api/health
//   POST /api/auth/token
//   GET  /api/partners            POST /api/partners
//   GET  /api/transactions       GET /api/transactions/errors
//   GET  /api/status-codes       GET /api/status-codes/{code}
//   GET  /api/kpi/partner
//   GET  /api/kpi/message-count
//   GET  /api/kpi/message-type
//   GET  /api/kpi/error-rate

pub mod auth;
pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let gated = Router::new()
        .route(
            "/api/partners",
            get(routes::partners::list_partners).post(routes::partners::create_partner),
        )
        .route("/api/transactions", get(routes::transactions::list_transactions))
        .route("/api/transactions/errors", get(routes::transactions::list_errors))
        .route("/api/status-codes", get(routes::status_codes::list_codes))
        .route("/api/status-codes/{code}", get(routes::status_codes::get_code))
        .route("/api/kpi/partner", get(routes::kpi::partner))
        .route("/api/kpi/message-count", get(routes::kpi::message_count))
        .route("/api/kpi/message-type", get(routes::kpi::message_type))
        .route("/api/kpi/error-rate", get(routes::kpi::error_rate))
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            auth::require_access,
        ));

    Router::new()
        // Public routes (no credential)
        .route("/api/health", get(routes::health::health))
        .route("/api/auth/token", post(routes::token::issue_token))
        .merge(gated)
        .layer(middleware::from_fn(log_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(ctx)
}

/// Log one line per request: method, path, status, elapsed ms.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let start = Instant::now();
    let response = next.run(req).await;
    info!(
        %method,
        path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    response
}
