pub mod auth;
pub mod config;
pub mod kpi;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use auth::TokenStore;
use config::ServerConfig;
use storage::Storage;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    /// In-memory bearer token table for interactive clients.
    pub tokens: Arc<TokenStore>,
    pub started_at: std::time::Instant,
}
