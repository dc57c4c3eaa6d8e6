//! Access credentials — password digests and short-lived bearer tokens.
//!
//! Two credentials open the gated API surface: the shared `X-API-Key` header
//! (checked directly against the configured key in the REST middleware) and a
//! bearer token obtained from `POST /api/auth/token` with a username/password.
//! Tokens are random 32-character hex strings held in an in-memory store with
//! a TTL; restarting the server invalidates all of them.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest as _, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// SHA-256 hex digest of a password, as stored in the `users` table.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    password_digest(password) == digest
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ")
}

struct TokenEntry {
    username: String,
    expires_at: DateTime<Utc>,
}

/// In-memory bearer token table.
pub struct TokenStore {
    ttl: Duration,
    tokens: RwLock<HashMap<String, TokenEntry>>,
}

impl TokenStore {
    pub fn new(ttl_minutes: u64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes as i64),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh token for `username` (UUID v4, hex without dashes = 32 chars).
    pub async fn issue(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string().replace('-', "");
        let entry = TokenEntry {
            username: username.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        self.tokens.write().await.insert(token.clone(), entry);
        token
    }

    /// Check a token and return the username it was issued to.
    /// Expired tokens are removed on the way out.
    pub async fn validate(&self, token: &str) -> Option<String> {
        let mut tokens = self.tokens.write().await;
        match tokens.get(token) {
            Some(entry) if entry.expires_at > Utc::now() => Some(entry.username.clone()),
            Some(_) => {
                tokens.remove(token);
                None
            }
            None => None,
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").field("ttl", &self.ttl).finish()
    }
}
