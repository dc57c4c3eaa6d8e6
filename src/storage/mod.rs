use anyhow::{Context as _, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

/// The single status code meaning "processed without error".
/// Every other status code denotes a distinct error condition.
pub const SUCCESS_STATUS: i64 = 40;

/// Format a timestamp for storage and query binding.
///
/// Fixed-width RFC 3339 with microseconds and a `Z` suffix, so that
/// lexicographic comparison of stored TEXT columns equals chronological
/// comparison. All timestamps written to or bound against the database
/// must go through this function.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Whether a transaction was received from or sent to a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "INBOUND",
            Direction::Outbound => "OUTBOUND",
        }
    }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// An external trading entity transactions are exchanged with.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PartnerRow {
    pub id: i64,
    pub name: String,
    /// External unique code (e.g. GLN or interchange ID), matched exactly.
    pub identifier: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct StatusCodeRow {
    pub code: i64,
    pub description: String,
}

/// One logged EDI message exchange. Immutable for reporting purposes —
/// this service only ever reads them back.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub reference_number: String,
    pub message_type: String,
    pub direction: String,
    pub status: i64,
    pub error_message: Option<String>,
    /// Where the raw message payload was archived, if anywhere.
    pub storage_path: Option<String>,
    pub partner_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_digest: String,
    pub is_active: bool,
}

/// Fields for inserting a transaction into the log. Used by the ingest
/// side of the system and by tests; the HTTP surface is read-only.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub reference_number: String,
    pub content: String,
    pub message_type: String,
    pub direction: Direction,
    pub status: i64,
    pub error_message: Option<String>,
    pub partner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Optional filters for listing transactions. All present filters are ANDed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQuery {
    pub partner_id: Option<i64>,
    pub message_type: Option<String>,
    pub direction: Option<Direction>,
    pub status: Option<i64>,
    #[serde(rename = "from")]
    pub from: Option<DateTime<Utc>>,
    #[serde(rename = "to")]
    pub to: Option<DateTime<Utc>>,
}

// ─── Storage ─────────────────────────────────────────────────────────────────

const TRANSACTION_COLUMNS: &str = "id, reference_number, message_type, direction, status, \
     error_message, storage_path, partner_id, created_at";

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("edistat.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS partners (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                identifier  TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("create partners table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS status_codes (
                code        INTEGER PRIMARY KEY,
                description TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("create status_codes table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS transactions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                reference_number TEXT NOT NULL DEFAULT '',
                content          TEXT NOT NULL DEFAULT '',
                message_type     TEXT NOT NULL DEFAULT '',
                direction        TEXT NOT NULL CHECK (direction IN ('INBOUND', 'OUTBOUND')),
                status           INTEGER NOT NULL REFERENCES status_codes(code),
                error_message    TEXT,
                storage_path     TEXT,
                partner_id       INTEGER NOT NULL REFERENCES partners(id),
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("create transactions table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                password_digest TEXT NOT NULL,
                is_active       INTEGER NOT NULL DEFAULT 1
            )",
        )
        .execute(pool)
        .await
        .context("create users table")?;

        for stmt in [
            "CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_transactions_partner_id ON transactions(partner_id)",
        ] {
            sqlx::query(stmt).execute(pool).await?;
        }

        // Idempotent column additions (ALTER TABLE IF NOT EXISTS is not
        // supported in SQLite, so we attempt the ALTER and ignore the
        // "duplicate column name" error).
        let alter_stmts = [
            "ALTER TABLE transactions ADD COLUMN error_message TEXT",
            "ALTER TABLE transactions ADD COLUMN storage_path TEXT",
        ];
        for stmt in alter_stmts {
            if let Err(e) = sqlx::query(stmt).execute(pool).await {
                let msg = e.to_string();
                if !msg.contains("duplicate column") {
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    // ─── Partners ───────────────────────────────────────────────────────────

    pub async fn create_partner(&self, name: &str, identifier: &str) -> Result<PartnerRow> {
        let now = format_ts(Utc::now());
        let row = sqlx::query_as::<_, PartnerRow>(
            "INSERT INTO partners (name, identifier, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, name, identifier, created_at, updated_at",
        )
        .bind(name)
        .bind(identifier)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .context("create partner")?;
        Ok(row)
    }

    /// List partners, optionally narrowed to those whose name or identifier
    /// contains `search` (case-insensitive substring).
    pub async fn list_partners(&self, search: Option<&str>) -> Result<Vec<PartnerRow>> {
        let rows = match search {
            Some(s) if !s.is_empty() => {
                sqlx::query_as::<_, PartnerRow>(
                    "SELECT id, name, identifier, created_at, updated_at
                       FROM partners
                      WHERE name LIKE '%' || ? || '%' OR identifier LIKE '%' || ? || '%'
                   ORDER BY id ASC",
                )
                .bind(s)
                .bind(s)
                .fetch_all(&self.pool)
                .await
            }
            _ => {
                sqlx::query_as::<_, PartnerRow>(
                    "SELECT id, name, identifier, created_at, updated_at
                       FROM partners
                   ORDER BY id ASC",
                )
                .fetch_all(&self.pool)
                .await
            }
        };
        rows.context("list partners")
    }

    // ─── Transactions ───────────────────────────────────────────────────────

    pub async fn record_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let created = format_ts(tx.created_at);
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO transactions
                (reference_number, content, message_type, direction, status,
                 error_message, partner_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&tx.reference_number)
        .bind(&tx.content)
        .bind(&tx.message_type)
        .bind(tx.direction.as_str())
        .bind(tx.status)
        .bind(&tx.error_message)
        .bind(tx.partner_id)
        .bind(&created)
        .bind(&created)
        .fetch_one(&self.pool)
        .await
        .context("record transaction")?;
        Ok(row.0)
    }

    pub async fn list_transactions(&self, q: &TransactionQuery) -> Result<Vec<TransactionRow>> {
        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE 1 = 1");
        if q.partner_id.is_some() {
            sql.push_str(" AND partner_id = ?");
        }
        if q.message_type.is_some() {
            sql.push_str(" AND message_type = ?");
        }
        if q.direction.is_some() {
            sql.push_str(" AND direction = ?");
        }
        if q.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if q.from.is_some() {
            sql.push_str(" AND created_at >= ?");
        }
        if q.to.is_some() {
            sql.push_str(" AND created_at <= ?");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, TransactionRow>(&sql);
        if let Some(id) = q.partner_id {
            query = query.bind(id);
        }
        if let Some(mt) = &q.message_type {
            query = query.bind(mt);
        }
        if let Some(dir) = q.direction {
            query = query.bind(dir.as_str());
        }
        if let Some(status) = q.status {
            query = query.bind(status);
        }
        if let Some(from) = q.from {
            query = query.bind(format_ts(from));
        }
        if let Some(to) = q.to {
            query = query.bind(format_ts(to));
        }

        query.fetch_all(&self.pool).await.context("list transactions")
    }

    /// All transactions whose status is not the success code.
    pub async fn list_error_transactions(&self) -> Result<Vec<TransactionRow>> {
        sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
              WHERE status <> ? ORDER BY created_at DESC"
        ))
        .bind(SUCCESS_STATUS)
        .fetch_all(&self.pool)
        .await
        .context("list error transactions")
    }

    // ─── Status codes ───────────────────────────────────────────────────────

    pub async fn list_status_codes(&self) -> Result<Vec<StatusCodeRow>> {
        sqlx::query_as::<_, StatusCodeRow>(
            "SELECT code, description FROM status_codes ORDER BY code ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("list status codes")
    }

    pub async fn get_status_code(&self, code: i64) -> Result<Option<StatusCodeRow>> {
        sqlx::query_as::<_, StatusCodeRow>(
            "SELECT code, description FROM status_codes WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .context("get status code")
    }

    pub async fn upsert_status_code(&self, code: i64, description: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO status_codes (code, description) VALUES (?, ?)")
            .bind(code)
            .bind(description)
            .execute(&self.pool)
            .await
            .context("upsert status code")?;
        Ok(())
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    pub async fn find_user(&self, username: &str) -> Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_digest, is_active FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("find user")
    }

    pub async fn create_user(&self, username: &str, password_digest: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO users (username, password_digest) VALUES (?, ?) RETURNING id",
        )
        .bind(username)
        .bind(password_digest)
        .fetch_one(&self.pool)
        .await
        .context("create user")?;
        Ok(row.0)
    }
}
