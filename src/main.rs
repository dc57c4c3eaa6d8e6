use anyhow::Result;
use clap::Parser;
use edistat::{auth, config::ServerConfig, rest, storage::Storage, AppContext};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "edistat",
    about = "EDI transaction analytics & reporting API",
    version
)]
struct Args {
    /// HTTP server port
    #[arg(long, env = "EDISTAT_PORT")]
    port: Option<u16>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "EDISTAT_BIND")]
    bind_address: Option<String>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "EDISTAT_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "EDISTAT_LOG")]
    log: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "EDISTAT_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Shared API key expected in the X-API-Key header
    #[arg(long, env = "EDISTAT_API_KEY")]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServerConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
        args.api_key,
    );

    // Init once — must happen before any tracing calls.
    let _file_guard = setup_logging(&config.log, args.log_file.as_deref(), &config.log_format);

    if config.api_key == "supersecret" {
        warn!("running with the default API key — set api_key in config.toml or EDISTAT_API_KEY");
    }

    let storage = Arc::new(
        Storage::new_with_slow_query(
            &config.data_dir,
            config.observability.slow_query_threshold_ms,
        )
        .await?,
    );
    bootstrap(&storage).await?;

    let tokens = Arc::new(auth::TokenStore::new(config.token_ttl_minutes));
    let ctx = Arc::new(AppContext {
        config: Arc::new(config),
        storage,
        tokens,
        started_at: std::time::Instant::now(),
    });

    rest::start_rest_server(ctx).await
}

/// Seed baseline data on first start: the demo user and the standard
/// status-code descriptions. Idempotent — safe to run on every start.
async fn bootstrap(storage: &Storage) -> Result<()> {
    if storage.find_user("demo").await?.is_none() {
        storage
            .create_user("demo", &auth::password_digest("demo"))
            .await?;
        info!("seeded demo user");
    }

    let codes = [
        (40, "processed without error"),
        (50, "syntax error in interchange"),
        (60, "unknown partner"),
        (70, "duplicate reference number"),
        (99, "rejected by backend"),
    ];
    for (code, description) in codes {
        storage.upsert_status_code(code, description).await?;
    }

    Ok(())
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("edistat.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
