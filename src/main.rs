use anyhow::Context;
use soundforce_calendar::http::{build_router, AppState};
use soundforce_calendar::store::{open_store, seed_standard_locations, StoreKind};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn init_tracing(data_dir: &Path) -> anyhow::Result<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).context("create log directory")?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "calendar.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| anyhow::anyhow!("init tracing: {error}"))?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let bind_addr = env::var("CALENDAR_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let data_dir = PathBuf::from(env::var("CALENDAR_DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    let store_kind = match env::var("CALENDAR_STORE") {
        Ok(raw) => StoreKind::from_name(&raw)
            .with_context(|| format!("unsupported CALENDAR_STORE value: {raw}"))?,
        Err(_) => StoreKind::Sqlite,
    };

    std::fs::create_dir_all(&data_dir).context("create data directory")?;
    init_tracing(&data_dir)?;

    let store = open_store(store_kind, &data_dir)?;
    let seeded = seed_standard_locations(store.as_ref())?;
    if seeded > 0 {
        info!(count = seeded, "seeded default standard locations");
    }

    let app = build_router(AppState { store });
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("bind {bind_addr}"))?;
    info!(addr = %bind_addr, store = ?store_kind, "calendar server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("server failed")?;
    Ok(())
}
