use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;

use bookstats::app::router::{AppState, router};
use bookstats::app::state::{LibraryHandle, ReloadOutcome};
use bookstats::dashboard::DashboardConfig;
use bookstats::dataset::LoadOptions;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Reading export (CSV) path or URL. Falls back to `BOOKSTATS_DATA`.
    #[arg(long)]
    data: Option<String>,

    /// Dashboard YAML. Falls back to `BOOKSTATS_DASHBOARD`, then the built-in charts.
    #[arg(long)]
    dashboard: Option<PathBuf>,

    /// Keep only rows on this `Exclusive Shelf`.
    #[arg(long, default_value = "read")]
    shelf: String,

    /// Drop rows without a `Date Read`.
    #[arg(long)]
    require_date_read: bool,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn try_main() -> anyhow::Result<()> {
    bookstats::logging::init("info,tower_http=debug")?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting bookstats-app");

    let location = args
        .data
        .clone()
        .or_else(|| env_value("BOOKSTATS_DATA"))
        .ok_or_else(|| anyhow::anyhow!("--data or BOOKSTATS_DATA is required"))?;
    let dashboard_path = args
        .dashboard
        .clone()
        .or_else(|| env_value("BOOKSTATS_DASHBOARD").map(PathBuf::from));
    let dashboard = DashboardConfig::load(dashboard_path.as_deref()).context("load dashboard")?;

    let state = AppState {
        library: LibraryHandle::new(),
        dashboard: Arc::new(dashboard),
        location: Arc::from(location.as_str()),
        load_options: LoadOptions {
            shelf: Some(args.shelf.clone()),
            require_date_read: args.require_date_read,
        },
    };

    // A failed first load leaves the service up; POST /api/reload retries.
    match state
        .library
        .reload(&state.location, &state.load_options)
        .await
    {
        ReloadOutcome::Applied { books } => tracing::info!(books, "initial load"),
        ReloadOutcome::Failed { message } => {
            tracing::warn!(error = %message, "initial load failed; serving error until reload")
        }
        ReloadOutcome::Stale => {}
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
