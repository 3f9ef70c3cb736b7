use std::sync::Arc;

use nodewatch_dashboard::headless::{LogChartRenderer, LogMap, LogPanel, LogSummary};
use nodewatch_dashboard::{Dashboard, DashboardConfig, DashboardHandle, HttpTelemetryApi, UiCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = DashboardConfig::from_env();
    let api = match HttpTelemetryApi::new(&config.api_url) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            tracing::error!(error = %e, url = %config.api_url, "failed to build telemetry client");
            return;
        }
    };
    tracing::info!(
        api_url = %config.api_url,
        placement = ?config.placement,
        departure = ?config.departure,
        "Starting nodewatch dashboard"
    );

    let (dashboard, handle) = Dashboard::new(
        api,
        LogMap::default(),
        Arc::new(LogChartRenderer::default()),
        Box::new(LogPanel),
        LogSummary,
        config,
    );
    tokio::spawn(read_commands(handle));

    dashboard.run(shutdown_signal()).await;
    tracing::info!("Dashboard shut down gracefully");
}

/// Feed `select <id>`, `close` and `summary` lines from stdin to the dashboard.
async fn read_commands(handle: DashboardHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match UiCommand::parse(&line) {
                Some(command) => handle.send(command),
                None => tracing::warn!(input = %line.trim(), "unrecognized command"),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stopped reading commands from stdin");
                break;
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        () = ctrl_c => "ctrl-c",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal = received, "Shutdown signal received");
}
