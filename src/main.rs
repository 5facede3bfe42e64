//! # GuestPass
//!
//! Polls the guest spreadsheet, emails every new guest a QR pass, and marks
//! the row `Done` so it is never sent twice.
//!
//! Usage:
//!   guestpass                    # poll forever, liveness endpoint on $PORT
//!   guestpass --once             # single cycle, then exit
//!   guestpass --interval 10 -v   # faster polling, debug logs
//!
//! Configuration comes from the environment (or a `.env` file).
//! Deploy a single instance: concurrent instances may email a guest twice.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use guestpass_channels::{EmailNotifier, TemplateStore};
use guestpass_core::AppConfig;
use guestpass_gateway::AppState;
use guestpass_scheduler::{GuestProcessor, QrEncoder, SchedulerEngine, spawn_scheduler};
use guestpass_sheets::SheetsRowSource;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "guestpass",
    version,
    about = "🎟️ GuestPass — QR passes for newly registered guests"
)]
struct Cli {
    /// Run a single processing cycle and exit
    #[arg(long)]
    once: bool,

    /// Liveness endpoint port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds between cycles (overrides POLL_INTERVAL_SECS)
    #[arg(long)]
    interval: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(cli: &Cli) {
    let filter = if cli.verbose {
        "guestpass=debug,guestpass_core=debug,guestpass_sheets=debug,guestpass_channels=debug,guestpass_scheduler=debug,guestpass_gateway=debug,tower_http=debug"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_logging(&cli);

    let mut config = AppConfig::from_env().context("Startup configuration invalid")?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    if let Some(secs) = cli.interval {
        anyhow::ensure!(secs > 0, "--interval must be positive");
        config.scheduler.poll_interval = Duration::from_secs(secs);
    }
    tracing::debug!("Loaded config: {config:?}");

    let rows = SheetsRowSource::new(&config.sheets).context("Google Sheets setup failed")?;
    let notifier = EmailNotifier::new(
        &config.smtp,
        TemplateStore::new(config.scheduler.template_dir.clone()),
    )
    .context("SMTP setup failed")?;
    let processor = Arc::new(GuestProcessor::new(
        Arc::new(rows),
        Arc::new(QrEncoder::default()),
        Arc::new(notifier),
        config.scheduler.qr_dir.clone(),
    ));
    let mut engine = SchedulerEngine::new(processor, config.scheduler.poll_interval);

    println!("🎟️ GuestPass v{}", env!("CARGO_PKG_VERSION"));
    println!("   Spreadsheet: {}", config.sheets.spreadsheet_id);
    println!("   SMTP:        {}:{}", config.smtp.host, config.smtp.port);
    println!("   Interval:    {}s", config.scheduler.poll_interval.as_secs());

    if cli.once {
        return match engine.run_once().await {
            Some(report) if report.failed() == 0 => Ok(()),
            Some(report) => anyhow::bail!("{} guest(s) failed", report.failed()),
            None => anyhow::bail!("Cycle aborted, see log"),
        };
    }

    let listener = guestpass_gateway::bind(&config.gateway)
        .await
        .context("Liveness endpoint setup failed")?;

    let scheduler_stop = Arc::new(Notify::new());
    let server_stop = Arc::new(Notify::new());
    let state = AppState::new(engine.subscribe());
    let scheduler = spawn_scheduler(engine, scheduler_stop.clone());

    let server_signal = server_stop.clone();
    let server = tokio::spawn(guestpass_gateway::serve(listener, state, async move {
        server_signal.notified().await
    }));

    supervise(
        shutdown_signal(),
        scheduler,
        scheduler_stop,
        server,
        server_stop,
    )
    .await?;
    tracing::info!("✅ Clean shutdown");
    Ok(())
}

/// Wait for `signal`, then stop both tasks and wait for them. The scheduler
/// does not depend on the liveness endpoint: if the server exits early it
/// is logged and polling carries on until the signal.
async fn supervise(
    signal: impl Future<Output = ()>,
    scheduler: JoinHandle<()>,
    scheduler_stop: Arc<Notify>,
    mut server: JoinHandle<std::io::Result<()>>,
    server_stop: Arc<Notify>,
) -> Result<()> {
    tokio::pin!(signal);
    let server_done = tokio::select! {
        _ = &mut signal => false,
        res = &mut server => {
            tracing::error!("❌ Liveness endpoint exited, scheduler keeps running: {res:?}");
            true
        }
    };
    if server_done {
        signal.await;
    }
    tracing::info!("👋 Shutdown requested, finishing current cycle");
    scheduler_stop.notify_one();
    server_stop.notify_one();

    scheduler.await.context("Scheduler task failed")?;
    if !server_done {
        server
            .await
            .context("HTTP server task failed")?
            .context("HTTP server failed")?;
    }
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_server_exit_keeps_scheduler_running() {
        let scheduler_stop = Arc::new(Notify::new());
        let stop = scheduler_stop.clone();
        let (stopped_tx, mut stopped_rx) = oneshot::channel::<()>();
        let scheduler = tokio::spawn(async move {
            stop.notified().await;
            stopped_tx.send(()).unwrap();
        });
        let server = tokio::spawn(async { Err(std::io::Error::other("accept failed")) });

        let (signal_tx, signal_rx) = oneshot::channel::<()>();
        let supervisor = tokio::spawn(supervise(
            async move {
                signal_rx.await.ok();
            },
            scheduler,
            scheduler_stop,
            server,
            Arc::new(Notify::new()),
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!supervisor.is_finished());
        assert!(stopped_rx.try_recv().is_err());

        signal_tx.send(()).unwrap();
        supervisor.await.unwrap().unwrap();
        assert!(stopped_rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_signal_stops_both_tasks() {
        let scheduler_stop = Arc::new(Notify::new());
        let server_stop = Arc::new(Notify::new());
        let (stop_a, stop_b) = (scheduler_stop.clone(), server_stop.clone());
        let scheduler = tokio::spawn(async move { stop_a.notified().await });
        let server = tokio::spawn(async move {
            stop_b.notified().await;
            Ok(())
        });

        supervise(async {}, scheduler, scheduler_stop, server, server_stop)
            .await
            .unwrap();
    }
}
