//! `sync-bridge` entrypoint.
//!
//! Wires a `Driver` to a pair of adapters and runs it to completion. The real
//! engine transport and host accessibility integration live outside this
//! crate; `--demo` wires the in-memory stand-ins instead, enough to exercise
//! the whole pipeline for a smoke test.

use std::path::PathBuf;
use std::sync::Once;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use core_sync_adapters::demo::{demo_engine, demo_host, DemoAlertSink};
use core_sync_adapters::{EngineNotifications, HostNotifications};
use core_sync_driver::{Adapters, Driver};
use core_sync_events::{Event, Side};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "sync-bridge", version, about = "Buffer synchronization bridge")]
struct Args {
    /// Optional configuration file path (overrides discovery of `sync.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Run with in-memory stand-in adapters instead of a real engine/host.
    #[arg(long)]
    demo: bool,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = std::path::Path::new(".");
        let log_path = log_dir.join("sync-bridge.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "sync-bridge.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => self.log_guard = Some(guard),
            Err(_err) => {
                // A global subscriber is already installed (e.g. under a test
                // harness); drop the guard so its writer shuts down cleanly.
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "sync.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

async fn run_demo(config: core_sync_config::Config) -> Result<()> {
    let initial_lines = vec![String::new()];

    let (engine, engine_notifications) = demo_engine(initial_lines.clone());
    let (host, host_notifications) = demo_host(initial_lines.clone());
    let alerts = DemoAlertSink::default();

    let adapters = Adapters {
        engine: Box::new(engine),
        host: Box::new(host),
        alerts: Box::new(alerts),
    };
    let driver = Driver::new(initial_lines.clone(), initial_lines, adapters);
    let tx = driver.sender();

    let engine_notify_handle = Box::new(engine_notifications).spawn(tx.clone());
    let host_notify_handle = Box::new(host_notifications).spawn(tx.clone());

    info!(
        target: "sync.bridge",
        token_timeout_ms = config.token_timeout.as_millis() as u64,
        idle_timeout_ms = config.idle_timeout.as_millis() as u64,
        "demo_driver_starting"
    );
    tx.send(Event::RequestRefresh { source: Side::Engine }).await.ok();

    tokio::select! {
        _ = driver.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!(target: "sync.bridge", "ctrl_c_received");
        }
    }

    engine_notify_handle.abort();
    host_notify_handle.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();

    let config = core_sync_config::load_from(args.config.clone())?;
    info!(target: "sync.bridge", demo = args.demo, "startup");

    if args.demo {
        run_demo(config).await?;
    } else {
        info!(
            target: "sync.bridge",
            "no engine/host adapters wired; pass --demo to run with in-memory stand-ins"
        );
    }

    Ok(())
}
