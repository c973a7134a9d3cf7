// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator daemon entry point.
//!
//! Loads config (`SQUAWK_CONFIG` or `{datadir}/config.toml`), starts the
//! coordinator with the default capability adapters, and waits for a
//! shutdown signal. The HTTP transport attaches from outside against the
//! coordinator's contracts.

use sqk_daemon::{startup, CoordinatorConfig, ProcessLauncher, UnconfiguredPlanner};
use sqk_core::SystemClock;
use sqk_planner::FsWalker;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::var("SQUAWK_CONFIG").ok().map(PathBuf::from);
    let config = match CoordinatorConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = std::fs::create_dir_all(&config.datadir) {
        eprintln!("cannot create data dir {}: {err}", config.datadir.display());
        return ExitCode::FAILURE;
    }
    let file_appender =
        tracing_appender::rolling::daily(config.datadir.clone(), "sqkd.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    let heartbeat_interval_ms = config.heartbeat_interval_ms;
    let daemon = match startup(
        config,
        UnconfiguredPlanner,
        FsWalker,
        ProcessLauncher::new(heartbeat_interval_ms),
        SystemClock,
    ) {
        Ok(daemon) => daemon,
        Err(err) => {
            tracing::error!(%err, "startup failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(datadir = %daemon.paths.datadir.display(), "coordinator ready");

    // Wait for SIGINT/SIGTERM, then tear down the workers
    let signalled = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        Ok::<_, std::io::Error>(())
    };
    if let Err(err) = signalled.await {
        tracing::error!(%err, "signal handler failed");
        daemon.shutdown().await;
        return ExitCode::FAILURE;
    }

    tracing::info!("shutdown signal received");
    daemon.shutdown().await;
    ExitCode::SUCCESS
}
