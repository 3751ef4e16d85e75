//! roam field agent.
//!
//! Daemon that keeps a moving GNSS rover on the nearest usable NTRIP
//! mountpoint:
//!
//! - listens to a position feed (UDP/JSON, or synthetic in `--simulate`)
//! - asks the caster directory for mountpoints near the rover, rate-limited
//! - runs the hysteresis selection engine
//! - publishes the chosen stream for the correction consumer

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use roam_agent::{caster, feed, metrics, sink, worker};
use roam_select::config::SelectionConfig;
use roam_select::engine::SelectionEngine;
use roam_select::slot::SelectionSlot;

/// roam field agent daemon.
#[derive(Parser, Debug)]
#[command(name = "roam-agent", about = "Nearest-mountpoint selection agent")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "roam.toml")]
    config: std::path::PathBuf,

    /// Run with a synthetic position feed and caster directory.
    #[arg(long, default_value_t = false)]
    simulate: bool,

    /// Serve Prometheus metrics on this port.
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let raw = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("reading config {}", cli.config.display()))?;
    let config = SelectionConfig::from_toml_str(&raw).context("resolving config")?;

    tracing::info!(
        caster = %config.caster_address,
        port = config.caster_port,
        gps_topic = %config.gps_topic,
        simulate = cli.simulate,
        "roam-agent starting"
    );

    let slot = Arc::new(SelectionSlot::new());
    let engine_metrics = Arc::new(metrics::EngineMetrics::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (position_tx, position_rx) = watch::channel(None);

    // ── Metrics server (optional) ───────────────────────────────
    if let Some(port) = cli.metrics_port {
        let metrics = engine_metrics.clone();
        let slot = slot.clone();
        std::thread::Builder::new()
            .name("metrics".into())
            .spawn(move || {
                if let Err(e) = metrics::run_metrics_server(port, metrics, slot) {
                    tracing::error!(error = %e, "metrics server failed");
                }
            })?;
    }

    // ── Position feed ───────────────────────────────────────────
    let feed_task = if cli.simulate {
        tokio::spawn(feed::run_simulated(position_tx, shutdown_rx.clone()))
    } else {
        let topic = config.gps_topic.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = feed::run(&topic, position_tx, shutdown).await {
                tracing::error!(error = %e, "position feed failed");
            }
        })
    };

    // ── Stream consumer stand-in ────────────────────────────────
    let sink_task = tokio::spawn(sink::run(slot.clone(), shutdown_rx.clone()));

    // ── Selection worker ────────────────────────────────────────
    let engine = SelectionEngine::new(config.clone(), slot);
    let worker_task = if cli.simulate {
        let directory = caster::SimulatedDirectory::regional_network();
        tokio::spawn(worker::run(
            engine,
            directory,
            position_rx,
            shutdown_rx,
            engine_metrics,
        ))
    } else {
        let directory = caster::ProviderDirectory::new(config.caster_address.clone(), config.caster_port);
        tokio::spawn(worker::run(
            engine,
            directory,
            position_rx,
            shutdown_rx,
            engine_metrics,
        ))
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down...");
    shutdown_tx.send(true).ok();

    let _ = worker_task.await;
    let _ = sink_task.await;
    let _ = feed_task.await;
    Ok(())
}
