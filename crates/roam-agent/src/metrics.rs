//! # Prometheus Metrics
//!
//! Counters for the evaluation loop rendered in Prometheus text exposition
//! format, served from a lightweight blocking listener thread.

use std::fmt::Write as _;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use roam_select::engine::EvaluationOutcome;
use roam_select::slot::SelectionSlot;

/// Monotonic counters for the evaluation loop.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Evaluation cycles run.
    pub evaluations: AtomicU64,
    /// Cycles that switched mountpoint.
    pub switches: AtomicU64,
    /// Cycles that kept the current selection.
    pub kept: AtomicU64,
    /// Cycles skipped on a failed directory query.
    pub skipped: AtomicU64,
}

impl EngineMetrics {
    pub fn record(&self, outcome: &EvaluationOutcome) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            EvaluationOutcome::SwitchedTo(_) => &self.switches,
            EvaluationOutcome::Kept => &self.kept,
            EvaluationOutcome::Skipped(_) => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Renders loop counters and the active stream as Prometheus text.
pub fn render_prometheus(metrics: &EngineMetrics, slot: &SelectionSlot) -> String {
    let mut out = String::with_capacity(1024);

    let counters = [
        (
            "roam_evaluations_total",
            "Evaluation cycles run.",
            &metrics.evaluations,
        ),
        (
            "roam_switches_total",
            "Cycles that switched mountpoint.",
            &metrics.switches,
        ),
        (
            "roam_kept_total",
            "Cycles that kept the current selection.",
            &metrics.kept,
        ),
        (
            "roam_skipped_total",
            "Cycles skipped on a failed directory query.",
            &metrics.skipped,
        ),
    ];
    for (name, help, counter) in counters {
        writeln!(out, "# HELP {name} {help}").unwrap();
        writeln!(out, "# TYPE {name} counter").unwrap();
        writeln!(out, "{name} {}", counter.load(Ordering::Relaxed)).unwrap();
    }

    let active = slot.load();
    writeln!(
        out,
        "# HELP roam_active_stream Currently selected mountpoint (info metric)."
    )
    .unwrap();
    writeln!(out, "# TYPE roam_active_stream gauge").unwrap();
    writeln!(
        out,
        "roam_active_stream{{stream=\"{}\"}} 1",
        active.stream_name
    )
    .unwrap();

    out
}

/// Serves `GET /metrics` forever on a blocking listener thread.
pub fn run_metrics_server(
    port: u16,
    metrics: Arc<EngineMetrics>,
    slot: Arc<SelectionSlot>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    tracing::info!(port, "prometheus metrics server listening");

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "metrics accept error");
                continue;
            }
        };

        // Drain the request head; the only endpoint is GET /metrics.
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf);

        let body = render_prometheus(&metrics, &slot);
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_select::directory::DirectoryError;

    #[test]
    fn record_routes_outcomes_to_counters() {
        let metrics = EngineMetrics::default();
        metrics.record(&EvaluationOutcome::SwitchedTo("TLSE".into()));
        metrics.record(&EvaluationOutcome::Kept);
        metrics.record(&EvaluationOutcome::Kept);
        metrics.record(&EvaluationOutcome::Skipped(DirectoryError::TimedOut));

        assert_eq!(metrics.evaluations.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.switches.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.kept.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.skipped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn render_includes_counters_and_stream() {
        let metrics = EngineMetrics::default();
        metrics.record(&EvaluationOutcome::SwitchedTo("TLSE".into()));
        let slot = SelectionSlot::new();
        slot.publish("TLSE");

        let text = render_prometheus(&metrics, &slot);
        assert!(text.contains("roam_evaluations_total 1"));
        assert!(text.contains("roam_switches_total 1"));
        assert!(text.contains("roam_active_stream{stream=\"TLSE\"} 1"));
    }
}
