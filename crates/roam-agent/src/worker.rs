//! Evaluation scheduling.
//!
//! One evaluation at a time: take the latest fix from the mailbox, query
//! the directory under a timeout, run the engine, then hold off for the
//! configured minimum interval. Position updates arriving meanwhile simply
//! overwrite the mailbox; the next cycle starts from wherever the rover
//! actually is. The hold-off applies after every cycle, including skipped
//! ones, so a failing caster is never hammered at feed rate.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::timeout;

use roam_select::directory::{Directory, DirectoryError, DirectoryQuery, PositionFix};
use roam_select::engine::{EvaluationOutcome, SelectionEngine};

use crate::metrics::EngineMetrics;

/// Runs the evaluation loop until shutdown or feed closure.
pub async fn run<D: Directory>(
    mut engine: SelectionEngine,
    directory: D,
    mut positions: watch::Receiver<Option<PositionFix>>,
    mut shutdown: watch::Receiver<bool>,
    metrics: Arc<EngineMetrics>,
) {
    let interval = engine.config().evaluation_interval();
    loop {
        tokio::select! {
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    return;
                }
            }
            changed = positions.changed() => {
                if changed.is_err() {
                    tracing::info!("position feed closed, stopping evaluations");
                    return;
                }
                let Some(fix) = *positions.borrow_and_update() else {
                    continue;
                };

                evaluate_once(&mut engine, &directory, fix, &metrics).await;

                // Minimum inter-evaluation interval: bounds the outbound
                // query rate regardless of how fast fixes arrive.
                tokio::select! {
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow() {
                            return;
                        }
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }
    }
}

/// One evaluation cycle: bounded directory query, then the engine's
/// decision. The timeout is the only thing that ends a hung query.
async fn evaluate_once<D: Directory>(
    engine: &mut SelectionEngine,
    directory: &D,
    fix: PositionFix,
    metrics: &EngineMetrics,
) -> EvaluationOutcome {
    let query = DirectoryQuery {
        fix,
        max_distance_km: engine.config().max_distance_km,
    };
    let result = match timeout(engine.config().query_timeout, directory.query(query)).await {
        Ok(result) => result,
        Err(_) => Err(DirectoryError::TimedOut),
    };
    let outcome = engine.apply(result);
    metrics.record(&outcome);
    outcome
}
