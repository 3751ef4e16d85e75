//! Correction-stream consumer stand-in.
//!
//! The component that actually opens the NTRIP stream lives outside this
//! repo; this task keeps its side of the contract visible: watch the
//! slot, reopen on `is_new_stream`, then acknowledge.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use roam_select::slot::SelectionSlot;

pub async fn run(slot: Arc<SelectionSlot>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    return;
                }
            }
            _ = interval.tick() => {
                let active = slot.load();
                if active.is_new_stream {
                    tracing::info!(stream = %active.stream_name, "opening correction stream");
                    slot.acknowledge();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn acknowledges_published_streams() {
        let slot = Arc::new(SelectionSlot::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(slot.clone(), shutdown_rx));

        slot.publish("TLSE");
        tokio::time::sleep(Duration::from_secs(2)).await;

        let active = slot.load();
        assert_eq!(active.stream_name, "TLSE");
        assert!(!active.is_new_stream, "sink should have acknowledged");

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
