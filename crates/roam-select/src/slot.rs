//! Externally visible selection slot.
//!
//! A single-writer / multi-reader cell holding the active stream: the
//! engine publishes, the stream consumer observes and acknowledges.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Snapshot of the published selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveStream {
    /// Mountpoint the stream consumer should be connected to. Empty until
    /// the first switch.
    pub stream_name: String,
    /// Set on every switch; cleared by the consumer once it has reopened
    /// the stream.
    pub is_new_stream: bool,
}

/// Lock-free selection slot. The engine is the only writer of
/// `stream_name`; consumers only flip `is_new_stream` back.
pub struct SelectionSlot {
    inner: ArcSwap<ActiveStream>,
}

impl SelectionSlot {
    pub fn new() -> Self {
        SelectionSlot {
            inner: ArcSwap::from_pointee(ActiveStream {
                stream_name: String::new(),
                is_new_stream: false,
            }),
        }
    }

    /// Publishes a newly selected stream, overwriting any unacknowledged one.
    pub fn publish(&self, stream_name: &str) {
        self.inner.store(Arc::new(ActiveStream {
            stream_name: stream_name.to_owned(),
            is_new_stream: true,
        }));
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<ActiveStream> {
        self.inner.load_full()
    }

    /// Marks the published stream as consumed, keeping the name. A race
    /// against a concurrent `publish` resolves in favor of the newer
    /// publication, which then stays unacknowledged.
    pub fn acknowledge(&self) {
        let seen = self.inner.load_full();
        let cleared = Arc::new(ActiveStream {
            stream_name: seen.stream_name.clone(),
            is_new_stream: false,
        });
        let _ = self.inner.compare_and_swap(&seen, cleared);
    }
}

impl Default for SelectionSlot {
    fn default() -> Self {
        Self::new()
    }
}
