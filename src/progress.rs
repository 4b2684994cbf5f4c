//! Staged progress reporting over a watch channel.
//!
//! # Why a channel instead of callbacks?
//!
//! Render workers complete on arbitrary threads. Letting them call into
//! caller-supplied code directly would push synchronisation duties onto
//! every consumer (the original folder-converter this crate descends from
//! mutated UI widgets straight from worker callbacks, a recurring source of
//! races). Instead the pipeline publishes immutable [`ProgressSnapshot`]
//! values through a `tokio::sync::watch` channel: workers never block on a
//! slow consumer, the single consumer always sees the latest state, and a
//! UI loop can either poll [`ProgressMonitor::snapshot`] on its own refresh
//! tick or await [`ProgressMonitor::changed`].
//!
//! Fractions are kept monotonically non-decreasing within a run by the
//! sender, so a consumer never has to defend against a progress bar moving
//! backwards. A new run resets all three stages to zero.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// One immutable view of pipeline progress.
///
/// Three independent stage fractions in `[0, 100]` plus a short status
/// message describing the most recent discrete step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Image loading: fraction of input files read.
    pub load: f32,
    /// Page assembly: fraction of pages rendered (merge completion bumps
    /// this to 100 implicitly, since all pages must render first).
    pub render: f32,
    /// Final compression: 0 until the compressor finishes, then 100.
    pub compress: f32,
    /// Human-readable description of the current step.
    pub status: String,
}

/// Read side of the progress channel.
///
/// Cheap to clone; every clone observes the same run. Obtained from
/// [`crate::runner::Converter::monitor`].
#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    rx: watch::Receiver<ProgressSnapshot>,
}

impl ProgressMonitor {
    /// The latest snapshot. Never blocks.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.rx.borrow().clone()
    }

    /// Wait until the snapshot changes, then return the new value.
    ///
    /// Returns `None` once the pipeline has finished and dropped its
    /// sender (after the final snapshot has been observed).
    pub async fn changed(&mut self) -> Option<ProgressSnapshot> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }

    /// The snapshots as an async `Stream`, starting from the current one.
    pub fn stream(self) -> WatchStream<ProgressSnapshot> {
        WatchStream::new(self.rx)
    }
}

/// Write side of the progress channel. Crate-internal: only the pipeline
/// publishes. Clones share the channel, so render workers can each carry
/// one into their task.
#[derive(Debug, Clone)]
pub(crate) struct ProgressSender {
    tx: std::sync::Arc<watch::Sender<ProgressSnapshot>>,
}

/// Create a connected sender/monitor pair with all fractions at zero.
pub(crate) fn channel() -> (ProgressSender, ProgressMonitor) {
    let (tx, rx) = watch::channel(ProgressSnapshot::default());
    (
        ProgressSender {
            tx: std::sync::Arc::new(tx),
        },
        ProgressMonitor { rx },
    )
}

impl ProgressSender {
    /// Reset all stages to zero. Called at run start and after a failure,
    /// matching the behaviour of the folder converter this crate replaces.
    pub(crate) fn reset(&self, status: impl Into<String>) {
        self.tx.send_replace(ProgressSnapshot {
            status: status.into(),
            ..ProgressSnapshot::default()
        });
    }

    /// Publish a new load fraction. Values below the current one are
    /// ignored to keep the stage monotonic.
    pub(crate) fn set_load(&self, pct: f32, status: impl Into<String>) {
        self.update(|s| s.load = s.load.max(pct.clamp(0.0, 100.0)), status);
    }

    /// Publish a new render fraction; monotonic like `set_load`.
    pub(crate) fn set_render(&self, pct: f32, status: impl Into<String>) {
        self.update(|s| s.render = s.render.max(pct.clamp(0.0, 100.0)), status);
    }

    /// Publish a new compress fraction; monotonic like `set_load`.
    pub(crate) fn set_compress(&self, pct: f32, status: impl Into<String>) {
        self.update(|s| s.compress = s.compress.max(pct.clamp(0.0, 100.0)), status);
    }

    /// Update only the status message.
    pub(crate) fn set_status(&self, status: impl Into<String>) {
        self.update(|_| {}, status);
    }

    fn update(&self, f: impl FnOnce(&mut ProgressSnapshot), status: impl Into<String>) {
        self.tx.send_modify(|s| {
            f(s);
            s.status = status.into();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_are_monotonic_within_a_run() {
        let (tx, monitor) = channel();

        tx.set_render(40.0, "rendering 2/5");
        tx.set_render(20.0, "late completion");
        assert_eq!(monitor.snapshot().render, 40.0);

        tx.set_render(100.0, "rendering 5/5");
        assert_eq!(monitor.snapshot().render, 100.0);
    }

    #[test]
    fn reset_zeroes_all_stages() {
        let (tx, monitor) = channel();

        tx.set_load(100.0, "loaded");
        tx.set_render(60.0, "rendering");
        tx.reset("starting");

        let snap = monitor.snapshot();
        assert_eq!(snap.load, 0.0);
        assert_eq!(snap.render, 0.0);
        assert_eq!(snap.compress, 0.0);
        assert_eq!(snap.status, "starting");
    }

    #[test]
    fn fractions_clamped_to_range() {
        let (tx, monitor) = channel();
        tx.set_compress(250.0, "done");
        assert_eq!(monitor.snapshot().compress, 100.0);
    }

    #[tokio::test]
    async fn stream_yields_current_value_then_updates() {
        use tokio_stream::StreamExt;

        let (tx, monitor) = channel();
        let mut stream = monitor.stream();

        // WatchStream starts with the value present at subscription time.
        let first = stream.next().await.unwrap();
        assert_eq!(first.load, 0.0);

        tx.set_load(100.0, "loaded");
        let second = stream.next().await.unwrap();
        assert_eq!(second.load, 100.0);
    }

    #[tokio::test]
    async fn changed_delivers_latest_snapshot() {
        let (tx, mut monitor) = channel();

        tx.set_load(50.0, "loading 1/2");
        let snap = monitor.changed().await.expect("sender alive");
        assert_eq!(snap.load, 50.0);
        assert_eq!(snap.status, "loading 1/2");

        drop(tx);
        assert!(monitor.changed().await.is_none());
    }
}
