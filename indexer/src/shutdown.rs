//! Shutdown signalling for the ingestion loop, over a
//! `tokio::sync::broadcast` channel.

use tokio::sync::broadcast;

/// Coordinates shutdown of the indexer.
///
/// [`IndexerService::run`](crate::IndexerService::run) takes a receiver from
/// [`subscribe`](Self::subscribe) and stops between blocks once notified.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
