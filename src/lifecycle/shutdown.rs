//! Graceful shutdown fan-out.
//!
//! The serve loop holds a receiver; `RunningService::stop` fires the sender
//! once. Connections already accepted keep running until their responses end.

use tokio::sync::broadcast;

/// One-shot shutdown broadcast shared between the service and its server task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Returns how many receivers were still waiting on it;
    /// `0` means the server task had already gone away.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
