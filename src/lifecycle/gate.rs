//! One-shot completion gate
//!
//! The gate is split into a [`GateCloser`] and any number of [`GateWaiter`]s.
//! Closing consumes the closer, and dropping it closes the gate too, so the
//! gate closes exactly once on every exit path of whoever owns the closer.

use tokio::sync::watch;
use tracing::debug;

/// Create an open completion gate
pub fn completion_gate() -> (GateCloser, GateWaiter) {
    let (tx, rx) = watch::channel(false);
    (GateCloser { tx }, GateWaiter { rx })
}

/// Closing half of the gate
#[derive(Debug)]
pub struct GateCloser {
    tx: watch::Sender<bool>,
}

impl GateCloser {
    /// Close the gate, releasing every waiter
    pub fn close(self) {
        // Drop does the work
    }
}

impl Drop for GateCloser {
    fn drop(&mut self) {
        self.tx.send_replace(true);
        debug!("Completion gate closed");
    }
}

/// Waiting half of the gate
#[derive(Debug, Clone)]
pub struct GateWaiter {
    rx: watch::Receiver<bool>,
}

impl GateWaiter {
    /// Suspend until the gate is closed
    pub async fn wait(&mut self) {
        // An error means the closer is gone, which also means closed
        let _ = self.rx.wait_for(|closed| *closed).await;
    }

    /// Check without waiting
    pub fn is_closed(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }
}
