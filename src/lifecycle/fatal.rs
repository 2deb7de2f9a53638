//! Fatal-error escalation
//!
//! Background tasks cannot return errors to anyone. When one hits a condition
//! the process cannot survive (listener failed to bind, accept loop ended on its
//! own) it reports it here and the coordinator aborts the run.

use std::io;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::error;

/// Unrecoverable subsystem failure
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("failed to bind listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("listener on {address} closed unexpectedly: {reason}")]
    ListenerClosed { address: String, reason: String },
}

/// Sending side handed to each subsystem on start
#[derive(Debug, Clone)]
pub struct FatalReporter {
    tx: mpsc::UnboundedSender<FatalError>,
}

/// Receiving side owned by the coordinator
#[derive(Debug)]
pub struct FatalReceiver {
    rx: mpsc::UnboundedReceiver<FatalError>,
}

/// Create a connected reporter/receiver pair
pub fn fatal_channel() -> (FatalReporter, FatalReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FatalReporter { tx }, FatalReceiver { rx })
}

impl FatalReporter {
    /// Escalate a fatal error
    pub fn report(&self, err: FatalError) {
        error!("Fatal: {}", err);
        // Nobody listening means the coordinator already finished
        let _ = self.tx.send(err);
    }
}

impl FatalReceiver {
    /// Take a pending fatal error without waiting
    pub fn try_recv(&mut self) -> Option<FatalError> {
        self.rx.try_recv().ok()
    }

    /// Wait for the first fatal error. Pends forever once every reporter is gone.
    pub async fn recv(&mut self) -> FatalError {
        match self.rx.recv().await {
            Some(err) => err,
            None => std::future::pending().await,
        }
    }
}
