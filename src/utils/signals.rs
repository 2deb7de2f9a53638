//! Signal handling for graceful shutdown

use std::io;

use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::info;

/// Registered interest in SIGTERM and SIGINT.
///
/// Register before starting any subsystem so an early termination request is
/// not lost; the signal is queued until [`ShutdownSignal::wait`] consumes it.
pub struct ShutdownSignal {
    signals: Signals,
}

impl ShutdownSignal {
    /// Install the handlers
    pub fn register() -> io::Result<Self> {
        let signals = Signals::new([SIGTERM, SIGINT])?;
        Ok(Self { signals })
    }

    /// Wait for one termination signal
    pub async fn wait(mut self) {
        if let Some(signal) = self.signals.next().await {
            info!("Received signal: {}", signal_name(signal));
        }
        self.signals.handle().close();
    }
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGTERM => "SIGTERM",
        SIGINT => "SIGINT",
        _ => "unknown",
    }
}
