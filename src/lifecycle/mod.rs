//! Process lifecycle
//!
//! ```text
//! start:    register SIGINT/SIGTERM → start every subsystem → wait
//! shutdown: signal → stop all subsystems concurrently (shared deadline)
//!           → close completion gate → return to caller, who exits
//! fatal:    subsystem reports → return error, caller exits non-zero
//! ```

pub mod coordinator;
pub mod fatal;
pub mod gate;

use std::io;

use thiserror::Error;

// Re-export main types
pub use coordinator::{Coordinator, ShutdownReport, SubsystemOutcome};
pub use fatal::{fatal_channel, FatalError, FatalReceiver, FatalReporter};
pub use gate::{completion_gate, GateCloser, GateWaiter};

/// Errors that end a coordinator run without a graceful drain
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("coordinator already started")]
    AlreadyStarted,

    #[error("failed to register shutdown signals: {0}")]
    SignalRegistration(#[source] io::Error),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}
