//! Drainable subsystems
//!
//! A subsystem is started without blocking and later asked to stop within a
//! deadline. Stopping ceases intake of new work and waits for admitted work to
//! finish. Work still running when the deadline passes is left detached, never
//! cancelled.

pub mod listener;
pub mod scheduler;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::lifecycle::FatalReporter;

// Re-export main types
pub use listener::Listener;
pub use scheduler::{Job, Scheduler};

/// Errors returned by [`Drainable::stop`]
#[derive(Debug, Error)]
pub enum StopError {
    #[error("{subsystem} did not drain within {deadline:?}")]
    DeadlineExceeded { subsystem: String, deadline: Duration },

    #[error("{subsystem} is not running")]
    NotRunning { subsystem: String },

    #[error("{subsystem} task aborted: {reason}")]
    Aborted { subsystem: String, reason: String },
}

impl StopError {
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, StopError::DeadlineExceeded { .. })
    }
}

/// A long-running unit owned by the coordinator
#[async_trait]
pub trait Drainable: Send {
    /// Name used in logs and shutdown reports
    fn name(&self) -> &str;

    /// Begin running in the background. Must not block. Failures the process
    /// cannot survive go to `fatal`.
    fn start_async(&mut self, fatal: FatalReporter);

    /// Stop taking new work and wait up to `deadline` for admitted work
    async fn stop(&mut self, deadline: Duration) -> Result<(), StopError>;

    /// Stop taking new work without waiting. Used when the run is abandoned
    /// after a fatal error.
    fn abort(&mut self);
}

/// Wait for a subsystem's background task, bounded by `deadline`.
///
/// On timeout the handle is dropped, which detaches the task.
pub(crate) async fn join_within(
    subsystem: &str,
    handle: JoinHandle<()>,
    deadline: Duration,
) -> Result<(), StopError> {
    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(StopError::Aborted {
            subsystem: subsystem.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(StopError::DeadlineExceeded {
            subsystem: subsystem.to_string(),
            deadline,
        }),
    }
}
