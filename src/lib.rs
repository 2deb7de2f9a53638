//! Graceful Service - an HTTP listener and a cron scheduler in one process
//!
//! This library runs independently scheduled subsystems side by side and,
//! on SIGINT or SIGTERM, gives all of them one bounded window to finish
//! in-flight work before the process exits.

pub mod api;
pub mod config;
pub mod cron;
pub mod lifecycle;
pub mod state;
pub mod subsystems;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::{Config, LifecycleConfig};
pub use cron::Schedule;
pub use lifecycle::{Coordinator, LifecycleError, ShutdownReport};
pub use state::AppState;
pub use subsystems::{Drainable, Job, Listener, Scheduler, StopError};
pub use utils::ShutdownSignal;
