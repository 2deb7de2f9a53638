//! Cadence expressions
//!
//! Five-field cron expressions (minute, hour, day-of-month, month,
//! day-of-week) are evaluated by `croner`. This module adds the `@hourly`-style
//! descriptors and `@every <duration>` on top.

pub mod schedule;

use thiserror::Error;

// Re-export main types
pub use schedule::Schedule;

/// Errors raised while parsing a cadence expression
#[derive(Debug, Error)]
pub enum CronError {
    #[error("empty cadence expression")]
    Empty,

    #[error("expected 5 fields, found {found} in {expression:?}")]
    FieldCount { expression: String, found: usize },

    #[error("invalid cron expression {expression:?}: {source}")]
    Invalid {
        expression: String,
        #[source]
        source: croner::errors::CronError,
    },

    #[error("unknown descriptor {0:?}")]
    UnknownDescriptor(String),

    #[error("invalid duration {0:?}")]
    InvalidDuration(String),
}
