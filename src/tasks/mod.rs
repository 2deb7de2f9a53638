//! Background tasks module
//!
//! This module contains the jobs run by the scheduler subsystem.

pub mod clock;

// Re-export main types
pub use clock::ClockJob;
