//! Shared state for the default HTTP handlers

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// State handed to every request handler
#[derive(Debug)]
pub struct AppState {
    /// How long the hello handler waits before answering
    pub response_delay: Duration,
    pub start_time: Instant,
    requests_served: AtomicU64,
}

impl AppState {
    pub fn new(response_delay: Duration) -> Self {
        Self {
            response_delay,
            start_time: Instant::now(),
            requests_served: AtomicU64::new(0),
        }
    }

    /// Count a completed request, returning the new total
    pub fn record_request(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }
}

fn format_uptime(duration: Duration) -> String {
    let hours = duration.as_secs() / 3600;
    let minutes = (duration.as_secs() % 3600) / 60;
    let seconds = duration.as_secs() % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
