//! Timestamp-logging job

use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use tracing::info;

use crate::subsystems::Job;

/// Default periodic job: logs the current local time
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockJob;

#[async_trait]
impl Job for ClockJob {
    async fn run(&self) {
        info!("now : {}", Local::now().to_rfc3339_opts(SecondsFormat::Secs, false));
    }
}
