//! Graceful Service - an HTTP listener and a cron scheduler in one process
//!
//! This is the main entry point for the graceful-service application.

use std::sync::Arc;
use tracing::{error, info, warn};

use graceful_service::{
    api::create_router,
    config::Config,
    lifecycle::Coordinator,
    state::AppState,
    tasks::ClockJob,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("graceful_service={},tower_http=info", config.log_level()))
        .init();

    info!("Starting graceful-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: address={}, cron={:?}, shutdown_timeout={}s",
          config.address(), config.cron, config.shutdown_timeout);

    let state = Arc::new(AppState::new(config.response_delay()));

    // A malformed cadence stops us here, before anything serves
    let mut coordinator = Coordinator::from_config(&config.lifecycle(), create_router(state), ClockJob)?;

    match coordinator.start().await {
        Ok(report) => {
            if !report.is_clean() {
                warn!("Some subsystems did not drain in time; exiting anyway");
            }
            info!("Service shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
