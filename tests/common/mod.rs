//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use graceful_service::{
    api::create_router, config::LifecycleConfig, lifecycle::Coordinator, state::AppState,
    tasks::ClockJob,
};
use tokio::{net::TcpStream, time::sleep};

/// Reserve an ephemeral port and release it for the service to bind
pub fn free_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

/// Coordinator serving the default router with `delay` before each response
pub fn service(address: &str, cron: &str, delay: Duration, shutdown_timeout: Duration) -> Coordinator {
    let config = LifecycleConfig {
        listen_address: address.to_string(),
        cron_expression: cron.to_string(),
        shutdown_timeout,
    };
    let state = Arc::new(AppState::new(delay));
    Coordinator::from_config(&config, create_router(state), ClockJob).unwrap()
}

/// Poll until something accepts connections on `address`
pub async fn wait_until_listening(address: &str) {
    for _ in 0..200 {
        if TcpStream::connect(address).await.is_ok() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("nothing listening on {}", address);
}
