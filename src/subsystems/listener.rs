//! HTTP listener subsystem
//!
//! Serves an [`axum::Router`] until stopped. Stopping closes the listening
//! socket right away and lets requests already accepted run to completion.

use std::{
    future::Future,
    io,
    net::{SocketAddr, ToSocketAddrs},
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{join_within, Drainable, StopError};
use crate::lifecycle::{FatalError, FatalReporter};

/// Request-serving subsystem
pub struct Listener {
    address: String,
    router: Option<Router>,
    local_addr: Option<SocketAddr>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Listener {
    /// Create a listener for `address` (e.g. `0.0.0.0:8080`) serving `router`
    pub fn new(address: impl Into<String>, router: Router) -> Self {
        Self {
            address: address.into(),
            router: Some(router),
            local_addr: None,
            shutdown: CancellationToken::new(),
            handle: None,
        }
    }

    /// Configured address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Address actually bound, available once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

#[async_trait]
impl Drainable for Listener {
    fn name(&self) -> &str {
        "listener"
    }

    fn start_async(&mut self, fatal: FatalReporter) {
        let Some(router) = self.router.take() else {
            warn!("Listener on {} already started", self.address);
            return;
        };

        let listener = match bind(&self.address) {
            Ok(listener) => listener,
            Err(source) => {
                fatal.report(FatalError::Bind {
                    address: self.address.clone(),
                    source,
                });
                return;
            }
        };

        self.local_addr = listener.local_addr().ok();
        match self.local_addr {
            Some(addr) => info!("Server listening on http://{}", addr),
            None => info!("Server listening on http://{}", self.address),
        }

        let signal = self.shutdown.clone();
        let serving = async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        };
        self.handle = Some(tokio::spawn(supervise(
            serving,
            self.shutdown.clone(),
            self.address.clone(),
            fatal,
        )));
    }

    async fn stop(&mut self, deadline: Duration) -> Result<(), StopError> {
        let handle = self.handle.take().ok_or_else(|| StopError::NotRunning {
            subsystem: self.name().to_string(),
        })?;

        info!("Listener draining in-flight requests (deadline {:?})", deadline);
        self.shutdown.cancel();

        join_within(self.name(), handle, deadline).await
    }

    fn abort(&mut self) {
        self.shutdown.cancel();
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Await the server and escalate if it ends without a stop request
async fn supervise<F>(serving: F, shutdown: CancellationToken, address: String, fatal: FatalReporter)
where
    F: Future<Output = io::Result<()>>,
{
    let result = serving.await;

    if shutdown.is_cancelled() {
        match result {
            Ok(()) => info!("Listener on {} drained", address),
            Err(e) => warn!("Listener on {} drained with error: {}", address, e),
        }
        return;
    }

    // The accept loop only ends on its own when something is badly wrong
    let reason = match result {
        Ok(()) => "accept loop ended".to_string(),
        Err(e) => e.to_string(),
    };
    fatal.report(FatalError::ListenerClosed { address, reason });
}

/// Bind synchronously so a taken port is reported before `start_async` returns.
///
/// Name resolution blocks; addresses are expected to be literal or local.
fn bind(address: &str) -> io::Result<TcpListener> {
    let addrs: Vec<SocketAddr> = address.to_socket_addrs()?.collect();
    let listener = std::net::TcpListener::bind(&addrs[..])?;
    listener.set_nonblocking(true)?;
    TcpListener::from_std(listener)
}
