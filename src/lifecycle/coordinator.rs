//! Lifecycle coordinator
//!
//! Owns every [`Drainable`] subsystem, starts them, waits for the shutdown
//! signal, and stops them all concurrently under one deadline. Work that
//! outlives the deadline keeps running detached while the coordinator returns,
//! which is the accepted cost of never hanging on exit.

use std::{future::Future, time::Duration};

use axum::Router;
use futures::future::join_all;
use tokio::time::{timeout, Instant};
use tracing::{error, info};

use super::{completion_gate, fatal_channel, GateCloser, GateWaiter, LifecycleError};
use crate::{
    config::LifecycleConfig,
    cron::CronError,
    subsystems::{Drainable, Job, Listener, Scheduler, StopError},
    utils::ShutdownSignal,
};

/// How one subsystem's stop went
#[derive(Debug)]
pub struct SubsystemOutcome {
    pub name: String,
    pub result: Result<(), StopError>,
    pub elapsed: Duration,
}

/// Result of one shutdown episode
#[derive(Debug)]
pub struct ShutdownReport {
    pub outcomes: Vec<SubsystemOutcome>,
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// True when every subsystem drained within the deadline
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Outcome for the subsystem called `name`
    pub fn outcome(&self, name: &str) -> Option<&SubsystemOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

pub struct Coordinator {
    subsystems: Vec<Box<dyn Drainable>>,
    shutdown_timeout: Duration,
    gate: Option<GateCloser>,
    completion: GateWaiter,
}

impl Coordinator {
    /// Create a coordinator with no subsystems
    pub fn new(shutdown_timeout: Duration) -> Self {
        let (gate, completion) = completion_gate();

        Self {
            subsystems: Vec::new(),
            shutdown_timeout,
            gate: Some(gate),
            completion,
        }
    }

    /// Create a coordinator owning a listener serving `router` and a scheduler
    /// running `job`. Fails before anything starts if the cadence is malformed.
    pub fn from_config(config: &LifecycleConfig, router: Router, job: impl Job) -> Result<Self, CronError> {
        let scheduler = Scheduler::new(&config.cron_expression, job)?;
        let listener = Listener::new(config.listen_address.clone(), router);

        Ok(Self::new(config.shutdown_timeout)
            .with_subsystem(listener)
            .with_subsystem(scheduler))
    }

    /// Add a subsystem
    pub fn with_subsystem(mut self, subsystem: impl Drainable + 'static) -> Self {
        self.subsystems.push(Box::new(subsystem));
        self
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Handle on the completion gate, closed once a run has finished
    pub fn completion(&self) -> GateWaiter {
        self.completion.clone()
    }

    /// Run until SIGINT or SIGTERM, then drain
    pub async fn start(&mut self) -> Result<ShutdownReport, LifecycleError> {
        let signal = ShutdownSignal::register().map_err(LifecycleError::SignalRegistration)?;
        self.run_until(signal.wait()).await
    }

    /// Run until `shutdown` completes, then drain.
    ///
    /// Returns only after every subsystem's stop has returned. A fatal report
    /// from any subsystem ends the run immediately with an error.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<ShutdownReport, LifecycleError>
    where
        F: Future<Output = ()>,
    {
        // Released on every return path below
        let _gate = self.gate.take().ok_or(LifecycleError::AlreadyStarted)?;

        let (reporter, mut fatal) = fatal_channel();
        let started = self.subsystems.len();
        for index in 0..started {
            let subsystem = &mut self.subsystems[index];
            info!("Starting {}", subsystem.name());
            subsystem.start_async(reporter.clone());

            // A failed start leaves the remaining subsystems unstarted
            if let Some(err) = fatal.try_recv() {
                self.abort_started(index + 1);
                return Err(err.into());
            }
        }
        drop(reporter);

        tokio::select! {
            biased;
            err = fatal.recv() => {
                self.abort_started(started);
                return Err(err.into());
            }
            _ = shutdown => info!("Shutdown requested, stopping {} subsystems", self.subsystems.len()),
        }

        let report = self.stop_all().await;
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(()) => info!("{} stopped in {:?}", outcome.name, outcome.elapsed),
                Err(e) => error!("{} stop error: {}", outcome.name, e),
            }
        }

        info!("Service stopped in {:?}", report.elapsed);
        Ok(report)
    }

    /// Cut intake on the first `started` subsystems without draining
    fn abort_started(&mut self, started: usize) {
        for subsystem in self.subsystems.iter_mut().take(started) {
            info!("Aborting {}", subsystem.name());
            subsystem.abort();
        }
    }

    async fn stop_all(&mut self) -> ShutdownReport {
        let deadline = self.shutdown_timeout;
        let started = Instant::now();

        let stops = self.subsystems.iter_mut().map(|subsystem| async move {
            let begin = Instant::now();
            let name = subsystem.name().to_string();
            // Bounded here as well so a subsystem ignoring its deadline cannot hang exit
            let result = match timeout(deadline, subsystem.stop(deadline)).await {
                Ok(result) => result,
                Err(_) => Err(StopError::DeadlineExceeded {
                    subsystem: name.clone(),
                    deadline,
                }),
            };

            SubsystemOutcome {
                name,
                result,
                elapsed: begin.elapsed(),
            }
        });

        let outcomes = join_all(stops).await;

        ShutdownReport {
            outcomes,
            elapsed: started.elapsed(),
        }
    }
}
