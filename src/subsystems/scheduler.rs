//! Cadence-driven job runner
//!
//! Runs one [`Job`] at every fire time of a [`Schedule`]. Invocations never
//! overlap: the next fire time is computed after the current one returns, so
//! a slow run delays the following one and missed ticks are skipped.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Local;
use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{join_within, Drainable, StopError};
use crate::{
    cron::{CronError, Schedule},
    lifecycle::FatalReporter,
};

/// Work invoked by the scheduler
#[async_trait]
pub trait Job: Send + Sync + 'static {
    async fn run(&self);
}

#[async_trait]
impl<F, Fut> Job for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self) {
        (self)().await
    }
}

/// Periodic-task subsystem
pub struct Scheduler {
    expression: String,
    schedule: Schedule,
    job: Arc<dyn Job>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Register `job` on `expression`. A malformed expression is rejected here,
    /// before anything is started.
    pub fn new(expression: &str, job: impl Job) -> Result<Self, CronError> {
        let schedule = Schedule::parse(expression)?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
            job: Arc::new(job),
            shutdown: CancellationToken::new(),
            handle: None,
        })
    }

    /// Parsed cadence
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}

#[async_trait]
impl Drainable for Scheduler {
    fn name(&self) -> &str {
        "scheduler"
    }

    fn start_async(&mut self, _fatal: FatalReporter) {
        if self.handle.is_some() {
            warn!("Scheduler already started");
            return;
        }

        info!("Scheduler starting with cadence {:?}", self.expression);
        self.handle = Some(tokio::spawn(run_loop(
            self.schedule.clone(),
            Arc::clone(&self.job),
            self.shutdown.clone(),
        )));
    }

    async fn stop(&mut self, deadline: Duration) -> Result<(), StopError> {
        let handle = self.handle.take().ok_or_else(|| StopError::NotRunning {
            subsystem: self.name().to_string(),
        })?;

        info!("Scheduler draining current run (deadline {:?})", deadline);
        self.shutdown.cancel();

        join_within(self.name(), handle, deadline).await
    }

    fn abort(&mut self) {
        self.shutdown.cancel();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_loop(schedule: Schedule, job: Arc<dyn Job>, shutdown: CancellationToken) {
    loop {
        let now = Local::now();
        let Some(next) = schedule.next_after(&now) else {
            warn!("Cadence has no upcoming run, idling until stopped");
            shutdown.cancelled().await;
            break;
        };
        debug!("Next run at {}", next.to_rfc3339());

        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = sleep(delay) => {}
        }

        // Not raced against shutdown: a started run always finishes
        job.run().await;
    }

    info!("Scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::fatal_channel;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::{timeout, Instant};

    fn counting_job(counter: Arc<AtomicUsize>) -> impl Job {
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_malformed_expression_rejected_at_construction() {
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(Scheduler::new("61 * * * *", counting_job(Arc::clone(&counter))).is_err());
        assert!(Scheduler::new("not a cron", counting_job(counter)).is_err());
    }

    #[tokio::test]
    async fn test_runs_on_cadence_and_stops_scheduling() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new("@every 50ms", counting_job(Arc::clone(&counter))).unwrap();
        let (reporter, _fatal) = fatal_channel();
        scheduler.start_async(reporter);

        sleep(Duration::from_millis(300)).await;
        scheduler.stop(Duration::from_secs(1)).await.unwrap();

        let runs = counter.load(Ordering::SeqCst);
        assert!(runs >= 2, "expected several runs, got {}", runs);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), runs);
    }

    #[tokio::test]
    async fn test_stop_lets_current_run_finish() {
        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let job = {
            let started = Arc::clone(&started);
            let finished = Arc::clone(&finished);
            move || {
                let started = Arc::clone(&started);
                let finished = Arc::clone(&finished);
                async move {
                    started.store(true, Ordering::SeqCst);
                    sleep(Duration::from_millis(300)).await;
                    finished.store(true, Ordering::SeqCst);
                }
            }
        };

        let mut scheduler = Scheduler::new("@every 10ms", job).unwrap();
        let (reporter, _fatal) = fatal_channel();
        scheduler.start_async(reporter);

        while !started.load(Ordering::SeqCst) {
            sleep(Duration::from_millis(5)).await;
        }

        scheduler.stop(Duration::from_secs(2)).await.unwrap();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_deadline_exceeded_detaches_current_run() {
        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let job = {
            let started = Arc::clone(&started);
            let finished = Arc::clone(&finished);
            move || {
                let started = Arc::clone(&started);
                let finished = Arc::clone(&finished);
                async move {
                    started.store(true, Ordering::SeqCst);
                    sleep(Duration::from_millis(400)).await;
                    finished.store(true, Ordering::SeqCst);
                }
            }
        };

        let mut scheduler = Scheduler::new("@every 10ms", job).unwrap();
        let (reporter, _fatal) = fatal_channel();
        scheduler.start_async(reporter);

        while !started.load(Ordering::SeqCst) {
            sleep(Duration::from_millis(5)).await;
        }

        let begin = Instant::now();
        let err = scheduler.stop(Duration::from_millis(50)).await.unwrap_err();
        assert!(err.is_deadline_exceeded());
        assert!(begin.elapsed() < Duration::from_millis(300));
        assert!(!finished.load(Ordering::SeqCst));

        timeout(Duration::from_secs(2), async {
            while !finished.load(Ordering::SeqCst) {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("detached run should still complete");
    }

    #[tokio::test]
    async fn test_idle_scheduler_stops_promptly() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new("@yearly", counting_job(Arc::clone(&counter))).unwrap();
        let (reporter, _fatal) = fatal_channel();
        scheduler.start_async(reporter);

        let begin = Instant::now();
        scheduler.stop(Duration::from_secs(5)).await.unwrap();
        assert!(begin.elapsed() < Duration::from_millis(200));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_abort_cancels_pending_runs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new("@every 10ms", counting_job(Arc::clone(&counter))).unwrap();
        let (reporter, _fatal) = fatal_channel();
        scheduler.start_async(reporter);

        scheduler.abort();
        sleep(Duration::from_millis(50)).await;
        let runs = counter.load(Ordering::SeqCst);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), runs);
    }

    #[tokio::test]
    async fn test_dropping_scheduler_cancels_pending_runs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new("@every 10ms", counting_job(Arc::clone(&counter))).unwrap();
        let (reporter, _fatal) = fatal_channel();
        scheduler.start_async(reporter);

        drop(scheduler);
        sleep(Duration::from_millis(50)).await;
        let runs = counter.load(Ordering::SeqCst);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), runs);
    }

    #[tokio::test]
    async fn test_stop_before_start_reports_not_running() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new("* * * * *", counting_job(counter)).unwrap();
        assert!(matches!(
            scheduler.stop(Duration::from_secs(1)).await,
            Err(StopError::NotRunning { .. })
        ));
    }
}
