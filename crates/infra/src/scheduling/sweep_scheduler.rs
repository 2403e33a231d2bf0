//! Cron scheduler for the periodic status sweep.
//!
//! Join handles are tracked, cancellation is explicit, and every
//! asynchronous operation is wrapped in a timeout. The sweep itself is
//! idempotent, so overlapping or repeated runs are harmless.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mawid_core::StatusSweepService;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Trait representing one sweep pass.
#[async_trait]
pub trait SweepJob: Send + Sync {
    /// Execute the sweep; returns the number of updated appointments.
    async fn run(&self) -> mawid_domain::Result<usize>;
}

#[async_trait]
impl SweepJob for StatusSweepService {
    async fn run(&self) -> mawid_domain::Result<usize> {
        self.run_once().await
    }
}

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single sweep pass.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for SweepSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 */5 * * * *".into(), // every 5 minutes
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Status sweep scheduler with explicit lifecycle management.
pub struct SweepScheduler {
    scheduler: Arc<RwLock<Option<JobScheduler>>>,
    config: SweepSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    job: Arc<dyn SweepJob>,
}

impl SweepScheduler {
    /// Create a scheduler with the default configuration.
    pub fn new(cron_expression: String, job: Arc<dyn SweepJob>) -> Self {
        let config = SweepSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, job)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: SweepSchedulerConfig, job: Arc<dyn SweepJob>) -> Self {
        Self {
            scheduler: Arc::new(RwLock::new(None)),
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            job,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?;

        start_result.map_err(|source| SchedulerError::StartFailed { source })?;

        {
            let mut guard = self.scheduler.write().await;
            *guard = Some(scheduler_instance);
        }

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!(cron = %self.config.cron_expression, "Sweep scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let scheduler = {
            let mut guard = self.scheduler.write().await;
            guard.take()
        };

        let mut scheduler = match scheduler {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?;

        stop_result.map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Sweep scheduler stopped");
        Ok(())
    }

    /// Returns true when the monitor task is active.
    pub fn is_running(&self) -> bool {
        self.monitor_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;
        let cron_expr = self.config.cron_expression.clone();
        let job = self.job.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let job = job.clone();

            Box::pin(async move {
                let started = Instant::now();

                match tokio::time::timeout(job_timeout, job.run()).await {
                    Ok(Ok(updated)) => {
                        debug!(updated, elapsed = ?started.elapsed(), "Sweep pass finished");
                    }
                    Ok(Err(err)) => {
                        error!(error = ?err, "Sweep pass failed");
                    }
                    Err(elapsed) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "Sweep pass timed out");
                        debug!(elapsed = ?elapsed, "Timeout details");
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered sweep job");
        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Sweep scheduler monitor cancelled");
    }
}

impl Drop for SweepScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SweepScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
