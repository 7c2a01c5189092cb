//! Worker loop and pool: claim → dispatch → complete → advance.
//!
//! Two failure boundaries, per the error taxonomy: a collaborator
//! failure is absorbed into the claimed task (failed status, retries,
//! last_error) and never leaves `process_task`; an infrastructure
//! failure (claim or status update itself) propagates to the outer
//! loop, which backs off and retries instead of terminating. Idle is
//! not an error; the worker sleeps the poll interval and continues.

use crate::db::Db;
use crate::error::{Error, Result};
use crate::model::ClaimedTask;
use crate::telemetry::metrics;
use crate::telemetry::task::start_task_span;
use opentelemetry::KeyValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, warn};

use super::dispatch::Dispatch;
use super::populate::Populator;
use super::registry::Stage;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Backoff sleep after an empty claim or an infrastructure error.
    pub poll_interval: Duration,
    /// Task types this worker claims.
    pub stages: Vec<Stage>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            stages: Stage::ACTIVE.to_vec(),
        }
    }
}

/// Outcome of one loop iteration.
#[derive(Debug, PartialEq, Eq)]
pub enum Tick {
    Processed,
    Idle,
}

pub struct Worker {
    pub id: usize,
    db: Arc<Db>,
    dispatch: Arc<Dispatch>,
    populator: Arc<Populator>,
    config: WorkerConfig,
}

impl Worker {
    pub fn new(
        id: usize,
        db: Arc<Db>,
        dispatch: Arc<Dispatch>,
        populator: Arc<Populator>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            id,
            db,
            dispatch,
            populator,
            config,
        }
    }

    /// Run until the shutdown signal. The loop never exits on idle.
    ///
    /// Shutdown is observed only between ticks and during the backoff
    /// sleep: a claimed task always runs to completion, so no task is
    /// ever stranded in_progress by a stopping worker.
    pub async fn run(&self, shutdown: Arc<Notify>, stopping: Arc<AtomicBool>) {
        info!(worker_id = self.id, "worker started");

        while !stopping.load(Ordering::Relaxed) {
            match self.tick().await {
                Ok(Tick::Processed) => {}
                Ok(Tick::Idle) => {
                    if self.backoff(&shutdown).await {
                        break;
                    }
                }
                Err(e) => {
                    error!(worker_id = self.id, error = %e, "worker loop error, backing off");
                    if self.backoff(&shutdown).await {
                        break;
                    }
                }
            }
        }

        info!(worker_id = self.id, "worker stopped");
    }

    /// Sleep the poll interval, waking early on shutdown. Returns true
    /// when the worker should exit.
    async fn backoff(&self, shutdown: &Notify) -> bool {
        tokio::select! {
            _ = shutdown.notified() => true,
            _ = tokio::time::sleep(self.config.poll_interval) => false,
        }
    }

    /// Claim and process at most one task.
    ///
    /// Errors from this method are infrastructure failures (queue store
    /// unreachable); collaborator failures are already folded into the
    /// task by the time it returns.
    pub async fn tick(&self) -> Result<Tick> {
        let Some(task) = self.db.claim(&self.config.stages).await? else {
            return Ok(Tick::Idle);
        };

        self.process_task(task).await?;
        Ok(Tick::Processed)
    }

    /// Execute one claimed task and record its outcome.
    async fn process_task(&self, task: ClaimedTask) -> Result<()> {
        // A task type absent from the registry is fatal for the task,
        // not the worker: mark failed without invoking anything.
        let stage: Stage = match task.task_type.parse() {
            Ok(stage) => stage,
            Err(Error::UnknownStage(name)) => {
                warn!(
                    worker_id = self.id,
                    task_id = task.id,
                    task_type = %name,
                    "unknown task type, failing task"
                );
                self.db
                    .complete(task.id, Some(&format!("unknown task type: {name}")))
                    .await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let span = start_task_span(stage.as_str(), task.id, task.person_id);

        async {
            let start = Instant::now();
            let outcome = self
                .dispatch
                .invoke(stage, self.id, task.person_id)
                .await;
            let duration_ms = start.elapsed().as_millis() as u64;

            metrics::stage_duration_ms().record(
                duration_ms as f64,
                &[KeyValue::new("task_type", stage.as_str())],
            );

            match outcome {
                Ok(true) => {
                    self.db.complete(task.id, None).await?;
                    info!(
                        worker_id = self.id,
                        task_id = task.id,
                        person_id = task.person_id,
                        duration_ms,
                        "task done"
                    );
                    self.advance(task.person_id, stage).await?;
                }
                Ok(false) => {
                    self.db
                        .complete(task.id, Some("stage reported failure"))
                        .await?;
                    warn!(
                        worker_id = self.id,
                        task_id = task.id,
                        person_id = task.person_id,
                        "stage reported failure"
                    );
                }
                Err(e) => {
                    self.db.complete(task.id, Some(&e.to_string())).await?;
                    warn!(
                        worker_id = self.id,
                        task_id = task.id,
                        person_id = task.person_id,
                        error = %e,
                        "task failed"
                    );
                }
            }

            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Enqueue the next stage in the chain, if any.
    async fn advance(&self, person_id: i64, stage: Stage) -> Result<()> {
        if let Some(next) = stage.next() {
            self.populator.add_for_person(person_id, next).await?;
        }
        Ok(())
    }
}

/// Runs many workers concurrently over the shared connection pool.
pub struct WorkerPool {
    db: Arc<Db>,
    dispatch: Arc<Dispatch>,
    populator: Arc<Populator>,
    config: WorkerConfig,
    workers: usize,
    shutdown: Arc<Notify>,
    stopping: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(
        db: Arc<Db>,
        dispatch: Arc<Dispatch>,
        populator: Arc<Populator>,
        config: WorkerConfig,
        workers: usize,
    ) -> Self {
        Self {
            db,
            dispatch,
            populator,
            config,
            workers,
            shutdown: Arc::new(Notify::new()),
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal every worker to stop after its current task.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::Relaxed);
        self.shutdown.notify_waiters();
    }

    /// Spawn all workers and wait for them to finish.
    pub async fn run(&self) -> Result<()> {
        info!(workers = self.workers, "starting worker pool");

        let mut set = JoinSet::new();
        for id in 0..self.workers {
            let worker = Worker::new(
                id,
                Arc::clone(&self.db),
                Arc::clone(&self.dispatch),
                Arc::clone(&self.populator),
                self.config.clone(),
            );
            let shutdown = Arc::clone(&self.shutdown);
            let stopping = Arc::clone(&self.stopping);
            set.spawn(async move { worker.run(shutdown, stopping).await });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task aborted");
            }
        }

        info!("worker pool stopped");
        Ok(())
    }
}
