use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use deltawriter_engine::{CommitEngine, CommitResult};
use deltawriter_schema::{Metrics, NoopMetrics, Record, RecordSchema};
use tokio::sync::{oneshot, Mutex, Semaphore};
use tokio::time::{interval, timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::{Result, SchedulerError};
use crate::model::{optimal_batch_size, SchedulerConfig, WriteSubmission};

/// Upper bound on how long [`BatchScheduler::shutdown`] waits for the
/// in-flight tick to finish before abandoning it.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(5);

/// Accepts `submit(table, records, schema)` calls, queues them, and, on a
/// periodic tick, drains the queue, groups by table, and dispatches each
/// group to the commit engine — coalescing concurrent per-table writes
/// into a single Delta transaction. Grounded directly on the
/// ticker/worker-pool shape of an execution manager that serializes
/// queued work behind a semaphore, generalized here to `commit_threads`
/// permits for per-table parallelism.
pub struct BatchScheduler {
    queue: Arc<Mutex<VecDeque<WriteSubmission>>>,
    commit_engine: Arc<CommitEngine>,
    config: SchedulerConfig,
    metrics: Arc<dyn Metrics>,
    shutdown: CancellationToken,
    ticker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl BatchScheduler {
    pub fn new(commit_engine: CommitEngine, config: SchedulerConfig) -> Self {
        Self::with_metrics(commit_engine, config, Arc::new(NoopMetrics))
    }

    pub fn with_metrics(commit_engine: CommitEngine, config: SchedulerConfig, metrics: Arc<dyn Metrics>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            commit_engine: Arc::new(commit_engine),
            config,
            metrics,
            shutdown: CancellationToken::new(),
            ticker: Mutex::new(None),
        }
    }

    /// Starts the periodic ticker and worker pool. Idempotent while
    /// already running; call again after [`Self::shutdown`] to restart.
    pub async fn start(&self) {
        let mut guard = self.ticker.lock().await;
        if guard.is_some() {
            return;
        }

        let queue = self.queue.clone();
        let commit_engine = self.commit_engine.clone();
        let config = self.config.clone();
        let metrics = self.metrics.clone();
        let shutdown = self.shutdown.clone();
        let semaphore = Arc::new(Semaphore::new(config.commit_threads.max(1)));

        let handle = tokio::spawn(async move {
            run_ticker(queue, commit_engine, config, metrics, semaphore, shutdown).await;
        });
        *guard = Some(handle);
    }

    /// Submits `records` for `table` and awaits the resulting commit,
    /// bounded by `write_timeout_ms`. An empty `records` is a no-op that
    /// resolves immediately with the table's current version, bypassing
    /// the queue entirely.
    #[instrument(skip(self, records, schema), fields(record_count = records.len()))]
    pub async fn submit(&self, table: &str, records: Vec<Record>, schema: RecordSchema) -> Result<CommitResult> {
        if table.is_empty() {
            return Err(SchedulerError::InvalidInput("table name must not be empty".to_string()));
        }
        if self.shutdown.is_cancelled() {
            return Err(SchedulerError::Shutdown);
        }
        if records.is_empty() {
            return self
                .commit_engine
                .commit(table, records, &schema)
                .await
                .map_err(SchedulerError::from);
        }

        let (tx, rx) = oneshot::channel();
        let submission = WriteSubmission {
            table: table.to_string(),
            records,
            schema,
            completion: tx,
        };

        {
            let mut queue = self.queue.lock().await;
            queue.push_back(submission);
            self.metrics.set_queue_size(queue.len() as u64);
        }

        match timeout(Duration::from_millis(self.config.write_timeout_ms), rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SchedulerError::Shutdown),
            Err(_) => Err(SchedulerError::WriteTimeout),
        }
    }

    /// Stops the ticker, waits up to [`SHUTDOWN_WAIT`] for the in-flight
    /// tick to finish, then drains the queue and fails every pending
    /// submission with [`SchedulerError::Shutdown`]. Already-dispatched
    /// commits run to completion regardless of the wait.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        if let Some(handle) = self.ticker.lock().await.take() {
            if timeout(SHUTDOWN_WAIT, handle).await.is_err() {
                warn!("ticker did not stop within the shutdown wait, abandoning it");
            }
        }
        let mut queue = self.queue.lock().await;
        while let Some(submission) = queue.pop_front() {
            let _ = submission.completion.send(Err(SchedulerError::Shutdown));
        }
    }
}

async fn run_ticker(
    queue: Arc<Mutex<VecDeque<WriteSubmission>>>,
    commit_engine: Arc<CommitEngine>,
    config: SchedulerConfig,
    metrics: Arc<dyn Metrics>,
    semaphore: Arc<Semaphore>,
    shutdown: CancellationToken,
) {
    let mut ticker = interval(Duration::from_millis(config.batch_timeout_ms.max(1)));
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let queue = queue.clone();
                let commit_engine = commit_engine.clone();
                let metrics = metrics.clone();
                let semaphore = semaphore.clone();
                let max_batch_size = config.max_batch_size;

                // Run the tick body on its own task so a panic inside it
                // doesn't take the ticker loop down with it.
                let tick = tokio::spawn(async move {
                    run_tick(queue, commit_engine, metrics, semaphore, max_batch_size).await;
                });
                if let Err(join_err) = tick.await {
                    error!(error = %join_err, "scheduler tick panicked, continuing");
                }
            }
        }
    }
}

async fn run_tick(
    queue: Arc<Mutex<VecDeque<WriteSubmission>>>,
    commit_engine: Arc<CommitEngine>,
    metrics: Arc<dyn Metrics>,
    semaphore: Arc<Semaphore>,
    configured_batch_size: usize,
) {
    let drained = {
        let mut queue = queue.lock().await;
        let depth = queue.len();
        if depth == 0 {
            return;
        }
        let cap = optimal_batch_size(depth, configured_batch_size);
        metrics.set_optimal_batch_size(cap as u64);
        let take = cap.min(depth);
        let drained: Vec<WriteSubmission> = (0..take).filter_map(|_| queue.pop_front()).collect();
        metrics.set_queue_size(queue.len() as u64);
        drained
    };

    // Group by table, preserving each table's first-seen order so the
    // dispatch below processes groups in roughly enqueue order.
    let mut groups: HashMap<String, Vec<WriteSubmission>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for submission in drained {
        if !groups.contains_key(&submission.table) {
            order.push(submission.table.clone());
        }
        groups.entry(submission.table.clone()).or_default().push(submission);
    }

    for table in order {
        let Some(submissions) = groups.remove(&table) else {
            continue;
        };
        let commit_engine = commit_engine.clone();
        let metrics = metrics.clone();
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("scheduler semaphore is never closed while the scheduler is alive");

        tokio::spawn(async move {
            dispatch_group(table, submissions, commit_engine, metrics).await;
            drop(permit);
        });
    }
}

async fn dispatch_group(
    table: String,
    submissions: Vec<WriteSubmission>,
    commit_engine: Arc<CommitEngine>,
    metrics: Arc<dyn Metrics>,
) {
    if submissions.len() > 1 {
        metrics.incr_batch_consolidations();
    }

    let schema = submissions[0].schema.clone();
    let mut records = Vec::new();
    for submission in &submissions {
        records.extend(submission.records.iter().cloned());
    }

    info!(
        table,
        submissions = submissions.len(),
        records = records.len(),
        "dispatching coalesced commit"
    );

    match commit_engine.commit(&table, records, &schema).await {
        Ok(result) => {
            for submission in submissions {
                let _ = submission.completion.send(Ok(result));
            }
        }
        Err(err) => {
            let scheduler_err = SchedulerError::from(err);
            warn!(table, error = %scheduler_err, "commit failed, propagating to all coalesced submissions");
            for submission in submissions {
                let _ = submission.completion.send(Err(scheduler_err.clone()));
            }
        }
    }
}
