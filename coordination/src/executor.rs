//! Worker Executor - runs shards concurrently with per-task failure isolation
//!
//! # Scheduling
//!
//! ```text
//!   Vec<Shard> ──► JoinSet::spawn(worker_i, shard_i) × W
//!                     │  for task in shard (in order):
//!                     │    query → parse → local tally
//!                     ▼
//!   join_next() until drained ──► Vec<WorkerReport>
//! ```
//!
//! Workers share only the read-only client. Each keeps its own [`TallyMap`]
//! and hands it back when its shard is exhausted; merging happens after the
//! join barrier.
//!
//! ## Failure policy
//!
//! A task whose query returns nothing, returns an empty body, or panics
//! contributes zero to its statement and the worker moves on. No task is
//! retried.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::aggregate::TallyMap;
use crate::client::SharedQueryClient;
use crate::distribution::Shard;
use crate::judgment::{parse_judgment, Judgment};
use crate::task::Task;

/// What happened to a single task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Judged(Judgment),
    /// Transport failure, non-success status or empty response
    NoResponse,
    /// The task panicked; the message is kept for logs
    Faulted(String),
}

impl TaskOutcome {
    pub fn judgment(&self) -> Option<&Judgment> {
        match self {
            TaskOutcome::Judged(judgment) => Some(judgment),
            _ => None,
        }
    }
}

/// Everything one worker produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerReport {
    pub worker_id: usize,
    /// Local per-statement tallies
    pub tally: TallyMap,
    /// Tasks that produced a judgment
    pub completed: usize,
    /// Tasks that contributed nothing
    pub failed: usize,
    pub elapsed: Duration,
}

/// Pool of concurrent workers sharing one query client
#[derive(Clone)]
pub struct WorkerPool {
    client: SharedQueryClient,
}

impl WorkerPool {
    pub fn new(client: SharedQueryClient) -> Self {
        Self { client }
    }

    /// Run every shard on its own worker and wait for all of them.
    ///
    /// Reports come back sorted by worker id.
    pub async fn run(&self, shards: Vec<Shard>) -> Vec<WorkerReport> {
        let worker_count = shards.len();
        let mut join_set: JoinSet<WorkerReport> = JoinSet::new();
        let mut reports = Vec::with_capacity(worker_count);

        for shard in shards {
            if shard.is_empty() {
                reports.push(WorkerReport {
                    worker_id: shard.worker_id,
                    ..Default::default()
                });
                continue;
            }
            let client = self.client.clone();
            join_set.spawn(run_worker(client, shard));
        }

        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(report) => {
                    debug!(
                        worker = report.worker_id,
                        completed = report.completed,
                        failed = report.failed,
                        elapsed_ms = report.elapsed.as_millis(),
                        "Worker finished"
                    );
                    reports.push(report);
                }
                Err(e) => {
                    // Cancellation, or a panic outside execute_task; the shard's tally is lost.
                    error!(error = %e, "Worker aborted");
                }
            }
        }

        reports.sort_by_key(|r| r.worker_id);
        info!(
            workers = worker_count,
            finished = reports.len(),
            "All workers joined"
        );
        reports
    }
}

/// Process one shard sequentially, accumulating locally
async fn run_worker(client: SharedQueryClient, shard: Shard) -> WorkerReport {
    let start = Instant::now();
    let mut report = WorkerReport {
        worker_id: shard.worker_id,
        ..Default::default()
    };

    debug!(worker = shard.worker_id, tasks = shard.len(), "Worker started");

    for task in &shard.tasks {
        let outcome = execute_task(&client, task).await;
        let tally = report.tally.entry(task.prompt_id).or_default();

        match outcome {
            TaskOutcome::Judged(judgment) => {
                tally.record(judgment.decision);
                report.completed += 1;
            }
            TaskOutcome::NoResponse => {
                report.failed += 1;
            }
            TaskOutcome::Faulted(message) => {
                error!(
                    worker = shard.worker_id,
                    task = %task.label(),
                    panic = %message,
                    "Task panicked"
                );
                report.failed += 1;
            }
        }
    }

    report.elapsed = start.elapsed();
    report
}

/// Query the backend for one task and parse the answer.
///
/// Never panics and never returns an error: every failure is folded into
/// the outcome.
pub async fn execute_task(client: &SharedQueryClient, task: &Task) -> TaskOutcome {
    let start = Instant::now();
    // Building the future runs implementor code too, so it stays inside the guard.
    let query = async { client.query(&task.model, &task.rendered_prompt).await };

    let response = match AssertUnwindSafe(query).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => return TaskOutcome::Faulted(panic_message(payload.as_ref())),
    };

    let outcome = match response {
        Some(text) if !text.is_empty() => TaskOutcome::Judged(parse_judgment(text)),
        Some(_) => {
            warn!(task = %task.label(), "Empty response");
            TaskOutcome::NoResponse
        }
        None => TaskOutcome::NoResponse,
    };

    debug!(
        task = %task.label(),
        decision = ?outcome.judgment().map(|j| j.decision),
        elapsed_ms = start.elapsed().as_millis(),
        "Task done"
    );

    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
