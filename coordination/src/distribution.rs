//! Work Distributor - partitions the task list into per-worker shards
//!
//! Every scheme yields exactly `W` disjoint shards whose sizes differ by at
//! most one, with the first `N mod W` shards holding the extra task. When
//! `N < W` the trailing shards are empty.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Error type for distribution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DistributionError {
    #[error("Worker count must be at least 1")]
    NoWorkers,
}

/// How tasks are assigned to shards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardingScheme {
    /// Shard `i` takes `floor(N/W)` contiguous tasks at offset `i*floor(N/W)`;
    /// shards `i < N mod W` then get task `floor(N/W)*W + i` appended.
    #[default]
    TailRemainder,
    /// One contiguous block per shard, larger blocks first. Concatenating the
    /// shards in order gives back the input.
    Contiguous,
    /// Shard `i` takes tasks `i, i+W, i+2W, ...`
    Strided,
}

impl std::str::FromStr for ShardingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "tail_remainder" | "tail" => Ok(Self::TailRemainder),
            "contiguous" | "block" => Ok(Self::Contiguous),
            "strided" | "round_robin" => Ok(Self::Strided),
            other => Err(format!("unknown sharding scheme: {other}")),
        }
    }
}

impl std::fmt::Display for ShardingScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TailRemainder => write!(f, "tail_remainder"),
            Self::Contiguous => write!(f, "contiguous"),
            Self::Strided => write!(f, "strided"),
        }
    }
}

/// Tasks assigned to one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub worker_id: usize,
    pub tasks: Vec<Task>,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Partition `tasks` into `worker_count` shards using `scheme`.
pub fn distribute(
    tasks: Vec<Task>,
    worker_count: usize,
    scheme: ShardingScheme,
) -> Result<Vec<Shard>, DistributionError> {
    if worker_count == 0 {
        return Err(DistributionError::NoWorkers);
    }

    let buckets = match scheme {
        ShardingScheme::TailRemainder => tail_remainder(tasks, worker_count),
        ShardingScheme::Contiguous => contiguous(tasks, worker_count),
        ShardingScheme::Strided => strided(tasks, worker_count),
    };

    Ok(buckets
        .into_iter()
        .enumerate()
        .map(|(worker_id, tasks)| Shard { worker_id, tasks })
        .collect())
}

/// Shard sizes any scheme produces for `task_count` tasks
pub fn shard_sizes(task_count: usize, worker_count: usize) -> Vec<usize> {
    if worker_count == 0 {
        return Vec::new();
    }
    let base = task_count / worker_count;
    let remainder = task_count % worker_count;
    (0..worker_count)
        .map(|i| base + usize::from(i < remainder))
        .collect()
}

fn tail_remainder(tasks: Vec<Task>, worker_count: usize) -> Vec<Vec<Task>> {
    let base = tasks.len() / worker_count;
    let mut buckets: Vec<Vec<Task>> = shard_sizes(tasks.len(), worker_count)
        .into_iter()
        .map(Vec::with_capacity)
        .collect();

    for (index, task) in tasks.into_iter().enumerate() {
        let worker = if index < base * worker_count {
            index / base
        } else {
            index - base * worker_count
        };
        buckets[worker].push(task);
    }

    buckets
}

fn contiguous(tasks: Vec<Task>, worker_count: usize) -> Vec<Vec<Task>> {
    let sizes = shard_sizes(tasks.len(), worker_count);
    let mut remaining = tasks.into_iter();

    sizes
        .into_iter()
        .map(|size| remaining.by_ref().take(size).collect())
        .collect()
}

fn strided(tasks: Vec<Task>, worker_count: usize) -> Vec<Vec<Task>> {
    let mut buckets: Vec<Vec<Task>> = shard_sizes(tasks.len(), worker_count)
        .into_iter()
        .map(Vec::with_capacity)
        .collect();
    for (index, task) in tasks.into_iter().enumerate() {
        buckets[index % worker_count].push(task);
    }
    buckets
}
