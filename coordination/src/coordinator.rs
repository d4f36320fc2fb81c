//! Vote coordinator - runs the whole protocol for one set of statements
//!
//! generate tasks → shard → run workers → join → merge → report

use std::time::Instant;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::aggregate::{merge_tallies, AggregateReport};
use crate::client::{OllamaClient, QueryError, SharedQueryClient};
use crate::config::{ConfigError, VoteConfig};
use crate::distribution::{distribute, DistributionError};
use crate::executor::WorkerPool;
use crate::report::RunSummary;
use crate::statement::Statement;
use crate::task::TaskGenerator;

/// Error type for coordinator operations
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Distribution failed: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Failed to build query client: {0}")]
    Client(#[from] QueryError),
}

/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Drives a voting run end to end
pub struct VoteCoordinator {
    config: VoteConfig,
    generator: TaskGenerator,
    pool: WorkerPool,
}

impl VoteCoordinator {
    /// Create a coordinator around any query client. The config is
    /// validated here so a bad run fails before any task exists.
    pub fn new(client: SharedQueryClient, config: VoteConfig) -> CoordinatorResult<Self> {
        config.validate()?;
        let generator = TaskGenerator::new(config.models.clone(), config.roles.clone());

        Ok(Self {
            config,
            generator,
            pool: WorkerPool::new(client),
        })
    }

    /// Create a coordinator talking to the configured Ollama backend
    pub fn with_ollama(config: VoteConfig) -> CoordinatorResult<Self> {
        let client = OllamaClient::new(config.backend_base_url.clone(), config.request_timeout())?;
        Self::new(std::sync::Arc::new(client), config)
    }

    pub fn config(&self) -> &VoteConfig {
        &self.config
    }

    /// Run every (statement, model, role) query and merge the votes
    pub async fn run(&self, statements: &[Statement]) -> CoordinatorResult<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        let tasks = self.generator.generate(statements);
        let task_count = tasks.len();

        info!(
            %run_id,
            statements = statements.len(),
            models = self.config.models.len(),
            roles = self.config.roles.len(),
            workers = self.config.worker_count,
            tasks = task_count,
            sharding = %self.config.sharding,
            "Starting voting run"
        );

        let shards = distribute(tasks, self.config.worker_count, self.config.sharding)?;
        let reports = self.pool.run(shards).await;

        let failed_tasks: usize = reports.iter().map(|r| r.failed).sum();
        let merged = merge_tallies(reports.into_iter().map(|r| r.tally));
        let report = AggregateReport::from_tallies(merged);

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            elapsed_secs: start.elapsed().as_secs_f64(),
            worker_count: self.config.worker_count,
            model_count: self.config.models.len(),
            role_count: self.config.roles.len(),
            statement_count: statements.len(),
            task_count,
            failed_tasks,
            report,
        };

        let overall = summary.overall();
        info!(
            %run_id,
            agree = overall.agree,
            decision = overall.decision,
            failed = failed_tasks,
            elapsed_secs = summary.elapsed_secs,
            "Voting run complete"
        );

        Ok(summary)
    }
}
