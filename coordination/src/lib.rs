//! Multi-model statement voting
//!
//! This library runs a voting protocol over natural-language statements:
//! every statement is put to several language-model backends, once with no
//! persona (layer 2) and once per configured expert role (layer 3), and the
//! TRUE/FALSE answers are tallied into an agreement percentage per statement.
//!
//! # Pipeline
//!
//! ```text
//! statements ──► TaskGenerator ──► distribute ──► WorkerPool ──► merge_tallies
//!                 (S×M×(1+R))       (W shards)    (W workers)     (per prompt_id)
//! ```
//!
//! - [`task`]: expands statements × models × roles into immutable tasks
//! - [`distribution`]: splits tasks into `W` near-equal shards
//! - [`executor`]: runs each shard on its own worker, isolating failures
//! - [`aggregate`]: sums per-worker tallies after all workers join
//! - [`judgment`]: classifies a response as TRUE/FALSE
//! - [`client`]: the backend seam, with an Ollama implementation
//!
//! # Usage
//!
//! ```ignore
//! use vote_coordination::{load_statements, VoteConfig, VoteCoordinator};
//!
//! let config = VoteConfig::from_env();
//! let statements = load_statements(&config.input_path)?;
//! let coordinator = VoteCoordinator::with_ollama(config)?;
//! let summary = coordinator.run(&statements).await?;
//! print!("{}", summary.render());
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod aggregate;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod distribution;
pub mod executor;
pub mod judgment;
pub mod report;
pub mod statement;
pub mod task;

pub use aggregate::{merge_tallies, AggregateReport, StatementResult, Tally, TallyMap};
pub use client::{OllamaClient, QueryClient, QueryError, SharedQueryClient};
pub use config::{ConfigError, VoteConfig};
pub use coordinator::{CoordinatorError, CoordinatorResult, VoteCoordinator};
pub use distribution::{distribute, DistributionError, Shard, ShardingScheme};
pub use executor::{execute_task, TaskOutcome, WorkerPool, WorkerReport};
pub use judgment::{parse_decision, parse_judgment, Decision, Judgment};
pub use report::{write_report, ReportError, RunSummary};
pub use statement::{load_statements, parse_statements, InputError, PromptId, Statement};
pub use task::{generate_tasks, Layer, QueryKind, Task, TaskGenerator, DEFAULT_ROLE};
