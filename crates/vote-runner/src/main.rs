//! vote-runner: put every statement in a file to a panel of models and
//! report how often they answer TRUE.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use vote_coordination::{load_statements, write_report, ShardingScheme, VoteConfig, VoteCoordinator};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Statements file, one per line (overrides config `input_path`)
    input: Option<PathBuf>,

    /// TOML config file; environment variables still apply on top
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated backend models (overrides VOTE_MODELS)
    #[arg(long, value_delimiter = ',')]
    models: Option<Vec<String>>,

    /// Comma-separated expert roles (overrides VOTE_ROLES)
    #[arg(long, value_delimiter = ',', conflicts_with = "no_roles")]
    roles: Option<Vec<String>>,

    /// Only run layer-2 (persona-free) queries
    #[arg(long, default_value_t = false)]
    no_roles: bool,

    /// Number of concurrent workers (overrides VOTE_WORKERS)
    #[arg(long)]
    workers: Option<usize>,

    /// Model server base URL (overrides OLLAMA_HOST)
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds (overrides VOTE_REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// tail-remainder, contiguous or strided (overrides VOTE_SHARDING)
    #[arg(long)]
    sharding: Option<ShardingScheme>,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the run summary as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Args {
    /// Apply flags on top of an already resolved config
    fn apply(self, config: &mut VoteConfig) {
        if let Some(path) = self.input {
            config.input_path = path;
        }
        if let Some(models) = self.models {
            config.models = clean(models);
        }
        if self.no_roles {
            config.roles.clear();
        } else if let Some(roles) = self.roles {
            config.roles = clean(roles);
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(url) = self.base_url {
            config.backend_base_url = url;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(scheme) = self.sharding {
            config.sharding = scheme;
        }
        if let Some(path) = self.output {
            config.output_path = Some(path);
        }
    }
}

fn clean(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// defaults → TOML file → environment → flags
fn resolve_config<F>(args: Args, lookup: F) -> Result<VoteConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => VoteConfig::from_file(path)?,
        None => VoteConfig::default(),
    };
    config.apply_env(lookup);
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = args.json;
    let config = resolve_config(args, |key| std::env::var(key).ok())?;

    let statements = load_statements(&config.input_path)
        .with_context(|| format!("loading statements from {}", config.input_path.display()))?;

    info!(
        workers = config.worker_count,
        models = ?config.models,
        roles = ?config.roles,
        backend = %config.backend_base_url,
        statements = statements.len(),
        "Vote runner starting"
    );

    let coordinator = VoteCoordinator::with_ollama(config)?;
    let summary = coordinator.run(&statements).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }

    if let Some(path) = &coordinator.config().output_path {
        write_report(path, &summary)?;
    }

    Ok(())
}
