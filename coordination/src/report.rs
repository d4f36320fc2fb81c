//! Run summary, console formatting and JSON export

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::aggregate::{AggregateReport, StatementResult, Tally};
use crate::statement::PromptId;

const RULE: &str = "----------------------";

/// Error type for report export
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome of one complete voting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub worker_count: usize,
    pub model_count: usize,
    pub role_count: usize,
    pub statement_count: usize,
    pub task_count: usize,
    /// Tasks that contributed nothing to any tally
    pub failed_tasks: usize,
    pub report: AggregateReport,
}

impl RunSummary {
    pub fn overall(&self) -> Tally {
        self.report.overall()
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed_secs / 60.0
    }

    /// Every per-statement block followed by the overall block
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (prompt_id, result) in self.report.iter() {
            out.push_str(&format_statement_block(prompt_id, result));
        }
        out.push_str(&format_overall_block(&self.overall()));
        out.push_str(&format!(
            "Elapsed Time = {:.1} min.\n",
            self.elapsed_minutes()
        ));
        out
    }
}

/// Console block for one statement
pub fn format_statement_block(prompt_id: PromptId, result: &StatementResult) -> String {
    format!(
        "{RULE}\n\
         Prompt ID: {prompt_id}\n\
         Total Agreements: {}\n\
         Total Decisions (# of queries made): {}\n\
         Agreement Percentage: {:.2}%\n\
         {RULE}\n",
        result.agree, result.decision, result.percentage
    )
}

/// Console block summing every statement
pub fn format_overall_block(tally: &Tally) -> String {
    format!(
        "{RULE}\n\
         Overall\n\
         Total Agreements: {}\n\
         Total Decisions (# of queries made): {}\n\
         Agreement Percentage: {:.2}%\n\
         {RULE}\n",
        tally.agree,
        tally.decision,
        tally.percentage()
    )
}

/// Write the summary as pretty JSON, creating parent directories
pub fn write_report(path: &Path, summary: &RunSummary) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(summary)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), run_id = %summary.run_id, "Report written");
    Ok(())
}
