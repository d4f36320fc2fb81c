//! Statements under vote and the newline-delimited input file they come from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Stable identity of a statement: its 0-based position in the input.
pub type PromptId = usize;

/// Error type for statement loading
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to read statements from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A statement submitted to every model and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub prompt_id: PromptId,
    pub text: String,
}

impl Statement {
    pub fn new(prompt_id: PromptId, text: impl Into<String>) -> Self {
        Self {
            prompt_id,
            text: text.into(),
        }
    }
}

/// Split input text into statements, one per non-blank line.
///
/// Lines are trimmed before use. Identities are assigned after blank lines
/// are dropped, so ids are always dense.
pub fn parse_statements(content: &str) -> Vec<Statement> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(prompt_id, text)| Statement::new(prompt_id, text))
        .collect()
}

/// Read and parse a statements file.
pub fn load_statements(path: &Path) -> Result<Vec<Statement>, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let statements = parse_statements(&content);
    info!(path = %path.display(), count = statements.len(), "Loaded statements");
    Ok(statements)
}
