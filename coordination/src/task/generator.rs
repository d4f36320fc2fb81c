//! Task Generator - expands statements × models × roles into query tasks
//!
//! Output order is statement, then model, then layer (generic before
//! expert), then role. Distribution depends on this order being stable.

use tracing::debug;

use crate::statement::Statement;
use crate::task::types::{QueryKind, Task};

/// Default cap on response length requested from the model, in bytes
pub const DEFAULT_RESPONSE_LIMIT_BYTES: usize = 3000;

/// Renders the instruction text wrapped around a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Response size the model is asked to stay under
    pub response_limit_bytes: usize,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            response_limit_bytes: DEFAULT_RESPONSE_LIMIT_BYTES,
        }
    }
}

impl PromptTemplate {
    /// Prompt shared by both layers
    pub fn base(&self, statement: &str) -> String {
        format!(
            "Is this statement true? '{statement}' \
             Please generate your response in the following format: \
             First answer either TRUE or FALSE, followed by a period. \
             Then, state the reason for my decision is [your reason]' \
             Please limit your response to a maximum of {limit} bytes. \
             Ensure your response fits within this limit.",
            limit = self.response_limit_bytes,
        )
    }

    /// Full prompt for the given query kind
    pub fn render(&self, statement: &str, kind: &QueryKind) -> String {
        match kind {
            QueryKind::Generic => self.base(statement),
            QueryKind::Role { role } => {
                format!("{} Respond as an expert {role}.", self.base(statement))
            }
        }
    }
}

/// Builds the full task list for a run
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    models: Vec<String>,
    roles: Vec<String>,
    template: PromptTemplate,
}

impl TaskGenerator {
    pub fn new(models: Vec<String>, roles: Vec<String>) -> Self {
        Self {
            models,
            roles,
            template: PromptTemplate::default(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Number of tasks `generate` will produce for `statement_count` statements
    pub fn task_count(&self, statement_count: usize) -> usize {
        statement_count * self.models.len() * (1 + self.roles.len())
    }

    /// Generate every task for the given statements
    pub fn generate(&self, statements: &[Statement]) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(self.task_count(statements.len()));

        for statement in statements {
            for model in &self.models {
                tasks.push(self.build(statement, model, QueryKind::Generic));

                for role in &self.roles {
                    let kind = QueryKind::Role { role: role.clone() };
                    tasks.push(self.build(statement, model, kind));
                }
            }
        }

        debug!(
            statements = statements.len(),
            models = self.models.len(),
            roles = self.roles.len(),
            tasks = tasks.len(),
            "Generated tasks"
        );

        tasks
    }

    fn build(&self, statement: &Statement, model: &str, kind: QueryKind) -> Task {
        let rendered = self.template.render(&statement.text, &kind);
        Task::new(statement.prompt_id, model, rendered, kind)
    }
}

/// Generate tasks with the default prompt template
pub fn generate_tasks(statements: &[Statement], models: &[String], roles: &[String]) -> Vec<Task> {
    TaskGenerator::new(models.to_vec(), roles.to_vec()).generate(statements)
}
