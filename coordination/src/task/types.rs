//! Task record and the two query tiers

use serde::{Deserialize, Serialize};

use crate::statement::PromptId;

/// Role reported for layer-2 tasks, which carry no persona.
pub const DEFAULT_ROLE: &str = "Generalist";

/// Protocol tier a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Layer 2: plain query, default role
    Generic,
    /// Layer 3: query framed by an expert persona
    Expert,
}

impl Layer {
    /// Tier number as used in logs and reports
    pub fn number(&self) -> u8 {
        match self {
            Layer::Generic => 2,
            Layer::Expert => 3,
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer-{}", self.number())
    }
}

/// How a statement is put to a model.
///
/// Chosen when the task is generated; nothing downstream branches on a raw
/// layer number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryKind {
    /// No persona framing
    Generic,
    /// Answer as an expert in `role`
    Role { role: String },
}

impl QueryKind {
    pub fn layer(&self) -> Layer {
        match self {
            QueryKind::Generic => Layer::Generic,
            QueryKind::Role { .. } => Layer::Expert,
        }
    }

    pub fn role(&self) -> &str {
        match self {
            QueryKind::Generic => DEFAULT_ROLE,
            QueryKind::Role { role } => role,
        }
    }
}

/// One (statement, model, role) query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    /// Statement this task votes on
    pub prompt_id: PromptId,
    /// Backend model to query
    pub model: String,
    /// Final prompt text sent to the backend
    pub rendered_prompt: String,
    /// Generic or role-framed query
    pub kind: QueryKind,
}

impl Task {
    pub fn new(
        prompt_id: PromptId,
        model: impl Into<String>,
        rendered_prompt: impl Into<String>,
        kind: QueryKind,
    ) -> Self {
        Self {
            prompt_id,
            model: model.into(),
            rendered_prompt: rendered_prompt.into(),
            kind,
        }
    }

    pub fn layer(&self) -> Layer {
        self.kind.layer()
    }

    pub fn role(&self) -> &str {
        self.kind.role()
    }

    /// Short label for logs, e.g. `#3 llama3/Engineer (layer-3)`
    pub fn label(&self) -> String {
        format!(
            "#{} {}/{} ({})",
            self.prompt_id,
            self.model,
            self.role(),
            self.layer()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_kind_uses_default_role() {
        let task = Task::new(0, "llama3", "prompt", QueryKind::Generic);
        assert_eq!(task.layer(), Layer::Generic);
        assert_eq!(task.layer().number(), 2);
        assert_eq!(task.role(), DEFAULT_ROLE);
    }

    #[test]
    fn test_role_kind_is_layer_three() {
        let task = Task::new(
            4,
            "phi",
            "prompt",
            QueryKind::Role {
                role: "Engineer".to_string(),
            },
        );
        assert_eq!(task.layer().number(), 3);
        assert_eq!(task.role(), "Engineer");
        assert_eq!(task.label(), "#4 phi/Engineer (layer-3)");
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&QueryKind::Role {
            role: "Mathematician".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"role","role":"Mathematician"}"#);

        let json = serde_json::to_string(&QueryKind::Generic).unwrap();
        assert_eq!(json, r#"{"kind":"generic"}"#);
    }
}
