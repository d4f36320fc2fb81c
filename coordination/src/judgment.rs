//! Judgment Parser - turns a model's free-text answer into a TRUE/FALSE vote

use serde::{Deserialize, Serialize};

/// Marker whose presence anywhere in a response counts as agreement
const TRUE_MARKER: &str = "TRUE";

/// A model's vote on a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    True,
    False,
}

impl Decision {
    pub fn is_true(&self) -> bool {
        matches!(self, Decision::True)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::True => write!(f, "TRUE"),
            Decision::False => write!(f, "FALSE"),
        }
    }
}

/// Parsed outcome of one successful query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub decision: Decision,
    /// Full response text as returned by the backend
    pub raw: String,
}

/// Classify a response.
///
/// TRUE iff the literal, case-sensitive substring `TRUE` appears anywhere.
/// A response mentioning both `TRUE` and `FALSE` is TRUE regardless of
/// position.
pub fn parse_decision(response: &str) -> Decision {
    if response.contains(TRUE_MARKER) {
        Decision::True
    } else {
        Decision::False
    }
}

/// Classify a response and keep its text
pub fn parse_judgment(response: impl Into<String>) -> Judgment {
    let raw = response.into();
    Judgment {
        decision: parse_decision(&raw),
        raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_prefix() {
        assert_eq!(parse_decision("statement is TRUE."), Decision::True);
        assert_eq!(parse_decision("TRUE. The reason for my decision is..."), Decision::True);
    }

    #[test]
    fn test_false_prefix() {
        assert_eq!(parse_decision("FALSE, because..."), Decision::False);
    }

    #[test]
    fn test_empty_is_false() {
        assert_eq!(parse_decision(""), Decision::False);
    }

    #[test]
    fn test_true_anywhere_wins_over_false() {
        assert_eq!(parse_decision("it's not TRUE but also FALSE"), Decision::True);
        assert_eq!(parse_decision("FALSE. Some claim it is TRUE."), Decision::True);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert_eq!(parse_decision("true, obviously"), Decision::False);
        assert_eq!(parse_decision("True."), Decision::False);
    }

    #[test]
    fn test_judgment_keeps_raw_text() {
        let judgment = parse_judgment("TRUE. Water is wet.");
        assert!(judgment.decision.is_true());
        assert_eq!(judgment.raw, "TRUE. Water is wet.");
        assert_eq!(judgment.decision.to_string(), "TRUE");
    }

    #[test]
    fn test_decision_serialization() {
        assert_eq!(serde_json::to_string(&Decision::True).unwrap(), r#""TRUE""#);
        assert_eq!(serde_json::to_string(&Decision::False).unwrap(), r#""FALSE""#);
    }
}
