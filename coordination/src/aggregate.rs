//! Result Aggregator - merges per-worker tallies into the final report
//!
//! Each worker returns its own [`TallyMap`]. Once every worker has finished,
//! [`merge_tallies`] sums them in a single pass. Addition per key is
//! commutative and associative, so the worker completion order never
//! affects the result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::judgment::Decision;
use crate::statement::PromptId;

/// Agree/decision counters for one statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Successful judgments that were TRUE
    pub agree: u64,
    /// Successful judgments
    pub decision: u64,
}

impl Tally {
    pub fn new(agree: u64, decision: u64) -> Self {
        Self { agree, decision }
    }

    /// Count one successful judgment
    pub fn record(&mut self, decision: Decision) {
        self.decision += 1;
        if decision.is_true() {
            self.agree += 1;
        }
    }

    pub fn merge(&mut self, other: &Tally) {
        self.agree += other.agree;
        self.decision += other.decision;
    }

    /// `agree / decision`, or 0 when nothing was decided
    pub fn agreement_ratio(&self) -> f64 {
        if self.decision == 0 {
            0.0
        } else {
            self.agree as f64 / self.decision as f64
        }
    }

    /// Agreement as a percentage in `[0, 100]`
    pub fn percentage(&self) -> f64 {
        self.agreement_ratio() * 100.0
    }
}

/// Per-statement tallies accumulated by one worker
pub type TallyMap = BTreeMap<PromptId, Tally>;

/// Final numbers for one statement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    pub agree: u64,
    pub decision: u64,
    pub percentage: f64,
}

impl From<Tally> for StatementResult {
    fn from(tally: Tally) -> Self {
        Self {
            agree: tally.agree,
            decision: tally.decision,
            percentage: tally.percentage(),
        }
    }
}

impl StatementResult {
    pub fn tally(&self) -> Tally {
        Tally::new(self.agree, self.decision)
    }
}

/// Merged results for a whole run, ordered by prompt id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateReport {
    results: BTreeMap<PromptId, StatementResult>,
}

impl AggregateReport {
    pub fn from_tallies(tallies: TallyMap) -> Self {
        Self {
            results: tallies
                .into_iter()
                .map(|(prompt_id, tally)| (prompt_id, tally.into()))
                .collect(),
        }
    }

    pub fn get(&self, prompt_id: PromptId) -> Option<&StatementResult> {
        self.results.get(&prompt_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PromptId, &StatementResult)> {
        self.results.iter().map(|(id, result)| (*id, result))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Sum over every statement
    pub fn overall(&self) -> Tally {
        self.results.values().fold(Tally::default(), |mut acc, r| {
            acc.merge(&r.tally());
            acc
        })
    }
}

/// Sum tallies key by key. A statement absent from a map contributes zero.
pub fn merge_tallies<I>(maps: I) -> TallyMap
where
    I: IntoIterator<Item = TallyMap>,
{
    let mut merged = TallyMap::new();
    for map in maps {
        for (prompt_id, tally) in map {
            merged.entry(prompt_id).or_default().merge(&tally);
        }
    }
    merged
}
