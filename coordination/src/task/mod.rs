//! Query tasks - the atomic unit of work in a voting run
//!
//! Every statement is expanded into one task per (model, role) pair across
//! two tiers:
//!
//! 1. **Layer 2 (generic)**: each model judges the statement with no persona
//! 2. **Layer 3 (expert)**: each model judges it once per configured role
//!
//! Tasks are generated once, fully materialised, and never mutated: the
//! rendered prompt is fixed at construction time.

pub mod generator;
pub mod types;

pub use generator::{generate_tasks, PromptTemplate, TaskGenerator};
pub use types::{Layer, QueryKind, Task, DEFAULT_ROLE};
