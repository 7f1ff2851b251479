//! The backtracking enumerator over the fact store.

mod domain;
pub mod engine;
pub mod stats;

pub use engine::{Constraint, Solver, Term, VarIndex};
pub use stats::{render_stats_table, PerVariableStats, SearchStats};
