use std::collections::HashMap;

use prettytable::{Cell, Row, Table};

use crate::solver::engine::VarIndex;

/// Holds performance statistics for a single search level.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerVariableStats {
    /// The number of times this variable's domain was computed.
    pub domains_computed: u64,
    /// The total number of candidates that survived into frozen domains.
    pub candidates: u64,
    /// The number of candidates removed by the inequality filter.
    pub inequality_prunings: u64,
    /// The total time spent computing this variable's domains, in microseconds.
    pub time_spent_micros: u64,
}

/// Holds statistics for the entire enumeration.
#[derive(Debug, Default)]
pub struct SearchStats {
    /// The total number of assignments tried (nodes visited in the search tree).
    pub nodes_visited: u64,
    /// The total number of times the search retreated to an earlier variable.
    pub backtracks: u64,
    /// The number of complete assignments produced so far.
    pub solutions: u64,
    /// A map from variable index to the statistics for that search level.
    pub variable_stats: HashMap<VarIndex, PerVariableStats>,
}

pub fn render_stats_table(stats: &SearchStats) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Variable"),
        Cell::new("Domains Computed"),
        Cell::new("Candidates"),
        Cell::new("Inequality Prunings"),
        Cell::new("Time / Call (µs)"),
        Cell::new("Total Time (ms)"),
    ]));

    let mut sorted_stats: Vec<(&VarIndex, &PerVariableStats)> =
        stats.variable_stats.iter().collect();
    sorted_stats.sort_by_key(|(var, _)| **var);

    for (var, variable_stats) in sorted_stats {
        let avg_time = if variable_stats.domains_computed > 0 {
            variable_stats.time_spent_micros as f64 / variable_stats.domains_computed as f64
        } else {
            0.0
        };

        table.add_row(Row::new(vec![
            Cell::new(&format!("?{var}")),
            Cell::new(&variable_stats.domains_computed.to_string()),
            Cell::new(&variable_stats.candidates.to_string()),
            Cell::new(&variable_stats.inequality_prunings.to_string()),
            Cell::new(&format!("{avg_time:.2}")),
            Cell::new(&format!(
                "{:.2}",
                variable_stats.time_spent_micros as f64 / 1000.0
            )),
        ]));
    }

    table.to_string()
}
