//! Solve statistics.
use std::time::Duration;

/// Counters accumulated during a solve.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SolverStats {
    /// Branching choices made.
    pub decisions: u64,
    /// Assignments forced by unit propagation.
    pub propagations: u64,
    /// Assignments forced by pure literal elimination.
    pub eliminations: u64,
    /// Conflicts encountered.
    pub conflicts: u64,
    /// Restarts performed.
    pub restarts: u64,
    /// Deepest decision level reached.
    pub max_decision_level: usize,
    /// Wall clock time of the solve.
    pub solve_time: Duration,
}
