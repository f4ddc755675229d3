//! Solver configuration.
use std::time::Duration;

use crate::decision::Strategy;

/// Configurable parameters used during solving.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Decision heuristic used to pick branching variables.
    ///
    /// [default: `Strategy::JeroslowWang`]
    pub strategy: Strategy,

    /// Whether unit propagation runs in the search loop.
    ///
    /// [default: true]
    pub unit_propagation: bool,

    /// Whether pure literal elimination runs in the search loop.
    ///
    /// [default: true]
    pub pure_literal_elimination: bool,

    /// Whether propagation and elimination run to fixed point before the search starts.
    ///
    /// [default: true]
    pub preprocessing: bool,

    /// Whether the search restarts from decision level 0 after enough conflicts.
    ///
    /// [default: false]
    pub restarts: bool,

    /// Number of conflicts between restarts.
    ///
    /// [default: 1000]
    pub restart_threshold: u64,

    /// Wall clock limit for a solve. `None` means unlimited.
    ///
    /// [default: None]
    pub timeout: Option<Duration>,

    /// Maximum number of decisions for a solve. `None` means unlimited.
    ///
    /// [default: None]
    pub decision_budget: Option<u64>,

    /// Seed for the random decision strategy.
    ///
    /// `None` seeds from wall time, a fixed value makes runs reproducible.
    ///
    /// [default: None]
    pub rng_seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            strategy: Strategy::default(),
            unit_propagation: true,
            pure_literal_elimination: true,
            preprocessing: true,
            restarts: false,
            restart_threshold: 1000,
            timeout: None,
            decision_budget: None,
            rng_seed: None,
        }
    }
}
