//! Boolean satisfiability solver.
use std::io;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::Error;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use splitsat_dimacs::DimacsParser;
use splitsat_formula::{CnfFormula, Lit, Var};

use crate::clause::Clause;
use crate::config::SolverConfig;
use crate::formula::Formula;
use crate::search::Search;
use crate::stats::SolverStats;

/// Outcome of a solve.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SolverResult {
    /// A satisfying assignment was found.
    Satisfiable,
    /// No satisfying assignment exists.
    Unsatisfiable,
    /// The search gave up, e.g. because a deadline or decision budget was exhausted.
    Unknown,
}

/// Fatal solver errors.
///
/// A conflict during the search is not an error; this covers genuine bugs surfaced by the
/// internal consistency checks.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// A DPLL based boolean satisfiability solver.
pub struct Solver {
    formula: Formula,
    config: SolverConfig,
    stats: SolverStats,
    rng: StdRng,
    result: Option<SolverResult>,
}

impl Default for Solver {
    fn default() -> Solver {
        Solver::new()
    }
}

impl Solver {
    /// Create a new solver with the default configuration.
    pub fn new() -> Solver {
        Solver::with_config(SolverConfig::default())
    }

    /// Create a new solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Solver {
        let seed = config.rng_seed.unwrap_or_else(seed_from_time);
        Solver {
            formula: Formula::default(),
            config,
            stats: SolverStats::default(),
            rng: StdRng::seed_from_u64(seed),
            result: None,
        }
    }

    /// Add a formula to the solver.
    ///
    /// Duplicate literals within a clause are collapsed and tautological clauses are dropped, so
    /// neither ever reaches the search.
    pub fn add_formula(&mut self, formula: &CnfFormula) {
        self.formula.set_var_count(formula.var_count());
        self.result = None;

        for lits in formula.iter() {
            match Clause::from_lits(lits) {
                Some(clause) => self.formula.add_clause(clause),
                None => debug!("dropping tautological clause {:?}", lits),
            }
        }
    }

    /// Read and add a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), Error> {
        let formula = DimacsParser::parse(input)?;

        info!(
            "parsed formula with {} variables and {} clauses",
            formula.var_count(),
            formula.len()
        );

        self.add_formula(&formula);

        Ok(())
    }

    /// Check the satisfiability of the current formula.
    pub fn solve(&mut self) -> Result<SolverResult, SolverError> {
        self.stats = SolverStats::default();
        self.formula.reset_assignment();
        self.result = None;

        info!(
            "solving formula with {} clauses over {} variables ({} used)",
            self.formula.clauses().len(),
            self.formula.var_count(),
            self.formula.used_var_count()
        );

        let started = Instant::now();
        let result =
            Search::new(&mut self.formula, &self.config, &mut self.stats, &mut self.rng).run()?;
        self.stats.solve_time = started.elapsed();

        info!(
            "result {:?} after {} decisions, {} propagations and {} conflicts",
            result, self.stats.decisions, self.stats.propagations, self.stats.conflicts
        );

        self.result = Some(result);
        Ok(result)
    }

    /// Result of the most recent [`solve`](Solver::solve) call.
    pub fn result(&self) -> Option<SolverResult> {
        self.result
    }

    /// Set of literals that satisfy the formula.
    ///
    /// Contains one literal per assigned variable; variables the search never had to touch are
    /// absent. Returns `None` unless the last solve returned
    /// [`SolverResult::Satisfiable`].
    pub fn model(&self) -> Option<Vec<Lit>> {
        if self.result != Some(SolverResult::Satisfiable) {
            return None;
        }

        let assignment = self.formula.assignment();
        Some(
            (0..self.formula.var_count())
                .map(Var::from_index)
                .flat_map(|var| assignment.var_value(var).map(|value| var.lit(value)))
                .collect(),
        )
    }

    /// The declared number of variables.
    pub fn var_count(&self) -> usize {
        self.formula.var_count()
    }

    /// Statistics of the most recent solve.
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }
}

/// Wall time fallback seed when the configuration does not pin one.
fn seed_from_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}
