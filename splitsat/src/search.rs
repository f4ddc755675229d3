//! The DPLL search loop.
use std::time::Instant;

use log::debug;
use rand::rngs::StdRng;

use splitsat_formula::Var;

use crate::assignment::{Reason, Trail};
use crate::config::SolverConfig;
use crate::decision::choose_decision_var;
use crate::formula::Formula;
use crate::prop::{eliminate_pure_lits, propagate_units};
use crate::solver::{SolverError, SolverResult};
use crate::stats::SolverStats;

/// State of one run of the DPLL procedure.
///
/// Owns the trail for the duration of the search and keeps it consistent with the formula's
/// assignment vector: between loop iterations every assigned variable has exactly one trail
/// entry.
pub struct Search<'a> {
    formula: &'a mut Formula,
    config: &'a SolverConfig,
    stats: &'a mut SolverStats,
    rng: &'a mut StdRng,
    trail: Trail,
    started: Instant,
    conflicts_since_restart: u64,
}

impl<'a> Search<'a> {
    pub(crate) fn new(
        formula: &'a mut Formula,
        config: &'a SolverConfig,
        stats: &'a mut SolverStats,
        rng: &'a mut StdRng,
    ) -> Search<'a> {
        Search {
            formula,
            config,
            stats,
            rng,
            trail: Trail::new(),
            started: Instant::now(),
            conflicts_since_restart: 0,
        }
    }

    /// Run the search until it terminates.
    pub(crate) fn run(&mut self) -> Result<SolverResult, SolverError> {
        if self.config.preprocessing {
            if !self.preprocess() {
                debug!("conflict during preprocessing");
                return Ok(SolverResult::Unsatisfiable);
            }
            self.check_consistency()?;
            if self.formula.is_satisfied() {
                return Ok(SolverResult::Satisfiable);
            }
        }

        loop {
            if self.budget_exhausted() {
                return Ok(SolverResult::Unknown);
            }

            let mut progress = false;

            if self.formula.is_satisfied() {
                self.check_consistency()?;
                return Ok(SolverResult::Satisfiable);
            }

            if self.formula.has_conflict() {
                self.note_conflict();
                if !self.backtrack() {
                    return Ok(SolverResult::Unsatisfiable);
                }
                continue;
            }

            if self.config.unit_propagation {
                match propagate_units(self.formula, &mut self.trail) {
                    Ok(count) => {
                        self.stats.propagations += count as u64;
                        progress |= count > 0;
                    }
                    Err(_) => {
                        self.note_conflict();
                        if !self.backtrack() {
                            return Ok(SolverResult::Unsatisfiable);
                        }
                        continue;
                    }
                }

                // Propagated assignments can have falsified a clause; undo before deciding on
                // top of a dead branch.
                if self.formula.has_conflict() {
                    self.note_conflict();
                    if !self.backtrack() {
                        return Ok(SolverResult::Unsatisfiable);
                    }
                    continue;
                }
            }

            if self.config.pure_literal_elimination {
                let count = eliminate_pure_lits(self.formula, &mut self.trail);
                self.stats.eliminations += count as u64;
                if count > 0 {
                    // Re-test satisfaction and conflicts before deciding.
                    continue;
                }
            }

            match choose_decision_var(self.formula, self.config.strategy, self.rng) {
                None => {
                    // The assignment is total, so the satisfaction test settles the result.
                    return Ok(if self.formula.is_satisfied() {
                        SolverResult::Satisfiable
                    } else {
                        SolverResult::Unsatisfiable
                    });
                }
                Some(var) => {
                    self.decide(var);
                    progress = true;
                }
            }

            if self.config.restarts && self.conflicts_since_restart >= self.config.restart_threshold
            {
                self.restart();
            }

            if !progress {
                debug!("no progress in a full iteration, giving up");
                return Ok(SolverResult::Unknown);
            }
        }
    }

    /// Run propagation and elimination to fixed point at decision level 0.
    ///
    /// Returns `false` when a conflict was found, which makes the formula unsatisfiable since
    /// nothing is assigned above level 0.
    fn preprocess(&mut self) -> bool {
        loop {
            let mut changed = false;

            if self.config.unit_propagation {
                match propagate_units(self.formula, &mut self.trail) {
                    Ok(count) => {
                        self.stats.propagations += count as u64;
                        changed |= count > 0;
                    }
                    Err(_) => return false,
                }
            }

            if self.config.pure_literal_elimination {
                let count = eliminate_pure_lits(self.formula, &mut self.trail);
                self.stats.eliminations += count as u64;
                changed |= count > 0;
            }

            if self.formula.has_conflict() {
                return false;
            }

            if !changed {
                return true;
            }
        }
    }

    /// Whether the configured deadline or decision budget is exhausted.
    fn budget_exhausted(&self) -> bool {
        if let Some(timeout) = self.config.timeout {
            if self.started.elapsed() >= timeout {
                debug!("wall clock deadline reached");
                return true;
            }
        }

        if let Some(budget) = self.config.decision_budget {
            if self.stats.decisions >= budget {
                debug!("decision budget exhausted");
                return true;
            }
        }

        false
    }

    /// Branch on the given variable, trying `true` first.
    fn decide(&mut self, var: Var) {
        let lit = var.positive();
        self.trail
            .push(self.formula.assignment_mut(), lit, Reason::Decision);
        self.stats.decisions += 1;
        self.stats.max_decision_level = self
            .stats
            .max_decision_level
            .max(self.trail.decision_level());
        debug!("deciding {} at level {}", lit, self.trail.decision_level());
    }

    fn note_conflict(&mut self) {
        self.stats.conflicts += 1;
        self.conflicts_since_restart += 1;
    }

    /// Undo everything above and including the most recent untried decision, then flip it.
    ///
    /// The flipped assignment is pushed as a decision again, so later conflicts continue to
    /// backtrack through it, but it is marked as flipped: once both polarities of a branch have
    /// led to a conflict the whole branch is refuted, and the search moves on to the decision
    /// below it. Returns `false` when no untried decision is left, which makes the conflict
    /// final.
    fn backtrack(&mut self) -> bool {
        if !self
            .trail
            .entries()
            .iter()
            .any(|entry| entry.reason == Reason::Decision)
        {
            debug!("conflict with every open branch exhausted");
            return false;
        }

        while let Some(entry) = self.trail.pop(self.formula.assignment_mut()) {
            if entry.reason == Reason::Decision {
                let flipped = !entry.lit;
                debug!(
                    "backtracking to level {}, flipping {} to {}",
                    self.trail.decision_level(),
                    entry.lit,
                    flipped
                );
                self.trail.push(
                    self.formula.assignment_mut(),
                    flipped,
                    Reason::FlippedDecision,
                );
                return true;
            }
        }

        false
    }

    /// Forget everything above decision level 0.
    fn restart(&mut self) {
        debug!(
            "restarting after {} conflicts since the last restart",
            self.conflicts_since_restart
        );
        self.trail.backtrack_to(self.formula.assignment_mut(), 0);
        self.conflicts_since_restart = 0;
        self.stats.restarts += 1;
    }

    /// Verify that the trail and the assignment vector describe the same state.
    fn check_consistency(&self) -> Result<(), SolverError> {
        let violation = |message: String| Err(SolverError::InvariantViolation(message));

        let assignment = self.formula.assignment();
        let mut on_trail = vec![false; self.formula.var_count()];
        let mut decisions = 0;
        let mut last_level = 0;

        for entry in self.trail.entries() {
            if entry.level < last_level {
                return violation(format!(
                    "decision levels decrease along the trail at {}",
                    entry.lit
                ));
            }
            last_level = entry.level;

            if entry.reason.is_decision() {
                decisions += 1;
            }

            if on_trail[entry.lit.index()] {
                return violation(format!("variable {} is on the trail twice", entry.lit.var()));
            }
            on_trail[entry.lit.index()] = true;

            if !assignment.lit_is_true(entry.lit) {
                return violation(format!(
                    "trail entry {} does not match the assignment",
                    entry.lit
                ));
            }
        }

        if decisions != self.trail.decision_level() {
            return violation(format!(
                "{} decisions on the trail but current level is {}",
                decisions,
                self.trail.decision_level()
            ));
        }

        for index in 0..self.formula.var_count() {
            let var = Var::from_index(index);
            if assignment.var_is_assigned(var) && !on_trail[index] {
                return violation(format!("variable {} is assigned but not on the trail", var));
            }
        }

        Ok(())
    }
}
