//! Unit propagation and pure literal elimination.
use log::debug;

use splitsat_formula::{Lit, Var};

use crate::assignment::{Reason, Trail};
use crate::formula::Formula;

/// A conflicting forced assignment surfaced during propagation.
///
/// This is expected control flow handled by backtracking, not an error condition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Conflict {
    /// The literal a unit clause required to be true while it was already false.
    pub lit: Lit,
}

/// Propagate unit clauses until a pass performs no new assignment.
///
/// Every forced assignment is pushed at the current decision level. Returns the number of
/// assignments performed, or the conflict if a unit clause required the opposite of an existing
/// assignment. On conflict the trail is left as it was when the conflict surfaced; undoing it is
/// the caller's job.
pub fn propagate_units(formula: &mut Formula, trail: &mut Trail) -> Result<usize, Conflict> {
    let mut total = 0;

    loop {
        let mut progress = false;

        for index in 0..formula.clauses().len() {
            let lit = match formula.clauses()[index].unit_lit(formula.assignment()) {
                Some(lit) => lit,
                None => continue,
            };

            match formula.assignment().lit_value(lit) {
                None => {
                    trail.push(formula.assignment_mut(), lit, Reason::UnitClause);
                    debug!("propagating {}", lit);
                    total += 1;
                    progress = true;
                }
                Some(true) => {}
                Some(false) => {
                    debug!("conflicting propagation of {}", lit);
                    return Err(Conflict { lit });
                }
            }
        }

        if !progress {
            break;
        }
    }

    Ok(total)
}

/// Run one pure literal sweep.
///
/// A variable is pure when all its occurrences in the currently unsatisfied clauses have the
/// same polarity. Every pure variable is assigned that polarity at the current decision level.
/// Variables without any occurrence in an unsatisfied clause are left alone. Returns the number
/// of assignments performed; rerunning until this is 0 reaches the fixed point.
pub fn eliminate_pure_lits(formula: &mut Formula, trail: &mut Trail) -> usize {
    let mut eliminated = 0;

    for index in 0..formula.var_count() {
        let var = Var::from_index(index);
        if formula.assignment().var_is_assigned(var) {
            continue;
        }

        match pure_polarity(formula, var) {
            Some(positive) => {
                let lit = var.lit(positive);
                trail.push(formula.assignment_mut(), lit, Reason::PureLiteral);
                debug!("eliminating pure literal {}", lit);
                eliminated += 1;
            }
            None => {}
        }
    }

    eliminated
}

/// The single polarity of `var` across the unsatisfied clauses, if it has one.
fn pure_polarity(formula: &Formula, var: Var) -> Option<bool> {
    let mut positive = false;
    let mut negative = false;

    for clause in formula.clauses() {
        if clause.is_satisfied(formula.assignment()) {
            continue;
        }
        for &lit in clause.lits() {
            if lit.var() == var {
                if lit.is_positive() {
                    positive = true;
                } else {
                    negative = true;
                }
            }
        }
        if positive && negative {
            return None;
        }
    }

    match (positive, negative) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}
