//! Decision heuristics.
//!
//! All strategies consider only currently unassigned variables and return `None` once every
//! variable is assigned. Ties are broken towards the smallest variable index, which keeps the
//! deterministic strategies reproducible run over run.
use std::fmt;
use std::str::FromStr;

use rand::{rngs::StdRng, Rng};

use splitsat_formula::Var;

use crate::formula::Formula;

/// Strategy used to pick the next branching variable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// Smallest unassigned variable index.
    FirstUnassigned,
    /// Variable occurring most often in clauses that are not yet satisfied.
    MostFrequent,
    /// Jeroslow-Wang: prefer variables in many short unsatisfied clauses.
    JeroslowWang,
    /// Uniform random pick among the unassigned variables.
    Random,
}

impl Default for Strategy {
    fn default() -> Strategy {
        Strategy::JeroslowWang
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(name: &str) -> Result<Strategy, String> {
        match name {
            "first" => Ok(Strategy::FirstUnassigned),
            "frequent" => Ok(Strategy::MostFrequent),
            "jw" => Ok(Strategy::JeroslowWang),
            "random" => Ok(Strategy::Random),
            _ => Err(format!("unknown decision strategy '{}'", name)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Strategy::FirstUnassigned => "first",
            Strategy::MostFrequent => "frequent",
            Strategy::JeroslowWang => "jw",
            Strategy::Random => "random",
        };
        write!(f, "{}", name)
    }
}

/// Pick the next branching variable, `None` when every variable is assigned.
pub fn choose_decision_var(
    formula: &Formula,
    strategy: Strategy,
    rng: &mut StdRng,
) -> Option<Var> {
    match strategy {
        Strategy::FirstUnassigned => first_unassigned(formula),
        Strategy::MostFrequent => most_frequent(formula),
        Strategy::JeroslowWang => jeroslow_wang(formula),
        Strategy::Random => random(formula, rng),
    }
}

fn unassigned_vars<'a>(formula: &'a Formula) -> impl Iterator<Item = Var> + 'a {
    let assignment = formula.assignment();
    (0..formula.var_count())
        .map(Var::from_index)
        .filter(move |&var| !assignment.var_is_assigned(var))
}

fn first_unassigned(formula: &Formula) -> Option<Var> {
    unassigned_vars(formula).next()
}

/// Argmax over the unassigned variables; earlier indices win ties.
fn best_unassigned_var<S: PartialOrd>(formula: &Formula, scores: &[S]) -> Option<Var> {
    let mut best: Option<Var> = None;

    for var in unassigned_vars(formula) {
        match best {
            Some(so_far) if scores[var.index()] <= scores[so_far.index()] => {}
            _ => best = Some(var),
        }
    }

    best
}

fn most_frequent(formula: &Formula) -> Option<Var> {
    let mut occurrences = vec![0usize; formula.var_count()];

    for clause in formula.clauses() {
        if clause.is_satisfied(formula.assignment()) {
            continue;
        }
        for &lit in clause.lits() {
            occurrences[lit.index()] += 1;
        }
    }

    best_unassigned_var(formula, &occurrences)
}

fn jeroslow_wang(formula: &Formula) -> Option<Var> {
    let mut scores = vec![0.0f64; formula.var_count()];

    for clause in formula.clauses() {
        if clause.is_satisfied(formula.assignment()) {
            continue;
        }
        let weight = 2.0f64.powi(-(clause.len() as i32));
        for &lit in clause.lits() {
            scores[lit.index()] += weight;
        }
    }

    best_unassigned_var(formula, &scores)
}

fn random(formula: &Formula, rng: &mut StdRng) -> Option<Var> {
    let candidates: Vec<Var> = unassigned_vars(formula).collect();

    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0, candidates.len())])
}
