//! Boolean satisfiability solver using the DPLL procedure.
//!
//! splitsat decides whether a formula in conjunctive normal form has a satisfying assignment,
//! and produces one when it does. The search interleaves unit propagation, pure literal
//! elimination and chronological backtracking over an assignment trail; branching variables are
//! picked by one of several configurable heuristics.
//!
//! The solver intentionally stays with the classic DPLL procedure: there is no clause learning,
//! no watched literal scheme and no non-chronological backjumping.

pub mod assignment;
pub mod clause;
pub mod config;
pub mod decision;
pub mod formula;
pub mod prop;
pub mod search;
pub mod solver;
pub mod stats;

pub use splitsat_dimacs as dimacs;
pub use splitsat_formula::{CnfFormula, Lit, Var};

pub use config::SolverConfig;
pub use decision::Strategy;
pub use solver::{Solver, SolverError, SolverResult};
pub use stats::SolverStats;
