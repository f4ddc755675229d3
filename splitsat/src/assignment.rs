//! The assignment vector and the trail.
//!
//! The two structures in this module are logically one: every entry on the trail corresponds to
//! exactly one assigned slot in the assignment vector. To keep them from drifting apart, all
//! mutation goes through [`Trail::push`], [`Trail::pop`] and [`Trail::backtrack_to`], which
//! update both sides together.
use splitsat_formula::{Lit, Var};

/// Current partial assignment.
///
/// One slot per variable, `None` meaning unassigned.
#[derive(Default)]
pub struct Assignment {
    values: Vec<Option<bool>>,
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        if count > self.values.len() {
            self.values.resize(count, None);
        }
    }

    /// Number of variable slots.
    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// Value of a variable, `None` if unassigned.
    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.values[var.index()]
    }

    /// Whether a variable has a value.
    pub fn var_is_assigned(&self, var: Var) -> bool {
        self.values[var.index()].is_some()
    }

    /// Value of a literal under the current assignment, `None` if its variable is unassigned.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.values[lit.index()].map(|value| value ^ lit.is_negative())
    }

    /// Whether the literal evaluates to true.
    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.values[lit.index()] == Some(lit.is_positive())
    }

    /// Whether the literal evaluates to false.
    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.values[lit.index()] == Some(lit.is_negative())
    }

    /// Number of assigned variables.
    pub fn assigned_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_some()).count()
    }

    /// Forget all values, e.g. when a fresh solve starts.
    ///
    /// The caller must discard the matching trail at the same time.
    pub(crate) fn reset(&mut self) {
        for value in self.values.iter_mut() {
            *value = None;
        }
    }

    fn assign_lit(&mut self, lit: Lit) {
        self.values[lit.index()] = Some(lit.is_positive());
    }

    fn clear_var(&mut self, var: Var) {
        self.values[var.index()] = None;
    }
}

/// Why a variable was assigned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Reason {
    /// A branching choice with its other polarity still untried.
    Decision,
    /// A branching choice that was already flipped after a conflict.
    ///
    /// Still counts as a decision for the level bookkeeping, but backtracking must not flip it a
    /// second time; both polarities of an exhausted branch have been refuted.
    FlippedDecision,
    /// Forced by a unit clause.
    UnitClause,
    /// Forced by pure literal elimination.
    PureLiteral,
}

impl Reason {
    /// Whether this entry was a branching choice, flipped or not.
    pub fn is_decision(self) -> bool {
        match self {
            Reason::Decision | Reason::FlippedDecision => true,
            Reason::UnitClause | Reason::PureLiteral => false,
        }
    }
}

/// One assignment on the trail.
#[derive(Copy, Clone, Debug)]
pub struct TrailEntry {
    /// The literal assigned true.
    pub lit: Lit,
    /// Decision level the assignment belongs to.
    pub level: usize,
    /// Origin of the assignment.
    pub reason: Reason,
}

/// Decision and propagation history.
///
/// Entries appear in the order they were applied. Their levels are non-decreasing and the
/// current decision level equals the number of decision entries on the trail.
#[derive(Default)]
pub struct Trail {
    entries: Vec<TrailEntry>,
    decision_level: usize,
}

impl Trail {
    /// Create an empty trail at decision level 0.
    pub fn new() -> Trail {
        Trail::default()
    }

    /// Assigned literals in assignment order.
    pub fn entries(&self) -> &[TrailEntry] {
        &self.entries
    }

    /// Number of entries on the trail.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The current decision level.
    pub fn decision_level(&self) -> usize {
        self.decision_level
    }

    /// Assign a literal and record it on the trail.
    ///
    /// A decision opens a new decision level and the entry is recorded at the new level;
    /// propagated assignments belong to the current level. The literal's variable must be
    /// unassigned.
    pub fn push(&mut self, assignment: &mut Assignment, lit: Lit, reason: Reason) {
        debug_assert!(assignment.lit_value(lit).is_none());

        if reason.is_decision() {
            self.decision_level += 1;
        }

        assignment.assign_lit(lit);
        self.entries.push(TrailEntry {
            lit,
            level: self.decision_level,
            reason,
        });
    }

    /// Undo the most recent assignment and return its entry.
    ///
    /// Clears the corresponding slot of the assignment vector. Popping a decision closes its
    /// decision level.
    pub fn pop(&mut self, assignment: &mut Assignment) -> Option<TrailEntry> {
        let entry = self.entries.pop()?;

        assignment.clear_var(entry.lit.var());
        if entry.reason.is_decision() {
            self.decision_level -= 1;
        }

        Some(entry)
    }

    /// Undo all assignments above the given decision level.
    ///
    /// Afterwards the trail ends with an entry of level at most `level` and the current decision
    /// level is `level`.
    pub fn backtrack_to(&mut self, assignment: &mut Assignment, level: usize) {
        while let Some(entry) = self.entries.last() {
            if entry.level <= level {
                break;
            }
            self.pop(assignment);
        }
        self.decision_level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use splitsat_formula::lit;

    fn setup(var_count: usize) -> (Assignment, Trail) {
        let mut assignment = Assignment::default();
        assignment.set_var_count(var_count);
        (assignment, Trail::new())
    }

    #[test]
    fn push_tracks_decision_levels() {
        let (mut assignment, mut trail) = setup(5);

        trail.push(&mut assignment, lit!(1), Reason::UnitClause);
        assert_eq!(trail.decision_level(), 0);
        assert_eq!(trail.entries()[0].level, 0);

        trail.push(&mut assignment, lit!(2), Reason::Decision);
        trail.push(&mut assignment, lit!(-3), Reason::UnitClause);
        assert_eq!(trail.decision_level(), 1);
        assert_eq!(trail.entries()[1].level, 1);
        assert_eq!(trail.entries()[2].level, 1);

        trail.push(&mut assignment, lit!(4), Reason::Decision);
        assert_eq!(trail.decision_level(), 2);

        assert!(assignment.lit_is_true(lit!(1)));
        assert!(assignment.lit_is_true(lit!(-3)));
        assert!(assignment.lit_is_false(lit!(3)));
    }

    #[test]
    fn pop_restores_assignment_and_level() {
        let (mut assignment, mut trail) = setup(3);

        trail.push(&mut assignment, lit!(1), Reason::Decision);
        trail.push(&mut assignment, lit!(2), Reason::PureLiteral);

        let entry = trail.pop(&mut assignment).unwrap();
        assert_eq!(entry.lit, lit!(2));
        assert_eq!(entry.reason, Reason::PureLiteral);
        assert!(!assignment.var_is_assigned(entry.lit.var()));
        assert_eq!(trail.decision_level(), 1);

        let entry = trail.pop(&mut assignment).unwrap();
        assert!(entry.reason.is_decision());
        assert_eq!(trail.decision_level(), 0);

        assert!(trail.pop(&mut assignment).is_none());
    }

    #[test]
    fn backtrack_to_level() {
        let (mut assignment, mut trail) = setup(6);

        trail.push(&mut assignment, lit!(1), Reason::UnitClause);
        trail.push(&mut assignment, lit!(2), Reason::Decision);
        trail.push(&mut assignment, lit!(3), Reason::UnitClause);
        trail.push(&mut assignment, lit!(4), Reason::Decision);
        trail.push(&mut assignment, lit!(5), Reason::UnitClause);

        trail.backtrack_to(&mut assignment, 1);

        assert_eq!(trail.decision_level(), 1);
        assert_eq!(trail.len(), 3);
        assert!(assignment.var_is_assigned(lit!(1).var()));
        assert!(assignment.var_is_assigned(lit!(2).var()));
        assert!(assignment.var_is_assigned(lit!(3).var()));
        assert!(!assignment.var_is_assigned(lit!(4).var()));
        assert!(!assignment.var_is_assigned(lit!(5).var()));

        trail.backtrack_to(&mut assignment, 0);
        assert_eq!(trail.decision_level(), 0);
        assert_eq!(trail.len(), 1);
        assert!(assignment.var_is_assigned(lit!(1).var()));
    }

    #[test]
    fn one_entry_per_assigned_var() {
        let (mut assignment, mut trail) = setup(4);

        trail.push(&mut assignment, lit!(2), Reason::Decision);
        trail.push(&mut assignment, lit!(-4), Reason::UnitClause);

        for index in 0..assignment.var_count() {
            let var = Var::from_index(index);
            let on_trail = trail
                .entries()
                .iter()
                .filter(|entry| entry.lit.var() == var)
                .count();
            assert_eq!(assignment.var_is_assigned(var), on_trail == 1);
            assert!(on_trail <= 1);
        }
    }
}
