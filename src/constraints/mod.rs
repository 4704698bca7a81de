//! Scheduling constraints and the constraint registry.
//!
//! A constraint is a predicate over a candidate entry and the entries
//! placed so far. The solver consults the registered constraints during
//! propagation, forward checking, and candidate commitment; callers may
//! register their own implementations alongside the built-ins.
//!
//! # Failure Semantics
//! A constraint whose evaluation fails is treated as violated for that
//! candidate (fail-closed): a broken predicate must never let an
//! illegal placement through.

mod builtin;

pub use builtin::{BatchConflictConstraint, FacultyConflictConstraint, SlotAvailabilityConstraint};

use std::fmt::Debug;
use std::sync::Arc;

use log::warn;
use thiserror::Error;

use crate::models::{ConstraintViolation, ScheduleEntry, TimeSlot};

/// Error raised by a constraint predicate itself (not a violation).
#[derive(Debug, Clone, Error)]
#[error("constraint evaluation failed: {0}")]
pub struct ConstraintError(pub String);

/// A rule every placement must satisfy.
///
/// Implementations must be pure with respect to their inputs: the
/// solver probes candidates speculatively and relies on repeated calls
/// giving the same answer.
pub trait SchedulingConstraint: Send + Sync + Debug {
    /// Constraint name (e.g., "faculty-conflict").
    fn name(&self) -> &'static str;

    /// Whether the constraint participates in this run.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Evaluation order; higher-priority constraints are checked first.
    fn priority(&self) -> i32 {
        0
    }

    /// Checks a candidate entry against the entries placed so far.
    ///
    /// Returns `Ok(None)` when satisfied, `Ok(Some(violation))` when
    /// the placement would break the rule, and `Err` when the predicate
    /// itself failed to evaluate.
    fn check(
        &self,
        candidate: &ScheduleEntry,
        existing: &[ScheduleEntry],
    ) -> Result<Option<ConstraintViolation>, ConstraintError>;
}

/// A registry of constraints, iterated in priority order.
///
/// Cheap to clone; constraints are shared behind `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    constraints: Vec<Arc<dyn SchedulingConstraint>>,
}

impl ConstraintSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard set: faculty-conflict plus slot-availability
    /// over the given pool.
    pub fn standard(pool: Vec<TimeSlot>) -> Self {
        Self::new()
            .with_constraint(FacultyConflictConstraint)
            .with_constraint(SlotAvailabilityConstraint::new(pool))
    }

    /// Registers a constraint.
    pub fn register<C: SchedulingConstraint + 'static>(&mut self, constraint: C) {
        self.constraints.push(Arc::new(constraint));
        self.constraints.sort_by_key(|c| -c.priority());
    }

    /// Builder: registers a constraint and returns self.
    pub fn with_constraint<C: SchedulingConstraint + 'static>(mut self, constraint: C) -> Self {
        self.register(constraint);
        self
    }

    /// Enabled constraints in priority order.
    pub fn enabled(&self) -> impl Iterator<Item = &Arc<dyn SchedulingConstraint>> {
        self.constraints.iter().filter(|c| c.is_enabled())
    }

    /// Number of registered constraints (enabled or not).
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Whether a candidate satisfies every enabled constraint.
    ///
    /// Evaluation errors count as violations and are logged.
    pub fn satisfies(&self, candidate: &ScheduleEntry, existing: &[ScheduleEntry]) -> bool {
        self.first_violation(candidate, existing).is_none()
    }

    /// First violation a candidate produces, checking constraints in
    /// priority order.
    ///
    /// A failing predicate is converted into a violation naming the
    /// constraint, so the caller always sees the placement as illegal.
    pub fn first_violation(
        &self,
        candidate: &ScheduleEntry,
        existing: &[ScheduleEntry],
    ) -> Option<ConstraintViolation> {
        for constraint in self.enabled() {
            match constraint.check(candidate, existing) {
                Ok(None) => {}
                Ok(Some(violation)) => return Some(violation),
                Err(err) => {
                    warn!("constraint '{}' failed to evaluate: {err}", constraint.name());
                    return Some(ConstraintViolation::custom(
                        constraint.name(),
                        format!("evaluation failed, rejecting candidate: {err}"),
                        vec![candidate.clone()],
                        crate::models::Severity::Error,
                    ));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use chrono::{NaiveTime, Weekday};

    fn slot(day: Weekday, sh: u32, eh: u32) -> TimeSlot {
        TimeSlot::new(
            day,
            NaiveTime::from_hms_opt(sh, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(eh, 0, 0).unwrap(),
        )
    }

    #[derive(Debug)]
    struct AlwaysFails;

    impl SchedulingConstraint for AlwaysFails {
        fn name(&self) -> &'static str {
            "always-fails"
        }

        fn check(
            &self,
            _candidate: &ScheduleEntry,
            _existing: &[ScheduleEntry],
        ) -> Result<Option<ConstraintViolation>, ConstraintError> {
            Err(ConstraintError("boom".into()))
        }
    }

    #[derive(Debug)]
    struct Disabled;

    impl SchedulingConstraint for Disabled {
        fn name(&self) -> &'static str {
            "disabled"
        }

        fn is_enabled(&self) -> bool {
            false
        }

        fn check(
            &self,
            candidate: &ScheduleEntry,
            _existing: &[ScheduleEntry],
        ) -> Result<Option<ConstraintViolation>, ConstraintError> {
            Ok(Some(ConstraintViolation::custom(
                "disabled",
                "should never fire",
                vec![candidate.clone()],
                Severity::Error,
            )))
        }
    }

    #[test]
    fn test_failing_predicate_is_fail_closed() {
        let set = ConstraintSet::new().with_constraint(AlwaysFails);
        let entry = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10));
        assert!(!set.satisfies(&entry, &[]));
    }

    #[test]
    fn test_disabled_constraint_skipped() {
        let set = ConstraintSet::new().with_constraint(Disabled);
        let entry = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10));
        assert!(set.satisfies(&entry, &[]));
    }

    #[test]
    fn test_standard_set() {
        let pool = vec![slot(Weekday::Mon, 9, 10)];
        let set = ConstraintSet::standard(pool);
        assert_eq!(set.len(), 2);

        let ok = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10));
        assert!(set.satisfies(&ok, &[]));

        // Same faculty, same time → rejected
        let clash = ScheduleEntry::new("B2", "PHY", "F1", slot(Weekday::Mon, 9, 10));
        assert!(!set.satisfies(&clash, &[ok]));
    }

    #[test]
    fn test_priority_ordering() {
        #[derive(Debug)]
        struct Low;
        impl SchedulingConstraint for Low {
            fn name(&self) -> &'static str {
                "low"
            }
            fn priority(&self) -> i32 {
                1
            }
            fn check(
                &self,
                c: &ScheduleEntry,
                _: &[ScheduleEntry],
            ) -> Result<Option<ConstraintViolation>, ConstraintError> {
                Ok(Some(ConstraintViolation::custom(
                    "low",
                    "low fired",
                    vec![c.clone()],
                    Severity::Warning,
                )))
            }
        }
        #[derive(Debug)]
        struct High;
        impl SchedulingConstraint for High {
            fn name(&self) -> &'static str {
                "high"
            }
            fn priority(&self) -> i32 {
                10
            }
            fn check(
                &self,
                c: &ScheduleEntry,
                _: &[ScheduleEntry],
            ) -> Result<Option<ConstraintViolation>, ConstraintError> {
                Ok(Some(ConstraintViolation::custom(
                    "high",
                    "high fired",
                    vec![c.clone()],
                    Severity::Warning,
                )))
            }
        }

        let set = ConstraintSet::new().with_constraint(Low).with_constraint(High);
        let entry = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10));
        let violation = set.first_violation(&entry, &[]).unwrap();
        assert_eq!(violation.message, "high fired");
    }
}
