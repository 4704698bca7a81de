//! Built-in constraints.
//!
//! The standard hard rules of lecture timetabling: one teacher in one
//! place at a time, one batch in one place at a time, and placements
//! only on slots the working grid actually offers.

use super::{ConstraintError, SchedulingConstraint};
use crate::models::{ConstraintViolation, ScheduleEntry, TimeSlot};

/// A faculty member cannot teach two overlapping sessions.
#[derive(Debug, Clone, Copy)]
pub struct FacultyConflictConstraint;

impl SchedulingConstraint for FacultyConflictConstraint {
    fn name(&self) -> &'static str {
        "faculty-conflict"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn check(
        &self,
        candidate: &ScheduleEntry,
        existing: &[ScheduleEntry],
    ) -> Result<Option<ConstraintViolation>, ConstraintError> {
        for placed in existing {
            if placed.faculty_id == candidate.faculty_id && placed.overlaps(candidate) {
                return Ok(Some(ConstraintViolation::faculty_conflict(
                    format!(
                        "{} already teaches {} during {}",
                        candidate.faculty_id,
                        placed.subject_id,
                        placed.label(),
                    ),
                    vec![candidate.clone(), placed.clone()],
                )));
            }
        }
        Ok(None)
    }
}

/// A batch cannot attend two overlapping sessions.
#[derive(Debug, Clone, Copy)]
pub struct BatchConflictConstraint;

impl SchedulingConstraint for BatchConflictConstraint {
    fn name(&self) -> &'static str {
        "batch-conflict"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn check(
        &self,
        candidate: &ScheduleEntry,
        existing: &[ScheduleEntry],
    ) -> Result<Option<ConstraintViolation>, ConstraintError> {
        for placed in existing {
            if placed.batch_id == candidate.batch_id && placed.overlaps(candidate) {
                return Ok(Some(ConstraintViolation::batch_conflict(
                    format!(
                        "batch {} already attends {} during {}",
                        candidate.batch_id,
                        placed.subject_id,
                        placed.label(),
                    ),
                    vec![candidate.clone(), placed.clone()],
                )));
            }
        }
        Ok(None)
    }
}

/// Placements must land on an available slot of the working grid.
///
/// The pool is captured at construction; callers that blank out slots
/// (`available = false`) get them rejected here without rebuilding the
/// constraint set.
#[derive(Debug, Clone)]
pub struct SlotAvailabilityConstraint {
    pool: Vec<TimeSlot>,
}

impl SlotAvailabilityConstraint {
    /// Creates the constraint over a slot pool.
    pub fn new(pool: Vec<TimeSlot>) -> Self {
        Self { pool }
    }
}

impl SchedulingConstraint for SlotAvailabilityConstraint {
    fn name(&self) -> &'static str {
        "slot-availability"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn check(
        &self,
        candidate: &ScheduleEntry,
        _existing: &[ScheduleEntry],
    ) -> Result<Option<ConstraintViolation>, ConstraintError> {
        let known = self.pool.iter().find(|s| {
            s.day == candidate.slot.day
                && s.start == candidate.slot.start
                && s.end == candidate.slot.end
        });
        match known {
            Some(slot) if slot.available => Ok(None),
            Some(_) => Ok(Some(ConstraintViolation::slot_unavailable(
                format!("slot {} is marked unavailable", candidate.label()),
                vec![candidate.clone()],
            ))),
            None => Ok(Some(ConstraintViolation::slot_unavailable(
                format!("slot {} is outside the working grid", candidate.label()),
                vec![candidate.clone()],
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    fn slot(day: Weekday, sh: u32, eh: u32) -> TimeSlot {
        TimeSlot::new(
            day,
            NaiveTime::from_hms_opt(sh, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(eh, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_faculty_conflict_detects_overlap() {
        let placed = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 11));
        let candidate = ScheduleEntry::new("B2", "PHY", "F1", slot(Weekday::Mon, 10, 12));
        let violation = FacultyConflictConstraint
            .check(&candidate, &[placed])
            .unwrap();
        assert!(violation.is_some());
        assert_eq!(violation.unwrap().affected.len(), 2);
    }

    #[test]
    fn test_faculty_conflict_allows_different_faculty() {
        let placed = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 11));
        let candidate = ScheduleEntry::new("B2", "PHY", "F2", slot(Weekday::Mon, 10, 12));
        assert!(FacultyConflictConstraint
            .check(&candidate, &[placed])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_faculty_conflict_allows_adjacent() {
        let placed = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10));
        let candidate = ScheduleEntry::new("B2", "PHY", "F1", slot(Weekday::Mon, 10, 11));
        assert!(FacultyConflictConstraint
            .check(&candidate, &[placed])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_batch_conflict() {
        let placed = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10));
        let candidate = ScheduleEntry::new("B1", "PHY", "F2", slot(Weekday::Mon, 9, 10));
        let violation = BatchConflictConstraint.check(&candidate, &[placed]).unwrap();
        assert!(violation.is_some());
    }

    #[test]
    fn test_slot_availability() {
        let pool = vec![
            slot(Weekday::Mon, 9, 10),
            slot(Weekday::Mon, 10, 11).with_available(false),
        ];
        let constraint = SlotAvailabilityConstraint::new(pool);

        let on_grid = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10));
        assert!(constraint.check(&on_grid, &[]).unwrap().is_none());

        let blanked = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 10, 11));
        assert!(constraint.check(&blanked, &[]).unwrap().is_some());

        let off_grid = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Sun, 9, 10));
        assert!(constraint.check(&off_grid, &[]).unwrap().is_some());
    }
}
