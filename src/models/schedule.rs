//! Weekly schedule (solution) model.
//!
//! A weekly schedule is the set of placed lecture sessions plus any
//! constraint violations that survived resolution, and generation
//! metadata. The solver produces one per run; callers may keep editing
//! it afterwards through the add/remove helpers.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{LectureRequirement, TimeSlot};

/// A placed lecture session: the "value" assigned to a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Batch attending.
    pub batch_id: String,
    /// Subject taught.
    pub subject_id: String,
    /// Faculty member teaching.
    pub faculty_id: String,
    /// Assigned slot.
    pub slot: TimeSlot,
}

impl ScheduleEntry {
    /// Creates an entry.
    pub fn new(
        batch_id: impl Into<String>,
        subject_id: impl Into<String>,
        faculty_id: impl Into<String>,
        slot: TimeSlot,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            subject_id: subject_id.into(),
            faculty_id: faculty_id.into(),
            slot,
        }
    }

    /// Builds the entry satisfying a requirement at a given slot.
    pub fn for_requirement(requirement: &LectureRequirement, slot: TimeSlot) -> Self {
        Self {
            batch_id: requirement.batch_id.clone(),
            subject_id: requirement.subject_id.clone(),
            faculty_id: requirement.faculty_id.clone(),
            slot,
        }
    }

    /// Whether two entries occupy overlapping time on the same day.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.slot.overlaps(&other.slot)
    }

    /// Short label for log and conflict messages.
    pub fn label(&self) -> String {
        format!(
            "{}/{} ({}) {} {}-{}",
            self.batch_id,
            self.subject_id,
            self.faculty_id,
            self.slot.day,
            self.slot.start.format("%H:%M"),
            self.slot.end.format("%H:%M"),
        )
    }
}

/// Violation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// The schedule is unusable as-is.
    Error,
    /// The schedule is usable but degraded.
    Warning,
}

/// Classification of constraint violations and residual conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// One faculty member in two overlapping sessions.
    FacultyConflict,
    /// One batch in two overlapping sessions.
    BatchConflict,
    /// Entry placed on a slot outside the working pool.
    SlotUnavailable,
    /// Entry pinned to a day excluded by a holiday.
    HolidayClash,
    /// Domain-specific violation from a caller-supplied constraint.
    Custom(String),
}

/// A detected constraint violation.
///
/// Produced by constraint evaluation or conflict detection; immutable
/// once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Violation category.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
    /// Entries involved (value copies, not references into a schedule).
    pub affected: Vec<ScheduleEntry>,
    /// Severity.
    pub severity: Severity,
}

impl ConstraintViolation {
    /// Creates a faculty double-booking violation.
    pub fn faculty_conflict(message: impl Into<String>, affected: Vec<ScheduleEntry>) -> Self {
        Self {
            kind: ViolationKind::FacultyConflict,
            message: message.into(),
            affected,
            severity: Severity::Error,
        }
    }

    /// Creates a batch double-booking violation.
    ///
    /// Always an error: students cannot attend two sessions at once.
    pub fn batch_conflict(message: impl Into<String>, affected: Vec<ScheduleEntry>) -> Self {
        Self {
            kind: ViolationKind::BatchConflict,
            message: message.into(),
            affected,
            severity: Severity::Error,
        }
    }

    /// Creates an out-of-pool slot violation.
    pub fn slot_unavailable(message: impl Into<String>, affected: Vec<ScheduleEntry>) -> Self {
        Self {
            kind: ViolationKind::SlotUnavailable,
            message: message.into(),
            affected,
            severity: Severity::Error,
        }
    }

    /// Creates a holiday clash violation.
    pub fn holiday_clash(message: impl Into<String>, affected: Vec<ScheduleEntry>) -> Self {
        Self {
            kind: ViolationKind::HolidayClash,
            message: message.into(),
            affected,
            severity: Severity::Error,
        }
    }

    /// Creates a violation for a caller-defined constraint.
    pub fn custom(
        kind: impl Into<String>,
        message: impl Into<String>,
        affected: Vec<ScheduleEntry>,
        severity: Severity,
    ) -> Self {
        Self {
            kind: ViolationKind::Custom(kind.into()),
            message: message.into(),
            affected,
            severity,
        }
    }
}

/// A requirement the search could not place, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledLecture {
    /// The unplaced requirement.
    pub requirement: LectureRequirement,
    /// Why placement failed.
    pub reason: String,
}

/// Generation metadata attached to a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    /// When the schedule was generated.
    pub generated_at: DateTime<Utc>,
    /// Requirements the search was asked to place.
    pub total_requirements: usize,
    /// Requirements that could not be placed.
    pub unscheduled: Vec<UnscheduledLecture>,
    /// Propagation rounds run before and during search.
    pub propagation_rounds: usize,
    /// Constraint predicate invocations across the run.
    pub constraint_checks: usize,
    /// Candidate slots eliminated by propagation.
    pub slots_eliminated: usize,
    /// Assignments undone during search.
    pub backtracks: usize,
    /// Optimizer rounds actually run.
    pub optimizer_iterations: usize,
    /// Final weighted optimization score in [0, 1].
    pub optimization_score: f64,
    /// Conflicts repaired by resolution strategies.
    pub conflicts_resolved: usize,
    /// Conflicts left for manual handling.
    pub conflicts_unresolved: usize,
}

impl ScheduleMetadata {
    /// Creates metadata stamped now with all counters zeroed.
    pub fn new(total_requirements: usize) -> Self {
        Self {
            generated_at: Utc::now(),
            total_requirements,
            unscheduled: Vec::new(),
            propagation_rounds: 0,
            constraint_checks: 0,
            slots_eliminated: 0,
            backtracks: 0,
            optimizer_iterations: 0,
            optimization_score: 0.0,
            conflicts_resolved: 0,
            conflicts_unresolved: 0,
        }
    }
}

/// A complete weekly timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySchedule {
    /// Placed sessions.
    pub entries: Vec<ScheduleEntry>,
    /// Residual conflicts left after resolution.
    pub conflicts: Vec<ConstraintViolation>,
    /// Generation metadata.
    pub metadata: ScheduleMetadata,
}

impl WeeklySchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            conflicts: Vec::new(),
            metadata: ScheduleMetadata::new(0),
        }
    }

    /// Adds an entry.
    pub fn add_entry(&mut self, entry: ScheduleEntry) {
        self.entries.push(entry);
    }

    /// Removes the first entry matching batch, subject, and slot.
    ///
    /// Returns the removed entry, or `None` if no entry matched.
    pub fn remove_entry(
        &mut self,
        batch_id: &str,
        subject_id: &str,
        slot: &TimeSlot,
    ) -> Option<ScheduleEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.batch_id == batch_id && e.subject_id == subject_id && &e.slot == slot)?;
        Some(self.entries.remove(idx))
    }

    /// Whether the schedule carries no error-level conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.iter().all(|c| c.severity != Severity::Error)
    }

    /// Entries for one batch.
    pub fn entries_for_batch(&self, batch_id: &str) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.batch_id == batch_id)
            .collect()
    }

    /// Entries for one faculty member.
    pub fn entries_for_faculty(&self, faculty_id: &str) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.faculty_id == faculty_id)
            .collect()
    }

    /// Entries on one weekday, in chronological order.
    pub fn entries_on(&self, day: Weekday) -> Vec<&ScheduleEntry> {
        let mut on_day: Vec<&ScheduleEntry> =
            self.entries.iter().filter(|e| e.slot.day == day).collect();
        on_day.sort_by_key(|e| e.slot.start);
        on_day
    }

    /// Total scheduled minutes.
    pub fn total_minutes(&self) -> i64 {
        self.entries.iter().map(|e| e.slot.duration_minutes()).sum()
    }

    /// Weekly teaching minutes per faculty member.
    pub fn faculty_load(&self) -> HashMap<String, i64> {
        let mut load: HashMap<String, i64> = HashMap::new();
        for e in &self.entries {
            *load.entry(e.faculty_id.clone()).or_insert(0) += e.slot.duration_minutes();
        }
        load
    }

    /// Number of placed sessions.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self::new()
    }
}
