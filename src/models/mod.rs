//! Timetabling domain models.
//!
//! Core data types for the weekly lecture timetabling problem and its
//! solutions: the slot grid, per-session requirements (the search
//! variables), placed entries (the values), and the schedule aggregate
//! with its violations and metadata.

mod options;
mod requirement;
mod schedule;
mod time_slot;

pub use options::{OptimizerConfig, SchedulingOptions, WorkingHours};
pub use requirement::{Batch, LectureRequirement, Subject};
pub use schedule::{
    ConstraintViolation, ScheduleEntry, ScheduleMetadata, Severity, UnscheduledLecture,
    ViolationKind, WeeklySchedule,
};
pub use time_slot::{build_slot_pool, exclude_holidays, holiday_weekdays, TimeSlot};
