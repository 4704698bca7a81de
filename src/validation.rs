//! Input validation for timetabling problems.
//!
//! Checks structural integrity of batches, subjects, options, and the
//! holiday list before the solver runs. Detects:
//! - Duplicate IDs
//! - Empty batches and zero-session subjects
//! - Non-positive durations
//! - Degenerate working hours or grid settings
//! - Duplicate holidays

use std::collections::HashSet;

use crate::models::{Batch, SchedulingOptions};
use chrono::NaiveDate;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A batch has no subjects.
    EmptyBatch,
    /// A subject requests zero weekly sessions.
    ZeroSessions,
    /// A session or grid duration is not positive.
    InvalidDuration,
    /// Working hours end at or before they start.
    InvalidWorkingHours,
    /// No working days were given.
    NoWorkingDays,
    /// The same date appears twice in the holiday list.
    DuplicateHoliday,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input of a timetabling problem.
///
/// Checks:
/// 1. No duplicate batch IDs
/// 2. No duplicate subject IDs within a batch
/// 3. Every batch has at least one subject
/// 4. Every subject has positive weekly sessions and duration
/// 5. Working days are non-empty and not duplicated
/// 6. Working hours span a positive interval
/// 7. Grid slot duration is positive, break is non-negative
/// 8. No duplicate holiday dates
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    batches: &[Batch],
    options: &SchedulingOptions,
    holidays: &[NaiveDate],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut batch_ids = HashSet::new();
    for batch in batches {
        if !batch_ids.insert(batch.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate batch ID: {}", batch.id),
            ));
        }

        if batch.subjects.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyBatch,
                format!("Batch '{}' has no subjects", batch.id),
            ));
        }

        let mut subject_ids = HashSet::new();
        for subject in &batch.subjects {
            if !subject_ids.insert(subject.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate subject ID '{}' in batch '{}'", subject.id, batch.id),
                ));
            }
            if subject.lectures_per_week == 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ZeroSessions,
                    format!("Subject '{}' requests zero sessions per week", subject.id),
                ));
            }
            if subject.lecture_duration_minutes <= 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDuration,
                    format!(
                        "Subject '{}' has non-positive duration {}",
                        subject.id, subject.lecture_duration_minutes
                    ),
                ));
            }
        }
    }

    if options.working_days.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoWorkingDays,
            "No working days configured",
        ));
    }
    let mut seen_days = HashSet::new();
    for &day in &options.working_days {
        if !seen_days.insert(day.num_days_from_monday()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Working day {day} listed twice"),
            ));
        }
    }

    if options.hours.span_minutes() <= 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWorkingHours,
            format!(
                "Working hours end ({}) not after start ({})",
                options.hours.end, options.hours.start
            ),
        ));
    }
    if options.slot_duration_minutes <= 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDuration,
            format!(
                "Slot duration must be positive, got {}",
                options.slot_duration_minutes
            ),
        ));
    }
    if options.break_minutes < 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDuration,
            format!("Break minutes must be non-negative, got {}", options.break_minutes),
        ));
    }

    let mut seen_dates = HashSet::new();
    for date in holidays {
        if !seen_dates.insert(*date) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateHoliday,
                format!("Holiday {date} listed twice"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subject;

    fn valid_batch() -> Batch {
        Batch::new("B1").with_subject(Subject::new("MATH", "F1"))
    }

    #[test]
    fn test_valid_input() {
        let result = validate_input(&[valid_batch()], &SchedulingOptions::default(), &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_batch_id() {
        let batches = vec![valid_batch(), valid_batch()];
        let errors = validate_input(&batches, &SchedulingOptions::default(), &[]).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_duplicate_subject_in_batch() {
        let batch = Batch::new("B1")
            .with_subject(Subject::new("MATH", "F1"))
            .with_subject(Subject::new("MATH", "F2"));
        let errors = validate_input(&[batch], &SchedulingOptions::default(), &[]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
    }

    #[test]
    fn test_empty_batch() {
        let errors =
            validate_input(&[Batch::new("B1")], &SchedulingOptions::default(), &[]).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::EmptyBatch));
    }

    #[test]
    fn test_zero_sessions_and_duration() {
        let batch = Batch::new("B1")
            .with_subject(Subject::new("MATH", "F1").with_lectures_per_week(0).with_duration(0));
        let errors = validate_input(&[batch], &SchedulingOptions::default(), &[]).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::ZeroSessions));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidDuration));
    }

    #[test]
    fn test_no_working_days() {
        let options = SchedulingOptions::default().with_working_days(vec![]);
        let errors = validate_input(&[valid_batch()], &options, &[]).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::NoWorkingDays));
    }

    #[test]
    fn test_inverted_hours() {
        let options = SchedulingOptions::default()
            .with_hours(crate::models::WorkingHours::parse("17:00", "09:00").unwrap());
        let errors = validate_input(&[valid_batch()], &options, &[]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidWorkingHours));
    }

    #[test]
    fn test_duplicate_holiday() {
        let d = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let errors =
            validate_input(&[valid_batch()], &SchedulingOptions::default(), &[d, d]).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateHoliday));
    }
}
