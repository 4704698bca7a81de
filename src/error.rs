//! Error types for timetable generation.
//!
//! Recoverable conditions (attempt exhaustion, holiday clashes) never
//! surface here; they degrade the run to a partial schedule with
//! structured explanations. Errors are reserved for inputs rejected
//! before the search starts and for integrity violations afterwards,
//! which indicate a solver bug rather than a bad instance.

use thiserror::Error;

use crate::validation::ValidationError;

/// Failure modes of a generation run.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Input failed structural validation before the search started.
    #[error("invalid input: {}", format_validation(.0))]
    InvalidInput(Vec<ValidationError>),

    /// The feasibility pre-check found the instance overloaded.
    #[error("infeasible instance: {}", .issues.join("; "))]
    Infeasible {
        /// What exceeds capacity.
        issues: Vec<String>,
        /// Suggested remediations.
        recommendations: Vec<String>,
    },

    /// The search could not place every requirement and partial
    /// schedules are disabled.
    #[error("could not place {} requirement(s): {}", .unplaced.len(), .unplaced.join("; "))]
    Unsatisfiable {
        /// Per-requirement failure descriptions.
        unplaced: Vec<String>,
    },

    /// Post-generation validation found a malformed entry or an
    /// unreported double-booking.
    #[error("schedule integrity violated: {0}")]
    IntegrityViolation(String),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
