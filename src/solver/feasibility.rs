//! Feasibility pre-check and holiday impact analysis.
//!
//! Cheap necessary-condition checks run before the search: total
//! session demand against grid capacity, and per-faculty demand
//! against what one person can physically teach. Passing these checks
//! does not guarantee a solution exists; failing them guarantees the
//! search would be wasted effort.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{holiday_weekdays, Batch, SchedulingOptions};
use std::collections::HashMap;

/// Demand may exceed capacity by this factor before the instance is
/// rejected outright; mild overload is left to the search, which can
/// still produce a useful partial schedule.
const OVERLOAD_FACTOR: f64 = 1.2;

/// Outcome of the pre-search capacity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityReport {
    /// Whether the instance passed every check.
    pub feasible: bool,
    /// Detected capacity problems.
    pub issues: Vec<String>,
    /// Suggested remediations, one per issue.
    pub recommendations: Vec<String>,
}

/// Effect of the holiday list on the weekly grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayImpact {
    /// Working days removed by holidays.
    pub affected_days: Vec<Weekday>,
    /// Grid slots lost to holidays.
    pub slots_lost: usize,
    /// Remaining fraction of the original grid in [0, 1].
    pub feasibility_score: f64,
}

/// Checks session demand against grid and faculty capacity.
pub fn analyze_feasibility(
    batches: &[Batch],
    options: &SchedulingOptions,
    holidays: &[NaiveDate],
) -> FeasibilityReport {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let excluded = holiday_weekdays(holidays);
    let effective_days = options
        .working_days
        .iter()
        .filter(|d| !excluded.contains(d))
        .count();
    let capacity = effective_days * options.slots_per_day();

    let total_sessions: usize = batches.iter().map(|b| b.weekly_sessions() as usize).sum();
    if total_sessions as f64 > capacity as f64 * OVERLOAD_FACTOR {
        issues.push(format!(
            "{total_sessions} weekly sessions requested but the grid offers only {capacity} slots"
        ));
        recommendations.push(
            "add working days, extend working hours, or reduce sessions per week".to_string(),
        );
    }

    let mut faculty_sessions: HashMap<&str, usize> = HashMap::new();
    for batch in batches {
        for subject in &batch.subjects {
            *faculty_sessions.entry(subject.faculty_id.as_str()).or_insert(0) +=
                subject.lectures_per_week as usize;
        }
    }
    let mut overloaded: Vec<(&str, usize)> = faculty_sessions
        .into_iter()
        .filter(|&(_, sessions)| sessions as f64 > capacity as f64 * OVERLOAD_FACTOR)
        .collect();
    overloaded.sort();
    for (faculty, sessions) in overloaded {
        issues.push(format!(
            "faculty {faculty} is asked to teach {sessions} sessions but can hold at most {capacity}"
        ));
        recommendations.push(format!(
            "split {faculty}'s subjects across additional faculty or reduce their weekly sessions"
        ));
    }

    FeasibilityReport {
        feasible: issues.is_empty(),
        issues,
        recommendations,
    }
}

/// Measures how much of the weekly grid the holiday list removes.
pub fn holiday_impact(options: &SchedulingOptions, holidays: &[NaiveDate]) -> HolidayImpact {
    let excluded = holiday_weekdays(holidays);
    let affected_days: Vec<Weekday> = options
        .working_days
        .iter()
        .filter(|d| excluded.contains(d))
        .copied()
        .collect();

    let per_day = options.slots_per_day();
    let total = options.working_days.len() * per_day;
    let slots_lost = affected_days.len() * per_day;
    let feasibility_score = if total == 0 {
        0.0
    } else {
        (total - slots_lost) as f64 / total as f64
    };

    HolidayImpact {
        affected_days,
        slots_lost,
        feasibility_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subject;
    use chrono::Weekday;

    fn batch_with_sessions(count: u32) -> Batch {
        Batch::new("B1").with_subject(Subject::new("MATH", "F1").with_lectures_per_week(count))
    }

    #[test]
    fn test_feasible_instance() {
        // 5 days × 8 slots = 40 capacity, 10 sessions requested
        let report = analyze_feasibility(
            &[batch_with_sessions(10)],
            &SchedulingOptions::default(),
            &[],
        );
        assert!(report.feasible);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_grid_overload() {
        let report = analyze_feasibility(
            &[batch_with_sessions(60)],
            &SchedulingOptions::default(),
            &[],
        );
        assert!(!report.feasible);
        assert_eq!(report.issues.len(), 2); // grid and faculty F1 both overloaded
        assert_eq!(report.issues.len(), report.recommendations.len());
    }

    #[test]
    fn test_faculty_overload_names_culprit() {
        // F1 carries 50 of the 60 sessions; only F1 is reported.
        let b1 = Batch::new("B1")
            .with_subject(Subject::new("MATH", "F1").with_lectures_per_week(50))
            .with_subject(Subject::new("PHY", "F2").with_lectures_per_week(10));
        let report = analyze_feasibility(&[b1], &SchedulingOptions::default(), &[]);
        assert!(!report.feasible);
        assert!(report.issues.iter().any(|i| i.contains("faculty F1")));
        assert!(!report.issues.iter().any(|i| i.contains("faculty F2")));
    }

    #[test]
    fn test_holiday_reduces_capacity() {
        // Holiday on Monday: 4 effective days × 8 slots = 32 capacity;
        // 40 sessions exceed 32 × 1.2 = 38.4
        let holiday = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(); // Monday
        let batches: Vec<Batch> = (0..4)
            .map(|i| {
                Batch::new(format!("B{i}")).with_subject(
                    Subject::new("MATH", format!("F{i}")).with_lectures_per_week(10),
                )
            })
            .collect();
        let report = analyze_feasibility(&batches, &SchedulingOptions::default(), &[holiday]);
        assert!(!report.feasible);
    }

    #[test]
    fn test_holiday_impact() {
        let holiday = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(); // Monday
        let impact = holiday_impact(&SchedulingOptions::default(), &[holiday]);
        assert_eq!(impact.affected_days, vec![Weekday::Mon]);
        assert_eq!(impact.slots_lost, 8);
        assert!((impact.feasibility_score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_holiday_impact_ignores_non_working_days() {
        let saturday = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
        let impact = holiday_impact(&SchedulingOptions::default(), &[saturday]);
        assert!(impact.affected_days.is_empty());
        assert_eq!(impact.slots_lost, 0);
        assert!((impact.feasibility_score - 1.0).abs() < 1e-9);
    }
}
