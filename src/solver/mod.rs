//! Timetable generation: the CSP solver and its orchestration.
//!
//! [`TimetableGenerator`] drives one generation run end to end:
//! validate input → feasibility pre-check → build the slot grid →
//! expand requirements → propagate domains → backtracking search →
//! optimization → conflict resolution → holiday reconciliation →
//! integrity check. Each stage is usable on its own through the
//! submodules.

mod domain;
mod feasibility;
mod propagation;
mod search;

pub use domain::{Domain, DomainStore};
pub use feasibility::{analyze_feasibility, holiday_impact, FeasibilityReport, HolidayImpact};
pub use propagation::{PropagationStats, Propagator, MAX_PROPAGATION_ROUNDS};
pub use search::{SearchEngine, SearchOutcome, SearchStats};

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::conflicts::{
    reconcile_holidays, resolve_conflicts, FacultyReassignment, LectureSplitting, ResolutionStats,
    ResolutionStrategy, TimeShift,
};
use crate::constraints::ConstraintSet;
use crate::error::ScheduleError;
use crate::models::{
    build_slot_pool, exclude_holidays, Batch, ConstraintViolation, LectureRequirement,
    ScheduleEntry, ScheduleMetadata, SchedulingOptions, TimeSlot, UnscheduledLecture,
    WeeklySchedule,
};
use crate::optimizer::{OptimizationMetrics, ScheduleOptimizer};
use crate::validation::validate_input;

/// Everything one generation run produced, diagnostics included.
#[derive(Debug)]
pub struct GenerationReport {
    /// The generated schedule.
    pub schedule: WeeklySchedule,
    /// Pre-search propagation counters.
    pub propagation: PropagationStats,
    /// Search counters.
    pub search: SearchStats,
    /// Final optimization scores.
    pub optimization: OptimizationMetrics,
    /// Conflict resolution counters.
    pub resolution: ResolutionStats,
    /// The pre-search feasibility report.
    pub feasibility: FeasibilityReport,
    /// What the holiday list cost in grid capacity.
    pub holiday_impact: HolidayImpact,
}

/// Weekly timetable generator.
///
/// # Example
///
/// ```
/// use timetabler::models::{Batch, SchedulingOptions, Subject};
/// use timetabler::solver::TimetableGenerator;
///
/// let batches = vec![Batch::new("CS-1").with_subject(
///     Subject::new("MATH", "F1").with_lectures_per_week(3),
/// )];
/// let generator = TimetableGenerator::new(SchedulingOptions::default());
/// let schedule = generator.generate(&batches, &[]).unwrap();
/// assert_eq!(schedule.entry_count(), 3);
/// ```
pub struct TimetableGenerator {
    options: SchedulingOptions,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl TimetableGenerator {
    /// Creates a generator with the repairing strategy stack
    /// (time-shift, faculty reassignment, lecture splitting).
    ///
    /// `PriorityKeep` is deliberately absent: an accepted overlap
    /// would survive into the final schedule unreported, which the
    /// integrity check treats as a solver bug.
    pub fn new(options: SchedulingOptions) -> Self {
        Self {
            options,
            strategies: vec![
                Box::new(TimeShift),
                Box::new(FacultyReassignment::new()),
                Box::new(LectureSplitting),
            ],
        }
    }

    /// Replaces the resolution strategy stack.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Generates a schedule with the standard constraints.
    pub fn generate(
        &self,
        batches: &[Batch],
        holidays: &[NaiveDate],
    ) -> Result<WeeklySchedule, ScheduleError> {
        self.generate_detailed(batches, holidays, None)
            .map(|report| report.schedule)
    }

    /// Generates a schedule with a caller-supplied constraint set.
    pub fn generate_with(
        &self,
        batches: &[Batch],
        holidays: &[NaiveDate],
        constraints: &ConstraintSet,
    ) -> Result<WeeklySchedule, ScheduleError> {
        self.generate_detailed(batches, holidays, Some(constraints))
            .map(|report| report.schedule)
    }

    /// The feasibility pre-check on its own.
    pub fn feasibility(&self, batches: &[Batch], holidays: &[NaiveDate]) -> FeasibilityReport {
        analyze_feasibility(batches, &self.options, holidays)
    }

    /// The holiday impact analysis on its own.
    pub fn holiday_impact(&self, holidays: &[NaiveDate]) -> HolidayImpact {
        holiday_impact(&self.options, holidays)
    }

    /// Full generation run with diagnostics.
    ///
    /// With `constraints = None`, the standard set (faculty-conflict +
    /// slot-availability over the holiday-excluded grid) is used.
    pub fn generate_detailed(
        &self,
        batches: &[Batch],
        holidays: &[NaiveDate],
        constraints: Option<&ConstraintSet>,
    ) -> Result<GenerationReport, ScheduleError> {
        validate_input(batches, &self.options, holidays).map_err(ScheduleError::InvalidInput)?;

        let feasibility = analyze_feasibility(batches, &self.options, holidays);
        if !feasibility.feasible {
            if self.options.allow_partial_schedules {
                for issue in &feasibility.issues {
                    warn!("continuing despite overload: {issue}");
                }
            } else {
                return Err(ScheduleError::Infeasible {
                    issues: feasibility.issues,
                    recommendations: feasibility.recommendations,
                });
            }
        }
        let impact = holiday_impact(&self.options, holidays);

        let full_pool = build_slot_pool(
            &self.options.working_days,
            self.options.hours.start,
            self.options.hours.end,
            self.options.slot_duration_minutes,
            self.options.break_minutes,
        );
        let pool = exclude_holidays(&full_pool, holidays);
        let requirements = LectureRequirement::expand(batches);
        info!(
            "generating timetable: {} requirement(s) over {} slot(s)",
            requirements.len(),
            pool.len()
        );

        let standard;
        let constraints = match constraints {
            Some(set) => set,
            None => {
                standard = ConstraintSet::standard(pool.clone());
                &standard
            }
        };

        let mut store = DomainStore::new(pool.clone(), requirements);
        let live: Vec<usize> = (0..store.len()).collect();
        let propagation = Propagator::new(constraints).propagate(&mut store, &live, &[]);

        let engine = SearchEngine::new(
            constraints,
            self.options.max_attempts_per_lecture,
            self.options.allow_partial_schedules,
        );
        let outcome = engine.search(&mut store);
        if !self.options.allow_partial_schedules && !outcome.is_complete() {
            return Err(ScheduleError::Unsatisfiable {
                unplaced: outcome
                    .unscheduled
                    .iter()
                    .map(|u| format!("{}: {}", u.requirement.label(), u.reason))
                    .collect(),
            });
        }
        let mut entries = outcome.entries;
        let mut unscheduled = outcome.unscheduled;

        let optimization = ScheduleOptimizer::new().optimize(&mut entries, &pool, &self.options);

        let (mut conflicts, resolution) =
            resolve_conflicts(&mut entries, &pool, &self.options, &self.strategies);

        let (holiday_conflicts, rehomed) =
            reconcile_holidays(&mut entries, holidays, &full_pool, &self.options);
        if rehomed > 0 {
            debug!("re-homed {rehomed} session(s) off holiday-excluded days");
        }
        conflicts.extend(holiday_conflicts);
        self.flag_holiday_starved(&full_pool, &pool, &mut unscheduled, &mut conflicts);

        verify_integrity(&entries, &conflicts)?;

        let mut metadata = ScheduleMetadata::new(store.len());
        metadata.unscheduled = unscheduled;
        metadata.propagation_rounds = propagation.rounds;
        metadata.constraint_checks =
            propagation.constraint_checks + outcome.stats.propagation.constraint_checks;
        metadata.slots_eliminated =
            propagation.slots_eliminated + outcome.stats.propagation.slots_eliminated;
        metadata.backtracks = outcome.stats.backtracks;
        metadata.optimizer_iterations = optimization.iterations;
        metadata.optimization_score = optimization.metrics.weighted;
        metadata.conflicts_resolved = resolution.resolved;
        metadata.conflicts_unresolved = resolution.unresolved;

        Ok(GenerationReport {
            schedule: WeeklySchedule {
                entries,
                conflicts,
                metadata,
            },
            propagation,
            search: outcome.stats,
            optimization: optimization.metrics,
            resolution,
            feasibility,
            holiday_impact: impact,
        })
    }

    /// Converts "unscheduled because holidays removed every viable
    /// slot" into an explicit holiday clash, so callers can tell a
    /// holiday-starved week from a genuinely oversized instance.
    fn flag_holiday_starved(
        &self,
        full_pool: &[TimeSlot],
        pool: &[TimeSlot],
        unscheduled: &mut [UnscheduledLecture],
        conflicts: &mut Vec<ConstraintViolation>,
    ) {
        for entry in unscheduled.iter_mut() {
            let duration = entry.requirement.duration_minutes;
            let fits = |slots: &[TimeSlot]| {
                slots
                    .iter()
                    .any(|s| s.available && s.duration_minutes() >= duration)
            };
            if fits(full_pool) && !fits(pool) {
                entry.reason = format!("{} (every viable slot falls on a holiday)", entry.reason);
                conflicts.push(ConstraintViolation::holiday_clash(
                    format!(
                        "{} cannot be placed: holidays removed every viable slot; \
                         schedule it manually or shorten the holiday list",
                        entry.requirement.label()
                    ),
                    Vec::new(),
                ));
            }
        }
    }
}

/// Post-generation invariant check.
///
/// Malformed entries and faculty double-bookings that no conflict
/// record mentions indicate a solver bug and abort the run.
fn verify_integrity(
    entries: &[ScheduleEntry],
    conflicts: &[ConstraintViolation],
) -> Result<(), ScheduleError> {
    for entry in entries {
        if entry.slot.start >= entry.slot.end {
            return Err(ScheduleError::IntegrityViolation(format!(
                "entry {} has a degenerate slot",
                entry.label()
            )));
        }
    }

    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if a.faculty_id == b.faculty_id && a.overlaps(b) {
                let reported = conflicts.iter().any(|c| {
                    c.affected.iter().any(|e| e == a) && c.affected.iter().any(|e| e == b)
                });
                if !reported {
                    return Err(ScheduleError::IntegrityViolation(format!(
                        "unreported faculty double-booking: {} vs {}",
                        a.label(),
                        b.label()
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subject;
    use chrono::Weekday;

    fn one_subject(batch: &str, subject: &str, faculty: &str, sessions: u32) -> Batch {
        Batch::new(batch)
            .with_subject(Subject::new(subject, faculty).with_lectures_per_week(sessions))
    }

    #[test]
    fn test_generate_simple_week() {
        let batches = vec![
            one_subject("B1", "MATH", "F1", 3),
            one_subject("B2", "PHY", "F2", 2),
        ];
        let generator = TimetableGenerator::new(SchedulingOptions::default());
        let schedule = generator.generate(&batches, &[]).unwrap();

        assert_eq!(schedule.entry_count(), 5);
        assert!(schedule.conflicts.is_empty());
        assert!(schedule.metadata.unscheduled.is_empty());
        assert_eq!(schedule.metadata.total_requirements, 5);
    }

    #[test]
    fn test_generate_rejects_invalid_input() {
        let batches = vec![Batch::new("B1")];
        let generator = TimetableGenerator::new(SchedulingOptions::default());
        let err = generator.generate(&batches, &[]).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidInput(_)));
    }

    #[test]
    fn test_generate_shared_faculty_never_double_books() {
        // One faculty teaching both batches: entries must never overlap
        let batches = vec![
            one_subject("B1", "MATH", "F1", 4),
            one_subject("B2", "ALGO", "F1", 4),
        ];
        let generator = TimetableGenerator::new(SchedulingOptions::default());
        let schedule = generator.generate(&batches, &[]).unwrap();

        assert_eq!(schedule.entry_count(), 8);
        let f1 = schedule.entries_for_faculty("F1");
        for (i, a) in f1.iter().enumerate() {
            for b in &f1[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_holiday_on_only_working_day() {
        // The entire grid disappears: zero entries, an unresolvable
        // holiday conflict, and no crash.
        let options = SchedulingOptions::default().with_working_days(vec![Weekday::Mon]);
        let monday = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let generator = TimetableGenerator::new(options);

        let schedule = generator
            .generate(&[one_subject("B1", "MATH", "F1", 1)], &[monday])
            .unwrap();

        assert_eq!(schedule.entry_count(), 0);
        assert_eq!(schedule.metadata.unscheduled.len(), 1);
        assert!(schedule
            .conflicts
            .iter()
            .any(|c| c.kind == crate::models::ViolationKind::HolidayClash));
    }

    #[test]
    fn test_holiday_shifts_sessions_to_other_days() {
        let monday = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let generator = TimetableGenerator::new(SchedulingOptions::default());
        let schedule = generator
            .generate(&[one_subject("B1", "MATH", "F1", 4)], &[monday])
            .unwrap();

        assert_eq!(schedule.entry_count(), 4);
        assert!(schedule.entries.iter().all(|e| e.slot.day != Weekday::Mon));
    }

    #[test]
    fn test_strict_mode_errors_on_unplaceable() {
        // A 90-minute subject cannot fit a 60-minute grid
        let options = SchedulingOptions::default().with_partial_schedules(false);
        let batch = Batch::new("B1")
            .with_subject(Subject::new("LAB", "F1").with_duration(90));
        let generator = TimetableGenerator::new(options);

        let err = generator.generate(&[batch], &[]).unwrap_err();
        assert!(matches!(err, ScheduleError::Unsatisfiable { .. }));
    }

    #[test]
    fn test_partial_mode_records_unplaceable() {
        let batch = Batch::new("B1")
            .with_subject(Subject::new("LAB", "F1").with_duration(90))
            .with_subject(Subject::new("MATH", "F2"));
        let generator = TimetableGenerator::new(SchedulingOptions::default());

        let schedule = generator.generate(&[batch], &[]).unwrap();
        assert_eq!(schedule.entry_count(), 1);
        assert_eq!(schedule.metadata.unscheduled.len(), 1);
        assert_eq!(schedule.metadata.unscheduled[0].requirement.subject_id, "LAB");
    }

    #[test]
    fn test_strict_mode_rejects_overload_early() {
        let options = SchedulingOptions::default().with_partial_schedules(false);
        let generator = TimetableGenerator::new(options);
        let err = generator
            .generate(&[one_subject("B1", "MATH", "F1", 60)], &[])
            .unwrap_err();
        match err {
            ScheduleError::Infeasible {
                issues,
                recommendations,
            } => {
                assert!(!issues.is_empty());
                assert!(!recommendations.is_empty());
            }
            other => panic!("expected Infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_detailed_report_counters() {
        let batches = vec![one_subject("B1", "MATH", "F1", 3)];
        let generator = TimetableGenerator::new(SchedulingOptions::default());
        let report = generator.generate_detailed(&batches, &[], None).unwrap();

        assert!(report.propagation.rounds >= 1);
        assert!(report.search.attempts >= 3);
        assert!(report.feasibility.feasible);
        assert!((report.holiday_impact.feasibility_score - 1.0).abs() < 1e-9);
        assert_eq!(
            report.schedule.metadata.optimization_score,
            report.optimization.weighted
        );
    }

    #[test]
    fn test_integrity_check_flags_unreported_overlap() {
        let slot = crate::models::TimeSlot::new(
            Weekday::Mon,
            chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        );
        let entries = vec![
            ScheduleEntry::new("B1", "MATH", "F1", slot.clone()),
            ScheduleEntry::new("B2", "PHY", "F1", slot),
        ];
        assert!(verify_integrity(&entries, &[]).is_err());

        let reported = crate::conflicts::detect_conflicts(&entries);
        assert!(verify_integrity(&entries, &reported).is_ok());
    }
}
