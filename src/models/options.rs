//! Scheduling options and optimizer configuration.
//!
//! Options describe the weekly grid (working days, hours, slot length,
//! breaks) and the search/optimization knobs. All bounding in the core
//! is counter-based; callers wanting wall-clock limits wrap the whole
//! generation call.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Daily working hours, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    /// First bookable time of day.
    pub start: NaiveTime,
    /// End of the working day (exclusive).
    pub end: NaiveTime,
}

impl WorkingHours {
    /// Creates working hours.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parses `"HH:MM"` boundaries.
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: NaiveTime::parse_from_str(start, "%H:%M")?,
            end: NaiveTime::parse_from_str(end, "%H:%M")?,
        })
    }

    /// Working-day length in minutes.
    pub fn span_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Midpoint of the working day, used by the morning-preference metric.
    pub fn midpoint_minute(&self) -> i64 {
        use chrono::Timelike;
        let s = self.start.num_seconds_from_midnight() as i64 / 60;
        s + self.span_minutes() / 2
    }
}

/// Weights and switches for the multi-objective optimizer.
///
/// Weights are relative; the total score is the weighted mean of the
/// enabled criteria, each normalized to `[0, 1]` with 1 best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Weight of even same-subject distribution across the week.
    pub distribution_weight: f64,
    /// Weight of idle-gap minimization within a batch's day.
    pub gap_weight: f64,
    /// Weight of per-faculty daily load balance.
    pub balance_weight: f64,
    /// Weight of the morning-start preference.
    pub morning_weight: f64,
    /// Whether the distribution pass runs.
    pub distribution_enabled: bool,
    /// Whether the gap pass runs.
    pub gap_enabled: bool,
    /// Whether the faculty-balance pass runs.
    pub balance_enabled: bool,
    /// Whether the morning pass runs.
    pub morning_enabled: bool,
    /// Maximum optimization rounds.
    pub max_iterations: usize,
    /// Stop once a round improves the score by less than this.
    pub improvement_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            distribution_weight: 0.3,
            gap_weight: 0.25,
            balance_weight: 0.25,
            morning_weight: 0.2,
            distribution_enabled: true,
            gap_enabled: true,
            balance_enabled: true,
            morning_enabled: true,
            max_iterations: 10,
            improvement_threshold: 0.01,
        }
    }
}

impl OptimizerConfig {
    /// Disables every pass; the optimizer becomes a no-op.
    pub fn disabled() -> Self {
        Self {
            distribution_enabled: false,
            gap_enabled: false,
            balance_enabled: false,
            morning_enabled: false,
            ..Self::default()
        }
    }

    /// Sets the four criterion weights at once.
    pub fn with_weights(mut self, distribution: f64, gap: f64, balance: f64, morning: f64) -> Self {
        self.distribution_weight = distribution;
        self.gap_weight = gap;
        self.balance_weight = balance;
        self.morning_weight = morning;
        self
    }

    /// Sets the iteration cap.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingOptions {
    /// Working days, in timetable display order.
    pub working_days: Vec<Weekday>,
    /// Daily working hours.
    pub hours: WorkingHours,
    /// Grid slot length in minutes.
    pub slot_duration_minutes: i64,
    /// Break between consecutive grid slots in minutes.
    pub break_minutes: i64,
    /// Candidate-evaluation budget per requirement; the global search
    /// budget is this times the requirement count.
    pub max_attempts_per_lecture: usize,
    /// Whether an unplaceable requirement degrades the run to a partial
    /// schedule instead of failing it.
    pub allow_partial_schedules: bool,
    /// Optimizer configuration.
    pub optimizer: OptimizerConfig,
}

impl Default for SchedulingOptions {
    fn default() -> Self {
        Self {
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            hours: WorkingHours {
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
                end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            },
            slot_duration_minutes: 60,
            break_minutes: 0,
            max_attempts_per_lecture: 50,
            allow_partial_schedules: true,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl SchedulingOptions {
    /// Creates the default Monday-to-Friday, 09:00-17:00 options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working days.
    pub fn with_working_days(mut self, days: Vec<Weekday>) -> Self {
        self.working_days = days;
        self
    }

    /// Sets the working hours.
    pub fn with_hours(mut self, hours: WorkingHours) -> Self {
        self.hours = hours;
        self
    }

    /// Sets the grid slot length.
    pub fn with_slot_duration(mut self, minutes: i64) -> Self {
        self.slot_duration_minutes = minutes;
        self
    }

    /// Sets the inter-slot break.
    pub fn with_break(mut self, minutes: i64) -> Self {
        self.break_minutes = minutes;
        self
    }

    /// Sets the per-lecture attempt budget.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts_per_lecture = attempts;
        self
    }

    /// Enables or disables partial schedules.
    pub fn with_partial_schedules(mut self, allow: bool) -> Self {
        self.allow_partial_schedules = allow;
        self
    }

    /// Sets the optimizer configuration.
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Position of a weekday in the working-day order.
    pub fn day_index(&self, day: Weekday) -> Option<usize> {
        self.working_days.iter().position(|&d| d == day)
    }

    /// Grid slots that fit into one working day.
    pub fn slots_per_day(&self) -> usize {
        let span = self.hours.span_minutes();
        let step = self.slot_duration_minutes + self.break_minutes;
        if self.slot_duration_minutes <= 0 || step <= 0 || span < self.slot_duration_minutes {
            return 0;
        }
        (((span - self.slot_duration_minutes) / step) + 1) as usize
    }
}
