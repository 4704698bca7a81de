//! Schedule quality metrics.
//!
//! Four criteria, each normalized to `[0, 1]` with 1 best:
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Distribution | Same-subject sessions spread over distinct days |
//! | Gaps | Idle time inside a batch's day |
//! | Balance | Evenness of each faculty's daily session counts |
//! | Morning | Fraction of sessions starting in the first half-day |
//!
//! The weighted score averages the enabled criteria by their weights.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{ScheduleEntry, SchedulingOptions};

/// Per-criterion and weighted schedule scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    /// Same-subject spread across the week.
    pub distribution: f64,
    /// Idle-gap score per batch-day.
    pub gaps: f64,
    /// Faculty daily-load balance.
    pub balance: f64,
    /// Morning-start preference.
    pub morning: f64,
    /// Weighted mean of the enabled criteria.
    pub weighted: f64,
}

impl OptimizationMetrics {
    /// Computes all metrics for a schedule.
    ///
    /// An empty schedule scores 1.0 everywhere: there is nothing left
    /// to improve.
    pub fn evaluate(entries: &[ScheduleEntry], options: &SchedulingOptions) -> Self {
        let distribution = distribution_score(entries, options);
        let gaps = gap_score(entries);
        let balance = balance_score(entries, options);
        let morning = morning_score(entries, options);

        let config = &options.optimizer;
        let mut weight_sum = 0.0;
        let mut score_sum = 0.0;
        for (enabled, weight, score) in [
            (config.distribution_enabled, config.distribution_weight, distribution),
            (config.gap_enabled, config.gap_weight, gaps),
            (config.balance_enabled, config.balance_weight, balance),
            (config.morning_enabled, config.morning_weight, morning),
        ] {
            if enabled && weight > 0.0 {
                weight_sum += weight;
                score_sum += weight * score;
            }
        }
        let weighted = if weight_sum > 0.0 {
            score_sum / weight_sum
        } else {
            1.0
        };

        Self {
            distribution,
            gaps,
            balance,
            morning,
            weighted,
        }
    }
}

/// Ratio of distinct days used to the best achievable spread, averaged
/// over (batch, subject) groups.
fn distribution_score(entries: &[ScheduleEntry], options: &SchedulingOptions) -> f64 {
    if entries.is_empty() || options.working_days.is_empty() {
        return 1.0;
    }

    let mut groups: HashMap<(&str, &str), Vec<&ScheduleEntry>> = HashMap::new();
    for e in entries {
        groups
            .entry((e.batch_id.as_str(), e.subject_id.as_str()))
            .or_default()
            .push(e);
    }

    let day_count = options.working_days.len();
    let mut total = 0.0;
    for group in groups.values() {
        let mut days: Vec<_> = group.iter().map(|e| e.slot.day).collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        let achievable = group.len().min(day_count);
        total += days.len() as f64 / achievable as f64;
    }
    total / groups.len() as f64
}

/// One minus the idle fraction of each batch-day span, averaged over
/// batch-days with at least two sessions.
fn gap_score(entries: &[ScheduleEntry]) -> f64 {
    let mut days: HashMap<(&str, chrono::Weekday), Vec<&ScheduleEntry>> = HashMap::new();
    for e in entries {
        days.entry((e.batch_id.as_str(), e.slot.day))
            .or_default()
            .push(e);
    }

    let mut scored = 0usize;
    let mut total = 0.0;
    for sessions in days.values_mut() {
        if sessions.len() < 2 {
            continue;
        }
        sessions.sort_by_key(|e| e.slot.start);
        let span =
            sessions[sessions.len() - 1].slot.end_minute() - sessions[0].slot.start_minute();
        let idle: i64 = sessions
            .windows(2)
            .map(|w| (w[1].slot.start_minute() - w[0].slot.end_minute()).max(0))
            .sum();
        if span > 0 {
            total += 1.0 - idle as f64 / span as f64;
            scored += 1;
        }
    }

    if scored == 0 {
        1.0
    } else {
        total / scored as f64
    }
}

/// One minus the normalized absolute deviation of each faculty's daily
/// session counts, averaged over faculties.
fn balance_score(entries: &[ScheduleEntry], options: &SchedulingOptions) -> f64 {
    if entries.is_empty() || options.working_days.is_empty() {
        return 1.0;
    }

    let mut per_faculty: HashMap<&str, HashMap<chrono::Weekday, usize>> = HashMap::new();
    for e in entries {
        *per_faculty
            .entry(e.faculty_id.as_str())
            .or_default()
            .entry(e.slot.day)
            .or_insert(0) += 1;
    }

    let day_count = options.working_days.len();
    let mut total = 0.0;
    for counts in per_faculty.values() {
        let sessions: usize = counts.values().sum();
        let avg = sessions as f64 / day_count as f64;
        let deviation: f64 = options
            .working_days
            .iter()
            .map(|d| (counts.get(d).copied().unwrap_or(0) as f64 - avg).abs())
            .sum();
        // Worst case piles everything on one day: deviation = 2·sessions·(1 - 1/days)
        let worst = 2.0 * sessions as f64 * (1.0 - 1.0 / day_count as f64);
        total += if worst > 0.0 {
            1.0 - (deviation / worst).min(1.0)
        } else {
            1.0
        };
    }
    total / per_faculty.len() as f64
}

/// Fraction of sessions starting no later than the working-day midpoint.
fn morning_score(entries: &[ScheduleEntry], options: &SchedulingOptions) -> f64 {
    if entries.is_empty() {
        return 1.0;
    }
    let midpoint = options.hours.midpoint_minute();
    let morning = entries
        .iter()
        .filter(|e| e.slot.start_minute() <= midpoint)
        .count();
    morning as f64 / entries.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSlot;
    use chrono::{NaiveTime, Weekday};

    fn slot(day: Weekday, sh: u32, eh: u32) -> TimeSlot {
        TimeSlot::new(
            day,
            NaiveTime::from_hms_opt(sh, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(eh, 0, 0).unwrap(),
        )
    }

    fn entry(batch: &str, subject: &str, faculty: &str, s: TimeSlot) -> ScheduleEntry {
        ScheduleEntry::new(batch, subject, faculty, s)
    }

    #[test]
    fn test_perfect_distribution() {
        // Five sessions, one per working day
        let days = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];
        let entries: Vec<_> = days
            .iter()
            .map(|&d| entry("B1", "MATH", "F1", slot(d, 9, 10)))
            .collect();
        let score = distribution_score(&entries, &SchedulingOptions::default());
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clumped_distribution() {
        let entries = vec![
            entry("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            entry("B1", "MATH", "F1", slot(Weekday::Mon, 10, 11)),
            entry("B1", "MATH", "F1", slot(Weekday::Mon, 11, 12)),
        ];
        let score = distribution_score(&entries, &SchedulingOptions::default());
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_more_sessions_than_days_can_still_score_one() {
        // Six sessions on five days: best achievable is five distinct days
        let mut entries: Vec<_> = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .iter()
            .map(|&d| entry("B1", "MATH", "F1", slot(d, 9, 10)))
            .collect();
        entries.push(entry("B1", "MATH", "F1", slot(Weekday::Mon, 10, 11)));
        let score = distribution_score(&entries, &SchedulingOptions::default());
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_score_contiguous_day() {
        let entries = vec![
            entry("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            entry("B1", "PHY", "F2", slot(Weekday::Mon, 10, 11)),
        ];
        assert!((gap_score(&entries) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_score_with_hole() {
        // 09-10 and 13-14: span 300, idle 180
        let entries = vec![
            entry("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            entry("B1", "PHY", "F2", slot(Weekday::Mon, 13, 14)),
        ];
        assert!((gap_score(&entries) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_balance_even_vs_piled() {
        let even: Vec<_> = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .iter()
            .map(|&d| entry("B1", "MATH", "F1", slot(d, 9, 10)))
            .collect();
        let piled: Vec<_> = (9..14)
            .map(|h| entry("B1", "MATH", "F1", slot(Weekday::Mon, h, h + 1)))
            .collect();
        let options = SchedulingOptions::default();
        let even_score = balance_score(&even, &options);
        let piled_score = balance_score(&piled, &options);
        assert!((even_score - 1.0).abs() < 1e-9);
        assert!(piled_score < even_score);
        assert!(piled_score.abs() < 1e-9); // worst case bottoms out at 0
    }

    #[test]
    fn test_morning_score() {
        // Midpoint of 09:00-17:00 is 13:00
        let entries = vec![
            entry("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            entry("B1", "PHY", "F2", slot(Weekday::Mon, 15, 16)),
        ];
        let score = morning_score(&entries, &SchedulingOptions::default());
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_uses_enabled_only() {
        let entries = vec![
            entry("B1", "MATH", "F1", slot(Weekday::Mon, 15, 16)), // afternoon
        ];
        let mut options = SchedulingOptions::default();
        options.optimizer.distribution_enabled = false;
        options.optimizer.gap_enabled = false;
        options.optimizer.balance_enabled = false;
        // Only morning remains; single afternoon session scores 0
        let metrics = OptimizationMetrics::evaluate(&entries, &options);
        assert!(metrics.weighted.abs() < 1e-9);
    }

    #[test]
    fn test_empty_schedule_scores_one() {
        let metrics = OptimizationMetrics::evaluate(&[], &SchedulingOptions::default());
        assert!((metrics.weighted - 1.0).abs() < 1e-9);
    }
}
