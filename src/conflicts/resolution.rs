//! Ranked conflict resolution strategies and holiday reconciliation.
//!
//! Strategies are tried highest-priority first; each one either
//! repairs a conflict group or passes it through untouched. A strategy
//! that errors is skipped, never fatal. Groups no strategy can repair
//! are reported for manual handling.

use log::warn;
use std::collections::HashSet;
use std::fmt::Debug;
use thiserror::Error;

use super::{group_conflicts, pairwise_kind, ConflictGroup};
use crate::models::{
    exclude_holidays, holiday_weekdays, ConstraintViolation, ScheduleEntry, SchedulingOptions,
    TimeSlot, ViolationKind,
};
use crate::optimizer::{try_move, MoveOutcome};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Error raised by a resolution strategy; the strategy is skipped.
#[derive(Debug, Clone, Error)]
#[error("resolution strategy failed: {0}")]
pub struct ResolutionError(pub String);

/// Counters from one resolution run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionStats {
    /// Conflict groups found.
    pub detected: usize,
    /// Groups repaired by a strategy.
    pub resolved: usize,
    /// Groups reported for manual handling.
    pub unresolved: usize,
}

/// Mutable view a strategy works against.
pub struct ResolutionContext<'a> {
    /// The schedule being repaired.
    pub entries: &'a mut Vec<ScheduleEntry>,
    /// The working slot pool.
    pub pool: &'a [TimeSlot],
    /// Generation options.
    pub options: &'a SchedulingOptions,
}

/// A repair tactic for one conflict group.
pub trait ResolutionStrategy: Debug {
    /// Strategy name.
    fn name(&self) -> &'static str;

    /// Rank; higher runs earlier.
    fn priority(&self) -> i32;

    /// Attempts to repair the group.
    ///
    /// Returns `Ok(true)` when the group no longer conflicts,
    /// `Ok(false)` to pass it to the next strategy.
    fn resolve(
        &self,
        group: &ConflictGroup,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<bool, ResolutionError>;
}

/// Whether a group's members still clash with each other.
fn group_still_conflicts(group: &ConflictGroup, entries: &[ScheduleEntry]) -> bool {
    for (x, &a) in group.entry_indices.iter().enumerate() {
        for &b in &group.entry_indices[x + 1..] {
            if pairwise_kind(&entries[a], &entries[b]).is_some() {
                return true;
            }
        }
    }
    false
}

/// Pool slots matching a duration, in weekday/time order.
fn matching_slots(pool: &[TimeSlot], duration: i64) -> Vec<TimeSlot> {
    let mut slots: Vec<TimeSlot> = pool
        .iter()
        .filter(|s| s.available && s.duration_minutes() == duration)
        .cloned()
        .collect();
    slots.sort_by_key(|s| (s.day.num_days_from_monday(), s.start));
    slots
}

/// Moves conflicting members onto any free alternative slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeShift;

impl ResolutionStrategy for TimeShift {
    fn name(&self) -> &'static str {
        "time-shift"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn resolve(
        &self,
        group: &ConflictGroup,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<bool, ResolutionError> {
        // Keep the first member pinned; relocate the rest as needed.
        for &idx in &group.entry_indices[1..] {
            let clashing = group.entry_indices.iter().any(|&other| {
                other != idx && pairwise_kind(&ctx.entries[idx], &ctx.entries[other]).is_some()
            });
            if !clashing {
                continue;
            }
            let duration = ctx.entries[idx].slot.duration_minutes();
            for slot in matching_slots(ctx.pool, duration) {
                if try_move(ctx.entries, idx, &slot) == MoveOutcome::Moved {
                    break;
                }
            }
        }
        Ok(!group_still_conflicts(group, ctx.entries))
    }
}

/// Hands a session to a substitute teacher.
///
/// Applies only to groups that are purely faculty double-bookings; a
/// batch clash cannot be fixed by changing who teaches. Substitutes
/// must be registered per faculty id — with none, the strategy passes
/// every group through.
#[derive(Debug, Clone, Default)]
pub struct FacultyReassignment {
    substitutes: HashMap<String, Vec<String>>,
}

impl FacultyReassignment {
    /// Creates a reassignment strategy with no substitutes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a substitute for a faculty member.
    pub fn with_substitute(
        mut self,
        faculty_id: impl Into<String>,
        substitute_id: impl Into<String>,
    ) -> Self {
        self.substitutes
            .entry(faculty_id.into())
            .or_default()
            .push(substitute_id.into());
        self
    }
}

impl ResolutionStrategy for FacultyReassignment {
    fn name(&self) -> &'static str {
        "faculty-reassignment"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn resolve(
        &self,
        group: &ConflictGroup,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<bool, ResolutionError> {
        if !group.is_pure_faculty() || self.substitutes.is_empty() {
            return Ok(false);
        }

        for &idx in &group.entry_indices[1..] {
            let clashing = group.entry_indices.iter().any(|&other| {
                other != idx && pairwise_kind(&ctx.entries[idx], &ctx.entries[other]).is_some()
            });
            if !clashing {
                continue;
            }
            let Some(candidates) = self.substitutes.get(&ctx.entries[idx].faculty_id) else {
                continue;
            };
            let slot = ctx.entries[idx].slot.clone();
            let free = candidates.iter().find(|&substitute| {
                ctx.entries
                    .iter()
                    .all(|e| &e.faculty_id != substitute || !e.slot.overlaps(&slot))
            });
            if let Some(substitute) = free {
                ctx.entries[idx].faculty_id = substitute.clone();
            }
        }
        Ok(!group_still_conflicts(group, ctx.entries))
    }
}

/// Splits one session into two half-length sessions on spare slots.
///
/// Needs an even duration and two free half-length slots on the grid;
/// most uniform grids offer none, in which case the strategy passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LectureSplitting;

impl ResolutionStrategy for LectureSplitting {
    fn name(&self) -> &'static str {
        "lecture-splitting"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn resolve(
        &self,
        group: &ConflictGroup,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<bool, ResolutionError> {
        for &idx in group.entry_indices.iter().rev() {
            let duration = ctx.entries[idx].slot.duration_minutes();
            if duration % 2 != 0 {
                continue;
            }
            let half = duration / 2;
            let spare: Vec<TimeSlot> = matching_slots(ctx.pool, half)
                .into_iter()
                .filter(|s| slot_unclaimed(ctx.entries, idx, s))
                .collect();
            if spare.len() < 2 {
                continue;
            }

            let twin = ScheduleEntry {
                slot: spare[1].clone(),
                ..ctx.entries[idx].clone()
            };
            ctx.entries[idx].slot = spare[0].clone();
            ctx.entries.push(twin);
            if !group_still_conflicts(group, ctx.entries) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Whether a slot is free of the entry's batch and faculty.
fn slot_unclaimed(entries: &[ScheduleEntry], idx: usize, slot: &TimeSlot) -> bool {
    let me = &entries[idx];
    entries.iter().enumerate().all(|(i, other)| {
        i == idx
            || !(other.batch_id == me.batch_id || other.faculty_id == me.faculty_id)
            || !other.slot.overlaps(slot)
    })
}

/// Last resort: accepts the first member and stops tracking the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityKeep;

impl ResolutionStrategy for PriorityKeep {
    fn name(&self) -> &'static str {
        "priority-keep"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn resolve(
        &self,
        group: &ConflictGroup,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<bool, ResolutionError> {
        let first = group.entry_indices[0];
        warn!(
            "accepting {} and dropping conflict tracking for {} other session(s)",
            ctx.entries[first].label(),
            group.entry_indices.len() - 1
        );
        Ok(true)
    }
}

/// The standard strategy stack in rank order.
pub fn default_strategies() -> Vec<Box<dyn ResolutionStrategy>> {
    vec![
        Box::new(TimeShift),
        Box::new(FacultyReassignment::new()),
        Box::new(LectureSplitting),
        Box::new(PriorityKeep),
    ]
}

/// Detects conflict groups and runs the strategy stack over each.
///
/// Returns the violations of unrepaired groups plus counters. Groups
/// are re-detected after every successful repair, so a strategy that
/// reshapes the schedule (splitting) cannot leave stale indices
/// behind.
pub fn resolve_conflicts(
    entries: &mut Vec<ScheduleEntry>,
    pool: &[TimeSlot],
    options: &SchedulingOptions,
    strategies: &[Box<dyn ResolutionStrategy>],
) -> (Vec<ConstraintViolation>, ResolutionStats) {
    let mut ranked: Vec<&Box<dyn ResolutionStrategy>> = strategies.iter().collect();
    ranked.sort_by_key(|s| -s.priority());

    let mut stats = ResolutionStats::default();
    let mut remaining = Vec::new();
    let mut abandoned: HashSet<String> = HashSet::new();

    loop {
        let groups = group_conflicts(entries);
        let group = groups
            .into_iter()
            .find(|g| !abandoned.contains(&g.signature(entries)));
        let Some(group) = group else { break };

        let mut repaired = false;
        for strategy in &ranked {
            let mut ctx = ResolutionContext {
                entries: &mut *entries,
                pool,
                options,
            };
            match strategy.resolve(&group, &mut ctx) {
                Ok(true) => {
                    stats.resolved += 1;
                    repaired = true;
                    // An "accepting" strategy (priority-keep) leaves the
                    // overlap in place; stop re-detecting it.
                    if group_still_conflicts(&group, entries) {
                        abandoned.insert(group.signature(entries));
                    }
                    break;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!("strategy '{}' skipped: {err}", strategy.name());
                }
            }
        }

        if !repaired {
            abandoned.insert(group.signature(entries));
            stats.unresolved += 1;
            for (x, &a) in group.entry_indices.iter().enumerate() {
                for &b in &group.entry_indices[x + 1..] {
                    let (ea, eb) = (&entries[a], &entries[b]);
                    match pairwise_kind(ea, eb) {
                        Some(ViolationKind::FacultyConflict) => {
                            remaining.push(ConstraintViolation::faculty_conflict(
                                format!("unresolved: {} vs {}", ea.label(), eb.label()),
                                vec![ea.clone(), eb.clone()],
                            ));
                        }
                        Some(ViolationKind::BatchConflict) => {
                            remaining.push(ConstraintViolation::batch_conflict(
                                format!("unresolved: {} vs {}", ea.label(), eb.label()),
                                vec![ea.clone(), eb.clone()],
                            ));
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    stats.detected = stats.resolved + stats.unresolved;
    (remaining, stats)
}

/// Re-homes entries stranded on holiday-excluded days.
///
/// For every entry pinned to an excluded weekday, the remaining
/// working pool is scanned for a same-duration alternative, nearest
/// day and start time first. Entries with no alternative produce an
/// unresolvable holiday clash with manual-intervention guidance.
pub fn reconcile_holidays(
    entries: &mut Vec<ScheduleEntry>,
    holidays: &[NaiveDate],
    pool: &[TimeSlot],
    options: &SchedulingOptions,
) -> (Vec<ConstraintViolation>, usize) {
    if holidays.is_empty() {
        return (Vec::new(), 0);
    }
    let excluded = holiday_weekdays(holidays);
    let working_pool = exclude_holidays(pool, holidays);
    let mut violations = Vec::new();
    let mut moved = 0usize;

    for idx in 0..entries.len() {
        let day = entries[idx].slot.day;
        if !excluded.contains(&day) {
            continue;
        }

        let duration = entries[idx].slot.duration_minutes();
        let origin_day = day.num_days_from_monday() as i64;
        let origin_start = entries[idx].slot.start_minute();
        let mut candidates = matching_slots(&working_pool, duration);
        candidates.retain(|s| options.working_days.contains(&s.day));
        candidates.sort_by_key(|s| {
            let day_distance = (s.day.num_days_from_monday() as i64 - origin_day).abs();
            day_distance * 24 * 60 + (s.start_minute() - origin_start).abs()
        });

        let mut rehomed = false;
        for slot in candidates {
            if try_move(entries, idx, &slot) == MoveOutcome::Moved {
                moved += 1;
                rehomed = true;
                break;
            }
        }
        if !rehomed {
            let entry = entries[idx].clone();
            violations.push(ConstraintViolation::holiday_clash(
                format!(
                    "{} falls on a holiday and no alternative slot is free; \
                     reassign it manually or extend the working grid",
                    entry.label()
                ),
                vec![entry],
            ));
        }
    }

    (violations, moved)
}
