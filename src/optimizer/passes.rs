//! Local-search passes over a feasible schedule.
//!
//! Every pass is best-effort: a session whose proposed target would
//! collide with another commitment stays where it is, and each move is
//! an explicit [`MoveOutcome`] so callers can tell moved from kept.
//! No pass ever changes which lectures exist — only their slots.

use log::trace;

use crate::models::{ScheduleEntry, SchedulingOptions, TimeSlot};
use chrono::Weekday;
use std::collections::HashMap;

/// Gaps longer than this inside a batch's day are worth closing.
const GAP_THRESHOLD_MINUTES: i64 = 120;

/// Minimum rest between a faculty member's consecutive sessions.
const FACULTY_BREAK_MINUTES: i64 = 60;

/// Result of one attempted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The entry now sits on a new slot.
    Moved,
    /// The target was occupied or off-grid; nothing changed.
    Kept,
}

/// Moves `entries[idx]` onto `target` if the slot is free for both the
/// entry's batch and its faculty.
pub fn try_move(entries: &mut [ScheduleEntry], idx: usize, target: &TimeSlot) -> MoveOutcome {
    if entries[idx].slot == *target {
        return MoveOutcome::Kept;
    }
    if !slot_free_for(entries, idx, target) {
        return MoveOutcome::Kept;
    }
    trace!(
        "moving {} to {} {}",
        entries[idx].label(),
        target.day,
        target.start.format("%H:%M")
    );
    entries[idx].slot = target.clone();
    MoveOutcome::Moved
}

/// Whether `target` is bookable for entry `idx` without colliding with
/// any other entry of the same batch or faculty.
fn slot_free_for(entries: &[ScheduleEntry], idx: usize, target: &TimeSlot) -> bool {
    if !target.available {
        return false;
    }
    let me = &entries[idx];
    entries.iter().enumerate().all(|(i, other)| {
        i == idx
            || !(other.batch_id == me.batch_id || other.faculty_id == me.faculty_id)
            || !other.slot.overlaps(target)
    })
}

/// Pool slots on `day` matching `duration`, in chronological order.
fn day_slots<'p>(pool: &'p [TimeSlot], day: Weekday, duration: i64) -> Vec<&'p TimeSlot> {
    let mut slots: Vec<&TimeSlot> = pool
        .iter()
        .filter(|s| s.day == day && s.available && s.duration_minutes() == duration)
        .collect();
    slots.sort_by_key(|s| s.start);
    slots
}

/// Spreads same-subject sessions across the week and evens out batch
/// daily load.
///
/// First pass: a (batch, subject) group holding several sessions on
/// one day pushes the surplus onto working days the group does not use
/// yet, visiting days at roughly `⌈days/count⌉` spacing. Second pass:
/// batches with one day clearly above their average move a session
/// from the heaviest day to the lightest.
pub fn distribute_sessions(
    entries: &mut [ScheduleEntry],
    pool: &[TimeSlot],
    options: &SchedulingOptions,
) -> usize {
    let day_count = options.working_days.len();
    if day_count == 0 {
        return 0;
    }
    let mut moves = 0usize;

    // Same-subject spread.
    let mut groups: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (i, e) in entries.iter().enumerate() {
        groups
            .entry((e.batch_id.clone(), e.subject_id.clone()))
            .or_default()
            .push(i);
    }

    for indices in groups.values() {
        let spacing = day_count.div_ceil(indices.len()).max(1);
        let target_days: Vec<Weekday> = options
            .working_days
            .iter()
            .step_by(spacing)
            .copied()
            .collect();

        let mut used_days: Vec<Weekday> =
            indices.iter().map(|&i| entries[i].slot.day).collect();

        for &i in indices {
            let day = entries[i].slot.day;
            let crowded = used_days.iter().filter(|&&d| d == day).count() > 1;
            if !crowded {
                continue;
            }
            let free_day = target_days
                .iter()
                .chain(options.working_days.iter())
                .copied()
                .find(|d| !used_days.contains(d));
            let Some(new_day) = free_day else {
                continue;
            };
            let duration = entries[i].slot.duration_minutes();
            for candidate in day_slots(pool, new_day, duration) {
                let candidate = candidate.clone();
                if try_move(entries, i, &candidate) == MoveOutcome::Moved {
                    if let Some(pos) = used_days.iter().position(|&d| d == day) {
                        used_days[pos] = new_day;
                    }
                    moves += 1;
                    break;
                }
            }
        }
    }

    // Batch daily-load balancing.
    let batches: Vec<String> = {
        let mut ids: Vec<String> = entries.iter().map(|e| e.batch_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    };
    for batch in batches {
        let day_load = |entries: &[ScheduleEntry], d: Weekday| {
            entries
                .iter()
                .filter(|e| e.batch_id == batch && e.slot.day == d)
                .count()
        };
        let total: usize = options
            .working_days
            .iter()
            .map(|&d| day_load(entries, d))
            .sum();
        let avg = total as f64 / day_count as f64;

        for &heavy in &options.working_days {
            if (day_load(entries, heavy) as f64) <= avg + 1.0 {
                continue;
            }
            let Some(&light) = options
                .working_days
                .iter()
                .min_by_key(|&&d| day_load(entries, d))
            else {
                continue;
            };
            // Latest session of the heavy day is the cheapest to move.
            let candidate_idx = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.batch_id == batch && e.slot.day == heavy)
                .max_by_key(|(_, e)| e.slot.start)
                .map(|(i, _)| i);
            let Some(i) = candidate_idx else { continue };
            let duration = entries[i].slot.duration_minutes();
            for slot in day_slots(pool, light, duration) {
                let slot = slot.clone();
                if try_move(entries, i, &slot) == MoveOutcome::Moved {
                    moves += 1;
                    break;
                }
            }
        }
    }

    moves
}

/// Pulls later sessions earlier to close batch-day gaps exceeding the
/// threshold.
pub fn minimize_gaps(
    entries: &mut [ScheduleEntry],
    pool: &[TimeSlot],
    _options: &SchedulingOptions,
) -> usize {
    let mut moves = 0usize;

    let mut batch_days: Vec<(String, Weekday)> = entries
        .iter()
        .map(|e| (e.batch_id.clone(), e.slot.day))
        .collect();
    batch_days.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.num_days_from_monday().cmp(&b.1.num_days_from_monday())));
    batch_days.dedup();

    for (batch, day) in batch_days {
        loop {
            let mut day_indices: Vec<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.batch_id == batch && e.slot.day == day)
                .map(|(i, _)| i)
                .collect();
            day_indices.sort_by_key(|&i| entries[i].slot.start);

            let mut moved_any = false;
            for w in 1..day_indices.len() {
                let prev_end = entries[day_indices[w - 1]].slot.end_minute();
                let idx = day_indices[w];
                let gap = entries[idx].slot.start_minute() - prev_end;
                if gap <= GAP_THRESHOLD_MINUTES {
                    continue;
                }
                let duration = entries[idx].slot.duration_minutes();
                // Earliest matching slot that still starts after the
                // previous session and before the current position.
                let target = day_slots(pool, day, duration)
                    .into_iter()
                    .find(|s| {
                        s.start_minute() >= prev_end
                            && s.start_minute() < entries[idx].slot.start_minute()
                    })
                    .cloned();
                if let Some(slot) = target {
                    if try_move(entries, idx, &slot) == MoveOutcome::Moved {
                        moves += 1;
                        moved_any = true;
                        break;
                    }
                }
            }
            if !moved_any {
                break;
            }
        }
    }

    moves
}

/// Evens out each faculty member's daily load and enforces the minimum
/// break between their consecutive sessions.
pub fn balance_faculty_load(
    entries: &mut [ScheduleEntry],
    pool: &[TimeSlot],
    options: &SchedulingOptions,
) -> usize {
    let day_count = options.working_days.len();
    if day_count == 0 {
        return 0;
    }
    let mut moves = 0usize;

    let faculties: Vec<String> = {
        let mut ids: Vec<String> = entries.iter().map(|e| e.faculty_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    };

    for faculty in &faculties {
        let day_load = |entries: &[ScheduleEntry], d: Weekday| {
            entries
                .iter()
                .filter(|e| &e.faculty_id == faculty && e.slot.day == d)
                .count()
        };
        let total: usize = options
            .working_days
            .iter()
            .map(|&d| day_load(entries, d))
            .sum();
        let avg = total as f64 / day_count as f64;

        for &heavy in &options.working_days {
            if (day_load(entries, heavy) as f64) <= avg + 0.5 {
                continue;
            }
            let Some(&light) = options
                .working_days
                .iter()
                .min_by_key(|&&d| day_load(entries, d))
            else {
                continue;
            };
            let candidate_idx = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| &e.faculty_id == faculty && e.slot.day == heavy)
                .max_by_key(|(_, e)| e.slot.start)
                .map(|(i, _)| i);
            let Some(i) = candidate_idx else { continue };
            let duration = entries[i].slot.duration_minutes();
            for slot in day_slots(pool, light, duration) {
                let slot = slot.clone();
                if try_move(entries, i, &slot) == MoveOutcome::Moved {
                    moves += 1;
                    break;
                }
            }
        }

        // Minimum break between consecutive sessions.
        for &day in &options.working_days {
            let mut day_indices: Vec<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| &e.faculty_id == faculty && e.slot.day == day)
                .map(|(i, _)| i)
                .collect();
            day_indices.sort_by_key(|&i| entries[i].slot.start);

            for w in 1..day_indices.len() {
                let prev_end = entries[day_indices[w - 1]].slot.end_minute();
                let idx = day_indices[w];
                let rest = entries[idx].slot.start_minute() - prev_end;
                if rest >= FACULTY_BREAK_MINUTES || rest < 0 {
                    continue;
                }
                let duration = entries[idx].slot.duration_minutes();
                // Same day after the break, then anywhere else.
                let same_day = day_slots(pool, day, duration)
                    .into_iter()
                    .find(|s| s.start_minute() >= prev_end + FACULTY_BREAK_MINUTES)
                    .cloned();
                let target = same_day.or_else(|| {
                    options
                        .working_days
                        .iter()
                        .filter(|&&d| d != day)
                        .flat_map(|&d| day_slots(pool, d, duration).into_iter().cloned().collect::<Vec<_>>())
                        .next()
                });
                if let Some(slot) = target {
                    if try_move(entries, idx, &slot) == MoveOutcome::Moved {
                        moves += 1;
                    }
                }
            }
        }
    }

    // Repair any same-faculty overlap by moving one side to the first
    // free slot anywhere in the working week.
    loop {
        let clash = find_faculty_overlap(entries);
        let Some(idx) = clash else { break };
        let duration = entries[idx].slot.duration_minutes();
        let target = options
            .working_days
            .iter()
            .flat_map(|&d| day_slots(pool, d, duration).into_iter().cloned().collect::<Vec<_>>())
            .find(|s| slot_free_for(entries, idx, s));
        match target {
            Some(slot) => {
                if try_move(entries, idx, &slot) == MoveOutcome::Moved {
                    moves += 1;
                } else {
                    break;
                }
            }
            None => break,
        }
    }

    moves
}

/// Index of the later member of the first same-faculty overlap.
fn find_faculty_overlap(entries: &[ScheduleEntry]) -> Option<usize> {
    for i in 0..entries.len() {
        for j in i + 1..entries.len() {
            if entries[i].faculty_id == entries[j].faculty_id
                && entries[i].overlaps(&entries[j])
            {
                let later = if entries[j].slot.start >= entries[i].slot.start {
                    j
                } else {
                    i
                };
                return Some(later);
            }
        }
    }
    None
}

/// Stable-sorts entries by start time; the slots themselves stay put.
pub fn sort_by_morning(entries: &mut [ScheduleEntry]) {
    entries.sort_by_key(|e| e.slot.start);
}
