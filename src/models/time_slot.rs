//! Time slot model and weekly slot-pool construction.
//!
//! A timetable week is discretized into fixed slots: for each working
//! day, slots of `slot_minutes` length are laid out between the working
//! hours, separated by an optional break. Holidays remove whole days
//! from the pool.
//!
//! # Time Model
//! Slots are anchored to a weekday and a time of day; the schedule is
//! weekly-recurring, so no absolute dates appear here. Holidays are
//! absolute dates and are mapped onto the weekday they fall on.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// A bookable slot in the weekly grid.
///
/// Half-open in time: a slot `[start, end)` does not overlap a slot
/// starting exactly at its end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Day of week this slot recurs on.
    pub day: Weekday,
    /// Slot start (inclusive).
    pub start: NaiveTime,
    /// Slot end (exclusive).
    pub end: NaiveTime,
    /// Whether the slot may still be booked. Callers clear this to
    /// blank out individual slots (room maintenance, reserved hours)
    /// without rebuilding the pool.
    pub available: bool,
}

impl TimeSlot {
    /// Creates an available slot.
    pub fn new(day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            day,
            start,
            end,
            available: true,
        }
    }

    /// Marks the slot unavailable.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Slot length in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Minutes since midnight of the slot start.
    #[inline]
    pub fn start_minute(&self) -> i64 {
        self.start.num_seconds_from_midnight() as i64 / 60
    }

    /// Minutes since midnight of the slot end.
    #[inline]
    pub fn end_minute(&self) -> i64 {
        self.end.num_seconds_from_midnight() as i64 / 60
    }

    /// Whether two slots occupy overlapping time on the same day.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.day == other.day && self.start < other.end && other.start < self.end
    }
}

fn time_at_minute(minute: i64) -> Option<NaiveTime> {
    if !(0..=24 * 60).contains(&minute) {
        return None;
    }
    NaiveTime::from_num_seconds_from_midnight_opt((minute * 60) as u32, 0)
}

/// Builds the weekly slot pool.
///
/// Lays out slots of `slot_minutes` between `start` and `end` on every
/// working day, leaving `break_minutes` between consecutive slots. A
/// slot is only emitted if it fits entirely before `end`.
///
/// Days keep the order given by the caller; slots within a day are in
/// chronological order.
pub fn build_slot_pool(
    working_days: &[Weekday],
    start: NaiveTime,
    end: NaiveTime,
    slot_minutes: i64,
    break_minutes: i64,
) -> Vec<TimeSlot> {
    let day_start = start.num_seconds_from_midnight() as i64 / 60;
    let day_end = end.num_seconds_from_midnight() as i64 / 60;
    if slot_minutes <= 0 || break_minutes < 0 || day_end <= day_start {
        return Vec::new();
    }

    let mut pool = Vec::new();
    for &day in working_days {
        let mut cursor = day_start;
        while cursor + slot_minutes <= day_end {
            let (Some(s), Some(e)) = (time_at_minute(cursor), time_at_minute(cursor + slot_minutes))
            else {
                break;
            };
            pool.push(TimeSlot::new(day, s, e));
            cursor += slot_minutes + break_minutes;
        }
    }
    pool
}

/// Weekdays covered by a holiday list.
///
/// Duplicate dates on the same weekday collapse to one entry; order
/// follows first occurrence.
pub fn holiday_weekdays(holidays: &[NaiveDate]) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = Vec::new();
    for date in holidays {
        let wd = date.weekday();
        if !days.contains(&wd) {
            days.push(wd);
        }
    }
    days
}

/// Removes every slot that falls on a holiday's weekday.
///
/// An empty holiday list returns the pool unchanged.
pub fn exclude_holidays(slots: &[TimeSlot], holidays: &[NaiveDate]) -> Vec<TimeSlot> {
    if holidays.is_empty() {
        return slots.to_vec();
    }
    let excluded = holiday_weekdays(holidays);
    slots
        .iter()
        .filter(|s| !excluded.contains(&s.day))
        .cloned()
        .collect()
}
