//! Conflict detection, grouping, and resolution.
//!
//! Detection scans every unordered pair of entries for faculty and
//! batch double-bookings. Overlapping pairs are absorbed into groups
//! by transitive closure — if A clashes with B and C clashes with
//! either, all three form one group — so a resolution strategy sees
//! the whole tangle at once.

mod resolution;

pub use resolution::{
    default_strategies, reconcile_holidays, resolve_conflicts, FacultyReassignment,
    LectureSplitting, PriorityKeep, ResolutionContext, ResolutionError, ResolutionStats,
    ResolutionStrategy, TimeShift,
};

use crate::models::{ConstraintViolation, ScheduleEntry, ViolationKind};

/// A set of mutually entangled conflicting entries.
#[derive(Debug, Clone)]
pub struct ConflictGroup {
    /// Indices into the entry list, ascending.
    pub entry_indices: Vec<usize>,
    /// Pairwise conflict kinds present in the group.
    pub kinds: Vec<ViolationKind>,
}

impl ConflictGroup {
    /// Whether every pairwise conflict in the group is a faculty
    /// double-booking.
    pub fn is_pure_faculty(&self) -> bool {
        self.kinds.iter().all(|k| *k == ViolationKind::FacultyConflict)
    }

    /// Stable identity of the group, independent of entry order.
    pub fn signature(&self, entries: &[ScheduleEntry]) -> String {
        let mut labels: Vec<String> = self
            .entry_indices
            .iter()
            .map(|&i| entries[i].label())
            .collect();
        labels.sort();
        labels.join(" | ")
    }
}

/// Why two entries clash, if they do.
pub(crate) fn pairwise_kind(a: &ScheduleEntry, b: &ScheduleEntry) -> Option<ViolationKind> {
    if !a.overlaps(b) {
        return None;
    }
    if a.faculty_id == b.faculty_id {
        return Some(ViolationKind::FacultyConflict);
    }
    if a.batch_id == b.batch_id {
        return Some(ViolationKind::BatchConflict);
    }
    None
}

/// Detects every pairwise conflict as a violation.
///
/// Each violation lists both entries, so conflict reporting is
/// symmetric: A appears in B's violation exactly when B appears in
/// A's.
pub fn detect_conflicts(entries: &[ScheduleEntry]) -> Vec<ConstraintViolation> {
    let mut conflicts = Vec::new();
    for i in 0..entries.len() {
        for j in i + 1..entries.len() {
            let (a, b) = (&entries[i], &entries[j]);
            match pairwise_kind(a, b) {
                Some(ViolationKind::FacultyConflict) => {
                    conflicts.push(ConstraintViolation::faculty_conflict(
                        format!(
                            "{} teaches two overlapping sessions: {} and {}",
                            a.faculty_id,
                            a.label(),
                            b.label()
                        ),
                        vec![a.clone(), b.clone()],
                    ));
                }
                Some(ViolationKind::BatchConflict) => {
                    conflicts.push(ConstraintViolation::batch_conflict(
                        format!(
                            "batch {} attends two overlapping sessions: {} and {}",
                            a.batch_id,
                            a.label(),
                            b.label()
                        ),
                        vec![a.clone(), b.clone()],
                    ));
                }
                _ => {}
            }
        }
    }
    conflicts
}

/// Groups conflicting entries by transitive closure.
pub fn group_conflicts(entries: &[ScheduleEntry]) -> Vec<ConflictGroup> {
    let mut assigned = vec![false; entries.len()];
    let mut groups = Vec::new();

    for seed in 0..entries.len() {
        if assigned[seed] {
            continue;
        }
        // Grow the member set until a full scan adds nothing.
        let mut members = vec![seed];
        let mut kinds = Vec::new();
        loop {
            let mut grew = false;
            for candidate in 0..entries.len() {
                if assigned[candidate] || members.contains(&candidate) {
                    continue;
                }
                let linked = members.iter().any(|&m| {
                    pairwise_kind(&entries[m], &entries[candidate]).is_some()
                });
                if linked {
                    members.push(candidate);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }

        if members.len() < 2 {
            continue;
        }
        for &m in &members {
            assigned[m] = true;
        }
        for (x, &a) in members.iter().enumerate() {
            for &b in &members[x + 1..] {
                if let Some(kind) = pairwise_kind(&entries[a], &entries[b]) {
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
            }
        }
        members.sort_unstable();
        groups.push(ConflictGroup {
            entry_indices: members,
            kinds,
        });
    }

    groups
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

    #[test]
    fn test_detects_faculty_conflict() {
        let entries = vec![
            ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            ScheduleEntry::new("B2", "PHY", "F1", slot(Weekday::Mon, 9, 10)),
        ];
        let conflicts = detect_conflicts(&entries);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ViolationKind::FacultyConflict);
    }

    #[test]
    fn test_detects_batch_conflict() {
        let entries = vec![
            ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            ScheduleEntry::new("B1", "PHY", "F2", slot(Weekday::Mon, 9, 10)),
        ];
        let conflicts = detect_conflicts(&entries);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ViolationKind::BatchConflict);
    }

    #[test]
    fn test_conflict_symmetry() {
        let a = ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 11));
        let b = ScheduleEntry::new("B2", "PHY", "F1", slot(Weekday::Mon, 10, 12));
        let forward = detect_conflicts(&[a.clone(), b.clone()]);
        let backward = detect_conflicts(&[b.clone(), a.clone()]);
        assert_eq!(forward.len(), 1);
        assert_eq!(backward.len(), 1);
        // Both orderings implicate both entries
        assert!(forward[0].affected.contains(&a) && forward[0].affected.contains(&b));
        assert!(backward[0].affected.contains(&a) && backward[0].affected.contains(&b));
    }

    #[test]
    fn test_no_conflict_across_days() {
        let entries = vec![
            ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            ScheduleEntry::new("B2", "PHY", "F1", slot(Weekday::Tue, 9, 10)),
        ];
        assert!(detect_conflicts(&entries).is_empty());
    }

    #[test]
    fn test_transitive_grouping() {
        // A-B clash on faculty, B-C clash on batch: one group of three
        let entries = vec![
            ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            ScheduleEntry::new("B2", "PHY", "F1", slot(Weekday::Mon, 9, 10)),
            ScheduleEntry::new("B2", "CHEM", "F3", slot(Weekday::Mon, 9, 10)),
        ];
        let groups = group_conflicts(&entries);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].entry_indices, vec![0, 1, 2]);
        assert!(!groups[0].is_pure_faculty());
    }

    #[test]
    fn test_independent_groups_stay_separate() {
        let entries = vec![
            ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            ScheduleEntry::new("B2", "PHY", "F1", slot(Weekday::Mon, 9, 10)),
            ScheduleEntry::new("B3", "CHEM", "F2", slot(Weekday::Tue, 9, 10)),
            ScheduleEntry::new("B4", "BIO", "F2", slot(Weekday::Tue, 9, 10)),
        ];
        let groups = group_conflicts(&entries);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.is_pure_faculty()));
    }

    #[test]
    fn test_clean_schedule_has_no_groups() {
        let entries = vec![
            ScheduleEntry::new("B1", "MATH", "F1", slot(Weekday::Mon, 9, 10)),
            ScheduleEntry::new("B1", "PHY", "F2", slot(Weekday::Mon, 10, 11)),
        ];
        assert!(group_conflicts(&entries).is_empty());
        assert!(detect_conflicts(&entries).is_empty());
    }
}
