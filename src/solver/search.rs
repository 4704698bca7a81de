//! Backtracking search over lecture domains.
//!
//! Depth-first search with MRV variable selection, LCV value ordering,
//! and forward checking after every commitment. The recursion is
//! expressed as an explicit frame stack, so depth is bounded by a
//! vector and the global attempt budget is enforced between candidate
//! evaluations.
//!
//! # Failure Handling
//! A requirement that cannot be placed — empty domain, no consistent
//! candidate with nothing left to backtrack over, or a spent attempt
//! budget — is recorded with a reason and skipped; the search carries
//! on with the remaining requirements. The caller decides whether a
//! partial result is acceptable.

use log::{debug, trace};

use super::domain::DomainStore;
use super::propagation::{PropagationStats, Propagator};
use crate::constraints::ConstraintSet;
use crate::models::{ScheduleEntry, UnscheduledLecture};

/// Counters from one search run, returned by value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Candidate evaluations performed.
    pub attempts: usize,
    /// Commitments undone.
    pub backtracks: usize,
    /// Aggregated propagation counters (forward checks and LCV probes).
    pub propagation: PropagationStats,
}

/// Result of one search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Entries placed, in commitment order.
    pub entries: Vec<ScheduleEntry>,
    /// Requirements that could not be placed, with reasons.
    pub unscheduled: Vec<UnscheduledLecture>,
    /// Search counters.
    pub stats: SearchStats,
}

impl SearchOutcome {
    /// Whether every requirement was placed.
    pub fn is_complete(&self) -> bool {
        self.unscheduled.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarState {
    Pending,
    Assigned,
    Skipped,
}

/// One decision point on the search stack.
#[derive(Debug)]
struct Frame {
    /// Variable (domain index) this frame decides.
    var: usize,
    /// LCV-ordered candidate slot ids.
    candidates: Vec<usize>,
    /// Next candidate to try.
    next: usize,
    /// Trail mark taken before any of this frame's removals.
    mark: usize,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    SelectVariable,
    Advance,
}

/// The CSP search engine.
pub struct SearchEngine<'a> {
    constraints: &'a ConstraintSet,
    max_attempts_per_lecture: usize,
    allow_partial: bool,
}

impl<'a> SearchEngine<'a> {
    /// Creates a search engine.
    pub fn new(
        constraints: &'a ConstraintSet,
        max_attempts_per_lecture: usize,
        allow_partial: bool,
    ) -> Self {
        Self {
            constraints,
            max_attempts_per_lecture,
            allow_partial,
        }
    }

    /// Runs the search to completion over a prepared domain store.
    ///
    /// The store must already have been propagated once; the engine
    /// owns it (and its trail) for the duration of the call.
    pub fn search(&self, store: &mut DomainStore) -> SearchOutcome {
        let total = store.len();
        let budget = self.max_attempts_per_lecture.saturating_mul(total);
        let propagator = Propagator::new(self.constraints);

        let mut state = vec![VarState::Pending; total];
        let mut entries: Vec<ScheduleEntry> = Vec::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut unscheduled: Vec<UnscheduledLecture> = Vec::new();
        let mut stats = SearchStats::default();
        let mut step = Step::SelectVariable;

        loop {
            match step {
                Step::SelectVariable => {
                    if stats.attempts >= budget {
                        self.exhaust_pending(store, &state, &mut unscheduled, stats.attempts);
                        break;
                    }

                    let live = pending(&state);
                    if live.is_empty() {
                        break;
                    }

                    // MRV: live is non-empty, so a variable always exists.
                    let Some(var) = store.select_mrv(live.iter().copied()) else {
                        break;
                    };

                    if store.domain(var).is_empty() {
                        if frames.is_empty() {
                            let keep_going = self.record_unplaceable(
                                store,
                                var,
                                "no slot can hold this session (domain empty)",
                                &mut state,
                                &mut unscheduled,
                            );
                            if !keep_going {
                                break;
                            }
                            continue;
                        }
                        // A previous commitment emptied this domain.
                        Self::uncommit_top(&frames, store, &mut entries, &mut state, &mut stats);
                        step = Step::Advance;
                        continue;
                    }

                    let others: Vec<usize> =
                        live.iter().copied().filter(|&v| v != var).collect();
                    let candidates =
                        propagator.order_lcv(store, var, &others, &mut stats.propagation);
                    trace!(
                        "selected requirement {} ({} candidate(s), {} live)",
                        var,
                        candidates.len(),
                        live.len()
                    );
                    frames.push(Frame {
                        var,
                        candidates,
                        next: 0,
                        mark: store.mark(),
                    });
                    step = Step::Advance;
                }

                Step::Advance => {
                    let Some(top) = frames.last_mut() else {
                        step = Step::SelectVariable;
                        continue;
                    };

                    let mut placed = false;
                    while top.next < top.candidates.len() && stats.attempts < budget {
                        let slot_id = top.candidates[top.next];
                        top.next += 1;
                        stats.attempts += 1;

                        let entry = ScheduleEntry::for_requirement(
                            store.requirement(top.var),
                            store.slot(slot_id).clone(),
                        );
                        if self.constraints.first_violation(&entry, &entries).is_some() {
                            continue;
                        }

                        entries.push(entry);
                        state[top.var] = VarState::Assigned;

                        let remaining = pending(&state);
                        stats
                            .propagation
                            .absorb(propagator.forward_check(store, &remaining, &entries));
                        if store.all_nonempty(remaining.iter().copied()) {
                            placed = true;
                            break;
                        }

                        // Wipeout: undo this commitment and try the next value.
                        store.undo_to(top.mark);
                        entries.pop();
                        state[top.var] = VarState::Pending;
                        stats.backtracks += 1;
                    }

                    if placed {
                        step = Step::SelectVariable;
                        continue;
                    }
                    if stats.attempts >= budget {
                        step = Step::SelectVariable;
                        continue;
                    }

                    // Candidates exhausted for this frame.
                    let dead = match frames.pop() {
                        Some(frame) => frame,
                        None => {
                            step = Step::SelectVariable;
                            continue;
                        }
                    };
                    if frames.is_empty() {
                        if self.record_unplaceable(
                            store,
                            dead.var,
                            "no consistent slot under the current constraints",
                            &mut state,
                            &mut unscheduled,
                        ) {
                            step = Step::SelectVariable;
                            continue;
                        }
                        break;
                    }
                    // Undo the parent's commitment and try its next value.
                    Self::uncommit_top(&frames, store, &mut entries, &mut state, &mut stats);
                }
            }
        }

        debug!(
            "search finished: {} placed, {} unscheduled, {} attempt(s), {} backtrack(s)",
            entries.len(),
            unscheduled.len(),
            stats.attempts,
            stats.backtracks
        );
        SearchOutcome {
            entries,
            unscheduled,
            stats,
        }
    }

    /// Undoes the commitment held by the top frame.
    fn uncommit_top(
        frames: &[Frame],
        store: &mut DomainStore,
        entries: &mut Vec<ScheduleEntry>,
        state: &mut [VarState],
        stats: &mut SearchStats,
    ) {
        if let Some(top) = frames.last() {
            store.undo_to(top.mark);
            entries.pop();
            state[top.var] = VarState::Pending;
            stats.backtracks += 1;
        }
    }

    /// Records a requirement as unplaceable.
    ///
    /// Returns `true` when the search should continue (partial
    /// schedules allowed); `false` stops the run so the caller can
    /// fail it outright.
    fn record_unplaceable(
        &self,
        store: &DomainStore,
        var: usize,
        reason: &str,
        state: &mut [VarState],
        unscheduled: &mut Vec<UnscheduledLecture>,
    ) -> bool {
        debug!(
            "requirement {} unplaceable: {reason}",
            store.requirement(var).label()
        );
        state[var] = VarState::Skipped;
        unscheduled.push(UnscheduledLecture {
            requirement: store.requirement(var).clone(),
            reason: reason.to_string(),
        });
        self.allow_partial
    }

    /// Marks every still-pending requirement as unscheduled once the
    /// attempt budget is spent.
    fn exhaust_pending(
        &self,
        store: &DomainStore,
        state: &[VarState],
        unscheduled: &mut Vec<UnscheduledLecture>,
        attempts: usize,
    ) {
        for var in pending(state) {
            unscheduled.push(UnscheduledLecture {
                requirement: store.requirement(var).clone(),
                reason: format!("search attempt budget exhausted after {attempts} evaluations"),
            });
        }
    }
}

fn pending(state: &[VarState]) -> Vec<usize> {
    state
        .iter()
        .enumerate()
        .filter(|(_, &s)| s == VarState::Pending)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{ConstraintSet, FacultyConflictConstraint};
    use crate::models::{build_slot_pool, LectureRequirement, TimeSlot};
    use chrono::{NaiveTime, Weekday};

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn req(id: usize, faculty: &str, duration: i64) -> LectureRequirement {
        LectureRequirement {
            id,
            batch_id: "B1".into(),
            subject_id: format!("S{id}"),
            faculty_id: faculty.into(),
            duration_minutes: duration,
        }
    }

    fn pool() -> Vec<TimeSlot> {
        build_slot_pool(&[Weekday::Mon], t(9), t(13), 60, 0)
    }

    fn engine(constraints: &ConstraintSet) -> SearchEngine<'_> {
        SearchEngine::new(constraints, 50, true)
    }

    #[test]
    fn test_places_all_when_feasible() {
        let constraints = ConstraintSet::new().with_constraint(FacultyConflictConstraint);
        let reqs = vec![req(0, "F1", 60), req(1, "F1", 60), req(2, "F1", 60)];
        let mut store = DomainStore::new(pool(), reqs);

        let outcome = engine(&constraints).search(&mut store);

        assert!(outcome.is_complete());
        assert_eq!(outcome.entries.len(), 3);
        // Same faculty: no two entries overlap
        for (i, a) in outcome.entries.iter().enumerate() {
            for b in &outcome.entries[i + 1..] {
                assert!(!a.overlaps(b), "{} overlaps {}", a.label(), b.label());
            }
        }
    }

    #[test]
    fn test_search_soundness() {
        let constraints = ConstraintSet::new().with_constraint(FacultyConflictConstraint);
        let reqs: Vec<_> = (0..4).map(|i| req(i, "F1", 60)).collect();
        let mut store = DomainStore::new(pool(), reqs);

        let outcome = engine(&constraints).search(&mut store);
        assert!(outcome.is_complete());

        // Every entry satisfies every constraint against the rest
        for (i, entry) in outcome.entries.iter().enumerate() {
            let rest: Vec<ScheduleEntry> = outcome
                .entries
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, e)| e.clone())
                .collect();
            assert!(constraints.satisfies(entry, &rest));
        }
    }

    #[test]
    fn test_overloaded_faculty_reports_unscheduled() {
        // Five same-faculty sessions into a four-slot day: exactly one
        // requirement must come back unscheduled, never double-booked.
        let constraints = ConstraintSet::new().with_constraint(FacultyConflictConstraint);
        let reqs: Vec<_> = (0..5).map(|i| req(i, "F1", 60)).collect();
        let mut store = DomainStore::new(pool(), reqs);

        let outcome = engine(&constraints).search(&mut store);

        assert_eq!(outcome.entries.len(), 4);
        assert_eq!(outcome.unscheduled.len(), 1);
        for (i, a) in outcome.entries.iter().enumerate() {
            for b in &outcome.entries[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_single_shared_slot_never_double_books() {
        // Two same-faculty sessions with one slot between them: one is
        // placed, the other reported unscheduled.
        let one_slot_pool = build_slot_pool(&[Weekday::Mon], t(9), t(10), 60, 0);
        let constraints = ConstraintSet::new().with_constraint(FacultyConflictConstraint);
        let reqs = vec![req(0, "F1", 60), req(1, "F1", 60)];
        let mut store = DomainStore::new(one_slot_pool, reqs);

        let outcome = engine(&constraints).search(&mut store);

        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.unscheduled.len(), 1);
    }

    #[test]
    fn test_oversized_requirement_skipped_without_attempts() {
        let constraints = ConstraintSet::new();
        // 90-minute session, 60-minute slots: empty domain from the start
        let mut store = DomainStore::new(pool(), vec![req(0, "F1", 90)]);

        let outcome = engine(&constraints).search(&mut store);

        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.unscheduled.len(), 1);
        assert_eq!(outcome.stats.attempts, 0);
        assert!(outcome.unscheduled[0].reason.contains("domain empty"));
    }

    #[test]
    fn test_backtracking_finds_arrangement() {
        // Two same-faculty sessions on a two-slot day: the only legal
        // packing uses both slots exactly once.
        let two_slot_pool = build_slot_pool(&[Weekday::Mon], t(9), t(11), 60, 0);
        let constraints = ConstraintSet::new().with_constraint(FacultyConflictConstraint);
        let reqs = vec![req(0, "F1", 60), req(1, "F1", 60)];
        let mut store = DomainStore::new(two_slot_pool, reqs);

        let outcome = engine(&constraints).search(&mut store);
        assert!(outcome.is_complete());
        assert_ne!(outcome.entries[0].slot.start, outcome.entries[1].slot.start);
    }

    #[test]
    fn test_empty_problem() {
        let constraints = ConstraintSet::new();
        let mut store = DomainStore::new(pool(), vec![]);
        let outcome = engine(&constraints).search(&mut store);
        assert!(outcome.is_complete());
        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.stats.attempts, 0);
    }

    #[test]
    fn test_attempt_budget_bounds_search() {
        let constraints = ConstraintSet::new().with_constraint(FacultyConflictConstraint);
        let reqs: Vec<_> = (0..6).map(|i| req(i, "F1", 60)).collect();
        let mut store = DomainStore::new(pool(), reqs);

        // Budget of 1 per lecture: 6 evaluations total
        let tight = SearchEngine::new(&constraints, 1, true);
        let outcome = tight.search(&mut store);

        assert!(outcome.stats.attempts <= 6);
        assert_eq!(outcome.entries.len() + outcome.unscheduled.len(), 6);
    }
}
