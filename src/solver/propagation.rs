//! Constraint propagation and search-ordering heuristics.
//!
//! Two filters shrink domains until a fixed point:
//! 1. **Constraint filtering** — a slot leaves a domain when assigning
//!    it would violate an enabled constraint against the schedule
//!    built so far (tested with a synthetic single entry).
//! 2. **Arc consistency** — for every unordered domain pair, a slot
//!    leaves one domain when the other offers no temporally
//!    non-overlapping slot at all. Only time windows are compared
//!    here; identity-based rules stay in the constraints.
//!
//! Rounds repeat until nothing changes or [`MAX_PROPAGATION_ROUNDS`]
//! is hit. The cap is a safety valve against caller-supplied
//! constraint predicates that never stabilize, not a tuning knob.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::domain::DomainStore;
use crate::constraints::ConstraintSet;
use crate::models::ScheduleEntry;

/// Upper bound on propagation rounds within one call.
pub const MAX_PROPAGATION_ROUNDS: usize = 100;

/// Diagnostic counters from propagation.
///
/// Returned by value from every call; the propagator itself keeps no
/// state between calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationStats {
    /// Full filter rounds run.
    pub rounds: usize,
    /// Candidate probes evaluated against the constraint set.
    pub constraint_checks: usize,
    /// Slots removed from domains.
    pub slots_eliminated: usize,
}

impl PropagationStats {
    /// Folds another stats value into this one.
    pub fn absorb(&mut self, other: PropagationStats) {
        self.rounds += other.rounds;
        self.constraint_checks += other.constraint_checks;
        self.slots_eliminated += other.slots_eliminated;
    }
}

/// Stateless propagation engine over a constraint set.
#[derive(Debug, Clone, Copy)]
pub struct Propagator<'a> {
    constraints: &'a ConstraintSet,
}

impl<'a> Propagator<'a> {
    /// Creates a propagator over a constraint set.
    pub fn new(constraints: &'a ConstraintSet) -> Self {
        Self { constraints }
    }

    /// Shrinks the `live` domains to a fixed point.
    ///
    /// `schedule` is the list of entries committed so far; candidate
    /// slots are tested against it one hypothetical entry at a time.
    pub fn propagate(
        &self,
        store: &mut DomainStore,
        live: &[usize],
        schedule: &[ScheduleEntry],
    ) -> PropagationStats {
        let mut stats = PropagationStats::default();

        while stats.rounds < MAX_PROPAGATION_ROUNDS {
            stats.rounds += 1;
            let mut changed = false;

            for &idx in live {
                let removed = self.filter_domain(store, idx, schedule, &mut stats);
                changed |= removed > 0;
            }

            for (i, &a) in live.iter().enumerate() {
                for &b in &live[i + 1..] {
                    changed |= self.revise(store, a, b, &mut stats);
                    changed |= self.revise(store, b, a, &mut stats);
                }
            }

            if !changed {
                break;
            }
        }

        debug!(
            "propagation: {} round(s), {} probe(s), {} slot(s) eliminated",
            stats.rounds, stats.constraint_checks, stats.slots_eliminated
        );
        stats
    }

    /// Re-filters the `remaining` domains after `entry` was committed.
    ///
    /// `schedule` must already contain `entry`. Domains of assigned
    /// variables must not appear in `remaining`; they are never touched.
    pub fn forward_check(
        &self,
        store: &mut DomainStore,
        remaining: &[usize],
        schedule: &[ScheduleEntry],
    ) -> PropagationStats {
        let mut stats = PropagationStats::default();
        for &idx in remaining {
            self.filter_domain(store, idx, schedule, &mut stats);
        }
        stats
    }

    /// Orders a domain's candidates least-constraining first.
    ///
    /// Each candidate is scored by how many slots it would knock out of
    /// the other live domains, estimated with isolated single-entry
    /// probes (candidate alone as the schedule). The estimate ignores
    /// interactions between the other domains, which keeps a decision
    /// quadratic in domain size rather than exponential.
    pub fn order_lcv(
        &self,
        store: &DomainStore,
        var: usize,
        others: &[usize],
        stats: &mut PropagationStats,
    ) -> Vec<usize> {
        let req = store.requirement(var).clone();
        let mut scored: Vec<(usize, usize)> = Vec::with_capacity(store.domain(var).len());

        for &slot_id in store.domain(var).slot_ids() {
            let candidate =
                ScheduleEntry::for_requirement(&req, store.slot(slot_id).clone());
            let hypothetical = [candidate];
            let mut eliminated = 0usize;

            for &other in others {
                if other == var {
                    continue;
                }
                let other_req = store.requirement(other).clone();
                for &other_slot in store.domain(other).slot_ids() {
                    let probe =
                        ScheduleEntry::for_requirement(&other_req, store.slot(other_slot).clone());
                    stats.constraint_checks += 1;
                    if !self.constraints.satisfies(&probe, &hypothetical) {
                        eliminated += 1;
                    }
                }
            }
            scored.push((slot_id, eliminated));
        }

        scored.sort_by_key(|&(_, eliminated)| eliminated);
        trace!(
            "lcv ordering for requirement {}: {} candidate(s)",
            var,
            scored.len()
        );
        scored.into_iter().map(|(slot_id, _)| slot_id).collect()
    }

    /// Removes slots of `idx` that violate the constraints against the
    /// current schedule. Returns the number removed.
    fn filter_domain(
        &self,
        store: &mut DomainStore,
        idx: usize,
        schedule: &[ScheduleEntry],
        stats: &mut PropagationStats,
    ) -> usize {
        let req = store.requirement(idx).clone();
        let mut removed = 0usize;
        let mut pos = 0usize;
        while pos < store.domain(idx).len() {
            let slot_id = store.domain(idx).slot_ids()[pos];
            let candidate = ScheduleEntry::for_requirement(&req, store.slot(slot_id).clone());
            stats.constraint_checks += 1;
            if self.constraints.satisfies(&candidate, schedule) {
                pos += 1;
            } else {
                store.remove_at(idx, pos);
                removed += 1;
                stats.slots_eliminated += 1;
            }
        }
        removed
    }

    /// Arc revision: drops slots of `a` with no temporally compatible
    /// support in `b`. Returns whether anything changed.
    fn revise(
        &self,
        store: &mut DomainStore,
        a: usize,
        b: usize,
        stats: &mut PropagationStats,
    ) -> bool {
        let mut changed = false;
        let mut pos = 0usize;
        while pos < store.domain(a).len() {
            let s1 = store.domain(a).slot_ids()[pos];
            let supported = store
                .domain(b)
                .slot_ids()
                .iter()
                .any(|&s2| !store.slot(s1).overlaps(store.slot(s2)));
            if supported {
                pos += 1;
            } else {
                store.remove_at(a, pos);
                stats.slots_eliminated += 1;
                changed = true;
            }
        }
        changed
    }
}
