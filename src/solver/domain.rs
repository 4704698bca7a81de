//! Domain arena with trailed, O(changes) backtracking.
//!
//! One domain per lecture requirement holds the slot-pool indices still
//! consistent with everything propagated so far. Removals are recorded
//! on a trail; [`DomainStore::undo_to`] restores them in reverse order,
//! so backtracking costs as much as the work being undone instead of a
//! full domain copy.
//!
//! # Invariants
//! - A domain only shrinks between two trail marks.
//! - `undo_to(mark)` restores the exact pre-mark state: removals are
//!   re-inserted at their recorded positions in reverse order.

use crate::models::{LectureRequirement, TimeSlot};

/// Candidate slots still legal for one requirement.
#[derive(Debug, Clone)]
pub struct Domain {
    /// Requirement (and arena index) this domain belongs to.
    pub lecture: usize,
    /// Indices into the slot pool, in pool order.
    slots: Vec<usize>,
    /// Pool size the domain started from, for diagnostics.
    pub original_len: usize,
}

impl Domain {
    /// Remaining candidate count.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no candidate is left.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remaining pool indices.
    #[inline]
    pub fn slot_ids(&self) -> &[usize] {
        &self.slots
    }
}

/// One trailed removal.
#[derive(Debug, Clone, Copy)]
struct Removal {
    domain: usize,
    slot: usize,
    position: usize,
}

/// Arena of domains over a shared slot pool.
///
/// Owns the pool, the requirements, and the undo trail. The search
/// engine holds exactly one store per generation call.
#[derive(Debug, Clone)]
pub struct DomainStore {
    pool: Vec<TimeSlot>,
    requirements: Vec<LectureRequirement>,
    domains: Vec<Domain>,
    trail: Vec<Removal>,
}

impl DomainStore {
    /// Builds one domain per requirement.
    ///
    /// Each domain starts from every pool slot long enough to hold the
    /// requirement's session. A requirement longer than every slot gets
    /// an empty domain from the start.
    pub fn new(pool: Vec<TimeSlot>, requirements: Vec<LectureRequirement>) -> Self {
        let domains = requirements
            .iter()
            .map(|req| {
                let slots: Vec<usize> = pool
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.available && s.duration_minutes() >= req.duration_minutes)
                    .map(|(i, _)| i)
                    .collect();
                Domain {
                    lecture: req.id,
                    original_len: slots.len(),
                    slots,
                }
            })
            .collect();
        Self {
            pool,
            requirements,
            domains,
            trail: Vec::new(),
        }
    }

    /// The slot pool.
    #[inline]
    pub fn pool(&self) -> &[TimeSlot] {
        &self.pool
    }

    /// Slot by pool index.
    #[inline]
    pub fn slot(&self, id: usize) -> &TimeSlot {
        &self.pool[id]
    }

    /// The requirements, in search order.
    #[inline]
    pub fn requirements(&self) -> &[LectureRequirement] {
        &self.requirements
    }

    /// Requirement by index.
    #[inline]
    pub fn requirement(&self, idx: usize) -> &LectureRequirement {
        &self.requirements[idx]
    }

    /// Number of domains.
    #[inline]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether the store holds no domains.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Domain by index.
    #[inline]
    pub fn domain(&self, idx: usize) -> &Domain {
        &self.domains[idx]
    }

    /// Current trail position; pass to [`undo_to`](Self::undo_to) to
    /// roll back everything recorded after this call.
    #[inline]
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Removes the slot at `position` within domain `idx`, recording it
    /// on the trail.
    pub fn remove_at(&mut self, idx: usize, position: usize) {
        let slot = self.domains[idx].slots.remove(position);
        self.trail.push(Removal {
            domain: idx,
            slot,
            position,
        });
    }

    /// Removes a specific slot id from a domain if present.
    ///
    /// Returns whether a removal happened.
    pub fn remove_slot(&mut self, idx: usize, slot_id: usize) -> bool {
        match self.domains[idx].slots.iter().position(|&s| s == slot_id) {
            Some(position) => {
                self.remove_at(idx, position);
                true
            }
            None => false,
        }
    }

    /// Rolls the trail back to a mark, restoring every removal after it.
    pub fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let Some(removal) = self.trail.pop() else {
                break;
            };
            self.domains[removal.domain]
                .slots
                .insert(removal.position, removal.slot);
        }
    }

    /// Whether every domain in `live` still has a candidate.
    ///
    /// `live` yields domain indices; assigned and skipped variables are
    /// excluded by the caller.
    pub fn all_nonempty<I: IntoIterator<Item = usize>>(&self, live: I) -> bool {
        live.into_iter().all(|i| !self.domains[i].is_empty())
    }

    /// Most-constrained live domain: fewest remaining slots, ties by
    /// encounter order. `None` when `live` is empty.
    pub fn select_mrv<I: IntoIterator<Item = usize>>(&self, live: I) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for idx in live {
            let size = self.domains[idx].len();
            match best {
                Some((_, best_size)) if best_size <= size => {}
                _ => best = Some((idx, size)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}
