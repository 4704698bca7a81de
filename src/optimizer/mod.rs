//! Multi-objective schedule refinement.
//!
//! A bounded local search over a feasible schedule: each round runs
//! the enabled passes (distribution → gaps → faculty balance →
//! morning sort) and re-scores the result; rounds stop once the
//! weighted score stops improving by more than the configured
//! threshold, at a local optimum. Lecture identities never change —
//! only slots move.

mod metrics;
mod passes;

pub use metrics::OptimizationMetrics;
pub use passes::{
    balance_faculty_load, distribute_sessions, minimize_gaps, sort_by_morning, try_move,
    MoveOutcome,
};

use log::debug;

use crate::models::{ScheduleEntry, SchedulingOptions, TimeSlot};

/// Result of one optimization run.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationOutcome {
    /// Scores after the final round.
    pub metrics: OptimizationMetrics,
    /// Rounds actually run.
    pub iterations: usize,
    /// Sessions moved across all rounds.
    pub moves: usize,
}

/// Bounded iterative schedule optimizer.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOptimizer;

impl ScheduleOptimizer {
    /// Creates an optimizer.
    pub fn new() -> Self {
        Self
    }

    /// Refines a schedule in place.
    ///
    /// The multiset of (batch, subject, faculty) identities is
    /// preserved exactly; only `slot` fields (and entry order, for the
    /// morning sort) change.
    pub fn optimize(
        &self,
        entries: &mut Vec<ScheduleEntry>,
        pool: &[TimeSlot],
        options: &SchedulingOptions,
    ) -> OptimizationOutcome {
        let config = &options.optimizer;
        let mut previous = OptimizationMetrics::evaluate(entries, options);
        let mut iterations = 0usize;
        let mut moves = 0usize;

        while iterations < config.max_iterations {
            iterations += 1;

            if config.distribution_enabled {
                moves += distribute_sessions(entries, pool, options);
            }
            if config.gap_enabled {
                moves += minimize_gaps(entries, pool, options);
            }
            if config.balance_enabled {
                moves += balance_faculty_load(entries, pool, options);
            }
            if config.morning_enabled {
                sort_by_morning(entries);
            }

            let current = OptimizationMetrics::evaluate(entries, options);
            let improvement = current.weighted - previous.weighted;
            debug!(
                "optimizer round {iterations}: score {:.4} (delta {improvement:+.4}), {moves} move(s) so far",
                current.weighted
            );
            previous = current;
            if improvement < config.improvement_threshold {
                break;
            }
        }

        OptimizationOutcome {
            metrics: previous,
            iterations,
            moves,
        }
    }
}
