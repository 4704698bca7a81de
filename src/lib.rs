//! Weekly lecture timetabling as a constraint satisfaction problem.
//!
//! Assigns recurring lectures (batch × subject × faculty, each needing
//! N sessions per week) to non-overlapping slots of a weekly grid,
//! subject to hard constraints (no double-booked faculty, slots inside
//! working hours, holidays excluded) and soft objectives (even
//! distribution, minimal gaps, balanced faculty load, morning
//! preference).
//!
//! # Modules
//!
//! - **`models`**: Domain types — `TimeSlot`, `Batch`, `Subject`,
//!   `LectureRequirement`, `ScheduleEntry`, `WeeklySchedule`,
//!   `SchedulingOptions`
//! - **`constraints`**: The `SchedulingConstraint` trait, the
//!   `ConstraintSet` registry, and the built-in hard rules
//! - **`solver`**: Domain arena, propagation (arc consistency, forward
//!   checking, MRV/LCV), backtracking search, feasibility analysis,
//!   and the orchestrating `TimetableGenerator`
//! - **`optimizer`**: Bounded multi-objective local search over a
//!   feasible schedule
//! - **`conflicts`**: Pairwise conflict detection, transitive
//!   grouping, ranked resolution strategies, holiday reconciliation
//! - **`validation`**: Input integrity checks (duplicate IDs, empty
//!   batches, degenerate grids)
//!
//! # Algorithm
//!
//! The search is a depth-first backtracker over one variable per
//! weekly session: domains are pre-filtered to a fixed point by
//! constraint propagation and pairwise arc consistency, variables are
//! chosen most-constrained-first (MRV), values least-constraining
//! first (LCV), and every commitment is forward-checked against the
//! remaining domains. A feasible result then goes through a bounded
//! local-search pass that trades slots to improve a weighted
//! multi-criterion score without changing which lectures exist.
//!
//! # References
//!
//! - Russell & Norvig (2020), "Artificial Intelligence", Ch. 6 (CSPs)
//! - Mackworth (1977), "Consistency in Networks of Relations"
//! - Schaerf (1999), "A Survey of Automated Timetabling"

pub mod conflicts;
pub mod constraints;
pub mod error;
pub mod models;
pub mod optimizer;
pub mod solver;
pub mod validation;

pub use error::ScheduleError;
pub use models::{Batch, ScheduleEntry, SchedulingOptions, Subject, WeeklySchedule};
pub use solver::{GenerationReport, TimetableGenerator};
