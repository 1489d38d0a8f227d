// src/dag/mod.rs

//! Task graph, staleness and scheduling.
//!
//! - [`graph`] validates descriptors and derives dependency edges from
//!   shared artifacts and explicit `task_deps`.
//! - [`staleness`] decides whether a task has to run.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   tasks are ready, skipped, blocked or cancelled.
//! - [`task_info`] provides per-run states and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod staleness;
pub mod state_manager;
pub mod task_info;

pub use graph::TaskGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use staleness::{StaleReason, Staleness, UpToDateReason};
pub use task_info::{RunState, ScheduledTask};
