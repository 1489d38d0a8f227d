// src/exec/mod.rs

//! Action execution layer.
//!
//! This module is responsible for actually running task actions, using
//! `tokio::process::Command` for external programs and the blocking pool
//! for in-process functions, and reporting back to the orchestration
//! runtime via `RuntimeEvent`s.
//!
//! - [`action`] runs a single action of either kind.
//! - [`task_runner`] runs a task's actions in order, stopping at the first
//!   failure.
//! - [`executor_loop`] owns the loop that spawns one runner per task.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod action;
pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use action::{ActionError, run_action};
pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use task_runner::run_actions;
