// src/task/mod.rs

//! Declarative task descriptors.
//!
//! - [`artifact`] names the files, directories and sentinels a task reads
//!   and produces.
//! - [`action`] holds the two kinds of work a task can perform.
//! - [`descriptor`] is the immutable task record and its validating builder.
//! - [`recipes`] provides constructors for recurring pipeline-stage shapes.

pub mod action;
pub mod artifact;
pub mod descriptor;
pub mod recipes;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

pub use action::{Action, InProcessAction, ProcessAction};
pub use artifact::{Artifact, ArtifactKind};
pub use descriptor::{CleanupAction, StalenessPolicy, TaskBuilder, TaskDescriptor};
