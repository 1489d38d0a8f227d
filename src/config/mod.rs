// src/config/mod.rs

//! Pipeline file loading and validation for pipegraph.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a pipeline file from disk (`loader.rs`).
//! - Turn the raw model into task descriptors and a validated graph
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ActionConfig, ArtifactConfig, CleanConfig, ConfigSection, PipelineFile, RawPipelineFile,
    TaskConfig,
};
