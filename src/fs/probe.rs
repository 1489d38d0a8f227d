// src/fs/probe.rs

//! Artifact probing: the primitive staleness oracle.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::trace;

use crate::fs::FileSystem;
use crate::task::{Artifact, ArtifactKind};

/// Read-only view of artifacts on a [`FileSystem`].
///
/// Probing is total: any OS error (permission denied included) reads as
/// "does not exist" / "no timestamp".
#[derive(Debug, Clone)]
pub struct ArtifactProbe {
    fs: Arc<dyn FileSystem>,
}

impl ArtifactProbe {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn exists(&self, artifact: &Artifact) -> bool {
        match artifact.kind() {
            ArtifactKind::Directory => self.fs.is_dir(artifact.path()),
            ArtifactKind::File | ArtifactKind::Sentinel => self.fs.exists(artifact.path()),
        }
    }

    pub fn modified_time(&self, artifact: &Artifact) -> Option<SystemTime> {
        if !self.exists(artifact) {
            return None;
        }
        match self.fs.modified(artifact.path()) {
            Ok(t) => Some(t),
            Err(e) => {
                trace!(artifact = %artifact, error = %e, "modification time unavailable");
                None
            }
        }
    }
}
