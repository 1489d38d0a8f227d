use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    File,
    Directory,
    /// An empty marker file whose only meaning is "this step is done".
    Sentinel,
}

/// A path the graph reasons about. Artifacts are probed, never owned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    path: PathBuf,
    kind: ArtifactKind,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ArtifactKind::File)
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ArtifactKind::Directory)
    }

    pub fn sentinel(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ArtifactKind::Sentinel)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ArtifactKind::Directory
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dir() {
            write!(f, "{}/", self.path.display())
        } else {
            write!(f, "{}", self.path.display())
        }
    }
}

impl From<&str> for Artifact {
    fn from(path: &str) -> Self {
        Artifact::file(path)
    }
}

impl From<String> for Artifact {
    fn from(path: String) -> Self {
        Artifact::file(path)
    }
}

impl From<PathBuf> for Artifact {
    fn from(path: PathBuf) -> Self {
        Artifact::file(path)
    }
}

impl From<&Path> for Artifact {
    fn from(path: &Path) -> Self {
        Artifact::file(path)
    }
}

impl From<&PathBuf> for Artifact {
    fn from(path: &PathBuf) -> Self {
        Artifact::file(path)
    }
}
