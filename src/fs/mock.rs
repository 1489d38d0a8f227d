use super::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Timestamp `secs` seconds after the Unix epoch, for readable test setups.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEntry {
    File(SystemTime),
    Dir(SystemTime),
}

/// In-memory filesystem with explicit modification times.
///
/// Paths are compared verbatim; tests should use the same spelling the
/// task descriptors use.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    denied: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, mtime: SystemTime) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(path.as_ref().to_path_buf(), MockEntry::File(mtime));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>, mtime: SystemTime) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(path.as_ref().to_path_buf(), MockEntry::Dir(mtime));
    }

    /// Update the modification time of an existing entry, or create a file.
    pub fn touch(&self, path: impl AsRef<Path>, mtime: SystemTime) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(path.as_ref().to_path_buf())
            .or_insert(MockEntry::File(mtime));
        *entry = match *entry {
            MockEntry::File(_) => MockEntry::File(mtime),
            MockEntry::Dir(_) => MockEntry::Dir(mtime),
        };
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.entries.lock().unwrap().remove(path.as_ref());
    }

    /// Make every operation on `path` fail with `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.denied
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.lock().unwrap().contains_key(path.as_ref())
    }

    fn check_access(&self, path: &Path) -> io::Result<()> {
        if self.denied.lock().unwrap().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }
        Ok(())
    }

    fn entry(&self, path: &Path) -> io::Result<MockEntry> {
        self.check_access(path)?;
        self.entries
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .ok_or_else(|| not_found(path))
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.entry(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entry(path), Ok(MockEntry::Dir(_)))
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        match self.entry(path)? {
            MockEntry::File(t) | MockEntry::Dir(t) => Ok(t),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        match self.entry(path)? {
            MockEntry::File(_) => {
                self.entries.lock().unwrap().remove(path);
                Ok(())
            }
            MockEntry::Dir(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            )),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        match self.entry(path)? {
            MockEntry::Dir(_) => {
                self.entries
                    .lock()
                    .unwrap()
                    .retain(|p, _| !p.starts_with(path));
                Ok(())
            }
            MockEntry::File(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("not a directory: {}", path.display()),
            )),
        }
    }
}
