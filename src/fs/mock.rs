// src/fs/mock.rs

//! In-memory filesystem with a logical clock for modification times.
//!
//! Every write or `touch` advances the clock by one second, so two
//! successive modifications always produce distinct mtimes without sleeping.

use super::{DirEntry, EntryKind, FileSystem};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        contents: Vec<u8>,
        modified: SystemTime,
    },
    Dir(BTreeSet<String>), // child names
    /// Still listed by its parent, but gone by the time anyone stats it.
    Vanished,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    denied: HashSet<PathBuf>,
    clock: u64,
}

impl MockState {
    fn tick(&mut self) -> SystemTime {
        self.clock += 1;
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + self.clock)
    }

    fn ensure_dir(&mut self, path: &Path) {
        if matches!(self.entries.get(path), Some(MockEntry::Dir(_))) {
            return;
        }
        self.entries
            .insert(path.to_path_buf(), MockEntry::Dir(BTreeSet::new()));
        self.link_to_parent(path);
    }

    fn link_to_parent(&mut self, path: &Path) {
        let Some(parent) = parent_of(path) else {
            return;
        };
        self.ensure_dir(&parent);
        if let (Some(MockEntry::Dir(children)), Some(name)) = (
            self.entries.get_mut(&parent),
            path.file_name().and_then(|n| n.to_str()),
        ) {
            children.insert(name.to_string());
        }
    }

    fn unlink_from_parent(&mut self, path: &Path) {
        let Some(parent) = parent_of(path) else {
            return;
        };
        if let (Some(MockEntry::Dir(children)), Some(name)) = (
            self.entries.get_mut(&parent),
            path.file_name().and_then(|n| n.to_str()),
        ) {
            children.remove(name);
        }
    }

    fn put_file(&mut self, path: &Path, contents: Vec<u8>) {
        let modified = self.tick();
        self.entries
            .insert(path.to_path_buf(), MockEntry::File { contents, modified });
        self.link_to_parent(path);
    }

    fn remove_tree(&mut self, path: &Path) {
        if let Some(MockEntry::Dir(children)) = self.entries.remove(path) {
            for child in children {
                self.remove_tree(&path.join(child));
            }
        }
        self.denied.remove(path);
    }
}

/// `None` for the filesystem root; `"."` for bare relative names.
fn parent_of(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    if parent.as_os_str().is_empty() {
        if path == Path::new(".") {
            None
        } else {
            Some(PathBuf::from("."))
        }
    } else {
        Some(parent.to_path_buf())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {:?}", path))
}

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock filesystem lock poisoned")
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.lock().put_file(path.as_ref(), contents.into());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.lock().ensure_dir(path.as_ref());
    }

    /// Bump a file's mtime, keeping its contents; creates it empty if absent.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        let contents = match state.entries.get(path) {
            Some(MockEntry::File { contents, .. }) => contents.clone(),
            _ => Vec::new(),
        };
        state.put_file(path, contents);
    }

    pub fn set_modified(&self, path: impl AsRef<Path>, time: SystemTime) {
        if let Some(MockEntry::File { modified, .. }) =
            self.lock().entries.get_mut(path.as_ref())
        {
            *modified = time;
        }
    }

    /// Keep `path` listed in its parent but make every stat fail.
    pub fn vanish(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state.entries.insert(path.to_path_buf(), MockEntry::Vanished);
        state.link_to_parent(path);
    }

    /// Make `read_dir` on `path` fail with `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.lock().denied.insert(path.as_ref().to_path_buf());
    }

    pub fn allow(&self, path: impl AsRef<Path>) {
        self.lock().denied.remove(path.as_ref());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().entries.get(path.as_ref()) {
            Some(MockEntry::File { contents, .. }) => Some(contents.clone()),
            _ => None,
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        matches!(
            self.lock().entries.get(path),
            Some(MockEntry::File { .. }) | Some(MockEntry::Dir(_))
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.lock();
        if state.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        match state.entries.get(path) {
            Some(MockEntry::Dir(children)) => Ok(children
                .iter()
                .map(|name| {
                    let child = path.join(name);
                    let kind = match state.entries.get(&child) {
                        Some(MockEntry::Dir(_)) => EntryKind::Dir,
                        _ => EntryKind::File,
                    };
                    DirEntry::new(child, kind)
                })
                .collect()),
            Some(_) => Err(io::Error::other(format!("not a directory: {:?}", path))),
            None => Err(not_found(path)),
        }
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        match self.lock().entries.get(path) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(MockEntry::Dir(_)) => Err(io::Error::other(format!(
                "is a directory: {:?}",
                path
            ))),
            _ => Err(not_found(path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.lock().ensure_dir(path);
        Ok(())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.lock().put_file(path, contents.to_vec());
        Ok(())
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        if matches!(
            state.entries.get(path),
            Some(MockEntry::File { .. }) | Some(MockEntry::Dir(_))
        ) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("already exists: {:?}", path),
            ));
        }
        state.put_file(path, contents.to_vec());
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if !state.entries.contains_key(path) {
            return Err(not_found(path));
        }
        state.remove_tree(path);
        state.unlink_from_parent(path);
        Ok(())
    }
}
