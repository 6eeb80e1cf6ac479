// src/fs/mod.rs

//! Filesystem abstraction shared by root resolution, digesting and the
//! scaffolding commands.
//!
//! Methods return `std::io::Result` so callers can tell a vanished file
//! (`NotFound`) apart from a real failure.

use std::ffi::OsStr;
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub mod mock;

/// What a directory entry points at, with symlinks to files resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Sockets, fifos, dangling links and symlinked directories.
    Other,
}

/// One child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn name(&self) -> &OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Return the entries of a directory, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Modification time of a file, following symlinks.
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Write a file, creating parent directories and replacing any
    /// existing content.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Write a file that must not exist yet (`AlreadyExists` otherwise).
    fn create_new(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Remove a file, or a directory and everything below it.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let Some(entry) = skip_vanished(entry)? else {
                continue;
            };
            let Some(file_type) = skip_vanished(entry.file_type())? else {
                continue;
            };
            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_symlink() {
                // Follow links to files; never descend through linked dirs.
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => EntryKind::File,
                    _ => EntryKind::Other,
                }
            } else {
                EntryKind::Other
            };
            entries.push(DirEntry::new(entry.path(), kind));
        }
        Ok(entries)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        use std::io::Write;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(contents)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }
}

/// An entry removed between listing and inspection is dropped on its own
/// rather than failing the whole directory.
fn skip_vanished<T>(res: io::Result<T>) -> io::Result<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanished_entries_are_dropped_individually() {
        assert_eq!(skip_vanished(Ok(3)).unwrap(), Some(3));

        let gone: io::Result<u8> = Err(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(skip_vanished(gone).unwrap(), None);

        let denied: io::Result<u8> = Err(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(
            skip_vanished(denied).unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn real_read_dir_classifies_entries() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a.md"), "a")?;
        fs::create_dir(dir.path().join("sub"))?;

        let mut entries = RealFileSystem.read_dir(dir.path())?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "a.md");
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[1].name(), "sub");
        assert_eq!(entries[1].kind, EntryKind::Dir);
        Ok(())
    }

    #[test]
    fn real_create_new_refuses_to_overwrite() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/post.md");

        RealFileSystem.create_new(&path, b"first")?;
        let err = RealFileSystem.create_new(&path, b"second").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path)?, "first");
        Ok(())
    }

    #[test]
    fn real_remove_handles_files_and_dirs() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("index.html");
        let sub = dir.path().join("posts");
        fs::write(&file, "x")?;
        fs::create_dir_all(sub.join("deep"))?;
        fs::write(sub.join("deep/page.html"), "y")?;

        RealFileSystem.remove(&file)?;
        RealFileSystem.remove(&sub)?;

        assert!(!file.exists());
        assert!(!sub.exists());
        Ok(())
    }
}
