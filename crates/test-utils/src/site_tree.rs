use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

/// A throwaway project directory on the real filesystem.
///
/// `touch` sets explicit, strictly increasing mtimes so tests never depend
/// on the filesystem's timestamp resolution.
pub struct SiteTree {
    dir: TempDir,
    clock: u64,
}

impl SiteTree {
    /// An empty project: just `src/`.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("src"))?;
        Ok(Self { dir, clock: 0 })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn mkdir(&self, rel: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = self.join(rel);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Write a file (creating parents) and stamp it with a fresh mtime.
    pub fn write(&mut self, rel: impl AsRef<Path>, contents: &str) -> io::Result<PathBuf> {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        self.stamp(&path)?;
        Ok(path)
    }

    /// Give an existing file a fresh mtime without changing its contents.
    pub fn touch(&mut self, rel: impl AsRef<Path>) -> io::Result<()> {
        let path = self.join(rel);
        self.stamp(&path)
    }

    pub fn remove(&self, rel: impl AsRef<Path>) -> io::Result<()> {
        let path = self.join(rel);
        if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn stamp(&mut self, path: &Path) -> io::Result<()> {
        self.clock += 1;
        let time: SystemTime = UNIX_EPOCH + Duration::from_secs(1_600_000_000 + self.clock);
        fs::File::options().write(true).open(path)?.set_modified(time)
    }
}
