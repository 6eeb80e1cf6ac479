// src/watch/digest.rs

//! Fingerprinting a directory tree by file modification times.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use blake3::Hasher;
use tracing::{debug, trace};

use crate::errors::{Result, SiteError};
use crate::fs::{DirEntry, EntryKind, FileSystem};

/// 32-byte fingerprint of a tree's file timestamps and membership.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Digest of a tree with no tracked files.
    pub fn empty() -> Self {
        Self(*Hasher::new().finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn short_hex(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

/// Directory names skipped at the top level of the tree only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `false` if the name was already excluded.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn excludes(&self, entry: &DirEntry) -> bool {
        entry.name().to_str().is_some_and(|n| self.contains(n))
    }
}

/// Compute the digest of `root`.
///
/// Traversal is sorted by entry name, and a directory's files are hashed
/// before any of its subdirectories are visited. Each file contributes its
/// path relative to `root` and its mtime, so a file moved to another
/// directory changes the digest even when its mtime is preserved. Excluded
/// names are only honoured directly below `root`. A missing `root` yields
/// [`Digest::empty`].
pub fn compute_digest(
    fs: &dyn FileSystem,
    root: &Path,
    exclusions: &ExclusionSet,
) -> Result<Digest> {
    let mut hasher = Hasher::new();
    let mut files = 0usize;
    hash_dir(fs, root, root, exclusions, &mut hasher, &mut files)?;

    let digest = Digest(*hasher.finalize().as_bytes());
    debug!(root = %root.display(), files, digest = %digest.short_hex(), "computed tree digest");
    Ok(digest)
}

fn hash_dir(
    fs: &dyn FileSystem,
    root: &Path,
    dir: &Path,
    exclusions: &ExclusionSet,
    hasher: &mut Hasher,
    files: &mut usize,
) -> Result<()> {
    let mut entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        // Root never existed, or a subdirectory was removed after listing.
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            trace!(dir = %dir.display(), "directory vanished during scan");
            return Ok(());
        }
        Err(e) => return Err(SiteError::scan(dir, e)),
    };
    entries.sort_by(|a, b| a.name().cmp(b.name()));

    for entry in entries.iter().filter(|e| e.kind == EntryKind::File) {
        let modified = match fs.modified(&entry.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(file = %entry.path.display(), "file vanished during scan");
                continue;
            }
            Err(e) => return Err(SiteError::scan(&entry.path, e)),
        };
        hash_file(hasher, root, entry, modified);
        *files += 1;
    }

    for entry in entries.iter().filter(|e| e.kind == EntryKind::Dir) {
        if dir == root && exclusions.excludes(entry) {
            trace!(dir = %entry.path.display(), "skipping excluded directory");
            continue;
        }
        hash_dir(fs, root, &entry.path, exclusions, hasher, files)?;
    }

    Ok(())
}

fn hash_file(hasher: &mut Hasher, root: &Path, entry: &DirEntry, modified: SystemTime) {
    let rel = entry.path.strip_prefix(root).unwrap_or(&entry.path);
    let rel = rel.as_os_str().as_encoded_bytes();
    hasher.update(&(rel.len() as u64).to_le_bytes());
    hasher.update(rel);
    hasher.update(&encode_mtime(modified));
}

/// Signed nanoseconds relative to the Unix epoch, little-endian.
fn encode_mtime(time: SystemTime) -> [u8; 16] {
    let nanos: i128 = match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_nanos() as i128,
        Err(e) => -(e.duration().as_nanos() as i128),
    };
    nanos.to_le_bytes()
}
