// src/project/root.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, SiteError};
use crate::fs::FileSystem;

/// Name of the canonical source directory that marks a project root.
pub const SOURCE_DIR: &str = "src";

/// Absolute path of a directory that owns a `src/` subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRoot(PathBuf);

impl ProjectRoot {
    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn source_dir(&self) -> PathBuf {
        self.0.join(SOURCE_DIR)
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.0.join(rel)
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ProjectRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Walk upward from `start` until a directory containing `src/` is found.
///
/// `start` is absolutized against the process working directory if it is
/// relative, then normalized lexically so `..` components cannot loop.
pub fn resolve_root(fs: &dyn FileSystem, start: impl AsRef<Path>) -> Result<ProjectRoot> {
    let start = absolutize(start.as_ref())?;
    let mut current = start.as_path();

    loop {
        let candidate = current.join(SOURCE_DIR);
        debug!(dir = %current.display(), "looking for source directory");
        if fs.is_dir(&candidate) {
            return Ok(ProjectRoot(current.to_path_buf()));
        }
        match current.parent() {
            Some(parent) if fs.is_dir(parent) => current = parent,
            _ => {
                return Err(SiteError::RootNotFound {
                    start: start.clone(),
                    source_dir: SOURCE_DIR.to_string(),
                });
            }
        }
    }
}

/// Resolve from the current working directory.
pub fn resolve_from_cwd(fs: &dyn FileSystem) -> Result<ProjectRoot> {
    let cwd = std::env::current_dir()?;
    resolve_root(fs, cwd)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}

/// Remove `.` and resolve `..` without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn resolves_from_nested_source_directory() {
        let fs = MockFileSystem::new();
        fs.add_file("/home/me/blog/src/[posts]/hello.md", "hi");

        let root = resolve_root(&fs, "/home/me/blog/src/[posts]").unwrap();
        assert_eq!(root.path(), Path::new("/home/me/blog"));
        assert_eq!(root.source_dir(), PathBuf::from("/home/me/blog/src"));
    }

    #[test]
    fn resolves_at_the_start_directory_itself() {
        let fs = MockFileSystem::new();
        fs.add_dir("/blog/src");

        let root = resolve_root(&fs, "/blog").unwrap();
        assert_eq!(root.path(), Path::new("/blog"));
    }

    #[test]
    fn fails_outside_any_project() {
        let fs = MockFileSystem::new();
        fs.add_dir("/elsewhere/deep/er");

        let err = resolve_root(&fs, "/elsewhere/deep/er").unwrap_err();
        match err {
            SiteError::RootNotFound { start, source_dir } => {
                assert_eq!(start, PathBuf::from("/elsewhere/deep/er"));
                assert_eq!(source_dir, "src");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn a_plain_file_named_src_does_not_mark_a_root() {
        let fs = MockFileSystem::new();
        fs.add_file("/notes/src", "not a directory");
        fs.add_dir("/notes/drafts");

        assert!(resolve_root(&fs, "/notes/drafts").is_err());
    }

    #[test]
    fn parent_components_are_normalized_before_walking() {
        let fs = MockFileSystem::new();
        fs.add_dir("/blog/src/[posts]");
        fs.add_dir("/blog/inc");

        let root = resolve_root(&fs, "/blog/inc/../src/./[posts]").unwrap();
        assert_eq!(root.path(), Path::new("/blog"));
    }

    #[test]
    fn normalize_never_climbs_above_root() {
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }
}
