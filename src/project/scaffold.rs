// src/project/scaffold.rs

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::config::CONFIG_FILE_NAME;
use crate::config::model::{DEFAULT_CACHE_DIR, DEFAULT_OUTPUT_DIR};
use crate::errors::{Result, SiteError};
use crate::fs::FileSystem;
use crate::project::root::{ProjectRoot, SOURCE_DIR};

/// Directories created by `init`, relative to the new site root.
pub const SKELETON_DIRS: [&str; 6] = [DEFAULT_CACHE_DIR, "ext", "inc", "lib", DEFAULT_OUTPUT_DIR, SOURCE_DIR];

const STARTER_CONFIG: &str = r#"# sitewatch configuration

[build]
# Command that runs the site's build engine. It is started in this
# directory and receives --out/--theme/--clear plus any forwarded flags.
# cmd = "my-engine build"

[watch]
poll_interval = "500ms"
mode = "poll"
"#;

/// Create the site skeleton in `dir`, creating `dir` itself if needed.
///
/// Existing directories and an existing config file are left untouched.
pub fn init_site(fs: &dyn FileSystem, dir: &Path) -> Result<()> {
    fs.create_dir_all(dir)?;
    for name in SKELETON_DIRS {
        fs.create_dir_all(&dir.join(name))?;
    }

    let config = dir.join(CONFIG_FILE_NAME);
    match fs.create_new(&config, STARTER_CONFIG.as_bytes()) {
        Ok(()) => debug!(path = %config.display(), "wrote starter config"),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            debug!(path = %config.display(), "keeping existing config");
        }
        Err(e) => return Err(e.into()),
    }

    info!(dir = %dir.display(), "initialized site directory");
    Ok(())
}

/// Front matter written into every new record.
pub fn record_template(now: &NaiveDateTime) -> String {
    format!("---\ndate: {}\n---\n\n\n", now.format("%Y-%m-%d %H:%M:%S"))
}

/// Create `src/[<kind>]/<name>` and return its path.
pub fn new_record(
    fs: &dyn FileSystem,
    root: &ProjectRoot,
    kind: &str,
    name: &str,
    now: &NaiveDateTime,
) -> Result<PathBuf> {
    ensure_plain_name("record type", kind)?;
    ensure_plain_name("record name", name)?;

    let path = root.source_dir().join(format!("[{kind}]")).join(name);
    match fs.create_new(&path, record_template(now).as_bytes()) {
        Ok(()) => {
            info!(path = %path.display(), "created record");
            Ok(path)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(SiteError::AlreadyExists(path)),
        Err(e) => Err(e.into()),
    }
}

/// Remove everything inside the output directory, keeping the directory.
///
/// Returns the number of top-level entries removed.
pub fn clear_output(fs: &dyn FileSystem, root: &ProjectRoot, output_dir: &str) -> Result<usize> {
    let out = root.join(output_dir);
    if !fs.is_dir(&out) {
        return Err(SiteError::MissingDirectory(out));
    }

    let entries = fs.read_dir(&out)?;
    let count = entries.len();
    for entry in entries {
        debug!(path = %entry.path.display(), "removing");
        fs.remove(&entry.path)?;
    }

    info!(dir = %out.display(), removed = count, "cleared output directory");
    Ok(count)
}

fn ensure_plain_name(what: &str, value: &str) -> Result<()> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(SiteError::InvalidArgument(format!(
            "{what} must be a plain file name (got '{value}')"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::project::root::resolve_root;
    use chrono::NaiveDate;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap()
    }

    #[test]
    fn init_creates_skeleton_and_config() {
        let fs = MockFileSystem::new();
        init_site(&fs, Path::new("/blog")).unwrap();

        for name in SKELETON_DIRS {
            assert!(fs.is_dir(&Path::new("/blog").join(name)), "missing {name}");
        }
        let config = fs.contents("/blog/sitewatch.toml").unwrap();
        assert!(String::from_utf8(config).unwrap().contains("[watch]"));

        // The new directory is immediately a resolvable project root.
        let root = resolve_root(&fs, "/blog/src").unwrap();
        assert_eq!(root.path(), Path::new("/blog"));
    }

    #[test]
    fn init_keeps_existing_config() {
        let fs = MockFileSystem::new();
        fs.add_file("/blog/sitewatch.toml", "[build]\ncmd = \"make\"\n");

        init_site(&fs, Path::new("/blog")).unwrap();

        assert_eq!(fs.contents("/blog/sitewatch.toml").unwrap(), b"[build]\ncmd = \"make\"\n");
    }

    #[test]
    fn template_has_dated_front_matter() {
        assert_eq!(
            record_template(&fixed_now()),
            "---\ndate: 2024-03-09 14:05:00\n---\n\n\n"
        );
    }

    #[test]
    fn new_record_lands_in_bracketed_type_directory() {
        let fs = MockFileSystem::new();
        fs.add_dir("/blog/src");
        let root = resolve_root(&fs, "/blog").unwrap();

        let path = new_record(&fs, &root, "posts", "hello.md", &fixed_now()).unwrap();

        assert_eq!(path, PathBuf::from("/blog/src/[posts]/hello.md"));
        let body = String::from_utf8(fs.contents(&path).unwrap()).unwrap();
        assert!(body.starts_with("---\ndate: 2024-03-09"));
    }

    #[test]
    fn new_record_refuses_to_overwrite() {
        let fs = MockFileSystem::new();
        fs.add_file("/blog/src/[posts]/hello.md", "keep me");
        let root = resolve_root(&fs, "/blog").unwrap();

        let err = new_record(&fs, &root, "posts", "hello.md", &fixed_now()).unwrap_err();
        assert!(matches!(err, SiteError::AlreadyExists(_)));
        assert_eq!(fs.contents("/blog/src/[posts]/hello.md").unwrap(), b"keep me");
    }

    #[test]
    fn new_record_rejects_path_like_names() {
        let fs = MockFileSystem::new();
        fs.add_dir("/blog/src");
        let root = resolve_root(&fs, "/blog").unwrap();

        for (kind, name) in [("../x", "a.md"), ("posts", "../../etc.md"), ("posts", "")] {
            let err = new_record(&fs, &root, kind, name, &fixed_now()).unwrap_err();
            assert!(matches!(err, SiteError::InvalidArgument(_)), "{kind}/{name}");
        }
    }

    #[test]
    fn clear_empties_output_but_keeps_it() {
        let fs = MockFileSystem::new();
        fs.add_dir("/blog/src");
        fs.add_file("/blog/out/index.html", "x");
        fs.add_file("/blog/out/posts/a.html", "y");
        let root = resolve_root(&fs, "/blog").unwrap();

        let removed = clear_output(&fs, &root, "out").unwrap();

        assert_eq!(removed, 2);
        assert!(fs.is_dir(Path::new("/blog/out")));
        assert!(fs.read_dir(Path::new("/blog/out")).unwrap().is_empty());
    }

    #[test]
    fn clear_without_output_directory_fails() {
        let fs = MockFileSystem::new();
        fs.add_dir("/blog/src");
        let root = resolve_root(&fs, "/blog").unwrap();

        let err = clear_output(&fs, &root, "out").unwrap_err();
        assert!(matches!(err, SiteError::MissingDirectory(ref p) if p == Path::new("/blog/out")));
    }
}
