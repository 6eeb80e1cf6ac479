// src/watch/events.rs

//! Optional native filesystem events.
//!
//! Events never decide whether to build. They only wake the watch session
//! early; the digest comparison still runs and still has the final say.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;
use tracing::{info, trace, warn};

use crate::watch::digest::ExclusionSet;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops the
/// event stream; the session keeps polling on its interval.
pub struct EventWaker {
    _inner: RecommendedWatcher,
    wake: Arc<Notify>,
}

impl std::fmt::Debug for EventWaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventWaker").finish()
    }
}

impl EventWaker {
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }
}

/// Watch `root` recursively and notify on every relevant change.
pub fn spawn_event_waker(root: impl Into<PathBuf>, exclusions: &ExclusionSet) -> Result<EventWaker> {
    let root = root.into();
    let wake = Arc::new(Notify::new());

    let mut watcher = RecommendedWatcher::new(
        {
            let root = root.clone();
            let exclusions = exclusions.clone();
            let wake = Arc::clone(&wake);
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_access() {
                        return;
                    }
                    if event
                        .paths
                        .iter()
                        .any(|p| is_relevant_path(&root, &exclusions, p))
                    {
                        trace!(?event, "relevant filesystem event");
                        wake.notify_one();
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = %root.display(), "filesystem event watcher started");

    Ok(EventWaker {
        _inner: watcher,
        wake,
    })
}

/// False for paths inside (or equal to) an excluded root-level directory.
///
/// Paths outside `root` are treated as relevant; a spurious wake only costs
/// one extra digest.
pub fn is_relevant_path(root: &Path, exclusions: &ExclusionSet, path: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return true;
    };
    match rel.components().next() {
        Some(Component::Normal(first)) => !first.to_str().is_some_and(|n| exclusions.contains(n)),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_root_directories_are_not_relevant() {
        let excl = ExclusionSet::new(["out", ".sitewatch"]);
        let root = Path::new("/site");

        assert!(!is_relevant_path(root, &excl, Path::new("/site/out/index.html")));
        assert!(!is_relevant_path(root, &excl, Path::new("/site/out")));
        assert!(!is_relevant_path(root, &excl, Path::new("/site/.sitewatch/x")));
    }

    #[test]
    fn nested_directories_with_excluded_names_are_relevant() {
        let excl = ExclusionSet::new(["out"]);
        let root = Path::new("/site");

        assert!(is_relevant_path(root, &excl, Path::new("/site/src/out/page.md")));
        assert!(is_relevant_path(root, &excl, Path::new("/site/src/index.md")));
        assert!(is_relevant_path(root, &excl, Path::new("/site")));
        assert!(is_relevant_path(root, &excl, Path::new("/elsewhere/out/x")));
    }
}
