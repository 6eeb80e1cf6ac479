use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sitewatch::build::{BuildInvoker, BuildResult};

type Hook = Box<dyn FnMut(usize) + Send>;

/// Shared view of what a [`RecordingInvoker`] has done.
#[derive(Debug, Clone, Default)]
pub struct BuildLog {
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl BuildLog {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

/// A fake build invoker that:
/// - counts started and finished builds
/// - optionally runs a hook while "building" (to simulate concurrent edits)
/// - optionally takes some time and fails selected builds.
pub struct RecordingInvoker {
    log: BuildLog,
    during_build: Option<Hook>,
    duration: Duration,
    failing: HashSet<usize>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self {
            log: BuildLog::default(),
            during_build: None,
            duration: Duration::ZERO,
            failing: HashSet::new(),
        }
    }

    pub fn log(&self) -> BuildLog {
        self.log.clone()
    }

    /// Called with the 1-based build number while that build is running.
    pub fn during_build(mut self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        self.during_build = Some(Box::new(hook));
        self
    }

    pub fn taking(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Make the given 1-based build numbers report failure.
    pub fn failing(mut self, builds: impl IntoIterator<Item = usize>) -> Self {
        self.failing.extend(builds);
        self
    }
}

impl Default for RecordingInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildInvoker for RecordingInvoker {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = BuildResult> + Send + '_>> {
        Box::pin(async move {
            let n = self.log.started.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(hook) = self.during_build.as_mut() {
                hook(n);
            }
            if !self.duration.is_zero() {
                tokio::time::sleep(self.duration).await;
            }
            self.log.finished.fetch_add(1, Ordering::SeqCst);

            if self.failing.contains(&n) {
                BuildResult::failed(format!("build {n} failed"))
            } else {
                BuildResult::succeeded(format!("build {n} done"))
            }
        })
    }
}
