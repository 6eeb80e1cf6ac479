// src/watch/session.rs

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{Notify, watch};
use tracing::{debug, error, info, warn};

use crate::build::BuildInvoker;
use crate::errors::{Result, SiteError};
use crate::fs::FileSystem;
use crate::watch::digest::{Digest, ExclusionSet, compute_digest};
use crate::watch::state::{WatchCommand, WatchCore};

/// Static parameters of a watch session.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub poll_interval: Duration,
    pub exclusions: ExclusionSet,
}

/// Counters returned when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchReport {
    pub builds: u64,
    pub failed_builds: u64,
    pub scan_errors: u64,
}

/// Drives a [`WatchCore`] against a real (or mock) tree and a build invoker.
///
/// This is the async IO shell: it runs digests on the blocking pool, awaits
/// builds, sleeps between ticks and watches the shutdown flag. Every
/// decision about *whether* to build is made by the core.
pub struct WatchSession<B: BuildInvoker> {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    options: WatchOptions,
    invoker: B,
    shutdown: watch::Receiver<bool>,
    wake: Option<Arc<Notify>>,
}

impl<B: BuildInvoker> std::fmt::Debug for WatchSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("root", &self.root)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<B: BuildInvoker> WatchSession<B> {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        root: impl Into<PathBuf>,
        options: WatchOptions,
        invoker: B,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            fs,
            root: root.into(),
            options,
            invoker,
            shutdown,
            wake: None,
        }
    }

    /// Let an external source (filesystem events) cut the sleep short.
    pub fn with_wake(mut self, wake: Arc<Notify>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Run until the shutdown flag is set.
    ///
    /// Cancellation is only observed between ticks: a scan or build that
    /// is already running completes, and no build starts afterwards.
    pub async fn run(mut self) -> WatchReport {
        let mut report = WatchReport::default();

        let Some(initial) = self.initial_digest(&mut report).await else {
            info!("watch cancelled before the first scan completed");
            return report;
        };
        info!(root = %self.root.display(), digest = %initial.short_hex(), "watching for changes");

        let mut core = WatchCore::new(initial);

        loop {
            if self.cancel_requested() {
                core.cancel();
            }

            let command = if core.is_cancelled() {
                WatchCommand::Stop
            } else {
                match self.scan().await {
                    Ok(digest) => core.observe(digest),
                    Err(err) => {
                        report.scan_errors += 1;
                        warn!(error = %err, "scan failed; keeping previous digest");
                        core.scan_failed()
                    }
                }
            };

            match command {
                WatchCommand::Build => {
                    info!(digest = %core.last_digest().short_hex(), "change detected; rebuilding");
                    let result = self.invoker.build().await;
                    report.builds += 1;
                    if result.success {
                        info!(message = %result.message, "build succeeded");
                    } else {
                        report.failed_builds += 1;
                        error!(message = %result.message, "build failed; still watching");
                    }
                    // No sleep: the next iteration is the post-build recheck.
                }
                WatchCommand::Sleep => self.pause().await,
                WatchCommand::Stop => break,
            }
        }

        debug!(?report, "watch loop finished");
        report
    }

    async fn initial_digest(&mut self, report: &mut WatchReport) -> Option<Digest> {
        loop {
            if self.cancel_requested() {
                return None;
            }
            match self.scan().await {
                Ok(digest) => return Some(digest),
                Err(err) => {
                    report.scan_errors += 1;
                    warn!(error = %err, "initial scan failed; retrying");
                    self.pause().await;
                }
            }
        }
    }

    fn scan(&self) -> impl Future<Output = Result<Digest>> + Send + use<B> {
        scan_tree(
            Arc::clone(&self.fs),
            self.root.clone(),
            self.options.exclusions.clone(),
        )
    }

    fn cancel_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep for the poll interval, waking early on shutdown or a wake hint.
    async fn pause(&mut self) {
        let interval = self.options.poll_interval;
        let wake = self.wake.clone();
        let shutdown = &mut self.shutdown;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown_signalled(shutdown) => {}
            _ = woken(wake) => debug!("woken early by filesystem event"),
        }
    }
}

/// Digest on the blocking pool; the returned future owns everything it
/// touches so it never borrows the session across the await.
async fn scan_tree(
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    exclusions: ExclusionSet,
) -> Result<Digest> {
    tokio::task::spawn_blocking(move || compute_digest(&*fs, &root, &exclusions))
        .await
        .map_err(|e| SiteError::Other(anyhow!("digest task failed: {e}")))?
}

/// Resolves when the flag changes; never resolves once the sender is gone.
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    if rx.changed().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn woken(wake: Option<Arc<Notify>>) {
    match wake {
        Some(notify) => notify.notified().await,
        None => std::future::pending::<()>().await,
    }
}
