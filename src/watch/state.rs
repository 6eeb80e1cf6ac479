// src/watch/state.rs

//! Pure watch state machine.
//!
//! `WatchCore` consumes scan results and build completions and tells the
//! async shell (`watch::session`) what to do next. It performs no IO, owns
//! `last_digest` exclusively, and can be unit tested without Tokio.

use crate::watch::digest::Digest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting for the tree to change.
    Idle,
    /// A build was requested; the next scan is the post-build recheck.
    Building,
    /// Cancellation observed; nothing further will be started.
    Cancelled,
}

/// What the shell should do after feeding an event into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchCommand {
    /// Invoke the build engine, then scan again without sleeping.
    Build,
    /// Sleep for the poll interval, then scan.
    Sleep,
    /// Leave the loop.
    Stop,
}

#[derive(Debug)]
pub struct WatchCore {
    last_digest: Digest,
    state: WatchState,
    builds_requested: u64,
}

impl WatchCore {
    /// Start idle with the digest taken when watching began.
    pub fn new(initial: Digest) -> Self {
        Self {
            last_digest: initial,
            state: WatchState::Idle,
            builds_requested: 0,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn last_digest(&self) -> Digest {
        self.last_digest
    }

    pub fn builds_requested(&self) -> u64 {
        self.builds_requested
    }

    /// Feed a fresh digest.
    ///
    /// While `Idle` this is an ordinary poll tick. While `Building` it is the
    /// recheck taken right after the build returned: a difference there means
    /// the tree changed during the build, so exactly one more build follows.
    pub fn observe(&mut self, digest: Digest) -> WatchCommand {
        match self.state {
            WatchState::Cancelled => WatchCommand::Stop,
            WatchState::Idle | WatchState::Building => {
                if digest != self.last_digest {
                    self.last_digest = digest;
                    self.state = WatchState::Building;
                    self.builds_requested += 1;
                    WatchCommand::Build
                } else {
                    self.state = WatchState::Idle;
                    WatchCommand::Sleep
                }
            }
        }
    }

    /// A scan failed. `last_digest` is kept so the failure neither triggers
    /// nor suppresses a build.
    ///
    /// `last_digest` already holds the digest that triggered the current
    /// build, so a failed post-build recheck simply falls back to `Idle`;
    /// any edit made during the build still differs on the next tick.
    pub fn scan_failed(&mut self) -> WatchCommand {
        match self.state {
            WatchState::Cancelled => WatchCommand::Stop,
            WatchState::Idle | WatchState::Building => {
                self.state = WatchState::Idle;
                WatchCommand::Sleep
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = WatchState::Cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == WatchState::Cancelled
    }
}
