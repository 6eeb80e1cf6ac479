// src/watch/mod.rs

//! Change detection and the rebuild loop.
//!
//! This module is responsible for:
//! - Fingerprinting the project tree by file mtimes (`digest`).
//! - The pure Idle/Building/Cancelled state machine (`state`).
//! - The async session that scans, builds and sleeps (`session`).
//! - Optional `notify` events that wake the session early (`events`).
//!
//! It does **not** know how the site is rendered; builds go through
//! [`crate::build::BuildInvoker`].

pub mod digest;
pub mod events;
pub mod session;
pub mod state;

pub use digest::{Digest, ExclusionSet, compute_digest};
pub use events::{EventWaker, spawn_event_waker};
pub use session::{WatchOptions, WatchReport, WatchSession};
pub use state::{WatchCommand, WatchCore, WatchState};
