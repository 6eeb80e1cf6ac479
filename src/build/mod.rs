// src/build/mod.rs

//! Build engine boundary.
//!
//! The watch loop talks to a [`BuildInvoker`] and never to the engine
//! directly. Production code uses [`CommandBuildInvoker`], which runs the
//! configured engine command as a child process; tests provide their own
//! implementation that records invocations.

pub mod command;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::errors::{Result, SiteError};

pub use command::CommandBuildInvoker;

/// Outcome of one build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub success: bool,
    pub message: String,
}

impl BuildResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Convert into a `Result`, for callers where a failed build is fatal.
    pub fn into_result(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(SiteError::Build(self.message))
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(f, "{status}: {}", self.message)
    }
}

/// Trait abstracting how a site build is run.
///
/// The returned future is awaited inside the watch tick, so no scan or other
/// build overlaps it. Failures are reported through [`BuildResult`], never
/// by panicking.
pub trait BuildInvoker: Send {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = BuildResult> + Send + '_>>;
}

impl<B: BuildInvoker + ?Sized> BuildInvoker for Box<B> {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = BuildResult> + Send + '_>> {
        (**self).build()
    }
}
