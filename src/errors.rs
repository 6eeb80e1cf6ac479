// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("cannot locate site directory: no `{source_dir}` directory in {start:?} or any parent")]
    RootNotFound { start: PathBuf, source_dir: String },

    #[error("scan error at {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot locate directory {0:?}")]
    MissingDirectory(PathBuf),

    #[error("file already exists: {0:?}")]
    AlreadyExists(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SiteError {
    pub fn scan(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SiteError::Scan {
            path: path.into(),
            source,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SiteError>;
