// src/config/mod.rs

//! Site configuration (`sitewatch.toml` in the project root).
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load the file from disk, or fall back to defaults (`loader.rs`).
//! - Validate directory names and durations (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_path, load_and_validate, load_for_root, load_from_path};
pub use model::{
    BuildSection, CONFIG_FILE_NAME, ConfigFile, RawConfigFile, SiteSection, WatchSection,
};
