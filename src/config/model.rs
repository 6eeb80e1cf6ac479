// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::WatchMode;

/// File name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "sitewatch.toml";

pub const DEFAULT_OUTPUT_DIR: &str = "out";
pub const DEFAULT_CACHE_DIR: &str = ".sitewatch";
pub const DEFAULT_POLL_INTERVAL: &str = "500ms";

/// Raw configuration as read from `sitewatch.toml`.
///
/// ```toml
/// [site]
/// output_dir = "out"
/// cache_dir = ".sitewatch"
///
/// [build]
/// cmd = "my-engine build"
///
/// [watch]
/// poll_interval = "500ms"
/// mode = "poll"
/// ```
///
/// All sections are optional and have reasonable defaults. Use
/// `ConfigFile::try_from` to obtain a validated configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// `[site]` section: directory layout below the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Where the build engine writes the rendered site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// The tool's private cache directory.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
        }
    }
}

/// `[build]` section: how to reach the build engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Shell command that runs the build engine.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Theme passed as `--theme` unless overridden on the command line.
    #[serde(default)]
    pub theme: Option<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Duration string such as `"500ms"` or `"2s"`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default)]
    pub mode: WatchMode,

    /// Root-level directory names left out of the digest.
    ///
    /// If `None`, the output and cache directories are excluded.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

fn default_poll_interval() -> String {
    DEFAULT_POLL_INTERVAL.to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            mode: WatchMode::default(),
            exclude: None,
        }
    }
}

/// Validated configuration.
///
/// Can only be built through `TryFrom<RawConfigFile>`, so every instance has
/// a positive poll interval and single-component directory names.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub output_dir: String,
    pub cache_dir: String,
    pub build_cmd: Option<String>,
    pub theme: Option<String>,
    pub poll_interval: Duration,
    pub mode: WatchMode,
    pub exclude: Vec<String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        site: SiteSection,
        build: BuildSection,
        poll_interval: Duration,
        mode: WatchMode,
        exclude: Vec<String>,
    ) -> Self {
        Self {
            output_dir: site.output_dir,
            cache_dir: site.cache_dir,
            build_cmd: build.cmd,
            theme: build.theme,
            poll_interval,
            mode,
            exclude,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: default_cache_dir(),
            build_cmd: None,
            theme: None,
            poll_interval: Duration::from_millis(500),
            mode: WatchMode::Poll,
            exclude: vec![default_output_dir(), default_cache_dir()],
        }
    }
}
