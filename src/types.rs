use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// How the watch loop decides when to take the next digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    /// Rescan every poll interval.
    Poll,
    /// Rescan on native filesystem events, with the poll interval as a
    /// fallback. The digest still decides whether a build runs.
    Events,
}

impl Default for WatchMode {
    fn default() -> Self {
        WatchMode::Poll
    }
}

impl FromStr for WatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "poll" => Ok(WatchMode::Poll),
            "events" => Ok(WatchMode::Events),
            other => Err(format!(
                "invalid watch mode: {other} (expected \"poll\" or \"events\")"
            )),
        }
    }
}

/// Options handed to the build engine on every invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Redirect output to this directory instead of the configured one.
    pub out: Option<PathBuf>,
    /// Override the theme named in the config file.
    pub theme: Option<String>,
    /// Ask the engine to clear the output directory before building.
    pub clear: bool,
}

impl BuildOptions {
    /// Render the options as engine arguments, in a fixed order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(ref out) = self.out {
            args.push("--out".to_string());
            args.push(out.to_string_lossy().into_owned());
        }
        if let Some(ref theme) = self.theme {
            args.push("--theme".to_string());
            args.push(theme.clone());
        }
        if self.clear {
            args.push("--clear".to_string());
        }
        args
    }
}
