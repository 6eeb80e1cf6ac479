// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitewatch",
    version,
    about = "Build a static site and rebuild it whenever its sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build the current site. Works from the site directory or any of its
    /// subdirectories.
    Build(BuildArgs),

    /// Monitor the site directory and rebuild when any file changes.
    Watch(WatchArgs),

    /// Remove everything inside the output directory.
    Clear,

    /// Initialize a new site directory.
    Init {
        /// Directory to initialize. Defaults to the current directory.
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Create a new record file under `src/[TYPE]/`.
    New(NewArgs),

    /// Serve the site's output directory over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    /// Clear the output directory before building.
    #[arg(long)]
    pub clear: bool,

    /// Redirect output to the specified directory.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Override the theme specified in the config file.
    #[arg(long, value_name = "NAME")]
    pub theme: Option<String>,

    /// Build engine command, overriding `[build].cmd`.
    #[arg(long, value_name = "CMD")]
    pub engine: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct WatchArgs {
    /// Time between scans, e.g. `250ms` or `2s`. Overrides
    /// `[watch].poll_interval`.
    #[arg(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Use native filesystem events to wake up between scans.
    #[arg(long)]
    pub events: bool,

    /// Build engine command, overriding `[build].cmd`.
    #[arg(long, value_name = "CMD")]
    pub engine: Option<String>,

    /// Flags forwarded unchanged to every triggered build
    /// (e.g. `sitewatch watch -- --clear --theme dark`).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "BUILD_ARGS")]
    pub build_args: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct NewArgs {
    /// Record type, e.g. `posts`.
    #[arg(value_name = "TYPE")]
    pub kind: String,

    /// Record file name.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Do not open the new file in an editor.
    #[arg(long)]
    pub no_edit: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Host address. Use `0.0.0.0` to listen on all interfaces.
    #[arg(long, default_value = crate::serve::DEFAULT_HOST)]
    pub host: String,

    /// Port number; 0 picks a free port.
    #[arg(short, long, default_value_t = crate::serve::DEFAULT_PORT)]
    pub port: u16,

    /// Open the site in the default web browser.
    #[arg(short, long)]
    pub browser: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
