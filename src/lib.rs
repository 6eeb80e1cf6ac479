// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod project;
pub mod serve;
pub mod types;
pub mod watch;

use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch as shutdown;
use tracing::{debug, info, warn};

use crate::build::{BuildInvoker, CommandBuildInvoker};
use crate::cli::{BuildArgs, CliArgs, Command, NewArgs, ServeArgs, WatchArgs};
use crate::config::ConfigFile;
use crate::config::duration::parse_duration;
use crate::errors::SiteError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::project::root::normalize;
use crate::project::{ProjectRoot, SOURCE_DIR, resolve_from_cwd};
use crate::serve::SiteServer;
use crate::types::{BuildOptions, WatchMode};
use crate::watch::{ExclusionSet, WatchOptions, WatchSession, spawn_event_waker};

const RULE_WIDTH: usize = 80;

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    let fs = RealFileSystem;
    match args.command {
        Command::Build(build) => run_build(&fs, build).await,
        Command::Watch(watch) => run_watch(&fs, watch).await,
        Command::Clear => run_clear(&fs),
        Command::Init { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            project::init_site(&fs, &dir)?;
            Ok(())
        }
        Command::New(new) => run_new(&fs, new).await,
        Command::Serve(serve) => run_serve(&fs, serve).await,
    }
}

/// Root and config every project-bound command starts from.
fn open_project(fs: &dyn FileSystem) -> Result<(ProjectRoot, ConfigFile)> {
    let root = resolve_from_cwd(fs)?;
    let cfg = config::load_for_root(root.path())?;
    debug!(root = %root, ?cfg, "opened project");
    Ok((root, cfg))
}

/// The command-line `--engine` wins over `[build].cmd`.
pub fn engine_command(cli_engine: Option<String>, cfg: &ConfigFile) -> errors::Result<String> {
    cli_engine
        .or_else(|| cfg.build_cmd.clone())
        .filter(|cmd| !cmd.trim().is_empty())
        .ok_or_else(|| {
            SiteError::ConfigError(
                "no build engine configured; set [build].cmd in sitewatch.toml or pass --engine"
                    .to_string(),
            )
        })
}

/// Build options for a one-shot `build`, with CLI flags over config.
///
/// The engine runs in the project root, so a relative `--out` is resolved
/// against `cwd` (where the user typed it) first.
pub fn build_options(args: &BuildArgs, cfg: &ConfigFile, cwd: &Path) -> BuildOptions {
    BuildOptions {
        out: args.out.as_ref().map(|out| normalize(&cwd.join(out))),
        theme: args.theme.clone().or_else(|| cfg.theme.clone()),
        clear: args.clear,
    }
}

/// Poll interval, mode and exclusions for `watch`, with CLI flags over config.
///
/// A forwarded `--out DIR` inside `root` is excluded as well, otherwise each
/// build's output would trigger the next build.
pub fn watch_settings(
    args: &WatchArgs,
    cfg: &ConfigFile,
    root: &Path,
) -> errors::Result<(WatchOptions, WatchMode)> {
    let poll_interval = match args.interval {
        Some(ref s) => {
            let interval = parse_duration(s).map_err(|e| SiteError::InvalidArgument(format!("--interval: {e}")))?;
            if interval.is_zero() {
                return Err(SiteError::InvalidArgument(
                    "--interval must be greater than zero".to_string(),
                ));
            }
            interval
        }
        None => cfg.poll_interval,
    };
    let mode = if args.events { WatchMode::Events } else { cfg.mode };

    let mut exclusions = ExclusionSet::new(cfg.exclude.iter().cloned());
    if let Some(out) = forwarded_out(&args.build_args) {
        if let Some(name) = output_root_entry(root, Path::new(out))? {
            if exclusions.insert(name.clone()) {
                info!(dir = %name, "excluding forwarded output directory from change detection");
            }
        }
    }

    Ok((
        WatchOptions {
            poll_interval,
            exclusions,
        },
        mode,
    ))
}

/// Value of the last `--out DIR` or `--out=DIR` among forwarded args.
fn forwarded_out(args: &[String]) -> Option<&str> {
    let mut found = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--out" {
            found = iter.next().map(String::as_str).or(found);
        } else if let Some(value) = arg.strip_prefix("--out=") {
            found = Some(value);
        }
    }
    found
}

/// The root-level entry an engine output directory lives under, as seen
/// from the engine's working directory `root`. `None` if it lies outside.
fn output_root_entry(root: &Path, out: &Path) -> errors::Result<Option<String>> {
    let full = normalize(&root.join(out));
    let Ok(rel) = full.strip_prefix(root) else {
        return Ok(None);
    };
    match rel.components().next() {
        None => Err(SiteError::InvalidArgument(format!(
            "build output directory {} is the site root itself",
            full.display()
        ))),
        Some(Component::Normal(name)) if name == SOURCE_DIR => Err(SiteError::InvalidArgument(
            format!("build output directory {} is inside `{SOURCE_DIR}`", full.display()),
        )),
        Some(Component::Normal(name)) => Ok(Some(name.to_string_lossy().into_owned())),
        Some(_) => Ok(None),
    }
}

async fn run_build(fs: &dyn FileSystem, args: BuildArgs) -> Result<()> {
    let (root, cfg) = open_project(fs)?;
    let cmd = engine_command(args.engine.clone(), &cfg)?;
    let options = build_options(&args, &cfg, &std::env::current_dir()?);

    let mut invoker = CommandBuildInvoker::new(root.path(), cmd, &options, Vec::new());
    let result = invoker.build().await;
    info!(%result, "build finished");
    result.into_result()?;
    Ok(())
}

async fn run_watch(fs: &dyn FileSystem, args: WatchArgs) -> Result<()> {
    let (root, cfg) = open_project(fs)?;
    let cmd = engine_command(args.engine.clone(), &cfg)?;
    let (options, mode) = watch_settings(&args, &cfg, root.path())?;

    // Forwarded flags follow the configured theme, so they win with engines
    // that take the last occurrence.
    let defaults = BuildOptions {
        theme: cfg.theme.clone(),
        ..BuildOptions::default()
    };
    let invoker = CommandBuildInvoker::new(root.path(), cmd, &defaults, args.build_args);

    print_banner(&[("Site", root.to_string()), ("Stop", "Ctrl-C".to_string())]);

    let (shutdown_tx, shutdown_rx) = shutdown::channel(false);
    tokio::spawn(relay_interrupts(tokio::signal::ctrl_c, shutdown_tx, || {
        eprintln!("interrupted again; quitting without waiting for the build");
        std::process::exit(130);
    }));

    let waker = match mode {
        WatchMode::Events => Some(spawn_event_waker(root.path(), &options.exclusions)?),
        WatchMode::Poll => None,
    };

    let mut session = WatchSession::new(
        Arc::new(RealFileSystem),
        root.path(),
        options,
        invoker,
        shutdown_rx,
    );
    if let Some(ref waker) = waker {
        session = session.with_wake(waker.wake_handle());
    }

    let report = session.run().await;
    drop(waker);

    println!();
    print_banner(&[("Ending watch", format!("{} build(s)", report.builds))]);
    info!(
        builds = report.builds,
        failed = report.failed_builds,
        scan_errors = report.scan_errors,
        "watch stopped"
    );
    Ok(())
}

/// First interrupt asks the session to stop after the running build; a
/// second one calls `force_quit`.
async fn relay_interrupts<F, Fut>(
    mut next_interrupt: F,
    shutdown_tx: shutdown::Sender<bool>,
    force_quit: impl FnOnce(),
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = next_interrupt().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        return;
    }
    info!("stopping after the current build; press Ctrl-C again to quit now");
    let _ = shutdown_tx.send(true);

    if next_interrupt().await.is_ok() {
        force_quit();
    }
}

fn run_clear(fs: &dyn FileSystem) -> Result<()> {
    let (root, cfg) = open_project(fs)?;
    project::clear_output(fs, &root, &cfg.output_dir)?;
    Ok(())
}

async fn run_new(fs: &dyn FileSystem, args: NewArgs) -> Result<()> {
    let (root, _cfg) = open_project(fs)?;
    let now = chrono::Local::now().naive_local();
    let path = project::new_record(fs, &root, &args.kind, &args.name, &now)?;
    println!("{}", path.display());

    if !args.no_edit {
        open_in_editor(&path).await?;
    }
    Ok(())
}

async fn run_serve(fs: &dyn FileSystem, args: ServeArgs) -> Result<()> {
    let (root, cfg) = open_project(fs)?;
    let out = root.join(&cfg.output_dir);
    let server = SiteServer::bind(fs, &out, &args.host, args.port).await?;
    let addr = server.local_addr()?;

    print_banner(&[
        ("Root", out.display().to_string()),
        ("Host", addr.ip().to_string()),
        ("Port", addr.port().to_string()),
        ("Stop", "Ctrl-C".to_string()),
    ]);

    if args.browser {
        open_in_browser(&format!("http://{addr}"));
    }

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C; serving until killed");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    println!();
    print_banner(&[("Stopping server", addr.to_string())]);
    Ok(())
}

fn open_in_browser(url: &str) {
    let mut cmd = if cfg!(target_os = "macos") {
        tokio::process::Command::new("open")
    } else if cfg!(windows) {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        tokio::process::Command::new("xdg-open")
    };
    if let Err(e) = cmd.arg(url).spawn() {
        warn!(%url, error = %e, "could not launch a web browser");
    }
}

/// `SITEWATCH_EDITOR`, then `EDITOR`, then `vim`.
fn editor_command() -> String {
    ["SITEWATCH_EDITOR", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "vim".to_string())
}

async fn open_in_editor(path: &Path) -> Result<()> {
    let editor = editor_command();
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vim");

    debug!(%editor, path = %path.display(), "opening editor");
    let status = tokio::process::Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .await
        .map_err(|e| anyhow::anyhow!("failed to launch editor `{editor}`: {e}"))?;
    if !status.success() {
        debug!(?status, "editor exited unsuccessfully");
    }
    Ok(())
}

fn print_banner(lines: &[(&str, String)]) {
    let rule = "-".repeat(RULE_WIDTH);
    println!("{rule}");
    for (label, value) in lines {
        println!("{label}: {value}");
    }
    println!("{rule}");
}
