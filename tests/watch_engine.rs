#![cfg(unix)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use sitewatch::build::CommandBuildInvoker;
use sitewatch::cli::WatchArgs;
use sitewatch::config::ConfigFile;
use sitewatch::fs::{FileSystem, RealFileSystem};
use sitewatch::types::BuildOptions;
use sitewatch::watch::{ExclusionSet, WatchOptions, WatchReport, WatchSession, spawn_event_waker};
use sitewatch_test_utils::{SiteTree, init_tracing, wait_until, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Appends one line per invocation, recording its arguments, to a log kept
/// in the excluded cache directory.
const ENGINE: &str = "#!/bin/sh\necho \"$*\" >> .sitewatch/builds.log\n";

fn site_with_engine() -> Result<SiteTree, Box<dyn Error>> {
    let mut tree = SiteTree::new()?;
    tree.mkdir(".sitewatch")?;
    tree.mkdir("out")?;
    tree.write("engine.sh", ENGINE)?;
    tree.write("src/index.md", "home")?;
    Ok(tree)
}

fn builds(root: &Path) -> Vec<String> {
    std::fs::read_to_string(root.join(".sitewatch/builds.log"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

fn invoker(tree: &SiteTree) -> CommandBuildInvoker {
    let defaults = BuildOptions {
        theme: Some("dark".to_string()),
        ..BuildOptions::default()
    };
    CommandBuildInvoker::new(tree.path(), "sh ./engine.sh", &defaults, ["--drafts".to_string()])
}

fn options(poll: Duration) -> WatchOptions {
    WatchOptions {
        poll_interval: poll,
        exclusions: ExclusionSet::new(["out", ".sitewatch"]),
    }
}

#[tokio::test]
async fn source_edit_runs_the_engine_with_forwarded_arguments() -> TestResult {
    init_tracing();
    let mut tree = site_with_engine()?;
    let root = tree.path().to_path_buf();

    let (tx, rx) = watch::channel(false);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let session = WatchSession::new(fs, &root, options(Duration::from_millis(20)), invoker(&tree), rx);
    let handle = tokio::spawn(session.run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(builds(&root).is_empty(), "startup alone must not build");

    tree.write("src/[posts]/hello.txt", "hello")?;
    wait_until("engine run", || builds(&root).len() == 1).await;

    // The engine's own output lands in `out/`, which is excluded.
    tree.write("out/index.html", "<html>")?;
    tokio::time::sleep(Duration::from_millis(150)).await;

    tx.send(true)?;
    let report: WatchReport = with_timeout(handle).await?;
    assert_eq!(report.builds, 1);
    assert_eq!(report.failed_builds, 0);
    assert_eq!(builds(&root), vec!["--theme dark --drafts".to_string()]);
    Ok(())
}

#[tokio::test]
async fn events_mode_still_rebuilds_on_change() -> TestResult {
    init_tracing();
    let mut tree = site_with_engine()?;
    let root = tree.path().to_path_buf();
    let opts = options(Duration::from_millis(200));
    let waker = spawn_event_waker(&root, &opts.exclusions)?;

    let (tx, rx) = watch::channel(false);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let session = WatchSession::new(fs, &root, opts, invoker(&tree), rx)
        .with_wake(waker.wake_handle());
    let handle = tokio::spawn(session.run());
    tokio::time::sleep(Duration::from_millis(100)).await;

    tree.touch("src/index.md")?;
    wait_until("engine run", || builds(&root).len() == 1).await;

    tx.send(true)?;
    let report = with_timeout(handle).await?;
    drop(waker);
    assert_eq!(report.builds, 1);
    Ok(())
}

/// Writes a fresh page into whatever `--out` names on every run.
const OUTPUT_ENGINE: &str = "#!/bin/sh
out=out
while [ $# -gt 0 ]; do
  case \"$1\" in
    --out) out=\"$2\"; shift ;;
  esac
  shift
done
mkdir -p \"$out\"
echo \"$$\" > \"$out/index.html\"
echo built >> .sitewatch/builds.log
";

#[tokio::test]
async fn forwarded_output_directory_does_not_retrigger_builds() -> TestResult {
    init_tracing();
    let mut tree = site_with_engine()?;
    tree.write("engine.sh", OUTPUT_ENGINE)?;
    let root = tree.path().to_path_buf();

    let args = WatchArgs {
        interval: Some("20ms".to_string()),
        build_args: vec!["--out".to_string(), "public".to_string()],
        ..WatchArgs::default()
    };
    let (opts, _) = sitewatch::watch_settings(&args, &ConfigFile::default(), &root)?;
    let invoker = CommandBuildInvoker::new(
        &root,
        "sh ./engine.sh",
        &BuildOptions::default(),
        args.build_args.clone(),
    );

    let (tx, rx) = watch::channel(false);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let handle = tokio::spawn(WatchSession::new(fs, &root, opts, invoker, rx).run());
    tokio::time::sleep(Duration::from_millis(100)).await;

    tree.touch("src/index.md")?;
    wait_until("engine run", || builds(&root).len() == 1).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    tx.send(true)?;
    let report = with_timeout(handle).await?;
    assert!(root.join("public/index.html").is_file());
    assert_eq!(report.builds, 1);
    assert_eq!(builds(&root).len(), 1);
    Ok(())
}
