// src/build/command.rs

//! Runs the external build engine as a child process.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::build::{BuildInvoker, BuildResult};
use crate::types::BuildOptions;

/// Runs `<cmd> <options...> <extra args...>` in the project root.
///
/// The engine's stdout and stderr are inherited so its own progress output
/// reaches the terminal unchanged.
#[derive(Debug, Clone)]
pub struct CommandBuildInvoker {
    root: PathBuf,
    cmd: String,
    args: Vec<String>,
}

impl CommandBuildInvoker {
    pub fn new(
        root: impl Into<PathBuf>,
        cmd: impl Into<String>,
        options: &BuildOptions,
        extra_args: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut args = options.to_args();
        args.extend(extra_args);
        Self {
            root: root.into(),
            cmd: cmd.into(),
            args,
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        // Arguments go through "$@" so they reach the engine unquoted and
        // unsplit, whatever they contain.
        let mut c = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd).args(&self.args);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c")
                .arg(format!("{} \"$@\"", self.cmd))
                .arg("sitewatch-build")
                .args(&self.args);
            c
        };
        c.current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        c
    }

    async fn run(&self) -> BuildResult {
        info!(cmd = %self.cmd, args = ?self.args, root = %self.root.display(), "starting build");
        let started = Instant::now();

        let status = match self.command().status().await {
            Ok(status) => status,
            Err(err) => {
                warn!(cmd = %self.cmd, error = %err, "failed to spawn build engine");
                return BuildResult::failed(format!(
                    "could not start build engine `{}`: {err}",
                    self.cmd
                ));
            }
        };

        let elapsed = started.elapsed();
        debug!(?status, ?elapsed, "build engine exited");

        if status.success() {
            BuildResult::succeeded(format!("built in {elapsed:.2?}"))
        } else {
            BuildResult::failed(describe_failure(status))
        }
    }
}

fn describe_failure(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("build engine exited with status {code}"),
        None => "build engine was terminated by a signal".to_string(),
    }
}

impl BuildInvoker for CommandBuildInvoker {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = BuildResult> + Send + '_>> {
        Box::pin(self.run())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(dir: &std::path::Path, name: &str, body: &str) -> std::io::Result<()> {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
    }

    #[tokio::test]
    async fn successful_engine_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut invoker =
            CommandBuildInvoker::new(dir.path(), "true", &BuildOptions::default(), Vec::new());

        let result = invoker.build().await;
        assert!(result.success, "{result}");
    }

    #[tokio::test]
    async fn failing_engine_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut invoker =
            CommandBuildInvoker::new(dir.path(), "exit 3", &BuildOptions::default(), Vec::new());

        let result = invoker.build().await;
        assert!(!result.success);
        assert_eq!(result.message, "build engine exited with status 3");
    }

    #[tokio::test]
    async fn options_and_forwarded_args_reach_the_engine_in_the_root() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "engine.sh",
            "pwd > cwd.txt\nprintf '%s\\n' \"$@\" > args.txt",
        )
        .unwrap();

        let options = BuildOptions {
            out: None,
            theme: Some("dark mode".to_string()),
            clear: true,
        };
        let mut invoker = CommandBuildInvoker::new(
            dir.path(),
            "./engine.sh",
            &options,
            vec!["--drafts".to_string()],
        );

        let result = invoker.build().await;
        assert!(result.success, "{result}");

        let args = fs::read_to_string(dir.path().join("args.txt")).unwrap();
        assert_eq!(args, "--theme\ndark mode\n--clear\n--drafts\n");

        let cwd = fs::read_to_string(dir.path().join("cwd.txt")).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(PathBuf::from(cwd.trim()).canonicalize().unwrap(), expected);
    }
}
