// src/exec/launcher.rs

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info};

/// Trait abstracting how a task's execution directive becomes a process.
///
/// Production code uses [`ProcessLauncher`]; tests can provide their own
/// implementation that doesn't spawn real processes. The blocking wait for
/// process exit is the dominant suspension point of a DAG run.
pub trait TaskLauncher: Send + Sync {
    /// Run the directive to completion and return its exit code.
    ///
    /// A launch failure surfaces as a non-zero code (-1), never as an
    /// error; the executor only distinguishes zero from non-zero.
    fn run<'a>(&'a self, directive: &'a str) -> Pin<Box<dyn Future<Output = i32> + Send + 'a>>;
}

/// Real launcher: resolves the directive under the configured `dags/`
/// directory and runs it as an OS process.
pub struct ProcessLauncher {
    dags_dir: PathBuf,
}

impl ProcessLauncher {
    /// `base_dir` is normally the working directory; `dags_dir_name` the
    /// configured subdirectory holding task executables.
    pub fn new(base_dir: impl Into<PathBuf>, dags_dir_name: &str) -> Self {
        Self {
            dags_dir: base_dir.into().join(dags_dir_name),
        }
    }

    async fn run_process(&self, directive: &str) -> i32 {
        let path = self.dags_dir.join(directive);
        info!(directive = %directive, path = %path.display(), "starting task process");

        let mut cmd = Command::new(&path);
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to spawn task process");
                return -1;
            }
        };

        // Drain both pipes so buffers don't fill; log at debug.
        if let Some(stdout) = child.stdout.take() {
            let directive = directive.to_string();
            tokio::spawn(async move {
                let reader = BufReader::new(stdout);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(directive = %directive, "stdout: {}", line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let directive = directive.to_string();
            tokio::spawn(async move {
                let reader = BufReader::new(stderr);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(directive = %directive, "stderr: {}", line);
                }
            });
        }

        let status = match child.wait().await {
            Ok(status) => status,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to wait for task process");
                return -1;
            }
        };

        let code = status.code().unwrap_or(-1);
        info!(
            directive = %directive,
            exit_code = code,
            success = status.success(),
            "task process exited"
        );
        code
    }
}

impl TaskLauncher for ProcessLauncher {
    fn run<'a>(&'a self, directive: &'a str) -> Pin<Box<dyn Future<Output = i32> + Send + 'a>> {
        Box::pin(self.run_process(directive))
    }
}
