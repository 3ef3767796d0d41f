//! Privileged helper invocation
//!
//! Mounting and unmounting are delegated to external programs. The
//! [`CommandRunner`] seam lets the executors be exercised without root.

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DaemonError, Result};

/// Runs a program to completion and reports how it exited
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, waiting for it to exit.
    ///
    /// Fails only when the process cannot be started; a non-zero exit is
    /// returned as the status.
    async fn run(&self, program: &Path, args: &[OsString]) -> Result<ExitStatus>;
}

/// Spawns real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &Path, args: &[OsString]) -> Result<ExitStatus> {
        debug!("Running {} {:?}", program.display(), args);

        // Output goes to the daemon's own stdout/stderr
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| DaemonError::Spawn {
                program: program.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_process_runner_reports_status() {
        let runner = ProcessRunner;

        let ok = runner.run(Path::new("/bin/sh"), &["-c".into(), "exit 0".into()]).await.unwrap();
        assert!(ok.success());

        let failed = runner.run(Path::new("/bin/sh"), &["-c".into(), "exit 3".into()]).await.unwrap();
        assert_eq!(failed.code(), Some(3));
    }

    #[tokio::test]
    async fn test_process_runner_spawn_failure() {
        let err = ProcessRunner
            .run(Path::new("/nonexistent/hotmount/helper"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DaemonError::Spawn { .. }));
    }
}
