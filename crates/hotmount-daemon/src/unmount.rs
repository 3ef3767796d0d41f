//! Unmount execution

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hotmount_core::MountOracle;
use tracing::{debug, error, info};

use crate::config::DaemonConfig;
use crate::error::{DaemonError, Result};
use crate::runner::CommandRunner;

/// Result of a detach
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmountOutcome {
    /// Device was not in the mount table; nothing was done
    NotMounted,
    /// Device was unmounted from `mount_point`
    Unmounted {
        mount_point: PathBuf,
        /// Whether the mount point directory was removed afterwards
        directory_removed: bool,
    },
}

/// Unmounts a device wherever the mount table says it lives
pub struct UnmountExecutor {
    runner: Arc<dyn CommandRunner>,
    oracle: MountOracle,
    program: PathBuf,
    prefix: PathBuf,
    remove_mount_points: bool,
}

impl UnmountExecutor {
    pub fn new(config: &DaemonConfig, oracle: MountOracle, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            oracle,
            program: config.unmount_program.clone(),
            prefix: config.mount_prefix.clone(),
            remove_mount_points: config.remove_mount_points,
        }
    }

    pub async fn unmount(&self, device: &Path) -> Result<UnmountOutcome> {
        let Some(mount_point) = self.oracle.is_mounted(device) else {
            return Ok(UnmountOutcome::NotMounted);
        };

        let args: Vec<OsString> = vec![mount_point.as_os_str().to_owned()];
        let status = self.runner.run(&self.program, &args).await?;

        if !status.success() {
            return Err(DaemonError::UnmountFailed {
                device: device.to_path_buf(),
                mount_point,
                status,
            });
        }

        info!(
            "Device {} successfully unmounted (mount point: {})",
            device.display(),
            mount_point.display()
        );

        let directory_removed = if !self.remove_mount_points {
            false
        } else if !mount_point.starts_with(&self.prefix) {
            // Only directories under the prefix belong to the daemon
            debug!(
                "Keeping {}: outside {}",
                mount_point.display(),
                self.prefix.display()
            );
            false
        } else {
            remove_mount_point(&mount_point).await
        };

        Ok(UnmountOutcome::Unmounted {
            mount_point,
            directory_removed,
        })
    }
}

/// Removal failures are logged; the unmount itself stands
async fn remove_mount_point(path: &Path) -> bool {
    match tokio::fs::remove_dir(path).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to delete {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedRunner, TEST_UMOUNT};
    use hotmount_core::MemoryMountTable;

    fn setup(
        runner: ScriptedRunner,
        remove: bool,
    ) -> (tempfile::TempDir, UnmountExecutor, Arc<ScriptedRunner>) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DaemonConfig::with_prefix(dir.path());
        config.unmount_program = PathBuf::from(TEST_UMOUNT);
        config.remove_mount_points = remove;
        let oracle = MountOracle::new(runner.table.clone());
        let runner = Arc::new(runner);
        let executor = UnmountExecutor::new(&config, oracle, runner.clone());
        (dir, executor, runner)
    }

    #[tokio::test]
    async fn test_not_mounted_is_noop() {
        let (dir, executor, runner) = setup(ScriptedRunner::new(MemoryMountTable::new()), true);
        let untouched = dir.path().join("USB1");
        std::fs::create_dir(&untouched).unwrap();

        let outcome = executor.unmount(Path::new("/dev/sdb1")).await.unwrap();

        assert_eq!(outcome, UnmountOutcome::NotMounted);
        assert!(runner.calls().is_empty());
        assert!(untouched.is_dir());
    }

    #[tokio::test]
    async fn test_unmount_removes_directory() {
        let table = MemoryMountTable::new();
        let (dir, executor, runner) = setup(ScriptedRunner::new(table.clone()), true);
        let mount_point = dir.path().join("USB1");
        std::fs::create_dir(&mount_point).unwrap();
        table.insert("/dev/sdb1", &mount_point);

        let outcome = executor.unmount(Path::new("/dev/sdb1")).await.unwrap();

        assert_eq!(
            outcome,
            UnmountOutcome::Unmounted {
                mount_point: mount_point.clone(),
                directory_removed: true,
            }
        );
        assert_eq!(
            runner.calls(),
            vec![(PathBuf::from(TEST_UMOUNT), vec![mount_point.clone().into_os_string()])]
        );
        assert!(!mount_point.exists());
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_directory_kept_when_removal_disabled() {
        let table = MemoryMountTable::new();
        let (dir, executor, _) = setup(ScriptedRunner::new(table.clone()), false);
        let mount_point = dir.path().join("KEEP");
        std::fs::create_dir(&mount_point).unwrap();
        table.insert("/dev/sdb1", &mount_point);

        let outcome = executor.unmount(Path::new("/dev/sdb1")).await.unwrap();

        assert!(matches!(
            outcome,
            UnmountOutcome::Unmounted {
                directory_removed: false,
                ..
            }
        ));
        assert!(mount_point.is_dir());
    }

    #[tokio::test]
    async fn test_directory_outside_prefix_is_kept() {
        let table = MemoryMountTable::new();
        let (_dir, executor, runner) = setup(ScriptedRunner::new(table.clone()), true);
        let elsewhere = tempfile::tempdir().unwrap();
        let mount_point = elsewhere.path().join("manual");
        std::fs::create_dir(&mount_point).unwrap();
        table.insert("/dev/sdb1", &mount_point);

        let outcome = executor.unmount(Path::new("/dev/sdb1")).await.unwrap();

        assert_eq!(
            outcome,
            UnmountOutcome::Unmounted {
                mount_point: mount_point.clone(),
                directory_removed: false,
            }
        );
        assert_eq!(runner.calls().len(), 1);
        assert!(mount_point.is_dir());
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_removal_failure_does_not_fail_unmount() {
        let table = MemoryMountTable::new();
        let (dir, executor, _) = setup(ScriptedRunner::new(table.clone()), true);
        let mount_point = dir.path().join("BUSY");
        std::fs::create_dir(&mount_point).unwrap();
        std::fs::write(mount_point.join("leftover"), b"data").unwrap();
        table.insert("/dev/sdb1", &mount_point);

        let outcome = executor.unmount(Path::new("/dev/sdb1")).await.unwrap();

        assert!(matches!(
            outcome,
            UnmountOutcome::Unmounted {
                directory_removed: false,
                ..
            }
        ));
        assert!(mount_point.is_dir());
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_unmount_failure_leaves_everything() {
        let table = MemoryMountTable::new();
        let (dir, executor, _) = setup(ScriptedRunner::failing(table.clone(), 32), true);
        let mount_point = dir.path().join("STUCK");
        std::fs::create_dir(&mount_point).unwrap();
        table.insert("/dev/sdb1", &mount_point);

        let err = executor.unmount(Path::new("/dev/sdb1")).await.unwrap_err();

        assert!(matches!(err, DaemonError::UnmountFailed { .. }));
        assert!(mount_point.is_dir());
        assert_eq!(table.len(), 1);
    }
}
