//! Mount execution
//!
//! Creates the mount point and hands the actual mount to the privileged
//! helper. Nothing is rolled back on failure: a directory created for a
//! mount that then fails stays in place and is reused on the next attach.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::DaemonConfig;
use crate::error::{DaemonError, Result};
use crate::runner::CommandRunner;

/// Filesystem type passed when udev did not report one
pub const AUTO_FS_TYPE: &str = "auto";

/// Mounts a device on a prepared directory
pub struct MountExecutor {
    runner: Arc<dyn CommandRunner>,
    config: DaemonConfig,
}

impl MountExecutor {
    pub fn new(config: &DaemonConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            config: config.clone(),
        }
    }

    /// Mount `device` on `mount_point` as `fs_type`
    pub async fn mount(
        &self,
        device: &Path,
        mount_point: &Path,
        fs_type: Option<&str>,
    ) -> Result<()> {
        let fs_type = self.config.resolve_fs_type(fs_type.unwrap_or(AUTO_FS_TYPE));

        self.create_mount_point(mount_point).await?;

        let args: Vec<OsString> = vec![
            "-t".into(),
            fs_type.into(),
            device.as_os_str().to_owned(),
            mount_point.as_os_str().to_owned(),
        ];
        let status = self.runner.run(&self.config.mount_program, &args).await?;

        if !status.success() {
            return Err(DaemonError::MountFailed {
                device: device.to_path_buf(),
                mount_point: mount_point.to_path_buf(),
                status,
            });
        }

        info!(
            "Device {} successfully mounted on {}",
            device.display(),
            mount_point.display()
        );
        Ok(())
    }

    async fn create_mount_point(&self, path: &Path) -> Result<()> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.mode(self.config.mount_point_mode);

        match builder.create(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(source) => Err(DaemonError::CreateMountPoint {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
