//! Daemon configuration
//!
//! There is no configuration file and no command line: every value below
//! is a compile-time default. Tests build their own `DaemonConfig` to
//! point the daemon at scratch directories.

use std::path::PathBuf;
use std::time::Duration;

use hotmount_core::{DEFAULT_MOUNT_PREFIX, DEFAULT_MOUNT_TABLE};

/// Privileged mount helper
pub const MOUNT_PROGRAM: &str = "/sbin/mount";

/// Privileged unmount helper
pub const UNMOUNT_PROGRAM: &str = "/sbin/umount";

/// Pause observed after every dispatch cycle
pub const DISPATCH_DELAY: Duration = Duration::from_secs(1);

/// Mode for per-device mount points (rwxr-x---)
pub const MOUNT_POINT_MODE: u32 = 0o750;

/// Mode for the mount prefix itself (rwxr-xr-x)
pub const PREFIX_MODE: u32 = 0o755;

/// Filesystem type substitutions applied before mounting
#[cfg(feature = "ntfs-3g")]
pub const FS_TYPE_OVERRIDES: &[(&str, &str)] = &[("ntfs", "ntfs-3g")];

#[cfg(not(feature = "ntfs-3g"))]
pub const FS_TYPE_OVERRIDES: &[(&str, &str)] = &[];

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Directory every mount point is created under
    pub mount_prefix: PathBuf,

    /// Mount table consulted by the oracle
    pub mount_table_path: PathBuf,

    /// Program invoked as `<program> -t <fstype> <device> <dir>`
    pub mount_program: PathBuf,

    /// Program invoked as `<program> <dir>`
    pub unmount_program: PathBuf,

    /// Mode for mount point directories
    pub mount_point_mode: u32,

    /// Mode for the prefix directory
    pub prefix_mode: u32,

    /// Delay after each dispatch cycle
    pub dispatch_delay: Duration,

    /// Remove the mount point directory after a successful unmount
    pub remove_mount_points: bool,

    /// `(from, to)` filesystem type substitutions
    pub fs_type_overrides: Vec<(String, String)>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            mount_prefix: PathBuf::from(DEFAULT_MOUNT_PREFIX),
            mount_table_path: PathBuf::from(DEFAULT_MOUNT_TABLE),
            mount_program: PathBuf::from(MOUNT_PROGRAM),
            unmount_program: PathBuf::from(UNMOUNT_PROGRAM),
            mount_point_mode: MOUNT_POINT_MODE,
            prefix_mode: PREFIX_MODE,
            dispatch_delay: DISPATCH_DELAY,
            remove_mount_points: true,
            fs_type_overrides: FS_TYPE_OVERRIDES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl DaemonConfig {
    /// Defaults rooted at a different mount prefix
    pub fn with_prefix(prefix: impl Into<PathBuf>) -> Self {
        Self {
            mount_prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Driver to hand to the mount helper for `fs_type`
    pub fn resolve_fs_type<'a>(&'a self, fs_type: &'a str) -> &'a str {
        self.fs_type_overrides
            .iter()
            .find(|(from, _)| from == fs_type)
            .map(|(_, to)| to.as_str())
            .unwrap_or(fs_type)
    }
}
