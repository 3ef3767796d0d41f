//! Error types for the Hotmount daemon

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type alias for daemon operations
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Exit code for errors that are not tied to a startup step
pub const EXIT_FAILURE: u8 = 1;

/// Exit code when the daemon is not running as root
pub const EXIT_NO_PRIVILEGE: u8 = 1;

/// Exit code when the hotplug event source is unavailable
pub const EXIT_EVENT_SOURCE: u8 = 2;

/// Exit code when the mount prefix cannot be created
pub const EXIT_PREFIX: u8 = 3;

/// Errors that can occur in the daemon
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Not running with an effective uid of 0
    #[error("This program needs root privileges (effective uid is {euid})")]
    InsufficientPrivilege { euid: u32 },

    /// Mount prefix could not be created
    #[error("Failed to create prefix directory for mounting ({path}): {source}")]
    Prefix {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Udev error
    #[error("Udev error: {0}")]
    Udev(String),

    /// Event source stopped delivering events
    #[error("Hotplug event source closed")]
    EventSourceClosed,

    /// Mount point directory could not be created
    #[error("Failed to create mount point {path}: {source}")]
    CreateMountPoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Helper process could not be started
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mount helper exited unsuccessfully
    #[error("Failed to mount {device} on {mount_point} ({status})")]
    MountFailed {
        device: PathBuf,
        mount_point: PathBuf,
        status: ExitStatus,
    },

    /// Unmount helper exited unsuccessfully
    #[error("Failed to unmount device {device} (mount point: {mount_point}, {status})")]
    UnmountFailed {
        device: PathBuf,
        mount_point: PathBuf,
        status: ExitStatus,
    },
}

impl DaemonError {
    /// Process exit code for errors that abort startup
    pub fn exit_code(&self) -> u8 {
        match self {
            DaemonError::InsufficientPrivilege { .. } => EXIT_NO_PRIVILEGE,
            DaemonError::Udev(_) | DaemonError::EventSourceClosed => EXIT_EVENT_SOURCE,
            DaemonError::Prefix { .. } => EXIT_PREFIX,
            DaemonError::CreateMountPoint { .. }
            | DaemonError::Spawn { .. }
            | DaemonError::MountFailed { .. }
            | DaemonError::UnmountFailed { .. } => EXIT_FAILURE,
        }
    }
}
