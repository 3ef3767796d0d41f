//! Startup checks run before the dispatch loop

use std::io::ErrorKind;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{DaemonError, Result};

/// Fail unless the effective uid is root
pub fn ensure_root() -> Result<()> {
    // SAFETY: geteuid has no preconditions and cannot fail
    let euid = unsafe { libc::geteuid() };
    check_root(euid)
}

fn check_root(euid: u32) -> Result<()> {
    if euid == 0 {
        Ok(())
    } else {
        Err(DaemonError::InsufficientPrivilege { euid })
    }
}

/// Clear the umask so directory modes are applied as configured
pub fn clear_umask() {
    // SAFETY: umask has no preconditions and cannot fail
    let previous = unsafe { libc::umask(0) };
    debug!("Cleared umask (was {:o})", previous);
}

/// Create the mount prefix directory if it does not exist yet
pub fn ensure_prefix(prefix: &Path, mode: u32) -> Result<()> {
    if prefix.exists() {
        return Ok(());
    }

    match std::fs::DirBuilder::new().mode(mode).create(prefix) {
        Ok(()) => {
            info!("Created mount prefix {}", prefix.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(DaemonError::Prefix {
            path: prefix.to_path_buf(),
            source,
        }),
    }
}
