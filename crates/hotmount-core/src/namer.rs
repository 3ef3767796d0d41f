//! Mount point name generation
//!
//! Turns the label (or model) of a freshly attached partition into a
//! directory under the mount prefix. Candidates that are already live
//! mount points, or that exist as something other than a directory, get
//! [`COLLISION_SUFFIX`] appended until one is usable. An existing,
//! unmounted directory is reused as is.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::DeviceEvent;
use crate::oracle::MountOracle;
use crate::{COLLISION_SUFFIX, DEFAULT_MOUNT_PREFIX, FALLBACK_IDENTITY, PATH_MAX};

/// Derives unique mount directories under a fixed prefix
#[derive(Debug, Clone)]
pub struct MountPointNamer {
    prefix: PathBuf,
    oracle: MountOracle,
}

impl MountPointNamer {
    pub fn new(prefix: impl Into<PathBuf>, oracle: MountOracle) -> Self {
        Self {
            prefix: prefix.into(),
            oracle,
        }
    }

    /// Namer rooted at [`DEFAULT_MOUNT_PREFIX`]
    pub fn with_oracle(oracle: MountOracle) -> Self {
        Self::new(DEFAULT_MOUNT_PREFIX, oracle)
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Generate the mount point for an attached device
    pub fn generate(&self, event: &DeviceEvent) -> Result<PathBuf> {
        let identity = sanitize_identity(event.identity().unwrap_or(FALLBACK_IDENTITY));
        self.generate_for_identity(&identity)
    }

    /// Generate a mount point for an already sanitized identity
    pub fn generate_for_identity(&self, identity: &str) -> Result<PathBuf> {
        let mut candidate: OsString = self.prefix.join(identity).into_os_string();

        loop {
            if candidate.len() >= PATH_MAX {
                return Err(Error::NameGeneration {
                    identity: identity.to_string(),
                    max: PATH_MAX,
                });
            }

            let path = Path::new(&candidate);
            if self.is_usable(path) {
                return Ok(PathBuf::from(candidate));
            }

            debug!("Mount point {} is taken", path.display());
            candidate.push(COLLISION_SUFFIX);
        }
    }

    /// Absent, or an existing directory nothing is mounted on
    fn is_usable(&self, path: &Path) -> bool {
        match std::fs::metadata(path) {
            Err(_) => true,
            Ok(meta) => meta.is_dir() && self.oracle.is_mount_point(path).is_none(),
        }
    }
}

/// Make a device-supplied identity safe to use as a single path component
///
/// Path separators, NUL and control characters become `_`. Identities that
/// are empty or would name the current/parent directory fall back to
/// [`FALLBACK_IDENTITY`].
pub fn sanitize_identity(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c == '/' || c.is_control() { '_' } else { c })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." => FALLBACK_IDENTITY.to_string(),
        _ => cleaned,
    }
}
