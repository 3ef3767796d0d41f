//! Mount table oracle
//!
//! Read-only questions against the live mount table. When the table holds
//! more than one matching entry the first one in table order wins.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::mount_table::{MountTableReader, ProcMountTable};

/// Answers "is this mounted, and where?" from a fresh table read
#[derive(Clone)]
pub struct MountOracle {
    reader: Arc<dyn MountTableReader>,
}

impl fmt::Debug for MountOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountOracle").finish_non_exhaustive()
    }
}

impl Default for MountOracle {
    fn default() -> Self {
        Self::new(ProcMountTable::default())
    }
}

impl MountOracle {
    pub fn new(reader: impl MountTableReader + 'static) -> Self {
        Self {
            reader: Arc::new(reader),
        }
    }

    pub fn from_shared(reader: Arc<dyn MountTableReader>) -> Self {
        Self { reader }
    }

    /// Device backing `path` if `path` is a live mount point
    pub fn is_mount_point(&self, path: &Path) -> Option<String> {
        self.reader
            .entries()
            .into_iter()
            .find(|entry| entry.mount_path == path)
            .map(|entry| entry.device_node)
    }

    /// Where `device_node` is mounted, if it is
    pub fn is_mounted(&self, device_node: &Path) -> Option<PathBuf> {
        self.reader
            .entries()
            .into_iter()
            .find(|entry| Path::new(&entry.device_node) == device_node)
            .map(|entry| entry.mount_path)
    }
}
