//! Live mount table access
//!
//! The table is owned by the kernel and changes under our feet, so readers
//! never cache: every call to [`MountTableReader::entries`] reflects the
//! table as it is right now.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::error::{Error, Result};
use crate::DEFAULT_MOUNT_TABLE;

/// One line of the mount table, reduced to the fields we use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTableEntry {
    /// Source device, e.g. `/dev/sdb1`
    pub device_node: String,
    /// Directory the device is mounted on
    pub mount_path: PathBuf,
}

impl MountTableEntry {
    pub fn new(device_node: impl Into<String>, mount_path: impl Into<PathBuf>) -> Self {
        Self {
            device_node: device_node.into(),
            mount_path: mount_path.into(),
        }
    }
}

/// Source of mount table snapshots
pub trait MountTableReader: Send + Sync {
    /// Current entries in table order. An unreadable table reads as empty.
    fn entries(&self) -> Vec<MountTableEntry>;
}

/// Reads the kernel's mount table file (`/proc/self/mounts` by default)
#[derive(Debug, Clone)]
pub struct ProcMountTable {
    path: PathBuf,
}

impl Default for ProcMountTable {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_TABLE)
    }
}

impl ProcMountTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the table, surfacing IO errors
    pub fn read(&self) -> Result<Vec<MountTableEntry>> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| Error::MountTable {
            path: self.path.clone(),
            source,
        })?;
        Ok(parse_mount_table(&content))
    }
}

impl MountTableReader for ProcMountTable {
    fn entries(&self) -> Vec<MountTableEntry> {
        match self.read() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{}; treating mount table as empty", e);
                Vec::new()
            }
        }
    }
}

/// Parse mount table text (`fstab(5)` layout)
pub fn parse_mount_table(content: &str) -> Vec<MountTableEntry> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_path = fields.next()?;
            Some(MountTableEntry {
                device_node: unescape_field(device),
                mount_path: PathBuf::from(unescape_field(mount_path)),
            })
        })
        .collect()
}

/// Decode the kernel's three-digit octal escapes (`\040` and friends)
fn unescape_field(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Shared in-memory table, for tests and simulations
#[derive(Debug, Clone, Default)]
pub struct MemoryMountTable {
    entries: Arc<RwLock<Vec<MountTableEntry>>>,
}

impl MemoryMountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<MountTableEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Append an entry at the end of the table
    pub fn insert(&self, device_node: impl Into<String>, mount_path: impl Into<PathBuf>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(MountTableEntry::new(device_node, mount_path));
    }

    /// Remove the first entry mounted on `mount_path`
    pub fn remove_mount_path(&self, mount_path: &Path) -> Option<MountTableEntry> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let index = entries.iter().position(|e| e.mount_path == mount_path)?;
        Some(entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MountTableReader for MemoryMountTable {
    fn entries(&self) -> Vec<MountTableEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda2 / ext4 rw,relatime 0 0
# comment line
/dev/sdb1 /media/My\\040Disk vfat rw,relatime 0 0

/dev/sdc1 /media/DATA ext4 rw 0 0
";

    #[test]
    fn test_parse_mount_table() {
        let entries = parse_mount_table(SAMPLE);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], MountTableEntry::new("proc", "/proc"));
        assert_eq!(entries[1], MountTableEntry::new("/dev/sda2", "/"));
        assert_eq!(
            entries[2],
            MountTableEntry::new("/dev/sdb1", "/media/My Disk")
        );
        assert_eq!(entries[3], MountTableEntry::new("/dev/sdc1", "/media/DATA"));
    }

    #[test]
    fn test_parse_skips_short_lines() {
        let entries = parse_mount_table("lonely\n/dev/sdb1 /mnt\n");
        assert_eq!(entries, vec![MountTableEntry::new("/dev/sdb1", "/mnt")]);
    }

    #[test]
    fn test_unescape_field() {
        assert_eq!(unescape_field("plain"), "plain");
        assert_eq!(unescape_field("a\\040b"), "a b");
        assert_eq!(unescape_field("tab\\011x"), "tab\tx");
        assert_eq!(unescape_field("back\\134slash"), "back\\slash");
        // Not an escape: left as is
        assert_eq!(unescape_field("x\\9yz"), "x\\9yz");
        assert_eq!(unescape_field("trail\\04"), "trail\\04");
    }

    #[test]
    fn test_proc_mount_table_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mounts");
        std::fs::write(&path, SAMPLE).unwrap();

        let table = ProcMountTable::new(&path);
        assert_eq!(table.entries().len(), 4);

        // Every call re-reads the file
        std::fs::write(&path, "/dev/sdd1 /media/NEW ext4 rw 0 0\n").unwrap();
        assert_eq!(
            table.entries(),
            vec![MountTableEntry::new("/dev/sdd1", "/media/NEW")]
        );
    }

    #[test]
    fn test_missing_table_reads_empty() {
        let table = ProcMountTable::new("/nonexistent/hotmount/mounts");
        assert!(table.read().is_err());
        assert!(table.entries().is_empty());
    }

    #[test]
    fn test_memory_table() {
        let table = MemoryMountTable::new();
        assert!(table.is_empty());

        table.insert("/dev/sdb1", "/media/A");
        let shared = table.clone();
        shared.insert("/dev/sdc1", "/media/B");
        assert_eq!(table.len(), 2);

        let removed = table.remove_mount_path(Path::new("/media/A")).unwrap();
        assert_eq!(removed.device_node, "/dev/sdb1");
        assert_eq!(
            shared.entries(),
            vec![MountTableEntry::new("/dev/sdc1", "/media/B")]
        );
        assert!(table.remove_mount_path(Path::new("/media/A")).is_none());
    }
}
