//! Hotmount Core - Device events, mount table queries and mount point naming
//!
//! This crate holds the synchronous half of the automounter:
//! - The device event model delivered by the hotplug source
//! - Parsing and reading of the live mount table
//! - The mount table oracle ("is this mounted, and where?")
//! - Collision-free mount point name generation

pub mod error;
pub mod event;
pub mod mount_table;
pub mod namer;
pub mod oracle;

pub use error::{Error, Result};
pub use event::{DeviceAction, DeviceEvent};
pub use mount_table::{MemoryMountTable, MountTableEntry, MountTableReader, ProcMountTable};
pub use namer::MountPointNamer;
pub use oracle::MountOracle;

/// Directory under which every mount point is created
pub const DEFAULT_MOUNT_PREFIX: &str = "/media/";

/// Identity used when a device carries neither a label nor a model
pub const FALLBACK_IDENTITY: &str = "_";

/// Appended to a candidate mount point until it no longer collides
pub const COLLISION_SUFFIX: &str = "_";

/// Maximum path length, terminating NUL included
pub const PATH_MAX: usize = 4096;

/// Default live mount table source
pub const DEFAULT_MOUNT_TABLE: &str = "/proc/self/mounts";
