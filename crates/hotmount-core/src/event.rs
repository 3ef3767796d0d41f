//! Hotplug device events
//!
//! One event is produced per udev notification for a block partition and
//! is consumed by a single dispatch cycle.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

/// Udev property carrying the volume label
pub const PROP_FS_LABEL: &str = "ID_FS_LABEL";

/// Udev property carrying the device model
pub const PROP_MODEL: &str = "ID_MODEL";

/// Udev property carrying the filesystem type
pub const PROP_FS_TYPE: &str = "ID_FS_TYPE";

/// What happened to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    /// Partition appeared ("add")
    Attach,
    /// Partition went away ("remove")
    Detach,
}

impl FromStr for DeviceAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(DeviceAction::Attach),
            "remove" => Ok(DeviceAction::Detach),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceAction::Attach => write!(f, "ADD"),
            DeviceAction::Detach => write!(f, "REMOVE"),
        }
    }
}

/// A single hotplug notification for a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    pub action: DeviceAction,
    /// Kernel device node, e.g. `/dev/sdb1`
    pub device_node: PathBuf,
    /// Volume label (`ID_FS_LABEL`)
    pub fs_label: Option<String>,
    /// Device model (`ID_MODEL`)
    pub fs_model: Option<String>,
    /// Filesystem type (`ID_FS_TYPE`)
    pub fs_type: Option<String>,
}

impl DeviceEvent {
    pub fn new(action: DeviceAction, device_node: impl Into<PathBuf>) -> Self {
        Self {
            action,
            device_node: device_node.into(),
            fs_label: None,
            fs_model: None,
            fs_type: None,
        }
    }

    /// Attach event with no properties
    pub fn attach(device_node: impl Into<PathBuf>) -> Self {
        Self::new(DeviceAction::Attach, device_node)
    }

    /// Detach event with no properties
    pub fn detach(device_node: impl Into<PathBuf>) -> Self {
        Self::new(DeviceAction::Detach, device_node)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.fs_label = Some(label.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.fs_model = Some(model.into());
        self
    }

    pub fn with_fs_type(mut self, fs_type: impl Into<String>) -> Self {
        self.fs_type = Some(fs_type.into());
        self
    }

    pub fn device_node(&self) -> &Path {
        &self.device_node
    }

    /// Raw identity used for naming: label, then model, else `None`.
    /// Blank values count as absent.
    pub fn identity(&self) -> Option<&str> {
        let present = |v: &&str| !v.trim().is_empty();
        self.fs_label
            .as_deref()
            .filter(present)
            .or(self.fs_model.as_deref().filter(present))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!("add".parse::<DeviceAction>().unwrap(), DeviceAction::Attach);
        assert_eq!(
            "remove".parse::<DeviceAction>().unwrap(),
            DeviceAction::Detach
        );
        assert!(matches!(
            "change".parse::<DeviceAction>(),
            Err(Error::UnknownAction(a)) if a == "change"
        ));
    }

    #[test]
    fn test_identity_prefers_label() {
        let event = DeviceEvent::attach("/dev/sdb1")
            .with_model("Cruzer")
            .with_label("USB1");
        assert_eq!(event.identity(), Some("USB1"));

        let event = DeviceEvent::attach("/dev/sdb1").with_model("Cruzer");
        assert_eq!(event.identity(), Some("Cruzer"));

        assert_eq!(DeviceEvent::attach("/dev/sdb1").identity(), None);
    }

    #[test]
    fn test_blank_label_falls_back_to_model() {
        let event = DeviceEvent::attach("/dev/sdb1")
            .with_label("")
            .with_model("Cruzer");
        assert_eq!(event.identity(), Some("Cruzer"));

        let event = DeviceEvent::attach("/dev/sdb1").with_label("  ").with_model(" ");
        assert_eq!(event.identity(), None);
    }
}
