//! Hotplug event sources
//!
//! The daemon pulls [`DeviceEvent`]s one at a time from an [`EventSource`].
//! On Linux the real source is a udev monitor filtered to block
//! partitions; [`ChannelEventSource`] feeds events from memory.

use async_trait::async_trait;
use hotmount_core::DeviceEvent;
use tokio::sync::mpsc;

use crate::error::Result;

/// Udev subsystem the monitor listens to
pub const SUBSYSTEM: &str = "block";

/// Udev device type the monitor listens to
pub const DEVTYPE: &str = "partition";

/// Owned handle to a stream of hotplug events
#[async_trait(?Send)]
pub trait EventSource {
    /// Wait for the next attach/detach event.
    ///
    /// `Ok(None)` means the source is exhausted and will never yield again.
    async fn next_event(&mut self) -> Result<Option<DeviceEvent>>;

    /// Release the underlying handles
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Event source fed through a channel
pub struct ChannelEventSource {
    rx: mpsc::UnboundedReceiver<DeviceEvent>,
}

impl ChannelEventSource {
    /// Create a source and the sender that feeds it
    pub fn channel() -> (mpsc::UnboundedSender<DeviceEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Source that yields `events` in order, then ends
    pub fn from_events(events: impl IntoIterator<Item = DeviceEvent>) -> Self {
        let (tx, source) = Self::channel();
        for event in events {
            // Receiver is alive in `source`
            let _ = tx.send(event);
        }
        source
    }
}

#[async_trait(?Send)]
impl EventSource for ChannelEventSource {
    async fn next_event(&mut self) -> Result<Option<DeviceEvent>> {
        Ok(self.rx.recv().await)
    }

    fn close(mut self) {
        self.rx.close();
    }
}

#[cfg(target_os = "linux")]
pub use udev_source::UdevEventSource;

#[cfg(target_os = "linux")]
mod udev_source {
    use std::ffi::OsStr;

    use async_trait::async_trait;
    use futures_util::StreamExt;
    use hotmount_core::event::{PROP_FS_LABEL, PROP_FS_TYPE, PROP_MODEL};
    use hotmount_core::{DeviceAction, DeviceEvent};
    use tokio_udev::{AsyncMonitorSocket, MonitorBuilder};
    use tracing::{debug, info};

    use super::{EventSource, DEVTYPE, SUBSYSTEM};
    use crate::error::{DaemonError, Result};

    /// Udev monitor restricted to block partitions
    pub struct UdevEventSource {
        socket: AsyncMonitorSocket,
    }

    impl UdevEventSource {
        /// Connect to udev and start receiving partition events
        pub fn open() -> Result<Self> {
            let builder = MonitorBuilder::new()
                .map_err(|e| DaemonError::Udev(e.to_string()))?
                .match_subsystem_devtype(SUBSYSTEM, DEVTYPE)
                .map_err(|e| DaemonError::Udev(e.to_string()))?;

            let monitor = builder.listen().map_err(|e| DaemonError::Udev(e.to_string()))?;

            let socket =
                AsyncMonitorSocket::new(monitor).map_err(|e| DaemonError::Udev(e.to_string()))?;

            info!("Listening for {}/{} udev events", SUBSYSTEM, DEVTYPE);
            Ok(Self { socket })
        }
    }

    #[async_trait(?Send)]
    impl EventSource for UdevEventSource {
        async fn next_event(&mut self) -> Result<Option<DeviceEvent>> {
            loop {
                let event = match self.socket.next().await {
                    Some(Ok(event)) => event,
                    Some(Err(e)) => return Err(DaemonError::Udev(e.to_string())),
                    None => return Ok(None),
                };

                let action = event.action().map(|a| a.to_string_lossy().to_string());
                debug!("Udev event: {:?} for {:?}", action, event.devpath());

                let Some(action) = action.and_then(|a| a.parse::<DeviceAction>().ok()) else {
                    continue;
                };
                let Some(devnode) = event.devnode() else {
                    continue;
                };

                let property = |key: &str| {
                    event
                        .property_value(key)
                        .map(OsStr::to_string_lossy)
                        .map(|v| v.into_owned())
                };

                return Ok(Some(DeviceEvent {
                    action,
                    device_node: devnode.to_path_buf(),
                    fs_label: property(PROP_FS_LABEL),
                    fs_model: property(PROP_MODEL),
                    fs_type: property(PROP_FS_TYPE),
                }));
            }
        }

        fn close(self) {
            // Dropping the socket drops the monitor and its udev context
            drop(self.socket);
            debug!("Udev monitor closed");
        }
    }
}
