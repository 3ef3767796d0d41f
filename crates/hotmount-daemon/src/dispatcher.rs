//! Event dispatch loop
//!
//! Pulls one hotplug event at a time and routes it: attach goes through
//! the namer and the mount executor, detach goes to the unmount executor.
//! Every failure is logged and dropped here; the loop always carries on
//! with the next event. There is no retry: a failed attach waits for the
//! next hotplug event for that device.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hotmount_core::{DeviceAction, DeviceEvent, MountOracle, MountPointNamer};
use tracing::{debug, error, info, warn};

use crate::config::DaemonConfig;
use crate::error::{DaemonError, Result};
use crate::event_source::EventSource;
use crate::mount::MountExecutor;
use crate::runner::CommandRunner;
use crate::unmount::{UnmountExecutor, UnmountOutcome};

/// Where the dispatcher is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Waiting for the next event
    Idle,
    /// Processing one event; only held inside [`Dispatcher::handle`]
    Handling,
}

/// What happened to a single event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Device mounted on the given path
    Mounted(PathBuf),
    /// Attach for a device the mount table already lists
    AlreadyMounted(PathBuf),
    /// No mount point could be named
    NameGenerationFailed,
    /// Directory creation, spawn or the helper itself failed
    MountFailed,
    /// Device unmounted from the given path
    Unmounted(PathBuf),
    /// Detach for a device that was not mounted
    NotMounted,
    /// Unmount helper failed or could not be spawned
    UnmountFailed,
}

/// One turn of the dispatch loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// An event was handled
    Handled(DispatchOutcome),
    /// The source reported an error instead of an event
    NoEvent,
    /// The source will never yield again
    SourceExhausted,
}

/// The daemon's main loop
pub struct Dispatcher<S: EventSource> {
    source: S,
    oracle: MountOracle,
    namer: MountPointNamer,
    mounter: MountExecutor,
    unmounter: UnmountExecutor,
    delay: Duration,
    state: DispatcherState,
}

impl<S: EventSource> Dispatcher<S> {
    pub fn new(
        config: &DaemonConfig,
        source: S,
        oracle: MountOracle,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            source,
            namer: MountPointNamer::new(config.mount_prefix.clone(), oracle.clone()),
            mounter: MountExecutor::new(config, runner.clone()),
            unmounter: UnmountExecutor::new(config, oracle.clone(), runner),
            oracle,
            delay: config.dispatch_delay,
            state: DispatcherState::Idle,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Process events forever.
    ///
    /// Only returns if the event source is exhausted, which a live udev
    /// monitor never is.
    pub async fn run(&mut self) -> Result<()> {
        info!("Dispatcher started");
        loop {
            if let Cycle::SourceExhausted = self.step().await {
                return Err(DaemonError::EventSourceClosed);
            }
        }
    }

    /// Wait for one event, handle it and observe the dispatch delay
    pub async fn step(&mut self) -> Cycle {
        let cycle = match self.source.next_event().await {
            Ok(Some(event)) => Cycle::Handled(self.handle(event).await),
            Ok(None) => return Cycle::SourceExhausted,
            Err(e) => {
                error!("{}", e);
                Cycle::NoEvent
            }
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        cycle
    }

    /// Handle one event end to end
    pub async fn handle(&mut self, event: DeviceEvent) -> DispatchOutcome {
        self.state = DispatcherState::Handling;
        debug!(
            "Dispatcher {:?}: {} {}",
            self.state,
            event.action,
            event.device_node().display()
        );
        let outcome = match event.action {
            DeviceAction::Attach => self.attach(&event).await,
            DeviceAction::Detach => self.detach(&event).await,
        };
        self.state = DispatcherState::Idle;
        debug!("Dispatcher {:?}: {:?}", self.state, outcome);
        outcome
    }

    async fn attach(&self, event: &DeviceEvent) -> DispatchOutcome {
        let device = event.device_node();
        info!("[{}] device {} added", event.action, device.display());

        if let Some(mount_point) = self.oracle.is_mounted(device) {
            info!(
                "Device {} is already mounted on {}",
                device.display(),
                mount_point.display()
            );
            return DispatchOutcome::AlreadyMounted(mount_point);
        }

        let mount_point = match self.namer.generate(event) {
            Ok(path) => path,
            Err(e) => {
                error!("{} (device {})", e, device.display());
                return DispatchOutcome::NameGenerationFailed;
            }
        };

        match self
            .mounter
            .mount(device, &mount_point, event.fs_type.as_deref())
            .await
        {
            Ok(()) => DispatchOutcome::Mounted(mount_point),
            Err(e) => {
                error!("{}", e);
                warn!("Unplug and plug {} again to retry", device.display());
                DispatchOutcome::MountFailed
            }
        }
    }

    async fn detach(&self, event: &DeviceEvent) -> DispatchOutcome {
        let device = event.device_node();
        info!("[{}] device {} removed", event.action, device.display());

        match self.unmounter.unmount(device).await {
            Ok(UnmountOutcome::NotMounted) => DispatchOutcome::NotMounted,
            Ok(UnmountOutcome::Unmounted { mount_point, .. }) => {
                DispatchOutcome::Unmounted(mount_point)
            }
            Err(e) => {
                error!("{}", e);
                DispatchOutcome::UnmountFailed
            }
        }
    }

    /// Tear down the dispatcher and close its event source
    pub fn shutdown(self) {
        self.source.close();
    }
}
