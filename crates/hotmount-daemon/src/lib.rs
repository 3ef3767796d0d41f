//! Hotmount Daemon - Automatic mounting of removable partitions
//!
//! This crate provides:
//! - A udev event source restricted to block partitions
//! - Mount and unmount executors delegating to privileged helpers
//! - The dispatch loop tying hotplug events to mount operations
//! - Startup checks (privileges, mount prefix)

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event_source;
pub mod mount;
pub mod runner;
pub mod startup;
pub mod unmount;

#[cfg(test)]
mod test_support;

pub use config::DaemonConfig;
pub use dispatcher::{Cycle, DispatchOutcome, Dispatcher, DispatcherState};
pub use error::{DaemonError, Result};
pub use event_source::{ChannelEventSource, EventSource};
#[cfg(target_os = "linux")]
pub use event_source::UdevEventSource;
pub use mount::MountExecutor;
pub use runner::{CommandRunner, ProcessRunner};
pub use unmount::{UnmountExecutor, UnmountOutcome};
