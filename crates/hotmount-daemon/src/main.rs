//! Hotmount Daemon - Main entry point
//!
//! Mounts removable partitions under the mount prefix as they are plugged
//! in and unmounts them when they go away.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hotmount_core::{MountOracle, ProcMountTable};
use hotmount_daemon::{startup, DaemonConfig, DaemonError, Dispatcher, ProcessRunner};

// udev handles are not Send, so the whole daemon runs on one thread
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotmount_daemon=info,hotmount_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hotmount daemon v{}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), DaemonError> {
    let config = DaemonConfig::default();

    startup::ensure_root()?;
    startup::clear_umask();
    startup::ensure_prefix(&config.mount_prefix, config.prefix_mode)?;

    let source = open_event_source()?;
    let oracle = MountOracle::new(ProcMountTable::new(&config.mount_table_path));

    let mut dispatcher = Dispatcher::new(&config, source, oracle, Arc::new(ProcessRunner));

    info!(
        "Daemon started, mounting under {}",
        config.mount_prefix.display()
    );

    dispatcher.run().await
}

#[cfg(target_os = "linux")]
fn open_event_source() -> Result<hotmount_daemon::UdevEventSource, DaemonError> {
    hotmount_daemon::UdevEventSource::open()
}

#[cfg(not(target_os = "linux"))]
fn open_event_source() -> Result<hotmount_daemon::ChannelEventSource, DaemonError> {
    Err(DaemonError::Udev(
        "udev is only available on Linux".to_string(),
    ))
}
