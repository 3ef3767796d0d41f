//! Scripted helpers shared by the unit tests

use std::ffi::OsString;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Mutex;

use async_trait::async_trait;
use hotmount_core::MemoryMountTable;

use crate::error::{DaemonError, Result};
use crate::runner::CommandRunner;

pub const TEST_MOUNT: &str = "/test/mount";
pub const TEST_UMOUNT: &str = "/test/umount";

/// Pretends to be mount/umount by editing an in-memory table
pub struct ScriptedRunner {
    pub table: MemoryMountTable,
    pub exit_code: i32,
    pub spawn_fails: bool,
    pub calls: Mutex<Vec<(PathBuf, Vec<OsString>)>>,
}

impl ScriptedRunner {
    pub fn new(table: MemoryMountTable) -> Self {
        Self {
            table,
            exit_code: 0,
            spawn_fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(table: MemoryMountTable, exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::new(table)
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<OsString>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &Path, args: &[OsString]) -> Result<ExitStatus> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec()));

        if self.spawn_fails {
            return Err(DaemonError::Spawn {
                program: program.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        if self.exit_code != 0 {
            return Ok(ExitStatus::from_raw(self.exit_code << 8));
        }

        if program == Path::new(TEST_MOUNT) {
            self.table
                .insert(args[2].to_string_lossy().into_owned(), PathBuf::from(&args[3]));
        } else if program == Path::new(TEST_UMOUNT) {
            self.table.remove_mount_path(Path::new(&args[0]));
        }
        Ok(ExitStatus::from_raw(0))
    }
}
