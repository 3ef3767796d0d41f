//! Error types for the Hotmount core library

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No usable mount point could be derived within the path length bound
    #[error("Failed to generate mount point for '{identity}': path would exceed {max} bytes")]
    NameGeneration { identity: String, max: usize },

    #[error("Mount table error ({path}): {source}")]
    MountTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown device action: {0}")]
    UnknownAction(String),
}
