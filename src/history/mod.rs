use std::path::PathBuf;

use thiserror::Error;

pub mod store;

pub use store::{export_file_name, HistoryStats, HistoryStore};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history document {path} is not a valid entry list: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write history document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
