use std::path::PathBuf;

use pmtree_core::{CodecError, PmError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Pm(#[from] PmError),
}

impl HostError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| HostError::Io {
            operation,
            path,
            source,
        }
    }
}
