//! Errors raised by the content layer

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    /// A post file exists but could not be read as UTF-8 text
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking conversion task panicked or was cancelled
    #[error("markdown conversion task failed: {0}")]
    Render(#[from] tokio::task::JoinError),
}
