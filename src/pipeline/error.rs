use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("producer failed: {0}")]
    Producer(#[from] io::Error),

    #[error("producer timed out after {0:?}")]
    Timeout(Duration),

    #[error("shared computation for {key} failed: {message}")]
    Coalesced { key: String, message: String },
}
