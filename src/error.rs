use crate::types::{SequenceNumber, StreamStatus};

use std::sync::{MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, Error>;

fn checkpoint(sequence_number: &Option<SequenceNumber>) -> String {
    sequence_number
        .as_ref()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "none".into())
}

#[derive(Debug, Error)]
pub enum Error {
    /// The stream, table or shard does not exist.
    #[error("Not found: `{0}`")]
    NotFound(String),

    /// The stream is being created or deleted. Poll again later.
    #[error("Stream `{stream_arn}` is {status}")]
    Transient {
        stream_arn: String,
        status: StreamStatus,
    },

    #[error("Invalid shard iterator policy: {0}")]
    InvalidPolicy(String),

    #[error("Shard iterator of `{shard_id}` has expired")]
    CursorExpired { shard_id: String },

    #[error("Throttled while reading `{shard_id}` (checkpoint: {})", checkpoint(.last_sequence_number))]
    Throttled {
        shard_id: String,
        last_sequence_number: Option<SequenceNumber>,
    },

    /// The shard aged out of retention entirely before it was fully read.
    #[error("Shard `{shard_id}` is gone (checkpoint: {})", checkpoint(.last_sequence_number))]
    ShardGone {
        shard_id: String,
        last_sequence_number: Option<SequenceNumber>,
    },

    /// The position is older than the trim horizon. Newer records of the shard are still
    /// retained.
    #[error("Position of `{shard_id}` is behind the trim horizon (checkpoint: {})", checkpoint(.last_sequence_number))]
    Trimmed {
        shard_id: String,
        last_sequence_number: Option<SequenceNumber>,
    },

    #[error("`{operation}` timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Failed to {operation}: {error}")]
    Transport {
        operation: String,
        error: anyhow::Error,
    },
}

impl Error {
    pub fn transport<T: Into<String>>(operation: T, error: anyhow::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            error,
        }
    }

    /// Whether repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transient { .. }
                | Self::Throttled { .. }
                | Self::Timeout { .. }
                | Self::Transport { .. }
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Self::transport("access shared state", error)
    }
}

pub fn from_guard<T>(error: PoisonError<MutexGuard<'_, T>>) -> anyhow::Error {
    error!("{:#?}", error);
    anyhow::anyhow!("{}", error)
}
