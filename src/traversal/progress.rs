use crate::cursor::CursorState;
use crate::types::{SequenceNumber, StreamStatus};

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShardState {
    /// The parent has not been completed yet.
    Waiting,
    Unopened,
    Open,
    Expired,
    Exhausted,
    Completed,
}

impl From<CursorState> for ShardState {
    fn from(state: CursorState) -> ShardState {
        match state {
            CursorState::Unopened => ShardState::Unopened,
            CursorState::Open => ShardState::Open,
            CursorState::Expired => ShardState::Expired,
            CursorState::Exhausted => ShardState::Exhausted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardProgress {
    pub shard_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub state: ShardState,
    pub checkpoint: Option<SequenceNumber>,
}

/// Snapshot of a traversal published to its half.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub stream_arn: String,
    pub status: Option<StreamStatus>,
    pub finished: bool,
    pub shards: Vec<ShardProgress>,
}

impl Progress {
    pub fn new<T: Into<String>>(stream_arn: T) -> Self {
        Self {
            stream_arn: stream_arn.into(),
            status: None,
            finished: false,
            shards: vec![],
        }
    }

    pub fn shard(&self, shard_id: &str) -> Option<&ShardProgress> {
        self.shards.iter().find(|s| s.shard_id == shard_id)
    }

    /// Last delivered sequence number per shard. Save it along with `completed` to resume later.
    pub fn checkpoints(&self) -> HashMap<String, SequenceNumber> {
        self.shards
            .iter()
            .filter_map(|s| Some((s.shard_id.clone(), s.checkpoint.clone()?)))
            .collect()
    }

    pub fn completed(&self) -> Vec<String> {
        self.shards
            .iter()
            .filter(|s| s.state == ShardState::Completed)
            .map(|s| s.shard_id.clone())
            .collect()
    }
}
