use super::{KeySchemaElement, Shard, StreamStatus, StreamViewType};

use serde::Serialize;

/// A snapshot of a stream as returned by `DescribeStream`, with every page of shards merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamTopology {
    pub stream_arn: String,
    pub stream_label: Option<String>,
    pub table_name: Option<String>,
    pub status: StreamStatus,
    pub view_type: Option<StreamViewType>,
    pub key_schema: Vec<KeySchemaElement>,
    pub shards: Vec<Shard>,
}

impl StreamTopology {
    pub fn shard(&self, shard_id: &str) -> Option<&Shard> {
        self.shards.iter().find(|s| s.id() == shard_id)
    }
}
