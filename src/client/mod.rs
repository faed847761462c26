mod dynamodb;
#[cfg(test)]
pub mod mock;

use crate::types::{
    IteratorPosition, KeySchemaElement, Record, Shard, StreamStatus, StreamViewType,
};

use axum::async_trait;
use thiserror::Error;

pub use dynamodb::{DynamodbClient, DynamodbClientBuilder};
#[cfg(test)]
pub use mock::{MockClient, MockFailure, MockSource};

/// One page of `DescribeStream`.
#[derive(Debug, Clone)]
pub struct DescribeStreamOutput {
    pub stream_arn: String,
    pub stream_label: Option<String>,
    pub table_name: Option<String>,
    pub status: StreamStatus,
    pub view_type: Option<StreamViewType>,
    pub key_schema: Vec<KeySchemaElement>,
    pub shards: Vec<Shard>,

    /// The shard ID where the operation stopped. `None` means the last page has been read.
    pub last_shard_id: Option<String>,
}

/// One page of `ListStreams`.
#[derive(Debug, Clone)]
pub struct ListStreamsOutput {
    pub stream_arns: Vec<String>,

    /// The stream ARN where the operation stopped. `None` means the last page has been read.
    pub last_stream_arn: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GetShardIteratorOutput {
    pub iterator: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GetRecordsOutput {
    pub records: Vec<Record>,

    /// `None` means the shard has been closed and the iterator will not return any more data.
    pub next_iterator: Option<String>,
}

/// Failures of the underlying request/response client, classified the way the stream service
/// reports them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Requested resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Shard iterator has expired")]
    ExpiredIterator,
    #[error("Request rate is too high")]
    LimitExceeded,
    #[error("Requested data is beyond the trim horizon")]
    TrimmedDataAccess,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[async_trait]
pub trait Client: Send + Sync {
    async fn describe_stream(
        &self,
        stream_arn: &str,
        exclusive_start_shard_id: Option<String>,
    ) -> ClientResult<DescribeStreamOutput>;

    async fn list_streams(
        &self,
        table_name: &str,
        exclusive_start_stream_arn: Option<String>,
    ) -> ClientResult<ListStreamsOutput>;

    async fn get_shard_iterator(
        &self,
        stream_arn: &str,
        shard_id: &str,
        position: &IteratorPosition,
    ) -> ClientResult<GetShardIteratorOutput>;

    async fn get_records(&self, iterator: &str, limit: Option<i32>)
        -> ClientResult<GetRecordsOutput>;
}
