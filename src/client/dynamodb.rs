use super::{
    Client, ClientError, ClientResult, DescribeStreamOutput, GetRecordsOutput,
    GetShardIteratorOutput, ListStreamsOutput,
};
use crate::types::{
    IteratorPosition, KeySchemaElement, Record, Shard, StreamStatus, StreamViewType,
};

use aws_sdk_dynamodbstreams::{
    config::Builder as StreamConfigBuilder,
    error::SdkError,
    operation::{
        describe_stream::DescribeStreamError, get_records::GetRecordsError,
        get_shard_iterator::GetShardIteratorError, list_streams::ListStreamsError,
    },
    types::StreamDescription,
    Client as StreamClient,
};
use axum::async_trait;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct DynamodbClient {
    stream_client: StreamClient,
}

impl DynamodbClient {
    pub async fn builder() -> DynamodbClientBuilder {
        DynamodbClientBuilder::new().await
    }
}

#[async_trait]
impl Client for DynamodbClient {
    async fn describe_stream(
        &self,
        stream_arn: &str,
        exclusive_start_shard_id: Option<String>,
    ) -> ClientResult<DescribeStreamOutput> {
        let description = self
            .stream_client
            .describe_stream()
            .stream_arn(stream_arn)
            .set_exclusive_start_shard_id(exclusive_start_shard_id)
            .send()
            .await
            .map_err(from_describe_stream_err)?
            .stream_description
            .ok_or(anyhow::anyhow!(
                "`stream_description` is None in `DescribeStreamOutput`"
            ))?;

        let StreamDescription {
            stream_arn: arn,
            stream_label,
            stream_status,
            stream_view_type,
            table_name,
            key_schema,
            shards,
            last_evaluated_shard_id,
            ..
        } = description;

        let shards = shards
            .unwrap_or_default()
            .into_iter()
            .filter_map(|shard| {
                Shard::try_from(shard)
                    .map_err(|err| warn!("Skip malformed shard: {err}"))
                    .ok()
            })
            .collect();

        Ok(DescribeStreamOutput {
            stream_arn: arn.unwrap_or_else(|| stream_arn.to_string()),
            stream_label,
            table_name,
            status: stream_status
                .map(StreamStatus::from)
                .unwrap_or(StreamStatus::Unknown),
            view_type: stream_view_type.map(StreamViewType::from),
            key_schema: key_schema
                .unwrap_or_default()
                .into_iter()
                .map(KeySchemaElement::from)
                .collect(),
            shards,
            last_shard_id: last_evaluated_shard_id,
        })
    }

    async fn list_streams(
        &self,
        table_name: &str,
        exclusive_start_stream_arn: Option<String>,
    ) -> ClientResult<ListStreamsOutput> {
        let output = self
            .stream_client
            .list_streams()
            .table_name(table_name)
            .set_exclusive_start_stream_arn(exclusive_start_stream_arn)
            .send()
            .await
            .map_err(from_list_streams_err)?;

        let stream_arns = output
            .streams
            .unwrap_or_default()
            .into_iter()
            .filter_map(|stream| stream.stream_arn)
            .collect();

        Ok(ListStreamsOutput {
            stream_arns,
            last_stream_arn: output.last_evaluated_stream_arn,
        })
    }

    async fn get_shard_iterator(
        &self,
        stream_arn: &str,
        shard_id: &str,
        position: &IteratorPosition,
    ) -> ClientResult<GetShardIteratorOutput> {
        self.stream_client
            .get_shard_iterator()
            .stream_arn(stream_arn)
            .shard_id(shard_id)
            .shard_iterator_type(position.kind().into())
            .set_sequence_number(position.sequence_number().map(|n| n.to_string()))
            .send()
            .await
            .map(|output| GetShardIteratorOutput {
                iterator: output.shard_iterator,
            })
            .map_err(from_get_iterator_err)
    }

    async fn get_records(
        &self,
        iterator: &str,
        limit: Option<i32>,
    ) -> ClientResult<GetRecordsOutput> {
        let output = self
            .stream_client
            .get_records()
            .shard_iterator(iterator)
            .set_limit(limit)
            .send()
            .await
            .map_err(from_get_records_err)?;

        let records = output
            .records
            .unwrap_or_default()
            .into_iter()
            .map(Record::try_from)
            .collect::<Result<Vec<Record>, _>>()?;

        Ok(GetRecordsOutput {
            records,
            next_iterator: output.next_shard_iterator,
        })
    }
}

fn from_describe_stream_err(err: SdkError<DescribeStreamError>) -> ClientError {
    match err {
        SdkError::ServiceError(e) => match e.into_err() {
            DescribeStreamError::ResourceNotFoundException(e) => {
                ClientError::ResourceNotFound(format!("{e}"))
            }
            e => ClientError::Other(anyhow::Error::from(e)),
        },
        _ => ClientError::Other(anyhow::Error::from(err)),
    }
}

fn from_list_streams_err(err: SdkError<ListStreamsError>) -> ClientError {
    match err {
        SdkError::ServiceError(e) => match e.into_err() {
            ListStreamsError::ResourceNotFoundException(e) => {
                ClientError::ResourceNotFound(format!("{e}"))
            }
            e => ClientError::Other(anyhow::Error::from(e)),
        },
        _ => ClientError::Other(anyhow::Error::from(err)),
    }
}

fn from_get_iterator_err(err: SdkError<GetShardIteratorError>) -> ClientError {
    use GetShardIteratorError::*;

    match err {
        SdkError::ServiceError(e) => match e.into_err() {
            ResourceNotFoundException(e) => ClientError::ResourceNotFound(format!("{e}")),
            TrimmedDataAccessException(_) => ClientError::TrimmedDataAccess,
            e => ClientError::Other(anyhow::Error::from(e)),
        },
        _ => ClientError::Other(anyhow::Error::from(err)),
    }
}

fn from_get_records_err(err: SdkError<GetRecordsError>) -> ClientError {
    use GetRecordsError::*;

    match err {
        SdkError::ServiceError(e) => match e.into_err() {
            ExpiredIteratorException(_) => ClientError::ExpiredIterator,
            LimitExceededException(_) => ClientError::LimitExceeded,
            ResourceNotFoundException(e) => ClientError::ResourceNotFound(format!("{e}")),
            TrimmedDataAccessException(_) => ClientError::TrimmedDataAccess,
            e => ClientError::Other(anyhow::Error::from(e)),
        },
        _ => ClientError::Other(anyhow::Error::from(err)),
    }
}

#[derive(Debug)]
pub struct DynamodbClientBuilder {
    stream_builder: StreamConfigBuilder,
}

impl DynamodbClientBuilder {
    pub async fn new() -> Self {
        let config = aws_config::load_from_env().await;
        let stream_builder = StreamConfigBuilder::from(&config);

        Self { stream_builder }
    }

    pub fn endpoint_url(self, url: Option<String>) -> Self {
        match url {
            Some(url) => Self {
                stream_builder: self.stream_builder.endpoint_url(&url),
            },
            None => self,
        }
    }

    pub fn build(self) -> DynamodbClient {
        let stream_config = self.stream_builder.build();
        let stream_client = StreamClient::from_conf(stream_config);

        DynamodbClient { stream_client }
    }
}
