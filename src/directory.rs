use crate::client::{Client, ClientError, DescribeStreamOutput, ListStreamsOutput};
use crate::error::{from_guard, Error, Result};
use crate::retry::{with_timeout, Backoff};
use crate::types::{StreamStatus, StreamTopology};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

/// Resolves streams to their current topology.
///
/// Snapshots are cached for at most `refresh_interval`. A snapshot reporting `UPDATING` is never
/// cached since shards are being split or merged at that moment.
pub struct Directory {
    client: Arc<dyn Client>,
    refresh_interval: Duration,
    request_timeout: Duration,
    backoff: Backoff,
    cache: Mutex<HashMap<String, (Instant, StreamTopology)>>,
}

impl Directory {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self {
            client,
            refresh_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
            backoff: Backoff::default(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_refresh_interval(self, refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            ..self
        }
    }

    pub fn set_request_timeout(self, request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            ..self
        }
    }

    pub fn set_backoff(self, backoff: Backoff) -> Self {
        Self { backoff, ..self }
    }

    /// Current topology of the stream, following `DescribeStream` pagination to the end.
    ///
    /// Fails with `NotFound` for streams that never existed or were deleted, and with
    /// `Transient` while the stream is being created or deleted.
    pub async fn resolve(&self, stream_arn: &str) -> Result<StreamTopology> {
        if let Some(topology) = self.cached(stream_arn)? {
            debug!("Use cached topology of {stream_arn}");
            return Ok(topology);
        }

        let topology = self.describe_all(stream_arn).await?;

        match topology.status {
            StreamStatus::Creating | StreamStatus::Deleting | StreamStatus::Unknown => {
                self.invalidate(stream_arn)?;
                Err(Error::Transient {
                    stream_arn: stream_arn.to_string(),
                    status: topology.status,
                })
            }
            StreamStatus::Updating => {
                info!("Stream {stream_arn} is updating its shards");
                self.invalidate(stream_arn)?;
                Ok(topology)
            }
            _ => {
                let mut cache = self.cache.lock().map_err(from_guard)?;
                cache.insert(stream_arn.to_string(), (Instant::now(), topology.clone()));
                Ok(topology)
            }
        }
    }

    /// Every stream identifier of the table, in the order the service lists them.
    pub async fn list_streams(&self, table_name: &str) -> Result<Vec<String>> {
        let mut stream_arns: Vec<String> = vec![];
        let mut last_stream_arn: Option<String> = None;

        loop {
            let ListStreamsOutput {
                stream_arns: mut page,
                last_stream_arn: next,
            } = self
                .backoff
                .retry("ListStreams", || {
                    let start = last_stream_arn.clone();
                    with_timeout("ListStreams", self.request_timeout, async move {
                        self.client
                            .list_streams(table_name, start)
                            .await
                            .map_err(|err| from_client_err(err, "list streams", table_name))
                    })
                })
                .await?;

            stream_arns.append(&mut page);

            if next.is_none() {
                break;
            }
            last_stream_arn = next;
        }

        Ok(stream_arns)
    }

    /// Drop the cached snapshot so the next `resolve` asks the service.
    pub fn invalidate(&self, stream_arn: &str) -> Result<()> {
        let mut cache = self.cache.lock().map_err(from_guard)?;
        cache.remove(stream_arn);
        Ok(())
    }

    fn cached(&self, stream_arn: &str) -> Result<Option<StreamTopology>> {
        let cache = self.cache.lock().map_err(from_guard)?;
        Ok(cache
            .get(stream_arn)
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.refresh_interval)
            .map(|(_, topology)| topology.clone()))
    }

    async fn describe_all(&self, stream_arn: &str) -> Result<StreamTopology> {
        let mut topology: Option<StreamTopology> = None;
        let mut last_shard_id: Option<String> = None;

        loop {
            let DescribeStreamOutput {
                stream_arn: arn,
                stream_label,
                table_name,
                status,
                view_type,
                key_schema,
                mut shards,
                last_shard_id: next,
            } = self
                .backoff
                .retry("DescribeStream", || {
                    let start = last_shard_id.clone();
                    with_timeout("DescribeStream", self.request_timeout, async move {
                        self.client
                            .describe_stream(stream_arn, start)
                            .await
                            .map_err(|err| from_client_err(err, "describe stream", stream_arn))
                    })
                })
                .await?;

            match topology.as_mut() {
                Some(t) => {
                    t.shards.append(&mut shards);
                    t.status = status;
                }
                None => {
                    topology = Some(StreamTopology {
                        stream_arn: arn,
                        stream_label,
                        table_name,
                        status,
                        view_type,
                        key_schema,
                        shards,
                    });
                }
            }

            if next.is_none() {
                break;
            }
            last_shard_id = next;
        }

        topology.ok_or(Error::NotFound(stream_arn.to_string()))
    }
}

fn from_client_err(err: ClientError, operation: &str, resource: &str) -> Error {
    match err {
        ClientError::ResourceNotFound(_) => Error::NotFound(resource.to_string()),
        err => Error::transport(operation, anyhow::Error::from(err)),
    }
}
