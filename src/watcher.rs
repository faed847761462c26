use crate::client::Client;
use crate::config::TraversalConfig;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::notification::{self, Notification};
use crate::retry::Backoff;
use crate::traversal::{StreamEvent, Traversal, TraversalHalf};
use crate::types::Record;

use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// How a watch ended.
#[derive(Debug)]
pub enum ChannelEvent {
    /// Every shard has been read, or the watch was stopped.
    Closed,
    Error {
        message: String,
        error: anyhow::Error,
    },
}

impl fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelEvent::Closed => write!(f, "CLOSED"),
            ChannelEvent::Error { .. } => write!(f, "ERROR"),
        }
    }
}

/// The newest stream of a table. Stream ARNs end with their creation time, so the greatest label
/// wins.
pub async fn newest_stream(directory: &Directory, table_name: &str) -> Result<String> {
    directory
        .list_streams(table_name)
        .await?
        .into_iter()
        .max_by(|a, b| stream_label(a).cmp(stream_label(b)))
        .ok_or_else(|| Error::NotFound(format!("Stream of {table_name}")))
}

fn stream_label(stream_arn: &str) -> &str {
    stream_arn
        .rsplit_once("/stream/")
        .map(|(_, label)| label)
        .unwrap_or(stream_arn)
}

/// A running watch as seen by its owner.
#[derive(Debug)]
pub struct Watch {
    pub stream_arn: String,
    pub half: TraversalHalf,
    pub rx_event: oneshot::Receiver<ChannelEvent>,
}

/// Everything a watch needs from the application.
#[derive(Clone)]
pub struct WatchContext {
    pub client: Arc<dyn Client>,
    pub directory: Arc<Directory>,
    pub config: TraversalConfig,
    pub notifier: mpsc::Sender<notification::Event>,
}

impl WatchContext {
    /// Watches started from this context share one directory configured like their traversals.
    pub fn new(
        client: Arc<dyn Client>,
        config: TraversalConfig,
        notifier: mpsc::Sender<notification::Event>,
    ) -> Self {
        let directory = Directory::new(Arc::clone(&client))
            .set_refresh_interval(config.refresh_interval())
            .set_request_timeout(config.request_timeout())
            .set_backoff(config.backoff());

        Self {
            client,
            directory: Arc::new(directory),
            config,
            notifier,
        }
    }

    /// Traverse the newest stream of `table_name` and forward its records to `url`.
    pub async fn start<T, U>(&self, table_name: T, url: U) -> Result<Watch>
    where
        T: Into<String>,
        U: Into<String>,
    {
        let table_name: String = table_name.into();
        let url: String = url.into();

        let stream_arn = newest_stream(&self.directory, &table_name).await?;
        info!("Watch {stream_arn} of {table_name} for {url}");

        let (traversal, half) = Traversal::builder(Arc::clone(&self.client), &stream_arn)
            .set_config(self.config.clone())
            .set_directory(Arc::clone(&self.directory))
            .build()?;

        let (tx, rx) = oneshot::channel::<ChannelEvent>();
        let notification = Notification::new(&table_name, &url, self.notifier.clone());
        let watcher = Watcher::new(traversal, notification)
            .set_retry_interval(self.config.poll_interval())
            .set_backoff(self.config.backoff());

        tokio::spawn(async move {
            let event = watcher.run().await;
            if let Err(event) = tx.send(event) {
                warn!("Failed to send `{event}` event.");
            }
        });

        Ok(Watch {
            stream_arn,
            half,
            rx_event: rx,
        })
    }
}

/// Forwards the records of a traversal to a webhook.
pub struct Watcher {
    traversal: Traversal,
    notification: Notification,
    retry_interval: Duration,
    backoff: Backoff,
}

impl Watcher {
    pub fn new(traversal: Traversal, notification: Notification) -> Self {
        Self {
            traversal,
            notification,
            retry_interval: Duration::from_secs(1),
            backoff: Backoff::default(),
        }
    }

    /// Sleep after a retryable read failure.
    pub fn set_retry_interval(self, retry_interval: Duration) -> Self {
        Self {
            retry_interval,
            ..self
        }
    }

    /// Retries of failed webhook posts.
    pub fn set_backoff(self, backoff: Backoff) -> Self {
        Self { backoff, ..self }
    }

    /// Run until the traversal ends. Records are posted in batches of what one round fetched.
    pub async fn run(mut self) -> ChannelEvent {
        let mut batch: Vec<Record> = vec![];

        loop {
            match self.traversal.next().await {
                Ok(Some(StreamEvent::Record { record, .. })) => batch.push(record),
                Ok(Some(StreamEvent::Gap {
                    shard_id,
                    last_sequence_number,
                })) => {
                    if let Err(err) = self.flush(&mut batch).await {
                        return self.fail("Failed to send records", err).await;
                    }

                    let message = match last_sequence_number {
                        Some(n) => format!("Records of shard {shard_id} after {n} are lost"),
                        None => format!("Records of shard {shard_id} are lost"),
                    };
                    if let Err(err) = self.notification.send(message).await {
                        return self.fail("Failed to send gap", err).await;
                    }
                }
                Ok(Some(StreamEvent::ShardCompleted { .. })) => {}
                Ok(None) => {
                    if let Err(err) = self.flush(&mut batch).await {
                        return self.fail("Failed to send records", err).await;
                    }
                    info!("Stop watching {}", self.traversal.stream_arn());
                    return ChannelEvent::Closed;
                }
                Err(err) if err.is_retryable() => {
                    warn!("{err}. Retry in {:?}.", self.retry_interval);
                    sleep(self.retry_interval).await;
                }
                Err(err) => {
                    if let Err(err) = self.flush(&mut batch).await {
                        error!("{:#?}", err);
                    }
                    let message = format!("Failed to read {}", self.traversal.stream_arn());
                    return self.fail(message, anyhow::Error::from(err)).await;
                }
            }

            if self.traversal.buffered() == 0 {
                if let Err(err) = self.flush(&mut batch).await {
                    return self.fail("Failed to send records", err).await;
                }
            }
        }
    }

    /// Post the batch, retrying failed posts. The batch is dropped once it is posted.
    async fn flush(&self, batch: &mut Vec<Record>) -> anyhow::Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let records = std::mem::take(batch);
        self.backoff
            .retry("Send records", || {
                let records = records.clone();
                async move {
                    self.notification
                        .send(records)
                        .await
                        .map_err(|err| Error::transport("send records", err))
                }
            })
            .await
            .map_err(anyhow::Error::from)
    }

    async fn fail<T: Into<String>>(&self, message: T, error: anyhow::Error) -> ChannelEvent {
        let message: String = message.into();
        error!("{message}: {error}");

        if let Err(err) = self
            .notification
            .send("Server error occurred. Stop watching.")
            .await
        {
            error!("{:#?}", err);
        }

        ChannelEvent::Error { message, error }
    }
}
