use crate::client::{Client, ClientError, GetRecordsOutput};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::retry::{with_timeout, Backoff};
use crate::types::Record;

use std::sync::Arc;
use tokio::time::Duration;
use tracing::debug;

/// One `GetRecords` page.
#[derive(Debug, Clone)]
pub struct Page {
    /// In ascending sequence order, as returned by the service.
    pub records: Vec<Record>,
    /// `None` once the shard is closed and fully read.
    pub next: Option<Cursor>,
}

impl Page {
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

/// Reads pages of records through shard cursors.
pub struct Fetcher {
    client: Arc<dyn Client>,
    request_timeout: Duration,
    backoff: Backoff,
    page_limit: Option<i32>,
}

impl Fetcher {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self {
            client,
            request_timeout: Duration::from_secs(5),
            backoff: Backoff::default(),
            page_limit: None,
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

    pub fn set_page_limit(self, page_limit: Option<i32>) -> Self {
        Self { page_limit, ..self }
    }

    /// Fetch the page under `cursor` with the configured limit.
    pub async fn fetch(&self, cursor: &Cursor) -> Result<Page> {
        self.fetch_with_limit(cursor, self.page_limit).await
    }

    /// Throttling, timeouts and transport failures are retried with the same cursor. An expired
    /// cursor surfaces as `CursorExpired`, a position behind the trim horizon as `Trimmed` and a
    /// shard that no longer exists as `ShardGone`.
    pub async fn fetch_with_limit(&self, cursor: &Cursor, limit: Option<i32>) -> Result<Page> {
        let GetRecordsOutput {
            records,
            next_iterator,
        } = self
            .backoff
            .retry("GetRecords", || {
                with_timeout("GetRecords", self.request_timeout, async move {
                    self.client
                        .get_records(cursor.iterator(), limit)
                        .await
                        .map_err(|err| from_client_err(err, cursor))
                })
            })
            .await?;

        debug!(
            "Fetched {} records from {} ({})",
            records.len(),
            cursor.shard_id(),
            if next_iterator.is_some() { "open" } else { "exhausted" }
        );

        let last = records
            .last()
            .map(|r| r.sequence_number().clone())
            .or_else(|| cursor.last_sequence_number().cloned());
        let next = next_iterator.map(|it| Cursor::new(cursor.shard_id(), it).after(last));

        Ok(Page { records, next })
    }
}

fn from_client_err(err: ClientError, cursor: &Cursor) -> Error {
    let shard_id = cursor.shard_id().to_string();
    let last_sequence_number = cursor.last_sequence_number().cloned();

    match err {
        ClientError::ExpiredIterator => Error::CursorExpired { shard_id },
        ClientError::LimitExceeded => Error::Throttled {
            shard_id,
            last_sequence_number,
        },
        ClientError::TrimmedDataAccess => Error::Trimmed {
            shard_id,
            last_sequence_number,
        },
        ClientError::ResourceNotFound(_) => Error::ShardGone {
            shard_id,
            last_sequence_number,
        },
        err => Error::transport("get records", anyhow::Error::from(err)),
    }
}
