use crate::client::{Client, ClientError, GetShardIteratorOutput};
use crate::error::{Error, Result};
use crate::retry::{with_timeout, Backoff};
use crate::types::{IteratorPosition, SequenceNumber, ShardIteratorType};

use serde::Serialize;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

/// A shard iterator together with the moment it was handed out.
#[derive(Debug, Clone)]
pub struct Cursor {
    shard_id: String,
    iterator: String,
    /// Sequence number of the last record read through the chain of iterators this one belongs
    /// to.
    last_sequence_number: Option<SequenceNumber>,
    issued_at: Instant,
}

impl Cursor {
    pub fn new<T, U>(shard_id: T, iterator: U) -> Self
    where
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            shard_id: shard_id.into(),
            iterator: iterator.into(),
            last_sequence_number: None,
            issued_at: Instant::now(),
        }
    }

    pub fn after(self, last_sequence_number: Option<SequenceNumber>) -> Self {
        Self {
            last_sequence_number,
            ..self
        }
    }

    pub fn shard_id(&self) -> &str {
        self.shard_id.as_str()
    }

    pub fn iterator(&self) -> &str {
        self.iterator.as_str()
    }

    pub fn last_sequence_number(&self) -> Option<&SequenceNumber> {
        self.last_sequence_number.as_ref()
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.issued_at.elapsed() >= ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CursorState {
    Unopened,
    Open,
    Expired,
    Exhausted,
}

/// Read state of one shard: its current cursor and the last delivered sequence number.
///
/// ```text
/// Unopened -> Open -> Open (next page) | Exhausted | Expired
/// Expired  -> Open (re-opened after the checkpoint)
/// ```
#[derive(Debug, Clone)]
pub struct ShardCursor {
    shard_id: String,
    initial: IteratorPosition,
    state: CursorState,
    cursor: Option<Cursor>,
    checkpoint: Option<SequenceNumber>,
    /// The checkpoint fell behind the trim horizon. Cleared by the next delivery.
    behind_horizon: bool,
}

impl ShardCursor {
    pub fn new<T: Into<String>>(shard_id: T, initial: IteratorPosition) -> Self {
        Self {
            shard_id: shard_id.into(),
            initial,
            state: CursorState::Unopened,
            cursor: None,
            checkpoint: None,
            behind_horizon: false,
        }
    }

    /// Continue a shard read by an earlier run, right after `checkpoint`.
    pub fn resume<T: Into<String>>(shard_id: T, checkpoint: SequenceNumber) -> Self {
        Self {
            checkpoint: Some(checkpoint.clone()),
            ..Self::new(shard_id, IteratorPosition::AfterSequenceNumber(checkpoint))
        }
    }

    pub fn shard_id(&self) -> &str {
        self.shard_id.as_str()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn checkpoint(&self) -> Option<&SequenceNumber> {
        self.checkpoint.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Where to (re-)open: right after the checkpoint, or the initial position if nothing has
    /// been delivered yet. A checkpoint behind the trim horizon restarts from the horizon.
    pub fn position(&self) -> IteratorPosition {
        match &self.checkpoint {
            _ if self.behind_horizon => IteratorPosition::TrimHorizon,
            Some(n) => IteratorPosition::AfterSequenceNumber(n.clone()),
            None => self.initial.clone(),
        }
    }

    /// Whether a fresh iterator is needed before the next fetch.
    pub fn needs_open(&self, ttl: Duration) -> bool {
        match self.state {
            CursorState::Unopened | CursorState::Expired => true,
            CursorState::Open => self.cursor.as_ref().map_or(true, |c| c.is_expired(ttl)),
            CursorState::Exhausted => false,
        }
    }

    /// `None` means the service has nothing to read from the position.
    pub fn opened(&mut self, cursor: Option<Cursor>) {
        // `LATEST` moves with the writes. Re-opening there without a checkpoint would skip what
        // was written in between, so later opens start from the horizon.
        if cursor.is_some() && self.initial == IteratorPosition::Latest {
            self.initial = IteratorPosition::TrimHorizon;
        }
        self.advance(cursor);
    }

    /// Move to the successor cursor of a page. No successor means the shard is exhausted.
    pub fn advance(&mut self, next: Option<Cursor>) {
        self.state = if next.is_some() {
            CursorState::Open
        } else {
            CursorState::Exhausted
        };
        self.cursor = next;
    }

    pub fn expire(&mut self) {
        if self.state != CursorState::Exhausted {
            self.state = CursorState::Expired;
            self.cursor = None;
        }
    }

    /// The checkpoint is older than the trim horizon. The next open starts at the oldest
    /// retained record.
    pub fn rewind(&mut self) {
        if self.state != CursorState::Exhausted {
            self.behind_horizon = true;
            self.state = CursorState::Expired;
            self.cursor = None;
        }
    }

    /// Record that `sequence_number` has been handed to the consumer.
    pub fn deliver(&mut self, sequence_number: &SequenceNumber) {
        if self.checkpoint.as_ref().map_or(true, |n| n < sequence_number) {
            self.checkpoint = Some(sequence_number.clone());
            self.behind_horizon = false;
        }
    }
}

/// Opens shard iterators of one stream.
pub struct CursorManager {
    client: Arc<dyn Client>,
    stream_arn: String,
    ttl: Duration,
    request_timeout: Duration,
    backoff: Backoff,
}

impl CursorManager {
    pub fn new<T: Into<String>>(client: Arc<dyn Client>, stream_arn: T) -> Self {
        Self {
            client,
            stream_arn: stream_arn.into(),
            ttl: Duration::from_secs(15 * 60),
            request_timeout: Duration::from_secs(5),
            backoff: Backoff::default(),
        }
    }

    pub fn set_ttl(self, ttl: Duration) -> Self {
        Self { ttl, ..self }
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

    pub fn stream_arn(&self) -> &str {
        self.stream_arn.as_str()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_expired(&self, cursor: &Cursor) -> bool {
        cursor.is_expired(self.ttl)
    }

    /// Open an iterator on a shard.
    ///
    /// The sequence number must be given for `AT_SEQUENCE_NUMBER` and `AFTER_SEQUENCE_NUMBER`
    /// and only for them. Fails with `NotFound` when the shard no longer exists.
    pub async fn open(
        &self,
        shard_id: &str,
        kind: ShardIteratorType,
        sequence_number: Option<SequenceNumber>,
    ) -> Result<Option<Cursor>> {
        let position = IteratorPosition::new(kind, sequence_number).map_err(Error::InvalidPolicy)?;
        self.open_at(shard_id, &position).await
    }

    pub async fn open_at(
        &self,
        shard_id: &str,
        position: &IteratorPosition,
    ) -> Result<Option<Cursor>> {
        let GetShardIteratorOutput { iterator } = self
            .backoff
            .retry("GetShardIterator", || {
                with_timeout("GetShardIterator", self.request_timeout, async move {
                    self.client
                        .get_shard_iterator(&self.stream_arn, shard_id, position)
                        .await
                        .map_err(|err| from_client_err(err, shard_id, position))
                })
            })
            .await?;

        debug!("Opened {shard_id} at {position}");

        let last = position.sequence_number().cloned();
        Ok(iterator.map(|it| Cursor::new(shard_id, it).after(last)))
    }

    /// Give the shard a fresh cursor at its current position.
    pub async fn reopen(&self, shard: &mut ShardCursor) -> Result<()> {
        let position = shard.position();

        if shard.state() == CursorState::Expired {
            info!(
                "Re-open expired cursor of {} at {position}",
                shard.shard_id()
            );
        }

        let cursor = self.open_at(shard.shard_id(), &position).await?;
        shard.opened(cursor);
        Ok(())
    }
}

fn from_client_err(err: ClientError, shard_id: &str, position: &IteratorPosition) -> Error {
    match err {
        ClientError::ResourceNotFound(_) => Error::NotFound(shard_id.to_string()),
        ClientError::TrimmedDataAccess => Error::Trimmed {
            shard_id: shard_id.to_string(),
            last_sequence_number: position.sequence_number().cloned(),
        },
        ClientError::LimitExceeded => Error::Throttled {
            shard_id: shard_id.to_string(),
            last_sequence_number: position.sequence_number().cloned(),
        },
        err => Error::transport("get shard iterator", anyhow::Error::from(err)),
    }
}
