mod builder;
mod event;
mod half;
mod progress;

use crate::client::Client;
use crate::config::TraversalConfig;
use crate::cursor::{CursorManager, CursorState, ShardCursor};
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::tree::ShardTree;
use crate::types::{IteratorPosition, Record, SequenceNumber, StreamTopology};

use half::{ReceiverHalf, TryRecvResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, error, info, warn};

pub use builder::TraversalBuilder;
pub use event::StreamEvent;
pub use half::{Event, TraversalHalf};
pub use progress::{Progress, ShardProgress, ShardState};

/// Outcome of a topology refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    /// No snapshot could be resolved yet.
    Unavailable,
    /// The last snapshot is still recent enough.
    Skipped,
    Resolved { discovered: usize },
}

/// Reads every record of a stream, parents before children.
///
/// Each call to `next` first hands out what earlier rounds fetched. Once the buffer is empty a
/// new round fetches one page from every eligible shard concurrently, one task per shard. The
/// traversal ends when every shard has been completed and a fresh snapshot shows nothing new, or
/// when its half is closed.
///
/// `next` is not cancel safe: dropping its future in the middle of a round may re-read the
/// current pages.
pub struct Traversal {
    stream_arn: String,
    directory: Arc<Directory>,
    cursors: Arc<CursorManager>,
    fetcher: Arc<Fetcher>,
    initial_position: IteratorPosition,
    resumed: bool,
    poll_interval: Duration,
    refresh_interval: Duration,
    tree: ShardTree,
    readers: HashMap<String, ShardCursor>,
    buffer: VecDeque<StreamEvent>,
    topology: Option<StreamTopology>,
    resolved_at: Option<Instant>,
    refresh_requested: bool,
    cancelled: bool,
    finished: bool,
    rx_event: oneshot::Receiver<Event>,
    tx_progress: watch::Sender<Progress>,
}

impl Traversal {
    pub fn builder<T: Into<String>>(client: Arc<dyn Client>, stream_arn: T) -> TraversalBuilder {
        TraversalBuilder::new(client, stream_arn)
    }

    pub fn stream_arn(&self) -> &str {
        self.stream_arn.as_str()
    }

    /// The last snapshot the traversal worked with.
    pub fn topology(&self) -> Option<&StreamTopology> {
        self.topology.as_ref()
    }

    pub fn progress(&self) -> Progress {
        let eligible = self.tree.eligible();

        let shards = self
            .tree
            .shards()
            .map(|shard| {
                let id = shard.id();
                let reader = self.readers.get(id);

                let state = if self.tree.is_completed(id) {
                    ShardState::Completed
                } else if !eligible.contains(id) {
                    ShardState::Waiting
                } else {
                    reader
                        .map(|r| ShardState::from(r.state()))
                        .unwrap_or(ShardState::Unopened)
                };

                ShardProgress {
                    shard_id: id.to_string(),
                    parent: shard.parent().map(String::from),
                    state,
                    checkpoint: reader.and_then(|r| r.checkpoint().cloned()),
                }
            })
            .collect();

        Progress {
            stream_arn: self.stream_arn.clone(),
            status: self.topology.as_ref().map(|t| t.status),
            finished: self.finished,
            shards,
        }
    }

    /// Last delivered sequence number per shard.
    pub fn checkpoints(&self) -> HashMap<String, SequenceNumber> {
        self.readers
            .iter()
            .filter_map(|(id, r)| Some((id.clone(), r.checkpoint()?.clone())))
            .collect()
    }

    pub fn completed(&self) -> &HashSet<String> {
        self.tree.completed()
    }

    /// Events fetched by the last round and not handed out yet. While this is zero the next call
    /// to `next` goes to the service.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// The next record, gap or completed shard. `None` once the traversal is over.
    ///
    /// A failure leaves every cursor in place, so calling `next` again retries.
    pub async fn next(&mut self) -> Result<Option<StreamEvent>> {
        loop {
            if let Some(event) = self.buffer.pop_front() {
                self.delivered(&event);
                return Ok(Some(event));
            }

            if self.finished {
                return Ok(None);
            }

            if self.poll_cancelled() {
                self.finish();
                return Ok(None);
            }

            match self.refresh().await? {
                Refresh::Unavailable => {
                    sleep(self.poll_interval).await;
                    continue;
                }
                Refresh::Resolved { discovered: 0 } if self.is_drained() => {
                    info!("Every shard of {} has been read", self.stream_arn);
                    self.finish();
                    return Ok(None);
                }
                _ => {}
            }

            self.publish();
            self.round().await?;

            if self.buffer.is_empty() {
                sleep(self.poll_interval).await;
            }
        }
    }

    fn delivered(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Record {
                shard_id,
                sequence_number,
                ..
            } => {
                if let Some(reader) = self.readers.get_mut(shard_id) {
                    reader.deliver(sequence_number);
                }
            }
            StreamEvent::ShardCompleted { shard_id } => {
                self.tree.mark_completed(shard_id);
                // Children may have shown up since the last snapshot.
                self.refresh_requested = true;
                self.publish();
            }
            StreamEvent::Gap { .. } => {}
        }
    }

    fn is_drained(&self) -> bool {
        !self.tree.is_empty() && self.tree.shards().all(|s| self.tree.is_completed(s.id()))
    }

    fn finish(&mut self) {
        self.finished = true;
        self.publish();
    }

    fn publish(&self) {
        self.tx_progress.send_replace(self.progress());
    }

    fn poll_cancelled(&mut self) -> bool {
        if self.cancelled {
            return true;
        }

        match self.try_recv_event() {
            TryRecvResult::Empty => {}
            TryRecvResult::Received(_) => {
                info!(
                    "Received an event to stop. Stop traversing \"{}\".",
                    self.stream_arn
                );
                self.cancelled = true;
            }
            TryRecvResult::Error(err) => {
                warn!(
                    "The traversal half is gone. Stop traversing \"{}\".",
                    self.stream_arn
                );
                warn!("{:#?}", err);
                self.cancelled = true;
            }
        }

        self.cancelled
    }

    async fn refresh(&mut self) -> Result<Refresh> {
        let due = self.refresh_requested
            || self.topology.as_ref().map_or(true, |t| t.status.is_updating())
            || self
                .resolved_at
                .map_or(true, |at| at.elapsed() >= self.refresh_interval);

        if !due {
            return Ok(Refresh::Skipped);
        }

        if self.refresh_requested {
            self.directory.invalidate(&self.stream_arn)?;
        }

        match self.directory.resolve(&self.stream_arn).await {
            Ok(topology) => {
                let discovered = self.apply(topology);
                Ok(Refresh::Resolved { discovered })
            }
            Err(err @ Error::Transient { .. }) => {
                info!("{err}. Poll again later.");
                self.resolved_at = Some(Instant::now());
                Ok(self.fallback())
            }
            Err(err) if err.is_retryable() && self.topology.is_some() => {
                warn!("Keep the last topology of {}: {err}", self.stream_arn);
                self.resolved_at = Some(Instant::now());
                Ok(Refresh::Skipped)
            }
            Err(err) => Err(err),
        }
    }

    fn fallback(&self) -> Refresh {
        if self.topology.is_some() {
            Refresh::Skipped
        } else {
            Refresh::Unavailable
        }
    }

    /// Merge a snapshot into the tree and give new shards a reader. Returns how many shards were
    /// seen for the first time.
    fn apply(&mut self, topology: StreamTopology) -> usize {
        let first = self.topology.is_none() && !self.resumed;
        let discovered = self.tree.insert(topology.shards.iter().cloned());

        for shard_id in discovered.iter() {
            if self.tree.is_completed(shard_id) || self.readers.contains_key(shard_id) {
                continue;
            }

            let position = if first {
                self.initial_position.clone()
            } else {
                IteratorPosition::TrimHorizon
            };
            self.readers
                .insert(shard_id.clone(), ShardCursor::new(shard_id, position));
        }

        if !discovered.is_empty() {
            info!(
                "Found {} new shards in {} ({}): {:?}",
                discovered.len(),
                self.stream_arn,
                topology.status,
                discovered
            );
        }

        self.topology = Some(topology);
        self.resolved_at = Some(Instant::now());
        self.refresh_requested = false;

        discovered.len()
    }

    /// Fetch one page from every eligible shard and buffer the results.
    async fn round(&mut self) -> Result<()> {
        let eligible = self.tree.eligible();
        if eligible.is_empty() {
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel::<(ShardCursor, Result<Vec<Record>>)>(eligible.len());

        for shard_id in eligible {
            let reader = match self.readers.get(&shard_id) {
                Some(reader) => reader.clone(),
                None => {
                    error!("Shard {shard_id} has no reader");
                    continue;
                }
            };

            let cursors = Arc::clone(&self.cursors);
            let fetcher = Arc::clone(&self.fetcher);
            let tx = tx.clone();

            tokio::spawn(async move {
                let output = read_page(&cursors, &fetcher, reader).await;

                if let Err(err) = tx.send(output).await {
                    error!("Failed to hand back the shard reader: {err}");
                }
            });
        }

        drop(tx);

        let mut outputs: Vec<(ShardCursor, Result<Vec<Record>>)> = vec![];
        while let Some(output) = rx.recv().await {
            outputs.push(output);
        }
        outputs.sort_by(|(a, _), (b, _)| a.shard_id().cmp(b.shard_id()));

        let mut failure: Option<Error> = None;

        for (mut reader, result) in outputs {
            let shard_id = reader.shard_id().to_string();

            match result {
                Ok(records) => {
                    for record in records {
                        self.buffer
                            .push_back(StreamEvent::record(shard_id.as_str(), record));
                    }

                    if reader.is_exhausted() {
                        info!("Shard {shard_id} is exhausted");
                        self.buffer.push_back(StreamEvent::ShardCompleted {
                            shard_id: shard_id.clone(),
                        });
                    }
                }
                Err(Error::Trimmed { .. }) => {
                    let last_sequence_number = reader.checkpoint().cloned();
                    warn!(
                        "Records of shard {shard_id} aged out before they were read (checkpoint: {last_sequence_number:?}), restarting at the trim horizon"
                    );
                    self.buffer.push_back(StreamEvent::Gap {
                        shard_id: shard_id.clone(),
                        last_sequence_number,
                    });
                    reader.rewind();
                }
                Err(Error::ShardGone {
                    last_sequence_number,
                    ..
                }) => {
                    warn!(
                        "Shard {shard_id} aged out before it was read to the end (checkpoint: {last_sequence_number:?})"
                    );
                    self.gap(&mut reader, last_sequence_number);
                }
                Err(Error::NotFound(_)) => {
                    warn!("Shard {shard_id} no longer exists");
                    let last_sequence_number = reader.checkpoint().cloned();
                    self.gap(&mut reader, last_sequence_number);
                }
                Err(err) => {
                    error!("Failed to read shard {shard_id}: {err}");
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }

            self.readers.insert(shard_id, reader);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Report the unread rest of a shard as lost and complete it.
    fn gap(&mut self, reader: &mut ShardCursor, last_sequence_number: Option<SequenceNumber>) {
        reader.advance(None);

        let shard_id = reader.shard_id().to_string();
        self.buffer.push_back(StreamEvent::Gap {
            shard_id: shard_id.clone(),
            last_sequence_number,
        });
        self.buffer.push_back(StreamEvent::ShardCompleted { shard_id });
    }
}

impl ReceiverHalf for Traversal {
    fn rx_event(&mut self) -> &mut oneshot::Receiver<Event> {
        &mut self.rx_event
    }
}

async fn read_page(
    cursors: &CursorManager,
    fetcher: &Fetcher,
    mut reader: ShardCursor,
) -> (ShardCursor, Result<Vec<Record>>) {
    let result = read(cursors, fetcher, &mut reader).await;
    (reader, result)
}

/// Read the next page of a shard, opening its cursor first if needed. An expired cursor is
/// re-opened after the checkpoint once.
async fn read(
    cursors: &CursorManager,
    fetcher: &Fetcher,
    reader: &mut ShardCursor,
) -> Result<Vec<Record>> {
    for _ in 0..2 {
        if reader.needs_open(cursors.ttl()) {
            if reader.state() == CursorState::Open {
                debug!("Cursor of {} is past its ttl", reader.shard_id());
                reader.expire();
            }
            cursors.reopen(reader).await?;
        }

        let cursor = match reader.cursor().cloned() {
            Some(cursor) => cursor,
            None => return Ok(vec![]),
        };

        match fetcher.fetch(&cursor).await {
            Ok(page) => {
                reader.advance(page.next);
                return Ok(page.records);
            }
            Err(Error::CursorExpired { shard_id }) => {
                info!("Cursor of {shard_id} has expired");
                reader.expire();
            }
            Err(err) => return Err(err),
        }
    }

    Err(Error::CursorExpired {
        shard_id: reader.shard_id().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        mock::{closed_shard, open_shard},
        MockClient, MockFailure, MockSource,
    };
    use crate::types::StreamStatus;
    use tokio::time::timeout;

    fn config() -> TraversalConfig {
        TraversalConfig {
            poll_interval_ms: 1,
            request_timeout_ms: 100,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            max_attempts: 3,
            ..TraversalConfig::default()
        }
    }

    fn traversal(client: &MockClient) -> (Traversal, TraversalHalf) {
        Traversal::builder(Arc::new(client.clone()), "arn")
            .set_config(config())
            .build()
            .unwrap()
    }

    fn label(event: &StreamEvent) -> String {
        match event {
            StreamEvent::Record {
                shard_id,
                sequence_number,
                ..
            } => format!("{shard_id} {sequence_number}"),
            StreamEvent::Gap {
                shard_id,
                last_sequence_number,
            } => match last_sequence_number {
                Some(n) => format!("{shard_id} gap after {n}"),
                None => format!("{shard_id} gap"),
            },
            StreamEvent::ShardCompleted { shard_id } => format!("{shard_id} completed"),
        }
    }

    async fn next(traversal: &mut Traversal) -> Option<String> {
        timeout(Duration::from_secs(5), traversal.next())
            .await
            .expect("traversal stalled")
            .unwrap()
            .map(|event| label(&event))
    }

    async fn collect(traversal: &mut Traversal) -> Vec<String> {
        let mut labels: Vec<String> = vec![];
        while let Some(label) = next(traversal).await {
            labels.push(label);
        }
        labels
    }

    #[tokio::test]
    async fn it_drains_parents_before_children() {
        let source = MockSource::new("arn")
            .with_shard(closed_shard("s0", None, "1", "100"), &["1", "2", "3", "4"])
            .with_shard(closed_shard("s1", Some("s0"), "101", "200"), &["101", "102"])
            .with_shard(closed_shard("s2", Some("s0"), "101", "200"), &["150"]);
        let client = MockClient::new(source);
        let (mut traversal, half) = traversal(&client);

        let events = collect(&mut traversal).await;
        assert_eq!(
            events,
            [
                "s0 1",
                "s0 2",
                "s0 3",
                "s0 4",
                "s0 completed",
                "s1 101",
                "s1 102",
                "s1 completed",
                "s2 150",
                "s2 completed",
            ]
        );

        let progress = half.progress();
        assert!(progress.finished);
        assert_eq!(progress.completed(), ["s0", "s1", "s2"]);
        assert_eq!(
            progress.checkpoints().get("s1"),
            Some(&SequenceNumber::new("102"))
        );
    }

    #[tokio::test]
    async fn split_children_are_read_in_the_same_round() {
        let source = MockSource::new("arn")
            .with_shard(closed_shard("s0", None, "1", "100"), &["1"])
            .with_shard(closed_shard("s1", Some("s0"), "101", "200"), &["101", "102", "103", "104"])
            .with_shard(closed_shard("s2", Some("s0"), "101", "200"), &["150", "151", "152", "153"]);
        let client = MockClient::new(source);
        let (mut traversal, _half) = traversal(&client);

        let events = collect(&mut traversal).await;

        // One page of each child before the second page of either.
        let position = |label: &str| events.iter().position(|e| e == label).unwrap();
        assert!(position("s2 150") < position("s1 104"));
        assert!(position("s1 101") < position("s2 153"));
        assert_eq!(events.len(), 1 + 1 + 5 + 5);
    }

    #[tokio::test]
    async fn empty_pages_keep_the_shard_open() {
        let source = MockSource::new("arn").with_shard(open_shard("s0", None, "1"), &[]);
        let client = MockClient::new(source);
        let (mut traversal, _half) = traversal(&client);

        let source = client.source();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            let mut source = source.lock().unwrap();
            source.push_records("s0", &["1"]);
            source.close_shard("s0", "1");
        });

        assert_eq!(collect(&mut traversal).await, ["s0 1", "s0 completed"]);

        let polls = client
            .calls()
            .iter()
            .filter(|c| c.starts_with("GetRecords"))
            .count();
        assert!(polls > 2, "only {polls} GetRecords calls");
    }

    #[tokio::test]
    async fn expired_cursors_resume_after_the_last_delivered_record() {
        let source = MockSource::new("arn").with_shard(
            closed_shard("s0", None, "1", "5"),
            &["1", "2", "3", "4", "5"],
        );
        let client = MockClient::new(source);
        let (mut traversal, _half) = traversal(&client);

        for expected in ["s0 1", "s0 2", "s0 3"] {
            assert_eq!(next(&mut traversal).await.as_deref(), Some(expected));
        }

        client.source().lock().unwrap().expire_iterators();

        assert_eq!(
            collect(&mut traversal).await,
            ["s0 4", "s0 5", "s0 completed"]
        );
        assert!(client
            .calls()
            .contains(&"GetShardIterator s0 AFTER_SEQUENCE_NUMBER 3".to_string()));
    }

    #[tokio::test]
    async fn latest_cursors_reopen_without_skipping_new_records() {
        let source = MockSource::new("arn").with_shard(open_shard("s0", None, "1"), &[]);
        let client = MockClient::new(source);
        let (mut traversal, _half) = Traversal::builder(Arc::new(client.clone()), "arn")
            .set_config(config())
            .set_initial_position(IteratorPosition::Latest)
            .build()
            .unwrap();

        let source = client.source();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            let mut source = source.lock().unwrap();
            source.push_records("s0", &["1", "2"]);
            source.close_shard("s0", "2");
            source.expire_iterators();
        });

        assert_eq!(
            collect(&mut traversal).await,
            ["s0 1", "s0 2", "s0 completed"]
        );

        let opens: Vec<String> = client
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("GetShardIterator"))
            .collect();
        assert_eq!(
            opens,
            ["GetShardIterator s0 LATEST", "GetShardIterator s0 TRIM_HORIZON"]
        );
    }

    #[tokio::test]
    async fn records_behind_the_trim_horizon_are_skipped_with_a_gap() {
        let source = MockSource::new("arn")
            .with_shard(
                closed_shard("s0", None, "1", "100"),
                &["1", "2", "3", "4", "5"],
            )
            .with_shard(closed_shard("s1", Some("s0"), "101", "200"), &["101"]);
        let client = MockClient::new(source);
        let (mut traversal, _half) = traversal(&client);

        for expected in ["s0 1", "s0 2", "s0 3"] {
            assert_eq!(next(&mut traversal).await.as_deref(), Some(expected));
        }

        client.source().lock().unwrap().trim_records("s0", 4);

        assert_eq!(
            collect(&mut traversal).await,
            [
                "s0 gap after 3",
                "s0 5",
                "s0 completed",
                "s1 101",
                "s1 completed",
            ]
        );
        assert!(client
            .calls()
            .contains(&"GetShardIterator s0 TRIM_HORIZON".to_string()));
    }

    #[tokio::test]
    async fn trimmed_first_pages_are_read_again_from_the_horizon() {
        let source = MockSource::new("arn")
            .with_shard(closed_shard("s0", None, "1", "100"), &["1", "2"]);
        let client = MockClient::new(source);
        client
            .source()
            .lock()
            .unwrap()
            .fail_get_records(MockFailure::TrimmedDataAccess);
        let (mut traversal, _half) = traversal(&client);

        assert_eq!(
            collect(&mut traversal).await,
            ["s0 gap", "s0 1", "s0 2", "s0 completed"]
        );
    }

    #[tokio::test]
    async fn shards_aged_out_entirely_are_reported_as_gaps() {
        let source = MockSource::new("arn")
            .with_shard(
                closed_shard("s0", None, "1", "100"),
                &["1", "2", "3", "4", "5"],
            )
            .with_shard(closed_shard("s1", Some("s0"), "101", "200"), &["101"]);
        let client = MockClient::new(source);
        let (mut traversal, _half) = traversal(&client);

        for expected in ["s0 1", "s0 2", "s0 3"] {
            assert_eq!(next(&mut traversal).await.as_deref(), Some(expected));
        }

        client.source().lock().unwrap().trim_shard("s0");

        assert_eq!(
            collect(&mut traversal).await,
            ["s0 gap after 3", "s0 completed", "s1 101", "s1 completed"]
        );
    }

    #[tokio::test]
    async fn missing_shards_are_reported_as_gaps() {
        let source = MockSource::new("arn")
            .with_shard(closed_shard("s0", None, "1", "100"), &["1"]);
        let client = MockClient::new(source);
        client
            .source()
            .lock()
            .unwrap()
            .fail_get_shard_iterator(MockFailure::ResourceNotFound);
        let (mut traversal, _half) = traversal(&client);

        assert_eq!(collect(&mut traversal).await, ["s0 gap", "s0 completed"]);
    }

    #[tokio::test]
    async fn closing_the_half_stops_after_buffered_records() {
        let source = MockSource::new("arn").with_shard(
            open_shard("s0", None, "1"),
            &["1", "2", "3", "4", "5"],
        );
        let client = MockClient::new(source);
        let (mut traversal, mut half) = traversal(&client);

        assert_eq!(next(&mut traversal).await.as_deref(), Some("s0 1"));

        half.close();

        assert_eq!(collect(&mut traversal).await, ["s0 2", "s0 3"]);
        assert!(half.progress().finished);
        assert_eq!(
            traversal.checkpoints().get("s0"),
            Some(&SequenceNumber::new("3"))
        );
    }

    #[tokio::test]
    async fn dropping_the_half_stops_the_traversal() {
        let source = MockSource::new("arn").with_shard(open_shard("s0", None, "1"), &[]);
        let client = MockClient::new(source);
        let (mut traversal, half) = traversal(&client);

        drop(half);
        assert!(next(&mut traversal).await.is_none());
    }

    #[tokio::test]
    async fn it_resumes_from_checkpoints() {
        let source = MockSource::new("arn")
            .with_shard(
                closed_shard("s0", None, "1", "100"),
                &["1", "2", "3", "4", "5"],
            )
            .with_shard(closed_shard("s1", Some("s0"), "101", "200"), &["101"]);
        let client = MockClient::new(source);

        let (mut traversal, _half) = Traversal::builder(Arc::new(client.clone()), "arn")
            .set_config(config())
            .set_checkpoints([("s0".to_string(), SequenceNumber::new("3"))])
            .build()
            .unwrap();

        assert_eq!(
            collect(&mut traversal).await,
            ["s0 4", "s0 5", "s0 completed", "s1 101", "s1 completed"]
        );
        assert!(client
            .calls()
            .contains(&"GetShardIterator s0 AFTER_SEQUENCE_NUMBER 3".to_string()));
    }

    #[tokio::test]
    async fn it_skips_shards_completed_by_an_earlier_run() {
        let source = MockSource::new("arn")
            .with_shard(closed_shard("s0", None, "1", "100"), &["1"])
            .with_shard(closed_shard("s1", Some("s0"), "101", "200"), &["101"]);
        let client = MockClient::new(source);

        let (mut traversal, _half) = Traversal::builder(Arc::new(client.clone()), "arn")
            .set_config(config())
            .set_completed(["s0"])
            .build()
            .unwrap();

        assert_eq!(collect(&mut traversal).await, ["s1 101", "s1 completed"]);
        assert!(client.calls().iter().all(|c| !c.contains("s0")));
    }

    #[tokio::test]
    async fn updating_streams_are_resolved_every_round() {
        let source = MockSource::new("arn")
            .with_shard(open_shard("s0", None, "1"), &["1"])
            .with_status(StreamStatus::Updating);
        let client = MockClient::new(source);
        let (mut traversal, _half) = traversal(&client);

        assert_eq!(next(&mut traversal).await.as_deref(), Some("s0 1"));

        {
            let source = client.source();
            let mut source = source.lock().unwrap();
            source.close_shard("s0", "1");
            source.push_shard(closed_shard("s1", Some("s0"), "2", "3"), &["2"]);
            source.set_status(StreamStatus::Active);
        }

        assert_eq!(
            collect(&mut traversal).await,
            ["s0 completed", "s1 2", "s1 completed"]
        );

        // The split was picked up before the parent was polled again.
        let calls = client.calls();
        let second_describe = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.starts_with("DescribeStream"))
            .nth(1)
            .map(|(i, _)| i)
            .unwrap();
        let second_fetch = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.starts_with("GetRecords s0"))
            .nth(1)
            .map(|(i, _)| i)
            .unwrap();
        assert!(second_describe < second_fetch);
        assert_eq!(traversal.topology().unwrap().status, StreamStatus::Active);
    }

    #[tokio::test]
    async fn it_waits_while_the_stream_is_being_created() {
        let source = MockSource::new("arn")
            .with_shard(closed_shard("s0", None, "1", "1"), &["1"])
            .with_status(StreamStatus::Creating);
        let client = MockClient::new(source);
        let (mut traversal, _half) = traversal(&client);

        let source = client.source();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            source.lock().unwrap().set_status(StreamStatus::Active);
        });

        assert_eq!(collect(&mut traversal).await, ["s0 1", "s0 completed"]);
    }

    #[tokio::test]
    async fn failed_rounds_keep_cursors_and_buffered_records() {
        let source = MockSource::new("arn")
            .with_shard(open_shard("s0", None, "1"), &["1"]);
        let client = MockClient::new(source);
        let (mut traversal, _half) = traversal(&client);

        assert_eq!(next(&mut traversal).await.as_deref(), Some("s0 1"));

        {
            let source = client.source();
            let mut source = source.lock().unwrap();
            for _ in 0..3 {
                source.fail_get_records(MockFailure::Other);
            }
            source.push_records("s0", &["2"]);
        }

        let result = traversal.next().await;
        assert!(matches!(result, Err(Error::Transport { .. })));

        assert_eq!(next(&mut traversal).await.as_deref(), Some("s0 2"));
        assert_eq!(
            traversal.checkpoints().get("s0"),
            Some(&SequenceNumber::new("2"))
        );
    }

    #[tokio::test]
    async fn it_rejects_an_invalid_initial_position() {
        let client = MockClient::new(MockSource::new("arn"));
        let config = TraversalConfig {
            initial_position: crate::types::ShardIteratorType::AtSequenceNumber,
            ..config()
        };

        let result = Traversal::builder(Arc::new(client), "arn")
            .set_config(config)
            .build();
        assert!(matches!(result, Err(Error::InvalidPolicy(_))));
    }
}
