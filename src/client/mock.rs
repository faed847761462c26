use super::{
    Client, ClientError, ClientResult, DescribeStreamOutput, GetRecordsOutput,
    GetShardIteratorOutput, ListStreamsOutput,
};
use crate::types::{
    IteratorPosition, KeySchemaElement, KeyType, Record, SequenceNumber, SequenceNumberRange,
    Shard, StreamStatus, StreamViewType,
};

use axum::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockFailure {
    ExpiredIterator,
    LimitExceeded,
    TrimmedDataAccess,
    ResourceNotFound,
    Other,
    /// Answer normally, but only after the delay.
    Delay(Duration),
}

impl MockFailure {
    fn into_error(self) -> ClientError {
        match self {
            Self::ExpiredIterator => ClientError::ExpiredIterator,
            Self::LimitExceeded => ClientError::LimitExceeded,
            Self::TrimmedDataAccess => ClientError::TrimmedDataAccess,
            Self::ResourceNotFound => ClientError::ResourceNotFound("mock".into()),
            Self::Other | Self::Delay(_) => ClientError::Other(anyhow::anyhow!("connection reset")),
        }
    }
}

#[derive(Debug, Clone)]
struct MockShard {
    shard: Shard,
    records: Vec<Record>,
    /// Records before this offset have aged out.
    horizon: usize,
    gone: bool,
}

/// A scripted stream: shards with their records, served in pages like the real service.
#[derive(Debug)]
pub struct MockSource {
    stream_arn: String,
    status: StreamStatus,
    shards: Vec<MockShard>,
    describe_page_size: usize,
    page_limit: usize,
    streams: Vec<Vec<String>>,
    iterators: HashMap<String, (String, usize)>,
    expired: HashSet<String>,
    issued: usize,
    record_failures: VecDeque<MockFailure>,
    iterator_failures: VecDeque<MockFailure>,
    calls: Vec<String>,
}

impl MockSource {
    pub fn new<T: Into<String>>(stream_arn: T) -> Self {
        Self {
            stream_arn: stream_arn.into(),
            status: StreamStatus::Active,
            shards: vec![],
            describe_page_size: 2,
            page_limit: 3,
            streams: vec![],
            iterators: HashMap::new(),
            expired: HashSet::new(),
            issued: 0,
            record_failures: VecDeque::new(),
            iterator_failures: VecDeque::new(),
            calls: vec![],
        }
    }

    pub fn with_shard(mut self, shard: Shard, sequence_numbers: &[&str]) -> Self {
        self.push_shard(shard, sequence_numbers);
        self
    }

    pub fn with_streams(self, pages: Vec<Vec<&str>>) -> Self {
        Self {
            streams: pages
                .into_iter()
                .map(|page| page.into_iter().map(String::from).collect())
                .collect(),
            ..self
        }
    }

    pub fn with_status(self, status: StreamStatus) -> Self {
        Self { status, ..self }
    }

    pub fn set_status(&mut self, status: StreamStatus) {
        self.status = status;
    }

    pub fn push_shard(&mut self, shard: Shard, sequence_numbers: &[&str]) {
        let records = sequence_numbers.iter().map(|&n| Record::new(n)).collect();
        self.shards.push(MockShard {
            shard,
            records,
            horizon: 0,
            gone: false,
        });
    }

    pub fn push_records(&mut self, shard_id: &str, sequence_numbers: &[&str]) {
        if let Some(s) = self.shard_mut(shard_id) {
            s.records
                .extend(sequence_numbers.iter().map(|&n| Record::new(n)));
        }
    }

    pub fn close_shard(&mut self, shard_id: &str, ending_sequence_number: &str) {
        if let Some(s) = self.shard_mut(shard_id) {
            let range = SequenceNumberRange {
                start: s.shard.range().start.clone(),
                end: Some(ending_sequence_number.into()),
            };
            s.shard = s.shard.clone().with_range(range);
        }
    }

    /// The first `count` records of the shard age out of retention.
    pub fn trim_records(&mut self, shard_id: &str, count: usize) {
        if let Some(s) = self.shard_mut(shard_id) {
            s.horizon = count.min(s.records.len());
        }
    }

    /// The whole shard ages out of retention.
    pub fn trim_shard(&mut self, shard_id: &str) {
        if let Some(s) = self.shard_mut(shard_id) {
            s.gone = true;
        }
    }

    /// Every iterator handed out so far stops working.
    pub fn expire_iterators(&mut self) {
        self.expired.extend(self.iterators.keys().cloned());
    }

    pub fn fail_get_records(&mut self, failure: MockFailure) {
        self.record_failures.push_back(failure);
    }

    pub fn fail_get_shard_iterator(&mut self, failure: MockFailure) {
        self.iterator_failures.push_back(failure);
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    fn shard_mut(&mut self, shard_id: &str) -> Option<&mut MockShard> {
        self.shards.iter_mut().find(|s| s.shard.id() == shard_id)
    }

    fn describe_stream(&mut self, exclusive_start_shard_id: Option<String>) -> DescribeStreamOutput {
        self.calls.push(format!(
            "DescribeStream {}",
            exclusive_start_shard_id.as_deref().unwrap_or("-")
        ));

        let start = exclusive_start_shard_id
            .and_then(|id| self.shards.iter().position(|s| s.shard.id() == id))
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = (start + self.describe_page_size).min(self.shards.len());

        let shards: Vec<Shard> = self.shards[start..end]
            .iter()
            .filter(|s| !s.gone)
            .map(|s| s.shard.clone())
            .collect();
        let last_shard_id = if end < self.shards.len() {
            Some(self.shards[end - 1].shard.id().to_string())
        } else {
            None
        };

        DescribeStreamOutput {
            stream_arn: self.stream_arn.clone(),
            stream_label: Some("2024-01-01T00:00:00.000".into()),
            table_name: Some("People".into()),
            status: self.status,
            view_type: Some(StreamViewType::NewAndOldImages),
            key_schema: vec![KeySchemaElement::new("Id", KeyType::Hash)],
            shards,
            last_shard_id,
        }
    }

    fn list_streams(&mut self, exclusive_start_stream_arn: Option<String>) -> ListStreamsOutput {
        self.calls.push(format!(
            "ListStreams {}",
            exclusive_start_stream_arn.as_deref().unwrap_or("-")
        ));

        let index = exclusive_start_stream_arn
            .and_then(|arn| self.streams.iter().position(|page| page.last() == Some(&arn)))
            .map(|i| i + 1)
            .unwrap_or(0);
        let stream_arns = self.streams.get(index).cloned().unwrap_or_default();
        let last_stream_arn = if index + 1 < self.streams.len() {
            stream_arns.last().cloned()
        } else {
            None
        };

        ListStreamsOutput {
            stream_arns,
            last_stream_arn,
        }
    }

    fn get_shard_iterator(
        &mut self,
        shard_id: &str,
        position: &IteratorPosition,
    ) -> ClientResult<GetShardIteratorOutput> {
        self.calls
            .push(format!("GetShardIterator {shard_id} {position}"));

        if let Some(failure) = self.iterator_failures.pop_front() {
            return Err(failure.into_error());
        }

        let shard = self
            .shards
            .iter()
            .find(|s| s.shard.id() == shard_id && !s.gone)
            .ok_or(ClientError::ResourceNotFound(shard_id.to_string()))?;

        let seq = |r: &Record| r.sequence_number().clone();
        let offset = match position {
            IteratorPosition::TrimHorizon => shard.horizon,
            IteratorPosition::Latest => shard.records.len(),
            IteratorPosition::AtSequenceNumber(n) => {
                count_while(&shard.records, |r| &seq(r) < n)
            }
            IteratorPosition::AfterSequenceNumber(n) => {
                count_while(&shard.records, |r| &seq(r) <= n)
            }
        };

        if offset < shard.horizon {
            return Err(ClientError::TrimmedDataAccess);
        }

        Ok(GetShardIteratorOutput {
            iterator: Some(self.issue(shard_id, offset)),
        })
    }

    fn issue(&mut self, shard_id: &str, offset: usize) -> String {
        self.issued += 1;
        let iterator = format!("{shard_id}#{}", self.issued);
        self.iterators
            .insert(iterator.clone(), (shard_id.to_string(), offset));
        iterator
    }

    fn get_records(&mut self, iterator: &str, limit: Option<i32>) -> ClientResult<GetRecordsOutput> {
        self.calls.push(format!("GetRecords {iterator}"));

        if self.expired.contains(iterator) {
            return Err(ClientError::ExpiredIterator);
        }

        let (shard_id, offset) = self
            .iterators
            .get(iterator)
            .cloned()
            .ok_or(ClientError::ResourceNotFound(iterator.to_string()))?;

        let page_limit = limit
            .map(|l| (l.max(1) as usize).min(self.page_limit))
            .unwrap_or(self.page_limit);

        let shard = self
            .shards
            .iter()
            .find(|s| s.shard.id() == shard_id)
            .ok_or(ClientError::ResourceNotFound(shard_id.clone()))?;

        if shard.gone {
            return Err(ClientError::ResourceNotFound(shard_id));
        }

        if offset < shard.horizon {
            return Err(ClientError::TrimmedDataAccess);
        }

        let end = (offset + page_limit).min(shard.records.len());
        let records = shard.records[offset..end].to_vec();
        let exhausted = end == shard.records.len() && shard.shard.is_closed();

        let next_iterator = if exhausted {
            None
        } else {
            Some(self.issue(&shard_id, end))
        };

        Ok(GetRecordsOutput {
            records,
            next_iterator,
        })
    }
}

fn count_while<F: Fn(&Record) -> bool>(records: &[Record], f: F) -> usize {
    records.iter().take_while(|r| f(r)).count()
}

#[derive(Debug, Clone)]
pub struct MockClient {
    source: Arc<Mutex<MockSource>>,
}

impl MockClient {
    pub fn new(source: MockSource) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
        }
    }

    pub fn source(&self) -> Arc<Mutex<MockSource>> {
        Arc::clone(&self.source)
    }

    pub fn calls(&self) -> Vec<String> {
        self.source.lock().unwrap().calls().to_vec()
    }
}

#[async_trait]
impl Client for MockClient {
    async fn describe_stream(
        &self,
        stream_arn: &str,
        exclusive_start_shard_id: Option<String>,
    ) -> ClientResult<DescribeStreamOutput> {
        let mut source = self.source.lock().unwrap();
        if source.stream_arn != stream_arn {
            return Err(ClientError::ResourceNotFound(stream_arn.to_string()));
        }
        Ok(source.describe_stream(exclusive_start_shard_id))
    }

    async fn list_streams(
        &self,
        _table_name: &str,
        exclusive_start_stream_arn: Option<String>,
    ) -> ClientResult<ListStreamsOutput> {
        let mut source = self.source.lock().unwrap();
        Ok(source.list_streams(exclusive_start_stream_arn))
    }

    async fn get_shard_iterator(
        &self,
        stream_arn: &str,
        shard_id: &str,
        position: &IteratorPosition,
    ) -> ClientResult<GetShardIteratorOutput> {
        let mut source = self.source.lock().unwrap();
        if source.stream_arn != stream_arn {
            return Err(ClientError::ResourceNotFound(stream_arn.to_string()));
        }
        source.get_shard_iterator(shard_id, position)
    }

    async fn get_records(
        &self,
        iterator: &str,
        limit: Option<i32>,
    ) -> ClientResult<GetRecordsOutput> {
        let failure = self.source.lock().unwrap().record_failures.pop_front();

        match failure {
            Some(MockFailure::Delay(delay)) => sleep(delay).await,
            Some(failure) => {
                let mut source = self.source.lock().unwrap();
                source.calls.push(format!("GetRecords {iterator}"));
                return Err(failure.into_error());
            }
            None => {}
        }

        let mut source = self.source.lock().unwrap();
        source.get_records(iterator, limit)
    }
}

/// A closed shard covering `[start, end]`.
pub fn closed_shard(id: &str, parent: Option<&str>, start: &str, end: &str) -> Shard {
    Shard::new(id, parent).with_range(SequenceNumberRange::new(Some(start), Some(end)))
}

/// A shard still open for writes from `start`.
pub fn open_shard(id: &str, parent: Option<&str>, start: &str) -> Shard {
    Shard::new(id, parent).with_range(SequenceNumberRange::new(Some(start), None::<&str>))
}

pub fn sequence_numbers(records: &[Record]) -> Vec<SequenceNumber> {
    records.iter().map(|r| r.sequence_number().clone()).collect()
}

#[tokio::test]
async fn mock_pages_records_until_closed_shard_is_exhausted() {
    let source = MockSource::new("arn")
        .with_shard(closed_shard("shard_0", None, "1", "5"), &["1", "2", "3", "4", "5"]);
    let client = MockClient::new(source);

    let output = client
        .get_shard_iterator("arn", "shard_0", &IteratorPosition::TrimHorizon)
        .await
        .unwrap();
    let first = client
        .get_records(output.iterator.as_deref().unwrap(), None)
        .await
        .unwrap();
    assert_eq!(first.records.len(), 3);
    assert!(first.next_iterator.is_some());

    let second = client
        .get_records(first.next_iterator.as_deref().unwrap(), None)
        .await
        .unwrap();
    assert_eq!(
        sequence_numbers(&second.records),
        vec![SequenceNumber::new("4"), SequenceNumber::new("5")]
    );
    assert!(second.next_iterator.is_none());
}

#[tokio::test]
async fn mock_serves_describe_stream_in_pages() {
    let source = MockSource::new("arn")
        .with_shard(closed_shard("shard_0", None, "1", "5"), &[])
        .with_shard(open_shard("shard_1", Some("shard_0"), "6"), &[])
        .with_shard(open_shard("shard_2", Some("shard_0"), "6"), &[]);
    let client = MockClient::new(source);

    let page = client.describe_stream("arn", None).await.unwrap();
    assert_eq!(page.shards.len(), 2);
    assert_eq!(page.last_shard_id.as_deref(), Some("shard_1"));

    let page = client
        .describe_stream("arn", page.last_shard_id)
        .await
        .unwrap();
    assert_eq!(page.shards.len(), 1);
    assert_eq!(page.shards[0].id(), "shard_2");
    assert!(page.last_shard_id.is_none());
}
