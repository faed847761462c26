use super::SequenceNumber;

use aws_sdk_dynamodbstreams::types;
use serde::Serialize;

/// The range of possible sequence numbers for a shard. No ending bound means the shard is still
/// open for writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceNumberRange {
    #[serde(rename = "StartingSequenceNumber")]
    pub start: Option<SequenceNumber>,
    #[serde(rename = "EndingSequenceNumber")]
    pub end: Option<SequenceNumber>,
}

impl SequenceNumberRange {
    pub fn new<S, E>(start: Option<S>, end: Option<E>) -> Self
    where
        S: Into<SequenceNumber>,
        E: Into<SequenceNumber>,
    {
        Self {
            start: start.map(Into::into),
            end: end.map(Into::into),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.end.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shard {
    #[serde(rename = "ShardId")]
    id: String,
    #[serde(rename = "ParentShardId")]
    parent: Option<String>,
    #[serde(rename = "SequenceNumberRange")]
    range: SequenceNumberRange,
}

impl Shard {
    pub fn new<T: Into<String>>(id: &str, parent: Option<T>) -> Self {
        Self {
            id: id.into(),
            parent: parent.map(|s| s.into()),
            range: SequenceNumberRange::default(),
        }
    }

    pub fn with_range(self, range: SequenceNumberRange) -> Self {
        Self { range, ..self }
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn range(&self) -> &SequenceNumberRange {
        &self.range
    }

    pub fn is_closed(&self) -> bool {
        self.range.is_closed()
    }
}

impl TryFrom<types::Shard> for Shard {
    type Error = anyhow::Error;

    fn try_from(value: types::Shard) -> Result<Shard, Self::Error> {
        let id = value
            .shard_id
            .ok_or(anyhow::anyhow!("`shard_id` is None in `Shard`"))?;
        let range = value
            .sequence_number_range
            .map(|r| SequenceNumberRange::new(r.starting_sequence_number, r.ending_sequence_number))
            .unwrap_or_default();

        Ok(Shard::new(&id, value.parent_shard_id).with_range(range))
    }
}
