use super::{Identity, OperationType, SequenceNumber, StreamRecord};

use aws_sdk_dynamodbstreams::types;
use serde::Serialize;

/// A single change captured by the stream.
#[derive(Debug, Serialize, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(rename = "eventID")]
    event_id: Option<String>,
    event_name: Option<OperationType>,
    event_version: Option<String>,
    event_source: Option<String>,
    aws_region: Option<String>,
    dynamodb: StreamRecord,
    user_identity: Option<Identity>,
}

impl Record {
    pub fn sequence_number(&self) -> &SequenceNumber {
        self.dynamodb.sequence_number()
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn event_name(&self) -> Option<OperationType> {
        self.event_name
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.aws_region.as_deref()
    }

    pub fn dynamodb(&self) -> &StreamRecord {
        &self.dynamodb
    }
}

#[cfg(test)]
impl Record {
    pub fn new<T: Into<SequenceNumber>>(sequence_number: T) -> Self {
        let sequence_number: SequenceNumber = sequence_number.into();
        Self {
            event_id: Some(format!("event_{sequence_number}")),
            event_name: Some(OperationType::Insert),
            event_version: Some("1.1".into()),
            event_source: Some("aws:dynamodb".into()),
            aws_region: Some("us-east-1".into()),
            dynamodb: StreamRecord::new(sequence_number),
            user_identity: None,
        }
    }
}

impl TryFrom<types::Record> for Record {
    type Error = anyhow::Error;

    fn try_from(value: types::Record) -> Result<Record, Self::Error> {
        let dynamodb = value
            .dynamodb
            .ok_or(anyhow::anyhow!("`dynamodb` is None in `Record`"))
            .and_then(StreamRecord::try_from)?;

        Ok(Record {
            event_id: value.event_id,
            event_name: value.event_name.map(OperationType::from),
            event_version: value.event_version,
            event_source: value.event_source,
            aws_region: value.aws_region,
            dynamodb,
            user_identity: value.user_identity.map(Identity::from),
        })
    }
}
