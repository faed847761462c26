use super::{attribute_value::into_item, Item, SequenceNumber, StreamViewType};

use aws_sdk_dynamodbstreams::{primitives, types};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct StreamRecord {
    approximate_creation_date_time: Option<DateTime<Utc>>,
    keys: Option<Item>,
    new_image: Option<Item>,
    old_image: Option<Item>,
    sequence_number: SequenceNumber,
    size_bytes: Option<i64>,
    stream_view_type: Option<StreamViewType>,
}

impl StreamRecord {
    pub fn new<T: Into<SequenceNumber>>(sequence_number: T) -> Self {
        Self {
            approximate_creation_date_time: None,
            keys: None,
            new_image: None,
            old_image: None,
            sequence_number: sequence_number.into(),
            size_bytes: None,
            stream_view_type: None,
        }
    }

    pub fn sequence_number(&self) -> &SequenceNumber {
        &self.sequence_number
    }

    pub fn keys(&self) -> Option<&Item> {
        self.keys.as_ref()
    }

    pub fn new_image(&self) -> Option<&Item> {
        self.new_image.as_ref()
    }

    pub fn old_image(&self) -> Option<&Item> {
        self.old_image.as_ref()
    }

    pub fn size_bytes(&self) -> Option<i64> {
        self.size_bytes
    }

    pub fn stream_view_type(&self) -> Option<StreamViewType> {
        self.stream_view_type
    }
}

fn into_chrono(datetime: primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(datetime.secs(), datetime.subsec_nanos())
}

impl TryFrom<types::StreamRecord> for StreamRecord {
    type Error = anyhow::Error;

    fn try_from(value: types::StreamRecord) -> Result<StreamRecord, Self::Error> {
        let sequence_number = value
            .sequence_number
            .ok_or(anyhow::anyhow!("`sequence_number` is None in `StreamRecord`"))?;

        Ok(StreamRecord {
            approximate_creation_date_time: value
                .approximate_creation_date_time
                .and_then(into_chrono),
            keys: value.keys.map(into_item),
            new_image: value.new_image.map(into_item),
            old_image: value.old_image.map(into_item),
            sequence_number: sequence_number.into(),
            size_bytes: value.size_bytes,
            stream_view_type: value.stream_view_type.map(StreamViewType::from),
        })
    }
}
