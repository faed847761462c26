use crate::types::{Record, SequenceNumber};

/// What a traversal yields.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Record {
        shard_id: String,
        sequence_number: SequenceNumber,
        record: Record,
    },
    /// Records of the shard after `last_sequence_number` aged out of retention before they were
    /// read. Records still retained follow, unless the shard completes right after.
    Gap {
        shard_id: String,
        last_sequence_number: Option<SequenceNumber>,
    },
    /// Every record of the shard has been yielded. Its children may be read from now on.
    ShardCompleted { shard_id: String },
}

impl StreamEvent {
    pub fn record<T: Into<String>>(shard_id: T, record: Record) -> Self {
        Self::Record {
            shard_id: shard_id.into(),
            sequence_number: record.sequence_number().clone(),
            record,
        }
    }

    pub fn shard_id(&self) -> &str {
        match self {
            Self::Record { shard_id, .. }
            | Self::Gap { shard_id, .. }
            | Self::ShardCompleted { shard_id } => shard_id.as_str(),
        }
    }
}
