use super::SequenceNumber;

use aws_sdk_dynamodbstreams::types;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The policy a shard iterator is opened with, without its argument.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShardIteratorType {
    AtSequenceNumber,
    AfterSequenceNumber,
    TrimHorizon,
    Latest,
}

impl fmt::Display for ShardIteratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AtSequenceNumber => "AT_SEQUENCE_NUMBER",
            Self::AfterSequenceNumber => "AFTER_SEQUENCE_NUMBER",
            Self::TrimHorizon => "TRIM_HORIZON",
            Self::Latest => "LATEST",
        };
        write!(f, "{s}")
    }
}

/// Where a shard iterator starts reading. Only the sequence-number policies carry one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IteratorPosition {
    AtSequenceNumber(SequenceNumber),
    AfterSequenceNumber(SequenceNumber),
    TrimHorizon,
    Latest,
}

impl IteratorPosition {
    /// Combine a policy with an optional sequence number, rejecting combinations where the
    /// sequence number is missing or superfluous.
    pub fn new(
        kind: ShardIteratorType,
        sequence_number: Option<SequenceNumber>,
    ) -> Result<Self, String> {
        use ShardIteratorType::*;

        match (kind, sequence_number) {
            (AtSequenceNumber, Some(n)) => Ok(Self::AtSequenceNumber(n)),
            (AfterSequenceNumber, Some(n)) => Ok(Self::AfterSequenceNumber(n)),
            (TrimHorizon, None) => Ok(Self::TrimHorizon),
            (Latest, None) => Ok(Self::Latest),
            (kind @ (AtSequenceNumber | AfterSequenceNumber), None) => {
                Err(format!("{kind} requires a sequence number"))
            }
            (kind, Some(n)) => Err(format!("{kind} does not take a sequence number, got {n}")),
        }
    }

    pub fn kind(&self) -> ShardIteratorType {
        match self {
            Self::AtSequenceNumber(_) => ShardIteratorType::AtSequenceNumber,
            Self::AfterSequenceNumber(_) => ShardIteratorType::AfterSequenceNumber,
            Self::TrimHorizon => ShardIteratorType::TrimHorizon,
            Self::Latest => ShardIteratorType::Latest,
        }
    }

    pub fn sequence_number(&self) -> Option<&SequenceNumber> {
        match self {
            Self::AtSequenceNumber(n) | Self::AfterSequenceNumber(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for IteratorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sequence_number() {
            Some(n) => write!(f, "{} {n}", self.kind()),
            None => write!(f, "{}", self.kind()),
        }
    }
}

impl From<ShardIteratorType> for types::ShardIteratorType {
    fn from(kind: ShardIteratorType) -> types::ShardIteratorType {
        match kind {
            ShardIteratorType::AtSequenceNumber => types::ShardIteratorType::AtSequenceNumber,
            ShardIteratorType::AfterSequenceNumber => {
                types::ShardIteratorType::AfterSequenceNumber
            }
            ShardIteratorType::TrimHorizon => types::ShardIteratorType::TrimHorizon,
            ShardIteratorType::Latest => types::ShardIteratorType::Latest,
        }
    }
}
