use aws_sdk_dynamodbstreams::types;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamStatus {
    Creating,
    Deleting,
    Active,
    Updating,
    /// The stream no longer takes writes; its closed shards stay readable until trimmed.
    Disabled,
    Unknown,
}

impl StreamStatus {
    /// Shards are being split or merged. The topology has to be re-resolved soon.
    pub fn is_updating(&self) -> bool {
        matches!(self, Self::Updating)
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Creating => "CREATING",
            Self::Deleting => "DELETING",
            Self::Active => "ACTIVE",
            Self::Updating => "UPDATING",
            Self::Disabled => "DISABLED",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

impl From<types::StreamStatus> for StreamStatus {
    fn from(status: types::StreamStatus) -> StreamStatus {
        match status {
            types::StreamStatus::Enabling => StreamStatus::Creating,
            types::StreamStatus::Enabled => StreamStatus::Active,
            types::StreamStatus::Disabling => StreamStatus::Deleting,
            types::StreamStatus::Disabled => StreamStatus::Disabled,
            _ => StreamStatus::Unknown,
        }
    }
}
