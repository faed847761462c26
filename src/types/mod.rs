mod attribute_value;
mod identity;
mod key_schema;
mod operation_type;
mod position;
mod record;
mod sequence_number;
mod shard;
mod stream_record;
mod stream_status;
mod stream_view_type;
mod topology;

pub use attribute_value::{AttributeValue, Item};
pub use identity::Identity;
pub use key_schema::{KeySchemaElement, KeyType};
pub use operation_type::OperationType;
pub use position::{IteratorPosition, ShardIteratorType};
pub use record::Record;
pub use sequence_number::SequenceNumber;
pub use shard::{SequenceNumberRange, Shard};
pub use stream_record::StreamRecord;
pub use stream_status::StreamStatus;
pub use stream_view_type::StreamViewType;
pub use topology::StreamTopology;
