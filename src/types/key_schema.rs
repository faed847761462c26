use aws_sdk_dynamodbstreams::types;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Hash,
    Range,
    Unknown,
}

/// One key attribute of the source table, in the order the table declares them.
#[derive(Debug, Serialize, Clone, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    attribute_name: String,
    key_type: KeyType,
}

impl KeySchemaElement {
    pub fn new<T: Into<String>>(attribute_name: T, key_type: KeyType) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type,
        }
    }

    pub fn attribute_name(&self) -> &str {
        self.attribute_name.as_str()
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }
}

impl From<types::KeySchemaElement> for KeySchemaElement {
    fn from(value: types::KeySchemaElement) -> KeySchemaElement {
        let key_type = match value.key_type {
            types::KeyType::Hash => KeyType::Hash,
            types::KeyType::Range => KeyType::Range,
            _ => KeyType::Unknown,
        };

        KeySchemaElement {
            attribute_name: value.attribute_name,
            key_type,
        }
    }
}
