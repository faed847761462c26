use aws_sdk_dynamodbstreams::{primitives::Blob, types};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use std::collections::HashMap;

pub type Item = HashMap<String, AttributeValue>;

/// An attribute in the DynamoDB JSON shape. Binary values are kept base64 encoded, as the
/// DynamoDB Streams JSON wire format does.
#[derive(Debug, Serialize, Clone, Eq, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeValue {
    B(String),
    Bool(bool),
    Bs(Vec<String>),
    L(Vec<AttributeValue>),
    M(Item),
    N(String),
    Ns(Vec<String>),
    Null(bool),
    S(String),
    Ss(Vec<String>),
    Unknown,
}

fn encode(blob: Blob) -> String {
    STANDARD.encode(blob.into_inner())
}

pub(crate) fn into_item(value: HashMap<String, types::AttributeValue>) -> Item {
    value
        .into_iter()
        .map(|(key, val)| (key, AttributeValue::from(val)))
        .collect()
}

impl From<types::AttributeValue> for AttributeValue {
    fn from(value: types::AttributeValue) -> AttributeValue {
        match value {
            types::AttributeValue::B(v) => AttributeValue::B(encode(v)),
            types::AttributeValue::Bool(v) => AttributeValue::Bool(v),
            types::AttributeValue::Bs(v) => AttributeValue::Bs(v.into_iter().map(encode).collect()),
            types::AttributeValue::L(v) => {
                AttributeValue::L(v.into_iter().map(AttributeValue::from).collect())
            }
            types::AttributeValue::M(v) => AttributeValue::M(into_item(v)),
            types::AttributeValue::N(v) => AttributeValue::N(v),
            types::AttributeValue::Ns(v) => AttributeValue::Ns(v),
            types::AttributeValue::Null(v) => AttributeValue::Null(v),
            types::AttributeValue::S(v) => AttributeValue::S(v),
            types::AttributeValue::Ss(v) => AttributeValue::Ss(v),
            _ => AttributeValue::Unknown,
        }
    }
}
