pub mod client;
pub mod config;
pub mod cursor;
pub mod directory;
pub mod error;
pub mod fetcher;
pub mod notification;
pub mod retry;
pub mod traversal;
pub mod tree;
pub mod types;
pub mod watcher;
pub mod web;

pub use client::{Client, DynamodbClient};
pub use directory::Directory;
pub use error::{Error, Result};
pub use traversal::{StreamEvent, Traversal, TraversalHalf};

pub const ENV_DYNAMODB_ENDPOINT_URL: &str = "DYNAMODB_ENDPOINT_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
