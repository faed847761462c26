use crate::types::Record;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// A webhook post. The sender learns how the post went through the receiver returned by `new`.
#[derive(Debug)]
pub struct Event {
    pub table_name: String,
    pub url: String,
    pub payload: Payload,
    done: Option<oneshot::Sender<Result<()>>>,
}

impl Event {
    pub fn new<T, U, P>(table_name: T, url: U, payload: P) -> (Self, oneshot::Receiver<Result<()>>)
    where
        T: Into<String>,
        U: Into<String>,
        P: Into<Payload>,
    {
        let (tx, rx) = oneshot::channel();
        let event = Self {
            table_name: table_name.into(),
            url: url.into(),
            payload: payload.into(),
            done: Some(tx),
        };
        (event, rx)
    }

    pub async fn notify(&self) -> Result<()> {
        match &self.payload {
            Payload::Records(records) => {
                info!(
                    "Send {} records of {} to {}",
                    records.len(),
                    self.table_name,
                    self.url
                );
                send(&self.url, records).await
            }
            Payload::Error(message) => {
                let body = serde_json::json!({
                    "table_name": self.table_name,
                    "message": message,
                });
                send(&self.url, &body).await
            }
        }
    }

    /// Hand the outcome of the post back to the sender.
    pub fn done(mut self, result: Result<()>) {
        if let Some(tx) = self.done.take() {
            if tx.send(result).is_err() {
                warn!("Nobody waits for the post to {}", self.url);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Records(Vec<Record>),
    Error(String),
}

async fn send<B: Serialize>(url: &str, body: &B) -> Result<()> {
    reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await?
        .error_for_status()
        .map(drop)
        .map_err(anyhow::Error::from)
}

impl From<Vec<Record>> for Payload {
    fn from(records: Vec<Record>) -> Self {
        Self::Records(records)
    }
}

impl From<String> for Payload {
    fn from(message: String) -> Payload {
        Self::Error(message)
    }
}

impl From<&str> for Payload {
    fn from(message: &str) -> Payload {
        Self::Error(message.to_string())
    }
}
