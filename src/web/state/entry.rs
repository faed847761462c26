use super::Channel;
use crate::traversal::Progress;
use crate::watcher::Watch;

use serde::Serialize;

#[derive(Debug, Copy, Clone, Serialize, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Created,
    Running,
    Closed,
    Error,
}

/// A table watched on behalf of a webhook.
#[derive(Debug)]
pub struct Entry {
    table_name: String,
    url: String,
    status: EntryStatus,
    error: Option<String>,
    channel: Option<Channel>,
}

impl Entry {
    pub fn new<S, T>(table_name: S, url: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            url: url.into(),
            status: EntryStatus::Created,
            error: None,
            channel: None,
        }
    }

    pub fn table_name(&self) -> &str {
        self.table_name.as_str()
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stream_arn(&self) -> Option<&str> {
        self.channel.as_ref().map(Channel::stream_arn)
    }

    pub fn progress(&self) -> Option<Progress> {
        self.channel.as_ref().map(Channel::progress)
    }

    pub fn start(&mut self, watch: Watch) {
        self.channel = Some(Channel::new(watch));
        self.status = EntryStatus::Running;
    }

    /// The watch could not be started.
    pub fn fail<T: Into<String>>(&mut self, message: T) {
        self.status = EntryStatus::Error;
        self.error = Some(message.into());
    }

    pub fn check(&mut self) {
        if self.status != EntryStatus::Running {
            return;
        }

        if let Some(channel) = self.channel.as_mut() {
            let (status, error) = channel.poll();
            self.status = status;
            self.error = error;
        }
    }

    pub fn stop(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            channel.close();
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryState {
    table_name: String,
    url: String,
    status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<Progress>,
}

impl From<&Entry> for EntryState {
    fn from(entry: &Entry) -> Self {
        Self {
            table_name: entry.table_name().to_owned(),
            url: entry.url().to_owned(),
            status: entry.status(),
            stream_arn: entry.stream_arn().map(String::from),
            error: entry.error.clone(),
            progress: entry.progress(),
        }
    }
}
