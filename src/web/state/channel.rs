use super::EntryStatus;
use crate::traversal::{Progress, TraversalHalf};
use crate::watcher::{ChannelEvent, Watch};

use tokio::sync::oneshot::{error::TryRecvError, Receiver};
use tracing::{error, info};

/// The web side of a running watch.
#[derive(Debug)]
pub struct Channel {
    stream_arn: String,
    half: TraversalHalf,
    receiver: Receiver<ChannelEvent>,
}

impl Channel {
    pub fn new(watch: Watch) -> Self {
        let Watch {
            stream_arn,
            half,
            rx_event,
        } = watch;

        Self {
            stream_arn,
            half,
            receiver: rx_event,
        }
    }

    pub fn stream_arn(&self) -> &str {
        self.stream_arn.as_str()
    }

    pub fn progress(&self) -> Progress {
        self.half.progress()
    }

    /// Whether the watch has ended, and why.
    pub fn poll(&mut self) -> (EntryStatus, Option<String>) {
        match self.receiver.try_recv() {
            Ok(ChannelEvent::Closed) => {
                info!("Every shard of {} has been read", self.stream_arn);
                (EntryStatus::Closed, None)
            }
            Ok(ChannelEvent::Error { message, error }) => {
                error!("{:#?}", error);
                self.close();
                (
                    EntryStatus::Error,
                    Some(format!("Unexpected error: {message}")),
                )
            }
            Err(TryRecvError::Closed) => {
                let message = "Oneshot channel is closed unexpectedly.";
                error!(message);
                self.close();
                (EntryStatus::Error, Some(message.into()))
            }
            Err(TryRecvError::Empty) => (EntryStatus::Running, None),
        }
    }

    pub fn close(&mut self) {
        self.half.close();
    }
}
