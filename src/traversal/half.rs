use super::Progress;

use tokio::sync::{
    oneshot::{self, error::TryRecvError},
    watch,
};
use tracing::warn;

#[derive(Debug)]
pub enum Event {
    Close,
}

#[derive(Debug)]
pub enum TryRecvResult {
    Received(Event),
    Empty,
    Error(anyhow::Error),
}

pub trait ReceiverHalf {
    /// Get event receiver.
    fn rx_event(&mut self) -> &mut oneshot::Receiver<Event>;

    /// Poll the event without waiting.
    fn try_recv_event(&mut self) -> TryRecvResult {
        match self.rx_event().try_recv() {
            Ok(event) => TryRecvResult::Received(event),
            Err(TryRecvError::Empty) => TryRecvResult::Empty,
            Err(err) => TryRecvResult::Error(anyhow::Error::new(err)),
        }
    }
}

pub trait SenderHalf {
    /// Get event sender. `None` once an event has been sent, because the sender is oneshot.
    fn tx_event(&mut self) -> Option<oneshot::Sender<Event>>;

    fn send_event(&mut self, event: Event) {
        if let Some(tx) = self.tx_event() {
            if let Err(event) = tx.send(event) {
                warn!("Failed to send `{:?}` event.", event);
            }
        }
    }
}

/// The caller's end of a traversal: stops it and watches its progress.
///
/// Dropping the half stops the traversal too.
#[derive(Debug)]
pub struct TraversalHalf {
    tx_event: Option<oneshot::Sender<Event>>,
    rx_progress: watch::Receiver<Progress>,
}

impl TraversalHalf {
    pub(super) fn new(tx_event: oneshot::Sender<Event>, rx_progress: watch::Receiver<Progress>) -> Self {
        Self {
            tx_event: Some(tx_event),
            rx_progress,
        }
    }

    pub fn progress(&self) -> Progress {
        self.rx_progress.borrow().clone()
    }

    /// Ask the traversal to stop after the current round. Records already fetched are still
    /// delivered.
    pub fn close(&mut self) {
        self.send_event(Event::Close);
    }
}

impl SenderHalf for TraversalHalf {
    fn tx_event(&mut self) -> Option<oneshot::Sender<Event>> {
        self.tx_event.take()
    }
}

impl Drop for TraversalHalf {
    // Close channel
    fn drop(&mut self) {
        if let Some(tx) = self.tx_event() {
            let _ = tx.send(Event::Close);
        }
    }
}
