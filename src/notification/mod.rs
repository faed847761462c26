mod event;

pub use event::{Event, Payload};

use anyhow::Result;
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::warn;

/// Posts webhook events of one watch through the notifier task.
#[derive(Debug, Clone)]
pub struct Notification {
    table_name: String,
    url: String,
    tx: Sender<Event>,
}

impl Notification {
    pub fn new<T, U>(table_name: T, url: U, tx: Sender<Event>) -> Self
    where
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            url: url.into(),
            tx,
        }
    }

    /// Post `payload` and wait until the notifier is done with it, so posts of one watch arrive
    /// in order.
    pub async fn send<P: Into<Payload>>(&self, payload: P) -> Result<()> {
        let (event, done) = Event::new(&self.table_name, &self.url, payload);

        self.tx
            .send(event)
            .await
            .map_err(|_| anyhow::anyhow!("The notifier is gone"))?;

        done.await.map_err(anyhow::Error::from)?
    }
}

/// Post every queued event and report the outcome to its sender. Runs until all senders are
/// gone.
pub async fn start(mut receiver: Receiver<Event>) -> Result<()> {
    while let Some(event) = receiver.recv().await {
        tokio::spawn(async move {
            let result = event.notify().await;
            if let Err(err) = &result {
                warn!("{:#?}", err);
            }
            event.done(result);
        });
    }

    Err(anyhow::anyhow!(
        "It seems all event senders have been dropped"
    ))
}
