//! Polling watcher that re-reads a user's card list while illustrations are
//! pending.

use std::time::Duration;

use db::{DBService, models::flashcard::Flashcard};
use tokio::{sync::watch, task::JoinHandle, time::interval};
use tracing::{debug, error};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Re-fetches a user's cards on a fixed cadence and publishes each snapshot
/// on a watch channel. There is no push path from the generation flow, so
/// this is how a viewer converges on freshly generated images.
pub struct CardListWatcher {
    db: DBService,
    user_id: String,
    poll_interval: Duration,
}

impl CardListWatcher {
    pub fn new(db: DBService, user_id: String) -> Self {
        Self {
            db,
            user_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Spawn the polling loop. Each poll sends a fresh snapshot; the loop
    /// exits once no card is missing an image, or once every receiver has
    /// been dropped.
    pub fn spawn(self) -> (watch::Receiver<Vec<Flashcard>>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(Vec::new());
        let handle = tokio::spawn(async move { self.run(tx).await });
        (rx, handle)
    }

    async fn run(self, tx: watch::Sender<Vec<Flashcard>>) {
        let mut interval = interval(self.poll_interval);

        loop {
            interval.tick().await;

            let cards = match Flashcard::list_for_user(&self.db.pool, &self.user_id).await {
                Ok(cards) => cards,
                Err(e) => {
                    error!(user_id = %self.user_id, error = %e, "card watcher refresh failed");
                    continue;
                }
            };

            let pending = cards.iter().any(|card| card.image_url.is_none());

            if tx.send(cards).is_err() {
                debug!(user_id = %self.user_id, "card watcher receivers gone, stopping");
                break;
            }
            if !pending {
                debug!(user_id = %self.user_id, "no pending illustrations, stopping watcher");
                break;
            }
        }
    }
}
