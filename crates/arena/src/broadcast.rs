//! Per-match fan-out of events to any number of observers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::events::MatchEvent;

pub const DEFAULT_CAPACITY: usize = 64;

/// Registry of open match channels.
///
/// Publishing never waits on subscribers. A subscriber that falls more than
/// `capacity` events behind loses the oldest ones.
#[derive(Clone)]
pub struct MatchHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<MatchEvent>>>>,
    capacity: usize,
}

impl Default for MatchHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MatchHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Open the channel for a match, or join the one already open.
    pub fn open(&self, match_id: &str) -> MatchPublisher {
        let mut channels = self.lock();
        let sender = channels
            .entry(match_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone();
        MatchPublisher {
            match_id: match_id.to_string(),
            sender,
        }
    }

    pub fn subscribe(&self, match_id: &str) -> Option<MatchSubscription> {
        let channels = self.lock();
        channels.get(match_id).map(|sender| MatchSubscription {
            receiver: sender.subscribe(),
        })
    }

    /// Forget the channel. It closes once the last publisher is dropped.
    pub fn close(&self, match_id: &str) {
        self.lock().remove(match_id);
    }

    pub fn is_open(&self, match_id: &str) -> bool {
        self.lock().contains_key(match_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, broadcast::Sender<MatchEvent>>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct MatchPublisher {
    match_id: String,
    sender: broadcast::Sender<MatchEvent>,
}

impl MatchPublisher {
    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: MatchEvent) -> usize {
        match self.sender.send(event) {
            Ok(n) => n,
            Err(_) => {
                debug!(match_id = %self.match_id, "No subscribers for event");
                0
            }
        }
    }
}

pub struct MatchSubscription {
    receiver: broadcast::Receiver<MatchEvent>,
}

impl MatchSubscription {
    /// Next event, or `None` once the match channel has closed.
    pub async fn next(&mut self) -> Option<MatchEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, oldest events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
