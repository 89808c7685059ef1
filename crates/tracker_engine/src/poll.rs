//! Pull adapter for the push channel.
//!
//! The service parks each change batch until someone asks for it, so the
//! poller turns `GET /api/notifications` into the ordered event stream the
//! dashboard expects. Reachability changes surface as connect/disconnect
//! events.

use std::sync::mpsc;
use std::time::Duration;

use tracker_logging::{tracker_debug, tracker_warn};

use crate::api::TrackerApi;
use crate::EngineEvent;

#[derive(Debug)]
pub struct NotificationPoller {
    interval: Duration,
    connected: bool,
}

impl NotificationPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            connected: false,
        }
    }

    /// One round-trip. Returns the events it produced, in delivery order.
    pub async fn poll_once(&mut self, api: &dyn TrackerApi) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        match api.notifications().await {
            Ok(batch) => {
                if !self.connected {
                    self.connected = true;
                    events.push(EngineEvent::PushConnected);
                }
                if batch.is_empty() {
                    tracker_debug!("No pending changes");
                } else {
                    events.push(EngineEvent::AdsUpdate(batch));
                }
            }
            Err(err) => {
                if self.connected {
                    tracker_warn!("Lost connection to tracker service: {}", err);
                    self.connected = false;
                    events.push(EngineEvent::PushDisconnected);
                }
            }
        }
        events
    }

    /// Polls until the event receiver is dropped.
    pub async fn run(mut self, api: &dyn TrackerApi, event_tx: mpsc::Sender<EngineEvent>) {
        loop {
            for event in self.poll_once(api).await {
                if event_tx.send(event).is_err() {
                    return;
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
