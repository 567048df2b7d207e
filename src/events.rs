//! UI event bus. Browsers subscribe through `/events` and refresh the
//! affected partials when an event name arrives.

use tokio::sync::broadcast;

use crate::services::price_store::{PriceObserver, PriceStore};

pub use crate::services::{alerts_service::ALERTS_UPDATED, notifications::NOTIFICATIONS_UPDATED};

pub const PRICES_UPDATED: &str = "pricesUpdated";

const BUS_CAPACITY: usize = 64;

pub fn channel() -> broadcast::Sender<String> {
    let (tx, _rx) = broadcast::channel::<String>(BUS_CAPACITY);
    tx
}

/// Forwards price-store changes to the event bus.
pub struct PriceEvents {
    events_tx: broadcast::Sender<String>,
}

impl PriceEvents {
    pub fn new(events_tx: broadcast::Sender<String>) -> Self {
        Self { events_tx }
    }
}

impl PriceObserver for PriceEvents {
    fn on_prices_changed(&self, _store: &PriceStore, _changed: &[String]) {
        // no subscribers is fine
        let _ = self.events_tx.send(PRICES_UPDATED.to_string());
    }
}
