use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use rand::Rng;

use crate::models::Asset;

pub type PriceMap = HashMap<String, f64>;

/// Largest relative move a single simulated tick may apply (0.1%).
pub const SIM_DRIFT: f64 = 0.001;

/// Called synchronously after every merge that changed at least one price.
pub trait PriceObserver: Send + Sync {
    fn on_prices_changed(&self, store: &PriceStore, changed: &[String]);
}

/// Latest known price per asset id.
///
/// A missing key means the price is unknown. Writers merge under a single
/// write lock, so readers see either the map before a merge or after it.
#[derive(Default)]
pub struct PriceStore {
    prices: RwLock<PriceMap>,
    observers: RwLock<Vec<Arc<dyn PriceObserver>>>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn PriceObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn get(&self, asset_id: &str) -> Option<f64> {
        self.prices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(asset_id)
            .copied()
    }

    pub fn snapshot(&self) -> PriceMap {
        self.prices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.prices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge `partial` into the store. Keys not in `partial` keep their value.
    /// Non-finite or non-positive prices are dropped: such a key keeps its
    /// previous price, or stays unknown if it had none. Returns the number of
    /// prices written.
    pub fn apply_update(&self, partial: PriceMap) -> usize {
        let changed: Vec<String> = {
            let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
            partial
                .into_iter()
                .filter(|(id, price)| {
                    let ok = price.is_finite() && *price > 0.0;
                    if !ok {
                        tracing::debug!("dropping invalid price for {}: {}", id, price);
                    }
                    ok
                })
                .map(|(id, price)| {
                    prices.insert(id.clone(), price);
                    id
                })
                .collect()
        };

        self.notify(&changed);
        changed.len()
    }

    /// Record the listing prices as first observations.
    pub fn seed_from_listing(&self, assets: &[Asset]) -> usize {
        let partial = assets
            .iter()
            .map(|a| (a.id.clone(), a.price))
            .collect::<PriceMap>();
        self.apply_update(partial)
    }

    /// Move every known price by an independent factor in
    /// `[1 - SIM_DRIFT, 1 + SIM_DRIFT]`.
    pub fn apply_simulated_tick<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let changed: Vec<String> = {
            let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
            prices
                .iter_mut()
                .map(|(id, price)| {
                    *price *= 1.0 + rng.gen_range(-SIM_DRIFT..=SIM_DRIFT);
                    id.clone()
                })
                .collect()
        };

        self.notify(&changed);
        changed.len()
    }

    fn notify(&self, changed: &[String]) {
        if changed.is_empty() {
            return;
        }

        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for obs in observers {
            obs.on_prices_changed(self, changed);
        }
    }
}
