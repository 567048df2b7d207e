//! Library entrypoint for CryptoPulse.
//!
//! `main.rs` is only the composition root; everything else lives here so the
//! integration tests under `tests/` can build an `AppState` and drive the
//! stores, services and routers directly.

use std::sync::{Arc, PoisonError, RwLock};

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod models;
pub mod services;

#[path = "views/render.rs"]
pub mod render;
#[path = "views/templates.rs"]
pub mod templates;

pub mod controllers;
pub mod routes;

use crate::{
    error::AppError,
    models::{Alert, Direction},
    services::{
        alert_monitor::AlertMonitor,
        alerts_service::AlertRegistry,
        explanation::ExplanationClient,
        market_data::{MarketDataClient, MarketSnapshot},
        notifications::NotificationQueue,
        price_feed::{self, FeedHandle, SymbolIndex},
        price_store::PriceStore,
    },
};

/// Everything the handlers and background tasks share. Built once by the
/// composition root; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub hbs: templates::Hbs,
    pub settings: config::Settings,
    pub market_client: MarketDataClient,
    pub market: Arc<RwLock<MarketSnapshot>>,
    pub prices: Arc<PriceStore>,
    pub alerts: Arc<AlertRegistry>,
    pub notifications: Arc<NotificationQueue>,
    pub monitor: Arc<AlertMonitor>,
    pub explainer: ExplanationClient,
    pub events_tx: tokio::sync::broadcast::Sender<String>,
}

impl AppState {
    pub fn new(settings: config::Settings) -> Result<Self, AppError> {
        let hbs = templates::build_handlebars()?;
        let events_tx = events::channel();

        let notifications = Arc::new(NotificationQueue::new(
            settings.notification_ttl,
            events_tx.clone(),
        ));
        let alerts = Arc::new(AlertRegistry::new(notifications.clone(), events_tx.clone()));
        let monitor = Arc::new(AlertMonitor::new(alerts.clone(), notifications.clone()));

        let prices = Arc::new(PriceStore::new());
        prices.subscribe(monitor.clone());
        prices.subscribe(Arc::new(events::PriceEvents::new(events_tx.clone())));

        Ok(Self {
            hbs,
            market_client: MarketDataClient::new(&settings),
            market: Arc::new(RwLock::new(MarketSnapshot::default())),
            prices,
            alerts,
            notifications,
            monitor,
            explainer: ExplanationClient::new(&settings),
            settings,
            events_tx,
        })
    }

    pub fn market(&self) -> MarketSnapshot {
        self.market
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the listing and record its prices as first observations.
    pub fn install_market(&self, snapshot: MarketSnapshot) {
        self.prices.seed_from_listing(&snapshot.assets);
        tracing::info!(
            "market loaded: {} assets, {} prices tracked",
            snapshot.assets.len(),
            self.prices.len()
        );
        *self.market.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    pub async fn load_market(&self) {
        let snapshot = self.market_client.load().await;
        self.install_market(snapshot);
    }

    /// Start the configured price source over the current listing.
    pub fn start_feed(&self) -> FeedHandle {
        let index = SymbolIndex::from_assets(&self.market().assets);
        price_feed::start((&self.settings).into(), self.prices.clone(), index)
    }

    /// Create an alert and evaluate it straight away, so a threshold that is
    /// already met fires without waiting for the next tick.
    pub fn create_alert(
        &self,
        asset_id: &str,
        symbol: &str,
        target_price: f64,
        direction: Direction,
    ) -> Result<Alert, AppError> {
        let alert = self.alerts.create(asset_id, symbol, target_price, direction)?;
        self.monitor
            .evaluate_assets(&self.prices, std::slice::from_ref(&alert.asset_id));
        Ok(alert)
    }
}
