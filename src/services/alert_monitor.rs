use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    format::fmt_usd,
    models::{Alert, Severity},
    services::{
        alerts_service::AlertRegistry,
        notifications::NotificationQueue,
        price_store::{PriceObserver, PriceStore},
    },
};

/// Evaluates active alerts against the price store and fires the ones whose
/// threshold has been crossed.
///
/// Firing = deactivate + push one `alert` notification. The notification is
/// only pushed by the caller whose `deactivate` performed the transition, so
/// overlapping passes never notify twice for the same alert.
pub struct AlertMonitor {
    alerts: Arc<AlertRegistry>,
    notifications: Arc<NotificationQueue>,
}

impl AlertMonitor {
    pub fn new(alerts: Arc<AlertRegistry>, notifications: Arc<NotificationQueue>) -> Self {
        Self {
            alerts,
            notifications,
        }
    }

    /// Full pass over every active alert. Returns the alerts fired by this pass.
    pub fn evaluate(&self, store: &PriceStore) -> Vec<Alert> {
        self.run_pass(store, None)
    }

    /// Pass restricted to alerts on the given assets.
    pub fn evaluate_assets(&self, store: &PriceStore, asset_ids: &[String]) -> Vec<Alert> {
        let scope: HashSet<&str> = asset_ids.iter().map(String::as_str).collect();
        self.run_pass(store, Some(&scope))
    }

    fn run_pass(&self, store: &PriceStore, scope: Option<&HashSet<&str>>) -> Vec<Alert> {
        // 1) group active alerts by asset => one price lookup per asset
        let mut by_asset: HashMap<String, Vec<Alert>> = HashMap::new();
        for a in self.alerts.list_active() {
            if scope.is_some_and(|s| !s.contains(a.asset_id.as_str())) {
                continue;
            }
            by_asset.entry(a.asset_id.clone()).or_default().push(a);
        }

        if by_asset.is_empty() {
            return Vec::new();
        }

        let mut fired = Vec::new();

        for (asset_id, group) in by_asset {
            // unknown price => nothing to compare against
            let Some(price) = store.get(&asset_id) else {
                continue;
            };

            for a in group {
                if !a.direction.is_crossed(price, a.target_price) {
                    continue;
                }

                if !self.alerts.deactivate(a.id) {
                    // removed or fired by a concurrent pass
                    continue;
                }

                tracing::info!(
                    "alert {} fired: {} {} {} at price {}",
                    a.id,
                    a.symbol,
                    a.direction,
                    a.target_price,
                    price
                );

                self.notifications.push(
                    format!(
                        "🚨 ALERT: {} has crossed {}!",
                        a.symbol,
                        fmt_usd(a.target_price)
                    ),
                    Severity::Alert,
                );
                fired.push(Alert { active: false, ..a });
            }
        }

        if !fired.is_empty() {
            self.alerts.notify_updated();
        }

        fired
    }
}

impl PriceObserver for AlertMonitor {
    fn on_prices_changed(&self, store: &PriceStore, changed: &[String]) {
        self.evaluate_assets(store, changed);
    }
}
