use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Alert, Direction, Severity},
    services::notifications::NotificationQueue,
};

pub const ALERTS_UPDATED: &str = "alertsUpdated";

/// User-defined threshold alerts, kept in creation order.
///
/// Target, direction and asset never change after `create`. The only
/// mutation is `deactivate`, which the alert monitor performs once per alert.
pub struct AlertRegistry {
    alerts: Mutex<Vec<Alert>>,
    notifications: Arc<NotificationQueue>,
    events_tx: broadcast::Sender<String>,
}

impl AlertRegistry {
    pub fn new(notifications: Arc<NotificationQueue>, events_tx: broadcast::Sender<String>) -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            notifications,
            events_tx,
        }
    }

    pub fn create(
        &self,
        asset_id: &str,
        symbol: &str,
        target_price: f64,
        direction: Direction,
    ) -> Result<Alert, AppError> {
        if !target_price.is_finite() {
            return Err(AppError::validation("target price must be a finite number"));
        }
        let asset_id = asset_id.trim();
        if asset_id.is_empty() {
            return Err(AppError::validation("missing asset id"));
        }

        let alert = Alert {
            id: Uuid::new_v4(),
            asset_id: asset_id.to_string(),
            symbol: symbol.trim().to_uppercase(),
            target_price,
            direction,
            active: true,
            created_at: Utc::now().timestamp(),
            triggered_at: None,
        };

        self.lock().push(alert.clone());

        tracing::info!(
            "alert {} created: {} {} {}",
            alert.id,
            alert.symbol,
            alert.direction,
            alert.target_price
        );

        self.notifications.push(
            format!("Alert set for {} at ${}", alert.symbol, alert.target_price),
            Severity::Success,
        );
        let _ = self.events_tx.send(ALERTS_UPDATED.to_string());

        Ok(alert)
    }

    /// Delete an alert, active or not. Deleting an unknown id is a no-op.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = {
            let mut alerts = self.lock();
            let before = alerts.len();
            alerts.retain(|a| a.id != id);
            alerts.len() != before
        };

        if removed {
            tracing::info!("alert {} removed", id);
            let _ = self.events_tx.send(ALERTS_UPDATED.to_string());
        }
        removed
    }

    /// Flip `active` to false. Returns true only for the call that performed
    /// the transition; absent or already inactive alerts return false.
    pub(crate) fn deactivate(&self, id: Uuid) -> bool {
        let mut alerts = self.lock();
        match alerts.iter_mut().find(|a| a.id == id && a.active) {
            Some(a) => {
                a.active = false;
                a.triggered_at = Some(Utc::now().timestamp());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Alert> {
        self.lock().iter().find(|a| a.id == id).cloned()
    }

    pub fn list_by_asset(&self, asset_id: &str) -> Vec<Alert> {
        self.lock()
            .iter()
            .filter(|a| a.asset_id == asset_id)
            .cloned()
            .collect()
    }

    pub fn list_active(&self) -> Vec<Alert> {
        self.lock().iter().filter(|a| a.active).cloned().collect()
    }

    pub fn list_all(&self) -> Vec<Alert> {
        self.lock().clone()
    }

    pub(crate) fn notify_updated(&self) {
        let _ = self.events_tx.send(ALERTS_UPDATED.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Alert>> {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
