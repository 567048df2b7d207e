pub mod price_store;
pub mod alerts_service;
pub mod alert_monitor;
pub mod notifications;
pub mod price_feed;

pub mod market_data;
pub mod signals_service;
pub mod scanner_service;
pub mod portfolio_service;
pub mod explanation;
pub mod chart_widget;
