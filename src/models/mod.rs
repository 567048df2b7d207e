pub mod alert;
pub mod asset;
pub mod notification;
pub mod signal;

pub use alert::{Alert, Direction};
pub use asset::{Asset, GlobalStats};
pub use notification::{Notification, Severity};
pub use signal::{CryptoSignal, Indicators, ScoringBreakdown, SignalType, Timeframe};
