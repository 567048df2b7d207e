use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    /// Inclusive on both sides: a price sitting exactly on the target counts.
    pub fn is_crossed(self, price: f64, target: f64) -> bool {
        match self {
            Direction::Above => price >= target,
            Direction::Below => price <= target,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" => Ok(Direction::Above),
            "below" => Ok(Direction::Below),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,

    pub asset_id: String,
    // denormalized for display
    pub symbol: String,

    pub target_price: f64,
    pub direction: Direction,

    pub active: bool,

    pub created_at: i64,
    pub triggered_at: Option<i64>,
}
