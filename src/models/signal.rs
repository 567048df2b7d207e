use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Interval string understood by the charting widget.
    pub fn chart_interval(self) -> &'static str {
        match self {
            Timeframe::M1 => "1",
            Timeframe::M5 => "5",
            Timeframe::M15 => "15",
            Timeframe::H1 => "60",
            Timeframe::H4 => "240",
            Timeframe::D1 => "D",
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown timeframe: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "NEUTRAL")]
    Neutral,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

impl SignalType {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => SignalType::StrongBuy,
            65..=79 => SignalType::Buy,
            36..=64 => SignalType::Neutral,
            21..=35 => SignalType::Sell,
            _ => SignalType::StrongSell,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalType::StrongBuy => "STRONG BUY",
            SignalType::Buy => "BUY",
            SignalType::Neutral => "NEUTRAL",
            SignalType::Sell => "SELL",
            SignalType::StrongSell => "STRONG SELL",
        }
    }

    pub fn is_bullish(self) -> bool {
        matches!(self, SignalType::StrongBuy | SignalType::Buy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub rsi: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub macd: Macd,
    pub atr: f64,
    pub adx: f64,
    pub bollinger: Bollinger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoSignal {
    pub asset_id: String,
    pub kind: SignalType,
    pub score: u8,
    pub timeframe: Timeframe,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub targets: Vec<f64>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringBreakdown {
    pub trend: u8,
    pub momentum: u8,
    pub volume: u8,
    pub volatility: u8,
    pub sentiment: u8,
}
