use crate::models::{
    Asset, CryptoSignal, Indicators, ScoringBreakdown, SignalType, Timeframe,
    signal::{Bollinger, Macd},
};

#[allow(clippy::too_many_arguments)]
fn signal(
    asset_id: &str,
    kind: SignalType,
    score: u8,
    timeframe: Timeframe,
    entry_price: f64,
    stop_loss: f64,
    targets: &[f64],
    reasons: &[&str],
) -> CryptoSignal {
    CryptoSignal {
        asset_id: asset_id.to_string(),
        kind,
        score,
        timeframe,
        entry_price,
        stop_loss,
        targets: targets.to_vec(),
        reasons: reasons.iter().map(|r| r.to_string()).collect(),
    }
}

/// Setups published by the scoring engine.
pub fn builtin_signals() -> Vec<CryptoSignal> {
    vec![
        signal(
            "bitcoin",
            SignalType::StrongBuy,
            88,
            Timeframe::H4,
            68400.0,
            66800.0,
            &[70500.0, 72000.0],
            &["EMA Bullish Cross", "RSI Neutral Rising", "Volume Spike 1.5x"],
        ),
        signal(
            "solana",
            SignalType::Buy,
            72,
            Timeframe::H1,
            145.5,
            141.2,
            &[152.0, 158.0],
            &["Supertrend Buy Zone", "ADX Strength > 25"],
        ),
        signal(
            "ethereum",
            SignalType::Neutral,
            52,
            Timeframe::H4,
            2640.0,
            2580.0,
            &[2720.0, 2800.0],
            &["RSI Overbought Pullback", "Support Level Holding"],
        ),
    ]
}

/// Published signal for `asset`, or a neutral placeholder around its listing price.
pub fn signal_for(asset: &Asset) -> CryptoSignal {
    if let Some(s) = builtin_signals().into_iter().find(|s| s.asset_id == asset.id) {
        return s;
    }

    let score = 50;
    CryptoSignal {
        asset_id: asset.id.clone(),
        kind: SignalType::from_score(score),
        score,
        timeframe: Timeframe::H4,
        entry_price: asset.price,
        stop_loss: asset.price * 0.95,
        targets: vec![asset.price * 1.05, asset.price * 1.10],
        reasons: vec!["No major catalyst detected".to_string()],
    }
}

/// Signals paired with their assets, skipping signals for untracked assets.
pub fn list_signals(assets: &[Asset]) -> Vec<(Asset, CryptoSignal)> {
    builtin_signals()
        .into_iter()
        .filter_map(|s| {
            assets
                .iter()
                .find(|a| a.id == s.asset_id)
                .map(|a| (a.clone(), s))
        })
        .collect()
}

/// Indicator snapshot around `price`. Approximated from the 24h move until a
/// candle source is wired in.
pub fn indicators_for(asset: &Asset, price: f64) -> Indicators {
    let rsi = (50.0 + asset.change_24h * 4.0).clamp(5.0, 95.0);
    let adx = (20.0 + asset.change_24h.abs() * 2.0).clamp(10.0, 60.0);

    Indicators {
        rsi,
        ema50: price * 0.98,
        ema200: price * 0.95,
        macd: Macd {
            value: 0.5,
            signal: 0.3,
            histogram: 0.2,
        },
        atr: price * 0.02,
        adx,
        bollinger: Bollinger {
            upper: price * 1.05,
            middle: price,
            lower: price * 0.95,
        },
    }
}

fn pct(x: f64) -> u8 {
    x.round().clamp(0.0, 100.0) as u8
}

pub fn breakdown_for(asset: &Asset, price: f64, ind: &Indicators) -> ScoringBreakdown {
    let uptrend = price >= ind.ema50 && ind.ema50 >= ind.ema200;
    let trend = if uptrend { 60.0 + ind.adx } else { 40.0 - ind.adx / 2.0 };

    let turnover = if asset.market_cap > 0.0 {
        asset.volume_24h / asset.market_cap
    } else {
        0.0
    };

    ScoringBreakdown {
        trend: pct(trend),
        momentum: pct(ind.rsi),
        volume: pct(turnover * 1000.0),
        volatility: pct(100.0 - asset.change_24h.abs() * 5.0),
        sentiment: pct(50.0 + asset.change_24h * 5.0),
    }
}

/// Weighted aggregate of a breakdown, 0-100.
pub fn composite_score(b: &ScoringBreakdown) -> u8 {
    let weighted = f64::from(b.trend) * 0.30
        + f64::from(b.momentum) * 0.25
        + f64::from(b.volume) * 0.15
        + f64::from(b.volatility) * 0.10
        + f64::from(b.sentiment) * 0.20;
    pct(weighted)
}
