use serde::Serialize;

use crate::{models::Asset, services::price_store::PriceMap};

const HOLDINGS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Holding {
    pub asset: Asset,
    pub amount: f64,
    pub avg_price: f64,
    pub price: f64,
    pub value: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub holdings: Vec<Holding>,
    pub total_value: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub pnl_pct: f64,
}

/// Demo positions in the first few listed assets, valued at live prices.
pub fn demo_portfolio(assets: &[Asset], prices: &PriceMap) -> PortfolioSummary {
    let holdings: Vec<Holding> = assets
        .iter()
        .take(HOLDINGS)
        .map(|a| {
            let price = prices.get(&a.id).copied().unwrap_or(a.price);
            let amount = if a.symbol == "BTC" { 0.25 } else { 5.0 };
            let avg_price = a.price * 0.92;
            let value = amount * price;
            let cost = amount * avg_price;
            let pnl = value - cost;
            Holding {
                asset: a.clone(),
                amount,
                avg_price,
                price,
                value,
                pnl,
                pnl_pct: if cost > 0.0 { pnl / cost * 100.0 } else { 0.0 },
            }
        })
        .collect();

    let total_value: f64 = holdings.iter().map(|h| h.value).sum();
    let total_cost: f64 = holdings.iter().map(|h| h.amount * h.avg_price).sum();
    let profit = total_value - total_cost;

    PortfolioSummary {
        holdings,
        total_value,
        total_cost,
        profit,
        pnl_pct: if total_cost > 0.0 { profit / total_cost * 100.0 } else { 0.0 },
    }
}
