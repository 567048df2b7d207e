use cryptopulse::{
    format::{fmt_compact_usd, fmt_pct, fmt_price, fmt_usd},
    models::{SignalType, Timeframe},
    services::{
        chart_widget,
        market_data::{CoinCapResponse, CoinGeckoGlobalResponse, CoinGeckoMarket, builtin_catalog},
        portfolio_service::demo_portfolio,
        price_store::PriceMap,
        scanner_service::{ScanFilter, scan},
        signals_service,
    },
};

#[test]
fn coingecko_market_maps_to_asset() {
    let raw = r#"[
        {"id":"bitcoin","symbol":"btc","name":"Bitcoin","current_price":68420.5,
         "price_change_percentage_24h":2.45,"total_volume":35000000000,"market_cap":1350000000000},
        {"id":"ghost","symbol":"gst","name":"Ghost","current_price":null}
    ]"#;

    let markets: Vec<CoinGeckoMarket> = serde_json::from_str(raw).unwrap();
    let assets: Vec<_> = markets.into_iter().filter_map(CoinGeckoMarket::into_asset).collect();

    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].id, "bitcoin");
    assert_eq!(assets[0].symbol, "BTC");
    assert_eq!(assets[0].price, 68_420.5);
    assert_eq!(assets[0].category, "Top Assets");
}

#[test]
fn coincap_string_numbers_are_parsed() {
    let raw = r#"{"data":[
        {"id":"solana","symbol":"SOL","name":"Solana","priceUsd":"145.88",
         "changePercent24Hr":"5.67","volumeUsd24Hr":"4200000000","marketCapUsd":"68000000000"},
        {"id":"broken","symbol":"BRK","name":"Broken","priceUsd":"n/a"}
    ]}"#;

    let res: CoinCapResponse = serde_json::from_str(raw).unwrap();
    let assets: Vec<_> = res.data.into_iter().filter_map(|a| a.into_asset()).collect();

    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].price, 145.88);
    assert_eq!(assets[0].change_24h, 5.67);
    assert_eq!(assets[0].category, "Market Assets");
}

#[test]
fn coingecko_global_maps_to_stats() {
    let raw = r#"{"data":{
        "total_market_cap":{"usd":2450000000000.0,"eur":1.0},
        "total_volume":{"usd":84200000000.0},
        "market_cap_percentage":{"btc":54.2,"eth":17.1},
        "active_cryptocurrencies":12000
    }}"#;

    let stats = serde_json::from_str::<CoinGeckoGlobalResponse>(raw).unwrap().into_stats();

    assert_eq!(stats.total_market_cap, 2.45e12);
    assert_eq!(stats.btc_dominance, 54.2);
    assert_eq!(stats.active_cryptos, 12_000);
}

#[test]
fn formats_prices() {
    assert_eq!(fmt_price(68_420.5), "68,420.50");
    assert_eq!(fmt_price(0.124), "0.124000");
    assert_eq!(fmt_usd(100.0), "$100.00");
    assert_eq!(fmt_usd(1_234_567.891), "$1,234,567.89");
    assert_eq!(fmt_compact_usd(1.35e12), "$1.35T");
    assert_eq!(fmt_compact_usd(84.2e9), "$84.20B");
    assert_eq!(fmt_pct(2.449), "+2.45%");
    assert_eq!(fmt_pct(-1.12), "-1.12%");
}

#[test]
fn signal_score_bands() {
    assert_eq!(SignalType::from_score(88), SignalType::StrongBuy);
    assert_eq!(SignalType::from_score(65), SignalType::Buy);
    assert_eq!(SignalType::from_score(50), SignalType::Neutral);
    assert_eq!(SignalType::from_score(30), SignalType::Sell);
    assert_eq!(SignalType::from_score(10), SignalType::StrongSell);
}

#[test]
fn unknown_asset_gets_neutral_signal() {
    let cardano = builtin_catalog().into_iter().find(|a| a.id == "cardano").unwrap();
    let s = signals_service::signal_for(&cardano);

    assert_eq!(s.kind, SignalType::Neutral);
    assert_eq!(s.score, 50);
    assert!((s.stop_loss - cardano.price * 0.95).abs() < 1e-12);
    assert_eq!(s.targets.len(), 2);
}

#[test]
fn signals_are_listed_only_for_tracked_assets() {
    let catalog = builtin_catalog();
    assert_eq!(signals_service::list_signals(&catalog).len(), 3);

    let only_btc: Vec<_> = catalog.into_iter().filter(|a| a.id == "bitcoin").collect();
    let listed = signals_service::list_signals(&only_btc);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].1.kind, SignalType::StrongBuy);
}

#[test]
fn composite_score_stays_in_range() {
    for asset in builtin_catalog() {
        let ind = signals_service::indicators_for(&asset, asset.price);
        let b = signals_service::breakdown_for(&asset, asset.price, &ind);
        assert!(signals_service::composite_score(&b) <= 100);
        assert!(ind.rsi >= 5.0 && ind.rsi <= 95.0);
    }
}

#[test]
fn scanner_filters_and_search() {
    let catalog = builtin_catalog();
    let prices = PriceMap::new();

    let breakouts: Vec<_> = scan(&catalog, &prices, ScanFilter::Breakouts, "")
        .into_iter()
        .map(|r| r.asset.id)
        .collect();
    assert_eq!(breakouts, vec!["solana", "dogecoin"]);

    let search = scan(&catalog, &prices, ScanFilter::All, "eth");
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].asset.symbol, "ETH");

    assert!(scan(&catalog, &prices, ScanFilter::All, "zzz").is_empty());
    assert_eq!("Oversold".parse::<ScanFilter>(), Ok(ScanFilter::Oversold));
}

#[test]
fn scanner_prefers_live_price() {
    let catalog = builtin_catalog();
    let prices = PriceMap::from([("bitcoin".to_string(), 70_000.0)]);

    let rows = scan(&catalog, &prices, ScanFilter::All, "btc");
    assert_eq!(rows[0].price, 70_000.0);
}

#[test]
fn demo_portfolio_values_first_five_assets() {
    let catalog = builtin_catalog();
    let summary = demo_portfolio(&catalog, &PriceMap::new());

    assert_eq!(summary.holdings.len(), 5);
    assert_eq!(summary.holdings[0].amount, 0.25);
    assert_eq!(summary.holdings[1].amount, 5.0);
    // bought at 92% of listing, valued at listing => +8.7%
    assert!((summary.pnl_pct - (1.0 / 0.92 - 1.0) * 100.0).abs() < 1e-9);
}

#[test]
fn chart_widget_uses_binance_usdt_pair() {
    let cfg = chart_widget::widget_config("sol", Timeframe::H4);

    assert_eq!(cfg["symbol"], "BINANCE:SOLUSDT");
    assert_eq!(cfg["interval"], "240");
    assert_eq!("1d".parse::<Timeframe>(), Ok(Timeframe::D1));
}
