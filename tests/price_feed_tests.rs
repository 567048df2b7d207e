use std::{sync::Arc, time::Duration};

use cryptopulse::services::{
    market_data::builtin_catalog,
    price_feed::{self, FeedConfig, FeedEvent, PriceSource, SymbolIndex, Tick, base_symbol, parse_ticker_batch},
    price_store::PriceStore,
};
use futures_util::{SinkExt, StreamExt};
use rand::{SeedableRng, rngs::StdRng};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};

fn seeded_store() -> (Arc<PriceStore>, SymbolIndex) {
    let assets = builtin_catalog();
    let store = Arc::new(PriceStore::new());
    store.seed_from_listing(&assets);
    (store, SymbolIndex::from_assets(&assets))
}

fn sim_config(tick_ms: u64) -> FeedConfig {
    FeedConfig {
        source: PriceSource::Simulated,
        sim_tick: Duration::from_millis(tick_ms),
        ws_url: String::new(),
        max_backoff: Duration::from_secs(1),
    }
}

#[test]
fn base_symbol_accepts_only_usdt_pairs() {
    assert_eq!(base_symbol("BTCUSDT").as_deref(), Some("BTC"));
    assert_eq!(base_symbol("dogeusdt").as_deref(), Some("DOGE"));
    assert_eq!(base_symbol("ETHBTC"), None);
    assert_eq!(base_symbol("USDT"), None);
}

#[test]
fn parses_mini_ticker_array() {
    let frame = r#"[
        {"e":"24hrMiniTicker","E":1,"s":"BTCUSDT","c":"68500.10","o":"1","h":"1","l":"1","v":"1","q":"1"},
        {"e":"24hrMiniTicker","E":1,"s":"ETHBTC","c":"0.05"},
        {"e":"24hrMiniTicker","E":1,"s":"SOLUSDT","c":"not-a-number"},
        {"e":"24hrMiniTicker","E":1,"s":"ADAUSDT","c":"0.3541"}
    ]"#;

    let ticks = parse_ticker_batch(frame);

    assert_eq!(
        ticks,
        vec![
            Tick { symbol: "BTC".into(), price: 68_500.10 },
            Tick { symbol: "ADA".into(), price: 0.3541 },
        ]
    );
}

#[test]
fn parses_single_ticker_and_stream_envelope() {
    let single = r#"{"s":"XRPUSDT","c":"0.55"}"#;
    let wrapped = r#"{"stream":"!miniTicker@arr","data":[{"s":"DOTUSDT","c":"4.2"}]}"#;

    assert_eq!(parse_ticker_batch(single), vec![Tick { symbol: "XRP".into(), price: 0.55 }]);
    assert_eq!(parse_ticker_batch(wrapped), vec![Tick { symbol: "DOT".into(), price: 4.2 }]);
}

#[test]
fn malformed_frame_yields_nothing() {
    assert!(parse_ticker_batch("{not json").is_empty());
    assert!(parse_ticker_batch(r#"{"result":null,"id":1}"#).is_empty());
    assert!(parse_ticker_batch("42").is_empty());
}

#[test]
fn ticks_for_untracked_symbols_are_dropped() {
    let (store, index) = seeded_store();
    let mut rng = StdRng::seed_from_u64(3);

    let written = price_feed::apply_event(
        &store,
        &index,
        FeedEvent::Ticks(vec![
            Tick { symbol: "BTC".into(), price: 70_000.0 },
            Tick { symbol: "PEPE".into(), price: 0.00001 },
        ]),
        &mut rng,
    );

    assert_eq!(written, 1);
    assert_eq!(store.get("bitcoin"), Some(70_000.0));
    assert_eq!(store.get("pepe"), None);
    assert_eq!(store.len(), builtin_catalog().len());
}

#[test]
fn symbol_index_resolves_case_insensitively() {
    let (_, index) = seeded_store();

    assert_eq!(index.resolve("btc"), Some("bitcoin"));
    assert_eq!(index.resolve("DOGE"), Some("dogecoin"));
    assert_eq!(index.resolve("PEPE"), None);
    assert_eq!(index.len(), 8);
}

#[test]
fn price_source_parses_aliases() {
    assert_eq!("live".parse::<PriceSource>(), Ok(PriceSource::Live));
    assert_eq!("Binance".parse::<PriceSource>(), Ok(PriceSource::Live));
    assert_eq!("sim".parse::<PriceSource>(), Ok(PriceSource::Simulated));
    assert!("both".parse::<PriceSource>().is_err());
}

#[tokio::test(start_paused = true)]
async fn simulated_feed_drifts_prices() {
    let (store, index) = seeded_store();
    let before = store.snapshot();

    let feed = price_feed::start(sim_config(1_000), store.clone(), index);
    assert_eq!(feed.source(), PriceSource::Simulated);

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let after = store.snapshot();

    assert_eq!(after.len(), before.len());
    assert!(before.iter().any(|(id, p)| after[id] != *p));

    feed.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stopped_feed_no_longer_mutates_store() {
    let (store, index) = seeded_store();

    let feed = price_feed::start(sim_config(500), store.clone(), index);
    tokio::time::sleep(Duration::from_millis(1_200)).await;
    feed.stop().await;

    let frozen = store.snapshot();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(store.snapshot(), frozen);
}

#[tokio::test(start_paused = true)]
async fn nothing_moves_before_the_first_period() {
    let (store, index) = seeded_store();
    let before = store.snapshot();

    let feed = price_feed::start(sim_config(3_000), store.clone(), index);
    tokio::time::sleep(Duration::from_millis(2_000)).await;

    assert_eq!(store.snapshot(), before);
    feed.stop().await;
}

async fn wait_for_price(store: &PriceStore, id: &str, price: f64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.get(id) != Some(price) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{id} never reached {price}"));
}

#[tokio::test]
async fn live_feed_reconnects_after_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (resume_tx, resume_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        // first session: one batch, then hang up
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        ws.send(Message::Text(r#"[{"s":"BTCUSDT","c":"70000"}]"#.to_string()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}

        // second session: hold the batch until the test has checked staleness
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        resume_rx.await.unwrap();
        ws.send(Message::Text(r#"[{"s":"BTCUSDT","c":"71000"}]"#.to_string()))
            .await
            .unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    let (store, index) = seeded_store();
    let feed = price_feed::start(
        FeedConfig {
            source: PriceSource::Live,
            sim_tick: Duration::from_secs(3),
            ws_url: format!("ws://{addr}"),
            max_backoff: Duration::from_secs(1),
        },
        store.clone(),
        index,
    );
    assert_eq!(feed.source(), PriceSource::Live);

    wait_for_price(&store, "bitcoin", 70_000.0).await;

    // disconnected, then reconnected but silent: last price stays
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(store.get("bitcoin"), Some(70_000.0));
    assert_eq!(store.get("ethereum"), Some(2_642.12));

    resume_tx.send(()).unwrap();
    wait_for_price(&store, "bitcoin", 71_000.0).await;

    tokio::time::timeout(Duration::from_secs(5), feed.stop())
        .await
        .expect("feed did not stop");
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not finish")
        .unwrap();
}

#[tokio::test]
async fn stopping_live_feed_ends_reconnect_loop() {
    // nothing listens on this port once the listener is dropped
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let (store, index) = seeded_store();
    let before = store.snapshot();
    let feed = price_feed::start(
        FeedConfig {
            source: PriceSource::Live,
            sim_tick: Duration::from_secs(3),
            ws_url: format!("ws://{addr}"),
            max_backoff: Duration::from_millis(200),
        },
        store.clone(),
        index,
    );

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!feed.is_finished());
    assert_eq!(store.snapshot(), before);

    tokio::time::timeout(Duration::from_secs(5), feed.stop())
        .await
        .expect("feed did not stop");
}
