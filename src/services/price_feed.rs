use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time,
};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TMessage};

use crate::{
    config::Settings,
    error::AppError,
    models::Asset,
    services::price_store::{PriceMap, PriceStore},
};

const QUOTE_SUFFIX: &str = "USDT";
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const CHANNEL_CAPACITY: usize = 256;

/// Where prices come from for the whole session. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Simulated,
    Live,
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulated" | "sim" | "mock" => Ok(PriceSource::Simulated),
            "live" | "binance" => Ok(PriceSource::Live),
            other => Err(format!("unknown price source: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug)]
pub enum FeedEvent {
    SimulatedTick,
    Ticks(Vec<Tick>),
}

/// Symbol -> asset id lookup for the assets being tracked.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    by_symbol: HashMap<String, String>,
}

impl SymbolIndex {
    pub fn from_assets(assets: &[Asset]) -> Self {
        let mut by_symbol = HashMap::new();
        for a in assets {
            // listings are ordered by market cap; keep the bigger asset on clashes
            by_symbol
                .entry(a.symbol.to_uppercase())
                .or_insert_with(|| a.id.clone());
        }
        Self { by_symbol }
    }

    pub fn resolve(&self, symbol: &str) -> Option<&str> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .map(String::as_str)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.by_symbol.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

/// Running feed. `stop` shuts it down and waits for its tasks; dropping the
/// handle aborts them.
pub struct FeedHandle {
    source: PriceSource,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn source(&self) -> PriceSource {
        self.source
    }

    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        for task in std::mem::take(&mut self.tasks) {
            let _ = task.await;
        }
        tracing::info!("price feed ({:?}) stopped", self.source);
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub source: PriceSource,
    pub sim_tick: Duration,
    pub ws_url: String,
    pub max_backoff: Duration,
}

impl From<&Settings> for FeedConfig {
    fn from(s: &Settings) -> Self {
        Self {
            source: s.price_source,
            sim_tick: s.sim_tick,
            ws_url: s.binance_ws_url.clone(),
            max_backoff: s.feed_max_backoff,
        }
    }
}

/// Spawn one producer (timer or socket) and one consumer that drains the
/// producer's channel into `store`.
pub fn start(config: FeedConfig, store: Arc<PriceStore>, index: SymbolIndex) -> FeedHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (tx, rx) = mpsc::channel::<FeedEvent>(CHANNEL_CAPACITY);

    tracing::info!(
        "starting price feed: source={:?} tracked={}",
        config.source,
        index.len()
    );

    let producer = match config.source {
        PriceSource::Simulated => {
            tokio::spawn(run_simulated(config.sim_tick, tx, shutdown_rx.clone()))
        }
        PriceSource::Live => tokio::spawn(run_live(
            config.ws_url,
            config.max_backoff,
            tx,
            shutdown_rx.clone(),
        )),
    };
    let consumer = tokio::spawn(run_consumer(rx, store, index, shutdown_rx));

    FeedHandle {
        source: config.source,
        shutdown_tx,
        tasks: vec![producer, consumer],
    }
}

/// Apply one feed event to the store. Ticks for symbols outside `index`
/// are dropped. Returns the number of prices written.
pub fn apply_event(store: &PriceStore, index: &SymbolIndex, event: FeedEvent, rng: &mut StdRng) -> usize {
    match event {
        FeedEvent::SimulatedTick => store.apply_simulated_tick(rng),
        FeedEvent::Ticks(ticks) => {
            let partial: PriceMap = ticks
                .into_iter()
                .filter_map(|t| index.resolve(&t.symbol).map(|id| (id.to_string(), t.price)))
                .collect();
            if partial.is_empty() {
                return 0;
            }
            store.apply_update(partial)
        }
    }
}

async fn run_consumer(
    mut rx: mpsc::Receiver<FeedEvent>,
    store: Arc<PriceStore>,
    index: SymbolIndex,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut rng = StdRng::from_entropy();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => break,

            evt = rx.recv() => match evt {
                Some(evt) => {
                    apply_event(&store, &index, evt, &mut rng);
                }
                None => break,
            }
        }
    }
}

async fn run_simulated(
    period: Duration,
    tx: mpsc::Sender<FeedEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval(period.max(Duration::from_millis(1)));
    // first tick completes immediately; drift starts one period after startup
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                if tx.send(FeedEvent::SimulatedTick).await.is_err() {
                    break;
                }
            }
        }
    }
}

enum StreamEnd {
    Shutdown,
    Closed,
}

async fn run_live(
    url: String,
    max_backoff: Duration,
    tx: mpsc::Sender<FeedEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match stream_once(&url, &tx, &mut shutdown).await {
            Ok(StreamEnd::Shutdown) => return,
            Ok(StreamEnd::Closed) => {
                tracing::warn!("ticker stream closed, reconnecting");
                backoff = INITIAL_BACKOFF;
            }
            Err(err) => {
                tracing::error!("ticker stream connect failed: {}", err);
            }
        }

        tokio::select! {
            _ = shutdown.changed() => return,
            _ = time::sleep(backoff) => {}
        }
        backoff = (backoff * 2).min(max_backoff);
    }
}

async fn stream_once(
    url: &str,
    tx: &mpsc::Sender<FeedEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<StreamEnd, AppError> {
    tracing::info!("Connecting to ticker WS: {}", url);
    let (ws, _) = tokio::select! {
        _ = shutdown.changed() => return Ok(StreamEnd::Shutdown),
        res = connect_async(url) => res?,
    };
    tracing::info!("ticker WS connected OK");

    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = write.send(TMessage::Close(None)).await;
                return Ok(StreamEnd::Shutdown);
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(TMessage::Text(txt))) => {
                        let ticks = parse_ticker_batch(&txt);
                        if !ticks.is_empty() && tx.send(FeedEvent::Ticks(ticks)).await.is_err() {
                            return Ok(StreamEnd::Shutdown);
                        }
                    }
                    Some(Ok(TMessage::Ping(payload))) => {
                        let _ = write.send(TMessage::Pong(payload)).await;
                    }
                    Some(Ok(TMessage::Close(_))) | None => return Ok(StreamEnd::Closed),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::warn!("ticker WS read error: {}", err);
                        return Ok(StreamEnd::Closed);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct MiniTicker {
    // pair, e.g. BTCUSDT
    s: String,
    // last price
    c: String,
}

/// `BTCUSDT` -> `BTC`. Pairs quoted in anything but USDT are rejected so a
/// BTC-denominated price is never mistaken for a dollar price.
pub fn base_symbol(pair: &str) -> Option<String> {
    let upper = pair.trim().to_uppercase();
    let base = upper.strip_suffix(QUOTE_SUFFIX)?;
    if base.is_empty() {
        return None;
    }
    Some(base.to_string())
}

/// Parse one ticker frame: an array of mini tickers, a single ticker, or a
/// combined-stream envelope `{ "stream": .., "data": .. }`. Malformed
/// entries are skipped.
pub fn parse_ticker_batch(txt: &str) -> Vec<Tick> {
    let value: serde_json::Value = match serde_json::from_str(txt) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!("Failed to parse ticker frame: {}", err);
            return Vec::new();
        }
    };

    let mut ticks = Vec::new();
    collect_ticks(value, &mut ticks);
    ticks
}

fn collect_ticks(value: serde_json::Value, out: &mut Vec<Tick>) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                collect_ticks(item, out);
            }
        }
        serde_json::Value::Object(mut obj) => {
            if let Some(data) = obj.remove("data") {
                collect_ticks(data, out);
                return;
            }

            let Ok(t) = serde_json::from_value::<MiniTicker>(serde_json::Value::Object(obj)) else {
                return;
            };
            let Some(symbol) = base_symbol(&t.s) else {
                return;
            };
            match t.c.parse::<f64>() {
                Ok(price) if price.is_finite() && price > 0.0 => out.push(Tick { symbol, price }),
                _ => {}
            }
        }
        _ => {}
    }
}
