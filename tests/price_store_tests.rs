use std::sync::{Arc, Mutex};

use cryptopulse::services::price_store::{PriceMap, PriceObserver, PriceStore, SIM_DRIFT};
use rand::{SeedableRng, rngs::StdRng};

fn prices(pairs: &[(&str, f64)]) -> PriceMap {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Vec<String>>>,
}

impl PriceObserver for Recorder {
    fn on_prices_changed(&self, _store: &PriceStore, changed: &[String]) {
        let mut changed = changed.to_vec();
        changed.sort();
        self.calls.lock().unwrap().push(changed);
    }
}

#[test]
fn merge_overwrites_given_keys_and_keeps_the_rest() {
    let store = PriceStore::new();
    store.apply_update(prices(&[("A", 1.0), ("B", 2.0)]));

    let written = store.apply_update(prices(&[("A", 5.0)]));

    assert_eq!(written, 1);
    assert_eq!(store.get("A"), Some(5.0));
    assert_eq!(store.get("B"), Some(2.0));
    assert_eq!(store.len(), 2);
}

#[test]
fn unknown_asset_has_no_price() {
    let store = PriceStore::new();
    store.apply_update(prices(&[("bitcoin", 68_000.0)]));

    assert_eq!(store.get("ethereum"), None);
    assert!(!store.snapshot().contains_key("ethereum"));
}

#[test]
fn invalid_prices_are_dropped() {
    let store = PriceStore::new();
    store.apply_update(prices(&[("A", 10.0)]));

    let written = store.apply_update(prices(&[
        ("A", f64::NAN),
        ("B", f64::INFINITY),
        ("C", -3.0),
        ("D", 0.0),
        ("E", 7.5),
    ]));

    assert_eq!(written, 1);
    assert_eq!(store.get("A"), Some(10.0));
    assert_eq!(store.get("B"), None);
    assert_eq!(store.get("C"), None);
    assert_eq!(store.get("D"), None);
    assert_eq!(store.get("E"), Some(7.5));
}

#[test]
fn zero_or_negative_price_never_replaces_a_known_one() {
    let store = PriceStore::new();
    store.apply_update(prices(&[("A", 3.0)]));

    assert_eq!(store.apply_update(prices(&[("A", 0.0), ("x", 0.0), ("y", -1.0)])), 0);

    assert_eq!(store.get("A"), Some(3.0));
    assert_eq!(store.get("x"), None);
    assert_eq!(store.get("y"), None);
}

#[test]
fn simulated_tick_stays_within_drift_bounds() {
    let store = PriceStore::new();
    let seed = prices(&[("bitcoin", 68_420.5), ("ethereum", 2_642.12), ("dogecoin", 0.124)]);
    store.apply_update(seed.clone());

    let mut rng = StdRng::seed_from_u64(7);
    let mut before = store.snapshot();
    for _ in 0..200 {
        assert_eq!(store.apply_simulated_tick(&mut rng), 3);
        let after = store.snapshot();
        for (id, old) in &before {
            let new = after[id];
            let ratio = new / old;
            assert!(
                ratio >= 1.0 - SIM_DRIFT - 1e-12 && ratio <= 1.0 + SIM_DRIFT + 1e-12,
                "{id} moved by {ratio}"
            );
        }
        before = after;
    }
}

#[test]
fn simulated_tick_on_empty_store_is_a_no_op() {
    let store = PriceStore::new();
    let recorder = Arc::new(Recorder::default());
    store.subscribe(recorder.clone());

    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(store.apply_simulated_tick(&mut rng), 0);
    assert!(store.is_empty());
    assert!(recorder.calls.lock().unwrap().is_empty());
}

#[test]
fn observers_see_changed_ids_after_merge() {
    let store = PriceStore::new();
    let recorder = Arc::new(Recorder::default());
    store.subscribe(recorder.clone());

    store.apply_update(prices(&[("A", 1.0), ("B", 2.0)]));
    store.apply_update(prices(&[("B", f64::NAN)]));
    store.apply_update(prices(&[("B", 3.0)]));

    let calls = recorder.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], vec!["A".to_string(), "B".to_string()]);
    assert_eq!(calls[1], vec!["B".to_string()]);
}

#[test]
fn observer_reads_merged_state() {
    struct Check(Mutex<Option<f64>>);
    impl PriceObserver for Check {
        fn on_prices_changed(&self, store: &PriceStore, _changed: &[String]) {
            *self.0.lock().unwrap() = store.get("A");
        }
    }

    let store = PriceStore::new();
    let check = Arc::new(Check(Mutex::new(None)));
    store.subscribe(check.clone());

    store.apply_update(prices(&[("A", 42.0)]));

    assert_eq!(*check.0.lock().unwrap(), Some(42.0));
}
