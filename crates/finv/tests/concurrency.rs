//! Locations are independent: routing them in parallel gives the same
//! result as routing them one after another.

use std::collections::BTreeMap;
use std::sync::Arc;

use finv::{
    InferError, InferenceConfig, Location, LocationMap, RepType, Value, ValueTuple, VarInfo,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn location(name: &str) -> Location {
    let vars = vec![
        VarInfo::new(0, "x", RepType::Int),
        VarInfo::new(1, "y", RepType::Int),
    ];
    Location::new(name, vars, Arc::new(InferenceConfig::default())).unwrap()
}

fn batch(seed: i64) -> Vec<ValueTuple> {
    (0..50)
        .map(|i| {
            let y = seed * i % 7 + 100;
            ValueTuple::from_values([Value::Int(seed + i), Value::Int(y)])
        })
        .collect()
}

const NAMES: [&str; 4] = ["A.f:::ENTER", "A.f:::EXIT", "B.g:::ENTER", "B.g:::EXIT"];

#[test]
fn parallel_routing_matches_sequential_routing() {
    init_tracing();
    let mut map = LocationMap::new();
    for name in NAMES {
        map.insert(location(name)).unwrap();
    }
    let batches: BTreeMap<String, Vec<ValueTuple>> = NAMES
        .iter()
        .zip(1..)
        .map(|(name, seed)| ((*name).to_owned(), batch(seed)))
        .collect();

    let results = map.route_batches(batches.clone());
    assert_eq!(results.len(), NAMES.len());

    for (name, samples) in &batches {
        let mut alone = location(name);
        for sample in samples {
            alone.route_sample(sample).unwrap();
        }
        let parallel = map.get(name).unwrap();
        assert_eq!(parallel.samples(), alone.samples());
        assert_eq!(
            parallel.filter().reportable_formulas(),
            alone.filter().reportable_formulas(),
            "{name}"
        );
        assert!(results[name].is_ok());
    }
}

#[test]
fn a_malformed_batch_poisons_only_its_location() {
    init_tracing();
    let mut map = LocationMap::new();
    map.insert(location("Good")).unwrap();
    map.insert(location("Bad")).unwrap();

    let mut batches = BTreeMap::new();
    batches.insert("Good".to_owned(), batch(3));
    batches.insert("Bad".to_owned(), vec![ValueTuple::from_values([Value::Int(1)])]);
    batches.insert("Missing".to_owned(), batch(1));

    let results = map.route_batches(batches);
    assert!(results["Good"].is_ok());
    assert!(matches!(results["Bad"], Err(InferError::SampleShape { .. })));
    assert!(matches!(results["Missing"], Err(InferError::UnknownLocation(_))));

    assert!(map.get("Bad").unwrap().is_poisoned());
    assert!(!map.get("Good").unwrap().is_poisoned());
    let again = map
        .get_mut("Bad")
        .unwrap()
        .route_sample(&ValueTuple::from_values([Value::Int(1), Value::Int(2)]));
    assert!(matches!(again, Err(InferError::LocationPoisoned(_))));
}
