//! All locations of one run, and concurrent batch routing across them.

use std::collections::BTreeMap;
use std::thread;

use finv_error::{InferError, Result};
use finv_types::ValueTuple;
use tracing::{debug, warn};

use crate::location::{Location, SampleOutcome};

/// Locations by name. Locations share nothing mutable, so each one can be
/// driven by its own worker.
#[derive(Debug, Default)]
pub struct LocationMap {
    locations: BTreeMap<String, Location>,
}

impl LocationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Location> {
        self.locations.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Location> {
        self.locations.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.locations.keys().map(String::as_str)
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> + '_ {
        self.locations.values()
    }

    /// Add a location under its own name; same rules as [`LocationMap::union`].
    pub fn insert(&mut self, location: Location) -> Result<()> {
        if let Some(have) = self.locations.get(location.name()) {
            if have.samples() > 0 && location.samples() > 0 {
                return Err(InferError::DuplicateLocation(location.name().to_owned()));
            }
            if location.samples() == 0 {
                return Ok(());
            }
        }
        self.locations.insert(location.name().to_owned(), location);
        Ok(())
    }

    /// Merge `other` into `self`. A name present on both sides keeps
    /// whichever side has seen samples; both non-empty is an error and
    /// leaves `self` untouched.
    pub fn union(&mut self, other: Self) -> Result<()> {
        if let Some(clash) = other.locations.values().find(|loc| {
            loc.samples() > 0
                && self
                    .locations
                    .get(loc.name())
                    .is_some_and(|have| have.samples() > 0)
        }) {
            return Err(InferError::DuplicateLocation(clash.name().to_owned()));
        }
        for (_, location) in other.locations {
            self.insert(location)?;
        }
        Ok(())
    }

    /// Route each location's batch on its own scoped thread.
    ///
    /// Results are per location: a fatal error poisons only the location it
    /// happened in. Batches for unknown names yield `UnknownLocation`.
    pub fn route_batches(
        &mut self,
        batches: BTreeMap<String, Vec<ValueTuple>>,
    ) -> BTreeMap<String, Result<SampleOutcome>> {
        let mut results = BTreeMap::new();
        let mut work: Vec<(&mut Location, Vec<ValueTuple>)> = Vec::new();
        let mut pending = batches;
        for (name, location) in &mut self.locations {
            if let Some(batch) = pending.remove(name) {
                work.push((location, batch));
            }
        }
        for name in pending.into_keys() {
            results.insert(name.clone(), Err(InferError::UnknownLocation(name)));
        }

        thread::scope(|scope| {
            let handles: Vec<_> = work
                .into_iter()
                .map(|(location, batch)| {
                    let name = location.name().to_owned();
                    (name, scope.spawn(move || route_batch(location, &batch)))
                })
                .collect();
            for (name, handle) in handles {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(InferError::internal(format!("worker for {name} panicked"))));
                if let Err(err) = &result {
                    warn!(location = %name, error = %err, "batch failed");
                }
                results.insert(name, result);
            }
        });
        results
    }
}

fn route_batch(location: &mut Location, batch: &[ValueTuple]) -> Result<SampleOutcome> {
    let mut total = SampleOutcome::default();
    for sample in batch {
        total += location.route_sample(sample)?;
    }
    debug!(
        location = %location.name(),
        samples = batch.len(),
        falsified = total.falsified,
        splits = total.splits,
        "batch routed"
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use finv_types::{InferenceConfig, RepType, Value, VarInfo};

    use super::*;

    fn location(name: &str) -> Location {
        Location::new(
            name,
            vec![VarInfo::new(0, "x", RepType::Int)],
            Arc::new(InferenceConfig::default()),
        )
        .unwrap()
    }

    fn fed(name: &str) -> Location {
        let mut loc = location(name);
        loc.route_sample(&ValueTuple::from_values([Value::Int(1)]))
            .unwrap();
        loc
    }

    #[test]
    fn test_union_keeps_the_non_empty_side() {
        let mut a = LocationMap::new();
        a.insert(location("P")).unwrap();
        let mut b = LocationMap::new();
        b.insert(fed("P")).unwrap();
        b.insert(location("Q")).unwrap();
        a.union(b).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("P").unwrap().samples(), 1);
    }

    #[test]
    fn test_union_rejects_two_non_empty() {
        let mut a = LocationMap::new();
        a.insert(fed("P")).unwrap();
        a.insert(location("Q")).unwrap();
        let mut b = LocationMap::new();
        b.insert(fed("Q")).unwrap();
        b.insert(fed("P")).unwrap();
        assert_eq!(a.union(b), Err(InferError::DuplicateLocation("P".to_owned())));
        assert_eq!(a.get("Q").unwrap().samples(), 0, "failed union changes nothing");
    }

    #[test]
    fn test_unknown_batch_is_reported() {
        let mut map = LocationMap::new();
        map.insert(location("P")).unwrap();
        let mut batches = BTreeMap::new();
        batches.insert("Nope".to_owned(), vec![ValueTuple::from_values([Value::Int(1)])]);
        let results = map.route_batches(batches);
        assert_eq!(
            results.get("Nope"),
            Some(&Err(InferError::UnknownLocation("Nope".to_owned())))
        );
        assert!(!results.contains_key("P"));
    }
}
