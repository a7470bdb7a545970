//! Kinds over a single sequence variable that look inside the sequence.

use std::cmp::Ordering;

use finv_types::Value;

use crate::UpdateOutcome;
use crate::relation::{OrderFlags, Relation};
use crate::tracker::ValueTracker;

/// Order between consecutive elements: `a[i] R a[i+1]` for every `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EltwiseComparison {
    flags: OrderFlags,
    tracker: ValueTracker,
}

impl EltwiseComparison {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, seq: &Value) -> UpdateOutcome {
        let items: Vec<Value> = seq.elements().collect();
        if items.len() < 2 {
            return UpdateOutcome::Continue;
        }
        self.tracker.add(&[seq]);
        for pair in items.windows(2) {
            let ord = pair[0].compare(&pair[1]).unwrap_or(Ordering::Equal);
            if self.flags.observe(ord) == UpdateOutcome::Falsified {
                return UpdateOutcome::Falsified;
            }
        }
        UpdateOutcome::Continue
    }

    #[must_use]
    pub const fn relation(&self) -> Option<Relation> {
        self.flags.relation()
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.relation().is_none() {
            return 0.0;
        }
        self.tracker.coin_flip_confidence()
    }
}

/// No element occurs twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoDuplicates {
    tracker: ValueTracker,
}

impl NoDuplicates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, seq: &Value) -> UpdateOutcome {
        let mut items: Vec<Value> = seq.elements().collect();
        if items.len() < 2 {
            return UpdateOutcome::Continue;
        }
        self.tracker.add(&[seq]);
        items.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
        if items.windows(2).any(|pair| pair[0] == pair[1]) {
            UpdateOutcome::Falsified
        } else {
            UpdateOutcome::Continue
        }
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.tracker.coin_flip_confidence()
    }
}
