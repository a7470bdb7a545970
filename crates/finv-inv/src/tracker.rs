//! Bounded distinct-value tracking for confidence models.

use finv_types::Value;
use smallvec::SmallVec;

/// Number of distinct observations a tracker remembers.
pub const TRACKER_CAPACITY: usize = 8;

/// Digests of one tuple, by position.
type Entry = SmallVec<[u64; 3]>;

/// Counts distinct value tuples, saturating at [`TRACKER_CAPACITY`].
///
/// Each position is reduced to a 64-bit xxh3 digest; a digest collision
/// merely undercounts, which only lowers confidence. Positions are kept
/// apart so the tracker can follow its slice when the operands are
/// reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueTracker {
    seen: SmallVec<[Entry; TRACKER_CAPACITY]>,
}

impl ValueTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, values: &[&Value]) {
        if self.seen.len() >= TRACKER_CAPACITY {
            return;
        }
        let entry: Entry = values.iter().map(|v| v.digest()).collect();
        if !self.seen.contains(&entry) {
            self.seen.push(entry);
        }
    }

    /// Reorder every remembered tuple: new position `i` takes old position
    /// `order[i]`.
    pub fn permute(&mut self, order: &[usize]) {
        for entry in &mut self.seen {
            if entry.len() != order.len() {
                continue;
            }
            let moved: Entry = order.iter().filter_map(|&i| entry.get(i).copied()).collect();
            *entry = moved;
        }
    }

    /// Distinct tuples seen, at most [`TRACKER_CAPACITY`].
    #[must_use]
    pub fn count(&self) -> usize {
        self.seen.len()
    }

    /// `1 - 0.5^count`: the chance a relation this regular did not arise
    /// from coin flips over the distinct observations.
    #[must_use]
    pub fn coin_flip_confidence(&self) -> f64 {
        1.0 - 0.5_f64.powi(self.count() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_distinct_tuples_and_saturates() {
        let mut t = ValueTracker::new();
        let (one, two) = (Value::Int(1), Value::Int(2));
        t.add(&[&one, &two]);
        t.add(&[&one, &two]);
        t.add(&[&two, &one]);
        assert_eq!(t.count(), 2, "order matters, repeats do not");
        for i in 0..20 {
            t.add(&[&Value::Int(i)]);
        }
        assert_eq!(t.count(), TRACKER_CAPACITY);
        assert!(t.coin_flip_confidence() > 0.99);
    }

    #[test]
    fn test_permute_follows_reordered_operands() {
        let (one, two, three) = (Value::Int(1), Value::Int(2), Value::Int(3));
        let mut t = ValueTracker::new();
        t.add(&[&one, &two]);
        t.add(&[&two, &three]);
        t.permute(&[1, 0]);
        t.add(&[&two, &one]);
        t.add(&[&three, &two]);
        assert_eq!(t.count(), 2);
        t.add(&[&one, &two]);
        assert_eq!(t.count(), 3);
    }
}
