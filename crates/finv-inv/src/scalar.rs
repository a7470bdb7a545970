//! Single-variable kinds: non-zero, bounds, small value sets, modulus.
//!
//! The element-wise sequence kinds reuse [`NonZero`], [`Bound`] and [`OneOf`]
//! by feeding them each element in turn.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use finv_types::Value;

use crate::UpdateOutcome;

/// Numeric distance `max - min`, `None` for non-numeric values.
fn span(min: &Value, max: &Value) -> Option<f64> {
    match (min, max) {
        (Value::Int(lo), Value::Int(hi)) => Some((i128::from(*hi) - i128::from(*lo)) as f64),
        (Value::Float(lo), Value::Float(hi)) => Some(hi - lo),
        _ => None,
    }
}

fn sign(value: &Value) -> Option<Ordering> {
    match value {
        Value::Int(v) => Some(v.cmp(&0)),
        Value::Float(v) => v.partial_cmp(&0.0),
        _ => None,
    }
}

/// `1 - (1 - 1/range)^n`.
fn uniform_confidence(range: f64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let miss = 1.0 - 1.0 / range.max(1.0);
    1.0 - miss.powf(n as f64)
}

fn widen(min: &mut Option<Value>, max: &mut Option<Value>, value: &Value) {
    if min
        .as_ref()
        .is_none_or(|m| value.compare(m) == Some(Ordering::Less))
    {
        *min = Some(value.clone());
    }
    if max
        .as_ref()
        .is_none_or(|m| value.compare(m) == Some(Ordering::Greater))
    {
        *max = Some(value.clone());
    }
}

// ---------------------------------------------------------------------------
// NonZero
// ---------------------------------------------------------------------------

/// `x != 0`, or `x != null` for hashcodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonZero {
    min: Option<Value>,
    max: Option<Value>,
    observations: u64,
    pointer: bool,
    range_max: u64,
    range_divisor: u64,
}

impl NonZero {
    /// Effective range for hashcodes, whose numeric spread is meaningless.
    pub const POINTER_RANGE: f64 = 3.0;

    #[must_use]
    pub const fn new(pointer: bool, range_max: u64) -> Self {
        Self {
            min: None,
            max: None,
            observations: 0,
            pointer,
            range_max,
            range_divisor: 1,
        }
    }

    pub fn update(&mut self, value: &Value) -> UpdateOutcome {
        if value.is_zero() {
            return UpdateOutcome::Falsified;
        }
        self.observations += 1;
        widen(&mut self.min, &mut self.max, value);
        UpdateOutcome::Continue
    }

    /// A co-located `x == r (mod m)` shrinks the effective range by `m`.
    pub fn set_range_divisor(&mut self, modulus: Option<u64>) {
        self.range_divisor = modulus.filter(|m| *m > 1).unwrap_or(1);
    }

    #[must_use]
    pub const fn is_pointer(&self) -> bool {
        self.pointer
    }

    #[must_use]
    pub const fn observations(&self) -> u64 {
        self.observations
    }

    /// The range the confidence model assumes values are drawn from.
    #[must_use]
    pub fn effective_range(&self) -> f64 {
        if self.pointer {
            return Self::POINTER_RANGE;
        }
        let spread = match (&self.min, &self.max) {
            (Some(lo), Some(hi)) => span(lo, hi).unwrap_or(0.0),
            _ => 0.0,
        };
        let range = ((spread + 1.0) / self.range_divisor as f64).floor().max(1.0);
        range.min(self.range_max as f64)
    }

    /// Every value so far is positive, or every value is negative.
    #[must_use]
    pub fn one_signed(&self) -> bool {
        let min = self.min.as_ref().and_then(sign);
        let max = self.max.as_ref().and_then(sign);
        min == Some(Ordering::Greater) || max == Some(Ordering::Less)
    }

    /// Zero while every number seen has the same sign.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if !self.pointer && self.one_signed() {
            return 0.0;
        }
        uniform_confidence(self.effective_range(), self.observations)
    }

    #[must_use]
    pub const fn zero_text(&self) -> &'static str {
        if self.pointer { "null" } else { "0" }
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Running minimum and maximum; reported as a lower or an upper bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    min: Option<Value>,
    max: Option<Value>,
    observations: u64,
    range_max: u64,
}

impl Bound {
    #[must_use]
    pub const fn new(range_max: u64) -> Self {
        Self {
            min: None,
            max: None,
            observations: 0,
            range_max,
        }
    }

    pub fn update(&mut self, value: &Value) -> UpdateOutcome {
        self.observations += 1;
        widen(&mut self.min, &mut self.max, value);
        UpdateOutcome::Continue
    }

    #[must_use]
    pub const fn min(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    #[must_use]
    pub const fn max(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    /// Probability that no observation landed in the bucket just beyond the
    /// extremum, with the observed spread split into at most `range_max`
    /// buckets.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        let spread = match (&self.min, &self.max) {
            (Some(lo), Some(hi)) => span(lo, hi).unwrap_or(0.0),
            _ => return 0.0,
        };
        let buckets = (spread.floor() + 1.0).min(self.range_max as f64);
        uniform_confidence(buckets + 1.0, self.observations)
    }
}

// ---------------------------------------------------------------------------
// OneOf
// ---------------------------------------------------------------------------

/// The variable takes one of a few values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOf {
    values: Vec<Value>,
    capacity: usize,
}

impl OneOf {
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            values: Vec::new(),
            capacity,
        }
    }

    pub fn update(&mut self, value: &Value) -> UpdateOutcome {
        let pos = self
            .values
            .binary_search_by(|probe| probe.compare(value).unwrap_or(Ordering::Less));
        if let Err(pos) = pos {
            if self.values.len() >= self.capacity {
                return UpdateOutcome::Falsified;
            }
            self.values.insert(pos, value.clone());
        }
        UpdateOutcome::Continue
    }

    /// Observed values in ascending order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.values.iter().any(|v| v == value)
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.values.is_empty() { 0.0 } else { 1.0 }
    }
}

// ---------------------------------------------------------------------------
// Modulus / NonModulus
// ---------------------------------------------------------------------------

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn rem_euclid(value: i64, modulus: u64) -> i64 {
    (i128::from(value).rem_euclid(i128::from(modulus))) as i64
}

/// `x == r (mod m)` for the largest `m > 1` that fits every value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modulus {
    first: Option<i64>,
    modulus: u64,
    count: u64,
}

impl Default for Modulus {
    fn default() -> Self {
        Self::new()
    }
}

impl Modulus {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            first: None,
            modulus: 0,
            count: 0,
        }
    }

    pub fn update(&mut self, value: i64) -> UpdateOutcome {
        let Some(first) = self.first else {
            self.first = Some(value);
            self.count = 1;
            return UpdateOutcome::Continue;
        };
        if value == first {
            return UpdateOutcome::Continue;
        }
        let diff = (i128::from(value) - i128::from(first)).unsigned_abs();
        let diff = u64::try_from(diff).unwrap_or(u64::MAX);
        self.modulus = gcd(self.modulus, diff);
        self.count += 1;
        if self.modulus == 1 {
            UpdateOutcome::Falsified
        } else {
            UpdateOutcome::Continue
        }
    }

    /// `(remainder, modulus)` once three values agree on a modulus.
    #[must_use]
    pub fn result(&self) -> Option<(i64, u64)> {
        let first = self.first?;
        (self.count >= 3 && self.modulus > 1).then(|| (rem_euclid(first, self.modulus), self.modulus))
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        match self.result() {
            Some((_, m)) => 1.0 - (1.0 / m as f64).powf((self.count - 1) as f64),
            None => 0.0,
        }
    }
}

/// Elements beyond which a NonModulus stops tracking and never reports.
pub const NON_MODULUS_MAX_ELEMENTS: usize = 4096;

/// `x != r (mod m)`: every value in range except the observed ones is `r`
/// mod `m`. Never falsified; reports only while the gaps are regular.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonModulus {
    elements: BTreeSet<i64>,
    overflowed: bool,
    observations: u64,
}

impl NonModulus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: i64) -> UpdateOutcome {
        self.observations += 1;
        if !self.overflowed {
            self.elements.insert(value);
            if self.elements.len() > NON_MODULUS_MAX_ELEMENTS {
                self.overflowed = true;
                self.elements.clear();
            }
        }
        UpdateOutcome::Continue
    }

    /// `(remainder, modulus)` when the numbers missing from the observed
    /// range form an arithmetic progression of step > 1 with at least three
    /// terms.
    #[must_use]
    pub fn result(&self) -> Option<(i64, u64)> {
        if self.overflowed {
            return None;
        }
        let mut first: Option<i128> = None;
        let mut step: Option<i128> = None;
        let mut prev: i128 = 0;
        let mut count = 0_u32;
        let sorted: Vec<i128> = self.elements.iter().map(|&e| i128::from(e)).collect();
        for pair in sorted.windows(2) {
            match pair[1] - pair[0] {
                1 => continue,
                2 => {}
                _ => return None,
            }
            let missing = pair[0] + 1;
            match (first, step) {
                (None, _) => first = Some(missing),
                (Some(f), None) => {
                    let s = missing - f;
                    if s <= 1 {
                        return None;
                    }
                    step = Some(s);
                }
                (Some(_), Some(s)) => {
                    if missing - prev != s {
                        return None;
                    }
                }
            }
            prev = missing;
            count += 1;
        }
        let step = u64::try_from(step?).ok()?;
        if count < 3 {
            return None;
        }
        Some((rem_euclid(i64::try_from(prev).ok()?, step), step))
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        match self.result() {
            Some((_, m)) => uniform_confidence(m as f64, self.observations),
            None => 0.0,
        }
    }
}
