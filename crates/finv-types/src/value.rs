//! Observed values and the hash-consing value store.
//!
//! A [`Value`] is one observation of one variable. Sequence and string payloads
//! live behind `Arc`s so that cloning a value is cheap and so that a
//! [`ValueInterner`] can hand out structurally equal values that share one
//! allocation. Equality first checks pointer identity, which makes comparisons
//! between interned values O(1) in the common case.
//!
//! Floats compare by bit pattern for equality and hashing (NaN equals NaN,
//! `-0.0` differs from `0.0`) and by [`f64::total_cmp`] for ordering. This
//! keeps `Eq`/`Hash` lawful, which the equality partition and the interner
//! both depend on.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// One observed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    IntSeq(Arc<[i64]>),
    FloatSeq(Arc<[f64]>),
    StrSeq(Arc<[Arc<str>]>),
}

impl Value {
    /// Build an integer sequence value.
    #[must_use]
    pub fn int_seq(items: impl Into<Vec<i64>>) -> Self {
        Self::IntSeq(Arc::from(items.into()))
    }

    /// Build a float sequence value.
    #[must_use]
    pub fn float_seq(items: impl Into<Vec<f64>>) -> Self {
        Self::FloatSeq(Arc::from(items.into()))
    }

    /// Build a string value.
    #[must_use]
    pub fn str(text: &str) -> Self {
        Self::Str(Arc::from(text))
    }

    /// Build a string sequence value.
    #[must_use]
    pub fn str_seq<S: AsRef<str>>(items: &[S]) -> Self {
        let items: Vec<Arc<str>> = items.iter().map(|s| Arc::from(s.as_ref())).collect();
        Self::StrSeq(Arc::from(items))
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(&**v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int_seq(&self) -> Option<&[i64]> {
        match self {
            Self::IntSeq(v) => Some(&v[..]),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float_seq(&self) -> Option<&[f64]> {
        match self {
            Self::FloatSeq(v) => Some(&v[..]),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str_seq(&self) -> Option<&[Arc<str>]> {
        match self {
            Self::StrSeq(v) => Some(&v[..]),
            _ => None,
        }
    }

    /// Whether this is a sequence value.
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::IntSeq(_) | Self::FloatSeq(_) | Self::StrSeq(_))
    }

    /// Length of a sequence value, `None` for scalars.
    #[must_use]
    pub fn seq_len(&self) -> Option<usize> {
        match self {
            Self::IntSeq(v) => Some(v.len()),
            Self::FloatSeq(v) => Some(v.len()),
            Self::StrSeq(v) => Some(v.len()),
            Self::Int(_) | Self::Float(_) | Self::Str(_) => None,
        }
    }

    /// Element `index` of a sequence as a scalar value.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<Self> {
        match self {
            Self::IntSeq(v) => v.get(index).map(|e| Self::Int(*e)),
            Self::FloatSeq(v) => v.get(index).map(|e| Self::Float(*e)),
            Self::StrSeq(v) => v.get(index).map(|e| Self::Str(Arc::clone(e))),
            Self::Int(_) | Self::Float(_) | Self::Str(_) => None,
        }
    }

    /// Iterate the elements of a sequence as scalar values.
    ///
    /// Scalars yield an empty iterator.
    #[must_use]
    pub fn elements(&self) -> Elements<'_> {
        Elements {
            value: self,
            next: 0,
        }
    }

    /// Numeric zero test. Strings and sequences are never zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(v) => *v == 0,
            Self::Float(v) => *v == 0.0,
            _ => false,
        }
    }

    /// Cheap identity test: pointer equality on shared payloads, value
    /// equality on inline scalars. Interned values that are equal are always
    /// `same`.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Arc::ptr_eq(a, b),
            (Self::IntSeq(a), Self::IntSeq(b)) => Arc::ptr_eq(a, b),
            (Self::FloatSeq(a), Self::FloatSeq(b)) => Arc::ptr_eq(a, b),
            (Self::StrSeq(a), Self::StrSeq(b)) => Arc::ptr_eq(a, b),
            _ => self == other,
        }
    }

    /// Ordering between values of the same shape.
    ///
    /// Sequences order lexically. Values of different shapes are unordered.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => Some(a.total_cmp(b)),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::IntSeq(a), Self::IntSeq(b)) => Some(a.cmp(b)),
            (Self::FloatSeq(a), Self::FloatSeq(b)) => Some(
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| x.total_cmp(y))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or_else(|| a.len().cmp(&b.len())),
            ),
            (Self::StrSeq(a), Self::StrSeq(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Stable 64-bit digest used by value trackers.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut hasher = Xxh3::new();
        match self {
            Self::Int(v) => {
                hasher.update(&[0]);
                hasher.update(&v.to_le_bytes());
            }
            Self::Float(v) => {
                hasher.update(&[1]);
                hasher.update(&v.to_bits().to_le_bytes());
            }
            Self::Str(v) => {
                hasher.update(&[2]);
                hasher.update(v.as_bytes());
            }
            Self::IntSeq(v) => {
                hasher.update(&[3]);
                for e in v.iter() {
                    hasher.update(&e.to_le_bytes());
                }
            }
            Self::FloatSeq(v) => {
                hasher.update(&[4]);
                for e in v.iter() {
                    hasher.update(&e.to_bits().to_le_bytes());
                }
            }
            Self::StrSeq(v) => {
                hasher.update(&[5]);
                for e in v.iter() {
                    hasher.update(&(e.len() as u64).to_le_bytes());
                    hasher.update(e.as_bytes());
                }
            }
        }
        hasher.digest()
    }
}

fn float_bits_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::IntSeq(a), Self::IntSeq(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::FloatSeq(a), Self::FloatSeq(b)) => Arc::ptr_eq(a, b) || float_bits_eq(a, b),
            (Self::StrSeq(a), Self::StrSeq(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest());
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T>(
            f: &mut fmt::Formatter<'_>,
            items: &[T],
            each: impl Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
        ) -> fmt::Result {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                each(f, item)?;
            }
            f.write_str("]")
        }
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::IntSeq(v) => list(f, &v[..], |f, e| write!(f, "{e}")),
            Self::FloatSeq(v) => list(f, &v[..], |f, e| write!(f, "{e}")),
            Self::StrSeq(v) => list(f, &v[..], |f, e| write!(f, "{:?}", &**e)),
        }
    }
}

/// Iterator over the elements of a sequence value.
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    value: &'a Value,
    next: usize,
}

impl Iterator for Elements<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let item = self.value.element(self.next)?;
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.value.seq_len().unwrap_or(0).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

// ---------------------------------------------------------------------------
// Hash-consing value store
// ---------------------------------------------------------------------------

/// Hash-conses values so structurally equal values share one allocation.
///
/// Trace readers intern every value they hand to the engine, and derivations
/// intern what they compute; afterwards [`Value::same`] answers equality for
/// shared payloads without touching their contents.
#[derive(Debug, Default)]
pub struct ValueInterner {
    table: HashSet<Value>,
}

impl ValueInterner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical representative of `value`.
    pub fn intern(&mut self, value: Value) -> Value {
        if let Some(existing) = self.table.get(&value) {
            return existing.clone();
        }
        self.table.insert(value.clone());
        value
    }

    /// Number of distinct values interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
