//! Three-variable kinds: `z = f(x, y)` over integers.

use std::fmt;

use finv_error::{InferError, Result};
use finv_types::Value;
use serde::{Deserialize, Serialize};

use crate::UpdateOutcome;
use crate::tracker::ValueTracker;

/// Commutative integer functions tried by [`FunctionBinary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BinaryFunction {
    Min,
    Max,
    Sum,
    Product,
    Gcd,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryFunction {
    pub const ALL: [Self; 8] = [
        Self::Min,
        Self::Max,
        Self::Sum,
        Self::Product,
        Self::Gcd,
        Self::BitAnd,
        Self::BitOr,
        Self::BitXor,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::Product => "product",
            Self::Gcd => "gcd",
            Self::BitAnd => "bitand",
            Self::BitOr => "bitor",
            Self::BitXor => "bitxor",
        }
    }

    /// `None` when the result overflows.
    #[must_use]
    pub fn apply(self, x: i64, y: i64) -> Option<i64> {
        match self {
            Self::Min => Some(x.min(y)),
            Self::Max => Some(x.max(y)),
            Self::Sum => x.checked_add(y),
            Self::Product => x.checked_mul(y),
            Self::Gcd => {
                let (mut a, mut b) = (x.unsigned_abs(), y.unsigned_abs());
                while b != 0 {
                    (a, b) = (b, a % b);
                }
                i64::try_from(a).ok()
            }
            Self::BitAnd => Some(x & y),
            Self::BitOr => Some(x | y),
            Self::BitXor => Some(x ^ y),
        }
    }
}

impl fmt::Display for BinaryFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `v[result] == f(other two)`; the argument order does not matter since
/// every function is commutative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBinary {
    func: BinaryFunction,
    result: usize,
    tracker: ValueTracker,
}

impl FunctionBinary {
    /// `result` is the slice position (0..3) holding the function value.
    pub fn new(func: BinaryFunction, result: usize) -> Result<Self> {
        if result > 2 {
            return Err(InferError::internal(format!(
                "FunctionBinary result position {result} out of range"
            )));
        }
        Ok(Self {
            func,
            result,
            tracker: ValueTracker::new(),
        })
    }

    #[must_use]
    pub const fn func(&self) -> BinaryFunction {
        self.func
    }

    #[must_use]
    pub const fn result_position(&self) -> usize {
        self.result
    }

    /// Slice positions of the two arguments, ascending.
    #[must_use]
    pub const fn argument_positions(&self) -> [usize; 2] {
        match self.result {
            0 => [1, 2],
            1 => [0, 2],
            _ => [0, 1],
        }
    }

    pub fn update(&mut self, values: [&Value; 3]) -> Result<UpdateOutcome> {
        let [a, b] = self.argument_positions();
        let (Some(x), Some(y), Some(z)) = (
            values[a].as_int(),
            values[b].as_int(),
            values[self.result].as_int(),
        ) else {
            return Err(InferError::internal(format!(
                "FunctionBinary over non-integer values {} {} {}",
                values[0], values[1], values[2]
            )));
        };
        self.tracker.add(&[values[0], values[1], values[2]]);
        Ok(if self.func.apply(x, y) == Some(z) {
            UpdateOutcome::Continue
        } else {
            UpdateOutcome::Falsified
        })
    }

    /// Follow a reordering of the slice: new position `i` holds what was at
    /// `order[i]`.
    pub fn permute(&mut self, order: [usize; 3]) {
        if let Some(moved) = order.iter().position(|&old| old == self.result) {
            self.result = moved;
        }
        self.tracker.permute(&order);
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.tracker.coin_flip_confidence()
    }
}
