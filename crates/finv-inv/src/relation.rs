//! Order relations and the observed-order flags behind every comparison kind.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::UpdateOutcome;

/// A binary order relation `x R y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl Relation {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Whether `x R y` holds given `x.cmp(y)`.
    #[must_use]
    pub const fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Lt => matches!(ord, Ordering::Less),
            Self::Le => !matches!(ord, Ordering::Greater),
            Self::Eq => matches!(ord, Ordering::Equal),
            Self::Ne => !matches!(ord, Ordering::Equal),
            Self::Gt => matches!(ord, Ordering::Greater),
            Self::Ge => !matches!(ord, Ordering::Less),
        }
    }

    /// The relation with operands swapped: `x R y` iff `y R.flip() x`.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
        }
    }

    const ORDERINGS: [Ordering; 3] = [Ordering::Less, Ordering::Equal, Ordering::Greater];

    /// Every ordering allowed by `self` is allowed by `other`.
    #[must_use]
    pub fn implies(self, other: Self) -> bool {
        Self::ORDERINGS
            .iter()
            .all(|&o| !self.holds(o) || other.holds(o))
    }

    /// No ordering satisfies both.
    #[must_use]
    pub fn excludes(self, other: Self) -> bool {
        Self::ORDERINGS
            .iter()
            .all(|&o| !(self.holds(o) && other.holds(o)))
    }

    /// `x R1 y` and `y R2 z` give `x R z`, when some `R` follows.
    #[must_use]
    pub const fn compose(self, next: Self) -> Option<Self> {
        match (self, next) {
            (Self::Eq, r) | (r, Self::Eq) => Some(r),
            (Self::Lt, Self::Lt | Self::Le) | (Self::Le, Self::Lt) => Some(Self::Lt),
            (Self::Le, Self::Le) => Some(Self::Le),
            (Self::Gt, Self::Gt | Self::Ge) | (Self::Ge, Self::Gt) => Some(Self::Gt),
            (Self::Ge, Self::Ge) => Some(Self::Ge),
            _ => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Which orderings have been observed between two operands.
///
/// With `only_eq` set (identity-like operands such as hashcodes or unordered
/// sequences) anything but equality falsifies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFlags {
    can_be_lt: bool,
    can_be_eq: bool,
    can_be_gt: bool,
    only_eq: bool,
}

impl OrderFlags {
    #[must_use]
    pub const fn new(only_eq: bool) -> Self {
        Self {
            can_be_lt: false,
            can_be_eq: false,
            can_be_gt: false,
            only_eq,
        }
    }

    #[must_use]
    pub const fn only_eq(&self) -> bool {
        self.only_eq
    }

    pub fn observe(&mut self, ord: Ordering) -> UpdateOutcome {
        match ord {
            Ordering::Less => self.can_be_lt = true,
            Ordering::Equal => self.can_be_eq = true,
            Ordering::Greater => self.can_be_gt = true,
        }
        let all = self.can_be_lt && self.can_be_eq && self.can_be_gt;
        let unequal = self.can_be_lt || self.can_be_gt;
        if all || (self.only_eq && unequal) {
            UpdateOutcome::Falsified
        } else {
            UpdateOutcome::Continue
        }
    }

    /// The flags as seen with the operands swapped.
    pub const fn flip(&mut self) {
        let lt = self.can_be_lt;
        self.can_be_lt = self.can_be_gt;
        self.can_be_gt = lt;
    }

    /// The strongest relation consistent with every observation so far.
    #[must_use]
    pub const fn relation(&self) -> Option<Relation> {
        match (self.can_be_lt, self.can_be_eq, self.can_be_gt) {
            (true, false, false) => Some(Relation::Lt),
            (true, true, false) => Some(Relation::Le),
            (false, true, false) => Some(Relation::Eq),
            (true, false, true) => Some(Relation::Ne),
            (false, false, true) => Some(Relation::Gt),
            (false, true, true) => Some(Relation::Ge),
            (false, false, false) | (true, true, true) => None,
        }
    }
}
