//! Variable comparability: which variables may legitimately appear together
//! in one invariant.
//!
//! Three formats exist, and one location uses exactly one of them:
//!
//! * [`Comparability::None`]: everything is comparable with everything.
//! * [`Comparability::Implicit`]: an integer tag per variable, with one extra
//!   tag per array dimension. Written `base[idx]..`, e.g. `3`, `1[2]`,
//!   `-1[2][3]`. A negative scalar tag is comparable with anything.
//! * [`Comparability::Explicit`]: each variable lists the names of its peers.

use std::collections::BTreeSet;
use std::fmt;

use finv_error::{InferError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Implicit comparability tag: element base plus one tag per array dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplicitTag {
    pub base: i64,
    pub indices: SmallVec<[i64; 2]>,
}

impl ImplicitTag {
    #[must_use]
    pub fn scalar(base: i64) -> Self {
        Self {
            base,
            indices: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn array(base: i64, indices: &[i64]) -> Self {
        Self {
            base,
            indices: SmallVec::from_slice(indices),
        }
    }

    /// Parse the `base[idx][idx]` textual form.
    pub fn parse(text: &str) -> Result<Self> {
        let bad = |reason: &str| InferError::InvalidConfig {
            key: format!("comparability `{text}`"),
            reason: reason.to_owned(),
        };
        let text = text.trim();
        let (base, mut rest) = match text.find('[') {
            Some(pos) => (&text[..pos], &text[pos..]),
            None => (text, ""),
        };
        let base = base
            .parse::<i64>()
            .map_err(|_| bad("base tag is not an integer"))?;
        let mut indices = SmallVec::new();
        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| bad("unclosed index tag"))?;
            if !rest.starts_with('[') {
                return Err(bad("expected `[`"));
            }
            let idx = rest[1..close]
                .parse::<i64>()
                .map_err(|_| bad("index tag is not an integer"))?;
            indices.push(idx);
            rest = &rest[close + 1..];
        }
        Ok(Self { base, indices })
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn always_comparable(&self) -> bool {
        self.indices.is_empty() && self.base < 0
    }

    /// Tag of one element: the last dimension stripped.
    #[must_use]
    pub fn element_type(&self) -> Self {
        let mut indices = self.indices.clone();
        indices.pop();
        Self {
            base: self.base,
            indices,
        }
    }

    /// Tag of the index into dimension `dim`, if the array has that many.
    #[must_use]
    pub fn index_type(&self, dim: usize) -> Option<Self> {
        self.indices.get(dim).map(|&idx| Self::scalar(idx))
    }

    #[must_use]
    pub fn comparable(&self, other: &Self) -> bool {
        if self.always_comparable() || other.always_comparable() {
            return true;
        }
        match (self.indices.last(), other.indices.last()) {
            (Some(&a), Some(&b)) => {
                Self::scalar(a).comparable(&Self::scalar(b))
                    && self.element_type().comparable(&other.element_type())
            }
            (None, None) => self.base == other.base,
            _ => false,
        }
    }
}

impl fmt::Display for ImplicitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for idx in &self.indices {
            write!(f, "[{idx}]")?;
        }
        Ok(())
    }
}

/// Comparability information for one variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparability {
    #[default]
    None,
    Implicit(ImplicitTag),
    Explicit { peers: BTreeSet<String> },
}

impl Comparability {
    /// Explicit comparability from a list of peer names.
    #[must_use]
    pub fn explicit<S: AsRef<str>>(peers: &[S]) -> Self {
        Self::Explicit {
            peers: peers.iter().map(|p| p.as_ref().to_owned()).collect(),
        }
    }

    /// Name of the format, used in mismatch diagnostics.
    #[must_use]
    pub const fn format_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Implicit(_) => "implicit",
            Self::Explicit { .. } => "explicit",
        }
    }

    #[must_use]
    pub fn same_format(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Whether a variable named `name` with this comparability may share an
    /// invariant with `other_name` carrying `other`.
    ///
    /// Mixed formats are never comparable; locations reject them at setup.
    #[must_use]
    pub fn comparable(&self, name: &str, other: &Self, other_name: &str) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Implicit(a), Self::Implicit(b)) => a.comparable(b),
            (Self::Explicit { peers: a }, Self::Explicit { peers: b }) => {
                name == other_name || (a.contains(other_name) && b.contains(name))
            }
            _ => false,
        }
    }

    /// Comparability of one element of an array variable.
    ///
    /// Non-implicit formats carry no per-dimension information and are
    /// returned unchanged.
    #[must_use]
    pub fn element_type(&self) -> Self {
        match self {
            Self::Implicit(tag) => Self::Implicit(tag.element_type()),
            other => other.clone(),
        }
    }

    /// Comparability of the index into dimension `dim`.
    #[must_use]
    pub fn index_type(&self, dim: usize) -> Self {
        match self {
            Self::Implicit(tag) => tag
                .index_type(dim)
                .map_or(Self::Implicit(ImplicitTag::scalar(-1)), Self::Implicit),
            other => other.clone(),
        }
    }
}

/// Reject a location whose variables mix comparability formats.
pub fn check_uniform_format<'a>(
    location: &str,
    tags: impl IntoIterator<Item = &'a Comparability>,
) -> Result<()> {
    let mut tags = tags.into_iter();
    let Some(first) = tags.next() else {
        return Ok(());
    };
    for tag in tags {
        if !first.same_format(tag) {
            return Err(InferError::ComparabilityFormatMismatch {
                location: location.to_owned(),
                first: first.format_name().to_owned(),
                second: tag.format_name().to_owned(),
            });
        }
    }
    Ok(())
}
