//! Stable names for invariant kinds and derivation kinds.
//!
//! These tags are the keys of the configuration surface and the `kind` field
//! of rendered invariant descriptions.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! named_tags {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $enabled:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every tag, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }

            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Whether the kind is switched on in a default configuration.
            #[must_use]
            pub const fn default_enabled(self) -> bool {
                match self {
                    $(Self::$variant => $enabled),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_tags! {
    /// Invariant kind names.
    pub enum InvKindTag {
        Equality => true,
        NonZero => true,
        LowerBound => true,
        UpperBound => true,
        OneOf => true,
        Modulus => true,
        NonModulus => false,
        EltNonZero => true,
        EltOneOf => true,
        EltLowerBound => true,
        EltUpperBound => true,
        EltwiseComparison => true,
        NoDuplicates => true,
        Comparison => true,
        LinearBinary => true,
        Member => true,
        SeqScalarComparison => true,
        SubSequence => true,
        SubSet => true,
        PairwiseComparison => true,
        Reverse => true,
        FunctionBinary => true,
        Implication => true,
    }
}

impl InvKindTag {
    /// Number of variables an invariant of this kind ranges over.
    ///
    /// `Equality` is the partition itself and ranges over a whole class.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Implication => 0,
            Self::Equality
            | Self::NonZero
            | Self::LowerBound
            | Self::UpperBound
            | Self::OneOf
            | Self::Modulus
            | Self::NonModulus
            | Self::EltNonZero
            | Self::EltOneOf
            | Self::EltLowerBound
            | Self::EltUpperBound
            | Self::EltwiseComparison
            | Self::NoDuplicates => 1,
            Self::Comparison
            | Self::LinearBinary
            | Self::Member
            | Self::SeqScalarComparison
            | Self::SubSequence
            | Self::SubSet
            | Self::PairwiseComparison
            | Self::Reverse => 2,
            Self::FunctionBinary => 3,
        }
    }
}

named_tags! {
    /// Derivation kind names.
    pub enum DerivationTag {
        SequenceLength => true,
        SequenceInitial => true,
        SequenceMin => true,
        SequenceMax => true,
        SequenceSum => true,
        SequenceSubscript => true,
        SequenceSubsequence => true,
        SequencesConcat => false,
        SequencesUnion => false,
        SequencesIntersection => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for tag in InvKindTag::ALL {
            assert_eq!(InvKindTag::from_name(tag.name()), Some(*tag));
        }
        for tag in DerivationTag::ALL {
            assert_eq!(DerivationTag::from_name(&tag.to_string()), Some(*tag));
        }
        assert_eq!(InvKindTag::from_name("Bogus"), None);
    }

    #[test]
    fn test_defaults() {
        assert!(InvKindTag::NonZero.default_enabled());
        assert!(!InvKindTag::NonModulus.default_enabled());
        assert!(!DerivationTag::SequencesConcat.default_enabled());
        assert_eq!(InvKindTag::FunctionBinary.arity(), 3);
        assert_eq!(InvKindTag::Implication.arity(), 0);
    }
}
