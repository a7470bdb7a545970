//! Variable descriptors and derivation provenance.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::comparability::Comparability;
use crate::kinds::DerivationTag;
use crate::value::Value;

/// Dense index of a variable within its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl VarId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Representation type of a variable's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepType {
    Int,
    Float,
    Str,
    /// Object identity. Only equality and non-null are meaningful.
    Hashcode,
    IntSeq,
    FloatSeq,
    StrSeq,
}

impl RepType {
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Str | Self::Hashcode)
    }

    #[must_use]
    pub const fn is_sequence(self) -> bool {
        !self.is_scalar()
    }

    /// Int or float, scalar.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Element type of a sequence type.
    #[must_use]
    pub const fn element_type(self) -> Option<Self> {
        match self {
            Self::IntSeq => Some(Self::Int),
            Self::FloatSeq => Some(Self::Float),
            Self::StrSeq => Some(Self::Str),
            Self::Int | Self::Float | Self::Str | Self::Hashcode => None,
        }
    }

    /// Whether `value` has the shape this type promises.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Int | Self::Hashcode, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::Str, Value::Str(_))
                | (Self::IntSeq, Value::IntSeq(_))
                | (Self::FloatSeq, Value::FloatSeq(_))
                | (Self::StrSeq, Value::StrSeq(_))
        )
    }
}

bitflags! {
    /// Auxiliary facts about a variable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct VarAux: u8 {
        /// Element order is meaningful.
        const HAS_ORDER = 1 << 0;
        /// Elements may repeat.
        const HAS_DUPLICATES = 1 << 1;
        /// The sequence has a meaningful size.
        const HAS_SIZE = 1 << 2;
        /// The value may be null.
        const HAS_NULL = 1 << 3;
        /// The variable is a procedure parameter.
        const IS_PARAM = 1 << 4;
        /// The sequence carries a terminator, so `size(a)-1` is meaningful.
        const NULL_TERMINATING = 1 << 5;
    }
}

impl Default for VarAux {
    fn default() -> Self {
        Self::all().difference(Self::IS_PARAM)
    }
}

/// How a derived variable is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivationKind {
    /// `size(a) + shift`, shift in {0, -1}.
    SequenceLength { shift: i8 },
    /// `a[index]`; negative indices count from the end.
    SequenceInitial { index: i8 },
    SequenceMin,
    SequenceMax,
    SequenceSum,
    /// `a[i + shift]`, shift in {0, -1}.
    SequenceSubscript { shift: i8 },
    /// `a[0..=i+shift]` when `from_start`, else `a[i+shift..]`.
    SequenceSubsequence { from_start: bool, shift: i8 },
    SequencesConcat,
    SequencesUnion,
    SequencesIntersection,
}

impl DerivationKind {
    #[must_use]
    pub const fn tag(self) -> DerivationTag {
        match self {
            Self::SequenceLength { .. } => DerivationTag::SequenceLength,
            Self::SequenceInitial { .. } => DerivationTag::SequenceInitial,
            Self::SequenceMin => DerivationTag::SequenceMin,
            Self::SequenceMax => DerivationTag::SequenceMax,
            Self::SequenceSum => DerivationTag::SequenceSum,
            Self::SequenceSubscript { .. } => DerivationTag::SequenceSubscript,
            Self::SequenceSubsequence { .. } => DerivationTag::SequenceSubsequence,
            Self::SequencesConcat => DerivationTag::SequencesConcat,
            Self::SequencesUnion => DerivationTag::SequencesUnion,
            Self::SequencesIntersection => DerivationTag::SequencesIntersection,
        }
    }

    /// Display name of a variable derived from inputs named `bases`.
    #[must_use]
    pub fn derived_name(self, bases: &[&str]) -> String {
        let first = bases.first().copied().unwrap_or("?");
        let second = bases.get(1).copied().unwrap_or("?");
        let offset = |shift: i8| match shift {
            0 => String::new(),
            s if s > 0 => format!("+{s}"),
            s => format!("{s}"),
        };
        match self {
            Self::SequenceLength { shift } => format!("size({first}){}", offset(shift)),
            Self::SequenceInitial { index } => format!("{first}[{index}]"),
            Self::SequenceMin => format!("min({first})"),
            Self::SequenceMax => format!("max({first})"),
            Self::SequenceSum => format!("sum({first})"),
            Self::SequenceSubscript { shift } => format!("{first}[{second}{}]", offset(shift)),
            Self::SequenceSubsequence {
                from_start: true,
                shift,
            } => format!("{first}[0..{second}{}]", offset(shift)),
            Self::SequenceSubsequence {
                from_start: false,
                shift,
            } => format!("{first}[{second}{}..]", offset(shift)),
            Self::SequencesConcat => format!("concat({first}, {second})"),
            Self::SequencesUnion => format!("union({first}, {second})"),
            Self::SequencesIntersection => format!("intersection({first}, {second})"),
        }
    }
}

/// Provenance of a derived variable: its kind and input variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Derived {
    pub kind: DerivationKind,
    pub bases: SmallVec<[VarId; 2]>,
}

impl Derived {
    #[must_use]
    pub fn new(kind: DerivationKind, bases: &[VarId]) -> Self {
        Self {
            kind,
            bases: SmallVec::from_slice(bases),
        }
    }

    /// The sequence input, for kinds that read one.
    #[must_use]
    pub fn sequence(&self) -> Option<VarId> {
        self.bases.first().copied()
    }

    /// The index input of a subscript or subsequence derivation.
    #[must_use]
    pub fn index(&self) -> Option<VarId> {
        match self.kind {
            DerivationKind::SequenceSubscript { .. }
            | DerivationKind::SequenceSubsequence { .. } => self.bases.get(1).copied(),
            _ => None,
        }
    }
}

/// Everything the engine knows about one variable at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarInfo {
    pub id: VarId,
    pub name: String,
    pub rep_type: RepType,
    /// Declared source-language type, used only to gate set derivations.
    pub decl_type: String,
    pub comparability: Comparability,
    pub aux: VarAux,
    pub derived: Option<Derived>,
    /// True for `orig(...)` variables.
    pub is_prestate: bool,
}

impl VarInfo {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, rep_type: RepType) -> Self {
        let name = name.into();
        Self {
            id: VarId(id),
            is_prestate: name.starts_with("orig("),
            name,
            rep_type,
            decl_type: String::new(),
            comparability: Comparability::None,
            aux: VarAux::default(),
            derived: None,
        }
    }

    #[must_use]
    pub fn with_decl_type(mut self, decl_type: impl Into<String>) -> Self {
        self.decl_type = decl_type.into();
        self
    }

    #[must_use]
    pub fn with_comparability(mut self, comparability: Comparability) -> Self {
        self.comparability = comparability;
        self
    }

    #[must_use]
    pub fn with_aux(mut self, aux: VarAux) -> Self {
        self.aux = aux;
        self
    }

    #[must_use]
    pub fn with_derived(mut self, derived: Derived) -> Self {
        self.derived = Some(derived);
        self
    }

    #[must_use]
    pub const fn is_derived(&self) -> bool {
        self.derived.is_some()
    }

    /// `this` or `orig(this)`.
    #[must_use]
    pub fn is_this(&self) -> bool {
        self.name == "this" || self.name == "orig(this)"
    }

    /// Derivation kind, if any.
    #[must_use]
    pub fn derivation(&self) -> Option<DerivationKind> {
        self.derived.as_ref().map(|d| d.kind)
    }

    /// Whether this variable is the length of `seq`, any shift.
    #[must_use]
    pub fn is_length_of(&self, seq: VarId) -> bool {
        self.derived.as_ref().is_some_and(|d| {
            matches!(d.kind, DerivationKind::SequenceLength { .. }) && d.sequence() == Some(seq)
        })
    }

    /// Whether the two variables may share an invariant as whole values.
    #[must_use]
    pub fn comparable(&self, other: &Self) -> bool {
        self.comparability
            .comparable(&self.name, &other.comparability, &other.name)
    }

    /// Whether scalar `other` may be compared with this sequence's elements.
    #[must_use]
    pub fn elements_comparable(&self, other: &Self) -> bool {
        self.comparability
            .element_type()
            .comparable(&self.name, &other.comparability, &other.name)
    }

    /// Same representation, comparable, and matching auxiliary facts: the
    /// preconditions for starting out in one equality class.
    #[must_use]
    pub fn equality_compatible(&self, other: &Self) -> bool {
        self.rep_type == other.rep_type && self.aux == other.aux && self.comparable(other)
    }
}
