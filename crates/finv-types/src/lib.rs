//! Core types shared by every FrankenInv crate.
//!
//! Values and samples ([`Value`], [`ValueTuple`], [`ModBit`]), variable
//! descriptors ([`VarInfo`], [`VarAux`], [`Comparability`], [`Derived`]),
//! kind tags, and the [`InferenceConfig`].

pub mod comparability;
pub mod config;
pub mod kinds;
pub mod tuple;
pub mod value;
pub mod var;

pub use comparability::{Comparability, ImplicitTag, check_uniform_format};
pub use config::InferenceConfig;
pub use kinds::{DerivationTag, InvKindTag};
pub use tuple::{ModBit, ValueTuple};
pub use value::{Elements, Value, ValueInterner};
pub use var::{DerivationKind, Derived, RepType, VarAux, VarId, VarInfo};
