//! `predicate ==> consequent` over two already-accepted invariants.
//!
//! Implications live in a location's arity-0 slice. They carry no sample
//! statistics of their own: their standing is that of the weaker half.

use crate::description::InvariantDescription;
use crate::invariant::Invariant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Implication {
    predicate: Invariant,
    predicate_vars: Vec<String>,
    consequent: Invariant,
    consequent_vars: Vec<String>,
    iff: bool,
}

impl Implication {
    /// `predicate_vars` / `consequent_vars` name each half's slice variables
    /// in slice order.
    #[must_use]
    pub const fn new(
        predicate: Invariant,
        predicate_vars: Vec<String>,
        consequent: Invariant,
        consequent_vars: Vec<String>,
        iff: bool,
    ) -> Self {
        Self {
            predicate,
            predicate_vars,
            consequent,
            consequent_vars,
            iff,
        }
    }

    #[must_use]
    pub const fn predicate(&self) -> &Invariant {
        &self.predicate
    }

    #[must_use]
    pub const fn consequent(&self) -> &Invariant {
        &self.consequent
    }

    #[must_use]
    pub const fn is_iff(&self) -> bool {
        self.iff
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.predicate
            .confidence()
            .min(self.consequent.confidence())
    }

    /// Either half has been falsified.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.predicate.is_falsified() || self.consequent.is_falsified()
    }

    #[must_use]
    pub fn same_formula(&self, other: &Self) -> bool {
        self.iff == other.iff
            && self.predicate_vars == other.predicate_vars
            && self.consequent_vars == other.consequent_vars
            && self.predicate.same_formula(&other.predicate)
            && self.consequent.same_formula(&other.consequent)
    }

    #[must_use]
    pub fn describe(&self) -> (InvariantDescription, InvariantDescription) {
        fn names(vars: &[String]) -> Vec<&str> {
            vars.iter().map(String::as_str).collect()
        }
        (
            self.predicate.describe(&names(&self.predicate_vars)),
            self.consequent.describe(&names(&self.consequent_vars)),
        )
    }

    #[must_use]
    pub const fn arrow(&self) -> &'static str {
        if self.iff { "<==>" } else { "==>" }
    }
}
