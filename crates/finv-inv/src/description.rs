//! Rendering-independent invariant descriptions.

use std::collections::BTreeMap;
use std::fmt;

use finv_types::InvKindTag;
use serde::{Deserialize, Serialize};

/// What an invariant says, detached from its state machine.
///
/// This is the hand-off to renderers and to the prover bridge: the kind,
/// the participating variable names in slice order, kind-specific
/// parameters, and a canonical formula used by [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvariantDescription {
    pub kind: InvKindTag,
    pub vars: Vec<String>,
    pub params: BTreeMap<String, String>,
    pub formula: String,
}

impl InvariantDescription {
    pub(crate) fn new(kind: InvKindTag, vars: Vec<String>, formula: String) -> Self {
        Self {
            kind,
            vars,
            params: BTreeMap::new(),
            formula,
        }
    }

    pub(crate) fn param(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.params.insert(key.to_owned(), value.to_string());
        self
    }

    /// Description of an equality class: every member equals the leader.
    #[must_use]
    pub fn equality(members: &[&str]) -> Self {
        Self::new(
            InvKindTag::Equality,
            members.iter().map(|m| (*m).to_owned()).collect(),
            members.join(" == "),
        )
    }
}

impl fmt::Display for InvariantDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formula)
    }
}

/// Render a value list as `{ a, b, c }`.
pub(crate) fn braced<T: fmt::Display>(items: &[T]) -> String {
    let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("{{ {} }}", inner.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_description() {
        let d = InvariantDescription::equality(&["x", "y", "z"]);
        assert_eq!(d.to_string(), "x == y == z");
        assert_eq!(d.kind, InvKindTag::Equality);
        assert_eq!(d.vars.len(), 3);
    }

    #[test]
    fn test_serializes_to_json() {
        let d = InvariantDescription::new(InvKindTag::NonZero, vec!["x".into()], "x != 0".into())
            .param("zero", 0);
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"NonZero\""), "{json}");
        let back: InvariantDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_braced() {
        assert_eq!(braced(&[1, 2]), "{ 1, 2 }");
    }
}
