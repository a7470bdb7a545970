//! Inference configuration.
//!
//! Built once before any location is set up and shared read-only
//! (`Arc<InferenceConfig>`) by every location afterwards.

use std::collections::BTreeMap;

use finv_error::{InferError, Result};
use serde::{Deserialize, Serialize};

use crate::kinds::{DerivationTag, InvKindTag};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default confidence an invariant must exceed to be reported.
pub const DEFAULT_CONFIDENCE_LIMIT: f64 = 0.99;

/// Default number of distinct values a OneOf invariant may hold.
pub const DEFAULT_ONE_OF_SIZE: usize = 3;

/// Default cap on the value range used by the NonZero confidence model.
pub const DEFAULT_NONZERO_RANGE_MAX: u64 = 50;

/// Configuration consulted at location setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Minimum confidence for an invariant to count as justified.
    /// Default: 0.99.
    pub confidence_limit: f64,
    /// Capacity of OneOf and EltOneOf value sets. Default: 3.
    pub one_of_size: usize,
    /// Range cap for the NonZero confidence model. Default: 50.
    pub nonzero_range_max: u64,
    /// Explicit invariant kind toggles. Absent kinds use their default.
    pub invariants: BTreeMap<InvKindTag, bool>,
    /// Explicit derivation kind toggles. Absent kinds use their default.
    pub derivations: BTreeMap<DerivationTag, bool>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            confidence_limit: DEFAULT_CONFIDENCE_LIMIT,
            one_of_size: DEFAULT_ONE_OF_SIZE,
            nonzero_range_max: DEFAULT_NONZERO_RANGE_MAX,
            invariants: BTreeMap::new(),
            derivations: BTreeMap::new(),
        }
    }
}

impl InferenceConfig {
    /// Toggle an invariant or derivation kind by name.
    ///
    /// Names are the kind tag names (`"NonZero"`, `"SequenceMin"`).
    pub fn set_enabled(&mut self, key: &str, enabled: bool) -> Result<()> {
        if let Some(tag) = InvKindTag::from_name(key) {
            self.invariants.insert(tag, enabled);
            return Ok(());
        }
        if let Some(tag) = DerivationTag::from_name(key) {
            self.derivations.insert(tag, enabled);
            return Ok(());
        }
        Err(InferError::UnknownConfigKey(key.to_owned()))
    }

    /// Builder form of [`InferenceConfig::set_enabled`].
    pub fn with(mut self, key: &str, enabled: bool) -> Result<Self> {
        self.set_enabled(key, enabled)?;
        Ok(self)
    }

    #[must_use]
    pub fn is_enabled(&self, kind: InvKindTag) -> bool {
        self.invariants
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_enabled())
    }

    #[must_use]
    pub fn derivation_enabled(&self, kind: DerivationTag) -> bool {
        self.derivations
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_enabled())
    }

    /// The flat `kind-name -> bool` view of every toggle, defaults included.
    #[must_use]
    pub fn flat(&self) -> BTreeMap<String, bool> {
        let invariants = InvKindTag::ALL
            .iter()
            .map(|&tag| (tag.name().to_owned(), self.is_enabled(tag)));
        let derivations = DerivationTag::ALL
            .iter()
            .map(|&tag| (tag.name().to_owned(), self.derivation_enabled(tag)));
        invariants.chain(derivations).collect()
    }

    /// Check numeric settings for sanity.
    pub fn validate(&self) -> Result<()> {
        let limit = self.confidence_limit;
        if limit.is_nan() || limit <= 0.0 || limit >= 1.0 {
            return Err(InferError::InvalidConfig {
                key: "confidence_limit".to_owned(),
                reason: format!("{limit} is not strictly between 0 and 1"),
            });
        }
        if self.one_of_size == 0 {
            return Err(InferError::InvalidConfig {
                key: "one_of_size".to_owned(),
                reason: "must hold at least one value".to_owned(),
            });
        }
        if self.nonzero_range_max < 2 {
            return Err(InferError::InvalidConfig {
                key: "nonzero_range_max".to_owned(),
                reason: format!("{} is below 2", self.nonzero_range_max),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| InferError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| InferError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InferenceConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_enabled(InvKindTag::NonZero));
        assert!(!config.is_enabled(InvKindTag::NonModulus));
        assert!(config.derivation_enabled(DerivationTag::SequenceLength));
        assert!(!config.derivation_enabled(DerivationTag::SequencesUnion));
    }

    #[test]
    fn test_set_enabled_by_name() {
        let mut config = InferenceConfig::default();
        config.set_enabled("NonZero", false).unwrap();
        config.set_enabled("SequencesConcat", true).unwrap();
        assert!(!config.is_enabled(InvKindTag::NonZero));
        assert!(config.derivation_enabled(DerivationTag::SequencesConcat));
        let err = config.set_enabled("NotAKind", true).unwrap_err();
        assert_eq!(err, InferError::UnknownConfigKey("NotAKind".to_owned()));
    }

    #[test]
    fn test_flat_lists_every_kind() {
        let flat = InferenceConfig::default().flat();
        assert_eq!(
            flat.len(),
            InvKindTag::ALL.len() + DerivationTag::ALL.len()
        );
        assert_eq!(flat.get("NonModulus"), Some(&false));
    }

    #[test]
    fn test_json_roundtrip_and_validation() {
        let config = InferenceConfig::default().with("Modulus", false).unwrap();
        let json = config.to_json().unwrap();
        let back = InferenceConfig::from_json(&json).unwrap();
        assert_eq!(back, config);

        let partial = InferenceConfig::from_json(r#"{"one_of_size": 5}"#).unwrap();
        assert_eq!(partial.one_of_size, 5);
        assert_eq!(partial.confidence_limit, DEFAULT_CONFIDENCE_LIMIT);

        let err = InferenceConfig::from_json(r#"{"confidence_limit": 1.5}"#).unwrap_err();
        assert!(matches!(err, InferError::InvalidConfig { .. }), "{err}");
        let err = InferenceConfig::from_json("{").unwrap_err();
        assert!(matches!(err, InferError::ConfigParse(_)), "{err}");
    }

    #[test]
    fn test_toml_document() {
        let doc = r#"
            confidence_limit = 0.95

            [invariants]
            NonZero = false
            NonModulus = true

            [derivations]
            SequenceSum = false
        "#;
        let config: InferenceConfig = toml::from_str(doc).unwrap();
        assert!(config.validate().is_ok());
        assert!(!config.is_enabled(InvKindTag::NonZero));
        assert!(config.is_enabled(InvKindTag::NonModulus));
        assert!(!config.derivation_enabled(DerivationTag::SequenceSum));
        assert_eq!(config.one_of_size, DEFAULT_ONE_OF_SIZE);
    }
}
