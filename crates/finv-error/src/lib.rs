//! Error taxonomy shared by every FrankenInv crate.
//!
//! Three categories of trouble exist in the inference engine:
//!
//! 1. **Programming errors**: a sample routed to a slice with the wrong
//!    arity, a split naming an unknown leader, a malformed sample. These are
//!    surfaced as [`InferError`] values and abort the enclosing location.
//! 2. **Missing data**: a derivation precondition failing or a variable
//!    without a value. These never become errors; the "missing" status
//!    propagates and the affected slice skips the sample.
//! 3. **Degenerate statistics**: zero samples, underflow. These are reported
//!    as "unjustified" by the invariant layer, never as errors.
//!
//! Only category 1 lives here.

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, InferError>;

/// Errors raised by the inference engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    /// A sample does not have one entry per location variable.
    #[error("sample shape mismatch at {location}: expected {expected} values, got {actual}")]
    SampleShape {
        location: String,
        expected: usize,
        actual: usize,
    },

    /// A missing modification bit was paired with a value, or the reverse.
    #[error("inconsistent sample entry for variable {var}: {reason}")]
    InconsistentSample { var: u32, reason: String },

    /// A slice's variable tuple disagrees with the arity of an invariant or projection.
    #[error("arity mismatch on slice {slice}: expected {expected}, got {actual}")]
    ArityMismatch {
        slice: String,
        expected: usize,
        actual: usize,
    },

    /// An equality split referenced a variable that does not lead any class.
    #[error("unknown equality leader {leader} at {location}")]
    UnknownLeader { location: String, leader: u32 },

    /// A variable id outside the location's variable table.
    #[error("unknown variable {var} at {location}")]
    UnknownVariable { location: String, var: u32 },

    /// A derivation consumes a variable that is not computed before it.
    #[error("derivation cycle: node {node} consumes variable {input} which is not yet available")]
    DerivationCycle { node: usize, input: u32 },

    /// Variables at one location mix comparability formats.
    #[error("comparability format mismatch at {location}: {first} vs {second}")]
    ComparabilityFormatMismatch {
        location: String,
        first: String,
        second: String,
    },

    /// A configuration key names no known invariant or derivation kind.
    #[error("unknown configuration key: {0}")]
    UnknownConfigKey(String),

    /// A configuration value is outside its valid domain.
    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// A configuration document failed to parse.
    #[error("configuration parse error: {0}")]
    ConfigParse(String),

    /// A location was poisoned by an earlier fatal error.
    #[error("location {0} is poisoned by an earlier fatal error")]
    LocationPoisoned(String),

    /// Two non-empty locations with the same name were unioned.
    #[error("cannot merge two non-empty locations named {0}")]
    DuplicateLocation(String),

    /// No location with this name is registered.
    #[error("unknown location {0}")]
    UnknownLocation(String),

    /// The prover bridge answered with the wrong number of verdicts.
    #[error("prover bridge returned {actual} verdicts for {expected} candidates")]
    ProverVerdictMismatch { expected: usize, actual: usize },

    /// Internal logic error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl InferError {
    /// Construct an [`InferError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error must terminate processing of the affected location.
    ///
    /// Configuration and lookup failures happen before or outside the
    /// incremental phase and leave location state untouched.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::UnknownConfigKey(_)
                | Self::InvalidConfig { .. }
                | Self::ConfigParse(_)
                | Self::UnknownLocation(_)
                | Self::DuplicateLocation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = InferError::SampleShape {
            location: "Stack.push:::ENTER".to_owned(),
            expected: 3,
            actual: 2,
        };
        let text = err.to_string();
        assert!(text.contains("Stack.push:::ENTER"), "{text}");
        assert!(text.contains("expected 3"), "{text}");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(InferError::internal("boom").is_fatal());
        assert!(
            InferError::ArityMismatch {
                slice: "(x, y)".to_owned(),
                expected: 2,
                actual: 3,
            }
            .is_fatal()
        );
        assert!(!InferError::UnknownConfigKey("Bogus".to_owned()).is_fatal());
        assert!(!InferError::DuplicateLocation("P".to_owned()).is_fatal());
    }
}
