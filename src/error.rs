//! Defines the error types used throughout the `routier` crate.
//!
//! All variants are registration-time errors: a route that fails to parse or
//! compile is rejected and the routing tree is left untouched. Match-time
//! anomalies are never errors; they degrade to a non-match.

use thiserror::Error;

/// The primary error type for `routier` operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The pattern text itself is malformed: unmatched braces, an empty
    /// parameter name, or an illegal marker combination such as `?` together
    /// with `=default`.
    #[error("invalid route pattern '{pattern}': {reason}")]
    PatternSyntax {
        /// The offending pattern string.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },

    /// The pattern parsed but violates a structural rule of the route table:
    /// an optional segment before a required one, a wildcard or catch-all
    /// that is not the final segment, or an optional catch-all.
    #[error("invalid route structure '{pattern}': {reason}")]
    Structural {
        /// The offending pattern string.
        pattern: String,
        /// The violated structural rule.
        reason: String,
    },

    /// A constraint specifier for a known constraint kind carries arguments
    /// that cannot be interpreted, e.g. `min(abc)` or `length(1,2,3)`.
    #[error("invalid constraint specifier '{specifier}': {reason}")]
    ConstraintFormat {
        /// The problematic constraint specifier.
        specifier: String,
        /// The reason why the specifier is invalid.
        reason: String,
    },
}
