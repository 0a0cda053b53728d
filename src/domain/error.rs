use crate::{
    domain::enforced::{ConstraintKind, EntryId, GroupDimension},
    validation::Violation,
};

/// Errors raised by hypothesis mutators and by serialization.
///
/// Every variant is recoverable: a failing mutator leaves the configuration
/// unchanged.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// A value lies outside the domain of the field (or record attribute)
    /// named by `key`.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue {
        /// The field key or record attribute.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An identical enforced entry already exists.
    #[error("an identical enforced {collection} already exists at position {index}")]
    DuplicateConstraint {
        /// `vertex` or `mesh`.
        collection: &'static str,
        /// Index of the existing entry.
        index: usize,
    },

    /// The constraint kind cannot be drawn from a group of this dimension.
    #[error(
        "a {constraint} constraint needs a group of dimension {} or higher, \
         but the group is {dimension}",
        constraint.dimension()
    )]
    IncompatibleConstraintKind {
        /// The requested constraint kind.
        constraint: ConstraintKind,
        /// Dimension of the referenced group.
        dimension: GroupDimension,
    },

    /// No enforced entry has this identifier.
    #[error("no enforced entry with id {0}")]
    UnknownEntry(EntryId),

    /// No text option has this name.
    #[error("no text option named '{0}'")]
    UnknownOption(String),

    /// Serialization was attempted on an invalid configuration.
    #[error("configuration has {} violation(s)", .0.len())]
    ValidationFailed(Vec<Violation>),
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
