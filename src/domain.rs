//! Domain model of a meshing hypothesis.
//!
//! This module contains the configuration itself, the enforcement records it
//! owns, the closed enumerations of engine options and the field keys used to
//! edit it.

mod config;
pub use config::{DEFAULT_GRADATION, HypothesisConfig, LoadError, MAX_VERBOSE_LEVEL, SaveError};

pub mod enforced;
pub use enforced::{
    ConstraintKind, EnforcedMesh, EnforcedVertex, EntryId, GeometryRef, GroupDimension, GroupRef,
    Point,
};

mod error;
pub use error::ConfigError;

pub mod field;
pub use field::{Field, FieldStatus, UnknownField, Value, ValueKind};

/// Closed enumerations of engine options.
pub mod options;
pub use options::{Algorithm, OptimizationLevel, ParallelStrategy, UnknownVariant};

pub mod text_option;
pub use text_option::{OptionType, TextOption, TextOptionError};
