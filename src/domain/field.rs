//! Field keys and typed values for single-field edits.

use std::{fmt, str::FromStr};

use crate::domain::options::{Algorithm, OptimizationLevel, ParallelStrategy};

/// A scalar or enumerated field of a hypothesis.
///
/// The key spellings are stable: they are the persisted document keys and the
/// names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Field {
    OptimizationLevel,
    ToMeshHoles,
    MakeDomainGroups,
    ToAddNodes,
    InitialMemory,
    MaximumMemory,
    KeepWorkingFiles,
    VerboseLevel,
    WorkingDirectory,
    LogInFile,
    RemoveLogOnSuccess,
    NoInitialCentralPoint,
    UseBoundaryRecoveryVersion,
    UseFemCorrection,
    Gradation,
    MinSize,
    MaxSize,
    UseVolumeProximity,
    VolumeProximity,
    NbLayers,
    Algorithm,
    ParallelStrategy,
    MaxThreads,
    SplitOverconstrainedElements,
    SmoothOffSlivers,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: [Self; 25] = [
        Self::OptimizationLevel,
        Self::ToMeshHoles,
        Self::MakeDomainGroups,
        Self::ToAddNodes,
        Self::InitialMemory,
        Self::MaximumMemory,
        Self::KeepWorkingFiles,
        Self::VerboseLevel,
        Self::WorkingDirectory,
        Self::LogInFile,
        Self::RemoveLogOnSuccess,
        Self::NoInitialCentralPoint,
        Self::UseBoundaryRecoveryVersion,
        Self::UseFemCorrection,
        Self::Gradation,
        Self::MinSize,
        Self::MaxSize,
        Self::UseVolumeProximity,
        Self::VolumeProximity,
        Self::NbLayers,
        Self::Algorithm,
        Self::ParallelStrategy,
        Self::MaxThreads,
        Self::SplitOverconstrainedElements,
        Self::SmoothOffSlivers,
    ];

    /// The stable key of this field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::OptimizationLevel => "optimization_level",
            Self::ToMeshHoles => "to_mesh_holes",
            Self::MakeDomainGroups => "make_domain_groups",
            Self::ToAddNodes => "to_add_nodes",
            Self::InitialMemory => "initial_memory",
            Self::MaximumMemory => "maximum_memory",
            Self::KeepWorkingFiles => "keep_working_files",
            Self::VerboseLevel => "verbose_level",
            Self::WorkingDirectory => "working_directory",
            Self::LogInFile => "log_in_file",
            Self::RemoveLogOnSuccess => "remove_log_on_success",
            Self::NoInitialCentralPoint => "no_initial_central_point",
            Self::UseBoundaryRecoveryVersion => "use_boundary_recovery_version",
            Self::UseFemCorrection => "use_fem_correction",
            Self::Gradation => "gradation",
            Self::MinSize => "min_size",
            Self::MaxSize => "max_size",
            Self::UseVolumeProximity => "use_volume_proximity",
            Self::VolumeProximity => "volume_proximity",
            Self::NbLayers => "nb_layers",
            Self::Algorithm => "algorithm",
            Self::ParallelStrategy => "parallel_strategy",
            Self::MaxThreads => "max_threads",
            Self::SplitOverconstrainedElements => "split_overconstrained_elements",
            Self::SmoothOffSlivers => "smooth_off_slivers",
        }
    }

    /// The kind of value this field holds.
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::ToMeshHoles
            | Self::MakeDomainGroups
            | Self::ToAddNodes
            | Self::KeepWorkingFiles
            | Self::LogInFile
            | Self::RemoveLogOnSuccess
            | Self::NoInitialCentralPoint
            | Self::UseBoundaryRecoveryVersion
            | Self::UseFemCorrection
            | Self::UseVolumeProximity
            | Self::SplitOverconstrainedElements
            | Self::SmoothOffSlivers => ValueKind::Boolean,
            Self::InitialMemory
            | Self::MaximumMemory
            | Self::VerboseLevel
            | Self::NbLayers
            | Self::MaxThreads => ValueKind::Integer,
            Self::Gradation | Self::MinSize | Self::MaxSize | Self::VolumeProximity => {
                ValueKind::Float
            }
            Self::WorkingDirectory => ValueKind::Path,
            Self::OptimizationLevel => ValueKind::Choice(&[
                "none",
                "light",
                "medium",
                "standard_plus",
                "strong",
            ]),
            Self::Algorithm => ValueKind::Choice(&["mg_tetra", "mg_tetra_hpc"]),
            Self::ParallelStrategy => ValueKind::Choice(&[
                "none",
                "safe",
                "aggressive",
                "reproducible",
                "reproducible_given_max_threads",
            ]),
        }
    }

    /// Whether the field may be unset (meaning "let the engine decide").
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(
            self,
            Self::InitialMemory
                | Self::MaximumMemory
                | Self::MinSize
                | Self::MaxSize
                | Self::VolumeProximity
                | Self::MaxThreads
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        let key = match key.as_str() {
            // names used in the dialog
            "create_new_nodes" => "to_add_nodes",
            "volumic_gradation" => "gradation",
            "init_memory_size" => "initial_memory",
            "max_memory_size" => "maximum_memory",
            "algorithm_selection" => "algorithm",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Error returned when a key does not name a field.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown field '{0}'")]
pub struct UnknownField(pub String);

/// The shape of value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `true` / `false`.
    Boolean,
    /// A whole number.
    Integer,
    /// A real number.
    Float,
    /// A filesystem path.
    Path,
    /// One of a fixed set of names.
    Choice(&'static [&'static str]),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("number"),
            Self::Path => f.write_str("path"),
            Self::Choice(choices) => write!(f, "one of {}", choices.join(", ")),
        }
    }
}

/// A value for [`Field`] assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Clears an optional field.
    Unset,
    /// A boolean.
    Bool(bool),
    /// A whole number.
    Integer(i64),
    /// A real number.
    Float(f64),
    /// A path or free text.
    Text(String),
    /// An optimisation level.
    OptimizationLevel(OptimizationLevel),
    /// An algorithm variant.
    Algorithm(Algorithm),
    /// A parallel strategy.
    ParallelStrategy(ParallelStrategy),
}

impl Value {
    /// Parses user text into a value suitable for `field`.
    ///
    /// The words `unset`, `none` (for non-choice fields) and the empty string
    /// clear optional fields.
    ///
    /// # Errors
    ///
    /// Returns the reason the text cannot be read as the field's kind.
    pub fn parse(field: Field, text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        let names_none =
            trimmed.eq_ignore_ascii_case("none") && !matches!(field.kind(), ValueKind::Choice(_));
        let clears = trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unset") || names_none;
        if clears && field.is_optional() {
            return Ok(Self::Unset);
        }

        match field {
            Field::OptimizationLevel => trimmed
                .parse()
                .map(Self::OptimizationLevel)
                .map_err(|e| e.to_string()),
            Field::Algorithm => trimmed
                .parse()
                .map(Self::Algorithm)
                .map_err(|e| e.to_string()),
            Field::ParallelStrategy => trimmed
                .parse()
                .map(Self::ParallelStrategy)
                .map_err(|e| e.to_string()),
            _ => match field.kind() {
                ValueKind::Boolean => parse_bool(trimmed).map(Self::Bool),
                ValueKind::Integer => trimmed
                    .parse()
                    .map(Self::Integer)
                    .map_err(|e| format!("'{trimmed}' is not an integer: {e}")),
                ValueKind::Float => trimmed
                    .parse()
                    .map(Self::Float)
                    .map_err(|e| format!("'{trimmed}' is not a number: {e}")),
                ValueKind::Path | ValueKind::Choice(_) => Ok(Self::Text(trimmed.to_string())),
            },
        }
    }

    /// Short description of the value's type, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "number",
            Self::Text(_) => "text",
            Self::OptimizationLevel(_) => "optimization level",
            Self::Algorithm(_) => "algorithm",
            Self::ParallelStrategy(_) => "parallel strategy",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("unset"),
            Self::Bool(value) => value.fmt(f),
            Self::Integer(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
            Self::OptimizationLevel(value) => value.fmt(f),
            Self::Algorithm(value) => value.fmt(f),
            Self::ParallelStrategy(value) => value.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<OptimizationLevel> for Value {
    fn from(value: OptimizationLevel) -> Self {
        Self::OptimizationLevel(value)
    }
}

impl From<Algorithm> for Value {
    fn from(value: Algorithm) -> Self {
        Self::Algorithm(value)
    }
}

impl From<ParallelStrategy> for Value {
    fn from(value: ParallelStrategy) -> Self {
        Self::ParallelStrategy(value)
    }
}

fn parse_bool(text: &str) -> Result<bool, String> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(format!("'{text}' is not a boolean")),
    }
}

/// Outcome of a successful field assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    /// The value is stored and takes effect.
    Applied,
    /// The value is stored but has no effect with the current settings (for
    /// example a parallel strategy while the single-process engine is
    /// selected).
    Inert,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.key().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn dialog_names_are_accepted() {
        assert_eq!("create-new-nodes".parse::<Field>().unwrap(), Field::ToAddNodes);
        assert_eq!(
            "ALGORITHM_SELECTION".parse::<Field>().unwrap(),
            Field::Algorithm
        );
        assert_eq!(
            "shape".parse::<Field>().unwrap_err(),
            UnknownField("shape".to_string())
        );
    }

    #[test]
    fn parse_uses_field_kind() {
        assert_eq!(Value::parse(Field::KeepWorkingFiles, "yes"), Ok(Value::Bool(true)));
        assert_eq!(Value::parse(Field::VerboseLevel, "3"), Ok(Value::Integer(3)));
        assert_eq!(Value::parse(Field::MinSize, "0.25"), Ok(Value::Float(0.25)));
        assert_eq!(
            Value::parse(Field::ParallelStrategy, "aggressive"),
            Ok(Value::ParallelStrategy(ParallelStrategy::Aggressive))
        );
        assert!(Value::parse(Field::VerboseLevel, "loud").is_err());
    }

    #[test]
    fn none_clears_optional_fields_but_names_a_choice() {
        assert_eq!(Value::parse(Field::MaxSize, "none"), Ok(Value::Unset));
        assert_eq!(
            Value::parse(Field::OptimizationLevel, "none"),
            Ok(Value::OptimizationLevel(OptimizationLevel::None))
        );
        assert!(Value::parse(Field::VerboseLevel, "unset").is_err());
    }
}
