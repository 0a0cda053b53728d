//! Whole-configuration checks.
//!
//! Mutators keep a configuration valid field by field; [`validate`] checks
//! what they cannot: relationships between fields, the working directory on
//! disk, and documents that were loaded without going through the mutators.

use std::{
    fmt,
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
};

use crate::domain::{
    HypothesisConfig,
    MAX_VERBOSE_LEVEL,
    enforced::{ConstraintKind, GroupDimension, Point, VertexSource},
    field::Field,
    options::ParallelStrategy,
    text_option::TextOptionError,
};

/// What a violation or advisory refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A single field.
    Field(Field),
    /// Several fields that are inconsistent with each other.
    Fields(Vec<Field>),
    /// An enforced vertex, by index.
    EnforcedVertex(usize),
    /// An enforced mesh, by index.
    EnforcedMesh(usize),
    /// A text option, by index.
    TextOption(usize),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Field(field) => field.fmt(f),
            Self::Fields(fields) => {
                let keys: Vec<_> = fields.iter().map(|field| field.key()).collect();
                f.write_str(&keys.join(", "))
            }
            Self::EnforcedVertex(index) => write!(f, "enforced vertex #{index}"),
            Self::EnforcedMesh(index) => write!(f, "enforced mesh #{index}"),
            Self::TextOption(index) => write!(f, "text option #{index}"),
        }
    }
}

/// Why a subject is invalid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViolationKind {
    /// The value lies outside the field's domain.
    #[error("{0}")]
    OutOfDomain(String),

    /// A lower bound exceeds its upper bound.
    #[error("{lower} ({lower_value}) exceeds {upper} ({upper_value})")]
    InvertedRange {
        /// Key of the lower bound.
        lower: &'static str,
        /// Value of the lower bound.
        lower_value: String,
        /// Key of the upper bound.
        upper: &'static str,
        /// Value of the upper bound.
        upper_value: String,
    },

    /// The working directory is missing or not writable.
    #[error("'{}' is not a writable directory: {reason}", path.display())]
    PermissionDenied {
        /// The probed directory.
        path: PathBuf,
        /// What the probe reported.
        reason: String,
    },

    /// The parallel strategy bounds concurrency but no thread count is set.
    #[error("the {0} strategy requires max_threads")]
    MissingThreadCount(ParallelStrategy),

    /// An enforced vertex has neither coordinates nor a geometry reference.
    #[error("no coordinates and no geometry reference")]
    MissingPosition,

    /// An enforced vertex has both coordinates and a geometry reference.
    #[error("both coordinates and a geometry reference")]
    AmbiguousPosition,

    /// An enforced vertex has a non-finite coordinate.
    #[error("coordinates {0} are not finite")]
    NonFiniteCoordinates(Point),

    /// An enforced vertex has a size that is not a positive number.
    #[error("size must be a positive number, got {0}")]
    InvalidSize(f64),

    /// An enforced entry repeats an earlier one.
    #[error("duplicates entry #{first}")]
    Duplicate {
        /// Index of the first occurrence.
        first: usize,
    },

    /// An enforced mesh's constraint kind does not fit its group.
    #[error("a {constraint} constraint cannot be drawn from a {dimension} group")]
    IncompatibleConstraint {
        /// The constraint kind.
        constraint: ConstraintKind,
        /// The group dimensionality.
        dimension: GroupDimension,
    },

    /// A text option is malformed.
    #[error(transparent)]
    InvalidTextOption(TextOptionError),

    /// A text option repeats the name of an earlier one.
    #[error("repeats the name of text option #{first}")]
    DuplicateTextOption {
        /// Index of the first occurrence.
        first: usize,
    },
}

/// A single invariant violation.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// What is invalid.
    pub subject: Subject,
    /// Why.
    pub kind: ViolationKind,
}

impl Violation {
    fn new(subject: Subject, kind: ViolationKind) -> Self {
        Self { subject, kind }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.kind)
    }
}

/// Checks that a directory can hold the engine's working files.
pub trait DirectoryProbe {
    /// Returns an error if `path` is not an existing, writable directory.
    ///
    /// # Errors
    ///
    /// Any I/O error describing why the directory is unusable.
    fn check_writable(&self, path: &Path) -> io::Result<()>;
}

/// Probes by creating and deleting a scratch file in the directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemProbe;

impl DirectoryProbe for FilesystemProbe {
    fn check_writable(&self, path: &Path) -> io::Result<()> {
        if !std::fs::metadata(path)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                "not a directory",
            ));
        }
        let probe = path.join(format!(".tetra-probe-{}", uuid::Uuid::new_v4()));
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&probe)?;
        std::fs::remove_file(&probe)
    }
}

/// Whether the mesh being generated is built on CAD geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshTarget {
    /// The mesh is built on a CAD shape.
    WithGeometry,
    /// The mesh is built from an existing boundary mesh only.
    WithoutGeometry,
}

/// A non-blocking remark about how the engine will treat a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    /// The entry the remark is about.
    pub subject: Subject,
    /// Human-readable remark.
    pub message: String,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

pub(crate) fn validate(config: &HypothesisConfig, probe: &impl DirectoryProbe) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_fields(config, probe, &mut violations);
    check_vertices(config, &mut violations);
    check_meshes(config, &mut violations);
    check_text_options(config, &mut violations);
    tracing::debug!(count = violations.len(), "validated hypothesis");
    violations
}

fn check_fields(
    config: &HypothesisConfig,
    probe: &impl DirectoryProbe,
    violations: &mut Vec<Violation>,
) {
    let mut report = |subject, kind| violations.push(Violation::new(subject, kind));

    if let (Some(initial), Some(maximum)) = (config.initial_memory, config.maximum_memory) {
        if initial > maximum {
            report(
                Subject::Fields(vec![Field::InitialMemory, Field::MaximumMemory]),
                ViolationKind::InvertedRange {
                    lower: Field::InitialMemory.key(),
                    lower_value: format!("{initial} MB"),
                    upper: Field::MaximumMemory.key(),
                    upper_value: format!("{maximum} MB"),
                },
            );
        }
    }

    if config.verbose_level > MAX_VERBOSE_LEVEL {
        report(
            Subject::Field(Field::VerboseLevel),
            ViolationKind::OutOfDomain(format!(
                "expected 0 to {MAX_VERBOSE_LEVEL}, got {}",
                config.verbose_level
            )),
        );
    }

    if let Err(error) = probe.check_writable(&config.working_directory) {
        report(
            Subject::Field(Field::WorkingDirectory),
            ViolationKind::PermissionDenied {
                path: config.working_directory.clone(),
                reason: error.to_string(),
            },
        );
    }

    for (field, value) in [
        (Field::Gradation, Some(config.gradation)),
        (Field::MinSize, config.min_size),
        (Field::MaxSize, config.max_size),
    ] {
        if let Some(value) = value.filter(|v| !is_positive(*v)) {
            report(
                Subject::Field(field),
                ViolationKind::OutOfDomain(format!("expected a positive number, got {value}")),
            );
        }
    }

    if let (Some(min), Some(max)) = (config.min_size, config.max_size) {
        if min > max {
            report(
                Subject::Fields(vec![Field::MinSize, Field::MaxSize]),
                ViolationKind::InvertedRange {
                    lower: Field::MinSize.key(),
                    lower_value: min.to_string(),
                    upper: Field::MaxSize.key(),
                    upper_value: max.to_string(),
                },
            );
        }
    }

    if let Some(distance) = config.volume_proximity.filter(|v| !is_positive(*v)) {
        report(
            Subject::Field(Field::VolumeProximity),
            ViolationKind::OutOfDomain(format!("expected a positive distance, got {distance}")),
        );
    }

    let strategy = config.parallel_strategy;
    if config.algorithm.supports_parallelism()
        && strategy.requires_thread_count()
        && config.max_threads.is_none()
    {
        report(
            Subject::Fields(vec![Field::ParallelStrategy, Field::MaxThreads]),
            ViolationKind::MissingThreadCount(strategy),
        );
    }
}

fn check_vertices(config: &HypothesisConfig, violations: &mut Vec<Violation>) {
    for (index, vertex) in config.enforced_vertices.iter().enumerate() {
        let mut report =
            |kind| violations.push(Violation::new(Subject::EnforcedVertex(index), kind));

        match vertex.source() {
            None if vertex.coordinates().is_none() => report(ViolationKind::MissingPosition),
            None => report(ViolationKind::AmbiguousPosition),
            Some(VertexSource::Coordinates(point)) if !point.is_finite() => {
                report(ViolationKind::NonFiniteCoordinates(point));
            }
            Some(_) => {}
        }
        if let Some(size) = vertex.size().filter(|s| !is_positive(*s)) {
            report(ViolationKind::InvalidSize(size));
        }
        if let Some(first) = config.enforced_vertices[..index]
            .iter()
            .position(|earlier| earlier.same_position(vertex) || earlier.id() == vertex.id())
        {
            report(ViolationKind::Duplicate { first });
        }
    }
}

fn check_meshes(config: &HypothesisConfig, violations: &mut Vec<Violation>) {
    for (index, mesh) in config.enforced_meshes.iter().enumerate() {
        let mut report = |kind| violations.push(Violation::new(Subject::EnforcedMesh(index), kind));

        if !mesh.is_compatible() {
            report(ViolationKind::IncompatibleConstraint {
                constraint: mesh.constraint(),
                dimension: mesh.group().dimension,
            });
        }
        if let Some(first) = config.enforced_meshes[..index]
            .iter()
            .position(|earlier| earlier.same_constraint(mesh) || earlier.id() == mesh.id())
        {
            report(ViolationKind::Duplicate { first });
        }
    }
}

fn check_text_options(config: &HypothesisConfig, violations: &mut Vec<Violation>) {
    for (index, option) in config.text_options.iter().enumerate() {
        let mut report = |kind| violations.push(Violation::new(Subject::TextOption(index), kind));

        if let Err(error) = option.check() {
            report(ViolationKind::InvalidTextOption(error));
        }
        if let Some(first) = config.text_options[..index]
            .iter()
            .position(|earlier| earlier.name() == option.name())
        {
            report(ViolationKind::DuplicateTextOption { first });
        }
    }
}

const fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

pub(crate) fn geometry_advisories(config: &HypothesisConfig, target: MeshTarget) -> Vec<Advisory> {
    if target == MeshTarget::WithoutGeometry {
        return Vec::new();
    }

    let vertices = config
        .enforced_vertices
        .iter()
        .enumerate()
        .map(|(index, vertex)| Advisory {
            subject: Subject::EnforcedVertex(index),
            message: format!(
                "'{}' is ignored when meshing on CAD geometry",
                vertex.describe()
            ),
        });
    let labels = config.enforced_mesh_labels();
    let meshes = labels.into_iter().enumerate().map(|(index, label)| Advisory {
        subject: Subject::EnforcedMesh(index),
        message: format!("'{label}' is ignored when meshing on CAD geometry"),
    });

    vertices.chain(meshes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        enforced::{EnforcedMesh, EnforcedVertex, GeometryRef, GroupRef},
        options::Algorithm,
        text_option::TextOption,
    };

    struct Writable;

    impl DirectoryProbe for Writable {
        fn check_writable(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_configuration_is_valid() {
        assert_eq!(HypothesisConfig::default().validate_with(&Writable), []);
    }

    #[test]
    fn inverted_sizes_give_one_violation_naming_both_fields() {
        let mut config = HypothesisConfig::default();
        config.set_field(Field::MinSize, 2.0).unwrap();
        config.set_field(Field::MaxSize, 1.0).unwrap();

        let violations = config.validate_with(&Writable);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].subject,
            Subject::Fields(vec![Field::MinSize, Field::MaxSize])
        );
        assert_eq!(
            violations[0].to_string(),
            "min_size, max_size: min_size (2) exceeds max_size (1)"
        );
    }

    #[test]
    fn inverted_memory_is_reported() {
        let mut config = HypothesisConfig::default();
        config.set_field(Field::InitialMemory, 4096_i64).unwrap();
        config.set_field(Field::MaximumMemory, 1024_i64).unwrap();

        let violations = config.validate_with(&Writable);
        assert_eq!(
            violations[0].subject,
            Subject::Fields(vec![Field::InitialMemory, Field::MaximumMemory])
        );
    }

    #[test]
    fn inert_parallel_settings_are_not_violations() {
        let mut config = HypothesisConfig::default();
        config
            .set_field(Field::ParallelStrategy, ParallelStrategy::Aggressive)
            .unwrap();
        assert_eq!(config.validate_with(&Writable), []);
    }

    #[test]
    fn hpc_strategy_bounding_concurrency_needs_threads() {
        let mut config = HypothesisConfig::for_algorithm(Algorithm::MgTetraHpc);
        config
            .set_field(Field::ParallelStrategy, ParallelStrategy::ReproducibleGivenMaxThreads)
            .unwrap();

        let violations = config.validate_with(&Writable);
        assert_eq!(
            violations,
            [Violation::new(
                Subject::Fields(vec![Field::ParallelStrategy, Field::MaxThreads]),
                ViolationKind::MissingThreadCount(ParallelStrategy::ReproducibleGivenMaxThreads),
            )]
        );

        config.set_field(Field::MaxThreads, 8_i64).unwrap();
        assert_eq!(config.validate_with(&Writable), []);
    }

    #[test]
    fn missing_working_directory_is_permission_denied() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = HypothesisConfig::default();
        config
            .set_field(
                Field::WorkingDirectory,
                crate::domain::field::Value::Text(
                    tmp.path().join("missing").display().to_string(),
                ),
            )
            .unwrap();

        let violations = config.validate();
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0].kind,
            ViolationKind::PermissionDenied { .. }
        ));
    }

    #[test]
    fn file_as_working_directory_is_permission_denied() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = HypothesisConfig::default();
        config.working_directory = file.path().to_path_buf();

        let violations = config.validate();
        assert!(matches!(
            violations.as_slice(),
            [Violation {
                subject: Subject::Field(Field::WorkingDirectory),
                kind: ViolationKind::PermissionDenied { .. },
            }]
        ));
    }

    #[test]
    fn filesystem_probe_leaves_directory_empty() {
        let tmp = tempfile::tempdir().unwrap();
        FilesystemProbe.check_writable(tmp.path()).unwrap();
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn loaded_records_are_checked_in_collection_order() {
        let mut config = HypothesisConfig::default();
        config.verbose_level = 12;

        let both: EnforcedVertex =
            toml::from_str("coordinates = [0.0, 0.0, 0.0]\ngeometry = \"0:1:1\"\n").unwrap();
        config.enforced_vertices = vec![
            EnforcedVertex::at(Point::new(1.0, 1.0, 1.0)),
            both,
            EnforcedVertex::at(Point::new(1.0, 1.0, 1.0)).with_size(-1.0),
        ];
        config.enforced_meshes = vec![EnforcedMesh::new(
            "curve",
            ConstraintKind::Face,
            GroupRef::new("0:1:2", GroupDimension::One),
        )];
        config.text_options = vec![
            TextOption::new("seed", "1", crate::domain::text_option::OptionType::Numeric)
                .unwrap(),
            TextOption::new("seed", "2", crate::domain::text_option::OptionType::Numeric)
                .unwrap(),
        ];

        let subjects: Vec<_> = config
            .validate_with(&Writable)
            .into_iter()
            .map(|v| v.subject)
            .collect();
        assert_eq!(
            subjects,
            [
                Subject::Field(Field::VerboseLevel),
                Subject::EnforcedVertex(1),
                Subject::EnforcedVertex(2),
                Subject::EnforcedVertex(2),
                Subject::EnforcedMesh(0),
                Subject::TextOption(1),
            ]
        );
    }

    #[test]
    fn malformed_loaded_text_option_is_reported() {
        let mut config = HypothesisConfig::default();
        config.text_options = vec![
            toml::from_str("name = \"seed\"\nvalue = \"many\"\ntype = \"numeric\"\n").unwrap(),
        ];

        let violations = config.validate_with(&Writable);
        assert_eq!(
            violations,
            [Violation::new(
                Subject::TextOption(0),
                ViolationKind::InvalidTextOption(TextOptionError::NotNumeric("many".to_string())),
            )]
        );

        let reported = violations.clone();
        assert_eq!(reported[0].to_string(), "text option #0: 'many' is not a number");
    }

    #[test]
    fn advisories_only_apply_to_geometry_targets() {
        let mut config = HypothesisConfig::default();
        config
            .add_enforced_vertex(EnforcedVertex::on_geometry(GeometryRef::new("0:1:1:3")))
            .unwrap();
        config
            .add_enforced_mesh(EnforcedMesh::new(
                "skin",
                ConstraintKind::Face,
                GroupRef::new("0:1:4", GroupDimension::Two),
            ))
            .unwrap();

        assert!(config.geometry_advisories(MeshTarget::WithoutGeometry).is_empty());

        let advisories = config.geometry_advisories(MeshTarget::WithGeometry);
        assert_eq!(advisories.len(), 2);
        assert_eq!(
            advisories[1].to_string(),
            "enforced mesh #0: 'skin' is ignored when meshing on CAD geometry"
        );
        assert_eq!(config.validate_with(&Writable), []);
    }
}
