use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        enforced::{EnforcedMesh, EnforcedVertex, EntryId},
        error::ConfigError,
        field::{Field, FieldStatus, Value},
        options::{Algorithm, OptimizationLevel, ParallelStrategy, UnknownVariant},
        text_option::{OptionType, TextOption},
    },
    engine::{self, EngineArguments, ExecutionSettings},
    validation::{self, Advisory, DirectoryProbe, FilesystemProbe, MeshTarget, Violation},
};

mod versions;

use versions::Versions;

/// Largest accepted verbosity.
pub const MAX_VERBOSE_LEVEL: u8 = 10;

/// Default volumic gradation of the engine.
pub const DEFAULT_GRADATION: f64 = 1.05;

/// The parameter set of a tetrahedral meshing run.
///
/// A configuration is created with engine defaults, edited one field at a
/// time, validated as a whole and finally turned into engine arguments.
/// Mutators never leave it half-updated: they either apply the change or
/// return an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct HypothesisConfig {
    pub(crate) optimization_level: OptimizationLevel,
    pub(crate) to_mesh_holes: bool,
    pub(crate) make_domain_groups: bool,
    pub(crate) to_add_nodes: bool,
    pub(crate) initial_memory: Option<NonZeroU32>,
    pub(crate) maximum_memory: Option<NonZeroU32>,
    pub(crate) keep_working_files: bool,
    pub(crate) verbose_level: u8,
    pub(crate) working_directory: PathBuf,
    pub(crate) log_in_file: bool,
    pub(crate) remove_log_on_success: bool,
    pub(crate) no_initial_central_point: bool,
    pub(crate) use_boundary_recovery_version: bool,
    pub(crate) use_fem_correction: bool,
    pub(crate) gradation: f64,
    pub(crate) min_size: Option<f64>,
    pub(crate) max_size: Option<f64>,
    pub(crate) use_volume_proximity: bool,
    pub(crate) volume_proximity: Option<f64>,
    pub(crate) nb_layers: u32,
    pub(crate) algorithm: Algorithm,
    pub(crate) parallel_strategy: ParallelStrategy,
    pub(crate) max_threads: Option<NonZeroU32>,
    pub(crate) split_overconstrained_elements: bool,
    pub(crate) smooth_off_slivers: bool,
    pub(crate) text_options: Vec<TextOption>,
    pub(crate) enforced_vertices: Vec<EnforcedVertex>,
    pub(crate) enforced_meshes: Vec<EnforcedMesh>,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            optimization_level: OptimizationLevel::default(),
            to_mesh_holes: false,
            make_domain_groups: false,
            to_add_nodes: true,
            initial_memory: None,
            maximum_memory: None,
            keep_working_files: false,
            verbose_level: MAX_VERBOSE_LEVEL,
            working_directory: default_working_directory(),
            log_in_file: false,
            remove_log_on_success: false,
            no_initial_central_point: false,
            use_boundary_recovery_version: false,
            use_fem_correction: false,
            gradation: DEFAULT_GRADATION,
            min_size: None,
            max_size: None,
            use_volume_proximity: false,
            volume_proximity: None,
            nb_layers: default_nb_layers(),
            algorithm: Algorithm::default(),
            parallel_strategy: ParallelStrategy::default(),
            max_threads: None,
            split_overconstrained_elements: false,
            smooth_off_slivers: false,
            text_options: Vec::new(),
            enforced_vertices: Vec::new(),
            enforced_meshes: Vec::new(),
        }
    }
}

impl HypothesisConfig {
    /// A default configuration for the given engine variant.
    #[must_use]
    pub fn for_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Loads a configuration from a TOML document.
    ///
    /// Unknown keys are ignored and missing keys take their defaults, so
    /// documents written by older or newer versions load.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// hypothesis document.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(LoadError::Read)?;
        let config = toml::from_str(&content).map_err(LoadError::Parse)?;
        tracing::debug!(path = %path.display(), "loaded hypothesis");
        Ok(config)
    }

    /// Saves the configuration to a TOML document, in the current layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        let content = toml::to_string_pretty(self).map_err(SaveError::Serialize)?;
        std::fs::write(path, content).map_err(SaveError::Write)?;
        tracing::debug!(path = %path.display(), "saved hypothesis");
        Ok(())
    }

    /// Returns the current value of a field.
    #[must_use]
    pub fn get(&self, field: Field) -> Value {
        fn optional<T: Into<Value>>(value: Option<T>) -> Value {
            value.map_or(Value::Unset, Into::into)
        }
        let count = |n: Option<NonZeroU32>| optional(n.map(|n| i64::from(n.get())));

        match field {
            Field::OptimizationLevel => self.optimization_level.into(),
            Field::ToMeshHoles => self.to_mesh_holes.into(),
            Field::MakeDomainGroups => self.make_domain_groups.into(),
            Field::ToAddNodes => self.to_add_nodes.into(),
            Field::InitialMemory => count(self.initial_memory),
            Field::MaximumMemory => count(self.maximum_memory),
            Field::KeepWorkingFiles => self.keep_working_files.into(),
            Field::VerboseLevel => i64::from(self.verbose_level).into(),
            Field::WorkingDirectory => {
                Value::Text(self.working_directory.display().to_string())
            }
            Field::LogInFile => self.log_in_file.into(),
            Field::RemoveLogOnSuccess => self.remove_log_on_success.into(),
            Field::NoInitialCentralPoint => self.no_initial_central_point.into(),
            Field::UseBoundaryRecoveryVersion => self.use_boundary_recovery_version.into(),
            Field::UseFemCorrection => self.use_fem_correction.into(),
            Field::Gradation => self.gradation.into(),
            Field::MinSize => optional(self.min_size),
            Field::MaxSize => optional(self.max_size),
            Field::UseVolumeProximity => self.use_volume_proximity.into(),
            Field::VolumeProximity => optional(self.volume_proximity),
            Field::NbLayers => i64::from(self.nb_layers).into(),
            Field::Algorithm => self.algorithm.into(),
            Field::ParallelStrategy => self.parallel_strategy.into(),
            Field::MaxThreads => count(self.max_threads),
            Field::SplitOverconstrainedElements => self.split_overconstrained_elements.into(),
            Field::SmoothOffSlivers => self.smooth_off_slivers.into(),
        }
    }

    /// Sets a single field.
    ///
    /// Fields that do not apply under the current settings (the parallel
    /// fields with the single-process engine, the proximity distance while
    /// proximity is off) are stored and reported as [`FieldStatus::Inert`],
    /// so that switching the governing setting later brings them into
    /// effect.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the value has the wrong type
    /// or lies outside the field's domain. The configuration is unchanged in
    /// that case.
    pub fn set_field(
        &mut self,
        field: Field,
        value: impl Into<Value>,
    ) -> Result<FieldStatus, ConfigError> {
        let value = value.into();
        let key = field.key();

        match field {
            Field::OptimizationLevel => {
                self.optimization_level = match value {
                    Value::OptimizationLevel(level) => level,
                    Value::Text(text) => choice(field, &text)?,
                    other => return Err(mismatch(field, &other)),
                };
            }
            Field::Algorithm => {
                self.algorithm = match value {
                    Value::Algorithm(algorithm) => algorithm,
                    Value::Text(text) => choice(field, &text)?,
                    other => return Err(mismatch(field, &other)),
                };
            }
            Field::ParallelStrategy => {
                self.parallel_strategy = match value {
                    Value::ParallelStrategy(strategy) => strategy,
                    Value::Text(text) => choice(field, &text)?,
                    other => return Err(mismatch(field, &other)),
                };
            }
            Field::InitialMemory => self.initial_memory = memory(field, &value)?,
            Field::MaximumMemory => self.maximum_memory = memory(field, &value)?,
            Field::MaxThreads => {
                self.max_threads = match value {
                    Value::Unset => None,
                    Value::Integer(n) => Some(
                        u32::try_from(n)
                            .ok()
                            .and_then(NonZeroU32::new)
                            .ok_or_else(|| {
                                ConfigError::invalid(
                                    key,
                                    format!("expected a positive thread count, got {n}"),
                                )
                            })?,
                    ),
                    other => return Err(mismatch(field, &other)),
                };
            }
            Field::VerboseLevel => {
                self.verbose_level = match value {
                    Value::Integer(n) => u8::try_from(n)
                        .ok()
                        .filter(|n| *n <= MAX_VERBOSE_LEVEL)
                        .ok_or_else(|| {
                            ConfigError::invalid(
                                key,
                                format!("expected 0 to {MAX_VERBOSE_LEVEL}, got {n}"),
                            )
                        })?,
                    other => return Err(mismatch(field, &other)),
                };
            }
            Field::NbLayers => {
                self.nb_layers = match value {
                    Value::Integer(n) => u32::try_from(n).map_err(|_| {
                        ConfigError::invalid(key, format!("expected a non-negative count, got {n}"))
                    })?,
                    other => return Err(mismatch(field, &other)),
                };
            }
            Field::WorkingDirectory => {
                self.working_directory = match value {
                    Value::Text(text) if !text.trim().is_empty() => PathBuf::from(text.trim()),
                    Value::Text(_) => {
                        return Err(ConfigError::invalid(key, "the working directory is empty"));
                    }
                    other => return Err(mismatch(field, &other)),
                };
            }
            Field::Gradation => {
                self.gradation = positive(field, &value)?
                    .ok_or_else(|| mismatch(field, &Value::Unset))?;
            }
            Field::MinSize => self.min_size = positive(field, &value)?,
            Field::MaxSize => self.max_size = positive(field, &value)?,
            Field::VolumeProximity => self.volume_proximity = positive(field, &value)?,
            Field::ToMeshHoles
            | Field::MakeDomainGroups
            | Field::ToAddNodes
            | Field::KeepWorkingFiles
            | Field::LogInFile
            | Field::RemoveLogOnSuccess
            | Field::NoInitialCentralPoint
            | Field::UseBoundaryRecoveryVersion
            | Field::UseFemCorrection
            | Field::UseVolumeProximity
            | Field::SplitOverconstrainedElements
            | Field::SmoothOffSlivers => {
                let Value::Bool(flag) = value else {
                    return Err(mismatch(field, &value));
                };
                *self.flag_mut(field) = flag;
            }
        }

        let status = self.status_of(field);
        tracing::debug!(field = key, ?status, "field updated");
        Ok(status)
    }

    fn flag_mut(&mut self, field: Field) -> &mut bool {
        match field {
            Field::ToMeshHoles => &mut self.to_mesh_holes,
            Field::MakeDomainGroups => &mut self.make_domain_groups,
            Field::ToAddNodes => &mut self.to_add_nodes,
            Field::KeepWorkingFiles => &mut self.keep_working_files,
            Field::LogInFile => &mut self.log_in_file,
            Field::RemoveLogOnSuccess => &mut self.remove_log_on_success,
            Field::NoInitialCentralPoint => &mut self.no_initial_central_point,
            Field::UseBoundaryRecoveryVersion => &mut self.use_boundary_recovery_version,
            Field::UseFemCorrection => &mut self.use_fem_correction,
            Field::UseVolumeProximity => &mut self.use_volume_proximity,
            Field::SplitOverconstrainedElements => &mut self.split_overconstrained_elements,
            Field::SmoothOffSlivers => &mut self.smooth_off_slivers,
            other => unreachable!("{other} is not a boolean field"),
        }
    }

    /// Whether a field currently takes effect.
    #[must_use]
    pub fn status_of(&self, field: Field) -> FieldStatus {
        let inert = match field {
            Field::ParallelStrategy | Field::MaxThreads => !self.algorithm.supports_parallelism(),
            Field::VolumeProximity | Field::NbLayers => !self.use_volume_proximity,
            _ => false,
        };
        if inert {
            FieldStatus::Inert
        } else {
            FieldStatus::Applied
        }
    }

    /// Adds an enforced vertex and returns its identifier.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidValue`] if the vertex has no position source,
    ///   both sources, non-finite coordinates or a non-positive size.
    /// - [`ConfigError::DuplicateConstraint`] if a vertex with the same
    ///   coordinates or geometry reference exists.
    pub fn add_enforced_vertex(&mut self, vertex: EnforcedVertex) -> Result<EntryId, ConfigError> {
        match (vertex.coordinates(), vertex.geometry()) {
            (None, None) => {
                return Err(ConfigError::invalid(
                    "coordinates",
                    "an enforced vertex needs coordinates or a geometry reference",
                ));
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::invalid(
                    "coordinates",
                    "an enforced vertex takes its position from coordinates or from geometry, \
                     not both",
                ));
            }
            (Some(point), None) if !point.is_finite() => {
                return Err(ConfigError::invalid(
                    "coordinates",
                    format!("coordinates must be finite, got {point}"),
                ));
            }
            _ => {}
        }
        if let Some(size) = vertex.size() {
            check_positive("size", size)?;
        }
        if let Some(index) = self
            .enforced_vertices
            .iter()
            .position(|existing| existing.same_position(&vertex) || existing.id() == vertex.id())
        {
            return Err(ConfigError::DuplicateConstraint {
                collection: "vertex",
                index,
            });
        }

        let id = vertex.id();
        tracing::debug!(%id, vertex = %vertex.describe(), "enforced vertex added");
        self.enforced_vertices.push(vertex);
        Ok(id)
    }

    /// Removes an enforced vertex, preserving the order of the others.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEntry`] if no vertex has this id.
    pub fn remove_enforced_vertex(&mut self, id: EntryId) -> Result<EnforcedVertex, ConfigError> {
        let index = self
            .enforced_vertices
            .iter()
            .position(|vertex| vertex.id() == id)
            .ok_or(ConfigError::UnknownEntry(id))?;
        tracing::debug!(%id, "enforced vertex removed");
        Ok(self.enforced_vertices.remove(index))
    }

    /// Removes every enforced vertex.
    pub fn clear_enforced_vertices(&mut self) {
        self.enforced_vertices.clear();
    }

    /// Adds an enforced mesh and returns its identifier.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::IncompatibleConstraintKind`] if the group cannot
    ///   supply entities of the requested kind.
    /// - [`ConfigError::DuplicateConstraint`] if the same group is already
    ///   enforced with the same kind.
    pub fn add_enforced_mesh(&mut self, mesh: EnforcedMesh) -> Result<EntryId, ConfigError> {
        if !mesh.is_compatible() {
            return Err(ConfigError::IncompatibleConstraintKind {
                constraint: mesh.constraint(),
                dimension: mesh.group().dimension,
            });
        }
        if let Some(index) = self
            .enforced_meshes
            .iter()
            .position(|existing| existing.same_constraint(&mesh) || existing.id() == mesh.id())
        {
            return Err(ConfigError::DuplicateConstraint {
                collection: "mesh",
                index,
            });
        }

        let id = mesh.id();
        tracing::debug!(
            %id,
            name = mesh.name(),
            constraint = %mesh.constraint(),
            "enforced mesh added"
        );
        self.enforced_meshes.push(mesh);
        Ok(id)
    }

    /// Removes an enforced mesh, preserving the order of the others.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEntry`] if no mesh has this id.
    pub fn remove_enforced_mesh(&mut self, id: EntryId) -> Result<EnforcedMesh, ConfigError> {
        let index = self
            .enforced_meshes
            .iter()
            .position(|mesh| mesh.id() == id)
            .ok_or(ConfigError::UnknownEntry(id))?;
        tracing::debug!(%id, "enforced mesh removed");
        Ok(self.enforced_meshes.remove(index))
    }

    /// Removes every enforced mesh.
    pub fn clear_enforced_meshes(&mut self) {
        self.enforced_meshes.clear();
    }

    /// Sets a free-form option, replacing any option with the same name in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the name is not an identifier
    /// or the value does not match the declared type.
    pub fn set_text_option(
        &mut self,
        name: &str,
        value: &str,
        kind: OptionType,
    ) -> Result<(), ConfigError> {
        let option = TextOption::new(name, value, kind)
            .map_err(|e| ConfigError::invalid(format!("text option '{name}'"), e.to_string()))?;
        match self
            .text_options
            .iter_mut()
            .find(|existing| existing.name() == option.name())
        {
            Some(existing) => *existing = option,
            None => self.text_options.push(option),
        }
        Ok(())
    }

    /// Removes a free-form option.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`] if no option has this name.
    pub fn remove_text_option(&mut self, name: &str) -> Result<TextOption, ConfigError> {
        let normalised = name.trim().trim_start_matches('-');
        let index = self
            .text_options
            .iter()
            .position(|option| option.name() == normalised)
            .ok_or_else(|| ConfigError::UnknownOption(normalised.to_string()))?;
        Ok(self.text_options.remove(index))
    }

    /// Checks every invariant and returns all violations, in a stable order.
    ///
    /// The working directory is probed on the filesystem; a probe failure is
    /// reported as a violation.
    #[must_use]
    pub fn validate(&self) -> Vec<Violation> {
        self.validate_with(&FilesystemProbe)
    }

    /// Like [`validate`](Self::validate), with a caller supplied directory
    /// probe.
    #[must_use]
    pub fn validate_with(&self, probe: &impl DirectoryProbe) -> Vec<Violation> {
        validation::validate(self, probe)
    }

    /// Reports enforced entries that the engine will ignore for the given
    /// target mesh.
    #[must_use]
    pub fn geometry_advisories(&self, target: MeshTarget) -> Vec<Advisory> {
        validation::geometry_advisories(self, target)
    }

    /// Produces the engine arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationFailed`] with every violation if the
    /// configuration is not valid.
    pub fn to_engine_arguments(&self) -> Result<EngineArguments, ConfigError> {
        self.to_engine_arguments_with(&FilesystemProbe)
    }

    /// Like [`to_engine_arguments`](Self::to_engine_arguments), with a caller
    /// supplied directory probe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationFailed`] if validation reports any
    /// violation.
    pub fn to_engine_arguments_with(
        &self,
        probe: &impl DirectoryProbe,
    ) -> Result<EngineArguments, ConfigError> {
        let violations = self.validate_with(probe);
        if !violations.is_empty() {
            return Err(ConfigError::ValidationFailed(violations));
        }
        Ok(engine::arguments(self))
    }

    /// The execution-layer settings.
    #[must_use]
    pub fn execution(&self) -> ExecutionSettings<'_> {
        ExecutionSettings {
            working_directory: &self.working_directory,
            keep_working_files: self.keep_working_files,
            log_in_file: self.log_in_file,
            remove_log_on_success: self.remove_log_on_success,
            make_domain_groups: self.make_domain_groups,
        }
    }

    /// The selected engine variant.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The parallel strategy (only honoured by the HPC engine).
    #[must_use]
    pub const fn parallel_strategy(&self) -> ParallelStrategy {
        self.parallel_strategy
    }

    /// The working directory.
    #[must_use]
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Free-form options, in emission order.
    #[must_use]
    pub fn text_options(&self) -> &[TextOption] {
        &self.text_options
    }

    /// Enforced vertices, in display order.
    #[must_use]
    pub fn enforced_vertices(&self) -> &[EnforcedVertex] {
        &self.enforced_vertices
    }

    /// Enforced meshes, in display order.
    #[must_use]
    pub fn enforced_meshes(&self) -> &[EnforcedMesh] {
        &self.enforced_meshes
    }

    /// Display labels for the enforced meshes, parallel to
    /// [`enforced_meshes`](Self::enforced_meshes).
    ///
    /// Names are not unique; repeated names get a ` (n)` suffix from their
    /// second occurrence on, and empty names fall back to the group entry.
    #[must_use]
    pub fn enforced_mesh_labels(&self) -> Vec<String> {
        let mut seen: Vec<(&str, usize)> = Vec::new();
        self.enforced_meshes
            .iter()
            .map(|mesh| {
                let base = if mesh.name().is_empty() {
                    mesh.group().entry.as_str()
                } else {
                    mesh.name()
                };
                match seen.iter_mut().find(|(name, _)| *name == base) {
                    Some((_, count)) => {
                        *count += 1;
                        format!("{base} ({count})")
                    }
                    None => {
                        seen.push((base, 1));
                        base.to_string()
                    }
                }
            })
            .collect()
    }
}

fn mismatch(field: Field, value: &Value) -> ConfigError {
    ConfigError::invalid(
        field.key(),
        format!("expected {}, got {}", field.kind(), value.type_name()),
    )
}

fn choice<T: FromStr<Err = UnknownVariant>>(field: Field, text: &str) -> Result<T, ConfigError> {
    text.parse()
        .map_err(|e: UnknownVariant| ConfigError::invalid(field.key(), e.to_string()))
}

fn check_positive(key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(
            key,
            format!("expected a positive number, got {value}"),
        ))
    }
}

/// Reads a positive real. Integers are widened; `Unset` yields `None`.
fn positive(field: Field, value: &Value) -> Result<Option<f64>, ConfigError> {
    #[allow(clippy::cast_precision_loss)]
    let number = match value {
        Value::Unset if field.is_optional() => return Ok(None),
        Value::Float(x) => *x,
        Value::Integer(n) => *n as f64,
        other => return Err(mismatch(field, other)),
    };
    check_positive(field.key(), number).map(Some)
}

/// Reads a memory size in megabytes; zero means "let the engine decide".
fn memory(field: Field, value: &Value) -> Result<Option<NonZeroU32>, ConfigError> {
    match value {
        Value::Unset => Ok(None),
        Value::Integer(n) => u32::try_from(*n)
            .map(NonZeroU32::new)
            .map_err(|_| ConfigError::invalid(field.key(), format!("expected megabytes, got {n}"))),
        other => Err(mismatch(field, other)),
    }
}

fn default_working_directory() -> PathBuf {
    std::env::temp_dir()
}

const fn default_nb_layers() -> u32 {
    2
}

/// Error returned when a hypothesis document cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read hypothesis file: {0}")]
    Read(#[source] std::io::Error),

    /// The file is not a valid hypothesis document.
    #[error("failed to parse hypothesis file: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Error returned when a hypothesis document cannot be saved.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The configuration could not be serialized.
    #[error("failed to serialize hypothesis: {0}")]
    Serialize(#[source] toml::ser::Error),

    /// The file could not be written.
    #[error("failed to write hypothesis file: {0}")]
    Write(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::enforced::{
        ConstraintKind, GeometryRef, GroupDimension, GroupRef, Point,
    };

    #[test]
    fn defaults_follow_engine_defaults() {
        let config = HypothesisConfig::default();
        assert_eq!(
            config.get(Field::OptimizationLevel),
            Value::OptimizationLevel(OptimizationLevel::Medium)
        );
        assert_eq!(config.get(Field::VerboseLevel), Value::Integer(10));
        assert_eq!(config.get(Field::ToAddNodes), Value::Bool(true));
        assert_eq!(config.get(Field::ToMeshHoles), Value::Bool(false));
        assert_eq!(config.get(Field::Gradation), Value::Float(DEFAULT_GRADATION));
        assert_eq!(config.get(Field::MaximumMemory), Value::Unset);
        assert_eq!(config.algorithm(), Algorithm::MgTetra);
    }

    #[test]
    fn set_field_applies_in_domain_values() {
        let mut config = HypothesisConfig::default();
        assert_eq!(
            config.set_field(Field::VerboseLevel, 3_i64),
            Ok(FieldStatus::Applied)
        );
        assert_eq!(config.get(Field::VerboseLevel), Value::Integer(3));

        config.set_field(Field::MinSize, 2_i64).unwrap();
        assert_eq!(config.get(Field::MinSize), Value::Float(2.0));

        config
            .set_field(Field::OptimizationLevel, Value::Text("strong".to_string()))
            .unwrap();
        assert_eq!(
            config.get(Field::OptimizationLevel),
            Value::OptimizationLevel(OptimizationLevel::Strong)
        );
    }

    #[test]
    fn set_field_rejects_out_of_domain_values_without_mutation() {
        let mut config = HypothesisConfig::default();
        let before = config.clone();

        let error = config.set_field(Field::VerboseLevel, 11_i64).unwrap_err();
        assert_eq!(
            error,
            ConfigError::invalid("verbose_level", "expected 0 to 10, got 11")
        );
        assert!(config.set_field(Field::MinSize, -1.0).is_err());
        assert!(config.set_field(Field::Gradation, f64::NAN).is_err());
        assert!(config.set_field(Field::Gradation, Value::Unset).is_err());
        assert!(config.set_field(Field::MaxThreads, 0_i64).is_err());
        assert!(config.set_field(Field::NbLayers, -2_i64).is_err());
        assert!(config.set_field(Field::ToMeshHoles, 1_i64).is_err());
        assert!(
            config
                .set_field(Field::WorkingDirectory, Value::Text("  ".to_string()))
                .is_err()
        );

        assert_eq!(config, before);
    }

    #[test]
    fn memory_zero_means_engine_decides() {
        let mut config = HypothesisConfig::default();
        config.set_field(Field::MaximumMemory, 2048_i64).unwrap();
        assert_eq!(config.get(Field::MaximumMemory), Value::Integer(2048));
        config.set_field(Field::MaximumMemory, 0_i64).unwrap();
        assert_eq!(config.get(Field::MaximumMemory), Value::Unset);
        assert!(config.set_field(Field::InitialMemory, -5_i64).is_err());
    }

    #[test]
    fn parallel_fields_are_inert_for_single_process_engine() {
        let mut config = HypothesisConfig::default();
        assert_eq!(
            config.set_field(Field::ParallelStrategy, ParallelStrategy::Aggressive),
            Ok(FieldStatus::Inert)
        );
        assert_eq!(
            config.set_field(Field::MaxThreads, 8_i64),
            Ok(FieldStatus::Inert)
        );
        assert_eq!(config.parallel_strategy(), ParallelStrategy::Aggressive);

        config.set_field(Field::Algorithm, Algorithm::MgTetraHpc).unwrap();
        assert_eq!(config.status_of(Field::ParallelStrategy), FieldStatus::Applied);
        assert_eq!(config.status_of(Field::MaxThreads), FieldStatus::Applied);
    }

    #[test]
    fn volume_proximity_is_inert_until_enabled() {
        let mut config = HypothesisConfig::default();
        assert_eq!(
            config.set_field(Field::VolumeProximity, 0.5),
            Ok(FieldStatus::Inert)
        );
        config.set_field(Field::UseVolumeProximity, true).unwrap();
        assert_eq!(config.status_of(Field::VolumeProximity), FieldStatus::Applied);
    }

    #[test]
    fn add_then_remove_vertex_restores_collection() {
        let mut config = HypothesisConfig::default();
        let first = config
            .add_enforced_vertex(EnforcedVertex::at(Point::new(0.0, 0.0, 0.0)))
            .unwrap();
        let last = config
            .add_enforced_vertex(EnforcedVertex::on_geometry(GeometryRef::new("0:1:1:3")))
            .unwrap();
        let before = config.enforced_vertices().to_vec();

        let id = config
            .add_enforced_vertex(EnforcedVertex::at(Point::new(1.0, 0.0, 0.0)).with_size(0.2))
            .unwrap();
        config.remove_enforced_vertex(id).unwrap();

        assert_eq!(config.enforced_vertices(), before.as_slice());
        assert_eq!(config.enforced_vertices()[0].id(), first);
        assert_eq!(config.enforced_vertices()[1].id(), last);
    }

    #[test]
    fn removing_middle_vertex_keeps_order() {
        let mut config = HypothesisConfig::default();
        let ids: Vec<_> = (0..3)
            .map(|i| {
                config
                    .add_enforced_vertex(EnforcedVertex::at(Point::new(f64::from(i), 0.0, 0.0)))
                    .unwrap()
            })
            .collect();
        config.remove_enforced_vertex(ids[1]).unwrap();
        let remaining: Vec<_> = config.enforced_vertices().iter().map(EnforcedVertex::id).collect();
        assert_eq!(remaining, [ids[0], ids[2]]);
        assert_eq!(
            config.remove_enforced_vertex(ids[1]).unwrap_err(),
            ConfigError::UnknownEntry(ids[1])
        );
    }

    #[test]
    fn duplicate_vertex_is_rejected() {
        let mut config = HypothesisConfig::default();
        config
            .add_enforced_vertex(EnforcedVertex::at(Point::new(1.0, 2.0, 3.0)))
            .unwrap();
        let error = config
            .add_enforced_vertex(EnforcedVertex::at(Point::new(1.0, 2.0, 3.0)).with_size(1.0))
            .unwrap_err();
        assert_eq!(
            error,
            ConfigError::DuplicateConstraint {
                collection: "vertex",
                index: 0
            }
        );
        assert_eq!(config.enforced_vertices().len(), 1);
    }

    #[test]
    fn vertex_with_bad_size_is_rejected() {
        let mut config = HypothesisConfig::default();
        let error = config
            .add_enforced_vertex(EnforcedVertex::at(Point::new(0.0, 0.0, 0.0)).with_size(0.0))
            .unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue { ref key, .. } if key == "size"));
        assert!(config
            .add_enforced_vertex(EnforcedVertex::at(Point::new(f64::INFINITY, 0.0, 0.0)))
            .is_err());
        assert!(config.enforced_vertices().is_empty());
    }

    #[test]
    fn vertex_needs_exactly_one_position_source() {
        let mut config = HypothesisConfig::default();

        let unplaced: EnforcedVertex = toml::from_str("size = 1.0\n").unwrap();
        let error = config.add_enforced_vertex(unplaced).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue { ref key, .. } if key == "coordinates"));

        let both: EnforcedVertex =
            toml::from_str("coordinates = [0.0, 0.0, 0.0]\ngeometry = \"0:1:1:4\"\n").unwrap();
        let error = config.add_enforced_vertex(both).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue { ref key, .. } if key == "coordinates"));

        assert!(config.enforced_vertices().is_empty());
    }

    #[test]
    fn clearing_vertices_leaves_meshes() {
        let mut config = HypothesisConfig::default();
        for i in 0..3 {
            config
                .add_enforced_vertex(EnforcedVertex::at(Point::new(f64::from(i), 1.0, 1.0)))
                .unwrap();
        }
        config
            .add_enforced_mesh(EnforcedMesh::new(
                "skin",
                ConstraintKind::Node,
                GroupRef::new("0:1:6", GroupDimension::Two),
            ))
            .unwrap();

        config.clear_enforced_vertices();
        assert!(config.enforced_vertices().is_empty());
        assert_eq!(config.enforced_meshes().len(), 1);

        config.clear_enforced_meshes();
        assert!(config.enforced_meshes().is_empty());
    }

    #[test]
    fn removing_mesh_keeps_order_and_rejects_unknown_ids() {
        let mut config = HypothesisConfig::default();
        let ids: Vec<_> = ["0:1:1", "0:1:2", "0:1:3"]
            .into_iter()
            .map(|entry| {
                config
                    .add_enforced_mesh(EnforcedMesh::new(
                        entry,
                        ConstraintKind::Edge,
                        GroupRef::new(entry, GroupDimension::Two),
                    ))
                    .unwrap()
            })
            .collect();

        let removed = config.remove_enforced_mesh(ids[1]).unwrap();
        assert_eq!(removed.name(), "0:1:2");
        let remaining: Vec<_> = config.enforced_meshes().iter().map(EnforcedMesh::id).collect();
        assert_eq!(remaining, [ids[0], ids[2]]);

        assert_eq!(
            config.remove_enforced_mesh(ids[1]).unwrap_err(),
            ConfigError::UnknownEntry(ids[1])
        );
        assert_eq!(config.enforced_meshes().len(), 2);
    }

    #[test]
    fn face_constraint_on_edge_group_is_incompatible() {
        let mut config = HypothesisConfig::default();
        let mesh = EnforcedMesh::new(
            "wire",
            ConstraintKind::Face,
            GroupRef::new("0:1:2:7", GroupDimension::One),
        );
        assert_eq!(
            config.add_enforced_mesh(mesh).unwrap_err(),
            ConfigError::IncompatibleConstraintKind {
                constraint: ConstraintKind::Face,
                dimension: GroupDimension::One,
            }
        );
        assert!(config.enforced_meshes().is_empty());
    }

    #[test]
    fn same_group_may_be_enforced_with_different_kinds() {
        let mut config = HypothesisConfig::default();
        let group = GroupRef::new("0:1:2:8", GroupDimension::Two);
        config
            .add_enforced_mesh(EnforcedMesh::new("skin", ConstraintKind::Face, group.clone()))
            .unwrap();
        config
            .add_enforced_mesh(EnforcedMesh::new("skin", ConstraintKind::Edge, group.clone()))
            .unwrap();
        let error = config
            .add_enforced_mesh(EnforcedMesh::new("again", ConstraintKind::Face, group))
            .unwrap_err();
        assert_eq!(
            error,
            ConfigError::DuplicateConstraint {
                collection: "mesh",
                index: 0
            }
        );
    }

    #[test]
    fn mesh_labels_are_disambiguated() {
        let mut config = HypothesisConfig::default();
        let groups = [
            ("0:1:1", "skin"),
            ("0:1:2", "skin"),
            ("0:1:3", ""),
            ("0:1:4", "skin"),
        ];
        for (entry, name) in groups {
            config
                .add_enforced_mesh(EnforcedMesh::new(
                    name,
                    ConstraintKind::Node,
                    GroupRef::new(entry, GroupDimension::Two),
                ))
                .unwrap();
        }
        assert_eq!(
            config.enforced_mesh_labels(),
            ["skin", "skin (2)", "0:1:3", "skin (3)"]
        );
    }

    #[test]
    fn text_options_replace_in_place() {
        let mut config = HypothesisConfig::default();
        config.set_text_option("--alpha", "1", OptionType::Numeric).unwrap();
        config.set_text_option("beta", "x", OptionType::Text).unwrap();
        config.set_text_option("alpha", "2", OptionType::Numeric).unwrap();

        let names: Vec<_> = config
            .text_options()
            .iter()
            .map(|o| (o.name(), o.value()))
            .collect();
        assert_eq!(names, [("alpha", "2"), ("beta", "x")]);

        config.remove_text_option("-alpha").unwrap();
        assert_eq!(config.text_options().len(), 1);
        assert_eq!(
            config.remove_text_option("gamma").unwrap_err(),
            ConfigError::UnknownOption("gamma".to_string())
        );
    }

    #[test]
    fn save_then_load_preserves_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hypothesis.toml");

        let mut config = HypothesisConfig::for_algorithm(Algorithm::MgTetraHpc);
        config.set_field(Field::ParallelStrategy, ParallelStrategy::Safe).unwrap();
        config.set_field(Field::MaxSize, 4.0).unwrap();
        config
            .add_enforced_vertex(
                EnforcedVertex::at(Point::new(1.0, 2.0, 3.0))
                    .with_size(0.5)
                    .with_name("tip"),
            )
            .unwrap();
        config
            .add_enforced_mesh(
                EnforcedMesh::new(
                    "skin",
                    ConstraintKind::Face,
                    GroupRef::new("0:1:9", GroupDimension::Three),
                )
                .in_group("enforced_faces"),
            )
            .unwrap();
        config.set_text_option("seed", "7", OptionType::Numeric).unwrap();

        config.save(&path).unwrap();
        let loaded = HypothesisConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn entries_without_ids_can_be_removed_after_reloading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\n\n[[enforced_vertices]]\ncoordinates = [1.0, 2.0, 3.0]\n",
        )
        .unwrap();

        let listed = HypothesisConfig::load(file.path()).unwrap();
        let id = listed.enforced_vertices()[0].id();

        let mut reloaded = HypothesisConfig::load(file.path()).unwrap();
        assert_eq!(reloaded.enforced_vertices()[0].id(), id);
        reloaded.remove_enforced_vertex(id).unwrap();
        assert!(reloaded.enforced_vertices().is_empty());
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let error = HypothesisConfig::load(&tmp.path().join("missing.toml")).unwrap_err();
        assert!(matches!(error, LoadError::Read(_)));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"2\"\nverbose_level = \"loud\"\n")
            .unwrap();

        let error = HypothesisConfig::load(file.path()).unwrap_err();
        assert!(error.to_string().starts_with("failed to parse hypothesis file:"));
    }
}
