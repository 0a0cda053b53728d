//! Translation of a hypothesis into engine command-line arguments.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::{
    DEFAULT_GRADATION, HypothesisConfig,
    options::{Algorithm, ParallelStrategy},
};

/// A single `--key [value]` engine argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl Argument {
    fn flag(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
        }
    }

    fn with_value(key: &str, value: impl ToString) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value.to_string()),
        }
    }

    /// The argument key, without leading dashes.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The argument value; `None` for flags.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "--{}", self.key)?;
        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

/// The ordered argument set for one engine run.
///
/// Keys are unique. Modeled arguments come first in a fixed order, followed
/// by free-form options in the order they were defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineArguments {
    algorithm: Algorithm,
    arguments: Vec<Argument>,
    #[serde(skip)]
    fingerprint: String,
}

impl EngineArguments {
    /// The engine variant the arguments are meant for.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Name of the engine executable.
    #[must_use]
    pub const fn executable(&self) -> &'static str {
        self.algorithm.executable()
    }

    /// Iterates over the arguments in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.arguments.iter()
    }

    /// Looks up an argument by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Argument> {
        self.arguments.iter().find(|argument| argument.key == key)
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Whether no argument is emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// The arguments as separate command-line tokens, ready for a process
    /// builder.
    #[must_use]
    pub fn to_tokens(&self) -> Vec<String> {
        self.arguments
            .iter()
            .flat_map(|argument| {
                std::iter::once(format!("--{}", argument.key)).chain(argument.value.clone())
            })
            .collect()
    }

    /// SHA-256 digest of the command line and the enforced entries, as
    /// lowercase hex.
    ///
    /// Two hypotheses produce the same fingerprint exactly when they would
    /// run the engine identically. Entry ids and display names do not count.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.fingerprint.clone()
    }
}

impl<'a> IntoIterator for &'a EngineArguments {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for EngineArguments {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.executable())?;
        for argument in &self.arguments {
            write!(f, " {argument}")?;
        }
        Ok(())
    }
}

/// Settings consumed by whoever launches the engine.
///
/// None of them reaches the argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSettings<'a> {
    /// Where input, output and log files are written.
    pub working_directory: &'a Path,
    /// Keep the working files after the run.
    pub keep_working_files: bool,
    /// Write the engine log to a file instead of standard output.
    pub log_in_file: bool,
    /// Delete the log file when the run succeeds.
    pub remove_log_on_success: bool,
    /// Create one output group per generated domain.
    pub make_domain_groups: bool,
}

impl ExecutionSettings<'_> {
    /// Length of the fingerprint prefix used in file names.
    const FINGERPRINT_CHARS: usize = 16;

    /// Common prefix of the working files for one run.
    ///
    /// The name combines the current process id with the argument
    /// fingerprint, so concurrent runs of different hypotheses never collide.
    #[must_use]
    pub fn working_file_stem(&self, arguments: &EngineArguments) -> PathBuf {
        let fingerprint = arguments.fingerprint();
        let short = &fingerprint[..Self::FINGERPRINT_CHARS];
        self.working_directory
            .join(format!("MGTetra_{}_{short}", std::process::id()))
    }

    /// The engine log file for one run.
    #[must_use]
    pub fn log_file(&self, arguments: &EngineArguments) -> PathBuf {
        self.working_file_stem(arguments).with_extension("log")
    }

    /// Whether the log file is deleted after a run with the given outcome.
    #[must_use]
    pub const fn removes_log(&self, succeeded: bool) -> bool {
        !self.keep_working_files && self.log_in_file && self.remove_log_on_success && succeeded
    }
}

/// Builds the argument set of a configuration that is already validated.
pub(crate) fn arguments(config: &HypothesisConfig) -> EngineArguments {
    let mut modeled = Vec::new();

    if let Some(megabytes) = config.maximum_memory {
        modeled.push(Argument::with_value("max_memory", megabytes));
    }

    // boundary recovery runs its own memory, component and optimisation setup
    if !config.use_boundary_recovery_version {
        if let Some(megabytes) = config.initial_memory {
            modeled.push(Argument::with_value("automatic_memory", megabytes));
        }
        let components = if config.to_mesh_holes {
            "all"
        } else {
            "outside_components"
        };
        modeled.push(Argument::with_value("components", components));
        modeled.push(Argument::with_value(
            "optimisation_level",
            config.optimization_level.engine_value(),
        ));
    }

    if !config.to_add_nodes {
        modeled.push(Argument::flag("no_internal_points"));
    }
    modeled.push(Argument::with_value("verbose", config.verbose_level));
    if config.use_boundary_recovery_version {
        modeled.push(Argument::flag("boundary_recovery"));
    }
    if config.use_fem_correction {
        modeled.push(Argument::flag("fem_correction"));
    }
    if config.no_initial_central_point {
        modeled.push(Argument::flag("no_initial_central_point"));
    }

    if config.gradation != DEFAULT_GRADATION {
        modeled.push(Argument::with_value("gradation", config.gradation));
    }
    if let Some(size) = config.min_size {
        modeled.push(Argument::with_value("min_size", size));
    }
    if let Some(size) = config.max_size {
        modeled.push(Argument::with_value("max_size", size));
    }

    if config.use_volume_proximity {
        if let Some(distance) = config.volume_proximity {
            modeled.push(Argument::with_value("volume_proximity", distance));
        }
        modeled.push(Argument::with_value(
            "volume_proximity_layers",
            config.nb_layers,
        ));
    }

    if config.split_overconstrained_elements {
        modeled.push(Argument::flag("split_overconstrained_elements"));
    }
    if config.smooth_off_slivers {
        modeled.push(Argument::flag("smooth_off_slivers"));
    }

    if config.algorithm.supports_parallelism() && config.parallel_strategy != ParallelStrategy::None
    {
        modeled.push(Argument::with_value(
            "parallel_mode",
            config.parallel_strategy.engine_value(),
        ));
        if let Some(threads) = config.max_threads {
            modeled.push(Argument::with_value("max_number_of_threads", threads));
        }
    }

    let shadowed = |argument: &Argument| {
        config
            .text_options
            .iter()
            .any(|option| option.name() == argument.key)
    };
    modeled.retain(|argument| {
        let keep = !shadowed(argument);
        if !keep {
            tracing::debug!(key = %argument.key, "argument overridden by text option");
        }
        keep
    });

    let arguments = modeled
        .into_iter()
        .chain(
            config
                .text_options
                .iter()
                .map(|option| Argument::with_value(option.name(), option.value())),
        )
        .collect();

    let mut engine_arguments = EngineArguments {
        algorithm: config.algorithm,
        arguments,
        fingerprint: String::new(),
    };
    engine_arguments.fingerprint = fingerprint(&engine_arguments, config);
    engine_arguments
}

fn fingerprint(arguments: &EngineArguments, config: &HypothesisConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(arguments.to_string().as_bytes());
    for vertex in &config.enforced_vertices {
        hasher.update(b"\nvertex ");
        hasher.update(vertex.canonical().as_bytes());
    }
    for mesh in &config.enforced_meshes {
        hasher.update(b"\nmesh ");
        hasher.update(mesh.canonical().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
