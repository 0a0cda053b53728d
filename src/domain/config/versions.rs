//! The serialized layouts of a hypothesis document.
//!
//! The domain type converts to and from [`Versions`], so the persisted format
//! can evolve without touching [`HypothesisConfig`]. Documents are always
//! written in the latest layout.

use std::{num::NonZeroU32, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::{DEFAULT_GRADATION, HypothesisConfig, MAX_VERBOSE_LEVEL};
use crate::domain::{
    enforced::{EnforcedMesh, EnforcedVertex},
    options::{Algorithm, OptimizationLevel, ParallelStrategy},
    text_option::{self, TextOption},
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
pub(super) enum Versions {
    /// The first, single-engine layout.
    ///
    /// Memory sizes use -1 for "engine default", the optimisation level is a
    /// numeric code and engine options are one free-form string.
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        to_mesh_holes: bool,
        #[serde(default = "legacy_unset")]
        maximum_memory: i64,
        #[serde(default = "legacy_unset")]
        initial_memory: i64,
        #[serde(default = "legacy_optimization_level")]
        optimization_level: i64,
        #[serde(default = "super::default_working_directory")]
        working_directory: PathBuf,
        #[serde(default)]
        keep_files: bool,
        #[serde(default = "default_verbose_level")]
        verbose_level: u8,
        #[serde(default = "default_true")]
        to_create_new_nodes: bool,
        #[serde(default)]
        to_use_boundary_recovery_version: bool,
        #[serde(default)]
        fem_correction: bool,
        #[serde(default)]
        to_remove_central_point: bool,
        #[serde(default)]
        text_option: String,
        #[serde(default)]
        enforced_vertices: Vec<EnforcedVertex>,
    },

    #[serde(rename = "2")]
    V2 {
        #[serde(default)]
        optimization_level: OptimizationLevel,
        #[serde(default)]
        to_mesh_holes: bool,
        #[serde(default)]
        make_domain_groups: bool,
        #[serde(default = "default_true")]
        to_add_nodes: bool,

        /// Megabytes; absent or 0 lets the engine decide.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_memory: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum_memory: Option<u32>,

        #[serde(default)]
        keep_working_files: bool,
        #[serde(default = "default_verbose_level")]
        verbose_level: u8,
        #[serde(default = "super::default_working_directory")]
        working_directory: PathBuf,
        #[serde(default)]
        log_in_file: bool,
        #[serde(default)]
        remove_log_on_success: bool,
        #[serde(default)]
        no_initial_central_point: bool,
        #[serde(default)]
        use_boundary_recovery_version: bool,
        #[serde(default)]
        use_fem_correction: bool,
        #[serde(default = "default_gradation")]
        gradation: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_size: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_size: Option<f64>,
        #[serde(default)]
        use_volume_proximity: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume_proximity: Option<f64>,
        #[serde(default = "super::default_nb_layers")]
        nb_layers: u32,

        /// Absent in documents written before the HPC engine was supported.
        #[serde(default)]
        algorithm: Algorithm,
        #[serde(default)]
        parallel_strategy: ParallelStrategy,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_threads: Option<u32>,

        #[serde(default)]
        split_overconstrained_elements: bool,
        #[serde(default)]
        smooth_off_slivers: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        text_options: Vec<TextOption>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        enforced_vertices: Vec<EnforcedVertex>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        enforced_meshes: Vec<EnforcedMesh>,
    },
}

const fn legacy_unset() -> i64 {
    -1
}

const fn legacy_optimization_level() -> i64 {
    2
}

const fn default_verbose_level() -> u8 {
    MAX_VERBOSE_LEVEL
}

const fn default_true() -> bool {
    true
}

const fn default_gradation() -> f64 {
    DEFAULT_GRADATION
}

/// Non-positive legacy sizes mean "engine default".
fn legacy_megabytes(value: i64) -> Option<NonZeroU32> {
    u32::try_from(value).ok().and_then(NonZeroU32::new)
}

impl From<Versions> for HypothesisConfig {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                to_mesh_holes,
                maximum_memory,
                initial_memory,
                optimization_level,
                working_directory,
                keep_files,
                verbose_level,
                to_create_new_nodes,
                to_use_boundary_recovery_version,
                fem_correction,
                to_remove_central_point,
                text_option,
                enforced_vertices,
            } => {
                let optimization_level = OptimizationLevel::from_legacy_code(optimization_level)
                    .unwrap_or_else(|| {
                        tracing::debug!(
                            code = optimization_level,
                            "unknown legacy optimisation level, using default"
                        );
                        OptimizationLevel::default()
                    });
                Self {
                    optimization_level,
                    to_mesh_holes,
                    to_add_nodes: to_create_new_nodes,
                    initial_memory: legacy_megabytes(initial_memory),
                    maximum_memory: legacy_megabytes(maximum_memory),
                    keep_working_files: keep_files,
                    verbose_level,
                    working_directory,
                    no_initial_central_point: to_remove_central_point,
                    use_boundary_recovery_version: to_use_boundary_recovery_version,
                    use_fem_correction: fem_correction,
                    algorithm: Algorithm::MgTetra,
                    text_options: text_option::split_legacy_line(&text_option),
                    enforced_vertices,
                    ..Self::default()
                }
            }
            Versions::V2 {
                optimization_level,
                to_mesh_holes,
                make_domain_groups,
                to_add_nodes,
                initial_memory,
                maximum_memory,
                keep_working_files,
                verbose_level,
                working_directory,
                log_in_file,
                remove_log_on_success,
                no_initial_central_point,
                use_boundary_recovery_version,
                use_fem_correction,
                gradation,
                min_size,
                max_size,
                use_volume_proximity,
                volume_proximity,
                nb_layers,
                algorithm,
                parallel_strategy,
                max_threads,
                split_overconstrained_elements,
                smooth_off_slivers,
                text_options,
                enforced_vertices,
                enforced_meshes,
            } => Self {
                optimization_level,
                to_mesh_holes,
                make_domain_groups,
                to_add_nodes,
                initial_memory: initial_memory.and_then(NonZeroU32::new),
                maximum_memory: maximum_memory.and_then(NonZeroU32::new),
                keep_working_files,
                verbose_level,
                working_directory,
                log_in_file,
                remove_log_on_success,
                no_initial_central_point,
                use_boundary_recovery_version,
                use_fem_correction,
                gradation,
                min_size,
                max_size,
                use_volume_proximity,
                volume_proximity,
                nb_layers,
                algorithm,
                parallel_strategy,
                max_threads: max_threads.and_then(NonZeroU32::new),
                split_overconstrained_elements,
                smooth_off_slivers,
                text_options,
                enforced_vertices,
                enforced_meshes,
            },
        }
    }
}

impl From<HypothesisConfig> for Versions {
    fn from(config: HypothesisConfig) -> Self {
        Self::V2 {
            optimization_level: config.optimization_level,
            to_mesh_holes: config.to_mesh_holes,
            make_domain_groups: config.make_domain_groups,
            to_add_nodes: config.to_add_nodes,
            initial_memory: config.initial_memory.map(NonZeroU32::get),
            maximum_memory: config.maximum_memory.map(NonZeroU32::get),
            keep_working_files: config.keep_working_files,
            verbose_level: config.verbose_level,
            working_directory: config.working_directory,
            log_in_file: config.log_in_file,
            remove_log_on_success: config.remove_log_on_success,
            no_initial_central_point: config.no_initial_central_point,
            use_boundary_recovery_version: config.use_boundary_recovery_version,
            use_fem_correction: config.use_fem_correction,
            gradation: config.gradation,
            min_size: config.min_size,
            max_size: config.max_size,
            use_volume_proximity: config.use_volume_proximity,
            volume_proximity: config.volume_proximity,
            nb_layers: config.nb_layers,
            algorithm: config.algorithm,
            parallel_strategy: config.parallel_strategy,
            max_threads: config.max_threads.map(NonZeroU32::get),
            split_overconstrained_elements: config.split_overconstrained_elements,
            smooth_off_slivers: config.smooth_off_slivers,
            text_options: config.text_options,
            enforced_vertices: config.enforced_vertices,
            enforced_meshes: config.enforced_meshes,
        }
    }
}
