//! Parameter model for the MG-Tetra tetrahedral volume mesher.
//!
//! A [`HypothesisConfig`] holds every option of a meshing run together with
//! enforced vertices, enforced meshes and free-form engine options. It is
//! edited field by field, validated as a whole and finally turned into an
//! ordered [`EngineArguments`] set for the engine executable.

pub mod domain;
pub use domain::{ConfigError, Field, FieldStatus, HypothesisConfig, Value};

pub mod engine;
pub use engine::{EngineArguments, ExecutionSettings};

pub mod validation;
pub use validation::{Advisory, DirectoryProbe, FilesystemProbe, MeshTarget, Violation};
