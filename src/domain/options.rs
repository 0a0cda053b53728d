use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How aggressively the mesher optimises the generated tetrahedra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationLevel {
    /// No optimisation pass.
    None,
    /// A single cheap pass.
    Light,
    /// The engine's standard optimisation.
    #[default]
    Medium,
    /// Standard optimisation with extra sliver removal.
    StandardPlus,
    /// Exhaustive optimisation.
    Strong,
}

impl OptimizationLevel {
    /// All levels, weakest first.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Light,
        Self::Medium,
        Self::StandardPlus,
        Self::Strong,
    ];

    /// The spelling the engine expects for this level.
    #[must_use]
    pub const fn engine_value(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Light => "light",
            Self::Medium => "standard",
            Self::StandardPlus => "standard+",
            Self::Strong => "strong",
        }
    }

    /// Numeric code used by the legacy document layout (0 = none .. 4 =
    /// strong).
    #[must_use]
    pub fn from_legacy_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    const fn key(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Light => "light",
            Self::Medium => "medium",
            Self::StandardPlus => "standard_plus",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for OptimizationLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.key() == normalised || level.engine_value() == normalised)
            .ok_or_else(|| UnknownVariant::new(s, "optimization level"))
    }
}

/// The mesher variant that will run the hypothesis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// The single-process MG-Tetra engine.
    #[default]
    MgTetra,
    /// The distributed MG-Tetra HPC engine.
    MgTetraHpc,
}

impl Algorithm {
    /// Name of the engine executable for this variant.
    #[must_use]
    pub const fn executable(self) -> &'static str {
        match self {
            Self::MgTetra => "mg-tetra.exe",
            Self::MgTetraHpc => "mg-tetra_hpc.exe",
        }
    }

    /// Whether this variant honours a parallel strategy.
    #[must_use]
    pub const fn supports_parallelism(self) -> bool {
        matches!(self, Self::MgTetraHpc)
    }

    const fn key(self) -> &'static str {
        match self {
            Self::MgTetra => "mg_tetra",
            Self::MgTetraHpc => "mg_tetra_hpc",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mg_tetra" | "mgtetra" => Ok(Self::MgTetra),
            "mg_tetra_hpc" | "mgtetrahpc" | "hpc" => Ok(Self::MgTetraHpc),
            _ => Err(UnknownVariant::new(s, "algorithm")),
        }
    }
}

/// Threading mode of the HPC engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParallelStrategy {
    /// Sequential execution.
    #[default]
    None,
    /// Parallel, with conservative synchronisation.
    Safe,
    /// Parallel, maximising throughput.
    Aggressive,
    /// Parallel, output independent of the thread count.
    Reproducible,
    /// Parallel, output reproducible for a fixed maximum thread count.
    ReproducibleGivenMaxThreads,
}

impl ParallelStrategy {
    /// All strategies.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Safe,
        Self::Aggressive,
        Self::Reproducible,
        Self::ReproducibleGivenMaxThreads,
    ];

    /// Whether the strategy needs an explicit thread bound.
    #[must_use]
    pub const fn requires_thread_count(self) -> bool {
        matches!(self, Self::Aggressive | Self::ReproducibleGivenMaxThreads)
    }

    /// The spelling the engine expects for this strategy.
    #[must_use]
    pub const fn engine_value(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Safe => "safe",
            Self::Aggressive => "aggressive",
            Self::Reproducible => "reproducible",
            Self::ReproducibleGivenMaxThreads => "reproducible_given_max_number_of_threads",
        }
    }

    const fn key(self) -> &'static str {
        match self {
            Self::ReproducibleGivenMaxThreads => "reproducible_given_max_threads",
            other => other.engine_value(),
        }
    }
}

impl fmt::Display for ParallelStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ParallelStrategy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key() == normalised || strategy.engine_value() == normalised)
            .ok_or_else(|| UnknownVariant::new(s, "parallel strategy"))
    }
}

/// Error returned when a string does not name a variant of a closed
/// enumeration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("'{value}' is not a valid {what}")]
pub struct UnknownVariant {
    value: String,
    what: &'static str,
}

impl UnknownVariant {
    pub(crate) fn new(value: &str, what: &'static str) -> Self {
        Self {
            value: value.to_string(),
            what,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimization_level_accepts_engine_spelling() {
        assert_eq!(
            "standard+".parse::<OptimizationLevel>().unwrap(),
            OptimizationLevel::StandardPlus
        );
        assert_eq!(
            "standard".parse::<OptimizationLevel>().unwrap(),
            OptimizationLevel::Medium
        );
        assert_eq!(
            "Standard_Plus".parse::<OptimizationLevel>().unwrap(),
            OptimizationLevel::StandardPlus
        );
    }

    #[test]
    fn optimization_level_rejects_unknown() {
        let error = "maximal".parse::<OptimizationLevel>().unwrap_err();
        assert_eq!(error.to_string(), "'maximal' is not a valid optimization level");
    }

    #[test]
    fn legacy_codes_map_in_order() {
        assert_eq!(
            OptimizationLevel::from_legacy_code(0),
            Some(OptimizationLevel::None)
        );
        assert_eq!(
            OptimizationLevel::from_legacy_code(4),
            Some(OptimizationLevel::Strong)
        );
        assert_eq!(OptimizationLevel::from_legacy_code(5), None);
        assert_eq!(OptimizationLevel::from_legacy_code(-1), None);
    }

    #[test]
    fn only_bounded_strategies_need_threads() {
        let bounded: Vec<_> = ParallelStrategy::ALL
            .into_iter()
            .filter(|s| s.requires_thread_count())
            .collect();
        assert_eq!(
            bounded,
            [
                ParallelStrategy::Aggressive,
                ParallelStrategy::ReproducibleGivenMaxThreads
            ]
        );
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for strategy in ParallelStrategy::ALL {
            assert_eq!(strategy.to_string().parse::<ParallelStrategy>().unwrap(), strategy);
        }
        assert_eq!("hpc".parse::<Algorithm>().unwrap(), Algorithm::MgTetraHpc);
    }
}
