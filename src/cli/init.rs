use std::path::Path;

use tetrahyp::{HypothesisConfig, domain::Algorithm};
use tracing::instrument;

use super::output;

#[derive(Debug, clap::Parser)]
pub struct Init {
    /// Target the distributed MG-Tetra HPC engine
    #[arg(long)]
    hpc: bool,

    /// Overwrite an existing hypothesis
    #[arg(long)]
    force: bool,
}

impl Init {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        if path.exists() && !self.force {
            anyhow::bail!(
                "A hypothesis already exists at {} (use --force to overwrite)",
                path.display()
            );
        }

        let algorithm = if self.hpc {
            Algorithm::MgTetraHpc
        } else {
            Algorithm::MgTetra
        };
        let config = HypothesisConfig::for_algorithm(algorithm);
        super::save(&config, path)?;

        output::changed(format_args!(
            "Initialized {algorithm} hypothesis in {}",
            path.display()
        ));
        println!();
        println!("Next steps:");
        println!("  tetra set max_size 10");
        println!("  tetra validate");
        Ok(())
    }
}
