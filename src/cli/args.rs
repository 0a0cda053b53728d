use std::path::Path;

use serde_json::json;
use tetrahyp::ConfigError;
use tracing::instrument;

use super::output;

#[derive(Debug, clap::Parser)]
pub struct Args {
    /// Print the executable, arguments and fingerprint as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        let config = super::load(path)?;

        let arguments = match config.to_engine_arguments() {
            Ok(arguments) => arguments,
            Err(ConfigError::ValidationFailed(violations)) => {
                for violation in &violations {
                    output::violation_to_stderr(violation);
                }
                eprintln!("Run 'tetra validate' for details");
                std::process::exit(2);
            }
            Err(error) => return Err(error.into()),
        };

        if self.json {
            let execution = config.execution();
            let output = json!({
                "executable": arguments.executable(),
                "arguments": arguments.iter().collect::<Vec<_>>(),
                "fingerprint": arguments.fingerprint(),
                "working_files": execution.working_file_stem(&arguments),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{arguments}");
        }
        Ok(())
    }
}
