use std::path::Path;

use tetrahyp::domain::OptionType;
use tracing::instrument;

use super::output::{self, Tone};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: OptionCommand,
}

#[derive(Debug, clap::Parser)]
enum OptionCommand {
    /// Set an engine option the model does not cover
    ///
    /// An option with the same name as a modeled argument replaces it on the
    /// engine command line.
    Set {
        /// Option name, with or without leading dashes
        #[arg(allow_hyphen_values = true)]
        name: String,

        /// Option value
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Value type (text, numeric or boolean); inferred when omitted
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<OptionType>,
    },

    /// Remove a free-form option
    Remove {
        /// Option name
        #[arg(allow_hyphen_values = true)]
        name: String,
    },

    /// List free-form options in emission order
    List,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        let mut config = super::load(path)?;

        match self.command {
            OptionCommand::Set { name, value, kind } => {
                let kind = kind.unwrap_or_else(|| OptionType::infer(&value));
                config.set_text_option(&name, &value, kind)?;
                super::save(&config, path)?;
                output::changed(format_args!("Set {kind} option {name}"));
            }
            OptionCommand::Remove { name } => {
                let removed = config.remove_text_option(&name)?;
                super::save(&config, path)?;
                output::changed(format_args!("Removed option {}", removed.name()));
            }
            OptionCommand::List => {
                if config.text_options().is_empty() {
                    println!("No text options");
                }
                for option in config.text_options() {
                    println!(
                        "--{} {} {}",
                        option.name(),
                        option.value(),
                        Tone::Quiet.paint(format_args!("({})", option.kind()))
                    );
                }
            }
        }
        Ok(())
    }
}
