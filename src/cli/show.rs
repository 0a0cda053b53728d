use std::path::Path;

use tetrahyp::{Field, FieldStatus, HypothesisConfig};
use tracing::instrument;

use super::output::{self, Tone};

#[derive(Debug, Default, clap::Parser)]
#[command(about = "Display every field of the hypothesis")]
pub struct Show {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Toml,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        let config = super::load(path)?;

        match self.output {
            OutputFormat::Pretty => output_pretty(&config),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            OutputFormat::Toml => print!("{}", toml::to_string_pretty(&config)?),
        }
        Ok(())
    }
}

fn output_pretty(config: &HypothesisConfig) {
    let narrow = output::compact_layout();
    let width = Field::ALL
        .iter()
        .map(|field| field.key().len())
        .max()
        .unwrap_or_default();

    println!("{}", Tone::Quiet.paint("Fields"));
    for field in Field::ALL {
        let value = config.get(field).to_string();
        let value = if config.status_of(field) == FieldStatus::Inert {
            format!("{value} {}", Tone::Quiet.paint("(inert)"))
        } else {
            value
        };
        if narrow {
            println!("  {field}");
            println!("    {value}");
        } else {
            println!("  {:<width$}  {value}", field.key());
        }
    }

    println!();
    println!("{}", Tone::Quiet.paint("Enforcement"));
    println!("  Vertices:     {}", config.enforced_vertices().len());
    println!("  Meshes:       {}", config.enforced_meshes().len());
    println!("  Text options: {}", config.text_options().len());
}
