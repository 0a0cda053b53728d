use std::path::Path;

use clap::Parser;
use serde_json::json;
use tetrahyp::{Advisory, MeshTarget, Violation};
use tracing::instrument;

use super::output::{self, Tone};

#[derive(Debug, Parser)]
#[command(about = "Check every invariant of the hypothesis")]
pub struct Validate {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// The hypothesis will mesh a CAD shape; report enforced entries the
    /// engine will ignore
    #[arg(long)]
    with_geometry: bool,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        let config = super::load(path)?;

        let violations = config.validate();
        let target = if self.with_geometry {
            MeshTarget::WithGeometry
        } else {
            MeshTarget::WithoutGeometry
        };
        let advisories = config.geometry_advisories(target);

        match self.output {
            OutputFormat::Table => self.output_table(&violations, &advisories),
            OutputFormat::Json => output_json(&violations, &advisories)?,
            OutputFormat::Summary => {
                println!(
                    "violations={} advisories={}",
                    violations.len(),
                    advisories.len()
                );
            }
        }

        if !violations.is_empty() {
            std::process::exit(2);
        }
        Ok(())
    }

    fn output_table(&self, violations: &[Violation], advisories: &[Advisory]) {
        if self.quiet {
            return;
        }

        for violation in violations {
            output::violation(violation);
        }
        for advisory in advisories {
            output::advice(advisory);
        }

        if violations.is_empty() {
            println!("{}", Tone::Changed.paint("Hypothesis is valid (0 violations)"));
        } else {
            println!(
                "\n{}",
                Tone::Advice.paint(format_args!(
                    "Summary: {} violations found",
                    violations.len()
                ))
            );
        }
    }
}

fn output_json(violations: &[Violation], advisories: &[Advisory]) -> anyhow::Result<()> {
    let violations: Vec<_> = violations
        .iter()
        .map(|violation| {
            json!({
                "subject": violation.subject.to_string(),
                "message": violation.kind.to_string(),
            })
        })
        .collect();
    let advisories: Vec<_> = advisories
        .iter()
        .map(|advisory| {
            json!({
                "subject": advisory.subject.to_string(),
                "message": advisory.message,
            })
        })
        .collect();

    let output = json!({
        "status": if violations.is_empty() { "valid" } else { "invalid" },
        "violations": violations,
        "advisories": advisories,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
