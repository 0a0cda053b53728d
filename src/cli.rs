use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ArgAction;
use tetrahyp::HypothesisConfig;
use tracing::instrument;

mod args;
mod init;
mod mesh;
mod option;
mod set;
mod show;
mod output;
mod validate;
mod vertex;

use args::Args;
use init::Init;
use set::{Set, Unset};
use show::Show;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The hypothesis document to operate on
    #[arg(short, long, default_value = "hypothesis.toml", global = true)]
    file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Show(Show::default()))
            .run(&self.file)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show the hypothesis (default)
    Show(Show),

    /// Write a new hypothesis with engine defaults
    Init(Init),

    /// Set a single field
    ///
    /// Fields that have no effect with the current settings are stored and
    /// reported as inert.
    Set(Set),

    /// Clear an optional field, letting the engine decide
    Unset(Unset),

    /// Manage enforced vertices
    Vertex(vertex::Command),

    /// Manage enforced meshes
    Mesh(mesh::Command),

    /// Manage free-form engine options
    Option(option::Command),

    /// Check the hypothesis as a whole
    Validate(Validate),

    /// Print the engine command line
    Args(Args),
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    fn run(self, path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Show(command) => command.run(path)?,
            Self::Init(command) => command.run(path)?,
            Self::Set(command) => command.run(path)?,
            Self::Unset(command) => command.run(path)?,
            Self::Vertex(command) => command.run(path)?,
            Self::Mesh(command) => command.run(path)?,
            Self::Option(command) => command.run(path)?,
            Self::Validate(command) => command.run(path)?,
            Self::Args(command) => command.run(path)?,
        }
        Ok(())
    }
}

/// Loads the hypothesis at `path`, pointing at `init` when there is none.
fn load(path: &Path) -> anyhow::Result<HypothesisConfig> {
    if !path.exists() {
        anyhow::bail!(
            "No hypothesis found at {}. Run 'tetra init' first or pass --file",
            path.display()
        );
    }
    HypothesisConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn save(config: &HypothesisConfig, path: &Path) -> anyhow::Result<()> {
    config
        .save(path)
        .with_context(|| format!("Failed to save {}", path.display()))
}

/// Asks for confirmation, treating a failed prompt as "no".
fn confirm(prompt: &str) -> bool {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}
