//! Command line front end for editing and checking MG-Tetra hypotheses.

use clap::Parser;

mod cli;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
