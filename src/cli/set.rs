use std::path::Path;

use tetrahyp::{Field, FieldStatus, Value};
use tracing::instrument;

use super::output::{self, Tone};

#[derive(Debug, clap::Parser)]
pub struct Set {
    /// The field to set (e.g. `max_size`, `parallel_strategy`)
    field: Field,

    /// The new value
    value: String,
}

impl Set {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        let value = Value::parse(self.field, &self.value)
            .map_err(|reason| anyhow::anyhow!("Invalid value for '{}': {reason}", self.field))?;
        apply(path, self.field, value)
    }
}

#[derive(Debug, clap::Parser)]
pub struct Unset {
    /// The optional field to clear
    field: Field,
}

impl Unset {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        if !self.field.is_optional() {
            anyhow::bail!(
                "'{}' always has a value; use 'tetra set' to change it",
                self.field
            );
        }
        apply(path, self.field, Value::Unset)
    }
}

fn apply(path: &Path, field: Field, value: Value) -> anyhow::Result<()> {
    let mut config = super::load(path)?;
    let status = config.set_field(field, value)?;
    super::save(&config, path)?;

    let current = config.get(field);
    output::changed(format_args!("{field} = {current}"));
    if status == FieldStatus::Inert {
        println!(
            "{}",
            Tone::Advice.paint(format_args!(
                "  {field} is stored but has no effect with the current settings"
            ))
        );
    }
    Ok(())
}
