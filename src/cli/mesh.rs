use std::path::Path;

use tetrahyp::{
    HypothesisConfig,
    domain::{ConstraintKind, EnforcedMesh, EntryId, GroupDimension, GroupRef},
};
use tracing::instrument;

use super::output::{self, Tone};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: MeshCommand,
}

#[derive(Debug, clap::Parser)]
enum MeshCommand {
    /// Enforce the nodes, edges or faces of an existing group
    Add(Add),

    /// Remove an enforced mesh by id
    Remove {
        /// The mesh id, as shown by `tetra mesh list`
        id: EntryId,
    },

    /// List enforced meshes
    List,

    /// Remove every enforced mesh
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Debug, clap::Parser)]
struct Add {
    /// Entry of the source group
    #[arg(long, value_name = "ENTRY")]
    group: String,

    /// Topological dimension of the group (0 to 3)
    #[arg(long, value_parser = parse_dimension)]
    dimension: GroupDimension,

    /// Which entities of the group to enforce (node, edge or face)
    #[arg(long)]
    constraint: ConstraintKind,

    /// Display name
    #[arg(long, default_value = "")]
    name: String,

    /// Output group receiving the enforced entities
    #[arg(long)]
    group_name: Option<String>,
}

fn parse_dimension(s: &str) -> Result<GroupDimension, String> {
    let value: u8 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid dimension '{s}': {e}"))?;
    GroupDimension::try_from(value)
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        let mut config = super::load(path)?;

        match self.command {
            MeshCommand::Add(add) => {
                let mut mesh = EnforcedMesh::new(
                    add.name,
                    add.constraint,
                    GroupRef::new(add.group, add.dimension),
                );
                if let Some(group_name) = add.group_name {
                    mesh = mesh.in_group(group_name);
                }
                let id = config.add_enforced_mesh(mesh)?;
                super::save(&config, path)?;
                output::changed(format_args!("Added enforced mesh {id}"));
            }
            MeshCommand::Remove { id } => {
                let removed = config.remove_enforced_mesh(id)?;
                super::save(&config, path)?;
                output::changed(format_args!("Removed enforced mesh {}", removed.id()));
            }
            MeshCommand::List => list(&config),
            MeshCommand::Clear { yes } => {
                let count = config.enforced_meshes().len();
                if count == 0 {
                    println!("No enforced meshes");
                    return Ok(());
                }
                if !yes && !super::confirm(&format!("Remove all {count} enforced meshes?")) {
                    println!("Cancelled");
                    return Ok(());
                }
                config.clear_enforced_meshes();
                super::save(&config, path)?;
                output::changed(format_args!("Removed {count} enforced meshes"));
            }
        }
        Ok(())
    }
}

fn list(config: &HypothesisConfig) {
    let meshes = config.enforced_meshes();
    if meshes.is_empty() {
        println!("No enforced meshes");
        return;
    }

    let narrow = output::compact_layout();
    let labels = config.enforced_mesh_labels();
    for (index, (mesh, label)) in meshes.iter().zip(&labels).enumerate() {
        let group = mesh.group();
        let source = format!("{}s of {} ({})", mesh.constraint(), group.entry, group.dimension);
        let source = if mesh.is_compatible() {
            source
        } else {
            Tone::Broken.paint(source)
        };

        if narrow {
            println!("#{index} {label}");
            println!("  {source}");
        } else {
            print!("#{index:<3} {label:<20} {source}");
            if let Some(group_name) = mesh.group_name() {
                print!(" {}", Tone::Quiet.paint(format_args!("[{group_name}]")));
            }
            println!();
        }
        println!("     {}", Tone::Quiet.paint(mesh.id()));
    }
}
