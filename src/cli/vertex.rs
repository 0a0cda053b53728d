use std::path::Path;

use tetrahyp::domain::{EnforcedVertex, EntryId, GeometryRef, Point};
use tracing::instrument;

use super::output::{self, Tone};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: VertexCommand,
}

#[derive(Debug, clap::Parser)]
enum VertexCommand {
    /// Enforce a vertex at coordinates or on a CAD entity
    Add(Add),

    /// Remove an enforced vertex by id
    Remove {
        /// The vertex id, as shown by `tetra vertex list`
        id: EntryId,
    },

    /// List enforced vertices
    List,

    /// Remove every enforced vertex
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Debug, clap::Parser)]
struct Add {
    /// Coordinates as `x,y,z`
    #[arg(
        long,
        value_name = "X,Y,Z",
        allow_hyphen_values = true,
        required_unless_present = "geometry"
    )]
    at: Option<Point>,

    /// Entry of a CAD vertex or compound
    #[arg(long, value_name = "ENTRY", conflicts_with = "at")]
    geometry: Option<String>,

    /// Local element size at the vertex
    #[arg(long)]
    size: Option<f64>,

    /// Display name
    #[arg(long)]
    name: Option<String>,

    /// Output group receiving the created node
    #[arg(long)]
    group: Option<String>,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, path: &Path) -> anyhow::Result<()> {
        let mut config = super::load(path)?;

        match self.command {
            VertexCommand::Add(add) => {
                let id = config.add_enforced_vertex(add.into_vertex())?;
                super::save(&config, path)?;
                output::changed(format_args!("Added enforced vertex {id}"));
            }
            VertexCommand::Remove { id } => {
                let removed = config.remove_enforced_vertex(id)?;
                super::save(&config, path)?;
                output::changed(format_args!("Removed enforced vertex {}", removed.id()));
            }
            VertexCommand::List => list(config.enforced_vertices()),
            VertexCommand::Clear { yes } => {
                let count = config.enforced_vertices().len();
                if count == 0 {
                    println!("No enforced vertices");
                    return Ok(());
                }
                if !yes && !super::confirm(&format!("Remove all {count} enforced vertices?")) {
                    println!("Cancelled");
                    return Ok(());
                }
                config.clear_enforced_vertices();
                super::save(&config, path)?;
                output::changed(format_args!("Removed {count} enforced vertices"));
            }
        }
        Ok(())
    }
}

impl Add {
    fn into_vertex(self) -> EnforcedVertex {
        let mut vertex = match (self.at, self.geometry) {
            (Some(point), _) => EnforcedVertex::at(point),
            (None, Some(entry)) => EnforcedVertex::on_geometry(GeometryRef::new(entry)),
            (None, None) => unreachable!("clap requires --at or --geometry"),
        };
        if let Some(size) = self.size {
            vertex = vertex.with_size(size);
        }
        if let Some(name) = self.name {
            vertex = vertex.with_name(name);
        }
        if let Some(group) = self.group {
            vertex = vertex.in_group(group);
        }
        vertex
    }
}

fn list(vertices: &[EnforcedVertex]) {
    if vertices.is_empty() {
        println!("No enforced vertices");
        return;
    }

    let narrow = output::compact_layout();
    for (index, vertex) in vertices.iter().enumerate() {
        let position = match (vertex.coordinates(), vertex.geometry()) {
            (Some(point), _) => point.to_string(),
            (None, Some(geometry)) => format!("on {geometry}"),
            (None, None) => Tone::Broken.paint("no position"),
        };
        let size = vertex
            .size()
            .map_or_else(|| "default size".to_string(), |size| format!("size {size}"));

        if narrow {
            println!("#{index} {}", vertex.name().unwrap_or_default());
            println!("  {position}, {size}");
        } else {
            print!("#{index:<3} {position:<30} {size:<16}");
            if let Some(name) = vertex.name() {
                print!(" {name}");
            }
            if let Some(group) = vertex.group_name() {
                print!(" {}", Tone::Quiet.paint(format_args!("[{group}]")));
            }
            println!();
        }
        println!("     {}", Tone::Quiet.paint(vertex.id()));
    }
}
