//! Enforced vertices and enforced meshes.
//!
//! Both kinds of record constrain the output mesh: an enforced vertex must
//! become a mesh node, and an enforced mesh contributes the nodes, edges or
//! faces of an existing group. The engine only honours them for meshes that
//! are not built on CAD geometry.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::options::UnknownVariant;

/// Stable identifier of an enforced vertex or enforced mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Name-based identifier for a record read without one, so the same
    /// document yields the same ids on every load.
    fn derived(collection: &str, canonical: &str) -> Self {
        let name = format!("{collection} {canonical}");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A point in model space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether every coordinate is finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Point {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point> for [f64; 3] {
    fn from(point: Point) -> Self {
        [point.x, point.y, point.z]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl FromStr for Point {
    type Err = String;

    /// Parses `x,y,z`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coords = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid coordinate '{}': {e}", part.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        match coords.as_slice() {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(format!("expected three coordinates 'x,y,z', got {}", coords.len())),
        }
    }
}

/// Opaque reference to a CAD entity, as handed out by the geometry kernel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometryRef(String);

impl GeometryRef {
    /// Wraps a kernel entry string.
    #[must_use]
    pub fn new(entry: impl Into<String>) -> Self {
        Self(entry.into())
    }

    /// The raw entry string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeometryRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an enforced vertex takes its position from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexSource<'a> {
    /// Coordinates authored directly.
    Coordinates(Point),
    /// Coordinates derived from a CAD vertex or compound.
    Geometry(&'a GeometryRef),
}

/// A point the mesher must include as a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VertexRecord")]
pub struct EnforcedVertex {
    id: EntryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    coordinates: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geometry: Option<GeometryRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_name: Option<String>,
}

/// An enforced vertex as stored, where the id may be absent.
#[derive(Deserialize)]
struct VertexRecord {
    #[serde(default)]
    id: Option<EntryId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    coordinates: Option<Point>,
    #[serde(default)]
    geometry: Option<GeometryRef>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    group_name: Option<String>,
}

impl From<VertexRecord> for EnforcedVertex {
    fn from(record: VertexRecord) -> Self {
        let mut vertex = Self {
            id: EntryId(Uuid::nil()),
            name: record.name,
            coordinates: record.coordinates,
            geometry: record.geometry,
            size: record.size,
            group_name: record.group_name,
        };
        vertex.id = record
            .id
            .unwrap_or_else(|| EntryId::derived("vertex", &vertex.canonical()));
        vertex
    }
}

impl EnforcedVertex {
    /// An enforced vertex at fixed coordinates.
    #[must_use]
    pub fn at(point: Point) -> Self {
        Self {
            id: EntryId::new(),
            name: None,
            coordinates: Some(point),
            geometry: None,
            size: None,
            group_name: None,
        }
    }

    /// An enforced vertex whose position comes from a CAD entity.
    #[must_use]
    pub fn on_geometry(geometry: GeometryRef) -> Self {
        Self {
            id: EntryId::new(),
            name: None,
            coordinates: None,
            geometry: Some(geometry),
            size: None,
            group_name: None,
        }
    }

    /// Sets the local target element size.
    #[must_use]
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Puts the created node into the named output group.
    #[must_use]
    pub fn in_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    /// The entry identifier.
    #[must_use]
    pub const fn id(&self) -> EntryId {
        self.id
    }

    /// The display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Directly authored coordinates, if any.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Point> {
        self.coordinates
    }

    /// The CAD reference, if any.
    #[must_use]
    pub const fn geometry(&self) -> Option<&GeometryRef> {
        self.geometry.as_ref()
    }

    /// Local target size at this vertex.
    #[must_use]
    pub const fn size(&self) -> Option<f64> {
        self.size
    }

    /// Output group of the created node.
    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    /// The authoritative position source.
    ///
    /// Returns `None` when the entry has no source or both sources, which
    /// only happens for entries read from a document.
    #[must_use]
    pub fn source(&self) -> Option<VertexSource<'_>> {
        match (&self.coordinates, &self.geometry) {
            (Some(point), None) => Some(VertexSource::Coordinates(*point)),
            (None, Some(geometry)) => Some(VertexSource::Geometry(geometry)),
            _ => None,
        }
    }

    /// Whether two entries designate the same position.
    ///
    /// Coordinates compare exactly; geometry references compare by entry.
    #[must_use]
    pub fn same_position(&self, other: &Self) -> bool {
        match (self.source(), other.source()) {
            (Some(VertexSource::Coordinates(a)), Some(VertexSource::Coordinates(b))) => a == b,
            (Some(VertexSource::Geometry(a)), Some(VertexSource::Geometry(b))) => a == b,
            _ => false,
        }
    }

    /// Everything the engine sees of this vertex, in a fixed textual form.
    pub(crate) fn canonical(&self) -> String {
        let position = match (&self.coordinates, &self.geometry) {
            (Some(point), None) => format!("at {} {} {}", point.x, point.y, point.z),
            (None, Some(geometry)) => format!("on {geometry}"),
            (coordinates, geometry) => format!("{coordinates:?} {geometry:?}"),
        };
        format!("{position} size={:?} group={:?}", self.size, self.group_name)
    }

    pub(crate) fn describe(&self) -> String {
        match (self.name(), self.source()) {
            (Some(name), _) => name.to_string(),
            (None, Some(VertexSource::Coordinates(point))) => point.to_string(),
            (None, Some(VertexSource::Geometry(geometry))) => geometry.to_string(),
            (None, None) => self.id.to_string(),
        }
    }
}

/// The entity granularity an enforced mesh contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Nodes of the group.
    Node,
    /// Edges of the group.
    Edge,
    /// Triangular faces of the group.
    Face,
}

impl ConstraintKind {
    /// Topological dimension of the enforced entities.
    #[must_use]
    pub const fn dimension(self) -> GroupDimension {
        match self {
            Self::Node => GroupDimension::Zero,
            Self::Edge => GroupDimension::One,
            Self::Face => GroupDimension::Two,
        }
    }

    /// Whether a group of the given dimension can supply entities of this
    /// kind.
    ///
    /// Higher dimensional groups are decomposed into their nodes, edges or
    /// faces; lower dimensional groups cannot provide them.
    #[must_use]
    pub fn accepts(self, dimension: GroupDimension) -> bool {
        dimension >= self.dimension()
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Node => "node",
            Self::Edge => "edge",
            Self::Face => "face",
        })
    }
}

impl FromStr for ConstraintKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "node" | "nodes" => Ok(Self::Node),
            "edge" | "edges" => Ok(Self::Edge),
            "face" | "faces" => Ok(Self::Face),
            _ => Err(UnknownVariant::new(s, "constraint kind")),
        }
    }
}

/// Topological dimension of a referenced group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GroupDimension {
    /// Points.
    Zero,
    /// Curves / edges.
    One,
    /// Surfaces / faces.
    Two,
    /// Volumes.
    Three,
}

impl TryFrom<u8> for GroupDimension {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(format!("group dimension must be between 0 and 3, got {other}")),
        }
    }
}

impl From<GroupDimension> for u8 {
    fn from(dimension: GroupDimension) -> Self {
        match dimension {
            GroupDimension::Zero => 0,
            GroupDimension::One => 1,
            GroupDimension::Two => 2,
            GroupDimension::Three => 3,
        }
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}D", u8::from(*self))
    }
}

/// A CAD or mesh group together with its dimensionality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupRef {
    /// Kernel entry of the group.
    pub entry: GeometryRef,
    /// Topological dimension of the group's elements.
    pub dimension: GroupDimension,
}

impl GroupRef {
    /// Creates a group reference.
    #[must_use]
    pub fn new(entry: impl Into<String>, dimension: GroupDimension) -> Self {
        Self {
            entry: GeometryRef::new(entry),
            dimension,
        }
    }
}

/// An existing group whose entities constrain the output mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MeshRecord")]
pub struct EnforcedMesh {
    id: EntryId,
    name: String,
    constraint: ConstraintKind,
    group: GroupRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_name: Option<String>,
}

/// An enforced mesh as stored, where the id may be absent.
#[derive(Deserialize)]
struct MeshRecord {
    #[serde(default)]
    id: Option<EntryId>,
    #[serde(default)]
    name: String,
    constraint: ConstraintKind,
    group: GroupRef,
    #[serde(default)]
    group_name: Option<String>,
}

impl From<MeshRecord> for EnforcedMesh {
    fn from(record: MeshRecord) -> Self {
        let mut mesh = Self {
            id: EntryId(Uuid::nil()),
            name: record.name,
            constraint: record.constraint,
            group: record.group,
            group_name: record.group_name,
        };
        mesh.id = record
            .id
            .unwrap_or_else(|| EntryId::derived("mesh", &mesh.canonical()));
        mesh
    }
}

impl EnforcedMesh {
    /// Creates an enforced mesh record.
    ///
    /// Compatibility between `constraint` and the group dimensionality is
    /// checked when the record is added to a configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, constraint: ConstraintKind, group: GroupRef) -> Self {
        Self {
            id: EntryId::new(),
            name: name.into(),
            constraint,
            group,
            group_name: None,
        }
    }

    /// Puts the enforced entities into the named output group.
    #[must_use]
    pub fn in_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    /// The entry identifier.
    #[must_use]
    pub const fn id(&self) -> EntryId {
        self.id
    }

    /// The display label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The enforced entity granularity.
    #[must_use]
    pub const fn constraint(&self) -> ConstraintKind {
        self.constraint
    }

    /// The referenced group.
    #[must_use]
    pub const fn group(&self) -> &GroupRef {
        &self.group
    }

    /// Output group of the enforced entities.
    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    /// Whether two records enforce the same entities.
    #[must_use]
    pub fn same_constraint(&self, other: &Self) -> bool {
        self.constraint == other.constraint && self.group.entry == other.group.entry
    }

    /// Everything the engine sees of this record, in a fixed textual form.
    pub(crate) fn canonical(&self) -> String {
        format!(
            "{} from {} ({}) group={:?}",
            self.constraint, self.group.entry, self.group.dimension, self.group_name
        )
    }

    /// Whether the constraint kind fits the group dimensionality.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.constraint.accepts(self.group.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_parses_comma_separated_triple() {
        let point: Point = " 1, -2.5,3e2 ".parse().unwrap();
        assert_eq!(point, Point::new(1.0, -2.5, 300.0));

        let error = "1,2".parse::<Point>().unwrap_err();
        assert_eq!(error, "expected three coordinates 'x,y,z', got 2");
        assert!("1,two,3".parse::<Point>().is_err());
    }

    #[test]
    fn vertex_source_is_exclusive() {
        let at = EnforcedVertex::at(Point::new(0.0, 0.0, 0.0));
        assert!(matches!(at.source(), Some(VertexSource::Coordinates(_))));

        let on = EnforcedVertex::on_geometry(GeometryRef::new("0:1:1:4"));
        assert!(matches!(on.source(), Some(VertexSource::Geometry(_))));

        let mut both = at.clone();
        both.geometry = Some(GeometryRef::new("0:1:1:4"));
        assert_eq!(both.source(), None);
    }

    #[test]
    fn same_position_ignores_size_and_name() {
        let a = EnforcedVertex::at(Point::new(1.0, 2.0, 3.0)).with_size(0.1);
        let b = EnforcedVertex::at(Point::new(1.0, 2.0, 3.0)).with_name("corner");
        let c = EnforcedVertex::at(Point::new(1.0, 2.0, 3.5));
        assert!(a.same_position(&b));
        assert!(!a.same_position(&c));

        let g1 = EnforcedVertex::on_geometry(GeometryRef::new("0:1:2"));
        let g2 = EnforcedVertex::on_geometry(GeometryRef::new("0:1:2")).with_size(3.0);
        assert!(g1.same_position(&g2));
        assert!(!g1.same_position(&a));
    }

    #[test]
    fn constraint_needs_group_of_at_least_its_dimension() {
        assert!(ConstraintKind::Node.accepts(GroupDimension::Zero));
        assert!(ConstraintKind::Node.accepts(GroupDimension::Three));
        assert!(ConstraintKind::Edge.accepts(GroupDimension::Two));
        assert!(!ConstraintKind::Edge.accepts(GroupDimension::Zero));
        assert!(ConstraintKind::Face.accepts(GroupDimension::Two));
        assert!(ConstraintKind::Face.accepts(GroupDimension::Three));
        assert!(!ConstraintKind::Face.accepts(GroupDimension::One));
    }

    #[test]
    fn group_dimension_rejects_out_of_range_values() {
        assert_eq!(GroupDimension::try_from(2), Ok(GroupDimension::Two));
        assert!(GroupDimension::try_from(4).is_err());
    }

    #[test]
    fn enforced_mesh_deserialises_without_id() {
        let mesh: EnforcedMesh = toml::from_str(
            "name = \"skin\"\nconstraint = \"face\"\n\
             group = { entry = \"0:1:5\", dimension = 2 }\n",
        )
        .unwrap();
        assert_eq!(mesh.name(), "skin");
        assert_eq!(mesh.constraint(), ConstraintKind::Face);
        assert_eq!(mesh.group().dimension, GroupDimension::Two);
        assert!(mesh.is_compatible());
    }

    #[test]
    fn records_without_id_get_the_same_id_on_every_read() {
        let document = "coordinates = [1.0, 2.0, 3.0]\nsize = 0.5\n";
        let first: EnforcedVertex = toml::from_str(document).unwrap();
        let second: EnforcedVertex = toml::from_str(document).unwrap();
        assert_eq!(first.id(), second.id());

        let elsewhere: EnforcedVertex = toml::from_str("coordinates = [1.0, 2.0, 4.0]\n").unwrap();
        assert_ne!(first.id(), elsewhere.id());

        let mesh = "constraint = \"edge\"\ngroup = { entry = \"0:1:5\", dimension = 2 }\n";
        let a: EnforcedMesh = toml::from_str(mesh).unwrap();
        let b: EnforcedMesh = toml::from_str(mesh).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn stored_id_is_kept() {
        let id = EntryId::new();
        let vertex: EnforcedVertex =
            toml::from_str(&format!("id = \"{id}\"\ngeometry = \"0:1:1:4\"\n")).unwrap();
        assert_eq!(vertex.id(), id);
    }
}
