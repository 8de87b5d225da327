//! Core annotation data model for wayfinding journeys.
//!
//! A project is a set of floors, each with a floor-plan background. Nodes
//! are point or polygon annotations placed on one floor; corridors are
//! polylines that connect nodes and may span floors. Journey edges and the
//! path sequence are *derived* from nodes and corridors by the editor store
//! and are never authored directly, except for the decision metadata that
//! the edge form attaches to an edge id.
//!
//! Every type here serializes to the `AnnotationData` JSON document
//! (version 3.0). Missing fields default rather than fail, so older or
//! partially-filled exports still load.

use crate::id::ElementId;
use crate::segment::generate_segments;
use chrono::{DateTime, Utc};
use kurbo::Point;
use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Version string written into `metadata.version`.
pub const DOCUMENT_VERSION: &str = "3.0";

/// Unknown form fields carried through export/import untouched.
pub type ExtraFields = BTreeMap<String, serde_json::Value>;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

// ─── Positions ───────────────────────────────────────────────────────────

/// A point in plan-pixel space of the floor it lives on.
///
/// `floor` is the floor index the point belongs to. It is written as `z`
/// in the JSON document for compatibility; any 3D height is derived from
/// it by [`crate::geometry::plan_to_world`] and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(
        rename = "z",
        alias = "floorIndex",
        default,
        deserialize_with = "deserialize_floor",
        skip_serializing_if = "Option::is_none"
    )]
    pub floor: Option<i32>,
}

/// Accept `z` written as either an integer or a float (`1` or `1.0`).
fn deserialize_floor<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.map(|z| z.round() as i32))
}

impl Position {
    /// A position with no floor assigned yet.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, floor: None }
    }

    pub const fn on_floor(x: f64, y: f64, floor: i32) -> Self {
        Self {
            x,
            y,
            floor: Some(floor),
        }
    }

    /// Floor index, treating a missing floor as ground level (0).
    pub fn floor_or_ground(&self) -> i32 {
        self.floor.unwrap_or(0)
    }

    pub fn with_floor(self, floor: i32) -> Self {
        Self {
            floor: Some(floor),
            ..self
        }
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn distance(&self, other: &Position) -> f64 {
        self.to_point().distance(other.to_point())
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The fixed enumeration of node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    EntranceExit,
    DecisionPoint,
    DecisionZone,
    VerticalConnection,
    ActivityDestination,
    /// Form-configuration tag shared with corridors; never placed as a node.
    ConnectingSegment,
}

impl NodeType {
    /// Prefix used by `generate_id` for this type.
    pub fn id_prefix(self) -> &'static str {
        match self {
            NodeType::EntranceExit => "E",
            NodeType::DecisionPoint => "DP",
            NodeType::DecisionZone => "DZ",
            NodeType::VerticalConnection => "VC",
            NodeType::ActivityDestination => "AD",
            NodeType::ConnectingSegment => "C",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeType::EntranceExit => "Entrance/Exit",
            NodeType::DecisionPoint => "Decision Point",
            NodeType::DecisionZone => "Decision Zone",
            NodeType::VerticalConnection => "Vertical Connection",
            NodeType::ActivityDestination => "Activity Destination",
            NodeType::ConnectingSegment => "Connecting Segment",
        }
    }

    /// Whether decision-point specific annotation applies.
    pub fn is_decision(self) -> bool {
        matches!(self, NodeType::DecisionPoint | NodeType::DecisionZone)
    }
}

/// Drawn shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    #[default]
    Point,
    Polygon,
}

/// How much the design team relies on a space for the intended journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignImportance {
    Critical,
    Important,
    #[default]
    Neutral,
    Minor,
}

/// What the space is and how much it matters to the design.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceAnnotation {
    pub label: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_importance: Option<DesignImportance>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// How people are expected to behave in the space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorExpectation {
    pub expected_behavior: String,
    pub cues: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Extra payload for decision points and zones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionAnnotation {
    pub options: Vec<String>,
    pub preferred_option: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A point- or polygon-shaped annotation on one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: ElementId,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    #[serde(default)]
    pub shape: NodeShape,

    /// Anchor point. For polygon nodes, the polygon centroid at creation.
    #[serde(default)]
    pub position: Position,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Position>>,

    #[serde(rename = "floorIndex", default)]
    pub floor_index: i32,

    #[serde(default)]
    pub space_annotation: SpaceAnnotation,

    #[serde(default)]
    pub behavior_expectation: BehaviorExpectation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_annotation: Option<DecisionAnnotation>,
}

impl Node {
    pub fn new(id: ElementId, node_type: NodeType, position: Position) -> Self {
        Self {
            id,
            node_type,
            shape: NodeShape::Point,
            position,
            polygon: None,
            floor_index: position.floor_or_ground(),
            space_annotation: SpaceAnnotation::default(),
            behavior_expectation: BehaviorExpectation::default(),
            decision_annotation: node_type.is_decision().then(DecisionAnnotation::default),
        }
    }

    /// A polygon node anchored at the centroid of `polygon`.
    pub fn zone(id: ElementId, node_type: NodeType, polygon: Vec<Position>) -> Self {
        let floor = polygon.first().and_then(|p| p.floor);
        let c = crate::geometry::centroid(polygon.iter().map(Position::to_point));
        let mut node = Self::new(id, node_type, Position { x: c.x, y: c.y, floor });
        node.shape = NodeShape::Polygon;
        node.polygon = Some(polygon);
        node
    }

    /// Point used for hit testing and corridor snapping.
    pub fn centroid(&self) -> Point {
        match &self.polygon {
            Some(poly) if !poly.is_empty() => {
                crate::geometry::centroid(poly.iter().map(Position::to_point))
            }
            _ => self.position.to_point(),
        }
    }

    /// Stamp `floor` onto the anchor and every polygon vertex.
    pub fn stamp_floor(&mut self, floor: i32) {
        self.position.floor = Some(floor);
        if let Some(poly) = &mut self.polygon {
            for p in poly.iter_mut() {
                p.floor = Some(floor);
            }
        }
    }
}

// ─── Corridors ───────────────────────────────────────────────────────────

/// One straight sub-span of a corridor between two consecutive vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start: Position,
    pub end: Position,
    pub start_floor: i32,
    pub end_floor: i32,
    pub is_cross_floor: bool,
}

impl Segment {
    pub fn touches_floor(&self, floor: i32) -> bool {
        self.start_floor == floor || self.end_floor == floor
    }
}

/// A polyline connecting path, optionally anchored to two nodes.
///
/// `segments`, `is_cross_floor`, `from_floor` and `to_floor` are derived
/// from `path`. Anything that changes `path` must call [`Corridor::rederive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub id: ElementId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ElementId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<ElementId>,

    pub path: Vec<Position>,

    #[serde(default)]
    pub segments: SmallVec<[Segment; 4]>,

    #[serde(rename = "floorIndex", default)]
    pub floor_index: i32,

    #[serde(rename = "fromFloor", default, skip_serializing_if = "Option::is_none")]
    pub from_floor: Option<i32>,

    #[serde(rename = "toFloor", default, skip_serializing_if = "Option::is_none")]
    pub to_floor: Option<i32>,

    #[serde(rename = "isCrossFloor", default)]
    pub is_cross_floor: bool,

    #[serde(default)]
    pub space_annotation: SpaceAnnotation,

    #[serde(default)]
    pub behavior_expectation: BehaviorExpectation,
}

impl Corridor {
    pub fn new(id: ElementId, path: Vec<Position>) -> Self {
        let mut corridor = Self {
            id,
            from: None,
            to: None,
            floor_index: path.first().map_or(0, Position::floor_or_ground),
            path,
            segments: SmallVec::new(),
            from_floor: None,
            to_floor: None,
            is_cross_floor: false,
            space_annotation: SpaceAnnotation::default(),
            behavior_expectation: BehaviorExpectation::default(),
        };
        corridor.rederive();
        corridor
    }

    pub fn between(mut self, from: ElementId, to: ElementId) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Recompute segments and the cross-floor fields from `path`.
    pub fn rederive(&mut self) {
        self.segments = generate_segments(&self.path);
        self.is_cross_floor = self.segments.iter().any(|s| s.is_cross_floor);
        if self.is_cross_floor {
            let floors = self.path.iter().map(Position::floor_or_ground);
            self.from_floor = floors.clone().min();
            self.to_floor = floors.max();
        } else {
            self.from_floor = None;
            self.to_floor = None;
        }
    }

    /// Whether any segment has an endpoint on `floor`.
    pub fn touches_floor(&self, floor: i32) -> bool {
        self.segments.iter().any(|s| s.touches_floor(floor))
    }

    /// Whether the corridor is anchored to `floor` in any way.
    pub fn references_floor(&self, floor: i32) -> bool {
        self.floor_index == floor
            || self.from_floor == Some(floor)
            || self.to_floor == Some(floor)
            || self.path.iter().any(|p| p.floor == Some(floor))
    }

    pub fn references_node(&self, id: ElementId) -> bool {
        self.from == Some(id) || self.to == Some(id)
    }
}

// ─── Journey edges & sequence ────────────────────────────────────────────

/// Decision metadata entered on the edge form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionProperties {
    pub choice_type: String,
    pub alternatives: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Design intent entered on the edge form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignIntent {
    pub intended_choice: String,
    pub rationale: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A derived link between two consecutive path-sequence items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: ElementId,
    pub from: ElementId,
    pub to: ElementId,
    #[serde(default)]
    pub decision_properties: DecisionProperties,
    #[serde(default)]
    pub design_intent: DesignIntent,
}

impl Edge {
    pub fn between(from: ElementId, to: ElementId) -> Self {
        Self {
            id: ElementId::edge_between(from, to),
            from,
            to,
            decision_properties: DecisionProperties::default(),
            design_intent: DesignIntent::default(),
        }
    }
}

/// Whether an id names a node or a corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Corridor,
}

/// One entry in the linear visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSequenceItem {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub order: usize,
}

// ─── Floors & project metadata ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

/// A building level with its floor-plan background and view transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Unique, not necessarily contiguous. Doubles as the floor key of
    /// every position on this floor.
    pub index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default = "unit_scale")]
    pub scale: f64,
    #[serde(default)]
    pub pan: Pan,
}

fn unit_scale() -> f64 {
    1.0
}

impl Floor {
    pub fn new(index: i32, name: impl Into<String>) -> Self {
        Self {
            id: format!("floor-{index}"),
            name: name.into(),
            index,
            background_image: None,
            scale: 1.0,
            pan: Pan::default(),
        }
    }

    /// A copy with the background left out.
    pub fn without_background(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            index: self.index,
            background_image: None,
            scale: self.scale,
            pan: self.pan,
        }
    }
}

/// Identification fields that name the export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectIdentification {
    pub building_id: String,
    pub architect_id: String,
    pub route_id: String,
}

impl ProjectIdentification {
    pub fn new(
        building_id: impl Into<String>,
        architect_id: impl Into<String>,
        route_id: impl Into<String>,
    ) -> Self {
        Self {
            building_id: building_id.into(),
            architect_id: architect_id.into(),
            route_id: route_id.into(),
        }
    }

    /// All three fields are non-blank.
    pub fn is_complete(&self) -> bool {
        [&self.building_id, &self.architect_id, &self.route_id]
            .iter()
            .all(|f| !f.trim().is_empty())
    }
}

/// The team's closing reflection on the designed journey (1–5 ratings).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyReflection {
    pub confidence: u8,
    pub adherence_expectation: u8,
    pub team_alignment: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub version: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for Metadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: DOCUMENT_VERSION.to_string(),
            created: now,
            modified: now,
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The exported/imported project document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub corridors: Vec<Corridor>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(rename = "pathSequence", default)]
    pub path_sequence: Vec<PathSequenceItem>,
    #[serde(default)]
    pub floors: Vec<Floor>,
    #[serde(rename = "projectId", default)]
    pub project_id: ProjectIdentification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journey_reflection: Option<JourneyReflection>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl AnnotationData {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
