//! The annotation graph store.
//!
//! `AnnotationStore` is the single owner of a session's nodes, corridors,
//! floors and the derived journey state. UI layers hold one store per open
//! project and go through its named operations for every change; queries
//! hand out shared references only.
//!
//! Every operation that changes nodes, corridors or the path sequence ends
//! by rebuilding the journey order and regenerating journey edges, so
//! edges never name an id that is no longer in the store. Operations that
//! address a missing id or vertex return an [`EditError`] and leave the
//! store untouched.

use crate::config::EditorConfig;
use crate::dims::{DimensionState, FloorDimensions};
use crate::hit::{Hit, hit_test};
use crate::history::{History, Snapshot};
use crate::sequencer::{self, SequenceReport, densify};
use crate::tools::{DrawingBuffer, ModalKind, ModalState, ToolKind, snap_to_nearest};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::fmt;
use wayfind_core::geometry::{self, ImageDimensions, WorldPoint};
use wayfind_core::id::ElementId;
use wayfind_core::lint::{LintDiagnostic, lint_document};
use wayfind_core::model::*;
use wayfind_core::segment::validate_corridor_path;
use wayfind_core::{Point, export};

// ─── Errors ──────────────────────────────────────────────────────────────

/// Why a store operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    NodeNotFound(ElementId),
    CorridorNotFound(ElementId),
    EdgeNotFound(ElementId),
    FloorNotFound(String),
    FloorIndexNotFound(i32),
    DuplicateId(ElementId),
    DuplicateFloorId(String),
    DuplicateFloorIndex(i32),
    UnsupportedNodeType(NodeType),
    VertexOutOfRange {
        corridor: ElementId,
        index: usize,
        len: usize,
    },
    InvalidCorridor(Vec<String>),
    NothingToFinish,
    Import(String),
    Export(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node `{id}` not found"),
            Self::CorridorNotFound(id) => write!(f, "corridor `{id}` not found"),
            Self::EdgeNotFound(id) => write!(f, "edge `{id}` not found"),
            Self::FloorNotFound(id) => write!(f, "floor `{id}` not found"),
            Self::FloorIndexNotFound(index) => write!(f, "no floor with index {index}"),
            Self::DuplicateId(id) => write!(f, "id `{id}` is already in use"),
            Self::DuplicateFloorId(id) => write!(f, "floor id `{id}` is already in use"),
            Self::DuplicateFloorIndex(index) => write!(f, "floor index {index} is already in use"),
            Self::UnsupportedNodeType(t) => {
                write!(f, "{} cannot be placed as a node", t.label())
            }
            Self::VertexOutOfRange {
                corridor,
                index,
                len,
            } => write!(
                f,
                "vertex {index} is out of range for corridor `{corridor}` with {len} points"
            ),
            Self::InvalidCorridor(reasons) => write!(f, "invalid corridor: {}", reasons.join(" ")),
            Self::NothingToFinish => write!(f, "not enough points drawn"),
            Self::Import(msg) => write!(f, "could not load project: {msg}"),
            Self::Export(msg) => write!(f, "could not export project: {msg}"),
        }
    }
}

impl std::error::Error for EditError {}

// ─── Patches ─────────────────────────────────────────────────────────────

/// Fields to merge into a node. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub node_type: Option<NodeType>,
    pub shape: Option<NodeShape>,
    pub position: Option<Position>,
    pub polygon: Option<Vec<Position>>,
    pub floor_index: Option<i32>,
    pub space_annotation: Option<SpaceAnnotation>,
    pub behavior_expectation: Option<BehaviorExpectation>,
    pub decision_annotation: Option<DecisionAnnotation>,
}

/// Fields to merge into a corridor. Endpoints use `Some(None)` to detach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorridorPatch {
    pub from: Option<Option<ElementId>>,
    pub to: Option<Option<ElementId>>,
    pub path: Option<Vec<Position>>,
    pub floor_index: Option<i32>,
    pub space_annotation: Option<SpaceAnnotation>,
    pub behavior_expectation: Option<BehaviorExpectation>,
}

/// Decision-edge form fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePatch {
    pub decision_properties: Option<DecisionProperties>,
    pub design_intent: Option<DesignIntent>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloorPatch {
    pub name: Option<String>,
    pub background_image: Option<Option<String>>,
    pub scale: Option<f64>,
    pub pan: Option<Pan>,
}

// ─── Store ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct AnnotationStore {
    config: EditorConfig,
    nodes: Vec<Node>,
    corridors: Vec<Corridor>,
    edges: Vec<Edge>,
    path_sequence: Vec<PathSequenceItem>,
    floors: Vec<Floor>,
    project_id: ProjectIdentification,
    journey_reflection: Option<JourneyReflection>,
    created: DateTime<Utc>,
    current_floor: i32,
    tool: ToolKind,
    drawing: DrawingBuffer,
    modal: ModalState,
    dimensions: FloorDimensions,
    history: History,
    report: SequenceReport,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            corridors: Vec::new(),
            edges: Vec::new(),
            path_sequence: Vec::new(),
            floors: Vec::new(),
            project_id: ProjectIdentification::default(),
            journey_reflection: None,
            created: Utc::now(),
            current_floor: 0,
            tool: ToolKind::default(),
            drawing: DrawingBuffer::default(),
            modal: ModalState::default(),
            dimensions: FloorDimensions::default(),
            history: History::new(config.history_depth),
            report: SequenceReport::default(),
        }
    }

    /// Start a new, empty project. Configuration is kept.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config);
        log::debug!("store reset");
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn corridors(&self) -> &[Corridor] {
        &self.corridors
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn path_sequence(&self) -> &[PathSequenceItem] {
        &self.path_sequence
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    pub fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn corridor(&self, id: ElementId) -> Option<&Corridor> {
        self.corridors.iter().find(|c| c.id == id)
    }

    pub fn edge(&self, id: ElementId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn floor(&self, index: i32) -> Option<&Floor> {
        self.floors.iter().find(|f| f.index == index)
    }

    pub fn current_floor(&self) -> i32 {
        self.current_floor
    }

    pub fn project_id(&self) -> &ProjectIdentification {
        &self.project_id
    }

    pub fn journey_reflection(&self) -> Option<&JourneyReflection> {
        self.journey_reflection.as_ref()
    }

    /// What the last journey rebuild had to work around.
    pub fn sequence_report(&self) -> &SequenceReport {
        &self.report
    }

    /// Nodes on the current floor.
    pub fn visible_nodes(&self) -> impl Iterator<Item = &Node> {
        let floor = self.current_floor;
        self.nodes.iter().filter(move |n| n.floor_index == floor)
    }

    /// Corridors with at least one segment touching the current floor.
    pub fn visible_corridors(&self) -> impl Iterator<Item = &Corridor> {
        let floor = self.current_floor;
        self.corridors.iter().filter(move |c| c.touches_floor(floor))
    }

    /// Visible element at a plan point. Nodes take priority over corridors.
    pub fn element_at(&self, point: Point, tolerance: f64) -> Option<Hit> {
        let hit = hit_test(
            self.visible_nodes(),
            self.visible_corridors(),
            point,
            self.current_floor,
            tolerance,
        );
        log::trace!("hit test at ({}, {}) -> {hit:?}", point.x, point.y);
        hit
    }

    /// [`Self::element_at`] with the configured hit tolerance.
    pub fn element_under(&self, point: Point) -> Option<Hit> {
        self.element_at(point, self.config.hit_tolerance)
    }

    /// `"{prefix}{n}"` for the smallest n ≥ 1 not used by any element.
    pub fn generate_id(&self, prefix: &str) -> ElementId {
        ElementId::first_free(prefix, |candidate| self.id_in_use(ElementId::intern(candidate)))
    }

    fn id_in_use(&self, id: ElementId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
            || self.corridors.iter().any(|c| c.id == id)
            || self.edges.iter().any(|e| e.id == id)
    }

    fn node_index(&self, id: ElementId) -> Result<usize, EditError> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| reject(EditError::NodeNotFound(id)))
    }

    fn corridor_index(&self, id: ElementId) -> Result<usize, EditError> {
        self.corridors
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| reject(EditError::CorridorNotFound(id)))
    }

    fn floor_position(&self, floor_id: &str) -> Result<usize, EditError> {
        self.floors
            .iter()
            .position(|f| f.id == floor_id)
            .ok_or_else(|| reject(EditError::FloorNotFound(floor_id.to_string())))
    }

    fn ensure_endpoint(&self, endpoint: Option<ElementId>) -> Result<(), EditError> {
        match endpoint {
            Some(id) if self.node(id).is_none() => Err(reject(EditError::NodeNotFound(id))),
            _ => Ok(()),
        }
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Place a node on the current floor and append it to the journey.
    pub fn add_node(&mut self, mut node: Node) -> Result<ElementId, EditError> {
        if node.node_type == NodeType::ConnectingSegment {
            return Err(reject(EditError::UnsupportedNodeType(node.node_type)));
        }
        if self.id_in_use(node.id) {
            return Err(reject(EditError::DuplicateId(node.id)));
        }
        self.checkpoint("add node");

        node.floor_index = self.current_floor;
        node.stamp_floor(self.current_floor);
        node.space_annotation
            .design_importance
            .get_or_insert(DesignImportance::Neutral);

        let id = node.id;
        self.nodes.push(node);
        self.append_to_sequence(id, ElementKind::Node);
        self.reorder_path_sequence();
        log::debug!("added node {id} on floor {}", self.current_floor);
        Ok(id)
    }

    /// Merge `patch` into a node. Position changes are re-stamped with the
    /// node's floor.
    pub fn update_node(&mut self, id: ElementId, patch: NodePatch) -> Result<(), EditError> {
        let idx = self.node_index(id)?;
        if patch.node_type == Some(NodeType::ConnectingSegment) {
            return Err(reject(EditError::UnsupportedNodeType(NodeType::ConnectingSegment)));
        }
        self.checkpoint("update node");

        let node = &mut self.nodes[idx];
        let restamp =
            patch.position.is_some() || patch.polygon.is_some() || patch.floor_index.is_some();
        if let Some(node_type) = patch.node_type {
            node.node_type = node_type;
        }
        if let Some(shape) = patch.shape {
            node.shape = shape;
        }
        if let Some(position) = patch.position {
            node.position = position;
        }
        if let Some(polygon) = patch.polygon {
            node.polygon = Some(polygon);
        }
        if let Some(floor_index) = patch.floor_index {
            node.floor_index = floor_index;
        }
        if let Some(space) = patch.space_annotation {
            node.space_annotation = space;
        }
        if let Some(behavior) = patch.behavior_expectation {
            node.behavior_expectation = behavior;
        }
        if let Some(decision) = patch.decision_annotation {
            node.decision_annotation = Some(decision);
        }
        if restamp {
            let floor = node.floor_index;
            node.stamp_floor(floor);
        }

        self.reorder_path_sequence();
        Ok(())
    }

    /// Remove a node, every corridor attached to it, and their sequence
    /// entries.
    pub fn delete_node(&mut self, id: ElementId) -> Result<(), EditError> {
        let idx = self.node_index(id)?;
        self.checkpoint("delete node");

        self.nodes.remove(idx);
        let mut removed: HashSet<ElementId> = HashSet::from([id]);
        self.corridors.retain(|c| {
            let attached = c.references_node(id);
            if attached {
                removed.insert(c.id);
            }
            !attached
        });
        self.remove_from_sequence(&removed);
        self.reorder_path_sequence();
        log::debug!("deleted node {id} and {} corridor(s)", removed.len() - 1);
        Ok(())
    }

    /// Move a node on the current floor. Attached corridors are not
    /// touched; see [`Self::move_node_with_corridors`].
    pub fn move_node(&mut self, id: ElementId, position: Position) -> Result<(), EditError> {
        let idx = self.node_index(id)?;
        self.checkpoint("move node");
        self.place_node(idx, position);
        self.reorder_path_sequence();
        Ok(())
    }

    /// Move a node and re-anchor attached corridors: the first vertex of
    /// each corridor leaving it and the last vertex of each corridor
    /// entering it follow the node.
    pub fn move_node_with_corridors(
        &mut self,
        id: ElementId,
        position: Position,
    ) -> Result<(), EditError> {
        let idx = self.node_index(id)?;
        self.checkpoint("move node");
        self.place_node(idx, position);

        let node = &self.nodes[idx];
        let anchor = node.centroid();
        let anchor = Position::on_floor(anchor.x, anchor.y, node.floor_index);
        for corridor in &mut self.corridors {
            let mut changed = false;
            if corridor.from == Some(id)
                && let Some(first) = corridor.path.first_mut()
            {
                *first = anchor;
                changed = true;
            }
            if corridor.to == Some(id)
                && let Some(last) = corridor.path.last_mut()
            {
                *last = anchor;
                changed = true;
            }
            if changed {
                corridor.rederive();
            }
        }

        self.reorder_path_sequence();
        Ok(())
    }

    /// Positions keep the node's own floor, whichever floor is shown.
    fn place_node(&mut self, idx: usize, position: Position) {
        let node = &mut self.nodes[idx];
        let floor = node.floor_index;
        let dx = position.x - node.position.x;
        let dy = position.y - node.position.y;
        node.position = position.with_floor(floor);
        if let Some(poly) = &mut node.polygon {
            for p in poly.iter_mut() {
                p.x += dx;
                p.y += dy;
                p.floor = Some(floor);
            }
        }
    }

    // ─── Corridors ───────────────────────────────────────────────────────

    /// Add a corridor on the current floor. Vertices without a floor are
    /// placed on the current floor.
    pub fn add_corridor(&mut self, mut corridor: Corridor) -> Result<ElementId, EditError> {
        if self.id_in_use(corridor.id) {
            return Err(reject(EditError::DuplicateId(corridor.id)));
        }
        self.ensure_endpoint(corridor.from)?;
        self.ensure_endpoint(corridor.to)?;
        let floor = self.current_floor;
        for p in corridor.path.iter_mut().filter(|p| p.floor.is_none()) {
            p.floor = Some(floor);
        }
        let validation = validate_corridor_path(&corridor.path);
        if !validation.is_valid() {
            return Err(reject(EditError::InvalidCorridor(validation.errors)));
        }
        self.checkpoint("add corridor");

        corridor.floor_index = floor;
        corridor.rederive();
        let id = corridor.id;
        self.corridors.push(corridor);
        self.append_to_sequence(id, ElementKind::Corridor);
        self.reorder_path_sequence();
        log::debug!("added corridor {id}");
        Ok(id)
    }

    /// Merge `patch` into a corridor. A new path always re-derives
    /// segments and the cross-floor fields.
    pub fn update_corridor(&mut self, id: ElementId, patch: CorridorPatch) -> Result<(), EditError> {
        let idx = self.corridor_index(id)?;
        if let Some(from) = patch.from {
            self.ensure_endpoint(from)?;
        }
        if let Some(to) = patch.to {
            self.ensure_endpoint(to)?;
        }
        let floor = patch.floor_index.unwrap_or(self.corridors[idx].floor_index);
        let path = patch.path.map(|mut path| {
            for p in path.iter_mut().filter(|p| p.floor.is_none()) {
                p.floor = Some(floor);
            }
            path
        });
        if let Some(path) = &path {
            let validation = validate_corridor_path(path);
            if !validation.is_valid() {
                return Err(reject(EditError::InvalidCorridor(validation.errors)));
            }
        }
        self.checkpoint("update corridor");

        let corridor = &mut self.corridors[idx];
        if let Some(from) = patch.from {
            corridor.from = from;
        }
        if let Some(to) = patch.to {
            corridor.to = to;
        }
        if let Some(floor_index) = patch.floor_index {
            corridor.floor_index = floor_index;
        }
        if let Some(space) = patch.space_annotation {
            corridor.space_annotation = space;
        }
        if let Some(behavior) = patch.behavior_expectation {
            corridor.behavior_expectation = behavior;
        }
        if let Some(path) = path {
            corridor.path = path;
            corridor.rederive();
        }

        self.reorder_path_sequence();
        Ok(())
    }

    /// Replace one vertex. The floor is `floor`, else the position's own
    /// floor, else the current floor.
    pub fn update_corridor_vertex(
        &mut self,
        id: ElementId,
        vertex: usize,
        position: Position,
        floor: Option<i32>,
    ) -> Result<(), EditError> {
        let idx = self.corridor_index(id)?;
        let corridor = &self.corridors[idx];
        if vertex >= corridor.path.len() {
            return Err(reject(EditError::VertexOutOfRange {
                corridor: id,
                index: vertex,
                len: corridor.path.len(),
            }));
        }
        let floor = floor.or(position.floor).unwrap_or(self.current_floor);
        let mut path = corridor.path.clone();
        path[vertex] = position.with_floor(floor);
        self.update_corridor(
            id,
            CorridorPatch {
                path: Some(path),
                ..Default::default()
            },
        )
    }

    pub fn delete_corridor(&mut self, id: ElementId) -> Result<(), EditError> {
        let idx = self.corridor_index(id)?;
        self.checkpoint("delete corridor");
        self.corridors.remove(idx);
        self.remove_from_sequence(&HashSet::from([id]));
        self.reorder_path_sequence();
        log::debug!("deleted corridor {id}");
        Ok(())
    }

    // ─── Journey ─────────────────────────────────────────────────────────

    /// Rebuild the visiting order, then regenerate journey edges.
    pub fn reorder_path_sequence(&mut self) {
        let (sequence, report) =
            sequencer::reorder_path_sequence(&self.nodes, &self.corridors, &self.path_sequence);
        for link in &report.superseded {
            log::debug!(
                "journey does not continue through {} into already visited {}",
                link.corridor,
                link.target
            );
        }
        self.path_sequence = sequence;
        self.report = report;
        self.regenerate_edges();
    }

    /// Replace the edge set with edges between consecutive sequence items,
    /// keeping metadata of ids that recur.
    pub fn regenerate_edges(&mut self) {
        self.edges = sequencer::regenerate_edges(&self.path_sequence, &self.edges);
    }

    /// Fill in the decision-edge form for one edge.
    pub fn update_edge(&mut self, id: ElementId, patch: EdgePatch) -> Result<(), EditError> {
        let idx = self
            .edges
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| reject(EditError::EdgeNotFound(id)))?;
        self.checkpoint("update edge");
        let edge = &mut self.edges[idx];
        if let Some(props) = patch.decision_properties {
            edge.decision_properties = props;
        }
        if let Some(intent) = patch.design_intent {
            edge.design_intent = intent;
        }
        Ok(())
    }

    fn append_to_sequence(&mut self, id: ElementId, kind: ElementKind) {
        let order = self.path_sequence.len();
        self.path_sequence.push(PathSequenceItem { id, kind, order });
    }

    fn remove_from_sequence(&mut self, ids: &HashSet<ElementId>) {
        self.path_sequence.retain(|item| !ids.contains(&item.id));
        densify(&mut self.path_sequence);
    }

    // ─── Floors ──────────────────────────────────────────────────────────

    /// Add a floor above the highest existing one and return its index.
    pub fn add_floor(&mut self, name: &str, background_image: Option<String>) -> i32 {
        let index = self.floors.iter().map(|f| f.index + 1).max().unwrap_or(0);
        let mut floor = Floor::new(index, name);
        let mut n = 1;
        while self.floors.iter().any(|f| f.id == floor.id) {
            n += 1;
            floor.id = format!("floor-{index}-{n}");
        }
        floor.background_image = background_image;
        // Index and id are both fresh, so this cannot collide.
        let _ = self.insert_floor(floor);
        index
    }

    /// Add a floor with an explicit index (e.g. -1 for a basement).
    pub fn insert_floor(&mut self, floor: Floor) -> Result<(), EditError> {
        if self.floor(floor.index).is_some() {
            return Err(reject(EditError::DuplicateFloorIndex(floor.index)));
        }
        if self.floors.iter().any(|f| f.id == floor.id) {
            return Err(reject(EditError::DuplicateFloorId(floor.id)));
        }
        self.checkpoint("add floor");
        if let Some(src) = &floor.background_image {
            self.dimensions.request(&floor.id, src.clone());
        }
        if self.floors.is_empty() {
            self.current_floor = floor.index;
        }
        log::debug!("added floor {} ({})", floor.index, floor.name);
        self.floors.push(floor);
        Ok(())
    }

    pub fn update_floor(&mut self, floor_id: &str, patch: FloorPatch) -> Result<(), EditError> {
        let idx = self.floor_position(floor_id)?;
        // Pan and zoom are view state and not worth an undo step.
        if patch.name.is_some() || patch.background_image.is_some() {
            self.checkpoint("update floor");
        }
        let floor = &mut self.floors[idx];
        if let Some(name) = patch.name {
            floor.name = name;
        }
        if let Some(scale) = patch.scale {
            floor.scale = scale;
        }
        if let Some(pan) = patch.pan {
            floor.pan = pan;
        }
        if let Some(image) = patch.background_image {
            floor.background_image = image.clone();
            match image {
                Some(src) => self.dimensions.request(floor_id, src),
                None => self.dimensions.forget(floor_id),
            }
        }
        Ok(())
    }

    /// Remove a floor, its nodes, and every corridor anchored to it.
    pub fn delete_floor(&mut self, floor_id: &str) -> Result<(), EditError> {
        let idx = self.floor_position(floor_id)?;
        self.checkpoint("delete floor");

        let floor = self.floors.remove(idx);
        self.dimensions.forget(&floor.id);

        let mut removed = HashSet::new();
        self.nodes.retain(|n| {
            let on_floor = n.floor_index == floor.index;
            if on_floor {
                removed.insert(n.id);
            }
            !on_floor
        });
        self.corridors.retain(|c| {
            let gone = c.references_floor(floor.index)
                || c.from.is_some_and(|id| removed.contains(&id))
                || c.to.is_some_and(|id| removed.contains(&id));
            if gone {
                removed.insert(c.id);
            }
            !gone
        });
        self.remove_from_sequence(&removed);

        if self.current_floor == floor.index {
            self.current_floor = self.floors.first().map_or(0, |f| f.index);
        }
        self.reorder_path_sequence();
        log::debug!("deleted floor {} and {} element(s)", floor.index, removed.len());
        Ok(())
    }

    pub fn set_current_floor(&mut self, index: i32) -> Result<(), EditError> {
        if !self.floors.is_empty() && self.floor(index).is_none() {
            return Err(reject(EditError::FloorIndexNotFound(index)));
        }
        self.current_floor = index;
        Ok(())
    }

    /// Natural size of a floor's background, once resolved.
    pub fn floor_dimensions(&self, index: i32) -> Option<ImageDimensions> {
        self.dimensions.get(&self.floor(index)?.id)
    }

    pub fn floor_dimension_state(&self, index: i32) -> DimensionState {
        match self.floor(index) {
            Some(floor) => self.dimensions.state(&floor.id),
            None => DimensionState::Unknown,
        }
    }

    /// Collect finished dimension probes; returns settled floor ids.
    pub fn poll_floor_dimensions(&mut self) -> Vec<String> {
        self.dimensions.poll()
    }

    /// Wait for a floor's dimension probe.
    #[cfg(feature = "runtime")]
    pub async fn await_floor_dimensions(
        &mut self,
        floor_id: &str,
    ) -> Option<Result<ImageDimensions, String>> {
        self.dimensions.wait(floor_id).await
    }

    /// Record dimensions measured by the UI layer.
    pub fn set_floor_dimensions(
        &mut self,
        floor_id: &str,
        dims: ImageDimensions,
    ) -> Result<(), EditError> {
        self.floor_position(floor_id)?;
        self.dimensions.set(floor_id, dims);
        Ok(())
    }

    /// 3D viewer position of a plan point, once its floor's size is known.
    pub fn world_position(&self, position: &Position) -> Option<WorldPoint> {
        let floor = position.floor.unwrap_or(self.current_floor);
        let dims = self.floor_dimensions(floor)?;
        let scale = geometry::normalizing_scale(dims, self.config.target_world_size);
        Some(geometry::plan_to_world(
            position.to_point(),
            dims,
            scale,
            floor,
            self.config.floor_spacing,
        ))
    }

    // ─── Project metadata ────────────────────────────────────────────────

    pub fn set_project_id(&mut self, project_id: ProjectIdentification) {
        self.checkpoint("edit project");
        self.project_id = project_id;
    }

    pub fn set_journey_reflection(&mut self, reflection: Option<JourneyReflection>) {
        self.checkpoint("edit reflection");
        self.journey_reflection = reflection;
    }

    /// Gaps to fill before handing the journey off.
    pub fn export_readiness(&self) -> Vec<LintDiagnostic> {
        lint_document(&self.document(self.created))
    }

    // ─── Tools & modal ───────────────────────────────────────────────────

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools. Any half-drawn shape is discarded.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool != self.tool {
            self.drawing.clear();
            self.tool = tool;
        }
    }

    pub fn drawing_points(&self) -> &[Position] {
        self.drawing.points()
    }

    /// Buffer a click of the active drawing tool. Points without a floor
    /// land on the current floor.
    pub fn push_draw_point(&mut self, position: Position) -> usize {
        let floor = position.floor.unwrap_or(self.current_floor);
        self.drawing.push(position.with_floor(floor));
        self.drawing.len()
    }

    pub fn undo_draw_point(&mut self) -> Option<Position> {
        self.drawing.pop()
    }

    pub fn cancel_drawing(&mut self) {
        self.drawing.clear();
    }

    /// Turn the buffered points into a corridor. Each end snaps to the
    /// nearest node on its floor within the snap tolerance and becomes
    /// that end's `from` / `to`.
    pub fn finish_corridor(&mut self, id: Option<ElementId>) -> Result<ElementId, EditError> {
        if self.drawing.len() < 2 {
            return Err(reject(EditError::NothingToFinish));
        }
        let mut path = self.drawing.points().to_vec();
        let from = self.snap_vertex(&mut path, 0);
        let last = path.len() - 1;
        let to = self.snap_vertex(&mut path, last);

        let id = id.unwrap_or_else(|| self.generate_id("C"));
        let mut corridor = Corridor::new(id, path);
        corridor.from = from;
        corridor.to = to;
        let id = self.add_corridor(corridor)?;
        self.drawing.clear();
        Ok(id)
    }

    fn snap_vertex(&self, path: &mut [Position], i: usize) -> Option<ElementId> {
        let vertex = path[i];
        let floor = vertex.floor_or_ground();
        let candidates = self
            .nodes
            .iter()
            .filter(|n| n.floor_index == floor)
            .map(|n| (n.id, n.centroid()));
        let (id, at) = snap_to_nearest(vertex.to_point(), candidates, self.config.snap_tolerance)?;
        path[i] = Position::on_floor(at.x, at.y, floor);
        Some(id)
    }

    /// Turn the buffered points (at least 3) into a polygon node.
    pub fn finish_zone(
        &mut self,
        node_type: NodeType,
        id: Option<ElementId>,
    ) -> Result<ElementId, EditError> {
        if self.drawing.len() < 3 {
            return Err(reject(EditError::NothingToFinish));
        }
        let id = id.unwrap_or_else(|| self.generate_id(node_type.id_prefix()));
        let node = Node::zone(id, node_type, self.drawing.points().to_vec());
        let id = self.add_node(node)?;
        self.drawing.clear();
        Ok(id)
    }

    pub fn modal(&self) -> ModalState {
        self.modal
    }

    pub fn open_modal(&mut self, kind: ModalKind, target: Option<ElementId>) {
        self.modal = ModalState {
            kind: Some(kind),
            target,
        };
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalState::default();
    }

    // ─── Export / import ─────────────────────────────────────────────────

    fn document(&self, modified: DateTime<Utc>) -> AnnotationData {
        self.document_with(self.floors.clone(), modified)
    }

    fn document_with(&self, floors: Vec<Floor>, modified: DateTime<Utc>) -> AnnotationData {
        AnnotationData {
            nodes: self.nodes.clone(),
            corridors: self.corridors.clone(),
            edges: self.edges.clone(),
            path_sequence: self.path_sequence.clone(),
            floors,
            project_id: self.project_id.clone(),
            journey_reflection: self.journey_reflection.clone(),
            metadata: Metadata {
                version: DOCUMENT_VERSION.to_string(),
                created: self.created,
                modified,
            },
        }
    }

    /// The full store state as an export document stamped now.
    pub fn export_data(&self) -> AnnotationData {
        self.document(Utc::now())
    }

    pub fn export_json(&self) -> Result<String, EditError> {
        self.export_data()
            .to_json()
            .map_err(|e| reject(EditError::Export(e.to_string())))
    }

    pub fn export_filename(&self, date: NaiveDate) -> String {
        export::export_filename(&self.project_id, date)
    }

    /// Replace the store contents with a parsed document. Nothing changes
    /// if the text does not parse.
    pub fn load_project(&mut self, json: &str) -> Result<(), EditError> {
        let data =
            AnnotationData::from_json(json).map_err(|e| reject(EditError::Import(e.to_string())))?;
        self.checkpoint("load project");
        self.dimensions.clear();
        self.apply_document(data);
        log::debug!(
            "loaded project with {} nodes, {} corridors, {} floors",
            self.nodes.len(),
            self.corridors.len(),
            self.floors.len()
        );
        Ok(())
    }

    fn apply_document(&mut self, data: AnnotationData) {
        let node_ids: HashSet<ElementId> = data.nodes.iter().map(|n| n.id).collect();
        let mut corridors = data.corridors;
        for corridor in &mut corridors {
            for endpoint in [&mut corridor.from, &mut corridor.to] {
                if let Some(id) = *endpoint
                    && !node_ids.contains(&id)
                {
                    log::warn!("corridor {} referenced missing node {id}; detached", corridor.id);
                    *endpoint = None;
                }
            }
            corridor.rederive();
        }

        self.nodes = data.nodes;
        self.corridors = corridors;
        self.edges = data.edges;
        self.path_sequence = data.path_sequence;
        self.floors = data.floors;
        self.project_id = data.project_id;
        self.journey_reflection = data.journey_reflection;
        self.created = data.metadata.created;

        if self.floor(self.current_floor).is_none() {
            self.current_floor = self.floors.first().map_or(0, |f| f.index);
        }
        for floor in &self.floors {
            if let Some(src) = &floor.background_image
                && self.dimensions.state(&floor.id) == DimensionState::Unknown
            {
                self.dimensions.request(&floor.id, src.clone());
            }
        }
        self.drawing.clear();
        self.modal = ModalState::default();
        self.reorder_path_sequence();
    }

    // ─── History ─────────────────────────────────────────────────────────

    fn checkpoint(&mut self, description: &str) {
        if !self.history.wants_snapshot() {
            return;
        }
        match self.snapshot(description) {
            Ok(snapshot) => self.history.record(snapshot),
            Err(msg) => log::warn!("undo step not recorded: {msg}"),
        }
    }

    /// Encode the document without floor backgrounds; those ride along
    /// as shared handles so repeated steps do not copy the image data.
    fn snapshot(&self, description: &str) -> Result<Snapshot, String> {
        let floors = self.floors.iter().map(Floor::without_background).collect();
        let data = self.document_with(floors, self.created);
        let backgrounds = self
            .floors
            .iter()
            .filter_map(|f| {
                let src = f.background_image.as_deref()?;
                Some((f.id.clone(), self.history.shared_background(src)))
            })
            .collect();
        Snapshot::encode(&data, backgrounds, description)
    }

    /// Group the mutations of one gesture into a single undo step.
    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo the last step. Returns its description.
    pub fn undo(&mut self) -> Option<String> {
        if !self.history.can_undo() {
            return None;
        }
        let current = self.current_snapshot()?;
        let previous = self.history.undo(current)?;
        self.restore(&previous)
    }

    /// Redo the last undone step. Returns its description.
    pub fn redo(&mut self) -> Option<String> {
        if !self.history.can_redo() {
            return None;
        }
        let current = self.current_snapshot()?;
        let next = self.history.redo(current)?;
        self.restore(&next)
    }

    fn current_snapshot(&self) -> Option<Snapshot> {
        self.snapshot("")
            .map_err(|msg| log::warn!("undo unavailable: {msg}"))
            .ok()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Option<String> {
        match snapshot.decode() {
            Ok(data) => {
                for floor in &self.floors {
                    if !data.floors.iter().any(|f| f.id == floor.id) {
                        self.dimensions.forget(&floor.id);
                    }
                }
                self.apply_document(data);
                Some(snapshot.description().to_string())
            }
            Err(msg) => {
                log::warn!("undo step could not be restored: {msg}");
                None
            }
        }
    }
}

/// Log a rejected operation and hand the error back.
fn reject(err: EditError) -> EditError {
    log::warn!("{err}");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with_floors(n: i32) -> AnnotationStore {
        let mut store = AnnotationStore::new();
        for i in 0..n {
            store.add_floor(&format!("Level {i}"), None);
        }
        store
    }

    fn point_node(store: &AnnotationStore, node_type: NodeType, x: f64, y: f64) -> Node {
        Node::new(store.generate_id(node_type.id_prefix()), node_type, Position::new(x, y))
    }

    #[test]
    fn add_node_stamps_floor_and_importance() {
        let mut store = store_with_floors(2);
        store.set_current_floor(1).unwrap();
        let node = point_node(&store, NodeType::DecisionPoint, 5.0, 5.0);
        let id = store.add_node(node).unwrap();

        let node = store.node(id).unwrap();
        assert_eq!(node.floor_index, 1);
        assert_eq!(node.position.floor, Some(1));
        assert_eq!(
            node.space_annotation.design_importance,
            Some(DesignImportance::Neutral)
        );
        assert_eq!(store.path_sequence().len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = store_with_floors(1);
        let node = point_node(&store, NodeType::DecisionPoint, 0.0, 0.0);
        store.add_node(node.clone()).unwrap();
        assert_eq!(store.add_node(node.clone()), Err(EditError::DuplicateId(node.id)));
        assert_eq!(store.nodes().len(), 1);
    }

    #[test]
    fn connecting_segment_nodes_are_not_placed() {
        let mut store = store_with_floors(1);
        let node = point_node(&store, NodeType::ConnectingSegment, 0.0, 0.0);
        assert!(matches!(
            store.add_node(node),
            Err(EditError::UnsupportedNodeType(NodeType::ConnectingSegment))
        ));
    }

    #[test]
    fn update_node_restamps_floor_on_move() {
        let mut store = store_with_floors(3);
        let id = store
            .add_node(point_node(&store, NodeType::DecisionPoint, 0.0, 0.0))
            .unwrap();
        store
            .update_node(
                id,
                NodePatch {
                    position: Some(Position::on_floor(9.0, 9.0, 7)),
                    floor_index: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(store.node(id).unwrap().position, Position::on_floor(9.0, 9.0, 2));
    }

    #[test]
    fn missing_ids_are_reported_not_ignored() {
        let mut store = AnnotationStore::new();
        let ghost = ElementId::intern("st_ghost");
        assert_eq!(store.delete_node(ghost), Err(EditError::NodeNotFound(ghost)));
        assert_eq!(
            store.update_corridor(ghost, CorridorPatch::default()),
            Err(EditError::CorridorNotFound(ghost))
        );
        assert_eq!(store.delete_corridor(ghost), Err(EditError::CorridorNotFound(ghost)));
        assert!(!store.can_undo());
    }

    #[test]
    fn vertex_index_out_of_range_fails() {
        let mut store = store_with_floors(1);
        let id = store
            .add_corridor(Corridor::new(
                store.generate_id("C"),
                vec![Position::new(0.0, 0.0), Position::new(5.0, 0.0)],
            ))
            .unwrap();
        assert_eq!(
            store.update_corridor_vertex(id, 2, Position::new(1.0, 1.0), None),
            Err(EditError::VertexOutOfRange {
                corridor: id,
                index: 2,
                len: 2
            })
        );
    }

    #[test]
    fn corridor_vertex_floor_falls_back_to_current_floor() {
        let mut store = store_with_floors(2);
        let id = store
            .add_corridor(Corridor::new(
                store.generate_id("C"),
                vec![Position::new(0.0, 0.0), Position::new(5.0, 0.0)],
            ))
            .unwrap();
        store.set_current_floor(1).unwrap();
        store
            .update_corridor_vertex(id, 1, Position::new(5.0, 5.0), None)
            .unwrap();
        let corridor = store.corridor(id).unwrap();
        assert!(corridor.is_cross_floor);
        assert_eq!((corridor.from_floor, corridor.to_floor), (Some(0), Some(1)));

        store
            .update_corridor_vertex(id, 1, Position::new(5.0, 5.0), Some(0))
            .unwrap();
        let corridor = store.corridor(id).unwrap();
        assert!(!corridor.is_cross_floor);
        assert_eq!(corridor.from_floor, None);
    }

    #[test]
    fn corridor_endpoints_must_exist() {
        let mut store = store_with_floors(1);
        let corridor = Corridor::new(
            store.generate_id("C"),
            vec![Position::new(0.0, 0.0), Position::new(5.0, 0.0)],
        )
        .between(ElementId::intern("st_nope"), ElementId::intern("st_nada"));
        assert_eq!(
            store.add_corridor(corridor),
            Err(EditError::NodeNotFound(ElementId::intern("st_nope")))
        );
    }

    #[test]
    fn move_node_leaves_corridors_alone() {
        let mut store = store_with_floors(1);
        let a = store
            .add_node(point_node(&store, NodeType::EntranceExit, 0.0, 0.0))
            .unwrap();
        let b = store
            .add_node(point_node(&store, NodeType::DecisionPoint, 50.0, 0.0))
            .unwrap();
        store.push_draw_point(Position::new(1.0, 1.0));
        store.push_draw_point(Position::new(49.0, 1.0));
        let c = store.finish_corridor(None).unwrap();

        store.move_node(a, Position::new(0.0, 30.0)).unwrap();
        assert_eq!(store.corridor(c).unwrap().path[0], Position::on_floor(0.0, 0.0, 0));

        store
            .move_node_with_corridors(a, Position::new(0.0, 30.0))
            .unwrap();
        store
            .move_node_with_corridors(b, Position::new(60.0, 30.0))
            .unwrap();
        let corridor = store.corridor(c).unwrap();
        assert_eq!(corridor.path[0], Position::on_floor(0.0, 30.0, 0));
        assert_eq!(corridor.path[1], Position::on_floor(60.0, 30.0, 0));
        assert_eq!(corridor.segments[0].end, Position::on_floor(60.0, 30.0, 0));
    }

    #[test]
    fn moving_a_zone_translates_its_polygon() {
        let mut store = store_with_floors(1);
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
            store.push_draw_point(Position::new(x, y));
        }
        let id = store.finish_zone(NodeType::DecisionZone, None).unwrap();
        assert_eq!(id.as_str(), "DZ1");
        store.move_node(id, Position::new(15.0, 5.0)).unwrap();
        let node = store.node(id).unwrap();
        assert_eq!(node.polygon.as_ref().unwrap()[0], Position::on_floor(10.0, 0.0, 0));
        assert_eq!(node.centroid(), Point::new(15.0, 5.0));
    }

    #[test]
    fn finish_corridor_snaps_to_nodes() {
        let mut store = store_with_floors(1);
        let e = store
            .add_node(point_node(&store, NodeType::EntranceExit, 100.0, 100.0))
            .unwrap();
        store.set_tool(ToolKind::Corridor);
        store.push_draw_point(Position::new(104.0, 97.0));
        store.push_draw_point(Position::new(300.0, 300.0));
        let c = store.finish_corridor(None).unwrap();

        let corridor = store.corridor(c).unwrap();
        assert_eq!(corridor.from, Some(e));
        assert_eq!(corridor.to, None);
        assert_eq!(corridor.path[0], Position::on_floor(100.0, 100.0, 0));
        assert!(store.drawing_points().is_empty());
    }

    #[test]
    fn finishing_too_few_points_fails() {
        let mut store = store_with_floors(1);
        store.push_draw_point(Position::new(0.0, 0.0));
        assert_eq!(store.finish_corridor(None), Err(EditError::NothingToFinish));
        assert_eq!(
            store.finish_zone(NodeType::DecisionZone, None),
            Err(EditError::NothingToFinish)
        );
        assert_eq!(store.drawing_points().len(), 1);
    }

    #[test]
    fn switching_tools_discards_drawing() {
        let mut store = store_with_floors(1);
        store.set_tool(ToolKind::Zone);
        store.push_draw_point(Position::new(0.0, 0.0));
        store.set_tool(ToolKind::Select);
        assert!(store.drawing_points().is_empty());
    }

    #[test]
    fn visible_views_follow_current_floor() {
        let mut store = store_with_floors(2);
        store
            .add_node(point_node(&store, NodeType::DecisionPoint, 0.0, 0.0))
            .unwrap();
        store
            .add_corridor(Corridor::new(
                store.generate_id("C"),
                vec![Position::new(0.0, 0.0), Position::on_floor(5.0, 0.0, 1)],
            ))
            .unwrap();
        store.set_current_floor(1).unwrap();
        assert_eq!(store.visible_nodes().count(), 0);
        assert_eq!(store.visible_corridors().count(), 1);
    }

    #[test]
    fn set_current_floor_requires_existing_floor() {
        let mut store = store_with_floors(1);
        assert_eq!(
            store.set_current_floor(4),
            Err(EditError::FloorIndexNotFound(4))
        );
        assert_eq!(store.current_floor(), 0);
    }

    #[test]
    fn insert_floor_rejects_duplicate_index() {
        let mut store = store_with_floors(1);
        assert_eq!(
            store.insert_floor(Floor::new(0, "Again")),
            Err(EditError::DuplicateFloorIndex(0))
        );
        store.insert_floor(Floor::new(-1, "Basement")).unwrap();
        assert_eq!(store.add_floor("Roof", None), 1);
    }

    #[test]
    fn floor_ids_stay_unique() {
        let mut store = store_with_floors(1);
        let clash = Floor {
            id: "floor-0".into(),
            ..Floor::new(3, "Mezzanine")
        };
        assert_eq!(
            store.insert_floor(clash),
            Err(EditError::DuplicateFloorId("floor-0".into()))
        );
        assert_eq!(store.floors().len(), 1);

        store
            .insert_floor(Floor {
                id: "floor-2".into(),
                ..Floor::new(1, "Imported")
            })
            .unwrap();
        assert_eq!(store.add_floor("Roof", None), 2);
        let ids: Vec<&str> = store.floors().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["floor-0", "floor-2", "floor-2-2"]);

        store.delete_floor("floor-2").unwrap();
        assert!(store.floor(1).is_none());
        assert!(store.floor(2).is_some());
    }

    #[test]
    fn moving_a_node_keeps_its_floor() {
        let mut store = store_with_floors(2);
        let a = store
            .add_node(point_node(&store, NodeType::EntranceExit, 0.0, 0.0))
            .unwrap();
        store.push_draw_point(Position::new(0.0, 0.0));
        store.push_draw_point(Position::new(40.0, 0.0));
        let c = store.finish_corridor(None).unwrap();

        store.set_current_floor(1).unwrap();
        store.move_node(a, Position::new(5.0, 5.0)).unwrap();
        let node = store.node(a).unwrap();
        assert_eq!(node.floor_index, 0);
        assert_eq!(node.position, Position::on_floor(5.0, 5.0, 0));

        store
            .move_node_with_corridors(a, Position::new(8.0, 8.0))
            .unwrap();
        assert_eq!(store.node(a).unwrap().position.floor, Some(0));
        let corridor = store.corridor(c).unwrap();
        assert_eq!(corridor.path[0], Position::on_floor(8.0, 8.0, 0));
        assert!(!corridor.is_cross_floor);
    }

    #[test]
    fn background_images_survive_undo() {
        let mut store = AnnotationStore::new();
        let plan = "data:image/png;base64,QUJDRA==".to_string();
        store.add_floor("Ground", Some(plan.clone()));
        let id = store
            .add_node(point_node(&store, NodeType::DecisionPoint, 0.0, 0.0))
            .unwrap();
        for i in 1..=3 {
            store.move_node(id, Position::new(i as f64, 0.0)).unwrap();
        }
        store
            .update_floor(
                "floor-0",
                FloorPatch {
                    background_image: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.undo().as_deref(), Some("update floor"));
        assert_eq!(store.floors()[0].background_image.as_deref(), Some(plan.as_str()));
        store.undo();
        assert_eq!(store.node(id).unwrap().position.x, 2.0);
        assert_eq!(store.floors()[0].background_image.as_deref(), Some(plan.as_str()));

        let first = store.history.shared_background(&plan);
        let again = store.history.shared_background(&plan);
        assert!(std::sync::Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn edge_form_survives_unrelated_edits() {
        let mut store = store_with_floors(1);
        let e = store
            .add_node(point_node(&store, NodeType::EntranceExit, 0.0, 0.0))
            .unwrap();
        let d = store
            .add_node(point_node(&store, NodeType::DecisionPoint, 40.0, 0.0))
            .unwrap();
        store.push_draw_point(Position::new(0.0, 0.0));
        store.push_draw_point(Position::new(40.0, 0.0));
        let c = store.finish_corridor(None).unwrap();

        let edge_id = ElementId::edge_between(e, c);
        store
            .update_edge(
                edge_id,
                EdgePatch {
                    design_intent: Some(DesignIntent {
                        intended_choice: "straight ahead".into(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .unwrap();

        store
            .update_node(
                d,
                NodePatch {
                    space_annotation: Some(SpaceAnnotation {
                        label: "Lobby fork".into(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            store.edge(edge_id).unwrap().design_intent.intended_choice,
            "straight ahead"
        );
    }

    #[test]
    fn undo_and_redo_restore_documents() {
        let mut store = store_with_floors(1);
        let id = store
            .add_node(point_node(&store, NodeType::DecisionPoint, 0.0, 0.0))
            .unwrap();
        store.delete_node(id).unwrap();
        assert!(store.nodes().is_empty());

        assert_eq!(store.undo().as_deref(), Some("delete node"));
        assert!(store.node(id).is_some());
        assert_eq!(store.path_sequence().len(), 1);

        assert_eq!(store.redo().as_deref(), Some("delete node"));
        assert!(store.nodes().is_empty());
    }

    #[test]
    fn drag_gesture_is_one_undo_step() {
        let mut store = store_with_floors(1);
        let id = store
            .add_node(point_node(&store, NodeType::DecisionPoint, 0.0, 0.0))
            .unwrap();
        store.begin_batch();
        for i in 1..=5 {
            store.move_node(id, Position::new(i as f64, 0.0)).unwrap();
        }
        store.end_batch();

        store.undo();
        assert_eq!(store.node(id).unwrap().position.x, 0.0);
        assert_eq!(store.undo().as_deref(), Some("add node"));
        assert!(store.nodes().is_empty());
        assert_eq!(store.floors().len(), 1);
    }

    #[test]
    fn reset_keeps_config() {
        let config = EditorConfig {
            snap_tolerance: 3.0,
            ..Default::default()
        };
        let mut store = AnnotationStore::with_config(config);
        store.add_floor("Ground", None);
        store.reset();
        assert!(store.floors().is_empty());
        assert_eq!(store.config().snap_tolerance, 3.0);
    }

    #[test]
    fn world_position_needs_dimensions() {
        let mut store = store_with_floors(2);
        let pos = Position::on_floor(100.0, 50.0, 1);
        assert!(store.world_position(&pos).is_none());

        store
            .set_floor_dimensions("floor-1", ImageDimensions::new(200, 100))
            .unwrap();
        let w = store.world_position(&pos).unwrap();
        assert_eq!((w.x, w.y, w.z), (0.0, 10.0, 0.0));
    }
}
