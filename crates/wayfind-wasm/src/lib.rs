//! WASM bridge for Wayfind: exposes the annotation store to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the browser
//! editor. Structured values cross the boundary as JSON strings in the
//! same shapes as the exported document. Fallible calls return
//! `{"ok":true,...}` or `{"ok":false,"error":"..."}`.

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use wasm_bindgen::prelude::*;
use wayfind_core::geometry::{self, ImageDimensions};
use wayfind_core::id::ElementId;
use wayfind_core::model::*;
use wayfind_core::segment::segment_style;
use wayfind_core::{Point, Vec2};
use wayfind_editor::{
    AnnotationStore, CorridorPatch, EdgePatch, FloorPatch, ModalKind, NodePatch, ToolKind,
};

/// The browser-facing editor controller.
///
/// Canvas clicks arrive in screen pixels and are mapped to plan space
/// with the current floor's pan and zoom.
#[wasm_bindgen]
pub struct WayfindEditor {
    store: AnnotationStore,
}

impl Default for WayfindEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WayfindEditor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook_setup();
        Self {
            store: AnnotationStore::new(),
        }
    }

    /// Start a new, empty project.
    pub fn reset(&mut self) {
        self.store.reset();
    }

    // ─── Floors ──────────────────────────────────────────────────────────

    /// Add a floor above the highest one. Returns its index.
    pub fn add_floor(&mut self, name: &str, background_image: Option<String>) -> i32 {
        self.store.add_floor(name, background_image)
    }

    pub fn rename_floor(&mut self, floor_id: &str, name: &str) -> bool {
        self.store
            .update_floor(
                floor_id,
                FloorPatch {
                    name: Some(name.to_string()),
                    ..Default::default()
                },
            )
            .is_ok()
    }

    pub fn set_floor_background(&mut self, floor_id: &str, src: Option<String>) -> bool {
        self.store
            .update_floor(
                floor_id,
                FloorPatch {
                    background_image: Some(src),
                    ..Default::default()
                },
            )
            .is_ok()
    }

    /// Store the zoom and pan of a floor's view.
    pub fn set_floor_view(&mut self, floor_id: &str, scale: f64, pan_x: f64, pan_y: f64) -> bool {
        self.store
            .update_floor(
                floor_id,
                FloorPatch {
                    scale: Some(scale),
                    pan: Some(Pan { x: pan_x, y: pan_y }),
                    ..Default::default()
                },
            )
            .is_ok()
    }

    pub fn delete_floor(&mut self, floor_id: &str) -> bool {
        self.store.delete_floor(floor_id).is_ok()
    }

    pub fn set_current_floor(&mut self, index: i32) -> bool {
        self.store.set_current_floor(index).is_ok()
    }

    pub fn current_floor(&self) -> i32 {
        self.store.current_floor()
    }

    pub fn floors_json(&self) -> String {
        to_json(self.store.floors())
    }

    /// Natural size of a background, measured by an `<img>` element.
    pub fn set_floor_dimensions(&mut self, floor_id: &str, width: u32, height: u32) -> bool {
        self.store
            .set_floor_dimensions(floor_id, ImageDimensions::new(width, height))
            .is_ok()
    }

    /// Returns `{"width":..,"height":..}` or `null` while unknown.
    pub fn floor_dimensions_json(&self, index: i32) -> String {
        match self.store.floor_dimensions(index) {
            Some(d) => json!({ "width": d.width, "height": d.height }).to_string(),
            None => "null".to_string(),
        }
    }

    /// Floor ids whose dimension probe settled since the last call.
    pub fn poll_floor_dimensions(&mut self) -> String {
        to_json(&self.store.poll_floor_dimensions())
    }

    /// 3D viewer coordinates of a plan point, or `null` before the floor's
    /// size is known.
    pub fn world_position_json(&self, x: f64, y: f64, floor: i32) -> String {
        match self.store.world_position(&Position::on_floor(x, y, floor)) {
            Some(w) => json!({ "x": w.x, "y": w.y, "z": w.z }).to_string(),
            None => "null".to_string(),
        }
    }

    // ─── Tools & pointer ─────────────────────────────────────────────────

    /// Switch tool by name. Returns `false` for an unknown name.
    pub fn set_tool(&mut self, name: &str) -> bool {
        match parse_tool(name) {
            Some(tool) => {
                self.store.set_tool(tool);
                true
            }
            None => false,
        }
    }

    /// Interpret a canvas click at screen coordinates for the active tool.
    ///
    /// Returns JSON describing what happened: `select` with the hit
    /// element (or `null`), `draw` with the buffered point count, `place`
    /// with the plan point a new node should go to, or `none`.
    pub fn handle_click(&mut self, screen_x: f64, screen_y: f64) -> String {
        let plan = self.screen_to_plan(screen_x, screen_y);
        let tool = self.store.tool();
        let result = if tool.draws() {
            let points = self.store.push_draw_point(Position::new(plan.x, plan.y));
            json!({ "action": "draw", "points": points })
        } else {
            match tool {
                ToolKind::Select => {
                    let hit = self.store.element_under(plan);
                    if let Some(hit) = hit {
                        let kind = match hit.kind {
                            ElementKind::Node => ModalKind::Node,
                            ElementKind::Corridor => ModalKind::Corridor,
                        };
                        self.store.open_modal(kind, Some(hit.id));
                    }
                    json!({ "action": "select", "hit": hit.map(hit_json) })
                }
                ToolKind::Point => {
                    self.store.open_modal(ModalKind::Node, None);
                    json!({ "action": "place", "x": plan.x, "y": plan.y })
                }
                _ => json!({ "action": "none" }),
            }
        };
        result.to_string()
    }

    /// Screen position of a plan point under the current floor's view,
    /// for placing HTML overlays.
    pub fn plan_to_screen_json(&self, x: f64, y: f64) -> String {
        let (pan, scale) = self.view();
        let p = geometry::plan_to_screen(Point::new(x, y), pan, scale);
        json!({ "x": p.x, "y": p.y }).to_string()
    }

    /// Hit test at a plan point with the configured tolerance.
    pub fn element_at(&self, x: f64, y: f64) -> String {
        match self.store.element_under(Point::new(x, y)) {
            Some(hit) => hit_json(hit).to_string(),
            None => "null".to_string(),
        }
    }

    pub fn drawing_points_json(&self) -> String {
        to_json(self.store.drawing_points())
    }

    pub fn undo_draw_point(&mut self) -> bool {
        self.store.undo_draw_point().is_some()
    }

    pub fn cancel_drawing(&mut self) {
        self.store.cancel_drawing();
    }

    /// Finish the corridor or zone being drawn. Zones need a node type.
    pub fn finish_drawing(&mut self, node_type: Option<String>) -> String {
        let result = match self.store.tool() {
            ToolKind::Corridor => self.store.finish_corridor(None).map_err(|e| e.to_string()),
            ToolKind::Zone => parse_node_type(node_type.as_deref().unwrap_or("decision_zone"))
                .and_then(|t| self.store.finish_zone(t, None).map_err(|e| e.to_string())),
            _ => Err("the active tool does not draw".to_string()),
        };
        respond(result.map(|id| json!({ "id": id.as_str() })))
    }

    // ─── Modal ───────────────────────────────────────────────────────────

    pub fn open_modal(&mut self, kind: &str, target: Option<String>) -> bool {
        match parse_modal(kind) {
            Some(kind) => {
                self.store
                    .open_modal(kind, target.as_deref().map(ElementId::intern));
                true
            }
            None => false,
        }
    }

    pub fn close_modal(&mut self) {
        self.store.close_modal();
    }

    /// `{"kind":..,"target":..}` or `null` when closed.
    pub fn modal_json(&self) -> String {
        let modal = self.store.modal();
        match modal.kind {
            Some(kind) => json!({
                "kind": modal_name(kind),
                "target": modal.target.map(|id| id.as_str().to_string()),
            })
            .to_string(),
            None => "null".to_string(),
        }
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Place a point node of `node_type` at a plan point on the current
    /// floor, with a generated id.
    pub fn place_node(&mut self, node_type: &str, x: f64, y: f64) -> String {
        let result = parse_node_type(node_type).and_then(|t| {
            let node = Node::new(self.store.generate_id(t.id_prefix()), t, Position::new(x, y));
            self.store.add_node(node).map_err(|e| e.to_string())
        });
        respond(result.map(|id| json!({ "id": id.as_str() })))
    }

    /// Add a node given in document JSON.
    pub fn add_node_json(&mut self, json: &str) -> String {
        let result = parse::<Node>(json)
            .and_then(|node| self.store.add_node(node).map_err(|e| e.to_string()));
        respond(result.map(|id| json!({ "id": id.as_str() })))
    }

    /// Merge the fields present in `json` into a node.
    pub fn update_node_json(&mut self, id: &str, json: &str) -> String {
        let result = parse::<Map<String, Value>>(json).and_then(|obj| {
            let patch = NodePatch {
                node_type: field(&obj, "type")?,
                shape: field(&obj, "shape")?,
                position: field(&obj, "position")?,
                polygon: field(&obj, "polygon")?,
                floor_index: field(&obj, "floorIndex")?,
                space_annotation: field(&obj, "space_annotation")?,
                behavior_expectation: field(&obj, "behavior_expectation")?,
                decision_annotation: field(&obj, "decision_annotation")?,
            };
            self.store
                .update_node(ElementId::intern(id), patch)
                .map_err(|e| e.to_string())
        });
        respond(result.map(|()| Value::Null))
    }

    /// Move a node. With `with_corridors`, attached corridor ends follow.
    pub fn move_node(&mut self, id: &str, x: f64, y: f64, with_corridors: bool) -> bool {
        let id = ElementId::intern(id);
        let position = Position::new(x, y);
        let result = if with_corridors {
            self.store.move_node_with_corridors(id, position)
        } else {
            self.store.move_node(id, position)
        };
        result.is_ok()
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        self.store.delete_node(ElementId::intern(id)).is_ok()
    }

    pub fn visible_nodes_json(&self) -> String {
        let nodes: Vec<&Node> = self.store.visible_nodes().collect();
        to_json(&nodes)
    }

    // ─── Corridors ───────────────────────────────────────────────────────

    pub fn add_corridor_json(&mut self, json: &str) -> String {
        let result = parse::<Corridor>(json)
            .and_then(|corridor| self.store.add_corridor(corridor).map_err(|e| e.to_string()));
        respond(result.map(|id| json!({ "id": id.as_str() })))
    }

    /// Merge the fields present in `json` into a corridor. `"from": null`
    /// detaches that end.
    pub fn update_corridor_json(&mut self, id: &str, json: &str) -> String {
        let result = parse::<Map<String, Value>>(json).and_then(|obj| {
            let patch = CorridorPatch {
                from: field(&obj, "from")?,
                to: field(&obj, "to")?,
                path: field(&obj, "path")?,
                floor_index: field(&obj, "floorIndex")?,
                space_annotation: field(&obj, "space_annotation")?,
                behavior_expectation: field(&obj, "behavior_expectation")?,
            };
            self.store
                .update_corridor(ElementId::intern(id), patch)
                .map_err(|e| e.to_string())
        });
        respond(result.map(|()| Value::Null))
    }

    pub fn update_corridor_vertex(
        &mut self,
        id: &str,
        vertex: usize,
        x: f64,
        y: f64,
        floor: Option<i32>,
    ) -> String {
        let result = self
            .store
            .update_corridor_vertex(ElementId::intern(id), vertex, Position::new(x, y), floor)
            .map_err(|e| e.to_string());
        respond(result.map(|()| Value::Null))
    }

    pub fn delete_corridor(&mut self, id: &str) -> bool {
        self.store.delete_corridor(ElementId::intern(id)).is_ok()
    }

    /// Corridors on the current floor with per-segment stroke styles.
    pub fn visible_corridors_json(&self) -> String {
        let floor = self.store.current_floor();
        let corridors: Vec<Value> = self
            .store
            .visible_corridors()
            .map(|c| {
                let segments: Vec<Value> = c
                    .segments
                    .iter()
                    .map(|s| {
                        let style = segment_style(s, floor);
                        json!({
                            "start": s.start,
                            "end": s.end,
                            "isCrossFloor": s.is_cross_floor,
                            "color": style.color.to_hex(),
                            "opacity": style.opacity,
                            "dashed": style.dashed,
                        })
                    })
                    .collect();
                json!({
                    "id": c.id.as_str(),
                    "from": c.from.map(|id| id.as_str().to_string()),
                    "to": c.to.map(|id| id.as_str().to_string()),
                    "isCrossFloor": c.is_cross_floor,
                    "segments": segments,
                })
            })
            .collect();
        Value::Array(corridors).to_string()
    }

    // ─── Journey ─────────────────────────────────────────────────────────

    pub fn path_sequence_json(&self) -> String {
        to_json(self.store.path_sequence())
    }

    pub fn edges_json(&self) -> String {
        to_json(self.store.edges())
    }

    /// Fill in the edge form from `{"decision_properties":..,"design_intent":..}`.
    pub fn update_edge_json(&mut self, id: &str, json: &str) -> String {
        let result = parse::<Map<String, Value>>(json).and_then(|obj| {
            let patch = EdgePatch {
                decision_properties: field(&obj, "decision_properties")?,
                design_intent: field(&obj, "design_intent")?,
            };
            self.store
                .update_edge(ElementId::intern(id), patch)
                .map_err(|e| e.to_string())
        });
        respond(result.map(|()| Value::Null))
    }

    /// Links the journey walk could not follow, and unreachable items.
    pub fn sequence_report_json(&self) -> String {
        let report = self.store.sequence_report();
        json!({
            "superseded": report
                .superseded
                .iter()
                .map(|l| json!({ "corridor": l.corridor.as_str(), "target": l.target.as_str() }))
                .collect::<Vec<_>>(),
            "unreached": report.unreached.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            "hasCycles": report.has_cycles,
        })
        .to_string()
    }

    pub fn generate_id(&self, prefix: &str) -> String {
        self.store.generate_id(prefix).as_str().to_string()
    }

    // ─── Project ─────────────────────────────────────────────────────────

    pub fn set_project_id(&mut self, building_id: &str, architect_id: &str, route_id: &str) {
        self.store.set_project_id(ProjectIdentification::new(
            building_id,
            architect_id,
            route_id,
        ));
    }

    /// Replace the journey reflection. `null` clears it.
    pub fn set_journey_reflection_json(&mut self, json: &str) -> String {
        let result = parse::<Option<JourneyReflection>>(json)
            .map(|reflection| self.store.set_journey_reflection(reflection));
        respond(result.map(|()| Value::Null))
    }

    /// Readiness diagnostics as `[{"rule","message","severity","element"}]`.
    pub fn export_readiness_json(&self) -> String {
        let diags: Vec<Value> = self
            .store
            .export_readiness()
            .iter()
            .map(|d| {
                json!({
                    "rule": d.rule,
                    "message": d.message,
                    "severity": format!("{:?}", d.severity).to_lowercase(),
                    "element": d.element.map(|id| id.as_str().to_string()),
                })
            })
            .collect();
        Value::Array(diags).to_string()
    }

    // ─── Export / import ─────────────────────────────────────────────────

    pub fn export_json(&self) -> String {
        respond(
            self.store
                .export_json()
                .map_err(|e| e.to_string())
                .map(|document| json!({ "document": document })),
        )
    }

    /// Download name for an export made today.
    pub fn export_filename(&self) -> String {
        self.store.export_filename(today())
    }

    pub fn load_json(&mut self, text: &str) -> String {
        respond(
            self.store
                .load_project(text)
                .map_err(|e| e.to_string())
                .map(|()| Value::Null),
        )
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Undo the last step. Returns its description.
    pub fn undo(&mut self) -> Option<String> {
        self.store.undo()
    }

    pub fn redo(&mut self) -> Option<String> {
        self.store.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    /// Call on pointer-down before a drag; pair with `end_batch`.
    pub fn begin_batch(&mut self) {
        self.store.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.store.end_batch();
    }
}

impl WayfindEditor {
    /// Pan and zoom of the current floor.
    fn view(&self) -> (Vec2, f64) {
        self.store
            .floor(self.store.current_floor())
            .map_or((Vec2::ZERO, 1.0), |f| (Vec2::new(f.pan.x, f.pan.y), f.scale))
    }

    fn screen_to_plan(&self, screen_x: f64, screen_y: f64) -> Point {
        let (pan, scale) = self.view();
        geometry::screen_to_plan(Point::new(screen_x, screen_y), pan, scale)
    }
}

// ─── JSON helpers ────────────────────────────────────────────────────────

fn respond(result: Result<Value, String>) -> String {
    let body = match result {
        Ok(Value::Object(mut fields)) => {
            fields.insert("ok".into(), Value::Bool(true));
            Value::Object(fields)
        }
        Ok(_) => json!({ "ok": true }),
        Err(error) => json!({ "ok": false, "error": error }),
    };
    body.to_string()
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

fn parse<T: DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

/// `Some` when `key` is present in `obj`.
fn field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Result<Option<T>, String> {
    obj.get(key)
        .map(|v| serde_json::from_value(v.clone()).map_err(|e| format!("{key}: {e}")))
        .transpose()
}

fn hit_json(hit: wayfind_editor::Hit) -> Value {
    json!({
        "id": hit.id.as_str(),
        "type": hit.kind,
        "distance": hit.distance,
    })
}

fn parse_node_type(name: &str) -> Result<NodeType, String> {
    serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| format!("unknown node type `{name}`"))
}

fn parse_tool(name: &str) -> Option<ToolKind> {
    match name {
        "select" => Some(ToolKind::Select),
        "point" => Some(ToolKind::Point),
        "zone" => Some(ToolKind::Zone),
        "corridor" => Some(ToolKind::Corridor),
        "pan" => Some(ToolKind::Pan),
        _ => None,
    }
}

fn parse_modal(name: &str) -> Option<ModalKind> {
    match name {
        "node" => Some(ModalKind::Node),
        "corridor" => Some(ModalKind::Corridor),
        "edge" => Some(ModalKind::Edge),
        "floor" => Some(ModalKind::Floor),
        "project_id" => Some(ModalKind::ProjectId),
        "journey_reflection" => Some(ModalKind::JourneyReflection),
        _ => None,
    }
}

fn modal_name(kind: ModalKind) -> &'static str {
    match kind {
        ModalKind::Node => "node",
        ModalKind::Corridor => "corridor",
        ModalKind::Edge => "edge",
        ModalKind::Floor => "floor",
        ModalKind::ProjectId => "project_id",
        ModalKind::JourneyReflection => "journey_reflection",
    }
}

fn today() -> NaiveDate {
    #[cfg(target_arch = "wasm32")]
    {
        let now = js_sys::Date::new_0();
        if let Some(date) = NaiveDate::from_ymd_opt(
            now.get_utc_full_year() as i32,
            now.get_utc_month() + 1,
            now.get_utc_date(),
        ) {
            return date;
        }
    }
    Utc::now().date_naive()
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Wayfind WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor() -> WayfindEditor {
        let mut editor = WayfindEditor::new();
        editor.add_floor("Ground", None);
        editor
    }

    fn ok(response: &str) -> Value {
        let value: Value = serde_json::from_str(response).unwrap();
        assert_eq!(value["ok"], true, "{response}");
        value
    }

    #[test]
    fn place_and_connect_nodes() {
        let mut editor = editor();
        let e = ok(&editor.place_node("entrance_exit", 0.0, 0.0));
        assert_eq!(e["id"], "E1");
        ok(&editor.place_node("decision_point", 100.0, 0.0));

        assert!(editor.set_tool("corridor"));
        editor.handle_click(2.0, 1.0);
        editor.handle_click(99.0, 2.0);
        let c = ok(&editor.finish_drawing(None));
        assert_eq!(c["id"], "C1");

        let sequence: Vec<PathSequenceItem> =
            serde_json::from_str(&editor.path_sequence_json()).unwrap();
        let ids: Vec<&str> = sequence.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["E1", "C1", "DP1"]);
    }

    #[test]
    fn clicks_respect_floor_view() {
        let mut editor = editor();
        assert!(editor.set_floor_view("floor-0", 2.0, 10.0, 20.0));
        ok(&editor.place_node("decision_point", 50.0, 40.0));

        let response: Value = serde_json::from_str(&editor.handle_click(110.0, 100.0)).unwrap();
        assert_eq!(response["action"], "select");
        assert_eq!(response["hit"]["id"], "DP1");
        assert_eq!(response["hit"]["type"], "node");

        let modal: Value = serde_json::from_str(&editor.modal_json()).unwrap();
        assert_eq!(modal, json!({ "kind": "node", "target": "DP1" }));

        let screen: Value = serde_json::from_str(&editor.plan_to_screen_json(50.0, 40.0)).unwrap();
        assert_eq!(screen, json!({ "x": 110.0, "y": 100.0 }));
    }

    #[test]
    fn partial_node_update() {
        let mut editor = editor();
        ok(&editor.place_node("decision_point", 0.0, 0.0));
        ok(&editor.update_node_json(
            "DP1",
            r#"{ "space_annotation": { "label": "Atrium", "description": "" } }"#,
        ));
        let nodes: Vec<Node> = serde_json::from_str(&editor.visible_nodes_json()).unwrap();
        assert_eq!(nodes[0].space_annotation.label, "Atrium");
        assert_eq!(nodes[0].position, Position::on_floor(0.0, 0.0, 0));

        let bad: Value =
            serde_json::from_str(&editor.update_node_json("DP1", r#"{ "type": "ramp" }"#))
                .unwrap();
        assert_eq!(bad["ok"], false);
    }

    #[test]
    fn errors_come_back_as_json() {
        let mut editor = editor();
        let response: Value =
            serde_json::from_str(&editor.update_corridor_vertex("C9", 0, 1.0, 1.0, None))
                .unwrap();
        assert_eq!(response["ok"], false);
        assert_eq!(response["error"], "corridor `C9` not found");
        assert!(!editor.set_tool("lasso"));
    }

    #[test]
    fn export_then_load() {
        let mut editor = editor();
        ok(&editor.place_node("entrance_exit", 5.0, 5.0));
        editor.set_project_id("B1", "A1", "R1");
        let exported = ok(&editor.export_json());
        let document = exported["document"].as_str().unwrap().to_string();

        let mut other = WayfindEditor::new();
        ok(&other.load_json(&document));
        assert_eq!(other.visible_nodes_json(), editor.visible_nodes_json());
        assert!(other.export_filename().starts_with("B1_A1_R1_"));
        assert_eq!(other.world_position_json(0.0, 0.0, 0), "null");
    }
}
