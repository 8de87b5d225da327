//! Drawing tools and the in-progress drawing buffer.
//!
//! The canvas feeds plan-space clicks into the buffer of the active tool.
//! Finishing a draw turns the buffered points into a node or corridor
//! through the store, which owns snapping and id assignment.

use wayfind_core::id::ElementId;
use wayfind_core::model::Position;
use wayfind_core::Point;

/// The active tool determines how canvas clicks are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    /// Single click places a point node.
    Point,
    /// Clicks collect polygon vertices for a zone node.
    Zone,
    /// Clicks collect corridor vertices.
    Corridor,
    Pan,
}

impl ToolKind {
    /// Whether the tool collects points into the drawing buffer.
    pub fn draws(self) -> bool {
        matches!(self, ToolKind::Zone | ToolKind::Corridor)
    }
}

/// Points collected while a zone or corridor is being drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingBuffer {
    points: Vec<Position>,
}

impl DrawingBuffer {
    pub fn push(&mut self, point: Position) {
        self.points.push(point);
    }

    /// Drop the last point (backspace while drawing).
    pub fn pop(&mut self) -> Option<Position> {
        self.points.pop()
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// Which form the UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Node,
    Corridor,
    Edge,
    Floor,
    ProjectId,
    JourneyReflection,
}

/// Open modal and the element it edits, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalState {
    pub kind: Option<ModalKind>,
    pub target: Option<ElementId>,
}

/// Nearest candidate within `tolerance` of `point`.
pub fn snap_to_nearest(
    point: Point,
    candidates: impl IntoIterator<Item = (ElementId, Point)>,
    tolerance: f64,
) -> Option<(ElementId, Point)> {
    candidates
        .into_iter()
        .map(|(id, c)| (id, c, point.distance(c)))
        .filter(|(_, _, d)| *d <= tolerance)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(id, c, _)| (id, c))
}
