use wayfind_core::geometry::DEFAULT_TARGET_WORLD_SIZE;

/// Tunables for an editing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// Plan-pixel radius within which corridor endpoints snap to nodes.
    pub snap_tolerance: f64,
    /// Plan-pixel radius for pointer hit testing.
    pub hit_tolerance: f64,
    /// World units between stacked floors in the 3D view.
    pub floor_spacing: f64,
    /// World size of a floor plan's longer side.
    pub target_world_size: f64,
    /// Maximum undo depth.
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 15.0,
            hit_tolerance: 10.0,
            floor_spacing: 10.0,
            target_world_size: DEFAULT_TARGET_WORLD_SIZE,
            history_depth: 100,
        }
    }
}
