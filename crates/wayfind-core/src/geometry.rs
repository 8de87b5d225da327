//! Coordinate conversions between screen, plan and world space.
//!
//! - **Screen**: raw pointer pixels on the 2D canvas.
//! - **Plan**: pixels of a floor's background image (`Position.x/y`).
//! - **World**: the 3D viewer's units. X/Z are centered on the image
//!   midpoint, Y is up (`floor * floor_spacing`), and the plan's Y-down
//!   axis is flipped into world depth.

use kurbo::{Line, ParamCurveNearest, Point, Vec2};

/// Default world size of a floor's longer side.
pub const DEFAULT_TARGET_WORLD_SIZE: f64 = 50.0;

/// Natural pixel size of a floor-plan image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn half(&self) -> Vec2 {
        Vec2::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// A point in 3D viewer space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Map a plan-pixel point on `floor` into world space.
pub fn plan_to_world(
    plan: Point,
    dims: ImageDimensions,
    units_per_pixel: f64,
    floor: i32,
    floor_spacing: f64,
) -> WorldPoint {
    let centered = plan.to_vec2() - dims.half();
    WorldPoint {
        x: centered.x * units_per_pixel,
        y: f64::from(floor) * floor_spacing,
        z: -centered.y * units_per_pixel,
    }
}

/// World units per pixel so that the longer image side spans `target`.
///
/// Degenerate (zero-sized) images map to 1.0 so nothing divides by zero.
pub fn normalizing_scale(dims: ImageDimensions, target: f64) -> f64 {
    let longest = dims.width.max(dims.height);
    if longest == 0 {
        return 1.0;
    }
    target / f64::from(longest)
}

/// `plan = (screen - pan) / scale`
pub fn screen_to_plan(screen: Point, pan: Vec2, scale: f64) -> Point {
    ((screen.to_vec2() - pan) / scale).to_point()
}

/// `screen = plan * scale + pan`
pub fn plan_to_screen(plan: Point, pan: Vec2, scale: f64) -> Point {
    (plan.to_vec2() * scale + pan).to_point()
}

/// Shortest distance from `p` to the segment `a`–`b`.
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    if a == b {
        return p.distance(a);
    }
    let nearest = Line::new(a, b).nearest(p, 1e-9);
    nearest.distance_sq.sqrt()
}

/// Vertex average of a point set. Empty input yields the origin.
pub fn centroid(points: impl IntoIterator<Item = Point>) -> Point {
    let (sum, n) = points
        .into_iter()
        .fold((Vec2::ZERO, 0usize), |(sum, n), p| (sum + p.to_vec2(), n + 1));
    if n == 0 {
        return Point::ORIGIN;
    }
    (sum / n as f64).to_point()
}
