//! Corridor segmentation.
//!
//! A corridor's `path` is split into one [`Segment`] per consecutive vertex
//! pair. Segments carry their endpoint floors so per-floor views can pick
//! out the spans that touch the floor being displayed, including spans
//! that leave or arrive from another level.

use crate::model::{Color, Corridor, Position, Segment};
use smallvec::SmallVec;

/// Largest number of levels a single corridor may span.
pub const MAX_FLOOR_SPAN: i32 = 5;

/// Same-floor segment color.
pub const BASE_COLOR: Color = Color::rgba(0.231, 0.510, 0.965, 1.0);

/// Cross-floor accent color.
pub const CROSS_FLOOR_COLOR: Color = Color::rgba(0.961, 0.620, 0.043, 1.0);

/// Opacity of cross-floor segments seen from a floor they don't touch.
pub const DIMMED_OPACITY: f32 = 0.4;

/// Build segments for every consecutive vertex pair. Missing floors
/// count as ground level.
pub fn generate_segments(path: &[Position]) -> SmallVec<[Segment; 4]> {
    path.windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            let start_floor = start.floor_or_ground();
            let end_floor = end.floor_or_ground();
            Segment {
                start,
                end,
                start_floor,
                end_floor,
                is_cross_floor: start_floor != end_floor,
            }
        })
        .collect()
}

/// Segments of `corridor` with at least one endpoint on `floor`.
pub fn segments_on_floor(corridor: &Corridor, floor: i32) -> impl Iterator<Item = &Segment> {
    corridor.segments.iter().filter(move |s| s.touches_floor(floor))
}

/// How a segment is stroked on the 2D canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStyle {
    pub color: Color,
    pub opacity: f32,
    pub dashed: bool,
}

/// Render style for `segment` as seen from `current_floor`.
pub fn segment_style(segment: &Segment, current_floor: i32) -> SegmentStyle {
    if !segment.is_cross_floor {
        return SegmentStyle {
            color: BASE_COLOR,
            opacity: 1.0,
            dashed: false,
        };
    }
    let opacity = if segment.touches_floor(current_floor) {
        1.0
    } else {
        DIMMED_OPACITY
    };
    SegmentStyle {
        color: CROSS_FLOOR_COLOR,
        opacity,
        dashed: true,
    }
}

/// Indices `i` where `path[i]` is on a different floor than `path[i - 1]`.
pub fn floor_transitions(path: &[Position]) -> Vec<usize> {
    path.windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].floor_or_ground() != pair[1].floor_or_ground())
        .map(|(i, _)| i + 1)
        .collect()
}

/// Number of levels between the lowest and highest vertex, inclusive.
pub fn floor_span(path: &[Position]) -> i32 {
    let floors = path.iter().filter_map(|p| p.floor);
    match (floors.clone().min(), floors.max()) {
        (Some(lo), Some(hi)) => hi - lo + 1,
        _ => 0,
    }
}

/// Result of [`validate_corridor_path`]. Empty `errors` means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathValidation {
    pub errors: Vec<String>,
}

impl PathValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a path before it becomes a corridor. Never fails; reasons are
/// collected as human-readable messages.
pub fn validate_corridor_path(path: &[Position]) -> PathValidation {
    let mut errors = Vec::new();

    if path.len() < 2 {
        errors.push(format!(
            "A corridor needs at least 2 points, got {}.",
            path.len()
        ));
    }

    for (i, p) in path.iter().enumerate() {
        if p.floor.is_none() {
            errors.push(format!("Point {} has no floor information.", i + 1));
        }
    }

    let span = floor_span(path);
    if span > MAX_FLOOR_SPAN {
        errors.push(format!(
            "Corridor spans too many floors ({span}); the maximum is {MAX_FLOOR_SPAN}."
        ));
    }

    PathValidation { errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ElementId;
    use pretty_assertions::assert_eq;

    fn p(x: f64, floor: i32) -> Position {
        Position::on_floor(x, 0.0, floor)
    }

    #[test]
    fn one_segment_per_pair() {
        let segs = generate_segments(&[p(0.0, 0), p(1.0, 0), p(2.0, 1)]);
        assert_eq!(segs.len(), 2);
        assert!(!segs[0].is_cross_floor);
        assert!(segs[1].is_cross_floor);
        assert_eq!((segs[1].start_floor, segs[1].end_floor), (0, 1));
        for s in &segs {
            assert_eq!(s.is_cross_floor, s.start_floor != s.end_floor);
        }
    }

    #[test]
    fn missing_floor_defaults_to_ground() {
        let segs = generate_segments(&[Position::new(0.0, 0.0), p(3.0, 0)]);
        assert_eq!(segs[0].start_floor, 0);
        assert!(!segs[0].is_cross_floor);
    }

    #[test]
    fn short_paths_have_no_segments() {
        assert!(generate_segments(&[]).is_empty());
        assert!(generate_segments(&[p(0.0, 0)]).is_empty());
    }

    #[test]
    fn floor_filter_keeps_touching_segments() {
        let c = Corridor::new(
            ElementId::intern("C_filter"),
            vec![p(0.0, 0), p(1.0, 1), p(2.0, 2)],
        );
        assert_eq!(segments_on_floor(&c, 0).count(), 1);
        assert_eq!(segments_on_floor(&c, 1).count(), 2);
        assert_eq!(segments_on_floor(&c, 3).count(), 0);
    }

    #[test]
    fn cross_floor_style_dims_off_floor() {
        let seg = generate_segments(&[p(0.0, 0), p(1.0, 2)])[0];
        let on = segment_style(&seg, 2);
        assert!(on.dashed);
        assert_eq!(on.opacity, 1.0);
        assert_eq!(on.color, CROSS_FLOOR_COLOR);

        let off = segment_style(&seg, 1);
        assert!(off.dashed);
        assert_eq!(off.opacity, DIMMED_OPACITY);

        let flat = segment_style(&generate_segments(&[p(0.0, 1), p(1.0, 1)])[0], 5);
        assert_eq!(
            flat,
            SegmentStyle {
                color: BASE_COLOR,
                opacity: 1.0,
                dashed: false
            }
        );
    }

    #[test]
    fn transitions_mark_first_vertex_on_new_floor() {
        let path = [p(0.0, 0), p(1.0, 0), p(2.0, 1), p(3.0, 1), p(4.0, 0)];
        assert_eq!(floor_transitions(&path), vec![2, 4]);
    }

    #[test]
    fn five_floor_span_passes_six_fails() {
        let five: Vec<_> = (0..5).map(|f| p(f as f64, f)).collect();
        assert!(validate_corridor_path(&five).is_valid());

        let six: Vec<_> = (0..6).map(|f| p(f as f64, f)).collect();
        let result = validate_corridor_path(&six);
        assert!(!result.is_valid());
        assert!(result.errors[0].contains("too many floors"));
    }

    #[test]
    fn validation_collects_every_reason() {
        let result = validate_corridor_path(&[Position::new(0.0, 0.0)]);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("at least 2 points"));
        assert!(result.errors[1].contains("no floor information"));
    }
}
