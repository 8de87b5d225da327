//! Hit testing: plan point → node or corridor lookup.
//!
//! Nodes are tested first by centroid distance; corridors only when no
//! node is within tolerance, by distance to each segment that touches the
//! floor being viewed.

use wayfind_core::Point;
use wayfind_core::geometry::point_segment_distance;
use wayfind_core::id::ElementId;
use wayfind_core::model::{Corridor, ElementKind, Node};
use wayfind_core::segment::segments_on_floor;

/// The element under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub id: ElementId,
    pub kind: ElementKind,
    pub distance: f64,
}

/// Find the nearest node, else the nearest corridor, within `tolerance`.
pub fn hit_test<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    corridors: impl IntoIterator<Item = &'a Corridor>,
    point: Point,
    floor: i32,
    tolerance: f64,
) -> Option<Hit> {
    let node_hit = nearest(nodes.into_iter().map(|n| Hit {
        id: n.id,
        kind: ElementKind::Node,
        distance: n.centroid().distance(point),
    }), tolerance);
    if node_hit.is_some() {
        return node_hit;
    }

    let corridor_hits = corridors.into_iter().filter_map(|c| {
        segments_on_floor(c, floor)
            .map(|s| point_segment_distance(point, s.start.to_point(), s.end.to_point()))
            .min_by(f64::total_cmp)
            .map(|distance| Hit {
                id: c.id,
                kind: ElementKind::Corridor,
                distance,
            })
    });
    nearest(corridor_hits, tolerance)
}

fn nearest(hits: impl Iterator<Item = Hit>, tolerance: f64) -> Option<Hit> {
    hits.filter(|h| h.distance <= tolerance)
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::model::{NodeType, Position};

    fn node(id: &str, x: f64, y: f64) -> Node {
        Node::new(ElementId::intern(id), NodeType::DecisionPoint, Position::on_floor(x, y, 0))
    }

    fn corridor(id: &str, a: (f64, f64), b: (f64, f64)) -> Corridor {
        Corridor::new(
            ElementId::intern(id),
            vec![Position::on_floor(a.0, a.1, 0), Position::on_floor(b.0, b.1, 0)],
        )
    }

    #[test]
    fn node_wins_over_corridor() {
        let nodes = [node("ht_N", 0.0, 0.0)];
        let corridors = [corridor("ht_C", (-10.0, 1.0), (10.0, 1.0))];
        let hit = hit_test(&nodes, &corridors, Point::new(0.0, 2.0), 0, 5.0).unwrap();
        assert_eq!(hit.id, ElementId::intern("ht_N"));
        assert_eq!(hit.kind, ElementKind::Node);
    }

    #[test]
    fn falls_back_to_nearest_corridor() {
        let nodes = [node("ht_far", 100.0, 100.0)];
        let corridors = [
            corridor("ht_C1", (0.0, 0.0), (10.0, 0.0)),
            corridor("ht_C2", (0.0, 3.0), (10.0, 3.0)),
        ];
        let hit = hit_test(&nodes, &corridors, Point::new(5.0, 2.0), 0, 5.0).unwrap();
        assert_eq!(hit.id, ElementId::intern("ht_C2"));
        assert!((hit.distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn off_floor_segments_are_ignored() {
        let corridors = [corridor("ht_C3", (0.0, 0.0), (10.0, 0.0))];
        assert!(hit_test(&[], &corridors, Point::new(5.0, 0.0), 1, 5.0).is_none());
    }

    #[test]
    fn nothing_within_tolerance() {
        let nodes = [node("ht_N2", 0.0, 0.0)];
        assert!(hit_test(&nodes, &[], Point::new(20.0, 0.0), 0, 5.0).is_none());
    }
}
