//! Journey sequencer: linear visiting order + journey edge regeneration.
//!
//! Nodes and corridors form a directed graph (`from → corridor → to`).
//! The journey order is a depth-first walk from every entrance and every
//! node without an incoming corridor, in node array order. Outgoing
//! corridors are taken in corridor array order. A node is entered at most
//! once, so cycles terminate; a corridor whose target was already entered
//! is still placed in the order, and is listed in
//! [`SequenceReport::superseded`] because the journey does not continue
//! into its target from there.
//!
//! Anything the walk never reaches keeps its relative position from the
//! previous order and is appended at the end.

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use wayfind_core::id::ElementId;
use wayfind_core::model::{Corridor, Edge, ElementKind, Node, NodeType, PathSequenceItem};

/// A corridor whose target node had already been entered by the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupersededLink {
    pub corridor: ElementId,
    pub target: ElementId,
}

/// What the last rebuild had to work around.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReport {
    pub superseded: Vec<SupersededLink>,
    /// Items not reachable from any start node, in appended order.
    pub unreached: Vec<ElementId>,
    pub has_cycles: bool,
}

/// Directed view over nodes and corridors.
struct JourneyGraph<'a> {
    graph: DiGraph<(ElementId, ElementKind), ()>,
    index: HashMap<ElementId, NodeIndex>,
    nodes: &'a [Node],
}

impl<'a> JourneyGraph<'a> {
    fn build(nodes: &'a [Node], corridors: &[Corridor]) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for node in nodes {
            index.insert(node.id, graph.add_node((node.id, ElementKind::Node)));
        }
        let node_ids: HashSet<ElementId> = nodes.iter().map(|n| n.id).collect();
        for corridor in corridors {
            index.insert(corridor.id, graph.add_node((corridor.id, ElementKind::Corridor)));
        }
        // Edge indices grow with corridor array order; the walk relies on it.
        for corridor in corridors {
            let c = index[&corridor.id];
            if let Some(from) = corridor.from.filter(|id| node_ids.contains(id)) {
                graph.add_edge(index[&from], c, ());
            }
            if let Some(to) = corridor.to.filter(|id| node_ids.contains(id)) {
                graph.add_edge(c, index[&to], ());
            }
        }
        Self {
            graph,
            index,
            nodes,
        }
    }

    fn start_nodes(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .map(|n| (n, self.index[&n.id]))
            .filter(|(n, idx)| {
                n.node_type == NodeType::EntranceExit
                    || self
                        .graph
                        .neighbors_directed(*idx, Direction::Incoming)
                        .next()
                        .is_none()
            })
            .map(|(_, idx)| idx)
            .collect()
    }

    /// Outgoing neighbors in insertion order.
    fn outgoing(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, target)| target).collect()
    }
}

struct Walk<'g, 'a> {
    journey: &'g JourneyGraph<'a>,
    entered: HashSet<NodeIndex>,
    appended: HashSet<ElementId>,
    order: Vec<(ElementId, ElementKind)>,
    report: SequenceReport,
}

impl Walk<'_, '_> {
    fn append(&mut self, item: (ElementId, ElementKind)) {
        if self.appended.insert(item.0) {
            self.order.push(item);
        }
    }

    fn enter(&mut self, node: NodeIndex) {
        if !self.entered.insert(node) {
            return;
        }
        self.append(self.journey.graph[node]);
        for corridor in self.journey.outgoing(node) {
            self.append(self.journey.graph[corridor]);
            for target in self.journey.outgoing(corridor) {
                if self.entered.contains(&target) {
                    self.report.superseded.push(SupersededLink {
                        corridor: self.journey.graph[corridor].0,
                        target: self.journey.graph[target].0,
                    });
                } else {
                    self.enter(target);
                }
            }
        }
    }
}

/// Rebuild the visiting order over `nodes` and `corridors`.
///
/// `previous` only decides where unreachable items go. Items in `previous`
/// that no longer exist are dropped. Orders are dense and zero-based.
pub fn reorder_path_sequence(
    nodes: &[Node],
    corridors: &[Corridor],
    previous: &[PathSequenceItem],
) -> (Vec<PathSequenceItem>, SequenceReport) {
    let journey = JourneyGraph::build(nodes, corridors);
    let mut walk = Walk {
        journey: &journey,
        entered: HashSet::new(),
        appended: HashSet::new(),
        order: Vec::with_capacity(nodes.len() + corridors.len()),
        report: SequenceReport {
            has_cycles: is_cyclic_directed(&journey.graph),
            ..Default::default()
        },
    };

    for start in journey.start_nodes() {
        walk.enter(start);
    }

    let mut previous = previous.to_vec();
    previous.sort_by_key(|item| item.order);
    let leftovers = previous
        .iter()
        .map(|item| item.id)
        .chain(nodes.iter().map(|n| n.id))
        .chain(corridors.iter().map(|c| c.id));
    for id in leftovers {
        if walk.appended.contains(&id) {
            continue;
        }
        if let Some(&idx) = journey.index.get(&id) {
            walk.append(journey.graph[idx]);
            walk.report.unreached.push(id);
        }
    }

    let sequence = walk
        .order
        .into_iter()
        .enumerate()
        .map(|(order, (id, kind))| PathSequenceItem { id, kind, order })
        .collect();
    (sequence, walk.report)
}

/// Journey edges between consecutive items of `sequence`.
///
/// Decision properties and design intent of an edge id that already
/// existed in `previous` are carried over unchanged.
pub fn regenerate_edges(sequence: &[PathSequenceItem], previous: &[Edge]) -> Vec<Edge> {
    let mut sorted = sequence.to_vec();
    sorted.sort_by_key(|item| item.order);
    let previous: HashMap<ElementId, &Edge> = previous.iter().map(|e| (e.id, e)).collect();

    sorted
        .windows(2)
        .map(|pair| {
            let mut edge = Edge::between(pair[0].id, pair[1].id);
            if let Some(old) = previous.get(&edge.id) {
                edge.decision_properties = old.decision_properties.clone();
                edge.design_intent = old.design_intent.clone();
            }
            edge
        })
        .collect()
}

/// Reassign `order` to 0..n following the current order values.
pub fn densify(sequence: &mut Vec<PathSequenceItem>) {
    sequence.sort_by_key(|item| item.order);
    for (order, item) in sequence.iter_mut().enumerate() {
        item.order = order;
    }
}
