//! Runtime traversal graph built from authored level data.
//!
//! Node identity is the grid [`Position`]. Topology never changes after
//! construction; only node kinds (enemy nodes are consumed on spawn) and the
//! `used` flag of breakable edges mutate while a level is active.

use std::collections::HashMap;

use thief_master_core::{
    Direction, EdgeKind, EdgeRecord, LevelData, NodeKind, NodeRecord, Position,
};

/// Single node of the level graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    id: Position,
    kind: NodeKind,
    destroyed: bool,
}

impl Node {
    /// Grid position identifying the node.
    #[must_use]
    pub const fn id(&self) -> Position {
        self.id
    }

    /// Role the node plays within the level.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Reports whether the node has been removed from traversal.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Index of an edge inside its owning [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(usize);

/// Connection between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    from: Position,
    to: Position,
    kind: EdgeKind,
    used: bool,
}

impl Edge {
    /// Endpoint the edge leaves from.
    #[must_use]
    pub const fn from(&self) -> Position {
        self.from
    }

    /// Endpoint the edge leads to.
    #[must_use]
    pub const fn to(&self) -> Position {
        self.to
    }

    /// Traversal rule applied to the edge.
    #[must_use]
    pub const fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// Reports whether an actor already crossed this edge.
    #[must_use]
    pub const fn is_used(&self) -> bool {
        self.used
    }

    /// Reports whether a breakable edge was spent.
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        matches!(self.kind, EdgeKind::Breakable) && self.used
    }

    /// Endpoint reached when leaving `origin` along this edge, honouring direction.
    fn leads_from(&self, origin: Position) -> Option<Position> {
        if self.from == origin {
            Some(self.to)
        } else if self.to == origin && self.kind.is_bidirectional() {
            Some(self.from)
        } else {
            None
        }
    }
}

/// Non-fatal anomalies noticed while building a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelWarning {
    /// The level defines no start node, so the player cannot be placed.
    MissingStart,
    /// Several start nodes exist; the first one in authoring order is used.
    MultipleStarts {
        /// Number of start nodes found.
        count: usize,
    },
    /// The level defines no goal node.
    MissingGoal,
    /// A node record reused a position that an earlier record already claimed.
    DuplicateNode {
        /// Position claimed twice.
        at: Position,
    },
    /// An edge referenced a position without a node and was dropped.
    DroppedEdge {
        /// Endpoint the edge left from.
        from: Position,
        /// Endpoint the edge led to.
        to: Position,
    },
    /// An edge connected a node to itself and was dropped.
    SelfEdge {
        /// Position of the node.
        at: Position,
    },
}

/// Traversal graph for a single level instance.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: HashMap<Position, Node>,
    order: Vec<Position>,
    edges: Vec<Edge>,
    incident: HashMap<Position, Vec<EdgeIndex>>,
}

impl Graph {
    /// Builds a graph from authored level data.
    #[must_use]
    pub fn from_level(level: &LevelData) -> Self {
        Self::build(&level.nodes, &level.edges).0
    }

    /// Builds a graph from authored records, reporting any dropped input.
    ///
    /// The first record claiming a position wins. Edges whose endpoints do not
    /// resolve to constructed nodes, or that connect a node to itself, are
    /// dropped.
    #[must_use]
    pub fn build(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> (Self, Vec<LevelWarning>) {
        let mut graph = Self::default();
        let mut warnings = Vec::new();

        for record in nodes {
            if graph.nodes.contains_key(&record.position) {
                warnings.push(LevelWarning::DuplicateNode {
                    at: record.position,
                });
                continue;
            }

            let _ = graph.nodes.insert(
                record.position,
                Node {
                    id: record.position,
                    kind: record.kind,
                    destroyed: record.destroyed,
                },
            );
            graph.order.push(record.position);
        }

        for record in edges {
            if record.from == record.to {
                warnings.push(LevelWarning::SelfEdge { at: record.from });
                continue;
            }

            if !graph.nodes.contains_key(&record.from) || !graph.nodes.contains_key(&record.to) {
                warnings.push(LevelWarning::DroppedEdge {
                    from: record.from,
                    to: record.to,
                });
                continue;
            }

            let index = EdgeIndex(graph.edges.len());
            graph.edges.push(Edge {
                from: record.from,
                to: record.to,
                kind: record.kind,
                used: record.used,
            });
            graph.incident.entry(record.from).or_default().push(index);
            graph.incident.entry(record.to).or_default().push(index);
        }

        let starts = graph.nodes_of_kind(NodeKind::Start).count();
        match starts {
            0 => warnings.push(LevelWarning::MissingStart),
            1 => {}
            count => warnings.push(LevelWarning::MultipleStarts { count }),
        }
        if graph.nodes_of_kind(NodeKind::Goal).next().is_none() {
            warnings.push(LevelWarning::MissingGoal);
        }

        (graph, warnings)
    }

    /// Looks up the node at `position`.
    #[must_use]
    pub fn node(&self, position: Position) -> Option<&Node> {
        self.nodes.get(&position)
    }

    /// First start node in authoring order.
    #[must_use]
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes_of_kind(NodeKind::Start).next()
    }

    /// Nodes in authoring order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|position| self.nodes.get(position))
    }

    /// Nodes of the provided kind in authoring order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes().filter(move |node| node.kind == kind)
    }

    /// Edges in authoring order, excluding dropped records.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Retrieves an edge by index.
    #[must_use]
    pub fn edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.edges.get(index.0)
    }

    /// Finds the edge leading from `from` to its neighbour in `direction`.
    ///
    /// Directed edges are only found from their `from` endpoint. Returns
    /// `None` when the neighbour is missing or destroyed. Spent breakable
    /// edges are still reported; use [`Graph::can_move_from_to`] to decide
    /// traversability.
    #[must_use]
    pub fn find_edge(&self, from: Position, direction: Direction) -> Option<&Edge> {
        let target = from.step(direction);
        let node = self.node(target)?;
        if node.destroyed {
            return None;
        }

        self.edges_leading(from, target)
            .next()
            .and_then(|index| self.edge(index))
    }

    /// Reports whether an actor standing on `from` may move onto `to`.
    #[must_use]
    pub fn can_move_from_to(&self, from: Position, to: Position) -> bool {
        self.traversable_edge(from, to).is_some()
    }

    /// Index of the first edge an actor could cross from `from` to `to`.
    #[must_use]
    pub fn traversable_edge(&self, from: Position, to: Position) -> Option<EdgeIndex> {
        let (Some(origin), Some(target)) = (self.node(from), self.node(to)) else {
            return None;
        };
        if origin.destroyed || target.destroyed {
            return None;
        }

        self.edges_leading(from, to).find(|index| {
            self.edge(*index)
                .map_or(false, |edge| !edge.is_spent())
        })
    }

    /// Records that an actor crossed the edge, spending it when breakable.
    ///
    /// Marking an edge more than once has no further effect.
    pub fn mark_used(&mut self, index: EdgeIndex) {
        if let Some(edge) = self.edges.get_mut(index.0) {
            edge.used = true;
        }
    }

    pub(crate) fn set_kind(&mut self, position: Position, kind: NodeKind) {
        if let Some(node) = self.nodes.get_mut(&position) {
            node.kind = kind;
        }
    }

    fn edges_leading(&self, from: Position, to: Position) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.incident
            .get(&from)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |index| {
                self.edge(*index)
                    .and_then(|edge| edge.leads_from(from))
                    .map_or(false, |destination| destination == to)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(x: i32, y: i32) -> NodeRecord {
        NodeRecord::new(Position::new(x, y), NodeKind::Normal)
    }

    fn edge(from: (i32, i32), to: (i32, i32), kind: EdgeKind) -> EdgeRecord {
        EdgeRecord::new(
            Position::new(from.0, from.1),
            Position::new(to.0, to.1),
            kind,
        )
    }

    fn line(kind: EdgeKind) -> Graph {
        let (graph, _) = Graph::build(&[node(0, 0), node(1, 0)], &[edge((0, 0), (1, 0), kind)]);
        graph
    }

    #[test]
    fn standard_edges_are_bidirectional() {
        let graph = line(EdgeKind::Standard);
        assert!(graph.can_move_from_to(Position::new(0, 0), Position::new(1, 0)));
        assert!(graph.can_move_from_to(Position::new(1, 0), Position::new(0, 0)));
    }

    #[test]
    fn directed_edges_only_allow_forward_travel() {
        let graph = line(EdgeKind::Directed);
        assert!(graph.can_move_from_to(Position::new(0, 0), Position::new(1, 0)));
        assert!(!graph.can_move_from_to(Position::new(1, 0), Position::new(0, 0)));
        assert!(graph.find_edge(Position::new(1, 0), Direction::Left).is_none());
        assert!(graph.find_edge(Position::new(0, 0), Direction::Right).is_some());
    }

    #[test]
    fn separate_reverse_edge_reopens_directed_pair() {
        let (graph, _) = Graph::build(
            &[node(0, 0), node(1, 0)],
            &[
                edge((0, 0), (1, 0), EdgeKind::Directed),
                edge((1, 0), (0, 0), EdgeKind::Directed),
            ],
        );
        assert!(graph.can_move_from_to(Position::new(1, 0), Position::new(0, 0)));
    }

    #[test]
    fn spent_breakable_edge_blocks_both_directions() {
        let mut graph = line(EdgeKind::Breakable);
        let index = graph
            .traversable_edge(Position::new(0, 0), Position::new(1, 0))
            .expect("edge traversable before use");

        graph.mark_used(index);
        assert!(!graph.can_move_from_to(Position::new(0, 0), Position::new(1, 0)));
        assert!(!graph.can_move_from_to(Position::new(1, 0), Position::new(0, 0)));

        graph.mark_used(index);
        assert!(!graph.can_move_from_to(Position::new(0, 0), Position::new(1, 0)));
        assert!(graph.edge(index).expect("edge exists").is_spent());
    }

    #[test]
    fn used_standard_edge_stays_open() {
        let mut graph = line(EdgeKind::Standard);
        let index = graph
            .traversable_edge(Position::new(0, 0), Position::new(1, 0))
            .expect("edge traversable");
        graph.mark_used(index);
        assert!(graph.can_move_from_to(Position::new(1, 0), Position::new(0, 0)));
    }

    #[test]
    fn destroyed_nodes_are_excluded_from_traversal() {
        let mut destroyed = node(1, 0);
        destroyed.destroyed = true;
        let (graph, _) = Graph::build(
            &[node(0, 0), destroyed],
            &[edge((0, 0), (1, 0), EdgeKind::Standard)],
        );

        assert!(!graph.can_move_from_to(Position::new(0, 0), Position::new(1, 0)));
        assert!(!graph.can_move_from_to(Position::new(1, 0), Position::new(0, 0)));
        assert!(graph.find_edge(Position::new(0, 0), Direction::Right).is_none());
        assert!(graph
            .node(Position::new(1, 0))
            .expect("destroyed node kept")
            .is_destroyed());
    }

    #[test]
    fn edges_to_unknown_nodes_are_dropped() {
        let (graph, warnings) = Graph::build(
            &[node(0, 0)],
            &[edge((0, 0), (1, 0), EdgeKind::Standard)],
        );
        assert!(graph.edges().is_empty());
        assert!(warnings.contains(&LevelWarning::DroppedEdge {
            from: Position::new(0, 0),
            to: Position::new(1, 0),
        }));
    }

    #[test]
    fn self_edges_are_never_traversable() {
        let (graph, warnings) = Graph::build(
            &[node(0, 0), node(1, 0)],
            &[
                edge((0, 0), (0, 0), EdgeKind::Standard),
                edge((0, 0), (1, 0), EdgeKind::Standard),
            ],
        );
        assert!(warnings.contains(&LevelWarning::SelfEdge {
            at: Position::new(0, 0)
        }));
        for node in graph.nodes() {
            assert!(!graph.can_move_from_to(node.id(), node.id()));
        }
    }

    #[test]
    fn start_node_prefers_authoring_order() {
        let (graph, warnings) = Graph::build(
            &[
                node(5, 5),
                NodeRecord::new(Position::new(2, 0), NodeKind::Start),
                NodeRecord::new(Position::new(1, 0), NodeKind::Start),
                NodeRecord::new(Position::new(3, 0), NodeKind::Goal),
            ],
            &[],
        );
        assert_eq!(
            graph.start_node().map(Node::id),
            Some(Position::new(2, 0))
        );
        assert_eq!(warnings, vec![LevelWarning::MultipleStarts { count: 2 }]);
    }

    #[test]
    fn duplicate_positions_keep_first_record() {
        let (graph, warnings) = Graph::build(
            &[
                NodeRecord::new(Position::new(0, 0), NodeKind::Goal),
                NodeRecord::new(Position::new(0, 0), NodeKind::Start),
            ],
            &[],
        );
        assert_eq!(
            graph.node(Position::new(0, 0)).map(Node::kind),
            Some(NodeKind::Goal)
        );
        assert!(warnings.contains(&LevelWarning::DuplicateNode {
            at: Position::new(0, 0)
        }));
        assert!(warnings.contains(&LevelWarning::MissingStart));
    }

    #[test]
    fn find_edge_checks_both_orientations_for_undirected_edges() {
        let graph = line(EdgeKind::Slippery);
        let found = graph
            .find_edge(Position::new(1, 0), Direction::Left)
            .expect("slippery edge found from its to endpoint");
        assert_eq!(found.from(), Position::new(0, 0));
        assert!(graph.find_edge(Position::new(1, 0), Direction::Up).is_none());
    }
}
