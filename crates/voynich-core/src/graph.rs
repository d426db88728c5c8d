//! State-transition multigraph.
//!
//! Nodes live in an arena indexed by [`NodeId`]; a map from
//! [`MachineState`] to id makes node identity a function of the state value
//! alone. Edges are kept in insertion order and never deduplicated.
//!
//! Construction goes through [`GraphBuilder`] (append-only); the finished
//! [`TransitionGraph`] is read-only.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::state::{MachineState, OperatorTag};
use crate::trace::ExecutionTrace;

/// Handle to a node within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// Handle to an edge within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeId(pub usize);

/// A directed, operator-labeled transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub op: OperatorTag,
    /// Position of the source token within its line.
    ///
    /// Merging keeps this value, so in a merged graph it restarts at zero
    /// for every line. The edges of one line stay contiguous and in line
    /// order; [`CorpusRun`](crate::runner::CorpusRun) keeps the per-line
    /// graphs for recovering the line boundaries.
    pub position: usize,
}

/// Append-only graph under construction.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    nodes: Vec<MachineState>,
    index: HashMap<MachineState, NodeId>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node for `state`, creating it on first sight.
    pub fn add_node(&mut self, state: MachineState) -> NodeId {
        if let Some(&id) = self.index.get(&state) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(state);
        self.index.insert(state, id);
        id
    }

    /// Append an edge. Idempotent on nodes, never on edges.
    pub fn add_edge(
        &mut self,
        from: MachineState,
        to: MachineState,
        op: OperatorTag,
        position: usize,
    ) -> EdgeId {
        let from = self.add_node(from);
        let to = self.add_node(to);
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            from,
            to,
            op,
            position,
        });
        id
    }

    /// Append a finished graph: nodes deduplicated by value, edges
    /// concatenated after the ones already present.
    pub fn extend_from(&mut self, other: &TransitionGraph) {
        let remap: Vec<NodeId> = other.nodes.iter().map(|&s| self.add_node(s)).collect();
        self.edges.extend(other.edges.iter().map(|e| Edge {
            from: remap[e.from.0],
            to: remap[e.to.0],
            op: e.op,
            position: e.position,
        }));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Freeze the graph and build adjacency lists.
    pub fn finish(self) -> TransitionGraph {
        let mut outgoing = vec![Vec::new(); self.nodes.len()];
        let mut incoming = vec![Vec::new(); self.nodes.len()];
        for (i, edge) in self.edges.iter().enumerate() {
            outgoing[edge.from.0].push(EdgeId(i));
            incoming[edge.to.0].push(EdgeId(i));
        }
        TransitionGraph {
            nodes: self.nodes,
            index: self.index,
            edges: self.edges,
            outgoing,
            incoming,
        }
    }
}

/// Read-only transition graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionGraph {
    nodes: Vec<MachineState>,
    index: HashMap<MachineState, NodeId>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
}

impl TransitionGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph by replaying a trace from empty.
    pub fn from_trace(trace: &ExecutionTrace) -> Self {
        let mut builder = GraphBuilder::new();
        for record in trace {
            builder.add_edge(
                record.state_before,
                record.state_after,
                record.op,
                record.token.position(),
            );
        }
        builder.finish()
    }

    /// Merge graphs in the given order.
    ///
    /// Edge positions are copied unchanged; they are not renumbered across
    /// the inputs.
    pub fn merge<'a, I>(graphs: I) -> Self
    where
        I: IntoIterator<Item = &'a TransitionGraph>,
    {
        let mut builder = GraphBuilder::new();
        for graph in graphs {
            builder.extend_from(graph);
        }
        builder.finish()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up the node for a state.
    pub fn node(&self, state: &MachineState) -> Option<NodeId> {
        self.index.get(state).copied()
    }

    /// The state a node stands for.
    pub fn state(&self, id: NodeId) -> Option<&MachineState> {
        self.nodes.get(id.0)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    /// Node states in first-arrival order.
    pub fn nodes(&self) -> &[MachineState] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges leaving `id`, in insertion order.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacent(&self.outgoing, id)
    }

    /// Edges entering `id`, in insertion order.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacent(&self.incoming, id)
    }

    /// Distinct states reachable in one step from `id`.
    pub fn successors(&self, id: NodeId) -> BTreeSet<MachineState> {
        self.outgoing(id)
            .filter_map(|e| self.state(e.to).copied())
            .collect()
    }

    fn adjacent<'a>(
        &'a self,
        lists: &'a [Vec<EdgeId>],
        id: NodeId,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        lists
            .get(id.0)
            .into_iter()
            .flatten()
            .map(move |e| &self.edges[e.0])
    }

    /// Node membership, independent of arrival order.
    pub fn node_set(&self) -> BTreeSet<MachineState> {
        self.nodes.iter().copied().collect()
    }

    /// Snapshot for persistence collaborators.
    pub fn export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes.clone(),
            edges: self
                .edges
                .iter()
                .map(|e| ExportEdge {
                    from: e.from.0,
                    to: e.to.0,
                    op: e.op,
                    position: e.position,
                })
                .collect(),
        }
    }
}

/// Stable, serializable form of a graph: nodes by id, edges by insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<MachineState>,
    pub edges: Vec<ExportEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportEdge {
    pub from: usize,
    pub to: usize,
    pub op: OperatorTag,
    pub position: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Flow, Phase};

    fn s(depth: u8) -> MachineState {
        MachineState::new(depth, Phase::Medial, Flow::Forward)
    }

    fn path(states: &[u8]) -> TransitionGraph {
        let mut builder = GraphBuilder::new();
        for (pos, pair) in states.windows(2).enumerate() {
            builder.add_edge(s(pair[0]), s(pair[1]), OperatorTag::Qo, pos);
        }
        builder.finish()
    }

    #[test]
    fn test_empty_graph() {
        let graph = GraphBuilder::new().finish();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph, TransitionGraph::new());
    }

    #[test]
    fn test_nodes_deduplicate_by_value() {
        let graph = path(&[0, 1, 0, 1]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_parallel_edges_kept() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(s(0), s(1), OperatorTag::Qo, 0);
        builder.add_edge(s(0), s(1), OperatorTag::Qo, 1);
        builder.add_edge(s(0), s(1), OperatorTag::Ol, 2);
        let graph = builder.finish();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_self_loop() {
        let mut builder = GraphBuilder::new();
        builder.add_edge(s(2), s(2), OperatorTag::Unclassified, 0);
        let graph = builder.finish();
        let id = graph.node(&s(2)).unwrap();
        assert_eq!(graph.outgoing(id).count(), 1);
        assert_eq!(graph.incoming(id).count(), 1);
    }

    #[test]
    fn test_adjacency_queries() {
        let graph = path(&[0, 1, 2, 1, 3]);
        let one = graph.node(&s(1)).unwrap();
        let out: Vec<usize> = graph.outgoing(one).map(|e| e.position).collect();
        let inc: Vec<usize> = graph.incoming(one).map(|e| e.position).collect();
        assert_eq!(out, vec![1, 3]);
        assert_eq!(inc, vec![0, 2]);
        assert_eq!(
            graph.successors(one),
            [s(2), s(3)].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(graph.node(&s(9)), None);
        assert_eq!(graph.outgoing(NodeId(99)).count(), 0);
    }

    #[test]
    fn test_node_identity_ignores_arrival_order() {
        let forward = path(&[0, 1, 2]);
        let backward = path(&[2, 1, 0]);
        assert_eq!(forward.node_set(), backward.node_set());
        assert_ne!(forward.nodes(), backward.nodes());
    }

    #[test]
    fn test_merge_dedups_and_concatenates() {
        let a = path(&[0, 1]);
        let b = path(&[1, 2]);
        let merged = TransitionGraph::merge([&a, &b]);
        assert_eq!(merged.node_count(), 3);
        let positions: Vec<usize> = merged.edges().iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 0]);
        let from: Vec<MachineState> = merged
            .edges()
            .iter()
            .map(|e| *merged.state(e.from).unwrap())
            .collect();
        assert_eq!(from, vec![s(0), s(1)]);
    }

    #[test]
    fn test_merge_is_associative() {
        let a = path(&[0, 1, 2]);
        let b = path(&[2, 5, 0]);
        let c = path(&[7, 1]);
        let left = TransitionGraph::merge([&TransitionGraph::merge([&a, &b]), &c]);
        let right = TransitionGraph::merge([&a, &TransitionGraph::merge([&b, &c])]);
        assert_eq!(left, right);
    }

    #[test]
    fn test_merge_order_only_affects_edges() {
        let a = path(&[0, 1]);
        let b = path(&[3, 4]);
        let ab = TransitionGraph::merge([&a, &b]);
        let ba = TransitionGraph::merge([&b, &a]);
        let transitions = |g: &TransitionGraph| -> Vec<(MachineState, MachineState)> {
            g.edges()
                .iter()
                .map(|e| (*g.state(e.from).unwrap(), *g.state(e.to).unwrap()))
                .collect()
        };
        assert_eq!(ab.node_set(), ba.node_set());
        assert_eq!(transitions(&ab), vec![(s(0), s(1)), (s(3), s(4))]);
        assert_eq!(transitions(&ba), vec![(s(3), s(4)), (s(0), s(1))]);
    }

    #[test]
    fn test_export_order() {
        let graph = path(&[0, 3, 0]);
        let export = graph.export();
        assert_eq!(export.nodes, vec![s(0), s(3)]);
        assert_eq!(
            export.edges,
            vec![
                ExportEdge { from: 0, to: 1, op: OperatorTag::Qo, position: 0 },
                ExportEdge { from: 1, to: 0, op: OperatorTag::Qo, position: 1 },
            ]
        );
    }
}
