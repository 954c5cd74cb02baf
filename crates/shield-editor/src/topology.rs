use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::Dfs;
use shield_model::{Connection, NodeId, NodeKind, ProjectCanvasState};
use std::collections::HashMap;

/// Read-only directed view of the diagram: one graph node per canvas
/// node, one edge per connection whose endpoints both exist.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    graph: StableDiGraph<NodeId, ()>,
    index: HashMap<NodeId, NodeIndex>,
    kinds: HashMap<NodeId, NodeKind>,
    order: Vec<NodeId>,
    dangling: Vec<Connection>,
}

impl Topology {
    pub fn from_canvas(canvas: &ProjectCanvasState) -> Self {
        let mut graph = StableDiGraph::new();
        let mut index = HashMap::new();
        let mut kinds = HashMap::new();
        let mut order = Vec::with_capacity(canvas.nodes().len());

        for node in canvas.nodes() {
            let idx = graph.add_node(node.id);
            index.insert(node.id, idx);
            kinds.insert(node.id, node.kind);
            order.push(node.id);
        }

        let mut dangling = Vec::new();
        for connection in canvas.connections() {
            match (index.get(&connection.from), index.get(&connection.to))
            {
                (Some(&a), Some(&b)) => {
                    graph.add_edge(a, b, ());
                }
                _ => dangling.push(*connection),
            }
        }

        if !dangling.is_empty() {
            tracing::debug!(
                dangling = dangling.len(),
                "connections reference missing nodes"
            );
        }

        Self {
            graph,
            index,
            kinds,
            order,
            dangling,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes with a connection into `id`, each listed once.
    pub fn feeders(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut feeders: Vec<NodeId> = Vec::new();
        for n in self.graph.neighbors_directed(idx, Direction::Incoming) {
            let feeder = self.graph[n];
            if !feeders.contains(&feeder) {
                feeders.push(feeder);
            }
        }
        feeders.sort();
        feeders
    }

    /// Every node reachable from `id`, excluding `id` itself unless a
    /// cycle leads back to it.
    pub fn downstream(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&start) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut reached = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            if idx != start {
                reached.push(self.graph[idx]);
            }
        }
        let cycles_back = self
            .graph
            .neighbors_directed(start, Direction::Incoming)
            .any(|n| n == start || reached.contains(&self.graph[n]));
        if cycles_back {
            reached.push(id);
        }
        reached.sort();
        reached
    }

    /// Connections whose endpoints are not in the node set.
    pub fn dangling_connections(&self) -> &[Connection] {
        &self.dangling
    }

    /// Shield nodes in insertion order.
    pub fn shield_ids(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.kinds.get(id).is_some_and(NodeKind::is_shield)
            })
            .collect()
    }

    /// Node counts per kind tag, in tag order.
    pub fn kind_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = vec![
            ("shield", 0),
            ("power_source", 0),
            ("transformer", 0),
            ("generator", 0),
        ];
        for kind in self.kinds.values() {
            if let Some(entry) =
                counts.iter_mut().find(|(tag, _)| *tag == kind.tag())
            {
                entry.1 += 1;
            }
        }
        counts
    }
}
