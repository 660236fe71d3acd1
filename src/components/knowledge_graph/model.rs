use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};

use super::error::GraphIntegrityError;
use super::types::{EdgeId, GraphData, GraphEdge, GraphNode, MasteryMap, NodeId, Point, Positions};

/// A node as stored in the model.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Unique id.
	pub id: NodeId,
	/// Display label.
	pub label: String,
	/// Subject for filtering.
	pub subject: Option<String>,
	/// Radius weight.
	pub importance: f64,
	/// Clamped to 0..=100.
	pub mastery: f64,
	/// Drawn at full opacity.
	pub is_completed: bool,
	/// Drawn with a dashed border.
	pub is_prerequisite: bool,
	/// Last committed layout position; `None` until a layout has run.
	pub position: Option<Point>,
	/// Held in place by the last tree or radial layout.
	pub pinned: bool,
}

impl From<GraphNode> for Node {
	fn from(node: GraphNode) -> Self {
		Self {
			id: node.id,
			label: node.label,
			subject: node.subject,
			importance: node.importance,
			mastery: clamp_mastery(node.mastery),
			is_completed: node.is_completed,
			is_prerequisite: node.is_prerequisite,
			position: None,
			pinned: false,
		}
	}
}

fn clamp_mastery(mastery: f64) -> f64 {
	if mastery.is_nan() {
		0.0
	} else {
		mastery.clamp(0.0, 100.0)
	}
}

/// An edge as stored in the model.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	/// Handle, unique within one loaded graph.
	pub id: EdgeId,
	/// Start node.
	pub source: NodeId,
	/// End node.
	pub target: NodeId,
	/// Clamped to `[0.01, 1]`.
	pub strength: f64,
}

impl Edge {
	/// Whether `id` is either endpoint.
	pub fn touches(&self, id: &NodeId) -> bool {
		&self.source == id || &self.target == id
	}
}

/// Node arena indexed by id plus the edge set.
///
/// Nodes keep their insertion slot for the lifetime of the graph, so
/// iteration order is load order even after removals.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Option<Node>>,
	index: HashMap<NodeId, usize>,
	edges: BTreeMap<EdgeId, Edge>,
	next_edge: u32,
	retired: HashSet<NodeId>,
}

impl GraphModel {
	/// Empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the whole graph. On error the current graph is left as it was.
	pub fn set_graph(&mut self, data: GraphData) -> Result<(), GraphIntegrityError> {
		let mut next = GraphModel::new();
		for node in data.nodes {
			next.add_node(node)?;
		}
		for edge in data.edges {
			next.add_edge(edge)?;
		}
		debug!(
			"graph replaced: {} nodes, {} edges",
			next.node_count(),
			next.edge_count()
		);
		*self = next;
		Ok(())
	}

	/// Drop every node and edge and forget retired ids.
	pub fn clear(&mut self) {
		*self = GraphModel::new();
	}

	/// No nodes.
	pub fn is_empty(&self) -> bool {
		self.index.is_empty()
	}

	/// Live node count.
	pub fn node_count(&self) -> usize {
		self.index.len()
	}

	/// Live edge count.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Whether a live node has this id.
	pub fn contains(&self, id: &NodeId) -> bool {
		self.index.contains_key(id)
	}

	/// Live node by id.
	pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
		self.index.get(id).and_then(|&slot| self.nodes[slot].as_ref())
	}

	pub(crate) fn get_node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
		let slot = *self.index.get(id)?;
		self.nodes[slot].as_mut()
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter().flatten()
	}

	/// Edges in handle order.
	pub fn edges(&self) -> impl Iterator<Item = &Edge> {
		self.edges.values()
	}

	/// Edge by handle.
	pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
		self.edges.get(&id)
	}

	/// Edges where `id` is source or target.
	pub fn get_edges_for(&self, id: &NodeId) -> Vec<&Edge> {
		self.edges.values().filter(|e| e.touches(id)).collect()
	}

	/// Nodes one edge away from `id`, in either direction.
	pub fn neighbors(&self, id: &NodeId) -> HashSet<NodeId> {
		self.edges
			.values()
			.filter_map(|e| {
				if &e.source == id {
					Some(e.target.clone())
				} else if &e.target == id {
					Some(e.source.clone())
				} else {
					None
				}
			})
			.collect()
	}

	/// Insert a node. Duplicate and retired ids are rejected.
	pub fn add_node(&mut self, node: GraphNode) -> Result<(), GraphIntegrityError> {
		if self.index.contains_key(&node.id) {
			warn!("rejected duplicate node {}", node.id);
			return Err(GraphIntegrityError::DuplicateNode(node.id));
		}
		if self.retired.contains(&node.id) {
			warn!("rejected reuse of removed node id {}", node.id);
			return Err(GraphIntegrityError::RetiredNodeId(node.id));
		}
		self.index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(Some(node.into()));
		Ok(())
	}

	/// Remove a node and every edge touching it. Returns the removed edges.
	pub fn remove_node(&mut self, id: &NodeId) -> Result<Vec<Edge>, GraphIntegrityError> {
		let slot = self
			.index
			.remove(id)
			.ok_or_else(|| GraphIntegrityError::UnknownNode(id.clone()))?;
		self.nodes[slot] = None;
		self.retired.insert(id.clone());

		let doomed: Vec<EdgeId> = self
			.edges
			.values()
			.filter(|e| e.touches(id))
			.map(|e| e.id)
			.collect();
		Ok(doomed
			.into_iter()
			.filter_map(|edge_id| self.edges.remove(&edge_id))
			.collect())
	}

	/// Insert an edge between two existing nodes.
	pub fn add_edge(&mut self, edge: GraphEdge) -> Result<EdgeId, GraphIntegrityError> {
		for end in [&edge.source, &edge.target] {
			if !self.index.contains_key(end) {
				warn!(
					"rejected dangling edge {} -> {} (missing {})",
					edge.source, edge.target, end
				);
				return Err(GraphIntegrityError::DanglingEdge {
					from: edge.source.clone(),
					to: edge.target.clone(),
					missing: end.clone(),
				});
			}
		}
		let id = EdgeId(self.next_edge);
		self.next_edge += 1;
		self.edges.insert(
			id,
			Edge {
				id,
				source: edge.source,
				target: edge.target,
				strength: edge.strength.clamp(0.0, 1.0),
			},
		);
		Ok(id)
	}

	/// Remove one edge, returning it.
	pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, GraphIntegrityError> {
		self.edges
			.remove(&id)
			.ok_or(GraphIntegrityError::UnknownEdge(id))
	}

	/// Merge per-user mastery into matching nodes. Unknown ids are ignored.
	pub fn apply_mastery(&mut self, mastery: &MasteryMap) {
		for (id, value) in mastery {
			if let Some(node) = self.get_node_mut(id) {
				node.mastery = clamp_mastery(*value);
			}
		}
	}

	/// Copy layout output into the nodes it names.
	pub fn commit_positions(&mut self, positions: &Positions) {
		for node in self.nodes.iter_mut().flatten() {
			if let Some(p) = positions.get(&node.id) {
				node.position = Some(*p);
			}
		}
	}

	/// Set the pin flag on every node.
	pub fn set_all_pinned(&mut self, pinned: bool) {
		for node in self.nodes.iter_mut().flatten() {
			node.pinned = pinned;
		}
	}
}
