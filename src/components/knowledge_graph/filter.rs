use std::collections::HashSet;

use super::model::{GraphModel, Node};
use super::types::{EdgeId, NodeId};

/// Coarse mastery bucket the filter toggles on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MasteryBand {
	/// Mastery 0.
	NotStarted,
	/// Strictly between 0 and 100.
	InProgress,
	/// Mastery 100.
	Completed,
}

impl MasteryBand {
	/// Band for a mastery percentage.
	pub fn of(mastery: f64) -> Self {
		if mastery <= 0.0 {
			Self::NotStarted
		} else if mastery >= 100.0 {
			Self::Completed
		} else {
			Self::InProgress
		}
	}
}

/// What the user asked to see. The default shows everything.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterCriteria {
	/// Exact subject match; `None` shows every subject.
	pub subject: Option<String>,
	/// Show [`MasteryBand::NotStarted`] nodes.
	pub show_not_started: bool,
	/// Show [`MasteryBand::InProgress`] nodes.
	pub show_in_progress: bool,
	/// Show [`MasteryBand::Completed`] nodes.
	pub show_completed: bool,
	/// Last submitted search; does not affect visibility.
	pub search_query: String,
}

impl Default for FilterCriteria {
	fn default() -> Self {
		Self {
			subject: None,
			show_not_started: true,
			show_in_progress: true,
			show_completed: true,
			search_query: String::new(),
		}
	}
}

impl FilterCriteria {
	/// Whether nodes in `band` pass.
	pub fn shows_band(&self, band: MasteryBand) -> bool {
		match band {
			MasteryBand::NotStarted => self.show_not_started,
			MasteryBand::InProgress => self.show_in_progress,
			MasteryBand::Completed => self.show_completed,
		}
	}

	/// Subject and band checks together.
	pub fn admits(&self, node: &Node) -> bool {
		let subject_ok = match &self.subject {
			None => true,
			Some(subject) => node.subject.as_deref() == Some(subject.as_str()),
		};
		subject_ok && self.shows_band(MasteryBand::of(node.mastery))
	}
}

/// Visible subset of a graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Visibility {
	/// Visible node ids.
	pub nodes: HashSet<NodeId>,
	/// Visible edge handles.
	pub edges: HashSet<EdgeId>,
}

impl Visibility {
	/// Everything in `graph` visible.
	pub fn all(graph: &GraphModel) -> Self {
		compute_visibility(graph, &FilterCriteria::default())
	}

	/// Whether `id` is drawn.
	pub fn node_visible(&self, id: &NodeId) -> bool {
		self.nodes.contains(id)
	}

	/// Whether edge `id` is drawn.
	pub fn edge_visible(&self, id: EdgeId) -> bool {
		self.edges.contains(&id)
	}
}

/// An edge is visible only when both endpoints are.
pub fn compute_visibility(graph: &GraphModel, criteria: &FilterCriteria) -> Visibility {
	let nodes: HashSet<NodeId> = graph
		.nodes()
		.filter(|n| criteria.admits(n))
		.map(|n| n.id.clone())
		.collect();
	let edges = graph
		.edges()
		.filter(|e| nodes.contains(&e.source) && nodes.contains(&e.target))
		.map(|e| e.id)
		.collect();
	Visibility { nodes, edges }
}

/// Case-insensitive substring match on labels, in graph order.
/// The first match is the jump-to target for a submitted search.
///
/// Leading and trailing whitespace in `query` is dropped before matching, so
/// `"algebra "` finds "Linear Algebra" and a blank query matches nothing.
/// Inner whitespace is kept.
pub fn search(graph: &GraphModel, query: &str) -> Vec<NodeId> {
	let needle = query.trim().to_lowercase();
	if needle.is_empty() {
		return Vec::new();
	}
	graph
		.nodes()
		.filter(|n| n.label.to_lowercase().contains(&needle))
		.map(|n| n.id.clone())
		.collect()
}

/// Distinct subjects in graph order, for populating a subject picker.
pub fn subjects(graph: &GraphModel) -> Vec<String> {
	let mut seen = HashSet::new();
	graph
		.nodes()
		.filter_map(|n| n.subject.clone())
		.filter(|s| seen.insert(s.clone()))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::types::{GraphData, GraphEdge, GraphNode};

	fn graph() -> GraphModel {
		let mut model = GraphModel::new();
		model
			.set_graph(GraphData {
				nodes: vec![
					GraphNode::new("alg", "Linear Algebra")
						.with_subject("math")
						.with_mastery(100.0),
					GraphNode::new("calc", "Calculus")
						.with_subject("math")
						.with_mastery(40.0),
					GraphNode::new("mech", "Mechanics").with_subject("physics"),
					GraphNode::new("vec", "Vector algebra").with_subject("math"),
				],
				edges: vec![
					GraphEdge::new("alg", "calc"),
					GraphEdge::new("calc", "mech"),
					GraphEdge::new("vec", "alg"),
				],
			})
			.unwrap();
		model
	}

	#[test]
	fn default_criteria_show_everything() {
		let g = graph();
		let v = Visibility::all(&g);
		assert_eq!(v.nodes.len(), 4);
		assert_eq!(v.edges.len(), 3);
	}

	#[test]
	fn completed_node_hidden_even_when_subject_matches() {
		let g = graph();
		let criteria = FilterCriteria {
			subject: Some("math".into()),
			show_completed: false,
			..FilterCriteria::default()
		};
		let v = compute_visibility(&g, &criteria);
		assert!(!v.node_visible(&"alg".into()));
		assert!(v.node_visible(&"calc".into()));
		assert!(v.node_visible(&"vec".into()));
		assert!(!v.node_visible(&"mech".into()));
		// every edge touches a hidden node
		assert!(v.edges.is_empty());
	}

	#[test]
	fn bands_split_on_zero_and_hundred() {
		assert_eq!(MasteryBand::of(0.0), MasteryBand::NotStarted);
		assert_eq!(MasteryBand::of(0.1), MasteryBand::InProgress);
		assert_eq!(MasteryBand::of(99.9), MasteryBand::InProgress);
		assert_eq!(MasteryBand::of(100.0), MasteryBand::Completed);
	}

	#[test]
	fn search_is_case_insensitive_and_ordered() {
		let g = graph();
		let hits = search(&g, "ALGEBRA");
		assert_eq!(hits, vec![NodeId::from("alg"), NodeId::from("vec")]);
		assert!(search(&g, "   ").is_empty());
		assert!(search(&g, "topology").is_empty());
		assert_eq!(search(&g, " algebra "), hits);
	}

	#[test]
	fn subjects_are_unique_in_order() {
		assert_eq!(subjects(&graph()), vec!["math", "physics"]);
	}
}
