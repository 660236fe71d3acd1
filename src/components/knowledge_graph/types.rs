use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a concept node.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
	/// Wraps any string-like id.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Borrow the raw id.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

/// Handle of an edge inside one loaded graph. Handles are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

/// A 2-D point, in graph or screen space depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
	}
}

/// Layout output: one position per node, kept apart from the model.
pub type Positions = HashMap<NodeId, Point>;

/// Width and height of the drawing area in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
	/// Width in pixels.
	pub width: f64,
	/// Height in pixels.
	pub height: f64,
}

impl ViewportSize {
	/// Size of `width` by `height` pixels.
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Midpoint of the drawing area.
	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}
}

fn default_importance() -> f64 {
	1.0
}

fn default_strength() -> f64 {
	0.5
}

/// A concept node as delivered by the graph source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	/// Unique within one graph.
	pub id: NodeId,
	/// Display label, also the search target.
	pub label: String,
	/// Subject used by the subject filter.
	#[serde(default)]
	pub subject: Option<String>,
	/// Relative weight driving the node radius.
	#[serde(default = "default_importance")]
	pub importance: f64,
	/// Learner mastery, 0 to 100.
	#[serde(default)]
	pub mastery: f64,
	/// Completed concepts are drawn translucent.
	#[serde(default)]
	pub is_completed: bool,
	/// Prerequisites get a dashed border.
	#[serde(default)]
	pub is_prerequisite: bool,
}

impl GraphNode {
	/// Node with default importance and no mastery.
	pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			id: NodeId::new(id),
			label: label.into(),
			subject: None,
			importance: default_importance(),
			mastery: 0.0,
			is_completed: false,
			is_prerequisite: false,
		}
	}

	/// Set the subject.
	pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = Some(subject.into());
		self
	}

	/// Set the mastery percentage.
	pub fn with_mastery(mut self, mastery: f64) -> Self {
		self.mastery = mastery;
		self
	}

	/// Set the importance weight.
	pub fn with_importance(mut self, importance: f64) -> Self {
		self.importance = importance;
		self
	}
}

/// A prerequisite or related-concept relationship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
	/// Prerequisite side.
	pub source: NodeId,
	/// Dependent side.
	pub target: NodeId,
	/// Relationship weight in `(0, 1]`; drives link distance and line width.
	#[serde(default = "default_strength")]
	pub strength: f64,
}

impl GraphEdge {
	/// Edge with the default strength of 0.5.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: NodeId::new(source),
			target: NodeId::new(target),
			strength: default_strength(),
		}
	}

	/// Set the relationship strength.
	pub fn with_strength(mut self, strength: f64) -> Self {
		self.strength = strength;
		self
	}
}

/// Graph payload from the source: nodes and edges, in order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	/// Nodes in insertion order.
	pub nodes: Vec<GraphNode>,
	/// Edges; both endpoints must name nodes in `nodes`.
	pub edges: Vec<GraphEdge>,
}

/// Per-user mastery percentages keyed by node id.
pub type MasteryMap = HashMap<NodeId, f64>;

/// Graph plus the user's mastery, ready to hand to the engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedGraph {
	/// Nodes and edges.
	pub data: GraphData,
	/// Mastery to merge into the nodes, unknown ids are ignored.
	pub mastery: MasteryMap,
}

/// One step of a recommended traversal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
	/// Edge start.
	pub source: NodeId,
	/// Edge end.
	pub target: NodeId,
}

/// Recommended traversal returned by the learning-path source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
	/// Ordered steps.
	pub path: Vec<PathStep>,
	/// Estimated time to complete the path, in minutes.
	#[serde(default)]
	pub estimated_time: f64,
}

/// Ordered edge sequence drawn with emphasis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightedPath {
	steps: Vec<PathStep>,
}

impl HighlightedPath {
	/// Path over the given steps, in order.
	pub fn new(steps: Vec<PathStep>) -> Self {
		Self { steps }
	}

	/// Steps in traversal order.
	pub fn steps(&self) -> &[PathStep] {
		&self.steps
	}

	/// No steps at all.
	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Whether the path uses the edge `source -> target`.
	pub fn contains(&self, source: &NodeId, target: &NodeId) -> bool {
		self.steps
			.iter()
			.any(|s| &s.source == source && &s.target == target)
	}
}

impl From<LearningPath> for HighlightedPath {
	fn from(path: LearningPath) -> Self {
		Self::new(path.path)
	}
}
