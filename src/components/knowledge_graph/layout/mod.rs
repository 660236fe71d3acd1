mod force;
mod radial;
mod tree;

pub use force::ForceSimulation;
pub use radial::radial_layout;
pub use tree::tree_layout;

use log::{debug, info};
use serde::Deserialize;

use super::config::EngineConfig;
use super::error::LayoutInputError;
use super::model::GraphModel;
use super::types::{NodeId, Point, Positions, ViewportSize};

/// How node positions are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
	/// Live force-directed simulation.
	#[default]
	Force,
	/// Rooted hierarchy, top to bottom.
	Tree,
	/// Evenly spaced on one circle.
	Radial,
}

impl LayoutStrategy {
	/// Every strategy, in menu order.
	pub const ALL: [Self; 3] = [Self::Force, Self::Tree, Self::Radial];

	/// Human-readable name.
	pub fn label(self) -> &'static str {
		match self {
			Self::Force => "Force",
			Self::Tree => "Tree",
			Self::Radial => "Radial",
		}
	}

	/// Tree and radial layouts pin every node; the simulation never does.
	pub fn pins_nodes(self) -> bool {
		!matches!(self, Self::Force)
	}
}

/// One-shot layout. The force strategy is run to settlement.
pub fn layout_positions(
	graph: &GraphModel,
	strategy: LayoutStrategy,
	size: ViewportSize,
	config: &EngineConfig,
) -> Result<Positions, LayoutInputError> {
	if graph.is_empty() {
		return Err(LayoutInputError::EmptyGraph);
	}
	Ok(match strategy {
		LayoutStrategy::Tree => tree_layout(graph, size, config.tree_margin),
		LayoutStrategy::Radial => radial_layout(graph, size),
		LayoutStrategy::Force => {
			let mut sim =
				ForceSimulation::new(graph, size, config.node_size, config.force.clone());
			sim.run_until_settled();
			sim.positions()
		}
	})
}

/// Caller-owned layout lifecycle. Holds at most one live simulation; applying
/// any layout stops the previous one first.
#[derive(Debug)]
pub struct LayoutSession {
	config: EngineConfig,
	strategy: LayoutStrategy,
	size: ViewportSize,
	positions: Positions,
	simulation: Option<ForceSimulation>,
}

impl LayoutSession {
	/// Session with no positions and the default strategy.
	pub fn new(config: EngineConfig) -> Self {
		Self {
			config,
			strategy: LayoutStrategy::default(),
			size: ViewportSize::default(),
			positions: Positions::new(),
			simulation: None,
		}
	}

	/// Strategy of the last applied layout.
	pub fn strategy(&self) -> LayoutStrategy {
		self.strategy
	}

	/// Latest position of every node.
	pub fn positions(&self) -> &Positions {
		&self.positions
	}

	/// Latest position of `id`.
	pub fn position(&self, id: &NodeId) -> Option<Point> {
		self.positions.get(id).copied()
	}

	/// Compute positions for `graph`, commit them and the pin state to it,
	/// and start the simulation for the force strategy.
	pub fn apply_layout(
		&mut self,
		graph: &mut GraphModel,
		strategy: LayoutStrategy,
		size: ViewportSize,
	) -> &Positions {
		self.stop();
		self.strategy = strategy;
		self.size = size;

		if graph.is_empty() {
			debug!("{}", LayoutInputError::EmptyGraph);
			self.positions.clear();
			return &self.positions;
		}

		info!("applying {} layout to {} nodes", strategy.label(), graph.node_count());
		graph.set_all_pinned(strategy.pins_nodes());
		self.positions = match strategy {
			LayoutStrategy::Tree => tree_layout(graph, size, self.config.tree_margin),
			LayoutStrategy::Radial => radial_layout(graph, size),
			LayoutStrategy::Force => {
				let sim = ForceSimulation::new(
					graph,
					size,
					self.config.node_size,
					self.config.force.clone(),
				);
				let positions = sim.positions();
				self.simulation = Some(sim);
				positions
			}
		};
		graph.commit_positions(&self.positions);
		&self.positions
	}

	/// Cancel the in-flight simulation, keeping the last positions.
	pub fn stop(&mut self) {
		if self.simulation.take().is_some() {
			debug!("stopped running simulation");
		}
	}

	/// Whether a force simulation is live.
	pub fn has_simulation(&self) -> bool {
		self.simulation.is_some()
	}

	/// True when no simulation is running or it has cooled down.
	pub fn is_settled(&self) -> bool {
		self.simulation.as_ref().is_none_or(ForceSimulation::is_settled)
	}

	/// One simulation step. Returns whether any position changed.
	pub fn tick(&mut self) -> bool {
		let Some(sim) = self.simulation.as_mut() else {
			return false;
		};
		if !sim.tick() {
			return false;
		}
		self.positions = sim.positions();
		true
	}

	/// Hold `id` under the pointer.
	pub fn begin_drag(&mut self, id: &NodeId) {
		if let Some(sim) = self.simulation.as_mut() {
			sim.begin_drag(id);
		}
	}

	/// Dragged nodes take precedence over the simulation.
	pub fn drag_to(&mut self, id: &NodeId, p: Point) {
		if let Some(sim) = self.simulation.as_mut() {
			sim.drag_to(id, p);
		}
		if let Some(slot) = self.positions.get_mut(id) {
			*slot = p;
		}
	}

	/// Release the hold taken by [`begin_drag`](Self::begin_drag).
	pub fn end_drag(&mut self, id: &NodeId) {
		if let Some(sim) = self.simulation.as_mut() {
			sim.end_drag(id);
		}
	}

	/// Follow a viewport resize: pinned layouts are recomputed, the simulation
	/// is re-centered and nudged.
	pub fn resize(&mut self, graph: &mut GraphModel, size: ViewportSize) {
		if size == self.size {
			return;
		}
		if let Some(sim) = self.simulation.as_mut() {
			self.size = size;
			sim.set_center(size.center());
			sim.reheat(0.1);
		} else if self.strategy.pins_nodes() && !graph.is_empty() {
			self.apply_layout(graph, self.strategy, size);
		} else {
			self.size = size;
		}
	}

	/// Forget everything, e.g. on graph reload.
	pub fn reset(&mut self) {
		self.stop();
		self.positions.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::types::{GraphData, GraphEdge, GraphNode};

	fn graph() -> GraphModel {
		let mut m = GraphModel::new();
		m.set_graph(GraphData {
			nodes: (0..6).map(|i| GraphNode::new(format!("n{i}"), format!("N{i}"))).collect(),
			edges: (1..6).map(|i| GraphEdge::new("n0", format!("n{i}"))).collect(),
		})
		.unwrap();
		m
	}

	const SIZE: ViewportSize = ViewportSize::new(640.0, 480.0);

	#[test]
	fn every_strategy_positions_every_node() {
		let config = EngineConfig::default();
		for strategy in LayoutStrategy::ALL {
			let mut g = graph();
			let mut session = LayoutSession::new(config.clone());
			let positions = session.apply_layout(&mut g, strategy, SIZE).clone();
			assert_eq!(positions.len(), g.node_count(), "{strategy:?}");
			assert!(g.nodes().all(|n| positions.contains_key(&n.id)));
			assert!(g.nodes().all(|n| n.position.is_some()));
			assert!(g.nodes().all(|n| n.pinned == strategy.pins_nodes()));

			let one_shot = layout_positions(&g, strategy, SIZE, &config).unwrap();
			assert_eq!(one_shot.len(), g.node_count());
		}
	}

	#[test]
	fn empty_graph_yields_empty_positions() {
		let mut g = GraphModel::new();
		let mut session = LayoutSession::new(EngineConfig::default());
		assert!(session.apply_layout(&mut g, LayoutStrategy::Force, SIZE).is_empty());
		assert!(!session.has_simulation());
		assert_eq!(
			layout_positions(&g, LayoutStrategy::Radial, SIZE, &EngineConfig::default()),
			Err(LayoutInputError::EmptyGraph)
		);
	}

	#[test]
	fn switching_strategy_stops_the_simulation() {
		let mut g = graph();
		let mut session = LayoutSession::new(EngineConfig::default());
		session.apply_layout(&mut g, LayoutStrategy::Force, SIZE);
		assert!(session.has_simulation());
		assert!(session.tick());

		let radial = session.apply_layout(&mut g, LayoutStrategy::Radial, SIZE).clone();
		assert!(!session.has_simulation());
		assert!(!session.tick());
		assert_eq!(session.positions(), &radial);
		assert!(session.is_settled());
	}

	#[test]
	fn force_after_tree_unpins() {
		let mut g = graph();
		let mut session = LayoutSession::new(EngineConfig::default());
		session.apply_layout(&mut g, LayoutStrategy::Tree, SIZE);
		assert!(g.nodes().all(|n| n.pinned));
		session.apply_layout(&mut g, LayoutStrategy::Force, SIZE);
		assert!(g.nodes().all(|n| !n.pinned));
		let before = session.positions().clone();
		session.tick();
		assert_ne!(session.positions(), &before);
	}

	#[test]
	fn resize_recomputes_pinned_layouts() {
		let mut g = graph();
		let mut session = LayoutSession::new(EngineConfig::default());
		session.apply_layout(&mut g, LayoutStrategy::Radial, SIZE);
		session.resize(&mut g, ViewportSize::new(300.0, 300.0));
		let expected = radial_layout(&g, ViewportSize::new(300.0, 300.0));
		assert_eq!(session.positions(), &expected);
	}
}
