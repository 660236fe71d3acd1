use std::f64::consts::PI;

use crate::components::knowledge_graph::model::GraphModel;
use crate::components::knowledge_graph::types::{Point, Positions, ViewportSize};

/// Nodes evenly spaced, in insertion order, on a circle of radius
/// `min(width, height) / 3` around the viewport center.
pub fn radial_layout(graph: &GraphModel, size: ViewportSize) -> Positions {
	let n = graph.node_count();
	let center = size.center();
	let radius = size.width.min(size.height) / 3.0;
	graph
		.nodes()
		.enumerate()
		.map(|(i, node)| {
			let angle = (i as f64) * 2.0 * PI / n as f64;
			(
				node.id.clone(),
				Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin()),
			)
		})
		.collect()
}
