use serde::Deserialize;

use super::style::NodeSize;

/// Tuning for the force-directed simulation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceParams {
	/// Link target distance is `link_distance / max(strength, 0.01)`.
	pub link_distance: f64,
	/// Negative values repel.
	pub charge: f64,
	/// Extra gap kept between node circles by the collision force.
	pub collision_padding: f64,
	/// Share of the centroid offset removed per tick.
	pub center_strength: f64,
	/// The simulation is settled once alpha drops below this.
	pub alpha_min: f64,
	/// Per-tick step of alpha toward its target.
	pub alpha_decay: f64,
	/// Velocity lost per tick, as a fraction.
	pub velocity_decay: f64,
	/// Alpha the simulation is held at while a node is dragged.
	pub drag_alpha_target: f64,
	/// Ticks after which the simulation counts as settled regardless of alpha.
	pub tick_budget: u32,
	/// Pairs closer than this distance have their repulsion softened, using
	/// `sqrt(min_distance² · d²)` in place of `d²`, so it stays finite.
	pub min_distance: f64,
}

impl Default for ForceParams {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			link_distance: 100.0,
			charge: -300.0,
			collision_padding: 10.0,
			center_strength: 1.0,
			alpha_min,
			// reaches alpha_min after ~300 ticks
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			tick_budget: 300,
			min_distance: 1.0,
		}
	}
}

/// Engine settings. Every field has a default, so partial input is fine.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Radius multiplier applied to every node.
	pub node_size: NodeSize,
	/// Force layout tuning.
	pub force: ForceParams,
	/// Border kept free around tree layouts.
	pub tree_margin: f64,
	/// Pan offsets are clamped to +/- this many screen units.
	pub pan_extent: f64,
	/// Pointer travel (screen px) that turns a press into a drag.
	pub drag_threshold: f64,
	/// Touch hold (ms) that opens the context menu.
	pub long_press_ms: f64,
	/// Draw node labels.
	pub show_labels: bool,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			node_size: NodeSize::default(),
			force: ForceParams::default(),
			tree_margin: 50.0,
			pan_extent: 10_000.0,
			drag_threshold: 3.0,
			long_press_ms: 500.0,
			show_labels: true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config: EngineConfig =
			serde_json::from_str(r#"{"node_size":"large","force":{"charge":-500}}"#).unwrap();
		assert_eq!(config.node_size, NodeSize::Large);
		assert_eq!(config.force.charge, -500.0);
		assert_eq!(config.force.link_distance, 100.0);
		assert_eq!(config.tree_margin, 50.0);
		assert_eq!(config.long_press_ms, 500.0);
	}

	#[test]
	fn default_decay_settles_within_budget() {
		let force = ForceParams::default();
		let alpha_after_budget = (1.0 - force.alpha_decay).powi(force.tick_budget as i32);
		assert!((alpha_after_budget - force.alpha_min).abs() < 1e-6);
	}
}
