use std::fmt;

use serde::{Deserialize, Serialize};

/// Smallest radius any node is drawn with.
pub const MIN_NODE_RADIUS: f64 = 10.0;
/// Largest radius any node is drawn with.
pub const MAX_NODE_RADIUS: f64 = 40.0;
/// Fill opacity of completed nodes.
pub const COMPLETED_OPACITY: f64 = 1.0;
/// Fill opacity of nodes still being worked on.
pub const INCOMPLETE_OPACITY: f64 = 0.6;

/// User-selectable node scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSize {
	/// 0.7x
	Small,
	/// 1x
	#[default]
	Normal,
	/// 1.3x
	Large,
}

impl NodeSize {
	/// Factor applied to the importance-based radius.
	pub fn multiplier(self) -> f64 {
		match self {
			Self::Small => 0.7,
			Self::Normal => 1.0,
			Self::Large => 1.3,
		}
	}
}

/// Shared by every layout, the renderer and hit-testing.
pub fn node_radius(importance: f64, size: NodeSize) -> f64 {
	let r = importance * 10.0 * size.multiplier();
	if r.is_nan() {
		return MIN_NODE_RADIUS;
	}
	r.clamp(MIN_NODE_RADIUS, MAX_NODE_RADIUS)
}

/// sRGB colour with a floating-point alpha. `Display` gives CSS `rgba(..)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in `[0, 1]`.
	pub a: f64,
}

impl Rgba {
	/// Opaque colour.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Same colour, alpha clamped into `[0, 1]`.
	pub fn with_alpha(self, a: f64) -> Self {
		Self {
			a: a.clamp(0.0, 1.0),
			..self
		}
	}

	/// `#rrggbb`, alpha dropped.
	pub fn hex(&self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

impl fmt::Display for Rgba {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
	}
}

/// Mastery 0.
pub const MASTERY_RED: Rgba = Rgba::rgb(0xef, 0x44, 0x44);
/// Mastery up to 20.
pub const MASTERY_RED_ORANGE: Rgba = Rgba::rgb(0xf9, 0x73, 0x16);
/// Mastery up to 50.
pub const MASTERY_ORANGE: Rgba = Rgba::rgb(0xf5, 0x9e, 0x0b);
/// Mastery up to 80.
pub const MASTERY_YELLOW: Rgba = Rgba::rgb(0xea, 0xb3, 0x08);
/// Mastery below 100.
pub const MASTERY_YELLOW_GREEN: Rgba = Rgba::rgb(0x84, 0xcc, 0x16);
/// Mastery 100.
pub const MASTERY_GREEN: Rgba = Rgba::rgb(0x22, 0xc5, 0x5e);

/// Ordinary edges.
pub const EDGE_NEUTRAL: Rgba = Rgba::rgb(0x9c, 0xa3, 0xaf);
/// Edges on the highlighted path.
pub const EDGE_EMPHASIS: Rgba = Rgba::rgb(0x63, 0x66, 0xf1);
/// Canvas fill.
pub const BACKGROUND: Rgba = Rgba::rgb(0x1a, 0x1a, 0x2e);
/// Node label text.
pub const LABEL: Rgba = Rgba::rgb(0xff, 0xff, 0xff);
/// Ring around the selected node.
pub const SELECTION: Rgba = Rgba::rgb(0x38, 0xbd, 0xf8);
/// Ring around search matches.
pub const SEARCH_MATCH: Rgba = Rgba::rgb(0xfa, 0xcc, 0x15);
/// No paint.
pub const TRANSPARENT: Rgba = Rgba {
	r: 0,
	g: 0,
	b: 0,
	a: 0.0,
};

/// Six-band mastery palette: 0, (0,20], (20,50], (50,80], (80,100), 100.
pub fn mastery_color(mastery: f64) -> Rgba {
	match mastery {
		m if m <= 0.0 => MASTERY_RED,
		m if m <= 20.0 => MASTERY_RED_ORANGE,
		m if m <= 50.0 => MASTERY_ORANGE,
		m if m <= 80.0 => MASTERY_YELLOW,
		m if m < 100.0 => MASTERY_YELLOW_GREEN,
		_ => MASTERY_GREEN,
	}
}

/// Fill opacity by completion.
pub fn node_opacity(is_completed: bool) -> f64 {
	if is_completed {
		COMPLETED_OPACITY
	} else {
		INCOMPLETE_OPACITY
	}
}

/// Emphasis on the highlighted path, neutral gray elsewhere.
pub fn edge_color(on_highlighted_path: bool) -> Rgba {
	if on_highlighted_path {
		EDGE_EMPHASIS
	} else {
		EDGE_NEUTRAL
	}
}

/// `1 + strength * 4`.
pub fn edge_width(strength: f64) -> f64 {
	1.0 + strength * 4.0
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn mastery_band_boundaries() {
		assert_eq!(mastery_color(0.0), MASTERY_RED);
		assert_eq!(mastery_color(0.5), MASTERY_RED_ORANGE);
		assert_eq!(mastery_color(20.0), MASTERY_RED_ORANGE);
		assert_eq!(mastery_color(20.1), MASTERY_ORANGE);
		assert_eq!(mastery_color(50.0), MASTERY_ORANGE);
		assert_eq!(mastery_color(80.0), MASTERY_YELLOW);
		assert_eq!(mastery_color(99.9), MASTERY_YELLOW_GREEN);
		assert_eq!(mastery_color(100.0), MASTERY_GREEN);
	}

	#[test]
	fn radius_uses_size_setting() {
		assert_eq!(node_radius(1.0, NodeSize::Normal), 10.0);
		assert!((node_radius(2.0, NodeSize::Large) - 26.0).abs() < 1e-9);
		assert!((node_radius(2.0, NodeSize::Small) - 14.0).abs() < 1e-9);
		assert_eq!(node_radius(0.0, NodeSize::Normal), MIN_NODE_RADIUS);
		assert_eq!(node_radius(100.0, NodeSize::Small), MAX_NODE_RADIUS);
	}

	#[test]
	fn edge_and_opacity_formulas() {
		assert_eq!(edge_width(0.5), 3.0);
		assert_eq!(edge_color(true), EDGE_EMPHASIS);
		assert_eq!(edge_color(false), EDGE_NEUTRAL);
		assert_eq!(node_opacity(true), 1.0);
		assert_eq!(node_opacity(false), 0.6);
	}

	#[test]
	fn css_formatting() {
		assert_eq!(MASTERY_GREEN.hex(), "#22c55e");
		assert_eq!(EDGE_NEUTRAL.with_alpha(0.5).to_string(), "rgba(156, 163, 175, 0.5)");
	}

	proptest! {
		#[test]
		fn radius_is_bounded_and_monotonic(a in 0.0f64..20.0, b in 0.0f64..20.0, size in prop_oneof![
			Just(NodeSize::Small),
			Just(NodeSize::Normal),
			Just(NodeSize::Large),
		]) {
			let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
			let (r_lo, r_hi) = (node_radius(lo, size), node_radius(hi, size));
			prop_assert!(r_lo <= r_hi);
			prop_assert!((MIN_NODE_RADIUS..=MAX_NODE_RADIUS).contains(&r_lo));
			prop_assert!((MIN_NODE_RADIUS..=MAX_NODE_RADIUS).contains(&r_hi));
		}
	}
}
