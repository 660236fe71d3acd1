use std::collections::HashSet;
use std::fmt::Write as _;

use super::config::EngineConfig;
use super::filter::Visibility;
use super::interaction::InteractionState;
use super::model::{GraphModel, Node};
use super::style::{
	self, BACKGROUND, LABEL, Rgba, SEARCH_MATCH, SELECTION, edge_color, edge_width, mastery_color,
	node_opacity, node_radius,
};
use super::types::{HighlightedPath, NodeId, Point, Positions, ViewportSize};
use super::viewport::ViewTransform;

/// Circle outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
	/// Outline color.
	pub color: Rgba,
	/// Width in graph units.
	pub width: f64,
	/// Dashed instead of solid.
	pub dashed: bool,
}

/// Drawing surface the engine renders into. Coordinates between
/// `push_view` and `pop_view` are graph space.
pub trait Surface {
	/// Reset the whole surface to `color`.
	fn clear(&mut self, size: ViewportSize, color: Rgba);
	/// Enter graph space.
	fn push_view(&mut self, transform: &ViewTransform);
	/// Back to screen space.
	fn pop_view(&mut self);
	/// Straight segment.
	fn line(&mut self, from: Point, to: Point, color: Rgba, width: f64);
	/// Filled circle with an optional outline.
	fn circle(&mut self, center: Point, radius: f64, fill: Rgba, stroke: Option<Stroke>);
	/// Soft halo fading from `color` at `inner` to transparent at `outer`.
	fn glow(&mut self, center: Point, inner: f64, outer: f64, color: Rgba);
	/// Text centered on `at`.
	fn text(&mut self, at: Point, text: &str, size: f64, color: Rgba);
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Hovered node plus neighbours, faded in and out over a few frames.
#[derive(Clone, Debug, Default)]
pub struct HoverFade {
	node: Option<NodeId>,
	neighbors: HashSet<NodeId>,
	prev_node: Option<NodeId>,
	prev_neighbors: HashSet<NodeId>,
	highlight_t: f64,
	delay_t: f64,
}

impl HoverFade {
	/// Hover `node`, highlighting `neighbors` with it.
	pub fn set(&mut self, node: Option<NodeId>, neighbors: HashSet<NodeId>) {
		if self.node == node {
			return;
		}
		let was_hovering = self.node.is_some();

		// keep the previous highlight around while it fades out
		if was_hovering && node.is_none() {
			self.prev_node = self.node.take();
			self.prev_neighbors = std::mem::take(&mut self.neighbors);
		} else {
			self.prev_node = None;
			self.prev_neighbors.clear();
		}
		if node.is_some() && !was_hovering {
			self.delay_t = 0.0;
		}
		self.node = node;
		self.neighbors = neighbors;
	}

	/// Drop the highlight without a fade.
	pub fn clear(&mut self) {
		*self = Self::default();
	}

	/// Advance the fade by `dt` seconds. Returns whether it is still animating.
	pub fn advance(&mut self, dt: f64) -> bool {
		let (target, delay, speed) = if self.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};
		let before = self.highlight_t;
		if self.node.is_some() {
			self.delay_t = (self.delay_t + dt).min(delay);
			if self.delay_t >= delay {
				self.highlight_t += (target - self.highlight_t) * (speed * dt).min(1.0);
			}
		} else {
			self.highlight_t += (target - self.highlight_t) * (speed * dt).min(1.0);
			if self.highlight_t < 0.01 {
				self.highlight_t = 0.0;
				self.prev_node = None;
				self.prev_neighbors.clear();
			}
		}
		(self.highlight_t - before).abs() > 1e-4
	}

	/// Eased highlight strength in `[0, 1]`.
	pub fn strength(&self) -> f64 {
		ease_out_cubic(self.highlight_t)
	}

	/// A highlight is showing or fading out.
	pub fn is_active(&self) -> bool {
		self.node.is_some() || self.prev_node.is_some()
	}

	/// `id` is the hovered node, or the one fading out.
	pub fn is_hovered(&self, id: &NodeId) -> bool {
		self.node.as_ref() == Some(id) || self.prev_node.as_ref() == Some(id)
	}

	/// `id` is hovered or a neighbour of the hovered node.
	pub fn is_highlighted(&self, id: &NodeId) -> bool {
		self.is_hovered(id) || self.neighbors.contains(id) || self.prev_neighbors.contains(id)
	}
}

/// Everything a frame is drawn from.
pub struct Frame<'a> {
	/// Nodes and edges.
	pub graph: &'a GraphModel,
	/// Where each node is drawn.
	pub positions: &'a Positions,
	/// Zoom and pan.
	pub transform: ViewTransform,
	/// Canvas size.
	pub size: ViewportSize,
	/// Selection and drag state.
	pub interaction: &'a InteractionState,
	/// Filter result.
	pub visibility: &'a Visibility,
	/// Path to emphasise.
	pub highlighted_path: &'a HighlightedPath,
	/// Search hits to ring.
	pub search_matches: &'a [NodeId],
	/// Hover highlight.
	pub hover: &'a HoverFade,
	/// Sizes and thresholds.
	pub config: &'a EngineConfig,
}

/// Draw edges, then nodes, then labels.
pub fn render(frame: &Frame<'_>, surface: &mut impl Surface) {
	surface.clear(frame.size, BACKGROUND);
	surface.push_view(&frame.transform);
	draw_edges(frame, surface);
	draw_nodes(frame, surface);
	surface.pop_view();
}

fn draw_edges(frame: &Frame<'_>, surface: &mut impl Surface) {
	let t = frame.hover.strength();
	for edge in frame.graph.edges() {
		if !frame.visibility.edge_visible(edge.id) {
			continue;
		}
		let (Some(&a), Some(&b)) = (frame.positions.get(&edge.source), frame.positions.get(&edge.target))
		else {
			continue;
		};
		if a.distance(b) < 0.001 {
			continue;
		}
		let on_path = frame.highlighted_path.contains(&edge.source, &edge.target);
		let lit = frame.hover.is_highlighted(&edge.source) && frame.hover.is_highlighted(&edge.target);
		let alpha = if on_path {
			1.0
		} else if lit {
			0.6 + 0.3 * t
		} else {
			0.6 - 0.45 * t
		};
		surface.line(a, b, edge_color(on_path).with_alpha(alpha), edge_width(edge.strength));
	}
}

fn draw_nodes(frame: &Frame<'_>, surface: &mut impl Surface) {
	let visible: Vec<(&Node, Point)> = frame
		.graph
		.nodes()
		.filter(|n| frame.visibility.node_visible(&n.id))
		.filter_map(|n| frame.positions.get(&n.id).map(|p| (n, *p)))
		.collect();

	// Dimmed nodes first so highlighted ones land on top.
	let active = frame.hover.is_active();
	for (node, p) in &visible {
		if !(active && frame.hover.is_highlighted(&node.id)) {
			draw_node(frame, surface, node, *p);
		}
	}
	if active {
		for (node, p) in &visible {
			if frame.hover.is_highlighted(&node.id) {
				draw_node(frame, surface, node, *p);
			}
		}
	}
}

fn draw_node(frame: &Frame<'_>, surface: &mut impl Surface, node: &Node, p: Point) {
	let t = frame.hover.strength();
	let k = frame.transform.zoom;
	let base = node_radius(node.importance, frame.config.node_size);
	let hovered = frame.hover.is_hovered(&node.id);
	let highlighted = frame.hover.is_highlighted(&node.id);

	let (radius, dim) = if !frame.hover.is_active() {
		(base, 1.0)
	} else if hovered {
		(base * (1.0 + 0.2 * t), 1.0)
	} else if highlighted {
		(base * (1.0 + 0.1 * t), 1.0)
	} else {
		(base * (1.0 - 0.15 * t), 1.0 - 0.7 * t)
	};

	if hovered && t > 0.01 {
		surface.glow(p, radius * 0.3, radius * (1.4 + 0.8 * t), LABEL.with_alpha(0.35 * t));
	}

	let fill = mastery_color(node.mastery).with_alpha(node_opacity(node.is_completed) * dim);
	let border = if node.is_prerequisite {
		Stroke {
			color: LABEL.with_alpha(0.9 * dim),
			width: 3.0,
			dashed: true,
		}
	} else {
		Stroke {
			color: LABEL.with_alpha(0.3 * dim),
			width: 1.0,
			dashed: false,
		}
	};
	surface.circle(p, radius, fill, Some(border));

	let mut ring = radius + 3.0 / k;
	if frame.search_matches.contains(&node.id) {
		let stroke = Stroke {
			color: SEARCH_MATCH,
			width: 2.0 / k,
			dashed: false,
		};
		surface.circle(p, ring, style::TRANSPARENT, Some(stroke));
		ring += 3.0 / k;
	}
	if frame.interaction.selected.as_ref() == Some(&node.id) {
		let stroke = Stroke {
			color: SELECTION,
			width: 2.5 / k,
			dashed: false,
		};
		surface.circle(p, ring, style::TRANSPARENT, Some(stroke));
	}

	if frame.config.show_labels {
		let size = 12.0 / k.max(0.5);
		surface.text(
			Point::new(p.x + radius + 3.0, p.y + size / 3.0),
			&node.label,
			size,
			LABEL.with_alpha(0.85 * dim),
		);
	}
}

/// Recorded draw call.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum DrawCommand {
	/// [`Surface::clear`]
	Clear { size: ViewportSize, color: Rgba },
	/// [`Surface::push_view`]
	PushView(ViewTransform),
	/// [`Surface::pop_view`]
	PopView,
	/// [`Surface::line`]
	Line { from: Point, to: Point, color: Rgba, width: f64 },
	/// [`Surface::circle`]
	Circle { center: Point, radius: f64, fill: Rgba, stroke: Option<Stroke> },
	/// [`Surface::glow`]
	Glow { center: Point, inner: f64, outer: f64, color: Rgba },
	/// [`Surface::text`]
	Text { at: Point, text: String, size: f64, color: Rgba },
}

/// Display list of one frame. Serves as the export boundary: it can be
/// replayed onto another surface or serialised with [`Scene::to_svg`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	/// Calls in issue order.
	pub commands: Vec<DrawCommand>,
}

impl Surface for Scene {
	fn clear(&mut self, size: ViewportSize, color: Rgba) {
		self.commands.clear();
		self.commands.push(DrawCommand::Clear { size, color });
	}

	fn push_view(&mut self, transform: &ViewTransform) {
		self.commands.push(DrawCommand::PushView(*transform));
	}

	fn pop_view(&mut self) {
		self.commands.push(DrawCommand::PopView);
	}

	fn line(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
		self.commands.push(DrawCommand::Line { from, to, color, width });
	}

	fn circle(&mut self, center: Point, radius: f64, fill: Rgba, stroke: Option<Stroke>) {
		self.commands.push(DrawCommand::Circle {
			center,
			radius,
			fill,
			stroke,
		});
	}

	fn glow(&mut self, center: Point, inner: f64, outer: f64, color: Rgba) {
		self.commands.push(DrawCommand::Glow {
			center,
			inner,
			outer,
			color,
		});
	}

	fn text(&mut self, at: Point, text: &str, size: f64, color: Rgba) {
		self.commands.push(DrawCommand::Text {
			at,
			text: text.to_owned(),
			size,
			color,
		});
	}
}

fn escape_xml(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			_ => out.push(c),
		}
	}
	out
}

impl Scene {
	/// Issue every recorded call onto `surface`.
	pub fn replay(&self, surface: &mut impl Surface) {
		for command in &self.commands {
			match command {
				DrawCommand::Clear { size, color } => surface.clear(*size, *color),
				DrawCommand::PushView(t) => surface.push_view(t),
				DrawCommand::PopView => surface.pop_view(),
				DrawCommand::Line { from, to, color, width } => surface.line(*from, *to, *color, *width),
				DrawCommand::Circle {
					center,
					radius,
					fill,
					stroke,
				} => surface.circle(*center, *radius, *fill, *stroke),
				DrawCommand::Glow {
					center,
					inner,
					outer,
					color,
				} => surface.glow(*center, *inner, *outer, *color),
				DrawCommand::Text { at, text, size, color } => surface.text(*at, text, *size, *color),
			}
		}
	}

	/// Standalone SVG document of the frame.
	pub fn to_svg(&self) -> String {
		let size = self
			.commands
			.iter()
			.find_map(|c| match c {
				DrawCommand::Clear { size, .. } => Some(*size),
				_ => None,
			})
			.unwrap_or_default();

		let mut svg = String::new();
		let _ = write!(
			svg,
			r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
			w = size.width,
			h = size.height
		);
		let mut glow_id = 0;
		for command in &self.commands {
			match command {
				DrawCommand::Clear { size, color } => {
					let _ = write!(
						svg,
						r#"<rect width="{}" height="{}" fill="{}"/>"#,
						size.width,
						size.height,
						color.hex()
					);
				}
				DrawCommand::PushView(t) => {
					let _ = write!(
						svg,
						r#"<g transform="translate({} {}) scale({})">"#,
						t.pan.x, t.pan.y, t.zoom
					);
				}
				DrawCommand::PopView => svg.push_str("</g>"),
				DrawCommand::Line { from, to, color, width } => {
					let _ = write!(
						svg,
						r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-opacity="{}" stroke-width="{}"/>"#,
						from.x,
						from.y,
						to.x,
						to.y,
						color.hex(),
						color.a,
						width
					);
				}
				DrawCommand::Circle {
					center,
					radius,
					fill,
					stroke,
				} => {
					let _ = write!(
						svg,
						r#"<circle cx="{}" cy="{}" r="{}" fill="{}" fill-opacity="{}""#,
						center.x,
						center.y,
						radius,
						fill.hex(),
						fill.a
					);
					if let Some(s) = stroke {
						let _ = write!(
							svg,
							r#" stroke="{}" stroke-opacity="{}" stroke-width="{}""#,
							s.color.hex(),
							s.color.a,
							s.width
						);
						if s.dashed {
							svg.push_str(r#" stroke-dasharray="4 3""#);
						}
					}
					svg.push_str("/>");
				}
				DrawCommand::Glow {
					center,
					inner,
					outer,
					color,
				} => {
					glow_id += 1;
					let offset = if *outer > 0.0 { inner / outer } else { 0.0 };
					let _ = write!(
						svg,
						r#"<defs><radialGradient id="glow{id}"><stop offset="{offset}" stop-color="{c}" stop-opacity="{a}"/><stop offset="1" stop-color="{c}" stop-opacity="0"/></radialGradient></defs><circle cx="{x}" cy="{y}" r="{r}" fill="url(#glow{id})"/>"#,
						id = glow_id,
						c = color.hex(),
						a = color.a,
						x = center.x,
						y = center.y,
						r = outer
					);
				}
				DrawCommand::Text { at, text, size, color } => {
					let _ = write!(
						svg,
						r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif" fill="{}" fill-opacity="{}">{}</text>"#,
						at.x,
						at.y,
						size,
						color.hex(),
						color.a,
						escape_xml(text)
					);
				}
			}
		}
		svg.push_str("</svg>");
		svg
	}
}
