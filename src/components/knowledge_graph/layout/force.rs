use std::collections::HashMap;
use std::f64::consts::PI;

use log::debug;

use crate::components::knowledge_graph::config::ForceParams;
use crate::components::knowledge_graph::model::GraphModel;
use crate::components::knowledge_graph::style::{NodeSize, node_radius};
use crate::components::knowledge_graph::types::{NodeId, Point, Positions, ViewportSize};

/// Radius of the ring unplaced nodes are seeded on.
const SEED_RADIUS: f64 = 100.0;

#[derive(Clone, Debug)]
struct Body {
	id: NodeId,
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	radius: f64,
	/// Externally fixed position (pinned node or active drag).
	fixed: Option<Point>,
	pinned: bool,
}

#[derive(Clone, Debug)]
struct Link {
	source: usize,
	target: usize,
	distance: f64,
	strength: f64,
	bias: f64,
}

/// Cooperative step-function simulation. Each [`tick`](Self::tick) applies
/// link, many-body, collision and centering forces once; callers drive it
/// from their frame loop.
#[derive(Clone, Debug)]
pub struct ForceSimulation {
	bodies: Vec<Body>,
	index: HashMap<NodeId, usize>,
	links: Vec<Link>,
	center: Point,
	params: ForceParams,
	alpha: f64,
	alpha_target: f64,
	ticks: u32,
	dragging: Option<usize>,
}

/// Tiny deterministic offset used when two bodies coincide.
fn jiggle(seed: usize) -> f64 {
	((seed % 7) as f64 + 1.0) * 1e-6
}

impl ForceSimulation {
	/// Bodies start at their model position, or on a seed ring around the
	/// viewport center.
	pub fn new(graph: &GraphModel, size: ViewportSize, node_size: NodeSize, params: ForceParams) -> Self {
		let center = size.center();
		let n = graph.node_count().max(1);
		let mut index = HashMap::new();
		let bodies: Vec<Body> = graph
			.nodes()
			.enumerate()
			.map(|(i, node)| {
				let angle = (i as f64) * 2.0 * PI / n as f64;
				let seed = Point::new(
					center.x + SEED_RADIUS * angle.cos(),
					center.y + SEED_RADIUS * angle.sin(),
				);
				let p = node.position.unwrap_or(seed);
				index.insert(node.id.clone(), i);
				Body {
					id: node.id.clone(),
					x: p.x,
					y: p.y,
					vx: 0.0,
					vy: 0.0,
					radius: node_radius(node.importance, node_size),
					fixed: node.pinned.then_some(p),
					pinned: node.pinned,
				}
			})
			.collect();

		let mut degree = vec![0usize; bodies.len()];
		let pairs: Vec<(usize, usize, f64)> = graph
			.edges()
			.filter_map(|e| {
				let (s, t) = (*index.get(&e.source)?, *index.get(&e.target)?);
				(s != t).then_some((s, t, e.strength))
			})
			.collect();
		for &(s, t, _) in &pairs {
			degree[s] += 1;
			degree[t] += 1;
		}
		let links = pairs
			.into_iter()
			.map(|(s, t, strength)| Link {
				source: s,
				target: t,
				distance: params.link_distance / strength.max(0.01),
				strength: 1.0 / degree[s].min(degree[t]) as f64,
				bias: degree[s] as f64 / (degree[s] + degree[t]) as f64,
			})
			.collect();

		debug!("force simulation started with {} bodies", bodies.len());
		Self {
			bodies,
			index,
			links,
			center,
			params,
			alpha: 1.0,
			alpha_target: 0.0,
			ticks: 0,
			dragging: None,
		}
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Ticks since start or the last reheat.
	pub fn ticks(&self) -> u32 {
		self.ticks
	}

	/// Energy has decayed below the threshold or the tick budget is spent.
	/// A simulation with a node under drag is never settled.
	pub fn is_settled(&self) -> bool {
		if self.dragging.is_some() {
			return false;
		}
		self.alpha < self.params.alpha_min || self.ticks >= self.params.tick_budget
	}

	/// Where `id` is now.
	pub fn position(&self, id: &NodeId) -> Option<Point> {
		self.index
			.get(id)
			.map(|&i| Point::new(self.bodies[i].x, self.bodies[i].y))
	}

	/// Snapshot of every body position.
	pub fn positions(&self) -> Positions {
		self.bodies
			.iter()
			.map(|b| (b.id.clone(), Point::new(b.x, b.y)))
			.collect()
	}

	/// Point the centering force pulls toward.
	pub fn set_center(&mut self, center: Point) {
		self.center = center;
	}

	/// Raise alpha to at least `alpha` and restart the tick budget.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha);
		self.ticks = 0;
	}

	/// Advance one step. Returns `false` once settled, without moving anything.
	pub fn tick(&mut self) -> bool {
		if self.is_settled() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		self.ticks += 1;

		self.apply_links();
		self.apply_charge();
		self.apply_collision();
		self.apply_center();

		let keep = 1.0 - self.params.velocity_decay;
		for body in &mut self.bodies {
			if let Some(p) = body.fixed {
				body.x = p.x;
				body.y = p.y;
				body.vx = 0.0;
				body.vy = 0.0;
			} else {
				body.vx *= keep;
				body.vy *= keep;
				body.x += body.vx;
				body.y += body.vy;
			}
		}

		if self.is_settled() {
			debug!("force simulation settled after {} ticks", self.ticks);
		}
		true
	}

	/// Tick until settled. Returns the number of ticks taken.
	pub fn run_until_settled(&mut self) -> u32 {
		let mut taken = 0;
		while self.tick() {
			taken += 1;
		}
		taken
	}

	/// Hold `id` in place and reheat so the rest of the graph relaxes around it.
	pub fn begin_drag(&mut self, id: &NodeId) -> bool {
		let Some(&i) = self.index.get(id) else {
			return false;
		};
		let body = &mut self.bodies[i];
		body.fixed = Some(Point::new(body.x, body.y));
		self.dragging = Some(i);
		self.alpha_target = self.params.drag_alpha_target;
		self.reheat(self.params.drag_alpha_target);
		true
	}

	/// Move the held node. Returns false for an unknown id.
	pub fn drag_to(&mut self, id: &NodeId, p: Point) -> bool {
		let Some(&i) = self.index.get(id) else {
			return false;
		};
		let body = &mut self.bodies[i];
		body.fixed = Some(p);
		body.x = p.x;
		body.y = p.y;
		true
	}

	/// Release the drag hold. The node keeps its position but is free again
	/// unless it was pinned before the drag.
	pub fn end_drag(&mut self, id: &NodeId) -> bool {
		let Some(&i) = self.index.get(id) else {
			return false;
		};
		let body = &mut self.bodies[i];
		if !body.pinned {
			body.fixed = None;
		}
		body.vx = 0.0;
		body.vy = 0.0;
		if self.dragging == Some(i) {
			self.dragging = None;
		}
		self.alpha_target = 0.0;
		true
	}

	fn apply_links(&mut self) {
		let alpha = self.alpha;
		for link in &self.links {
			let (s, t) = (&self.bodies[link.source], &self.bodies[link.target]);
			let mut dx = t.x + t.vx - s.x - s.vx;
			let mut dy = t.y + t.vy - s.y - s.vy;
			if dx == 0.0 && dy == 0.0 {
				dx = jiggle(link.source);
				dy = jiggle(link.target);
			}
			let l = (dx * dx + dy * dy).sqrt();
			let k = (l - link.distance) / l * alpha * link.strength;
			let (fx, fy) = (dx * k, dy * k);

			let target = &mut self.bodies[link.target];
			target.vx -= fx * link.bias;
			target.vy -= fy * link.bias;
			let source = &mut self.bodies[link.source];
			source.vx += fx * (1.0 - link.bias);
			source.vy += fy * (1.0 - link.bias);
		}
	}

	/// Inverse-square repulsion between every pair.
	fn apply_charge(&mut self) {
		let (alpha, charge) = (self.alpha, self.params.charge);
		let min2 = self.params.min_distance * self.params.min_distance;
		let n = self.bodies.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (mut dx, mut dy) = (
					self.bodies[j].x - self.bodies[i].x,
					self.bodies[j].y - self.bodies[i].y,
				);
				if dx == 0.0 && dy == 0.0 {
					dx = jiggle(i);
					dy = jiggle(j);
				}
				let mut l2 = dx * dx + dy * dy;
				if l2 < min2 {
					l2 = (min2 * l2).sqrt();
				}
				let f = charge * alpha / l2;
				self.bodies[i].vx += dx * f;
				self.bodies[i].vy += dy * f;
				self.bodies[j].vx -= dx * f;
				self.bodies[j].vy -= dy * f;
			}
		}
	}

	/// Keeps `radius(a) + radius(b) + padding` between circles.
	fn apply_collision(&mut self) {
		let padding = self.params.collision_padding;
		let n = self.bodies.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (a, b) = (&self.bodies[i], &self.bodies[j]);
				let min_sep = a.radius + b.radius + padding;
				let (mut dx, mut dy) = (b.x + b.vx - a.x - a.vx, b.y + b.vy - a.y - a.vy);
				let mut l2 = dx * dx + dy * dy;
				if l2 >= min_sep * min_sep {
					continue;
				}
				if l2 == 0.0 {
					dx = jiggle(i);
					dy = jiggle(j);
					l2 = dx * dx + dy * dy;
				}
				let l = l2.sqrt();
				let k = (min_sep - l) / l;
				let (ra2, rb2) = (a.radius * a.radius, b.radius * b.radius);
				let share = rb2 / (ra2 + rb2);
				self.bodies[i].vx -= dx * k * share;
				self.bodies[i].vy -= dy * k * share;
				self.bodies[j].vx += dx * k * (1.0 - share);
				self.bodies[j].vy += dy * k * (1.0 - share);
			}
		}
	}

	/// Translate free bodies so the centroid moves onto the viewport center.
	fn apply_center(&mut self) {
		if self.bodies.is_empty() {
			return;
		}
		let n = self.bodies.len() as f64;
		let (sx, sy) = self
			.bodies
			.iter()
			.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
		let strength = self.params.center_strength;
		let (shift_x, shift_y) = (
			(sx / n - self.center.x) * strength,
			(sy / n - self.center.y) * strength,
		);
		for body in self.bodies.iter_mut().filter(|b| b.fixed.is_none()) {
			body.x -= shift_x;
			body.y -= shift_y;
		}
	}
}
