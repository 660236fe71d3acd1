use std::collections::HashMap;

use crate::components::knowledge_graph::model::GraphModel;
use crate::components::knowledge_graph::types::{NodeId, Point, Positions, ViewportSize};

/// Parent of each node: the lowest-id source among its incoming edges.
/// Self-loops never define a parent.
fn resolve_parents(
	graph: &GraphModel,
	ids: &[&NodeId],
	slot: &HashMap<&NodeId, usize>,
) -> Vec<Option<usize>> {
	let mut parent: Vec<Option<usize>> = vec![None; ids.len()];
	for edge in graph.edges() {
		if edge.source == edge.target {
			continue;
		}
		let (Some(&s), Some(&t)) = (slot.get(&edge.source), slot.get(&edge.target)) else {
			continue;
		};
		if parent[t].is_none_or(|current| &edge.source < ids[current]) {
			parent[t] = Some(s);
		}
	}
	parent
}

/// Children-evenly-spaced tree layout over the viewport.
///
/// Each root (a node without incoming edges) gets a horizontal band whose
/// width is proportional to its leaf count; children split their parent's
/// band the same way. Nodes only reachable through a cycle are promoted to
/// extra roots in insertion order so every node receives a position.
pub fn tree_layout(graph: &GraphModel, size: ViewportSize, margin: f64) -> Positions {
	let ids: Vec<&NodeId> = graph.nodes().map(|n| &n.id).collect();
	let n = ids.len();
	if n == 0 {
		return Positions::new();
	}
	let slot: HashMap<&NodeId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
	let parent = resolve_parents(graph, &ids, &slot);

	let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
	for (child, p) in parent.iter().enumerate() {
		if let Some(p) = *p {
			children[p].push(child);
		}
	}

	// Pre-order walk from every root, then from any node a cycle kept unvisited.
	let mut visited = vec![false; n];
	let mut depth = vec![0usize; n];
	let mut kept_children: Vec<Vec<usize>> = vec![Vec::new(); n];
	let mut roots = Vec::new();
	let mut order = Vec::with_capacity(n);
	let candidates = (0..n)
		.filter(|&i| parent[i].is_none())
		.chain(0..n)
		.collect::<Vec<_>>();
	for start in candidates {
		if visited[start] {
			continue;
		}
		roots.push(start);
		visited[start] = true;
		let mut stack = vec![start];
		while let Some(node) = stack.pop() {
			order.push(node);
			for &child in children[node].iter().rev() {
				if !visited[child] {
					visited[child] = true;
					depth[child] = depth[node] + 1;
					kept_children[node].push(child);
					stack.push(child);
				}
			}
		}
	}
	for list in &mut kept_children {
		list.reverse();
	}

	let mut leaves = vec![1usize; n];
	for &node in order.iter().rev() {
		if !kept_children[node].is_empty() {
			leaves[node] = kept_children[node].iter().map(|&c| leaves[c]).sum();
		}
	}

	let usable_width = (size.width - 2.0 * margin).max(0.0);
	let usable_height = (size.height - 2.0 * margin).max(0.0);
	let max_depth = depth.iter().copied().max().unwrap_or(0);
	let total_leaves: usize = roots.iter().map(|&r| leaves[r]).sum();

	// (left edge, width) of the band each node owns
	let mut band = vec![(0.0f64, 0.0f64); n];
	let mut left = margin;
	for &root in &roots {
		let w = usable_width * leaves[root] as f64 / total_leaves as f64;
		band[root] = (left, w);
		left += w;
	}

	let mut positions = Positions::with_capacity(n);
	for &node in &order {
		let (x0, w) = band[node];
		let y = if max_depth == 0 {
			size.height / 2.0
		} else {
			margin + usable_height * depth[node] as f64 / max_depth as f64
		};
		positions.insert(ids[node].clone(), Point::new(x0 + w / 2.0, y));

		let mut child_left = x0;
		for &child in &kept_children[node] {
			let cw = w * leaves[child] as f64 / leaves[node] as f64;
			band[child] = (child_left, cw);
			child_left += cw;
		}
	}
	positions
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::types::{GraphData, GraphEdge, GraphNode};

	fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> GraphModel {
		let mut m = GraphModel::new();
		m.set_graph(GraphData {
			nodes: nodes.iter().map(|id| GraphNode::new(*id, *id)).collect(),
			edges: edges.iter().map(|(s, t)| GraphEdge::new(*s, *t)).collect(),
		})
		.unwrap();
		m
	}

	fn at(p: &Positions, id: &str) -> Point {
		p[&NodeId::from(id)]
	}

	const SIZE: ViewportSize = ViewportSize::new(500.0, 400.0);

	#[test]
	fn children_sit_below_and_evenly_under_parent() {
		let g = graph(&["root", "a", "b"], &[("root", "a"), ("root", "b")]);
		let p = tree_layout(&g, SIZE, 50.0);
		let (root, a, b) = (at(&p, "root"), at(&p, "a"), at(&p, "b"));
		assert_eq!(root, Point::new(250.0, 50.0));
		assert_eq!(a.y, 350.0);
		assert_eq!(b.y, 350.0);
		assert!((root.x - a.x - (b.x - root.x)).abs() < 1e-9);
		assert!(a.x < b.x);
	}

	#[test]
	fn disjoint_roots_get_their_own_region() {
		let g = graph(&["r1", "c1", "r2", "c2"], &[("r1", "c1"), ("r2", "c2")]);
		let p = tree_layout(&g, SIZE, 50.0);
		assert!(at(&p, "r1").x < 250.0);
		assert!(at(&p, "c1").x < 250.0);
		assert!(at(&p, "r2").x > 250.0);
		assert!(at(&p, "c2").x > 250.0);
	}

	#[test]
	fn lowest_id_parent_wins() {
		// "child" has parents "zeta" and "alpha"; alpha wins regardless of edge order.
		let g = graph(
			&["zeta", "alpha", "child"],
			&[("zeta", "child"), ("alpha", "child")],
		);
		let p = tree_layout(&g, SIZE, 50.0);
		let (alpha, zeta, child) = (at(&p, "alpha"), at(&p, "zeta"), at(&p, "child"));
		assert_eq!(child.x, alpha.x);
		assert!(child.y > zeta.y);
		assert_ne!(child.x, zeta.x);
	}

	#[test]
	fn cycles_still_position_every_node() {
		let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
		let p = tree_layout(&g, SIZE, 50.0);
		assert_eq!(p.len(), 3);
		assert_eq!(at(&p, "a").y, 50.0);
	}

	#[test]
	fn repeated_calls_are_identical() {
		let g = graph(
			&["a", "b", "c", "d", "e"],
			&[("a", "b"), ("a", "c"), ("c", "d"), ("e", "d")],
		);
		assert_eq!(tree_layout(&g, SIZE, 50.0), tree_layout(&g, SIZE, 50.0));
	}
}
