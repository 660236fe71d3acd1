use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use knowledge_graph_canvas::components::knowledge_graph::interaction::PointerButton;
use knowledge_graph_canvas::components::knowledge_graph::layout::layout_positions;
use knowledge_graph_canvas::components::knowledge_graph::{
	EngineConfig, FilterCriteria, GraphData, GraphEdge, GraphEvent, GraphNode, GraphSource,
	KnowledgeGraph, LayoutStrategy, LearningPath, LoadState, MasteryMap, PathStep, Point,
	StaticGraphSource, ViewportSize,
};

const SIZE: ViewportSize = ViewportSize::new(800.0, 600.0);

fn curriculum() -> GraphData {
	GraphData {
		nodes: vec![
			GraphNode::new("A", "Arithmetic").with_subject("math"),
			GraphNode::new("B", "Algebra").with_subject("math"),
			GraphNode::new("C", "Calculus").with_subject("math").with_importance(3.0),
			GraphNode::new("D", "Mechanics").with_subject("physics"),
			GraphNode::new("E", "Optics").with_subject("physics"),
		],
		edges: vec![
			GraphEdge::new("A", "B").with_strength(0.9),
			GraphEdge::new("B", "C"),
			GraphEdge::new("C", "D").with_strength(0.2),
			GraphEdge::new("D", "E"),
		],
	}
}

fn source() -> StaticGraphSource {
	StaticGraphSource::new()
		.with_graph("math", curriculum())
		.with_mastery(
			"ada",
			MasteryMap::from([("A".into(), 100.0), ("B".into(), 45.0), ("Z".into(), 70.0)]),
		)
		.with_path(
			"ada",
			"math",
			LearningPath {
				path: vec![
					PathStep {
						source: "B".into(),
						target: "C".into(),
					},
					PathStep {
						source: "C".into(),
						target: "D".into(),
					},
				],
				estimated_time: 90.0,
			},
		)
}

fn recorded(kg: &mut KnowledgeGraph) -> Rc<RefCell<Vec<GraphEvent>>> {
	let log = Rc::new(RefCell::new(Vec::new()));
	let sink = log.clone();
	kg.subscribe(move |e| sink.borrow_mut().push(e.clone()));
	log
}

#[test]
fn fetch_load_and_path_highlight() {
	let source = source();
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	kg.begin_load();
	assert_eq!(kg.load_state(), &LoadState::Loading);

	kg.finish_load(block_on(source.fetch_concept("math", "ada")))
		.unwrap();
	assert_eq!(kg.load_state(), &LoadState::Loaded);
	assert_eq!(kg.graph().get_node(&"A".into()).unwrap().mastery, 100.0);
	assert_eq!(kg.graph().get_node(&"C".into()).unwrap().mastery, 0.0);
	assert_eq!(kg.positions().len(), 5);

	let path = block_on(source.fetch_learning_path("ada", "math")).unwrap();
	kg.set_highlighted_path(path);
	assert!(kg.highlighted_path().contains(&"C".into(), &"D".into()));

	kg.begin_load();
	kg.finish_load(block_on(source.fetch_concept("history", "ada")))
		.unwrap();
	assert!(matches!(kg.load_state(), LoadState::Failed(_)));
}

#[test]
fn every_strategy_positions_every_node_deterministically() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	kg.set_graph(curriculum()).unwrap();
	for strategy in LayoutStrategy::ALL {
		let positions = kg.apply_layout(strategy).clone();
		assert_eq!(positions.len(), 5, "{strategy:?}");
		if strategy.pins_nodes() {
			assert_eq!(kg.apply_layout(strategy), &positions);
			assert!(kg.graph().nodes().all(|n| n.pinned));
		}
	}
	let one_shot =
		layout_positions(kg.graph(), LayoutStrategy::Force, SIZE, kg.config()).unwrap();
	assert_eq!(one_shot.len(), 5);
}

#[test]
fn settled_force_layout_stays_put() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	kg.set_graph(curriculum()).unwrap();
	kg.apply_layout(LayoutStrategy::Force);
	let mut guard = 0;
	while !kg.is_settled() {
		kg.tick(0.016);
		guard += 1;
		assert!(guard <= 1000, "simulation never settled");
	}
	let settled = kg.positions().clone();
	for _ in 0..10 {
		kg.tick(0.016);
	}
	for (id, p) in kg.positions() {
		assert!(p.distance(settled[id]) < 1e-6, "{id} drifted");
	}
}

#[test]
fn dragged_node_is_not_snapped_back() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	kg.set_graph(curriculum()).unwrap();
	kg.apply_layout(LayoutStrategy::Force);
	for _ in 0..50 {
		kg.tick(0.016);
	}
	let start = kg.position(&"A".into()).unwrap();
	let press = kg.transform().graph_to_screen(start);
	let target = Point::new(50.0, 50.0);

	kg.pointer_down(PointerButton::Primary, press);
	kg.pointer_move(Point::new(press.x + 10.0, press.y + 10.0));
	kg.pointer_move(kg.transform().graph_to_screen(target));
	for _ in 0..5 {
		kg.tick(0.016);
		assert_eq!(kg.position(&"A".into()), Some(target));
	}
	kg.pointer_up();
	kg.tick(0.016);

	let after = kg.position(&"A".into()).unwrap();
	assert!(after.distance(target) < start.distance(target));
	assert!(after.distance(target) < 60.0);
}

#[test]
fn zoom_in_three_times() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	for _ in 0..3 {
		kg.zoom_in();
	}
	assert!((kg.transform().zoom - 1.728).abs() < 1e-9);
	for _ in 0..10 {
		kg.zoom_in();
	}
	assert_eq!(kg.transform().zoom, 3.0);
}

#[test]
fn wheel_zoom_keeps_point_under_cursor() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	let views = Rc::new(RefCell::new(0));
	let sink = views.clone();
	kg.subscribe_view(move |_| *sink.borrow_mut() += 1);

	let cursor = Point::new(200.0, 150.0);
	let before = kg.transform().screen_to_graph(cursor);
	kg.wheel(cursor, -120.0);
	let after = kg.transform().screen_to_graph(cursor);
	assert!(before.distance(after) < 1e-9);
	assert!(kg.transform().zoom > 1.0);
	assert_eq!(*views.borrow(), 1);
}

#[test]
fn background_drag_pans() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	kg.set_graph(curriculum()).unwrap();
	kg.apply_layout(LayoutStrategy::Radial);
	let log = recorded(&mut kg);

	kg.pointer_down(PointerButton::Primary, Point::new(5.0, 5.0));
	kg.pointer_move(Point::new(45.0, 25.0));
	kg.pointer_up();
	assert_eq!(kg.transform().pan, Point::new(40.0, 20.0));
	assert!(matches!(log.borrow().last(), Some(GraphEvent::ViewChanged(_))));
}

#[test]
fn filter_and_search_flow() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	kg.finish_load(block_on(source().fetch_concept("math", "ada")))
		.unwrap();
	let log = recorded(&mut kg);

	kg.set_filter(FilterCriteria {
		subject: Some("math".into()),
		show_completed: false,
		..FilterCriteria::default()
	});
	let visible: Vec<&str> = kg
		.graph()
		.nodes()
		.filter(|n| kg.visibility().node_visible(&n.id))
		.map(|n| n.id.as_str())
		.collect();
	assert_eq!(visible, ["B", "C"]);
	assert_eq!(kg.visibility().edges.len(), 1);

	// hidden nodes never match a search
	assert_eq!(kg.submit_search("optics"), None);
	assert_eq!(kg.submit_search("ALG"), Some("B".into()));
	assert_eq!(kg.selected(), Some(&"B".into()));

	let events = log.borrow();
	assert!(matches!(events[0], GraphEvent::FilterChanged(_)));
	assert!(events.contains(&GraphEvent::SearchSubmitted("ALG".into())));
	assert!(events.contains(&GraphEvent::NodeSelected("B".into())));
}

#[test]
fn escape_clears_selection_and_menu() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	kg.set_graph(curriculum()).unwrap();
	kg.apply_layout(LayoutStrategy::Radial);
	let log = recorded(&mut kg);

	let a = kg.transform().graph_to_screen(kg.position(&"A".into()).unwrap());
	let b = kg.transform().graph_to_screen(kg.position(&"B".into()).unwrap());
	kg.pointer_down(PointerButton::Primary, a);
	kg.pointer_up();
	kg.context_menu(b);
	kg.key_down("Escape", false);

	assert_eq!(kg.selected(), None);
	assert!(kg.interaction().context_menu.is_none());
	assert_eq!(log.borrow().last(), Some(&GraphEvent::ContextMenuClosed));
}

#[test]
fn editing_rejects_dangling_edges() {
	let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
	kg.set_graph(curriculum()).unwrap();
	assert!(kg.add_edge(GraphEdge::new("A", "missing")).is_err());
	assert_eq!(kg.graph().edge_count(), 4);

	let removed = kg.remove_node(&"C".into()).unwrap();
	assert_eq!(removed.len(), 2);
	assert!(kg.graph().edges().all(|e| !e.touches(&"C".into())));
	assert!(!kg.positions().contains_key(&"C".into()));
	assert_eq!(kg.positions().len(), 4);
}
