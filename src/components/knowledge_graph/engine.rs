use log::{debug, info, warn};

use super::config::EngineConfig;
use super::error::{GraphIntegrityError, SourceError};
use super::events::{ContextMenuAction, EventBus, GraphEvent, Subscription};
use super::filter::{FilterCriteria, Visibility, compute_visibility, search};
use super::interaction::{
	Hit, InteractionController, InteractionMode, InteractionState, Intent, KeyCommand,
	PointerButton,
};
use super::layout::{LayoutSession, LayoutStrategy};
use super::model::{Edge, GraphModel};
use super::render::{Frame, HoverFade, Scene, Surface, render};
use super::style::node_radius;
use super::touch::{TouchAction, TouchTracker};
use super::types::{
	EdgeId, GraphData, GraphEdge, GraphNode, HighlightedPath, LoadedGraph, NodeId, Point,
	Positions, ViewportSize,
};
use super::viewport::{ViewTransform, Viewport};

/// Whether the engine has something to show.
///
/// `Loaded` with zero nodes is a successful empty graph, distinct from
/// `NoData` (nothing requested yet) and `Failed`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
	/// Nothing requested yet.
	#[default]
	NoData,
	/// A fetch is in flight.
	Loading,
	/// The last fetch failed, with the reason.
	Failed(String),
	/// A graph, possibly empty, is installed.
	Loaded,
}

impl LoadState {
	/// Text to show over the canvas instead of a graph, if any. `nodes` is
	/// the number of nodes currently loaded.
	pub fn notice(&self, nodes: usize) -> Option<String> {
		match self {
			Self::NoData => None,
			Self::Loading => Some("Loading graph...".to_owned()),
			Self::Failed(reason) => Some(format!("Could not load the graph: {reason}")),
			Self::Loaded if nodes == 0 => Some("This graph has no concepts yet.".to_owned()),
			Self::Loaded => None,
		}
	}
}

/// The knowledge-graph engine: model, layout, viewport, interaction and
/// filtering behind one single-threaded facade.
///
/// Every state-affecting call notifies the redraw subscribers before it
/// returns; collaborator notifications go out through [`GraphEvent`].
#[derive(Debug)]
pub struct KnowledgeGraph {
	config: EngineConfig,
	graph: GraphModel,
	layout: LayoutSession,
	viewport: Viewport,
	interaction: InteractionController,
	touch: TouchTracker,
	filter: FilterCriteria,
	visibility: Visibility,
	search_matches: Vec<NodeId>,
	highlighted_path: HighlightedPath,
	hover: HoverFade,
	load_state: LoadState,
	events: EventBus<GraphEvent>,
	redraw: EventBus<()>,
}

impl KnowledgeGraph {
	/// Empty engine sized to `size`.
	pub fn new(config: EngineConfig, size: ViewportSize) -> Self {
		Self {
			layout: LayoutSession::new(config.clone()),
			viewport: Viewport::new(size, config.pan_extent),
			interaction: InteractionController::new(config.drag_threshold),
			touch: TouchTracker::new(config.long_press_ms, config.drag_threshold),
			config,
			graph: GraphModel::new(),
			filter: FilterCriteria::default(),
			visibility: Visibility::default(),
			search_matches: Vec::new(),
			highlighted_path: HighlightedPath::default(),
			hover: HoverFade::default(),
			load_state: LoadState::default(),
			events: EventBus::default(),
			redraw: EventBus::default(),
		}
	}

	/// Settings in effect.
	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Node and edge store.
	pub fn graph(&self) -> &GraphModel {
		&self.graph
	}

	/// Live layout positions.
	pub fn positions(&self) -> &Positions {
		self.layout.positions()
	}

	/// Live position of one node.
	pub fn position(&self, id: &NodeId) -> Option<Point> {
		self.layout.position(id)
	}

	/// Layout strategy in effect.
	pub fn strategy(&self) -> LayoutStrategy {
		self.layout.strategy()
	}

	/// Whether the force simulation has stopped.
	pub fn is_settled(&self) -> bool {
		self.layout.is_settled()
	}

	/// Current zoom and pan.
	pub fn transform(&self) -> ViewTransform {
		self.viewport.transform()
	}

	/// Canvas size in CSS pixels.
	pub fn size(&self) -> ViewportSize {
		self.viewport.size()
	}

	/// Selection, hover, drag and menu state.
	pub fn interaction(&self) -> &InteractionState {
		self.interaction.state()
	}

	/// Coarse interaction mode.
	pub fn mode(&self) -> InteractionMode {
		self.interaction.mode()
	}

	/// Selected node, if any.
	pub fn selected(&self) -> Option<&NodeId> {
		self.interaction.selected()
	}

	/// Filter criteria in effect.
	pub fn filter(&self) -> &FilterCriteria {
		&self.filter
	}

	/// Nodes and edges that pass the filter.
	pub fn visibility(&self) -> &Visibility {
		&self.visibility
	}

	/// Visible nodes matching the last search, in graph order.
	pub fn search_matches(&self) -> &[NodeId] {
		&self.search_matches
	}

	/// Path drawn on top of the graph.
	pub fn highlighted_path(&self) -> &HighlightedPath {
		&self.highlighted_path
	}

	/// Where the last load stands.
	pub fn load_state(&self) -> &LoadState {
		&self.load_state
	}

	/// Listen for [`GraphEvent`]s.
	pub fn subscribe(&mut self, listener: impl FnMut(&GraphEvent) + 'static) -> Subscription {
		self.events.subscribe(listener)
	}

	/// Stop a listener. Returns whether it was registered.
	pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
		self.events.unsubscribe(subscription)
	}

	/// Called whenever the drawn output may have changed.
	pub fn subscribe_redraw(&mut self, listener: impl FnMut(&()) + 'static) -> Subscription {
		self.redraw.subscribe(listener)
	}

	/// Raw transform observer, called for every zoom or pan change.
	pub fn subscribe_view(&mut self, listener: impl FnMut(&ViewTransform) + 'static) -> Subscription {
		self.viewport.subscribe(listener)
	}

	fn request_redraw(&mut self) {
		self.redraw.emit(&());
	}

	fn emit(&mut self, event: GraphEvent) {
		self.events.emit(&event);
	}

	fn view_changed(&mut self, changed: bool) {
		if changed {
			let t = self.viewport.transform();
			self.emit(GraphEvent::ViewChanged(t));
		}
	}

	// ---- loading ----

	fn set_load_state(&mut self, state: LoadState) {
		self.load_state = state.clone();
		let nodes = self.graph.node_count();
		self.emit(GraphEvent::LoadStateChanged { state, nodes });
		self.request_redraw();
	}

	/// Mark a fetch as started.
	pub fn begin_load(&mut self) {
		self.set_load_state(LoadState::Loading);
	}

	/// Install the result of a graph fetch. Source failures leave the engine
	/// in [`LoadState::Failed`]; integrity failures also keep the previous graph.
	pub fn finish_load(
		&mut self,
		result: Result<LoadedGraph, SourceError>,
	) -> Result<(), GraphIntegrityError> {
		let loaded = match result {
			Ok(loaded) => loaded,
			Err(err) => {
				warn!("graph load failed: {err}");
				self.set_load_state(LoadState::Failed(err.to_string()));
				return Ok(());
			}
		};
		if let Err(err) = self.graph.set_graph(loaded.data) {
			warn!("graph load rejected: {err}");
			self.set_load_state(LoadState::Failed(err.to_string()));
			return Err(err);
		}
		self.graph.apply_mastery(&loaded.mastery);
		info!(
			"loaded graph with {} nodes and {} edges",
			self.graph.node_count(),
			self.graph.edge_count()
		);

		self.interaction.reset();
		self.hover.clear();
		self.highlighted_path = HighlightedPath::default();
		self.layout.reset();
		let reset = self.viewport.reset_view();
		self.view_changed(reset);
		self.refresh_visibility();
		let strategy = self.layout.strategy();
		self.apply_layout(strategy);
		self.set_load_state(LoadState::Loaded);
		Ok(())
	}

	/// Install `data` as a successful load with no mastery overlay.
	pub fn set_graph(&mut self, data: GraphData) -> Result<(), GraphIntegrityError> {
		self.finish_load(Ok(LoadedGraph {
			data,
			mastery: Default::default(),
		}))
	}

	/// Drop the graph and return to [`LoadState::NoData`].
	pub fn clear(&mut self) {
		self.graph.clear();
		self.layout.reset();
		self.interaction.reset();
		self.hover.clear();
		self.search_matches.clear();
		self.highlighted_path = HighlightedPath::default();
		self.visibility = Visibility::default();
		self.set_load_state(LoadState::NoData);
	}

	// ---- layout ----

	/// Switch strategy and lay out the graph from scratch.
	pub fn apply_layout(&mut self, strategy: LayoutStrategy) -> &Positions {
		self.layout.apply_layout(&mut self.graph, strategy, self.viewport.size());
		self.request_redraw();
		self.layout.positions()
	}

	/// Re-run the current strategy, starting from the positions on screen.
	pub fn relayout(&mut self) {
		self.graph.commit_positions(self.layout.positions());
		let strategy = self.layout.strategy();
		self.apply_layout(strategy);
	}

	/// Frame step: advance the simulation once and the hover fade by `dt`
	/// seconds. Returns whether anything visible changed.
	pub fn tick(&mut self, dt: f64) -> bool {
		let was_settled = self.layout.is_settled();
		let moved = self.layout.tick();
		if !was_settled && self.layout.is_settled() {
			self.graph.commit_positions(self.layout.positions());
			debug!("simulation settled");
		}
		let fading = self.hover.advance(dt);
		let changed = moved || fading;
		if changed {
			self.request_redraw();
		}
		changed
	}

	/// Follow a canvas resize.
	pub fn resize(&mut self, size: ViewportSize) {
		if size == self.viewport.size() {
			return;
		}
		self.viewport.resize(size);
		self.layout.resize(&mut self.graph, size);
		self.request_redraw();
	}

	// ---- viewport ----

	/// Zoom in about the viewport center.
	pub fn zoom_in(&mut self) {
		let changed = self.viewport.zoom_in();
		self.after_view_change(changed);
	}

	/// Zoom out about the viewport center.
	pub fn zoom_out(&mut self) {
		let changed = self.viewport.zoom_out();
		self.after_view_change(changed);
	}

	/// Back to the identity transform.
	pub fn reset_view(&mut self) {
		let changed = self.viewport.reset_view();
		self.after_view_change(changed);
	}

	/// Shift the view by a screen-space offset.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		let changed = self.viewport.pan_by(dx, dy);
		self.after_view_change(changed);
	}

	/// Wheel zoom about the pointer.
	pub fn wheel(&mut self, screen: Point, delta_y: f64) {
		let changed = self.viewport.wheel(screen, delta_y);
		self.after_view_change(changed);
	}

	/// Pan so `id` sits at the viewport center. False if it has no position.
	pub fn center_on_node(&mut self, id: &NodeId) -> bool {
		let Some(p) = self.layout.position(id) else {
			return false;
		};
		let changed = self.viewport.center_on(p);
		self.after_view_change(changed);
		true
	}

	fn after_view_change(&mut self, changed: bool) {
		self.view_changed(changed);
		if changed {
			self.request_redraw();
		}
	}

	// ---- pointer and keyboard ----

	/// Topmost visible node whose circle contains `screen`. Radii are scaled
	/// by the zoom so the hit area matches what is drawn.
	pub fn hit_test(&self, screen: Point) -> Option<Hit> {
		let t = self.viewport.transform();
		let mut found = None;
		for node in self.graph.nodes() {
			if !self.visibility.node_visible(&node.id) {
				continue;
			}
			let Some(center) = self.layout.position(&node.id) else {
				continue;
			};
			let radius = node_radius(node.importance, self.config.node_size) * t.zoom;
			if t.graph_to_screen(center).distance(screen) <= radius {
				found = Some(Hit {
					node: node.id.clone(),
					center,
				});
			}
		}
		found
	}

	/// Mouse button pressed at a screen point.
	pub fn pointer_down(&mut self, button: PointerButton, screen: Point) {
		let graph = self.viewport.screen_to_graph(screen);
		let hit = self.hit_test(screen);
		let intents = self.interaction.pointer_down(button, screen, graph, hit);
		self.apply_intents(intents);
	}

	/// Pointer moved to a screen point.
	pub fn pointer_move(&mut self, screen: Point) {
		let graph = self.viewport.screen_to_graph(screen);
		let hit = self.hit_test(screen);
		let intents = self.interaction.pointer_move(screen, graph, hit);
		self.apply_intents(intents);
	}

	/// Mouse button released.
	pub fn pointer_up(&mut self) {
		let intents = self.interaction.pointer_up();
		self.apply_intents(intents);
	}

	/// Pointer left the canvas.
	pub fn pointer_leave(&mut self) {
		let intents = self.interaction.pointer_leave();
		self.apply_intents(intents);
	}

	/// Double click at a screen point.
	pub fn double_click(&mut self, screen: Point) {
		let hit = self.hit_test(screen);
		let intents = self.interaction.double_click(hit);
		self.apply_intents(intents);
	}

	/// Right click at a screen point.
	pub fn context_menu(&mut self, screen: Point) {
		let hit = self.hit_test(screen);
		let intents = self.interaction.context_menu_at(screen, hit);
		self.apply_intents(intents);
	}

	/// Run a context-menu entry.
	pub fn choose_action(&mut self, action: ContextMenuAction) {
		let intents = self.interaction.choose_action(action);
		self.apply_intents(intents);
	}

	/// Close the context menu.
	pub fn dismiss_menu(&mut self) {
		let intents = self.interaction.dismiss_menu();
		self.apply_intents(intents);
	}

	/// Keyboard shortcut; ignored while a text input has focus.
	pub fn key_down(&mut self, key: &str, text_input_focused: bool) {
		let intents = self.interaction.key_down(key, text_input_focused);
		self.apply_intents(intents);
	}

	/// Touch points are screen positions of every finger currently down.
	pub fn touch_start(&mut self, touches: &[Point], now_ms: f64) {
		let actions = self.touch.start(touches, now_ms);
		self.apply_touch(actions);
	}

	/// Fingers moved.
	pub fn touch_move(&mut self, touches: &[Point]) {
		let actions = self.touch.moved(touches);
		self.apply_touch(actions);
	}

	/// A finger lifted; `remaining` are those still down.
	pub fn touch_end(&mut self, remaining: &[Point]) {
		let actions = self.touch.end(remaining);
		self.apply_touch(actions);
	}

	/// The browser cancelled the touch.
	pub fn touch_cancel(&mut self) {
		let actions = self.touch.cancel();
		self.apply_touch(actions);
	}

	/// Frame poll that turns a held touch into a context-menu request.
	pub fn touch_hold(&mut self, now_ms: f64) {
		if let Some(action) = self.touch.hold(now_ms) {
			self.apply_touch(vec![action]);
		}
	}

	fn apply_touch(&mut self, actions: Vec<TouchAction>) {
		for action in actions {
			match action {
				TouchAction::Press(p) => self.pointer_down(PointerButton::Primary, p),
				TouchAction::Move(p) => self.pointer_move(p),
				TouchAction::Release => self.pointer_up(),
				TouchAction::Cancel => self.pointer_leave(),
				TouchAction::LongPress(p) => self.context_menu(p),
				TouchAction::Pinch { center, factor } => {
					let changed = self.viewport.zoom_at(center, factor);
					self.after_view_change(changed);
				}
			}
		}
	}

	fn apply_intents(&mut self, intents: Vec<Intent>) {
		if intents.is_empty() {
			return;
		}
		for intent in intents {
			match intent {
				Intent::HoverChanged(node) => {
					let neighbors = node
						.as_ref()
						.map(|id| self.graph.neighbors(id))
						.unwrap_or_default();
					self.hover.set(node, neighbors);
				}
				Intent::BeginDrag(id) => self.layout.begin_drag(&id),
				Intent::MoveNode(id, p) => self.layout.drag_to(&id, p),
				Intent::EndDrag(id) => {
					self.layout.end_drag(&id);
					self.graph.commit_positions(self.layout.positions());
				}
				Intent::BeginPan(p) => self.viewport.begin_pan(p),
				Intent::PanTo(p) => {
					let changed = self.viewport.pan_to(p);
					self.view_changed(changed);
				}
				Intent::EndPan => self.viewport.end_pan(),
				Intent::Select(id) => self.emit(GraphEvent::NodeSelected(id)),
				Intent::ClearSelection => {}
				Intent::Navigate(id) => self.emit(GraphEvent::NodeNavigated(id)),
				Intent::OpenMenu(menu) => self.emit(GraphEvent::ContextMenuOpened {
					node: menu.node,
					at: menu.at,
				}),
				Intent::CloseMenu => self.emit(GraphEvent::ContextMenuClosed),
				Intent::MenuAction(action, node) => {
					self.emit(GraphEvent::ContextMenuAction { action, node })
				}
				Intent::Key(command) => {
					let changed = match command {
						KeyCommand::ZoomIn => self.viewport.zoom_in(),
						KeyCommand::ZoomOut => self.viewport.zoom_out(),
						KeyCommand::ResetView => self.viewport.reset_view(),
						KeyCommand::Escape => false,
					};
					self.view_changed(changed);
				}
			}
		}
		self.request_redraw();
	}

	// ---- filtering, search and paths ----

	/// Replace the filter and recompute visibility and search matches.
	pub fn set_filter(&mut self, criteria: FilterCriteria) {
		self.filter = criteria;
		self.refresh_visibility();
		self.emit(GraphEvent::FilterChanged(self.filter.clone()));
		self.request_redraw();
	}

	/// Highlight every visible label match, select the first one and bring
	/// it to the viewport center.
	pub fn submit_search(&mut self, query: &str) -> Option<NodeId> {
		self.filter.search_query = query.to_owned();
		self.refresh_search();
		self.emit(GraphEvent::SearchSubmitted(query.to_owned()));

		let first = self.search_matches.first().cloned();
		if let Some(id) = &first {
			self.interaction.select(Some(id.clone()));
			self.emit(GraphEvent::NodeSelected(id.clone()));
			self.center_on_node(id);
		}
		self.request_redraw();
		first
	}

	/// Draw `path` as the highlighted learning path.
	pub fn set_highlighted_path(&mut self, path: impl Into<HighlightedPath>) {
		self.highlighted_path = path.into();
		self.request_redraw();
	}

	fn refresh_search(&mut self) {
		let visibility = &self.visibility;
		self.search_matches = search(&self.graph, &self.filter.search_query)
			.into_iter()
			.filter(|id| visibility.node_visible(id))
			.collect();
	}

	fn refresh_visibility(&mut self) {
		self.visibility = compute_visibility(&self.graph, &self.filter);
		let state = self.interaction.state();
		let hidden: Vec<NodeId> = [
			state.selected.as_ref(),
			state.hovered.as_ref(),
			state.drag.as_ref().map(|d| &d.node),
			state.context_menu.as_ref().map(|m| &m.node),
		]
		.into_iter()
		.flatten()
		.filter(|id| !self.visibility.node_visible(id))
		.cloned()
		.collect();
		let mut released = Vec::new();
		for id in &hidden {
			released.extend(self.interaction.forget(id));
		}
		if !hidden.is_empty() {
			self.hover.clear();
		}
		self.refresh_search();
		self.apply_intents(released);
	}

	// ---- editing ----

	/// Add one node and re-run the layout.
	pub fn add_node(&mut self, node: GraphNode) -> Result<(), GraphIntegrityError> {
		self.graph.add_node(node)?;
		self.after_edit();
		Ok(())
	}

	/// Remove a node and the edges touching it. Returns the removed edges.
	pub fn remove_node(&mut self, id: &NodeId) -> Result<Vec<Edge>, GraphIntegrityError> {
		let removed = self.graph.remove_node(id)?;
		let released = self.interaction.forget(id);
		self.apply_intents(released);
		self.hover.clear();
		self.after_edit();
		Ok(removed)
	}

	/// Add one edge and re-run the layout.
	pub fn add_edge(&mut self, edge: GraphEdge) -> Result<EdgeId, GraphIntegrityError> {
		let id = self.graph.add_edge(edge)?;
		self.after_edit();
		Ok(id)
	}

	/// Remove one edge and re-run the layout.
	pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, GraphIntegrityError> {
		let edge = self.graph.remove_edge(id)?;
		self.after_edit();
		Ok(edge)
	}

	fn after_edit(&mut self) {
		self.refresh_visibility();
		self.relayout();
	}

	// ---- drawing ----

	/// Borrowed view of everything the renderer needs.
	pub fn frame(&self) -> Frame<'_> {
		Frame {
			graph: &self.graph,
			positions: self.layout.positions(),
			transform: self.viewport.transform(),
			size: self.viewport.size(),
			interaction: self.interaction.state(),
			visibility: &self.visibility,
			highlighted_path: &self.highlighted_path,
			search_matches: &self.search_matches,
			hover: &self.hover,
			config: &self.config,
		}
	}

	/// Render the current frame onto `surface`.
	pub fn draw(&self, surface: &mut impl Surface) {
		render(&self.frame(), surface);
	}

	/// Display list of the current frame, for export.
	pub fn scene(&self) -> Scene {
		let mut scene = Scene::default();
		self.draw(&mut scene);
		scene
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::components::knowledge_graph::types::MasteryMap;

	const SIZE: ViewportSize = ViewportSize::new(600.0, 400.0);

	fn data() -> GraphData {
		GraphData {
			nodes: vec![
				GraphNode::new("alg", "Algebra").with_subject("math").with_mastery(100.0),
				GraphNode::new("fn", "Functions").with_subject("math").with_mastery(40.0),
				GraphNode::new("lim", "Limits").with_subject("math"),
				GraphNode::new("bio", "Cell Biology").with_subject("biology"),
			],
			edges: vec![GraphEdge::new("alg", "fn"), GraphEdge::new("fn", "lim")],
		}
	}

	fn engine(strategy: LayoutStrategy) -> (KnowledgeGraph, Rc<RefCell<Vec<GraphEvent>>>) {
		let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
		let log = Rc::new(RefCell::new(Vec::new()));
		let sink = log.clone();
		kg.subscribe(move |e| sink.borrow_mut().push(e.clone()));
		kg.set_graph(data()).unwrap();
		kg.apply_layout(strategy);
		log.borrow_mut().clear();
		(kg, log)
	}

	fn screen_of(kg: &KnowledgeGraph, id: &str) -> Point {
		kg.transform().graph_to_screen(kg.position(&id.into()).unwrap())
	}

	#[test]
	fn load_states_are_distinct() {
		let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
		assert_eq!(kg.load_state(), &LoadState::NoData);
		kg.begin_load();
		assert_eq!(kg.load_state(), &LoadState::Loading);
		kg.finish_load(Err(SourceError::Unavailable("offline".into())))
			.unwrap();
		assert!(matches!(kg.load_state(), LoadState::Failed(reason) if reason.contains("offline")));

		kg.finish_load(Ok(LoadedGraph::default())).unwrap();
		assert_eq!(kg.load_state(), &LoadState::Loaded);
		assert!(kg.graph().is_empty());
		assert!(kg.positions().is_empty());
	}

	#[test]
	fn notices_separate_pending_failed_and_empty() {
		assert_eq!(LoadState::NoData.notice(0), None);
		assert_eq!(LoadState::Loaded.notice(3), None);
		assert!(LoadState::Loading.notice(0).is_some());
		assert!(LoadState::Failed("offline".into()).notice(5).unwrap().contains("offline"));
		assert_ne!(LoadState::Loaded.notice(0), LoadState::Loading.notice(0));
	}

	#[test]
	fn load_state_changes_are_announced() {
		let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
		let log = Rc::new(RefCell::new(Vec::new()));
		let sink = log.clone();
		kg.subscribe(move |e| {
			if let GraphEvent::LoadStateChanged { state, nodes } = e {
				sink.borrow_mut().push((state.clone(), *nodes));
			}
		});

		kg.begin_load();
		kg.finish_load(Err(SourceError::Unavailable("offline".into())))
			.unwrap();
		kg.begin_load();
		kg.finish_load(Ok(LoadedGraph::default())).unwrap();
		kg.set_graph(data()).unwrap();
		kg.clear();

		assert_eq!(
			log.borrow().as_slice(),
			&[
				(LoadState::Loading, 0),
				(LoadState::Failed("source unavailable: offline".into()), 0),
				(LoadState::Loading, 0),
				(LoadState::Loaded, 0),
				(LoadState::Loaded, 4),
				(LoadState::NoData, 0),
			]
		);
	}

	#[test]
	fn mastery_is_merged_on_load() {
		let mut kg = KnowledgeGraph::new(EngineConfig::default(), SIZE);
		let mastery = MasteryMap::from([("lim".into(), 55.0), ("ghost".into(), 10.0)]);
		kg.finish_load(Ok(LoadedGraph {
			data: data(),
			mastery,
		}))
		.unwrap();
		assert_eq!(kg.graph().get_node(&"lim".into()).unwrap().mastery, 55.0);
		assert_eq!(kg.graph().node_count(), 4);
	}

	#[test]
	fn dangling_load_keeps_previous_graph() {
		let (mut kg, _) = engine(LayoutStrategy::Radial);
		let mut bad = data();
		bad.edges.push(GraphEdge::new("alg", "nowhere"));
		assert!(kg.set_graph(bad).is_err());
		assert_eq!(kg.graph().node_count(), 4);
		assert!(matches!(kg.load_state(), LoadState::Failed(_)));
	}

	#[test]
	fn click_selects_and_notifies() {
		let (mut kg, log) = engine(LayoutStrategy::Radial);
		let p = screen_of(&kg, "fn");
		kg.pointer_down(PointerButton::Primary, p);
		kg.pointer_up();
		assert_eq!(kg.selected(), Some(&"fn".into()));
		assert_eq!(log.borrow().as_slice(), &[GraphEvent::NodeSelected("fn".into())]);
	}

	#[test]
	fn hit_test_follows_zoom() {
		let (mut kg, _) = engine(LayoutStrategy::Radial);
		let center = kg.position(&"alg".into()).unwrap();
		let off = Point::new(center.x + 15.0, center.y);
		assert!(kg.hit_test(kg.transform().graph_to_screen(off)).is_none());
		kg.zoom_in();
		kg.zoom_in();
		// radius 10 at zoom 1.44 covers 14.4 screen px
		let t = kg.transform();
		let near = Point::new(t.graph_to_screen(center).x + 14.0, t.graph_to_screen(center).y);
		assert_eq!(kg.hit_test(near).map(|h| h.node), Some("alg".into()));
	}

	#[test]
	fn drag_on_pinned_layout_moves_only_that_node() {
		let (mut kg, _) = engine(LayoutStrategy::Tree);
		let before = kg.positions().clone();
		let p = screen_of(&kg, "lim");
		kg.pointer_down(PointerButton::Primary, p);
		kg.pointer_move(Point::new(p.x + 40.0, p.y - 20.0));
		assert_eq!(kg.mode(), InteractionMode::Dragging);
		kg.pointer_up();
		let after = kg.position(&"lim".into()).unwrap();
		assert_eq!(after, Point::new(before[&"lim".into()].x + 40.0, before[&"lim".into()].y - 20.0));
		assert_eq!(kg.graph().get_node(&"lim".into()).unwrap().position, Some(after));
		assert_eq!(kg.position(&"alg".into()), before.get(&"alg".into()).copied());
		assert_eq!(kg.selected(), None);
	}

	#[test]
	fn filter_hides_selection_and_emits() {
		let (mut kg, log) = engine(LayoutStrategy::Radial);
		kg.submit_search("cell");
		assert_eq!(kg.selected(), Some(&"bio".into()));
		log.borrow_mut().clear();

		let criteria = FilterCriteria {
			subject: Some("math".into()),
			show_completed: false,
			..FilterCriteria::default()
		};
		kg.set_filter(criteria.clone());
		assert!(!kg.visibility().node_visible(&"alg".into()));
		assert!(!kg.visibility().node_visible(&"bio".into()));
		assert!(kg.visibility().node_visible(&"fn".into()));
		assert_eq!(kg.selected(), None);
		assert_eq!(log.borrow().as_slice(), &[GraphEvent::FilterChanged(criteria)]);
	}

	#[test]
	fn resubmitting_a_search_jumps_again() {
		let (mut kg, log) = engine(LayoutStrategy::Radial);
		kg.submit_search("limits");
		kg.pan_by(120.0, -40.0);
		assert!(screen_of(&kg, "lim").distance(SIZE.center()) > 1.0);

		assert_eq!(kg.submit_search("limits"), Some("lim".into()));
		assert!(screen_of(&kg, "lim").distance(SIZE.center()) < 1e-9);
		let submitted = log
			.borrow()
			.iter()
			.filter(|e| **e == GraphEvent::SearchSubmitted("limits".into()))
			.count();
		assert_eq!(submitted, 2);
	}

	#[test]
	fn hiding_the_dragged_node_releases_the_simulation() {
		let (mut kg, _log) = engine(LayoutStrategy::Force);
		for _ in 0..20 {
			kg.tick(0.016);
		}
		let press = screen_of(&kg, "lim");
		kg.pointer_down(PointerButton::Primary, press);
		kg.pointer_move(Point::new(press.x + 20.0, press.y + 20.0));
		assert_eq!(kg.interaction().drag.as_ref().map(|d| &d.node), Some(&"lim".into()));

		kg.set_filter(FilterCriteria {
			subject: Some("biology".into()),
			..FilterCriteria::default()
		});
		assert!(kg.interaction().drag.is_none());
		kg.pointer_up();

		let mut guard = 0;
		while !kg.is_settled() {
			kg.tick(0.016);
			guard += 1;
			assert!(guard <= 1000, "simulation kept running after the drag was dropped");
		}
	}

	#[test]
	fn search_selects_and_centers_first_match() {
		let (mut kg, log) = engine(LayoutStrategy::Radial);
		assert_eq!(kg.submit_search("  LIM "), Some("lim".into()));
		assert_eq!(kg.search_matches(), &["lim".into()]);
		let centered = screen_of(&kg, "lim");
		assert!(centered.distance(SIZE.center()) < 1e-9);
		let events = log.borrow();
		assert_eq!(events[0], GraphEvent::SearchSubmitted("  LIM ".into()));
		assert_eq!(events[1], GraphEvent::NodeSelected("lim".into()));
		assert!(matches!(events[2], GraphEvent::ViewChanged(_)));
	}

	#[test]
	fn context_menu_action_round_trip() {
		let (mut kg, log) = engine(LayoutStrategy::Radial);
		let p = screen_of(&kg, "alg");
		kg.context_menu(p);
		assert_eq!(kg.mode(), InteractionMode::ContextMenuOpen);
		kg.choose_action(ContextMenuAction::Path);
		assert_eq!(
			log.borrow().as_slice(),
			&[
				GraphEvent::ContextMenuOpened {
					node: "alg".into(),
					at: p
				},
				GraphEvent::ContextMenuAction {
					action: ContextMenuAction::Path,
					node: "alg".into()
				},
				GraphEvent::ContextMenuClosed,
			]
		);
	}

	#[test]
	fn keyboard_zoom_respects_text_focus() {
		let (mut kg, _) = engine(LayoutStrategy::Radial);
		kg.key_down("+", true);
		assert_eq!(kg.transform().zoom, 1.0);
		kg.key_down("+", false);
		assert!((kg.transform().zoom - 1.2).abs() < 1e-12);
		kg.key_down("0", false);
		assert_eq!(kg.transform(), ViewTransform::default());
	}

	#[test]
	fn removing_a_node_relayouts_and_forgets_it() {
		let (mut kg, _) = engine(LayoutStrategy::Radial);
		kg.submit_search("functions");
		let removed = kg.remove_node(&"fn".into()).unwrap();
		assert_eq!(removed.len(), 2);
		assert_eq!(kg.selected(), None);
		assert_eq!(kg.positions().len(), 3);
		assert!(kg.add_node(GraphNode::new("fn", "Again")).is_err());
		kg.add_node(GraphNode::new("deriv", "Derivatives")).unwrap();
		kg.add_edge(GraphEdge::new("lim", "deriv")).unwrap();
		assert_eq!(kg.positions().len(), 4);
	}

	#[test]
	fn redraw_is_requested_on_state_changes() {
		let (mut kg, _) = engine(LayoutStrategy::Force);
		let count = Rc::new(RefCell::new(0));
		let sink = count.clone();
		kg.subscribe_redraw(move |_| *sink.borrow_mut() += 1);
		assert!(kg.tick(1.0 / 60.0));
		kg.wheel(Point::new(10.0, 10.0), -1.0);
		assert_eq!(*count.borrow(), 2);
	}

	#[test]
	fn touch_tap_selects_and_hold_opens_menu() {
		let (mut kg, log) = engine(LayoutStrategy::Radial);
		let p = screen_of(&kg, "lim");
		kg.touch_start(&[p], 0.0);
		kg.touch_end(&[]);
		assert_eq!(kg.selected(), Some(&"lim".into()));

		let q = screen_of(&kg, "bio");
		kg.touch_start(&[q], 1000.0);
		kg.touch_hold(1200.0);
		assert!(kg.interaction().context_menu.is_none());
		kg.touch_hold(1000.0 + kg.config().long_press_ms);
		kg.touch_end(&[]);
		assert_eq!(kg.interaction().context_menu.as_ref().map(|m| &m.node), Some(&"bio".into()));
		assert_eq!(kg.selected(), Some(&"lim".into()));
		assert_eq!(
			log.borrow().last(),
			Some(&GraphEvent::ContextMenuOpened {
				node: "bio".into(),
				at: q,
			})
		);
	}

	#[test]
	fn pinch_zooms_about_the_finger_midpoint() {
		let (mut kg, _) = engine(LayoutStrategy::Radial);
		let (a, b) = (Point::new(200.0, 200.0), Point::new(260.0, 200.0));
		let mid = Point::new(230.0, 200.0);
		let anchor = kg.transform().screen_to_graph(mid);
		kg.touch_start(&[a], 0.0);
		kg.touch_start(&[a, b], 5.0);
		kg.touch_move(&[Point::new(170.0, 200.0), Point::new(290.0, 200.0)]);
		assert!((kg.transform().zoom - 2.0).abs() < 1e-9);
		assert!(kg.transform().screen_to_graph(mid).distance(anchor) < 1e-9);
		kg.touch_end(&[]);
		assert_eq!(kg.mode(), InteractionMode::Idle);
	}

	#[test]
	fn scene_exports_current_frame() {
		let (mut kg, _) = engine(LayoutStrategy::Radial);
		kg.set_highlighted_path(HighlightedPath::new(vec![
			crate::components::knowledge_graph::types::PathStep {
				source: "alg".into(),
				target: "fn".into(),
			},
		]));
		let svg = kg.scene().to_svg();
		assert!(svg.contains("Cell Biology"));
		assert!(svg.contains(&crate::components::knowledge_graph::style::EDGE_EMPHASIS.hex()));
	}
}
