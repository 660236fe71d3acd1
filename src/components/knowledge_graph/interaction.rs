use super::events::ContextMenuAction;
use super::types::{NodeId, Point};

/// Coarse state, derived from [`InteractionState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
	/// Nothing under the pointer.
	Idle,
	/// Pointer over a node.
	Hovering,
	/// A node is pressed or being dragged.
	Dragging,
	/// The node menu is showing.
	ContextMenuOpen,
}

/// Mouse buttons the graph reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
	/// Left button.
	Primary,
	/// Right button.
	Secondary,
}

impl PointerButton {
	/// Maps a DOM `MouseEvent.button` value.
	pub fn from_dom(button: i16) -> Option<Self> {
		match button {
			0 => Some(Self::Primary),
			2 => Some(Self::Secondary),
			_ => None,
		}
	}
}

/// A node under the pointer, with its center in graph space.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
	/// Node hit.
	pub node: NodeId,
	/// Its center.
	pub center: Point,
}

/// A node held by the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct DragTarget {
	/// Node held.
	pub node: NodeId,
	/// Node center minus pointer, in graph space.
	pub offset: Point,
	press: Point,
	moved: bool,
}

/// An open node menu.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
	/// Node the menu belongs to.
	pub node: NodeId,
	/// Screen coordinates of the triggering event.
	pub at: Point,
}

/// Everything the controller tracks between events.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
	/// Last clicked node.
	pub selected: Option<NodeId>,
	/// Node under the pointer.
	pub hovered: Option<NodeId>,
	/// Press or drag in progress.
	pub drag: Option<DragTarget>,
	/// Open menu, if any.
	pub context_menu: Option<ContextMenu>,
}

/// Keyboard shortcuts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
	/// Zoom in about the viewport center.
	ZoomIn,
	/// Zoom out about the viewport center.
	ZoomOut,
	/// Back to the identity transform.
	ResetView,
	/// Clear the selection and close the menu.
	Escape,
}

impl KeyCommand {
	/// Maps a DOM `KeyboardEvent.key` value.
	pub fn from_key(key: &str) -> Option<Self> {
		match key {
			"+" | "=" => Some(Self::ZoomIn),
			"-" | "_" => Some(Self::ZoomOut),
			"0" => Some(Self::ResetView),
			"Escape" => Some(Self::Escape),
			_ => None,
		}
	}
}

/// What the engine must do in response to an input event.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
	/// The hovered node changed.
	HoverChanged(Option<NodeId>),
	/// A press travelled far enough to become a drag.
	BeginDrag(NodeId),
	/// Move the dragged node to a graph-space point.
	MoveNode(NodeId, Point),
	/// The drag ended; release the node.
	EndDrag(NodeId),
	/// Start panning from a screen point.
	BeginPan(Point),
	/// Continue panning to a screen point.
	PanTo(Point),
	/// Stop panning.
	EndPan,
	/// A node was clicked.
	Select(NodeId),
	/// Drop the selection.
	ClearSelection,
	/// A node was double clicked.
	Navigate(NodeId),
	/// Show the node menu.
	OpenMenu(ContextMenu),
	/// Hide the node menu.
	CloseMenu,
	/// A menu entry was chosen for a node.
	MenuAction(ContextMenuAction, NodeId),
	/// A keyboard shortcut fired.
	Key(KeyCommand),
}

/// Selection / hover / drag / context-menu state machine. Pure: it never
/// touches the graph, it only reports [`Intent`]s.
#[derive(Clone, Debug)]
pub struct InteractionController {
	state: InteractionState,
	panning: bool,
	drag_threshold: f64,
}

impl InteractionController {
	/// `drag_threshold` is the screen travel that turns a press into a drag.
	pub fn new(drag_threshold: f64) -> Self {
		Self {
			state: InteractionState::default(),
			panning: false,
			drag_threshold,
		}
	}

	/// Full state snapshot.
	pub fn state(&self) -> &InteractionState {
		&self.state
	}

	/// Last clicked node.
	pub fn selected(&self) -> Option<&NodeId> {
		self.state.selected.as_ref()
	}

	/// Node under the pointer.
	pub fn hovered(&self) -> Option<&NodeId> {
		self.state.hovered.as_ref()
	}

	/// Open menu, if any.
	pub fn context_menu(&self) -> Option<&ContextMenu> {
		self.state.context_menu.as_ref()
	}

	/// Node currently held by an active (moved) drag.
	pub fn dragged(&self) -> Option<&NodeId> {
		self.state
			.drag
			.as_ref()
			.filter(|d| d.moved)
			.map(|d| &d.node)
	}

	/// Coarse mode for cursor and rendering choices.
	pub fn mode(&self) -> InteractionMode {
		if self.state.context_menu.is_some() {
			InteractionMode::ContextMenuOpen
		} else if self.state.drag.is_some() {
			InteractionMode::Dragging
		} else if self.state.hovered.is_some() {
			InteractionMode::Hovering
		} else {
			InteractionMode::Idle
		}
	}

	/// Drop all state.
	pub fn reset(&mut self) {
		self.state = InteractionState::default();
		self.panning = false;
	}

	/// Set the selection without emitting intents.
	pub fn select(&mut self, node: Option<NodeId>) {
		self.state.selected = node;
	}

	/// Forget a node that left the graph or became hidden. A drag in progress
	/// on it is released and an open menu over it is closed.
	pub fn forget(&mut self, node: &NodeId) -> Vec<Intent> {
		let mut intents = Vec::new();
		let s = &mut self.state;
		if s.selected.as_ref() == Some(node) {
			s.selected = None;
		}
		if s.hovered.as_ref() == Some(node) {
			s.hovered = None;
		}
		if let Some(drag) = s.drag.take_if(|d| &d.node == node) {
			if drag.moved {
				intents.push(Intent::EndDrag(drag.node));
			}
		}
		if s.context_menu.take_if(|m| &m.node == node).is_some() {
			intents.push(Intent::CloseMenu);
		}
		intents
	}

	/// Pressing on a node arms a drag; pressing on empty space starts a pan.
	/// Any press while the menu is open only closes it.
	pub fn pointer_down(
		&mut self,
		button: PointerButton,
		screen: Point,
		graph: Point,
		hit: Option<Hit>,
	) -> Vec<Intent> {
		if self.state.context_menu.take().is_some() {
			return vec![Intent::CloseMenu];
		}
		if button != PointerButton::Primary {
			return Vec::new();
		}
		match hit {
			Some(hit) => {
				self.state.drag = Some(DragTarget {
					offset: Point::new(hit.center.x - graph.x, hit.center.y - graph.y),
					node: hit.node,
					press: screen,
					moved: false,
				});
				Vec::new()
			}
			None => {
				self.panning = true;
				vec![Intent::BeginPan(screen)]
			}
		}
	}

	/// `graph` is `screen` mapped through the current view transform.
	pub fn pointer_move(&mut self, screen: Point, graph: Point, hit: Option<Hit>) -> Vec<Intent> {
		if let Some(drag) = self.state.drag.as_mut() {
			let mut intents = Vec::new();
			if !drag.moved {
				if screen.distance(drag.press) < self.drag_threshold {
					return intents;
				}
				drag.moved = true;
				intents.push(Intent::BeginDrag(drag.node.clone()));
			}
			let target = Point::new(graph.x + drag.offset.x, graph.y + drag.offset.y);
			intents.push(Intent::MoveNode(drag.node.clone(), target));
			return intents;
		}
		if self.panning {
			return vec![Intent::PanTo(screen)];
		}
		let hovered = hit.map(|h| h.node);
		if hovered == self.state.hovered {
			return Vec::new();
		}
		self.state.hovered = hovered.clone();
		vec![Intent::HoverChanged(hovered)]
	}

	/// A press released without travelling past the drag threshold is a click.
	pub fn pointer_up(&mut self) -> Vec<Intent> {
		let mut intents = Vec::new();
		if let Some(drag) = self.state.drag.take() {
			if drag.moved {
				intents.push(Intent::EndDrag(drag.node));
			} else {
				self.state.selected = Some(drag.node.clone());
				intents.push(Intent::Select(drag.node));
			}
		}
		if std::mem::take(&mut self.panning) {
			intents.push(Intent::EndPan);
		}
		intents
	}

	/// The pointer left the canvas; an unmoved press is dropped.
	pub fn pointer_leave(&mut self) -> Vec<Intent> {
		let mut intents = self.cancel_press();
		if self.state.hovered.take().is_some() {
			intents.push(Intent::HoverChanged(None));
		}
		intents
	}

	/// Double click navigates to the node hit, if any.
	pub fn double_click(&mut self, hit: Option<Hit>) -> Vec<Intent> {
		match hit {
			Some(hit) => vec![Intent::Navigate(hit.node)],
			None => Vec::new(),
		}
	}

	/// Right-click or long-press. Opens the menu over a node from any state.
	pub fn context_menu_at(&mut self, screen: Point, hit: Option<Hit>) -> Vec<Intent> {
		let mut intents = self.cancel_press();
		match hit {
			Some(hit) => {
				let menu = ContextMenu {
					node: hit.node,
					at: screen,
				};
				self.state.context_menu = Some(menu.clone());
				intents.push(Intent::OpenMenu(menu));
			}
			None => {
				if self.state.context_menu.take().is_some() {
					intents.push(Intent::CloseMenu);
				}
			}
		}
		intents
	}

	/// Run a menu entry against the menu's node and close the menu.
	pub fn choose_action(&mut self, action: ContextMenuAction) -> Vec<Intent> {
		match self.state.context_menu.take() {
			Some(menu) => vec![Intent::MenuAction(action, menu.node), Intent::CloseMenu],
			None => Vec::new(),
		}
	}

	/// Close the menu if open.
	pub fn dismiss_menu(&mut self) -> Vec<Intent> {
		match self.state.context_menu.take() {
			Some(_) => vec![Intent::CloseMenu],
			None => Vec::new(),
		}
	}

	/// Keyboard shortcuts are ignored while a text input has focus.
	pub fn key_down(&mut self, key: &str, text_input_focused: bool) -> Vec<Intent> {
		if text_input_focused {
			return Vec::new();
		}
		match KeyCommand::from_key(key) {
			Some(KeyCommand::Escape) => {
				let mut intents = vec![Intent::Key(KeyCommand::Escape)];
				if self.state.selected.take().is_some() {
					intents.push(Intent::ClearSelection);
				}
				if self.state.context_menu.take().is_some() {
					intents.push(Intent::CloseMenu);
				}
				intents
			}
			Some(command) => vec![Intent::Key(command)],
			None => Vec::new(),
		}
	}

	fn cancel_press(&mut self) -> Vec<Intent> {
		let mut intents = Vec::new();
		if let Some(drag) = self.state.drag.take() {
			if drag.moved {
				intents.push(Intent::EndDrag(drag.node));
			}
		}
		if std::mem::take(&mut self.panning) {
			intents.push(Intent::EndPan);
		}
		intents
	}
}
