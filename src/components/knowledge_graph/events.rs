use super::engine::LoadState;
use super::filter::FilterCriteria;
use super::types::{NodeId, Point};
use super::viewport::ViewTransform;

/// Entries of the node context menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextMenuAction {
	/// Open the concept's learning material.
	Learn,
	/// Start a quiz on the concept.
	Quiz,
	/// Save the concept for later.
	Bookmark,
	/// Show the learning path through the concept.
	Path,
}

impl ContextMenuAction {
	/// Every action, in menu order.
	pub const ALL: [Self; 4] = [Self::Learn, Self::Quiz, Self::Bookmark, Self::Path];

	/// Stable lowercase name.
	pub fn key(self) -> &'static str {
		match self {
			Self::Learn => "learn",
			Self::Quiz => "quiz",
			Self::Bookmark => "bookmark",
			Self::Path => "path",
		}
	}

	/// Menu text.
	pub fn label(self) -> &'static str {
		match self {
			Self::Learn => "Learn this concept",
			Self::Quiz => "Take a quiz",
			Self::Bookmark => "Bookmark",
			Self::Path => "Show learning path",
		}
	}
}

/// Discrete notifications delivered to collaborators outside the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	/// Single click on a node.
	NodeSelected(NodeId),
	/// Double click on a node.
	NodeNavigated(NodeId),
	/// Right click or long press on a node.
	ContextMenuOpened {
		/// Node the menu belongs to.
		node: NodeId,
		/// Screen position of the triggering event.
		at: Point,
	},
	/// The menu went away, chosen or dismissed.
	ContextMenuClosed,
	/// A menu entry was chosen.
	ContextMenuAction {
		/// The entry.
		action: ContextMenuAction,
		/// Node the menu was opened on.
		node: NodeId,
	},
	/// A search query was submitted, matched or not.
	SearchSubmitted(String),
	/// New filter criteria are in effect.
	FilterChanged(FilterCriteria),
	/// Zoom or pan changed.
	ViewChanged(ViewTransform),
	/// `nodes` is the node count once loaded, so an empty graph can be told
	/// apart from a failed or pending fetch.
	LoadStateChanged {
		/// The new state.
		state: LoadState,
		/// Nodes in the graph now held.
		nodes: usize,
	},
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Synchronous observer list: `emit` calls every listener before returning.
pub struct EventBus<E> {
	listeners: Vec<(Subscription, Box<dyn FnMut(&E)>)>,
	next_id: u64,
}

impl<E> Default for EventBus<E> {
	fn default() -> Self {
		Self {
			listeners: Vec::new(),
			next_id: 0,
		}
	}
}

impl<E> EventBus<E> {
	/// Register `listener`; it runs on every later [`emit`](Self::emit).
	pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> Subscription {
		let id = Subscription(self.next_id);
		self.next_id += 1;
		self.listeners.push((id, Box::new(listener)));
		id
	}

	/// Returns whether the subscription was live.
	pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(id, _)| *id != subscription);
		before != self.listeners.len()
	}

	/// Call every listener in registration order.
	pub fn emit(&mut self, event: &E) {
		for (_, listener) in self.listeners.iter_mut() {
			listener(event);
		}
	}

	/// Number of listeners.
	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	/// No listeners registered.
	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}
}

impl<E> std::fmt::Debug for EventBus<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus")
			.field("listeners", &self.listeners.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	#[test]
	fn listeners_receive_events_until_unsubscribed() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let mut bus = EventBus::<GraphEvent>::default();
		let sink = seen.clone();
		let sub = bus.subscribe(move |e| sink.borrow_mut().push(e.clone()));

		bus.emit(&GraphEvent::NodeSelected("a".into()));
		assert!(bus.unsubscribe(sub));
		bus.emit(&GraphEvent::NodeSelected("b".into()));

		assert_eq!(*seen.borrow(), vec![GraphEvent::NodeSelected("a".into())]);
		assert!(bus.is_empty());
	}
}
