use log::trace;

use super::events::{EventBus, Subscription};
use super::types::{Point, ViewportSize};

/// Zoom is clamped to `[MIN_ZOOM, MAX_ZOOM]`.
pub const MIN_ZOOM: f64 = 0.1;
/// See [`MIN_ZOOM`].
pub const MAX_ZOOM: f64 = 3.0;
/// Factor of one zoom-in or zoom-out step.
pub const ZOOM_STEP: f64 = 1.2;
/// Per-notch factor for wheel zoom.
pub const WHEEL_STEP: f64 = 1.1;

/// `screen = graph * zoom + pan`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Scale factor.
	pub zoom: f64,
	/// Screen offset of the graph origin.
	pub pan: Point,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			zoom: 1.0,
			pan: Point::default(),
		}
	}
}

impl ViewTransform {
	/// Forward transform.
	pub fn graph_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
	}

	/// Inverse transform.
	pub fn screen_to_graph(&self, p: Point) -> Point {
		Point::new((p.x - self.pan.x) / self.zoom, (p.y - self.pan.y) / self.zoom)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PanAnchor {
	pointer: Point,
	pan: Point,
}

/// Owns zoom and pan. Every change is pushed to subscribers before the
/// mutating call returns.
#[derive(Debug)]
pub struct Viewport {
	transform: ViewTransform,
	size: ViewportSize,
	pan_extent: f64,
	pan_anchor: Option<PanAnchor>,
	observers: EventBus<ViewTransform>,
}

impl Viewport {
	/// Identity transform over a `size` drawing area.
	pub fn new(size: ViewportSize, pan_extent: f64) -> Self {
		Self {
			transform: ViewTransform::default(),
			size,
			pan_extent: pan_extent.abs(),
			pan_anchor: None,
			observers: EventBus::default(),
		}
	}

	/// Current transform.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Current zoom.
	pub fn zoom(&self) -> f64 {
		self.transform.zoom
	}

	/// Current pan.
	pub fn pan(&self) -> Point {
		self.transform.pan
	}

	/// Drawing area size.
	pub fn size(&self) -> ViewportSize {
		self.size
	}

	/// Record a new drawing area size. The transform is kept.
	pub fn resize(&mut self, size: ViewportSize) {
		self.size = size;
	}

	/// Observe every transform change.
	pub fn subscribe(&mut self, listener: impl FnMut(&ViewTransform) + 'static) -> Subscription {
		self.observers.subscribe(listener)
	}

	/// Drop an observer. Returns whether it was registered.
	pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
		self.observers.unsubscribe(subscription)
	}

	/// Screen point to graph space.
	pub fn screen_to_graph(&self, p: Point) -> Point {
		self.transform.screen_to_graph(p)
	}

	/// Graph point to screen space.
	pub fn graph_to_screen(&self, p: Point) -> Point {
		self.transform.graph_to_screen(p)
	}

	/// Apply zoom and pan together, clamped, and notify once.
	/// Returns whether the transform changed.
	pub fn set_transform(&mut self, zoom: f64, pan: Point) -> bool {
		if !zoom.is_finite() || !pan.x.is_finite() || !pan.y.is_finite() {
			trace!("ignored non-finite view transform");
			return false;
		}
		let next = ViewTransform {
			zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
			pan: Point::new(
				pan.x.clamp(-self.pan_extent, self.pan_extent),
				pan.y.clamp(-self.pan_extent, self.pan_extent),
			),
		};
		if next == self.transform {
			return false;
		}
		self.transform = next;
		self.observers.emit(&next);
		true
	}

	/// Zoom in one step about the origin.
	pub fn zoom_in(&mut self) -> bool {
		self.set_transform(self.transform.zoom * ZOOM_STEP, self.transform.pan)
	}

	/// Zoom out one step about the origin.
	pub fn zoom_out(&mut self) -> bool {
		self.set_transform(self.transform.zoom / ZOOM_STEP, self.transform.pan)
	}

	/// Back to zoom 1 and no pan.
	pub fn reset_view(&mut self) -> bool {
		self.pan_anchor = None;
		self.set_transform(1.0, Point::default())
	}

	/// Zoom by `factor` keeping the graph point under `screen` fixed.
	pub fn zoom_at(&mut self, screen: Point, factor: f64) -> bool {
		let t = self.transform;
		let new_zoom = (t.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_zoom / t.zoom;
		let pan = Point::new(
			screen.x - (screen.x - t.pan.x) * ratio,
			screen.y - (screen.y - t.pan.y) * ratio,
		);
		self.set_transform(new_zoom, pan)
	}

	/// Wheel input: positive `delta_y` zooms out.
	pub fn wheel(&mut self, screen: Point, delta_y: f64) -> bool {
		let factor = if delta_y > 0.0 {
			1.0 / WHEEL_STEP
		} else {
			WHEEL_STEP
		};
		self.zoom_at(screen, factor)
	}

	/// Shift by a screen-space offset.
	pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
		let pan = self.transform.pan;
		self.set_transform(self.transform.zoom, Point::new(pan.x + dx, pan.y + dy))
	}

	/// Move the view so `graph` sits at the viewport center.
	pub fn center_on(&mut self, graph: Point) -> bool {
		let c = self.size.center();
		let zoom = self.transform.zoom;
		self.set_transform(zoom, Point::new(c.x - graph.x * zoom, c.y - graph.y * zoom))
	}

	/// Anchor a drag-to-pan at `pointer`.
	pub fn begin_pan(&mut self, pointer: Point) {
		self.pan_anchor = Some(PanAnchor {
			pointer,
			pan: self.transform.pan,
		});
	}

	/// Follow the pointer from the anchor. No-op without one.
	pub fn pan_to(&mut self, pointer: Point) -> bool {
		let Some(anchor) = self.pan_anchor else {
			return false;
		};
		self.set_transform(
			self.transform.zoom,
			Point::new(
				anchor.pan.x + (pointer.x - anchor.pointer.x),
				anchor.pan.y + (pointer.y - anchor.pointer.y),
			),
		)
	}

	/// Drop the pan anchor.
	pub fn end_pan(&mut self) {
		self.pan_anchor = None;
	}

	/// A drag-to-pan is in progress.
	pub fn is_panning(&self) -> bool {
		self.pan_anchor.is_some()
	}
}
