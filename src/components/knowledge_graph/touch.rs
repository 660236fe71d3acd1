//! Touch gestures: one finger drives the pointer, holding it opens the
//! context menu, two fingers pinch-zoom.

use super::types::Point;

/// What a touch sequence means for the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum TouchAction {
	/// Single finger down, like a primary pointer press.
	Press(Point),
	/// Single finger moved.
	Move(Point),
	/// Single finger lifted.
	Release,
	/// A press turned into a pinch; drop it without a click.
	Cancel,
	/// Finger held still long enough to open the context menu.
	LongPress(Point),
	/// Zoom by `factor` about `center`, both in screen space.
	Pinch {
		/// Midpoint of the two fingers.
		center: Point,
		/// Ratio of the new finger spread to the previous one.
		factor: f64,
	},
}

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
	#[default]
	Idle,
	Press {
		start: Point,
		since_ms: f64,
		travelled: bool,
		held: bool,
	},
	Pinch {
		spread: f64,
	},
	/// Fingers left over from a pinch, ignored until all are lifted.
	Settling,
}

/// Turns raw touch lists into [`TouchAction`]s. Timing comes from the
/// caller so the tracker stays DOM-free.
#[derive(Clone, Debug)]
pub struct TouchTracker {
	gesture: Gesture,
	long_press_ms: f64,
	slop: f64,
}

impl TouchTracker {
	/// `slop` is the travel (screen px) that rules out a long press.
	pub fn new(long_press_ms: f64, slop: f64) -> Self {
		Self {
			gesture: Gesture::Idle,
			long_press_ms,
			slop,
		}
	}

	/// `touches` are all fingers currently on the surface.
	pub fn start(&mut self, touches: &[Point], now_ms: f64) -> Vec<TouchAction> {
		match touches {
			[] => Vec::new(),
			[p] => {
				if self.gesture != Gesture::Idle {
					return Vec::new();
				}
				self.gesture = Gesture::Press {
					start: *p,
					since_ms: now_ms,
					travelled: false,
					held: false,
				};
				vec![TouchAction::Press(*p)]
			}
			[a, b, ..] => {
				let mut actions = Vec::new();
				if matches!(self.gesture, Gesture::Press { held: false, .. }) {
					actions.push(TouchAction::Cancel);
				}
				self.gesture = Gesture::Pinch {
					spread: a.distance(*b),
				};
				actions
			}
		}
	}

	/// `touches` are all fingers currently on the surface.
	pub fn moved(&mut self, touches: &[Point]) -> Vec<TouchAction> {
		let slop = self.slop;
		match (&mut self.gesture, touches) {
			(
				Gesture::Press {
					start,
					travelled,
					held,
					..
				},
				[p, ..],
			) => {
				if *held {
					return Vec::new();
				}
				if p.distance(*start) > slop {
					*travelled = true;
				}
				vec![TouchAction::Move(*p)]
			}
			(Gesture::Pinch { spread }, [a, b, ..]) => {
				let next = a.distance(*b);
				let previous = std::mem::replace(spread, next);
				if previous <= 0.0 || next <= 0.0 {
					return Vec::new();
				}
				vec![TouchAction::Pinch {
					center: Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
					factor: next / previous,
				}]
			}
			_ => Vec::new(),
		}
	}

	/// `remaining` are the fingers still down after the lift.
	pub fn end(&mut self, remaining: &[Point]) -> Vec<TouchAction> {
		match std::mem::take(&mut self.gesture) {
			Gesture::Press { held: false, .. } => vec![TouchAction::Release],
			Gesture::Press { held: true, .. } | Gesture::Idle => Vec::new(),
			Gesture::Pinch { .. } | Gesture::Settling => {
				if !remaining.is_empty() {
					self.gesture = Gesture::Settling;
				}
				Vec::new()
			}
		}
	}

	/// The browser took the touch away.
	pub fn cancel(&mut self) -> Vec<TouchAction> {
		match std::mem::take(&mut self.gesture) {
			Gesture::Press { held: false, .. } => vec![TouchAction::Cancel],
			_ => Vec::new(),
		}
	}

	/// Polled once per frame; fires at most one long press per touch.
	pub fn hold(&mut self, now_ms: f64) -> Option<TouchAction> {
		let Gesture::Press {
			start,
			since_ms,
			travelled: false,
			held,
		} = &mut self.gesture
		else {
			return None;
		};
		if *held || now_ms - *since_ms < self.long_press_ms {
			return None;
		}
		*held = true;
		Some(TouchAction::LongPress(*start))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tracker() -> TouchTracker {
		TouchTracker::new(500.0, 3.0)
	}

	#[test]
	fn tap_is_press_and_release() {
		let mut t = tracker();
		let p = Point::new(10.0, 10.0);
		assert_eq!(t.start(&[p], 0.0), vec![TouchAction::Press(p)]);
		assert_eq!(t.hold(100.0), None);
		assert_eq!(t.end(&[]), vec![TouchAction::Release]);
		assert_eq!(t.hold(1000.0), None);
	}

	#[test]
	fn holding_still_opens_the_menu_once() {
		let mut t = tracker();
		let p = Point::new(10.0, 10.0);
		t.start(&[p], 0.0);
		t.moved(&[Point::new(11.0, 11.0)]);
		assert_eq!(t.hold(499.0), None);
		assert_eq!(t.hold(500.0), Some(TouchAction::LongPress(p)));
		assert_eq!(t.hold(900.0), None);
		assert!(t.moved(&[Point::new(40.0, 40.0)]).is_empty());
		assert!(t.end(&[]).is_empty());
	}

	#[test]
	fn travel_rules_out_a_long_press() {
		let mut t = tracker();
		t.start(&[Point::new(10.0, 10.0)], 0.0);
		let far = Point::new(30.0, 10.0);
		assert_eq!(t.moved(&[far]), vec![TouchAction::Move(far)]);
		assert_eq!(t.hold(2000.0), None);
		assert_eq!(t.end(&[]), vec![TouchAction::Release]);
	}

	#[test]
	fn two_fingers_pinch_about_their_midpoint() {
		let mut t = tracker();
		let a = Point::new(100.0, 100.0);
		t.start(&[a], 0.0);
		assert_eq!(
			t.start(&[a, Point::new(200.0, 100.0)], 10.0),
			vec![TouchAction::Cancel]
		);
		assert_eq!(
			t.moved(&[Point::new(50.0, 100.0), Point::new(250.0, 100.0)]),
			vec![TouchAction::Pinch {
				center: Point::new(150.0, 100.0),
				factor: 2.0,
			}]
		);
		assert_eq!(t.hold(5000.0), None);

		// the finger left behind does not start a press
		assert!(t.end(&[a]).is_empty());
		assert!(t.start(&[a], 20.0).is_empty());
		assert!(t.moved(&[Point::new(120.0, 100.0)]).is_empty());
		assert!(t.end(&[]).is_empty());
		assert_eq!(t.start(&[a], 30.0), vec![TouchAction::Press(a)]);
	}

	#[test]
	fn browser_cancel_drops_the_press() {
		let mut t = tracker();
		t.start(&[Point::new(1.0, 1.0)], 0.0);
		assert_eq!(t.cancel(), vec![TouchAction::Cancel]);
		assert!(t.end(&[]).is_empty());
	}
}
