use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent, TouchList,
	WheelEvent, Window,
};

use super::canvas::{CanvasSurface, ExportFormat, snapshot_png};
use super::config::EngineConfig;
use super::engine::{KnowledgeGraph, LoadState};
use super::error::SourceError;
use super::events::{ContextMenuAction, GraphEvent};
use super::filter::FilterCriteria;
use super::interaction::PointerButton;
use super::layout::LayoutStrategy;
use super::types::{HighlightedPath, LoadedGraph, NodeId, Point, ViewportSize};

const FRAME_DT: f64 = 0.016;

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn touch_points(canvas: &HtmlCanvasElement, touches: &TouchList) -> Vec<Point> {
	let rect = canvas.get_bounding_client_rect();
	(0..touches.length())
		.filter_map(|i| touches.get(i))
		.map(|t| {
			Point::new(
				t.client_x() as f64 - rect.left(),
				t.client_y() as f64 - rect.top(),
			)
		})
		.collect()
}

fn window_size(window: &Window) -> Option<ViewportSize> {
	let w = window.inner_width().ok()?.as_f64()?;
	let h = window.inner_height().ok()?.as_f64()?;
	Some(ViewportSize::new(w, h))
}

/// Keyboard shortcuts must not fire while the user is typing.
fn text_input_focused() -> bool {
	let Some(active) = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.active_element())
	else {
		return false;
	};
	matches!(active.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
		|| active.get_attribute("contenteditable").is_some()
}

/// Canvas view of a knowledge graph.
///
/// `data` is `None` while the graph is being fetched. Collaborator
/// notifications are delivered through `on_event`.
#[component]
pub fn KnowledgeGraphCanvas(
	/// Graph to show; `None` while it is being fetched.
	#[prop(into)]
	data: Signal<Option<Result<LoadedGraph, SourceError>>>,
	/// Layout strategy.
	#[prop(into, optional)]
	strategy: Signal<LayoutStrategy>,
	/// Which nodes are shown.
	#[prop(into, optional)]
	filter: Signal<FilterCriteria>,
	/// Submitted search query. Every notification is a new submission, even
	/// with an unchanged query.
	#[prop(into, optional)]
	search: Signal<String>,
	/// Learning path to highlight.
	#[prop(into, optional)]
	path: Signal<HighlightedPath>,
	/// Set to request an image export.
	#[prop(into, optional)]
	export: Signal<Option<ExportFormat>>,
	/// Engine settings.
	#[prop(optional)]
	config: EngineConfig,
	/// Receives every [`GraphEvent`].
	#[prop(optional)]
	on_event: Option<Callback<GraphEvent>>,
	/// Receives a data URL for every export request.
	#[prop(optional)]
	on_export: Option<Callback<String>>,
	/// Fill the browser window and follow its size.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed width in CSS pixels.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed height in CSS pixels.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let menu = RwSignal::new(None::<(NodeId, Point)>);
	let action = RwSignal::new(None::<ContextMenuAction>);
	let load = RwSignal::new((LoadState::NoData, 0usize));

	let dirty = Rc::new(Cell::new(true));
	let engine = Rc::new(RefCell::new(KnowledgeGraph::new(
		config,
		ViewportSize::new(width.unwrap_or(800.0), height.unwrap_or(600.0)),
	)));
	{
		let mut kg = engine.borrow_mut();
		let flag = dirty.clone();
		kg.subscribe_redraw(move |_| flag.set(true));
		kg.subscribe(move |event| {
			match event {
				GraphEvent::ContextMenuOpened { node, at } => menu.set(Some((node.clone(), *at))),
				GraphEvent::ContextMenuClosed => menu.set(None),
				GraphEvent::LoadStateChanged { state, nodes } => load.set((state.clone(), *nodes)),
				_ => {}
			}
			if let Some(cb) = on_event {
				cb.run(event.clone());
			}
		});
	}

	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let keydown_cb: Rc<RefCell<Option<Closure<dyn FnMut(KeyboardEvent)>>>> =
		Rc::new(RefCell::new(None));

	let (engine_init, dirty_init) = (engine.clone(), dirty.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let size = if fullscreen {
			window_size(&window).unwrap_or(ViewportSize::new(800.0, 600.0))
		} else {
			let parent = canvas.parent_element();
			ViewportSize::new(
				width.unwrap_or_else(|| {
					parent
						.as_ref()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					parent
						.as_ref()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(size.width as u32);
		canvas.set_height(size.height as u32);
		engine_init.borrow_mut().resize(size);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("2d canvas context unavailable");
				return;
			}
		};

		if fullscreen {
			let (engine_resize, canvas_resize) = (engine_init.clone(), canvas.clone());
			*resize_cb.borrow_mut() = Some(Closure::new(move || {
				let Some(size) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(size.width as u32);
				canvas_resize.set_height(size.height as u32);
				engine_resize.borrow_mut().resize(size);
			}));
			if let Some(ref cb) = *resize_cb.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let engine_key = engine_init.clone();
		*keydown_cb.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
			engine_key.borrow_mut().key_down(&ev.key(), text_input_focused());
		}));
		if let Some(ref cb) = *keydown_cb.borrow() {
			let _ = window.add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
		}

		let (engine_anim, dirty_anim, animate_inner) =
			(engine_init.clone(), dirty_init.clone(), animate.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			{
				let mut kg = engine_anim.borrow_mut();
				kg.touch_hold(js_sys::Date::now());
				kg.tick(FRAME_DT);
				if dirty_anim.replace(false) {
					kg.draw(&mut CanvasSurface::new(&ctx));
				}
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(w) = web_sys::window() {
					let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
		debug!("knowledge graph canvas mounted at {}x{}", size.width, size.height);
	});

	let engine_data = engine.clone();
	Effect::new(move |_| match data.get() {
		None => engine_data.borrow_mut().begin_load(),
		Some(result) => {
			if let Err(err) = engine_data.borrow_mut().finish_load(result) {
				debug!("kept previous graph: {err}");
			}
		}
	});

	let engine_strategy = engine.clone();
	Effect::new(move |_| {
		engine_strategy.borrow_mut().apply_layout(strategy.get());
	});

	let engine_filter = engine.clone();
	Effect::new(move |_| {
		let mut criteria = filter.get();
		criteria.search_query = search.get_untracked();
		let mut kg = engine_filter.borrow_mut();
		if kg.filter() != &criteria {
			kg.set_filter(criteria);
		}
	});

	let engine_search = engine.clone();
	Effect::new(move |mounted: Option<()>| {
		let query = search.get();
		if mounted.is_some() {
			engine_search.borrow_mut().submit_search(&query);
		}
	});

	let engine_path = engine.clone();
	Effect::new(move |_| {
		engine_path.borrow_mut().set_highlighted_path(path.get());
	});

	let engine_action = engine.clone();
	Effect::new(move |_| {
		if let Some(chosen) = action.get() {
			engine_action.borrow_mut().choose_action(chosen);
		}
	});

	let engine_export = engine.clone();
	Effect::new(move |_| {
		let Some(format) = export.get() else {
			return;
		};
		let url = match format {
			ExportFormat::Svg => {
				let svg = engine_export.borrow().scene().to_svg();
				Ok(format!(
					"data:image/svg+xml;charset=utf-8,{}",
					String::from(js_sys::encode_uri_component(&svg))
				))
			}
			ExportFormat::Png => {
				let Some(canvas) = canvas_ref.get() else {
					return;
				};
				let canvas: HtmlCanvasElement = canvas.into();
				snapshot_png(&canvas)
			}
		};
		match url {
			Ok(url) => {
				if let Some(cb) = on_export {
					cb.run(url);
				}
			}
			Err(err) => warn!("export failed: {err:?}"),
		}
	});

	let engine_md = engine.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(button) = PointerButton::from_dom(ev.button()) else {
			return;
		};
		let p = local_point(&canvas, &ev);
		engine_md.borrow_mut().pointer_down(button, p);
	};

	let engine_mm = engine.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas, &ev);
		engine_mm.borrow_mut().pointer_move(p);
	};

	let engine_mu = engine.clone();
	let on_mouseup = move |_: MouseEvent| {
		engine_mu.borrow_mut().pointer_up();
	};

	let engine_ml = engine.clone();
	let on_mouseleave = move |_: MouseEvent| {
		engine_ml.borrow_mut().pointer_leave();
	};

	let engine_dc = engine.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas, &ev);
		engine_dc.borrow_mut().double_click(p);
	};

	let engine_cm = engine.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas, &ev);
		engine_cm.borrow_mut().context_menu(p);
	};

	let engine_ts = engine.clone();
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let touches = touch_points(&canvas, &ev.touches());
		engine_ts.borrow_mut().touch_start(&touches, js_sys::Date::now());
	};

	let engine_tm = engine.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let touches = touch_points(&canvas, &ev.touches());
		engine_tm.borrow_mut().touch_move(&touches);
	};

	let engine_te = engine.clone();
	let on_touchend = move |ev: TouchEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let remaining = touch_points(&canvas, &ev.touches());
		engine_te.borrow_mut().touch_end(&remaining);
	};

	let engine_tc = engine.clone();
	let on_touchcancel = move |_: TouchEvent| {
		engine_tc.borrow_mut().touch_cancel();
	};

	let engine_wh = engine;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas, &ev);
		engine_wh.borrow_mut().wheel(p, ev.delta_y());
	};

	view! {
		<div class="knowledge-graph" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="knowledge-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				on:contextmenu=on_contextmenu
				on:wheel=on_wheel
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				on:touchcancel=on_touchcancel
				style="display: block; cursor: grab; touch-action: none;"
			/>
			{move || {
				let (state, nodes) = load.get();
				state.notice(nodes)
					.map(|message| {
						view! {
							<p
								class="graph-load-state"
								style="position: absolute; top: 50%; width: 100%; text-align: center;"
							>
								{message}
							</p>
						}
					})
			}}
			{move || {
				menu.get()
					.map(|(_, at)| {
						view! {
							<ul
								class="graph-context-menu"
								style=format!("position: absolute; left: {}px; top: {}px;", at.x, at.y)
							>
								{ContextMenuAction::ALL
									.into_iter()
									.map(|a| {
										view! {
											<li>
												<button on:click=move |_| action.set(Some(a))>
													{a.label()}
												</button>
											</li>
										}
									})
									.collect_view()}
							</ul>
						}
					})
			}}
		</div>
	}
}
