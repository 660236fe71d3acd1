use leptos::prelude::*;
use leptos::task::spawn_local;
use log::info;

use crate::components::knowledge_graph::canvas::ExportFormat;
use crate::components::knowledge_graph::{
	ContextMenuAction, FilterCriteria, GraphData, GraphEdge, GraphEvent, GraphNode, GraphSource,
	HighlightedPath, KnowledgeGraphCanvas, LayoutStrategy, LearningPath, LoadState, LoadedGraph,
	MasteryMap, PathStep, SourceError, StaticGraphSource,
};

const CONCEPT: &str = "calculus";
const USER: &str = "demo-user";

/// Small calculus curriculum with a couple of off-subject nodes.
fn sample_graph() -> GraphData {
	let node = |id: &str, label: &str, subject: &str, importance: f64| {
		GraphNode::new(id, label)
			.with_subject(subject)
			.with_importance(importance)
	};
	let mut nodes = vec![
		node("numbers", "Real Numbers", "math", 1.5),
		node("algebra", "Algebra", "math", 2.0),
		node("functions", "Functions", "math", 2.5),
		node("trig", "Trigonometry", "math", 1.5),
		node("limits", "Limits", "math", 2.5),
		node("continuity", "Continuity", "math", 1.5),
		node("derivatives", "Derivatives", "math", 3.0),
		node("chain", "Chain Rule", "math", 1.5),
		node("integrals", "Integrals", "math", 3.0),
		node("ftc", "Fundamental Theorem", "math", 2.0),
		node("kinematics", "Kinematics", "physics", 2.0),
		node("rates", "Reaction Rates", "chemistry", 1.5),
	];
	for prerequisite in ["numbers", "algebra"] {
		if let Some(n) = nodes.iter_mut().find(|n| n.id.as_str() == prerequisite) {
			n.is_prerequisite = true;
		}
	}
	let edge = |s: &str, t: &str, strength: f64| GraphEdge::new(s, t).with_strength(strength);
	GraphData {
		nodes,
		edges: vec![
			edge("numbers", "algebra", 0.8),
			edge("algebra", "functions", 0.9),
			edge("functions", "trig", 0.4),
			edge("functions", "limits", 0.8),
			edge("limits", "continuity", 0.6),
			edge("limits", "derivatives", 0.9),
			edge("trig", "derivatives", 0.3),
			edge("derivatives", "chain", 0.7),
			edge("derivatives", "integrals", 0.8),
			edge("integrals", "ftc", 0.9),
			edge("derivatives", "kinematics", 0.5),
			edge("derivatives", "rates", 0.3),
		],
	}
}

fn sample_source() -> StaticGraphSource {
	let mastery = MasteryMap::from([
		("numbers".into(), 100.0),
		("algebra".into(), 100.0),
		("functions".into(), 85.0),
		("trig".into(), 60.0),
		("limits".into(), 35.0),
		("continuity".into(), 10.0),
	]);
	let step = |s: &str, t: &str| PathStep {
		source: s.into(),
		target: t.into(),
	};
	StaticGraphSource::new()
		.with_graph(CONCEPT, sample_graph())
		.with_mastery(USER, mastery)
		.with_path(
			USER,
			CONCEPT,
			LearningPath {
				path: vec![
					step("functions", "limits"),
					step("limits", "derivatives"),
					step("derivatives", "integrals"),
					step("integrals", "ftc"),
				],
				estimated_time: 240.0,
			},
		)
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let source = sample_source();
	let (data, set_data) = signal(None::<Result<LoadedGraph, SourceError>>);
	let (strategy, set_strategy) = signal(LayoutStrategy::Force);
	let (filter, set_filter) = signal(FilterCriteria::default());
	let (search, set_search) = signal(String::new());
	let (path, set_path) = signal(HighlightedPath::default());
	let (export, set_export) = signal(None::<ExportFormat>);
	let (export_url, set_export_url) = signal(None::<String>);
	let (status, set_status) = signal(String::new());
	let search_input = NodeRef::<leptos::html::Input>::new();

	let loader = source.clone();
	spawn_local(async move {
		let result = loader.fetch_concept(CONCEPT, USER).await;
		set_data.set(Some(result));
	});

	let on_event = Callback::new(move |event: GraphEvent| match event {
		GraphEvent::LoadStateChanged { state, nodes } => set_status.set(match state {
			LoadState::Loaded => format!("{nodes} concepts loaded"),
			other => other.notice(nodes).unwrap_or_default(),
		}),
		GraphEvent::NodeSelected(id) => set_status.set(format!("Selected {id}")),
		GraphEvent::NodeNavigated(id) => set_status.set(format!("Opening {id}")),
		GraphEvent::ContextMenuAction {
			action: ContextMenuAction::Path,
			node,
		} => {
			let source = source.clone();
			spawn_local(async move {
				match source.fetch_learning_path(USER, CONCEPT).await {
					Ok(learning_path) => {
						set_status.set(format!(
							"Learning path to {node}: about {} minutes",
							learning_path.estimated_time
						));
						set_path.set(learning_path.into());
					}
					Err(err) => set_status.set(err.to_string()),
				}
			});
		}
		GraphEvent::ContextMenuAction { action, node } => {
			info!("{} requested for {node}", action.key());
			set_status.set(format!("{}: {node}", action.label()));
		}
		GraphEvent::SearchSubmitted(query) => info!("search submitted: {query}"),
		_ => {}
	});

	let on_export = Callback::new(move |url: String| set_export_url.set(Some(url)));

	let toggle = move |band: fn(&mut FilterCriteria) -> &mut bool| {
		move |_: leptos::ev::Event| {
			set_filter.update(|f| {
				let flag = band(f);
				*flag = !*flag;
			})
		}
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<KnowledgeGraphCanvas
					data=data
					strategy=strategy
					filter=filter
					search=search
					path=path
					export=export
					on_event=on_event
					on_export=on_export
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Knowledge Graph"</h1>
					<p class="subtitle">
						"Drag nodes to reposition. Scroll to zoom. Drag background to pan. Right-click a concept for actions."
					</p>
					<div class="graph-controls">
						{LayoutStrategy::ALL
							.into_iter()
							.map(|s| {
								view! {
									<button
										class:active=move || strategy.get() == s
										on:click=move |_| set_strategy.set(s)
									>
										{s.label()}
									</button>
								}
							})
							.collect_view()}
					</div>
					<form on:submit=move |ev| {
						ev.prevent_default();
						if let Some(input) = search_input.get() {
							set_search.set(input.value());
						}
					}>
						<input node_ref=search_input type="search" placeholder="Search concepts" />
					</form>
					<select on:change=move |ev| {
						let value = event_target_value(&ev);
						set_filter.update(|f| f.subject = (!value.is_empty()).then_some(value));
					}>
						<option value="">"All subjects"</option>
						<option value="math">"Math"</option>
						<option value="physics">"Physics"</option>
						<option value="chemistry">"Chemistry"</option>
					</select>
					<label>
						<input type="checkbox" checked=true on:change=toggle(|f| &mut f.show_not_started) />
						"Not started"
					</label>
					<label>
						<input type="checkbox" checked=true on:change=toggle(|f| &mut f.show_in_progress) />
						"In progress"
					</label>
					<label>
						<input type="checkbox" checked=true on:change=toggle(|f| &mut f.show_completed) />
						"Completed"
					</label>
					<div class="graph-export">
						<button on:click=move |_| set_export.set(Some(ExportFormat::Png))>"PNG"</button>
						<button on:click=move |_| set_export.set(Some(ExportFormat::Svg))>"SVG"</button>
						{move || {
							export_url
								.get()
								.map(|url| view! { <a href=url download="knowledge-graph">"Download"</a> })
						}}
					</div>
					<p class="status">{move || status.get()}</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
