use std::collections::HashMap;
use std::future::Future;

use log::debug;

use super::error::SourceError;
use super::types::{GraphData, LearningPath, LoadedGraph, MasteryMap};

/// Producer of graph data, per-user mastery and learning paths.
///
/// The engine treats the results as opaque data; fetching, caching and
/// authentication belong to the implementor.
pub trait GraphSource {
	/// Nodes and edges around one concept.
	fn fetch_graph(&self, concept_id: &str) -> impl Future<Output = Result<GraphData, SourceError>>;

	/// Mastery per concept for one user.
	fn fetch_mastery(&self, user_id: &str) -> impl Future<Output = Result<MasteryMap, SourceError>>;

	/// Recommended path to a concept for one user.
	fn fetch_learning_path(
		&self,
		user_id: &str,
		concept_id: &str,
	) -> impl Future<Output = Result<LearningPath, SourceError>>;

	/// Graph and mastery together, ready for `KnowledgeGraph::finish_load`.
	fn fetch_concept(
		&self,
		concept_id: &str,
		user_id: &str,
	) -> impl Future<Output = Result<LoadedGraph, SourceError>> {
		async move {
			let data = self.fetch_graph(concept_id).await?;
			let mastery = self.fetch_mastery(user_id).await?;
			Ok(LoadedGraph { data, mastery })
		}
	}
}

/// In-memory source, used by the demo page.
#[derive(Clone, Debug, Default)]
pub struct StaticGraphSource {
	graphs: HashMap<String, GraphData>,
	mastery: HashMap<String, MasteryMap>,
	paths: HashMap<(String, String), LearningPath>,
}

impl StaticGraphSource {
	/// Empty source: every fetch fails until data is added.
	pub fn new() -> Self {
		Self::default()
	}

	/// Serve `data` for `concept_id`.
	pub fn with_graph(mut self, concept_id: impl Into<String>, data: GraphData) -> Self {
		self.graphs.insert(concept_id.into(), data);
		self
	}

	/// Serve `mastery` for `user_id`.
	pub fn with_mastery(mut self, user_id: impl Into<String>, mastery: MasteryMap) -> Self {
		self.mastery.insert(user_id.into(), mastery);
		self
	}

	/// Serve `path` for the user and concept pair.
	pub fn with_path(
		mut self,
		user_id: impl Into<String>,
		concept_id: impl Into<String>,
		path: LearningPath,
	) -> Self {
		self.paths.insert((user_id.into(), concept_id.into()), path);
		self
	}
}

impl GraphSource for StaticGraphSource {
	async fn fetch_graph(&self, concept_id: &str) -> Result<GraphData, SourceError> {
		debug!("fetching graph for concept {concept_id}");
		self.graphs
			.get(concept_id)
			.cloned()
			.ok_or_else(|| SourceError::Unavailable(format!("no graph for concept {concept_id}")))
	}

	/// Users without recorded progress have empty mastery.
	async fn fetch_mastery(&self, user_id: &str) -> Result<MasteryMap, SourceError> {
		Ok(self.mastery.get(user_id).cloned().unwrap_or_default())
	}

	async fn fetch_learning_path(
		&self,
		user_id: &str,
		concept_id: &str,
	) -> Result<LearningPath, SourceError> {
		self.paths
			.get(&(user_id.to_owned(), concept_id.to_owned()))
			.cloned()
			.ok_or_else(|| {
				SourceError::Unavailable(format!("no learning path for {user_id} on {concept_id}"))
			})
	}
}
