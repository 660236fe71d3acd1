//! Interactive knowledge-graph engine and its canvas component.
//!
//! Everything except [`KnowledgeGraphCanvas`] and the canvas surface is plain
//! Rust without DOM access.

/// 2D canvas drawing surface and PNG snapshots.
pub mod canvas;
mod component;
/// Engine tuning, deserialisable with defaults.
pub mod config;
/// The [`KnowledgeGraph`] facade.
pub mod engine;
/// Error types.
pub mod error;
/// Collaborator notifications and the observer list that delivers them.
pub mod events;
/// Visibility filtering and label search.
pub mod filter;
/// Pointer and keyboard state machine.
pub mod interaction;
/// Layout strategies and the caller-owned layout session.
pub mod layout;
/// Arena-backed graph model.
pub mod model;
/// Drawing the engine state onto a [`render::Surface`].
pub mod render;
/// Contracts for fetching graphs, mastery and learning paths.
pub mod source;
/// Visual encodings: radius, colours, opacity.
pub mod style;
/// Touch gesture tracking.
pub mod touch;
/// Wire and value types shared by every module.
pub mod types;
/// Zoom and pan.
pub mod viewport;

pub use component::KnowledgeGraphCanvas;
pub use config::{EngineConfig, ForceParams};
pub use engine::{KnowledgeGraph, LoadState};
pub use error::{GraphIntegrityError, LayoutInputError, SourceError};
pub use events::{ContextMenuAction, GraphEvent};
pub use filter::FilterCriteria;
pub use layout::LayoutStrategy;
pub use source::{GraphSource, StaticGraphSource};
pub use style::NodeSize;
pub use types::{
	GraphData, GraphEdge, GraphNode, HighlightedPath, LearningPath, LoadedGraph, MasteryMap,
	NodeId, PathStep, Point, ViewportSize,
};
