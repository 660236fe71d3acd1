use thiserror::Error;

use super::types::{EdgeId, NodeId};

/// A graph mutation was rejected; the previous graph is kept unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIntegrityError {
	/// An edge endpoint names no node.
	#[error("edge {from} -> {to} references missing node {missing}")]
	DanglingEdge {
		/// Source of the rejected edge.
		from: NodeId,
		/// Target of the rejected edge.
		to: NodeId,
		/// The endpoint that does not exist.
		missing: NodeId,
	},
	/// A node with this id is already present.
	#[error("node {0} already exists")]
	DuplicateNode(NodeId),
	/// The id belonged to a node removed since the last full load.
	#[error("node id {0} was removed earlier in this session and cannot be reused")]
	RetiredNodeId(NodeId),
	/// No node has this id.
	#[error("unknown node {0}")]
	UnknownNode(NodeId),
	/// No edge has this handle.
	#[error("unknown edge {0:?}")]
	UnknownEdge(EdgeId),
}

/// Input a layout cannot place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutInputError {
	/// Nothing to position.
	#[error("layout requested for a graph with no nodes")]
	EmptyGraph,
}

/// Failure reported by an external graph/mastery/path source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
	/// The source could not be reached or has nothing under that id.
	#[error("source unavailable: {0}")]
	Unavailable(String),
	/// The source answered with data that could not be decoded.
	#[error("malformed response: {0}")]
	Malformed(String),
}
