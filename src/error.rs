//! Error types for u-heurnet.

use thiserror::Error;

/// Errors raised while building or running a scoring network.
///
/// Every variant is a programmer or data error. Nothing here is retried;
/// the caller receives the failure synchronously.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// A tensor's width or length disagrees with the configured shape.
    #[error("shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// An edge endpoint lies outside `[0, num_nodes)`.
    #[error("edge {edge} references node {index}, but the graph has {num_nodes} nodes")]
    IndexOutOfRange {
        edge: usize,
        index: usize,
        num_nodes: usize,
    },

    /// Two edges share the same `(source, target)` pair.
    #[error("duplicate edge ({from}, {to})")]
    DuplicateEdge { from: usize, to: usize },

    /// Unrecognized embedding variant name.
    #[error("unknown embedding variant: {0}")]
    UnknownVariant(String),

    /// Unrecognized activation function name.
    #[error("unknown activation: {0}")]
    UnknownActivation(String),

    /// Unrecognized aggregation function name.
    #[error("unknown aggregation: {0}")]
    UnknownAggregation(String),

    /// The partition estimate was requested but the head was not built.
    #[error("partition-estimate head not configured")]
    MissingPartitionHead,

    /// The operation needs at least one edge.
    #[error("graph has no edges")]
    EmptyGraph,

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
