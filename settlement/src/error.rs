//! Error types for the settlement core

use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
///
/// Configuration errors are raised before any solving starts. Invariant
/// violations abort the whole computation; no partial settlement list is
/// ever returned.
#[derive(Error, Debug)]
pub enum Error {
    /// Edge constructed with a negative capacity
    #[error("Negative capacity {capacity} on edge {from} -> {to}")]
    NegativeCapacity {
        /// Tail vertex
        from: usize,
        /// Head vertex
        to: usize,
        /// Rejected capacity
        capacity: i64,
    },

    /// Vertex index outside `0..vertex_count`
    #[error("Vertex {vertex} out of range for graph with {vertex_count} vertices")]
    VertexOutOfRange {
        /// Offending index
        vertex: usize,
        /// Vertices in the graph
        vertex_count: usize,
    },

    /// Label list does not match the vertex count
    #[error("Expected {expected} party labels, got {actual}")]
    LabelCountMismatch {
        /// Vertex count
        expected: usize,
        /// Labels supplied
        actual: usize,
    },

    /// The same party label appears twice
    #[error("Duplicate party: {0}")]
    DuplicateParty(String),

    /// A debt references a party missing from the party list
    #[error("Unknown party: {0}")]
    UnknownParty(String),

    /// Source and sink of a flow computation are the same vertex
    #[error("Source and sink must differ (both {0})")]
    SameTerminals(usize),

    /// Sum of amounts does not fit in minor currency units
    #[error("Amount overflow")]
    AmountOverflow,

    /// Internal invariant broken (flow conservation, pass limit, ...)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by invalid input or setup, raised before solving
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NegativeCapacity { .. }
                | Error::VertexOutOfRange { .. }
                | Error::LabelCountMismatch { .. }
                | Error::DuplicateParty(_)
                | Error::UnknownParty(_)
                | Error::SameTerminals(_)
                | Error::Config(_)
        )
    }

    /// True for fatal internal inconsistencies
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation(_) | Error::AmountOverflow)
    }
}
