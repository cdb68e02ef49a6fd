//! Error taxonomy for forward-backward computation.

use thiserror::Error;

use crate::fsa::StateId;

/// Result type for forward-backward operations.
pub type FbResult<T> = Result<T, FbError>;

/// Errors and diagnostics raised while validating inputs or computing scores.
///
/// Every variant except [`FbError::NoFinalState`] is fatal and is detected
/// before any output buffer is written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FbError {
    /// The automaton has no states at all.
    #[error("automaton has no states")]
    EmptyAutomaton,

    /// An arc does not go from a lower to a strictly higher state index.
    #[error("arc {arc} ({src} -> {dst}) violates topological numbering (src must be < dst)")]
    InvalidTopology { arc: usize, src: StateId, dst: StateId },

    /// The state count exceeds what a [`StateId`] can address.
    #[error("automaton has {num_states} states, but the largest state id is {}", StateId::MAX)]
    TooManyStates { num_states: usize },

    /// An arc weight is NaN or `+inf`. Weights must be finite or `-inf`.
    #[error("arc {arc} has weight {value}; weights must be finite or -inf")]
    InvalidWeight { arc: usize, value: f64 },

    /// A final weight is NaN or `+inf`.
    #[error("final state {state} has weight {value}; weights must be finite or -inf")]
    InvalidFinalWeight { state: StateId, value: f64 },

    /// An arc endpoint or final state lies outside `0..num_states`.
    #[error("{context} refers to state {state}, but the automaton has {num_states} states")]
    StateOutOfRange {
        context: String,
        state: StateId,
        num_states: usize,
    },

    /// A caller-supplied array has the wrong length.
    #[error("{what} has length {actual}, expected {expected}")]
    MismatchedSize {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The automaton has no final state; backward scores are all `zero`.
    #[error("automaton has no final state; all backward scores are -inf")]
    NoFinalState,

    /// A semiring name could not be parsed.
    #[error("unknown weight type '{0}' (expected 'max' or 'logsum')")]
    UnknownWeightType(String),
}

impl FbError {
    /// Whether the error aborts computation. Non-fatal variants are reported
    /// as diagnostics alongside a well-defined result.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FbError::NoFinalState)
    }
}
