//! # wfsa-fbweight: forward-backward scores for weighted FSAs
//!
//! Computes, for every state of a topologically-numbered weighted finite-state
//! acceptor, a **forward score** (combined weight of all paths from the start
//! state) and a **backward score** (combined weight of all paths to a final
//! state) under a pluggable semiring. Downstream consumers derive arc and
//! state posteriors, best-path scores and pruning thresholds from these.
//!
//! ## Architecture
//!
//! ```text
//!   Fsa (states 0..N, arcs src<dst, finals)     arc weights [f32|f64; num_arcs]
//!        │                                             │
//!        └──────────────────────┬──────────────────────┘
//!                               ▼
//!               fb_weights::compute(…, FbWeightType)
//!                               │
//!              ┌────────────────┴────────────────┐
//!              ▼                                 ▼
//!   forward_backward::forward_pass   forward_backward::backward_pass
//!     (increasing state order,         (decreasing state order,
//!      pull over incoming arcs)          pull over outgoing arcs)
//!              │                                 │
//!              └──────────── Semiring ───────────┘
//!                   MaxWeight | LogSumWeight
//! ```
//!
//! ## Example
//!
//! ```
//! use wfsa_fbweight::{compute, Arc, FbWeightType, Fsa};
//!
//! let fsa = Fsa::new(3, vec![Arc::new(0, 1, 7), Arc::new(0, 2, 8), Arc::new(1, 2, -1)], [2])?;
//! let scores = compute(&fsa, &[1.0f32, 0.5, 2.0], FbWeightType::MaxWeight)?;
//! assert_eq!(scores.forward, vec![0.0, 1.0, 3.0]);
//! assert_eq!(scores.backward, vec![3.0, 2.0, 0.0]);
//! # Ok::<(), wfsa_fbweight::FbError>(())
//! ```

pub mod config;
pub mod error;
pub mod fb_weights;
pub mod forward_backward;
pub mod fsa;
pub mod semiring;

#[cfg(test)]
mod tests;

pub use config::FbConfig;
pub use error::{FbError, FbResult};
pub use fb_weights::{
    compute, compute_into, compute_with_config, FbWeightType, FbWeights, WfsaWithFbWeights,
};
pub use forward_backward::{
    arc_scores, backward_scores, backward_scores_into, forward_scores, forward_scores_into,
    state_arc_summaries, total_weight, ArcSummary, ArcWeight,
};
pub use fsa::{Arc, Fsa, FsaBuilder, StateId, FINAL_LABEL};
pub use semiring::{LogSumWeight, MaxWeight, Semiring};
