//! Forward-backward weights facade.
//!
//! Selects a semiring from an [`FbWeightType`], validates the inputs once,
//! and runs the forward and backward passes into caller-owned buffers.
//!
//! ## Architecture
//!
//! ```text
//!   (Fsa, arc weights, FbWeightType, FbConfig)
//!                     │
//!                     ▼
//!              validate_inputs        ← empty / size / topology, fatal
//!                     │
//!            no finals? warn          ← non-fatal diagnostic
//!                     │
//!          ┌──────────┴──────────┐
//!          ▼                     ▼    (rayon::join above the arc threshold)
//!     forward_pass          backward_pass
//!          │                     │
//!     forward buffer       backward buffer
//! ```
//!
//! The two passes read the same inputs and write disjoint buffers, so running
//! them concurrently needs no synchronisation.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::config::FbConfig;
use crate::error::{FbError, FbResult};
use crate::forward_backward::{
    arc_scores, backward_pass, check_buffer, forward_pass, total_weight, validate_inputs,
    ArcWeight,
};
use crate::fsa::Fsa;
use crate::semiring::{LogSumWeight, MaxWeight, Semiring};

// ══════════════════════════════════════════════════════════════════════════════
// FbWeightType
// ══════════════════════════════════════════════════════════════════════════════

/// Which semiring to score with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FbWeightType {
    /// Best-path scores ([`MaxWeight`]).
    MaxWeight,
    /// Total log-probability scores ([`LogSumWeight`]).
    LogSumWeight,
}

impl FbWeightType {
    pub const ALL: [FbWeightType; 2] = [FbWeightType::MaxWeight, FbWeightType::LogSumWeight];

    pub fn name(self) -> &'static str {
        match self {
            FbWeightType::MaxWeight => MaxWeight::NAME,
            FbWeightType::LogSumWeight => LogSumWeight::NAME,
        }
    }
}

impl fmt::Display for FbWeightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FbWeightType {
    type Err = FbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" | "maxweight" => Ok(FbWeightType::MaxWeight),
            "logsum" | "logsumweight" | "log" => Ok(FbWeightType::LogSumWeight),
            _ => Err(FbError::UnknownWeightType(s.to_string())),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// compute / compute_into
// ══════════════════════════════════════════════════════════════════════════════

/// Compute forward and backward scores into caller-owned buffers.
///
/// Both buffers must hold exactly `fsa.num_states()` values. On a fatal error
/// neither buffer is written. On success the returned vector holds non-fatal
/// diagnostics (currently only [`FbError::NoFinalState`]), each of which has
/// also been logged.
///
/// Buffers may be reused across calls with different weights for the same
/// topology; every element is overwritten.
pub fn compute_into<T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
    weight_type: FbWeightType,
    config: &FbConfig,
    forward: &mut [f64],
    backward: &mut [f64],
) -> FbResult<Vec<FbError>> {
    match weight_type {
        FbWeightType::MaxWeight => run::<MaxWeight, T>(fsa, weights, config, forward, backward),
        FbWeightType::LogSumWeight => {
            run::<LogSumWeight, T>(fsa, weights, config, forward, backward)
        },
    }
}

fn run<W: Semiring, T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
    config: &FbConfig,
    forward: &mut [f64],
    backward: &mut [f64],
) -> FbResult<Vec<FbError>> {
    validate_inputs(fsa, weights)?;
    check_buffer("forward buffer", forward.len(), fsa.num_states())?;
    check_buffer("backward buffer", backward.len(), fsa.num_states())?;

    let parallel = config.use_parallel(fsa.num_arcs());
    debug!(
        semiring = W::NAME,
        num_states = fsa.num_states(),
        num_arcs = fsa.num_arcs(),
        num_finals = fsa.finals().len(),
        parallel,
        "computing forward-backward scores"
    );

    let mut diagnostics = Vec::new();
    if fsa.finals().is_empty() {
        let diag = FbError::NoFinalState;
        warn!(semiring = W::NAME, "{}", diag);
        diagnostics.push(diag);
    }

    if parallel {
        rayon::join(
            || forward_pass::<W, T>(fsa, weights, forward),
            || backward_pass::<W, T>(fsa, weights, backward),
        );
    } else {
        forward_pass::<W, T>(fsa, weights, forward);
        backward_pass::<W, T>(fsa, weights, backward);
    }

    Ok(diagnostics)
}

/// Compute forward and backward scores with the default [`FbConfig`].
pub fn compute<T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
    weight_type: FbWeightType,
) -> FbResult<FbWeights> {
    compute_with_config(fsa, weights, weight_type, &FbConfig::default())
}

/// Compute forward and backward scores into freshly allocated vectors.
pub fn compute_with_config<T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
    weight_type: FbWeightType,
    config: &FbConfig,
) -> FbResult<FbWeights> {
    let n = fsa.num_states();
    let mut forward = vec![f64::NEG_INFINITY; n];
    let mut backward = vec![f64::NEG_INFINITY; n];
    let diagnostics = compute_into(fsa, weights, weight_type, config, &mut forward, &mut backward)?;
    Ok(FbWeights { weight_type, forward, backward, diagnostics })
}

// ══════════════════════════════════════════════════════════════════════════════
// FbWeights
// ══════════════════════════════════════════════════════════════════════════════

/// Forward and backward scores for one (automaton, weights, semiring) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct FbWeights {
    pub weight_type: FbWeightType,
    /// `forward[s]`: combined weight of all paths from the start to `s`.
    pub forward: Vec<f64>,
    /// `backward[s]`: combined weight of all paths from `s` to a final state.
    pub backward: Vec<f64>,
    /// Non-fatal diagnostics raised during computation.
    pub diagnostics: Vec<FbError>,
}

impl FbWeights {
    /// Combined weight of all complete paths.
    ///
    /// Fails with [`FbError::MismatchedSize`] if `fsa` is not the automaton
    /// these scores were computed for.
    pub fn total_weight(&self, fsa: &Fsa) -> FbResult<f64> {
        match self.weight_type {
            FbWeightType::MaxWeight => total_weight::<MaxWeight>(fsa, &self.forward),
            FbWeightType::LogSumWeight => total_weight::<LogSumWeight>(fsa, &self.forward),
        }
    }

    /// Log-domain arc posteriors: arc score minus total weight.
    ///
    /// Under `LogSumWeight` these are log-probabilities of traversing each
    /// arc. Under `MaxWeight` an arc on the best path scores 0 and other arcs
    /// score how much worse their best path is. All `-inf` when no complete
    /// path exists.
    pub fn arc_posteriors<T: ArcWeight>(&self, fsa: &Fsa, weights: &[T]) -> FbResult<Vec<f64>> {
        let scores = match self.weight_type {
            FbWeightType::MaxWeight => {
                arc_scores::<MaxWeight, T>(fsa, weights, &self.forward, &self.backward)?
            },
            FbWeightType::LogSumWeight => {
                arc_scores::<LogSumWeight, T>(fsa, weights, &self.forward, &self.backward)?
            },
        };
        let total = self.total_weight(fsa)?;
        Ok(scores.into_iter().map(|s| normalize(s, total)).collect())
    }

    /// Log-domain state posteriors: `forward + backward - total`.
    pub fn state_posteriors(&self, fsa: &Fsa) -> FbResult<Vec<f64>> {
        check_buffer("backward scores", self.backward.len(), fsa.num_states())?;
        let total = self.total_weight(fsa)?;
        Ok(self
            .forward
            .iter()
            .zip(&self.backward)
            .map(|(&f, &b)| {
                if f == f64::NEG_INFINITY || b == f64::NEG_INFINITY {
                    f64::NEG_INFINITY
                } else {
                    normalize(f + b, total)
                }
            })
            .collect())
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

#[inline]
fn normalize(score: f64, total: f64) -> f64 {
    if score == f64::NEG_INFINITY || total == f64::NEG_INFINITY {
        f64::NEG_INFINITY
    } else {
        score - total
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// WfsaWithFbWeights
// ══════════════════════════════════════════════════════════════════════════════

/// An automaton bundled with its arc weights and computed scores.
#[derive(Debug, Clone)]
pub struct WfsaWithFbWeights<'a, T: ArcWeight> {
    pub fsa: &'a Fsa,
    pub weights: &'a [T],
    scores: FbWeights,
}

impl<'a, T: ArcWeight> WfsaWithFbWeights<'a, T> {
    pub fn new(fsa: &'a Fsa, weights: &'a [T], weight_type: FbWeightType) -> FbResult<Self> {
        let scores = compute(fsa, weights, weight_type)?;
        Ok(WfsaWithFbWeights { fsa, weights, scores })
    }

    pub fn with_config(
        fsa: &'a Fsa,
        weights: &'a [T],
        weight_type: FbWeightType,
        config: &FbConfig,
    ) -> FbResult<Self> {
        let scores = compute_with_config(fsa, weights, weight_type, config)?;
        Ok(WfsaWithFbWeights { fsa, weights, scores })
    }

    #[inline]
    pub fn weight_type(&self) -> FbWeightType {
        self.scores.weight_type
    }

    #[inline]
    pub fn forward_state_weights(&self) -> &[f64] {
        &self.scores.forward
    }

    #[inline]
    pub fn backward_state_weights(&self) -> &[f64] {
        &self.scores.backward
    }

    pub fn total_weight(&self) -> FbResult<f64> {
        self.scores.total_weight(self.fsa)
    }

    pub fn arc_posteriors(&self) -> FbResult<Vec<f64>> {
        self.scores.arc_posteriors(self.fsa, self.weights)
    }

    pub fn state_posteriors(&self) -> FbResult<Vec<f64>> {
        self.scores.state_posteriors(self.fsa)
    }

    pub fn scores(&self) -> &FbWeights {
        &self.scores
    }

    pub fn into_scores(self) -> FbWeights {
        self.scores
    }
}
