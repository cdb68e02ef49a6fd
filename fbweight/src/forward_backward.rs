//! Forward and backward propagation over a topologically-numbered automaton.
//!
//! Computes forward scores (combined weight of all paths from the start state
//! to each state) and backward scores (combined weight of all paths from each
//! state to any final state) under a generic [`Semiring`].
//!
//! ## Semiring Genericity
//!
//! - With `MaxWeight`: forward = Viterbi score of the best path to each state.
//! - With `LogSumWeight`: forward = total log-probability to each state.
//!
//! ## Ordering
//!
//! Both passes are single sweeps over state indices. The forward pass visits
//! states in increasing order and pulls from incoming arcs; since every arc
//! satisfies `src < dst`, all predecessors are final by the time a state is
//! visited. The backward pass mirrors this with decreasing order and outgoing
//! arcs. O(states + arcs) time, no extra space beyond the output.
//!
//! The `*_into` entry points validate everything before touching the output
//! buffer, so a failed call leaves it exactly as it was.

use crate::error::{FbError, FbResult};
use crate::fsa::{Fsa, StateId, START_STATE};
use crate::semiring::{is_admissible, Semiring};

/// Element type of a caller-supplied arc weight array (`f32` or `f64`).
pub trait ArcWeight: Copy + Send + Sync + Into<f64> {}

impl<T: Copy + Send + Sync + Into<f64>> ArcWeight for T {}

#[inline]
fn arc_weight<W: Semiring, T: ArcWeight>(weights: &[T], arc: usize) -> W {
    W::from_value(weights[arc].into())
}

// ══════════════════════════════════════════════════════════════════════════════
// Validation
// ══════════════════════════════════════════════════════════════════════════════

/// Validate an automaton and its weight array. In order: the automaton is
/// non-empty, there is one weight per arc, every weight is finite or `-inf`,
/// and the arcs are topologically numbered.
pub fn validate_inputs<T: ArcWeight>(fsa: &Fsa, weights: &[T]) -> FbResult<()> {
    if fsa.is_empty() {
        return Err(FbError::EmptyAutomaton);
    }
    if weights.len() != fsa.num_arcs() {
        return Err(FbError::MismatchedSize {
            what: "arc weights",
            expected: fsa.num_arcs(),
            actual: weights.len(),
        });
    }
    let mut values = weights.iter().map(|&w| Into::<f64>::into(w)).enumerate();
    if let Some((arc, value)) = values.find(|&(_, v)| !is_admissible(v)) {
        return Err(FbError::InvalidWeight { arc, value });
    }
    fsa.check_topology()
}

pub(crate) fn check_buffer(what: &'static str, len: usize, expected: usize) -> FbResult<()> {
    if len == expected {
        Ok(())
    } else {
        Err(FbError::MismatchedSize { what, expected, actual: len })
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Forward
// ══════════════════════════════════════════════════════════════════════════════

/// Compute forward scores into a freshly allocated vector.
pub fn forward_scores<W: Semiring, T: ArcWeight>(fsa: &Fsa, weights: &[T]) -> FbResult<Vec<f64>> {
    let mut out = vec![W::zero().value(); fsa.num_states()];
    forward_scores_into::<W, T>(fsa, weights, &mut out)?;
    Ok(out)
}

/// Compute forward scores into `out`, which must hold exactly `num_states`
/// values.
///
/// `out[0]` is `one`; a state with no path from the start is `zero`.
pub fn forward_scores_into<W: Semiring, T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
    out: &mut [f64],
) -> FbResult<()> {
    validate_inputs(fsa, weights)?;
    check_buffer("forward buffer", out.len(), fsa.num_states())?;
    forward_pass::<W, T>(fsa, weights, out);
    Ok(())
}

/// Unchecked forward sweep. Inputs must have passed [`validate_inputs`].
pub(crate) fn forward_pass<W: Semiring, T: ArcWeight>(fsa: &Fsa, weights: &[T], out: &mut [f64]) {
    let start = START_STATE as usize;
    out[start] = W::one().value();
    for state in start + 1..fsa.num_states() {
        let mut acc = W::zero();
        for &a in fsa.incoming(state as StateId) {
            let src = fsa.arc(a).src as usize;
            let candidate = W::from_value(out[src]).extend(&arc_weight::<W, T>(weights, a));
            acc = acc.combine(&candidate);
        }
        out[state] = acc.value();
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Backward
// ══════════════════════════════════════════════════════════════════════════════

/// Compute backward scores into a freshly allocated vector.
pub fn backward_scores<W: Semiring, T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
) -> FbResult<Vec<f64>> {
    let mut out = vec![W::zero().value(); fsa.num_states()];
    backward_scores_into::<W, T>(fsa, weights, &mut out)?;
    Ok(out)
}

/// Compute backward scores into `out`, which must hold exactly `num_states`
/// values.
///
/// Final states are seeded with their final weight (`one` unless set); a
/// non-final state with no path to a final state is `zero`.
pub fn backward_scores_into<W: Semiring, T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
    out: &mut [f64],
) -> FbResult<()> {
    validate_inputs(fsa, weights)?;
    check_buffer("backward buffer", out.len(), fsa.num_states())?;
    backward_pass::<W, T>(fsa, weights, out);
    Ok(())
}

/// Unchecked backward sweep. Inputs must have passed [`validate_inputs`].
pub(crate) fn backward_pass<W: Semiring, T: ArcWeight>(fsa: &Fsa, weights: &[T], out: &mut [f64]) {
    for state in (0..fsa.num_states()).rev() {
        let sid = state as StateId;
        let mut acc: W = fsa.finality(sid).seed();
        for &a in fsa.outgoing(sid) {
            let dst = fsa.arc(a).dst as usize;
            let candidate = arc_weight::<W, T>(weights, a).extend(&W::from_value(out[dst]));
            acc = acc.combine(&candidate);
        }
        out[state] = acc.value();
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Derived quantities
// ══════════════════════════════════════════════════════════════════════════════

/// Combined weight of all complete paths: ⊕ over final states `f` of
/// `forward[f] ⊗ final_weight(f)`.
///
/// For a valid automaton this equals `backward[0]`. `zero` when there is no
/// final state. `forward` must hold exactly `num_states` values.
pub fn total_weight<W: Semiring>(fsa: &Fsa, forward: &[f64]) -> FbResult<f64> {
    check_buffer("forward scores", forward.len(), fsa.num_states())?;
    Ok(W::combine_all(fsa.finals().iter().map(|&f| {
        W::from_value(forward[f as usize]).extend(&fsa.finality(f).seed::<W>())
    }))
    .value())
}

/// Per-arc score `forward[src] ⊗ weight ⊗ backward[dst]`: the combined weight
/// of all complete paths through the arc.
///
/// Subtracting the total weight gives a log-domain arc posterior.
pub fn arc_scores<W: Semiring, T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
    forward: &[f64],
    backward: &[f64],
) -> FbResult<Vec<f64>> {
    validate_inputs(fsa, weights)?;
    check_buffer("forward scores", forward.len(), fsa.num_states())?;
    check_buffer("backward scores", backward.len(), fsa.num_states())?;

    Ok(fsa
        .arcs()
        .iter()
        .enumerate()
        .map(|(i, arc)| {
            W::from_value(forward[arc.src as usize])
                .extend(&arc_weight::<W, T>(weights, i))
                .extend(&W::from_value(backward[arc.dst as usize]))
                .value()
        })
        .collect())
}

/// ⊕ of the weights on the arcs entering and leaving a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSummary {
    pub incoming: f64,
    pub outgoing: f64,
}

/// Per-state [`ArcSummary`]. States without incoming (outgoing) arcs get
/// `zero` on that side.
pub fn state_arc_summaries<W: Semiring, T: ArcWeight>(
    fsa: &Fsa,
    weights: &[T],
) -> FbResult<Vec<ArcSummary>> {
    validate_inputs(fsa, weights)?;

    let side = |arcs: &[usize]| {
        W::combine_all(arcs.iter().map(|&a| arc_weight::<W, T>(weights, a))).value()
    };
    Ok((0..fsa.num_states())
        .map(|s| s as StateId)
        .map(|s| ArcSummary {
            incoming: side(fsa.incoming(s)),
            outgoing: side(fsa.outgoing(s)),
        })
        .collect())
}
