//! Crate-level tests: the reference automaton, facade error handling, and
//! property tests over random topologically-numbered DAGs.

mod reference_tests;

use crate::fsa::{Arc, Fsa, StateId};

/// Assert two score vectors agree: infinities exactly, finite values within
/// `tol`.
pub(crate) fn assert_scores_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        if e.is_infinite() || a.is_infinite() {
            assert_eq!(a, e, "state {}: expected {}, got {}", i, e, a);
        } else {
            approx::assert_abs_diff_eq!(a, e, epsilon = tol);
        }
    }
}

/// Build an automaton from `(src, dst, weight)` triples; labels are the arc
/// index.
pub(crate) fn weighted_fsa(
    num_states: usize,
    arcs: &[(StateId, StateId, f32)],
    finals: &[StateId],
) -> (Fsa, Vec<f32>) {
    let fsa = Fsa::new(
        num_states,
        arcs.iter().enumerate().map(|(i, &(s, d, _))| Arc::new(s, d, i as i32)).collect(),
        finals.iter().copied(),
    )
    .expect("states in range");
    let weights = arcs.iter().map(|&(_, _, w)| w).collect();
    (fsa, weights)
}
