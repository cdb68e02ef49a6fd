//! The ten-state reference acceptor scored under both semirings.
//!
//! ```text
//!   0 ─1→ 4 ─2→ 6 ─3→ 9        5 ─4→ 9   (5 unreachable)
//!   │     └─3→ 8 ─6→ 9
//!   └─1→ 1 ─2→ 2 ─4→ 7 ─5→ 9
//!        └─3→ 3 ─5→ 7
//! ```

use super::assert_scores_close;
use crate::fb_weights::{compute, compute_into, FbWeightType};
use crate::forward_backward::{backward_scores, forward_scores};
use crate::fsa::{Fsa, FsaBuilder, FINAL_LABEL};
use crate::semiring::{LogSumWeight, MaxWeight, Semiring};
use crate::FbConfig;

const NEG_INF: f64 = f64::NEG_INFINITY;

fn reference_fsa() -> Fsa {
    let mut b = FsaBuilder::new();
    b.add_arc(0, 4, 1)
        .add_arc(0, 1, 1)
        .add_arc(1, 2, 1)
        .add_arc(1, 3, 1)
        .add_arc(2, 7, 1)
        .add_arc(3, 7, 1)
        .add_arc(4, 6, 1)
        .add_arc(4, 8, 1)
        .add_arc(5, 9, FINAL_LABEL)
        .add_arc(6, 9, FINAL_LABEL)
        .add_arc(7, 9, FINAL_LABEL)
        .add_arc(8, 9, FINAL_LABEL);
    b.build_with_last_final().expect("reference automaton is valid")
}

const WEIGHTS: [f32; 12] = [1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 2.0, 3.0, 4.0, 3.0, 5.0, 6.0];

const MAX_FORWARD: [f64; 10] = [0.0, 1.0, 3.0, 4.0, 1.0, NEG_INF, 3.0, 9.0, 4.0, 14.0];
const MAX_BACKWARD: [f64; 10] = [14.0, 13.0, 9.0, 10.0, 9.0, 4.0, 3.0, 5.0, 6.0, 0.0];
const LOGSUM_FORWARD: [f64; 10] =
    [0.0, 1.0, 3.0, 4.0, 1.0, NEG_INF, 3.0, 9.126928, 4.0, 14.143222];
const LOGSUM_BACKWARD: [f64; 10] =
    [14.143222, 13.126928, 9.0, 10.0, 9.018150, 4.0, 3.0, 5.0, 6.0, 0.0];

#[test]
fn test_reference_shape() {
    let fsa = reference_fsa();
    assert_eq!(fsa.num_states(), 10);
    assert_eq!(fsa.num_arcs(), 12);
    assert_eq!(fsa.finals(), &[9]);
    assert!(fsa.check_topology().is_ok());
}

#[test]
fn test_max_weight() {
    let fsa = reference_fsa();
    let r = compute(&fsa, &WEIGHTS, FbWeightType::MaxWeight).expect("valid");
    // Max-plus over small integers is exact.
    assert_eq!(r.forward, MAX_FORWARD.to_vec());
    assert_eq!(r.backward, MAX_BACKWARD.to_vec());
    assert!(r.diagnostics.is_empty());
}

#[test]
fn test_logsum_weight() {
    let fsa = reference_fsa();
    let r = compute(&fsa, &WEIGHTS, FbWeightType::LogSumWeight).expect("valid");
    assert_scores_close(&r.forward, &LOGSUM_FORWARD, 1e-5);
    assert_scores_close(&r.backward, &LOGSUM_BACKWARD, 1e-5);
}

#[test]
fn test_propagators_agree_with_facade() {
    let fsa = reference_fsa();
    let fwd = forward_scores::<LogSumWeight, _>(&fsa, &WEIGHTS).expect("valid");
    let bwd = backward_scores::<LogSumWeight, _>(&fsa, &WEIGHTS).expect("valid");
    let r = compute(&fsa, &WEIGHTS, FbWeightType::LogSumWeight).expect("valid");
    assert_eq!(fwd, r.forward);
    assert_eq!(bwd, r.backward);
}

#[test]
fn test_total_weight_matches_backward_start() {
    let fsa = reference_fsa();
    for ty in FbWeightType::ALL {
        let r = compute(&fsa, &WEIGHTS, ty).expect("valid");
        let total = r.total_weight(&fsa).expect("same fsa");
        approx::assert_abs_diff_eq!(total, r.backward[0], epsilon = 1e-9);
    }
}

#[test]
fn test_unreachable_state_has_backward_but_no_forward() {
    let fsa = reference_fsa();
    let r = compute(&fsa, &WEIGHTS, FbWeightType::LogSumWeight).expect("valid");
    assert_eq!(r.forward[5], NEG_INF);
    assert_eq!(r.backward[5], 4.0);
    assert_eq!(r.state_posteriors(&fsa).expect("same fsa")[5], NEG_INF);
}

#[test]
fn test_max_arc_posteriors_mark_best_path() {
    // Best path: 0 → 1 → 3 → 7 → 9 (1 + 3 + 5 + 5 = 14).
    let fsa = reference_fsa();
    let r = compute(&fsa, &WEIGHTS, FbWeightType::MaxWeight).expect("valid");
    let post = r.arc_posteriors(&fsa, &WEIGHTS).expect("valid");
    let on_best: Vec<usize> = post
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p == 0.0)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(on_best, vec![1, 3, 5, 10]);
    assert_eq!(post[8], NEG_INF);
}

#[test]
fn test_logsum_arc_posteriors_into_final_sum_to_one() {
    let fsa = reference_fsa();
    let r = compute(&fsa, &WEIGHTS, FbWeightType::LogSumWeight).expect("valid");
    let post = r.arc_posteriors(&fsa, &WEIGHTS).expect("valid");
    let mass: f64 = fsa.incoming(9).iter().map(|&a| post[a].exp()).sum();
    approx::assert_abs_diff_eq!(mass, 1.0, epsilon = 1e-9);
}

#[test]
fn test_recompute_is_pure_and_buffers_reusable() {
    let fsa = reference_fsa();
    let first = compute(&fsa, &WEIGHTS, FbWeightType::LogSumWeight).expect("valid");
    let second = compute(&fsa, &WEIGHTS, FbWeightType::LogSumWeight).expect("valid");
    assert_eq!(first, second);

    // Reuse the same buffers for a different semiring, then switch back.
    let mut fwd = vec![123.0; 10];
    let mut bwd = vec![-7.0; 10];
    let cfg = FbConfig::default();
    compute_into(&fsa, &WEIGHTS, FbWeightType::MaxWeight, &cfg, &mut fwd, &mut bwd).expect("valid");
    assert_eq!(fwd, MAX_FORWARD.to_vec());
    compute_into(&fsa, &WEIGHTS, FbWeightType::LogSumWeight, &cfg, &mut fwd, &mut bwd)
        .expect("valid");
    assert_eq!(fwd, first.forward);
    assert_eq!(bwd, first.backward);
}

#[test]
fn test_new_weights_same_topology() {
    let fsa = reference_fsa();
    let zeros = [0.0f32; 12];
    let r = compute(&fsa, &zeros, FbWeightType::LogSumWeight).expect("valid");
    // Four complete paths from the start, each of weight 0.
    approx::assert_abs_diff_eq!(r.backward[0], 4.0_f64.ln(), epsilon = 1e-12);
    let r = compute(&fsa, &zeros, FbWeightType::MaxWeight).expect("valid");
    assert_eq!(r.backward[0], 0.0);
    assert_eq!(r.forward[5], NEG_INF);
    assert_eq!(MaxWeight::NAME, FbWeightType::MaxWeight.name());
}
