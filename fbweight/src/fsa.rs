//! Read-only automaton view.
//!
//! An [`Fsa`] holds states `0..num_states`, an ordered arc list and a set of
//! final states. State 0 is the start state. Arc order is significant: the
//! `i`-th arc is scored with the `i`-th entry of the caller's weight array.
//!
//! ## Adjacency
//!
//! Incoming and outgoing arcs are indexed in CSR form (offsets + arc indices),
//! built once by a stable counting sort. Within a state, arcs keep their
//! enumeration order.
//!
//! ```text
//!   arcs:        [0→4, 0→1, 1→2, 1→3, ...]
//!   out_offsets: [0, 2, 4, ...]          out_arcs: [0, 1, 2, 3, ...]
//!   in_offsets:  [0, 0, 1, 2, 3, ...]    in_arcs:  [1, 2, 3, ..., 0, ...]
//! ```
//!
//! Topological numbering (`src < dst` for every arc) is not enforced at
//! construction; [`Fsa::check_topology`] verifies it and is run by every
//! scoring entry point.

use std::ops::Range;

use crate::error::{FbError, FbResult};
use crate::semiring::{is_admissible, Semiring};

/// State identifier.
pub type StateId = u32;

/// Arc label. Labels are carried for the caller's benefit; scoring ignores them.
pub type Label = i32;

/// Label on arcs entering a final state.
pub const FINAL_LABEL: Label = -1;

/// The start state.
pub const START_STATE: StateId = 0;

// ══════════════════════════════════════════════════════════════════════════════
// Arc / Finality
// ══════════════════════════════════════════════════════════════════════════════

/// A labeled arc. Its weight lives in a separate, index-aligned array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arc {
    pub src: StateId,
    pub dst: StateId,
    pub label: Label,
}

impl Arc {
    #[inline]
    pub const fn new(src: StateId, dst: StateId, label: Label) -> Self {
        Arc { src, dst, label }
    }
}

/// Whether a state is final, and with what final weight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Finality {
    #[default]
    NonFinal,
    /// Final with the semiring's `one` as final weight.
    Final,
    /// Final with an explicit log-domain final weight.
    Weighted(f64),
}

impl Finality {
    #[inline]
    pub fn is_final(self) -> bool {
        !matches!(self, Finality::NonFinal)
    }

    /// Backward seed for a state with this finality.
    #[inline]
    pub fn seed<W: Semiring>(self) -> W {
        match self {
            Finality::NonFinal => W::zero(),
            Finality::Final => W::one(),
            Finality::Weighted(w) => W::from_value(w),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Fsa
// ══════════════════════════════════════════════════════════════════════════════

/// An acyclic, topologically-numbered weighted automaton (topology only).
#[derive(Debug, Clone)]
pub struct Fsa {
    num_states: usize,
    arcs: Vec<Arc>,
    /// Sorted, deduplicated final states.
    finals: Vec<StateId>,
    /// Dense per-state finality.
    finality: Vec<Finality>,
    out_offsets: Vec<usize>,
    out_arcs: Vec<usize>,
    in_offsets: Vec<usize>,
    in_arcs: Vec<usize>,
}

impl Fsa {
    /// Build an automaton from a state count, arcs and final states.
    ///
    /// Fails with [`FbError::TooManyStates`] if some state in
    /// `0..num_states` has no [`StateId`], and with
    /// [`FbError::StateOutOfRange`] if an arc endpoint or a final state is
    /// `>= num_states`. Duplicate final states are collapsed.
    pub fn new(
        num_states: usize,
        arcs: Vec<Arc>,
        finals: impl IntoIterator<Item = StateId>,
    ) -> FbResult<Self> {
        if num_states > 0 && StateId::try_from(num_states - 1).is_err() {
            return Err(FbError::TooManyStates { num_states });
        }
        for (i, arc) in arcs.iter().enumerate() {
            for state in [arc.src, arc.dst] {
                check_state(state, num_states, || format!("arc {}", i))?;
            }
        }

        let mut finality = vec![Finality::NonFinal; num_states];
        let mut final_list = Vec::new();
        for f in finals {
            check_state(f, num_states, || "final state".to_string())?;
            if !finality[f as usize].is_final() {
                finality[f as usize] = Finality::Final;
                final_list.push(f);
            }
        }
        final_list.sort_unstable();

        let (out_offsets, out_arcs) = build_index(num_states, &arcs, |a| a.src);
        let (in_offsets, in_arcs) = build_index(num_states, &arcs, |a| a.dst);

        Ok(Fsa {
            num_states,
            arcs,
            finals: final_list,
            finality,
            out_offsets,
            out_arcs,
            in_offsets,
            in_arcs,
        })
    }

    /// Mark `state` final with an explicit final weight.
    ///
    /// The backward score of a final state is seeded with its final weight
    /// instead of `one`.
    ///
    /// The weight must be finite or `-inf`; NaN and `+inf` fail with
    /// [`FbError::InvalidFinalWeight`].
    pub fn with_final_weight(mut self, state: StateId, weight: f64) -> FbResult<Self> {
        check_state(state, self.num_states, || "final state".to_string())?;
        if !is_admissible(weight) {
            return Err(FbError::InvalidFinalWeight { state, value: weight });
        }
        if !self.finality[state as usize].is_final() {
            let pos = self.finals.partition_point(|&f| f < state);
            self.finals.insert(pos, state);
        }
        self.finality[state as usize] = Finality::Weighted(weight);
        Ok(self)
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    #[inline]
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_states == 0
    }

    #[inline]
    pub fn start(&self) -> StateId {
        START_STATE
    }

    /// All arcs in enumeration order.
    #[inline]
    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    #[inline]
    pub fn arc(&self, index: usize) -> &Arc {
        &self.arcs[index]
    }

    /// Final states in increasing order.
    #[inline]
    pub fn finals(&self) -> &[StateId] {
        &self.finals
    }

    #[inline]
    pub fn is_final(&self, state: StateId) -> bool {
        self.finality(state).is_final()
    }

    /// Finality of `state`; `NonFinal` for out-of-range states.
    #[inline]
    pub fn finality(&self, state: StateId) -> Finality {
        self.finality.get(state as usize).copied().unwrap_or_default()
    }

    /// Explicit final weight of `state`, if one was attached.
    pub fn final_weight(&self, state: StateId) -> Option<f64> {
        match self.finality(state) {
            Finality::Weighted(w) => Some(w),
            _ => None,
        }
    }

    /// Indices of arcs leaving `state`, in enumeration order.
    #[inline]
    pub fn outgoing(&self, state: StateId) -> &[usize] {
        &self.out_arcs[csr_range(&self.out_offsets, state)]
    }

    /// Indices of arcs entering `state`, in enumeration order.
    #[inline]
    pub fn incoming(&self, state: StateId) -> &[usize] {
        &self.in_arcs[csr_range(&self.in_offsets, state)]
    }

    /// Verify that every arc goes from a lower to a strictly higher state.
    ///
    /// Reports the first offending arc in enumeration order. Self-loops are
    /// rejected like any other back edge.
    pub fn check_topology(&self) -> FbResult<()> {
        match self.arcs.iter().enumerate().find(|(_, a)| a.src >= a.dst) {
            Some((arc, a)) => Err(FbError::InvalidTopology { arc, src: a.src, dst: a.dst }),
            None => Ok(()),
        }
    }
}

#[inline]
fn csr_range(offsets: &[usize], state: StateId) -> Range<usize> {
    let s = state as usize;
    offsets[s]..offsets[s + 1]
}

fn check_state(
    state: StateId,
    num_states: usize,
    context: impl FnOnce() -> String,
) -> FbResult<()> {
    if (state as usize) < num_states {
        Ok(())
    } else {
        Err(FbError::StateOutOfRange { context: context(), state, num_states })
    }
}

/// Stable counting sort of arc indices by `key`. Returns `(offsets, arc_indices)`.
fn build_index(
    num_states: usize,
    arcs: &[Arc],
    key: impl Fn(&Arc) -> StateId,
) -> (Vec<usize>, Vec<usize>) {
    let mut offsets = vec![0usize; num_states + 1];
    for arc in arcs {
        offsets[key(arc) as usize + 1] += 1;
    }
    for s in 0..num_states {
        offsets[s + 1] += offsets[s];
    }

    let mut cursor = offsets.clone();
    let mut indices = vec![0usize; arcs.len()];
    for (i, arc) in arcs.iter().enumerate() {
        let slot = &mut cursor[key(arc) as usize];
        indices[*slot] = i;
        *slot += 1;
    }

    (offsets, indices)
}

// ══════════════════════════════════════════════════════════════════════════════
// FsaBuilder
// ══════════════════════════════════════════════════════════════════════════════

/// Incremental builder for [`Fsa`].
///
/// ```
/// use wfsa_fbweight::fsa::{FsaBuilder, FINAL_LABEL};
///
/// let mut b = FsaBuilder::new();
/// b.add_arc(0, 1, 5).add_arc(1, 2, FINAL_LABEL).add_final(2);
/// let fsa = b.build().unwrap();
/// assert_eq!(fsa.num_states(), 3);
/// assert_eq!(fsa.finals(), &[2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FsaBuilder {
    num_states: Option<usize>,
    arcs: Vec<Arc>,
    finals: Vec<(StateId, Option<f64>)>,
}

impl FsaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the state count instead of inferring it from arcs and finals.
    pub fn with_num_states(mut self, num_states: usize) -> Self {
        self.num_states = Some(num_states);
        self
    }

    pub fn add_arc(&mut self, src: StateId, dst: StateId, label: Label) -> &mut Self {
        self.arcs.push(Arc::new(src, dst, label));
        self
    }

    pub fn add_final(&mut self, state: StateId) -> &mut Self {
        self.finals.push((state, None));
        self
    }

    pub fn add_final_with_weight(&mut self, state: StateId, weight: f64) -> &mut Self {
        self.finals.push((state, Some(weight)));
        self
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    fn inferred_num_states(&self) -> usize {
        let arc_max = self.arcs.iter().map(|a| a.src.max(a.dst));
        let final_max = self.finals.iter().map(|&(s, _)| s);
        arc_max.chain(final_max).max().map_or(0, |m| m as usize + 1)
    }

    pub fn build(self) -> FbResult<Fsa> {
        let num_states = self.num_states.unwrap_or_else(|| self.inferred_num_states());
        let FsaBuilder { arcs, finals, .. } = self;
        let plain: Vec<StateId> =
            finals.iter().filter(|(_, w)| w.is_none()).map(|&(s, _)| s).collect();
        let mut fsa = Fsa::new(num_states, arcs, plain)?;
        for (state, weight) in finals {
            if let Some(w) = weight {
                fsa = fsa.with_final_weight(state, w)?;
            }
        }
        Ok(fsa)
    }

    /// Build, marking the highest-numbered state final when no final state
    /// was added.
    pub fn build_with_last_final(mut self) -> FbResult<Fsa> {
        if self.finals.is_empty() {
            let n = self.num_states.unwrap_or_else(|| self.inferred_num_states());
            if n > 0 {
                self.finals.push(((n - 1) as StateId, None));
            }
        }
        self.build()
    }
}
