//! Semiring types for forward-backward scoring.
//!
//! Provides the `Semiring` trait and the two max-plus style weights used by
//! the propagators. Both weights live in the log domain with larger values
//! being better: `zero` is `-inf` (no path) and `one` is `0.0` (empty path).
//!
//! ## MaxWeight
//!
//! `(R union {-inf}, max, +, -inf, 0.0)`. `combine` keeps the best of two
//! alternatives; `extend` accumulates scores along a path. Forward scores under
//! this semiring are Viterbi scores.
//!
//! ## LogSumWeight
//!
//! `(R union {-inf}, log-sum-exp, +, -inf, 0.0)`. Scores are log
//! probabilities; `combine` adds the underlying probabilities. Forward scores
//! under this semiring are total (marginal) path scores.

use std::cmp::Ordering;
use std::fmt;

/// Differences below this are lost in an `f64` mantissa: `ln(f64::EPSILON)`.
const MIN_LOG_DIFF: f64 = -36.043_653_389_117_15;

// ══════════════════════════════════════════════════════════════════════════════
// Semiring trait
// ══════════════════════════════════════════════════════════════════════════════

/// A semiring `(K, combine, extend, zero, one)` where `combine` merges the
/// scores of alternative paths reaching the same state and `extend` appends an
/// arc to a path.
///
/// Properties required:
/// - `(K, combine, zero)` is a commutative monoid
/// - `(K, extend, one)` is a monoid
/// - `extend` distributes over `combine`
/// - `zero` annihilates under `extend`
///
/// Scores are stored as plain `f64` in output buffers; `from_value` and
/// `value` convert at the boundary.
pub trait Semiring: Clone + Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Short human-readable name, used in diagnostics.
    const NAME: &'static str;

    /// Identity for `combine`: no path. `-inf` for both weights.
    fn zero() -> Self;
    /// Identity for `extend`: the empty path. `0.0` for both weights.
    fn one() -> Self;
    /// Merge two alternative path scores.
    fn combine(&self, other: &Self) -> Self;
    /// Append a path segment.
    fn extend(&self, other: &Self) -> Self;
    /// Wrap a raw log-domain value.
    fn from_value(value: f64) -> Self;
    /// Raw log-domain value.
    fn value(self) -> f64;
    /// Whether this is the `combine` identity.
    fn is_zero(&self) -> bool;
    /// Whether this is the `extend` identity.
    fn is_one(&self) -> bool;
    /// Approximate equality; two `zero`s are equal regardless of epsilon.
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        if self.is_zero() && other.is_zero() {
            true
        } else if self.is_zero() || other.is_zero() {
            false
        } else {
            (self.value() - other.value()).abs() <= epsilon
        }
    }

    /// Fold `combine` over an iterator, starting from `zero`.
    fn combine_all<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        iter.into_iter().fold(Self::zero(), |acc, w| acc.combine(&w))
    }
}

/// `a + b` with `-inf` absorbing, so `-inf + inf` never produces NaN.
#[inline]
fn add_absorbing(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY || b == f64::NEG_INFINITY {
        f64::NEG_INFINITY
    } else {
        a + b
    }
}

/// Whether `value` is a usable weight in every semiring here: finite or `-inf`.
///
/// `max` silently drops NaN while `log_add` propagates it, and
/// `log_add(inf, inf)` is NaN.
#[inline]
pub fn is_admissible(value: f64) -> bool {
    !value.is_nan() && value != f64::INFINITY
}

/// Numerically stable `ln(exp(a) + exp(b))`.
///
/// The larger operand is factored out so only `exp` of a non-positive number
/// is evaluated. Operands are ordered before evaluation, which makes the
/// result bit-identical under swapping.
#[inline]
pub fn log_add(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    let diff = lo - hi;
    if diff < MIN_LOG_DIFF {
        hi
    } else {
        hi + diff.exp().ln_1p()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// MaxWeight
// ══════════════════════════════════════════════════════════════════════════════

/// Max-plus (tropical-max) weight: `(R union {-inf}, max, +, -inf, 0.0)`.
///
/// - `combine = max`: keeps the best alternative
/// - `extend = +`: accumulates scores along a path
/// - `zero = -inf`: unreachable
/// - `one = 0.0`: empty path
///
/// `combine` is idempotent, so results are bit-exact under any visiting order.
#[derive(Clone, Copy)]
pub struct MaxWeight(pub f64);

impl MaxWeight {
    /// Create a new max weight.
    #[inline]
    pub const fn new(value: f64) -> Self {
        MaxWeight(value)
    }
}

impl Semiring for MaxWeight {
    const NAME: &'static str = "max";

    #[inline]
    fn zero() -> Self {
        MaxWeight(f64::NEG_INFINITY)
    }

    #[inline]
    fn one() -> Self {
        MaxWeight(0.0)
    }

    #[inline]
    fn combine(&self, other: &Self) -> Self {
        MaxWeight(self.0.max(other.0))
    }

    #[inline]
    fn extend(&self, other: &Self) -> Self {
        MaxWeight(add_absorbing(self.0, other.0))
    }

    #[inline]
    fn from_value(value: f64) -> Self {
        MaxWeight(value)
    }

    #[inline]
    fn value(self) -> f64 {
        self.0
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.0 == f64::NEG_INFINITY
    }

    #[inline]
    fn is_one(&self) -> bool {
        self.0 == 0.0
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// LogSumWeight
// ══════════════════════════════════════════════════════════════════════════════

/// Log semiring weight: `(R union {-inf}, log-sum-exp, +, -inf, 0.0)`.
///
/// Represents log probabilities: `w = ln(p)`.
///
/// - `combine = log-sum-exp`: adds probabilities, `ln(exp(a) + exp(b))`
/// - `extend = +`: multiplies probabilities
/// - `zero = -inf`: probability 0
/// - `one = 0.0`: probability 1
///
/// Not idempotent: `combine(a, a) = a + ln(2)`. Always `f64`; accumulating in
/// single precision drifts visibly over long paths.
#[derive(Clone, Copy)]
pub struct LogSumWeight(pub f64);

impl LogSumWeight {
    /// Create a new log weight from a raw log-probability.
    #[inline]
    pub const fn new(value: f64) -> Self {
        LogSumWeight(value)
    }

    /// Create a log weight from a probability `p` in `[0, 1]`.
    #[inline]
    pub fn from_probability(p: f64) -> Self {
        LogSumWeight(p.ln())
    }

    /// Convert back to a probability: `p = exp(w)`.
    #[inline]
    pub fn to_probability(self) -> f64 {
        self.0.exp()
    }
}

impl Semiring for LogSumWeight {
    const NAME: &'static str = "logsum";

    #[inline]
    fn zero() -> Self {
        LogSumWeight(f64::NEG_INFINITY)
    }

    #[inline]
    fn one() -> Self {
        LogSumWeight(0.0)
    }

    #[inline]
    fn combine(&self, other: &Self) -> Self {
        LogSumWeight(log_add(self.0, other.0))
    }

    #[inline]
    fn extend(&self, other: &Self) -> Self {
        LogSumWeight(add_absorbing(self.0, other.0))
    }

    #[inline]
    fn from_value(value: f64) -> Self {
        LogSumWeight(value)
    }

    #[inline]
    fn value(self) -> f64 {
        self.0
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.0 == f64::NEG_INFINITY
    }

    #[inline]
    fn is_one(&self) -> bool {
        self.0 == 0.0
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Shared trait impls
// ══════════════════════════════════════════════════════════════════════════════

/// Formatting, total ordering and hashing for an `f64` newtype weight.
///
/// Ordering uses `f64::total_cmp`, so `zero` sorts below every finite score.
macro_rules! impl_weight_traits {
    ($ty:ident, $prec:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_zero() {
                    write!(f, concat!(stringify!($ty), "(-inf)"))
                } else {
                    write!(f, concat!(stringify!($ty), "({:.", $prec, "})"), self.0)
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_zero() {
                    write!(f, "-inf")
                } else {
                    write!(f, concat!("{:.", $prec, "}"), self.0)
                }
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.0.total_cmp(&other.0) == Ordering::Equal
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.0.to_bits().hash(state);
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::one()
            }
        }
    };
}

impl_weight_traits!(MaxWeight, "1");
impl_weight_traits!(LogSumWeight, "4");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_zero_is_neg_infinity() {
        let z = MaxWeight::zero();
        assert!(z.is_zero());
        assert_eq!(z.value(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_max_combine_is_max() {
        let a = MaxWeight::new(3.0);
        let b = MaxWeight::new(7.0);
        assert_eq!(a.combine(&b), MaxWeight::new(7.0));
        assert_eq!(b.combine(&a), MaxWeight::new(7.0));
    }

    #[test]
    fn test_max_combine_with_zero() {
        let z = MaxWeight::zero();
        let a = MaxWeight::new(-2.5);
        assert_eq!(z.combine(&a), a);
        assert_eq!(a.combine(&z), a);
        assert!(z.combine(&z).is_zero());
    }

    #[test]
    fn test_max_extend_is_add() {
        let a = MaxWeight::new(3.0);
        let b = MaxWeight::new(7.0);
        assert_eq!(a.extend(&b), MaxWeight::new(10.0));
        assert_eq!(MaxWeight::one().extend(&a), a);
    }

    #[test]
    fn test_zero_annihilates_even_against_infinity() {
        let z = MaxWeight::zero();
        let inf = MaxWeight::new(f64::INFINITY);
        // -inf + inf would be NaN without the absorbing rule
        assert!(z.extend(&inf).is_zero());
        assert!(LogSumWeight::zero().extend(&LogSumWeight::new(f64::INFINITY)).is_zero());
    }

    #[test]
    fn test_max_ordering() {
        let a = MaxWeight::new(1.0);
        let b = MaxWeight::new(5.0);
        let z = MaxWeight::zero();
        assert!(a < b);
        assert!(z < a);
    }

    #[test]
    fn test_logsum_zero_identity() {
        let a = LogSumWeight::new(2.0);
        let z = LogSumWeight::zero();
        assert_eq!(z.combine(&a), a);
        assert_eq!(a.combine(&z), a);
        assert!(z.combine(&z).is_zero());
    }

    #[test]
    fn test_logsum_combine_matches_naive() {
        let a = LogSumWeight::new(7.0);
        let b = LogSumWeight::new(9.0);
        let expected = (7.0_f64.exp() + 9.0_f64.exp()).ln();
        assert!(a.combine(&b).approx_eq(&LogSumWeight::new(expected), 1e-12));
        assert!((a.combine(&b).value() - 9.126_928).abs() < 1e-6);
    }

    #[test]
    fn test_logsum_not_idempotent() {
        let a = LogSumWeight::new(2.0);
        let r = a.combine(&a);
        assert!((r.value() - (2.0 + 2.0_f64.ln())).abs() < 1e-12);
        assert_ne!(r, a);
    }

    #[test]
    fn test_logsum_commutative_bit_exact() {
        let a = LogSumWeight::new(-3.25);
        let b = LogSumWeight::new(11.5);
        assert_eq!(a.combine(&b), b.combine(&a));
    }

    #[test]
    fn test_logsum_large_values_stay_finite() {
        let a = LogSumWeight::new(1000.0);
        let b = LogSumWeight::new(999.0);
        let r = a.combine(&b);
        assert!(r.value().is_finite());
        assert!((r.value() - (1000.0 + (1.0 + (-1.0_f64).exp()).ln())).abs() < 1e-9);
    }

    #[test]
    fn test_logsum_huge_gap_returns_larger() {
        let a = LogSumWeight::new(0.0);
        let b = LogSumWeight::new(-100.0);
        assert_eq!(a.combine(&b), a);
    }

    #[test]
    fn test_logsum_dominates_max() {
        for &(x, y) in &[(0.0, 0.0), (1.0, -4.0), (-20.0, 3.5), (f64::NEG_INFINITY, 2.0)] {
            let l = LogSumWeight::new(x).combine(&LogSumWeight::new(y));
            let m = MaxWeight::new(x).combine(&MaxWeight::new(y));
            assert!(l.value() >= m.value());
        }
    }

    #[test]
    fn test_combine_all_fold_order() {
        let values = [1.0, 4.0, -2.0, 3.0, 0.5];
        let forward = LogSumWeight::combine_all(values.iter().map(|&v| LogSumWeight::new(v)));
        let reverse = LogSumWeight::combine_all(values.iter().rev().map(|&v| LogSumWeight::new(v)));
        assert!(forward.approx_eq(&reverse, 1e-12));
        assert!(LogSumWeight::combine_all(std::iter::empty()).is_zero());
    }

    #[test]
    fn test_probability_roundtrip() {
        for &p in &[0.1, 0.5, 1.0] {
            let w = LogSumWeight::from_probability(p);
            assert!((w.to_probability() - p).abs() < 1e-12);
        }
        assert!(LogSumWeight::from_probability(0.0).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", MaxWeight::new(1.5)), "1.5");
        assert_eq!(format!("{}", LogSumWeight::new(1.5)), "1.5000");
        assert_eq!(format!("{}", LogSumWeight::zero()), "-inf");
        assert_eq!(format!("{:?}", MaxWeight::zero()), "MaxWeight(-inf)");
    }

    #[test]
    fn test_hash_consistency() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(MaxWeight::new(3.0));
        assert!(set.contains(&MaxWeight::new(3.0)));
        assert!(!set.contains(&MaxWeight::new(4.0)));
    }

    #[test]
    fn test_admissible_weights() {
        assert!(is_admissible(0.0));
        assert!(is_admissible(-1e300));
        assert!(is_admissible(f64::NEG_INFINITY));
        assert!(!is_admissible(f64::INFINITY));
        assert!(!is_admissible(f64::NAN));
    }
}
