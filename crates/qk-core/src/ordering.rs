//! Equality, lexicographic order and classification predicates.
//!
//! Three NaN policies live in this crate and must stay distinct:
//!
//! 1. The predicates here follow plain IEEE rules: a comparison with a
//!    NaN-holding operand answers `false`, whichever component the NaN sits
//!    in, so such a value is neither less than, equal to, nor greater than
//!    anything.
//! 2. [`crate::reduce::argmax`] treats NaN as maximal: the first NaN it meets
//!    wins and stops the scan.
//! 3. [`total_cmp`], the sort comparator handed to hosts, groups every
//!    NaN-holding value together and orders that group before all others.

use std::cmp::Ordering;

use crate::quaternion::Quaternion;

/// All four components IEEE-equal.
pub fn equal(p: Quaternion, q: Quaternion) -> bool {
    p.w == q.w && p.x == q.x && p.y == q.y && p.z == q.z
}

pub fn not_equal(p: Quaternion, q: Quaternion) -> bool {
    !equal(p, q)
}

/// Lexicographic `(w, x, y, z)` cascade; `tie` is the answer when all four
/// components are equal.
fn lexicographic(p: Quaternion, q: Quaternion, tie: bool) -> bool {
    if isnan(p) || isnan(q) {
        false
    } else if p.w != q.w {
        p.w < q.w
    } else if p.x != q.x {
        p.x < q.x
    } else if p.y != q.y {
        p.y < q.y
    } else if p.z != q.z {
        p.z < q.z
    } else {
        tie
    }
}

/// Strict lexicographic `(w, x, y, z)` comparison.
pub fn less(p: Quaternion, q: Quaternion) -> bool {
    lexicographic(p, q, false)
}

/// Non-strict lexicographic `(w, x, y, z)` comparison.
pub fn less_equal(p: Quaternion, q: Quaternion) -> bool {
    lexicographic(p, q, true)
}

pub fn greater(p: Quaternion, q: Quaternion) -> bool {
    less(q, p)
}

pub fn greater_equal(p: Quaternion, q: Quaternion) -> bool {
    less_equal(q, p)
}

/// Any component is NaN.
pub fn isnan(q: Quaternion) -> bool {
    q.w.is_nan() || q.x.is_nan() || q.y.is_nan() || q.z.is_nan()
}

/// Any component is infinite and none is NaN.
pub fn isinf(q: Quaternion) -> bool {
    let any_inf = q.w.is_infinite() || q.x.is_infinite() || q.y.is_infinite() || q.z.is_infinite();
    any_inf && !isnan(q)
}

/// Every component is finite.
pub fn isfinite(q: Quaternion) -> bool {
    q.w.is_finite() && q.x.is_finite() && q.y.is_finite() && q.z.is_finite()
}

/// Not equal to the zero quaternion. NaN-holding values are nonzero.
pub fn nonzero(q: Quaternion) -> bool {
    !equal(q, Quaternion::zero())
}

/// Total order for sorting: NaN-holding values are equal to each other and
/// sort before every other value; the rest compare lexicographically.
pub fn total_cmp(a: &Quaternion, b: &Quaternion) -> Ordering {
    match (isnan(*a), isnan(*b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            if less(*a, *b) {
                Ordering::Less
            } else if less(*b, *a) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NAN: f64 = f64::NAN;
    const INF: f64 = f64::INFINITY;

    fn q(w: f64, x: f64, y: f64, z: f64) -> Quaternion {
        Quaternion::new(w, x, y, z)
    }

    #[test]
    fn test_equal_ieee() {
        assert!(equal(q(1.0, 2.0, 3.0, 4.0), q(1.0, 2.0, 3.0, 4.0)));
        assert!(equal(q(0.0, 0.0, 0.0, 0.0), q(-0.0, 0.0, -0.0, 0.0)));
        let n = q(1.0, NAN, 3.0, 4.0);
        assert!(!equal(n, n));
        assert!(not_equal(n, n));
    }

    #[test]
    fn test_lexicographic_order() {
        assert!(less(q(1.0, 9.0, 9.0, 9.0), q(2.0, 0.0, 0.0, 0.0)));
        assert!(less(q(1.0, 1.0, 9.0, 9.0), q(1.0, 2.0, 0.0, 0.0)));
        assert!(less(q(1.0, 1.0, 1.0, 9.0), q(1.0, 1.0, 2.0, 0.0)));
        assert!(less(q(1.0, 1.0, 1.0, 1.0), q(1.0, 1.0, 1.0, 2.0)));
        assert!(!less(q(1.0, 1.0, 1.0, 1.0), q(1.0, 1.0, 1.0, 1.0)));
        assert!(less_equal(q(1.0, 1.0, 1.0, 1.0), q(1.0, 1.0, 1.0, 1.0)));
        assert!(greater(q(0.0, 0.0, 0.0, 1.0), q(0.0, 0.0, 0.0, 0.0)));
        assert!(greater_equal(q(0.0, 0.0, 0.0, 0.0), q(0.0, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_nan_comparisons_are_false() {
        let a = q(1.0, 2.0, 3.0, 4.0);
        let n = q(NAN, 2.0, 3.0, 4.0);
        assert!(!less(a, n));
        assert!(!less(n, a));
        assert!(!less_equal(a, n));
        assert!(!less_equal(n, a));
        assert!(!greater(n, a));
        assert!(!greater_equal(n, a));
        assert!(!less_equal(n, n));
    }

    #[test]
    fn test_nan_after_decided_component() {
        // w alone would decide, but the NaN in x still makes every
        // comparison false.
        let a = q(1.0, NAN, 0.0, 0.0);
        let b = q(2.0, 0.0, 0.0, 0.0);
        assert!(!less(a, b));
        assert!(!less_equal(a, b));
        assert!(!greater(b, a));
        assert!(!greater_equal(b, a));
    }

    #[test]
    fn test_classification() {
        assert!(isnan(q(0.0, 0.0, 0.0, NAN)));
        assert!(!isnan(q(INF, 0.0, 0.0, 0.0)));
        assert!(isinf(q(0.0, -INF, 0.0, 0.0)));
        assert!(!isinf(q(INF, NAN, 0.0, 0.0)));
        assert!(!isinf(q(1.0, 2.0, 3.0, 4.0)));
        assert!(isfinite(q(1.0, 2.0, 3.0, 4.0)));
        assert!(!isfinite(q(1.0, INF, 3.0, 4.0)));
        assert!(!isfinite(q(1.0, NAN, 3.0, 4.0)));
    }

    #[test]
    fn test_nonzero() {
        assert!(!nonzero(Quaternion::zero()));
        assert!(!nonzero(q(-0.0, 0.0, 0.0, -0.0)));
        assert!(nonzero(q(0.0, 0.0, 1e-300, 0.0)));
        assert!(nonzero(q(NAN, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_total_cmp_sorts_nan_first() {
        let mut values = vec![
            q(2.0, 0.0, 0.0, 0.0),
            q(NAN, 0.0, 0.0, 0.0),
            q(1.0, 5.0, 0.0, 0.0),
            q(0.0, 0.0, NAN, 0.0),
            q(1.0, 4.0, 0.0, 0.0),
        ];
        values.sort_by(total_cmp);
        assert!(isnan(values[0]));
        assert!(isnan(values[1]));
        assert_eq!(values[2], q(1.0, 4.0, 0.0, 0.0));
        assert_eq!(values[3], q(1.0, 5.0, 0.0, 0.0));
        assert_eq!(values[4], q(2.0, 0.0, 0.0, 0.0));
    }

    fn finite() -> impl Strategy<Value = f64> {
        prop_oneof![-3.0f64..3.0, Just(0.0), Just(1.0), Just(-1.0)]
    }

    fn quaternion() -> impl Strategy<Value = Quaternion> {
        (finite(), finite(), finite(), finite()).prop_map(|(w, x, y, z)| q(w, x, y, z))
    }

    proptest! {
        #[test]
        fn ordering_trichotomy(a in quaternion(), b in quaternion()) {
            let outcomes = [less(a, b), equal(a, b), greater(a, b)];
            prop_assert_eq!(outcomes.iter().filter(|&&o| o).count(), 1);
        }

        #[test]
        fn less_equal_is_less_or_equal(a in quaternion(), b in quaternion()) {
            prop_assert_eq!(less_equal(a, b), less(a, b) || equal(a, b));
        }

        #[test]
        fn total_cmp_agrees_with_partial_ord(a in quaternion(), b in quaternion()) {
            prop_assert_eq!(Some(total_cmp(&a, &b)), a.partial_cmp(&b));
        }
    }
}
