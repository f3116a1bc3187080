//! Index-finding reductions over a strided run.
//!
//! NaN is maximal *and* minimal here: the first NaN-holding element wins
//! and ends the scan. The predicates in [`crate::ordering`] answer `false`
//! for NaN instead, so these scans look for NaN themselves.

use crate::error::{KernelError, Result};
use crate::ordering::{greater_equal, isnan, less_equal, nonzero};
use crate::quaternion::Quaternion;
use crate::view::StridedView;

/// Index of the maximal element.
pub fn argmax(view: &StridedView<'_, Quaternion>) -> Result<usize> {
    scan(view, |candidate, best| !less_equal(candidate, best))
}

/// Index of the minimal element.
pub fn argmin(view: &StridedView<'_, Quaternion>) -> Result<usize> {
    scan(view, |candidate, best| !greater_equal(candidate, best))
}

/// Replace the running best whenever `replaces(candidate, best)` holds. The
/// negated comparison is what lets NaN through: every comparison against
/// NaN is false, so its negation is true.
fn scan(
    view: &StridedView<'_, Quaternion>,
    replaces: impl Fn(Quaternion, Quaternion) -> bool,
) -> Result<usize> {
    if view.is_empty() {
        return Err(KernelError::EmptyReduction);
    }

    let mut best = view.get(0);
    let mut best_index = 0;
    if isnan(best) {
        return Ok(0);
    }

    for i in 1..view.len() {
        let candidate = view.get(i);
        if replaces(candidate, best) {
            best = candidate;
            best_index = i;
            if isnan(best) {
                break;
            }
        }
    }
    Ok(best_index)
}

/// Number of elements not equal to the zero quaternion.
pub fn count_nonzero(view: &StridedView<'_, Quaternion>) -> usize {
    view.iter().filter(|&q| nonzero(q)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(w: f64) -> Quaternion {
        Quaternion::from_scalar(w)
    }

    fn nan() -> Quaternion {
        Quaternion::new(f64::NAN, 0.0, 0.0, 0.0)
    }

    fn argmax_of(values: &[Quaternion]) -> Result<usize> {
        argmax(&StridedView::from_slice(values))
    }

    #[test]
    fn test_argmax_basic() {
        assert_eq!(argmax_of(&[s(1.0), s(5.0), s(3.0)]).unwrap(), 1);
        assert_eq!(argmax_of(&[s(1.0)]).unwrap(), 0);
    }

    #[test]
    fn test_argmax_ties_keep_first() {
        assert_eq!(argmax_of(&[s(2.0), s(7.0), s(7.0)]).unwrap(), 1);
    }

    #[test]
    fn test_argmax_lexicographic() {
        let values = [
            Quaternion::new(1.0, 2.0, 0.0, 0.0),
            Quaternion::new(1.0, 3.0, -5.0, 0.0),
            Quaternion::new(1.0, 3.0, -6.0, 9.0),
        ];
        assert_eq!(argmax_of(&values).unwrap(), 1);
    }

    #[test]
    fn test_argmax_nan_poisons() {
        assert_eq!(argmax_of(&[s(1.0), nan(), s(5.0)]).unwrap(), 1);
        assert_eq!(argmax_of(&[nan(), s(9.0)]).unwrap(), 0);
        assert_eq!(argmax_of(&[s(1.0), nan(), nan()]).unwrap(), 1);
    }

    #[test]
    fn test_argmax_nan_in_later_component() {
        let n = Quaternion::new(1.0, 0.0, f64::NAN, 0.0);
        assert_eq!(argmax_of(&[s(3.0), n, s(4.0)]).unwrap(), 1);
    }

    #[test]
    fn test_argmax_empty() {
        assert!(matches!(argmax_of(&[]), Err(KernelError::EmptyReduction)));
    }

    #[test]
    fn test_argmax_strided() {
        let values = [s(1.0), s(100.0), s(3.0), s(100.0), s(2.0)];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let view = StridedView::<Quaternion>::new(bytes, 64, 3).unwrap();
        assert_eq!(argmax(&view).unwrap(), 1);
    }

    #[test]
    fn test_argmin() {
        let values = [s(4.0), s(-1.0), s(2.0), s(-1.0)];
        assert_eq!(argmin(&StridedView::from_slice(&values)).unwrap(), 1);
        let values = [s(4.0), nan(), s(-10.0)];
        assert_eq!(argmin(&StridedView::from_slice(&values)).unwrap(), 1);
    }

    #[test]
    fn test_count_nonzero() {
        let values = [s(0.0), s(-0.0), s(2.0), nan(), Quaternion::new(0.0, 0.0, 0.0, 1.0)];
        assert_eq!(count_nonzero(&StridedView::from_slice(&values)), 3);
    }
}
