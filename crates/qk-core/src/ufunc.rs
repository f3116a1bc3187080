//! Vectorized evaluation: apply a per-element kernel across strided views.
//!
//! Every view advances in lock step, one element per iteration, and the
//! kernel's result lands in the output slot of that iteration. No iteration
//! reads another's output, so the order of iterations never changes the
//! result and the range can be split across threads (see the `rayon`
//! feature).

use crate::error::{KernelError, Result};
use crate::raw::Element;
use crate::view::{StridedView, StridedViewMut};

fn check_len(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(KernelError::LengthMismatch { expected, found });
    }
    Ok(())
}

/// `output[i] = kernel(input[i])` for every `i`.
pub fn unary_loop<I, O>(
    input: &StridedView<'_, I>,
    output: &mut StridedViewMut<'_, O>,
    kernel: impl Fn(I) -> O,
) -> Result<()>
where
    I: Element,
    O: Element,
{
    check_len(output.len(), input.len())?;
    let order = output.order();
    for (i, cell) in output.cells_mut().enumerate() {
        kernel(input.get(i)).write(cell, order);
    }
    Ok(())
}

/// `output[i] = kernel(lhs[i], rhs[i])` for every `i`.
///
/// A quaternion-by-real loop is just `B = f64`; pass
/// [`StridedView::broadcast`] to apply one scalar to every element.
pub fn binary_loop<A, B, O>(
    lhs: &StridedView<'_, A>,
    rhs: &StridedView<'_, B>,
    output: &mut StridedViewMut<'_, O>,
    kernel: impl Fn(A, B) -> O,
) -> Result<()>
where
    A: Element,
    B: Element,
    O: Element,
{
    check_len(output.len(), lhs.len())?;
    check_len(output.len(), rhs.len())?;
    let order = output.order();
    for (i, cell) in output.cells_mut().enumerate() {
        kernel(lhs.get(i), rhs.get(i)).write(cell, order);
    }
    Ok(())
}

/// Parallel [`unary_loop`]: output slots are disjoint, so each worker owns
/// the cells it writes.
#[cfg(feature = "rayon")]
pub fn par_unary_loop<I, O>(
    input: &StridedView<'_, I>,
    output: &mut StridedViewMut<'_, O>,
    kernel: impl Fn(I) -> O + Sync + Send,
) -> Result<()>
where
    I: Element + Sync,
    O: Element,
{
    use rayon::prelude::*;

    check_len(output.len(), input.len())?;
    let order = output.order();
    output
        .par_cells_mut()
        .enumerate()
        .for_each(|(i, cell)| kernel(input.get(i)).write(cell, order));
    Ok(())
}

/// Parallel [`binary_loop`].
#[cfg(feature = "rayon")]
pub fn par_binary_loop<A, B, O>(
    lhs: &StridedView<'_, A>,
    rhs: &StridedView<'_, B>,
    output: &mut StridedViewMut<'_, O>,
    kernel: impl Fn(A, B) -> O + Sync + Send,
) -> Result<()>
where
    A: Element + Sync,
    B: Element + Sync,
    O: Element,
{
    use rayon::prelude::*;

    check_len(output.len(), lhs.len())?;
    check_len(output.len(), rhs.len())?;
    let order = output.order();
    output
        .par_cells_mut()
        .enumerate()
        .for_each(|(i, cell)| kernel(lhs.get(i), rhs.get(i)).write(cell, order));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering;
    use crate::quaternion::Quaternion;
    use crate::raw::ByteOrder;

    fn q(w: f64) -> Quaternion {
        Quaternion::new(w, w + 0.5, -w, 2.0 * w)
    }

    #[test]
    fn test_unary_contiguous() {
        let input = [q(1.0), q(2.0), q(3.0)];
        let mut out = [Quaternion::zero(); 3];
        unary_loop(
            &StridedView::from_slice(&input),
            &mut StridedViewMut::from_slice_mut(&mut out),
            Quaternion::conjugate,
        )
        .unwrap();
        for (a, b) in input.iter().zip(&out) {
            assert_eq!(a.conjugate(), *b);
        }
    }

    #[test]
    fn test_binary_strided_leaves_gaps_untouched() {
        let sentinel = Quaternion::new(-9.0, -9.0, -9.0, -9.0);
        // Every other slot of a six-slot buffer.
        let lhs = [q(1.0), sentinel, q(2.0), sentinel, q(3.0), sentinel];
        let rhs = [q(10.0), sentinel, q(20.0), sentinel, q(30.0), sentinel];
        let mut out = [sentinel; 6];

        let lhs_bytes: &[u8] = bytemuck::cast_slice(&lhs);
        let rhs_bytes: &[u8] = bytemuck::cast_slice(&rhs);
        {
            let out_bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut out);
            binary_loop(
                &StridedView::<Quaternion>::new(lhs_bytes, 64, 3).unwrap(),
                &StridedView::<Quaternion>::new(rhs_bytes, 64, 3).unwrap(),
                &mut StridedViewMut::<Quaternion>::new(out_bytes, 64, 3).unwrap(),
                Quaternion::add,
            )
            .unwrap();
        }

        assert_eq!(out[0], q(1.0) + q(10.0));
        assert_eq!(out[2], q(2.0) + q(20.0));
        assert_eq!(out[4], q(3.0) + q(30.0));
        for i in [1, 3, 5] {
            assert_eq!(out[i], sentinel, "slot {i} was written");
        }
    }

    #[test]
    fn test_scalar_broadcast() {
        let input = [Quaternion::new(1.0, 2.0, 3.0, 4.0); 2];
        let s = 2.0f64;
        let mut out = [Quaternion::zero(); 2];
        binary_loop(
            &StridedView::from_slice(&input),
            &StridedView::broadcast(&s, 2),
            &mut StridedViewMut::from_slice_mut(&mut out),
            Quaternion::multiply_scalar,
        )
        .unwrap();
        assert_eq!(out, [Quaternion::new(2.0, 4.0, 6.0, 8.0); 2]);
    }

    #[test]
    fn test_bool_output() {
        let input = [q(1.0), Quaternion::new(f64::NAN, 0.0, 0.0, 0.0), q(2.0)];
        let mut out = [0u8; 3];
        unary_loop(
            &StridedView::from_slice(&input),
            &mut StridedViewMut::<bool>::new(&mut out, 1, 3).unwrap(),
            ordering::isnan,
        )
        .unwrap();
        assert_eq!(out, [0, 1, 0]);
    }

    #[test]
    fn test_empty_is_noop() {
        let mut out: [Quaternion; 0] = [];
        unary_loop(
            &StridedView::<Quaternion>::new(&[], 32, 0).unwrap(),
            &mut StridedViewMut::from_slice_mut(&mut out),
            Quaternion::exp,
        )
        .unwrap();
    }

    #[test]
    fn test_length_mismatch() {
        let input = [q(1.0); 3];
        let mut out = [Quaternion::zero(); 2];
        let err = unary_loop(
            &StridedView::from_slice(&input),
            &mut StridedViewMut::from_slice_mut(&mut out),
            Quaternion::exp,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            KernelError::LengthMismatch {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_swapped_output() {
        let input = [q(1.0)];
        let mut out = [0u8; 32];
        unary_loop(
            &StridedView::from_slice(&input),
            &mut StridedViewMut::<Quaternion>::new(&mut out, 32, 1)
                .unwrap()
                .with_order(ByteOrder::Swapped),
            Quaternion::negative,
        )
        .unwrap();
        assert_eq!(crate::raw::read(&out, ByteOrder::Swapped), -q(1.0));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_parallel_matches_serial() {
        let input: Vec<Quaternion> = (0..1000).map(|i| q(i as f64 * 0.01)).collect();
        let mut serial = vec![Quaternion::zero(); 1000];
        let mut parallel = vec![Quaternion::zero(); 1000];
        unary_loop(
            &StridedView::from_slice(&input),
            &mut StridedViewMut::from_slice_mut(&mut serial),
            Quaternion::exp,
        )
        .unwrap();
        par_unary_loop(
            &StridedView::from_slice(&input),
            &mut StridedViewMut::from_slice_mut(&mut parallel),
            Quaternion::exp,
        )
        .unwrap();
        assert_eq!(serial, parallel);
    }
}
