//! Strided buffer views: base bytes, a per-element byte stride, an element
//! count and a byte-order flag. Views borrow; they never own.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::error::{KernelError, Result};
use crate::raw::{ByteOrder, Element};

/// Untyped view handed across the loop-registry boundary. The element count
/// travels separately, as it does in a host's loop call.
#[derive(Clone, Copy, Debug)]
pub struct RawView<'a> {
    pub bytes: &'a [u8],
    pub stride: usize,
    pub order: ByteOrder,
}

/// Mutable counterpart of [`RawView`].
#[derive(Debug)]
pub struct RawViewMut<'a> {
    pub bytes: &'a mut [u8],
    pub stride: usize,
    pub order: ByteOrder,
}

impl<'a> RawView<'a> {
    pub fn new(bytes: &'a [u8], stride: usize) -> Self {
        Self {
            bytes,
            stride,
            order: ByteOrder::Native,
        }
    }

    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }
}

impl<'a> RawViewMut<'a> {
    pub fn new(bytes: &'a mut [u8], stride: usize) -> Self {
        Self {
            bytes,
            stride,
            order: ByteOrder::Native,
        }
    }

    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    /// Reborrow for a shorter lifetime.
    pub fn reborrow(&mut self) -> RawViewMut<'_> {
        RawViewMut {
            bytes: &mut *self.bytes,
            stride: self.stride,
            order: self.order,
        }
    }
}

/// Byte span a strided run of `len` elements needs, or an error if it does
/// not fit in `available` bytes.
fn check_bounds(len: usize, stride: usize, elsize: usize, available: usize) -> Result<()> {
    if len == 0 {
        return Ok(());
    }
    let span = (len - 1)
        .checked_mul(stride)
        .and_then(|s| s.checked_add(elsize));
    match span {
        Some(span) if span <= available => Ok(()),
        _ => Err(KernelError::OutOfBounds {
            len,
            stride,
            elsize,
            available,
        }),
    }
}

/// Read-only strided run of `T` elements.
///
/// A stride of zero is allowed and broadcasts the first cell.
#[derive(Clone, Copy, Debug)]
pub struct StridedView<'a, T> {
    bytes: &'a [u8],
    stride: usize,
    len: usize,
    order: ByteOrder,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Element> StridedView<'a, T> {
    pub fn new(bytes: &'a [u8], stride: usize, len: usize) -> Result<Self> {
        check_bounds(len, stride, T::SIZE, bytes.len())?;
        Ok(Self {
            bytes,
            stride,
            len,
            order: ByteOrder::Native,
            _marker: PhantomData,
        })
    }

    /// Densely packed elements covering the whole buffer.
    pub fn contiguous(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            stride: T::SIZE,
            len: bytes.len() / T::SIZE,
            order: ByteOrder::Native,
            _marker: PhantomData,
        }
    }

    pub fn from_raw(raw: RawView<'a>, len: usize) -> Result<Self> {
        Ok(Self::new(raw.bytes, raw.stride, len)?.with_order(raw.order))
    }

    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// The bytes of element `i`.
    pub fn cell(&self, i: usize) -> &'a [u8] {
        debug_assert!(i < self.len, "index {i} out of range for view of {}", self.len);
        let start = i * self.stride;
        &self.bytes[start..start + T::SIZE]
    }

    pub fn get(&self, i: usize) -> T {
        T::read(self.cell(i), self.order)
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<'a, T: Element + Pod> StridedView<'a, T> {
    /// Contiguous native-order view over a typed slice.
    pub fn from_slice(values: &'a [T]) -> Self {
        Self::contiguous(bytemuck::cast_slice(values))
    }

    /// One value repeated `len` times (stride zero).
    pub fn broadcast(value: &'a T, len: usize) -> Self {
        Self {
            bytes: bytemuck::bytes_of(value),
            stride: 0,
            len,
            order: ByteOrder::Native,
            _marker: PhantomData,
        }
    }
}

/// Writable strided run of `T` elements. The stride must be at least the
/// element size so that no two elements share a byte.
#[derive(Debug)]
pub struct StridedViewMut<'a, T> {
    bytes: &'a mut [u8],
    stride: usize,
    len: usize,
    order: ByteOrder,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Element> StridedViewMut<'a, T> {
    pub fn new(bytes: &'a mut [u8], stride: usize, len: usize) -> Result<Self> {
        if len > 0 && stride < T::SIZE {
            return Err(KernelError::StrideTooSmall {
                stride,
                elsize: T::SIZE,
            });
        }
        check_bounds(len, stride, T::SIZE, bytes.len())?;
        Ok(Self {
            bytes,
            stride,
            len,
            order: ByteOrder::Native,
            _marker: PhantomData,
        })
    }

    pub fn contiguous(bytes: &'a mut [u8]) -> Self {
        let len = bytes.len() / T::SIZE;
        Self {
            bytes,
            stride: T::SIZE,
            len,
            order: ByteOrder::Native,
            _marker: PhantomData,
        }
    }

    pub fn from_raw(raw: RawViewMut<'a>, len: usize) -> Result<Self> {
        let order = raw.order;
        Ok(Self::new(raw.bytes, raw.stride, len)?.with_order(order))
    }

    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn cell_mut(&mut self, i: usize) -> &mut [u8] {
        debug_assert!(i < self.len, "index {i} out of range for view of {}", self.len);
        let start = i * self.stride;
        &mut self.bytes[start..start + T::SIZE]
    }

    pub fn get(&self, i: usize) -> T {
        debug_assert!(i < self.len, "index {i} out of range for view of {}", self.len);
        let start = i * self.stride;
        T::read(&self.bytes[start..start + T::SIZE], self.order)
    }

    pub fn set(&mut self, i: usize, value: T) {
        let order = self.order;
        value.write(self.cell_mut(i), order);
    }

    /// Per-element cells in order; each slice is at least `T::SIZE` long.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let len = self.len;
        // A zero-length view may carry stride 0, which chunks_mut rejects.
        let chunk = self.stride.max(T::SIZE);
        self.bytes.chunks_mut(chunk).take(len)
    }

    /// Read-only view over the same elements.
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            bytes: &*self.bytes,
            stride: self.stride,
            len: self.len,
            order: self.order,
            _marker: PhantomData,
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        (0..self.len).map(|i| self.get(i)).collect()
    }

    #[cfg(feature = "rayon")]
    pub(crate) fn par_cells_mut(
        &mut self,
    ) -> impl rayon::iter::IndexedParallelIterator<Item = &mut [u8]> + '_ {
        use rayon::prelude::*;
        let len = self.len;
        let chunk = self.stride.max(T::SIZE);
        self.bytes.par_chunks_mut(chunk).take(len)
    }
}

impl<'a, T: Element + Pod> StridedViewMut<'a, T> {
    /// Contiguous native-order view over a typed slice.
    pub fn from_slice_mut(values: &'a mut [T]) -> Self {
        Self::contiguous(bytemuck::cast_slice_mut(values))
    }
}
