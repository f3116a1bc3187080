//! Byte-level element access that tolerates foreign byte order and
//! unaligned cells.

use bytemuck::Pod;

use crate::constants::{COMPONENT_SIZE, ELEMENT_SIZE};
use crate::error::{KernelError, Result};
use crate::quaternion::Quaternion;
use crate::view::{StridedView, StridedViewMut};

/// Whether the stored bytes must be swapped to reach native order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    Native,
    Swapped,
}

impl ByteOrder {
    pub fn is_swapped(self) -> bool {
        self == ByteOrder::Swapped
    }

    /// Order flag for data stored little-endian.
    pub fn little_endian() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Native
        } else {
            ByteOrder::Swapped
        }
    }

    /// Order flag for data stored big-endian.
    pub fn big_endian() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Native
        } else {
            ByteOrder::Swapped
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ByteOrder::Native => "native",
            ByteOrder::Swapped => "swapped",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "swapped" | "swap" | "foreign" => ByteOrder::Swapped,
            "little" | "le" => ByteOrder::little_endian(),
            "big" | "be" => ByteOrder::big_endian(),
            _ => ByteOrder::Native,
        }
    }
}

/// A fixed-size value that can be read from and written to a byte cell.
pub trait Element: Copy {
    /// Bytes occupied by one element.
    const SIZE: usize;

    /// Read one element from the start of `cell`. Panics if `cell` is
    /// shorter than [`Element::SIZE`].
    fn read(cell: &[u8], order: ByteOrder) -> Self;

    /// Write one element to the start of `cell`. Panics if `cell` is
    /// shorter than [`Element::SIZE`].
    fn write(self, cell: &mut [u8], order: ByteOrder);
}

macro_rules! impl_element_int {
    ($($t:ty),*) => {$(
        impl Element for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            fn read(cell: &[u8], order: ByteOrder) -> Self {
                let v: $t = bytemuck::pod_read_unaligned(&cell[..Self::SIZE]);
                if order.is_swapped() { v.swap_bytes() } else { v }
            }

            fn write(self, cell: &mut [u8], order: ByteOrder) {
                let v = if order.is_swapped() { self.swap_bytes() } else { self };
                cell[..Self::SIZE].copy_from_slice(&v.to_ne_bytes());
            }
        }
    )*};
}

impl_element_int!(i8, u8, i16, u16, i32, u32, i64, u64);

macro_rules! impl_element_float {
    ($($t:ty),*) => {$(
        impl Element for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            fn read(cell: &[u8], order: ByteOrder) -> Self {
                let v: $t = bytemuck::pod_read_unaligned(&cell[..Self::SIZE]);
                if order.is_swapped() { <$t>::from_bits(v.to_bits().swap_bytes()) } else { v }
            }

            fn write(self, cell: &mut [u8], order: ByteOrder) {
                let v = if order.is_swapped() {
                    <$t>::from_bits(self.to_bits().swap_bytes())
                } else {
                    self
                };
                cell[..Self::SIZE].copy_from_slice(&v.to_ne_bytes());
            }
        }
    )*};
}

impl_element_float!(f32, f64);

/// One byte, nonzero reads as `true`, written as 0 or 1.
impl Element for bool {
    const SIZE: usize = 1;

    fn read(cell: &[u8], _order: ByteOrder) -> Self {
        cell[0] != 0
    }

    fn write(self, cell: &mut [u8], _order: ByteOrder) {
        cell[0] = self as u8;
    }
}

impl Element for Quaternion {
    const SIZE: usize = ELEMENT_SIZE;

    fn read(cell: &[u8], order: ByteOrder) -> Self {
        read(cell, order)
    }

    fn write(self, cell: &mut [u8], order: ByteOrder) {
        write(self, cell, order)
    }
}

/// Read a quaternion from a 32-byte cell.
///
/// A native-order, 8-byte-aligned cell is reinterpreted in place; anything
/// else is copied one component at a time (swapping when asked), keeping
/// the `(w, x, y, z)` component order.
pub fn read(cell: &[u8], order: ByteOrder) -> Quaternion {
    let cell = &cell[..ELEMENT_SIZE];
    if !order.is_swapped()
        && let Ok(q) = bytemuck::try_from_bytes::<Quaternion>(cell)
    {
        return *q;
    }
    Quaternion::new(
        f64::read(&cell[0..], order),
        f64::read(&cell[COMPONENT_SIZE..], order),
        f64::read(&cell[2 * COMPONENT_SIZE..], order),
        f64::read(&cell[3 * COMPONENT_SIZE..], order),
    )
}

/// Write a quaternion into a 32-byte cell. Mirror image of [`read`].
pub fn write(q: Quaternion, cell: &mut [u8], order: ByteOrder) {
    let cell = &mut cell[..ELEMENT_SIZE];
    if !order.is_swapped()
        && let Ok(slot) = bytemuck::try_from_bytes_mut::<Quaternion>(cell)
    {
        *slot = q;
        return;
    }
    for (i, c) in q.to_array().into_iter().enumerate() {
        c.write(&mut cell[i * COMPONENT_SIZE..], order);
    }
}

/// Copy one element between cells, byte-swapping each component when `swap`
/// is set. Never reinterprets, so works on any alignment.
pub fn copyswap(dst: &mut [u8], src: &[u8], swap: bool) {
    let dst = &mut dst[..ELEMENT_SIZE];
    dst.copy_from_slice(&src[..ELEMENT_SIZE]);
    if swap {
        swap_cell(dst);
    }
}

/// Element-by-element copy between two strided runs. Each element is read
/// under the source order and written under the destination order, so the
/// bytes are swapped exactly when the two orders differ.
pub fn copyswapn(dst: &mut StridedViewMut<'_, Quaternion>, src: &StridedView<'_, Quaternion>) -> Result<()> {
    check_len(dst.len(), src.len())?;
    let swap = dst.order() != src.order();
    for i in 0..src.len() {
        copyswap(dst.cell_mut(i), src.cell(i), swap);
    }
    Ok(())
}

/// Read every element of a strided run into `out`.
pub fn read_many<T: Element>(src: &StridedView<'_, T>, out: &mut [T]) -> Result<()> {
    check_len(out.len(), src.len())?;
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = src.get(i);
    }
    Ok(())
}

/// Write every value into the matching slot of a strided run.
pub fn write_many<T: Element>(values: &[T], dst: &mut StridedViewMut<'_, T>) -> Result<()> {
    check_len(dst.len(), values.len())?;
    for (i, &v) in values.iter().enumerate() {
        dst.set(i, v);
    }
    Ok(())
}

/// Broadcast one value into every contiguous slot.
pub fn fill<T: Pod>(value: T, buffer: &mut [T]) {
    buffer.fill(value);
}

/// Broadcast one value into every slot of a strided run.
pub fn fill_strided<T: Element>(value: T, dst: &mut StridedViewMut<'_, T>) {
    for i in 0..dst.len() {
        dst.set(i, value);
    }
}

/// Flip the stored byte order of every element in place and return the
/// view's new order flag.
pub fn swap_in_place(view: &mut StridedViewMut<'_, Quaternion>) -> ByteOrder {
    for i in 0..view.len() {
        swap_cell(view.cell_mut(i));
    }
    let flipped = match view.order() {
        ByteOrder::Native => ByteOrder::Swapped,
        ByteOrder::Swapped => ByteOrder::Native,
    };
    view.set_order(flipped);
    flipped
}

fn swap_cell(cell: &mut [u8]) {
    for component in cell[..ELEMENT_SIZE].chunks_exact_mut(COMPONENT_SIZE) {
        component.reverse();
    }
}

fn check_len(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(KernelError::LengthMismatch { expected, found });
    }
    Ok(())
}
