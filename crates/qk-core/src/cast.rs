//! One-directional casts from every supported numeric kind into quaternions.
//!
//! Real kinds land in `w`; complex kinds fill `(w, x)` with `(re, im)`.
//! Casts never fail.

use bytemuck::{Pod, Zeroable};

use crate::descriptor::ScalarKind;
use crate::error::Result;
use crate::quaternion::Quaternion;
use crate::raw::{ByteOrder, Element};
use crate::ufunc::unary_loop;
use crate::view::{RawView, StridedView, StridedViewMut};

/// Complex number of two `f32`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Complex64 {
    pub re: f32,
    pub im: f32,
}

/// Complex number of two `f64`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Complex128 {
    pub re: f64,
    pub im: f64,
}

/// x87 80-bit extended-precision value in its 16-byte storage slot.
///
/// Bytes are kept in the little-endian layout x86-64 uses: 64-bit
/// significand (explicit integer bit) first, then the 16-bit sign/exponent
/// word, then six bytes of padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct LongDouble(pub [u8; 16]);

const EXT_BIAS: i32 = 16383;
const EXT_EXP_MAX: i32 = 0x7fff;
const F64_BIAS: i32 = 1023;

impl LongDouble {
    /// Exact widening of an `f64`.
    pub fn from_f64(v: f64) -> Self {
        let bits = v.to_bits();
        let sign = ((bits >> 63) as u16) << 15;
        let exp = ((bits >> 52) & 0x7ff) as i32;
        let frac = bits & ((1u64 << 52) - 1);

        let (ext_exp, significand) = if exp == 0x7ff {
            let payload = if frac == 0 { 0 } else { (frac << 11) | (1 << 62) };
            (EXT_EXP_MAX, (1u64 << 63) | payload)
        } else if exp == 0 {
            if frac == 0 {
                (0, 0)
            } else {
                // Subnormal: value = frac · 2^-1074; normalize the significand.
                let shift = frac.leading_zeros() as i32;
                (EXT_BIAS + 63 - 1074 - shift, frac << shift)
            }
        } else {
            (exp - F64_BIAS + EXT_BIAS, (1u64 << 63) | (frac << 11))
        };

        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&significand.to_le_bytes());
        bytes[8..10].copy_from_slice(&(sign | ext_exp as u16).to_le_bytes());
        Self(bytes)
    }

    /// Nearest `f64`. Values beyond the `f64` range become ±inf or ±0.
    pub fn to_f64(self) -> f64 {
        let mut lo = [0u8; 8];
        lo.copy_from_slice(&self.0[..8]);
        let significand = u64::from_le_bytes(lo);
        let se = u16::from_le_bytes([self.0[8], self.0[9]]);
        let negative = se & 0x8000 != 0;
        let exp = (se & 0x7fff) as i32;

        let magnitude = if exp == EXT_EXP_MAX {
            if significand << 1 == 0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        } else if significand == 0 {
            0.0
        } else {
            // Denormals use the minimum exponent.
            let exp = exp.max(1);
            ldexp(significand as f64, exp - EXT_BIAS - 63)
        };

        if negative { -magnitude } else { magnitude }
    }
}

/// `x · 2^e` without overflowing the intermediate power of two.
fn ldexp(mut x: f64, mut e: i32) -> f64 {
    while e > F64_BIAS {
        x *= pow2(F64_BIAS);
        e -= F64_BIAS;
        if x.is_infinite() {
            return x;
        }
    }
    while e < -1022 {
        x *= pow2(-1022);
        e += 1022;
        if x == 0.0 {
            return x;
        }
    }
    x * pow2(e)
}

/// Exact `2^e` for `e` in the normal exponent range.
fn pow2(e: i32) -> f64 {
    f64::from_bits(((e + F64_BIAS) as u64) << 52)
}

/// Complex pair of [`LongDouble`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CLongDouble {
    pub re: LongDouble,
    pub im: LongDouble,
}

impl Element for Complex64 {
    const SIZE: usize = 8;

    fn read(cell: &[u8], order: ByteOrder) -> Self {
        Self {
            re: f32::read(cell, order),
            im: f32::read(&cell[4..], order),
        }
    }

    fn write(self, cell: &mut [u8], order: ByteOrder) {
        self.re.write(cell, order);
        self.im.write(&mut cell[4..], order);
    }
}

impl Element for Complex128 {
    const SIZE: usize = 16;

    fn read(cell: &[u8], order: ByteOrder) -> Self {
        Self {
            re: f64::read(cell, order),
            im: f64::read(&cell[8..], order),
        }
    }

    fn write(self, cell: &mut [u8], order: ByteOrder) {
        self.re.write(cell, order);
        self.im.write(&mut cell[8..], order);
    }
}

/// The whole 16-byte slot is reversed under a foreign order.
impl Element for LongDouble {
    const SIZE: usize = 16;

    fn read(cell: &[u8], order: ByteOrder) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&cell[..16]);
        if order.is_swapped() {
            bytes.reverse();
        }
        Self(bytes)
    }

    fn write(self, cell: &mut [u8], order: ByteOrder) {
        let cell = &mut cell[..16];
        cell.copy_from_slice(&self.0);
        if order.is_swapped() {
            cell.reverse();
        }
    }
}

impl Element for CLongDouble {
    const SIZE: usize = 32;

    fn read(cell: &[u8], order: ByteOrder) -> Self {
        Self {
            re: LongDouble::read(cell, order),
            im: LongDouble::read(&cell[16..], order),
        }
    }

    fn write(self, cell: &mut [u8], order: ByteOrder) {
        self.re.write(cell, order);
        self.im.write(&mut cell[16..], order);
    }
}

/// A numeric kind with a conversion into [`Quaternion`].
pub trait CastSource: Element {
    const KIND: ScalarKind;

    fn to_quaternion(self) -> Quaternion;
}

macro_rules! impl_cast_real {
    ($($t:ty => $kind:ident),* $(,)?) => {$(
        impl CastSource for $t {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn to_quaternion(self) -> Quaternion {
                Quaternion::from_scalar(self as f64)
            }
        }
    )*};
}

impl_cast_real!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
);

impl CastSource for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn to_quaternion(self) -> Quaternion {
        Quaternion::from_scalar(if self { 1.0 } else { 0.0 })
    }
}

impl CastSource for LongDouble {
    const KIND: ScalarKind = ScalarKind::LongDouble;

    fn to_quaternion(self) -> Quaternion {
        Quaternion::from_scalar(self.to_f64())
    }
}

impl CastSource for Complex64 {
    const KIND: ScalarKind = ScalarKind::Complex64;

    fn to_quaternion(self) -> Quaternion {
        Quaternion::new(self.re as f64, self.im as f64, 0.0, 0.0)
    }
}

impl CastSource for Complex128 {
    const KIND: ScalarKind = ScalarKind::Complex128;

    fn to_quaternion(self) -> Quaternion {
        Quaternion::new(self.re, self.im, 0.0, 0.0)
    }
}

impl CastSource for CLongDouble {
    const KIND: ScalarKind = ScalarKind::CLongDouble;

    fn to_quaternion(self) -> Quaternion {
        Quaternion::new(self.re.to_f64(), self.im.to_f64(), 0.0, 0.0)
    }
}

/// Convert a strided run of `T` into the same number of quaternion slots.
pub fn cast_to_quaternion<T: CastSource>(
    src: &StridedView<'_, T>,
    dst: &mut StridedViewMut<'_, Quaternion>,
) -> Result<()> {
    unary_loop(src, dst, T::to_quaternion)
}

fn cast_raw<T: CastSource>(src: RawView<'_>, dst: &mut StridedViewMut<'_, Quaternion>) -> Result<()> {
    let src = StridedView::<T>::from_raw(src, dst.len())?;
    cast_to_quaternion(&src, dst)
}

/// Cast entry point keyed by source kind: `dst.len()` elements are read
/// from `src`, which is interpreted as `kind`.
pub fn cast_into(
    kind: ScalarKind,
    src: RawView<'_>,
    dst: &mut StridedViewMut<'_, Quaternion>,
) -> Result<()> {
    match kind {
        ScalarKind::Bool => cast_raw::<bool>(src, dst),
        ScalarKind::Int8 => cast_raw::<i8>(src, dst),
        ScalarKind::UInt8 => cast_raw::<u8>(src, dst),
        ScalarKind::Int16 => cast_raw::<i16>(src, dst),
        ScalarKind::UInt16 => cast_raw::<u16>(src, dst),
        ScalarKind::Int32 => cast_raw::<i32>(src, dst),
        ScalarKind::UInt32 => cast_raw::<u32>(src, dst),
        ScalarKind::Int64 => cast_raw::<i64>(src, dst),
        ScalarKind::UInt64 => cast_raw::<u64>(src, dst),
        ScalarKind::Float32 => cast_raw::<f32>(src, dst),
        ScalarKind::Float64 => cast_raw::<f64>(src, dst),
        ScalarKind::LongDouble => cast_raw::<LongDouble>(src, dst),
        ScalarKind::Complex64 => cast_raw::<Complex64>(src, dst),
        ScalarKind::Complex128 => cast_raw::<Complex128>(src, dst),
        ScalarKind::CLongDouble => cast_raw::<CLongDouble>(src, dst),
    }
}
