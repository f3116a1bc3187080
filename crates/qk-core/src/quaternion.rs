use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{DISPLAY_PRECISION, HASH_MULTIPLIER, HASH_SEED};
use crate::ordering;

/// Quaternion element: four IEEE-754 doubles `(w, x, y, z)`.
///
/// `w` is the real (scalar) part and `(x, y, z)` the vector part. Layout is
/// `#[repr(C)]`, 32 bytes, 8-byte aligned, so a contiguous `[Quaternion]` is
/// byte-compatible with a `[f64]` of four times the length.
///
/// Every operation returns a new value. Equality is component-wise IEEE
/// equality: a quaternion holding a NaN is never equal to anything, itself
/// included.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Pod, Zeroable)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The all-zero quaternion.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// The multiplicative identity (1, 0, 0, 0).
    pub const fn one() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Purely real quaternion `(s, 0, 0, 0)`.
    pub const fn from_scalar(s: f64) -> Self {
        Self::new(s, 0.0, 0.0, 0.0)
    }

    pub const fn from_array(arr: [f64; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    pub const fn to_array(self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    // --- Component accessors ---

    /// Alias for `w`.
    pub const fn real(self) -> f64 {
        self.w
    }

    /// The vector part as `[x, y, z]`.
    pub const fn imag(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// All four components as `[w, x, y, z]`.
    pub const fn components(self) -> [f64; 4] {
        self.to_array()
    }

    // --- Algebra ---

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.w + rhs.w, self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn subtract(self, rhs: Self) -> Self {
        Self::new(self.w - rhs.w, self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    /// Hamilton product. Associative, not commutative.
    pub fn multiply(self, rhs: Self) -> Self {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }

    pub fn multiply_scalar(self, s: f64) -> Self {
        Self::new(s * self.w, s * self.x, s * self.y, s * self.z)
    }

    /// `self * conjugate(rhs) / |rhs|²`. Dividing by the zero quaternion
    /// yields inf/nan components, like float division by zero.
    pub fn divide(self, rhs: Self) -> Self {
        self.multiply(rhs.conjugate())
            .multiply_scalar(1.0 / rhs.norm_squared())
    }

    pub fn divide_scalar(self, s: f64) -> Self {
        self.multiply_scalar(1.0 / s)
    }

    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn negative(self) -> Self {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }

    pub fn positive(self) -> Self {
        self
    }

    /// Squared Euclidean norm `w² + x² + y² + z²`.
    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm. Zero only for the zero quaternion.
    pub fn absolute(self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// 4D dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Multiplicative inverse `conjugate(q) / |q|²`.
    pub fn inverse(self) -> Self {
        self.conjugate().multiply_scalar(1.0 / self.norm_squared())
    }

    /// `q / |q|`. The zero quaternion normalizes to NaN components.
    pub fn normalized(self) -> Self {
        self.divide_scalar(self.absolute())
    }

    /// Natural logarithm.
    ///
    /// For a purely real argument the vector direction is undefined; the
    /// branch is pinned to the x axis: `log(w, 0, 0, 0)` is `(ln w, 0, 0, 0)`
    /// for `w > 0`, `(ln |w|, π, 0, 0)` for `w < 0` and `(-inf, 0, 0, 0)` at
    /// the origin.
    pub fn log(self) -> Self {
        let vnorm = vector_norm(self);
        let ln_abs = self.absolute().ln();

        if vnorm == 0.0 {
            if self.w < 0.0 {
                return Self::new(ln_abs, std::f64::consts::PI, 0.0, 0.0);
            }
            return Self::new(ln_abs, 0.0, 0.0, 0.0);
        }

        let angle = vnorm.atan2(self.w);
        let f = angle / vnorm;
        Self::new(ln_abs, f * self.x, f * self.y, f * self.z)
    }

    /// Exponential `e^w (cos n + sinc(n) v)` with `n = |v|`.
    pub fn exp(self) -> Self {
        let vnorm = vector_norm(self);
        let ew = self.w.exp();
        let f = ew * sinc(vnorm);
        Self::new(ew * vnorm.cos(), f * self.x, f * self.y, f * self.z)
    }

    /// `exp(log(self) * exponent)`.
    ///
    /// A zero base skips the log and follows real `pow` on the exponent's
    /// real part:
    ///
    /// - `0^0` is one.
    /// - A positive real part gives zero.
    /// - A negative real part gives `(inf, 0, 0, 0)`.
    /// - A NaN or purely vector exponent gives NaN.
    ///
    /// For a real exponent this matches [`Self::power_scalar`].
    pub fn power(self, exponent: Self) -> Self {
        if !ordering::nonzero(self) {
            return zero_base_power(exponent);
        }
        self.log().multiply(exponent).exp()
    }

    /// `exp(log(self) * s)`, with the zero-base rule of [`Self::power`].
    pub fn power_scalar(self, s: f64) -> Self {
        if !ordering::nonzero(self) {
            return zero_base_power(Self::from_scalar(s));
        }
        self.log().multiply_scalar(s).exp()
    }

    /// Component-wise `copysign`: magnitudes from `self`, signs from `sign`.
    pub fn copysign(self, sign: Self) -> Self {
        Self::new(
            self.w.copysign(sign.w),
            self.x.copysign(sign.x),
            self.y.copysign(sign.y),
            self.z.copysign(sign.z),
        )
    }

    /// Uniform random unit quaternion on S³ using Shoemake's method.
    pub fn random(rng: &mut impl Rng) -> Self {
        let s1: f64 = rng.random();
        let t1 = std::f64::consts::TAU * rng.random::<f64>();
        let t2 = std::f64::consts::TAU * rng.random::<f64>();

        let r1 = (1.0 - s1).sqrt();
        let r2 = s1.sqrt();

        Self::new(r1 * t1.sin(), r1 * t1.cos(), r2 * t2.sin(), r2 * t2.cos())
    }
}

/// `0^e`, following real `pow` on the real part of `e`.
fn zero_base_power(exponent: Quaternion) -> Quaternion {
    if ordering::isnan(exponent) {
        Quaternion::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    } else if !ordering::nonzero(exponent) {
        Quaternion::one()
    } else if exponent.w > 0.0 {
        Quaternion::zero()
    } else if exponent.w < 0.0 {
        Quaternion::new(f64::INFINITY, 0.0, 0.0, 0.0)
    } else {
        Quaternion::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    }
}

fn vector_norm(q: Quaternion) -> f64 {
    (q.x * q.x + q.y * q.y + q.z * q.z).sqrt()
}

/// `sin(n)/n` with the removable singularity at zero filled in.
fn sinc(n: f64) -> f64 {
    if n == 0.0 { 1.0 } else { n.sin() / n }
}

// ---------------------------------------------------------------------------
// Comparison, hashing, text
// ---------------------------------------------------------------------------

impl PartialEq for Quaternion {
    fn eq(&self, other: &Self) -> bool {
        ordering::equal(*self, *other)
    }
}

/// Lexicographic `(w, x, y, z)` order. `None` whenever either side holds a
/// NaN.
impl PartialOrd for Quaternion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if ordering::less(*self, *other) {
            Some(Ordering::Less)
        } else if ordering::less(*other, *self) {
            Some(Ordering::Greater)
        } else if ordering::equal(*self, *other) {
            Some(Ordering::Equal)
        } else {
            None
        }
    }
}

/// Deterministic component hash consistent with [`ordering::equal`].
///
/// `-0.0` is folded onto `0.0` because the two compare equal. A result of
/// `-1` is remapped to `-2` so the value can double as a host hash, where
/// `-1` signals failure.
pub fn quaternion_hash(q: Quaternion) -> i64 {
    let mut value = HASH_SEED;
    for c in q.to_array() {
        value = HASH_MULTIPLIER.wrapping_mul(value) ^ component_hash(c);
    }
    if value == -1 { -2 } else { value }
}

fn component_hash(c: f64) -> i64 {
    let c = if c == 0.0 { 0.0 } else { c };
    c.to_bits() as i64
}

impl Hash for Quaternion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(quaternion_hash(*self));
    }
}

/// Canonical textual form `quaternion(w, x, y, z)`, each component with 15
/// significant digits in `%g` style.
impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "quaternion({}, {}, {}, {})",
            format_g(self.w, DISPLAY_PRECISION),
            format_g(self.x, DISPLAY_PRECISION),
            format_g(self.y, DISPLAY_PRECISION),
            format_g(self.z, DISPLAY_PRECISION),
        )
    }
}

/// Format `v` like C's `%.{precision}g`.
pub fn format_g(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exp.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        strip_trailing_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn strip_trailing_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// ---------------------------------------------------------------------------
// Operator sugar
// ---------------------------------------------------------------------------

impl Add for Quaternion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Quaternion::add(self, rhs)
    }
}

impl Sub for Quaternion {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.subtract(rhs)
    }
}

/// Hamilton product (quaternion multiplication).
impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(rhs)
    }
}

impl Mul<f64> for Quaternion {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.multiply_scalar(rhs)
    }
}

impl Mul<Quaternion> for f64 {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        rhs.multiply_scalar(self)
    }
}

impl Div for Quaternion {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self.divide(rhs)
    }
}

impl Div<f64> for Quaternion {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        self.divide_scalar(rhs)
    }
}

impl Neg for Quaternion {
    type Output = Self;

    fn neg(self) -> Self {
        self.negative()
    }
}

impl From<[f64; 4]> for Quaternion {
    fn from(arr: [f64; 4]) -> Self {
        Self::from_array(arr)
    }
}

impl From<f64> for Quaternion {
    fn from(s: f64) -> Self {
        Self::from_scalar(s)
    }
}
