//! Quaternion numeric kernel.
//!
//! A 32-byte `(w, x, y, z)` element of four `f64`s, its algebra and
//! ordering, raw-buffer access in either byte order, casts from every
//! numeric scalar kind, and vectorized loops over strided views that a
//! host array library can install as its per-element entry points.
//!
//! Zero I/O: views borrow caller memory and kernels never allocate.

pub mod cast;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod loops;
pub mod ordering;
pub mod quaternion;
pub mod raw;
pub mod reduce;
pub mod serde_compat;
pub mod ufunc;
pub mod view;

pub use cast::{CLongDouble, CastSource, Complex64, Complex128, LongDouble, cast_into, cast_to_quaternion};
pub use constants::{COMPONENT_SIZE, ELEMENT_ALIGNMENT, ELEMENT_SIZE};
pub use descriptor::{
    CastSafety, Descriptor, QUATERNION_DESCRIPTOR, ScalarKind, TypeTag, can_cast, cast_safety,
};
pub use error::{KernelError, Result};
pub use loops::{LoopEntry, LoopFn, LoopRegistry, Signature};
pub use ordering::total_cmp;
pub use quaternion::{Quaternion, quaternion_hash};
pub use raw::{ByteOrder, Element};
pub use reduce::{argmax, argmin, count_nonzero};
pub use serde_compat::{CURRENT_VERSION, export_json, import_json};
pub use ufunc::{binary_loop, unary_loop};
#[cfg(feature = "rayon")]
pub use ufunc::{par_binary_loop, par_unary_loop};
pub use view::{RawView, RawViewMut, StridedView, StridedViewMut};
