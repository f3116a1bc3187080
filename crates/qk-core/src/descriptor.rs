//! Element descriptor and type tags a host needs to install the quaternion
//! kind next to its native ones.

use std::fmt;

use serde::Serialize;

use crate::constants::{ELEMENT_ALIGNMENT, ELEMENT_SIZE, KIND_CHAR, TYPE_CHAR, TYPE_NAME};

/// Fixed facts about the quaternion element kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub name: &'static str,
    pub kind: char,
    pub type_char: char,
    /// `'='`: stored in native order unless a view says otherwise.
    pub byteorder: char,
    pub elsize: usize,
    pub alignment: usize,
}

pub const QUATERNION_DESCRIPTOR: Descriptor = Descriptor {
    name: TYPE_NAME,
    kind: KIND_CHAR,
    type_char: TYPE_CHAR,
    byteorder: '=',
    elsize: ELEMENT_SIZE,
    alignment: ELEMENT_ALIGNMENT,
};

/// Numeric kinds that can be cast into a quaternion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    /// x87 80-bit extended precision in a 16-byte slot.
    LongDouble,
    /// Pair of `f32`.
    Complex64,
    /// Pair of `f64`.
    Complex128,
    /// Pair of [`ScalarKind::LongDouble`].
    CLongDouble,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 15] = [
        ScalarKind::Bool,
        ScalarKind::Int8,
        ScalarKind::UInt8,
        ScalarKind::Int16,
        ScalarKind::UInt16,
        ScalarKind::Int32,
        ScalarKind::UInt32,
        ScalarKind::Int64,
        ScalarKind::UInt64,
        ScalarKind::Float32,
        ScalarKind::Float64,
        ScalarKind::LongDouble,
        ScalarKind::Complex64,
        ScalarKind::Complex128,
        ScalarKind::CLongDouble,
    ];

    /// Array-protocol type character.
    pub fn code(self) -> char {
        match self {
            ScalarKind::Bool => '?',
            ScalarKind::Int8 => 'b',
            ScalarKind::UInt8 => 'B',
            ScalarKind::Int16 => 'h',
            ScalarKind::UInt16 => 'H',
            ScalarKind::Int32 => 'i',
            ScalarKind::UInt32 => 'I',
            ScalarKind::Int64 => 'q',
            ScalarKind::UInt64 => 'Q',
            ScalarKind::Float32 => 'f',
            ScalarKind::Float64 => 'd',
            ScalarKind::LongDouble => 'g',
            ScalarKind::Complex64 => 'F',
            ScalarKind::Complex128 => 'D',
            ScalarKind::CLongDouble => 'G',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int8 => "int8",
            ScalarKind::UInt8 => "uint8",
            ScalarKind::Int16 => "int16",
            ScalarKind::UInt16 => "uint16",
            ScalarKind::Int32 => "int32",
            ScalarKind::UInt32 => "uint32",
            ScalarKind::Int64 => "int64",
            ScalarKind::UInt64 => "uint64",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 => "float64",
            ScalarKind::LongDouble => "longdouble",
            ScalarKind::Complex64 => "complex64",
            ScalarKind::Complex128 => "complex128",
            ScalarKind::CLongDouble => "clongdouble",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Bytes per element.
    pub fn itemsize(self) -> usize {
        match self {
            ScalarKind::Bool | ScalarKind::Int8 | ScalarKind::UInt8 => 1,
            ScalarKind::Int16 | ScalarKind::UInt16 => 2,
            ScalarKind::Int32 | ScalarKind::UInt32 | ScalarKind::Float32 => 4,
            ScalarKind::Int64 | ScalarKind::UInt64 | ScalarKind::Float64 => 8,
            ScalarKind::Complex64 => 8,
            ScalarKind::LongDouble | ScalarKind::Complex128 => 16,
            ScalarKind::CLongDouble => 32,
        }
    }

    pub fn is_complex(self) -> bool {
        matches!(
            self,
            ScalarKind::Complex64 | ScalarKind::Complex128 | ScalarKind::CLongDouble
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operand type in a loop signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Scalar(ScalarKind),
    Quaternion,
}

impl TypeTag {
    pub const BOOL: TypeTag = TypeTag::Scalar(ScalarKind::Bool);
    pub const DOUBLE: TypeTag = TypeTag::Scalar(ScalarKind::Float64);

    pub fn code(self) -> char {
        match self {
            TypeTag::Scalar(kind) => kind.code(),
            TypeTag::Quaternion => TYPE_CHAR,
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        if code == TYPE_CHAR {
            return Some(TypeTag::Quaternion);
        }
        ScalarKind::from_code(code).map(TypeTag::Scalar)
    }

    pub fn itemsize(self) -> usize {
        match self {
            TypeTag::Scalar(kind) => kind.itemsize(),
            TypeTag::Quaternion => ELEMENT_SIZE,
        }
    }
}

/// How a cast into the quaternion kind may be used by a host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastSafety {
    /// Identity.
    Equivalent,
    /// Allowed when converting arrays, never chosen when promoting a lone
    /// scalar operand.
    ArraysOnly,
}

/// Casts this kernel provides. Every scalar kind flows into a quaternion;
/// nothing flows back out.
pub fn cast_safety(from: TypeTag, to: TypeTag) -> Option<CastSafety> {
    match (from, to) {
        (TypeTag::Quaternion, TypeTag::Quaternion) => Some(CastSafety::Equivalent),
        (TypeTag::Scalar(_), TypeTag::Quaternion) => Some(CastSafety::ArraysOnly),
        (_, TypeTag::Scalar(_)) => None,
    }
}

pub fn can_cast(from: TypeTag, to: TypeTag) -> bool {
    cast_safety(from, to).is_some()
}
