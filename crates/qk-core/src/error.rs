use std::fmt;

/// Caller contract violations. Numeric failures never show up here; they
/// travel through IEEE inf/nan instead.
#[derive(Debug)]
pub enum KernelError {
    /// The view would read or write past the end of its byte buffer.
    OutOfBounds {
        len: usize,
        stride: usize,
        elsize: usize,
        available: usize,
    },
    /// An output view whose elements would overlap each other.
    StrideTooSmall { stride: usize, elsize: usize },
    /// Paired views disagree on the element count.
    LengthMismatch { expected: usize, found: usize },
    /// A reduction was asked to scan zero elements.
    EmptyReduction,
    /// No loop registered under this name and signature.
    UnknownLoop(String),
    /// A type tag that does not name a supported kind.
    UnknownKind(String),
    /// The loop was handed the wrong number of operands.
    Arity { expected: usize, found: usize },
    Json(serde_json::Error),
    InvalidData(String),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::OutOfBounds {
                len,
                stride,
                elsize,
                available,
            } => write!(
                f,
                "view of {len} elements (stride {stride}, elsize {elsize}) exceeds buffer of {available} bytes"
            ),
            KernelError::StrideTooSmall { stride, elsize } => {
                write!(f, "output stride {stride} is smaller than element size {elsize}")
            }
            KernelError::LengthMismatch { expected, found } => {
                write!(f, "length mismatch: expected {expected} elements, found {found}")
            }
            KernelError::EmptyReduction => write!(f, "reduction over zero elements"),
            KernelError::UnknownLoop(name) => write!(f, "no loop registered for {name}"),
            KernelError::UnknownKind(tag) => write!(f, "unknown element kind: {tag}"),
            KernelError::Arity { expected, found } => {
                write!(f, "loop takes {expected} operands, got {found}")
            }
            KernelError::Json(e) => write!(f, "JSON error: {e}"),
            KernelError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for KernelError {}

impl From<serde_json::Error> for KernelError {
    fn from(e: serde_json::Error) -> Self {
        KernelError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, KernelError>;
