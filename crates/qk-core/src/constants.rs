/// Size of one quaternion element in bytes (4 × f64)
pub const ELEMENT_SIZE: usize = 32;

/// Natural alignment of a quaternion element
pub const ELEMENT_ALIGNMENT: usize = 8;

/// Size of one component in bytes
pub const COMPONENT_SIZE: usize = 8;

/// Array-protocol kind character
pub const KIND_CHAR: char = 'q';

/// Array-protocol type character
pub const TYPE_CHAR: char = 'j';

/// Stable element-kind name
pub const TYPE_NAME: &str = "quaternion";

/// Significant digits per component in the textual form (`%.15g`)
pub const DISPLAY_PRECISION: usize = 15;

/// Initial accumulator for the component hash
pub const HASH_SEED: i64 = 0x456789;

/// Multiplier applied to the accumulator before each component is mixed in
pub const HASH_MULTIPLIER: i64 = 10_000_004;
