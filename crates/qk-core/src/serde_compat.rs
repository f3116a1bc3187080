//! JSON serde for the quaternion array wire format.
//!
//! A document looks like
//! `{"version": "0.1.0", "dtype": "quaternion", "data": [[w, x, y, z], ...]}`.
//! JSON has no spelling for NaN or infinity, so those components travel as
//! the strings `"nan"`, `"inf"` and `"-inf"`. A bare `[[w, x, y, z], ...]`
//! array is accepted on import.

use serde::{Deserialize, Serialize};

use crate::constants::TYPE_NAME;
use crate::error::{KernelError, Result};
use crate::quaternion::Quaternion;

pub const CURRENT_VERSION: &str = "0.1.0";

// --- Wire format types ---

/// One component: a JSON number, or a string for the non-finite values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum WireFloat {
    Number(f64),
    Text(String),
}

impl WireFloat {
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            WireFloat::Text("nan".to_string())
        } else if v == f64::INFINITY {
            WireFloat::Text("inf".to_string())
        } else if v == f64::NEG_INFINITY {
            WireFloat::Text("-inf".to_string())
        } else {
            WireFloat::Number(v)
        }
    }

    pub fn to_f64(&self) -> Result<f64> {
        match self {
            WireFloat::Number(v) => Ok(*v),
            WireFloat::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "nan" | "-nan" | "+nan" => Ok(f64::NAN),
                "inf" | "+inf" | "infinity" | "+infinity" => Ok(f64::INFINITY),
                "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                _ => Err(KernelError::InvalidData(format!(
                    "not a number: {s:?}"
                ))),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WireArray {
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_dtype")]
    pub dtype: String,
    pub data: Vec<[WireFloat; 4]>,
}

fn default_dtype() -> String {
    TYPE_NAME.to_string()
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum WireInput {
    Document(WireArray),
    Bare(Vec<[WireFloat; 4]>),
}

// --- Conversion ---

impl WireArray {
    pub fn from_values(values: &[Quaternion]) -> Self {
        WireArray {
            version: CURRENT_VERSION.to_string(),
            dtype: TYPE_NAME.to_string(),
            data: values
                .iter()
                .map(|q| q.to_array().map(WireFloat::from_f64))
                .collect(),
        }
    }

    pub fn into_values(self) -> Result<Vec<Quaternion>> {
        if self.dtype != TYPE_NAME {
            return Err(KernelError::InvalidData(format!(
                "expected dtype {TYPE_NAME:?}, found {:?}",
                self.dtype
            )));
        }
        wire_to_values(&self.data)
    }
}

fn wire_to_values(data: &[[WireFloat; 4]]) -> Result<Vec<Quaternion>> {
    data.iter()
        .map(|[w, x, y, z]| {
            Ok(Quaternion::new(
                w.to_f64()?,
                x.to_f64()?,
                y.to_f64()?,
                z.to_f64()?,
            ))
        })
        .collect()
}

/// Parse a wire document (or bare array) into quaternions.
pub fn import_json(json: &str) -> Result<Vec<Quaternion>> {
    match serde_json::from_str::<WireInput>(json) {
        Ok(WireInput::Document(wire)) => wire.into_values(),
        Ok(WireInput::Bare(data)) => wire_to_values(&data),
        // Untagged errors are opaque; the document parse reports the field.
        Err(_) => Ok(serde_json::from_str::<WireArray>(json)?.into_values()?),
    }
}

/// Serialize quaternions to the wire format.
pub fn export_json(values: &[Quaternion]) -> Result<String> {
    let wire = WireArray::from_values(values);
    Ok(serde_json::to_string_pretty(&wire)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn same_bits(a: &[Quaternion], b: &[Quaternion]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(p, q)| {
                p.to_array()
                    .iter()
                    .zip(q.to_array())
                    .all(|(x, y)| x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan()))
            })
    }

    #[test]
    fn test_roundtrip() {
        let mut rng = rng();
        let values: Vec<Quaternion> = (0..16).map(|_| Quaternion::random(&mut rng)).collect();
        let json = export_json(&values).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(values.len(), back.len());
        for (p, q) in values.iter().zip(&back) {
            for (a, b) in p.to_array().into_iter().zip(q.to_array()) {
                approx::assert_relative_eq!(a, b, max_relative = 1e-15);
            }
        }
    }

    #[test]
    fn test_non_finite_components() {
        let values = vec![Quaternion::new(f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0)];
        let json = export_json(&values).unwrap();
        assert!(json.contains("\"nan\""));
        assert!(json.contains("\"inf\""));
        assert!(json.contains("\"-inf\""));
        let back = import_json(&json).unwrap();
        assert!(same_bits(&values, &back));
    }

    #[test]
    fn test_version_and_dtype_fields() {
        let json = export_json(&[Quaternion::one()]).unwrap();
        let wire: WireArray = serde_json::from_str(&json).unwrap();
        assert_eq!(wire.version, CURRENT_VERSION);
        assert_eq!(wire.dtype, "quaternion");
    }

    #[test]
    fn test_bare_array() {
        let values = import_json("[[1, 2, 3, 4], [0.5, \"NaN\", 0, -1]]").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], Quaternion::new(1.0, 2.0, 3.0, 4.0));
        assert!(values[1].x.is_nan());
        assert_eq!(values[1].z, -1.0);
    }

    #[test]
    fn test_missing_version_defaults() {
        let values = import_json(r#"{"data": [[1, 0, 0, 0]]}"#).unwrap();
        assert_eq!(values, vec![Quaternion::one()]);
    }

    #[test]
    fn test_wrong_dtype_rejected() {
        let err = import_json(r#"{"version": "0.1.0", "dtype": "float64", "data": []}"#).unwrap_err();
        assert!(matches!(err, KernelError::InvalidData(_)));
    }

    #[test]
    fn test_bad_component_text_rejected() {
        let err = import_json(r#"[[1, "one", 0, 0]]"#).unwrap_err();
        assert!(matches!(err, KernelError::InvalidData(_)));
    }

    #[test]
    fn test_wrong_arity_rejected() {
        assert!(matches!(
            import_json("[[1, 2, 3]]"),
            Err(KernelError::Json(_))
        ));
        assert!(import_json("not json").is_err());
    }
}
