//! Named loop registry: the per-op entry points a host installs.
//!
//! Each loop is keyed by its conventional name and a type signature such as
//! `jj->j` (two quaternions in, one out) or `jd->j` (quaternion and double
//! in). The loop itself is type-erased: it takes raw byte views plus an
//! element count, the shape a host's loop call has.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::descriptor::TypeTag;
use crate::error::{KernelError, Result};
use crate::ordering;
use crate::quaternion::Quaternion;
use crate::raw::Element;
use crate::ufunc::{binary_loop, unary_loop};
use crate::view::{RawView, RawViewMut, StridedView, StridedViewMut};

/// Type-erased loop: input views, output view, element count.
pub type LoopFn = fn(&[RawView<'_>], RawViewMut<'_>, usize) -> Result<()>;

/// Operand types of a loop, written `<inputs>-><output>` in type characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub inputs: Vec<TypeTag>,
    pub output: TypeTag,
}

impl Signature {
    pub fn new(inputs: &[TypeTag], output: TypeTag) -> Self {
        Self {
            inputs: inputs.to_vec(),
            output,
        }
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tag in &self.inputs {
            write!(f, "{}", tag.code())?;
        }
        write!(f, "->{}", self.output.code())
    }
}

impl FromStr for Signature {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        let (inputs, output) = s
            .split_once("->")
            .ok_or_else(|| KernelError::UnknownKind(s.to_string()))?;
        let tag = |c: char| TypeTag::from_code(c).ok_or_else(|| KernelError::UnknownKind(c.to_string()));

        let inputs = inputs.trim().chars().map(tag).collect::<Result<Vec<_>>>()?;
        let mut output_chars = output.trim().chars();
        let output = match (output_chars.next(), output_chars.next()) {
            (Some(c), None) => tag(c)?,
            _ => return Err(KernelError::UnknownKind(output.to_string())),
        };
        if inputs.is_empty() {
            return Err(KernelError::UnknownKind(s.to_string()));
        }
        Ok(Self { inputs, output })
    }
}

/// One registered loop.
#[derive(Clone, Debug)]
pub struct LoopEntry {
    pub name: &'static str,
    pub signature: Signature,
    pub func: LoopFn,
}

impl LoopEntry {
    /// Run the loop over `n` elements.
    pub fn call(&self, inputs: &[RawView<'_>], output: RawViewMut<'_>, n: usize) -> Result<()> {
        (self.func)(inputs, output, n)
    }
}

/// Map from `(name, signature)` to loop.
#[derive(Debug, Default)]
pub struct LoopRegistry {
    entries: HashMap<(String, Signature), LoopEntry>,
}

impl LoopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every loop the quaternion kind provides.
    pub fn with_builtin_loops() -> Self {
        use TypeTag::Quaternion as J;
        const B: TypeTag = TypeTag::BOOL;
        const D: TypeTag = TypeTag::DOUBLE;

        let mut registry = Self::new();

        // q -> ?
        registry.register("isnan", Signature::new(&[J], B), |i, o, n| {
            run_unary(i, o, n, ordering::isnan)
        });
        registry.register("isinf", Signature::new(&[J], B), |i, o, n| {
            run_unary(i, o, n, ordering::isinf)
        });
        registry.register("isfinite", Signature::new(&[J], B), |i, o, n| {
            run_unary(i, o, n, ordering::isfinite)
        });

        // q -> d
        registry.register("absolute", Signature::new(&[J], D), |i, o, n| {
            run_unary(i, o, n, Quaternion::absolute)
        });

        // q -> q
        registry.register("log", Signature::new(&[J], J), |i, o, n| {
            run_unary(i, o, n, Quaternion::log)
        });
        registry.register("exp", Signature::new(&[J], J), |i, o, n| {
            run_unary(i, o, n, Quaternion::exp)
        });
        registry.register("negative", Signature::new(&[J], J), |i, o, n| {
            run_unary(i, o, n, Quaternion::negative)
        });
        registry.register("conjugate", Signature::new(&[J], J), |i, o, n| {
            run_unary(i, o, n, Quaternion::conjugate)
        });
        registry.register("positive", Signature::new(&[J], J), |i, o, n| {
            run_unary(i, o, n, Quaternion::positive)
        });

        // qq -> ?
        registry.register("equal", Signature::new(&[J, J], B), |i, o, n| {
            run_binary(i, o, n, ordering::equal)
        });
        registry.register("not_equal", Signature::new(&[J, J], B), |i, o, n| {
            run_binary(i, o, n, ordering::not_equal)
        });
        registry.register("less", Signature::new(&[J, J], B), |i, o, n| {
            run_binary(i, o, n, ordering::less)
        });
        registry.register("less_equal", Signature::new(&[J, J], B), |i, o, n| {
            run_binary(i, o, n, ordering::less_equal)
        });
        registry.register("greater", Signature::new(&[J, J], B), |i, o, n| {
            run_binary(i, o, n, ordering::greater)
        });
        registry.register("greater_equal", Signature::new(&[J, J], B), |i, o, n| {
            run_binary(i, o, n, ordering::greater_equal)
        });

        // qd -> q
        registry.register("multiply", Signature::new(&[J, D], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::multiply_scalar)
        });
        registry.register("divide", Signature::new(&[J, D], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::divide_scalar)
        });
        registry.register("power", Signature::new(&[J, D], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::power_scalar)
        });

        // qq -> q
        registry.register("add", Signature::new(&[J, J], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::add)
        });
        registry.register("subtract", Signature::new(&[J, J], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::subtract)
        });
        registry.register("multiply", Signature::new(&[J, J], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::multiply)
        });
        registry.register("divide", Signature::new(&[J, J], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::divide)
        });
        registry.register("power", Signature::new(&[J, J], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::power)
        });
        registry.register("copysign", Signature::new(&[J, J], J), |i, o, n| {
            run_binary(i, o, n, Quaternion::copysign)
        });

        debug!(loops = registry.len(), "built quaternion loop registry");
        registry
    }

    /// Add or replace a loop.
    pub fn register(&mut self, name: &'static str, signature: Signature, func: LoopFn) {
        let key = (name.to_string(), signature.clone());
        self.entries.insert(
            key,
            LoopEntry {
                name,
                signature,
                func,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup by name and signature.
    pub fn lookup(&self, name: &str, signature: &Signature) -> Result<&LoopEntry> {
        debug!(name, signature = %signature, "loop lookup");
        self.entries
            .get(&(name.to_string(), signature.clone()))
            .ok_or_else(|| KernelError::UnknownLoop(format!("{name} {signature}")))
    }

    /// Find the loop for `name` whose inputs are exactly `inputs`, whatever
    /// its output type.
    pub fn resolve(&self, name: &str, inputs: &[TypeTag]) -> Result<&LoopEntry> {
        debug!(name, arity = inputs.len(), "loop resolve");
        self.entries
            .values()
            .find(|e| e.name == name && e.signature.inputs == inputs)
            .ok_or_else(|| {
                let codes: String = inputs.iter().map(|t| t.code()).collect();
                KernelError::UnknownLoop(format!("{name} {codes}->?"))
            })
    }

    /// Every registered loop, sorted by name then signature.
    pub fn entries(&self) -> Vec<&LoopEntry> {
        let mut entries: Vec<&LoopEntry> = self.entries.values().collect();
        entries.sort_by_cached_key(|e| (e.name, e.signature.to_string()));
        entries
    }

    /// Distinct loop names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.values().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Signatures registered under `name`.
    pub fn signatures(&self, name: &str) -> Vec<&Signature> {
        let mut sigs: Vec<&Signature> = self
            .entries
            .values()
            .filter(|e| e.name == name)
            .map(|e| &e.signature)
            .collect();
        sigs.sort_by_cached_key(|s| s.to_string());
        sigs
    }
}

fn check_arity(inputs: &[RawView<'_>], expected: usize) -> Result<()> {
    if inputs.len() != expected {
        return Err(KernelError::Arity {
            expected,
            found: inputs.len(),
        });
    }
    Ok(())
}

fn run_unary<I: Element, O: Element>(
    inputs: &[RawView<'_>],
    output: RawViewMut<'_>,
    n: usize,
    kernel: fn(I) -> O,
) -> Result<()> {
    check_arity(inputs, 1)?;
    let input = StridedView::<I>::from_raw(inputs[0], n)?;
    let mut output = StridedViewMut::<O>::from_raw(output, n)?;
    unary_loop(&input, &mut output, kernel)
}

fn run_binary<A: Element, B: Element, O: Element>(
    inputs: &[RawView<'_>],
    output: RawViewMut<'_>,
    n: usize,
    kernel: fn(A, B) -> O,
) -> Result<()> {
    check_arity(inputs, 2)?;
    let lhs = StridedView::<A>::from_raw(inputs[0], n)?;
    let rhs = StridedView::<B>::from_raw(inputs[1], n)?;
    let mut output = StridedViewMut::<O>::from_raw(output, n)?;
    binary_loop(&lhs, &rhs, &mut output, kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::ByteOrder;

    fn sig(s: &str) -> Signature {
        s.parse().unwrap()
    }

    #[test]
    fn test_signature_parse_and_display() {
        let s = sig("jd->j");
        assert_eq!(s.inputs, vec![TypeTag::Quaternion, TypeTag::DOUBLE]);
        assert_eq!(s.output, TypeTag::Quaternion);
        assert_eq!(s.arity(), 2);
        assert_eq!(s.to_string(), "jd->j");
        assert_eq!(sig("j->?").to_string(), "j->?");

        assert!("jj".parse::<Signature>().is_err());
        assert!("jx->j".parse::<Signature>().is_err());
        assert!("->j".parse::<Signature>().is_err());
        assert!("j->jj".parse::<Signature>().is_err());
    }

    #[test]
    fn test_builtin_registrations() {
        let registry = LoopRegistry::with_builtin_loops();
        assert_eq!(registry.len(), 24);

        for name in ["isnan", "isinf", "isfinite"] {
            assert_eq!(registry.signatures(name), vec![&sig("j->?")]);
        }
        assert_eq!(registry.signatures("absolute"), vec![&sig("j->d")]);
        for name in ["log", "exp", "negative", "conjugate", "positive"] {
            assert_eq!(registry.signatures(name), vec![&sig("j->j")]);
        }
        for name in ["equal", "not_equal", "less", "less_equal", "greater", "greater_equal"] {
            assert_eq!(registry.signatures(name), vec![&sig("jj->?")]);
        }
        for name in ["multiply", "divide", "power"] {
            assert_eq!(registry.signatures(name), vec![&sig("jd->j"), &sig("jj->j")]);
        }
        for name in ["add", "subtract", "copysign"] {
            assert_eq!(registry.signatures(name), vec![&sig("jj->j")]);
        }
    }

    #[test]
    fn test_names_sorted_and_distinct() {
        let names = LoopRegistry::with_builtin_loops().names();
        assert_eq!(names.len(), 21);
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_call_add_through_raw_views() {
        let registry = LoopRegistry::with_builtin_loops();
        let lhs = [Quaternion::new(1.0, 2.0, 3.0, 4.0), Quaternion::one()];
        let rhs = [Quaternion::new(5.0, 6.0, 7.0, 8.0), Quaternion::one()];
        let mut out = [Quaternion::zero(); 2];

        let entry = registry.lookup("multiply", &sig("jj->j")).unwrap();
        entry
            .call(
                &[
                    RawView::new(bytemuck::cast_slice(&lhs), 32),
                    RawView::new(bytemuck::cast_slice(&rhs), 32),
                ],
                RawViewMut::new(bytemuck::cast_slice_mut(&mut out), 32),
                2,
            )
            .unwrap();
        assert_eq!(out[0], Quaternion::new(-60.0, 12.0, 30.0, 24.0));
        assert_eq!(out[1], Quaternion::one());
    }

    #[test]
    fn test_call_scalar_broadcast() {
        let registry = LoopRegistry::with_builtin_loops();
        let lhs = [Quaternion::new(2.0, 4.0, 6.0, 8.0); 3];
        let scalar = 2.0f64;
        let mut out = [Quaternion::zero(); 3];

        let entry = registry
            .resolve("divide", &[TypeTag::Quaternion, TypeTag::DOUBLE])
            .unwrap();
        entry
            .call(
                &[
                    RawView::new(bytemuck::cast_slice(&lhs), 32),
                    RawView::new(bytemuck::bytes_of(&scalar), 0),
                ],
                RawViewMut::new(bytemuck::cast_slice_mut(&mut out), 32),
                3,
            )
            .unwrap();
        assert_eq!(out, [Quaternion::new(1.0, 2.0, 3.0, 4.0); 3]);
    }

    #[test]
    fn test_call_bool_output() {
        let registry = LoopRegistry::with_builtin_loops();
        let lhs = [Quaternion::one(), Quaternion::from_scalar(3.0)];
        let rhs = [Quaternion::from_scalar(2.0), Quaternion::from_scalar(3.0)];
        let mut out = [7u8; 2];

        registry
            .lookup("less", &sig("jj->?"))
            .unwrap()
            .call(
                &[
                    RawView::new(bytemuck::cast_slice(&lhs), 32),
                    RawView::new(bytemuck::cast_slice(&rhs), 32),
                ],
                RawViewMut::new(&mut out, 1),
                2,
            )
            .unwrap();
        assert_eq!(out, [1, 0]);
    }

    #[test]
    fn test_call_swapped_input() {
        let registry = LoopRegistry::with_builtin_loops();
        let value = Quaternion::new(0.0, 3.0, 0.0, 4.0);
        let mut input = [0u8; 32];
        crate::raw::write(value, &mut input, ByteOrder::Swapped);
        let mut out = [0.0f64; 1];

        registry
            .lookup("absolute", &sig("j->d"))
            .unwrap()
            .call(
                &[RawView::new(&input, 32).with_order(ByteOrder::Swapped)],
                RawViewMut::new(bytemuck::cast_slice_mut(&mut out), 8),
                1,
            )
            .unwrap();
        assert_eq!(out[0], 5.0);
    }

    #[test]
    fn test_unknown_loop() {
        let registry = LoopRegistry::with_builtin_loops();
        assert!(matches!(
            registry.lookup("add", &sig("jd->j")),
            Err(KernelError::UnknownLoop(_))
        ));
        assert!(matches!(
            registry.resolve("sqrt", &[TypeTag::Quaternion]),
            Err(KernelError::UnknownLoop(_))
        ));
    }

    #[test]
    fn test_wrong_arity() {
        let registry = LoopRegistry::with_builtin_loops();
        let lhs = [Quaternion::one()];
        let mut out = [Quaternion::zero()];
        let err = registry
            .lookup("add", &sig("jj->j"))
            .unwrap()
            .call(
                &[RawView::new(bytemuck::cast_slice(&lhs), 32)],
                RawViewMut::new(bytemuck::cast_slice_mut(&mut out), 32),
                1,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            KernelError::Arity {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_out_of_bounds_view() {
        let registry = LoopRegistry::with_builtin_loops();
        let input = [Quaternion::one()];
        let mut out = [Quaternion::zero(); 2];
        let err = registry
            .lookup("exp", &sig("j->j"))
            .unwrap()
            .call(
                &[RawView::new(bytemuck::cast_slice(&input), 32)],
                RawViewMut::new(bytemuck::cast_slice_mut(&mut out), 32),
                2,
            )
            .unwrap_err();
        assert!(matches!(err, KernelError::OutOfBounds { .. }));
    }
}
