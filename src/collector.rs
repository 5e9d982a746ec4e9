//! Partial bit observations and their unification.
//!
//! A decoding strategy discovers a parameter's bits piecemeal: one field here,
//! another there, repeated frames re-asserting the same bits. A
//! [`BitwiseParameter`] is one such partial observation (a value plus a mask
//! of asserted bits); the [`ParameterCollector`] merges observations made
//! under the same name during a single decoding attempt and fails the whole
//! attempt on the first disagreement. The finalized result is a plain
//! [`NameBinding`] of fully resolved values.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A partially known integer: a value together with a bitmask of which bits
/// are asserted. Bits outside the mask are kept at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitwiseParameter {
    value: u64,
    bitmask: u64,
}

impl BitwiseParameter {
    /// A fully known value (all 64 bits asserted).
    pub fn new(value: u64) -> Self {
        BitwiseParameter { value, bitmask: u64::MAX }
    }

    /// A value known in its low `width` bits only.
    pub fn with_width(value: u64, width: u32) -> Self {
        let bitmask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
        BitwiseParameter { value: value & bitmask, bitmask }
    }

    /// A value known on an arbitrary set of bits.
    pub fn with_mask(value: u64, bitmask: u64) -> Self {
        BitwiseParameter { value: value & bitmask, bitmask }
    }

    /// No bits asserted.
    pub fn empty() -> Self {
        BitwiseParameter { value: 0, bitmask: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.bitmask == 0
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn bitmask(&self) -> u64 {
        self.bitmask
    }

    /// True iff the two observations agree on every bit asserted by both.
    pub fn is_consistent(&self, other: &BitwiseParameter) -> bool {
        (self.value ^ other.value) & self.bitmask & other.bitmask == 0
    }

    /// Union of two consistent observations: newly asserted value bits are
    /// OR'd in, masks are OR'd.
    pub fn aggregate(&mut self, other: &BitwiseParameter) {
        self.value |= other.value & other.bitmask;
        self.bitmask |= other.bitmask;
    }
}

impl fmt::Display for BitwiseParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bitmask == u64::MAX {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{}&0x{:x}", self.value, self.bitmask)
        }
    }
}

/// Two observations under the same name disagreed on a mutually asserted bit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conflicting values for parameter {name}: {held} vs {offered}")]
pub struct NameConflict {
    pub name: String,
    pub held: BitwiseParameter,
    pub offered: BitwiseParameter,
}

/// A finalized name-to-value binding, rendered as IRP definitions
/// (`{A=12,B=34}`, names sorted).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameBinding {
    values: BTreeMap<String, u64>,
}

impl NameBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, value: u64) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(name, &value)| (name.as_str(), value))
    }

    /// `{A=12,B=34}` with values rendered in `radix`.
    pub fn to_irp_string(&self, radix: u32) -> String {
        let inner: Vec<String> =
            self.values.iter().map(|(name, &value)| format!("{}={}", name, render_radix(value, radix))).collect();
        format!("{{{}}}", inner.join(","))
    }
}

pub(crate) fn render_radix(value: u64, radix: u32) -> String {
    match radix {
        2 => format!("0b{value:b}"),
        8 => format!("0{value:o}"),
        16 => format!("0x{value:x}"),
        _ => value.to_string(),
    }
}

/// Insertion-ordered name → observation map built during one decoding attempt.
///
/// Plain value semantics: `clone()` yields an independent copy, and every
/// attempt seeds its own collector, so speculative decodings never alias.
#[derive(Debug, Clone, Default)]
pub struct ParameterCollector {
    entries: Vec<(String, BitwiseParameter)>,
}

impl ParameterCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// Merge an observation under `name`. An existing observation must be
    /// consistent with the new one; disagreement aborts the whole attempt.
    pub fn add(&mut self, name: &str, parameter: BitwiseParameter) -> Result<(), NameConflict> {
        match self.position(name) {
            None => {
                self.entries.push((name.to_owned(), parameter));
                Ok(())
            }
            Some(i) => {
                let held = self.entries[i].1;
                if !held.is_consistent(&parameter) {
                    return Err(NameConflict { name: name.to_owned(), held, offered: parameter });
                }
                self.entries[i].1.aggregate(&parameter);
                Ok(())
            }
        }
    }

    /// Replace unconditionally, bypassing the consistency check; for values
    /// authoritative by construction (fixed fields).
    pub fn overwrite(&mut self, name: &str, parameter: BitwiseParameter) {
        match self.position(name) {
            Some(i) => self.entries[i].1 = parameter,
            None => self.entries.push((name.to_owned(), parameter)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BitwiseParameter> {
        self.position(name).map(|i| &self.entries[i].1)
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Binding of every non-empty observation; observations with zero
    /// asserted bits are omitted.
    pub fn finalize(&self) -> NameBinding {
        let mut binding = NameBinding::new();
        for (name, parameter) in &self.entries {
            if !parameter.is_empty() {
                binding.define(name, parameter.value());
            }
        }
        binding
    }

    /// Reconcile this collector's observations against an existing binding:
    /// a name present in both must be bit-consistent (a fully defined prior
    /// value checked against a possibly partial observation), a missing name
    /// is defined.
    pub fn merge_into(&self, binding: &mut NameBinding) -> Result<(), NameConflict> {
        for (name, parameter) in &self.entries {
            if parameter.is_empty() {
                continue;
            }
            match binding.get(name) {
                Some(existing) => {
                    let held = BitwiseParameter::new(existing);
                    if !held.is_consistent(parameter) {
                        return Err(NameConflict { name: name.clone(), held, offered: *parameter });
                    }
                }
                None => binding.define(name, parameter.value()),
            }
        }
        Ok(())
    }
}
