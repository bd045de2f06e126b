//! Canonical unit representations and the algebra over them.
//!
//! Every named unit resolves to an ordered list of [`BaseUnitTerm`]s, each
//! tying one SI base quantity to a scale, an additive offset, and an
//! exponent. The list is kept in a canonical order (quantity first, scale
//! second) so that two representations can be compared positionally.
//!
//! A representation is built in two phases:
//! - **expansion**: unit references are multiplied out term by term via
//!   [`CanonicalUnit::expand_reference`]
//! - **canonicalization**: terms are sorted and adjacent terms over the
//!   same quantity are merged via [`CanonicalUnit::canonicalize`]
//!
//! Strict representations keep scale and offset significant: two strict
//! forms are only compatible when they agree on both, and merging never
//! collapses terms that share a scale. Non-strict forms compare dimensions
//! only.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::quantity::BaseQuantity;
use crate::reference::UnitReference;

/// One base-quantity contribution to a canonical representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseUnitTerm {
    /// The SI base quantity this term is measured in.
    pub quantity: BaseQuantity,
    /// Units of this term per one SI base unit (a gram term has scale
    /// 1000: there are 1000 grams in a kilogram).
    pub scale: f64,
    /// Additive offset against the SI base unit, in this term's units.
    pub offset: f64,
    /// Power the base quantity is raised to.
    pub exponent: f64,
}

impl BaseUnitTerm {
    /// Build a term. Usable in `const` tables.
    pub const fn new(quantity: BaseQuantity, scale: f64, exponent: f64, offset: f64) -> Self {
        Self {
            quantity,
            scale,
            offset,
            exponent,
        }
    }
}

/// Affine mapping onto SI base units: `si_value = factor * value + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiConversion {
    pub factor: f64,
    pub offset: f64,
}

impl SiConversion {
    /// Apply the mapping to a value.
    pub fn apply(&self, value: f64) -> f64 {
        self.factor * value + self.offset
    }
}

/// Fully resolved dimensional signature of a named unit.
///
/// Empty signatures are dimensionless. The term list is only guaranteed
/// to be in canonical order after [`canonicalize`](Self::canonicalize)
/// has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalUnit {
    terms: Vec<BaseUnitTerm>,
    strict: bool,
}

impl CanonicalUnit {
    /// Create an empty (dimensionless) representation.
    pub fn new(strict: bool) -> Self {
        Self {
            terms: Vec::new(),
            strict,
        }
    }

    /// Create a representation from an existing term list.
    pub fn from_terms(strict: bool, terms: Vec<BaseUnitTerm>) -> Self {
        Self { terms, strict }
    }

    /// Whether scale and offset are significant for this representation.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The terms, in whatever order they are currently in.
    pub fn terms(&self) -> &[BaseUnitTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Append a term without re-sorting.
    pub fn push_term(&mut self, term: BaseUnitTerm) {
        self.terms.push(term);
    }

    /// Multiply a referenced unit into this representation.
    ///
    /// Every term of `target` is raised to the reference's exponent and
    /// appended. The reference's prefix, multiplier, and offset fold into
    /// the first appended term only; later terms keep their own scale and
    /// offset. Referencing a dimensionless unit contributes nothing, so a
    /// multiplier on such a reference is dropped.
    pub fn expand_reference(&mut self, reference: &UnitReference, target: &CanonicalUnit) {
        for (i, term) in target.terms.iter().enumerate() {
            let exponent = reference.exponent * term.exponent;
            let (scale, offset) = if i == 0 {
                (
                    reference.multiplier
                        * (10f64.powi(-reference.prefix) * term.scale).powf(reference.exponent),
                    reference.offset + term.offset,
                )
            } else {
                (term.scale.powf(reference.exponent), term.offset)
            };
            self.terms.push(BaseUnitTerm {
                quantity: term.quantity,
                scale,
                offset,
                exponent,
            });
        }
    }

    /// Sort terms and merge adjacent terms over the same quantity.
    ///
    /// Terms order by quantity, then by ascending scale. A merge keeps the
    /// scale product and the exponent sum and clears the offset. Strict
    /// representations never merge terms that agree on scale, so repeated
    /// occurrences of the same scaled unit stay visible to strict
    /// comparison. Merged terms are kept even when their exponents sum to
    /// zero.
    pub fn canonicalize(&mut self) {
        let strict = self.strict;
        self.terms.sort_by(|a, b| {
            a.quantity.cmp(&b.quantity).then_with(|| {
                a.scale
                    .partial_cmp(&b.scale)
                    .unwrap_or(Ordering::Equal)
            })
        });
        let mut merged: Vec<BaseUnitTerm> = Vec::with_capacity(self.terms.len());
        for term in self.terms.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.quantity == term.quantity && (!strict || last.scale != term.scale) {
                    last.scale *= term.scale;
                    last.exponent += term.exponent;
                    last.offset = 0.0;
                    continue;
                }
            }
            merged.push(term);
        }
        self.terms = merged;
    }

    /// Positional compatibility between two canonicalized representations.
    ///
    /// Lists must have equal length, and each slot must agree on quantity
    /// and exponent. When this representation is strict, slots must also
    /// agree on scale and offset.
    pub fn compatible_with(&self, other: &CanonicalUnit) -> bool {
        if self.terms.len() != other.terms.len() {
            return false;
        }
        for (a, b) in self.terms.iter().zip(other.terms.iter()) {
            if a.quantity != b.quantity || a.exponent != b.exponent {
                return false;
            }
            if self.strict && (a.scale != b.scale || a.offset != b.offset) {
                return false;
            }
        }
        true
    }

    /// The affine mapping from this unit onto SI base units.
    ///
    /// A single term with exponent one maps affinely, carrying its offset
    /// across. Every other shape maps linearly through the reciprocal of
    /// the scale product; offsets on compound units are meaningless and
    /// are dropped.
    pub fn si_conversion(&self) -> SiConversion {
        if self.terms.len() == 1 && self.terms[0].exponent == 1.0 {
            let t = &self.terms[0];
            return SiConversion {
                factor: 1.0 / t.scale,
                offset: -t.offset / t.scale,
            };
        }
        let product: f64 = self.terms.iter().map(|t| t.scale).product();
        SiConversion {
            factor: 1.0 / product,
            offset: 0.0,
        }
    }

    /// The affine mapping from this unit onto `other`.
    ///
    /// Both mappings route through SI, so the result is exact for
    /// compatible units and meaningless for incompatible ones.
    pub fn conversion_to(&self, other: &CanonicalUnit) -> SiConversion {
        let from = self.si_conversion();
        let to = other.si_conversion();
        let factor = from.factor / to.factor;
        SiConversion {
            factor,
            offset: from.offset - factor * to.offset,
        }
    }
}

impl fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "dimensionless");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if term.scale != 1.0 {
                write!(f, "{}*", term.scale)?;
            }
            write!(f, "{}", term.quantity.symbol())?;
            if term.exponent != 1.0 {
                write!(f, "^{}", term.exponent)?;
            }
        }
        Ok(())
    }
}
