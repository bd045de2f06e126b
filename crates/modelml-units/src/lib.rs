//! # ModelML unit engine
//!
//! Dimensional analysis over model unit definitions:
//!
//! - [`quantity`] — the seven SI base quantities
//! - [`canonical`] — canonical representations and the algebra over them
//! - [`builtin`] — the 34 reserved built-in units
//! - [`reference`] — numeric interpretation of `<unit>` attributes
//! - [`scope`] — lexical scope paths and widening lookup keys
//! - [`resolver`] — the dependency-driven resolution engine
//!
//! A [`UnitsResolver`] is built once per model closure and strictness
//! level. Validators typically build two: a strict registry for exact
//! conversions and a non-strict one for dimensional compatibility.

pub mod builtin;
pub mod canonical;
pub mod quantity;
pub mod reference;
pub mod resolver;
pub mod scope;

pub use builtin::{is_builtin_unit, BUILTIN_UNITS};
pub use canonical::{BaseUnitTerm, CanonicalUnit, SiConversion};
pub use quantity::BaseQuantity;
pub use reference::{si_prefix_exponent, UnitReference, SI_PREFIX_NAMES};
pub use resolver::UnitsResolver;
pub use scope::ScopePath;
