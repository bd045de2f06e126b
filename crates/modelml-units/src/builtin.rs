//! The built-in unit table.
//!
//! 34 reserved names, each deriving from the seven SI base quantities.
//! The table stores raw derivations; [`builtin_forms`] instantiates them
//! as canonicalized representations under a resolver's strictness, which
//! is how every resolver seeds its registry before user units are read.

use crate::canonical::{BaseUnitTerm, CanonicalUnit};
use crate::quantity::BaseQuantity;
use crate::quantity::BaseQuantity::{Ampere, Candela, Kelvin, Kilogram, Metre, Mole, Second};

const fn t(quantity: BaseQuantity, scale: f64, exponent: f64, offset: f64) -> BaseUnitTerm {
    BaseUnitTerm::new(quantity, scale, exponent, offset)
}

/// Reserved unit names and their derivations, sorted by name.
///
/// Scales follow the units-per-base convention, so `gram` carries scale
/// 1000 and `litre` carries scale 1000 under exponent 3 (a cubic
/// decimetre). Both spellings of metre and litre are present.
pub static BUILTIN_UNITS: [(&str, &[BaseUnitTerm]); 34] = [
    ("ampere", &[t(Ampere, 1.0, 1.0, 0.0)]),
    ("becquerel", &[t(Second, 1.0, -1.0, 0.0)]),
    ("candela", &[t(Candela, 1.0, 1.0, 0.0)]),
    ("celsius", &[t(Kelvin, 1.0, 1.0, -273.15)]),
    ("coulomb", &[t(Ampere, 1.0, 1.0, 0.0), t(Second, 1.0, 1.0, 0.0)]),
    ("dimensionless", &[]),
    (
        "farad",
        &[
            t(Metre, 1.0, -2.0, 0.0),
            t(Kilogram, 1.0, -1.0, 0.0),
            t(Second, 1.0, 4.0, 0.0),
            t(Ampere, 1.0, 2.0, 0.0),
        ],
    ),
    ("gram", &[t(Kilogram, 1000.0, 1.0, 0.0)]),
    ("gray", &[t(Metre, 1.0, 2.0, 0.0), t(Second, 1.0, -2.0, 0.0)]),
    (
        "henry",
        &[
            t(Metre, 1.0, 2.0, 0.0),
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -2.0, 0.0),
            t(Ampere, 1.0, -2.0, 0.0),
        ],
    ),
    ("hertz", &[t(Second, 1.0, -1.0, 0.0)]),
    (
        "joule",
        &[
            t(Metre, 1.0, 2.0, 0.0),
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -2.0, 0.0),
        ],
    ),
    ("katal", &[t(Second, 1.0, -1.0, 0.0), t(Mole, 1.0, 1.0, 0.0)]),
    ("kelvin", &[t(Kelvin, 1.0, 1.0, 0.0)]),
    ("kilogram", &[t(Kilogram, 1.0, 1.0, 0.0)]),
    ("liter", &[t(Metre, 1000.0, 3.0, 0.0)]),
    ("litre", &[t(Metre, 1000.0, 3.0, 0.0)]),
    ("lumen", &[t(Candela, 1.0, 1.0, 0.0)]),
    ("lux", &[t(Candela, 1.0, 1.0, 0.0), t(Metre, 1.0, -2.0, 0.0)]),
    ("meter", &[t(Metre, 1.0, 1.0, 0.0)]),
    ("metre", &[t(Metre, 1.0, 1.0, 0.0)]),
    ("mole", &[t(Mole, 1.0, 1.0, 0.0)]),
    (
        "newton",
        &[
            t(Metre, 1.0, 1.0, 0.0),
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -2.0, 0.0),
        ],
    ),
    (
        "ohm",
        &[
            t(Metre, 1.0, 2.0, 0.0),
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -3.0, 0.0),
            t(Ampere, 1.0, -2.0, 0.0),
        ],
    ),
    (
        "pascal",
        &[
            t(Metre, 1.0, -1.0, 0.0),
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -2.0, 0.0),
        ],
    ),
    ("radian", &[]),
    ("second", &[t(Second, 1.0, 1.0, 0.0)]),
    (
        "siemens",
        &[
            t(Metre, 1.0, -2.0, 0.0),
            t(Kilogram, 1.0, -1.0, 0.0),
            t(Second, 1.0, 3.0, 0.0),
            t(Ampere, 1.0, 2.0, 0.0),
        ],
    ),
    ("sievert", &[t(Metre, 1.0, 2.0, 0.0), t(Second, 1.0, -2.0, 0.0)]),
    ("steradian", &[]),
    (
        "tesla",
        &[
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -2.0, 0.0),
            t(Ampere, 1.0, -1.0, 0.0),
        ],
    ),
    (
        "volt",
        &[
            t(Metre, 1.0, 2.0, 0.0),
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -3.0, 0.0),
            t(Ampere, 1.0, -1.0, 0.0),
        ],
    ),
    (
        "watt",
        &[
            t(Metre, 1.0, 2.0, 0.0),
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -3.0, 0.0),
        ],
    ),
    (
        "weber",
        &[
            t(Metre, 1.0, 2.0, 0.0),
            t(Kilogram, 1.0, 1.0, 0.0),
            t(Second, 1.0, -2.0, 0.0),
            t(Ampere, 1.0, -1.0, 0.0),
        ],
    ),
];

/// Whether a name is reserved for a built-in unit. Case-sensitive.
pub fn is_builtin_unit(name: &str) -> bool {
    BUILTIN_UNITS
        .binary_search_by_key(&name, |(n, _)| n)
        .is_ok()
}

/// Instantiate every built-in as a canonicalized representation.
pub(crate) fn builtin_forms(
    strict: bool,
) -> impl Iterator<Item = (&'static str, CanonicalUnit)> {
    BUILTIN_UNITS.iter().map(move |(name, terms)| {
        let mut cu = CanonicalUnit::from_terms(strict, terms.to_vec());
        cu.canonicalize();
        (*name, cu)
    })
}
