//! The seven SI base quantities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the seven SI base physical quantities.
///
/// This fieldless enum is the process-wide singleton set the canonical
/// algebra compares against: identity comparison and value comparison
/// coincide, so sharing is guaranteed by construction. The `Ord` order is
/// the canonical sort order of base-unit terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BaseQuantity {
    /// Electric current.
    Ampere,
    /// Luminous intensity.
    Candela,
    /// Thermodynamic temperature.
    Kelvin,
    /// Mass.
    Kilogram,
    /// Length.
    Metre,
    /// Amount of substance.
    Mole,
    /// Time.
    Second,
}

impl BaseQuantity {
    /// All base quantities, in canonical order.
    pub const ALL: [BaseQuantity; 7] = [
        BaseQuantity::Ampere,
        BaseQuantity::Candela,
        BaseQuantity::Kelvin,
        BaseQuantity::Kilogram,
        BaseQuantity::Metre,
        BaseQuantity::Mole,
        BaseQuantity::Second,
    ];

    /// The SI unit name of this quantity.
    pub fn unit_name(self) -> &'static str {
        match self {
            BaseQuantity::Ampere => "ampere",
            BaseQuantity::Candela => "candela",
            BaseQuantity::Kelvin => "kelvin",
            BaseQuantity::Kilogram => "kilogram",
            BaseQuantity::Metre => "metre",
            BaseQuantity::Mole => "mole",
            BaseQuantity::Second => "second",
        }
    }

    /// The SI unit symbol of this quantity.
    pub fn symbol(self) -> &'static str {
        match self {
            BaseQuantity::Ampere => "A",
            BaseQuantity::Candela => "cd",
            BaseQuantity::Kelvin => "K",
            BaseQuantity::Kilogram => "kg",
            BaseQuantity::Metre => "m",
            BaseQuantity::Mole => "mol",
            BaseQuantity::Second => "s",
        }
    }
}

impl fmt::Display for BaseQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unit_name())
    }
}
