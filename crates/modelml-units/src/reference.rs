//! Numeric interpretation of `<unit>` reference attributes.

use modelml_document::UnitElement;
use serde::{Deserialize, Serialize};

/// The 20 SI prefix names accepted by the `prefix` attribute, smallest
/// first.
pub const SI_PREFIX_NAMES: [&str; 20] = [
    "yocto", "zepto", "atto", "femto", "pico", "nano", "micro", "milli", "centi", "deci", "deka",
    "hecto", "kilo", "mega", "giga", "tera", "peta", "exa", "zetta", "yotta",
];

/// Power of ten denoted by a named SI prefix.
pub fn si_prefix_exponent(name: &str) -> Option<i32> {
    let exp = match name {
        "yocto" => -24,
        "zepto" => -21,
        "atto" => -18,
        "femto" => -15,
        "pico" => -12,
        "nano" => -9,
        "micro" => -6,
        "milli" => -3,
        "centi" => -2,
        "deci" => -1,
        "deka" => 1,
        "hecto" => 2,
        "kilo" => 3,
        "mega" => 6,
        "giga" => 9,
        "tera" => 12,
        "peta" => 15,
        "exa" => 18,
        "zetta" => 21,
        "yotta" => 24,
        _ => return None,
    };
    Some(exp)
}

/// One unit reference: the numeric attributes of a `<unit>` element.
///
/// Absent attributes take the language defaults (prefix 0, exponent 1,
/// multiplier 1, offset 0); malformed literals fall back to 0 and are
/// reported separately by the grammar walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitReference {
    /// Power-of-ten prefix digits (`milli` is -3).
    pub prefix: i32,
    pub exponent: f64,
    pub multiplier: f64,
    pub offset: f64,
}

impl Default for UnitReference {
    fn default() -> Self {
        Self {
            prefix: 0,
            exponent: 1.0,
            multiplier: 1.0,
            offset: 0.0,
        }
    }
}

impl UnitReference {
    /// Read the numeric attributes of a `<unit>` element.
    pub fn from_element(el: &UnitElement<'_>) -> Self {
        Self {
            prefix: match el.prefix_text() {
                None => 0,
                Some(text) => si_prefix_exponent(text)
                    .unwrap_or_else(|| text.parse::<f64>().unwrap_or(0.0) as i32),
            },
            exponent: parse_or(el.exponent_text(), 1.0),
            multiplier: parse_or(el.multiplier_text(), 1.0),
            offset: parse_or(el.offset_text(), 0.0),
        }
    }
}

fn parse_or(text: Option<&str>, default: f64) -> f64 {
    match text {
        None => default,
        Some(t) => t.parse().unwrap_or(0.0),
    }
}
