//! Literal attribute syntax checks.
//!
//! Pure functions over the attribute value; each returns every finding as
//! message text and leaves anchoring to the walker.

use modelml_document::ModelVersion;
use modelml_units::SI_PREFIX_NAMES;

use super::ContentRule;

const IDENT_MUST_CONTAIN_LETTER: &str =
    "A valid ModelML identifier must contain at least one letter (section 2.4.1)";
const IDENT_MUST_NOT_START_WITH_NUMBER: &str =
    "A valid ModelML identifier must not start with a number (section 2.4.1)";
const IDENT_INVALID_CHARACTER: &str =
    "A valid ModelML identifier must only contain alphanumeric characters from \
     the US-ASCII character set and the underscore character (section 2.4.1)";
const INVALID_REAL_NUMBER: &str =
    "Expected a real number, but didn't get one in a valid format";
const BASE_UNITS_MESSAGE: &str =
    "If present, the value of the base_units attribute MUST be \"yes\" or \"no\" \
     (section 5.4.1.3)";
const INTERFACE_MESSAGE: &str =
    "If present, the value of the public_interface / private_interface attribute \
     MUST be \"in\", \"out\", or \"none\" (section 3.4.3.4 / 3.4.3.5)";
const INITIAL_VALUE_MESSAGE: &str =
    "If present, the value of the initial_value attribute MAY be a real number \
     or the value of the name attribute of a <variable> element declared in the \
     current component (section 3.4.3.7)";
const PREFIX_MESSAGE: &str =
    "If present, the value of the prefix attribute MUST be an integer or a name \
     taken from one of the SI prefixes (section 5.4.3.3)";
const REVERSIBLE_MESSAGE: &str =
    "If present, the reversible attribute must have a value of \"yes\" or \"no\" \
     (section 7.4.1.2)";
const ROLE_MESSAGE: &str =
    "The role attribute must take one of the following seven values: reactant, \
     product, catalyst, activator, inhibitor, modifier, rate (section 7.4.3.2)";
const DIRECTION_MESSAGE: &str =
    "If present, the direction attribute must take one of the following three \
     values: forward, reverse, both (section 7.4.3.4)";

const ROLE_KEYWORDS: &[&str] = &[
    "reactant",
    "product",
    "catalyst",
    "activator",
    "inhibitor",
    "modifier",
    "rate",
];

/// Check `value` against `rule`, collecting the messages to report.
pub(super) fn check(rule: ContentRule, value: &str, version: ModelVersion) -> Vec<String> {
    let mut out = Vec::new();
    match rule {
        ContentRule::Identifier => identifier(value, version, &mut out),
        ContentRule::BaseUnits => keyword(value, &["yes", "no"], BASE_UNITS_MESSAGE, &mut out),
        ContentRule::Interface => {
            keyword(value, &["in", "out", "none"], INTERFACE_MESSAGE, &mut out)
        }
        ContentRule::InitialValue => initial_value(value, version, &mut out),
        ContentRule::Prefix => prefix(value, &mut out),
        ContentRule::Real => real(value, &mut out),
        ContentRule::Reversible => keyword(value, &["yes", "no"], REVERSIBLE_MESSAGE, &mut out),
        ContentRule::Role => keyword(value, ROLE_KEYWORDS, ROLE_MESSAGE, &mut out),
        ContentRule::Direction => keyword(
            value,
            &["forward", "reverse", "both"],
            DIRECTION_MESSAGE,
            &mut out,
        ),
    }
    out
}

/// One character class error per offending character; the leading-digit
/// rule applies only after version 1.0.
fn identifier(value: &str, version: ModelVersion, out: &mut Vec<String>) {
    let Some(first) = value.chars().next() else {
        out.push(IDENT_MUST_CONTAIN_LETTER.to_string());
        return;
    };

    if version > ModelVersion::V1_0 && first.is_ascii_digit() {
        out.push(format!("{IDENT_MUST_NOT_START_WITH_NUMBER}: {value}"));
    }

    let mut saw_letter = false;
    for c in value.chars() {
        if c.is_ascii_alphabetic() {
            saw_letter = true;
        } else if !c.is_ascii_digit() && c != '_' {
            out.push(IDENT_INVALID_CHARACTER.to_string());
        }
    }

    if !saw_letter {
        out.push(IDENT_MUST_CONTAIN_LETTER.to_string());
    }
}

fn real(value: &str, out: &mut Vec<String>) {
    let rest = value.strip_prefix(['+', '-']).unwrap_or(value);
    if rest.is_empty() {
        out.push(INVALID_REAL_NUMBER.to_string());
        return;
    }

    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut seen_digit = false;
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' => {
                if seen_dot {
                    out.push(INVALID_REAL_NUMBER.to_string());
                    return;
                }
                seen_dot = true;
            }
            'e' | 'E' => {
                if seen_exp {
                    out.push(INVALID_REAL_NUMBER.to_string());
                    return;
                }
                seen_exp = true;
                // No '.' after the exponent marker.
                seen_dot = true;
                chars.next_if(|&sign| sign == '+' || sign == '-');
            }
            _ => {
                out.push(INVALID_REAL_NUMBER.to_string());
                return;
            }
        }
    }

    if !seen_digit {
        out.push(INVALID_REAL_NUMBER.to_string());
    }
}

fn prefix(value: &str, out: &mut Vec<String>) {
    let Some(first) = value.chars().next() else {
        out.push(PREFIX_MESSAGE.to_string());
        return;
    };

    if first.is_ascii_digit() || matches!(first, '-' | '.' | '+') {
        real(value, out);
        return;
    }

    if !SI_PREFIX_NAMES.contains(&value) {
        out.push(PREFIX_MESSAGE.to_string());
    }
}

fn initial_value(value: &str, version: ModelVersion, out: &mut Vec<String>) {
    // 1.0 permits only a real number; later versions also permit the name
    // of a sibling variable, disambiguated by the first character.
    if version == ModelVersion::V1_0 {
        real(value, out);
        return;
    }

    let Some(first) = value.chars().next() else {
        out.push(INITIAL_VALUE_MESSAGE.to_string());
        return;
    };

    if first.is_ascii_digit() || matches!(first, '-' | '.' | '+') {
        real(value, out);
    } else {
        identifier(value, version, out);
    }
}

fn keyword(value: &str, allowed: &[&str], message: &str, out: &mut Vec<String>) {
    if !allowed.contains(&value) {
        out.push(message.to_string());
    }
}
