//! Namespace URIs and language versions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ModelML 1.0 namespace URI.
pub const MODELML_1_0_NS: &str = "http://www.modelml.org/modelml/1.0#";
/// ModelML 1.1 namespace URI.
pub const MODELML_1_1_NS: &str = "http://www.modelml.org/modelml/1.1#";
/// MathML namespace URI, used by embedded mathematics.
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";
/// XLink namespace URI, used by import references.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// A recognized language version, detected from the root element's
/// namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelVersion {
    V1_0,
    V1_1,
}

impl ModelVersion {
    /// The version whose namespace URI this is, if recognized.
    pub fn from_namespace(uri: &str) -> Option<Self> {
        match uri {
            MODELML_1_0_NS => Some(ModelVersion::V1_0),
            MODELML_1_1_NS => Some(ModelVersion::V1_1),
            _ => None,
        }
    }

    /// Namespace URI of this version.
    pub fn namespace_uri(self) -> &'static str {
        match self {
            ModelVersion::V1_0 => MODELML_1_0_NS,
            ModelVersion::V1_1 => MODELML_1_1_NS,
        }
    }

    /// True when `uri` is either recognized ModelML namespace.
    pub fn is_modelml_namespace(uri: &str) -> bool {
        Self::from_namespace(uri).is_some()
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVersion::V1_0 => write!(f, "1.0"),
            ModelVersion::V1_1 => write!(f, "1.1"),
        }
    }
}
