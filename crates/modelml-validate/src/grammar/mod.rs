//! Table-driven structural validation.
//!
//! The document grammar lives in a set of mutually referencing
//! [`ElementRule`] statics rooted at [`MODEL`]. The walker in [`walker`]
//! interprets the tables recursively: declared attributes (with literal
//! syntax checks from [`content`]), child cardinalities, version
//! applicability, and the handful of element-specific checks the tables
//! cannot express (`relationship_ref` and `math`).

mod content;
mod walker;

pub(crate) use walker::validate_representation;

use modelml_document::{ModelVersion, MATHML_NS, XLINK_NS};

/// Placeholder for table slots that can never be reported. Carries the
/// table location so a regression is traceable from the message alone.
macro_rules! internal_error_message {
    () => {
        concat!(
            "Internal error (line ",
            line!(),
            " in ",
            file!(),
            "): this should never happen, please report a bug"
        )
    };
}

/// Element namespace selector. `Matching` resolves to the namespace of
/// whichever language version the document was detected as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NsSelector {
    Matching,
    Fixed(&'static str),
}

impl NsSelector {
    fn resolve(self, version: ModelVersion) -> &'static str {
        match self {
            NsSelector::Matching => version.namespace_uri(),
            NsSelector::Fixed(uri) => uri,
        }
    }
}

/// Attribute namespace selector. `Default` accepts both the empty
/// namespace and the document's own ModelML namespace, which is how the
/// specification's unprefixed-attribute wording has always been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrNs {
    Default,
    Fixed(&'static str),
}

impl AttrNs {
    fn accepts(self, ns: &str, version: ModelVersion) -> bool {
        match self {
            AttrNs::Default => ns.is_empty() || ns == version.namespace_uri(),
            AttrNs::Fixed(uri) => ns == uri,
        }
    }
}

/// Literal attribute syntax checks, dispatched in [`content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentRule {
    Identifier,
    BaseUnits,
    Interface,
    InitialValue,
    Prefix,
    Real,
    Reversible,
    Role,
    Direction,
}

/// Element-specific validation that replaces parts of the generic walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomRule {
    RelationshipRef,
    Maths,
}

/// Validation applied to the accumulated character data of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextRule {
    WhitespaceOnly,
}

/// How much of the generic walk a custom validator leaves enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValidationLevel {
    NothingFurther,
    ExtraneousElements,
    ExtraneousAttributes,
    ExtraneousElementsAndAttributes,
}

impl ValidationLevel {
    fn checks_attributes(self) -> bool {
        matches!(
            self,
            ValidationLevel::ExtraneousAttributes | ValidationLevel::ExtraneousElementsAndAttributes
        )
    }

    fn checks_elements(self) -> bool {
        matches!(
            self,
            ValidationLevel::ExtraneousElements | ValidationLevel::ExtraneousElementsAndAttributes
        )
    }
}

/// One row of an element's attribute table.
#[derive(Debug, Clone, Copy)]
struct AttributeRule {
    namespace: AttrNs,
    name: &'static str,
    /// Reported against the element when a required attribute is absent.
    missing_message: Option<&'static str>,
    content: Option<ContentRule>,
}

/// One node of the element grammar.
///
/// No `Debug` derive: the `component_ref` table is self-referential.
struct ElementRule {
    namespace: NsSelector,
    name: &'static str,
    min_version: ModelVersion,
    max_version: ModelVersion,
    attributes: &'static [AttributeRule],
    children: &'static [&'static ElementRule],
    min_in_parent: u32,
    too_few_message: Option<&'static str>,
    /// Zero means unbounded.
    max_in_parent: u32,
    too_many_message: Option<&'static str>,
    text: Option<TextRule>,
    custom: Option<CustomRule>,
}

const ATTR_NAME: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "name",
    missing_message: Some(
        "The ModelML specification says the name attribute is required here",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_NAME_OPTIONAL: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "name",
    missing_message: None,
    content: Some(ContentRule::Identifier),
};

const ATTR_HREF: AttributeRule = AttributeRule {
    namespace: AttrNs::Fixed(XLINK_NS),
    name: "href",
    missing_message: Some(
        "The ModelML specification says the xlink:href attribute is required here \
         (section 9.4.1.1)",
    ),
    content: None,
};

const ATTR_BASE_UNITS: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "base_units",
    missing_message: None,
    content: Some(ContentRule::BaseUnits),
};

const ATTR_UNITS_REF: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "units_ref",
    missing_message: Some(
        "Each <units> element appearing as the child of an <import> element MUST \
         also define a units_ref attribute (section 5.4.1.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_UNITS: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "units",
    missing_message: Some(
        "Each <variable> / <unit> element MUST define a units attribute \
         (section 3.4.3.1 / 5.4.3.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_PUBLIC_INTERFACE: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "public_interface",
    missing_message: None,
    content: Some(ContentRule::Interface),
};

const ATTR_PRIVATE_INTERFACE: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "private_interface",
    missing_message: None,
    content: Some(ContentRule::Interface),
};

const ATTR_INITIAL_VALUE: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "initial_value",
    missing_message: None,
    content: Some(ContentRule::InitialValue),
};

const ATTR_COMPONENT_1: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "component_1",
    missing_message: Some(
        "Each <map_components> element MUST define a component_1 attribute \
         (section 3.4.5.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_COMPONENT_2: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "component_2",
    missing_message: Some(
        "Each <map_components> element MUST define a component_2 attribute \
         (section 3.4.5.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_VARIABLE_1: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "variable_1",
    missing_message: Some(
        "Each <map_variables> element MUST define a variable_1 attribute \
         (section 3.4.6.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_VARIABLE_2: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "variable_2",
    missing_message: Some(
        "Each <map_variables> element MUST define a variable_2 attribute \
         (section 3.4.6.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_PREFIX: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "prefix",
    missing_message: None,
    content: Some(ContentRule::Prefix),
};

const ATTR_EXPONENT: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "exponent",
    missing_message: None,
    content: Some(ContentRule::Real),
};

const ATTR_MULTIPLIER: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "multiplier",
    missing_message: None,
    content: Some(ContentRule::Real),
};

const ATTR_OFFSET: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "offset",
    missing_message: None,
    content: Some(ContentRule::Real),
};

const ATTR_COMPONENT: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "component",
    missing_message: Some(
        "A <component_ref> element must define a component attribute \
         (section 6.4.3.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_COMPONENT_REF: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "component_ref",
    missing_message: Some(
        "Each <component> element appearing as the child of an <import> element \
         MUST additionally define a component_ref attribute (section 3.4.2.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_REVERSIBLE: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "reversible",
    missing_message: None,
    content: Some(ContentRule::Reversible),
};

const ATTR_VARIABLE: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "variable",
    missing_message: Some(
        "Each <variable_ref> element must define a variable attribute \
         (section 7.4.2.1)",
    ),
    content: Some(ContentRule::Identifier),
};

const ATTR_ROLE: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "role",
    missing_message: Some(
        "Each <role> element must define a role attribute (section 7.4.3.1)",
    ),
    content: Some(ContentRule::Role),
};

const ATTR_DELTA_VARIABLE: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "delta_variable",
    missing_message: None,
    content: Some(ContentRule::Identifier),
};

const ATTR_DIRECTION: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "direction",
    missing_message: None,
    content: Some(ContentRule::Direction),
};

const ATTR_STOICHIOMETRY: AttributeRule = AttributeRule {
    namespace: AttrNs::Default,
    name: "stoichiometry",
    missing_message: None,
    content: Some(ContentRule::Real),
};

static MODEL: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "model",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_NAME],
    children: &[&IMPORT, &MODEL_UNITS, &MODEL_COMPONENT, &GROUP, &CONNECTION],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static IMPORT: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "import",
    min_version: ModelVersion::V1_1,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_HREF],
    children: &[&IMPORT_UNITS, &IMPORT_COMPONENT],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static MODEL_UNITS: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "units",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_NAME, ATTR_BASE_UNITS],
    children: &[&UNIT],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static IMPORT_UNITS: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "units",
    min_version: ModelVersion::V1_1,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_NAME, ATTR_UNITS_REF],
    children: &[],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static MODEL_COMPONENT: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "component",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_NAME],
    children: &[&VARIABLE, &REACTION, &MODEL_UNITS, &MATH],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static IMPORT_COMPONENT: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "component",
    min_version: ModelVersion::V1_1,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_NAME, ATTR_COMPONENT_REF],
    children: &[],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static GROUP: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "group",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[],
    children: &[&RELATIONSHIP_REF, &COMPONENT_REF],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static CONNECTION: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "connection",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[],
    children: &[&MAP_COMPONENTS, &MAP_VARIABLES],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static VARIABLE: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "variable",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[
        ATTR_NAME,
        ATTR_UNITS,
        ATTR_PUBLIC_INTERFACE,
        ATTR_PRIVATE_INTERFACE,
        ATTR_INITIAL_VALUE,
    ],
    children: &[],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static MAP_COMPONENTS: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "map_components",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_COMPONENT_1, ATTR_COMPONENT_2],
    children: &[],
    min_in_parent: 1,
    too_few_message: Some(
        "Each <connection> element MUST contain exactly one <map_components> \
         element (section 3.4.4.1)",
    ),
    max_in_parent: 1,
    too_many_message: Some(
        "Each <connection> element MUST contain exactly one <map_components> \
         element (section 3.4.4.1)",
    ),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static MAP_VARIABLES: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "map_variables",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_VARIABLE_1, ATTR_VARIABLE_2],
    children: &[],
    min_in_parent: 1,
    too_few_message: Some(
        "Each <connection> element MUST contain at least one <map_variables> \
         element (section 3.4.4.1)",
    ),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static UNIT: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "unit",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[
        ATTR_UNITS,
        ATTR_PREFIX,
        ATTR_EXPONENT,
        ATTR_MULTIPLIER,
        ATTR_OFFSET,
    ],
    children: &[],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static RELATIONSHIP_REF: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "relationship_ref",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_NAME_OPTIONAL],
    children: &[],
    min_in_parent: 1,
    too_few_message: Some(
        "A <group> element MUST contain at least one <relationship_ref> element \
         (section 6.4.1.1)",
    ),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: Some(CustomRule::RelationshipRef),
};

static COMPONENT_REF: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "component_ref",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_COMPONENT],
    children: &[&NESTED_COMPONENT_REF],
    min_in_parent: 1,
    too_few_message: Some(
        "A <group> element MUST contain at least one <component_ref> element \
         (section 6.4.1.1)",
    ),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static NESTED_COMPONENT_REF: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "component_ref",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_COMPONENT],
    children: &[&NESTED_COMPONENT_REF],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static REACTION: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "reaction",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_REVERSIBLE],
    children: &[&VARIABLE_REF],
    min_in_parent: 0,
    too_few_message: Some(internal_error_message!()),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static VARIABLE_REF: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "variable_ref",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[ATTR_VARIABLE],
    children: &[&ROLE],
    min_in_parent: 1,
    too_few_message: Some(
        "Each <reaction> element must contain at least one <variable_ref> \
         element (section 7.4.1.1)",
    ),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static ROLE: ElementRule = ElementRule {
    namespace: NsSelector::Matching,
    name: "role",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[
        ATTR_ROLE,
        ATTR_DELTA_VARIABLE,
        ATTR_DIRECTION,
        ATTR_STOICHIOMETRY,
    ],
    children: &[&MATH],
    min_in_parent: 1,
    too_few_message: Some(
        "Each <variable_ref> element must contain at least one <role> element \
         (section 7.4.2.1)",
    ),
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: None,
};

static MATH: ElementRule = ElementRule {
    namespace: NsSelector::Fixed(MATHML_NS),
    name: "math",
    min_version: ModelVersion::V1_0,
    max_version: ModelVersion::V1_1,
    attributes: &[],
    children: &[],
    min_in_parent: 0,
    too_few_message: None,
    max_in_parent: 0,
    too_many_message: Some(internal_error_message!()),
    text: Some(TextRule::WhitespaceOnly),
    custom: Some(CustomRule::Maths),
};
