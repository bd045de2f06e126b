//! Recursive interpreter for the grammar tables.
//!
//! One pass per element: version applicability, the element's custom
//! validator (which may suppress parts of the generic processing),
//! declared attributes with wrong-namespace bookkeeping, child matching
//! with occurrence counts, extension-element screening, and the
//! accumulated-text check.

use modelml_document::{
    Attribute, Document, Model, ModelVersion, NodeId, NodeKind, PositionTarget, MATHML_NS,
    MODELML_1_0_NS, MODELML_1_1_NS, XLINK_NS,
};
use tracing::{debug, instrument};

use super::content;
use super::{ContentRule, CustomRule, ElementRule, TextRule, ValidationLevel, MODEL};
use crate::diagnostic::{Diagnostic, DiagnosticOrigin};

const MIXED_NAMESPACES: &str =
    "It is not valid to mix the ModelML 1.0 and 1.1 namespaces in the same model document";
const NON_WHITESPACE_TEXT: &str =
    "Per section 2.4.4 of the ModelML specification, any characters that occur \
     immediately within elements in the ModelML namespace must be either space \
     (#x20) characters, carriage returns (#xD), line feeds (#xA), or tabs (#x9)";

/// Walk the whole document of `model` against the grammar, appending
/// findings to `out`.
#[instrument(skip(model, out), name = "grammar_walk")]
pub(crate) fn validate_representation(model: &Model<'_>, out: &mut Vec<Diagnostic>) {
    let before = out.len();
    let mut walk = ReprWalk {
        doc: model.document(),
        version: model.version(),
        out,
    };
    walk.element(model.node(), &MODEL);
    debug!(findings = out.len() - before, "structural walk complete");
}

struct ReprWalk<'a, 'o> {
    doc: &'a Document,
    version: ModelVersion,
    out: &'o mut Vec<Diagnostic>,
}

/// Namespaces the walker claims for itself; anything else is extension
/// content.
fn known_vocabulary_ns(ns: &str) -> bool {
    ns == MODELML_1_0_NS || ns == MODELML_1_1_NS || ns == MATHML_NS || ns == XLINK_NS
}

fn xml_whitespace_only(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\n' | '\r' | '\t'))
}

fn attr_target(element: NodeId, attr: &Attribute) -> PositionTarget {
    PositionTarget::Attribute {
        element,
        name: attr.name.clone(),
    }
}

impl ReprWalk<'_, '_> {
    fn report(&mut self, description: impl Into<String>, target: PositionTarget) {
        self.out.push(Diagnostic::error(
            description,
            DiagnosticOrigin::Representation {
                doc: self.doc.id(),
                target,
                offset: 0,
            },
        ));
    }

    fn warn(&mut self, description: impl Into<String>, target: PositionTarget) {
        self.out.push(Diagnostic::warning(
            description,
            DiagnosticOrigin::Representation {
                doc: self.doc.id(),
                target,
                offset: 0,
            },
        ));
    }

    /// The recognized ModelML namespace this document does NOT use.
    fn other_namespace(&self) -> &'static str {
        match self.version {
            ModelVersion::V1_0 => MODELML_1_1_NS,
            ModelVersion::V1_1 => MODELML_1_0_NS,
        }
    }

    fn element(&mut self, el: NodeId, rule: &ElementRule) {
        if rule.min_version > self.version || rule.max_version < self.version {
            self.report(
                format!("Element {} is invalid in this version of ModelML", rule.name),
                PositionTarget::Node(el),
            );
        }

        let level = match rule.custom {
            Some(CustomRule::RelationshipRef) => self.relationship_ref(el),
            Some(CustomRule::Maths) => self.maths(el),
            None => ValidationLevel::ExtraneousElementsAndAttributes,
        };

        self.attributes(el, rule, level.checks_attributes());
        self.children(el, rule, level.checks_elements());
    }

    fn attributes(&mut self, el: NodeId, rule: &ElementRule, flag_unmatched: bool) {
        let doc = self.doc;
        let mut seen = vec![false; rule.attributes.len()];
        let mut seen_wrong_ns = vec![false; rule.attributes.len()];

        for attr in doc.attributes(el) {
            let mut ns = attr.name.namespace.as_str();
            if ns == self.other_namespace() {
                self.report(MIXED_NAMESPACES, attr_target(el, attr));
                ns = self.version.namespace_uri();
            }

            let mut matched = false;
            for (i, row) in rule.attributes.iter().enumerate() {
                if attr.name.local != row.name {
                    continue;
                }
                if !row.namespace.accepts(ns, self.version) {
                    seen_wrong_ns[i] = true;
                    continue;
                }
                seen[i] = true;
                if let Some(content_rule) = row.content {
                    for message in content::check(content_rule, &attr.value, self.version) {
                        self.report(message, attr_target(el, attr));
                    }
                }
                matched = true;
                break;
            }

            if flag_unmatched && !matched && (known_vocabulary_ns(ns) || ns.is_empty()) {
                self.report(
                    format!(
                        "Unexpected attribute {} found - not valid here",
                        attr.name.local
                    ),
                    attr_target(el, attr),
                );
            }
        }

        for (i, row) in rule.attributes.iter().enumerate() {
            let Some(missing) = row.missing_message else {
                continue;
            };
            if seen[i] {
                continue;
            }
            let mut message = missing.to_string();
            if seen_wrong_ns[i] {
                message.push_str(
                    ". Note that an element with a matching name was seen in a \
                     different namespace",
                );
            }
            self.report(message, PositionTarget::Node(el));
        }
    }

    fn children(&mut self, el: NodeId, rule: &ElementRule, flag_unmatched: bool) {
        let doc = self.doc;
        let mut counts = vec![0u32; rule.children.len()];
        let mut text = String::new();

        for &child in doc.children(el) {
            let name = match &doc.node(child).kind {
                NodeKind::Element { name, .. } => name,
                NodeKind::Text { data } | NodeKind::Cdata { data } => {
                    text.push_str(data);
                    continue;
                }
                _ => continue,
            };

            let mut ns = name.namespace.as_str();
            if ns == self.other_namespace() {
                self.report(MIXED_NAMESPACES, PositionTarget::Node(child));
                ns = self.version.namespace_uri();
            }

            let mut matched = false;
            for (i, &child_rule) in rule.children.iter().enumerate() {
                if name.local != child_rule.name || ns != child_rule.namespace.resolve(self.version)
                {
                    continue;
                }
                counts[i] += 1;
                // The error fires once even when several too many are present.
                if child_rule.max_in_parent != 0 && counts[i] == child_rule.max_in_parent + 1 {
                    if let Some(message) = child_rule.too_many_message {
                        self.report(message, PositionTarget::Node(child));
                    }
                }
                self.element(child, child_rule);
                matched = true;
                break;
            }

            if flag_unmatched && !matched {
                if known_vocabulary_ns(ns) {
                    self.report(
                        format!("Unexpected element {} found - not valid here", name.local),
                        PositionTarget::Node(child),
                    );
                } else {
                    self.extension_element(child);
                }
            }
        }

        for (i, &child_rule) in rule.children.iter().enumerate() {
            if counts[i] < child_rule.min_in_parent {
                if let Some(message) = child_rule.too_few_message {
                    self.report(message, PositionTarget::Node(el));
                }
            }
        }

        if let Some(TextRule::WhitespaceOnly) = rule.text {
            // One report per element however much stray text there is.
            if !xml_whitespace_only(&text) {
                self.report(NON_WHITESPACE_TEXT, PositionTarget::Node(el));
            }
        }
    }

    /// Elements outside the recognized namespaces are opaque, but may not
    /// smuggle in vocabulary attributes or children.
    fn extension_element(&mut self, el: NodeId) {
        let doc = self.doc;
        for attr in doc.attributes(el) {
            let ns = attr.name.namespace.as_str();
            if ns == MODELML_1_0_NS || ns == MODELML_1_1_NS || ns == MATHML_NS {
                self.warn(
                    format!(
                        "Attribute {} in namespace {} is not allowed in extension elements",
                        attr.name.local, ns
                    ),
                    PositionTarget::Node(el),
                );
            }
        }

        for child in doc.element_children(el) {
            let Some(name) = doc.element_name(child) else {
                continue;
            };
            let ns = name.namespace.as_str();
            if ns == MODELML_1_0_NS || ns == MODELML_1_1_NS || ns == MATHML_NS {
                self.warn(
                    format!(
                        "Element {} in namespace {} is not allowed in extension elements",
                        name.local, ns
                    ),
                    PositionTarget::Node(el),
                );
            }
        }
    }

    /// `relationship_ref` consumes its own attributes: the relationship
    /// attribute may live in any namespace, so the declarative table cannot
    /// express it.
    fn relationship_ref(&mut self, el: NodeId) -> ValidationLevel {
        let doc = self.doc;
        let mut seen_relationship = false;
        let mut seen_name = false;
        let mut seen_encapsulation = false;

        for attr in doc.attributes(el) {
            let ns = attr.name.namespace.as_str();

            if attr.name.local == "relationship" {
                if seen_relationship {
                    self.report(
                        "relationship_ref element has more than one relationship across \
                         several namespaces (section 6.4.1.1)",
                        attr_target(el, attr),
                    );
                }
                seen_relationship = true;

                if ns.is_empty() {
                    if attr.value == "encapsulation" {
                        seen_encapsulation = true;
                    } else if attr.value != "containment" {
                        self.report(
                            "The value of a relationship attribute in the ModelML namespace \
                             must be \"containment\" or \"encapsulation\" (section 6.4.2.2)",
                            attr_target(el, attr),
                        );
                    }
                }
                continue;
            }
            if !ns.is_empty() {
                continue;
            }

            if attr.name.local != "name" {
                self.report(
                    format!("{} attribute not allowed here", attr.name.local),
                    attr_target(el, attr),
                );
            } else {
                seen_name = true;
                for message in content::check(ContentRule::Identifier, &attr.value, self.version)
                {
                    self.report(message, attr_target(el, attr));
                }
            }
        }

        if !seen_relationship {
            self.report(
                "relationship attribute is mandatory on relationship_ref (section 6.4.1.1)",
                PositionTarget::Node(el),
            );
        }
        if seen_encapsulation && seen_name {
            self.report(
                "A name attribute must not be defined on a <relationship_ref> element \
                 with a relationship attribute value of \"encapsulation\" (section 6.4.2.4)",
                PositionTarget::Node(el),
            );
        }

        ValidationLevel::ExtraneousElements
    }

    /// Convention checks on embedded mathematics: every statement is an
    /// equality applied to at least two expressions.
    fn maths(&mut self, el: NodeId) -> ValidationLevel {
        let doc = self.doc;
        for &child in doc.children(el) {
            let name = match &doc.node(child).kind {
                NodeKind::Element { name, .. } => name,
                NodeKind::Text { data } | NodeKind::Cdata { data } => {
                    if !xml_whitespace_only(data) {
                        self.report(
                            "MathML math elements cannot contain text nodes.",
                            PositionTarget::Node(child),
                        );
                    }
                    continue;
                }
                _ => continue,
            };

            if name.namespace != MATHML_NS {
                self.report(
                    "Non-MathML element inside top-level MathML math element.",
                    PositionTarget::Node(child),
                );
                continue;
            }

            let mut expr = child;
            let mut local = name.local.as_str();
            if local == "semantics" {
                let Some(inner) = self.semantics_content(child) else {
                    continue;
                };
                let Some(inner_name) = doc.element_name(inner) else {
                    continue;
                };
                expr = inner;
                local = inner_name.local.as_str();
            }

            if local != "apply" {
                self.report(
                    "Expected apply element inside MathML math element.",
                    PositionTarget::Node(expr),
                );
                continue;
            }

            self.apply(expr);
        }

        ValidationLevel::NothingFurther
    }

    fn apply(&mut self, apply: NodeId) {
        let doc = self.doc;
        let mut elements = doc.element_children(apply);
        let Some(operator) = elements.next() else {
            self.report(
                "Missing MathML operator on apply inside MathML math element.",
                PositionTarget::Node(apply),
            );
            return;
        };
        let operands: Vec<NodeId> = elements.collect();

        if doc.element_name(operator).map(|n| n.local.as_str()) != Some("eq") {
            self.report(
                "Expected MathML operator on apply inside MathML math element to be eq.",
                PositionTarget::Node(operator),
            );
            return;
        }

        if operands.len() < 2 {
            self.report(
                "Expected apply inside MathML math element to equate at least two \
                 expressions.",
                PositionTarget::Node(apply),
            );
            return;
        }

        for operand in operands {
            self.expression(operand);
        }
    }

    /// Per-operand dimensional analysis.
    ///
    /// TODO: infer units over the expression tree and compare operand
    /// dimensions.
    fn expression(&mut self, _operand: NodeId) {}

    /// Unwrap a `semantics` element to the one expression it annotates,
    /// reporting stray content on the way.
    fn semantics_content(&mut self, semantics: NodeId) -> Option<NodeId> {
        let doc = self.doc;
        let mut result = None;

        for &child in doc.children(semantics) {
            let name = match &doc.node(child).kind {
                NodeKind::Element { name, .. } => name,
                NodeKind::Text { data } | NodeKind::Cdata { data } => {
                    if !xml_whitespace_only(data) {
                        self.report(
                            "Text should not be present directly inside a MathML semantics \
                             element",
                            PositionTarget::Node(child),
                        );
                    }
                    continue;
                }
                _ => continue,
            };

            if name.namespace != MATHML_NS {
                self.report(
                    "Non-MathML elements are not allowed as children of the MathML \
                     semantics element.",
                    PositionTarget::Node(child),
                );
                continue;
            }
            if name.local == "annotation-xml" || name.local == "annotation" {
                continue;
            }
            if result.is_some() {
                self.report(
                    "More than one element child other than an annotation-xml or \
                     annotation child inside a semantics element.",
                    PositionTarget::Node(child),
                );
                continue;
            }
            result = Some(child);
        }

        if result.is_none() {
            self.report(
                "No MathML element to which the semantics are being applied inside \
                 MathML semantics element.",
                PositionTarget::Node(semantics),
            );
        }
        result
    }
}
