//! Integration test harness for the ModelML validator.
//!
//! This crate provides utilities for end-to-end testing of the full
//! pipeline: build a document tree, resolve its units, run structural
//! and semantic validation, and inspect the diagnostics.

use modelml_document::{Document, Model, NodeId, MODELML_1_0_NS, XLINK_NS};
use modelml_units::{ScopePath, UnitsResolver};
use modelml_validate::{validate_model, Diagnostic, DiagnosticFormatter, Severity};

/// Fluent builder over a model document tree.
///
/// Every helper pushes elements in document order, so diagnostics come
/// back in the order the pieces were added. The builder always works in
/// one namespace, fixed at construction.
pub struct ModelHarness {
    doc: Document,
    model: NodeId,
    ns: &'static str,
}

impl ModelHarness {
    /// A model document in the 1.0 namespace.
    pub fn new(name: &str) -> Self {
        Self::in_namespace(MODELML_1_0_NS, name)
    }

    pub fn in_namespace(ns: &'static str, name: &str) -> Self {
        let mut doc = Document::new();
        let model = doc.push_element(NodeId::ROOT, ns, "model");
        doc.set_attribute(model, "", "name", name);
        ModelHarness { doc, model, ns }
    }

    pub fn model_node(&self) -> NodeId {
        self.model
    }

    /// Push an element under `parent` with the given attributes.
    pub fn element(&mut self, parent: NodeId, local: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.doc.push_element(parent, self.ns, local);
        for &(attr, value) in attrs {
            self.doc.set_attribute(node, "", attr, value);
        }
        node
    }

    /// Set an unprefixed attribute on an existing element.
    pub fn set_attr(&mut self, node: NodeId, attr: &str, value: &str) {
        self.doc.set_attribute(node, "", attr, value);
    }

    pub fn component(&mut self, name: &str) -> NodeId {
        self.element(self.model, "component", &[("name", name)])
    }

    pub fn variable(&mut self, comp: NodeId, name: &str, units: &str) -> NodeId {
        self.element(comp, "variable", &[("name", name), ("units", units)])
    }

    /// A units definition under `parent` (the model node or a component).
    pub fn units(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.element(parent, "units", &[("name", name)])
    }

    /// A unit reference inside a units definition.
    pub fn unit(&mut self, units: NodeId, target: &str, attrs: &[(&str, &str)]) -> NodeId {
        let node = self.element(units, "unit", &[("units", target)]);
        for &(attr, value) in attrs {
            self.doc.set_attribute(node, "", attr, value);
        }
        node
    }

    /// A connection between two components with the given variable pairs.
    pub fn connect(&mut self, c1: &str, c2: &str, vars: &[(&str, &str)]) -> NodeId {
        let conn = self.element(self.model, "connection", &[]);
        self.element(
            conn,
            "map_components",
            &[("component_1", c1), ("component_2", c2)],
        );
        for (v1, v2) in vars {
            self.element(
                conn,
                "map_variables",
                &[("variable_1", v1), ("variable_2", v2)],
            );
        }
        conn
    }

    /// A group declaring one relationship over a single parent/children
    /// hierarchy.
    pub fn group(&mut self, relationship: &str, parent: &str, children: &[&str]) -> NodeId {
        let group = self.element(self.model, "group", &[]);
        self.element(group, "relationship_ref", &[("relationship", relationship)]);
        let top = self.element(group, "component_ref", &[("component", parent)]);
        for child in children {
            self.element(top, "component_ref", &[("component", child)]);
        }
        group
    }

    /// An import of another harness's document, with component and units
    /// aliases as `(alias, target)` pairs. The href records the imported
    /// model's name; the document is attached directly.
    pub fn import(
        &mut self,
        imported: ModelHarness,
        components: &[(&str, &str)],
        units: &[(&str, &str)],
    ) -> NodeId {
        let import = self.element(self.model, "import", &[]);
        let href = format!(
            "{}.xml",
            imported
                .doc
                .attribute_value(imported.model, "", "name")
                .unwrap_or("imported")
        );
        self.doc.set_attribute(import, XLINK_NS, "href", &href);
        for (alias, target) in components {
            self.element(
                import,
                "component",
                &[("name", alias), ("component_ref", target)],
            );
        }
        for (alias, target) in units {
            self.element(import, "units", &[("name", alias), ("units_ref", target)]);
        }
        self.doc.attach_import(import, imported.doc);
        import
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Run the full validation pipeline.
    ///
    /// # Panics
    ///
    /// Panics when the document cannot be read as a model at all.
    pub fn validate(&self) -> Vec<Diagnostic> {
        validate_model(&self.doc).expect("document is not a model")
    }

    /// Descriptions of every error-severity finding, in report order.
    pub fn error_descriptions(&self) -> Vec<String> {
        self.validate()
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.description)
            .collect()
    }

    /// The rendered report for the current document.
    pub fn report(&self) -> String {
        let diagnostics = self.validate();
        DiagnosticFormatter::new(&self.doc).format_all(&diagnostics)
    }

    /// A unit resolver over the current document.
    pub fn resolver(&self, strict: bool) -> UnitsResolver {
        let model = Model::of(&self.doc).expect("document is not a model");
        UnitsResolver::build(&model, strict)
    }

    /// Scope of a component declared directly in the model.
    pub fn component_scope(&self, name: &str) -> ScopePath {
        ScopePath::root().component(name)
    }
}
