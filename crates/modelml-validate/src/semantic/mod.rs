//! Model-level semantic validation.
//!
//! One pass per model in the import closure, depth-first in import
//! order: name uniqueness, per-component variable and units rules,
//! connection topology, group hierarchies, and import alias integrity.
//! Registries that must hold model-wide (connected component pairs,
//! variables already receiving a connection, hierarchy heads) live for
//! the whole walk, so they also hold across imported documents.
//!
//! The unit resolvers are optional: when unit resolution failed for the
//! model, both are withheld and every unit-name check silently passes.

mod connections;
mod groups;

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::{debug, instrument};

use modelml_document::{Component, ComponentDecl, DocId, Import, Model, NodeId, Variable, VariableInterface};
use modelml_units::{is_builtin_unit, ScopePath, UnitsResolver};

use crate::diagnostic::{Diagnostic, DiagnosticOrigin};
use groups::GroupParent;

/// Identity of an element across the import closure.
type NodeKey = (DocId, NodeId);

/// Walk `model` and every attached import, appending findings to `out`.
#[instrument(skip(model, strict, weak, out), name = "semantic_walk")]
pub(crate) fn validate_semantics(
    model: &Model<'_>,
    strict: Option<&UnitsResolver>,
    weak: Option<&UnitsResolver>,
    out: &mut Vec<Diagnostic>,
) {
    let before = out.len();
    let mut validation = SemanticValidation {
        strict,
        weak,
        seen_in_vars: IndexSet::new(),
        connected_pairs: IndexSet::new(),
        group_parents: IndexSet::new(),
        out,
    };
    validation.model(model, &ScopePath::root());
    debug!(findings = out.len() - before, "semantic walk complete");
}

struct SemanticValidation<'a, 'o> {
    strict: Option<&'a UnitsResolver>,
    weak: Option<&'a UnitsResolver>,
    /// Variables already on the receiving end of a connection.
    seen_in_vars: IndexSet<NodeKey>,
    /// Unordered component pairs already joined by a connection.
    connected_pairs: IndexSet<(NodeKey, NodeKey)>,
    /// Components already heading a hierarchy, per relationship identity.
    group_parents: IndexSet<GroupParent>,
    out: &'o mut Vec<Diagnostic>,
}

/// Resolve a component name to its concrete definition and the scope the
/// definition lives in, following import aliases transitively. The scope
/// segments mirror the derivation the unit resolver uses while
/// collecting, so unit lookups for the component's variables land in the
/// right registry keys.
fn resolve_component_scoped<'a>(
    model: &Model<'a>,
    scope: &ScopePath,
    name: &str,
) -> Option<(Component<'a>, ScopePath)> {
    for decl in model.component_decls() {
        if decl.name() != Some(name) {
            continue;
        }
        return match decl {
            ComponentDecl::Local(component) => Some((component, scope.clone())),
            ComponentDecl::ImportAlias {
                model: owner,
                import,
                alias,
            } => {
                let target = owner.document().attribute_value(alias, "", "component_ref")?;
                let import = owner.imports().into_iter().find(|i| i.node() == import)?;
                let imported = import.imported_model()?;
                let child_scope = import_scope(scope, &import);
                resolve_component_scoped(&imported, &child_scope, target)
            }
        };
    }
    None
}

/// Scope on the far side of an import crossing, named after the first
/// alias exactly as the unit resolver names it.
fn import_scope(scope: &ScopePath, import: &Import<'_>) -> ScopePath {
    scope
        .import(
            import.components().first().and_then(|c| c.name()),
            import.units().first().and_then(|u| u.name()),
        )
        .unwrap_or_else(|| scope.clone())
}

impl SemanticValidation<'_, '_> {
    fn error(&mut self, description: impl Into<String>, doc: DocId, element: NodeId) {
        self.out.push(Diagnostic::error(
            description,
            DiagnosticOrigin::Semantic { doc, element },
        ));
    }

    fn model(&mut self, model: &Model<'_>, scope: &ScopePath) {
        self.name_uniqueness(model);

        for component in model.local_components() {
            self.component(scope, &component);
        }

        let parents = model.encapsulation_parents();
        for connection in model.connections() {
            self.connection(model, scope, &parents, &connection);
        }

        for group in model.groups() {
            self.group(model, &group);
        }

        for import in model.imports() {
            self.import_integrity(model, &import);
            if let Some(imported) = import.imported_model() {
                let child_scope = import_scope(scope, &import);
                self.model(&imported, &child_scope);
            }
        }
    }

    /// Component names must be unique model-wide; units names must be
    /// unique model-wide and disjoint from the built-in set. Import
    /// aliases count as declarations.
    fn name_uniqueness(&mut self, model: &Model<'_>) {
        let doc = model.document().id();

        let mut seen: HashSet<&str> = HashSet::new();
        for decl in model.component_decls() {
            let name = decl.name().unwrap_or("");
            if !seen.insert(name) {
                self.error(
                    format!("More than one component in the model named {name}"),
                    doc,
                    decl.node(),
                );
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for decl in model.units_decls() {
            let name = decl.name().unwrap_or("");
            if seen.contains(name) {
                self.error(
                    format!("More than one units in the model named {name}"),
                    doc,
                    decl.node(),
                );
            }
            if is_builtin_unit(name) {
                self.error(
                    format!("Units in the model uses reserved name {name}"),
                    doc,
                    decl.node(),
                );
            }
            seen.insert(name);
        }
    }

    fn component(&mut self, scope: &ScopePath, component: &Component<'_>) {
        let doc = component.document().id();
        let comp_scope = scope.component(component.name().unwrap_or(""));

        let mut seen: HashSet<&str> = HashSet::new();
        for variable in component.variables() {
            let name = variable.name().unwrap_or("");
            if !seen.insert(name) {
                self.error(
                    format!(
                        "There is more than one variable in the same component called {name}"
                    ),
                    doc,
                    variable.node(),
                );
            }
            self.variable(component, &comp_scope, &variable);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for units in component.local_units() {
            let name = units.name().unwrap_or("");
            if seen.contains(name) {
                self.error(
                    format!("More than one units in the component named {name}"),
                    doc,
                    units.node(),
                );
            }
            if is_builtin_unit(name) {
                self.error(
                    format!("Units in the component uses reserved name {name}"),
                    doc,
                    units.node(),
                );
            }
            seen.insert(name);
        }
    }

    fn variable(
        &mut self,
        component: &Component<'_>,
        comp_scope: &ScopePath,
        variable: &Variable<'_>,
    ) {
        let doc = variable.document().id();

        if let Some(strict) = self.strict {
            let units = variable.units_name().unwrap_or("");
            if strict.units_by_name(comp_scope, units).is_none() {
                self.error(
                    format!("Invalid units on variable: {units}"),
                    doc,
                    variable.node(),
                );
            }
        }

        let public = variable.public_interface();
        let private = variable.private_interface();
        if public == VariableInterface::In && private == VariableInterface::In {
            self.error("Cannot have two in interfaces on variable", doc, variable.node());
        }

        let Some(initial) = variable.initial_value() else {
            return;
        };
        if initial.is_empty() {
            return;
        }

        if public == VariableInterface::In || private == VariableInterface::In {
            self.error(
                "Variables with public or private interfaces of in cannot have \
                 initial value attributes",
                doc,
                variable.node(),
            );
        }

        // A numeric initial value was already syntax-checked by the
        // grammar walk; anything else must name a sibling variable.
        if initial.starts_with(|c: char| c.is_ascii_digit()) || initial.starts_with('-') {
            return;
        }
        if variable.name() == Some(initial) {
            self.error(
                "Variable can't have initial_value attribute reference itself",
                doc,
                variable.node(),
            );
        } else if component.variable(initial).is_none() {
            self.error(
                "Variable has initial_value attribute which is a ModelML identifier \
                 which does not name a variable in the same component",
                doc,
                variable.node(),
            );
        }
    }

    /// Aliases in an import must reference names the imported model
    /// actually declares. Nothing to check when the import is not
    /// attached.
    fn import_integrity(&mut self, model: &Model<'_>, import: &Import<'_>) {
        let doc = model.document().id();
        let Some(imported) = import.imported_model() else {
            return;
        };

        for alias in import.components() {
            let target = alias.component_ref().unwrap_or("");
            let declared = imported
                .component_decls()
                .iter()
                .any(|d| d.name() == Some(target));
            if !declared {
                self.error(
                    format!("component_ref {target} refers to component which doesn't exist"),
                    doc,
                    alias.node(),
                );
            }
        }

        for alias in import.units() {
            let target = alias.units_ref().unwrap_or("");
            let declared = imported
                .units_decls()
                .iter()
                .any(|d| d.name() == Some(target));
            if !declared {
                self.error(
                    format!("units_ref {target} refers to units which don't exist"),
                    doc,
                    alias.node(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelml_document::{Document, NodeId, MODELML_1_0_NS, MODELML_1_1_NS};

    fn run(doc: &Document) -> Vec<Diagnostic> {
        let model = Model::of(doc).unwrap();
        let strict = UnitsResolver::build(&model, true);
        let weak = UnitsResolver::build(&model, false);
        let mut out = Vec::new();
        validate_semantics(&model, Some(&strict), Some(&weak), &mut out);
        out
    }

    fn run_without_units(doc: &Document) -> Vec<Diagnostic> {
        let model = Model::of(doc).unwrap();
        let mut out = Vec::new();
        validate_semantics(&model, None, None, &mut out);
        out
    }

    fn model_doc() -> (Document, NodeId) {
        let mut doc = Document::new();
        let model = doc.push_element(NodeId::ROOT, MODELML_1_0_NS, "model");
        doc.set_attribute(model, "", "name", "m");
        (doc, model)
    }

    fn add_component(doc: &mut Document, model: NodeId, name: &str) -> NodeId {
        let comp = doc.push_element(model, MODELML_1_0_NS, "component");
        doc.set_attribute(comp, "", "name", name);
        comp
    }

    fn add_variable(doc: &mut Document, comp: NodeId, name: &str, units: &str) -> NodeId {
        let var = doc.push_element(comp, MODELML_1_0_NS, "variable");
        doc.set_attribute(var, "", "name", name);
        doc.set_attribute(var, "", "units", units);
        var
    }

    #[test]
    fn test_duplicate_component_names_are_reported() {
        let (mut doc, model) = model_doc();
        add_component(&mut doc, model, "heart");
        let second = add_component(&mut doc, model, "heart");

        let errors = run(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].description,
            "More than one component in the model named heart"
        );
        assert_eq!(
            errors[0].origin,
            DiagnosticOrigin::Semantic {
                doc: doc.id(),
                element: second,
            }
        );
    }

    #[test]
    fn test_model_units_duplicates_and_reserved_names() {
        let (mut doc, model) = model_doc();
        let metre = doc.push_element(model, MODELML_1_0_NS, "units");
        doc.set_attribute(metre, "", "name", "metre");
        for _ in 0..2 {
            let u = doc.push_element(model, MODELML_1_0_NS, "units");
            doc.set_attribute(u, "", "name", "speedy");
        }

        let errors = run(&doc);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].description,
            "Units in the model uses reserved name metre"
        );
        assert_eq!(
            errors[1].description,
            "More than one units in the model named speedy"
        );
    }

    #[test]
    fn test_component_units_duplicates_and_reserved_names() {
        let (mut doc, model) = model_doc();
        let comp = add_component(&mut doc, model, "c");
        for _ in 0..2 {
            let u = doc.push_element(comp, MODELML_1_0_NS, "units");
            doc.set_attribute(u, "", "name", "local_u");
        }
        let second = doc.push_element(comp, MODELML_1_0_NS, "units");
        doc.set_attribute(second, "", "name", "second");

        let errors = run(&doc);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].description,
            "More than one units in the component named local_u"
        );
        assert_eq!(
            errors[1].description,
            "Units in the component uses reserved name second"
        );
    }

    #[test]
    fn test_duplicate_variable_names_in_component() {
        let (mut doc, model) = model_doc();
        let comp = add_component(&mut doc, model, "c");
        add_variable(&mut doc, comp, "v", "second");
        add_variable(&mut doc, comp, "v", "second");

        let errors = run(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].description,
            "There is more than one variable in the same component called v"
        );
    }

    #[test]
    fn test_variable_units_must_resolve() {
        let (mut doc, model) = model_doc();
        let comp = add_component(&mut doc, model, "c");
        add_variable(&mut doc, comp, "v", "fish");

        let errors = run(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].description, "Invalid units on variable: fish");

        // Without a resolver the unit-name check is withheld entirely.
        assert!(run_without_units(&doc).is_empty());
    }

    #[test]
    fn test_variable_units_see_component_scope() {
        let (mut doc, model) = model_doc();
        let comp = add_component(&mut doc, model, "c");
        let units = doc.push_element(comp, MODELML_1_0_NS, "units");
        doc.set_attribute(units, "", "name", "beat");
        let unit = doc.push_element(units, MODELML_1_0_NS, "unit");
        doc.set_attribute(unit, "", "units", "second");
        add_variable(&mut doc, comp, "v", "beat");

        let other = add_component(&mut doc, model, "elsewhere");
        add_variable(&mut doc, other, "w", "beat");

        let errors = run(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].description, "Invalid units on variable: beat");
    }

    #[test]
    fn test_interface_and_initial_value_rules() {
        let (mut doc, model) = model_doc();
        let comp = add_component(&mut doc, model, "c");

        let v1 = add_variable(&mut doc, comp, "v1", "second");
        doc.set_attribute(v1, "", "public_interface", "in");
        doc.set_attribute(v1, "", "private_interface", "in");

        let v2 = add_variable(&mut doc, comp, "v2", "second");
        doc.set_attribute(v2, "", "public_interface", "in");
        doc.set_attribute(v2, "", "initial_value", "1.0");

        let v3 = add_variable(&mut doc, comp, "v3", "second");
        doc.set_attribute(v3, "", "initial_value", "v3");

        let v4 = add_variable(&mut doc, comp, "v4", "second");
        doc.set_attribute(v4, "", "initial_value", "ghost");

        let v5 = add_variable(&mut doc, comp, "v5", "second");
        doc.set_attribute(v5, "", "initial_value", "-2.5");

        let v6 = add_variable(&mut doc, comp, "v6", "second");
        doc.set_attribute(v6, "", "initial_value", "v5");

        let errors = run(&doc);
        assert_eq!(errors.len(), 4);
        assert_eq!(
            errors[0].description,
            "Cannot have two in interfaces on variable"
        );
        assert_eq!(
            errors[1].description,
            "Variables with public or private interfaces of in cannot have \
             initial value attributes"
        );
        assert_eq!(
            errors[2].description,
            "Variable can't have initial_value attribute reference itself"
        );
        assert_eq!(
            errors[3].description,
            "Variable has initial_value attribute which is a ModelML identifier \
             which does not name a variable in the same component"
        );
    }

    #[test]
    fn test_import_alias_integrity() {
        let mut inner = Document::new();
        let imodel = inner.push_element(NodeId::ROOT, MODELML_1_1_NS, "model");
        let heart = inner.push_element(imodel, MODELML_1_1_NS, "component");
        inner.set_attribute(heart, "", "name", "heart");
        let hu = inner.push_element(imodel, MODELML_1_1_NS, "units");
        inner.set_attribute(hu, "", "name", "hu");

        let mut doc = Document::new();
        let model = doc.push_element(NodeId::ROOT, MODELML_1_1_NS, "model");
        let import = doc.push_element(model, MODELML_1_1_NS, "import");
        let pump = doc.push_element(import, MODELML_1_1_NS, "component");
        doc.set_attribute(pump, "", "name", "pump");
        doc.set_attribute(pump, "", "component_ref", "heart");
        let borrowed = doc.push_element(import, MODELML_1_1_NS, "units");
        doc.set_attribute(borrowed, "", "name", "borrowed");
        doc.set_attribute(borrowed, "", "units_ref", "absent");
        doc.attach_import(import, inner);

        let errors = run(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].description,
            "units_ref absent refers to units which don't exist"
        );
        assert_eq!(
            errors[0].origin,
            DiagnosticOrigin::Semantic {
                doc: doc.id(),
                element: borrowed,
            }
        );
    }

    #[test]
    fn test_imported_models_are_validated_too() {
        let mut inner = Document::new();
        let imodel = inner.push_element(NodeId::ROOT, MODELML_1_1_NS, "model");
        for _ in 0..2 {
            let c = inner.push_element(imodel, MODELML_1_1_NS, "component");
            inner.set_attribute(c, "", "name", "dup");
        }
        let inner_id = inner.id();

        let mut doc = Document::new();
        let model = doc.push_element(NodeId::ROOT, MODELML_1_1_NS, "model");
        let import = doc.push_element(model, MODELML_1_1_NS, "import");
        doc.attach_import(import, inner);

        let errors = run(&doc);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].description,
            "More than one component in the model named dup"
        );
        assert_eq!(errors[0].origin.document(), inner_id);
    }

    #[test]
    fn test_resolve_component_scoped_follows_aliases() {
        let mut inner = Document::new();
        let imodel = inner.push_element(NodeId::ROOT, MODELML_1_1_NS, "model");
        let real = inner.push_element(imodel, MODELML_1_1_NS, "component");
        inner.set_attribute(real, "", "name", "heart");

        let mut doc = Document::new();
        let model = doc.push_element(NodeId::ROOT, MODELML_1_1_NS, "model");
        let import = doc.push_element(model, MODELML_1_1_NS, "import");
        let alias = doc.push_element(import, MODELML_1_1_NS, "component");
        doc.set_attribute(alias, "", "name", "pump");
        doc.set_attribute(alias, "", "component_ref", "heart");
        doc.attach_import(import, inner);

        let model = Model::of(&doc).unwrap();
        let (concrete, scope) =
            resolve_component_scoped(&model, &ScopePath::root(), "pump").unwrap();
        assert_eq!(concrete.name(), Some("heart"));
        assert_eq!(scope.qualify("x"), "imp_bycomp_pump/x");

        assert!(resolve_component_scoped(&model, &ScopePath::root(), "absent").is_none());
    }
}
