//! Connection topology and interface-direction checks.
//!
//! A connection joins exactly one unordered pair of components; every
//! `map_variables` child joins one variable of each. Which interface a
//! mapped variable must expose depends on how the two components sit in
//! the encapsulation hierarchy: siblings talk public-to-public, a parent
//! talks to a child private-to-public. Components in each other's hidden
//! set may not be connected at all; their mappings are still checked as
//! if the second component were the parent, so one bad pair does not
//! mute every interface finding under it.

use indexmap::{IndexMap, IndexSet};

use modelml_document::{Component, Connection, MapVariables, Model, Variable, VariableInterface};
use modelml_units::ScopePath;

use super::{resolve_component_scoped, NodeKey, SemanticValidation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncapsulationRelationship {
    Sibling,
    Comp1ParentOfComp2,
    Comp2ParentOfComp1,
    Hidden,
}

/// Classify two components by their encapsulation parents, using the
/// names as written in the connection's model.
fn classify(
    parents: &IndexMap<String, String>,
    name_1: &str,
    name_2: &str,
) -> EncapsulationRelationship {
    let parent_1 = parents.get(name_1).map(String::as_str);
    let parent_2 = parents.get(name_2).map(String::as_str);
    if parent_1 == parent_2 {
        EncapsulationRelationship::Sibling
    } else if parent_2 == Some(name_1) {
        EncapsulationRelationship::Comp1ParentOfComp2
    } else if parent_1 == Some(name_2) {
        EncapsulationRelationship::Comp2ParentOfComp1
    } else {
        EncapsulationRelationship::Hidden
    }
}

/// Unordered identity of a pair, stable across attribute order.
fn unordered<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn variable_key(variable: &Variable<'_>) -> NodeKey {
    (variable.document().id(), variable.node())
}

impl SemanticValidation<'_, '_> {
    pub(super) fn connection(
        &mut self,
        model: &Model<'_>,
        scope: &ScopePath,
        parents: &IndexMap<String, String>,
        connection: &Connection<'_>,
    ) {
        let doc = connection.document().id();
        let Some(mapping) = connection.component_mapping() else {
            // The grammar walk reports the missing map_components child.
            return;
        };

        let name_1 = mapping.component_1().unwrap_or("");
        let name_2 = mapping.component_2().unwrap_or("");

        let comp_1 = resolve_component_scoped(model, scope, name_1);
        if comp_1.is_none() {
            self.error(
                "component_1 attribute doesn't refer to a valid component",
                doc,
                mapping.node(),
            );
        }
        let comp_2 = resolve_component_scoped(model, scope, name_2);
        if comp_2.is_none() {
            self.error(
                "component_2 attribute doesn't refer to a valid component",
                doc,
                mapping.node(),
            );
        }

        if let (Some((c1, _)), Some((c2, _))) = (&comp_1, &comp_2) {
            let key_1 = (c1.document().id(), c1.node());
            let key_2 = (c2.document().id(), c2.node());
            if key_1 == key_2 {
                self.error("Cannot connect a component to itself", doc, mapping.node());
            }
            if !self.connected_pairs.insert(unordered(key_1, key_2)) {
                self.error(
                    "There is more than one connection element for the same pair of components",
                    doc,
                    mapping.node(),
                );
            }
        }

        let relationship = classify(parents, name_1, name_2);
        if relationship == EncapsulationRelationship::Hidden {
            self.error(
                "Connection of components which are encapsulated in the hidden set of each other",
                doc,
                mapping.node(),
            );
        }

        let mut mapped_vars: IndexSet<(Option<NodeKey>, Option<NodeKey>)> = IndexSet::new();
        for mapping in connection.variable_mappings() {
            self.variable_mapping(
                relationship,
                comp_1.as_ref(),
                comp_2.as_ref(),
                &mapping,
                &mut mapped_vars,
            );
        }
    }

    fn variable_mapping(
        &mut self,
        relationship: EncapsulationRelationship,
        comp_1: Option<&(Component<'_>, ScopePath)>,
        comp_2: Option<&(Component<'_>, ScopePath)>,
        mapping: &MapVariables<'_>,
        mapped_vars: &mut IndexSet<(Option<NodeKey>, Option<NodeKey>)>,
    ) {
        let doc = mapping.document().id();

        let var_1 = comp_1.and_then(|(c, _)| c.variable(mapping.variable_1().unwrap_or("")));
        if var_1.is_none() {
            self.error(
                "variable_1 attribute doesn't refer to a valid variable",
                doc,
                mapping.node(),
            );
        }
        let var_2 = comp_2.and_then(|(c, _)| c.variable(mapping.variable_2().unwrap_or("")));
        if var_2.is_none() {
            self.error(
                "variable_2 attribute doesn't refer to a valid variable",
                doc,
                mapping.node(),
            );
        }

        if let (Some((c1, owner_1)), Some((c2, owner_2)), Some(v1), Some(v2), Some(weak)) =
            (comp_1, comp_2, &var_1, &var_2, self.weak)
        {
            let scope_1 = owner_1.component(c1.name().unwrap_or(""));
            let scope_2 = owner_2.component(c2.name().unwrap_or(""));
            let cur_1 = weak.units_by_name(&scope_1, v1.units_name().unwrap_or(""));
            let cur_2 = weak.units_by_name(&scope_2, v2.units_name().unwrap_or(""));
            if let (Some(cur_1), Some(cur_2)) = (cur_1, cur_2) {
                if !cur_1.compatible_with(&cur_2) {
                    self.error(
                        "Connection of two variables which have dimensionally inconsistent units",
                        doc,
                        mapping.node(),
                    );
                }
            }
        }

        let pair = unordered(
            var_1.as_ref().map(variable_key),
            var_2.as_ref().map(variable_key),
        );
        if !mapped_vars.insert(pair) {
            self.error(
                "Connection of the same two variables more than once",
                doc,
                mapping.node(),
            );
        }

        let (Some(v1), Some(v2)) = (var_1, var_2) else {
            return;
        };

        let (iface_1, label_1, iface_2, label_2) = match relationship {
            EncapsulationRelationship::Sibling => {
                (v1.public_interface(), "public", v2.public_interface(), "public")
            }
            EncapsulationRelationship::Comp1ParentOfComp2 => {
                (v1.private_interface(), "private", v2.public_interface(), "public")
            }
            EncapsulationRelationship::Comp2ParentOfComp1
            | EncapsulationRelationship::Hidden => {
                (v1.public_interface(), "public", v2.private_interface(), "private")
            }
        };

        if iface_1 == VariableInterface::None {
            self.error(
                format!("Mapping variable_1 has {label_1} interface of none"),
                doc,
                mapping.node(),
            );
        }
        if iface_2 == VariableInterface::None {
            self.error(
                format!("Mapping variable_2 has {label_2} interface of none"),
                doc,
                mapping.node(),
            );
        }
        if iface_1 == iface_2 {
            let dir = if iface_1 == VariableInterface::In {
                "in"
            } else {
                "out"
            };
            self.error(
                format!(
                    "Mapping variable_1 has {label_1} interface of {dir} \
                     but variable_2 also has {label_2} interface of {dir}"
                ),
                doc,
                mapping.node(),
            );
        }

        let receiver = if iface_1 == VariableInterface::In { &v1 } else { &v2 };
        let receiver_key = variable_key(receiver);
        if !self.seen_in_vars.insert(receiver_key) {
            self.error(
                "More than one connection to in interface of variable",
                receiver_key.0,
                receiver_key.1,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::validate_semantics;
    use crate::diagnostic::Diagnostic;
    use modelml_document::{Document, Model, NodeId, MODELML_1_0_NS};
    use modelml_units::UnitsResolver;

    fn ns() -> &'static str {
        MODELML_1_0_NS
    }

    fn run(doc: &Document) -> Vec<String> {
        let model = Model::of(doc).unwrap();
        let strict = UnitsResolver::build(&model, true);
        let weak = UnitsResolver::build(&model, false);
        let mut out: Vec<Diagnostic> = Vec::new();
        validate_semantics(&model, Some(&strict), Some(&weak), &mut out);
        out.into_iter().map(|d| d.description).collect()
    }

    struct Builder {
        doc: Document,
        model: NodeId,
    }

    impl Builder {
        fn new() -> Self {
            let mut doc = Document::new();
            let model = doc.push_element(NodeId::ROOT, ns(), "model");
            doc.set_attribute(model, "", "name", "m");
            Builder { doc, model }
        }

        fn component(&mut self, name: &str) -> NodeId {
            let comp = self.doc.push_element(self.model, ns(), "component");
            self.doc.set_attribute(comp, "", "name", name);
            comp
        }

        fn variable(&mut self, comp: NodeId, name: &str, units: &str, attrs: &[(&str, &str)]) {
            let var = self.doc.push_element(comp, ns(), "variable");
            self.doc.set_attribute(var, "", "name", name);
            self.doc.set_attribute(var, "", "units", units);
            for &(attr, value) in attrs {
                self.doc.set_attribute(var, "", attr, value);
            }
        }

        fn connect(&mut self, c1: &str, c2: &str, vars: &[(&str, &str)]) {
            let conn = self.doc.push_element(self.model, ns(), "connection");
            let mc = self.doc.push_element(conn, ns(), "map_components");
            self.doc.set_attribute(mc, "", "component_1", c1);
            self.doc.set_attribute(mc, "", "component_2", c2);
            for &(v1, v2) in vars {
                let mv = self.doc.push_element(conn, ns(), "map_variables");
                self.doc.set_attribute(mv, "", "variable_1", v1);
                self.doc.set_attribute(mv, "", "variable_2", v2);
            }
        }

        fn encapsulate(&mut self, parent: &str, child: &str) {
            let group = self.doc.push_element(self.model, ns(), "group");
            let rr = self.doc.push_element(group, ns(), "relationship_ref");
            self.doc.set_attribute(rr, "", "relationship", "encapsulation");
            let top = self.doc.push_element(group, ns(), "component_ref");
            self.doc.set_attribute(top, "", "component", parent);
            let kid = self.doc.push_element(top, ns(), "component_ref");
            self.doc.set_attribute(kid, "", "component", child);
        }
    }

    #[test]
    fn test_valid_sibling_connection_is_clean() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "second", &[("public_interface", "out")]);
        let c = b.component("c");
        b.variable(c, "w", "second", &[("public_interface", "in")]);
        b.connect("a", "c", &[("v", "w")]);
        assert_eq!(run(&b.doc), Vec::<String>::new());
    }

    #[test]
    fn test_matching_out_interfaces_are_reported() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "second", &[("public_interface", "out")]);
        let c = b.component("c");
        b.variable(c, "w", "second", &[("public_interface", "out")]);
        b.connect("a", "c", &[("v", "w")]);
        assert_eq!(
            run(&b.doc),
            vec![
                "Mapping variable_1 has public interface of out \
                 but variable_2 also has public interface of out"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_interface_of_none_is_reported_per_side() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "second", &[]);
        let c = b.component("c");
        b.variable(c, "w", "second", &[]);
        b.connect("a", "c", &[("v", "w")]);
        let errors = run(&b.doc);
        assert_eq!(
            errors,
            vec![
                "Mapping variable_1 has public interface of none".to_string(),
                "Mapping variable_2 has public interface of none".to_string(),
                "Mapping variable_1 has public interface of out \
                 but variable_2 also has public interface of out"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_self_connection_is_reported() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "second", &[("public_interface", "out")]);
        b.connect("a", "a", &[]);
        let errors = run(&b.doc);
        assert!(errors.contains(&"Cannot connect a component to itself".to_string()));
    }

    #[test]
    fn test_duplicate_pair_is_reported_regardless_of_order() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "second", &[("public_interface", "out")]);
        let c = b.component("c");
        b.variable(c, "w", "second", &[("public_interface", "in")]);
        b.connect("a", "c", &[("v", "w")]);
        b.connect("c", "a", &[]);
        let errors = run(&b.doc);
        assert_eq!(
            errors,
            vec![
                "There is more than one connection element for the same pair of components"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_unresolved_components_and_variables() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "second", &[("public_interface", "out")]);
        b.connect("a", "ghost", &[("v", "w")]);
        let errors = run(&b.doc);
        assert_eq!(
            errors,
            vec![
                "component_2 attribute doesn't refer to a valid component".to_string(),
                "variable_2 attribute doesn't refer to a valid variable".to_string(),
            ]
        );
    }

    #[test]
    fn test_parent_child_uses_private_and_public_interfaces() {
        let mut b = Builder::new();
        let parent = b.component("parent");
        b.variable(parent, "v", "second", &[("private_interface", "out")]);
        let child = b.component("child");
        b.variable(child, "w", "second", &[("public_interface", "in")]);
        b.encapsulate("parent", "child");
        b.connect("parent", "child", &[("v", "w")]);
        assert_eq!(run(&b.doc), Vec::<String>::new());

        // Swapping the mapped order flips the required interfaces.
        let mut b = Builder::new();
        let parent = b.component("parent");
        b.variable(parent, "v", "second", &[("private_interface", "out")]);
        let child = b.component("child");
        b.variable(child, "w", "second", &[("public_interface", "in")]);
        b.encapsulate("parent", "child");
        b.connect("child", "parent", &[("w", "v")]);
        assert_eq!(run(&b.doc), Vec::<String>::new());
    }

    #[test]
    fn test_hidden_components_cannot_be_connected() {
        let mut b = Builder::new();
        for name in ["p1", "c1", "p2", "c2"] {
            let comp = b.component(name);
            b.variable(comp, "v", "second", &[("public_interface", "out")]);
        }
        b.encapsulate("p1", "c1");
        b.encapsulate("p2", "c2");
        b.connect("c1", "c2", &[]);
        let errors = run(&b.doc);
        assert_eq!(
            errors,
            vec![
                "Connection of components which are encapsulated in the hidden set of each other"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_dimensionally_inconsistent_mapping() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "metre", &[("public_interface", "out")]);
        let c = b.component("c");
        b.variable(c, "w", "second", &[("public_interface", "in")]);
        b.connect("a", "c", &[("v", "w")]);
        let errors = run(&b.doc);
        assert_eq!(
            errors,
            vec![
                "Connection of two variables which have dimensionally inconsistent units"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_offset_only_difference_is_weakly_compatible() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "celsius", &[("public_interface", "out")]);
        let c = b.component("c");
        b.variable(c, "w", "kelvin", &[("public_interface", "in")]);
        b.connect("a", "c", &[("v", "w")]);
        assert_eq!(run(&b.doc), Vec::<String>::new());
    }

    #[test]
    fn test_same_variable_pair_mapped_twice() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "second", &[("public_interface", "out")]);
        let c = b.component("c");
        b.variable(c, "w", "second", &[("public_interface", "in")]);
        b.connect("a", "c", &[("v", "w"), ("v", "w")]);
        let errors = run(&b.doc);
        assert_eq!(
            errors,
            vec![
                "Connection of the same two variables more than once".to_string(),
                "More than one connection to in interface of variable".to_string(),
            ]
        );
    }

    #[test]
    fn test_variable_receives_at_most_one_connection_model_wide() {
        let mut b = Builder::new();
        let a = b.component("a");
        b.variable(a, "v", "second", &[("public_interface", "out")]);
        let c = b.component("c");
        b.variable(c, "w", "second", &[("public_interface", "in")]);
        let d = b.component("d");
        b.variable(d, "x", "second", &[("public_interface", "out")]);
        b.connect("a", "c", &[("v", "w")]);
        b.connect("d", "c", &[("x", "w")]);
        let errors = run(&b.doc);
        assert_eq!(
            errors,
            vec!["More than one connection to in interface of variable".to_string()]
        );
    }
}
