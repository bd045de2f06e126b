//! Typed views over a document tree.
//!
//! The unit engine and the semantic validator never touch raw nodes
//! directly; they go through these thin wrappers, which know the element
//! vocabulary and follow import indirection. Every view is a `Copy` pair
//! of `(&Document, NodeId)` — nothing here owns tree data.
//!
//! A component or units name declared by an import alias is visible in the
//! importing model under the alias name; [`Model::resolve_component`]
//! follows such aliases transitively into attached documents.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ns::{ModelVersion, XLINK_NS};
use crate::tree::{Document, NodeId};

/// Failure to interpret a document as a model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelViewError {
    #[error("document has no root element")]
    NoRootElement,
    #[error("root element is <{0}>, not <model>")]
    RootNotModel(String),
    #[error("root element namespace {0:?} is not a recognized version")]
    UnrecognizedNamespace(String),
}

/// Direction of a variable interface. Unrecognized or absent attribute
/// values read as `None` (the grammar walk reports bad literals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableInterface {
    In,
    Out,
    None,
}

impl VariableInterface {
    fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("in") => VariableInterface::In,
            Some("out") => VariableInterface::Out,
            _ => VariableInterface::None,
        }
    }
}

/// The `<model>` root of one document.
#[derive(Debug, Clone, Copy)]
pub struct Model<'a> {
    doc: &'a Document,
    node: NodeId,
    version: ModelVersion,
}

/// How a component name is declared in a model: a local `<component>` or
/// an alias introduced by `<import><component>`.
#[derive(Debug, Clone, Copy)]
pub enum ComponentDecl<'a> {
    Local(Component<'a>),
    ImportAlias {
        model: Model<'a>,
        import: NodeId,
        alias: NodeId,
    },
}

/// How a units name is declared in a model: a local `<units>` or an alias
/// introduced by `<import><units>`.
#[derive(Debug, Clone, Copy)]
pub enum UnitsDecl<'a> {
    Local(UnitsDef<'a>),
    ImportAlias {
        model: Model<'a>,
        import: NodeId,
        alias: NodeId,
    },
}

macro_rules! view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            doc: &'a Document,
            node: NodeId,
            ns: &'a str,
        }

        impl<'a> $name<'a> {
            pub fn node(&self) -> NodeId {
                self.node
            }

            pub fn document(&self) -> &'a Document {
                self.doc
            }

            fn attr(&self, local: &str) -> Option<&'a str> {
                self.doc.attribute_value(self.node, "", local)
            }

            fn child_elements(&self, local: &'a str) -> impl Iterator<Item = NodeId> + 'a {
                self.doc.elements_named(self.node, self.ns, local)
            }
        }
    };
}

view!(
    /// A `<component>` element (possibly in an imported document).
    Component
);
view!(
    /// A `<variable>` element.
    Variable
);
view!(
    /// A `<units>` definition element.
    UnitsDef
);
view!(
    /// A `<unit>` reference inside a units definition. Numeric
    /// interpretation of its attributes belongs to the unit engine; this
    /// view only hands out the literal strings.
    UnitElement
);
view!(
    /// A `<connection>` element.
    Connection
);
view!(
    /// A `<map_components>` element.
    MapComponents
);
view!(
    /// A `<map_variables>` element.
    MapVariables
);
view!(
    /// A `<group>` element.
    Group
);
view!(
    /// A `<relationship_ref>` element.
    RelationshipRef
);
view!(
    /// A `<component_ref>` element inside a group.
    ComponentRef
);
view!(
    /// An `<import>` element.
    Import
);
view!(
    /// A `<component>` alias inside an import.
    ImportComponent
);
view!(
    /// A `<units>` alias inside an import.
    ImportUnits
);

impl<'a> Model<'a> {
    /// Interpret a document as a model. The root element must be `model`
    /// in a recognized namespace.
    pub fn of(doc: &'a Document) -> Result<Self, ModelViewError> {
        let root = doc.root_element().ok_or(ModelViewError::NoRootElement)?;
        let name = doc
            .element_name(root)
            .ok_or(ModelViewError::NoRootElement)?;
        if name.local != "model" {
            return Err(ModelViewError::RootNotModel(name.local.clone()));
        }
        let version = ModelVersion::from_namespace(&name.namespace)
            .ok_or_else(|| ModelViewError::UnrecognizedNamespace(name.namespace.clone()))?;
        Ok(Self {
            doc,
            node: root,
            version,
        })
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn version(&self) -> ModelVersion {
        self.version
    }

    /// Namespace URI every model-vocabulary element of this document uses.
    pub fn namespace(&self) -> &'static str {
        self.version.namespace_uri()
    }

    pub fn name(&self) -> Option<&'a str> {
        self.doc.attribute_value(self.node, "", "name")
    }

    /// Locally declared components, in document order.
    pub fn local_components(&self) -> Vec<Component<'a>> {
        self.doc
            .elements_named(self.node, self.namespace(), "component")
            .map(|n| Component {
                doc: self.doc,
                node: n,
                ns: self.namespace(),
            })
            .collect()
    }

    /// Locally declared units definitions, in document order.
    pub fn local_units(&self) -> Vec<UnitsDef<'a>> {
        self.doc
            .elements_named(self.node, self.namespace(), "units")
            .map(|n| UnitsDef {
                doc: self.doc,
                node: n,
                ns: self.namespace(),
            })
            .collect()
    }

    pub fn imports(&self) -> Vec<Import<'a>> {
        self.doc
            .elements_named(self.node, self.namespace(), "import")
            .map(|n| Import {
                doc: self.doc,
                node: n,
                ns: self.namespace(),
            })
            .collect()
    }

    pub fn connections(&self) -> Vec<Connection<'a>> {
        self.doc
            .elements_named(self.node, self.namespace(), "connection")
            .map(|n| Connection {
                doc: self.doc,
                node: n,
                ns: self.namespace(),
            })
            .collect()
    }

    pub fn groups(&self) -> Vec<Group<'a>> {
        self.doc
            .elements_named(self.node, self.namespace(), "group")
            .map(|n| Group {
                doc: self.doc,
                node: n,
                ns: self.namespace(),
            })
            .collect()
    }

    /// Every component name declared in this model: local components plus
    /// import aliases, in document order.
    pub fn component_decls(&self) -> Vec<ComponentDecl<'a>> {
        let mut out = Vec::new();
        for child in self.doc.element_children(self.node) {
            let Some(name) = self.doc.element_name(child) else {
                continue;
            };
            if name.namespace != self.namespace() {
                continue;
            }
            match name.local.as_str() {
                "component" => out.push(ComponentDecl::Local(Component {
                    doc: self.doc,
                    node: child,
                    ns: self.namespace(),
                })),
                "import" => {
                    for alias in self.doc.elements_named(child, self.namespace(), "component") {
                        out.push(ComponentDecl::ImportAlias {
                            model: *self,
                            import: child,
                            alias,
                        });
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Every units name declared in this model: local definitions plus
    /// import aliases, in document order.
    pub fn units_decls(&self) -> Vec<UnitsDecl<'a>> {
        let mut out = Vec::new();
        for child in self.doc.element_children(self.node) {
            let Some(name) = self.doc.element_name(child) else {
                continue;
            };
            if name.namespace != self.namespace() {
                continue;
            }
            match name.local.as_str() {
                "units" => out.push(UnitsDecl::Local(UnitsDef {
                    doc: self.doc,
                    node: child,
                    ns: self.namespace(),
                })),
                "import" => {
                    for alias in self.doc.elements_named(child, self.namespace(), "units") {
                        out.push(UnitsDecl::ImportAlias {
                            model: *self,
                            import: child,
                            alias,
                        });
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Resolve a component name declared in this model to the defining
    /// `<component>` element, following import aliases transitively into
    /// attached documents. `None` when the name is not declared, an
    /// import is not attached, or an alias chain dead-ends.
    pub fn resolve_component(&self, name: &str) -> Option<Component<'a>> {
        for decl in self.component_decls() {
            if decl.name() != Some(name) {
                continue;
            }
            return match decl {
                ComponentDecl::Local(c) => Some(c),
                ComponentDecl::ImportAlias { model, import, alias } => {
                    let target = model.doc.attribute_value(alias, "", "component_ref")?;
                    let imported = model.doc.imported_document(import)?;
                    Model::of(imported).ok()?.resolve_component(target)
                }
            };
        }
        None
    }

    /// Map from component name to its encapsulation parent's name, built
    /// from this model's encapsulation groups.
    pub fn encapsulation_parents(&self) -> IndexMap<String, String> {
        let mut parents = IndexMap::new();
        for group in self.groups() {
            let encapsulating = group
                .relationship_refs()
                .iter()
                .any(|rr| matches!(rr.relationship(), Some(("", "encapsulation"))));
            if !encapsulating {
                continue;
            }
            for cr in group.component_refs() {
                cr.collect_parents(&mut parents);
            }
        }
        parents
    }
}

impl<'a> ComponentDecl<'a> {
    /// Declared name (local `name` attribute, or the import alias name).
    pub fn name(&self) -> Option<&'a str> {
        match self {
            ComponentDecl::Local(c) => c.name(),
            ComponentDecl::ImportAlias { model, alias, .. } => {
                model.doc.attribute_value(*alias, "", "name")
            }
        }
    }

    /// The declaring element (for diagnostics).
    pub fn node(&self) -> NodeId {
        match self {
            ComponentDecl::Local(c) => c.node(),
            ComponentDecl::ImportAlias { alias, .. } => *alias,
        }
    }
}

impl<'a> UnitsDecl<'a> {
    pub fn name(&self) -> Option<&'a str> {
        match self {
            UnitsDecl::Local(u) => u.name(),
            UnitsDecl::ImportAlias { model, alias, .. } => {
                model.doc.attribute_value(*alias, "", "name")
            }
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            UnitsDecl::Local(u) => u.node(),
            UnitsDecl::ImportAlias { alias, .. } => *alias,
        }
    }
}

impl<'a> Component<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.attr("name")
    }

    pub fn variables(&self) -> Vec<Variable<'a>> {
        self.child_elements("variable")
            .map(|n| Variable {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }

    pub fn variable(&self, name: &str) -> Option<Variable<'a>> {
        self.variables().into_iter().find(|v| v.name() == Some(name))
    }

    /// Units defined inside this component.
    pub fn local_units(&self) -> Vec<UnitsDef<'a>> {
        self.child_elements("units")
            .map(|n| UnitsDef {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }
}

impl<'a> Variable<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.attr("name")
    }

    pub fn units_name(&self) -> Option<&'a str> {
        self.attr("units")
    }

    pub fn public_interface(&self) -> VariableInterface {
        VariableInterface::from_attr(self.attr("public_interface"))
    }

    pub fn private_interface(&self) -> VariableInterface {
        VariableInterface::from_attr(self.attr("private_interface"))
    }

    pub fn initial_value(&self) -> Option<&'a str> {
        self.attr("initial_value")
    }
}

impl<'a> UnitsDef<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.attr("name")
    }

    /// True when declared `base_units="yes"`.
    pub fn is_base_units(&self) -> bool {
        self.attr("base_units") == Some("yes")
    }

    pub fn unit_elements(&self) -> Vec<UnitElement<'a>> {
        self.child_elements("unit")
            .map(|n| UnitElement {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }
}

impl<'a> UnitElement<'a> {
    /// Name of the referenced units (`units` attribute).
    pub fn units_name(&self) -> Option<&'a str> {
        self.attr("units")
    }

    pub fn prefix_text(&self) -> Option<&'a str> {
        self.attr("prefix")
    }

    pub fn exponent_text(&self) -> Option<&'a str> {
        self.attr("exponent")
    }

    pub fn multiplier_text(&self) -> Option<&'a str> {
        self.attr("multiplier")
    }

    pub fn offset_text(&self) -> Option<&'a str> {
        self.attr("offset")
    }
}

impl<'a> Connection<'a> {
    /// The single `<map_components>` child, when present.
    pub fn component_mapping(&self) -> Option<MapComponents<'a>> {
        self.child_elements("map_components").next().map(|n| MapComponents {
            doc: self.doc,
            node: n,
            ns: self.ns,
        })
    }

    pub fn variable_mappings(&self) -> Vec<MapVariables<'a>> {
        self.child_elements("map_variables")
            .map(|n| MapVariables {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }
}

impl<'a> MapComponents<'a> {
    pub fn component_1(&self) -> Option<&'a str> {
        self.attr("component_1")
    }

    pub fn component_2(&self) -> Option<&'a str> {
        self.attr("component_2")
    }
}

impl<'a> MapVariables<'a> {
    pub fn variable_1(&self) -> Option<&'a str> {
        self.attr("variable_1")
    }

    pub fn variable_2(&self) -> Option<&'a str> {
        self.attr("variable_2")
    }
}

impl<'a> Group<'a> {
    pub fn relationship_refs(&self) -> Vec<RelationshipRef<'a>> {
        self.child_elements("relationship_ref")
            .map(|n| RelationshipRef {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }

    pub fn component_refs(&self) -> Vec<ComponentRef<'a>> {
        self.child_elements("component_ref")
            .map(|n| ComponentRef {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }
}

impl<'a> RelationshipRef<'a> {
    /// The relationship attribute as `(namespace, value)`. An attribute in
    /// the empty namespace wins over extension-namespace ones.
    pub fn relationship(&self) -> Option<(&'a str, &'a str)> {
        let attrs = self.doc.attributes(self.node);
        let mut first = None;
        for a in attrs {
            if a.name.local != "relationship" {
                continue;
            }
            if a.name.namespace.is_empty() {
                return Some(("", a.value.as_str()));
            }
            if first.is_none() {
                first = Some((a.name.namespace.as_str(), a.value.as_str()));
            }
        }
        first
    }

    pub fn name_attr(&self) -> Option<&'a str> {
        self.attr("name")
    }
}

impl<'a> ComponentRef<'a> {
    pub fn component_name(&self) -> Option<&'a str> {
        self.attr("component")
    }

    pub fn child_refs(&self) -> Vec<ComponentRef<'a>> {
        self.child_elements("component_ref")
            .map(|n| ComponentRef {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }

    fn collect_parents(&self, parents: &mut IndexMap<String, String>) {
        let Some(parent_name) = self.component_name() else {
            return;
        };
        for child in self.child_refs() {
            if let Some(child_name) = child.component_name() {
                parents.insert(child_name.to_string(), parent_name.to_string());
            }
            child.collect_parents(parents);
        }
    }
}

impl<'a> Import<'a> {
    pub fn href(&self) -> Option<&'a str> {
        self.doc.attribute_value(self.node, XLINK_NS, "href")
    }

    pub fn components(&self) -> Vec<ImportComponent<'a>> {
        self.child_elements("component")
            .map(|n| ImportComponent {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }

    pub fn units(&self) -> Vec<ImportUnits<'a>> {
        self.child_elements("units")
            .map(|n| ImportUnits {
                doc: self.doc,
                node: n,
                ns: self.ns,
            })
            .collect()
    }

    /// The attached imported document, when the embedder supplied one.
    pub fn imported_document(&self) -> Option<&'a Document> {
        self.doc.imported_document(self.node)
    }

    /// The attached imported document viewed as a model.
    pub fn imported_model(&self) -> Option<Model<'a>> {
        Model::of(self.imported_document()?).ok()
    }
}

impl<'a> ImportComponent<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.attr("name")
    }

    pub fn component_ref(&self) -> Option<&'a str> {
        self.attr("component_ref")
    }
}

impl<'a> ImportUnits<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.attr("name")
    }

    pub fn units_ref(&self) -> Option<&'a str> {
        self.attr("units_ref")
    }
}
