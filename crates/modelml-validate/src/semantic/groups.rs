//! Group hierarchy checks.
//!
//! Every group names one or more relationships and arranges component
//! references into a tree. Relationship entries must be distinct within
//! the group; top-level component_refs must have children; every
//! component_ref must name a declared component; and across the whole
//! model at most one component_ref per (underlying component,
//! relationship identity) may carry children of its own.

use indexmap::IndexSet;

use modelml_document::{ComponentRef, Group, Model};

use super::{NodeKey, SemanticValidation};

/// One relationship a group declares: `(namespace, relationship, name)`.
type GroupRelationship = (String, String, String);

/// A component acting as a non-terminal reference in one hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct GroupParent {
    component: NodeKey,
    relationship: GroupRelationship,
}

impl SemanticValidation<'_, '_> {
    pub(super) fn group(&mut self, model: &Model<'_>, group: &Group<'_>) {
        let doc = group.document().id();

        let mut relationships: IndexSet<GroupRelationship> = IndexSet::new();
        for rel_ref in group.relationship_refs() {
            let (ns, relationship) = rel_ref.relationship().unwrap_or(("", ""));
            let name = rel_ref.name_attr().unwrap_or("");
            let entry = (ns.to_string(), relationship.to_string(), name.to_string());
            if !relationships.insert(entry) {
                self.error("Duplicate relationship_ref within group", doc, rel_ref.node());
            }
        }

        self.group_component_refs(model, &relationships, &group.component_refs(), true);
    }

    /// Walk one level of component_refs, returning whether the level was
    /// non-empty. Children are checked before their parent so a missing
    /// grandchild is reported under the right element.
    fn group_component_refs(
        &mut self,
        model: &Model<'_>,
        relationships: &IndexSet<GroupRelationship>,
        refs: &[ComponentRef<'_>],
        top_level: bool,
    ) -> bool {
        let mut found_any = false;

        for comp_ref in refs {
            found_any = true;
            let doc = comp_ref.document().id();

            let has_children =
                self.group_component_refs(model, relationships, &comp_ref.child_refs(), false);

            if top_level && !has_children {
                self.error(
                    "component_ref element appears as child of a group element \
                     but does not have any child component_ref elements",
                    doc,
                    comp_ref.node(),
                );
                continue;
            }

            let name = comp_ref.component_name().unwrap_or("");
            let declared = model
                .component_decls()
                .iter()
                .any(|d| d.name() == Some(name));
            if !declared {
                self.error(
                    "component_ref element references component which does not exist",
                    doc,
                    comp_ref.node(),
                );
                continue;
            }

            // An alias whose chain dead-ends is reported by the import
            // integrity check, not here.
            let Some(concrete) = model.resolve_component(name) else {
                continue;
            };

            if !has_children {
                continue;
            }

            let component = (concrete.document().id(), concrete.node());
            for relationship in relationships {
                let parent = GroupParent {
                    component,
                    relationship: relationship.clone(),
                };
                if self.group_parents.insert(parent) {
                    continue;
                }
                let mut message = String::from(
                    "In a given hierarchy, only one of the <component_ref> \
                     elements that reference a given component may contain \
                     further <component_ref> elements, but the ",
                );
                message.push_str(&relationship.1);
                message.push_str(" hierarchy");
                if !relationship.0.is_empty() {
                    message.push_str(", in the namespace ");
                    message.push_str(&relationship.0);
                }
                if !relationship.2.is_empty() {
                    message.push_str(" with name ");
                    message.push_str(&relationship.2);
                }
                message.push_str(" has more than one non-terminal component_ref to ");
                message.push_str(concrete.name().unwrap_or(""));
                self.error(message, doc, comp_ref.node());
            }
        }

        found_any
    }
}
