//! Arena-backed document tree.
//!
//! The validator and unit engine consume an already-parsed document through
//! a narrow read-only interface; this module is that interface. Nodes live
//! in a flat arena owned by [`Document`] and reference each other by
//! [`NodeId`] handle, so cross-references (unit → unit, component-ref →
//! component) never need ownership pointers and cyclic shapes in the
//! overlaid graphs are representable without bookkeeping.
//!
//! # Design
//!
//! - `Document` — arena of nodes plus attached imported documents
//! - `NodeId` — 4-byte handle into the arena; `NodeId::ROOT` is the
//!   document node itself
//! - `NodeKind` — element / text / CDATA / comment / processing
//!   instruction / entity reference
//!
//! Construction happens through the `push_*` builder methods; once handed
//! to a validation run the tree is only read.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Process-unique identity of one [`Document`] instance.
///
/// Two documents never share an id, so `(DocId, NodeId)` identifies a node
/// across an arbitrary forest of attached imports. Identity comparison of
/// nodes reached through different import chains reduces to comparing
/// these pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(pub u64);

static NEXT_DOC_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The document node (arena slot 0).
    pub const ROOT: NodeId = NodeId(0);

    /// Arena index of this handle.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Expanded name of an element or attribute: namespace URI plus local name.
///
/// Prefixes are not part of identity; where one matters for serialized
/// width it is carried separately (see [`Attribute::prefix`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    pub namespace: String,
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// True when this name has the given namespace URI and local name.
    pub fn matches(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// One attribute of an element, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: QName,
    /// Serialization prefix (`xlink` for `xlink:href`). Only consulted when
    /// replaying the canonical serialization; never part of identity.
    pub prefix: Option<String>,
    pub value: String,
}

impl Attribute {
    /// Width of the serialized attribute name (`prefix:local` or `local`).
    pub fn qualified_len(&self) -> usize {
        match &self.prefix {
            Some(p) => p.len() + 1 + self.name.local.len(),
            None => self.name.local.len(),
        }
    }
}

/// Node payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The document node itself; always arena slot 0.
    Document,
    Element {
        name: QName,
        attributes: Vec<Attribute>,
    },
    Text {
        data: String,
    },
    Cdata {
        data: String,
    },
    Comment {
        data: String,
    },
    ProcessingInstruction {
        target: String,
        data: String,
    },
    EntityRef {
        name: String,
    },
}

/// One arena slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// An in-memory document: a node arena rooted at [`NodeId::ROOT`], plus the
/// imported documents attached to its import elements.
///
/// Attachment forms a tree of documents; the units engine and the semantic
/// validator descend through attachments exactly as the original system
/// descended through instantiated imports.
#[derive(Debug)]
pub struct Document {
    id: DocId,
    nodes: Vec<Node>,
    imported: IndexMap<NodeId, Document>,
}

impl Document {
    /// Create an empty document containing only the document node.
    pub fn new() -> Self {
        Self {
            id: DocId(NEXT_DOC_ID.fetch_add(1, Ordering::Relaxed)),
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Document,
                children: Vec::new(),
            }],
            imported: IndexMap::new(),
        }
    }

    /// Process-unique identity of this document instance.
    pub fn id(&self) -> DocId {
        self.id
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: Some(parent),
            kind,
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Append an element child.
    pub fn push_element(
        &mut self,
        parent: NodeId,
        namespace: impl Into<String>,
        local: impl Into<String>,
    ) -> NodeId {
        self.push_node(
            parent,
            NodeKind::Element {
                name: QName::new(namespace, local),
                attributes: Vec::new(),
            },
        )
    }

    /// Append a text child.
    pub fn push_text(&mut self, parent: NodeId, data: impl Into<String>) -> NodeId {
        self.push_node(parent, NodeKind::Text { data: data.into() })
    }

    /// Append a CDATA section child.
    pub fn push_cdata(&mut self, parent: NodeId, data: impl Into<String>) -> NodeId {
        self.push_node(parent, NodeKind::Cdata { data: data.into() })
    }

    /// Append a comment child.
    pub fn push_comment(&mut self, parent: NodeId, data: impl Into<String>) -> NodeId {
        self.push_node(parent, NodeKind::Comment { data: data.into() })
    }

    /// Append a processing-instruction child.
    pub fn push_pi(
        &mut self,
        parent: NodeId,
        target: impl Into<String>,
        data: impl Into<String>,
    ) -> NodeId {
        self.push_node(
            parent,
            NodeKind::ProcessingInstruction {
                target: target.into(),
                data: data.into(),
            },
        )
    }

    /// Append an entity-reference child.
    pub fn push_entity_ref(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.push_node(parent, NodeKind::EntityRef { name: name.into() })
    }

    /// Set an attribute on an element, replacing any previous attribute
    /// with the same expanded name.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        namespace: impl Into<String>,
        local: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.set_attribute_inner(element, QName::new(namespace, local), None, value.into());
    }

    /// Set a prefixed attribute (`xlink:href="..."`).
    pub fn set_prefixed_attribute(
        &mut self,
        element: NodeId,
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        local: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.set_attribute_inner(
            element,
            QName::new(namespace, local),
            Some(prefix.into()),
            value.into(),
        );
    }

    fn set_attribute_inner(
        &mut self,
        element: NodeId,
        name: QName,
        prefix: Option<String>,
        value: String,
    ) {
        let NodeKind::Element { attributes, .. } = &mut self.nodes[element.index()].kind else {
            return;
        };
        if let Some(existing) = attributes.iter_mut().find(|a| a.name == name) {
            existing.prefix = prefix;
            existing.value = value;
        } else {
            attributes.push(Attribute {
                name,
                prefix,
                value,
            });
        }
    }

    /// Attach an imported document to an import element. The attachment is
    /// owned by this document and navigated by the engines when they cross
    /// the import boundary.
    pub fn attach_import(&mut self, import_element: NodeId, imported: Document) {
        self.imported.insert(import_element, imported);
    }

    /// The document attached to an import element, if any.
    pub fn imported_document(&self, import_element: NodeId) -> Option<&Document> {
        self.imported.get(&import_element)
    }

    /// All attachments, in attachment order.
    pub fn imported_documents(&self) -> impl Iterator<Item = (NodeId, &Document)> {
        self.imported.iter().map(|(id, doc)| (*id, doc))
    }

    // === Read access ===

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// The root element (first element child of the document node).
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|c| self.is_element(*c))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.index()].kind, NodeKind::Element { .. })
    }

    /// Expanded name of an element node.
    pub fn element_name(&self, id: NodeId) -> Option<&QName> {
        match &self.nodes[id.index()].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Attributes of an element, in document order.
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.nodes[id.index()].kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Value of the attribute with the given expanded name.
    pub fn attribute_value(&self, id: NodeId, namespace: &str, local: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name.matches(namespace, local))
            .map(|a| a.value.as_str())
    }

    /// Element children of a node, in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|c| self.is_element(*c))
    }

    /// Element children matching an expanded name.
    pub fn elements_named<'a>(
        &'a self,
        id: NodeId,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.element_children(id).filter(move |c| {
            self.element_name(*c)
                .map(|n| n.matches(namespace, local))
                .unwrap_or(false)
        })
    }

    /// Nearest ancestor element matching an expanded name.
    pub fn ancestor_named(&self, id: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if let Some(name) = self.element_name(p) {
                if name.matches(namespace, local) {
                    return Some(p);
                }
            }
            cur = self.parent(p);
        }
        None
    }

    /// Concatenated text and CDATA data directly under a node.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for c in self.children(id) {
            match &self.nodes[c.index()].kind {
                NodeKind::Text { data } | NodeKind::Cdata { data } => out.push_str(data),
                _ => {}
            }
        }
        out
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_tree_with_parent_links() {
        let mut doc = Document::new();
        let model = doc.push_element(NodeId::ROOT, "ns", "model");
        let comp = doc.push_element(model, "ns", "component");
        let txt = doc.push_text(comp, "hello");

        assert_eq!(doc.root_element(), Some(model));
        assert_eq!(doc.parent(comp), Some(model));
        assert_eq!(doc.parent(txt), Some(comp));
        assert_eq!(doc.children(model), &[comp]);
    }

    #[test]
    fn attribute_set_and_replace() {
        let mut doc = Document::new();
        let el = doc.push_element(NodeId::ROOT, "ns", "model");
        doc.set_attribute(el, "", "name", "a");
        doc.set_attribute(el, "", "name", "b");
        doc.set_attribute(el, "other", "name", "c");

        assert_eq!(doc.attribute_value(el, "", "name"), Some("b"));
        assert_eq!(doc.attribute_value(el, "other", "name"), Some("c"));
        assert_eq!(doc.attributes(el).len(), 2);
    }

    #[test]
    fn elements_named_filters_by_expanded_name() {
        let mut doc = Document::new();
        let model = doc.push_element(NodeId::ROOT, "ns", "model");
        doc.push_element(model, "ns", "units");
        doc.push_element(model, "other", "units");
        doc.push_element(model, "ns", "component");

        let units: Vec<_> = doc.elements_named(model, "ns", "units").collect();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn documents_get_distinct_ids() {
        let a = Document::new();
        let b = Document::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn attached_imports_are_navigable() {
        let mut inner = Document::new();
        inner.push_element(NodeId::ROOT, "ns", "model");

        let mut outer = Document::new();
        let model = outer.push_element(NodeId::ROOT, "ns", "model");
        let import = outer.push_element(model, "ns", "import");
        outer.attach_import(import, inner);

        let attached = outer.imported_document(import).unwrap();
        assert!(attached.root_element().is_some());
        assert_eq!(outer.imported_documents().count(), 1);
    }

    #[test]
    fn text_content_concatenates_text_and_cdata() {
        let mut doc = Document::new();
        let el = doc.push_element(NodeId::ROOT, "ns", "e");
        doc.push_text(el, "a ");
        doc.push_comment(el, "ignored");
        doc.push_cdata(el, "b");
        assert_eq!(doc.text_content(el), "a b");
    }
}
