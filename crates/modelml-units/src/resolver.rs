//! Scoped resolution of unit definitions to canonical forms.
//!
//! A resolver walks one model and its import closure in three passes:
//!
//! 1. **collect**: descend the closure, register every units definition
//!    under its scoped keys, and re-export definitions across import
//!    boundaries under their alias names
//! 2. **scan**: resolve each `<unit>` reference to a definition or a
//!    built-in, in sorted key order, recording dependency edges
//! 3. **resolve**: depth-first over the dependency graph, expanding and
//!    canonicalizing one representation per definition
//!
//! Built-ins seed the registry at bare names before any user definition
//! registers, so the bare name of a built-in always resolves to it.
//! Unresolvable reference names are reported and skipped; a dependency
//! cycle aborts the remainder of the resolve pass.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use modelml_document::{DocId, Model, NodeId, UnitsDef};

use crate::builtin::{builtin_forms, is_builtin_unit};
use crate::canonical::CanonicalUnit;
use crate::reference::UnitReference;
use crate::scope::ScopePath;

/// Identity of a units definition across the import closure.
type NodeKey = (DocId, NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// One units definition gathered during collection.
#[derive(Debug)]
struct UnitsNode {
    name: String,
    container: ScopePath,
    /// Registry keys this definition answers to, primary scope first,
    /// then one per alias re-export.
    keys: Vec<String>,
    /// Child references in document order. An empty name marks a child
    /// with no usable units attribute.
    references: Vec<(String, UnitReference)>,
    deps: Vec<NodeKey>,
    state: Visit,
}

/// Canonical unit registry for one model closure.
///
/// Strictness is fixed at build time and flows into every representation
/// the resolver creates. Problems accumulate as text; a registry whose
/// [`model_error`](Self::model_error) is non-empty must not be trusted
/// for name lookups.
pub struct UnitsResolver {
    strict: bool,
    canonical: IndexMap<String, Rc<CanonicalUnit>>,
    error_description: String,
    warning_description: String,
}

impl UnitsResolver {
    /// Resolve every unit definition reachable from `model`.
    #[instrument(skip(model), name = "resolve_units")]
    pub fn build(model: &Model<'_>, strict: bool) -> Self {
        let mut resolver = UnitsResolver {
            strict,
            canonical: IndexMap::new(),
            error_description: String::new(),
            warning_description: String::new(),
        };
        for (name, form) in builtin_forms(strict) {
            resolver.canonical.insert(name.to_string(), Rc::new(form));
        }

        let mut nodes: IndexMap<NodeKey, UnitsNode> = IndexMap::new();
        collect_model(model, &ScopePath::root(), &mut nodes);
        debug!(definitions = nodes.len(), "collected unit definitions");

        // Sorted key order fixes message order, scan order, and which
        // definition wins when two register the same key.
        let mut key_index: Vec<(String, NodeKey)> = nodes
            .iter()
            .flat_map(|(nk, node)| node.keys.iter().map(move |k| (k.clone(), *nk)))
            .collect();
        key_index.sort_by(|a, b| a.0.cmp(&b.0));

        let mut by_key: IndexMap<String, NodeKey> = IndexMap::new();
        let mut order: Vec<NodeKey> = Vec::new();
        let mut seen: HashSet<NodeKey> = HashSet::new();
        for (key, nk) in &key_index {
            by_key.entry(key.clone()).or_insert(*nk);
            if seen.insert(*nk) {
                order.push(*nk);
            }
        }

        resolver.scan(&mut nodes, &by_key, &order);
        resolver.resolve_all(&mut nodes, &order);

        debug!(
            forms = resolver.canonical.len(),
            clean = resolver.error_description.is_empty()
                && resolver.warning_description.is_empty(),
            "unit resolution complete"
        );
        resolver
    }

    /// Whether representations from this registry compare scale and
    /// offset.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Accumulated problem text, errors first, each entry ending in
    /// `"; "`. Empty when resolution was clean.
    pub fn model_error(&self) -> String {
        let mut out = self.error_description.clone();
        out.push_str(&self.warning_description);
        out
    }

    /// Find the canonical form `name` resolves to when seen from
    /// `scope`, widening outward to the bare name.
    pub fn units_by_name(&self, scope: &ScopePath, name: &str) -> Option<Rc<CanonicalUnit>> {
        scope
            .candidates(name)
            .find_map(|key| self.canonical.get(&key).cloned())
    }

    /// Link every reference to its definition, reporting names that are
    /// neither in scope nor built-in.
    fn scan(
        &mut self,
        nodes: &mut IndexMap<NodeKey, UnitsNode>,
        by_key: &IndexMap<String, NodeKey>,
        order: &[NodeKey],
    ) {
        for nk in order {
            let mut deps = Vec::new();
            {
                let node = &nodes[nk];
                for (ref_name, _) in &node.references {
                    if ref_name.is_empty() {
                        self.warning_description
                            .push_str("Found a unit with no units attribute in units ");
                        self.warning_description.push_str(&node.name);
                        self.warning_description.push_str("; ");
                        continue;
                    }
                    let found = node
                        .container
                        .candidates(ref_name)
                        .find_map(|key| by_key.get(&key).copied());
                    match found {
                        Some(dep) => deps.push(dep),
                        None if is_builtin_unit(ref_name) => {}
                        None => {
                            self.error_description.push_str("Units ");
                            self.error_description.push_str(&node.name);
                            self.error_description.push_str(" references units ");
                            self.error_description.push_str(ref_name);
                            self.error_description
                                .push_str(" but the latter units could not be found; ");
                        }
                    }
                }
            }
            if let Some(node) = nodes.get_mut(nk) {
                node.deps = deps;
            }
        }
    }

    fn resolve_all(&mut self, nodes: &mut IndexMap<NodeKey, UnitsNode>, order: &[NodeKey]) {
        for nk in order {
            if !self.visit(nodes, *nk) {
                // A cycle poisons the rest of the pass.
                return;
            }
        }
    }

    fn visit(&mut self, nodes: &mut IndexMap<NodeKey, UnitsNode>, key: NodeKey) -> bool {
        match nodes[&key].state {
            Visit::Done => return true,
            Visit::InProgress => {
                self.error_description
                    .push_str("Units are defined circularly. One unit in the cycle is ");
                let name = nodes[&key].name.clone();
                self.error_description.push_str(&name);
                self.error_description.push_str("; ");
                return false;
            }
            Visit::Unvisited => {}
        }
        if let Some(node) = nodes.get_mut(&key) {
            node.state = Visit::InProgress;
        }
        let deps = nodes[&key].deps.clone();
        for dep in deps {
            if !self.visit(nodes, dep) {
                return false;
            }
        }
        self.compute(nodes, key);
        if let Some(node) = nodes.get_mut(&key) {
            node.state = Visit::Done;
        }
        true
    }

    /// Expand every reference of one definition and register the
    /// canonicalized result under all of its keys. References whose
    /// target never resolved are skipped here; the scan already reported
    /// them.
    fn compute(&mut self, nodes: &IndexMap<NodeKey, UnitsNode>, key: NodeKey) {
        let node = &nodes[&key];
        let mut form = CanonicalUnit::new(self.strict);
        for (ref_name, reference) in &node.references {
            if ref_name.is_empty() {
                continue;
            }
            let target = node
                .container
                .candidates(ref_name)
                .find_map(|k| self.canonical.get(&k).cloned());
            if let Some(target) = target {
                form.expand_reference(reference, &target);
            }
        }
        form.canonicalize();
        let form = Rc::new(form);
        for k in &node.keys {
            self.canonical
                .entry(k.clone())
                .or_insert_with(|| form.clone());
        }
    }
}

/// Descend one model, collecting definitions and returning the names it
/// exports to importing models: its model-level definitions plus its own
/// alias re-exports. Component-level definitions stay internal.
fn collect_model(
    model: &Model<'_>,
    scope: &ScopePath,
    nodes: &mut IndexMap<NodeKey, UnitsNode>,
) -> IndexMap<String, NodeKey> {
    let mut exports: IndexMap<String, NodeKey> = IndexMap::new();

    for units in model.local_units() {
        let nk = collect_definition(&units, scope, nodes);
        if let Some(name) = units.name() {
            if !name.is_empty() {
                exports.entry(name.to_string()).or_insert(nk);
            }
        }
    }

    for component in model.local_components() {
        let comp_scope = scope.component(component.name().unwrap_or(""));
        for units in component.local_units() {
            collect_definition(&units, &comp_scope, nodes);
        }
    }

    for import in model.imports() {
        let components = import.components();
        let units_aliases = import.units();
        let child_scope = scope
            .import(
                components.first().and_then(|c| c.name()),
                units_aliases.first().and_then(|u| u.name()),
            )
            .unwrap_or_else(|| scope.clone());

        let child_exports = match import.imported_model() {
            Some(imported) => collect_model(&imported, &child_scope, nodes),
            None => IndexMap::new(),
        };

        for alias in &units_aliases {
            let (Some(alias_name), Some(units_ref)) = (alias.name(), alias.units_ref()) else {
                continue;
            };
            let Some(&target) = child_exports.get(units_ref) else {
                continue;
            };
            if let Some(node) = nodes.get_mut(&target) {
                node.keys.push(scope.qualify(alias_name));
            }
            exports.entry(alias_name.to_string()).or_insert(target);
        }
    }

    exports
}

fn collect_definition(
    units: &UnitsDef<'_>,
    container: &ScopePath,
    nodes: &mut IndexMap<NodeKey, UnitsNode>,
) -> NodeKey {
    let nk = (units.document().id(), units.node());
    let name = units.name().unwrap_or("").to_string();
    let references = units
        .unit_elements()
        .iter()
        .map(|el| {
            (
                el.units_name().unwrap_or("").to_string(),
                UnitReference::from_element(el),
            )
        })
        .collect();
    nodes.insert(
        nk,
        UnitsNode {
            keys: vec![container.qualify(&name)],
            name,
            container: container.clone(),
            references,
            deps: Vec::new(),
            state: Visit::Unvisited,
        },
    );
    nk
}
