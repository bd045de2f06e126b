//! Lexical scope paths for unit name resolution.
//!
//! Scopes are slash-separated strings built while descending a model and
//! its import closure:
//! - entering a component appends `comp_<name>`
//! - crossing an import appends `imp_bycomp_<alias>` (named after the
//!   first imported component) or `imp_byunits_<alias>` when the import
//!   brings in no component, or nothing when it brings in neither
//!
//! A units definition registers under its scope plus its own name, so
//! lookups widen from the innermost scope outward: each candidate drops
//! one trailing segment, ending at the bare name, and the first registry
//! hit wins.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A hierarchical scope prefix for unit registry keys.
///
/// Paths are cheap to clone and compare; the resolver keeps one per
/// visited container and derives child scopes while walking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopePath {
    segments: Vec<String>,
}

impl ScopePath {
    /// The root scope of the top-level model.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Scope of a component lexically inside this scope.
    pub fn component(&self, name: &str) -> Self {
        self.child(format!("comp_{name}"))
    }

    /// Scope inside an import crossing, named by the first imported
    /// component alias, or the first imported units alias when no
    /// component is imported.
    ///
    /// Returns `None` when the import carries neither, in which case the
    /// crossing contributes no segment and the parent scope continues.
    pub fn import(
        &self,
        first_component_alias: Option<&str>,
        first_units_alias: Option<&str>,
    ) -> Option<Self> {
        match (first_component_alias, first_units_alias) {
            (Some(c), _) => Some(self.child(format!("imp_bycomp_{c}"))),
            (None, Some(u)) => Some(self.child(format!("imp_byunits_{u}"))),
            (None, None) => None,
        }
    }

    fn child(&self, segment: String) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// The registry key for `name` declared directly in this scope.
    pub fn qualify(&self, name: &str) -> String {
        if self.segments.is_empty() {
            name.to_string()
        } else {
            let mut key = self.segments.join("/");
            key.push('/');
            key.push_str(name);
            key
        }
    }

    /// Registry keys to try for `name` seen from this scope, innermost
    /// first, ending with the bare name.
    pub fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = String> + 'a {
        (0..=self.segments.len()).rev().map(move |depth| {
            if depth == 0 {
                name.to_string()
            } else {
                let mut key = self.segments[..depth].join("/");
                key.push('/');
                key.push_str(name);
                key
            }
        })
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
