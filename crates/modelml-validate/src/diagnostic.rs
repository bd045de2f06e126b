//! Validity findings and their rendered form.
//!
//! Every problem the validator detects becomes a [`Diagnostic`]: a
//! severity, a human-readable description, and an origin anchoring the
//! finding to a node or attribute of some document in the import forest.
//! Structural findings point at raw tree nodes; semantic findings point
//! at the declaring element of the construct that failed a model-level
//! rule. A diagnostic may carry a supplement adding detail to the
//! primary finding.
//!
//! [`DiagnosticFormatter`] turns diagnostics into display text, using
//! position reconstruction to recover (row, column) pairs from the
//! otherwise position-free tree.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use modelml_document::{position_of, DocId, Document, NodeId, PositionTarget};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Where a finding is anchored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiagnosticOrigin {
    /// A structural finding against a raw node or attribute, with a
    /// character offset into its data.
    Representation {
        doc: DocId,
        target: PositionTarget,
        offset: u32,
    },
    /// A model-level finding against a declaring element.
    Semantic { doc: DocId, element: NodeId },
}

impl DiagnosticOrigin {
    /// The document the finding lives in.
    pub fn document(&self) -> DocId {
        match self {
            DiagnosticOrigin::Representation { doc, .. } => *doc,
            DiagnosticOrigin::Semantic { doc, .. } => *doc,
        }
    }

    /// The position target for display purposes.
    pub fn target(&self) -> PositionTarget {
        match self {
            DiagnosticOrigin::Representation { target, .. } => target.clone(),
            DiagnosticOrigin::Semantic { element, .. } => PositionTarget::Node(*element),
        }
    }

    /// Character offset into the target's data.
    pub fn offset(&self) -> u32 {
        match self {
            DiagnosticOrigin::Representation { offset, .. } => *offset,
            DiagnosticOrigin::Semantic { .. } => 0,
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub description: String,
    pub origin: DiagnosticOrigin,
    /// Optional secondary finding with further detail.
    pub supplement: Option<Box<Diagnostic>>,
}

impl Diagnostic {
    pub fn error(description: impl Into<String>, origin: DiagnosticOrigin) -> Self {
        Diagnostic {
            severity: Severity::Error,
            description: description.into(),
            origin,
            supplement: None,
        }
    }

    pub fn warning(description: impl Into<String>, origin: DiagnosticOrigin) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            description: description.into(),
            origin,
            supplement: None,
        }
    }

    /// Attach a secondary finding.
    pub fn with_supplement(mut self, supplement: Diagnostic) -> Self {
        self.supplement = Some(Box::new(supplement));
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// True for findings produced by the structural walk.
    pub fn is_structural(&self) -> bool {
        matches!(self.origin, DiagnosticOrigin::Representation { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.description)
    }
}

impl std::error::Error for Diagnostic {}

/// Renders diagnostics with reconstructed source positions.
///
/// The formatter owns nothing: it borrows the root document and resolves
/// each diagnostic's [`DocId`] through the attached import forest.
pub struct DiagnosticFormatter<'a> {
    root: &'a Document,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(root: &'a Document) -> Self {
        DiagnosticFormatter { root }
    }

    /// Format one diagnostic as a multi-line block.
    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{diagnostic}");

        if let Some(doc) = find_document(self.root, diagnostic.origin.document()) {
            let position = position_of(doc, &diagnostic.origin.target(), diagnostic.origin.offset());
            let _ = writeln!(out, "  --> {}:{}", position.row, position.column);
        }

        let mut supplement = diagnostic.supplement.as_deref();
        while let Some(extra) = supplement {
            let _ = writeln!(out, "   = note: {}", extra.description);
            supplement = extra.supplement.as_deref();
        }

        out
    }

    /// Format a whole report, one blank line between findings.
    pub fn format_all(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|d| self.format(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn find_document(doc: &Document, id: DocId) -> Option<&Document> {
    if doc.id() == id {
        return Some(doc);
    }
    doc.imported_documents()
        .find_map(|(_, imported)| find_document(imported, id))
}
