//! Position reconstruction for diagnostic display.
//!
//! The tree carries no source offsets, so a diagnostic's (node, character
//! offset) pair is mapped to a (row, column) by replaying the canonical
//! serialization of the document from its root: attributes separated by
//! single spaces, `<` escaped to four columns, `"` to six, `\n` resetting
//! the column and advancing the row, `\r` ignored. The replay stops the
//! moment the running position reaches the target.
//!
//! This is a best-effort approximation: a document whose real formatting
//! differs from the canonical form gets positions that are close, not
//! exact.

use serde::{Deserialize, Serialize};

use crate::tree::{Document, NodeId, NodeKind, QName};

/// A 1-based (row, column) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub column: u32,
}

/// What the replay is looking for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionTarget {
    /// An element, text, CDATA, comment, processing-instruction, or
    /// entity-reference node; the offset counts characters into its data
    /// (for elements it is added to the column directly).
    Node(NodeId),
    /// An attribute of an element; the offset counts characters into the
    /// attribute value.
    Attribute { element: NodeId, name: QName },
}

/// Reconstruct the position of `target` within `doc`.
///
/// If the target is never reached (a handle from a different document),
/// the position of the end of the replay is returned.
pub fn position_of(doc: &Document, target: &PositionTarget, offset: u32) -> Position {
    let mut cursor = Cursor {
        row: 1,
        column: 1,
        remaining: offset,
    };
    cursor.advance_node(doc, NodeId::ROOT, target);
    Position {
        row: cursor.row,
        column: cursor.column,
    }
}

struct Cursor {
    row: u32,
    column: u32,
    remaining: u32,
}

impl Cursor {
    /// Replay one node. Returns true when the target was reached.
    fn advance_node(&mut self, doc: &Document, node: NodeId, target: &PositionTarget) -> bool {
        let is_target_node = matches!(target, PositionTarget::Node(n) if *n == node);

        let mut visit_children = false;
        let mut trailing = 0u32;

        match &doc.node(node).kind {
            NodeKind::Document => {
                if is_target_node {
                    return true;
                }
                // The declaration line.
                self.column = 1;
                self.row += 1;
                visit_children = true;
            }
            NodeKind::Element { name, attributes } => {
                if is_target_node {
                    self.column += 1 + self.remaining;
                    return true;
                }

                for (i, attr) in attributes.iter().enumerate() {
                    if i != 0 {
                        self.column += 1;
                    }
                    // name="
                    self.column += attr.qualified_len() as u32 + 2;
                    let is_target_attr = matches!(
                        target,
                        PositionTarget::Attribute { element, name }
                            if *element == node && *name == attr.name
                    );
                    self.advance_str(&attr.value, is_target_attr);
                    if is_target_attr {
                        return true;
                    }
                    // Closing quote.
                    self.column += 1;
                }

                if doc.children(node).is_empty() {
                    self.column += 2; // />
                } else {
                    self.column += 1; // >
                    trailing = 3 + name.local.len() as u32; // </name>
                    visit_children = true;
                }
            }
            NodeKind::Text { data } => {
                self.advance_str(data, is_target_node);
                if is_target_node {
                    return true;
                }
            }
            NodeKind::Cdata { data } => {
                // [CDATA[
                self.column += 7;
                self.advance_str(data, is_target_node);
                if is_target_node {
                    return true;
                }
            }
            NodeKind::Comment { data } => {
                // <!--
                self.column += 4;
                self.advance_str(data, is_target_node);
                if is_target_node {
                    return true;
                }
                // -->
                self.column += 3;
            }
            NodeKind::ProcessingInstruction { target: pi_target, data } => {
                // <?
                self.column += 2;
                self.column += pi_target.len() as u32 + 1;
                self.advance_str(data, is_target_node);
                if is_target_node {
                    return true;
                }
            }
            NodeKind::EntityRef { name } => {
                if is_target_node {
                    return true;
                }
                self.column += 1 + name.len() as u32;
            }
        }

        if visit_children {
            for child in doc.children(node) {
                if self.advance_node(doc, *child, target) {
                    return true;
                }
            }
        }

        self.column += trailing;
        false
    }

    /// Replay a character run. When `stop_here`, the replay halts just
    /// before the character at the target offset.
    fn advance_str(&mut self, s: &str, stop_here: bool) -> bool {
        for c in s.chars() {
            if stop_here {
                if self.remaining == 0 {
                    return true;
                }
                self.remaining -= 1;
            }
            match c {
                '\r' => {}
                '\n' => {
                    self.column = 1;
                    self.row += 1;
                }
                '<' => self.column += 4,  // &lt;
                '"' => self.column += 6,  // &quot;
                _ => self.column += 1,
            }
        }
        false
    }
}
