//! # ModelML document layer
//!
//! Read-only document infrastructure consumed by the unit engine and the
//! validator:
//!
//! - [`tree`] — arena-backed node tree with a programmatic builder
//! - [`ns`] — namespace URIs and language version detection
//! - [`model`] — typed views (model, component, variable, units, ...)
//!   that follow import indirection across attached documents
//! - [`position`] — best-effort (row, column) reconstruction for
//!   diagnostics
//!
//! Parsing from raw bytes is deliberately absent: embedders hand over an
//! already-built tree, and tests construct trees with the builder.

pub mod model;
pub mod ns;
pub mod position;
pub mod tree;

pub use model::{
    Component, ComponentDecl, ComponentRef, Connection, Group, Import, ImportComponent,
    ImportUnits, MapComponents, MapVariables, Model, ModelViewError, RelationshipRef, UnitElement,
    UnitsDecl, UnitsDef, Variable, VariableInterface,
};
pub use ns::{ModelVersion, MATHML_NS, MODELML_1_0_NS, MODELML_1_1_NS, XLINK_NS};
pub use position::{position_of, Position, PositionTarget};
pub use tree::{Attribute, DocId, Document, Node, NodeId, NodeKind, QName};
