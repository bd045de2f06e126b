//! # ModelML validator
//!
//! Two-pass validation of a ModelML document tree:
//!
//! - a table-driven structural walk over the raw tree (element/attribute
//!   vocabulary, cardinalities, version applicability, literal syntax)
//! - whole-model semantic checks over the typed views (name uniqueness,
//!   variables, connections, groups, imports), consulting the unit
//!   engine for dimensional compatibility
//!
//! [`validate_model`] runs both and returns every finding as an ordered
//! [`Diagnostic`] list; nothing stops at the first problem. Unit
//! resolution failing is the one degradation: its error is surfaced once
//! and every subsequent unit-name check is withheld.

pub mod diagnostic;
mod grammar;
mod semantic;

pub use diagnostic::{Diagnostic, DiagnosticFormatter, DiagnosticOrigin, Severity};

use tracing::{debug, instrument};

use modelml_document::{Document, Model, ModelViewError};
use modelml_units::UnitsResolver;

const UNIT_CHECKING_WITHHELD: &str =
    "Cannot perform any further checking of unit names due to problems \
     processing the model units";

/// Validate one document and its attached import closure.
///
/// Fails only when the document cannot be read as a model at all; every
/// defect in a readable model comes back as a diagnostic.
#[instrument(skip(doc), name = "validate_model")]
pub fn validate_model(doc: &Document) -> Result<Vec<Diagnostic>, ModelViewError> {
    let model = Model::of(doc)?;
    let mut out = Vec::new();

    grammar::validate_representation(&model, &mut out);

    let strict = UnitsResolver::build(&model, true);
    let weak = UnitsResolver::build(&model, false);
    let model_error = strict.model_error();
    if model_error.is_empty() {
        semantic::validate_semantics(&model, Some(&strict), Some(&weak), &mut out);
    } else {
        debug!("unit resolution failed, withholding unit-name checks");
        let origin = DiagnosticOrigin::Semantic {
            doc: doc.id(),
            element: model.node(),
        };
        out.push(
            Diagnostic::error(model_error, origin.clone())
                .with_supplement(Diagnostic::warning(UNIT_CHECKING_WITHHELD, origin)),
        );
        semantic::validate_semantics(&model, None, None, &mut out);
    }

    Ok(out)
}
