//! End-to-end scenarios over the full validation pipeline.
//!
//! Each test builds a complete model document, runs structural and
//! semantic validation through `validate_model`, and checks the
//! resulting diagnostics (and, where relevant, the unit registry
//! directly).

use modelml_document::{ModelVersion, MODELML_1_1_NS};
use modelml_tests::ModelHarness;
use modelml_units::ScopePath;
use modelml_validate::Severity;

/// A small but complete model: units with prefixes, an encapsulation
/// hierarchy, and a parent-child connection. Nothing to report.
#[test]
fn test_complete_model_is_clean() {
    let mut h = ModelHarness::new("circulation");

    let mv = h.units(h.model_node(), "mv");
    h.unit(mv, "volt", &[("prefix", "milli")]);
    let per_sec = h.units(h.model_node(), "per_second");
    h.unit(per_sec, "second", &[("exponent", "-1")]);

    let heart = h.component("heart");
    let v = h.variable(heart, "potential", "mv");
    h.set_attr(v, "private_interface", "out");
    let rate = h.variable(heart, "rate", "per_second");
    h.set_attr(rate, "initial_value", "1.2");
    let valve = h.component("valve");
    let w = h.variable(valve, "potential_in", "mv");
    h.set_attr(w, "public_interface", "in");

    h.group("encapsulation", "heart", &["valve"]);
    h.connect("heart", "valve", &[("potential", "potential_in")]);

    assert!(h.validate().is_empty(), "{}", h.report());
}

/// Celsius to Kelvin is an affine conversion: factor 1, offset 273.15.
#[test]
fn test_celsius_to_kelvin_conversion() {
    let mut h = ModelHarness::new("thermo");
    let celsius = h.units(h.model_node(), "body_temp");
    h.unit(celsius, "celsius", &[]);
    let kelvin = h.units(h.model_node(), "lab_temp");
    h.unit(kelvin, "kelvin", &[]);

    let resolver = h.resolver(true);
    assert_eq!(resolver.model_error(), "");

    let root = ScopePath::root();
    let c = resolver.units_by_name(&root, "body_temp").unwrap();
    let k = resolver.units_by_name(&root, "lab_temp").unwrap();

    let conv = c.conversion_to(&k);
    assert!((conv.factor - 1.0).abs() < 1e-12);
    assert!((conv.offset - 273.15).abs() < 1e-12);
    assert!((conv.apply(0.0) - 273.15).abs() < 1e-12);

    // Strict comparison separates them; weak does not.
    assert!(!c.compatible_with(&k));
    let weak = h.resolver(false);
    let c = weak.units_by_name(&root, "body_temp").unwrap();
    let k = weak.units_by_name(&root, "lab_temp").unwrap();
    assert!(c.compatible_with(&k));
}

/// Mutually recursive unit definitions abort the resolution pass: one
/// model error naming the cycle, a companion warning, and no canonical
/// form for either unit.
#[test]
fn test_circular_units_poison_the_run() {
    let mut h = ModelHarness::new("loopy");
    let u1 = h.units(h.model_node(), "u1");
    h.unit(u1, "u2", &[]);
    let u2 = h.units(h.model_node(), "u2");
    h.unit(u2, "u1", &[]);

    let resolver = h.resolver(true);
    assert!(resolver.model_error().contains("Units are defined circularly"));
    let root = ScopePath::root();
    assert!(resolver.units_by_name(&root, "u1").is_none());
    assert!(resolver.units_by_name(&root, "u2").is_none());

    let diagnostics = h.validate();
    let cycle = diagnostics
        .iter()
        .find(|d| d.description.contains("Units are defined circularly"))
        .expect("cycle diagnostic");
    assert_eq!(cycle.severity, Severity::Error);
    let supplement = cycle.supplement.as_ref().expect("companion warning");
    assert_eq!(supplement.severity, Severity::Warning);
    assert!(supplement.description.contains("unit names"));
}

/// Shadowing a built-in is a semantic defect, not a structural one.
#[test]
fn test_reserved_unit_name_is_semantic_only() {
    let mut h = ModelHarness::new("m");
    let metre = h.units(h.model_node(), "metre");
    h.unit(metre, "second", &[]);

    let diagnostics = h.validate();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].description,
        "Units in the model uses reserved name metre"
    );
    assert!(!diagnostics[0].is_structural());
}

/// A name defined at model scope and again inside a component: inner
/// contexts see the component definition, outer contexts the model one.
#[test]
fn test_component_scope_shadows_model_scope() {
    let mut h = ModelHarness::new("m");
    let model_x = h.units(h.model_node(), "x");
    h.unit(model_x, "second", &[]);

    let c = h.component("c");
    let comp_x = h.units(c, "x");
    h.unit(comp_x, "metre", &[]);
    h.variable(c, "inner", "x");

    let elsewhere = h.component("elsewhere");
    h.variable(elsewhere, "outer", "x");

    assert!(h.validate().is_empty(), "{}", h.report());

    let resolver = h.resolver(false);
    let metre = resolver.units_by_name(&ScopePath::root(), "metre").unwrap();
    let second = resolver
        .units_by_name(&ScopePath::root(), "second")
        .unwrap();

    let inner = resolver
        .units_by_name(&h.component_scope("c"), "x")
        .unwrap();
    assert!(inner.compatible_with(&metre));

    let outer = resolver
        .units_by_name(&h.component_scope("elsewhere"), "x")
        .unwrap();
    assert!(outer.compatible_with(&second));
}

/// Two siblings both exporting: the mapping must pair an out with an in.
#[test]
fn test_sibling_connection_with_matching_directions() {
    let mut h = ModelHarness::new("m");
    let a = h.component("a");
    let v = h.variable(a, "v", "second");
    h.set_attr(v, "public_interface", "out");
    let b = h.component("b");
    let w = h.variable(b, "w", "second");
    h.set_attr(w, "public_interface", "out");
    h.connect("a", "b", &[("v", "w")]);

    assert_eq!(
        h.error_descriptions(),
        vec![
            "Mapping variable_1 has public interface of out \
             but variable_2 also has public interface of out"
                .to_string()
        ]
    );
}

/// The same component may head at most one hierarchy per relationship
/// identity, across all groups in the model.
#[test]
fn test_non_terminal_component_ref_rule() {
    let mut h = ModelHarness::new("m");
    for name in ["a", "b", "c"] {
        h.component(name);
    }
    h.group("containment", "a", &["b"]);
    h.group("containment", "a", &["c"]);

    let errors = h.error_descriptions();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("has more than one non-terminal component_ref to a"));

    // Distinct relationship names keep the hierarchies independent.
    let mut h = ModelHarness::new("m");
    for name in ["a", "b", "c"] {
        h.component(name);
    }
    h.group("containment", "a", &["b"]);
    h.group("encapsulation", "a", &["c"]);
    assert!(h.validate().is_empty(), "{}", h.report());
}

/// Imported models are validated with the same rules, and alias
/// integrity is checked against what the imported model declares.
#[test]
fn test_import_closure_is_validated() {
    let mut inner = ModelHarness::in_namespace(MODELML_1_1_NS, "organ");
    let shared = inner.units(inner.model_node(), "shared");
    inner.unit(shared, "metre", &[("prefix", "centi")]);
    inner.component("heart");
    // Defect inside the imported model: a reserved units name.
    let bad = inner.units(inner.model_node(), "ampere");
    inner.unit(bad, "second", &[]);

    let mut outer = ModelHarness::in_namespace(MODELML_1_1_NS, "body");
    outer.import(inner, &[("pump", "heart")], &[("borrowed", "shared"), ("ghost", "absent")]);

    let errors = outer.error_descriptions();
    assert_eq!(
        errors,
        vec![
            "units_ref absent refers to units which don't exist".to_string(),
            "Units in the model uses reserved name ampere".to_string(),
        ]
    );

    // The alias re-export is usable from the importing model.
    let resolver = outer.resolver(false);
    let borrowed = resolver
        .units_by_name(&ScopePath::root(), "borrowed")
        .unwrap();
    let metre = resolver.units_by_name(&ScopePath::root(), "metre").unwrap();
    assert!(borrowed.compatible_with(&metre));
    assert!((borrowed.si_conversion().factor - 1e-2).abs() < 1e-15);
}

/// `import` is not part of the 1.0 vocabulary.
#[test]
fn test_import_is_rejected_in_version_1_0() {
    let mut h = ModelHarness::new("m");
    h.element(h.model_node(), "import", &[]);

    let diagnostics = h.validate();
    assert!(diagnostics.iter().any(|d| {
        d.is_structural() && d.description == "Element import is invalid in this version of ModelML"
    }));
    assert_eq!(
        ModelVersion::from_namespace(MODELML_1_1_NS),
        Some(ModelVersion::V1_1)
    );
}

/// The rendered report carries reconstructed positions.
#[test]
fn test_report_positions() {
    let mut h = ModelHarness::new("m");
    let metre = h.units(h.model_node(), "metre");
    h.unit(metre, "second", &[]);

    let report = h.report();
    assert!(report.contains("error: Units in the model uses reserved name metre"));
    assert!(report.contains("  --> "), "no position line: {report}");
}

/// Diagnostics serialize for embedders that ship them across a process
/// boundary.
#[test]
fn test_diagnostics_serialize() {
    let mut h = ModelHarness::new("m");
    h.component("dup");
    h.component("dup");

    let diagnostics = h.validate();
    let json = serde_json::to_string(&diagnostics).unwrap();
    let back: Vec<modelml_validate::Diagnostic> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, diagnostics);
}
