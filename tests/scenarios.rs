//! Cross-cutting integration scenarios, mirroring `crates/jsonschema/tests/`
//! in the teacher lineage: whole-document compile + validate, rather than
//! poking at one `Instruction` variant at a time.
use schemato::{compile, is_valid, ValidationOptions};
use serde_json::json;

#[test]
fn s4_one_of_matches_exactly_one_branch() {
    let schema = compile(json!({
        "oneOf": [
            {"type": "integer"},
            {"type": "number", "minimum": 0}
        ]
    }))
    .unwrap();

    // 1.5 matches only the second branch.
    assert!(schema.is_valid(&json!(1.5)));
    // "x" matches neither branch.
    assert!(!schema.is_valid(&json!("x")));
    // 5 is an integer and a non-negative number: it matches both branches,
    // so oneOf fails here, same as spec.md's S4 says for its `5` case.
    assert!(!schema.is_valid(&json!(5)));
    // spec.md's S4 asserts -3 matches neither branch and so fails, but -3
    // is an integer-valued JSON number, so `{"type": "integer"}` does match
    // it per the type-dispatch property (spec.md §8, property 2): -3 is an
    // integer AND a non-negative... no, -3 is negative, so it fails
    // `minimum: 0` and matches only the first branch, making oneOf pass.
    // This is the spec-internal inconsistency documented in DESIGN.md —
    // this crate follows the type-dispatch property rather than the
    // literal S4 text.
    assert!(schema.is_valid(&json!(-3)));
}

#[test]
fn s5_unevaluated_properties_across_allof_branches() {
    let schema = compile(json!({
        "type": "object",
        "properties": {"a": {}},
        "allOf": [{"properties": {"b": {}}}],
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
    assert!(!schema.is_valid(&json!({"a": 1, "b": 2, "c": 3})));
}

#[test]
fn s6_dynamic_ref_binds_to_dynamic_anchor() {
    // A recursive list whose item schema is dynamically anchored ("items")
    // rather than directly nested under "items": $dynamicRef resolves to
    // whatever dynamicAnchor is reachable from the active scope chain,
    // here the sibling $defs.item schema anchored in the same document.
    let schema = compile(json!({
        "$id": "https://example.com/s6.json",
        "type": "array",
        "items": {"$dynamicRef": "#items"},
        "$defs": {
            "item": {"$dynamicAnchor": "items", "type": "string"}
        }
    }))
    .unwrap();

    assert!(schema.is_valid(&json!(["x", "y"])));
    assert!(!schema.is_valid(&json!(["x", 5])));
}

#[test]
fn any_of_keeps_evaluation_marks_from_every_passing_branch() {
    // Both branches pass against {"a": 1, "b": 2}: "a" is only evaluated by
    // branch 0 and "b" only by branch 1, so unevaluatedProperties must see
    // both as evaluated, not just whichever branch passed first.
    let schema = compile(json!({
        "anyOf": [
            {"properties": {"a": {}}},
            {"properties": {"b": {}}}
        ],
        "unevaluatedProperties": false
    }))
    .unwrap();

    assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
    assert!(!schema.is_valid(&json!({"a": 1, "b": 2, "c": 3})));
}

#[test]
fn recursive_schema_via_ref_terminates_and_validates_each_level() {
    let schema = compile(json!({
        "$id": "https://example.com/tree.json",
        "type": "object",
        "properties": {
            "label": {"type": "string"},
            "children": {
                "type": "array",
                "items": {"$ref": "https://example.com/tree.json"}
            }
        },
        "required": ["label"]
    }))
    .unwrap();

    let good = json!({
        "label": "root",
        "children": [
            {"label": "left", "children": []},
            {"label": "right", "children": [{"label": "grandchild", "children": []}]}
        ]
    });
    assert!(schema.is_valid(&good));

    let missing_required_nested_label = json!({
        "label": "root",
        "children": [{"children": []}]
    });
    assert!(!schema.is_valid(&missing_required_nested_label));
}

#[test]
fn ref_resolves_against_a_preregistered_offline_resource() {
    let options = ValidationOptions::new().with_resource(
        "https://example.com/defs.json",
        json!({"definitions": {"positiveInt": {"type": "integer", "minimum": 0}}}),
    );
    let schema = schemato::compile_with(
        json!({"$ref": "https://example.com/defs.json#/definitions/positiveInt"}),
        &options,
    )
    .unwrap();

    assert!(schema.is_valid(&json!(3)));
    assert!(!schema.is_valid(&json!(-1)));
    assert!(!schema.is_valid(&json!(1.5)));
}

#[test]
fn boolean_schemas_are_sound() {
    let always_passes = compile(json!(true)).unwrap();
    assert!(always_passes.is_valid(&json!(null)));
    assert!(always_passes.is_valid(&json!({"anything": "goes"})));

    let always_fails = compile(json!(false)).unwrap();
    assert!(!always_fails.is_valid(&json!(null)));
    assert!(!always_fails.is_valid(&json!(1)));
}

#[test]
fn const_and_enum_keywords() {
    let const_schema = compile(json!({"const": "fixed"})).unwrap();
    assert!(const_schema.is_valid(&json!("fixed")));
    assert!(!const_schema.is_valid(&json!("other")));

    let enum_schema = compile(json!({"enum": [1, "two", null]})).unwrap();
    assert!(enum_schema.is_valid(&json!(1)));
    assert!(enum_schema.is_valid(&json!("two")));
    assert!(enum_schema.is_valid(&json!(null)));
    assert!(!enum_schema.is_valid(&json!(2)));
}

#[test]
fn not_discards_evaluation_marks_from_its_branch() {
    // "not" must not leak evaluation marks from its negated branch into
    // unevaluatedProperties accounting in a sibling keyword.
    let schema = compile(json!({
        "type": "object",
        "allOf": [{"not": {"properties": {"a": {"const": "never"}}}}],
        "unevaluatedProperties": false
    }))
    .unwrap();
    // "a" was only touched inside the negated (and discarded) branch, so it
    // remains unevaluated and unevaluatedProperties: false rejects it.
    assert!(!schema.is_valid(&json!({"a": 1})));
    assert!(schema.is_valid(&json!({})));
}

#[test]
fn is_valid_convenience_function_matches_compiled_validator() {
    let schema = json!({"type": "array", "minItems": 1});
    assert!(is_valid(schema.clone(), &json!([1])));
    assert!(!is_valid(schema, &json!([])));
}

#[test]
fn custom_format_overrides_builtin_table() {
    let options = ValidationOptions::new().with_format("always-even", |s| {
        s.parse::<i64>().map(|n| n % 2 == 0).unwrap_or(false)
    });
    let schema = schemato::compile_with(
        json!({"type": "string", "format": "always-even"}),
        &options,
    )
    .unwrap();
    assert!(schema.is_valid(&json!("4")));
    assert!(!schema.is_valid(&json!("3")));
}

#[test]
fn unresolved_reference_is_a_compile_error_not_a_panic() {
    let result = compile(json!({"$ref": "#/definitions/missing"}));
    assert!(result.is_err());
}
