//! Tests for the extract module

use super::*;
use crate::decode::Payload;
use crate::Error;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn sample() -> Value {
    json!({
        "a": {"b": [1, 2, 3], "c": "x"},
        "items": [
            {"id": 1, "tags": ["p", "q"]},
            {"id": 2, "tags": []},
            {"name": "no id"}
        ],
        "dotted.key": {"v": true},
        "0": "numeric key"
    })
}

// ============================================================================
// Dot Path Tests
// ============================================================================

#[test_case("a.b", json!([1, 2, 3]) ; "nested key")]
#[test_case("a.c", json!("x") ; "string leaf")]
#[test_case("a.b.1", json!(2) ; "numeric segment")]
#[test_case("a.b[-1]", json!(3) ; "negative index")]
#[test_case("items[0].id", json!(1) ; "bracket index")]
#[test_case("items.#", json!(3) ; "array length")]
#[test_case("items.#.id", json!([1, 2]) ; "map over array")]
#[test_case("items.0.tags.#", json!(2) ; "nested length")]
#[test_case("dotted\\.key.v", json!(true) ; "escaped dot")]
#[test_case("0", json!("numeric key") ; "numeric object key")]
fn test_select_path(path: &str, expected: Value) {
    assert_eq!(select_path(&sample(), path), Some(expected));
}

#[test_case("" ; "empty")]
#[test_case("missing" ; "missing key")]
#[test_case("a.b.9" ; "index out of range")]
#[test_case("a.b[-4]" ; "negative out of range")]
#[test_case("a.c.#" ; "length of non array")]
#[test_case("a.c.d" ; "descend into scalar")]
fn test_select_path_unresolved(path: &str) {
    assert_eq!(select_path(&sample(), path), None);
}

// ============================================================================
// JSONPath Tests
// ============================================================================

#[test]
fn test_jsonpath_single_match() {
    assert_eq!(select_root(&sample(), "$.a.c").unwrap(), json!("x"));
    assert_eq!(select_root(&sample(), "$.a.b").unwrap(), json!([1, 2, 3]));
}

#[test]
fn test_jsonpath_multiple_matches() {
    assert_eq!(
        select_root(&sample(), "$.items[*].id").unwrap(),
        json!([1, 2])
    );
}

#[test]
fn test_jsonpath_no_match_is_error() {
    let err = select_root(&sample(), "$.nothing").unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

#[test]
fn test_jsonpath_invalid_expression() {
    let err = select_root(&sample(), "$[").unwrap_err();
    assert_eq!(err.to_string(), "error parsing json root data");
}

// ============================================================================
// Root Selector Tests
// ============================================================================

#[test]
fn test_empty_selector_returns_payload() {
    let payload = Payload::Json(sample());
    assert_eq!(apply_root_selector(&payload, "").unwrap(), sample());

    let text = Payload::Text("raw".to_string());
    assert_eq!(apply_root_selector(&text, "").unwrap(), json!("raw"));
}

#[test]
fn test_selector_on_json_payload() {
    let payload = Payload::Json(json!({"a": {"b": 1, "c": 2}}));
    assert_eq!(apply_root_selector(&payload, "a.b").unwrap(), json!(1));
    assert_eq!(apply_root_selector(&payload, "a.c").unwrap(), json!(2));
}

#[test]
fn test_selector_on_text_payload() {
    let json_text = Payload::Text(r#"{"a": [5]}"#.to_string());
    assert_eq!(apply_root_selector(&json_text, "a.0").unwrap(), json!(5));

    let not_json = Payload::Text("a,b".to_string());
    let err = apply_root_selector(&not_json, "a").unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

#[test]
fn test_selector_on_empty_payload() {
    let err = apply_root_selector(&Payload::Empty, "a").unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

#[test]
fn test_unresolved_selector_is_uniform_error() {
    let payload = Payload::Json(json!({"a": 1}));
    let err = apply_root_selector(&payload, "b.c").unwrap_err();
    assert_eq!(err.to_string(), "error parsing json root data");
}

#[test]
fn test_apply_root_selector_text() {
    assert_eq!(
        apply_root_selector_text(r#"{"rows": [{"x": 1}]}"#, "rows").unwrap(),
        json!([{"x": 1}])
    );
    assert_eq!(
        apply_root_selector_text("[1,2]", "").unwrap(),
        json!([1, 2])
    );

    let err = apply_root_selector_text("not json", "rows").unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));

    let err = apply_root_selector_text("not json", "").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}
