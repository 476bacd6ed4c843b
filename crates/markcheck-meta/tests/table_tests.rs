//! Integration tests for loading and querying the metadata catalog.

use markcheck_common::Location;
use markcheck_dom::meta::{MetaFlag, MetaLookupableProperty};
use markcheck_dom::{DomTree, ElementData, NodeClosed, NodeId, Value};
use markcheck_meta::{MetaError, MetaTable};
use serde_json::json;

/// Helper appending an element with metadata from `table`.
fn element(tree: &mut DomTree, table: &MetaTable, parent: NodeId, tag: &str) -> NodeId {
    tree.create_element(
        tag,
        NodeClosed::Open,
        table.get_meta_for(tag),
        Some(parent),
        Location::start_of("inline"),
    )
}

/// Helper adding a static attribute.
fn set_attr(tree: &mut DomTree, id: NodeId, key: &str, value: &str) {
    tree.as_element_mut(id).expect("element").set_attribute(
        key,
        Some(Value::from(value)),
        Location::start_of("inline"),
        None,
        None,
    );
}

#[test]
fn test_load_and_lookup_is_case_insensitive() {
    let mut table = MetaTable::new();
    table
        .load_from_value(&json!({"foo": {"flow": true}}))
        .expect("valid catalog");
    assert_eq!(table.len(), 1);
    let meta = table.get_meta_for("FOO").expect("known tag");
    assert_eq!(meta.tag_name, "foo");
    assert!(meta.flow.is_set());
    assert!(table.get_meta_for("bar").is_none());
}

#[test]
fn test_inherit_merges_parent_record() {
    let mut table = MetaTable::new();
    table
        .load_from_value(&json!({
            "zed": {"inherit": "base", "void": true, "attributes": {"b": ["2"]}},
            "base": {"flow": true, "attributes": {"a": ["1"]}}
        }))
        .expect("inherit resolves regardless of key order");
    let zed = table.get_meta_for("zed").expect("known tag");
    assert!(zed.flow.is_set());
    assert!(zed.void);
    assert!(zed.attributes.contains_key("a"));
    assert!(zed.attributes.contains_key("b"));
    assert_eq!(table.get_tags_derived_from("base"), vec!["base", "zed"]);
}

#[test]
fn test_reload_merges_over_existing_record() {
    let mut table = MetaTable::new();
    table.load_from_value(&json!({"x": {"flow": true}})).expect("valid");
    table.load_from_value(&json!({"x": {"void": true}})).expect("valid");
    let x = table.get_meta_for("x").expect("known tag");
    assert!(x.flow.is_set());
    assert!(x.void);
}

#[test]
fn test_unknown_inherit_is_an_error() {
    let mut table = MetaTable::new();
    let err = table
        .load_from_value(&json!({"x": {"inherit": "missing"}}))
        .expect_err("missing parent");
    assert!(matches!(err, MetaError::UnknownInherit { ref parent, .. } if parent == "missing"));
}

#[test]
fn test_invalid_records_are_errors() {
    let mut table = MetaTable::new();
    assert!(matches!(table.load_from_value(&json!([1, 2])), Err(MetaError::NotAnObject)));
    assert!(matches!(
        table.load_from_value(&json!({"x": {"permittedContent": ["@bogus"]}})),
        Err(MetaError::Element { .. })
    ));
    assert!(matches!(
        table.load_from_value(&json!({"x": {"unknownField": true}})),
        Err(MetaError::Element { .. })
    ));
    assert!(matches!(
        table.load_from_value(&json!({"x": {"flow": ["frobnicate", "y"]}})),
        Err(MetaError::UnknownExpression { ref function, .. }) if function == "frobnicate"
    ));
    assert!(matches!(
        table.load_from_value(&json!({"x": {"flow": ["matchAttribute", ["type", "<", "a"]]}})),
        Err(MetaError::InvalidExpression { .. })
    ));
    assert!(matches!(table.load_from_str("{"), Err(MetaError::Json(_))));
}

#[test]
fn test_tags_with_property() {
    let table = MetaTable::html5().expect("bundled catalog");
    let void = table.get_tags_with_property(MetaLookupableProperty::Void);
    for tag in ["br", "hr", "img", "input", "meta", "wbr"] {
        assert!(void.contains(&tag.to_string()), "{tag} should be void");
    }
    assert!(!void.contains(&"div".to_string()));
    assert_eq!(table.get_tags_with_property(MetaLookupableProperty::Foreign), vec!["svg"]);
}

#[test]
fn test_bundled_headings_inherit_h1() {
    let table = MetaTable::html5().expect("bundled catalog");
    let h3 = table.get_meta_for("h3").expect("known tag");
    assert!(h3.heading.is_set());
    assert_eq!(h3.inherit.as_deref(), Some("h1"));
}

#[test]
fn test_resolve_has_attribute() {
    let table = MetaTable::html5().expect("bundled catalog");
    let mut tree = DomTree::new(Location::start_of("inline"));
    let plain = element(&mut tree, &table, NodeId::ROOT, "a");
    let link = element(&mut tree, &table, NodeId::ROOT, "a");
    set_attr(&mut tree, link, "href", "/");
    table.resolve_all(&mut tree);

    let interactive = |tree: &DomTree, id| tree.as_element(id).and_then(|el| el.meta.clone()).map(|m| m.interactive.clone());
    assert_eq!(interactive(&tree, plain), Some(MetaFlag::Static(false)));
    assert_eq!(interactive(&tree, link), Some(MetaFlag::Static(true)));
}

#[test]
fn test_resolve_is_descendant() {
    let table = MetaTable::html5().expect("bundled catalog");
    let mut tree = DomTree::new(Location::start_of("inline"));
    let map = element(&mut tree, &table, NodeId::ROOT, "map");
    let inside = element(&mut tree, &table, map, "area");
    let outside = element(&mut tree, &table, NodeId::ROOT, "area");
    table.resolve_all(&mut tree);

    let flow = |id| tree.as_element(id).and_then(|el| el.meta.clone()).is_some_and(|m| m.flow.is_set());
    assert!(flow(inside));
    assert!(!flow(outside));
}

#[test]
fn test_resolve_match_attribute() {
    let table = MetaTable::html5().expect("bundled catalog");
    let mut tree = DomTree::new(Location::start_of("inline"));
    let hidden = element(&mut tree, &table, NodeId::ROOT, "input");
    set_attr(&mut tree, hidden, "type", "hidden");
    let text = element(&mut tree, &table, NodeId::ROOT, "input");
    set_attr(&mut tree, text, "type", "text");
    let untyped = element(&mut tree, &table, NodeId::ROOT, "input");
    table.resolve_all(&mut tree);

    let interactive =
        |id| tree.as_element(id).and_then(|el| el.meta.clone()).is_some_and(|m| m.interactive.is_set());
    assert!(!interactive(hidden));
    assert!(interactive(text));
    assert!(interactive(untyped));
}

#[test]
fn test_load_into_copies_content_model() {
    let table = MetaTable::html5().expect("bundled catalog");
    let mut element = ElementData::new("my-button", NodeClosed::Open, None, 1);
    table.load_into(&mut element, "button");
    let meta = element.meta.expect("metadata copied");
    assert!(meta.interactive.is_set());
    assert!(meta.attributes.contains_key("type"));
    assert!(!meta.void);
}
