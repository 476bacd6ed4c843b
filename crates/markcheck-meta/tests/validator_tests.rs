//! Integration tests for the content-model validator.

use std::collections::BTreeMap;

use markcheck_common::Location;
use markcheck_dom::meta::{AttributePattern, PermittedEntry, PermittedToken};
use markcheck_dom::{Attribute, DomTree, DynamicValue, NodeClosed, NodeId, Selector, Value};
use markcheck_meta::validator::{
    find_unpermitted_content, validate_ancestors, validate_attribute, validate_occurrences, validate_order,
    validate_permitted, validate_permitted_category, validate_required_content,
};
use markcheck_meta::MetaTable;

/// Helper appending an element with bundled HTML5 metadata.
fn element(tree: &mut DomTree, table: &MetaTable, parent: NodeId, tag: &str) -> NodeId {
    tree.create_element(
        tag,
        NodeClosed::Open,
        table.get_meta_for(tag),
        Some(parent),
        Location::start_of("inline"),
    )
}

/// Helper parsing permitted-content rules from JSON.
fn rules(json: serde_json::Value) -> Vec<PermittedEntry> {
    serde_json::from_value(json).expect("valid rules")
}

/// Helper parsing a permitted-order list from JSON.
fn order(json: serde_json::Value) -> Vec<PermittedToken> {
    serde_json::from_value(json).expect("valid order")
}

/// Helper building an attribute without locations.
fn attr(key: &str, value: Option<Value>) -> Attribute {
    Attribute::new(key, value, Location::start_of("inline"), None, None)
}

/// Helper building an attribute rule table.
fn attribute_rules(json: serde_json::Value) -> BTreeMap<String, Vec<AttributePattern>> {
    serde_json::from_value(json).expect("valid attribute rules")
}

/// Helper loading the bundled catalog.
fn html5() -> MetaTable {
    MetaTable::html5().expect("bundled catalog")
}

#[test]
fn test_permitted_without_rules_passes() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let div = element(&mut tree, &table, NodeId::ROOT, "div");
    assert!(validate_permitted(&tree, div, None));
    assert!(!validate_permitted(&tree, div, Some(&[])));
}

#[test]
fn test_permitted_by_category_and_tag() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let div = element(&mut tree, &table, NodeId::ROOT, "div");
    let span = element(&mut tree, &table, NodeId::ROOT, "span");
    let phrasing = rules(serde_json::json!(["@phrasing"]));
    assert!(validate_permitted(&tree, span, Some(phrasing.as_slice())));
    assert!(!validate_permitted(&tree, div, Some(phrasing.as_slice())));
    let named = rules(serde_json::json!(["div"]));
    assert!(validate_permitted(&tree, div, Some(named.as_slice())));
}

#[test]
fn test_permitted_all_of_and_exclude() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let a = element(&mut tree, &table, NodeId::ROOT, "a");
    let span = element(&mut tree, &table, NodeId::ROOT, "span");
    let group = rules(serde_json::json!([["@phrasing", {"exclude": "a"}]]));
    assert!(validate_permitted(&tree, span, Some(group.as_slice())));
    assert!(!validate_permitted(&tree, a, Some(group.as_slice())));
    let excluded = rules(serde_json::json!([{"exclude": ["a", "div"]}]));
    assert!(!validate_permitted(&tree, a, Some(excluded.as_slice())));
    assert!(validate_permitted(&tree, span, Some(excluded.as_slice())));
}

#[test]
fn test_permitted_nested_exclude() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let a = element(&mut tree, &table, NodeId::ROOT, "a");
    let span = element(&mut tree, &table, NodeId::ROOT, "span");
    let div = element(&mut tree, &table, NodeId::ROOT, "div");

    let not_phrasing_span = rules(serde_json::json!([{"exclude": [["@phrasing", "span"]]}]));
    assert!(validate_permitted(&tree, a, Some(not_phrasing_span.as_slice())));
    assert!(!validate_permitted(&tree, span, Some(not_phrasing_span.as_slice())));
    assert!(validate_permitted(&tree, div, Some(not_phrasing_span.as_slice())));

    let only_a = rules(serde_json::json!([{"exclude": {"exclude": "a"}}]));
    assert!(validate_permitted(&tree, a, Some(only_a.as_slice())));
    assert!(!validate_permitted(&tree, span, Some(only_a.as_slice())));
}

#[test]
fn test_unknown_element_matches_any_category() {
    let mut tree = DomTree::new(Location::start_of("inline"));
    let custom = tree.create_element("my-thing", NodeClosed::Open, None, Some(NodeId::ROOT), Location::start_of("inline"));
    let token = PermittedToken::try_from("@heading".to_string()).expect("valid token");
    assert!(validate_permitted_category(&tree, custom, &token));
    let tag = PermittedToken::try_from("div".to_string()).expect("valid token");
    assert!(!validate_permitted_category(&tree, custom, &tag));
}

#[test]
fn test_occurrences() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let table_el = element(&mut tree, &table, NodeId::ROOT, "table");
    let caption = element(&mut tree, &table, table_el, "caption");
    let tr = element(&mut tree, &table, table_el, "tr");
    let rules = table.get_meta_for("table").and_then(|m| m.permitted_content.clone());
    assert!(validate_occurrences(&tree, caption, rules.as_deref(), 1));
    assert!(!validate_occurrences(&tree, caption, rules.as_deref(), 2));
    assert!(validate_occurrences(&tree, tr, rules.as_deref(), 10));
    assert!(validate_occurrences(&tree, caption, None, 5));
}

#[test]
fn test_order_reports_out_of_order_child() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let table_el = element(&mut tree, &table, NodeId::ROOT, "table");
    let tbody = element(&mut tree, &table, table_el, "tbody");
    let caption = element(&mut tree, &table, table_el, "caption");
    let rules = order(serde_json::json!(["caption", "colgroup", "thead", "tbody", "tr", "tfoot"]));

    let mut reported = Vec::new();
    let children = tree.children(table_el).to_vec();
    let valid = validate_order(&tree, &children, Some(rules.as_slice()), |child, prev| reported.push((child, prev)));
    assert!(!valid);
    assert_eq!(reported, vec![(caption, Some(tbody))]);
}

#[test]
fn test_order_accepts_valid_and_unlisted_children() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let table_el = element(&mut tree, &table, NodeId::ROOT, "table");
    let _ = element(&mut tree, &table, table_el, "caption");
    let _ = element(&mut tree, &table, table_el, "script");
    let _ = element(&mut tree, &table, table_el, "tr");
    let _ = element(&mut tree, &table, table_el, "tr");
    let _ = element(&mut tree, &table, table_el, "tfoot");
    let rules = order(serde_json::json!(["caption", "colgroup", "thead", "tbody", "tr", "tfoot"]));
    let children = tree.children(table_el).to_vec();
    assert!(validate_order(&tree, &children, Some(rules.as_slice()), |_, _| panic!("no violation expected")));
    assert!(validate_order(&tree, &children, None, |_, _| panic!("no rules")));
}

#[test]
fn test_ancestors() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let ul = element(&mut tree, &table, NodeId::ROOT, "ul");
    let nested = element(&mut tree, &table, ul, "li");
    let stray = element(&mut tree, &table, NodeId::ROOT, "li");
    let selectors = vec![Selector::parse("ul").expect("valid"), Selector::parse("ol").expect("valid")];
    assert!(validate_ancestors(&tree, nested, Some(selectors.as_slice())));
    assert!(!validate_ancestors(&tree, stray, Some(selectors.as_slice())));
    assert!(validate_ancestors(&tree, stray, None));
    assert!(validate_ancestors(&tree, stray, Some(&[])));
}

#[test]
fn test_required_content() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let html = element(&mut tree, &table, NodeId::ROOT, "html");
    let _ = element(&mut tree, &table, html, "body");
    let required = vec!["head".to_string(), "body".to_string()];
    assert_eq!(validate_required_content(&tree, html, Some(required.as_slice())), vec!["head"]);
    assert!(validate_required_content(&tree, html, None).is_empty());
}

#[test]
fn test_attribute_values() {
    let rules = attribute_rules(serde_json::json!({
        "type": ["text", "/^num.*$/"],
        "disabled": [],
        "download": [""]
    }));
    assert!(validate_attribute(&attr("type", Some(Value::from("text"))), &rules));
    assert!(validate_attribute(&attr("type", Some(Value::from("number"))), &rules));
    assert!(!validate_attribute(&attr("type", Some(Value::from("bogus"))), &rules));
    assert!(!validate_attribute(&attr("type", None), &rules));
    assert!(validate_attribute(&attr("unlisted", Some(Value::from("x"))), &rules));
    assert!(validate_attribute(
        &attr("type", Some(Value::Dynamic(DynamicValue::new("kind")))),
        &rules
    ));
}

#[test]
fn test_boolean_and_empty_attribute_values() {
    let rules = attribute_rules(serde_json::json!({"disabled": [], "download": [""]}));
    assert!(validate_attribute(&attr("disabled", None), &rules));
    assert!(validate_attribute(&attr("disabled", Some(Value::from(""))), &rules));
    assert!(validate_attribute(&attr("disabled", Some(Value::from("disabled"))), &rules));
    assert!(!validate_attribute(&attr("disabled", Some(Value::from("yes"))), &rules));
    assert!(validate_attribute(&attr("download", None), &rules));
    assert!(validate_attribute(&attr("download", Some(Value::from(""))), &rules));
    assert!(!validate_attribute(&attr("download", Some(Value::from("file"))), &rules));
}

#[test]
fn test_transparent_children_are_checked_against_outer_rules() {
    let table = html5();
    let mut tree = DomTree::new(Location::start_of("inline"));
    let span = element(&mut tree, &table, NodeId::ROOT, "span");
    let a = element(&mut tree, &table, span, "a");
    let div = element(&mut tree, &table, a, "div");
    let em = element(&mut tree, &table, a, "em");
    let rules = table.get_meta_for("span").and_then(|m| m.permitted_content.clone());
    assert_eq!(find_unpermitted_content(&tree, a, rules.as_deref()), vec![div]);
    assert!(find_unpermitted_content(&tree, em, rules.as_deref()).is_empty());
}
