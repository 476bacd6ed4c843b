//! Integration tests for selector parsing and matching.

use markcheck_common::Location;
use markcheck_dom::selector::{Combinator, Qualifier};
use markcheck_dom::{DomTree, NodeClosed, NodeId, Selector, SelectorError, Value};

/// Helper to append an element with attributes.
fn element(tree: &mut DomTree, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let id = tree.create_element(tag, NodeClosed::Open, None, Some(parent), Location::start_of("inline"));
    let data = tree.as_element_mut(id).expect("element");
    for (key, value) in attrs {
        data.set_attribute(key, Some(Value::from(*value)), Location::start_of("inline"), None, None);
    }
    id
}

/// `<div id="main"><ul class="nav"><li/><li lang="en-US"/><li/></ul><p/></div><p/>`
struct Sample {
    tree: DomTree,
    div: NodeId,
    ul: NodeId,
    items: [NodeId; 3],
    inner_p: NodeId,
    outer_p: NodeId,
}

fn sample() -> Sample {
    let mut tree = DomTree::new(Location::start_of("inline"));
    let div = element(&mut tree, NodeId::ROOT, "div", &[("id", "main")]);
    let ul = element(&mut tree, div, "ul", &[("class", "nav primary")]);
    let a = element(&mut tree, ul, "li", &[]);
    let b = element(&mut tree, ul, "li", &[("lang", "en-US"), ("data-x", "hello world")]);
    let c = element(&mut tree, ul, "li", &[]);
    let inner_p = element(&mut tree, div, "p", &[]);
    let outer_p = element(&mut tree, NodeId::ROOT, "p", &[]);
    Sample {
        tree,
        div,
        ul,
        items: [a, b, c],
        inner_p,
        outer_p,
    }
}

/// Helper running `query_all` from the root.
fn query(s: &Sample, selector: &str) -> Vec<NodeId> {
    s.tree.query_selector_all(NodeId::ROOT, selector).expect("valid selector")
}

#[test]
fn test_parse_chain() {
    let selector = Selector::parse("div > ul.nav  li:first-child").expect("valid");
    let chain = &selector.chains()[0];
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[1].combinator, Combinator::Child);
    assert_eq!(chain[1].qualifiers, vec![Qualifier::Class("nav".to_string())]);
    assert_eq!(chain[2].combinator, Combinator::Descendant);
}

#[test]
fn test_combinators_without_spaces() {
    let s = sample();
    assert_eq!(query(&s, "ul>li"), s.items.to_vec());
    assert_eq!(query(&s, "li+li"), vec![s.items[1], s.items[2]]);
}

#[test]
fn test_tag_and_universal() {
    let s = sample();
    assert_eq!(query(&s, "p"), vec![s.inner_p, s.outer_p]);
    assert_eq!(query(&s, "*").len(), 7);
}

#[test]
fn test_descendant_and_child() {
    let s = sample();
    assert_eq!(query(&s, "div li"), s.items.to_vec());
    assert_eq!(query(&s, "div > li"), Vec::<NodeId>::new());
    assert_eq!(query(&s, "div > p"), vec![s.inner_p]);
}

#[test]
fn test_sibling_combinators() {
    let s = sample();
    assert_eq!(query(&s, "ul + p"), vec![s.inner_p]);
    assert_eq!(query(&s, "li ~ li"), vec![s.items[1], s.items[2]]);
    assert_eq!(query(&s, "div ~ p"), vec![s.outer_p]);
}

#[test]
fn test_class_and_id() {
    let s = sample();
    assert_eq!(query(&s, ".primary"), vec![s.ul]);
    assert_eq!(query(&s, "#main"), vec![s.div]);
    assert_eq!(query(&s, "div#main > ul.nav.primary"), vec![s.ul]);
}

#[test]
fn test_attribute_operators() {
    let s = sample();
    let b = vec![s.items[1]];
    assert_eq!(query(&s, "[lang]"), b);
    assert_eq!(query(&s, "[lang=\"en-US\"]"), b);
    assert_eq!(query(&s, "[lang|=en]"), b);
    assert_eq!(query(&s, "[lang^='en']"), b);
    assert_eq!(query(&s, "[lang$=US]"), b);
    assert_eq!(query(&s, "[data-x*=\"o w\"]"), b);
    assert_eq!(query(&s, "[data-x~=world]"), b);
    assert!(query(&s, "[lang=en]").is_empty());
}

#[test]
fn test_pseudo_classes() {
    let s = sample();
    assert_eq!(query(&s, "li:first-child"), vec![s.items[0]]);
    assert_eq!(query(&s, "li:last-child"), vec![s.items[2]]);
    assert_eq!(query(&s, "li:nth-child(2)"), vec![s.items[1]]);
    assert_eq!(query(&s, ":scope > p"), vec![s.outer_p]);
}

#[test]
fn test_selector_list_deduplicates() {
    let s = sample();
    assert_eq!(query(&s, "li:first-child, li, ul"), vec![s.items[0], s.items[1], s.items[2], s.ul]);
}

#[test]
fn test_query_first() {
    let s = sample();
    assert_eq!(s.tree.query_selector(NodeId::ROOT, "li").expect("valid"), Some(s.items[0]));
    assert_eq!(s.tree.query_selector(NodeId::ROOT, "table").expect("valid"), None);
    assert_eq!(s.tree.query_selector(s.ul, "li:nth-child(3)").expect("valid"), Some(s.items[2]));
}

#[test]
fn test_matches_and_closest() {
    let s = sample();
    assert!(s.tree.matches(s.items[1], "#main li").expect("valid"));
    assert!(!s.tree.matches(s.outer_p, "div p").expect("valid"));
    let selector = Selector::parse("div").expect("valid");
    assert_eq!(s.tree.closest(s.items[0], &selector), Some(s.div));
    assert_eq!(s.tree.closest(s.div, &selector), Some(s.div));
    assert_eq!(s.tree.closest(s.outer_p, &selector), None);
}

#[test]
fn test_unknown_pseudo_class_is_an_error() {
    assert_eq!(
        Selector::parse("li:hover"),
        Err(SelectorError::UnknownPseudoClass("hover".to_string()))
    );
}

#[test]
fn test_unknown_operator_is_an_error() {
    assert_eq!(
        Selector::parse("[lang!=en]"),
        Err(SelectorError::UnknownOperator("!=".to_string()))
    );
}

#[test]
fn test_malformed_selectors() {
    assert!(matches!(Selector::parse("ul >"), Err(SelectorError::Syntax { .. })));
    assert!(matches!(Selector::parse("ul > > li"), Err(SelectorError::Syntax { .. })));
    assert!(matches!(Selector::parse("[lang"), Err(SelectorError::Syntax { .. })));
    assert!(matches!(Selector::parse("li:nth-child(0)"), Err(SelectorError::InvalidArgument { .. })));
    assert!(matches!(Selector::parse(""), Err(SelectorError::Syntax { .. })));
}

#[test]
fn test_generate_selector() {
    let s = sample();
    assert_eq!(s.tree.generate_selector(s.div).as_deref(), Some("#main"));
    assert_eq!(s.tree.generate_selector(s.ul).as_deref(), Some("#main > ul"));
    assert_eq!(s.tree.generate_selector(s.items[1]).as_deref(), Some("#main > ul > li:nth-child(2)"));
    assert_eq!(s.tree.generate_selector(NodeId::ROOT), None);
}

#[test]
fn test_generate_selector_anchors_ambiguous_chains() {
    let s = sample();
    // A bare `p` would first match the paragraph inside #main.
    let generated = s.tree.generate_selector(s.outer_p).expect("selector");
    assert_eq!(generated, ":scope > p");
}

#[test]
fn test_generated_selectors_round_trip() {
    let s = sample();
    for node in s.tree.get_elements_by_tag_name(NodeId::ROOT, "*") {
        let generated = s.tree.generate_selector(node).expect("selector");
        assert_eq!(
            s.tree.query_selector(NodeId::ROOT, &generated).expect("valid"),
            Some(node),
            "{generated}"
        );
    }
}
