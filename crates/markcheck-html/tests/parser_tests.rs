//! Integration tests for tree construction and parser events.

use std::cell::RefCell;
use std::rc::Rc;

use markcheck_common::Event;
use markcheck_dom::meta::MetaFlag;
use markcheck_dom::{DomTree, DynamicValue, NodeClosed, NodeId, Value};
use markcheck_html::parser::source::SourceHooks;
use markcheck_html::{AttributeData, ParseError, Parser, ParserEvent, Source};
use markcheck_meta::MetaTable;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

fn parser() -> Parser {
    Parser::new(Rc::new(MetaTable::html5().expect("bundled catalog")))
}

/// Helper recording every event the parser emits.
fn record(parser: &Parser) -> Rc<RefCell<Vec<ParserEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let _ = parser.on("*", move |event, _| sink.borrow_mut().push(event.clone()));
    events
}

fn parse(markup: &str) -> (DomTree, Vec<ParserEvent>) {
    let parser = parser();
    let events = record(&parser);
    let tree = parser.parse_html(&Source::inline(markup)).expect("markup should parse");
    let events = events.borrow().clone();
    (tree, events)
}

fn names(events: &[ParserEvent]) -> Vec<&'static str> {
    events.iter().map(Event::name).collect()
}

fn tag(tree: &DomTree, id: NodeId) -> &str {
    tree.tag_name(id).unwrap_or("#document")
}

#[test]
fn test_event_order_for_simple_element() {
    let (_, events) = parse(r#"<p class="a">x</p>"#);
    assert_eq!(
        names(&events),
        vec!["dom:load", "tag:open", "attr", "text", "tag:close", "element:ready", "dom:ready"]
    );
}

#[test]
fn test_optional_end_tags() {
    let (tree, events) = parse("<ul><li>a<li>b</ul>");
    let ul = tree.children(tree.root())[0];
    let items: Vec<_> = tree.child_elements(ul).collect();
    assert_eq!(items.len(), 2);
    assert_eq!(tree.text_content(items[0]), "a");
    assert_eq!(tree.text_content(items[1]), "b");
    for &item in &items {
        assert_eq!(tree.as_element(item).map(|el| el.closed), Some(NodeClosed::ImplicitClosed));
    }

    let closed: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ParserEvent::TagClose { previous, .. } => Some(*previous),
            _ => None,
        })
        .collect();
    assert_eq!(closed, vec![items[0], items[1], ul]);
}

#[test]
fn test_void_element() {
    let (tree, events) = parse(r#"<img src="x">"#);
    let img = tree.children(tree.root())[0];
    let element = tree.as_element(img).expect("img element");
    assert_eq!(element.closed, NodeClosed::VoidOmitted);
    assert!(element.void_element);
    assert!(tree.children(img).is_empty());
    assert_eq!(element.get_attribute_value("src"), Some(&Value::from("x")));
    assert_eq!(tree.active(), tree.root());

    let attr = events
        .iter()
        .find(|event| matches!(event, ParserEvent::Attr { .. }))
        .expect("attr event");
    let ParserEvent::Attr {
        key,
        location,
        value_location,
        quote,
        ..
    } = attr
    else {
        unreachable!()
    };
    assert_eq!(key, "src");
    assert_eq!(*quote, Some('"'));
    assert_eq!((location.offset, location.size), (5, 3));
    let value_location = value_location.as_ref().expect("value location");
    assert_eq!((value_location.offset, value_location.column, value_location.size), (10, 11, 1));
}

#[test]
fn test_unquoted_and_empty_attribute_values() {
    let (_, events) = parse(r#"<input value=abc title="">"#);
    let locations: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ParserEvent::Attr { value_location, .. } => Some(value_location.clone()),
            _ => None,
        })
        .collect();
    let value = locations[0].as_ref().expect("non-empty value");
    assert_eq!((value.offset, value.size), (13, 3));
    assert!(locations[1].is_none());
}

#[test]
fn test_self_closed_element() {
    let (tree, _) = parse("<div/><p>");
    let children = tree.children(tree.root());
    assert_eq!(children.len(), 2);
    assert_eq!(tree.as_element(children[0]).map(|el| el.closed), Some(NodeClosed::VoidSelfClosed));
    assert_eq!(tag(&tree, children[1]), "p");
}

#[test]
fn test_end_tag_after_void_element() {
    let (tree, _) = parse("<div><br></br><p></p></div>");
    let div = tree.children(tree.root())[0];
    let children: Vec<_> = tree.child_elements(div).map(|id| tag(&tree, id).to_string()).collect();
    assert_eq!(children, vec!["br", "p"]);
}

#[test]
fn test_foreign_element_body_is_discarded() {
    let (tree, events) = parse("<svg><g><svg></svg></g></svg><p>");
    let children = tree.children(tree.root());
    assert_eq!(children.len(), 2);
    assert_eq!(tag(&tree, children[0]), "svg");
    assert!(tree.children(children[0]).is_empty());
    assert_eq!(tag(&tree, children[1]), "p");

    let opened = events
        .iter()
        .filter(|event| matches!(event, ParserEvent::TagOpen { .. }))
        .count();
    assert_eq!(opened, 2);
}

#[test]
fn test_unclosed_elements_close_at_end_of_document() {
    let (tree, events) = parse("<div><span>");
    let closes: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ParserEvent::TagClose { target, previous, .. } => Some((*target, tag(&tree, *previous).to_string())),
            _ => None,
        })
        .collect();
    assert_eq!(closes, vec![(None, "span".to_string()), (None, "div".to_string())]);
}

#[test]
fn test_depth() {
    let (tree, _) = parse("<div><p><b>x</b></p></div>");
    let b = tree.get_elements_by_tag_name(tree.root(), "b")[0];
    assert_eq!(tree.depth(b), 3);
    assert_eq!(tree.depth(tree.root()), 0);
}

#[test]
fn test_doctype() {
    let (tree, events) = parse("<!DOCTYPE html>\n<html></html>");
    assert_eq!(tree.doctype(), Some("html"));
    assert!(events.iter().any(|event| matches!(
        event,
        ParserEvent::Doctype { value, .. } if value == "html"
    )));
}

#[test]
fn test_templating_text_is_dynamic() {
    let (tree, _) = parse("<p><% name %></p>");
    let p = tree.children(tree.root())[0];
    let text = tree.children(p)[0];
    assert_eq!(tree.as_text(text), Some(&Value::Dynamic(DynamicValue::new("<% name %>"))));
}

#[test]
fn test_directive_event() {
    let (_, events) = parse("<!-- [html-validate-disable-next void: legacy markup] --><br>");
    let directive = events
        .iter()
        .find(|event| matches!(event, ParserEvent::Directive { .. }))
        .expect("directive event");
    let ParserEvent::Directive {
        action, data, comment, ..
    } = directive
    else {
        unreachable!()
    };
    assert_eq!(action, "disable-next");
    assert_eq!(data, "void");
    assert_eq!(comment, "legacy markup");
}

#[test]
fn test_every_event_carries_a_location() {
    let (_, events) = parse(concat!(
        "<!DOCTYPE html>\n",
        "<!--[if IE]><p>x</p><![endif]-->",
        "<!-- [html-validate-disable void] -->",
        r#"<ul class="a"><li>one</li></ul> <br>"#,
    ));
    let seen = names(&events);
    for expected in [
        "doctype",
        "conditional",
        "directive",
        "tag:open",
        "attr",
        "text",
        "whitespace",
        "tag:close",
        "element:ready",
    ] {
        assert!(seen.contains(&expected), "no {expected} event in {seen:?}");
    }
    for event in &events {
        let payload = serde_json::to_value(event).expect("serializable");
        assert!(payload.get("location").is_some(), "{} has no location field", event.name());
        let document_level = matches!(event, ParserEvent::DomLoad { .. } | ParserEvent::DomReady { .. });
        assert_eq!(event.location().is_some(), !document_level, "{}", event.name());
    }
}

#[test]
fn test_malformed_directive_is_fatal() {
    let result = parser().parse_html(&Source::inline("<!-- [html-validate-!bogus] -->"));
    assert!(matches!(
        result,
        Err(ParseError::Directive { ref directive, .. }) if directive == "!bogus"
    ));
}

#[test]
fn test_conditional_comments() {
    let (_, events) = parse("<!--[if IE]><p>x</p><![endif]--><![if !IE]>");
    let conditions: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ParserEvent::Conditional { condition, .. } => Some(condition.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(conditions, vec!["if IE", "endif", "if !IE"]);
}

#[test]
fn test_unterminated_tag_is_a_stream_error() {
    let parser = parser();
    let events = record(&parser);
    let err = parser
        .parse_html(&Source::inline("<p>\n<div"))
        .expect_err("unterminated tag");
    assert!(matches!(err, ParseError::Stream(_)));
    assert!(err.is_recoverable());
    assert_eq!(err.to_string(), "stream ended before TAG_CLOSE token was found");
    assert_eq!((err.location().line, err.location().column), (2, 1));
    assert!(!names(&events.borrow()).contains(&"dom:ready"));
}

#[test]
fn test_lexer_error_is_a_token_error() {
    let err = parser()
        .parse_html(&Source::inline(r#"<div "x">"#))
        .expect_err("invalid markup");
    assert!(matches!(err, ParseError::Token(_)));
}

#[test]
fn test_attribute_hook_expands_attributes() {
    let hooks = SourceHooks {
        process_attribute: Some(Rc::new(|attr: AttributeData| {
            if !attr.key.starts_with(':') {
                return vec![attr];
            }
            let key = attr.key[1..].to_string();
            let expression = attr.value.as_ref().map(ToString::to_string).unwrap_or_default();
            vec![
                attr.clone(),
                AttributeData {
                    key,
                    value: Some(Value::Dynamic(DynamicValue::new(expression))),
                    quote: attr.quote,
                    original_attribute: Some(attr.key.clone()),
                },
            ]
        })),
        process_element: None,
    };
    let parser = parser();
    let events = record(&parser);
    let source = Source::inline(r#"<a :href="url">x</a>"#).with_hooks(hooks);
    let tree = parser.parse_html(&source).expect("markup should parse");

    let a = tree.children(tree.root())[0];
    let href = tree
        .as_element(a)
        .and_then(|el| el.get_attribute("href"))
        .expect("expanded attribute");
    assert!(href.is_dynamic());
    assert_eq!(href.original_attribute.as_deref(), Some(":href"));

    let attr_events = names(&events.borrow()).into_iter().filter(|name| *name == "attr").count();
    assert_eq!(attr_events, 2);
}

#[test]
fn test_element_hook_runs_before_close_events() {
    let hooks = SourceHooks {
        process_attribute: None,
        process_element: Some(Rc::new(|tree: &mut DomTree, id: NodeId, _: &MetaTable| {
            if let Some(element) = tree.as_element_mut(id).filter(|el| el.tag_name == "my-button") {
                element.set_annotation("custom button");
            }
        })),
    };
    let parser = parser();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _ = parser.on("element:ready", move |event, tree| {
        if let ParserEvent::ElementReady { target, .. } = event {
            sink.borrow_mut().push(tree.annotated_name(*target));
        }
    });
    let source = Source::inline("<my-button></my-button>").with_hooks(hooks);
    let _ = parser.parse_html(&source).expect("markup should parse");
    assert_eq!(*seen.borrow(), vec!["custom button".to_string()]);
}

#[test]
fn test_parser_is_reusable() {
    let parser = parser();
    let first = parser.parse_html(&Source::inline("<p>a</p>")).expect("first");
    let second = parser.parse_html(&Source::inline("<div></div><span>")).expect("second");
    assert_eq!(first.children(first.root()).len(), 1);
    assert_eq!(second.children(second.root()).len(), 2);
}

#[test]
fn test_metadata_is_resolved_before_dom_ready() {
    let parser = parser();
    let resolved = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&resolved);
    let _ = parser.on("dom:ready", move |_, tree| {
        let input = tree.get_elements_by_tag_name(tree.root(), "input")[0];
        let interactive = tree
            .as_element(input)
            .and_then(|el| el.meta.as_ref())
            .map(|meta| meta.interactive.clone());
        *sink.borrow_mut() = interactive;
    });
    let _ = parser
        .parse_html(&Source::inline(r#"<input type="hidden">"#))
        .expect("markup should parse");
    assert_eq!(*resolved.borrow(), Some(MetaFlag::Static(false)));
}

fn markup_from(seed: &[u8]) -> String {
    const TAGS: &[&str] = &["div", "span", "p", "li", "b", "img", "br"];
    seed.chunks(2)
        .map(|pair| {
            let tag = TAGS[usize::from(pair[0]) % TAGS.len()];
            if pair.get(1).is_some_and(|b| b % 3 == 0) {
                format!("</{tag}>")
            } else {
                format!("<{tag}>t")
            }
        })
        .collect()
}

/// Every attached element is one level deeper than its parent and listed
/// among its parent's children.
#[quickcheck]
fn prop_depth_matches_parent(seed: Vec<u8>) -> TestResult {
    let Ok(tree) = parser().parse_html(&Source::inline(markup_from(&seed))) else {
        return TestResult::discard();
    };
    let mut consistent = true;
    tree.visit_depth_first(|id| {
        let parent = tree.parent(id).unwrap_or(NodeId::ROOT);
        consistent &= tree.depth(id) == tree.depth(parent) + 1;
        consistent &= tree.children(parent).contains(&id);
    });
    TestResult::from_bool(consistent)
}
