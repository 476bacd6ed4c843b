//! Integration tests for deserializing metadata records.

use markcheck_dom::meta::{
    AttributePattern, ContentCategory, MetaFlag, MetaLookupableProperty, PermittedEntry, PermittedToken,
    PropertyExpression,
};
use markcheck_dom::MetaElement;

/// Helper parsing a record from JSON text.
fn parse(json: &str) -> Result<MetaElement, serde_json::Error> {
    serde_json::from_str(json)
}

#[test]
fn test_defaults() {
    let meta = parse("{}").expect("valid");
    assert_eq!(meta.flow, MetaFlag::Static(false));
    assert!(!meta.void);
    assert!(meta.permitted_content.is_none());
    assert!(meta.attributes.is_empty());
}

#[test]
fn test_categories_and_flags() {
    let meta = parse(r#"{"flow": true, "phrasing": true, "void": true, "scriptSupporting": true}"#).expect("valid");
    assert!(meta.in_category(ContentCategory::Flow));
    assert!(meta.in_category(ContentCategory::Script));
    assert!(!meta.in_category(ContentCategory::Heading));
    assert!(meta.has_property(MetaLookupableProperty::Void));
}

#[test]
fn test_property_expression() {
    let meta = parse(r#"{"interactive": ["hasAttribute", "controls"], "flow": "isDescendant"}"#).expect("valid");
    assert_eq!(
        meta.interactive,
        MetaFlag::Expression(PropertyExpression::Call("hasAttribute".to_string(), serde_json::json!("controls")))
    );
    assert_eq!(meta.flow, MetaFlag::Expression(PropertyExpression::Name("isDescendant".to_string())));
    assert!(!meta.flow.is_set());
}

#[test]
fn test_permitted_content_entries() {
    let meta = parse(r#"{"permittedContent": ["@flow", "li?", ["@phrasing", {"exclude": "a"}], {"exclude": ["@interactive", "form"]}]}"#)
        .expect("valid");
    let rules = meta.permitted_content.expect("present");
    assert_eq!(rules[0], PermittedEntry::Token(PermittedToken::Category(ContentCategory::Flow)));
    assert_eq!(
        rules[1],
        PermittedEntry::Token(PermittedToken::Tag {
            name: "li".to_string(),
            limit: Some(1),
        })
    );
    assert!(matches!(&rules[2], PermittedEntry::AllOf(group) if group.len() == 2));
    let PermittedEntry::Exclude(group) = &rules[3] else {
        panic!("expected exclude group");
    };
    assert_eq!(group.exclude.as_slice().len(), 2);
}

#[test]
fn test_exclude_accepts_nested_entries() {
    let meta = parse(r#"{"permittedContent": [{"exclude": [["@phrasing", "span"], {"exclude": "div"}]}, {"exclude": {"exclude": "a"}}]}"#)
        .expect("valid");
    let rules = meta.permitted_content.expect("present");
    let PermittedEntry::Exclude(group) = &rules[0] else {
        panic!("expected exclude group");
    };
    let entries = group.exclude.as_slice();
    assert_eq!(entries.len(), 2);
    assert!(matches!(&entries[0], PermittedEntry::AllOf(inner) if inner.len() == 2));
    assert!(matches!(&entries[1], PermittedEntry::Exclude(_)));

    let PermittedEntry::Exclude(group) = &rules[1] else {
        panic!("expected exclude group");
    };
    assert!(matches!(group.exclude.as_slice(), [PermittedEntry::Exclude(_)]));
}

#[test]
fn test_unknown_category_is_rejected() {
    assert!(parse(r#"{"permittedContent": ["@bogus"]}"#).is_err());
    assert!(parse(r#"{"permittedOrder": ["@bogus"]}"#).is_err());
}

#[test]
fn test_malformed_permitted_group_is_rejected() {
    assert!(parse(r#"{"permittedContent": [{"exclude": "a", "include": "b"}]}"#).is_err());
}

#[test]
fn test_unknown_field_is_rejected() {
    assert!(parse(r#"{"flowContent": true}"#).is_err());
}

#[test]
fn test_required_ancestors_are_selectors() {
    let meta = parse(r#"{"requiredAncestors": ["dl > div", "dl"]}"#).expect("valid");
    let ancestors = meta.required_ancestors.expect("present");
    assert_eq!(ancestors[0].as_str(), "dl > div");
    assert!(parse(r#"{"requiredAncestors": ["dl:hover"]}"#).is_err());
}

#[test]
fn test_attribute_patterns() {
    let meta = parse(r#"{"attributes": {"type": ["text", "/^h[1-6]$/", ""], "hidden": []}}"#).expect("valid");
    let patterns = &meta.attributes["type"];
    assert!(matches!(&patterns[0], AttributePattern::Literal(v) if v == "text"));
    assert!(patterns[1].matches("h3"));
    assert!(!patterns[1].matches("h7"));
    assert!(patterns[2].is_empty_literal());
    assert_eq!(patterns[1].to_string(), "/^h[1-6]$/");
    assert!(meta.attributes["hidden"].is_empty());
}

#[test]
fn test_invalid_regex_is_rejected() {
    assert!(parse(r#"{"attributes": {"type": ["/[a-/"]}}"#).is_err());
}

#[test]
fn test_permitted_token_display() {
    let token = PermittedToken::try_from("caption?".to_string()).expect("valid");
    assert_eq!(token.to_string(), "caption?");
    let token = PermittedToken::try_from("@heading".to_string()).expect("valid");
    assert_eq!(token.to_string(), "@heading");
}
