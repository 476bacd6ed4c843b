//! The metadata catalog.
//!
//! Records are loaded from JSON objects keyed by tag name. Loading the same
//! tag twice merges the new record over the old one, and a record with
//! `"inherit": "<tag>"` starts from that tag's record instead. Nested objects
//! (such as `attributes`) merge key by key; every other value is replaced.

use std::collections::HashMap;
use std::rc::Rc;

use markcheck_common::warning::warn_once;
use markcheck_dom::meta::{MetaFlag, MetaLookupableProperty, PropertyExpression};
use markcheck_dom::{DomTree, ElementData, MetaElement, NodeId};
use serde_json::{Map, Value};

use crate::MetaError;

const HTML5: &str = include_str!("../data/html5.json");

type Record = Map<String, Value>;

/// Maps tag names to metadata records.
#[derive(Debug, Clone, Default)]
pub struct MetaTable {
    raw: HashMap<String, Record>,
    elements: HashMap<String, Rc<MetaElement>>,
}

impl MetaTable {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled HTML5 catalog.
    ///
    /// # Errors
    ///
    /// Only if the bundled data is malformed.
    pub fn html5() -> Result<Self, MetaError> {
        let mut table = Self::new();
        table.load_from_str(HTML5)?;
        Ok(table)
    }

    /// Load records from a JSON document.
    ///
    /// # Errors
    ///
    /// See [`MetaTable::load_from_value`].
    pub fn load_from_str(&mut self, json: &str) -> Result<(), MetaError> {
        let value: Value = serde_json::from_str(json)?;
        self.load_from_value(&value)
    }

    /// Load records from a JSON object keyed by tag name.
    ///
    /// Records may inherit from tags defined earlier or anywhere in the same
    /// object.
    ///
    /// # Errors
    ///
    /// Returns a [`MetaError`] when the value is not an object, a record is
    /// malformed, an `inherit` target does not exist or a computed property
    /// is unknown. Records loaded before the error stay in the table.
    pub fn load_from_value(&mut self, value: &Value) -> Result<(), MetaError> {
        let Value::Object(entries) = value else {
            return Err(MetaError::NotAnObject);
        };
        let mut pending = Vec::with_capacity(entries.len());
        for (tag, record) in entries {
            let Value::Object(record) = record else {
                return Err(MetaError::Element {
                    tag: tag.clone(),
                    source: serde::de::Error::custom("record must be an object"),
                });
            };
            pending.push((tag.to_ascii_lowercase(), record));
        }

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for (tag, record) in pending {
                match inherit_of(record) {
                    Some(parent) if !self.raw.contains_key(parent) => deferred.push((tag, record)),
                    _ => self.add_entry(&tag, record)?,
                }
            }
            if deferred.len() == before {
                let (tag, record) = &deferred[0];
                return Err(MetaError::UnknownInherit {
                    tag: tag.clone(),
                    parent: inherit_of(record).unwrap_or_default().to_string(),
                });
            }
            pending = deferred;
        }
        Ok(())
    }

    fn add_entry(&mut self, tag: &str, record: &Record) -> Result<(), MetaError> {
        let mut merged = match inherit_of(record) {
            Some(parent) => self.raw.get(parent).cloned().unwrap_or_default(),
            None => self.raw.get(tag).cloned().unwrap_or_default(),
        };
        merge_into(&mut merged, record);

        let mut element: MetaElement = serde_json::from_value(Value::Object(merged.clone()))
            .map_err(|source| MetaError::Element {
                tag: tag.to_string(),
                source,
            })?;
        for (_, flag) in element.flags() {
            if let MetaFlag::Expression(expr) = flag {
                check_expression(tag, expr)?;
            }
        }
        element.tag_name = tag.to_string();
        tracing::trace!(target: "markcheck::meta", tag, inherit = ?element.inherit, "loaded element metadata");

        let _ = self.raw.insert(tag.to_string(), merged);
        let _ = self.elements.insert(tag.to_string(), Rc::new(element));
        Ok(())
    }

    /// Number of known tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The record for `tag_name` (case-insensitive).
    #[must_use]
    pub fn get_meta_for(&self, tag_name: &str) -> Option<Rc<MetaElement>> {
        self.elements.get(&tag_name.to_ascii_lowercase()).cloned()
    }

    /// Every tag with `property` set, sorted by name.
    #[must_use]
    pub fn get_tags_with_property(&self, property: MetaLookupableProperty) -> Vec<String> {
        let mut tags: Vec<String> = self
            .elements
            .iter()
            .filter(|(_, meta)| meta.has_property(property))
            .map(|(tag, _)| tag.clone())
            .collect();
        tags.sort();
        tags
    }

    /// `tag_name` and every tag that inherits from it, directly or not.
    #[must_use]
    pub fn get_tags_derived_from(&self, tag_name: &str) -> Vec<String> {
        let base = tag_name.to_ascii_lowercase();
        let mut tags: Vec<String> = self
            .elements
            .keys()
            .filter(|tag| self.inherits_from(tag, &base))
            .cloned()
            .collect();
        tags.sort();
        tags
    }

    fn inherits_from(&self, tag: &str, base: &str) -> bool {
        let mut current = Some(tag);
        for _ in 0..=self.elements.len() {
            match current {
                Some(tag) if tag == base => return true,
                Some(tag) => {
                    current = self
                        .elements
                        .get(tag)
                        .and_then(|meta| meta.inherit.as_deref());
                }
                None => return false,
            }
        }
        false
    }

    /// Copy the copyable properties of `tag_name`'s record onto an element.
    ///
    /// Used by transformations that know an element behaves like another
    /// tag, e.g. a custom component rendering a `<button>`. Does nothing
    /// when the tag is unknown.
    pub fn load_into(&self, element: &mut ElementData, tag_name: &str) {
        if let Some(meta) = self.get_meta_for(tag_name) {
            element.load_meta(&meta);
        }
    }

    /// Evaluate the computed properties of `id` in place.
    ///
    /// Requires the surrounding tree to be complete, since expressions may
    /// look at ancestors.
    pub fn resolve(&self, tree: &mut DomTree, id: NodeId) {
        let Some(meta) = tree.as_element(id).and_then(|el| el.meta.clone()) else {
            return;
        };
        if !meta
            .flags()
            .iter()
            .any(|(_, flag)| matches!(flag, MetaFlag::Expression(_)))
        {
            return;
        }

        let mut resolved = (*meta).clone();
        for (_, flag) in resolved.flags_mut() {
            if let MetaFlag::Expression(expr) = flag {
                *flag = MetaFlag::Static(evaluate(tree, id, expr));
            }
        }
        if let Some(element) = tree.as_element_mut(id) {
            element.meta = Some(Rc::new(resolved));
        }
    }

    /// Evaluate computed properties for every element in the tree.
    pub fn resolve_all(&self, tree: &mut DomTree) {
        for index in 0..tree.len() {
            self.resolve(tree, NodeId(index));
        }
    }
}

fn inherit_of(record: &Record) -> Option<&str> {
    record.get("inherit").and_then(Value::as_str)
}

fn merge_into(target: &mut Record, source: &Record) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(target)), Value::Object(source)) => merge_into(target, source),
            _ => {
                let _ = target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn check_expression(tag: &str, expr: &PropertyExpression) -> Result<(), MetaError> {
    let invalid = |reason| MetaError::InvalidExpression {
        tag: tag.to_string(),
        function: expr.function().to_string(),
        reason,
    };
    match (expr.function(), expr.argument()) {
        ("isDescendant" | "hasAttribute", Some(Value::String(_))) => Ok(()),
        ("isDescendant" | "hasAttribute", _) => Err(invalid("expected a string")),
        ("matchAttribute", Some(Value::Array(args))) => match args.as_slice() {
            [Value::String(_), Value::String(op), Value::String(_)] if op == "=" || op == "!=" => Ok(()),
            [Value::String(_), Value::String(_), Value::String(_)] => {
                Err(invalid("operator must be \"=\" or \"!=\""))
            }
            _ => Err(invalid("expected [key, operator, value]")),
        },
        ("matchAttribute", _) => Err(invalid("expected [key, operator, value]")),
        (function, _) => Err(MetaError::UnknownExpression {
            tag: tag.to_string(),
            function: function.to_string(),
        }),
    }
}

fn evaluate(tree: &DomTree, id: NodeId, expr: &PropertyExpression) -> bool {
    let Some(element) = tree.as_element(id) else {
        return false;
    };
    match (expr.function(), expr.argument()) {
        ("isDescendant", Some(Value::String(tag))) => tree.ancestors(id).any(|a| tree.is(a, tag)),
        ("hasAttribute", Some(Value::String(key))) => element.has_attribute(key),
        ("matchAttribute", Some(Value::Array(args))) => match args.as_slice() {
            [Value::String(key), Value::String(op), Value::String(expected)] => {
                match_attribute(element, key, op, expected)
            }
            _ => false,
        },
        _ => false,
    }
}

fn match_attribute(element: &ElementData, key: &str, op: &str, expected: &str) -> bool {
    let actual = match element.get_attribute_value(key) {
        None => None,
        Some(value) => match value.as_static() {
            Some(value) => Some(value),
            None => {
                let _ = warn_once(
                    "meta",
                    &format!("matchAttribute cannot evaluate dynamic \"{key}\" on <{}>", element.tag_name),
                );
                return false;
            }
        },
    };
    match op {
        "=" => actual == Some(expected),
        _ => actual != Some(expected),
    }
}
