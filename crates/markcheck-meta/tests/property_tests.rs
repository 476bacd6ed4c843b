//! Property tests: content-model checks only read the tree, so checking the
//! same tree twice finds the same violations.

use markcheck_common::Location;
use markcheck_dom::{DomTree, NodeClosed, NodeId};
use markcheck_meta::MetaTable;
use markcheck_meta::validator::{
    find_unpermitted_content, validate_ancestors, validate_occurrences, validate_order, validate_permitted,
    validate_required_content,
};
use quickcheck_macros::quickcheck;

const TAGS: [&str; 10] = ["table", "caption", "thead", "tbody", "tr", "td", "head", "ul", "li", "a"];

/// Build a tree where each step appends an element under an earlier node.
fn build(table: &MetaTable, steps: &[(u8, u8)]) -> DomTree {
    let mut tree = DomTree::new(Location::start_of("inline"));
    let mut nodes = vec![NodeId::ROOT];
    for &(parent, tag) in steps {
        let parent = nodes[usize::from(parent) % nodes.len()];
        let tag = TAGS[usize::from(tag) % TAGS.len()];
        let id = tree.create_element(
            tag,
            NodeClosed::Open,
            table.get_meta_for(tag),
            Some(parent),
            Location::start_of("inline"),
        );
        nodes.push(id);
    }
    tree
}

#[derive(Debug, Default, PartialEq)]
struct Violations {
    unpermitted: Vec<NodeId>,
    descendants: Vec<NodeId>,
    occurrences: Vec<NodeId>,
    order: Vec<(NodeId, Option<NodeId>)>,
    ancestors: Vec<NodeId>,
    missing: Vec<(NodeId, Vec<String>)>,
}

fn check(tree: &DomTree) -> Violations {
    let mut found = Violations::default();
    for node in tree.get_elements_by_tag_name(NodeId::ROOT, "*") {
        let Some(meta) = tree.as_element(node).and_then(|el| el.meta.clone()) else {
            continue;
        };
        let children: Vec<NodeId> = tree.child_elements(node).collect();
        for &child in &children {
            found
                .unpermitted
                .extend(find_unpermitted_content(tree, child, meta.permitted_content.as_deref()));
            if !validate_permitted(tree, child, meta.permitted_descendants.as_deref()) {
                found.descendants.push(child);
            }
            let same_tag = children.iter().filter(|&&other| tree.tag_name(other) == tree.tag_name(child)).count();
            if !validate_occurrences(tree, child, meta.permitted_content.as_deref(), same_tag) {
                found.occurrences.push(child);
            }
        }
        let _ = validate_order(tree, &children, meta.permitted_order.as_deref(), |child, prev| {
            found.order.push((child, prev));
        });
        if !validate_ancestors(tree, node, meta.required_ancestors.as_deref()) {
            found.ancestors.push(node);
        }
        let missing = validate_required_content(tree, node, meta.required_content.as_deref());
        if !missing.is_empty() {
            found.missing.push((node, missing));
        }
    }
    found
}

#[quickcheck]
fn prop_validation_is_idempotent(steps: Vec<(u8, u8)>) -> bool {
    let table = MetaTable::html5().expect("bundled catalog");
    let tree = build(&table, &steps);
    check(&tree) == check(&tree)
}

#[test]
fn test_order_check_repeats_on_the_same_children() {
    let table = MetaTable::html5().expect("bundled catalog");
    let tree = build(&table, &[(0, 0), (1, 3), (1, 1), (1, 2)]);
    let first = check(&tree);
    assert_eq!(first.order.len(), 1);
    assert_eq!(first, check(&tree));
}
