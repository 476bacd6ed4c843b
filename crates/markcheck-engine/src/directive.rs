//! Inline directives.
//!
//! ```html
//! <!-- [html-validate-disable-next no-dup-attr: generated markup] -->
//! ```
//!
//! | action          | scope                                                   |
//! |-----------------|---------------------------------------------------------|
//! | `enable`        | rest of the document; raises a disabled severity to error |
//! | `disable`       | rest of the document                                    |
//! | `disable-block` | until the parent of the next opened element closes      |
//! | `disable-next`  | the next `tag:open`, `tag:close` or `attr` event        |
//!
//! Besides toggling the rules, every action records the toggle on the
//! elements opened while it is in force, so messages reported later (e.g.
//! on `dom:ready`) respect it too.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use markcheck_common::{ListenerHandle, Location};
use markcheck_dom::{DomTree, NodeId};
use markcheck_html::{Parser, ParserEvent};
use tracing::debug;

use crate::reporter::Reporter;
use crate::rule::RuleHandle;
use crate::severity::Severity;

type Handle = ListenerHandle<ParserEvent, DomTree>;

/// Subscribe the directive processor to `directive` events.
pub(crate) fn register(parser: &Parser, rules: &BTreeMap<String, RuleHandle>, reporter: &Rc<RefCell<Reporter>>) {
    let bus = parser.clone();
    let rules = rules.clone();
    let reporter = Rc::clone(reporter);
    let _ = parser.on("directive", move |event, _| {
        let ParserEvent::Directive {
            action, data, location, ..
        } = event
        else {
            return;
        };
        process(&bus, &rules, &reporter, action, data, location);
    });
}

fn process(
    parser: &Parser,
    all_rules: &BTreeMap<String, RuleHandle>,
    reporter: &RefCell<Reporter>,
    action: &str,
    data: &str,
    location: &Location,
) {
    let rules: Vec<RuleHandle> = data
        .split(',')
        .map(str::trim)
        .filter_map(|name| all_rules.get(name).cloned())
        .collect();
    debug!(target: "markcheck::directive", action, rules = rules.len(), "directive");
    match action {
        "enable" => enable(parser, &rules),
        "disable" => disable(parser, &rules),
        "disable-block" => disable_block(parser, rules),
        "disable-next" => disable_next(parser, rules),
        _ => reporter
            .borrow_mut()
            .add_parser_error(location, format!("Unknown directive \"{action}\"")),
    }
}

fn names(rules: &[RuleHandle]) -> Vec<String> {
    rules.iter().map(|rule| rule.name().to_string()).collect()
}

fn set_enabled(rules: &[RuleHandle], enabled: bool) {
    for rule in rules {
        rule.set_enabled(enabled);
    }
}

fn opened(event: &ParserEvent) -> Option<NodeId> {
    match event {
        ParserEvent::TagOpen { target, .. } => Some(*target),
        _ => None,
    }
}

fn enable(parser: &Parser, rules: &[RuleHandle]) {
    for rule in rules {
        rule.set_enabled(true);
        if rule.severity() == Severity::Disabled {
            rule.set_severity(Severity::Error);
        }
    }
    let names = names(rules);
    let _ = parser.on("tag:open", move |event, tree| {
        if let Some(target) = opened(event) {
            tree[target].enable_rules(&names);
        }
    });
}

fn disable(parser: &Parser, rules: &[RuleHandle]) {
    set_enabled(rules, false);
    let names = names(rules);
    let _ = parser.on("tag:open", move |event, tree| {
        if let Some(target) = opened(event) {
            tree[target].disable_rules(&names);
        }
    });
}

fn disable_block(parser: &Parser, rules: Vec<RuleHandle>) {
    set_enabled(&rules, false);
    let names = names(&rules);
    let block: Rc<Cell<Option<NodeId>>> = Rc::default();

    let open_block = Rc::clone(&block);
    let unregister_open = parser.on("tag:open", move |event, tree| {
        let Some(target) = opened(event) else {
            return;
        };
        if open_block.get().is_none() {
            open_block.set(tree.parent(target));
        }
        tree[target].disable_rules(&names);
    });

    let close_slot: Rc<RefCell<Option<Handle>>> = Rc::default();
    let slot = Rc::clone(&close_slot);
    let unregister_close = parser.on("tag:close", move |event, _| {
        let ParserEvent::TagClose { previous, .. } = event else {
            return;
        };
        // A directive that is the last thing in its block never sees a tag open.
        let closes_block = block.get().is_none_or(|block| block == *previous);
        if !closes_block {
            return;
        }
        if let Some(handle) = slot.borrow_mut().take() {
            handle.remove();
        }
        unregister_open.remove();
        set_enabled(&rules, true);
    });
    *close_slot.borrow_mut() = Some(unregister_close);
}

fn disable_next(parser: &Parser, rules: Vec<RuleHandle>) {
    set_enabled(&rules, false);
    let names = names(&rules);
    let unregister = parser.on("tag:open", move |event, tree| {
        if let Some(target) = opened(event) {
            tree[target].disable_rules(&names);
        }
    });

    let bus = parser.clone();
    let _ = parser.once("tag:open, tag:close, attr", move |_, _| {
        unregister.remove();
        let rules = rules.clone();
        bus.defer(move || set_enabled(&rules, true));
    });
}
