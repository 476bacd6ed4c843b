//! Deduplicated warnings routed through `tracing`.
//!
//! Used by the metadata loader and the configuration layer to report
//! deprecated or unsupported input without repeating the same message for
//! every document in a run.

use std::collections::HashSet;
use std::sync::Mutex;

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about deprecated or unsupported input (emitted once per unique message)
///
/// Returns `true` when the warning was emitted, `false` when an identical
/// warning was already reported.
///
/// # Example
/// ```
/// use markcheck_common::warning::warn_once;
///
/// assert!(warn_once("config", "doc example: severity \"disable\" is deprecated"));
/// assert!(!warn_once("config", "doc example: severity \"disable\" is deprecated"));
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let mut guard = WARNED
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let should_emit = guard.get_or_insert_with(HashSet::new).insert(key);

    if should_emit {
        tracing::warn!(target: "markcheck", component, "{message}");
    }
    should_emit
}

/// Clear all recorded warnings (call between independent runs)
pub fn clear_warnings() {
    let mut guard = WARNED
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
