//! Common utilities for markcheck.
//!
//! This crate provides shared infrastructure used by all analyzer components:
//! - **Locations** - filename/offset/line/column spans into source text
//! - **Event Handler** - synchronous publish/subscribe used by the parser and rules
//! - **Warning System** - deduplicated diagnostics for deprecated or unsupported input

pub mod event;
pub mod location;
pub mod warning;

pub use event::{Event, EventHandler, ListenerHandle};
pub use location::Location;
