//! Synchronous publish/subscribe.
//!
//! Listeners are keyed by event name. The special name `"*"` receives every
//! event. Several names can be subscribed at once by separating them with
//! commas (`"tag:open, tag:close"`).
//!
//! Dispatch is re-entrant: a listener may subscribe, unsubscribe or trigger
//! further events while being called. The set of listeners is snapshotted
//! when an event is triggered, so changes made during dispatch only affect
//! later events.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Name of the wildcard subscription.
pub const WILDCARD: &str = "*";

/// An event that can be dispatched through an [`EventHandler`].
pub trait Event {
    /// The name listeners subscribe to, e.g. `"tag:open"`.
    fn name(&self) -> &'static str;
}

type Callback<E, C> = Rc<dyn Fn(&E, &C)>;

struct Registry<E, C> {
    next_id: u64,
    listeners: HashMap<String, Vec<(u64, Callback<E, C>)>>,
}

impl<E, C> Registry<E, C> {
    fn remove(&mut self, names: &[String], id: u64) {
        for name in names {
            if let Some(list) = self.listeners.get_mut(name) {
                list.retain(|(listener, _)| *listener != id);
            }
        }
    }
}

/// A synchronous event registry.
///
/// `E` is the event type and `C` the context every listener receives
/// alongside the event. Cloning an `EventHandler` yields another handle to
/// the same registry.
pub struct EventHandler<E, C> {
    registry: Rc<RefCell<Registry<E, C>>>,
}

impl<E, C> Clone for EventHandler<E, C> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<E, C> Default for EventHandler<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregistration handle returned by [`EventHandler::on`] and friends.
///
/// Dropping the handle does not unsubscribe; call [`ListenerHandle::remove`].
pub struct ListenerHandle<E, C> {
    registry: Weak<RefCell<Registry<E, C>>>,
    names: Rc<[String]>,
    id: u64,
}

impl<E, C> Clone for ListenerHandle<E, C> {
    fn clone(&self) -> Self {
        Self {
            registry: Weak::clone(&self.registry),
            names: Rc::clone(&self.names),
            id: self.id,
        }
    }
}

impl<E, C> ListenerHandle<E, C> {
    /// Unsubscribe the listener from every name it was registered under.
    ///
    /// Removing an already removed listener is a no-op.
    pub fn remove(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&self.names, self.id);
        }
    }
}

fn split_names(names: &str) -> Rc<[String]> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl<E, C> EventHandler<E, C> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: HashMap::new(),
            })),
        }
    }

    fn register(&self, names: Rc<[String]>, id: u64, callback: Callback<E, C>) -> ListenerHandle<E, C> {
        let mut registry = self.registry.borrow_mut();
        for name in names.iter() {
            registry
                .listeners
                .entry(name.clone())
                .or_default()
                .push((id, Rc::clone(&callback)));
        }
        ListenerHandle {
            registry: Rc::downgrade(&self.registry),
            names,
            id,
        }
    }

    fn allocate_id(&self) -> u64 {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        id
    }

    /// Subscribe to one or more comma-separated event names.
    pub fn on<F>(&self, names: &str, callback: F) -> ListenerHandle<E, C>
    where
        F: Fn(&E, &C) + 'static,
    {
        let id = self.allocate_id();
        self.register(split_names(names), id, Rc::new(callback))
    }

    /// Subscribe to the first delivery of any of the given names.
    ///
    /// The listener is removed before the callback runs.
    pub fn once<F>(&self, names: &str, callback: F) -> ListenerHandle<E, C>
    where
        F: Fn(&E, &C) + 'static,
        E: 'static,
        C: 'static,
    {
        let id = self.allocate_id();
        let names = split_names(names);
        let handle = ListenerHandle {
            registry: Rc::downgrade(&self.registry),
            names: Rc::clone(&names),
            id,
        };
        let fired = Cell::new(false);
        let wrapper = move |event: &E, context: &C| {
            if fired.replace(true) {
                return;
            }
            handle.remove();
            callback(event, context);
        };
        self.register(names, id, Rc::new(wrapper))
    }

    /// Run `callback` once, after the next event of any name is triggered.
    ///
    /// Registered as a one-shot wildcard listener, so when called from within
    /// a dispatch it runs on the *following* event, after every listener of
    /// the current one has finished.
    pub fn defer<F>(&self, callback: F) -> ListenerHandle<E, C>
    where
        F: FnOnce() + 'static,
        E: 'static,
        C: 'static,
    {
        let callback = RefCell::new(Some(callback));
        self.once(WILDCARD, move |_, _| {
            if let Some(callback) = callback.borrow_mut().take() {
                callback();
            }
        })
    }

    /// Number of listeners subscribed to `name` (wildcard listeners excluded).
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry
            .borrow()
            .listeners
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.registry.borrow_mut().listeners.clear();
    }
}

impl<E: Event, C> EventHandler<E, C> {
    /// Deliver `event` to its named listeners, then to wildcard listeners.
    pub fn trigger(&self, event: &E, context: &C) {
        let name = event.name();
        let snapshot: Vec<Callback<E, C>> = {
            let registry = self.registry.borrow();
            let named = registry.listeners.get(name).into_iter().flatten();
            let wildcard = registry.listeners.get(WILDCARD).into_iter().flatten();
            named
                .chain(wildcard)
                .map(|(_, callback)| Rc::clone(callback))
                .collect()
        };
        tracing::trace!(target: "markcheck::event", event = name, listeners = snapshot.len());
        for callback in snapshot {
            callback(event, context);
        }
    }
}
