//! Reactive cells.
//!
//! A [`Cell`] is a shared, labelled container for a [`Value`] that keeps a
//! monotonically increasing revision counter and notifies subscribers on
//! change. Reads through [`Cell::get`] are pure: they never establish a
//! subscription. Subscriptions are explicit and live only as long as the
//! returned [`Subscription`] guard.

use crate::value::Value;
use std::cell::{Cell as Flag, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type SubscriberFn = dyn Fn(&Value);

struct CellInner {
    label: String,
    value: RefCell<Value>,
    revision: Flag<u64>,
    next_subscriber: Flag<u64>,
    subscribers: RefCell<Vec<(u64, Rc<SubscriberFn>)>>,
}

/// A reactive cell. Cloning yields another handle to the same cell.
#[derive(Clone)]
pub struct Cell {
    inner: Rc<CellInner>,
}

impl Cell {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            inner: Rc::new(CellInner {
                label: label.into(),
                value: RefCell::new(value),
                revision: Flag::new(0),
                next_subscriber: Flag::new(0),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Current value. A pure read: no subscription is established.
    pub fn get(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Revision counter, bumped on every `set`.
    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    /// Replace the value, bump the revision, and notify subscribers.
    pub fn set(&self, value: Value) {
        *self.inner.value.borrow_mut() = value.clone();
        self.inner.revision.set(self.inner.revision.get() + 1);

        // Snapshot the subscriber list so callbacks may subscribe or
        // unsubscribe without holding the borrow.
        let subscribers: Vec<Rc<SubscriberFn>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for subscriber in subscribers {
            subscriber(&value);
        }
    }

    /// Register a change callback. The subscription lasts until the returned
    /// guard is dropped.
    #[must_use]
    pub fn subscribe(&self, f: impl Fn(&Value) + 'static) -> Subscription {
        let id = self.inner.next_subscriber.get();
        self.inner.next_subscriber.set(id + 1);
        self.inner.subscribers.borrow_mut().push((id, Rc::new(f)));
        Subscription {
            cell: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether two handles refer to the same underlying cell.
    pub fn ptr_eq(&self, other: &Cell) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("label", &self.inner.label)
            .field("value", &*self.inner.value.borrow())
            .field("revision", &self.inner.revision.get())
            .finish()
    }
}

/// Guard for a cell subscription; dropping it unsubscribes.
pub struct Subscription {
    cell: Weak<CellInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.upgrade() {
            cell.subscribers.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
