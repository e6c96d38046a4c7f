//! Attribute binding variants.
//!
//! An attribute passed to a component is bound to one of three things: an
//! inert value, a reactive cell the component may only read, or a mutable
//! cell the component may write back through (two-way binding). Snapshot
//! and shadow logic switch on the variant tag explicitly instead of probing
//! values for a marker.

use crate::cell::Cell;
use crate::value::Value;

/// What an attribute name is bound to.
#[derive(Debug, Clone)]
pub enum Bound {
    /// Inert value; never changes for the lifetime of the binding.
    Value(Value),
    /// Reactive cell, read-only from the component's perspective.
    Cell(Cell),
    /// Mutable cell: stays wrapped through snapshots so the component can
    /// write back, and is unwrapped only when merged into properties.
    Mut(Cell),
}

impl Bound {
    /// Current plain value. Never establishes a subscription.
    pub fn read(&self) -> Value {
        match self {
            Bound::Value(v) => v.clone(),
            Bound::Cell(c) | Bound::Mut(c) => c.get(),
        }
    }

    /// Resolve for a snapshot: plain values and read-only cells collapse to
    /// their current value; mutable cells stay wrapped.
    pub fn resolve(&self) -> Resolved {
        match self {
            Bound::Value(v) => Resolved::Plain(v.clone()),
            Bound::Cell(c) => Resolved::Plain(c.get()),
            Bound::Mut(c) => Resolved::Mut(c.clone()),
        }
    }
}

impl From<Value> for Bound {
    fn from(v: Value) -> Self {
        Bound::Value(v)
    }
}

impl From<&str> for Bound {
    fn from(s: &str) -> Self {
        Bound::Value(Value::from(s))
    }
}

/// A snapshot-time attribute value.
#[derive(Debug, Clone)]
pub enum Resolved {
    Plain(Value),
    Mut(Cell),
}

impl Resolved {
    /// Dereference to a plain value, unwrapping a mutable cell.
    pub fn unwrap_value(&self) -> Value {
        match self {
            Resolved::Plain(v) => v.clone(),
            Resolved::Mut(c) => c.get(),
        }
    }

    pub fn is_mut(&self) -> bool {
        matches!(self, Resolved::Mut(_))
    }
}

impl PartialEq for Resolved {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Resolved::Plain(a), Resolved::Plain(b)) => a == b,
            (Resolved::Mut(a), Resolved::Mut(b)) => a.get() == b.get(),
            _ => false,
        }
    }
}
