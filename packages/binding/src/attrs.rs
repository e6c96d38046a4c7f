//! Attribute snapshots and shadowing.
//!
//! A snapshot is a flat, per-pass projection of attribute bindings: every
//! binding is dereferenced exactly once, mutable cells staying wrapped so
//! components can write back through them. Shadowing decides which snapshot
//! entries may overwrite instance properties: an attribute shadows only when
//! the target already declares a property of the same name. Unknown
//! attributes are deliberately left unshadowed; hosts resolve those on
//! demand from the instance's `attrs`.

use indexmap::IndexMap;
use trellis_reactive::{Bound, Resolved, Value};

/// Attribute bindings as passed by the caller, in declaration order.
pub type AttrBindings = IndexMap<String, Bound>;

/// Resolved attribute values for a single render pass. Never mutated in
/// place; a fresh snapshot replaces the prior one on every pass.
pub type Snapshot = IndexMap<String, Resolved>;

/// Resolve each binding's current value. A pure read: no subscriptions.
pub fn take_snapshot(attrs: &AttrBindings) -> Snapshot {
    attrs
        .iter()
        .map(|(name, bound)| (name.clone(), bound.resolve()))
        .collect()
}

/// Keep only the snapshot entries whose name the target already declares.
pub fn shadowed_attrs(declared: &IndexMap<String, Value>, snapshot: &Snapshot) -> Snapshot {
    snapshot
        .iter()
        .filter(|(name, _)| declared.contains_key(name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Merge shadowed attributes into a property bag, unwrapping mutable cells
/// to their plain values.
pub fn merge_bindings(target: &mut IndexMap<String, Value>, shadowed: &Snapshot) {
    for (name, value) in shadowed {
        target.insert(name.clone(), value.unwrap_value());
    }
}
