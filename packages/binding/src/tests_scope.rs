//! Scope chain and shadow-scope construction tests.

use crate::attrs::AttrBindings;
use crate::scope::{bind_shadow_scope, Scope, ShadowScopeOptions};
use crate::tree::{Instance, Tree};
use trellis_reactive::{Bound, Cell, Value};

#[test]
fn test_lookup_walks_parent_chain() {
    let root = Scope::root();
    root.bind_local("title", Bound::from("outer"));

    let child = Scope::child(&root);
    let grandchild = Scope::child(&child);

    assert_eq!(grandchild.lookup("title").map(|b| b.read()), Some(Value::from("outer")));
    assert!(grandchild.lookup("missing").is_none());
}

#[test]
fn test_child_binding_shadows_parent() {
    let root = Scope::root();
    root.bind_local("title", Bound::from("outer"));

    let child = Scope::child(&root);
    child.bind_local("title", Bound::from("inner"));

    assert_eq!(child.lookup("title").map(|b| b.read()), Some(Value::from("inner")));
    assert_eq!(root.lookup("title").map(|b| b.read()), Some(Value::from("outer")));
}

#[test]
fn test_cell_override_is_observed_without_rebinding() {
    let root = Scope::root();
    let cell = Cell::new("count", Value::from(1.0));
    root.override_local("count", cell.clone());

    let child = Scope::child(&root);
    assert_eq!(child.lookup("count").map(|b| b.read()), Some(Value::from(1.0)));

    // The chain is not re-resolved: the same stored cell reports the new
    // value on the next read.
    cell.set(Value::from(2.0));
    assert_eq!(child.lookup("count").map(|b| b.read()), Some(Value::from(2.0)));
}

#[test]
fn test_shadow_scope_for_plain_view_binds_controller_and_self() {
    let mut tree = Tree::new();
    let view = tree.insert_instance(Instance {
        is_component: false,
        is_view: true,
        context: Some(Value::from("model")),
        controller: Some("posts".to_string()),
        ..Instance::default()
    });

    let parent = Scope::root();
    let shadow = Scope::child(&parent);
    bind_shadow_scope(
        &tree,
        &shadow,
        None,
        Some(ShadowScopeOptions {
            view: Some(view),
            attrs: None,
            self_binding: None,
        }),
    );

    assert_eq!(
        shadow.lookup("controller").map(|b| b.read()),
        Some(Value::from("posts"))
    );
    assert_eq!(shadow.self_binding().map(|b| b.read()), Some(Value::from("model")));
    assert_eq!(shadow.view(), Some(view));
    // No attrs were supplied, so the view is not recorded as a component.
    assert_eq!(shadow.component(), None);
}

#[test]
fn test_shadow_scope_for_component_keeps_isolation() {
    let mut tree = Tree::new();
    let component = tree.insert_instance(Instance {
        is_component: true,
        context: Some(Value::from("model")),
        ..Instance::default()
    });

    let mut attrs = AttrBindings::new();
    attrs.insert("name".to_string(), Bound::from("x"));

    let parent = Scope::root();
    let shadow = Scope::child(&parent);
    bind_shadow_scope(
        &tree,
        &shadow,
        None,
        Some(ShadowScopeOptions {
            view: Some(component),
            attrs: Some(attrs),
            self_binding: None,
        }),
    );

    // Component boundaries bind no view-derived locals or self.
    assert!(shadow.lookup("controller").is_none());
    assert!(shadow.self_binding().is_none());
    assert_eq!(shadow.view(), Some(component));
    assert_eq!(shadow.component(), Some(component));
    assert!(shadow.attrs().is_some());
}

#[test]
fn test_shadow_scope_subscriptions_mark_node_dirty() {
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let view = tree.insert_instance(Instance {
        is_component: false,
        is_view: true,
        context: Some(Value::from("model")),
        ..Instance::default()
    });

    let shadow = Scope::child(&Scope::root());
    bind_shadow_scope(
        &tree,
        &shadow,
        Some(render_node),
        Some(ShadowScopeOptions {
            view: Some(view),
            attrs: None,
            self_binding: None,
        }),
    );
    assert!(!tree.render_node(render_node).dirty.get());

    let controller = shadow.lookup("controller").unwrap();
    let Bound::Cell(cell) = controller else {
        panic!("controller should be bound to a cell");
    };
    cell.set(Value::from("other"));
    assert!(tree.render_node(render_node).dirty.get());
}

#[test]
fn test_explicit_self_binding_wins_over_view_context() {
    let mut tree = Tree::new();
    let view = tree.insert_instance(Instance {
        is_component: false,
        is_view: true,
        context: Some(Value::from("model")),
        ..Instance::default()
    });

    let shadow = Scope::child(&Scope::root());
    bind_shadow_scope(
        &tree,
        &shadow,
        None,
        Some(ShadowScopeOptions {
            view: Some(view),
            attrs: None,
            self_binding: Some(Bound::from("override")),
        }),
    );

    assert_eq!(
        shadow.self_binding().map(|b| b.read()),
        Some(Value::from("override"))
    );
}
