//! Component node end-to-end tests: creation, shadowing, identity, and
//! contract violations.

use crate::attrs::AttrBindings;
use crate::node::{
    create_or_update_component, BindError, ClassOrInstance, ComponentNode, CreateOptions,
};
use crate::registry::{ComponentClass, LookupResult, Registry};
use crate::scope::Scope;
use crate::support::{foo_bar_registry, recording_env};
use crate::template::{Block, NullVisitor, Template};
use crate::tree::Tree;
use std::cell::RefCell;
use std::rc::Rc;
use trellis_reactive::{Bound, Cell, Value};

fn attrs_of(entries: &[(&str, Bound)]) -> AttrBindings {
    entries
        .iter()
        .map(|(name, bound)| (name.to_string(), bound.clone()))
        .collect()
}

#[test]
fn test_create_shadows_declared_property_and_exposes_attrs() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let attrs = attrs_of(&[("name", Bound::from("x"))]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        None,
        None,
        Some("foo-bar"),
        None,
        None,
    )
    .unwrap();

    let instance = tree.instance(node.instance.unwrap());
    assert_eq!(instance.property("name"), Some(&Value::from("x")));
    assert_eq!(instance.attr("name"), Some(Value::from("x")));
    assert_eq!(instance.class_name.as_deref(), Some("foo-bar"));
}

#[test]
fn test_unknown_attrs_stay_off_properties() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let attrs = attrs_of(&[("name", Bound::from("x")), ("title", Bound::from("t"))]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        None,
        None,
        Some("foo-bar"),
        None,
        None,
    )
    .unwrap();

    let instance = tree.instance(node.instance.unwrap());
    assert!(!instance.declares("title"));
    // Still reachable on demand through the snapshot.
    assert_eq!(instance.attr("title"), Some(Value::from("t")));
}

#[test]
fn test_gating_off_means_no_property_sync() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let cell = Cell::new("name", Value::from("x"));
    let attrs = attrs_of(&[("name", Bound::Cell(cell.clone()))]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        None,
        None,
        Some("foo-bar"),
        None,
        None,
    )
    .unwrap();
    node.render(&mut tree, &env, Some(&attrs), &mut NullVisitor);

    cell.set(Value::from("y"));
    node.rerender(&mut tree, &env, Some(&attrs), &mut NullVisitor);

    // Flag was never set, so the shadowed property keeps its old value.
    let id = node.instance.unwrap();
    assert_eq!(tree.instance(id).property("name"), Some(&Value::from("x")));

    // With the flag set the same rerender syncs the property.
    tree.render_node_mut(render_node).should_receive_attrs = true;
    node.rerender(&mut tree, &env, Some(&attrs), &mut NullVisitor);
    assert_eq!(tree.instance(id).property("name"), Some(&Value::from("y")));
}

#[test]
fn test_identity_preserved_across_rerenders() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let attrs = attrs_of(&[("name", Bound::from("x"))]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        None,
        None,
        Some("foo-bar"),
        None,
        None,
    )
    .unwrap();
    node.render(&mut tree, &env, Some(&attrs), &mut NullVisitor);

    let id = node.instance.unwrap();
    for _ in 0..5 {
        node.rerender(&mut tree, &env, Some(&attrs), &mut NullVisitor);
        assert_eq!(tree.render_node(render_node).instance, Some(id));
        assert_eq!(tree.instance(id).render_node, Some(render_node));
    }
}

#[test]
fn test_update_path_batches_properties_without_identity_change() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let attrs = attrs_of(&[("name", Bound::from("x"))]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        None,
        None,
        Some("foo-bar"),
        None,
        None,
    )
    .unwrap();
    let id = node.instance.unwrap();

    let updated_attrs = attrs_of(&[("name", Bound::from("y")), ("title", Bound::from("t"))]);
    let updated = create_or_update_component(
        &mut tree,
        ClassOrInstance::Instance(id),
        CreateOptions {
            tag_name: Some("aside".to_string()),
            ..CreateOptions::default()
        },
        render_node,
        &env,
        Some(&updated_attrs),
    );

    // Same instance comes back, re-linked to the same target.
    assert_eq!(updated, id);
    assert_eq!(tree.render_node(render_node).instance, Some(id));
    assert_eq!(tree.instance(id).render_node, Some(render_node));

    let instance = tree.instance(id);
    assert_eq!(instance.property("name"), Some(&Value::from("y")));
    // Unknown attributes still shadow nothing but replace the snapshot.
    assert!(!instance.declares("title"));
    assert_eq!(instance.attr("title"), Some(Value::from("t")));
    assert_eq!(instance.tag_name.as_deref(), Some("aside"));
    // Fixed attrs not named this pass keep their old values.
    assert_eq!(instance.class_name.as_deref(), Some("foo-bar"));
}

#[test]
fn test_teardown_severs_link_and_clears_element() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let attrs = attrs_of(&[("name", Bound::from("x"))]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        None,
        None,
        Some("foo-bar"),
        None,
        None,
    )
    .unwrap();
    let id = node.instance.unwrap();
    let element = tree.alloc_element();
    tree.render_node_mut(render_node).first_element = Some(element);

    tree.teardown(render_node);

    assert_eq!(tree.render_node(render_node).instance, None);
    assert_eq!(tree.render_node(render_node).first_element, None);
    assert_eq!(tree.instance(id).render_node, None);
}

#[test]
fn test_component_without_content_scope_gets_isolation_scope() {
    let seen = Rc::new(RefCell::new(None));
    let seen_in_block = Rc::clone(&seen);
    let layout = Template::new("scoped-layout").with_block(Block::new(
        move |_tree, _env, _args, _node, scope, _visitor| {
            *seen_in_block.borrow_mut() = scope.map(|s| (s.component(), s.attrs().is_some()));
        },
    ));

    let registry = Registry::new();
    registry.register_component(ComponentClass::new("scoped-comp").with_layout(layout));
    let (env, _log) = recording_env(Rc::new(registry));

    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let attrs = attrs_of(&[("name", Bound::from("x"))]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        None,
        None,
        Some("scoped-comp"),
        None,
        None,
    )
    .unwrap();
    node.render(&mut tree, &env, Some(&attrs), &mut NullVisitor);

    let id = node.instance.unwrap();
    assert_eq!(*seen.borrow(), Some((Some(id), true)));
}

#[test]
fn test_scope_and_self_are_mutually_exclusive() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();

    let found = LookupResult {
        component: env.registry.component_for("foo-bar"),
        self_binding: Some(Bound::from("ctx")),
        ..LookupResult::default()
    };

    let result = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        None,
        Some(found),
        None,
        Some("foo-bar"),
        Some(Scope::root()),
        None,
    );

    assert!(matches!(result, Err(BindError::ScopeSelfConflict)));
    // The conflict surfaced before any instance was created or bound.
    assert!(tree.render_node(render_node).instance.is_none());
}

#[test]
fn test_unresolved_component_is_fatal() {
    let (env, _log) = recording_env(Rc::new(Registry::new()));
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();

    let result = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        None,
        None,
        None,
        Some("missing"),
        None,
        None,
    );

    match result {
        Err(BindError::UnresolvedComponent { tag }) => assert_eq!(tag, "missing"),
        other => panic!("expected UnresolvedComponent, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_template_only_node_has_no_instance() {
    let (env, log) = recording_env(Rc::new(Registry::new()));
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        None,
        None,
        None,
        None,
        None,
        Some(Template::new("inline")),
    )
    .unwrap();

    assert!(node.instance.is_none());
    node.render(&mut tree, &env, None, &mut NullVisitor);
    // No instance: no renderer hooks, no deferred events.
    assert!(log.borrow().is_empty());
    assert!(env.lifecycle.borrow().is_empty());
}

#[test]
fn test_deprecated_template_property_falls_back_with_signal() {
    let registry = Registry::new();
    let mut class = ComponentClass::new("legacy")
        .with_layout(Template::new("legacy-layout").with_root_element());
    class.template = Some(Template::new("legacy-content"));
    registry.register_component(class);
    let (env, _log) = recording_env(Rc::new(registry));

    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        None,
        None,
        None,
        Some("legacy"),
        None,
        None,
    )
    .unwrap();

    assert!(node.instance.is_some());
    let deprecations = env.diagnostics.deprecations();
    assert_eq!(deprecations.len(), 1);
    assert!(deprecations[0].contains("`template` property"));
}

#[test]
fn test_fixed_attrs_resolve_into_creation_options() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let attrs = attrs_of(&[
        ("id", Bound::from("main")),
        ("tagName", Bound::from("section")),
        ("name", Bound::from("x")),
    ]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        None,
        None,
        Some("foo-bar"),
        None,
        None,
    )
    .unwrap();

    let instance = tree.instance(node.instance.unwrap());
    assert_eq!(instance.element_id.as_deref(), Some("main"));
    assert_eq!(instance.tag_name.as_deref(), Some("section"));
}

#[test]
fn test_explicit_attrs_win_over_class_create_options() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();

    let found = LookupResult {
        component: env.registry.component_for("foo-bar"),
        create_options: Some(CreateOptions {
            tag_name: Some("ul".to_string()),
            element_id: Some("default-id".to_string()),
            ..CreateOptions::default()
        }),
        ..LookupResult::default()
    };
    let attrs = attrs_of(&[("tagName", Bound::from("ol"))]);

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        Some(&attrs),
        Some(found),
        None,
        Some("foo-bar"),
        None,
        None,
    )
    .unwrap();

    let instance = tree.instance(node.instance.unwrap());
    assert_eq!(instance.tag_name.as_deref(), Some("ol"));
    // Unchallenged defaults still apply.
    assert_eq!(instance.element_id.as_deref(), Some("default-id"));
}

#[test]
fn test_parent_append_and_view_name_binding() {
    let registry = Registry::new();
    registry.register_component(ComponentClass::new("parent-comp"));
    registry.register_component(ComponentClass::new("child-comp"));
    let (env, _log) = recording_env(Rc::new(registry));

    let mut tree = Tree::new();
    let parent_node = tree.alloc_render_node();
    let parent = ComponentNode::create(
        &mut tree,
        parent_node,
        &env,
        None,
        None,
        None,
        Some("parent-comp"),
        None,
        None,
    )
    .unwrap();
    let parent_id = parent.instance.unwrap();

    let child_node = tree.alloc_render_node();
    let attrs = attrs_of(&[("viewName", Bound::from("toolbar"))]);
    let child = ComponentNode::create(
        &mut tree,
        child_node,
        &env,
        Some(&attrs),
        None,
        Some(parent_id),
        Some("child-comp"),
        None,
        None,
    )
    .unwrap();
    let child_id = child.instance.unwrap();

    let parent_instance = tree.instance(parent_id);
    assert_eq!(parent_instance.children, vec![child_id]);
    assert_eq!(parent_instance.named_children.get("toolbar"), Some(&child_id));
    assert_eq!(tree.instance(child_id).parent, Some(parent_id));
}

#[test]
fn test_content_scope_self_becomes_initial_context() {
    let (env, _log) = recording_env(foo_bar_registry());
    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();

    let scope = Scope::root();
    scope.bind_self(Bound::from("outer-context"));

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        None,
        None,
        None,
        Some("foo-bar"),
        Some(scope),
        None,
    )
    .unwrap();

    let instance = tree.instance(node.instance.unwrap());
    assert_eq!(instance.context, Some(Value::from("outer-context")));
}

#[test]
fn test_supplied_controller_drops_inherited_context() {
    let registry = Registry::new();
    let mut class = ComponentClass::new("routed");
    class.controller = Some("custom".to_string());
    registry.register_component(class);
    let (env, _log) = recording_env(Rc::new(registry));

    let mut tree = Tree::new();
    let render_node = tree.alloc_render_node();
    let scope = Scope::root();
    scope.bind_self(Bound::from("outer-context"));

    let node = ComponentNode::create(
        &mut tree,
        render_node,
        &env,
        None,
        None,
        None,
        Some("routed"),
        Some(scope),
        None,
    )
    .unwrap();

    let instance = tree.instance(node.instance.unwrap());
    assert_eq!(instance.context, None);
    assert_eq!(instance.controller.as_deref(), Some("custom"));
}
