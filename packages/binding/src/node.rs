//! # Component Node
//!
//! Orchestrates the lifetime of one component within the render tree: it
//! resolves a tag to a class and/or layout, creates (or updates) the live
//! instance with snapshot + shadowing semantics, builds the render block,
//! and drives the create/rerender hook protocols.
//!
//! ## Identity Contract
//!
//! A render target maps back to exactly one live instance at a time. The
//! instance is created on the first pass that encounters the tag and is
//! reused, never replaced, across every subsequent rerender of the same
//! target.
//!
//! ## Hook Ordering Contract
//!
//! Within a create pass the renderer observes, in order: `set_attrs`,
//! `will_create_element`, `will_render`, the child block render,
//! `did_create_element`, `will_insert_element`; `DidInsertElement` is only
//! ever enqueued on the deferred lifecycle queue, never fired inline.
//! Within a rerender pass: `will_update`, the conditional
//! `update_attrs` + property merge, `will_render`, the child block render,
//! then a deferred `DidUpdate`. The deferred queue is drained by the host
//! scheduler after the whole tree pass completes, once the tree is
//! structurally stable.
//!
//! ## Attribute Reapplication Gating
//!
//! Rerenders only reapply attribute shadowing when the render target's
//! `should_receive_attrs` flag is set. The host walker sets it on
//! structural attribute changes; consuming it clears it.

use crate::attrs::{merge_bindings, shadowed_attrs, take_snapshot, AttrBindings};
use crate::env::{Env, LifecycleEvent, LifecycleHook};
use crate::registry::{lookup_component, ComponentClass, LookupResult};
use crate::scope::Scope;
use crate::template::{Block, Template, TemplateInput, TemplateOptions, Visitor};
use crate::tree::{Instance, InstanceId, RenderNodeId, Tree};
use indexmap::IndexMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, instrument};
use trellis_reactive::Value;

pub type BindResult<T> = Result<T, BindError>;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("could not find component named \"{tag}\" (no component or template with that name was found)")]
    UnresolvedComponent { tag: String },

    #[error("a component node can take a content scope or a self binding, but not both")]
    ScopeSelfConflict,
}

/// Creation options for a fresh instance: the closed set of fixed
/// attributes, resolved from their bindings at creation time.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub parent_view: Option<InstanceId>,
    pub element_id: Option<String>,
    pub tag_name: Option<String>,
    pub default_tag_name: Option<String>,
    pub view_name: Option<String>,
    /// Initial rendering context, dropped when a controller takes
    /// precedence.
    pub context: Option<Value>,
    pub controller: Option<String>,
}

impl CreateOptions {
    /// Overlay explicit options on class-level defaults; explicit wins.
    fn over(defaults: &CreateOptions, explicit: CreateOptions) -> CreateOptions {
        CreateOptions {
            parent_view: explicit.parent_view.or(defaults.parent_view),
            element_id: explicit.element_id.or_else(|| defaults.element_id.clone()),
            tag_name: explicit.tag_name.or_else(|| defaults.tag_name.clone()),
            default_tag_name: explicit
                .default_tag_name
                .or_else(|| defaults.default_tag_name.clone()),
            view_name: explicit.view_name.or_else(|| defaults.view_name.clone()),
            context: explicit.context.or_else(|| defaults.context.clone()),
            controller: explicit.controller.or_else(|| defaults.controller.clone()),
        }
    }
}

/// Target of a create-or-update: a class to instantiate, or an existing
/// instance to batch-update in place.
pub enum ClassOrInstance {
    Class(Rc<ComponentClass>),
    Instance(InstanceId),
}

/// The orchestrating unit for one component in the render tree.
pub struct ComponentNode {
    /// Owned instance; absent for attribute-less template-only nodes.
    pub instance: Option<InstanceId>,
    /// The content scope this node renders into.
    pub scope: Option<Rc<Scope>>,
    pub render_node: RenderNodeId,
    pub block: Option<Block>,
    /// Whether the template-building step created its own root element.
    pub expect_element: bool,
}

impl ComponentNode {
    /// Materialize a component reference into a node bound to a render
    /// target.
    ///
    /// Fails when neither a component class, a layout, nor a content
    /// template can be found for the path, or when both a content scope
    /// and a `self` override are supplied.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(path = path.unwrap_or("<inline>")))]
    pub fn create(
        tree: &mut Tree,
        render_node: RenderNodeId,
        env: &Env,
        attrs: Option<&AttrBindings>,
        found: Option<LookupResult>,
        parent_view: Option<InstanceId>,
        path: Option<&str>,
        content_scope: Option<Rc<Scope>>,
        content_template: Option<Template>,
    ) -> BindResult<ComponentNode> {
        let found = match found {
            Some(found) => found,
            None => match path {
                Some(path) => lookup_component(env, path),
                None => LookupResult::default(),
            },
        };

        let resolvable = if path.is_some() {
            found.component.is_some() || found.layout.is_some()
        } else {
            found.component.is_some() || found.layout.is_some() || content_template.is_some()
        };
        if !resolvable {
            return Err(BindError::UnresolvedComponent {
                tag: path.unwrap_or("<inline>").to_string(),
            });
        }

        // A content scope and a self override are mutually exclusive, and
        // the conflict must surface before any instance exists.
        if content_scope.is_some() && found.self_binding.is_some() {
            return Err(BindError::ScopeSelfConflict);
        }

        let mut instance = None;
        let mut layout = found.layout.clone();
        let mut content_template = content_template;

        if let Some(class) = &found.component {
            let mut explicit = CreateOptions {
                parent_view,
                ..CreateOptions::default()
            };

            if let Some(attrs) = attrs {
                if let Some(id) = attrs.get("id") {
                    explicit.element_id = Some(id.read().to_string());
                }
                if let Some(tag_name) = attrs.get("tagName") {
                    explicit.tag_name = Some(tag_name.read().to_string());
                }
                if let Some(default_tag_name) = attrs.get("_defaultTagName") {
                    explicit.default_tag_name = Some(default_tag_name.read().to_string());
                }
                if let Some(view_name) = attrs.get("viewName") {
                    explicit.view_name = Some(view_name.read().to_string());
                }
            }

            if class.instantiable {
                if let Some(scope) = &content_scope {
                    if let Some(self_binding) = scope.self_binding() {
                        explicit.context = Some(self_binding.read());
                    }
                }
            }

            let options = match &found.create_options {
                Some(defaults) => CreateOptions::over(defaults, explicit),
                None => explicit,
            };

            let id = create_or_update_component(
                tree,
                ClassOrInstance::Class(Rc::clone(class)),
                options,
                render_node,
                env,
                attrs,
            );
            instance = Some(id);

            let created = tree.instance(id);
            if created.layout.is_some() {
                layout = created.layout.clone();
                if content_template.is_none() {
                    if let Some(template) = created.template.clone() {
                        env.diagnostics
                            .deprecate("Using deprecated `template` property on a component.");
                        content_template = Some(template);
                    }
                }
            } else {
                layout = created.template.clone().or(layout);
            }
        }

        debug!(
            has_instance = instance.is_some(),
            has_layout = layout.is_some(),
            has_content_template = content_template.is_some(),
            "Building component template"
        );

        let info = TemplateInput {
            layout: layout.as_ref(),
            component: instance,
        };
        let builder = Rc::clone(&env.template_builder);
        let results = builder.build(
            tree,
            env,
            &info,
            attrs,
            TemplateOptions {
                template: content_template,
                scope: content_scope.clone(),
                self_binding: found.self_binding.clone(),
            },
        );

        Ok(ComponentNode {
            instance,
            scope: content_scope,
            render_node,
            block: results.block,
            expect_element: results.created_element,
        })
    }

    /// First render pass: fire the create-protocol hooks around the child
    /// block render and defer `DidInsertElement`.
    #[instrument(skip_all, fields(render_node = self.render_node.index()))]
    pub fn render(
        &self,
        tree: &mut Tree,
        env: &Env,
        attrs: Option<&AttrBindings>,
        visitor: &mut dyn Visitor,
    ) {
        let new_env = match self.instance {
            Some(id) => env.with_view(id),
            None => env.clone(),
        };

        if let Some(id) = self.instance {
            let empty = AttrBindings::new();
            let snapshot = take_snapshot(attrs.unwrap_or(&empty));
            tree.instance_mut(id).attrs = snapshot.clone();
            env.renderer.borrow_mut().set_attrs(tree, id, &snapshot);
            env.renderer.borrow_mut().will_create_element(tree, id);
            env.renderer.borrow_mut().will_render(tree, id);
        }

        if let Some(block) = &self.block {
            block.invoke(
                tree,
                &new_env,
                &[],
                self.render_node,
                self.scope.as_ref(),
                visitor,
            );
        }

        if let Some(id) = self.instance {
            let element = if self.expect_element {
                tree.render_node(self.render_node).first_element
            } else {
                None
            };
            env.renderer.borrow_mut().did_create_element(tree, id, element);
            env.renderer.borrow_mut().will_insert_element(tree, id, element);
            env.lifecycle.borrow_mut().push(LifecycleEvent {
                hook: LifecycleHook::DidInsertElement,
                instance: id,
            });
        }
    }

    /// Update pass: notify dirtiness, conditionally reapply attributes,
    /// re-invoke the block against the existing target and scope, and defer
    /// `DidUpdate`. Returns the derived environment for downstream callers.
    #[instrument(skip_all, fields(render_node = self.render_node.index()))]
    pub fn rerender(
        &self,
        tree: &mut Tree,
        env: &Env,
        attrs: Option<&AttrBindings>,
        visitor: &mut dyn Visitor,
    ) -> Env {
        let new_env = match self.instance {
            Some(id) => env.with_view(id),
            None => env.clone(),
        };

        if let Some(id) = self.instance {
            let empty = AttrBindings::new();
            let snapshot = take_snapshot(attrs.unwrap_or(&empty));

            // Dirty notification precedes everything else in the pass.
            env.renderer.borrow_mut().will_update(tree, id, &snapshot);

            let receiving = tree
                .instance(id)
                .render_node
                .filter(|node| tree.render_node(*node).should_receive_attrs);
            if let Some(node) = receiving {
                debug!(instance = id.index(), "Reapplying attributes");
                env.renderer.borrow_mut().update_attrs(tree, id, &snapshot);
                let shadowed = shadowed_attrs(&tree.instance(id).properties, &snapshot);
                let target = tree.instance_mut(id);
                target.attrs = snapshot;
                merge_bindings(&mut target.properties, &shadowed);
                tree.render_node_mut(node).should_receive_attrs = false;
            }

            env.renderer.borrow_mut().will_render(tree, id);
        }

        if let Some(block) = &self.block {
            block.invoke(
                tree,
                &new_env,
                &[],
                self.render_node,
                self.scope.as_ref(),
                visitor,
            );
        }

        if let Some(id) = self.instance {
            env.lifecycle.borrow_mut().push(LifecycleEvent {
                hook: LifecycleHook::DidUpdate,
                instance: id,
            });
        }

        new_env
    }
}

/// Instantiate a fresh instance from a class, or batch-update an existing
/// one, and bind it to the render target.
///
/// Malformed input is a contract violation caught upstream by
/// [`ComponentNode::create`]; this operation itself has no error path.
#[instrument(skip_all, fields(render_node = render_node.index()))]
pub fn create_or_update_component(
    tree: &mut Tree,
    target: ClassOrInstance,
    options: CreateOptions,
    render_node: RenderNodeId,
    env: &Env,
    attrs: Option<&AttrBindings>,
) -> InstanceId {
    let empty = AttrBindings::new();
    let attrs = attrs.unwrap_or(&empty);
    let snapshot = take_snapshot(attrs);
    let has_supplied_controller = attrs.contains_key("controller");

    let parent_view = options.parent_view;
    let view_name = options.view_name.clone();

    let id = match target {
        ClassOrInstance::Class(class) => {
            // Shadow against the prototype: only declared properties may be
            // overwritten; unknown attributes stay on `attrs` for on-demand
            // resolution.
            let shadowed = shadowed_attrs(&class.prototype, &snapshot);
            let mut properties = class.prototype.clone();
            merge_bindings(&mut properties, &shadowed);
            debug!(
                class = %class.name,
                shadowed = shadowed.len(),
                total_attrs = snapshot.len(),
                "Creating component instance"
            );

            let container = match parent_view {
                Some(parent) => tree.instance(parent).container.clone(),
                None => Some(Rc::clone(&env.registry)),
            };

            // A supplied controller takes precedence over inherited context.
            let context = if class.controller.is_some() || has_supplied_controller {
                None
            } else {
                options.context
            };

            tree.insert_instance(Instance {
                class_name: Some(class.name.clone()),
                is_component: true,
                is_view: false,
                properties,
                attrs: snapshot,
                render_node: None,
                parent: None,
                children: Vec::new(),
                named_children: IndexMap::new(),
                element_id: options.element_id,
                tag_name: options.tag_name,
                default_tag_name: options.default_tag_name,
                view_name: options.view_name,
                context,
                controller: options.controller.or_else(|| class.controller.clone()),
                layout: class.layout.clone(),
                template: class.template.clone(),
                container,
            })
        }
        ClassOrInstance::Instance(id) => {
            // Batched property update, no identity change.
            let shadowed = shadowed_attrs(&tree.instance(id).properties, &snapshot);
            debug!(
                instance = id.index(),
                shadowed = shadowed.len(),
                "Updating existing component instance"
            );
            let target = tree.instance_mut(id);
            target.attrs = snapshot;
            merge_bindings(&mut target.properties, &shadowed);
            if options.element_id.is_some() {
                target.element_id = options.element_id;
            }
            if options.tag_name.is_some() {
                target.tag_name = options.tag_name;
            }
            if options.default_tag_name.is_some() {
                target.default_tag_name = options.default_tag_name;
            }
            if options.view_name.is_some() {
                target.view_name = options.view_name;
            }
            if options.controller.is_some() {
                target.controller = options.controller;
            }
            id
        }
    };

    if let Some(parent) = parent_view {
        tree.append_child(parent, id);
        if let Some(view_name) = view_name {
            tree.instance_mut(parent).named_children.insert(view_name, id);
        }
    }

    tree.link(render_node, id);
    id
}
