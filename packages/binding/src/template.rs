//! Compiled-template collaborators.
//!
//! Template compilation itself lives outside this crate. What the binding
//! engine needs is the shape of its output: a [`Template`] handle whose
//! [`Block`] can be invoked against a render target, and a
//! [`TemplateBuilder`] that combines a layout, attribute bindings, and
//! content-scope options into the block a component node will render.
//! [`ShadowTemplateBuilder`] is the default builder: it constructs the
//! shadow scope the block closes over, so the engine is runnable without a
//! host template compiler.

use crate::attrs::AttrBindings;
use crate::env::Env;
use crate::scope::{bind_shadow_scope, Scope, ShadowScopeOptions};
use crate::tree::{InstanceId, RenderNodeId, Tree};
use std::fmt;
use std::rc::Rc;
use trellis_reactive::{Bound, Value};

/// Host tree-walker callback, threaded through block invocations.
pub trait Visitor {
    fn visit(&mut self, node: RenderNodeId);
}

/// Visitor that does nothing; used by hosts rendering a single node.
pub struct NullVisitor;

impl Visitor for NullVisitor {
    fn visit(&mut self, _node: RenderNodeId) {}
}

type BlockFn = dyn Fn(&mut Tree, &Env, &[Value], RenderNodeId, Option<&Rc<Scope>>, &mut dyn Visitor);

/// A callable render function bound to a scope.
#[derive(Clone)]
pub struct Block {
    f: Rc<BlockFn>,
}

impl Block {
    pub fn new(
        f: impl Fn(&mut Tree, &Env, &[Value], RenderNodeId, Option<&Rc<Scope>>, &mut dyn Visitor)
            + 'static,
    ) -> Self {
        Self { f: Rc::new(f) }
    }

    pub fn invoke(
        &self,
        tree: &mut Tree,
        env: &Env,
        args: &[Value],
        render_node: RenderNodeId,
        scope: Option<&Rc<Scope>>,
        visitor: &mut dyn Visitor,
    ) {
        (self.f)(tree, env, args, render_node, scope, visitor)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Block")
    }
}

/// Opaque compiled-template handle.
#[derive(Clone)]
pub struct Template {
    pub name: String,
    /// Whether rendering this template produces its own root element.
    pub creates_element: bool,
    pub block: Option<Block>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creates_element: false,
            block: None,
        }
    }

    pub fn with_root_element(mut self) -> Self {
        self.creates_element = true;
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.block = Some(block);
        self
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("creates_element", &self.creates_element)
            .field("has_block", &self.block.is_some())
            .finish()
    }
}

/// Layout and owning component handed to the builder.
#[derive(Debug)]
pub struct TemplateInput<'a> {
    pub layout: Option<&'a Template>,
    pub component: Option<InstanceId>,
}

/// Content-scope options: at most one of `scope` and `self_binding` is set
/// (enforced upstream by the component node).
#[derive(Debug, Default)]
pub struct TemplateOptions {
    pub template: Option<Template>,
    pub scope: Option<Rc<Scope>>,
    pub self_binding: Option<Bound>,
}

/// What the builder hands back to the component node.
pub struct BuiltTemplate {
    pub block: Option<Block>,
    pub created_element: bool,
}

pub trait TemplateBuilder {
    fn build(
        &self,
        tree: &mut Tree,
        env: &Env,
        info: &TemplateInput<'_>,
        attrs: Option<&AttrBindings>,
        options: TemplateOptions,
    ) -> BuiltTemplate;
}

/// Default builder: prefers the layout block over the content template's,
/// reports whether the chosen template creates its own root element, and
/// rebinds the block to a freshly built shadow scope. Component layouts get
/// a shadow scope even when the host supplies no content scope, so the
/// isolation boundary (recorded component + attrs) always exists.
pub struct ShadowTemplateBuilder;

impl TemplateBuilder for ShadowTemplateBuilder {
    fn build(
        &self,
        tree: &mut Tree,
        _env: &Env,
        info: &TemplateInput<'_>,
        attrs: Option<&AttrBindings>,
        options: TemplateOptions,
    ) -> BuiltTemplate {
        let chosen = info.layout.cloned().or_else(|| options.template.clone());
        let created_element = chosen.as_ref().map(|t| t.creates_element).unwrap_or(false);
        let inner = chosen.and_then(|t| t.block);

        let shadow = if let Some(parent) = &options.scope {
            let shadow = Scope::child(parent);
            bind_shadow_scope(
                tree,
                &shadow,
                None,
                Some(ShadowScopeOptions {
                    view: info.component,
                    attrs: attrs.cloned(),
                    self_binding: options.self_binding.clone(),
                }),
            );
            Some(shadow)
        } else if let Some(self_binding) = &options.self_binding {
            let root = Scope::root();
            root.bind_self(self_binding.clone());
            Some(root)
        } else if info.component.is_some() {
            // Components are isolation boundaries regardless of whether the
            // host handed us a content scope to extend.
            let shadow = Scope::child(&Scope::root());
            bind_shadow_scope(
                tree,
                &shadow,
                None,
                Some(ShadowScopeOptions {
                    view: info.component,
                    attrs: attrs.cloned(),
                    self_binding: None,
                }),
            );
            Some(shadow)
        } else {
            None
        };

        let block = inner.map(|inner| match shadow {
            Some(shadow) => Block::new(move |tree, env, args, node, _scope, visitor| {
                inner.invoke(tree, env, args, node, Some(&shadow), visitor)
            }),
            None => inner,
        });

        BuiltTemplate {
            block,
            created_element,
        }
    }
}
