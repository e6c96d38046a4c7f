//! Scope chains.
//!
//! A scope is a chained namespace of bound names available to a render
//! pass. Children link to their parent at construction and the link never
//! changes. Binding a name to a cell means child passes observe updates
//! through the stored cell handle without re-resolving the chain.

use crate::attrs::AttrBindings;
use crate::tree::{InstanceId, RenderNodeId, Tree};
use indexmap::IndexMap;
use std::cell::{Cell as Flag, RefCell};
use std::fmt;
use std::rc::Rc;
use trellis_reactive::{Bound, Cell, Subscription, Value};

pub struct Scope {
    parent: Option<Rc<Scope>>,
    locals: RefCell<IndexMap<String, Bound>>,
    self_binding: RefCell<Option<Bound>>,
    view: Flag<Option<InstanceId>>,
    component: Flag<Option<InstanceId>>,
    attrs: RefCell<Option<AttrBindings>>,
    /// Cell subscriptions owned by this scope; dropped with it.
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Scope {
    pub fn root() -> Rc<Scope> {
        Rc::new(Self::with_parent(None))
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Self::with_parent(Some(Rc::clone(parent))))
    }

    fn with_parent(parent: Option<Rc<Scope>>) -> Self {
        Self {
            parent,
            locals: RefCell::new(IndexMap::new()),
            self_binding: RefCell::new(None),
            view: Flag::new(None),
            component: Flag::new(None),
            attrs: RefCell::new(None),
            subscriptions: RefCell::new(Vec::new()),
        }
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    pub fn bind_local(&self, name: impl Into<String>, bound: Bound) {
        self.locals.borrow_mut().insert(name.into(), bound);
    }

    /// Rebind a name to a notification-capable cell.
    pub fn override_local(&self, name: impl Into<String>, cell: Cell) {
        self.bind_local(name, Bound::Cell(cell));
    }

    /// Resolve a name, walking out through the parent chain.
    pub fn lookup(&self, name: &str) -> Option<Bound> {
        if let Some(bound) = self.locals.borrow().get(name) {
            return Some(bound.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    pub fn bind_self(&self, bound: Bound) {
        *self.self_binding.borrow_mut() = Some(bound);
    }

    pub fn self_binding(&self) -> Option<Bound> {
        self.self_binding.borrow().clone()
    }

    pub fn set_view(&self, view: Option<InstanceId>) {
        self.view.set(view);
    }

    pub fn view(&self) -> Option<InstanceId> {
        self.view.get()
    }

    pub fn set_component(&self, component: Option<InstanceId>) {
        self.component.set(component);
    }

    pub fn component(&self) -> Option<InstanceId> {
        self.component.get()
    }

    pub fn set_attrs(&self, attrs: Option<AttrBindings>) {
        *self.attrs.borrow_mut() = attrs;
    }

    pub fn attrs(&self) -> Option<AttrBindings> {
        self.attrs.borrow().clone()
    }

    fn retain(&self, subscription: Subscription) {
        self.subscriptions.borrow_mut().push(subscription);
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("locals", &self.locals.borrow().keys().collect::<Vec<_>>())
            .field("has_self", &self.self_binding.borrow().is_some())
            .field("view", &self.view.get())
            .field("depth", &{
                let mut depth = 0usize;
                let mut current = self.parent.clone();
                while let Some(scope) = current {
                    depth += 1;
                    current = scope.parent.clone();
                }
                depth
            })
            .finish()
    }
}

/// Options for shadow-scope construction, handed over by the template
/// builder.
#[derive(Debug, Default)]
pub struct ShadowScopeOptions {
    pub view: Option<InstanceId>,
    pub attrs: Option<AttrBindings>,
    pub self_binding: Option<Bound>,
}

/// Populate a freshly created shadow scope for a view boundary.
///
/// For plain (non-component) views, `controller` is bound as a fresh cell
/// and the view's context becomes the scope's `self`; component instances
/// keep their isolation and get neither. When a render node is supplied,
/// every fresh cell is subscribed to mark that node dirty on change.
pub fn bind_shadow_scope(
    tree: &Tree,
    shadow: &Rc<Scope>,
    render_node: Option<RenderNodeId>,
    options: Option<ShadowScopeOptions>,
) {
    let Some(options) = options else {
        return;
    };

    if let Some(view_id) = options.view {
        let instance = tree.instance(view_id);
        if !instance.is_component {
            let controller = instance
                .controller
                .as_ref()
                .map(|name| Value::from(name.as_str()))
                .unwrap_or(Value::Null);
            bind_fresh_cell(tree, shadow, "controller", controller, render_node, false);

            if instance.is_view && options.self_binding.is_none() {
                let context = instance.context.clone().unwrap_or(Value::Null);
                bind_fresh_cell(tree, shadow, "self", context, render_node, true);
            }
        }
    }

    shadow.set_view(options.view);

    if options.view.is_some() && options.attrs.is_some() {
        shadow.set_component(options.view);
    }

    if let Some(self_binding) = options.self_binding {
        shadow.bind_self(self_binding);
    }

    shadow.set_attrs(options.attrs);
}

fn bind_fresh_cell(
    tree: &Tree,
    scope: &Rc<Scope>,
    key: &str,
    value: Value,
    render_node: Option<RenderNodeId>,
    is_self: bool,
) {
    let cell = Cell::new(if is_self { "" } else { key }, value);
    if let Some(node) = render_node {
        let dirty = Rc::clone(&tree.render_node(node).dirty);
        scope.retain(cell.subscribe(move |_| dirty.set(true)));
    }
    if is_self {
        scope.bind_self(Bound::Cell(cell));
    } else {
        scope.bind_local(key, Bound::Cell(cell));
    }
}
