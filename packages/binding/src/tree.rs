//! Render tree arenas.
//!
//! Render targets and component instances live in two arenas owned by
//! [`Tree`] and refer to each other by index, never by reference. The
//! render-node ↔ instance cycle is therefore inspectable and can be torn
//! down explicitly.

use crate::attrs::Snapshot;
use crate::registry::Registry;
use crate::template::Template;
use indexmap::IndexMap;
use std::cell::Cell as Flag;
use std::rc::Rc;
use trellis_reactive::{Resolved, Value};

/// Position in the rendered output tree where content is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderNodeId(usize);

/// A live component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

/// Opaque handle for a produced DOM element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

impl RenderNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl InstanceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A render target slot.
#[derive(Debug)]
pub struct RenderNode {
    /// Gates attribute reapplication on rerender; set by the host walker
    /// when attributes structurally change, cleared once consumed.
    pub should_receive_attrs: bool,
    /// First element produced under this target, if any.
    pub first_element: Option<ElementId>,
    /// The instance currently bound to this target.
    pub instance: Option<InstanceId>,
    /// Set by scope-cell subscriptions when a bound cell changes.
    pub dirty: Rc<Flag<bool>>,
}

impl RenderNode {
    fn new() -> Self {
        Self {
            should_receive_attrs: false,
            first_element: None,
            instance: None,
            dirty: Rc::new(Flag::new(false)),
        }
    }
}

/// A component instance: an open property bag seeded from the class
/// prototype, the latest attribute snapshot, and a back-reference to the
/// render target it is bound to.
#[derive(Debug, Default)]
pub struct Instance {
    pub class_name: Option<String>,
    /// Component instances get shadow scopes of their own; plain views
    /// additionally expose their context as `self` (see `bind_shadow_scope`).
    pub is_component: bool,
    pub is_view: bool,
    pub properties: IndexMap<String, Value>,
    pub attrs: Snapshot,
    pub render_node: Option<RenderNodeId>,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
    pub named_children: IndexMap<String, InstanceId>,
    pub element_id: Option<String>,
    pub tag_name: Option<String>,
    pub default_tag_name: Option<String>,
    pub view_name: Option<String>,
    pub context: Option<Value>,
    pub controller: Option<String>,
    pub layout: Option<Template>,
    /// Deprecated content-template fallback.
    pub template: Option<Template>,
    pub container: Option<Rc<Registry>>,
}

impl Instance {
    /// Whether the instance declares a property of this name (prototype
    /// properties plus anything shadowed since).
    pub fn declares(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// On-demand attribute access for names that never shadowed a declared
    /// property. Reads the latest snapshot.
    pub fn attr(&self, name: &str) -> Option<Value> {
        self.attrs.get(name).map(Resolved::unwrap_value)
    }
}

/// Arena owner for render nodes and component instances.
#[derive(Debug, Default)]
pub struct Tree {
    render_nodes: Vec<RenderNode>,
    instances: Vec<Instance>,
    next_element: usize,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_render_node(&mut self) -> RenderNodeId {
        let id = RenderNodeId(self.render_nodes.len());
        self.render_nodes.push(RenderNode::new());
        id
    }

    pub fn alloc_element(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        id
    }

    pub fn render_node(&self, id: RenderNodeId) -> &RenderNode {
        &self.render_nodes[id.0]
    }

    pub fn render_node_mut(&mut self, id: RenderNodeId) -> &mut RenderNode {
        &mut self.render_nodes[id.0]
    }

    pub fn insert_instance(&mut self, instance: Instance) -> InstanceId {
        let id = InstanceId(self.instances.len());
        self.instances.push(instance);
        id
    }

    pub fn instance(&self, id: InstanceId) -> &Instance {
        &self.instances[id.0]
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> &mut Instance {
        &mut self.instances[id.0]
    }

    /// Record the bidirectional render-node ↔ instance linkage.
    pub fn link(&mut self, node: RenderNodeId, instance: InstanceId) {
        self.render_nodes[node.0].instance = Some(instance);
        self.instances[instance.0].render_node = Some(node);
    }

    pub fn append_child(&mut self, parent: InstanceId, child: InstanceId) {
        self.instances[child.0].parent = Some(parent);
        self.instances[parent.0].children.push(child);
    }

    /// Sever both directions of the render-node ↔ instance link when the
    /// target is removed from the tree.
    pub fn teardown(&mut self, node: RenderNodeId) {
        if let Some(instance) = self.render_nodes[node.0].instance.take() {
            self.instances[instance.0].render_node = None;
        }
        self.render_nodes[node.0].first_element = None;
    }
}
