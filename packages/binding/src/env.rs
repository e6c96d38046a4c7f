//! Render environment and its external interfaces.
//!
//! `Env` bundles the collaborators a render pass consumes: the renderer's
//! lifecycle hooks, the component registry, the template builder, the
//! deferred lifecycle queue, and the diagnostics sink. It clones cheaply
//! (shared `Rc` parts), which is how per-component derived environments are
//! made.

use crate::attrs::Snapshot;
use crate::registry::Registry;
use crate::template::{ShadowTemplateBuilder, TemplateBuilder};
use crate::tree::{ElementId, InstanceId, Tree};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::warn;

/// Side-effecting renderer hooks. No return value is relied upon; default
/// bodies are no-ops so hosts implement only what they observe.
pub trait Renderer {
    fn set_attrs(&mut self, _tree: &mut Tree, _instance: InstanceId, _snapshot: &Snapshot) {}
    fn will_create_element(&mut self, _tree: &mut Tree, _instance: InstanceId) {}
    fn will_render(&mut self, _tree: &mut Tree, _instance: InstanceId) {}
    fn did_create_element(
        &mut self,
        _tree: &mut Tree,
        _instance: InstanceId,
        _element: Option<ElementId>,
    ) {
    }
    fn will_insert_element(
        &mut self,
        _tree: &mut Tree,
        _instance: InstanceId,
        _element: Option<ElementId>,
    ) {
    }
    fn will_update(&mut self, _tree: &mut Tree, _instance: InstanceId, _snapshot: &Snapshot) {}
    fn update_attrs(&mut self, _tree: &mut Tree, _instance: InstanceId, _snapshot: &Snapshot) {}
}

/// Renderer that observes nothing.
pub struct NullRenderer;

impl Renderer for NullRenderer {}

/// Deferred lifecycle callbacks, drained by the host scheduler after the
/// full tree pass completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleHook {
    DidInsertElement,
    DidUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub hook: LifecycleHook,
    pub instance: InstanceId,
}

/// Append-only ordered queue of deferred lifecycle events.
#[derive(Debug, Default)]
pub struct LifecycleQueue {
    events: Vec<LifecycleEvent>,
}

impl LifecycleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LifecycleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand the queued events to the post-pass scheduler, in order.
    pub fn drain(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Explicit diagnostics sink: deprecations are recorded here (and logged)
/// instead of reported through an ambient process-wide channel.
#[derive(Debug, Default)]
pub struct Diagnostics {
    deprecations: RefCell<Vec<String>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deprecate(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(deprecation = %message, "Deprecated usage");
        self.deprecations.borrow_mut().push(message);
    }

    pub fn deprecations(&self) -> Vec<String> {
        self.deprecations.borrow().clone()
    }
}

/// The environment threaded through every binding operation.
#[derive(Clone)]
pub struct Env {
    pub renderer: Rc<RefCell<dyn Renderer>>,
    pub registry: Rc<Registry>,
    pub template_builder: Rc<dyn TemplateBuilder>,
    pub lifecycle: Rc<RefCell<LifecycleQueue>>,
    pub diagnostics: Rc<Diagnostics>,
    /// The component instance child content renders under, if any.
    pub view: Option<InstanceId>,
}

impl Env {
    pub fn new(registry: Rc<Registry>, renderer: Rc<RefCell<dyn Renderer>>) -> Self {
        Self {
            renderer,
            registry,
            template_builder: Rc::new(ShadowTemplateBuilder),
            lifecycle: Rc::new(RefCell::new(LifecycleQueue::new())),
            diagnostics: Rc::new(Diagnostics::new()),
            view: None,
        }
    }

    /// Derive the component-scoped environment: a shallow copy with `view`
    /// pointed at the instance.
    pub fn with_view(&self, view: InstanceId) -> Env {
        let mut env = self.clone();
        env.view = Some(view);
        env
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("view", &self.view)
            .field("queued_events", &self.lifecycle.borrow().events().len())
            .finish()
    }
}
