//! Component registry and lookup bridge.
//!
//! The registry is the container an environment carries: named component
//! classes and named layouts, resolved through the `component-lookup`
//! service semantics of `lookup_component`. Pure lookup; caching, if any,
//! is the registry owner's concern.

use crate::env::Env;
use crate::node::CreateOptions;
use crate::template::Template;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use trellis_reactive::{Bound, Value};

/// A registered component class: the declared property set (with defaults)
/// that attribute shadowing is checked against, plus creation metadata.
#[derive(Debug, Clone, Default)]
pub struct ComponentClass {
    pub name: String,
    /// Declared properties and their default values. An attribute shadows
    /// an instance property only if its name appears here.
    pub prototype: IndexMap<String, Value>,
    /// Set when the class deviates from the default view controller.
    pub controller: Option<String>,
    /// Class-level creation option defaults; explicit per-instance
    /// attributes win over these.
    pub create_options: Option<CreateOptions>,
    pub layout: Option<Template>,
    /// Deprecated `template` property carried by legacy classes.
    pub template: Option<Template>,
    /// Whether the class can instantiate fresh instances.
    pub instantiable: bool,
}

impl ComponentClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instantiable: true,
            ..Self::default()
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, default: Value) -> Self {
        self.prototype.insert(name.into(), default);
        self
    }

    pub fn with_layout(mut self, layout: Template) -> Self {
        self.layout = Some(layout);
        self
    }
}

/// Named component classes and layouts.
#[derive(Debug, Default)]
pub struct Registry {
    components: RefCell<IndexMap<String, Rc<ComponentClass>>>,
    layouts: RefCell<IndexMap<String, Template>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_component(&self, class: ComponentClass) {
        debug!(component_name = %class.name, "Registering component class");
        self.components
            .borrow_mut()
            .insert(class.name.clone(), Rc::new(class));
    }

    pub fn register_layout(&self, tag: impl Into<String>, layout: Template) {
        let tag = tag.into();
        debug!(tag = %tag, "Registering layout");
        self.layouts.borrow_mut().insert(tag, layout);
    }

    pub fn component_for(&self, tag: &str) -> Option<Rc<ComponentClass>> {
        self.components.borrow().get(tag).cloned()
    }

    pub fn layout_for(&self, tag: &str) -> Option<Template> {
        self.layouts.borrow().get(tag).cloned()
    }
}

/// Result of resolving a tag name.
#[derive(Debug, Clone, Default)]
pub struct LookupResult {
    pub component: Option<Rc<ComponentClass>>,
    pub layout: Option<Template>,
    /// Creation option defaults supplied by the resolver.
    pub create_options: Option<CreateOptions>,
    /// A `self` override; mutually exclusive with a content scope.
    pub self_binding: Option<Bound>,
}

/// Resolve a tag name to a component class and/or layout via the
/// environment's container.
pub fn lookup_component(env: &Env, tag: &str) -> LookupResult {
    let container = &env.registry;
    LookupResult {
        component: container.component_for(tag),
        layout: container.layout_for(tag),
        create_options: None,
        self_binding: None,
    }
}
