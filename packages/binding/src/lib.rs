pub mod attrs;
pub mod env;
pub mod node;
pub mod registry;
pub mod scope;
pub mod template;
pub mod tree;




#[cfg(test)]
mod tests_node;

#[cfg(test)]
mod tests_scope;

pub use attrs::{merge_bindings, shadowed_attrs, take_snapshot, AttrBindings, Snapshot};
pub use env::{
    Diagnostics, Env, LifecycleEvent, LifecycleHook, LifecycleQueue, NullRenderer, Renderer,
};
pub use node::{
    create_or_update_component, BindError, BindResult, ClassOrInstance, ComponentNode,
    CreateOptions,
};
pub use registry::{lookup_component, ComponentClass, LookupResult, Registry};
pub use scope::{bind_shadow_scope, Scope, ShadowScopeOptions};
pub use template::{
    Block, BuiltTemplate, NullVisitor, ShadowTemplateBuilder, Template, TemplateBuilder,
    TemplateInput, TemplateOptions, Visitor,
};
pub use tree::{ElementId, Instance, InstanceId, RenderNode, RenderNodeId, Tree};
