//! Components
//!
//! A [`Component`] is an application-authored definition: an optional
//! `setup` function building local state, and a render function or a
//! template to compile into one. A [`ComponentInstance`] is created each
//! time a component vnode is mounted.
//!
//! # Lifecycle
//!
//! constructed → props and slots initialized → setup invoked → render bound
//! → mounted → (updating ⇄ mounted) → unmounted
//!
//! # Current Instance
//!
//! While `setup` runs, the instance is pushed on a thread-local stack so
//! that [`provide`](super::provide), [`inject`](super::inject) and
//! [`get_current_instance`] can find it. The entry is popped by a guard,
//! including when `setup` panics.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::emit::emit;
use super::inject;
use super::public_instance::InstanceProxy;
use super::scheduler::Job;
use super::slots::{normalize_slots, Slots};
use super::vnode::VNode;
use crate::error::{CompileError, Result, RuntimeError};
use crate::reactive::{proxy_refs, shallow_readonly, ProxyRefs, ReactiveContext, ReactiveEffect};
use crate::shared::{Object, ShapeFlags, Value};

/// Render function: builds the component's vnode tree from its public proxy.
pub type RenderFn = Arc<dyn Fn(&InstanceProxy) -> VNode + Send + Sync>;

/// Setup function: receives shallow-readonly props and a context.
pub type SetupFn = Arc<dyn Fn(&Value, &SetupContext) -> SetupResult + Send + Sync>;

/// Template compiler installed with [`register_runtime_compiler`].
pub type CompilerFn = Arc<dyn Fn(&str) -> std::result::Result<RenderFn, CompileError> + Send + Sync>;

/// What `setup` returned.
pub enum SetupResult {
    /// State exposed to render, with refs auto-unwrapped.
    State(Object),
    /// A render function used instead of the definition's.
    Render(RenderFn),
    None,
}

impl From<Object> for SetupResult {
    fn from(state: Object) -> Self {
        SetupResult::State(state)
    }
}

impl From<()> for SetupResult {
    fn from(_: ()) -> Self {
        SetupResult::None
    }
}

/// A component definition.
pub struct Component {
    name: String,
    setup: Option<SetupFn>,
    /// Render function, memoized here once a template is compiled.
    render: RwLock<Option<RenderFn>>,
    template: Option<String>,
}

impl Component {
    /// Start building a definition.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder {
            name: name.into(),
            setup: None,
            render: None,
            template: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn render_fn(&self) -> Option<RenderFn> {
        self.render.read().clone()
    }

    pub fn has_setup(&self) -> bool {
        self.setup.is_some()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("setup", &self.setup.is_some())
            .field("render", &self.render.read().is_some())
            .field("template", &self.template)
            .finish()
    }
}

/// Builder for [`Component`].
pub struct ComponentBuilder {
    name: String,
    setup: Option<SetupFn>,
    render: Option<RenderFn>,
    template: Option<String>,
}

impl ComponentBuilder {
    pub fn setup<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &SetupContext) -> R + Send + Sync + 'static,
        R: Into<SetupResult>,
    {
        self.setup = Some(Arc::new(move |props: &Value, ctx: &SetupContext| -> SetupResult {
            f(props, ctx).into()
        }));
        self
    }

    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&InstanceProxy) -> VNode + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn build(self) -> Arc<Component> {
        Arc::new(Component {
            name: self.name,
            setup: self.setup,
            render: RwLock::new(self.render),
            template: self.template,
        })
    }
}

static COMPILER: OnceLock<RwLock<Option<CompilerFn>>> = OnceLock::new();

fn compiler_slot() -> &'static RwLock<Option<CompilerFn>> {
    COMPILER.get_or_init(|| RwLock::new(None))
}

/// Install the compiler used for components that only carry a template.
pub fn register_runtime_compiler<F>(compile: F)
where
    F: Fn(&str) -> std::result::Result<RenderFn, CompileError> + Send + Sync + 'static,
{
    *compiler_slot().write() = Some(Arc::new(compile));
}

fn runtime_compiler() -> Option<CompilerFn> {
    compiler_slot().read().clone()
}

/// Counter for generating unique instance IDs.
static INSTANCE_UID: AtomicU64 = AtomicU64::new(0);

/// A mounted component.
///
/// Cloning yields another handle to the same instance.
#[derive(Clone)]
pub struct ComponentInstance(Arc<InstanceInner>);

/// Non-owning handle to an instance.
#[derive(Clone)]
pub struct WeakInstance(Weak<InstanceInner>);

impl WeakInstance {
    pub fn upgrade(&self) -> Option<ComponentInstance> {
        self.0.upgrade().map(ComponentInstance)
    }
}

pub(crate) struct InstanceInner {
    uid: u64,
    ty: Arc<Component>,
    vnode: RwLock<VNode>,
    props: RwLock<Object>,
    setup_state: RwLock<ProxyRefs>,
    slots: RwLock<Slots>,
    /// Values this instance provides to its descendants.
    provides: RwLock<IndexMap<String, Value>>,
    parent: Option<WeakInstance>,
    is_mounted: AtomicBool,
    sub_tree: RwLock<Option<VNode>>,
    next: RwLock<Option<VNode>>,
    render: RwLock<Option<RenderFn>>,
    update: RwLock<Option<ReactiveEffect>>,
    /// Error raised inside the render effect, waiting for the caller.
    pending_error: Mutex<Option<RuntimeError>>,
}

impl ComponentInstance {
    /// Create an instance of `component` for the vnode being mounted.
    pub fn new(
        component: Arc<Component>,
        vnode: &VNode,
        parent: Option<&ComponentInstance>,
    ) -> Self {
        Self(Arc::new(InstanceInner {
            uid: INSTANCE_UID.fetch_add(1, Ordering::Relaxed),
            ty: component,
            vnode: RwLock::new(vnode.clone()),
            props: RwLock::new(Object::new()),
            setup_state: RwLock::new(ProxyRefs::default()),
            slots: RwLock::new(Slots::new()),
            provides: RwLock::new(IndexMap::new()),
            parent: parent.map(ComponentInstance::downgrade),
            is_mounted: AtomicBool::new(false),
            sub_tree: RwLock::new(None),
            next: RwLock::new(None),
            render: RwLock::new(None),
            update: RwLock::new(None),
            pending_error: Mutex::new(None),
        }))
    }

    pub fn uid(&self) -> u64 {
        self.0.uid
    }

    pub fn component(&self) -> &Arc<Component> {
        &self.0.ty
    }

    pub fn name(&self) -> &str {
        self.0.ty.name()
    }

    pub fn vnode(&self) -> VNode {
        self.0.vnode.read().clone()
    }

    pub(crate) fn set_vnode(&self, vnode: VNode) {
        *self.0.vnode.write() = vnode;
    }

    /// Raw props as last received from the parent.
    pub fn props(&self) -> Object {
        self.0.props.read().clone()
    }

    pub fn setup_state(&self) -> ProxyRefs {
        self.0.setup_state.read().clone()
    }

    pub fn slots(&self) -> Slots {
        self.0.slots.read().clone()
    }

    pub fn parent(&self) -> Option<ComponentInstance> {
        self.0.parent.as_ref().and_then(WeakInstance::upgrade)
    }

    pub fn is_mounted(&self) -> bool {
        self.0.is_mounted.load(Ordering::SeqCst)
    }

    pub(crate) fn set_mounted(&self, mounted: bool) {
        self.0.is_mounted.store(mounted, Ordering::SeqCst);
    }

    /// The tree produced by the last render.
    pub fn sub_tree(&self) -> Option<VNode> {
        self.0.sub_tree.read().clone()
    }

    pub(crate) fn replace_sub_tree(&self, tree: VNode) -> Option<VNode> {
        self.0.sub_tree.write().replace(tree)
    }

    pub(crate) fn set_next(&self, next: Option<VNode>) {
        *self.0.next.write() = next;
    }

    pub(crate) fn take_next(&self) -> Option<VNode> {
        self.0.next.write().take()
    }

    pub fn render_fn(&self) -> Option<RenderFn> {
        self.0.render.read().clone()
    }

    /// The render effect, once mounted.
    pub fn update_effect(&self) -> Option<ReactiveEffect> {
        self.0.update.read().clone()
    }

    pub(crate) fn set_update_effect(&self, effect: ReactiveEffect) {
        *self.0.update.write() = Some(effect);
    }

    /// Re-render now, bypassing the scheduler.
    pub fn update(&self) -> Result<()> {
        if let Some(effect) = self.update_effect() {
            effect.run();
        }
        self.take_error()
    }

    /// Job that re-renders this instance from the queue.
    pub(crate) fn update_job(&self) -> Option<Job> {
        let effect = self.update_effect()?;
        let weak = self.downgrade();
        Some(
            Job::new(self.uid(), move || match weak.upgrade() {
                Some(instance) => instance.update(),
                None => Ok(()),
            })
            .with_effect(effect),
        )
    }

    pub(crate) fn park_error(&self, err: RuntimeError) {
        self.0.pending_error.lock().get_or_insert(err);
    }

    fn take_error(&self) -> Result<()> {
        self.0.pending_error.lock().take().map_or(Ok(()), Err)
    }

    /// The proxy render functions read through.
    pub fn proxy(&self) -> InstanceProxy {
        InstanceProxy::new(self.clone())
    }

    /// Call the `on<Event>` handler the parent passed in props.
    pub fn emit(&self, event: &str, args: &[Value]) -> Option<Value> {
        emit(self, event, args)
    }

    pub(crate) fn own_provides(&self) -> &RwLock<IndexMap<String, Value>> {
        &self.0.provides
    }

    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Arc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &ComponentInstance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("uid", &self.uid())
            .field("name", &self.name())
            .field("is_mounted", &self.is_mounted())
            .finish()
    }
}

/// Context handed to `setup` alongside props.
pub struct SetupContext {
    instance: ComponentInstance,
}

impl SetupContext {
    pub fn instance(&self) -> &ComponentInstance {
        &self.instance
    }

    /// Emit an event to the parent.
    pub fn emit(&self, event: &str, args: &[Value]) -> Option<Value> {
        self.instance.emit(event, args)
    }

    pub fn provide(&self, key: &str, value: impl Into<Value>) {
        inject::provide_on(&self.instance, key, value.into());
    }

    pub fn inject(&self, key: &str, default: Option<Value>) -> Option<Value> {
        inject::inject_from(&self.instance, key, default)
    }
}

thread_local! {
    static CURRENT_INSTANCE: RefCell<Vec<ComponentInstance>> = const { RefCell::new(Vec::new()) };
}

/// Guard marking an instance as current while its setup runs.
struct InstanceScope;

impl InstanceScope {
    fn enter(instance: &ComponentInstance) -> Self {
        CURRENT_INSTANCE.with(|stack| stack.borrow_mut().push(instance.clone()));
        InstanceScope
    }
}

impl Drop for InstanceScope {
    fn drop(&mut self) {
        CURRENT_INSTANCE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The instance whose setup is running, if any.
pub fn get_current_instance() -> Option<ComponentInstance> {
    CURRENT_INSTANCE.with(|stack| stack.borrow().last().cloned())
}

/// Initialize props and slots, run setup, and bind a render function.
pub fn setup_component(instance: &ComponentInstance) -> Result<()> {
    let vnode = instance.vnode();
    init_props(instance, &vnode);
    init_slots(instance, &vnode);
    setup_stateful_component(instance)
}

pub(crate) fn init_props(instance: &ComponentInstance, vnode: &VNode) {
    *instance.0.props.write() = vnode.props().cloned().unwrap_or_default();
}

/// Replace the instance's slots with those of `vnode`; none when it passes
/// no slots.
pub(crate) fn init_slots(instance: &ComponentInstance, vnode: &VNode) {
    let slots = match vnode.children().as_slots() {
        Some(raw) if vnode.shape_flag().contains(ShapeFlags::SLOT_CHILDREN) => {
            normalize_slots(raw)
        }
        _ => Slots::new(),
    };
    *instance.0.slots.write() = slots;
}

fn setup_stateful_component(instance: &ComponentInstance) -> Result<()> {
    let component = instance.component().clone();

    if let Some(setup) = &component.setup {
        let result = {
            let _scope = InstanceScope::enter(instance);
            let _untracked = ReactiveContext::untracked();
            let props = shallow_readonly(instance.props());
            let ctx = SetupContext {
                instance: instance.clone(),
            };
            setup(&props, &ctx)
        };
        handle_setup_result(instance, result);
    }

    finish_component_setup(instance)
}

fn handle_setup_result(instance: &ComponentInstance, result: SetupResult) {
    match result {
        SetupResult::State(state) => *instance.0.setup_state.write() = proxy_refs(state),
        SetupResult::Render(render) => *instance.0.render.write() = Some(render),
        SetupResult::None => {}
    }
}

fn finish_component_setup(instance: &ComponentInstance) -> Result<()> {
    if instance.render_fn().is_some() {
        return Ok(());
    }

    let component = instance.component();
    let render = match component.render_fn() {
        Some(render) => render,
        None => {
            let compiler = runtime_compiler();
            match (component.template(), compiler) {
                (Some(template), Some(compile)) => {
                    debug!(component = component.name(), "compiling template");
                    let render = compile(template)?;
                    *component.render.write() = Some(render.clone());
                    render
                }
                _ => {
                    return Err(RuntimeError::MissingRender {
                        component: component.name().to_string(),
                    })
                }
            }
        }
    };

    *instance.0.render.write() = Some(render);
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
