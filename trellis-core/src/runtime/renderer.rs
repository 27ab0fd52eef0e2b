//! Renderer
//!
//! The renderer reconciles an old vnode tree against a new one and drives
//! the [`HostAdapter`] with the minimal set of calls that turns one into the
//! other.
//!
//! # Dispatch
//!
//! [`Renderer::patch`] inspects the new vnode's type:
//!
//! - Text: create a text node, or update the reused one in place.
//! - Fragment: insert an empty start and end marker, then mount or patch
//!   its children straight into the container before the end marker. The
//!   markers keep a fragment's position even while it has no children.
//! - Element: create, fill, and insert a host node; or reuse the old host
//!   node, then patch children and props.
//! - Component: create and set up an instance, or forward new props and
//!   slots to the existing instance.
//!
//! Two vnodes with a different type or key are never patched together: the
//! new one is mounted in place of the old, which is unmounted.
//!
//! # Keyed Diff
//!
//! Array children are reconciled by [`Renderer::patch_keyed_children`]:
//!
//! 1. Patch the common prefix, then the common suffix.
//! 2. If only new children remain, mount them. If only old ones remain,
//!    unmount them.
//! 3. Otherwise map keys of the remaining new children, match each remaining
//!    old child by key (or by a linear scan when keyless), patch matches and
//!    unmount the rest.
//! 4. If any match appeared out of order, compute the longest increasing
//!    subsequence of the matched old positions. Walking the new range back to
//!    front, mount fresh children, move children off the subsequence, and
//!    leave the subsequence alone.
//!
//! # Components
//!
//! Each mounted instance gets a render effect. Its scheduler pushes the
//! instance's update job onto the queue, so data changes re-render once per
//! flush. The renderer keeps mounted instances in a registry; vnodes only
//! hold weak back-links to them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use super::app::App;
use super::component::{init_props, init_slots, setup_component, Component, ComponentInstance};
use super::host::{HostAdapter, HostNode};
use super::scheduler::{invalidate_job, queue_job};
use super::sequence::longest_increasing_subsequence;
use super::vnode::{is_same_vnode, Children, VNode, VNodeKey, VNodeType};
use crate::error::{Result, RuntimeError};
use crate::reactive::{EffectOptions, ReactiveEffect};
use crate::shared::{Object, ShapeFlags, Value};

/// Reconciles vnode trees against a host.
///
/// Cloning yields another handle to the same renderer.
#[derive(Clone)]
pub struct Renderer {
    host: Arc<dyn HostAdapter>,
    /// Mounted component instances by uid.
    instances: Arc<DashMap<u64, ComponentInstance>>,
    /// Last tree rendered into each root container.
    roots: Arc<DashMap<HostNode, VNode>>,
}

impl Renderer {
    pub fn new(host: Arc<dyn HostAdapter>) -> Self {
        Self {
            host,
            instances: Arc::new(DashMap::new()),
            roots: Arc::new(DashMap::new()),
        }
    }

    pub fn host(&self) -> &Arc<dyn HostAdapter> {
        &self.host
    }

    /// Create an application rooted at `root` that renders through this
    /// renderer.
    pub fn create_app(&self, root: Arc<Component>) -> App {
        App::new(self.clone(), root)
    }

    /// Number of component instances currently mounted.
    pub fn mounted_instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Render `vnode` into `container`, patching against whatever was
    /// rendered there before. `None` unmounts the previous tree.
    pub fn render(&self, vnode: Option<&VNode>, container: HostNode) -> Result<()> {
        let prev = self.roots.get(&container).map(|entry| entry.value().clone());
        match vnode {
            Some(vnode) => {
                self.patch(prev.as_ref(), vnode, container, None, None)?;
                self.roots.insert(container, vnode.clone());
            }
            None => {
                if let Some(prev) = prev {
                    self.unmount(&prev, true);
                }
                self.roots.remove(&container);
            }
        }
        Ok(())
    }

    /// Reconcile `n1` (the old vnode, or `None` on first mount) with `n2`.
    pub fn patch(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        if let Some(old) = n1 {
            if old.ptr_eq(n2) {
                return Ok(());
            }
            if !is_same_vnode(old, n2) {
                // Mount in the old node's position, then drop the old node.
                let anchor = old.el().or(anchor);
                self.patch(None, n2, container, anchor, parent)?;
                self.unmount(old, true);
                return Ok(());
            }
        }

        match n2.ty() {
            VNodeType::Text => self.process_text(n1, n2, container, anchor),
            VNodeType::Fragment => self.process_fragment(n1, n2, container, anchor, parent),
            VNodeType::Element(tag) => {
                self.process_element(n1, n2, tag, container, anchor, parent)
            }
            VNodeType::Component(component) => {
                self.process_component(n1, n2, component, container, anchor, parent)
            }
        }
    }

    fn process_text(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let text = n2.children().as_text().unwrap_or_default();
        match n1.and_then(|old| old.el().map(|el| (old, el))) {
            Some((old, el)) => {
                n2.set_el(Some(el));
                if old.children().as_text() != Some(text) {
                    self.host.set_text(el, text);
                }
            }
            None => {
                let el = self.host.create_text(text);
                n2.set_el(Some(el));
                self.host.insert(el, container, anchor);
            }
        }
        Ok(())
    }

    fn process_fragment(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        match n1 {
            None => {
                let start = self.host.create_text("");
                let end = self.host.create_text("");
                n2.set_el(Some(start));
                n2.set_anchor(Some(end));
                self.host.insert(start, container, anchor);
                self.host.insert(end, container, anchor);
                self.mount_children(n2.children().as_array(), container, Some(end), parent)
            }
            Some(old) => {
                n2.set_el(old.el());
                n2.set_anchor(old.anchor());
                self.patch_children(old, n2, container, old.anchor(), parent)
            }
        }
    }

    fn process_element(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        tag: &str,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        match n1.filter(|old| old.el().is_some()) {
            None => self.mount_element(n2, tag, container, anchor, parent),
            Some(old) => self.patch_element(old, n2, parent),
        }
    }

    fn mount_element(
        &self,
        vnode: &VNode,
        tag: &str,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        let el = self.host.create_element(tag);
        vnode.set_el(Some(el));

        let flag = vnode.shape_flag();
        if flag.contains(ShapeFlags::TEXT_CHILDREN) {
            if let Some(text) = vnode.children().as_text() {
                self.host.set_element_text(el, text);
            }
        } else if flag.contains(ShapeFlags::ARRAY_CHILDREN) {
            self.mount_children(vnode.children().as_array(), el, None, parent)?;
        }

        if let Some(props) = vnode.props() {
            for (key, value) in props.snapshot() {
                if key == "key" {
                    continue;
                }
                self.host.patch_prop(el, &key, None, Some(&value));
            }
        }

        self.host.insert(el, container, anchor);
        Ok(())
    }

    fn mount_children(
        &self,
        children: &[VNode],
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        for child in children {
            self.patch(None, child, container, anchor, parent)?;
        }
        Ok(())
    }

    fn patch_element(
        &self,
        n1: &VNode,
        n2: &VNode,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        let el = n1.el();
        n2.set_el(el);
        let Some(el) = el else {
            return Ok(());
        };

        self.patch_children(n1, n2, el, None, parent)?;
        self.patch_props(el, n1.props(), n2.props());
        Ok(())
    }

    fn patch_props(&self, el: HostNode, old: Option<&Object>, new: Option<&Object>) {
        if let (Some(a), Some(b)) = (old, new) {
            if a.ptr_eq(b) {
                return;
            }
        }
        let old = old.map(Object::snapshot).unwrap_or_default();
        let new = new.map(Object::snapshot).unwrap_or_default();

        for (key, next) in &new {
            if key == "key" {
                continue;
            }
            let prev = old.get(key);
            if prev.map_or(true, |prev| !prev.same_value(next)) {
                self.host.patch_prop(el, key, prev, Some(next));
            }
        }
        for (key, prev) in &old {
            if key == "key" || new.contains_key(key) {
                continue;
            }
            self.host.patch_prop(el, key, Some(prev), None);
        }
    }

    /// Reconcile the children of `n1` and `n2` inside `container`.
    fn patch_children(
        &self,
        n1: &VNode,
        n2: &VNode,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        match (n1.children(), n2.children()) {
            (Children::Text(prev), Children::Text(next)) => {
                if prev != next {
                    self.host.set_element_text(container, next);
                }
            }
            (old, Children::Text(next)) => {
                for child in old.as_array() {
                    self.unmount(child, true);
                }
                self.host.set_element_text(container, next);
            }
            (Children::Array(c1), Children::Array(c2)) => {
                self.patch_keyed_children(c1, c2, container, anchor, parent)?;
            }
            (old, Children::Array(c2)) => {
                if old.as_text().is_some() {
                    self.host.set_element_text(container, "");
                }
                self.mount_children(c2, container, anchor, parent)?;
            }
            (Children::Array(c1), _) => {
                for child in c1 {
                    self.unmount(child, true);
                }
            }
            (Children::Text(_), _) => self.host.set_element_text(container, ""),
            _ => {}
        }
        Ok(())
    }

    /// Reconcile two child lists, moving as few host nodes as possible.
    pub fn patch_keyed_children(
        &self,
        c1: &[VNode],
        c2: &[VNode],
        container: HostNode,
        parent_anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        let mut i = 0;
        let mut e1 = c1.len();
        let mut e2 = c2.len();

        // 1. Common prefix.
        while i < e1 && i < e2 && is_same_vnode(&c1[i], &c2[i]) {
            self.patch(Some(&c1[i]), &c2[i], container, parent_anchor, parent)?;
            i += 1;
        }

        // 2. Common suffix.
        while i < e1 && i < e2 && is_same_vnode(&c1[e1 - 1], &c2[e2 - 1]) {
            self.patch(Some(&c1[e1 - 1]), &c2[e2 - 1], container, parent_anchor, parent)?;
            e1 -= 1;
            e2 -= 1;
        }

        // 3. Only additions remain.
        if i >= e1 {
            if i < e2 {
                let anchor = c2.get(e2).and_then(VNode::el).or(parent_anchor);
                for child in &c2[i..e2] {
                    self.patch(None, child, container, anchor, parent)?;
                }
            }
            return Ok(());
        }

        // 4. Only removals remain.
        if i >= e2 {
            for child in &c1[i..e1] {
                self.unmount(child, true);
            }
            return Ok(());
        }

        // 5. Unknown middle sequence.
        let s1 = i;
        let s2 = i;

        let key_to_new_index: HashMap<&VNodeKey, usize> = (s2..e2)
            .filter_map(|j| c2[j].key().map(|key| (key, j)))
            .collect();

        let to_be_patched = e2 - s2;
        let mut patched = 0;
        // Old index + 1 per new slot; 0 means no old counterpart.
        let mut new_index_to_old_index = vec![0usize; to_be_patched];
        let mut moved = false;
        let mut max_new_index_so_far = 0;

        for (old_index, prev) in c1.iter().enumerate().take(e1).skip(s1) {
            if patched >= to_be_patched {
                self.unmount(prev, true);
                continue;
            }

            let new_index = match prev.key() {
                Some(key) => key_to_new_index.get(key).copied(),
                None => (s2..e2).find(|&j| {
                    new_index_to_old_index[j - s2] == 0 && is_same_vnode(prev, &c2[j])
                }),
            };

            match new_index {
                Some(new_index) if new_index_to_old_index[new_index - s2] == 0 => {
                    new_index_to_old_index[new_index - s2] = old_index + 1;
                    if new_index >= max_new_index_so_far {
                        max_new_index_so_far = new_index;
                    } else {
                        moved = true;
                    }
                    self.patch(Some(prev), &c2[new_index], container, None, parent)?;
                    patched += 1;
                }
                _ => self.unmount(prev, true),
            }
        }

        let mut stable = if moved {
            longest_increasing_subsequence(&new_index_to_old_index)
        } else {
            Vec::new()
        };

        // Back to front so every anchor is already in its final place.
        for offset in (0..to_be_patched).rev() {
            let index = s2 + offset;
            let child = &c2[index];
            let anchor = c2.get(index + 1).and_then(VNode::el).or(parent_anchor);

            if new_index_to_old_index[offset] == 0 {
                self.patch(None, child, container, anchor, parent)?;
            } else if moved {
                if stable.last() == Some(&offset) {
                    stable.pop();
                } else {
                    self.move_vnode(child, container, anchor);
                }
            }
        }

        Ok(())
    }

    /// Reposition every host node of `vnode` before `anchor`.
    fn move_vnode(&self, vnode: &VNode, container: HostNode, anchor: Option<HostNode>) {
        match vnode.ty() {
            VNodeType::Component(_) => {
                if let Some(tree) = vnode.component().and_then(|inst| inst.sub_tree()) {
                    self.move_vnode(&tree, container, anchor);
                }
            }
            VNodeType::Fragment => {
                if let Some(start) = vnode.el() {
                    self.host.insert(start, container, anchor);
                }
                for child in vnode.children().as_array() {
                    self.move_vnode(child, container, anchor);
                }
                if let Some(end) = vnode.anchor() {
                    self.host.insert(end, container, anchor);
                }
            }
            _ => {
                if let Some(el) = vnode.el() {
                    trace!(node = el.raw(), anchor = ?anchor.map(|a| a.raw()), "moving host node");
                    self.host.insert(el, container, anchor);
                }
            }
        }
    }

    /// Tear down `vnode`. With `do_remove`, its host nodes are detached.
    ///
    /// Descendants of a removed element are not detached one by one; they
    /// leave the host tree with their ancestor.
    pub fn unmount(&self, vnode: &VNode, do_remove: bool) {
        match vnode.ty() {
            VNodeType::Component(_) => {
                if let Some(instance) = vnode.component() {
                    self.unmount_component(&instance, do_remove);
                }
            }
            VNodeType::Fragment => {
                for child in vnode.children().as_array() {
                    self.unmount(child, do_remove);
                }
                if do_remove {
                    for marker in [vnode.el(), vnode.anchor()].into_iter().flatten() {
                        self.host.remove(marker);
                    }
                }
            }
            VNodeType::Element(_) => {
                for child in vnode.children().as_array() {
                    self.unmount(child, false);
                }
                if do_remove {
                    if let Some(el) = vnode.el() {
                        self.host.remove(el);
                    }
                }
            }
            VNodeType::Text => {
                if do_remove {
                    if let Some(el) = vnode.el() {
                        self.host.remove(el);
                    }
                }
            }
        }
    }

    fn unmount_component(&self, instance: &ComponentInstance, do_remove: bool) {
        debug!(component = instance.name(), uid = instance.uid(), "unmounting component");
        if let Some(effect) = instance.update_effect() {
            effect.stop();
        }
        invalidate_job(instance.uid());
        if let Some(tree) = instance.sub_tree() {
            self.unmount(&tree, do_remove);
        }
        instance.set_mounted(false);
        self.instances.remove(&instance.uid());
    }

    fn process_component(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        component: &Arc<Component>,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        match n1.and_then(|old| old.component().map(|inst| (old, inst))) {
            Some((old, instance)) => self.update_component(old, n2, &instance),
            None => self.mount_component(n2, component, container, anchor, parent),
        }
    }

    fn mount_component(
        &self,
        vnode: &VNode,
        component: &Arc<Component>,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<&ComponentInstance>,
    ) -> Result<()> {
        let instance = ComponentInstance::new(component.clone(), vnode, parent);
        vnode.set_component(&instance);
        self.instances.insert(instance.uid(), instance.clone());
        debug!(component = instance.name(), uid = instance.uid(), "mounting component");

        if let Err(err) = setup_component(&instance) {
            self.instances.remove(&instance.uid());
            return Err(err);
        }
        self.setup_render_effect(&instance, container, anchor)
    }

    fn setup_render_effect(
        &self,
        instance: &ComponentInstance,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let renderer = self.clone();
        let weak = instance.downgrade();
        let run = move || {
            let Some(instance) = weak.upgrade() else {
                return;
            };
            if let Err(err) = renderer.component_update(&instance, container, anchor) {
                instance.park_error(err);
            }
        };

        let weak = instance.downgrade();
        let options = EffectOptions::default().scheduler(move || {
            if let Some(job) = weak.upgrade().and_then(|inst| inst.update_job()) {
                queue_job(job);
            }
        });

        instance.set_update_effect(ReactiveEffect::new(run, options));
        instance.update()
    }

    /// Body of a component's render effect.
    fn component_update(
        &self,
        instance: &ComponentInstance,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let render = instance
            .render_fn()
            .ok_or_else(|| RuntimeError::MissingRender {
                component: instance.name().to_string(),
            })?;

        if !instance.is_mounted() {
            let tree = render(&instance.proxy());
            instance.replace_sub_tree(tree.clone());
            self.patch(None, &tree, container, anchor, Some(instance))?;
            instance.vnode().set_el(tree.el());
            instance.set_mounted(true);
            return Ok(());
        }

        if let Some(next) = instance.take_next() {
            next.set_el(instance.vnode().el());
            update_component_pre_render(instance, next);
        }

        debug!(component = instance.name(), uid = instance.uid(), "updating component");
        let tree = render(&instance.proxy());
        let prev = instance.replace_sub_tree(tree.clone());
        self.patch(prev.as_ref(), &tree, container, None, Some(instance))?;
        instance.vnode().set_el(tree.el());
        Ok(())
    }

    /// The parent re-rendered with `n2` in place of `n1`.
    fn update_component(&self, n1: &VNode, n2: &VNode, instance: &ComponentInstance) -> Result<()> {
        n2.set_component(instance);
        if should_update_component(n1, n2) {
            // A queued self-update would only repeat this render.
            invalidate_job(instance.uid());
            instance.set_next(Some(n2.clone()));
            instance.update()
        } else {
            // Slots are refreshed for the next render without forcing one.
            n2.set_el(n1.el());
            update_component_pre_render(instance, n2.clone());
            Ok(())
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("instances", &self.instances.len())
            .field("roots", &self.roots.len())
            .finish()
    }
}

fn update_component_pre_render(instance: &ComponentInstance, next: VNode) {
    instance.set_vnode(next.clone());
    init_props(instance, &next);
    init_slots(instance, &next);
}

/// Whether a component must re-render for a parent-driven update.
///
/// Only props are compared: true when any prop value changed or the prop
/// count changed. Slots passed alongside identical props do not force a
/// render.
pub fn should_update_component(prev: &VNode, next: &VNode) -> bool {
    let prev_props = prev.props().map(Object::snapshot).unwrap_or_default();
    let next_props = next.props().map(Object::snapshot).unwrap_or_default();
    if prev_props.len() != next_props.len() {
        return true;
    }
    next_props.iter().any(|(key, value)| {
        prev_props
            .get(key)
            .map_or(true, |prev: &Value| !prev.same_value(value))
    })
}

/// Build a renderer over `host`.
pub fn create_renderer(host: Arc<dyn HostAdapter>) -> Renderer {
    Renderer::new(host)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
