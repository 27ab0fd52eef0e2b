//! Application
//!
//! An [`App`] pairs a root component with a renderer. Mounting it renders
//! the root component into a host container; from then on the component
//! tree keeps itself up to date through its render effects.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::component::{Component, ComponentInstance};
use super::host::{HostAdapter, HostNode};
use super::renderer::{create_renderer, Renderer};
use super::vnode::{create_vnode, VNode};
use crate::error::Result;
use crate::shared::Object;

/// A root component bound to a renderer.
pub struct App {
    renderer: Renderer,
    root: Arc<Component>,
    root_props: Option<Object>,
    mounted: RwLock<Option<(HostNode, VNode)>>,
}

impl App {
    pub(crate) fn new(renderer: Renderer, root: Arc<Component>) -> Self {
        Self {
            renderer,
            root,
            root_props: None,
            mounted: RwLock::new(None),
        }
    }

    /// Props passed to the root component on mount.
    pub fn with_props(mut self, props: Object) -> Self {
        self.root_props = Some(props);
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn root_component(&self) -> &Arc<Component> {
        &self.root
    }

    /// Render the root component into `container`.
    ///
    /// Setup and render errors of any component in the initial tree are
    /// returned here.
    pub fn mount(&self, container: HostNode) -> Result<()> {
        debug!(component = self.root.name(), container = container.raw(), "mounting app");
        let vnode = create_vnode(&self.root, self.root_props.clone(), ());
        self.renderer.render(Some(&vnode), container)?;
        *self.mounted.write() = Some((container, vnode));
        Ok(())
    }

    /// Tear down the mounted tree and clear the container.
    pub fn unmount(&self) -> Result<()> {
        let Some((container, _)) = self.mounted.write().take() else {
            return Ok(());
        };
        debug!(component = self.root.name(), container = container.raw(), "unmounting app");
        self.renderer.render(None, container)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.read().is_some()
    }

    /// Instance of the root component, once mounted.
    pub fn root_instance(&self) -> Option<ComponentInstance> {
        self.mounted
            .read()
            .as_ref()
            .and_then(|(_, vnode)| vnode.component())
    }
}

/// Create an application over `host` with a fresh renderer.
pub fn create_app(host: Arc<dyn HostAdapter>, root: Arc<Component>) -> App {
    create_renderer(host).create_app(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::runtime::{h, MemoryHost};

    #[test]
    fn mount_and_unmount_root() {
        let comp = Component::new("App")
            .render(|proxy| h("div", None, format!("hi {}", proxy.get("name"))))
            .build();
        let host = Arc::new(MemoryHost::new());
        let root = host.create_root();

        let app = create_app(host.clone(), comp).with_props(props! { "name" => "there" });
        app.mount(root).unwrap();
        assert_eq!(host.inner_html(root), "<div>hi there</div>");
        assert!(app.root_instance().is_some_and(|inst| inst.is_mounted()));
        assert_eq!(app.renderer().mounted_instance_count(), 1);

        app.unmount().unwrap();
        assert_eq!(host.inner_html(root), "");
        assert!(!app.is_mounted());
        assert_eq!(app.renderer().mounted_instance_count(), 0);
    }
}
