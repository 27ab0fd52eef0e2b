//! Shape Flags
//!
//! A vnode classifies its own kind and the kind of its children in one
//! bitmask, computed at construction. The renderer dispatches on these bits
//! instead of re-inspecting `type` and `children`.

use bitflags::bitflags;

bitflags! {
    /// Kind of a vnode and of its children.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShapeFlags: u8 {
        /// The vnode is a host element.
        const ELEMENT = 1;
        /// The vnode is a component with setup/render.
        const STATEFUL_COMPONENT = 1 << 1;
        /// Children are a single text payload.
        const TEXT_CHILDREN = 1 << 2;
        /// Children are a sequence of vnodes.
        const ARRAY_CHILDREN = 1 << 3;
        /// Children are named slots passed to a component.
        const SLOT_CHILDREN = 1 << 4;
    }
}
