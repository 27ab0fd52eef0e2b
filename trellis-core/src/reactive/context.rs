//! Reactive Context
//!
//! The reactive context tracks which effect is currently running. This
//! enables automatic dependency tracking: when a reactive property is read,
//! the current effect is registered as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack. Running an effect pushes it onto the stack;
//! the guard pops it when dropped, so a panicking effect still leaves the
//! stack balanced. Nested runs (an effect whose body runs another effect)
//! restore the outer effect when the inner one finishes.
//!
//! A `None` entry pauses tracking. Component setup runs under such an entry
//! so that reads performed while building state are not attributed to the
//! parent's render effect.

use std::cell::RefCell;

use super::effect::{EffectId, ReactiveEffect};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<ReactiveEffect>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    effect_id: Option<EffectId>,
}

impl ReactiveContext {
    /// Enter a reactive context for the given effect.
    ///
    /// While this context is active, reactive reads register `effect` as a
    /// dependent. The context is exited when the returned guard is dropped.
    pub fn enter(effect: &ReactiveEffect) -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Some(effect.clone())));
        Self {
            effect_id: Some(effect.id()),
        }
    }

    /// Enter a context in which reads are not tracked at all.
    pub fn untracked() -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(None));
        Self { effect_id: None }
    }

    /// Check if an effect is currently collecting dependencies.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// The effect currently collecting dependencies, if any.
    pub fn current_effect() -> Option<ReactiveEffect> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }

    /// Depth of the context stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.as_ref().map(ReactiveEffect::id),
                    self.effect_id,
                    "ReactiveContext mismatch"
                );
            }
        });
    }
}
