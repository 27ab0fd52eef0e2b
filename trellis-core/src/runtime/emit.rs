//! Event Emission
//!
//! A child component notifies its parent by emitting an event. The parent
//! listens by passing an `on<Event>` handler as a prop; `add-foo` is looked
//! up as `onAddFoo`.

use tracing::trace;

use super::component::ComponentInstance;
use crate::shared::{camelize, to_handler_key, Value};

/// Call the handler for `event` found in the instance's props.
///
/// Returns the handler's result, or `None` when no callable handler was
/// passed.
pub fn emit(instance: &ComponentInstance, event: &str, args: &[Value]) -> Option<Value> {
    let handler_name = to_handler_key(&camelize(event));
    let handler = instance.props().get(&handler_name)?;
    let Some(callback) = handler.as_callback() else {
        trace!(event, handler = %handler_name, "handler prop is not callable");
        return None;
    };
    Some(callback.call(args))
}
