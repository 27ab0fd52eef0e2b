//! Provide / Inject
//!
//! An ancestor provides a value under a key; any descendant can inject it
//! without threading it through props.
//!
//! # Lookup
//!
//! Each instance keeps only the values it provides itself. Injection walks
//! the parent chain explicitly, starting at the injecting instance's parent,
//! and returns the nearest provider's value. A component therefore never
//! sees its own provides, and a nearer provider shadows a farther one.

use tracing::warn;

use super::component::{get_current_instance, ComponentInstance};
use crate::shared::Value;

/// Provide `value` under `key` to descendants of the current instance.
///
/// Only valid during setup; elsewhere it warns and does nothing.
pub fn provide(key: &str, value: impl Into<Value>) {
    match get_current_instance() {
        Some(instance) => provide_on(&instance, key, value.into()),
        None => warn!(key, "provide() can only be used inside setup()"),
    }
}

/// Look up `key` among the current instance's ancestors.
///
/// Falls back to `default`; a callable default is invoked to produce the
/// value. Outside setup it warns and returns `None`.
pub fn inject(key: &str, default: Option<Value>) -> Option<Value> {
    match get_current_instance() {
        Some(instance) => inject_from(&instance, key, default),
        None => {
            warn!(key, "inject() can only be used inside setup()");
            None
        }
    }
}

pub(crate) fn provide_on(instance: &ComponentInstance, key: &str, value: Value) {
    instance
        .own_provides()
        .write()
        .insert(key.to_string(), value);
}

pub(crate) fn inject_from(
    instance: &ComponentInstance,
    key: &str,
    default: Option<Value>,
) -> Option<Value> {
    let mut ancestor = instance.parent();
    while let Some(current) = ancestor {
        if let Some(value) = current.own_provides().read().get(key) {
            return Some(value.clone());
        }
        ancestor = current.parent();
    }

    default.map(|value| match value {
        Value::Func(factory) => factory.call(&[]),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{create_renderer, h, Component, MemoryHost, VNode};
    use std::sync::Arc;

    fn text(value: Option<Value>) -> String {
        value.map(|v| v.to_string()).unwrap_or_else(|| "none".into())
    }

    #[test]
    fn nearest_provider_wins_and_self_is_skipped() {
        let consumer = Component::new("Consumer")
            .setup(|_, _| {
                let foo = text(inject("foo", None));
                let bar = text(inject("bar", None));
                let baz = text(inject("baz", Some(Value::from("bazDefault"))));
                let lazy = text(inject("lazy", Some(Value::func(|_| Value::from("made")))));
                crate::Object::from_iter([("out", format!("{foo}-{bar}-{baz}-{lazy}"))])
            })
            .render(|proxy| h("div", None, proxy.get("out").to_string()))
            .build();

        let middle = {
            let consumer = consumer.clone();
            Component::new("Middle")
                .setup(|_, _| {
                    provide("foo", "fooTwo");
                    let own = text(inject("foo", None));
                    crate::Object::from_iter([("own", own)])
                })
                .render(move |proxy| {
                    h(
                        "div",
                        None,
                        vec![
                            h("p", None, format!("middle:{}", proxy.get("own"))),
                            h(&consumer, None, ()),
                        ],
                    )
                })
                .build()
        };

        let provider = {
            let middle = middle.clone();
            Component::new("Provider")
                .setup(|_, _| {
                    provide("foo", "fooVal");
                    provide("bar", "barVal");
                })
                .render(move |_| -> VNode { h(&middle, None, ()) })
                .build()
        };

        let host = Arc::new(MemoryHost::new());
        let root = host.create_root();
        create_renderer(host.clone())
            .create_app(provider)
            .mount(root)
            .unwrap();

        assert_eq!(
            host.inner_html(root),
            "<div><p>middle:fooVal</p><div>fooTwo-barVal-bazDefault-made</div></div>"
        );
    }

    #[test]
    fn outside_setup_returns_none() {
        assert!(inject("anything", Some(Value::from(1))).is_none());
        provide("ignored", 1);
    }
}
