//! Integration Tests for Components
//!
//! These tests mount component trees into `MemoryHost` and exercise props,
//! slots, events, provide/inject, templates, and scheduled updates.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_core::config::{set_runtime_config, RuntimeConfig};
use trellis_core::props;
use trellis_core::reactive::{create_ref, Ref};
use trellis_core::runtime::{
    create_renderer, flush_microtasks, fragment, h, inject, is_flush_pending, next_tick, provide,
    register_runtime_compiler, render_slots, Component, HostNode, MemoryHost, RawSlots,
};
use trellis_core::{CompileError, Object, RuntimeError, Value};

fn mount(root: Arc<Component>) -> (Arc<MemoryHost>, HostNode) {
    let host = Arc::new(MemoryHost::new());
    let container = host.create_root();
    create_renderer(host.clone())
        .create_app(root)
        .mount(container)
        .unwrap();
    (host, container)
}

fn state_with(key: &str, value: &Ref) -> Object {
    Object::from_iter([(key, Value::from(value.clone()))])
}

/// Several writes in one turn produce a single re-render.
#[test]
fn writes_in_one_turn_render_once() {
    let count = create_ref(0);
    let renders = Arc::new(AtomicI32::new(0));

    let state = count.clone();
    let renders_clone = renders.clone();
    let comp = Component::new("Counter")
        .setup(move |_, _| state_with("count", &state))
        .render(move |proxy| {
            renders_clone.fetch_add(1, Ordering::SeqCst);
            h("p", None, format!("count: {}", proxy.get("count")))
        })
        .build();

    let (host, root) = mount(comp);
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    count.set(1);
    count.set(2);
    count.set(3);
    assert!(is_flush_pending());
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(host.inner_html(root), "<p>count: 0</p>");

    next_tick().wait().unwrap();
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(host.inner_html(root), "<p>count: 3</p>");
}

/// A child re-renders only when the props it receives change.
#[test]
fn child_updates_only_on_prop_change() {
    let msg = create_ref("hello");
    let other = create_ref(0);
    let child_renders = Arc::new(AtomicI32::new(0));

    let child_renders_clone = child_renders.clone();
    let child = Component::new("Child")
        .render(move |proxy| {
            child_renders_clone.fetch_add(1, Ordering::SeqCst);
            h("span", None, proxy.get("msg").to_string())
        })
        .build();

    let (msg_state, other_state) = (msg.clone(), other.clone());
    let parent = Component::new("Parent")
        .setup(move |_, _| {
            Object::from_iter([
                ("msg", Value::from(msg_state.clone())),
                ("other", Value::from(other_state.clone())),
            ])
        })
        .render(move |proxy| {
            h(
                "div",
                None,
                vec![
                    h("p", None, proxy.get("other").to_string()),
                    h(&child, props! { "msg" => proxy.get("msg") }, ()),
                ],
            )
        })
        .build();

    let (host, root) = mount(parent);
    assert_eq!(host.inner_html(root), "<div><p>0</p><span>hello</span></div>");
    assert_eq!(child_renders.load(Ordering::SeqCst), 1);

    other.set(1);
    flush_microtasks().unwrap();
    assert_eq!(host.inner_html(root), "<div><p>1</p><span>hello</span></div>");
    assert_eq!(child_renders.load(Ordering::SeqCst), 1);

    msg.set("bye");
    flush_microtasks().unwrap();
    assert_eq!(host.inner_html(root), "<div><p>1</p><span>bye</span></div>");
    assert_eq!(child_renders.load(Ordering::SeqCst), 2);
}

/// Named and scoped slots render where the child places them.
#[test]
fn named_and_scoped_slots() {
    let foo = Component::new("Foo")
        .render(|proxy| {
            let slots = proxy.slots();
            let mut children = Vec::new();
            children.extend(render_slots(&slots, "header", props! { "age" => 18 }));
            children.push(h("p", None, "foo"));
            children.extend(render_slots(&slots, "footer", Object::new()));
            children.extend(render_slots(&slots, "missing", Object::new()));
            h("div", None, children)
        })
        .build();

    let app = Component::new("App")
        .render(move |_| {
            h(
                &foo,
                None,
                RawSlots::new()
                    .slot("header", |scope| {
                        h("p", None, format!("header{}", scope.get("age"))).into()
                    })
                    .slot("footer", |_| {
                        vec![h("p", None, "footer"), h("p", None, "more")].into()
                    }),
            )
        })
        .build();

    let (host, root) = mount(app);
    assert_eq!(
        host.inner_html(root),
        "<div><p>header18</p><p>foo</p><p>footer</p><p>more</p></div>"
    );
}

fn slotted_wrapper(renders: Arc<AtomicI32>, tick: Ref) -> Arc<Component> {
    Component::new("Wrapper")
        .setup(move |_, _| state_with("tick", &tick))
        .render(move |proxy| {
            renders.fetch_add(1, Ordering::SeqCst);
            proxy.get("tick");
            let slots = proxy.slots();
            h(
                "section",
                None,
                render_slots(&slots, "default", Object::new())
                    .into_iter()
                    .collect::<Vec<_>>(),
            )
        })
        .build()
}

/// Slot content follows the parent when the props change with it.
#[test]
fn slot_content_follows_changed_props() {
    let label = create_ref("one");
    let renders = Arc::new(AtomicI32::new(0));
    let child = slotted_wrapper(renders.clone(), create_ref(0));

    let state = label.clone();
    let parent = Component::new("Parent")
        .setup(move |_, _| state_with("label", &state))
        .render(move |proxy| {
            let text = proxy.get("label").to_string();
            h(
                &child,
                props! { "label" => text.clone() },
                RawSlots::new().slot("default", move |_| h("b", None, text.clone()).into()),
            )
        })
        .build();

    let (host, root) = mount(parent);
    assert_eq!(host.inner_html(root), "<section><b>one</b></section>");

    label.set("two");
    flush_microtasks().unwrap();
    assert_eq!(host.inner_html(root), "<section><b>two</b></section>");
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

/// Identical props skip the child's render even when slots are passed; the
/// new slots are used by the child's next render of its own.
#[test]
fn identical_props_with_slots_skip_child_render() {
    let label = create_ref("one");
    let tick = create_ref(0);
    let renders = Arc::new(AtomicI32::new(0));
    let child = slotted_wrapper(renders.clone(), tick.clone());

    let state = label.clone();
    let parent = Component::new("Parent")
        .setup(move |_, _| state_with("label", &state))
        .render(move |proxy| {
            let text = proxy.get("label").to_string();
            let slot_text = text.clone();
            h(
                "div",
                None,
                vec![
                    h("p", None, text),
                    h(
                        &child,
                        props! { "a" => 1 },
                        RawSlots::new()
                            .slot("default", move |_| h("b", None, slot_text.clone()).into()),
                    ),
                ],
            )
        })
        .build();

    let (host, root) = mount(parent);
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    label.set("two");
    flush_microtasks().unwrap();
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(
        host.inner_html(root),
        "<div><p>two</p><section><b>one</b></section></div>"
    );

    tick.set(1);
    flush_microtasks().unwrap();
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(
        host.inner_html(root),
        "<div><p>two</p><section><b>two</b></section></div>"
    );
}

/// A parent that stops passing slots leaves the child with none.
#[test]
fn dropped_slots_are_cleared() {
    let with_slot = create_ref(true);
    let child = Component::new("Counter")
        .render(|proxy| h("i", None, proxy.slots().len().to_string()))
        .build();

    let state = with_slot.clone();
    let parent = Component::new("Parent")
        .setup(move |_, _| state_with("with_slot", &state))
        .render(move |proxy| {
            let flag = proxy.get("with_slot");
            if flag.as_bool().unwrap_or_default() {
                h(
                    &child,
                    props! { "flag" => flag },
                    RawSlots::new().slot("default", |_| h("b", None, "slot").into()),
                )
            } else {
                h(&child, props! { "flag" => flag }, ())
            }
        })
        .build();

    let (host, root) = mount(parent);
    assert_eq!(host.inner_html(root), "<i>1</i>");

    with_slot.set(false);
    flush_microtasks().unwrap();
    assert_eq!(host.inner_html(root), "<i>0</i>");
}

fn fragment_list(count: Ref) -> Arc<Component> {
    Component::new("List")
        .setup(move |_, _| state_with("count", &count))
        .render(|proxy| {
            let n = proxy.get("count").as_f64().unwrap_or_default() as usize;
            fragment((0..n).map(|i| h("li", None, i.to_string())).collect())
        })
        .build()
}

/// A component rendering a fragment keeps its children between its
/// siblings as the fragment grows and shrinks.
#[test]
fn fragment_root_resizes_in_place() {
    let count = create_ref(1);
    let list = fragment_list(count.clone());
    let parent = Component::new("Parent")
        .render(move |_| {
            h(
                "ul",
                None,
                vec![h("li", None, "first"), h(&list, None, ()), h("li", None, "last")],
            )
        })
        .build();

    let (host, root) = mount(parent);
    assert_eq!(host.inner_html(root), "<ul><li>first</li><li>0</li><li>last</li></ul>");

    count.set(3);
    flush_microtasks().unwrap();
    assert_eq!(
        host.inner_html(root),
        "<ul><li>first</li><li>0</li><li>1</li><li>2</li><li>last</li></ul>"
    );

    count.set(0);
    flush_microtasks().unwrap();
    assert_eq!(host.inner_html(root), "<ul><li>first</li><li>last</li></ul>");

    count.set(2);
    flush_microtasks().unwrap();
    assert_eq!(
        host.inner_html(root),
        "<ul><li>first</li><li>0</li><li>1</li><li>last</li></ul>"
    );
}

/// Keyed fragment components reorder between fixed siblings and keep
/// growing in their new position.
#[test]
fn keyed_fragment_components_reorder_between_siblings() {
    let order = create_ref("ab");
    let grow = create_ref(1);

    let item = {
        let grow = grow.clone();
        Component::new("Item")
            .setup(move |_, _| state_with("grow", &grow))
            .render(|proxy| {
                let label = proxy.get("label").to_string();
                let n = proxy.get("grow").as_f64().unwrap_or_default() as usize;
                fragment((0..n).map(|i| h("li", None, format!("{label}{i}"))).collect())
            })
            .build()
    };

    let state = order.clone();
    let parent = Component::new("Parent")
        .setup(move |_, _| state_with("order", &state))
        .render(move |proxy| {
            let order = proxy.get("order").to_string();
            let mut children = vec![h("li", None, "first")];
            children.extend(order.chars().map(|c| {
                let key = c.to_string();
                h(&item, props! { "key" => key.clone(), "label" => key }, ())
            }));
            children.push(h("li", None, "last"));
            h("ul", None, children)
        })
        .build();

    let (host, root) = mount(parent);
    assert_eq!(
        host.inner_html(root),
        "<ul><li>first</li><li>a0</li><li>b0</li><li>last</li></ul>"
    );

    order.set("ba");
    flush_microtasks().unwrap();
    assert_eq!(
        host.inner_html(root),
        "<ul><li>first</li><li>b0</li><li>a0</li><li>last</li></ul>"
    );

    grow.set(2);
    flush_microtasks().unwrap();
    assert_eq!(
        host.inner_html(root),
        "<ul><li>first</li><li>b0</li><li>b1</li><li>a0</li><li>a1</li><li>last</li></ul>"
    );
}

/// Emitted kebab-case events reach camel-cased handlers.
#[test]
fn emit_reaches_parent_handler() {
    let received = Arc::new(Mutex::new(Vec::new()));

    let child = Component::new("Child")
        .setup(|_, ctx| {
            ctx.emit("add", &[Value::from(1), Value::from(2)]);
            ctx.emit("add-foo", &[]);
        })
        .render(|_| h("div", None, ()))
        .build();

    let sink = received.clone();
    let parent = Component::new("Parent")
        .render(move |_| {
            let add = sink.clone();
            let add_foo = sink.clone();
            h(
                &child,
                props! {
                    "onAdd" => Value::func(move |args| {
                        add.lock().push(format!("add {} {}", args[0], args[1]));
                        Value::Null
                    }),
                    "onAddFoo" => Value::func(move |_| {
                        add_foo.lock().push("addFoo".to_string());
                        Value::Null
                    }),
                },
                (),
            )
        })
        .build();

    mount(parent);
    assert_eq!(*received.lock(), vec!["add 1 2".to_string(), "addFoo".to_string()]);
}

/// Provided values resolve through the nearest ancestor.
#[test]
fn provide_inject_across_generations() {
    let leaf = Component::new("Leaf")
        .setup(|_, _| {
            let theme = inject("theme", None).unwrap_or_default();
            let size = inject("size", Some(Value::from("m"))).unwrap_or_default();
            Object::from_iter([("theme", theme), ("size", size)])
        })
        .render(|proxy| h("i", None, format!("{}-{}", proxy.get("theme"), proxy.get("size"))))
        .build();

    let middle = Component::new("Middle")
        .setup(|_, _| provide("theme", "dark"))
        .render(move |_| h(&leaf, None, ()))
        .build();

    let root = Component::new("Root")
        .setup(|_, _| provide("theme", "light"))
        .render(move |_| h(&middle, None, ()))
        .build();

    let (host, container) = mount(root);
    assert_eq!(host.inner_html(container), "<i>dark-m</i>");
}

/// Template-only components are compiled on mount.
#[test]
fn template_components_compile_on_mount() {
    register_runtime_compiler(trellis_core::compile);

    let message = create_ref("world");
    let state = message.clone();
    let hello = Component::new("Hello")
        .setup(move |_, _| state_with("message", &state))
        .template("<div>hi, {{ message }}</div>")
        .build();

    let (host, root) = mount(hello.clone());
    assert_eq!(host.inner_html(root), "<div>hi, world</div>");
    assert!(hello.render_fn().is_some());

    message.set("trellis");
    flush_microtasks().unwrap();
    assert_eq!(host.inner_html(root), "<div>hi, trellis</div>");
}

/// A malformed template fails the mount with the compile error.
#[test]
fn template_errors_surface_from_mount() {
    register_runtime_compiler(trellis_core::compile);

    let broken = Component::new("Broken")
        .template("<div><span></div>")
        .build();
    let parent = Component::new("Parent")
        .render(move |_| h("main", None, vec![h(&broken, None, ())]))
        .build();

    let host = Arc::new(MemoryHost::new());
    let root = host.create_root();
    let err = create_renderer(host)
        .create_app(parent)
        .mount(root)
        .unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Compile(CompileError::MissingEndTag { tag: "span".into() })
    );
    assert_eq!(err.to_string(), "template compilation failed: lack end tag: span");
}

/// Two components feeding each other forever trip the recursion limit.
#[test]
fn runaway_updates_hit_recursion_limit() {
    set_runtime_config(RuntimeConfig {
        recursion_limit: 5,
        ..RuntimeConfig::default()
    });

    let n = create_ref(0);
    let writer = n.clone();
    let child = Component::new("Feedback")
        .render(move |proxy| {
            let seen = proxy.get("n").as_f64().unwrap_or_default();
            writer.set(seen + 1.0);
            h("span", None, seen.to_string())
        })
        .build();

    let state = n.clone();
    let parent = Component::new("Loop")
        .setup(move |_, _| state_with("n", &state))
        .render(move |proxy| h(&child, props! { "n" => proxy.get("n") }, ()))
        .build();

    mount(parent);
    let err = flush_microtasks().unwrap_err();
    assert_eq!(err, RuntimeError::RecursionLimit { limit: 5 });

    set_runtime_config(RuntimeConfig::default());
}

/// `next_tick` can be awaited from async code.
#[tokio::test]
async fn next_tick_awaits_render() {
    let count = create_ref(1);
    let state = count.clone();
    let comp = Component::new("Async")
        .setup(move |_, _| state_with("count", &state))
        .render(|proxy| h("p", None, proxy.get("count").to_string()))
        .build();

    let (host, root) = mount(comp);
    count.set(2);
    next_tick().await.unwrap();
    assert_eq!(host.inner_html(root), "<p>2</p>");
}
