//! Shared Utilities
//!
//! The dynamic value model, the vnode shape bitmask, and the small string
//! helpers used by event emission and text interpolation.

mod shape_flags;
mod value;

pub use shape_flags::ShapeFlags;
pub use value::{Callback, Object, Props, Value};

/// Whether `next` should be considered a change from `prev`.
///
/// Uses same-value equality, so writing `NaN` over `NaN` is not a change
/// while writing `-0` over `+0` is.
pub fn has_changed(prev: &Value, next: &Value) -> bool {
    !prev.same_value(next)
}

/// Whether a prop key names an event listener (`onClick`, `onAdd`).
pub fn is_on(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next() == Some('o')
        && chars.next() == Some('n')
        && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Upper-case the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert `kebab-case` to `camelCase`.
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    if upper {
        out.push('-');
    }
    out
}

/// Prop key under which a handler for `event` is registered.
pub fn to_handler_key(event: &str) -> String {
    if event.is_empty() {
        String::new()
    } else {
        format!("on{}", capitalize(event))
    }
}

/// Text shown for an interpolated value.
pub fn to_display_string(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_changed_uses_same_value() {
        assert!(!has_changed(&Value::from(1), &Value::from(1)));
        assert!(!has_changed(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(has_changed(&Value::from(0.0), &Value::from(-0.0)));
        assert!(has_changed(&Value::Null, &Value::from(0)));
    }

    #[test]
    fn event_keys() {
        assert!(is_on("onClick"));
        assert!(!is_on("onclick"));
        assert!(!is_on("on"));
        assert!(!is_on("id"));
    }

    #[test]
    fn handler_key_from_kebab_event() {
        assert_eq!(camelize("add-foo"), "addFoo");
        assert_eq!(camelize("add"), "add");
        assert_eq!(to_handler_key(&camelize("add-foo")), "onAddFoo");
        assert_eq!(to_handler_key("add"), "onAdd");
        assert_eq!(capitalize(""), "");
    }
}
