//! Layout composition.
//!
//! A layout render executes the layout unit rather than the requested one.
//! Three per-render helpers are placed in the execution context, where they
//! shadow the set-wide stand-ins from [`helpers`](super::helpers):
//!
//! - `yield()` executes the requested unit with the same binding and inserts
//!   its output verbatim.
//! - `current()` returns the requested unit's name.
//! - `partial(base)` executes `base-<current>` if the set has it.
//!
//! Nothing is registered on the shared set, so concurrent renders of
//! different units through the same layout never observe each other.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use minijinja::value::{Value, ValueKind};
use minijinja::{Error, ErrorKind, State};
use serde::Serialize;

use super::helpers::{CURRENT, PARTIAL, YIELD};

/// Context key holding the whole binding.
pub const THIS: &str = "this";

/// Name-keyed values a unit executes against.
pub(crate) type Context = BTreeMap<String, Value>;

/// How `partial(base)` resolves inside a layout.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PartialPolicy {
    /// A missing partial fails the render instead of producing nothing.
    pub require: bool,
    /// Fall back to `base` itself when `base-<current>` is missing.
    pub without_prefix: bool,
}

/// Builds the execution context for `binding`.
///
/// The binding is always reachable as `this`. When it serializes to a map,
/// each string key is also exposed at top level, except `this` itself and
/// any key for which `reserved` holds. Reserved names keep resolving to the
/// helper of that name, so `this.<key>` is the only way to reach such a field.
pub(crate) fn binding_context<T, F>(binding: &T, reserved: F) -> Context
where
    T: Serialize + ?Sized,
    F: Fn(&str) -> bool,
{
    let this = Value::from_serialize(binding);
    let mut context = Context::new();

    if this.kind() == ValueKind::Map {
        if let Ok(keys) = this.try_iter() {
            for key in keys {
                let Some(name) = key.as_str() else { continue };
                if name == THIS || reserved(name) {
                    continue;
                }
                if let Ok(item) = this.get_item(&key) {
                    context.insert(name.to_string(), item);
                }
            }
        }
    }

    context.insert(THIS.to_string(), this);
    context
}

/// Returns the unit to execute and the context to execute it with.
///
/// Without a layout this is `name` and `context` unchanged.
pub(crate) fn compose(
    name: &str,
    mut context: Context,
    layout: Option<&str>,
    policy: PartialPolicy,
) -> (String, Context) {
    let Some(layout) = layout else {
        return (name.to_string(), context);
    };

    let current = name.to_string();
    context.insert(
        CURRENT.to_string(),
        Value::from_function(move || current.clone()),
    );

    // Inner units and partials see `current` and `partial`; `yield` stays the
    // stand-in. `partial` holds a weak reference to the context it lives in.
    let inner = Arc::new_cyclic(|weak: &Weak<Context>| {
        let current = name.to_string();
        let partial_context = weak.clone();
        let partial = move |state: &State, base: String| -> Result<Value, Error> {
            let env = state.env();
            let prefixed = format!("{base}-{current}");

            let target = if env.get_template(&prefixed).is_ok() {
                prefixed
            } else if policy.without_prefix && env.get_template(&base).is_ok() {
                base
            } else if policy.require {
                return Err(Error::new(
                    ErrorKind::TemplateNotFound,
                    format!("partial \"{prefixed}\" is not defined"),
                ));
            } else {
                return Ok(Value::from_safe_string(String::new()));
            };

            let context = partial_context.upgrade().unwrap_or_default();
            let out = env.get_template(&target)?.render(&*context)?;
            Ok(Value::from_safe_string(out))
        };

        let mut inner = context.clone();
        inner.insert(PARTIAL.to_string(), Value::from_function(partial));
        inner
    });

    let mut outer = (*inner).clone();
    let target = name.to_string();
    let yield_context = Arc::clone(&inner);
    let yield_fn = move |state: &State| -> Result<Value, Error> {
        let out = state.env().get_template(&target)?.render(&*yield_context)?;
        Ok(Value::from_safe_string(out))
    };
    outer.insert(YIELD.to_string(), Value::from_function(yield_fn));

    (layout.to_string(), outer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Delims;
    use crate::template::TemplateSet;
    use serde_json::json;

    fn set_with(units: &[(&str, &str)]) -> TemplateSet {
        let mut set = TemplateSet::new("templates", &Delims::default()).unwrap();
        for (name, source) in units {
            set.add(name, source.to_string()).unwrap();
        }
        set
    }

    fn render(
        set: &TemplateSet,
        name: &str,
        binding: &serde_json::Value,
        layout: Option<&str>,
        policy: PartialPolicy,
    ) -> Result<String, crate::RenderError> {
        let (target, context) = compose(name, set.binding_context(binding), layout, policy);
        set.execute_context(&target, &context)
    }

    #[test]
    fn test_binding_context_scalar() {
        let context = binding_context("gophers", |_| false);
        assert_eq!(context.len(), 1);
        assert_eq!(context[THIS].as_str(), Some("gophers"));
    }

    #[test]
    fn test_binding_context_map_keys() {
        let context = binding_context(&json!({"title": "Home", "this": "shadowed"}), |_| false);
        assert_eq!(context["title"].as_str(), Some("Home"));
        assert_eq!(context[THIS].kind(), ValueKind::Map);
    }

    #[test]
    fn test_binding_context_skips_reserved_keys() {
        let binding = json!({"title": "Home", "yield": 1, "current": {"title": "T"}});
        let context = binding_context(&binding, |key| key == YIELD || key == CURRENT);
        assert_eq!(context["title"].as_str(), Some("Home"));
        assert!(!context.contains_key(YIELD));
        assert!(!context.contains_key(CURRENT));
        assert_eq!(context[THIS].get_attr(CURRENT).unwrap().kind(), ValueKind::Map);
    }

    #[test]
    fn test_helper_named_field_renders_the_same_with_and_without_layout() {
        let set = set_with(&[
            ("layout", "<{{ yield() }}>"),
            ("content", "{{ this.current.title }}|{{ current() }}"),
        ]);
        let binding = json!({"current": {"title": "T"}});
        let policy = PartialPolicy::default();

        let plain = render(&set, "content", &binding, None, policy).unwrap();
        assert_eq!(plain, "T|");
        let wrapped = render(&set, "content", &binding, Some("layout"), policy).unwrap();
        assert_eq!(wrapped, "<T|content>");
    }

    #[test]
    fn test_no_layout_passes_through() {
        let (target, context) = compose("page", binding_context("x", |_| false), None, PartialPolicy::default());
        assert_eq!(target, "page");
        assert!(!context.contains_key(YIELD));
    }

    #[test]
    fn test_yield_inserts_inner_output() {
        let set = set_with(&[
            ("layout", "<html>{{ yield() }}</html>"),
            ("content", "<h1>{{ this }}</h1>"),
        ]);
        let out = render(&set, "content", &json!("gophers"), Some("layout"), PartialPolicy::default())
            .unwrap();
        assert_eq!(out, "<html><h1>gophers</h1></html>");
    }

    #[test]
    fn test_current_names_inner_unit() {
        let set = set_with(&[
            ("layout", "{{ current() }}:{{ yield() }}"),
            ("content", "[{{ current() }}]"),
        ]);
        let out = render(&set, "content", &json!(null), Some("layout"), PartialPolicy::default())
            .unwrap();
        assert_eq!(out, "content:[content]");
    }

    #[test]
    fn test_yield_inside_inner_unit_fails() {
        let set = set_with(&[("layout", "{{ yield() }}"), ("content", "{{ yield() }}")]);
        let err = render(&set, "content", &json!(null), Some("layout"), PartialPolicy::default())
            .unwrap_err();
        assert!(err.to_string().contains("no layout defined"));
    }

    #[test]
    fn test_partial_uses_prefixed_unit() {
        let set = set_with(&[
            ("layout", "<head>{{ partial(\"css\") }}</head>{{ yield() }}"),
            ("content", "body"),
            ("css-content", "<style/>"),
            ("css", "generic"),
        ]);
        let out = render(&set, "content", &json!(null), Some("layout"), PartialPolicy::default())
            .unwrap();
        assert_eq!(out, "<head><style/></head>body");
    }

    #[test]
    fn test_partial_inside_inner_unit() {
        let set = set_with(&[
            ("layout", "<L>{{ yield() }}</L>"),
            ("content", "{{ partial(\"css\") }}body"),
            ("css-content", "<style>{{ current() }}</style>"),
        ]);
        let out = render(&set, "content", &json!(null), Some("layout"), PartialPolicy::default())
            .unwrap();
        assert_eq!(out, "<L><style>content</style>body</L>");
    }

    #[test]
    fn test_partial_inside_partial() {
        let set = set_with(&[
            ("layout", "{{ partial(\"head\") }}{{ yield() }}"),
            ("content", "body"),
            ("head-content", "[{{ partial(\"meta\") }}]"),
            ("meta-content", "meta"),
        ]);
        let out = render(&set, "content", &json!(null), Some("layout"), PartialPolicy::default())
            .unwrap();
        assert_eq!(out, "[meta]body");
    }

    #[test]
    fn test_missing_partial() {
        let set = set_with(&[
            ("layout", "<head>{{ partial(\"css\") }}</head>"),
            ("content", "body"),
            ("css", "generic"),
        ]);
        let binding = json!(null);

        let lenient = render(&set, "content", &binding, Some("layout"), PartialPolicy::default());
        assert_eq!(lenient.unwrap(), "<head></head>");

        let fallback = PartialPolicy {
            without_prefix: true,
            ..PartialPolicy::default()
        };
        let out = render(&set, "content", &binding, Some("layout"), fallback).unwrap();
        assert_eq!(out, "<head>generic</head>");

        let strict = PartialPolicy {
            require: true,
            ..PartialPolicy::default()
        };
        let err = render(&set, "content", &binding, Some("layout"), strict).unwrap_err();
        assert!(err.to_string().contains("css-content"));
    }

    #[test]
    fn test_missing_layout_unit_is_not_found() {
        let set = set_with(&[("content", "body")]);
        let result = render(&set, "content", &json!(null), Some("layout"), PartialPolicy::default());
        assert!(matches!(result, Err(crate::RenderError::TemplateNotFound(_))));
    }
}
