//! Built-in layout helpers.
//!
//! Every set starts with `yield`, `current` and `partial` registered, so that
//! any unit may reference them and still parse on its own. These global
//! versions are stand-ins: during a layout render they are shadowed by
//! per-render closures (see [`layout`](super::layout)). Called outside a
//! layout, `yield` and `partial` fail the render and `current` is empty.

use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error, ErrorKind};

pub(crate) const YIELD: &str = "yield";
pub(crate) const CURRENT: &str = "current";
pub(crate) const PARTIAL: &str = "partial";

pub(crate) fn register_helpers(env: &mut Environment<'static>) {
    env.add_function(YIELD, |_args: Rest<Value>| -> Result<Value, Error> {
        Err(Error::new(
            ErrorKind::InvalidOperation,
            "yield called with no layout defined",
        ))
    });

    env.add_function(PARTIAL, |_args: Rest<Value>| -> Result<Value, Error> {
        Err(Error::new(
            ErrorKind::InvalidOperation,
            "partial called with no layout defined",
        ))
    });

    env.add_function(CURRENT, || Value::from(""));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> Result<String, Error> {
        let mut env = Environment::new();
        register_helpers(&mut env);
        env.render_str(source, ())
    }

    #[test]
    fn test_yield_without_layout_fails() {
        let err = render("{{ yield() }}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(err.to_string().contains("yield called with no layout defined"));
    }

    #[test]
    fn test_partial_without_layout_fails() {
        let err = render("{{ partial(\"css\") }}").unwrap_err();
        assert!(err.to_string().contains("partial called with no layout defined"));
    }

    #[test]
    fn test_current_without_layout_is_empty() {
        assert_eq!(render("[{{ current() }}]").unwrap(), "[]");
    }

    #[test]
    fn test_helpers_can_be_overridden() {
        let mut env = Environment::new();
        register_helpers(&mut env);
        env.add_function(CURRENT, || Value::from("mine"));
        assert_eq!(env.render_str("{{ current() }}", ()).unwrap(), "mine");
    }
}
