//! Compiled template sets.

use std::collections::BTreeSet;
use std::sync::Arc;

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;

use super::helpers::register_helpers;
use super::layout::{binding_context, Context};
use crate::error::RenderError;
use crate::options::{Delims, HelperFn};

/// An immutable-once-built collection of named, parsed templates.
///
/// Every unit in a set shares the set's delimiters and helper functions, and
/// any unit can reference any other by name (`{% include "admin/nav" %}`).
/// The set itself carries a root name for identity; that name is not a
/// retrievable unit.
///
/// Sets are built by [`compile`](super::compile) and shared behind an
/// [`Arc`]; a recompile builds a new set rather than mutating the old one.
pub struct TemplateSet {
    root: String,
    env: Environment<'static>,
    names: Vec<String>,
    globals: BTreeSet<String>,
}

impl TemplateSet {
    /// Creates an empty set with the built-in `yield`/`current`/`partial`
    /// helpers registered.
    pub fn new(root: impl Into<String>, delims: &Delims) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        if !delims.is_default() {
            let syntax = SyntaxConfig::builder()
                .variable_delimiters(delims.left.clone(), delims.right.clone())
                .block_delimiters(delims.block_left.clone(), delims.block_right.clone())
                .comment_delimiters(delims.comment_left.clone(), delims.comment_right.clone())
                .build()
                .map_err(|e| RenderError::Parse {
                    name: String::new(),
                    message: e.to_string(),
                })?;
            env.set_syntax(syntax);
        }
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
        register_helpers(&mut env);

        let mut set = Self {
            root: root.into(),
            env,
            names: Vec::new(),
            globals: BTreeSet::new(),
        };
        set.refresh_globals();
        Ok(set)
    }

    /// Applies a helper bundle. Must happen before the units that use it are added.
    pub fn apply(&mut self, bundle: &HelperFn) {
        bundle(&mut self.env);
        self.refresh_globals();
    }

    fn refresh_globals(&mut self) {
        self.globals = self.env.globals().map(|(name, _)| name.to_string()).collect();
    }

    /// Builds the context `binding` executes with in this set.
    ///
    /// Top-level binding fields named like a helper (`yield`, `current`,
    /// `partial`, or any function or global a bundle registered) are left
    /// out, so the helper keeps its meaning. Those fields stay reachable
    /// through `this`.
    pub(crate) fn binding_context<T: Serialize + ?Sized>(&self, binding: &T) -> Context {
        binding_context(binding, |name| self.globals.contains(name))
    }

    /// Parses `source` and registers it as `name`, replacing any unit already
    /// registered under that name.
    pub fn add(&mut self, name: &str, source: String) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.to_string(), source)
            .map_err(|e| RenderError::Parse {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
        Ok(())
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Unit names in the order they were first added.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Executes `name` with a prepared context.
    pub(crate) fn execute_context(
        &self,
        name: &str,
        context: &Context,
    ) -> Result<String, RenderError> {
        let tmpl = self
            .env
            .get_template(name)
            .map_err(|_| RenderError::TemplateNotFound(name.to_string()))?;
        Ok(tmpl.render(context)?)
    }

    /// Executes `name` against `binding`, without any layout.
    pub fn execute<T: Serialize + ?Sized>(
        &self,
        name: &str,
        binding: &T,
    ) -> Result<String, RenderError> {
        self.execute_context(name, &self.binding_context(binding))
    }
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("root", &self.root)
            .field("names", &self.names)
            .finish()
    }
}

/// A unit looked up from a renderer's current set.
///
/// The handle keeps the set it was found in alive, so it stays usable after
/// the renderer recompiles.
#[derive(Clone)]
pub struct TemplateHandle {
    set: Arc<TemplateSet>,
    name: String,
}

impl TemplateHandle {
    pub(crate) fn new(set: Arc<TemplateSet>, name: impl Into<String>) -> Self {
        Self {
            set,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The set this unit belongs to.
    pub fn set(&self) -> &Arc<TemplateSet> {
        &self.set
    }

    /// Executes the unit against `binding`.
    pub fn execute<T: Serialize + ?Sized>(&self, binding: &T) -> Result<String, RenderError> {
        self.set.execute(&self.name, binding)
    }
}

impl std::fmt::Debug for TemplateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateHandle")
            .field("root", &self.set.root())
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_with(units: &[(&str, &str)]) -> TemplateSet {
        let mut set = TemplateSet::new("templates", &Delims::default()).unwrap();
        for (name, source) in units {
            set.add(name, source.to_string()).unwrap();
        }
        set
    }

    #[test]
    fn test_add_and_execute() {
        let set = set_with(&[("hello", "Hello {{ this }}")]);
        assert_eq!(set.execute("hello", "world").unwrap(), "Hello world");
        assert_eq!(set.root(), "templates");
        assert!(!set.contains("templates"));
    }

    #[test]
    fn test_object_binding_keys_are_merged() {
        let set = set_with(&[("user", "{{ name }} / {{ this.name }}")]);
        let out = set.execute("user", &json!({"name": "ana"})).unwrap();
        assert_eq!(out, "ana / ana");
    }

    #[test]
    fn test_lookup_is_exact() {
        let set = set_with(&[("admin/index", "x")]);
        assert!(set.contains("admin/index"));
        assert!(!set.contains("Admin/index"));
        assert!(!set.contains("admin/index.tmpl"));
        assert!(!set.contains("index"));
    }

    #[test]
    fn test_units_reference_each_other() {
        let set = set_with(&[
            ("nav", "<nav>{{ this }}</nav>"),
            ("page", "{% include \"nav\" %}<main/>"),
        ]);
        assert_eq!(set.execute("page", "home").unwrap(), "<nav>home</nav><main/>");
    }

    #[test]
    fn test_replacing_keeps_first_position() {
        let mut set = set_with(&[("a", "1"), ("b", "2")]);
        set.add("a", "3".to_string()).unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(set.execute("a", &()).unwrap(), "3");
    }

    #[test]
    fn test_trailing_newline_is_kept() {
        let set = set_with(&[("x", "{{ this }}\n")]);
        assert_eq!(set.execute("x", "a").unwrap(), "a\n");
    }

    #[test]
    fn test_output_is_html_escaped() {
        let set = set_with(&[("x", "{{ this }}")]);
        assert_eq!(set.execute("x", "<b>").unwrap(), "&lt;b&gt;");
    }

    #[test]
    fn test_custom_delims() {
        let mut set = TemplateSet::new("templates", &Delims::new("[[", "]]")).unwrap();
        set.add("x", "[[ this ]] {{ this }}".to_string()).unwrap();
        assert_eq!(set.execute("x", "a").unwrap(), "a {{ this }}");
    }

    #[test]
    fn test_parse_error_names_unit() {
        let mut set = TemplateSet::new("templates", &Delims::default()).unwrap();
        let err = set.add("broken", "{% if %}".to_string()).unwrap_err();
        match err {
            RenderError::Parse { name, .. } => assert_eq!(name, "broken"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_unit() {
        let set = set_with(&[]);
        assert!(matches!(
            set.execute("nope", &()),
            Err(RenderError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let set = set_with(&[("x", "{{ missing }}")]);
        assert!(matches!(
            set.execute("x", &json!({})),
            Err(RenderError::Template(_))
        ));
    }

    #[test]
    fn test_absent_key_is_falsy_in_conditions() {
        let set = set_with(&[("x", "{% if admin %}A{% endif %}ok")]);
        assert_eq!(set.execute("x", &json!({})).unwrap(), "ok");
        assert_eq!(set.execute("x", &json!({"admin": true})).unwrap(), "Aok");
    }

    #[test]
    fn test_traversing_missing_field_is_an_error() {
        let set = set_with(&[("x", "{{ missing.name }}")]);
        assert!(matches!(
            set.execute("x", &json!({})),
            Err(RenderError::Template(_))
        ));
    }

    #[test]
    fn test_binding_fields_do_not_shadow_helpers() {
        let mut set = TemplateSet::new("templates", &Delims::default()).unwrap();
        let shout: HelperFn = Arc::new(|env: &mut Environment<'static>| {
            env.add_function("shout", |s: String| s.to_uppercase())
        });
        set.apply(&shout);
        set.add("x", "{{ shout(this.name) }} {{ this.shout }}".to_string())
            .unwrap();

        let out = set.execute("x", &json!({"name": "a", "shout": true})).unwrap();
        assert_eq!(out, "A true");
    }

    #[test]
    fn test_handle_executes() {
        let set = Arc::new(set_with(&[("hello", "Hello {{ this }}")]));
        let handle = TemplateHandle::new(set, "hello");
        assert_eq!(handle.name(), "hello");
        assert_eq!(handle.execute("you").unwrap(), "Hello you");
    }
}
