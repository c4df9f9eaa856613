//! Renderer configuration.
//!
//! [`Options`] is captured once when a [`Renderer`](crate::Renderer) is built
//! and never changes afterwards. It can be assembled in code with the builder
//! methods, or loaded from YAML/JSON for the data-only fields:
//!
//! ```rust
//! use respond::Options;
//!
//! let options = Options::from_yaml(r#"
//! directory: views
//! extensions: [".tmpl", ".html"]
//! layout: layout
//! is_development: true
//! "#).unwrap();
//!
//! assert_eq!(options.directory, "views");
//! assert_eq!(options.charset, "UTF-8");
//! ```
//!
//! Helper-function bundles and the file system provider cannot be described
//! in a config file; set them with [`Options::func`] and
//! [`Options::file_system`].

use std::fmt;
use std::sync::Arc;

use minijinja::Environment;
use serde::Deserialize;

use crate::error::RenderError;
use crate::fs::FileSystem;

/// A bundle of helper functions, filters or globals applied to every template
/// set the renderer compiles.
pub type HelperFn = Arc<dyn Fn(&mut Environment<'static>) + Send + Sync>;

pub const DEFAULT_DIRECTORY: &str = "templates";
pub const DEFAULT_EXTENSION: &str = ".tmpl";
pub const DEFAULT_CHARSET: &str = "UTF-8";

pub const CONTENT_BINARY: &str = "application/octet-stream";
pub const CONTENT_HTML: &str = "text/html";
pub const CONTENT_XHTML: &str = "application/xhtml+xml";
pub const CONTENT_JSON: &str = "application/json";
pub const CONTENT_JSONP: &str = "application/javascript";
pub const CONTENT_TEXT: &str = "text/plain";
pub const CONTENT_XML: &str = "text/xml";

/// Template action delimiters.
///
/// `left`/`right` delimit output actions (`{{ name }}`). Blocks and comments
/// keep their own pairs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Delims {
    pub left: String,
    pub right: String,
    pub block_left: String,
    pub block_right: String,
    pub comment_left: String,
    pub comment_right: String,
}

impl Default for Delims {
    fn default() -> Self {
        Self {
            left: "{{".into(),
            right: "}}".into(),
            block_left: "{%".into(),
            block_right: "%}".into(),
            comment_left: "{#".into(),
            comment_right: "#}".into(),
        }
    }
}

impl Delims {
    /// Creates delimiters with custom output markers and default block and
    /// comment markers.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            ..Self::default()
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    fn fill_defaults(&mut self) {
        let defaults = Self::default();
        for (value, default) in [
            (&mut self.left, defaults.left),
            (&mut self.right, defaults.right),
            (&mut self.block_left, defaults.block_left),
            (&mut self.block_right, defaults.block_right),
            (&mut self.comment_left, defaults.comment_left),
            (&mut self.comment_right, defaults.comment_right),
        ] {
            if value.is_empty() {
                *value = default;
            }
        }
    }
}

/// Configuration for a [`Renderer`](crate::Renderer).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Root to compile templates from. Default `templates`.
    pub directory: String,
    /// File suffixes compiled as templates. Default `[".tmpl"]`.
    pub extensions: Vec<String>,
    /// Template delimiters. Default `{{`/`}}`.
    pub delims: Delims,
    /// Helper bundles, applied in order after the built-in
    /// `yield`/`current`/`partial` stand-ins.
    #[serde(skip)]
    pub funcs: Vec<HelperFn>,
    /// Layout template name. Empty disables layouts.
    pub layout: String,
    /// Recompile all templates on every HTML render.
    pub is_development: bool,
    /// Guard the template set with a read/write lock even outside development
    /// mode. Without it (and outside development mode) the set can only be
    /// recompiled through `&mut Renderer`.
    pub use_mutex_lock: bool,
    /// Storage to compile from. Defaults to the working directory.
    #[serde(skip)]
    pub file_system: Option<Arc<dyn FileSystem>>,

    /// Charset appended to every generated Content-Type. Default `UTF-8`.
    pub charset: String,
    /// Leave the charset off generated Content-Type headers.
    pub disable_charset: bool,

    pub indent_json: bool,
    pub indent_xml: bool,
    /// Written before every JSON body, e.g. `)]}',\n`.
    pub prefix_json: String,
    /// Written before every XML body, e.g. an XML declaration.
    pub prefix_xml: String,
    /// Serialize JSON straight into the response instead of buffering it.
    pub streaming_json: bool,

    pub binary_content_type: String,
    pub html_content_type: String,
    pub json_content_type: String,
    pub jsonp_content_type: String,
    pub text_content_type: String,
    pub xml_content_type: String,

    /// Fail a layout render when a requested partial does not exist.
    pub require_partials: bool,
    /// Let `partial("x")` fall back to the unit `x` when `x-<current>` is missing.
    pub render_partials_without_prefix: bool,
    /// Return render errors without writing a 500 response.
    pub disable_http_error_rendering: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            directory: DEFAULT_DIRECTORY.into(),
            extensions: vec![DEFAULT_EXTENSION.into()],
            delims: Delims::default(),
            funcs: Vec::new(),
            layout: String::new(),
            is_development: false,
            use_mutex_lock: false,
            file_system: None,
            charset: DEFAULT_CHARSET.into(),
            disable_charset: false,
            indent_json: false,
            indent_xml: false,
            prefix_json: String::new(),
            prefix_xml: String::new(),
            streaming_json: false,
            binary_content_type: CONTENT_BINARY.into(),
            html_content_type: CONTENT_HTML.into(),
            json_content_type: CONTENT_JSON.into(),
            jsonp_content_type: CONTENT_JSONP.into(),
            text_content_type: CONTENT_TEXT.into(),
            xml_content_type: CONTENT_XML.into(),
            require_partials: false,
            render_partials_without_prefix: false,
            disable_http_error_rendering: false,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("directory", &self.directory)
            .field("extensions", &self.extensions)
            .field("delims", &self.delims)
            .field("funcs", &self.funcs.len())
            .field("layout", &self.layout)
            .field("is_development", &self.is_development)
            .field("use_mutex_lock", &self.use_mutex_lock)
            .field("file_system", &self.file_system.is_some())
            .field("charset", &self.charset)
            .field("disable_charset", &self.disable_charset)
            .finish_non_exhaustive()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the data-only fields from YAML. Missing fields keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        Ok(serde_yaml::from_str::<Self>(yaml)?.prepared())
    }

    /// Parses the data-only fields from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str::<Self>(json)?.prepared())
    }

    pub fn directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn delims(mut self, delims: Delims) -> Self {
        self.delims = delims;
        self
    }

    /// Adds a helper bundle.
    ///
    /// ```rust
    /// use respond::Options;
    ///
    /// let options = Options::new().func(|env| {
    ///     env.add_function("shout", |s: String| s.to_uppercase());
    /// });
    /// assert_eq!(options.funcs.len(), 1);
    /// ```
    pub fn func<F>(mut self, bundle: F) -> Self
    where
        F: Fn(&mut Environment<'static>) + Send + Sync + 'static,
    {
        self.funcs.push(Arc::new(bundle));
        self
    }

    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    pub fn development(mut self, enabled: bool) -> Self {
        self.is_development = enabled;
        self
    }

    pub fn mutex_lock(mut self, enabled: bool) -> Self {
        self.use_mutex_lock = enabled;
        self
    }

    pub fn file_system(mut self, fs: impl FileSystem + 'static) -> Self {
        self.file_system = Some(Arc::new(fs));
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Returns true when the template set must sit behind a real lock.
    pub fn uses_lock(&self) -> bool {
        self.is_development || self.use_mutex_lock
    }

    /// Replaces empty fields with their defaults.
    pub fn prepared(mut self) -> Self {
        let defaults = Self::default();
        if self.directory.is_empty() {
            self.directory = defaults.directory;
        }
        if self.extensions.is_empty() {
            self.extensions = defaults.extensions;
        }
        if self.charset.is_empty() {
            self.charset = defaults.charset;
        }
        for (value, default) in [
            (&mut self.binary_content_type, defaults.binary_content_type),
            (&mut self.html_content_type, defaults.html_content_type),
            (&mut self.json_content_type, defaults.json_content_type),
            (&mut self.jsonp_content_type, defaults.jsonp_content_type),
            (&mut self.text_content_type, defaults.text_content_type),
            (&mut self.xml_content_type, defaults.xml_content_type),
        ] {
            if value.is_empty() {
                *value = default;
            }
        }
        self.delims.fill_defaults();
        self
    }

    /// The `; charset=...` suffix for generated Content-Type headers.
    pub(crate) fn charset_suffix(&self) -> String {
        if self.disable_charset {
            String::new()
        } else {
            format!("; charset={}", self.charset)
        }
    }
}
