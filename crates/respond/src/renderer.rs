//! The response renderer.
//!
//! A [`Renderer`] compiles its template set once at construction and then
//! serves any number of concurrent renders from it.
//!
//! # Development vs Production
//!
//! With [`Options::is_development`] set, every HTML render first recompiles
//! the whole template root under the write lock, so template edits show up on
//! the next request. Production renderers compile once; the set can still be
//! rebuilt on demand with [`Renderer::compile_templates`] (when a lock is
//! configured) or [`Renderer::compile_templates_mut`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use minijinja::Value;
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::{Data, Head, Html, Json, Jsonp, Text, Xml};
use crate::error::RenderError;
use crate::fs::{FileSystem, OsFileSystem};
use crate::gate::ReloadGate;
use crate::options::Options;
use crate::response::{write_error, ResponseWriter};
use crate::template::{compile, compose, PartialPolicy, TemplateHandle, TemplateSet};

/// Per-call options for [`Renderer::html`].
#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Layout for this call, overriding [`Options::layout`]. An empty string
    /// renders without a layout.
    pub layout: Option<String>,
    /// Extra values visible to every unit executed by this call. Use
    /// [`Value::from_function`] for per-call helper functions. They shadow
    /// top-level binding fields and set-wide helpers of the same name, but
    /// never the layout helpers `yield`, `current` and `partial` while a
    /// layout is in effect.
    pub funcs: BTreeMap<String, Value>,
}

impl HtmlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn func(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.funcs.insert(name.into(), value.into());
        self
    }
}

/// Renders HTML templates, JSON, JSONP, XML, text and binary responses.
///
/// # Example
///
/// ```rust
/// use http::{Response, StatusCode};
/// use respond::fs::EmbeddedFileSystem;
/// use respond::{Options, Renderer};
///
/// static FILES: &[(&str, &[u8])] = &[
///     ("templates/layout.tmpl", b"<html>{{ yield() }}</html>"),
///     ("templates/hello.tmpl", b"<h1>Hello {{ this }}</h1>"),
/// ];
///
/// let renderer = Renderer::new(
///     Options::new()
///         .file_system(EmbeddedFileSystem::new(FILES))
///         .layout("layout"),
/// )?;
///
/// let mut res = Response::new(Vec::new());
/// renderer.html(&mut res, StatusCode::OK, "hello", "gophers", None)?;
/// assert_eq!(res.body(), b"<html><h1>Hello gophers</h1></html>");
/// # Ok::<(), respond::RenderError>(())
/// ```
pub struct Renderer {
    options: Options,
    fs: Arc<dyn FileSystem>,
    gate: ReloadGate,
}

impl Renderer {
    /// Creates a renderer and compiles its template set.
    ///
    /// # Errors
    ///
    /// Returns the first traversal, read or parse failure met while compiling.
    pub fn new(options: Options) -> Result<Self, RenderError> {
        let options = options.prepared();
        let fs: Arc<dyn FileSystem> = match &options.file_system {
            Some(fs) => Arc::clone(fs),
            None => Arc::new(OsFileSystem::new()),
        };
        let set = compile(&options, fs.as_ref())?;
        let gate = ReloadGate::new(set, options.uses_lock());

        debug!(
            directory = %options.directory,
            development = options.is_development,
            locking = gate.is_locking(),
            "renderer ready"
        );
        Ok(Self { options, fs, gate })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns true if the template set sits behind a read/write lock.
    pub fn is_locking(&self) -> bool {
        self.gate.is_locking()
    }

    /// The currently installed template set.
    pub fn templates(&self) -> Arc<TemplateSet> {
        self.gate.current()
    }

    /// Finds a unit by exact name in the current set.
    ///
    /// The root name and any name carrying an extension are never found.
    pub fn template_lookup(&self, name: &str) -> Option<TemplateHandle> {
        let set = self.gate.current();
        set.contains(name).then(|| TemplateHandle::new(set, name))
    }

    fn build(&self) -> Result<TemplateSet, RenderError> {
        compile(&self.options, self.fs.as_ref())
    }

    /// Rebuilds and installs the template set through a shared reference.
    ///
    /// # Errors
    ///
    /// [`RenderError::LockingDisabled`] on a renderer built without a lock,
    /// or the compile failure (the installed set is kept).
    pub fn compile_templates(&self) -> Result<(), RenderError> {
        self.gate.reload(|| self.build()).map(|_| ())
    }

    /// Rebuilds and installs the template set.
    pub fn compile_templates_mut(&mut self) -> Result<(), RenderError> {
        let fresh = self.build()?;
        self.gate.reload_mut(|| Ok(fresh))
    }

    fn content_type(&self, base: &str) -> String {
        format!("{base}{}", self.options.charset_suffix())
    }

    fn partial_policy(&self) -> PartialPolicy {
        PartialPolicy {
            require: self.options.require_partials,
            without_prefix: self.options.render_partials_without_prefix,
        }
    }

    /// Writes a 500 for `err` unless error rendering is disabled, then hands
    /// the result back.
    fn finish<W: ResponseWriter + ?Sized>(
        &self,
        w: &mut W,
        result: Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        if let Err(err) = &result {
            if !self.options.disable_http_error_rendering {
                if let Err(io_err) = write_error(w, &err.to_string()) {
                    warn!(error = %io_err, "failed to write error response");
                }
            }
        }
        result
    }

    /// Executes `name` (through the layout, if any) and returns the output.
    pub fn render_html<T: Serialize + ?Sized>(
        &self,
        name: &str,
        binding: &T,
        html_opt: Option<&HtmlOptions>,
    ) -> Result<String, RenderError> {
        let set = if self.options.is_development {
            match self.gate.reload(|| self.build()) {
                Ok(set) => set,
                Err(err) => {
                    warn!(error = %err, "template recompile failed, keeping previous set");
                    return Err(err);
                }
            }
        } else {
            self.gate.current()
        };

        let layout = html_opt
            .and_then(|o| o.layout.as_deref())
            .unwrap_or(self.options.layout.as_str());
        let layout = (!layout.is_empty()).then_some(layout);

        let mut context = set.binding_context(binding);
        if let Some(o) = html_opt {
            context.extend(o.funcs.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let (target, context) = compose(name, context, layout, self.partial_policy());
        set.execute_context(&target, &context)
    }

    /// Renders the `name` template as an HTML response.
    ///
    /// Nothing is written until execution has succeeded. On failure a 500
    /// carrying the error message is written instead, unless
    /// [`Options::disable_http_error_rendering`] is set.
    pub fn html<W, T>(
        &self,
        w: &mut W,
        status: StatusCode,
        name: &str,
        binding: &T,
        html_opt: Option<&HtmlOptions>,
    ) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
        T: Serialize + ?Sized,
    {
        let result = self.render_html(name, binding, html_opt).and_then(|body| {
            let html = Html {
                head: Head::new(self.content_type(&self.options.html_content_type), status),
            };
            html.render(w, &body)
        });
        self.finish(w, result)
    }

    pub fn json<W, T>(&self, w: &mut W, status: StatusCode, value: &T) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
        T: Serialize + ?Sized,
    {
        let json = Json {
            head: Head::new(self.content_type(&self.options.json_content_type), status),
            indent: self.options.indent_json,
            prefix: self.options.prefix_json.clone(),
            streaming: self.options.streaming_json,
        };
        let result = json.render(w, value);
        if json.streaming {
            // Head and part of the body may already be out.
            return result;
        }
        self.finish(w, result)
    }

    pub fn jsonp<W, T>(
        &self,
        w: &mut W,
        status: StatusCode,
        callback: &str,
        value: &T,
    ) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
        T: Serialize + ?Sized,
    {
        let jsonp = Jsonp {
            head: Head::new(self.content_type(&self.options.jsonp_content_type), status),
            indent: self.options.indent_json,
            callback: callback.to_string(),
        };
        let result = jsonp.render(w, value);
        self.finish(w, result)
    }

    pub fn xml<W, T>(&self, w: &mut W, status: StatusCode, value: &T) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
        T: Serialize + ?Sized,
    {
        let xml = Xml {
            head: Head::new(self.content_type(&self.options.xml_content_type), status),
            indent: self.options.indent_xml,
            prefix: self.options.prefix_xml.clone(),
        };
        let result = xml.render(w, value);
        self.finish(w, result)
    }

    /// Writes `body` as text. A Content-Type already on the response is kept.
    pub fn text<W>(&self, w: &mut W, status: StatusCode, body: &str) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
    {
        let text = Text {
            head: Head::new(self.content_type(&self.options.text_content_type), status),
        };
        let result = text.render(w, body);
        self.finish(w, result)
    }

    /// Writes raw bytes. A Content-Type already on the response is kept.
    pub fn data<W>(&self, w: &mut W, status: StatusCode, body: &[u8]) -> Result<(), RenderError>
    where
        W: ResponseWriter + ?Sized,
    {
        let data = Data {
            head: Head::new(self.options.binary_content_type.clone(), status),
        };
        let result = data.render(w, body);
        self.finish(w, result)
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("options", &self.options)
            .field("locking", &self.gate.is_locking())
            .finish_non_exhaustive()
    }
}
