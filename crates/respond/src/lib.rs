//! # Respond - HTTP Response Rendering
//!
//! `respond` writes HTTP responses from Rust values: HTML from a directory of
//! templates (with optional layouts), JSON, JSONP, XML, plain text and raw
//! bytes, each with the right Content-Type.
//!
//! ## Core Concepts
//!
//! - [`Renderer`]: Compiles a template root once and renders responses from it
//! - [`Options`]: Construction-time configuration (root, extensions, delimiters,
//!   helpers, layout, development mode, content types)
//! - [`TemplateSet`]: The compiled, name-addressable collection of templates
//! - [`fs::FileSystem`]: Where templates come from (disk or an embedded archive)
//! - [`ResponseWriter`]: The response sink, implemented for `http::Response<Vec<u8>>`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use http::{Response, StatusCode};
//! use respond::{Options, Renderer};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Page {
//!     title: String,
//! }
//!
//! // Compiles ./templates/**/*.tmpl; ./templates/admin/index.tmpl becomes "admin/index".
//! let renderer = Renderer::new(Options::new().layout("layout"))?;
//!
//! let mut res = Response::new(Vec::new());
//! renderer.html(&mut res, StatusCode::OK, "admin/index", &Page { title: "Admin".into() }, None)?;
//!
//! let mut res = Response::new(Vec::new());
//! renderer.json(&mut res, StatusCode::OK, &serde_json::json!({"ok": true}))?;
//! # Ok::<(), respond::RenderError>(())
//! ```
//!
//! ## Layouts
//!
//! A layout is an ordinary template that calls `yield()` where the requested
//! template's output belongs. Inside a layout render `current()` names the
//! requested template and `partial("name")` pulls in `name-<current>` when it
//! exists. Called outside a layout, `yield()` fails the render.
//!
//! ```text
//! templates/layout.tmpl       <html><head>{{ partial("css") }}</head><body>{{ yield() }}</body></html>
//! templates/home.tmpl         <h1>{{ title }}</h1>
//! templates/css-home.tmpl     <style>h1 { color: red }</style>
//! ```
//!
//! ## Hot Reloading
//!
//! With [`Options::is_development`] every HTML render recompiles the template
//! root first, so edits are picked up without a restart. Renders already in
//! flight keep using the set they started with.

pub mod engine;
mod error;
pub mod fs;
mod gate;
mod options;
mod renderer;
mod response;
mod template;

pub use error::RenderError;
pub use options::{
    Delims, HelperFn, Options, CONTENT_BINARY, CONTENT_HTML, CONTENT_JSON, CONTENT_JSONP,
    CONTENT_TEXT, CONTENT_XHTML, CONTENT_XML, DEFAULT_CHARSET, DEFAULT_DIRECTORY,
    DEFAULT_EXTENSION,
};
pub use renderer::{HtmlOptions, Renderer};
pub use response::ResponseWriter;
pub use template::{compile, template_name, TemplateHandle, TemplateSet, THIS};

// Helper bundles are written against this version of the engine.
pub use minijinja;
