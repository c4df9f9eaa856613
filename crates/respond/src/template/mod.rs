//! Template compilation, lookup and layout composition.
//!
//! A [`TemplateSet`] is compiled from a root on a [`FileSystem`](crate::fs::FileSystem):
//! every file below the root whose name ends in a configured extension
//! becomes a unit, named by its path relative to the root minus that
//! extension.
//!
//! ```text
//! templates/
//! ├── index.tmpl          → "index"
//! ├── admin/
//! │   └── users.tmpl      → "admin/users"
//! └── notes.txt           (ignored)
//! ```
//!
//! Templates use minijinja syntax. The render binding is available as
//! `this`, and its top-level fields are also in scope when it is a map or
//! struct, unless a helper already owns the name. Output is HTML-escaped.
//! An absent field is falsy in `{% if %}` but printing or traversing it fails
//! the render.

mod helpers;
mod layout;
mod set;
mod walker;

pub use layout::THIS;
pub use set::{TemplateHandle, TemplateSet};
pub use walker::{compile, template_name};

pub(crate) use layout::{compose, PartialPolicy};
