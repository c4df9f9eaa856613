//! Error types for compilation and rendering.
//!
//! [`RenderError`] is the single error type returned by every public operation.
//! It wraps the template engine's errors so callers never have to depend on
//! minijinja directly.

use std::path::PathBuf;

/// Error type for template compilation and response rendering.
///
/// Compilation failures ([`Traversal`](RenderError::Traversal),
/// [`Parse`](RenderError::Parse)) leave any previously installed template set
/// untouched. Execution failures never produce a partial response body.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Walking the template root or reading a template file failed.
    #[error("failed to read \"{}\": {source}", path.display())]
    Traversal {
        /// Path that could not be walked or read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A matched template file is not valid template syntax.
    #[error("failed to parse template \"{name}\": {message}")]
    Parse {
        /// Derived template name.
        name: String,
        /// Message from the template engine.
        message: String,
    },

    /// The requested template name is not in the compiled set.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// The template engine failed while executing a template.
    #[error("template error: {0}")]
    Template(String),

    /// Binding or response data could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Writing the response failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A reload through a shared reference was requested on a renderer built
    /// without a lock.
    #[error("templates cannot be recompiled through a shared reference when locking is disabled")]
    LockingDisabled,
}

impl RenderError {
    pub(crate) fn traversal(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenderError::Traversal {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors raised while building a template set.
    pub fn is_compile_error(&self) -> bool {
        matches!(self, RenderError::Traversal { .. } | RenderError::Parse { .. })
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::Serialization(err.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err.to_string()),
            ErrorKind::SyntaxError | ErrorKind::BadEscape => RenderError::Parse {
                name: err.name().unwrap_or_default().to_string(),
                message: err.to_string(),
            },
            ErrorKind::BadSerialization => RenderError::Serialization(err.to_string()),
            _ => RenderError::Template(err.to_string()),
        }
    }
}
