//! File system providers for template compilation.
//!
//! The compiler only needs two things from storage: a depth-first walk of
//! every entry below a root, and the full contents of a file. [`FileSystem`]
//! captures exactly that, so the same compilation logic runs over a physical
//! directory ([`OsFileSystem`]) or an in-memory archive ([`EmbeddedFileSystem`]).
//!
//! # Paths
//!
//! All paths crossing this interface use forward slashes, whatever the host
//! platform. Paths yielded by [`FileSystem::walk`] start with the root they
//! were walked from (`templates/admin/index.tmpl` for root `templates`), and
//! can be handed back to [`FileSystem::read_file`] unchanged. The root `.`
//! names the top of the provider.

mod embedded;
mod os;

pub use embedded::EmbeddedFileSystem;
pub use os::OsFileSystem;

use crate::error::RenderError;

/// One node visited during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Slash-separated path, prefixed with the walked root.
    pub path: String,
    /// Whether this node is a directory.
    pub is_dir: bool,
}

impl WalkEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Lazy, depth-first sequence of walk results.
///
/// The sequence stops being useful after the first `Err`; consumers are
/// expected to short-circuit on it.
pub type Walk<'a> = Box<dyn Iterator<Item = Result<WalkEntry, RenderError>> + 'a>;

/// Storage backend that templates are compiled from.
///
/// Implementations must be safe to call from several threads at once: a
/// development-mode recompile can overlap with requests still executing
/// against the previous template set.
pub trait FileSystem: Send + Sync {
    /// Visits `root` and every descendant, directories included, depth-first
    /// with siblings in name order.
    ///
    /// A root that does not exist yields a single
    /// [`RenderError::Traversal`] item.
    fn walk<'a>(&'a self, root: &str) -> Walk<'a>;

    /// Reads the full contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Traversal`] if the path is absent or unreadable.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, RenderError>;
}

/// Normalizes a caller-supplied root or path to the slash form used here.
///
/// Leading `./` and `/` are dropped, as are trailing slashes; `.` and the
/// empty string both become the empty string.
pub(crate) fn normalize(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let trimmed = slashed.trim_end_matches('/');
    let mut rest = trimmed;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    if rest == "." {
        String::new()
    } else {
        rest.to_string()
    }
}

/// Joins a root and a slash-separated relative path.
pub(crate) fn join(root: &str, relative: &str) -> String {
    match (root.is_empty() || root == ".", relative.is_empty()) {
        (true, _) => relative.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{}/{}", root.trim_end_matches('/'), relative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("."), "");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("./templates/"), "templates");
        assert_eq!(normalize("/templates/admin"), "templates/admin");
        assert_eq!(normalize("templates\\admin"), "templates/admin");
    }

    #[test]
    fn test_join() {
        assert_eq!(join(".", "index.tmpl"), "index.tmpl");
        assert_eq!(join("", "index.tmpl"), "index.tmpl");
        assert_eq!(join("templates", ""), "templates");
        assert_eq!(join("templates/", "a/b.tmpl"), "templates/a/b.tmpl");
    }
}
