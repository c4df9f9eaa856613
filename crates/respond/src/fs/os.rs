//! Physical directory provider.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{join, FileSystem, Walk, WalkEntry};
use crate::error::RenderError;

/// [`FileSystem`] backed by the host file system.
///
/// Without a base directory, paths are resolved against the process working
/// directory. With one ([`OsFileSystem::rooted`]), every path is resolved
/// below it, so the template root `.` means the base itself.
///
/// Symbolic links below the root are reported as non-directory entries and
/// never descended into.
///
/// # Example
///
/// ```rust,no_run
/// use respond::fs::{FileSystem, OsFileSystem};
///
/// let fs = OsFileSystem::rooted("./templates");
/// for entry in fs.walk(".") {
///     let entry = entry?;
///     println!("{} dir={}", entry.path, entry.is_dir);
/// }
/// # Ok::<(), respond::RenderError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OsFileSystem {
    base: Option<PathBuf>,
}

impl OsFileSystem {
    /// Creates a provider resolving paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider resolving paths below `base`.
    pub fn rooted(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let relative = if path.is_empty() { "." } else { path };
        match &self.base {
            Some(base) => base.join(relative),
            None => PathBuf::from(relative),
        }
    }
}

/// Converts a relative OS path into slash form.
fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl FileSystem for OsFileSystem {
    fn walk<'a>(&'a self, root: &str) -> Walk<'a> {
        let root = root.to_string();
        let full_root = self.resolve(&root);

        let entries = WalkDir::new(&full_root)
            .sort_by_file_name()
            .into_iter()
            .map(move |entry| {
                let entry = entry.map_err(|err| {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| full_root.clone());
                    RenderError::traversal(path, std::io::Error::from(err))
                })?;

                let relative = entry
                    .path()
                    .strip_prefix(&full_root)
                    .map(to_slash)
                    .unwrap_or_default();

                Ok(WalkEntry {
                    path: join(&root, &relative),
                    is_dir: entry.file_type().is_dir(),
                })
            });

        Box::new(entries)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, RenderError> {
        let full = self.resolve(path);
        std::fs::read(&full).map_err(|e| RenderError::traversal(full, e))
    }
}
