//! In-memory, read-only archive provider.
//!
//! Holds `(path, contents)` pairs, typically baked into the binary with
//! `include_bytes!`, and presents them through the same walk/read contract as
//! a physical directory. The archive only stores files; directory entries are
//! synthesized from the file paths when walking.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read};

use super::{join, normalize, FileSystem, Walk, WalkEntry};
use crate::error::RenderError;

/// Read-only [`FileSystem`] over embedded file contents.
///
/// # Example
///
/// ```rust
/// use respond::fs::{EmbeddedFileSystem, FileSystem};
///
/// static FILES: &[(&str, &[u8])] = &[
///     ("templates/hello.tmpl", b"<h1>Hello {{ this }}</h1>"),
///     ("templates/admin/index.tmpl", b"admin"),
/// ];
///
/// let fs = EmbeddedFileSystem::new(FILES);
/// let paths: Vec<String> = fs
///     .walk("templates")
///     .map(|entry| entry.unwrap().path)
///     .collect();
///
/// assert_eq!(
///     paths,
///     ["templates", "templates/admin", "templates/admin/index.tmpl", "templates/hello.tmpl"]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedFileSystem {
    files: BTreeMap<String, Cow<'static, [u8]>>,
    dirs: BTreeSet<String>,
}

impl EmbeddedFileSystem {
    /// Creates an archive from static entries.
    pub fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self::from_entries(
            entries
                .iter()
                .map(|(path, content)| (*path, Cow::Borrowed(*content))),
        )
    }

    /// Creates an archive from owned or borrowed entries.
    ///
    /// Later entries replace earlier ones with the same path.
    pub fn from_entries<I, P, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<Cow<'static, [u8]>>,
    {
        let mut fs = Self::default();
        for (path, content) in entries {
            fs.insert(path.as_ref(), content);
        }
        fs
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: &str, content: impl Into<Cow<'static, [u8]>>) {
        let path = normalize(path);

        // Every proper prefix is a directory; the empty string is the archive root.
        self.dirs.insert(String::new());
        let mut end = 0;
        while let Some(offset) = path[end..].find('/') {
            end += offset;
            self.dirs.insert(path[..end].to_string());
            end += 1;
        }

        self.files.insert(path, content.into());
    }

    /// Returns the number of files in the archive.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the archive holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn is_below(path: &str, root: &str) -> bool {
        root.is_empty()
            || path == root
            || (path.starts_with(root) && path.as_bytes().get(root.len()) == Some(&b'/'))
    }
}

/// Orders paths the way a depth-first walk visits them: component by component.
fn walk_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.split('/').cmp(b.split('/'))
}

impl FileSystem for EmbeddedFileSystem {
    fn walk<'a>(&'a self, root: &str) -> Walk<'a> {
        let display_root = root.to_string();
        let root = normalize(root);

        if !self.dirs.contains(&root) && !self.files.contains_key(&root) {
            let err = RenderError::traversal(
                display_root,
                io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            );
            return Box::new(std::iter::once(Err(err)));
        }

        let mut nodes: Vec<(&str, bool)> = self
            .dirs
            .iter()
            .map(|d| (d.as_str(), true))
            .chain(self.files.keys().map(|f| (f.as_str(), false)))
            .filter(|(path, _)| Self::is_below(path, &root))
            .collect();
        nodes.sort_by(|a, b| walk_order(a.0, b.0));

        let entries = nodes.into_iter().map(move |(path, is_dir)| {
            let relative = if root.is_empty() {
                path
            } else {
                path[root.len()..].trim_start_matches('/')
            };
            Ok(WalkEntry {
                path: join(&display_root, relative),
                is_dir,
            })
        });

        Box::new(entries)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, RenderError> {
        let key = normalize(path);
        let content = match self.files.get(&key) {
            Some(content) => content,
            None if self.dirs.contains(&key) => {
                return Err(RenderError::traversal(
                    path,
                    io::Error::new(io::ErrorKind::Other, "is a directory"),
                ))
            }
            None => {
                return Err(RenderError::traversal(
                    path,
                    io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
                ))
            }
        };

        let mut reader: &[u8] = content;
        let mut buf = Vec::with_capacity(content.len());
        reader
            .read_to_end(&mut buf)
            .map_err(|e| RenderError::traversal(path, e))?;
        Ok(buf)
    }
}
