//! Template compilation: walk a root, match extensions, derive names, parse.

use tracing::{debug, trace};

use super::set::TemplateSet;
use crate::error::RenderError;
use crate::fs::{normalize, FileSystem};
use crate::options::Options;

/// Finds the configured extension `relative` ends in.
///
/// Candidate suffixes start at a dot, tried left to right, so the longest
/// configured suffix wins: with `[".tmpl", ".html.tmpl"]` the file
/// `page.html.tmpl` matches `.html.tmpl` and is named `page`. A dot in a
/// directory name does not stop a file below it from matching its own suffix.
///
/// This is neither "everything after the first dot" (which would reject
/// `dedicated.tmpl/notbad.tmpl`) nor "the final suffix only" (which would
/// name `page.html.tmpl` as `page.html` under the list above). The two agree
/// with it whenever the path holds a single dot.
pub(crate) fn match_extension<'a, S: AsRef<str>>(
    relative: &'a str,
    extensions: &[S],
) -> Option<&'a str> {
    relative
        .match_indices('.')
        .map(|(at, _)| &relative[at..])
        .find(|suffix| extensions.iter().any(|ext| ext.as_ref() == *suffix))
}

/// Strips the walk root from `path`. `None` for the root itself.
fn relative_to<'a>(root: &str, path: &'a str) -> Option<&'a str> {
    if root.is_empty() {
        return (!path.is_empty()).then_some(path);
    }
    path.strip_prefix(root)?
        .strip_prefix('/')
        .filter(|rest| !rest.is_empty())
}

/// Derives a unit name from a path relative to the root.
///
/// The name is the relative path minus its matched extension, with forward
/// slashes: `admin/index.tmpl` becomes `admin/index`. Returns `None` for
/// files that do not carry a configured extension.
pub fn template_name<'a, S: AsRef<str>>(relative: &'a str, extensions: &[S]) -> Option<&'a str> {
    let ext = match_extension(relative, extensions)?;
    let name = &relative[..relative.len() - ext.len()];
    (!name.is_empty()).then_some(name)
}

/// Builds a fresh template set from `options.directory` on `fs`.
///
/// Helper bundles are attached before any unit is parsed. Files without a
/// configured extension are ignored. The first traversal, read or parse
/// failure aborts compilation; no partial set is ever returned.
pub fn compile(options: &Options, fs: &dyn FileSystem) -> Result<TemplateSet, RenderError> {
    debug!(root = %options.directory, "compiling templates");
    let root = normalize(&options.directory);
    let mut set = TemplateSet::new(options.directory.clone(), &options.delims)?;
    for bundle in &options.funcs {
        set.apply(bundle);
    }

    for entry in fs.walk(&options.directory) {
        let entry = entry?;
        if entry.is_dir {
            continue;
        }

        let path = normalize(&entry.path);
        let Some(relative) = relative_to(&root, &path) else {
            continue;
        };
        let Some(name) = template_name(relative, &options.extensions) else {
            trace!(path = %entry.path, "skipping file without template extension");
            continue;
        };

        let bytes = fs.read_file(&entry.path)?;
        let source = String::from_utf8(bytes).map_err(|e| RenderError::Parse {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        trace!(name, path = %entry.path, "parsing template");
        set.add(name, source)?;
    }

    debug!(
        root = %options.directory,
        templates = set.len(),
        "compiled template set"
    );
    Ok(set)
}
