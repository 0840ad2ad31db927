//! Deferred import-path resolution
//!
//! At transform time the final layout of the build output is unknown, so
//! emitted program stubs import their CSS through a sentinel token instead
//! of a real path. After the whole build completes, a single closing pass
//! sweeps every output program file and rewrites each sentinel occurrence
//! into a concrete path. The replacement never contains the sentinel
//! itself, so one pass leaves nothing behind and a second pass is a no-op.
//!
//! A build that halts before the closing pass leaves unresolved sentinels
//! in its output; such a program is not loadable. That condition is
//! user-visible by design, not silently recovered.

use crate::session::BuildSession;
use glob::glob;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Sentinel standing in for the not-yet-known path prefix.
///
/// Long, namespaced, and regex-hostile on purpose: it must never occur in
/// legitimate source text.
pub const MAGIC_PATH: &str = "@@_MAGIC_PATH_@@";

/// Output program file extensions swept by the closing pass.
const PROGRAM_EXTENSIONS: [&str; 3] = ["js", "mjs", "cjs"];

/// Per-file hook: receives the logical CSS path that followed the sentinel
/// and the program file being rewritten, returns the full import specifier.
pub type ImportPathHook = Arc<dyn Fn(&str, &Path) -> String + Send + Sync>;

/// How sentinel occurrences are rewritten.
#[derive(Clone)]
pub enum MagicPathResolver {
    /// Replace every sentinel with a fixed prefix. The default `"."` makes
    /// imports relative to the importing file's own directory, which suits
    /// flattened bundle layouts.
    Prefix(String),
    /// Replace the sentinel with the `../` chain from the rewritten file's
    /// directory up to its output root, so tree-preserving layouts resolve
    /// correctly too.
    RelativeToOutputRoot,
    /// Delegate to a caller hook per occurrence.
    WithPath(ImportPathHook),
}

impl Default for MagicPathResolver {
    fn default() -> Self {
        MagicPathResolver::Prefix(".".to_string())
    }
}

impl fmt::Debug for MagicPathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MagicPathResolver::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            MagicPathResolver::RelativeToOutputRoot => write!(f, "RelativeToOutputRoot"),
            MagicPathResolver::WithPath(_) => write!(f, "WithPath(..)"),
        }
    }
}

/// Error during the closing pass. Fatal: a partial rewrite would leave
/// unresolved sentinels behind.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// Output directory produced an invalid glob pattern
    #[error("Invalid output glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// Enumeration of output files failed
    #[error("Failed to enumerate output files: {0}")]
    Glob(#[from] glob::GlobError),
    /// Reading or writing an output file failed
    #[error("Failed to rewrite {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

/// Counters reported by the closing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Output program files read and written back
    pub files_scanned: usize,
    /// Of those, files that contained at least one sentinel
    pub files_rewritten: usize,
}

/// Whether a host build warning is about the sentinel import.
///
/// Hosts that warn on unresolved imports must suppress exactly the messages
/// containing the sentinel, and only those.
pub fn is_magic_path_warning(message: &str) -> bool {
    message.contains(MAGIC_PATH)
}

/// Rewrite every sentinel occurrence with the default `"."` prefix.
pub fn replace_magic_path(content: &str) -> String {
    content.replace(MAGIC_PATH, ".")
}

/// Rewrite every sentinel occurrence in one file's content.
///
/// `file` is the program file the content came from; `out_root` is the
/// output directory it was enumerated under (used by the relative mode).
pub fn resolve_content(
    content: &str,
    resolver: &MagicPathResolver,
    file: &Path,
    out_root: &Path,
) -> String {
    match resolver {
        MagicPathResolver::Prefix(prefix) => content.replace(MAGIC_PATH, prefix),
        MagicPathResolver::RelativeToOutputRoot => {
            content.replace(MAGIC_PATH, &relative_prefix(file, out_root))
        }
        MagicPathResolver::WithPath(hook) => resolve_with_hook(content, hook.as_ref(), file),
    }
}

/// The `../` chain from `file`'s directory up to `out_root`.
fn relative_prefix(file: &Path, out_root: &Path) -> String {
    let depth = file
        .parent()
        .and_then(|parent| parent.strip_prefix(out_root).ok())
        .map(|rel| rel.components().count())
        .unwrap_or(0);
    if depth == 0 {
        ".".to_string()
    } else {
        vec![".."; depth].join("/")
    }
}

/// Hook-based rewriting: each sentinel occurrence is replaced together with
/// the logical CSS path that follows it (up to the import string's closing
/// quote) by whatever the hook returns.
fn resolve_with_hook(content: &str, hook: &(dyn Fn(&str, &Path) -> String + Send + Sync), file: &Path) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(pos) = rest.find(MAGIC_PATH) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + MAGIC_PATH.len()..];
        let after = after.strip_prefix('/').unwrap_or(after);
        let end = after.find(&['"', '\'', '`'][..]).unwrap_or(after.len());
        out.push_str(&hook(&after[..end], file));
        rest = &after[end..];
    }
    out.push_str(rest);
    out
}

/// The closing pass.
///
/// Must run exactly once, only after every per-file transform and all
/// output writing have completed - it needs visibility into the full output
/// tree. Enumerates every program file under every declared output
/// directory (deduplicated across overlapping directories, so no file is
/// rewritten twice), rewrites sentinels, and writes each file back whole.
/// Files without sentinels are rewritten with identical content.
pub fn resolve_output_files(
    session: &BuildSession,
    resolver: &MagicPathResolver,
) -> Result<ResolveStats, ResolveError> {
    let mut files: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut seen = HashSet::new();

    for dir in session.output_dirs() {
        for ext in PROGRAM_EXTENSIONS {
            let pattern = format!("{}/**/*.{}", dir.display(), ext);
            for entry in glob(&pattern)? {
                let path = entry?;
                if path.is_file() && seen.insert(path.clone()) {
                    files.push((path, dir.clone()));
                }
            }
        }
    }

    let rewritten: Vec<bool> = files
        .par_iter()
        .map(|(path, out_root)| rewrite_file(path, out_root, resolver))
        .collect::<Result<_, _>>()?;

    Ok(ResolveStats {
        files_scanned: rewritten.len(),
        files_rewritten: rewritten.iter().filter(|had_sentinel| **had_sentinel).count(),
    })
}

fn rewrite_file(
    path: &Path,
    out_root: &Path,
    resolver: &MagicPathResolver,
) -> Result<bool, ResolveError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ResolveError::Io { path: path.to_path_buf(), source })?;
    let had_sentinel = content.contains(MAGIC_PATH);
    let resolved = resolve_content(&content, resolver, path, out_root);
    std::fs::write(path, resolved)
        .map_err(|source| ResolveError::Io { path: path.to_path_buf(), source })?;
    Ok(had_sentinel)
}
