//! Class-name scoping policy
//!
//! Decides, per style file and per class, whether a class keeps its original
//! name (global styles, vendored styles) or receives a generated scoped name
//! from the template engine, and guarantees the result is a legal CSS
//! identifier.

use crate::template::render_scoped_name;
use indexmap::IndexMap;
use std::path::Path;

/// Style file extensions that participate in the `*.global.<ext>` convention.
const GLOBAL_EXTENSIONS: [&str; 5] = ["css", "scss", "sass", "less", "stylus"];

/// Directory name marking third-party dependency trees.
const VENDOR_DIR: &str = "node_modules";

/// Per-file class-name mapping, original name to generated name.
///
/// Iteration order is the order classes were first discovered in the style
/// source; the serialized stub preserves it.
pub type ClassMapping = IndexMap<String, String>;

/// Whether a style file is exempt from class-name scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// File name matches the `*.global.<ext>` convention
    pub is_global: bool,
    /// Path lies under a third-party dependency tree
    pub is_vendored: bool,
}

impl Classification {
    /// Whether classes in this file keep their original names.
    pub fn keeps_original_names(&self) -> bool {
        self.is_global || self.is_vendored
    }
}

/// Classify a style file path.
///
/// Global styles are detected by file-name suffix (`styles.global.css`),
/// vendored styles by a `node_modules` path segment anywhere in the path.
pub fn classify(path: &Path) -> Classification {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let is_global = GLOBAL_EXTENSIONS
        .iter()
        .any(|ext| file_name.ends_with(&format!(".global.{}", ext)));

    let is_vendored = path
        .components()
        .any(|component| component.as_os_str() == VENDOR_DIR);

    Classification { is_global, is_vendored }
}

/// Make a generated name a syntactically legal CSS identifier.
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`; a leading digit gets
/// a `_` prepended. Total - never fails, for any input.
pub fn sanitize_class_name(raw: &str) -> String {
    let mut sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();

    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }
    sanitized
}

/// The naming capability handed to the scoping transformer.
///
/// Bundles classification and template rendering behind one object so the
/// transformer never captures build-wide state.
#[derive(Debug, Clone)]
pub struct ScopedNameGenerator {
    template: String,
    prefix: String,
}

impl ScopedNameGenerator {
    /// Create a generator from a naming template and an optional prefix.
    pub fn new(template: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self { template: template.into(), prefix: prefix.into() }
    }

    /// The naming template in use.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Compute the emitted name for one class.
    ///
    /// Classes in global or vendored files are never renamed - external
    /// consumers may depend on those selectors verbatim. Everything else
    /// gets `prefix + sanitize(render(template, local, content))`.
    pub fn scoped_name(&self, path: &Path, local: &str, content: &[u8]) -> String {
        if classify(path).keeps_original_names() {
            return local.to_string();
        }
        let rendered = render_scoped_name(&self.template, local, content);
        format!("{}{}", self.prefix, sanitize_class_name(&rendered))
    }
}
