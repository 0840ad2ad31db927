//! Style preprocessor loaders
//!
//! A registry of `{extension pattern, process}` loaders turns raw style
//! sources into plain CSS before scoping. Built-in loaders cover Sass/SCSS
//! (compiled with grass) and plain CSS (identity); callers can register
//! their own loaders, which take precedence over the built-ins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during preprocessing. Fatal for the whole build - a style file
/// that fails to compile never produces partial output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreprocessError {
    /// Sass/SCSS compilation failure
    #[error("Sass compilation failed for {path}: {message}")]
    Sass { path: String, message: String },
    /// Failure reported by a caller-registered loader
    #[error("Loader '{loader}' failed for {path}: {message}")]
    Loader { loader: String, path: String, message: String },
}

/// Options forwarded to the Sass built-in loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SassOptions {
    /// Extra directories searched when resolving `@import`/`@use`
    #[serde(default)]
    pub load_paths: Vec<PathBuf>,
}

/// A style-sheet dialect loader.
///
/// `pattern` decides which files the loader claims; `process` turns the
/// source text into plain CSS.
pub trait Preprocess: Send + Sync {
    /// Loader name, used in error messages.
    fn name(&self) -> &str;

    /// Extension pattern matched against the slash-normalized path.
    fn pattern(&self) -> &Regex;

    /// Compile `code` (the content of `path`) into plain CSS.
    fn process(&self, path: &Path, code: &str) -> Result<String, PreprocessError>;

    /// Whether this loader claims the given path.
    fn matches(&self, path: &Path) -> bool {
        self.pattern().is_match(&normalize_path(path))
    }
}

/// Normalize a path to forward slashes for pattern matching.
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Built-in Sass/SCSS loader backed by the grass compiler.
pub struct SassLoader {
    pattern: Regex,
    options: SassOptions,
}

impl SassLoader {
    /// Create a Sass loader with the given options.
    pub fn new(options: SassOptions) -> Self {
        Self { pattern: Regex::new(r"\.(sass|scss)$").expect("valid sass pattern"), options }
    }
}

impl Preprocess for SassLoader {
    fn name(&self) -> &str {
        "sass"
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn process(&self, path: &Path, code: &str) -> Result<String, PreprocessError> {
        let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
        if path.extension().and_then(|e| e.to_str()) == Some("sass") {
            options = options.input_syntax(grass::InputSyntax::Sass);
        }
        // The file's own directory resolves relative imports; configured
        // load paths come after it.
        if let Some(parent) = path.parent() {
            options = options.load_path(parent);
        }
        for load_path in &self.options.load_paths {
            options = options.load_path(load_path);
        }

        grass::from_string(code.to_string(), &options).map_err(|e| PreprocessError::Sass {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Built-in identity loader for plain CSS files.
pub struct CssLoader {
    pattern: Regex,
}

impl CssLoader {
    /// Create the CSS pass-through loader.
    pub fn new() -> Self {
        Self { pattern: Regex::new(r"\.css$").expect("valid css pattern") }
    }
}

impl Default for CssLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocess for CssLoader {
    fn name(&self) -> &str {
        "css"
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn process(&self, _path: &Path, code: &str) -> Result<String, PreprocessError> {
        Ok(code.to_string())
    }
}

/// Ordered loader registry. First match wins; caller-registered loaders are
/// consulted before the built-ins.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn Preprocess>>,
}

impl LoaderRegistry {
    /// Registry with only the built-in loaders.
    pub fn with_defaults(sass: SassOptions) -> Self {
        Self { loaders: vec![Box::new(SassLoader::new(sass)), Box::new(CssLoader::new())] }
    }

    /// Register a caller loader ahead of everything already present.
    pub fn register(&mut self, loader: Box<dyn Preprocess>) {
        self.loaders.insert(0, loader);
    }

    /// Find the loader claiming `path`, if any.
    pub fn find(&self, path: &Path) -> Option<&dyn Preprocess> {
        self.loaders.iter().find(|loader| loader.matches(path)).map(|boxed| boxed.as_ref())
    }

    /// Whether any registered loader claims `path`.
    pub fn matches(&self, path: &Path) -> bool {
        self.find(path).is_some()
    }
}
