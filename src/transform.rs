//! Per-file style transform
//!
//! Orchestrates one input file through preprocess, scope, and emission:
//! the rewritten CSS becomes a build asset, and the file's program role is
//! replaced by a stub that imports the asset through the deferred-path
//! sentinel and default-exports the class-name mapping.

use crate::filter::PathFilter;
use crate::modules::{scope_stylesheet, ModulesError};
use crate::preprocess::{normalize_path, LoaderRegistry, PreprocessError, SassOptions};
use crate::resolve::MAGIC_PATH;
use crate::scope::{ClassMapping, ScopedNameGenerator};
use crate::session::BuildSession;
use crate::template::DEFAULT_SCOPED_NAME;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Hook overriding the computed asset name (the logical CSS path).
pub type AssetPathHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Hook overriding the import specifier injected into the stub. When set,
/// the stub imports the hook's result directly instead of going through the
/// sentinel protocol.
pub type StubImportHook = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Transform configuration, the plugin-options analog.
#[derive(Clone)]
pub struct StyleOptions {
    /// Include glob patterns; empty means every loader-claimed file
    pub include: Vec<String>,
    /// Exclude glob patterns; exclusions always win
    pub exclude: Vec<String>,
    /// Naming template for scoped class names
    pub scoped_name: String,
    /// Prefix prepended to every generated (non-global) class name
    pub class_name_prefix: String,
    /// Whether stubs import their CSS asset (default true)
    pub import_css: bool,
    /// Options for the built-in Sass loader
    pub sass: SassOptions,
    /// Custom logical CSS path per file
    pub asset_path: Option<AssetPathHook>,
    /// Custom injected-import specifier per file
    pub import_path: Option<StubImportHook>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            scoped_name: DEFAULT_SCOPED_NAME.to_string(),
            class_name_prefix: String::new(),
            import_css: true,
            sass: SassOptions::default(),
            asset_path: None,
            import_path: None,
        }
    }
}

/// Error during a per-file transform. All variants abort the build.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransformError {
    /// Invalid include/exclude pattern
    #[error("Invalid include/exclude pattern: {0}")]
    Filter(#[from] glob::PatternError),
    /// Preprocessor failure
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    /// Scoping failure
    #[error(transparent)]
    Modules(#[from] ModulesError),
    /// Class mapping failed to serialize
    #[error("Failed to serialize class mapping: {0}")]
    Mapping(#[from] serde_json::Error),
}

/// A build asset produced by one transform. Immutable once created; the
/// host owns it after emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    /// Relative, slash-normalized on-disk name (no leading slash)
    pub file_name: String,
    /// Rewritten style text
    pub source: String,
}

/// Everything one transform hands back to the host.
#[derive(Debug)]
pub struct TransformOutput {
    /// Program-file replacement text (the module stub)
    pub code: String,
    /// The CSS asset to emit
    pub asset: EmittedAsset,
    /// Original name to generated name, discovery order
    pub mapping: ClassMapping,
    /// Extra files the host should watch
    pub dependencies: Vec<PathBuf>,
    /// Non-fatal scoping warnings for the host to log
    pub warnings: Vec<String>,
}

/// Compiled transform: filter, loader registry, and naming capability built
/// once, applied to many files concurrently (`&self` only).
pub struct StyleTransformer {
    options: StyleOptions,
    filter: PathFilter,
    registry: LoaderRegistry,
    namer: ScopedNameGenerator,
}

impl StyleTransformer {
    /// Compile a transformer from options.
    pub fn new(options: StyleOptions) -> Result<Self, TransformError> {
        let filter = PathFilter::new(&options.include, &options.exclude)?;
        let registry = LoaderRegistry::with_defaults(options.sass.clone());
        let namer =
            ScopedNameGenerator::new(options.scoped_name.clone(), options.class_name_prefix.clone());
        Ok(Self { options, filter, registry, namer })
    }

    /// Registry access for caller-registered loaders.
    pub fn registry_mut(&mut self) -> &mut LoaderRegistry {
        &mut self.registry
    }

    /// Whether a path would be transformed at all.
    pub fn claims(&self, path: &Path) -> bool {
        self.filter.matches(path) && self.registry.matches(path)
    }

    /// Transform one style file.
    ///
    /// Returns `Ok(None)` when the file is filtered out or no loader claims
    /// it - the host leaves such files alone. Records the emitted asset
    /// name in the session; recording is deduplicated, so a re-transform on
    /// rebuild overwrites rather than duplicates.
    pub fn transform(
        &self,
        source: &Path,
        code: &str,
        project_root: &Path,
        session: &BuildSession,
    ) -> Result<Option<TransformOutput>, TransformError> {
        if !self.filter.matches(source) {
            return Ok(None);
        }
        let Some(loader) = self.registry.find(source) else {
            return Ok(None);
        };

        let css = loader.process(source, code)?;
        let scoped = scope_stylesheet(&css, source, &self.namer)?;

        let asset_name = self.asset_name(source, project_root, loader.pattern());
        let mut stub = String::new();
        if self.options.import_css {
            let specifier = match &self.options.import_path {
                Some(hook) => hook(&asset_name),
                None => format!("{}/{}", MAGIC_PATH, asset_name),
            };
            stub.push_str(&format!("import \"{}\";\n", specifier));
        }
        stub.push_str("export default ");
        stub.push_str(&serde_json::to_string(&scoped.mapping)?);
        stub.push_str(";\n");

        session.record_asset(asset_name.clone());

        Ok(Some(TransformOutput {
            code: stub,
            asset: EmittedAsset { file_name: asset_name, source: scoped.css },
            mapping: scoped.mapping,
            dependencies: scoped.dependencies,
            warnings: scoped.warnings,
        }))
    }

    /// Compute the asset's on-disk name: the project-relative source path,
    /// slash-normalized, leading separators stripped, style extension
    /// swapped for `.css`.
    fn asset_name(&self, source: &Path, project_root: &Path, pattern: &Regex) -> String {
        let rel = source.strip_prefix(project_root).unwrap_or(source);
        let normalized = normalize_path(rel);
        let trimmed = normalized.trim_start_matches('/');
        let swapped = pattern.replace(trimmed, ".css").into_owned();
        match &self.options.asset_path {
            Some(hook) => hook(&swapped),
            None => swapped,
        }
    }
}
