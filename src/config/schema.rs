//! Configuration schema types for `stylescope.toml`
//!
//! Defines the structure and validation rules for stylescope project
//! configuration.

use crate::preprocess::SassOptions;
use crate::resolve::MagicPathResolver;
use crate::template::DEFAULT_SCOPED_NAME;
use crate::transform::StyleOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Source directory for style files
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Output directories; every one receives assets and stubs and is swept
    /// by the closing pass
    #[serde(default = "default_out")]
    pub out: Vec<PathBuf>,
}

fn default_src() -> PathBuf {
    PathBuf::from("src/styles")
}

fn default_out() -> Vec<PathBuf> {
    vec![PathBuf::from("dist")]
}

/// Class-naming section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Naming template for scoped class names
    #[serde(default = "default_scoped_name")]
    pub scoped_name: String,
    /// Prefix prepended to every generated class name
    #[serde(default)]
    pub class_name_prefix: String,
    /// Whether stubs import their CSS asset
    #[serde(default = "default_true")]
    pub import_css: bool,
    /// Replacement prefix for the deferred import path. The literal `auto`
    /// selects per-file relative resolution instead of a fixed prefix.
    #[serde(default = "default_magic_path_prefix")]
    pub magic_path_prefix: String,
}

fn default_scoped_name() -> String {
    DEFAULT_SCOPED_NAME.to_string()
}

fn default_true() -> bool {
    true
}

fn default_magic_path_prefix() -> String {
    ".".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            scoped_name: default_scoped_name(),
            class_name_prefix: String::new(),
            import_css: true,
            magic_path_prefix: default_magic_path_prefix(),
        }
    }
}

/// Include/exclude section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Include glob patterns; empty means every loader-claimed file
    #[serde(default)]
    pub include: Vec<String>,
    /// Exclude glob patterns
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Watch mode section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce window for file-change events
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

/// Root configuration for a stylescope project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Project metadata
    pub project: ProjectConfig,
    /// Class-naming options
    #[serde(default)]
    pub naming: NamingConfig,
    /// Include/exclude filter
    #[serde(default)]
    pub filter: FilterConfig,
    /// Sass loader options
    #[serde(default)]
    pub sass: SassOptions,
    /// Watch mode options
    #[serde(default)]
    pub watch: WatchConfig,
}

impl StyleConfig {
    /// Validate the configuration, returning every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.project.name.trim().is_empty() {
            problems.push("project.name must not be empty".to_string());
        }
        if self.project.out.is_empty() {
            problems.push("project.out must list at least one output directory".to_string());
        }
        if self.naming.scoped_name.trim().is_empty() {
            problems.push("naming.scoped_name must not be empty".to_string());
        }
        problems
    }

    /// Transform options derived from this configuration.
    pub fn style_options(&self) -> StyleOptions {
        StyleOptions {
            include: self.filter.include.clone(),
            exclude: self.filter.exclude.clone(),
            scoped_name: self.naming.scoped_name.clone(),
            class_name_prefix: self.naming.class_name_prefix.clone(),
            import_css: self.naming.import_css,
            sass: self.sass.clone(),
            ..StyleOptions::default()
        }
    }

    /// Placeholder resolver derived from this configuration.
    pub fn resolver(&self) -> MagicPathResolver {
        if self.naming.magic_path_prefix == "auto" {
            MagicPathResolver::RelativeToOutputRoot
        } else {
            MagicPathResolver::Prefix(self.naming.magic_path_prefix.clone())
        }
    }
}

/// A default configuration, used when no `stylescope.toml` exists.
pub fn default_config() -> StyleConfig {
    StyleConfig {
        project: ProjectConfig {
            name: "styles".to_string(),
            src: default_src(),
            out: default_out(),
        },
        naming: NamingConfig::default(),
        filter: FilterConfig::default(),
        sass: SassOptions::default(),
        watch: WatchConfig::default(),
    }
}
