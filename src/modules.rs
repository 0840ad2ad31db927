//! CSS Modules scoping transformer
//!
//! Walks a parsed stylesheet with the lightningcss visitor API, rewrites
//! every class selector through the [`ScopedNameGenerator`] capability, and
//! accumulates the per-file name mapping in discovery order. `@import`
//! specifiers are collected as file dependencies so watch mode can track
//! them.

use crate::scope::{ClassMapping, ScopedNameGenerator};
use lightningcss::rules::CssRule;
use lightningcss::selector::{Component, Selector};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::values::ident::Ident;
use lightningcss::visit_types;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Error during stylesheet scoping.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModulesError {
    /// Stylesheet failed to parse beyond what error recovery tolerates
    #[error("Failed to parse stylesheet: {0}")]
    Parse(String),
    /// Rewritten stylesheet failed to serialize
    #[error("Failed to serialize stylesheet: {0}")]
    Print(String),
}

/// Result of scoping one stylesheet.
#[derive(Debug)]
pub struct ScopeResult {
    /// Rewritten style text with scoped class selectors
    pub css: String,
    /// Original name to generated name, in discovery order
    pub mapping: ClassMapping,
    /// Files referenced via `@import`, resolved against the source dir
    pub dependencies: Vec<PathBuf>,
    /// Parser warnings (duplicate selectors and the like) - never fatal
    pub warnings: Vec<String>,
}

/// Rewrite every class selector in `css` through the naming capability.
///
/// The mapping records each class once, keyed by its original name, in the
/// order of first occurrence in the source. Classes the generator leaves
/// unchanged (global and vendored files) still appear in the mapping so the
/// emitted stub always exports a complete lookup table.
pub fn scope_stylesheet(
    css: &str,
    path: &Path,
    namer: &ScopedNameGenerator,
) -> Result<ScopeResult, ModulesError> {
    let warnings_store = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        filename: path.display().to_string(),
        error_recovery: true,
        warnings: Some(warnings_store.clone()),
        ..ParserOptions::default()
    };

    let mut stylesheet =
        StyleSheet::parse(css, options).map_err(|e| ModulesError::Parse(e.to_string()))?;

    let mut renamer = ClassRenamer {
        namer,
        path,
        content: css.as_bytes(),
        mapping: ClassMapping::new(),
        dependencies: Vec::new(),
    };
    stylesheet.visit(&mut renamer)?;

    let output = stylesheet
        .to_css(PrinterOptions { minify: false, ..PrinterOptions::default() })
        .map_err(|e| ModulesError::Print(e.to_string()))?;

    let warnings = warnings_store
        .read()
        .map(|entries| entries.iter().map(|w| w.to_string()).collect())
        .unwrap_or_default();

    Ok(ScopeResult {
        css: output.code,
        mapping: renamer.mapping,
        dependencies: renamer.dependencies,
        warnings,
    })
}

/// Selector visitor carrying the naming capability and the growing mapping.
struct ClassRenamer<'a> {
    namer: &'a ScopedNameGenerator,
    path: &'a Path,
    content: &'a [u8],
    mapping: ClassMapping,
    dependencies: Vec<PathBuf>,
}

impl<'a> ClassRenamer<'a> {
    /// Resolve the emitted name for a class, recording it on first sight.
    ///
    /// Returns `None` when the name is already a generated one (a selector
    /// reached twice through nested visiting must not be renamed again).
    fn resolve_class(&mut self, original: &str) -> Option<String> {
        if let Some(generated) = self.mapping.get(original) {
            return Some(generated.clone());
        }
        if self.mapping.values().any(|generated| generated == original) {
            return None;
        }
        let generated = self.namer.scoped_name(self.path, original, self.content);
        self.mapping.insert(original.to_string(), generated.clone());
        Some(generated)
    }

    fn rename_in_selector<'i>(&mut self, selector: &mut Selector<'i>) {
        for component in selector.iter_mut_raw_match_order() {
            match component {
                Component::Class(class) => {
                    let original = class.0.to_string();
                    if let Some(renamed) = self.resolve_class(&original) {
                        if renamed != original {
                            *class = Ident(renamed.into());
                        }
                    }
                }
                Component::Negation(inner) | Component::Is(inner) | Component::Where(inner) => {
                    for nested in inner.iter_mut() {
                        self.rename_in_selector(nested);
                    }
                }
                _ => {}
            }
        }
    }

    fn record_dependency(&mut self, specifier: &str) {
        let is_remote = specifier.starts_with("http://")
            || specifier.starts_with("https://")
            || specifier.starts_with("//")
            || specifier.starts_with("data:");
        if is_remote || specifier.is_empty() {
            return;
        }
        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        self.dependencies.push(base.join(specifier));
    }
}

impl<'a, 'i> Visitor<'i> for ClassRenamer<'a> {
    type Error = ModulesError;
    fn visit_types(&self) -> VisitTypes {
        visit_types!(SELECTORS | RULES)
    }

    fn visit_selector(&mut self, selector: &mut Selector<'i>) -> Result<(), Self::Error> {
        self.rename_in_selector(selector);
        Ok(())
    }

    fn visit_rule(&mut self, rule: &mut CssRule<'i>) -> Result<(), Self::Error> {
        if let CssRule::Import(import) = rule {
            let specifier = import.url.to_string();
            self.record_dependency(&specifier);
        }
        rule.visit_children(self)
    }
}
