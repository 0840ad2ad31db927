//! Configuration loading and discovery for `stylescope.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::StyleConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "stylescope.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse stylescope.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override source directory
    pub src: Option<PathBuf>,
    /// Override output directories
    pub out: Option<Vec<PathBuf>>,
    /// Override the naming template
    pub scoped_name: Option<String>,
    /// Override the class-name prefix
    pub class_name_prefix: Option<String>,
    /// Override import emission
    pub import_css: Option<bool>,
    /// Override the deferred-path prefix
    pub magic_path_prefix: Option<String>,
}

/// Find `stylescope.toml` by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find `stylescope.toml` by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<StyleConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    let config: StyleConfig = toml::from_str(&text)?;

    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ConfigError::Validation(problems));
    }
    Ok(config)
}

/// Apply CLI overrides on top of a loaded configuration.
pub fn merge_cli_overrides(config: &mut StyleConfig, overrides: &CliOverrides) {
    if let Some(src) = &overrides.src {
        config.project.src = src.clone();
    }
    if let Some(out) = &overrides.out {
        if !out.is_empty() {
            config.project.out = out.clone();
        }
    }
    if let Some(scoped_name) = &overrides.scoped_name {
        config.naming.scoped_name = scoped_name.clone();
    }
    if let Some(prefix) = &overrides.class_name_prefix {
        config.naming.class_name_prefix = prefix.clone();
    }
    if let Some(import_css) = overrides.import_css {
        config.naming.import_css = import_css;
    }
    if let Some(magic_path_prefix) = &overrides.magic_path_prefix {
        config.naming.magic_path_prefix = magic_path_prefix.clone();
    }
}

/// Starter configuration written by `stylescope init`.
pub fn starter_config(name: &str) -> String {
    format!(
        r#"[project]
name = "{}"
src = "src/styles"
out = ["dist"]

[naming]
scoped_name = "[local]_[hash:base64:6]"
class_name_prefix = ""
import_css = true
magic_path_prefix = "."

[filter]
include = []
exclude = []

[sass]
load_paths = []

[watch]
debounce_ms = 200
"#,
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "[project]\nname = \"x\"\n").unwrap();

        let found = find_config_from(nested).unwrap();
        assert_eq!(found, temp.path().join(CONFIG_FILE));
    }

    #[test]
    fn test_find_config_missing() {
        let temp = TempDir::new().unwrap();
        // Walking up from a tempdir without a config may still find one in
        // an ancestor, but never inside the tempdir itself.
        if let Some(found) = find_config_from(temp.path().to_path_buf()) {
            assert!(!found.starts_with(temp.path()));
        }
    }

    #[test]
    fn test_load_config_validates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[project]\nname = \"\"\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_config_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "not toml at all [").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = super::super::schema::default_config();
        let overrides = CliOverrides {
            src: Some(PathBuf::from("styles")),
            out: Some(vec![PathBuf::from("build"), PathBuf::from("build-esm")]),
            scoped_name: Some("[local]".to_string()),
            import_css: Some(false),
            ..CliOverrides::default()
        };
        merge_cli_overrides(&mut config, &overrides);

        assert_eq!(config.project.src, PathBuf::from("styles"));
        assert_eq!(config.project.out.len(), 2);
        assert_eq!(config.naming.scoped_name, "[local]");
        assert!(!config.naming.import_css);
    }

    #[test]
    fn test_starter_config_parses() {
        let text = starter_config("my-lib");
        let config: StyleConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.project.name, "my-lib");
        assert!(config.validate().is_empty());
    }
}
