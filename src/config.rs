//! Resolver configuration: environment variable names and the baseline context.

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::context::ResolutionContext;
use crate::pathmap::PathmapTable;

const DEFAULT_CONFIG_FILE: &str = "pathmap_resolver.config.json";

/// Variable holding the default search-path list.
pub const DEFAULT_SEARCH_PATH_VARIABLE: &str = "PXR_AR_DEFAULT_SEARCH_PATH";
/// Variable naming which variable holds the default pathmap text.
pub const PATHMAP_SELECTOR_VARIABLE: &str = "AR_PATHMAP_ENVIRONMENT";
/// Variable holding the pathmap text when the selector is unset.
pub const DEFAULT_PATHMAP_VARIABLE: &str = "HOUDINI_PATHMAP";

/// Source of environment variables.
///
/// Lookups return `Ok(None)` for unset variables and the raw value as the error when it is
/// not valid UTF-8.
pub trait Environment: Send + Sync {
  /// Read the variable called `name`.
  fn var(&self, name: &str) -> Result<Option<String>, OsString>;
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
  fn var(&self, name: &str) -> Result<Option<String>, OsString> {
    match env::var(name) {
      Ok(value) => Ok(Some(value)),
      Err(env::VarError::NotPresent) => Ok(None),
      Err(env::VarError::NotUnicode(raw)) => Err(raw),
    }
  }
}

/// Fixed set of variables, used where the process environment must not be touched.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
  vars: HashMap<String, String>,
}

impl MapEnvironment {
  /// Create an empty environment.
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style variable assignment.
  pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.vars.insert(name.into(), value.into());
    self
  }
}

impl Environment for MapEnvironment {
  fn var(&self, name: &str) -> Result<Option<String>, OsString> {
    Ok(self.vars.get(name).cloned())
  }
}

impl<K, V> FromIterator<(K, V)> for MapEnvironment
where
  K: Into<String>,
  V: Into<String>,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      vars: iter
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect(),
    }
  }
}

/// Discoverable configuration for the resolver and its default-context registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
  /// Variable holding the default search-path list.
  pub search_path_variable: String,
  /// Variable whose value names the variable holding the default pathmap.
  pub pathmap_selector_variable: String,
  /// Pathmap variable used when the selector variable is unset or empty.
  pub default_pathmap_variable: String,
  /// Search paths of the resolver's baseline context.
  pub baseline_search_paths: Vec<String>,
  /// Pathmap text of the resolver's baseline context.
  pub baseline_pathmap: String,
}

impl Default for ResolverConfig {
  fn default() -> Self {
    Self {
      search_path_variable: DEFAULT_SEARCH_PATH_VARIABLE.into(),
      pathmap_selector_variable: PATHMAP_SELECTOR_VARIABLE.into(),
      default_pathmap_variable: DEFAULT_PATHMAP_VARIABLE.into(),
      baseline_search_paths: Vec::new(),
      baseline_pathmap: String::new(),
    }
  }
}

impl ResolverConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// When the configuration file does not exist or fails to parse we fall back to default
  /// values.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    Self::from_path(&candidate).unwrap_or_default()
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// The statically configured context returned when no context is bound.
  pub fn baseline_context(&self) -> ResolutionContext {
    ResolutionContext::with_pathmap(
      &self.baseline_search_paths,
      PathmapTable::parse(&self.baseline_pathmap),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn discover_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    assert_eq!(ResolverConfig::discover(dir.path()), ResolverConfig::default());

    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{ not json").unwrap();
    assert_eq!(ResolverConfig::discover(dir.path()), ResolverConfig::default());
  }

  #[test]
  fn discover_reads_partial_config() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join(DEFAULT_CONFIG_FILE),
      r#"{ "default_pathmap_variable": "STUDIO_PATHMAP", "baseline_pathmap": "{'a':'b'}" }"#,
    )
    .unwrap();

    let config = ResolverConfig::discover(dir.path());
    assert_eq!(config.default_pathmap_variable, "STUDIO_PATHMAP");
    assert_eq!(config.search_path_variable, DEFAULT_SEARCH_PATH_VARIABLE);
    assert_eq!(config.baseline_context().pathmap().get("a"), Some("b"));
  }

  #[test]
  fn default_baseline_context_is_empty() {
    assert!(ResolverConfig::default().baseline_context().is_empty());
  }

  #[test]
  fn map_environment_reports_unset_variables() {
    let env: MapEnvironment = [("A", "1")].into_iter().collect();
    assert_eq!(env.var("A"), Ok(Some("1".to_string())));
    assert_eq!(env.var("B"), Ok(None));
  }
}
