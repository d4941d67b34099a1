//! Resolution contexts: search paths plus a pathmap table.

use std::fmt;
use std::path::Path;

use crate::asset_paths::{absolutize, normalise_search_paths, parse_search_paths};
use crate::pathmap::PathmapTable;

/// Immutable bundle of search directories and prefix rewrite rules.
///
/// Search-path entries are normalised on construction: empty entries are dropped and relative
/// ones are made absolute against the current working directory. Two contexts are equal when
/// both the normalised search paths and the pathmap rules match element-wise, and the derived
/// hash combines the same two components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResolutionContext {
  search_paths: Vec<String>,
  pathmap: PathmapTable,
}

impl ResolutionContext {
  /// Context with no search paths and an empty pathmap.
  pub fn new() -> Self {
    Self::default()
  }

  /// Context holding only search paths.
  pub fn with_search_paths<I, S>(search_paths: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self::with_pathmap(search_paths, PathmapTable::default())
  }

  /// Context holding search paths and a pathmap table.
  pub fn with_pathmap<I, S>(search_paths: I, pathmap: PathmapTable) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self {
      search_paths: normalise_search_paths(search_paths),
      pathmap,
    }
  }

  /// Parse a combined `search-path-list[,pathmap]` string.
  ///
  /// Everything before the first comma is a platform path-list, everything after it is
  /// pathmap text. Without a comma the whole string is treated as search paths.
  pub fn from_context_string(text: &str) -> Self {
    match text.split_once(',') {
      Some((search_paths, pathmap)) => {
        tracing::debug!(search_paths, pathmap, "creating context from string");
        Self::with_pathmap(
          parse_search_paths(search_paths),
          PathmapTable::parse(pathmap),
        )
      }
      None => {
        tracing::debug!(search_paths = text, "creating search-path context from string");
        Self::with_search_paths(parse_search_paths(text))
      }
    }
  }

  /// Context whose only search path is the directory containing `asset_path`.
  ///
  /// Relative asset paths are made absolute against the current working directory first.
  /// An empty asset path yields an empty context.
  pub fn for_asset(asset_path: &str) -> Self {
    if asset_path.is_empty() {
      return Self::default();
    }

    let absolute = absolutize(Path::new(asset_path));
    let directory = absolute
      .parent()
      .map(|parent| parent.to_string_lossy().into_owned())
      .unwrap_or_default();
    tracing::debug!(asset_path, directory = %directory, "creating context for asset");
    Self::with_search_paths([directory])
  }

  /// Copy of this context with its search paths replaced.
  pub fn replace_search_paths<I, S>(&self, search_paths: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self::with_pathmap(search_paths, self.pathmap.clone())
  }

  /// Copy of this context with its pathmap replaced.
  pub fn replace_pathmap(&self, pathmap: PathmapTable) -> Self {
    Self {
      search_paths: self.search_paths.clone(),
      pathmap,
    }
  }

  /// Search directories in lookup order.
  pub fn search_paths(&self) -> &[String] {
    &self.search_paths
  }

  /// Read-only view of the pathmap rules.
  pub fn pathmap(&self) -> &PathmapTable {
    &self.pathmap
  }

  /// Returns `true` when neither search paths nor pathmap rules are present.
  pub fn is_empty(&self) -> bool {
    self.search_paths.is_empty() && self.pathmap.is_empty()
  }
}

impl fmt::Display for ResolutionContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.search_paths.is_empty() {
      f.write_str("Search path: [ ]")?;
    } else {
      f.write_str("Search path: [\n")?;
      for path in &self.search_paths {
        writeln!(f, "    {path}")?;
      }
      f.write_str("]")?;
    }
    if !self.pathmap.is_empty() {
      write!(f, "\nPathmap: {}", self.pathmap)?;
    }
    Ok(())
  }
}
