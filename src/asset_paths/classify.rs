//! Classification of asset path strings prior to anchoring.

use std::path::Path;

/// Returns `true` for explicit file-relative references such as `./a.usd` or `../b.usd`.
///
/// These paths bypass pathmap rewriting and never participate in search-path lookups.
pub fn is_file_relative(path: &str) -> bool {
  path.starts_with("./") || path.starts_with("../")
}

/// Returns `true` when the path does not start with a root or drive indicator.
pub fn is_relative_path(path: &str) -> bool {
  if path.is_empty() {
    return false;
  }
  if cfg!(windows) && (path.starts_with('/') || path.starts_with('\\')) {
    return false;
  }
  Path::new(path).is_relative()
}

/// Returns `true` when the path should be looked up against context search paths.
pub fn is_search_path(path: &str) -> bool {
  is_relative_path(path) && !is_file_relative(path)
}
