//! Value types produced by resolution.

use std::fmt;
use std::path::{Path, PathBuf};

/// Absolute, lexically normalised path of an asset that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
  /// Wrap an already absolute path.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self(path.into())
  }

  /// Borrow the resolved filesystem path.
  pub fn as_path(&self) -> &Path {
    &self.0
  }

  /// Consume the wrapper and return the owned path.
  pub fn into_path_buf(self) -> PathBuf {
    self.0
  }
}

impl AsRef<Path> for ResolvedPath {
  fn as_ref(&self) -> &Path {
    &self.0
  }
}

impl fmt::Display for ResolvedPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.display())
  }
}
