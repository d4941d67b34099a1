//! Existence probes for asset paths joined onto anchor directories.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::models::ResolvedPath;

/// Join `path` onto `anchor` (when provided) and return the absolute path if an entry exists.
///
/// The probe only checks for the presence of a filesystem entry. Symbolic links are not
/// followed, so a dangling link still counts as present.
pub fn resolve_anchored(anchor: Option<&Path>, path: &str) -> Option<ResolvedPath> {
  let candidate = match anchor {
    Some(dir) if !dir.as_os_str().is_empty() => dir.join(path),
    _ => PathBuf::from(path),
  };

  if path_exists(&candidate) {
    tracing::trace!(candidate = %candidate.display(), "anchored candidate exists");
    Some(ResolvedPath::new(absolutize(&candidate)))
  } else {
    tracing::trace!(candidate = %candidate.display(), "anchored candidate missing");
    None
  }
}

/// Returns `true` when any filesystem entry exists at `path`.
pub fn path_exists(path: &Path) -> bool {
  fs::symlink_metadata(path).is_ok()
}

/// Make `path` absolute against the current working directory and normalise it lexically.
///
/// `.` segments are dropped and `..` segments consume their parent without touching the
/// filesystem. When the working directory cannot be determined the path is only normalised.
pub fn absolutize(path: &Path) -> PathBuf {
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
  };
  normalise_lexically(&joined)
}

fn normalise_lexically(path: &Path) -> PathBuf {
  let mut result = PathBuf::new();
  let mut depth = 0usize;

  for component in path.components() {
    match component {
      Component::Prefix(_) | Component::RootDir => result.push(component.as_os_str()),
      Component::CurDir => {}
      Component::ParentDir => {
        if depth > 0 {
          result.pop();
          depth -= 1;
        } else if !result.has_root() {
          result.push("..");
        }
      }
      Component::Normal(segment) => {
        result.push(segment);
        depth += 1;
      }
    }
  }

  result
}
