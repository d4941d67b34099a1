//! Helpers for classifying, anchoring and listing asset paths.
//!
//! The responsibilities are split into focused submodules so that path classification,
//! existence probing and search-path parsing can be tested independently. Both the pathmap
//! resolver and its composed default resolver share these helpers.

mod anchor;
mod classify;
mod search_paths;

pub use anchor::{absolutize, path_exists, resolve_anchored};
pub use classify::{is_file_relative, is_relative_path, is_search_path};
pub use search_paths::{normalise_search_paths, parse_search_paths};
