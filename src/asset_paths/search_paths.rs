//! Parsing and normalisation of search-path lists.

use std::env;
use std::path::Path;

use super::anchor::absolutize;

/// Split a platform path-list string (`:` on Unix, `;` on Windows) into its entries.
///
/// Empty entries are skipped, so `"a::b:"` yields `["a", "b"]`.
pub fn parse_search_paths(text: &str) -> Vec<String> {
  env::split_paths(text)
    .filter(|path| !path.as_os_str().is_empty())
    .map(|path| path.to_string_lossy().into_owned())
    .collect()
}

/// Drop empty entries and make every remaining entry absolute.
pub fn normalise_search_paths<I, S>(paths: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  paths
    .into_iter()
    .filter(|path| !path.as_ref().is_empty())
    .map(|path| {
      absolutize(Path::new(path.as_ref()))
        .to_string_lossy()
        .into_owned()
    })
    .collect()
}
