//! Asset path resolution.
//!
//! [`DefaultResolver`] implements plain anchored lookups: a relative path is tried against the
//! working directory and then against each search path of the bound and default contexts.
//! [`PathmapResolver`] rewrites path prefixes with the contexts' pathmap tables first and then
//! hands the rewritten path to its [`DefaultResolver`].

use std::env;
use std::path::Path;
use std::sync::Arc;

use crate::asset_paths::{
  is_file_relative, is_relative_path, is_search_path, parse_search_paths, path_exists,
  resolve_anchored,
};
use crate::config::ResolverConfig;
use crate::context::ResolutionContext;
use crate::models::ResolvedPath;
use crate::registry::{DefaultContextRegistry, RegistryError};

/// Operations every resolver provides to its host.
pub trait Resolver {
  /// Resolve `asset_path` to an existing file, consulting `bound` before the default context.
  fn resolve(&self, asset_path: &str, bound: Option<&ResolutionContext>) -> Option<ResolvedPath>;

  /// Context used when the host binds nothing explicitly.
  fn create_default_context(&self) -> ResolutionContext;

  /// Context anchored at the directory containing `asset_path`.
  fn create_default_context_for_asset(&self, asset_path: &str) -> ResolutionContext;

  /// Context parsed from its textual configuration form.
  fn create_context_from_string(&self, text: &str) -> ResolutionContext;
}

/// Search-path resolver without prefix remapping.
#[derive(Debug, Clone)]
pub struct DefaultResolver {
  registry: Arc<DefaultContextRegistry>,
}

impl DefaultResolver {
  /// Resolver falling back to the contexts held by `registry`.
  pub fn new(registry: Arc<DefaultContextRegistry>) -> Self {
    Self { registry }
  }

  /// Registry providing the default context.
  pub fn registry(&self) -> &Arc<DefaultContextRegistry> {
    &self.registry
  }

  /// Anchor `path` against the working directory and then the search paths of `layers`.
  ///
  /// Layers are tried in the given order and each layer's search paths in listed order.
  /// Explicit `./` and `../` references are only tried against the working directory, and
  /// absolute paths are probed as they are.
  pub fn resolve_in_layers(
    &self,
    path: &str,
    layers: &[&ResolutionContext],
  ) -> Option<ResolvedPath> {
    if !is_relative_path(path) {
      let resolved = resolve_anchored(None, path);
      log_outcome(path, resolved.as_ref());
      return resolved;
    }

    tracing::debug!(path, "path is relative");
    if let Ok(cwd) = env::current_dir() {
      if let Some(resolved) = resolve_anchored(Some(&cwd), path) {
        log_outcome(path, Some(&resolved));
        return Some(resolved);
      }
    }

    if is_search_path(path) {
      tracing::debug!(path, "path is a search path");
      for layer in layers {
        for search_path in layer.search_paths() {
          tracing::trace!(path, search_path = %search_path, "searching");
          if let Some(resolved) = resolve_anchored(Some(Path::new(search_path)), path) {
            log_outcome(path, Some(&resolved));
            return Some(resolved);
          }
        }
      }
    }

    log_outcome(path, None);
    None
  }
}

impl Resolver for DefaultResolver {
  fn resolve(&self, asset_path: &str, bound: Option<&ResolutionContext>) -> Option<ResolvedPath> {
    if asset_path.is_empty() {
      return None;
    }
    let fallback = self.registry.context();
    let layers: Vec<&ResolutionContext> = bound.into_iter().chain([fallback.as_ref()]).collect();
    self.resolve_in_layers(asset_path, &layers)
  }

  fn create_default_context(&self) -> ResolutionContext {
    ResolutionContext::default()
  }

  fn create_default_context_for_asset(&self, asset_path: &str) -> ResolutionContext {
    ResolutionContext::for_asset(asset_path)
  }

  fn create_context_from_string(&self, text: &str) -> ResolutionContext {
    ResolutionContext::with_search_paths(parse_search_paths(text))
  }
}

/// Resolver that rewrites path prefixes before searching.
#[derive(Debug, Clone)]
pub struct PathmapResolver {
  fallback: DefaultResolver,
  baseline: ResolutionContext,
}

impl PathmapResolver {
  /// Resolver bound to the process-global default-context registry.
  pub fn new() -> Result<Self, RegistryError> {
    Ok(Self::with_registry(DefaultContextRegistry::global()?))
  }

  /// Resolver bound to an explicit registry, with an empty baseline context.
  pub fn with_registry(registry: Arc<DefaultContextRegistry>) -> Self {
    Self {
      fallback: DefaultResolver::new(registry),
      baseline: ResolutionContext::default(),
    }
  }

  /// Resolver bound to `registry` whose baseline context comes from `config`.
  pub fn from_config(config: &ResolverConfig, registry: Arc<DefaultContextRegistry>) -> Self {
    Self {
      fallback: DefaultResolver::new(registry),
      baseline: config.baseline_context(),
    }
  }

  /// Registry providing the default context.
  pub fn registry(&self) -> &Arc<DefaultContextRegistry> {
    self.fallback.registry()
  }

  /// Replace the default search paths. See [`DefaultContextRegistry::set_default_search_paths`].
  pub fn set_default_search_paths<I, S>(&self, search_paths: I) -> bool
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.registry().set_default_search_paths(search_paths)
  }

  /// Replace the default pathmap from the variable `name`.
  /// See [`DefaultContextRegistry::set_default_pathmap_environment`].
  pub fn set_default_pathmap_environment(&self, name: &str) -> Result<bool, RegistryError> {
    self.registry().set_default_pathmap_environment(name)
  }
}

impl Resolver for PathmapResolver {
  fn resolve(&self, asset_path: &str, bound: Option<&ResolutionContext>) -> Option<ResolvedPath> {
    if asset_path.is_empty() {
      return None;
    }

    let fallback = self.registry().context();
    let layers: Vec<&ResolutionContext> = bound.into_iter().chain([fallback.as_ref()]).collect();
    tracing::debug!(asset_path, layers = layers.len(), "resolving");

    let mut mapped = asset_path.to_string();
    if is_file_relative(asset_path) {
      tracing::debug!(asset_path, "file-relative path, skipping pathmap");
    } else if path_exists(Path::new(asset_path)) {
      tracing::debug!(asset_path, "path exists as given, skipping pathmap");
    } else {
      for layer in &layers {
        layer.pathmap().apply(&mut mapped);
      }
    }

    self.fallback.resolve_in_layers(&mapped, &layers)
  }

  fn create_default_context(&self) -> ResolutionContext {
    tracing::debug!("creating default context");
    self.baseline.clone()
  }

  fn create_default_context_for_asset(&self, asset_path: &str) -> ResolutionContext {
    ResolutionContext::for_asset(asset_path)
  }

  fn create_context_from_string(&self, text: &str) -> ResolutionContext {
    ResolutionContext::from_context_string(text)
  }
}

fn log_outcome(path: &str, resolved: Option<&ResolvedPath>) {
  match resolved {
    Some(resolved) => tracing::debug!(path, resolved = %resolved, "path resolved"),
    None => tracing::debug!(path, "path could not be resolved"),
  }
}
