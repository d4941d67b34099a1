//! Process-wide fallback context consulted after any bound context.
//!
//! Readers take a snapshot of the current context with [`DefaultContextRegistry::context`].
//! Writers build a complete replacement and swap it in atomically, so a reader never sees new
//! search paths paired with a stale pathmap or the other way round.

use std::fmt;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::asset_paths::parse_search_paths;
use crate::config::{Environment, ProcessEnvironment, ResolverConfig};
use crate::context::ResolutionContext;
use crate::notice::{NoticeListener, ResolverChanged};
use crate::pathmap::PathmapTable;

static GLOBAL: OnceLock<Arc<DefaultContextRegistry>> = OnceLock::new();

/// Errors raised while setting up the default-context registry.
#[derive(Debug)]
pub enum RegistryError {
  /// An environment variable the registry reads is not valid UTF-8.
  NonUnicodeVariable {
    /// Name of the offending variable.
    name: String,
  },
  /// A process-global registry has already been installed.
  AlreadyInstalled,
}

impl fmt::Display for RegistryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NonUnicodeVariable { name } => {
        write!(f, "environment variable {name} is not valid unicode")
      }
      Self::AlreadyInstalled => f.write_str("default context registry already installed"),
    }
  }
}

impl std::error::Error for RegistryError {}

/// Holder of the fallback [`ResolutionContext`].
pub struct DefaultContextRegistry {
  current: ArcSwap<ResolutionContext>,
  writer: Mutex<()>,
  listeners: Mutex<Vec<Arc<dyn NoticeListener>>>,
  environment: Arc<dyn Environment>,
}

impl DefaultContextRegistry {
  /// Registry seeded with `context`. Pathmap variables are later read from `environment`.
  pub fn new(context: ResolutionContext, environment: Arc<dyn Environment>) -> Self {
    Self {
      current: ArcSwap::from_pointee(context),
      writer: Mutex::new(()),
      listeners: Mutex::new(Vec::new()),
      environment,
    }
  }

  /// Registry seeded from environment variables named by `config`.
  ///
  /// The search paths come from `config.search_path_variable`. The pathmap text comes from
  /// the variable named by `config.pathmap_selector_variable`, or from
  /// `config.default_pathmap_variable` when the selector is unset or empty.
  pub fn from_environment(
    config: &ResolverConfig,
    environment: Arc<dyn Environment>,
  ) -> Result<Self, RegistryError> {
    let search_paths = read_var(environment.as_ref(), &config.search_path_variable)?
      .map(|text| parse_search_paths(&text))
      .unwrap_or_default();

    let pathmap_variable = read_var(environment.as_ref(), &config.pathmap_selector_variable)?
      .filter(|name| !name.is_empty())
      .unwrap_or_else(|| config.default_pathmap_variable.clone());
    let pathmap = read_var(environment.as_ref(), &pathmap_variable)?
      .map(|text| PathmapTable::parse(&text))
      .unwrap_or_default();

    tracing::debug!(
      pathmap_variable = %pathmap_variable,
      search_paths = search_paths.len(),
      rules = pathmap.len(),
      "initialised default context from environment"
    );
    let context = ResolutionContext::with_pathmap(search_paths, pathmap);
    Ok(Self::new(context, environment))
  }

  /// Install `registry` as the process-global registry.
  ///
  /// Call this once at load time. Fails when a global registry already exists, including one
  /// created implicitly by [`DefaultContextRegistry::global`].
  pub fn install_global(registry: Self) -> Result<Arc<Self>, RegistryError> {
    let registry = Arc::new(registry);
    GLOBAL
      .set(Arc::clone(&registry))
      .map_err(|_| RegistryError::AlreadyInstalled)?;
    Ok(registry)
  }

  /// The process-global registry, initialised from the process environment if none was
  /// installed.
  pub fn global() -> Result<Arc<Self>, RegistryError> {
    if let Some(registry) = GLOBAL.get() {
      return Ok(Arc::clone(registry));
    }
    let registry = Arc::new(Self::from_environment(
      &ResolverConfig::default(),
      Arc::new(ProcessEnvironment),
    )?);
    Ok(Arc::clone(GLOBAL.get_or_init(|| registry)))
  }

  /// Snapshot of the current default context.
  pub fn context(&self) -> Arc<ResolutionContext> {
    self.current.load_full()
  }

  /// Register a listener for [`ResolverChanged`] notices.
  pub fn subscribe(&self, listener: Arc<dyn NoticeListener>) {
    self.listeners.lock().push(listener);
  }

  /// Replace the default search paths, keeping the current pathmap.
  ///
  /// Returns `true` when the context changed and a notice was sent.
  pub fn set_default_search_paths<I, S>(&self, search_paths: I) -> bool
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let search_paths: Vec<String> = search_paths
      .into_iter()
      .map(|path| path.as_ref().to_string())
      .collect();
    tracing::debug!(?search_paths, "setting default search paths");
    self.update(|current| current.replace_search_paths(&search_paths))
  }

  /// Replace the default pathmap with the one held in the variable `name`, keeping the
  /// current search paths. An unset variable yields an empty pathmap.
  ///
  /// Returns `Ok(true)` when the context changed and a notice was sent.
  pub fn set_default_pathmap_environment(&self, name: &str) -> Result<bool, RegistryError> {
    let pathmap = read_var(self.environment.as_ref(), name)?
      .map(|text| PathmapTable::parse(&text))
      .unwrap_or_default();
    tracing::debug!(variable = name, rules = pathmap.len(), "setting default pathmap");
    Ok(self.update(|current| current.replace_pathmap(pathmap)))
  }

  fn update(&self, build: impl FnOnce(&ResolutionContext) -> ResolutionContext) -> bool {
    {
      let _writer = self.writer.lock();
      let current = self.current.load();
      let next = build(&current);
      if next == **current {
        tracing::debug!("default context unchanged, skipping notice");
        return false;
      }
      self.current.store(Arc::new(next));
    }

    let listeners = self.listeners.lock().clone();
    let notice = ResolverChanged::for_context_type::<ResolutionContext>();
    for listener in &listeners {
      listener.resolver_changed(&notice);
    }
    tracing::debug!(listeners = listeners.len(), "default context changed");
    true
  }
}

impl fmt::Debug for DefaultContextRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DefaultContextRegistry")
      .field("current", &self.context())
      .field("listeners", &self.listeners.lock().len())
      .finish_non_exhaustive()
  }
}

fn read_var(environment: &dyn Environment, name: &str) -> Result<Option<String>, RegistryError> {
  environment
    .var(name)
    .map_err(|_| RegistryError::NonUnicodeVariable {
      name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use crate::config::MapEnvironment;

  #[derive(Default)]
  struct CountingListener {
    notices: AtomicUsize,
  }

  impl NoticeListener for CountingListener {
    fn resolver_changed(&self, notice: &ResolverChanged) {
      assert!(notice.affects(&ResolutionContext::new()));
      self.notices.fetch_add(1, Ordering::SeqCst);
    }
  }

  fn registry_with(env: MapEnvironment) -> (DefaultContextRegistry, Arc<CountingListener>) {
    let registry =
      DefaultContextRegistry::from_environment(&ResolverConfig::default(), Arc::new(env)).unwrap();
    let listener = Arc::new(CountingListener::default());
    registry.subscribe(listener.clone());
    (registry, listener)
  }

  #[cfg(unix)]
  #[test]
  fn reads_search_paths_and_default_pathmap_variable() {
    let env = MapEnvironment::new()
      .with("PXR_AR_DEFAULT_SEARCH_PATH", "/proj/lib:/proj/shared")
      .with("HOUDINI_PATHMAP", "{'$JOB/':'/proj/job42/'}");
    let (registry, _) = registry_with(env);

    let context = registry.context();
    assert_eq!(context.search_paths(), ["/proj/lib", "/proj/shared"]);
    assert_eq!(context.pathmap().get("$JOB/"), Some("/proj/job42/"));
  }

  #[test]
  fn selector_variable_redirects_pathmap_lookup() {
    let env = MapEnvironment::new()
      .with("AR_PATHMAP_ENVIRONMENT", "STUDIO_PATHMAP")
      .with("STUDIO_PATHMAP", "{'a':'b'}")
      .with("HOUDINI_PATHMAP", "{'c':'d'}");
    let (registry, _) = registry_with(env);

    let context = registry.context();
    assert_eq!(context.pathmap().get("a"), Some("b"));
    assert_eq!(context.pathmap().get("c"), None);
  }

  #[test]
  fn empty_selector_falls_back_to_default_variable() {
    let env = MapEnvironment::new()
      .with("AR_PATHMAP_ENVIRONMENT", "")
      .with("HOUDINI_PATHMAP", "{'c':'d'}");
    let (registry, _) = registry_with(env);
    assert_eq!(registry.context().pathmap().get("c"), Some("d"));
  }

  #[test]
  fn empty_environment_yields_empty_context() {
    let (registry, _) = registry_with(MapEnvironment::new());
    assert!(registry.context().is_empty());
  }

  #[cfg(unix)]
  #[test]
  fn setting_search_paths_keeps_pathmap_and_notifies() {
    let env = MapEnvironment::new().with("HOUDINI_PATHMAP", "{'a':'b'}");
    let (registry, listener) = registry_with(env);

    assert!(registry.set_default_search_paths(["/proj/lib"]));
    let context = registry.context();
    assert_eq!(context.search_paths(), ["/proj/lib"]);
    assert_eq!(context.pathmap().get("a"), Some("b"));
    assert_eq!(listener.notices.load(Ordering::SeqCst), 1);
  }

  #[cfg(unix)]
  #[test]
  fn setting_pathmap_environment_keeps_search_paths_and_notifies() {
    let env = MapEnvironment::new()
      .with("PXR_AR_DEFAULT_SEARCH_PATH", "/proj/lib")
      .with("SHOW_PATHMAP", "{'x':'y'}");
    let (registry, listener) = registry_with(env);

    assert!(registry.set_default_pathmap_environment("SHOW_PATHMAP").unwrap());
    let context = registry.context();
    assert_eq!(context.search_paths(), ["/proj/lib"]);
    assert_eq!(context.pathmap().get("x"), Some("y"));
    assert_eq!(listener.notices.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn unset_pathmap_variable_clears_pathmap() {
    let env = MapEnvironment::new().with("HOUDINI_PATHMAP", "{'a':'b'}");
    let (registry, listener) = registry_with(env);

    assert!(registry.set_default_pathmap_environment("MISSING").unwrap());
    assert!(registry.context().pathmap().is_empty());
    assert_eq!(listener.notices.load(Ordering::SeqCst), 1);
  }

  #[cfg(unix)]
  #[test]
  fn no_op_updates_keep_context_identity_and_stay_silent() {
    let env = MapEnvironment::new()
      .with("PXR_AR_DEFAULT_SEARCH_PATH", "/proj/lib")
      .with("HOUDINI_PATHMAP", "{'a':'b'}");
    let (registry, listener) = registry_with(env);
    let before = registry.context();

    assert!(!registry.set_default_search_paths(["/proj/lib"]));
    assert!(!registry.set_default_pathmap_environment("HOUDINI_PATHMAP").unwrap());

    assert!(Arc::ptr_eq(&before, &registry.context()));
    assert_eq!(listener.notices.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn readers_keep_their_snapshot_across_updates() {
    let (registry, _) = registry_with(MapEnvironment::new());
    let snapshot = registry.context();

    assert!(registry.set_default_search_paths(["/somewhere"]));
    assert!(snapshot.is_empty());
    assert!(!registry.context().is_empty());
  }

  #[cfg(unix)]
  #[test]
  fn concurrent_setters_leave_a_consistent_context() {
    let env = MapEnvironment::new()
      .with("MAP_A", "{'a1':'1', 'a2':'2', 'a3':'3'}")
      .with("MAP_B", "{'b1':'1', 'b2':'2'}");
    let map_a = PathmapTable::parse("{'a1':'1', 'a2':'2', 'a3':'3'}");
    let map_b = PathmapTable::parse("{'b1':'1', 'b2':'2'}");
    let (registry, _) = registry_with(env);
    let registry = Arc::new(registry);

    let writers: Vec<_> = (0..4)
      .map(|index| {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
          for round in 0..200 {
            if (index + round) % 2 == 0 {
              registry.set_default_search_paths([
                format!("/dir{index}/one"),
                format!("/dir{index}/two"),
                format!("/dir{index}/three"),
              ]);
            } else {
              let name = if round % 3 == 0 { "MAP_A" } else { "MAP_B" };
              registry.set_default_pathmap_environment(name).unwrap();
            }
          }
        })
      })
      .collect();

    let readers: Vec<_> = (0..2)
      .map(|_| {
        let registry = Arc::clone(&registry);
        let (map_a, map_b) = (map_a.clone(), map_b.clone());
        std::thread::spawn(move || {
          for _ in 0..500 {
            let context = registry.context();
            let paths = context.search_paths();
            if let Some(first) = paths.first() {
              let dir = first.trim_end_matches("/one");
              assert_eq!(paths, [
                format!("{dir}/one"),
                format!("{dir}/two"),
                format!("{dir}/three"),
              ]);
            }
            let pathmap = context.pathmap();
            assert!(pathmap.is_empty() || *pathmap == map_a || *pathmap == map_b);
          }
        })
      })
      .collect();

    for handle in writers.into_iter().chain(readers) {
      handle.join().unwrap();
    }
  }

  #[test]
  fn error_messages_name_the_variable() {
    let error = RegistryError::NonUnicodeVariable {
      name: "HOUDINI_PATHMAP".into(),
    };
    assert_eq!(
      error.to_string(),
      "environment variable HOUDINI_PATHMAP is not valid unicode"
    );
  }
}
