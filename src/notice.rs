//! Change notifications emitted when the default context is replaced.

use std::any::Any;
use std::fmt;

/// Notice broadcast after the default context changes.
///
/// The notice does not carry the new context. It only describes which bound contexts are
/// affected, so listeners holding contexts of other resolvers can ignore it.
pub struct ResolverChanged {
  affects: fn(&dyn Any) -> bool,
}

impl ResolverChanged {
  /// Notice affecting every context whose concrete type is `C`.
  pub fn for_context_type<C: Any>() -> Self {
    Self {
      affects: |context| context.is::<C>(),
    }
  }

  /// Returns `true` when `context` is of the type this notice addresses.
  pub fn affects(&self, context: &dyn Any) -> bool {
    (self.affects)(context)
  }
}

impl fmt::Debug for ResolverChanged {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResolverChanged").finish_non_exhaustive()
  }
}

/// Receiver of [`ResolverChanged`] notices.
pub trait NoticeListener: Send + Sync {
  /// Called once per accepted default-context change.
  fn resolver_changed(&self, notice: &ResolverChanged);
}
