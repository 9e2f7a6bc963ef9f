use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::Weak;

/// Marker for a JS value that exists but has no faithful host representation.
///
/// Functions, dates, regexps, class instances, symbols and similar values all read back as the same
/// shared marker. The marker carries no data; any two markers compare equal.
#[derive(Debug)]
pub struct ComplexObject {
  _private: (),
}

// Only a weak reference is kept: the marker lives exactly as long as some host value holds it.
static INSTANCE: Lazy<Mutex<Weak<ComplexObject>>> = Lazy::new(|| Mutex::new(Weak::new()));

impl ComplexObject {
  /// Returns the process-wide marker, rebuilding it if every previous holder has dropped it or it
  /// has been [reset](ComplexObject::reset).
  ///
  /// Concurrent callers are serialized; all callers racing on a rebuild observe the same instance.
  pub fn instance() -> Arc<ComplexObject> {
    let mut slot = INSTANCE.lock();
    if let Some(existing) = slot.upgrade() {
      return existing;
    }
    let fresh = Arc::new(ComplexObject { _private: () });
    *slot = Arc::downgrade(&fresh);
    tracing::trace!("rebuilt shared complex object marker");
    fresh
  }

  /// Forgets the shared instance. Existing holders keep their marker; the next call to
  /// [`ComplexObject::instance`] builds a new one.
  pub fn reset() {
    *INSTANCE.lock() = Weak::new();
  }

  /// Whether a shared instance is currently alive.
  pub fn is_live() -> bool {
    INSTANCE.lock().strong_count() > 0
  }
}

impl PartialEq for ComplexObject {
  fn eq(&self, _other: &Self) -> bool {
    true
  }
}

impl Eq for ComplexObject {}

impl Display for ComplexObject {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("[complex object]")
  }
}
