use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Context side of an interrupt pair, polled by the engine's interrupt handler.
#[derive(Debug, Clone)]
pub(crate) struct InterruptToken {
  interrupted: Arc<AtomicBool>,
}

impl InterruptToken {
  /// Create a new token + handle pair sharing one flag.
  pub fn new() -> (Self, InterruptHandle) {
    let interrupted = Arc::new(AtomicBool::new(false));
    (
      Self {
        interrupted: interrupted.clone(),
      },
      InterruptHandle { interrupted },
    )
  }

  pub fn is_interrupted(&self) -> bool {
    self.interrupted.load(Ordering::Relaxed)
  }
}

/// A host handle used to stop a [`Context`](crate::Context) from any thread.
///
/// Interrupting aborts the running script at the engine's next interrupt check. The interrupted
/// operation fails with [`Error::Interrupted`](crate::Error::Interrupted) and the context is torn
/// down. Requests made while the context is idle are observed by its next operation.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
  interrupted: Arc<AtomicBool>,
}

impl InterruptHandle {
  pub fn interrupt(&self) {
    self.interrupted.store(true, Ordering::Relaxed);
  }

  pub fn is_interrupted(&self) -> bool {
    self.interrupted.load(Ordering::Relaxed)
  }
}

#[cfg(test)]
mod tests {
  use super::InterruptToken;
  use std::thread;

  #[test]
  fn handle_flags_token() {
    let (token, handle) = InterruptToken::new();
    assert!(!token.is_interrupted());
    handle.interrupt();
    assert!(token.is_interrupted());
    assert!(handle.is_interrupted());
  }

  #[test]
  fn handle_crosses_threads() {
    let (token, handle) = InterruptToken::new();
    let clone = handle.clone();
    thread::spawn(move || clone.interrupt()).join().unwrap();
    assert!(token.is_interrupted());
  }
}
