use crate::stack::parse_stack_trace;
use crate::stack::StackFrame;
use rquickjs::convert::Coerced;
use rquickjs::CaughtError;
use rquickjs::Ctx;
use rquickjs::Object;

/// Which member of the JS error taxonomy an error belongs to, derived from the thrown object's
/// `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  Syntax,
  Reference,
  Type,
  Range,
  Eval,
  Uri,
  /// Engine-specific failures such as running out of memory.
  Internal,
  Aggregate,
  /// Plain `Error`, subclasses with an unrecognized name, and thrown non-Error values.
  Generic,
}

impl ErrorKind {
  pub fn from_name(name: &str) -> ErrorKind {
    match name {
      "SyntaxError" => ErrorKind::Syntax,
      "ReferenceError" => ErrorKind::Reference,
      "TypeError" => ErrorKind::Type,
      "RangeError" => ErrorKind::Range,
      "EvalError" => ErrorKind::Eval,
      "URIError" => ErrorKind::Uri,
      "InternalError" => ErrorKind::Internal,
      "AggregateError" => ErrorKind::Aggregate,
      _ => ErrorKind::Generic,
    }
  }

  /// The JS constructor name for this kind.
  pub fn name(self) -> &'static str {
    match self {
      ErrorKind::Syntax => "SyntaxError",
      ErrorKind::Reference => "ReferenceError",
      ErrorKind::Type => "TypeError",
      ErrorKind::Range => "RangeError",
      ErrorKind::Eval => "EvalError",
      ErrorKind::Uri => "URIError",
      ErrorKind::Internal => "InternalError",
      ErrorKind::Aggregate => "AggregateError",
      ErrorKind::Generic => "Error",
    }
  }
}

/// A JS exception that reached the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {}", .kind.name(), .message)]
pub struct JsError {
  kind: ErrorKind,
  message: String,
  stack: Option<String>,
}

impl JsError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
      stack: None,
    }
  }

  pub fn with_stack(mut self, stack: Option<String>) -> Self {
    self.stack = stack.filter(|stack| !stack.trim().is_empty());
    self
  }

  pub fn kind(&self) -> ErrorKind {
    self.kind
  }

  /// The exception's `message`, verbatim.
  pub fn message(&self) -> &str {
    &self.message
  }

  /// The engine's stack trace text. Host-raised errors have none.
  pub fn stack(&self) -> Option<&str> {
    self.stack.as_deref()
  }

  pub fn frames(&self) -> Vec<StackFrame> {
    self.stack.as_deref().map(parse_stack_trace).unwrap_or_default()
  }
}

/// Errors produced by a [`Context`](crate::Context).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  /// A JS exception, either thrown by script or raised by the host with JS semantics.
  #[error(transparent)]
  Js(#[from] JsError),

  /// A host value that cannot cross into the engine.
  #[error("TypeError: unsupported type {type_name} at {path}")]
  UnsupportedType { type_name: &'static str, path: String },

  /// An interrupt request stopped the context. The context has been torn down.
  #[error("interrupted")]
  Interrupted,

  /// The context was already torn down.
  #[error("context is closed")]
  Closed,

  /// An engine failure that is not a JS exception (allocation, setup, invalid strings).
  #[error("engine error: {0}")]
  Engine(String),
}

impl Error {
  pub(crate) fn reference(message: impl Into<String>) -> Self {
    Error::Js(JsError::new(ErrorKind::Reference, message))
  }

  pub(crate) fn type_error(message: impl Into<String>) -> Self {
    Error::Js(JsError::new(ErrorKind::Type, message))
  }

  /// The taxonomy member this error belongs to, if any.
  pub fn kind(&self) -> Option<ErrorKind> {
    match self {
      Error::Js(error) => Some(error.kind()),
      Error::UnsupportedType { .. } => Some(ErrorKind::Type),
      Error::Interrupted | Error::Closed | Error::Engine(_) => None,
    }
  }

  pub fn as_js(&self) -> Option<&JsError> {
    match self {
      Error::Js(error) => Some(error),
      _ => None,
    }
  }
}

impl From<rquickjs::Error> for Error {
  fn from(error: rquickjs::Error) -> Self {
    Error::Engine(error.to_string())
  }
}

fn coerce_string<'js>(ctx: &Ctx<'js>, value: &rquickjs::Value<'js>) -> Option<String> {
  match value.get::<Coerced<String>>() {
    Ok(Coerced(s)) => Some(s),
    Err(_) => {
      // Symbols and objects with throwing toString leave an exception pending.
      ctx.catch();
      None
    }
  }
}

// Reads `key` off a thrown error. Throwing getters count as absent and leave nothing pending.
fn error_field<'js>(ctx: &Ctx<'js>, error: &Object<'js>, key: &str) -> Option<String> {
  let value = match error.get::<_, rquickjs::Value>(key) {
    Ok(value) => value,
    Err(_) => {
      ctx.catch();
      return None;
    }
  };
  if value.is_undefined() || value.is_null() {
    return None;
  }
  coerce_string(ctx, &value)
}

/// Translate an engine error raised inside `ctx`, taking the pending exception if there is one.
pub(crate) fn translate<'js>(ctx: &Ctx<'js>, error: rquickjs::Error) -> Error {
  match CaughtError::from_error(ctx, error) {
    CaughtError::Exception(exception) => {
      let object = exception.as_object();
      let kind = error_field(ctx, object, "name")
        .map_or(ErrorKind::Generic, |name| ErrorKind::from_name(&name));
      let message = error_field(ctx, object, "message").unwrap_or_default();
      let stack = error_field(ctx, object, "stack");
      Error::Js(JsError::new(kind, message).with_stack(stack))
    }
    CaughtError::Value(value) => {
      let message = coerce_string(ctx, &value).unwrap_or_else(|| value.type_name().to_string());
      Error::Js(JsError::new(ErrorKind::Generic, message))
    }
    CaughtError::Error(error) => Error::from(error),
  }
}
