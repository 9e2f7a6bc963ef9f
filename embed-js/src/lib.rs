//! Embed a JavaScript engine and move values across the host boundary.
//!
//! The entry point is [`Context`], which owns exactly one engine instance and exposes four
//! operations:
//! - [`Context::evaluate`] runs a script and converts its completion value into a [`Value`].
//! - [`Context::execute`] runs a script for its side effects only; the completion value is never
//!   converted.
//! - [`Context::get_property`] reads a global binding.
//! - [`Context::call_property`] calls a global function with host arguments.
//!
//! # Values
//!
//! [`Value`] is a closed sum type. JS `null` and `undefined` both read back as [`Value::Null`];
//! every JS number reads back as an `f64`; arrays and plain objects convert recursively. Anything
//! else (functions, dates, regexps, class instances, symbols, ...) reads back as
//! [`Value::Opaque`], holding the shared [`ComplexObject`] marker instead of failing.
//!
//! Host arguments are validated before any engine allocation happens: a marker passed back into
//! the engine is rejected with [`Error::UnsupportedType`], naming the host type and where in the
//! argument tree it was found.
//!
//! # Errors
//!
//! Engine exceptions are translated into [`Error::Js`], carrying the [`ErrorKind`] derived from the
//! thrown error's `name`, the message verbatim, and the engine's stack trace text. Stack traces
//! embed the caller-supplied source name as `<source name>:<line>`; [`JsError::frames`] parses them
//! into [`StackFrame`]s.
//!
//! # Lifecycle
//!
//! The engine is torn down exactly once: by [`Context::close`], by an interrupt requested through
//! an [`InterruptHandle`], or when the `Context` is dropped. Every operation on a torn down context
//! fails with [`Error::Closed`]. A `Context` is single threaded; only its `InterruptHandle` may
//! cross threads.

mod complex;
mod context;
mod convert;
mod error;
mod interrupt;
mod stack;
mod value;

pub use crate::complex::ComplexObject;
pub use crate::context::Context;
pub use crate::context::ContextOptions;
pub use crate::convert::MAX_CONVERSION_DEPTH;
pub use crate::error::Error;
pub use crate::error::ErrorKind;
pub use crate::error::JsError;
pub use crate::interrupt::InterruptHandle;
pub use crate::stack::format_stack_trace;
pub use crate::stack::parse_stack_trace;
pub use crate::stack::StackFrame;
pub use crate::value::Map;
pub use crate::value::Value;

pub type Result<T> = std::result::Result<T, Error>;
