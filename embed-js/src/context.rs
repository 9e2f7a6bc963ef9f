use crate::convert::from_engine;
use crate::convert::to_engine;
use crate::convert::validate_args;
use crate::error::translate;
use crate::error::Error;
use crate::interrupt::InterruptHandle;
use crate::interrupt::InterruptToken;
use crate::value::Value;
use crate::Result;
use rquickjs::context::EvalOptions;
use rquickjs::function::Args;
use rquickjs::Ctx;
use rquickjs::Function;
use rquickjs::Runtime;
use std::time::Instant;
use tracing::debug_span;

/// Engine configuration applied when a [`Context`] is created.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
  /// Heap limit in bytes. Allocations past it fail with an engine exception.
  pub memory_limit: Option<usize>,
  /// Native stack budget in bytes for script execution.
  pub max_stack_size: Option<usize>,
  /// Allocation volume in bytes that triggers a collection.
  pub gc_threshold: Option<usize>,
  /// Evaluate scripts in strict mode. Off by default, so that `a = 1` at the top level creates a
  /// global binding.
  pub strict: bool,
}

struct Engine {
  // Declared first so it is dropped before the runtime it belongs to.
  context: rquickjs::Context,
  runtime: Runtime,
}

/// One embedded engine instance with its own global scope.
///
/// Operations take `&mut self`; a context runs one operation at a time and never crosses threads.
/// Use [`Context::interrupt_handle`] to stop it from elsewhere.
pub struct Context {
  engine: Option<Engine>,
  options: ContextOptions,
  interrupt: InterruptToken,
  interrupt_handle: InterruptHandle,
}

impl Context {
  pub fn new() -> Result<Context> {
    Context::with_options(ContextOptions::default())
  }

  pub fn with_options(options: ContextOptions) -> Result<Context> {
    let runtime = Runtime::new()?;
    if let Some(limit) = options.memory_limit {
      runtime.set_memory_limit(limit);
    }
    if let Some(limit) = options.max_stack_size {
      runtime.set_max_stack_size(limit);
    }
    if let Some(threshold) = options.gc_threshold {
      runtime.set_gc_threshold(threshold);
    }
    let (interrupt, interrupt_handle) = InterruptToken::new();
    let polled = interrupt.clone();
    runtime.set_interrupt_handler(Some(Box::new(move || polled.is_interrupted())));
    let context = rquickjs::Context::full(&runtime)?;
    tracing::debug!(
      memory_limit = options.memory_limit,
      max_stack_size = options.max_stack_size,
      strict = options.strict,
      "created context"
    );
    Ok(Context {
      engine: Some(Engine { context, runtime }),
      options,
      interrupt,
      interrupt_handle,
    })
  }

  /// Run `source` as a script and convert its completion value.
  ///
  /// `source_name` appears in stack traces as `<source_name>:<line>`. The engine takes source as a
  /// C string, so a raw U+0000 character in `source` fails with [`Error::Engine`] before anything
  /// runs; write it as the escape `\0` or `\u0000` instead.
  pub fn evaluate(&mut self, source: &str, source_name: &str) -> Result<Value> {
    let span = debug_span!("evaluate", source_name, duration_ms = tracing::field::Empty);
    let _guard = span.enter();
    let start = Instant::now();
    let options = self.eval_options(source_name);
    let interrupt = self.interrupt.clone();
    let result = self.run(|ctx| {
      let value = ctx
        .eval_with_options::<rquickjs::Value, _>(source, options)
        .map_err(|err| translate(&ctx, err))?;
      from_engine(&ctx, &value, &interrupt)
    });
    span.record("duration_ms", start.elapsed().as_millis() as u64);
    result
  }

  /// Run `source` as a script for its side effects. The completion value is discarded without
  /// being converted. Raw U+0000 characters in `source` are rejected as in [`Context::evaluate`].
  pub fn execute(&mut self, source: &str, source_name: &str) -> Result<()> {
    let span = debug_span!("execute", source_name, duration_ms = tracing::field::Empty);
    let _guard = span.enter();
    let start = Instant::now();
    let options = self.eval_options(source_name);
    let result = self.run(|ctx| {
      ctx
        .eval_with_options::<rquickjs::Value, _>(source, options)
        .map(drop)
        .map_err(|err| translate(&ctx, err))
    });
    span.record("duration_ms", start.elapsed().as_millis() as u64);
    result
  }

  /// Read the global property `name`.
  ///
  /// Fails with a `ReferenceError` (`no such prop: <name>`) when the global object has no such
  /// property. A property that exists but holds `undefined` reads back as [`Value::Null`].
  pub fn get_property(&mut self, name: &str) -> Result<Value> {
    let _guard = debug_span!("get_property", name).entered();
    let interrupt = self.interrupt.clone();
    self.run(|ctx| {
      let globals = ctx.globals();
      if !globals.contains_key(name).map_err(|err| translate(&ctx, err))? {
        return Err(Error::reference(format!("no such prop: {name}")));
      }
      let value: rquickjs::Value = globals.get(name).map_err(|err| translate(&ctx, err))?;
      from_engine(&ctx, &value, &interrupt)
    })
  }

  /// Call the global function `name` with `args`, with the global object as `this`.
  ///
  /// Fails with a `TypeError` when the property is missing or not callable. Arguments are checked
  /// before anything is built in the engine; [`Value::Null`] arguments arrive as `undefined`.
  pub fn call_property(&mut self, name: &str, args: &[Value]) -> Result<Value> {
    let _guard = debug_span!("call_property", name, argc = args.len()).entered();
    validate_args(args)?;
    let interrupt = self.interrupt.clone();
    self.run(|ctx| {
      let globals = ctx.globals();
      let target: rquickjs::Value = globals.get(name).map_err(|err| translate(&ctx, err))?;
      let Some(function) = target.as_function().cloned() else {
        return Err(Error::type_error(format!("{name} is not a function")));
      };
      let result =
        call(&ctx, &function, globals.into_value(), args).map_err(|err| translate(&ctx, err))?;
      from_engine(&ctx, &result, &interrupt)
    })
  }

  /// Force a garbage collection pass.
  pub fn run_gc(&mut self) -> Result<()> {
    let engine = self.engine.as_ref().ok_or(Error::Closed)?;
    engine.runtime.run_gc();
    Ok(())
  }

  /// A handle that stops this context from any thread.
  pub fn interrupt_handle(&self) -> InterruptHandle {
    self.interrupt_handle.clone()
  }

  pub fn options(&self) -> &ContextOptions {
    &self.options
  }

  /// Tear the engine down. Later operations fail with [`Error::Closed`]; closing again is a no-op.
  pub fn close(&mut self) {
    self.teardown("closed");
  }

  pub fn is_closed(&self) -> bool {
    self.engine.is_none()
  }

  fn eval_options(&self, source_name: &str) -> EvalOptions {
    let mut options = EvalOptions::default();
    options.strict = self.options.strict;
    options.filename = Some(source_name.to_string());
    options
  }

  // Runs `op` inside the engine. An interrupt observed before or after `op` tears the engine down
  // and takes precedence over whatever `op` returned.
  fn run<R>(&mut self, op: impl for<'js> FnOnce(Ctx<'js>) -> Result<R>) -> Result<R> {
    if self.engine.is_some() && self.interrupt.is_interrupted() {
      self.teardown("interrupted");
      return Err(Error::Interrupted);
    }
    let engine = self.engine.as_ref().ok_or(Error::Closed)?;
    let result = engine.context.with(op);
    if self.interrupt.is_interrupted() {
      self.teardown("interrupted");
      return Err(Error::Interrupted);
    }
    result
  }

  fn teardown(&mut self, reason: &'static str) {
    if let Some(engine) = self.engine.take() {
      drop(engine);
      tracing::debug!(reason, "tore down context");
    }
  }
}

fn call<'js>(
  ctx: &Ctx<'js>,
  function: &Function<'js>,
  this: rquickjs::Value<'js>,
  args: &[Value],
) -> rquickjs::Result<rquickjs::Value<'js>> {
  let mut call_args = Args::new(ctx.clone(), args.len());
  call_args.this(this)?;
  for arg in args {
    call_args.push_arg(to_engine(ctx, arg)?)?;
  }
  function.call_arg(call_args)
}

impl Drop for Context {
  fn drop(&mut self) {
    self.teardown("dropped");
  }
}
