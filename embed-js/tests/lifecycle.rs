use embed_js::{Context, ContextOptions, Error, ErrorKind, Value};

#[test]
fn closed_context_rejects_every_operation() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  ctx.execute("var a = 1; function f() { return a; }", "setup.js")?;
  assert!(!ctx.is_closed());

  ctx.close();
  assert!(ctx.is_closed());
  assert_eq!(ctx.evaluate("a", "closed.js"), Err(Error::Closed));
  assert_eq!(ctx.execute("a", "closed.js"), Err(Error::Closed));
  assert_eq!(ctx.get_property("a"), Err(Error::Closed));
  assert_eq!(ctx.call_property("f", &[]), Err(Error::Closed));
  assert_eq!(ctx.run_gc(), Err(Error::Closed));
  Ok(())
}

#[test]
fn close_is_idempotent() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  ctx.close();
  ctx.close();
  assert!(ctx.is_closed());
  // Dropping after an explicit close must not tear down again.
  drop(ctx);
  Ok(())
}

#[test]
fn contexts_are_isolated() -> Result<(), Error> {
  let mut a = Context::new()?;
  let mut b = Context::new()?;
  a.execute("var onlyInA = 1", "a.js")?;
  assert_eq!(a.get_property("onlyInA")?, Value::Number(1.0));
  assert_eq!(
    b.get_property("onlyInA").unwrap_err().kind(),
    Some(ErrorKind::Reference)
  );
  Ok(())
}

#[test]
fn many_contexts_come_and_go() -> Result<(), Error> {
  for i in 0..50 {
    let mut ctx = Context::new()?;
    ctx.execute(&format!("var i = {i}"), "loop.js")?;
    assert_eq!(ctx.get_property("i")?, Value::from(i));
  }
  Ok(())
}

#[test]
fn values_outlive_their_context() -> Result<(), Error> {
  let value = {
    let mut ctx = Context::new()?;
    ctx.evaluate("({ list: [1, 2], f: function() {} })", "outlive.js")?
  };
  let object = value.as_object().expect("object");
  assert_eq!(
    object["list"],
    Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])
  );
  assert!(object["f"].is_opaque());
  Ok(())
}

#[test]
fn run_gc_keeps_globals() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  ctx.execute(
    "var keep = { n: 1 };
     var garbage = [];
     for (var i = 0; i < 1000; i++) garbage.push({ i: i });
     garbage = null;",
    "gc.js",
  )?;
  ctx.run_gc()?;
  assert_eq!(ctx.evaluate("keep.n", "gc.js")?, Value::Number(1.0));
  Ok(())
}

#[test]
fn strict_mode_option() -> Result<(), Error> {
  let mut ctx = Context::with_options(ContextOptions {
    strict: true,
    ..ContextOptions::default()
  })?;
  assert!(ctx.options().strict);
  let error = ctx.execute("undeclared = 1", "strict.js").unwrap_err();
  assert_eq!(error.kind(), Some(ErrorKind::Reference));
  Ok(())
}

#[test]
fn memory_limit_option() -> Result<(), Error> {
  let mut ctx = Context::with_options(ContextOptions {
    memory_limit: Some(4 * 1024 * 1024),
    ..ContextOptions::default()
  })?;
  let result = ctx.execute(
    "var chunks = []; while (true) chunks.push(new Array(100000).fill(1));",
    "oom.js",
  );
  assert!(result.is_err());
  Ok(())
}
