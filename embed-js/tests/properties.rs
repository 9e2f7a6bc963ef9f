use embed_js::{Context, Error, ErrorKind, Map, Value};

#[test]
fn reads_global_values() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  ctx.execute("var config = { name: 'demo', ports: [80, 443] }", "config.js")?;
  let config = ctx.get_property("config")?;
  let config = config.as_object().expect("object");
  assert_eq!(config["name"], Value::from("demo"));
  assert_eq!(
    config["ports"],
    Value::Array(vec![Value::Number(80.0), Value::Number(443.0)])
  );
  Ok(())
}

#[test]
fn missing_property_is_reference_error() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  let error = ctx.get_property("nope").unwrap_err();
  assert_eq!(error.kind(), Some(ErrorKind::Reference));
  assert_eq!(error.to_string(), "ReferenceError: no such prop: nope");
  Ok(())
}

#[test]
fn property_holding_undefined_exists() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  ctx.execute("var u = undefined", "u.js")?;
  assert_eq!(ctx.get_property("u")?, Value::Null);
  Ok(())
}

#[test]
fn lexical_bindings_are_not_global_properties() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  ctx.execute("let scoped = 1; const fixed = 2;", "lexical.js")?;
  assert_eq!(
    ctx.get_property("scoped").unwrap_err().kind(),
    Some(ErrorKind::Reference)
  );
  assert_eq!(ctx.evaluate("scoped + fixed", "read.js")?, Value::Number(3.0));
  Ok(())
}

#[test]
fn builtins_are_visible() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  assert!(ctx.get_property("parseInt")?.is_opaque());
  assert!(ctx.get_property("Date")?.is_opaque());
  // Namespace objects are plain objects whose members are all non-enumerable.
  assert_eq!(ctx.get_property("Math")?, Value::Object(Map::new()));
  Ok(())
}

#[test]
fn throwing_getter_is_translated() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  ctx.execute(
    "Object.defineProperty(globalThis, 'trap', { get() { throw new TypeError('no reading'); } })",
    "trap.js",
  )?;
  let error = ctx.get_property("trap").unwrap_err();
  assert_eq!(error.kind(), Some(ErrorKind::Type));
  assert_eq!(error.as_js().map(|e| e.message()), Some("no reading"));
  Ok(())
}
