use embed_js::{Context, Error, ErrorKind, Value};

#[test]
fn module_globals_are_undefined() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  for name in ["require", "module", "exports"] {
    assert_eq!(
      ctx.evaluate(&format!("typeof {name}"), "modules.js")?,
      Value::from("undefined"),
      "{name}"
    );
    assert_eq!(
      ctx.get_property(name).unwrap_err().kind(),
      Some(ErrorKind::Reference)
    );
  }
  Ok(())
}

#[test]
fn static_imports_are_rejected() -> Result<(), Error> {
  let mut ctx = Context::new()?;
  let error = ctx
    .execute("import thing from 'thing';", "import.js")
    .unwrap_err();
  assert_eq!(error.kind(), Some(ErrorKind::Syntax));
  Ok(())
}
