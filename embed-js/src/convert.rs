use crate::error::translate;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::JsError;
use crate::interrupt::InterruptToken;
use crate::value::Map;
use crate::value::Value;
use rquickjs::object::Property;
use rquickjs::Array;
use rquickjs::Ctx;
use rquickjs::Object;
use rquickjs::Type;

/// Arrays and objects nested deeper than this read back as the complex object marker.
pub const MAX_CONVERSION_DEPTH: usize = 512;

/// Check that host arguments can cross into the engine. Runs before any engine allocation.
pub(crate) fn validate_args(args: &[Value]) -> crate::Result<()> {
  let mut path = String::from("args");
  for (idx, arg) in args.iter().enumerate() {
    let len = path.len();
    path.push_str(&format!("[{idx}]"));
    validate(arg, &mut path, 1)?;
    path.truncate(len);
  }
  Ok(())
}

fn validate(value: &Value, path: &mut String, depth: usize) -> crate::Result<()> {
  match value {
    Value::Opaque(_) => {
      return Err(Error::UnsupportedType {
        type_name: value.type_name(),
        path: path.clone(),
      });
    }
    Value::Array(_) | Value::Object(_) if depth > MAX_CONVERSION_DEPTH => {
      return Err(Error::Js(JsError::new(
        ErrorKind::Range,
        format!("value nested deeper than {MAX_CONVERSION_DEPTH} at {path}"),
      )));
    }
    Value::Array(items) => {
      for (idx, item) in items.iter().enumerate() {
        let len = path.len();
        path.push_str(&format!("[{idx}]"));
        validate(item, path, depth + 1)?;
        path.truncate(len);
      }
    }
    Value::Object(entries) => {
      for (key, item) in entries {
        let len = path.len();
        path.push_str(&format!("[{key:?}]"));
        validate(item, path, depth + 1)?;
        path.truncate(len);
      }
    }
    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
  }
  Ok(())
}

/// Build the engine value for a validated host value. Host `Null` becomes `undefined`.
///
/// Mapping entries become own data properties, so keys such as `__proto__` never reach a setter.
pub(crate) fn to_engine<'js>(
  ctx: &Ctx<'js>,
  value: &Value,
) -> rquickjs::Result<rquickjs::Value<'js>> {
  Ok(match value {
    Value::Null => rquickjs::Value::new_undefined(ctx.clone()),
    Value::Bool(b) => rquickjs::Value::new_bool(ctx.clone(), *b),
    Value::Number(n) => rquickjs::Value::new_number(ctx.clone(), *n),
    Value::String(s) => rquickjs::String::from_str(ctx.clone(), s)?.into_value(),
    Value::Array(items) => {
      let array = Array::new(ctx.clone())?;
      for (idx, item) in items.iter().enumerate() {
        array.set(idx, to_engine(ctx, item)?)?;
      }
      array.into_value()
    }
    Value::Object(entries) => {
      let object = Object::new(ctx.clone())?;
      for (key, item) in entries {
        let item = Property::from(to_engine(ctx, item)?)
          .writable()
          .enumerable()
          .configurable();
        object.prop(key.as_str(), item)?;
      }
      object.into_value()
    }
    Value::Opaque(_) => return Err(rquickjs::Error::new_into_js("ComplexObject", "value")),
  })
}

struct Reader<'js> {
  ctx: Ctx<'js>,
  interrupt: InterruptToken,
  // Prototype of a fresh `{}`; unaffected by scripts reassigning the global `Object`.
  object_prototype: Option<Object<'js>>,
  // Containers on the current conversion path, for cycle detection.
  path: Vec<Object<'js>>,
}

/// Convert an engine value into its host representation.
///
/// Getters run while reading object properties; their exceptions surface as the returned error.
/// `interrupt` is polled once per array element and object entry, so a watchdog can stop the
/// conversion of very large (or sparse) containers.
pub(crate) fn from_engine<'js>(
  ctx: &Ctx<'js>,
  value: &rquickjs::Value<'js>,
  interrupt: &InterruptToken,
) -> crate::Result<Value> {
  let object_prototype = Object::new(ctx.clone())
    .map_err(|err| translate(ctx, err))?
    .get_prototype();
  let mut reader = Reader {
    ctx: ctx.clone(),
    interrupt: interrupt.clone(),
    object_prototype,
    path: Vec::new(),
  };
  reader.read(value)
}

impl<'js> Reader<'js> {
  fn read(&mut self, value: &rquickjs::Value<'js>) -> crate::Result<Value> {
    match value.type_of() {
      Type::Uninitialized | Type::Undefined | Type::Null => Ok(Value::Null),
      Type::Bool => Ok(value.as_bool().map_or(Value::Null, Value::Bool)),
      Type::Int | Type::Float => Ok(value.as_number().map_or(Value::Null, Value::Number)),
      Type::String => match value.as_string() {
        Some(s) => self.read_string(s),
        None => Ok(Value::Null),
      },
      Type::Array => match value.as_array() {
        Some(array) => self.read_array(array),
        None => Ok(opaque("array")),
      },
      Type::Object => match value.as_object() {
        Some(object) if self.is_plain(object) => self.read_object(object),
        _ => Ok(opaque("object")),
      },
      other => Ok(opaque(other.as_str())),
    }
  }

  fn read_string(&self, s: &rquickjs::String<'js>) -> crate::Result<Value> {
    match s.to_string() {
      Ok(s) => Ok(Value::String(s)),
      Err(rquickjs::Error::Utf8(_)) => {
        let raw = s.clone().to_cstring().map_err(|err| translate(&self.ctx, err))?;
        // SAFETY: `raw` owns the engine's buffer of `raw.len()` bytes until it is dropped.
        let bytes = unsafe { std::slice::from_raw_parts(raw.as_ptr().cast::<u8>(), raw.len()) };
        Ok(Value::String(replace_lone_surrogates(bytes)))
      }
      Err(err) => Err(translate(&self.ctx, err)),
    }
  }

  fn is_plain(&self, object: &Object<'js>) -> bool {
    match object.get_prototype() {
      None => true,
      Some(prototype) => self.object_prototype.as_ref() == Some(&prototype),
    }
  }

  fn check_interrupt(&self) -> crate::Result<()> {
    if self.interrupt.is_interrupted() {
      return Err(Error::Interrupted);
    }
    Ok(())
  }

  // Returns false when `object` cannot be entered: it is already on the path or the path is full.
  fn enter(&mut self, object: &Object<'js>) -> bool {
    if self.path.len() >= MAX_CONVERSION_DEPTH || self.path.contains(object) {
      return false;
    }
    self.path.push(object.clone());
    true
  }

  fn read_array(&mut self, array: &Array<'js>) -> crate::Result<Value> {
    if !self.enter(array) {
      return Ok(opaque("cyclic or deeply nested array"));
    }
    let items = self.read_items(array);
    self.path.pop();
    items.map(Value::Array)
  }

  fn read_items(&mut self, array: &Array<'js>) -> crate::Result<Vec<Value>> {
    let mut items = Vec::new();
    for idx in 0..array.len() {
      self.check_interrupt()?;
      let item: rquickjs::Value = array.get(idx).map_err(|err| translate(&self.ctx, err))?;
      items.push(self.read(&item)?);
    }
    Ok(items)
  }

  fn read_object(&mut self, object: &Object<'js>) -> crate::Result<Value> {
    if !self.enter(object) {
      return Ok(opaque("cyclic or deeply nested object"));
    }
    let entries = self.read_entries(object);
    self.path.pop();
    entries.map(Value::Object)
  }

  fn read_entries(&mut self, object: &Object<'js>) -> crate::Result<Map> {
    let mut entries = Map::new();
    for key in object.keys::<String>() {
      self.check_interrupt()?;
      let key = key.map_err(|err| translate(&self.ctx, err))?;
      let item: rquickjs::Value = object
        .get(key.as_str())
        .map_err(|err| translate(&self.ctx, err))?;
      let item = self.read(&item)?;
      entries.insert(key, item);
    }
    Ok(entries)
  }
}

// The engine writes lone surrogates as three-byte sequences starting `ED A0..=BF`, which are not
// UTF-8. Each one becomes U+FFFD.
fn replace_lone_surrogates(bytes: &[u8]) -> String {
  let mut out = Vec::with_capacity(bytes.len());
  let mut idx = 0;
  while idx < bytes.len() {
    let lead = bytes[idx] == 0xED;
    if lead && bytes.get(idx + 1).is_some_and(|b| (0xA0..=0xBF).contains(b)) {
      out.extend_from_slice("\u{FFFD}".as_bytes());
      idx += 3;
    } else {
      out.push(bytes[idx]);
      idx += 1;
    }
  }
  String::from_utf8_lossy(&out).into_owned()
}

fn opaque(js_type: &str) -> Value {
  tracing::trace!(js_type, "converted to complex object marker");
  Value::opaque()
}
