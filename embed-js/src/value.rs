use crate::complex::ComplexObject;
use derive_more::derive::{From, TryInto};
use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;
use serde::Serialize;
use serde::Serializer;
use std::sync::Arc;

/// String-keyed mapping produced from JS objects. Key order is not preserved.
pub type Map = ahash::AHashMap<String, Value>;

/// A host-side JavaScript value.
///
/// This is the only shape values take on the host side of the boundary. JS values with no faithful
/// representation read back as [`Value::Opaque`].
#[derive(Clone, Debug, PartialEq, From, TryInto)]
pub enum Value {
  /// JS `null` or `undefined`.
  #[from(skip)]
  Null,
  Bool(bool),
  /// Every JS number, integer-valued or not.
  Number(f64),
  String(String),
  Array(Vec<Value>),
  Object(Map),
  /// The shared [`ComplexObject`] marker.
  Opaque(Arc<ComplexObject>),
}

macro_rules! impl_from_number {
  ($($ty:ty),*) => {
    $(
      impl From<$ty> for Value {
        fn from(value: $ty) -> Self {
          Value::Number(value as f64)
        }
      }
    )*
  };
}

impl_from_number!(f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::String(value.to_string())
  }
}

impl From<()> for Value {
  fn from(_: ()) -> Self {
    Value::Null
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(value: Option<T>) -> Self {
    value.map_or(Value::Null, Into::into)
  }
}

impl From<serde_json::Value> for Value {
  fn from(value: serde_json::Value) -> Self {
    match value {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
      serde_json::Value::String(s) => Value::String(s),
      serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
      serde_json::Value::Object(entries) => Value::Object(
        entries
          .into_iter()
          .map(|(key, value)| (key, Value::from(value)))
          .collect(),
      ),
    }
  }
}

impl Value {
  /// The shared marker, wrapped as a value.
  pub fn opaque() -> Self {
    Value::Opaque(ComplexObject::instance())
  }

  /// Host type name of this value, as used in conversion errors.
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "Null",
      Value::Bool(_) => "Boolean",
      Value::Number(_) => "Number",
      Value::String(_) => "String",
      Value::Array(_) => "Array",
      Value::Object(_) => "Object",
      Value::Opaque(_) => "ComplexObject",
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn is_opaque(&self) -> bool {
    matches!(self, Value::Opaque(_))
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&[Value]> {
    match self {
      Value::Array(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_object(&self) -> Option<&Map> {
    match self {
      Value::Object(entries) => Some(entries),
      _ => None,
    }
  }

  /// Convert into a JSON value. Non-finite numbers and opaque markers become `null`.
  pub fn to_json(&self) -> serde_json::Value {
    match self {
      Value::Null | Value::Opaque(_) => serde_json::Value::Null,
      Value::Bool(b) => serde_json::Value::Bool(*b),
      Value::Number(n) => serde_json::Number::from_f64(*n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null),
      Value::String(s) => serde_json::Value::String(s.clone()),
      Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
      Value::Object(entries) => serde_json::Value::Object(
        entries
          .iter()
          .map(|(key, value)| (key.clone(), value.to_json()))
          .collect(),
      ),
    }
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Value::Null => serializer.serialize_none(),
      Value::Bool(b) => serializer.serialize_bool(*b),
      Value::Number(n) => serializer.serialize_f64(*n),
      Value::String(s) => serializer.serialize_str(s),
      Value::Array(items) => {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
          seq.serialize_element(item)?;
        }
        seq.end()
      }
      Value::Object(entries) => {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
          map.serialize_entry(key, value)?;
        }
        map.end()
      }
      Value::Opaque(_) => serializer.serialize_unit_struct("ComplexObject"),
    }
  }
}
