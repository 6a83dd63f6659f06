//! Core value types shared by the flattener and the rehydrator
//!
//! - [`Record`] is the plain, transport-friendly side: nested maps, sequences
//!   and scalars only.
//! - [`Field`] is the borrowed view of an object's field while flattening; it
//!   may still point at other objects.
//! - [`Dynamic`] is what the rehydrator hands to constructors and setters; it
//!   may own rebuilt objects.

use crate::object::Object;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Plain nested record: field name to scalar, sequence or sub-record
pub type Record = Map<String, Value>;

/// A field value as seen by the flattener
#[derive(Debug)]
pub enum Field<'a> {
    /// The absence marker
    Null,
    /// Scalar or already-plain data; strings live here and are never iterated
    Value(Value),
    /// A composite object with its own field set
    Object(&'a dyn Object),
    /// A keyed mapping whose values may hold objects
    Record(Vec<(String, Field<'a>)>),
    /// An ordered collection
    Sequence(Vec<Field<'a>>),
    /// An unordered collection, emitted as a sequence in iteration order
    Set(Vec<Field<'a>>),
}

impl<'a> Field<'a> {
    /// Wrap a plain value; JSON null becomes [`Field::Null`]
    pub fn value(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => Field::Null,
            other => Field::Value(other),
        }
    }

    /// Wrap a composite object
    pub fn object(object: &'a dyn Object) -> Self {
        Field::Object(object)
    }

    /// Wrap an optional composite object
    pub fn maybe_object<T: Object>(object: Option<&'a T>) -> Self {
        match object {
            Some(object) => Field::Object(object),
            None => Field::Null,
        }
    }

    /// Wrap a sequence of composite objects
    pub fn objects<T, I>(objects: I) -> Self
    where
        T: Object,
        I: IntoIterator<Item = &'a T>,
    {
        Field::Sequence(
            objects
                .into_iter()
                .map(|object| Field::Object(object as &dyn Object))
                .collect(),
        )
    }

    /// Build a record field from key/field pairs
    pub fn record<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Field<'a>)>,
    {
        Field::Record(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check for the absence marker
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null | Field::Value(Value::Null))
    }
}

/// Conversion of ordinary Rust field types into a [`Field`]
pub trait ToField {
    fn to_field(&self) -> Field<'_>;
}

macro_rules! impl_to_field_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToField for $ty {
                fn to_field(&self) -> Field<'_> {
                    Field::value(self.clone())
                }
            }
        )*
    };
}

impl_to_field_scalar!(String, bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl ToField for str {
    fn to_field(&self) -> Field<'_> {
        Field::Value(Value::String(self.to_string()))
    }
}

impl ToField for Value {
    fn to_field(&self) -> Field<'_> {
        Field::value(self.clone())
    }
}

impl<T: ToField> ToField for Option<T> {
    fn to_field(&self) -> Field<'_> {
        match self {
            Some(inner) => inner.to_field(),
            None => Field::Null,
        }
    }
}

impl<T: ToField> ToField for Vec<T> {
    fn to_field(&self) -> Field<'_> {
        Field::Sequence(self.iter().map(ToField::to_field).collect())
    }
}

impl<T: ToField> ToField for BTreeSet<T> {
    fn to_field(&self) -> Field<'_> {
        Field::Set(self.iter().map(ToField::to_field).collect())
    }
}

impl<T: ToField> ToField for HashSet<T> {
    fn to_field(&self) -> Field<'_> {
        Field::Set(self.iter().map(ToField::to_field).collect())
    }
}

impl<T: ToField> ToField for BTreeMap<String, T> {
    fn to_field(&self) -> Field<'_> {
        Field::Record(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_field()))
                .collect(),
        )
    }
}

impl<T: ToField> ToField for HashMap<String, T> {
    fn to_field(&self) -> Field<'_> {
        Field::Record(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_field()))
                .collect(),
        )
    }
}

impl ToField for Dynamic {
    fn to_field(&self) -> Field<'_> {
        match self {
            Dynamic::Value(value) => Field::value(value.clone()),
            Dynamic::Object(object) => Field::Object(object.as_ref()),
            Dynamic::Sequence(items) => {
                Field::Sequence(items.iter().map(ToField::to_field).collect())
            }
        }
    }
}

/// A value produced by rehydration
#[derive(Debug, Clone)]
pub enum Dynamic {
    /// Plain data straight from the record
    Value(Value),
    /// A rebuilt object (typed, or a [`Namespace`](crate::Namespace))
    Object(Box<dyn Object>),
    /// A sequence whose elements were rehydrated one by one
    Sequence(Vec<Dynamic>),
}

impl Dynamic {
    /// The absence value
    pub fn null() -> Self {
        Dynamic::Value(Value::Null)
    }

    /// Check for the absence value
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Value(Value::Null))
    }

    /// Borrow the plain value, if this is one
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Dynamic::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow a string value
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// Borrow the object, if this is one
    pub fn as_object(&self) -> Option<&dyn Object> {
        match self {
            Dynamic::Object(object) => Some(object.as_ref()),
            _ => None,
        }
    }

    /// Borrow the object as a concrete type
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_object()
            .and_then(|object| object.downcast_ref::<T>())
    }

    /// View as a flattener field
    pub fn to_field(&self) -> Field<'_> {
        ToField::to_field(self)
    }

    /// Short description of the shape, for error messages
    pub fn kind(&self) -> String {
        match self {
            Dynamic::Value(Value::Null) => "null".to_string(),
            Dynamic::Value(Value::Bool(_)) => "bool".to_string(),
            Dynamic::Value(Value::Number(_)) => "number".to_string(),
            Dynamic::Value(Value::String(_)) => "string".to_string(),
            Dynamic::Value(Value::Array(_)) => "array".to_string(),
            Dynamic::Value(Value::Object(_)) => "record".to_string(),
            Dynamic::Object(object) => object.type_name().to_string(),
            Dynamic::Sequence(_) => "sequence".to_string(),
        }
    }
}

impl From<Value> for Dynamic {
    fn from(value: Value) -> Self {
        Dynamic::Value(value)
    }
}

impl From<Box<dyn Object>> for Dynamic {
    fn from(object: Box<dyn Object>) -> Self {
        Dynamic::Object(object)
    }
}

/// Conversion from a rehydrated value into an ordinary Rust type
///
/// On mismatch the original value is handed back so callers can report
/// what they actually found.
pub trait FromDynamic: Sized {
    /// Name of the expected shape, for error messages
    fn expected() -> String;

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic>;
}

impl FromDynamic for Dynamic {
    fn expected() -> String {
        "any".to_string()
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        Ok(value)
    }
}

impl FromDynamic for Value {
    fn expected() -> String {
        "plain value".to_string()
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        match value {
            Dynamic::Value(value) => Ok(value),
            other => Err(other),
        }
    }
}

impl FromDynamic for String {
    fn expected() -> String {
        "string".to_string()
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        match value {
            Dynamic::Value(Value::String(s)) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromDynamic for bool {
    fn expected() -> String {
        "bool".to_string()
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        match value {
            Dynamic::Value(Value::Bool(b)) => Ok(b),
            other => Err(other),
        }
    }
}

macro_rules! impl_from_dynamic_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromDynamic for $ty {
                fn expected() -> String {
                    stringify!($ty).to_string()
                }

                fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
                    let converted = match &value {
                        Dynamic::Value(Value::Number(n)) => n
                            .as_i64()
                            .and_then(|n| <$ty>::try_from(n).ok())
                            .or_else(|| n.as_u64().and_then(|n| <$ty>::try_from(n).ok())),
                        _ => None,
                    };
                    converted.ok_or(value)
                }
            }
        )*
    };
}

impl_from_dynamic_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromDynamic for f64 {
    fn expected() -> String {
        "f64".to_string()
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        match &value {
            Dynamic::Value(Value::Number(n)) => n.as_f64().ok_or(value),
            _ => Err(value),
        }
    }
}

impl FromDynamic for Record {
    fn expected() -> String {
        "record".to_string()
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        match value {
            Dynamic::Value(Value::Object(map)) => Ok(map),
            other => Err(other),
        }
    }
}

impl<T: FromDynamic> FromDynamic for Option<T> {
    fn expected() -> String {
        format!("optional {}", T::expected())
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_dynamic(value).map(Some)
    }
}

impl<T: FromDynamic> FromDynamic for Vec<T> {
    fn expected() -> String {
        format!("sequence of {}", T::expected())
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        let items = match value {
            Dynamic::Sequence(items) => items,
            Dynamic::Value(Value::Array(items)) => items.into_iter().map(Dynamic::Value).collect(),
            other => return Err(other),
        };
        // Convert a copy first so a mismatch can hand back the original
        let original = Dynamic::Sequence(items.clone());
        items
            .into_iter()
            .map(T::from_dynamic)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| original)
    }
}

impl<T: Object> FromDynamic for Box<T> {
    fn expected() -> String {
        std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("object")
            .to_string()
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, Dynamic> {
        match value {
            Dynamic::Object(object) => object.downcast::<T>().map_err(Dynamic::Object),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Namespace;
    use serde_json::json;

    #[test]
    fn test_field_value_maps_null() {
        assert!(Field::value(Value::Null).is_null());
        assert!(!Field::value("text").is_null());
        assert!(None::<String>.to_field().is_null());
    }

    #[test]
    fn test_string_is_a_plain_value() {
        let name = "a long string that must stay whole".to_string();
        match name.to_field() {
            Field::Value(Value::String(s)) => assert_eq!(s, name),
            other => panic!("unexpected field {:?}", other),
        }
    }

    #[test]
    fn test_sets_become_set_fields() {
        let tags: BTreeSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        assert!(matches!(
            tags.to_field(),
            Field::Set(items) if items.len() == 2
        ));
    }

    #[test]
    fn test_from_dynamic_scalars() {
        assert_eq!(String::from_dynamic(json!("x").into()).unwrap(), "x");
        assert_eq!(i64::from_dynamic(json!(42).into()).unwrap(), 42);
        let err = u8::from_dynamic(json!(300).into()).unwrap_err();
        assert_eq!(err.kind(), "number");
        assert_eq!(f64::from_dynamic(json!(1.5).into()).unwrap(), 1.5);
        assert!(bool::from_dynamic(json!("true").into()).is_err());
    }

    #[test]
    fn test_from_dynamic_option_and_vec() {
        let absent = Option::<String>::from_dynamic(Dynamic::null()).unwrap();
        assert_eq!(absent, None);

        let strings: Dynamic = json!(["a", "b"]).into();
        assert_eq!(
            Vec::<String>::from_dynamic(strings).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        let mixed: Dynamic = json!(["a", 1]).into();
        let err = Vec::<String>::from_dynamic(mixed).unwrap_err();
        assert_eq!(err.kind(), "sequence");
    }

    #[test]
    fn test_from_dynamic_boxed_object() {
        let dynamic = Dynamic::Object(Box::new(Namespace::new()));
        assert!(Box::<Namespace>::from_dynamic(dynamic).is_ok());
        assert!(Box::<Namespace>::from_dynamic(json!({}).into()).is_err());
    }

    #[test]
    fn test_dynamic_kind() {
        assert_eq!(Dynamic::null().kind(), "null");
        assert_eq!(Dynamic::from(json!({"a": 1})).kind(), "record");
        let namespace = Dynamic::Object(Box::new(Namespace::new()));
        assert_eq!(namespace.kind(), "namespace");
    }
}
