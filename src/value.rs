//! Dynamic value model for activity arguments, results and heartbeat details.

use crate::{
    errors::SerializationError,
    types::{FunctionSignature, TypeTag},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deepest nesting of lists, maps and structs a value may have and still be encoded. Each level
/// costs up to three JSON levels and the decoder stops at 128.
pub const MAX_NESTING_DEPTH: usize = 32;

/// A single argument, result or heartbeat detail.
///
/// The last four variants exist so call sites can describe values that are *not* data. They
/// take part in signature validation but any attempt to encode them fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Struct {
        name: String,
        fields: BTreeMap<String, Value>,
    },
    #[serde(skip)]
    Callable(FunctionSignature),
    #[serde(skip)]
    Channel(TypeTag),
    #[serde(skip)]
    Variadic(Vec<Value>),
    #[serde(skip)]
    RawPointer(usize),
}

impl Value {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    pub fn structure<K: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Self::Struct {
            name: name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The runtime type of this value. Containers report a precise element type when all their
    /// elements agree, and `any` otherwise.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::optional(TypeTag::Any),
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::UInt(_) => TypeTag::UInt,
            Value::Float(_) => TypeTag::Float,
            Value::String(_) => TypeTag::String,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::List(items) => TypeTag::list(common_tag(items.iter())),
            Value::Map(entries) => TypeTag::map(common_tag(entries.values())),
            Value::Struct { name, .. } => TypeTag::Struct(name.clone()),
            Value::Callable(sig) => TypeTag::function(sig.clone()),
            Value::Channel(t) => TypeTag::Channel(Box::new(t.clone())),
            Value::Variadic(items) => TypeTag::Variadic(Box::new(common_tag(items.iter()))),
            Value::RawPointer(_) => TypeTag::RawPointer,
        }
    }

    /// Returns true if this value may be assigned to a slot declared with type `declared`
    pub fn conforms_to(&self, declared: &TypeTag) -> bool {
        match (declared, self) {
            (TypeTag::Any, _) => true,
            (TypeTag::Optional(_), Value::Null) => true,
            (TypeTag::Optional(inner), v) => v.conforms_to(inner),
            (TypeTag::Bool, Value::Bool(_))
            | (TypeTag::Int, Value::Int(_))
            | (TypeTag::UInt, Value::UInt(_))
            | (TypeTag::Float, Value::Float(_))
            | (TypeTag::String, Value::String(_))
            | (TypeTag::Bytes, Value::Bytes(_))
            | (TypeTag::RawPointer, Value::RawPointer(_)) => true,
            (TypeTag::List(t), Value::List(items))
            | (TypeTag::Variadic(t), Value::Variadic(items)) => {
                items.iter().all(|i| i.conforms_to(t))
            }
            (TypeTag::Map(t), Value::Map(entries)) => entries.values().all(|v| v.conforms_to(t)),
            (TypeTag::Struct(expected), Value::Struct { name, .. }) => expected == name,
            (TypeTag::Function(expected), Value::Callable(sig)) => **expected == *sig,
            (TypeTag::Channel(expected), Value::Channel(t)) => **expected == *t,
            _ => false,
        }
    }

    /// Confirms this value survives an encode/decode round trip. Fails on the first nested value
    /// which is not data, on non-finite floats, and on containers nested more than
    /// [MAX_NESTING_DEPTH] deep.
    pub fn check_encodable(&self) -> Result<(), SerializationError> {
        self.check_encodable_at(0)
    }

    fn check_encodable_at(&self, depth: usize) -> Result<(), SerializationError> {
        let children: Box<dyn Iterator<Item = &Value> + '_> = match self {
            Value::Callable(_) | Value::Channel(_) | Value::Variadic(_) | Value::RawPointer(_) => {
                return Err(SerializationError::Unsupported {
                    kind: self.type_tag(),
                })
            }
            Value::Float(f) if !f.is_finite() => {
                return Err(SerializationError::NonFiniteFloat(*f))
            }
            Value::List(items) => Box::new(items.iter()),
            Value::Map(entries) | Value::Struct {
                fields: entries, ..
            } => Box::new(entries.values()),
            _ => return Ok(()),
        };
        if depth >= MAX_NESTING_DEPTH {
            return Err(SerializationError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        children.map(|c| c.check_encodable_at(depth + 1)).collect()
    }

    /// Converts any serde-serializable type into a value. Objects become maps, since the name of
    /// the source type is not available.
    pub fn from_serialize<T: Serialize + ?Sized>(val: &T) -> Result<Self, SerializationError> {
        Ok(Self::from_json(serde_json::to_value(val)?))
    }

    /// Converts this value into any serde-deserializable type
    pub fn deserialize_into<T: DeserializeOwned>(self) -> Result<T, SerializationError> {
        Ok(serde_json::from_value(self.into_json()?)?)
    }

    fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    fn into_json(self) -> Result<serde_json::Value, SerializationError> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => i.into(),
            Value::UInt(u) => u.into(),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .ok_or(SerializationError::NonFiniteFloat(f))?,
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(b) => b.into(),
            Value::List(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(Value::into_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(entries) | Value::Struct {
                fields: entries, ..
            } => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((k, v.into_json()?)))
                    .collect::<Result<_, SerializationError>>()?,
            ),
            v @ (Value::Callable(_)
            | Value::Channel(_)
            | Value::Variadic(_)
            | Value::RawPointer(_)) => {
                return Err(SerializationError::Unsupported { kind: v.type_tag() })
            }
        })
    }
}

fn common_tag<'a>(mut values: impl Iterator<Item = &'a Value>) -> TypeTag {
    let first = match values.next() {
        Some(v) => v.type_tag(),
        None => return TypeTag::Any,
    };
    if values.all(|v| v.type_tag() == first) {
        first
    } else {
        TypeTag::Any
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(<$conv>::from(v))
                }
            }
        )*
    };
}

value_from!(
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => String as String,
    &str => String as String,
);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::ContextKind;
    use assert_matches::assert_matches;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Order {
        id: u32,
        lines: Vec<String>,
        note: Option<String>,
    }

    #[test]
    fn runtime_tags() {
        assert_eq!(Value::from(vec![1, 2]).type_tag(), TypeTag::list(TypeTag::Int));
        assert_eq!(
            Value::List(vec![Value::Int(1), "a".into()]).type_tag(),
            TypeTag::list(TypeTag::Any)
        );
        assert_eq!(
            Value::structure("Order", [("id", Value::Int(1))]).type_tag(),
            TypeTag::structure("Order")
        );
    }

    #[test]
    fn conformance() {
        assert!(Value::Int(1).conforms_to(&TypeTag::Int));
        assert!(!Value::Int(1).conforms_to(&TypeTag::Float));
        assert!(!Value::UInt(1).conforms_to(&TypeTag::Int));
        assert!(Value::Null.conforms_to(&TypeTag::optional(TypeTag::String)));
        assert!(Value::from("x").conforms_to(&TypeTag::optional(TypeTag::String)));
        assert!(!Value::Null.conforms_to(&TypeTag::String));
        assert!(Value::List(vec![]).conforms_to(&TypeTag::list(TypeTag::Struct("A".into()))));
        assert!(!Value::from(vec!["a"]).conforms_to(&TypeTag::list(TypeTag::Int)));
        assert!(Value::RawPointer(0).conforms_to(&TypeTag::Any));
        assert!(!Value::structure("A", Vec::<(String, Value)>::new())
            .conforms_to(&TypeTag::structure("B")));
        assert!(!Value::Int(1).conforms_to(&TypeTag::Context(ContextKind::Activity)));
    }

    fn nested_lists(depth: usize) -> Value {
        (0..depth).fold(Value::Int(1), |inner, _| Value::List(vec![inner]))
    }

    #[test]
    fn unsupported_is_found_when_nested() {
        let v = Value::Map(
            [(
                "inner".to_string(),
                Value::List(vec![Value::Int(1), Value::Channel(TypeTag::Int)]),
            )]
            .into_iter()
            .collect(),
        );
        assert_matches!(
            v.check_encodable(),
            Err(SerializationError::Unsupported { kind: TypeTag::Channel(_) })
        );
        assert!(Value::from(vec![1, 2]).check_encodable().is_ok());
    }

    #[test]
    fn non_finite_floats_are_not_encodable() {
        for f in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert_matches!(
                Value::structure("Reading", [("v", Value::Float(f))]).check_encodable(),
                Err(SerializationError::NonFiniteFloat(_))
            );
        }
        assert!(Value::Float(f64::MAX).check_encodable().is_ok());
    }

    #[test]
    fn nesting_depth_is_bounded() {
        assert!(nested_lists(MAX_NESTING_DEPTH).check_encodable().is_ok());
        assert_matches!(
            nested_lists(MAX_NESTING_DEPTH + 1).check_encodable(),
            Err(SerializationError::NestingTooDeep { max: MAX_NESTING_DEPTH })
        );
    }

    #[test]
    fn serde_bridge() {
        let order = Order {
            id: 7,
            lines: vec!["a".to_string(), "b".to_string()],
            note: None,
        };
        let v = Value::from_serialize(&order).unwrap();
        assert_matches!(&v, Value::Map(m) if m.get("id") == Some(&Value::Int(7)));
        let back: Order = v.deserialize_into().unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn serde_bridge_rejects_non_data() {
        let res = Value::List(vec![Value::RawPointer(3)]).deserialize_into::<Vec<u64>>();
        assert_matches!(
            res,
            Err(SerializationError::Unsupported {
                kind: TypeTag::RawPointer
            })
        );
        assert_matches!(
            Value::Float(f64::INFINITY).deserialize_into::<f64>(),
            Err(SerializationError::NonFiniteFloat(_))
        );
    }
}
