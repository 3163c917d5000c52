//! Weakly typed coercion of extracted values into destination types
//!
//! [`Value`] implements [`serde::Deserializer`], converting text into whatever
//! scalar the destination field asks for:
//! - numbers are parsed from trimmed text, empty text is zero
//! - booleans accept `1 t T TRUE true True` and `0 f F FALSE false False`, empty is false
//! - a single value is accepted where a sequence is expected
//! - unit enum variants are selected by name

use std::any::type_name;
use std::fmt::Display;
use std::str::FromStr;

use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};
use serde::ser;
use serde::{forward_to_deserialize_any, Deserializer};
use thiserror::Error;

use crate::error::{Result, ScrapeError};
use crate::value::{FieldMap, Value};

/// Error raised while deserializing from a [`Value`]
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CoerceError(String);

impl de::Error for CoerceError {
    fn custom<T: Display>(msg: T) -> Self {
        CoerceError(msg.to_string())
    }
}

impl ser::Error for CoerceError {
    fn custom<T: Display>(msg: T) -> Self {
        CoerceError(msg.to_string())
    }
}

impl From<CoerceError> for ScrapeError {
    fn from(err: CoerceError) -> Self {
        ScrapeError::Coercion(err.0)
    }
}

/// Assign an extracted field map to a freshly built `T`
pub fn from_field_map<T: DeserializeOwned>(map: FieldMap) -> Result<T> {
    Ok(T::deserialize(Value::Record(map))?)
}

fn parse_number<T>(text: &str) -> std::result::Result<T, CoerceError>
where
    T: FromStr + Default,
    T::Err: Display,
{
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    trimmed
        .parse()
        .map_err(|e| CoerceError(format!("cannot parse {text:?} as {}: {e}", type_name::<T>())))
}

fn parse_bool(text: &str) -> std::result::Result<bool, CoerceError> {
    match text.trim() {
        "" | "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        _ => Err(CoerceError(format!("cannot parse {text:?} as bool"))),
    }
}

fn visit_texts<'de, V: Visitor<'de>>(
    items: Vec<String>,
    visitor: V,
) -> std::result::Result<V::Value, CoerceError> {
    let mut seq = SeqDeserializer::<_, CoerceError>::new(items.into_iter().map(Value::Text));
    let value = visitor.visit_seq(&mut seq)?;
    seq.end()?;
    Ok(value)
}

fn visit_records<'de, V: Visitor<'de>>(
    items: Vec<FieldMap>,
    visitor: V,
) -> std::result::Result<V::Value, CoerceError> {
    let mut seq = SeqDeserializer::<_, CoerceError>::new(items.into_iter().map(Value::Record));
    let value = visitor.visit_seq(&mut seq)?;
    seq.end()?;
    Ok(value)
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CoerceError> {
                match self {
                    Value::Text(text) => visitor.$visit(parse_number::<$ty>(&text)?),
                    other => other.deserialize_any(visitor),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = CoerceError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CoerceError> {
        match self {
            Value::Text(text) => visitor.visit_string(text),
            Value::Texts(items) => visit_texts(items, visitor),
            Value::Record(map) => {
                let mut access = MapDeserializer::<_, CoerceError>::new(map.into_iter());
                let value = visitor.visit_map(&mut access)?;
                access.end()?;
                Ok(value)
            }
            Value::Records(items) => visit_records(items, visitor),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CoerceError> {
        match self {
            Value::Text(text) => visitor.visit_bool(parse_bool(&text)?),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CoerceError> {
        match self {
            Value::Text(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(CoerceError(format!("cannot parse {text:?} as char"))),
                }
            }
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CoerceError> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, CoerceError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CoerceError> {
        match self {
            Value::Text(text) => visit_texts(vec![text], visitor),
            Value::Record(map) => visit_records(vec![map], visitor),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> std::result::Result<V::Value, CoerceError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, CoerceError> {
        match self {
            Value::Text(text) => {
                let variant: StringDeserializer<CoerceError> = text.trim().to_string().into_deserializer();
                visitor.visit_enum(variant)
            }
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, CoerceError> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        str string bytes byte_buf unit unit_struct tuple_struct map struct identifier
    }
}

impl<'de> IntoDeserializer<'de, CoerceError> for Value {
    type Deserializer = Value;

    fn into_deserializer(self) -> Value {
        self
    }
}
