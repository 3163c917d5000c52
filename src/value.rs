//! Loosely typed intermediate values
//!
//! Extraction collects everything as text (or nested maps of text) first;
//! coercion into the destination type happens once the whole record is known.

use indexmap::IndexMap;
use serde::ser::{self, Impossible};
use serde::Serialize;

use crate::coerce::CoerceError;
use crate::error::{Result, ScrapeError};

/// Field name -> extracted value, in field declaration order
pub type FieldMap = IndexMap<String, Value>;

/// One extracted field value before coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Texts(Vec<String>),
    Record(FieldMap),
    Records(Vec<FieldMap>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&FieldMap> {
        match self {
            Value::Record(map) => Some(map),
            _ => None,
        }
    }

    /// Number of values held: items for sequences, 1 for a single text or
    /// record regardless of its content (`Text("")` still counts as one)
    pub fn len(&self) -> usize {
        match self {
            Value::Text(_) | Value::Record(_) => 1,
            Value::Texts(items) => items.len(),
            Value::Records(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Turn an already coerced record back into a [`FieldMap`]
///
/// Scalars become text again (floats through `to_string`, so `NaN` and `inf`
/// parse back), fields keep their serialization order and `None` fields are
/// left out, so the result coerces back into the same type.
pub fn to_field_map<T: Serialize>(record: &T) -> Result<FieldMap> {
    match record.serialize(ValueSerializer)? {
        Some(Value::Record(map)) => Ok(map),
        Some(other) => Err(ScrapeError::Coercion(format!(
            "expected a record, got {}",
            other.kind()
        ))),
        None => Err(ScrapeError::Coercion(
            "expected a record, got nothing".to_string(),
        )),
    }
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Texts(_) => "sequence of text",
            Value::Record(_) => "record",
            Value::Records(_) => "sequence of records",
        }
    }
}

type SerResult = std::result::Result<Option<Value>, CoerceError>;

fn text(value: impl ToString) -> SerResult {
    Ok(Some(Value::Text(value.to_string())))
}

fn unrepresentable(what: &str) -> CoerceError {
    ser::Error::custom(format!("{what} cannot be represented as an extracted value"))
}

/// Serializes into `Some(value)`, or `None` for absent values (`None`, unit)
struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Option<Value>;
    type Error = CoerceError;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = Impossible<Option<Value>, CoerceError>;
    type SerializeMap = RecordBuilder;
    type SerializeStruct = RecordBuilder;
    type SerializeStructVariant = Impossible<Option<Value>, CoerceError>;

    fn serialize_bool(self, v: bool) -> SerResult {
        text(v)
    }

    fn serialize_i8(self, v: i8) -> SerResult {
        text(v)
    }

    fn serialize_i16(self, v: i16) -> SerResult {
        text(v)
    }

    fn serialize_i32(self, v: i32) -> SerResult {
        text(v)
    }

    fn serialize_i64(self, v: i64) -> SerResult {
        text(v)
    }

    fn serialize_i128(self, v: i128) -> SerResult {
        text(v)
    }

    fn serialize_u8(self, v: u8) -> SerResult {
        text(v)
    }

    fn serialize_u16(self, v: u16) -> SerResult {
        text(v)
    }

    fn serialize_u32(self, v: u32) -> SerResult {
        text(v)
    }

    fn serialize_u64(self, v: u64) -> SerResult {
        text(v)
    }

    fn serialize_u128(self, v: u128) -> SerResult {
        text(v)
    }

    fn serialize_f32(self, v: f32) -> SerResult {
        text(v)
    }

    fn serialize_f64(self, v: f64) -> SerResult {
        text(v)
    }

    fn serialize_char(self, v: char) -> SerResult {
        text(v)
    }

    fn serialize_str(self, v: &str) -> SerResult {
        text(v)
    }

    fn serialize_bytes(self, _v: &[u8]) -> SerResult {
        Err(unrepresentable("byte string"))
    }

    fn serialize_none(self) -> SerResult {
        Ok(None)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> SerResult {
        value.serialize(self)
    }

    fn serialize_unit(self) -> SerResult {
        Ok(None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> SerResult {
        Ok(None)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> SerResult {
        text(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> SerResult {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> SerResult {
        Err(unrepresentable(&format!("enum variant `{variant}` with data")))
    }

    fn serialize_seq(self, len: Option<usize>) -> std::result::Result<SeqBuilder, CoerceError> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> std::result::Result<SeqBuilder, CoerceError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> std::result::Result<SeqBuilder, CoerceError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, CoerceError> {
        Err(unrepresentable(&format!("enum variant `{variant}` with data")))
    }

    fn serialize_map(self, len: Option<usize>) -> std::result::Result<RecordBuilder, CoerceError> {
        Ok(RecordBuilder {
            map: FieldMap::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> std::result::Result<RecordBuilder, CoerceError> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, CoerceError> {
        Err(unrepresentable(&format!("enum variant `{variant}` with data")))
    }
}

struct SeqBuilder {
    items: Vec<Value>,
}

impl SeqBuilder {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> std::result::Result<(), CoerceError> {
        // An absent element would silently shorten the sequence
        let item = value
            .serialize(ValueSerializer)?
            .ok_or_else(|| unrepresentable("absent value inside a sequence"))?;
        self.items.push(item);
        Ok(())
    }

    fn finish(self) -> SerResult {
        let mut texts = Vec::new();
        let mut records = Vec::new();
        for item in self.items {
            match item {
                Value::Text(t) => texts.push(t),
                Value::Record(r) => records.push(r),
                Value::Texts(_) | Value::Records(_) => {
                    return Err(unrepresentable("sequence of sequences"))
                }
            }
        }
        match (texts.is_empty(), records.is_empty()) {
            (_, true) => Ok(Some(Value::Texts(texts))),
            (true, false) => Ok(Some(Value::Records(records))),
            (false, false) => Err(unrepresentable("sequence mixing text and records")),
        }
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Option<Value>;
    type Error = CoerceError;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), CoerceError> {
        self.push(value)
    }

    fn end(self) -> SerResult {
        self.finish()
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Option<Value>;
    type Error = CoerceError;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), CoerceError> {
        self.push(value)
    }

    fn end(self) -> SerResult {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Option<Value>;
    type Error = CoerceError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), CoerceError> {
        self.push(value)
    }

    fn end(self) -> SerResult {
        self.finish()
    }
}

struct RecordBuilder {
    map: FieldMap,
    key: Option<String>,
}

impl RecordBuilder {
    fn insert<T: ?Sized + Serialize>(
        &mut self,
        key: String,
        value: &T,
    ) -> std::result::Result<(), CoerceError> {
        if let Some(value) = value.serialize(ValueSerializer)? {
            self.map.insert(key, value);
        }
        Ok(())
    }
}

impl ser::SerializeMap for RecordBuilder {
    type Ok = Option<Value>;
    type Error = CoerceError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> std::result::Result<(), CoerceError> {
        match key.serialize(ValueSerializer)? {
            Some(Value::Text(key)) => {
                self.key = Some(key);
                Ok(())
            }
            _ => Err(unrepresentable("non-text record key")),
        }
    }

    fn serialize_value<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> std::result::Result<(), CoerceError> {
        let key = self
            .key
            .take()
            .ok_or_else(|| unrepresentable("record value without a key"))?;
        self.insert(key, value)
    }

    fn end(self) -> SerResult {
        Ok(Some(Value::Record(self.map)))
    }
}

impl ser::SerializeStruct for RecordBuilder {
    type Ok = Option<Value>;
    type Error = CoerceError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> std::result::Result<(), CoerceError> {
        self.insert(key.to_string(), value)
    }

    fn end(self) -> SerResult {
        Ok(Some(Value::Record(self.map)))
    }
}
