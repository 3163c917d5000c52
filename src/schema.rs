//! Field descriptor tables
//!
//! Destination types describe their annotated fields through [`FromHtml`],
//! usually generated by `#[derive(FromHtml)]`. The shape of each field is
//! derived from its Rust type through [`FieldShape`].

use std::any::type_name;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::extract::Extractor;
use crate::selection::Selection;
use crate::value::{to_field_map, FieldMap};

/// Extracts one nested record from a selection into its field map
pub type NestedFn = fn(&Extractor, &Selection<'_>) -> Result<FieldMap>;

/// How a nested record is extracted
#[derive(Clone)]
pub enum Nested {
    /// A Rust type; extracted, coerced and turned back into a map
    Type { name: &'static str, extract: NestedFn },
    /// A runtime field list with no backing type
    Template(Vec<FieldDescriptor>),
}

impl fmt::Debug for Nested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nested::Type { name, .. } => f.debug_tuple("Type").field(name).finish(),
            Nested::Template(fields) => f.debug_tuple("Template").field(fields).finish(),
        }
    }
}

/// Classification of a destination field's type
#[derive(Debug, Clone)]
pub enum Shape {
    Scalar,
    Record(Nested),
    ScalarSeq,
    RecordSeq(Nested),
    /// No extraction rule exists; the name describes the kind
    Unsupported(&'static str),
}

/// One annotated field of a destination type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: Cow<'static, str>,
    pub tag: Cow<'static, str>,
    pub shape: Shape,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        tag: impl Into<Cow<'static, str>>,
        shape: Shape,
    ) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            shape,
        }
    }
}

/// A record type that can be filled from HTML
///
/// The map built from [`fields`](FromHtml::fields) is coerced into `Self`
/// through `Deserialize`; nested records are turned back into maps through
/// `Serialize`. Fields without a tag are never extracted, so they need a
/// serde default.
pub trait FromHtml: DeserializeOwned + Serialize {
    /// Annotated fields in declaration order
    fn fields() -> Vec<FieldDescriptor>;
}

/// Maps a Rust type to the [`Shape`] the extractor handles it with
pub trait FieldShape {
    fn shape() -> Shape;
}

/// Shape of a [`FromHtml`] type used as a nested record field
pub fn record_shape<T: FromHtml>() -> Shape {
    Shape::Record(Nested::Type {
        name: type_name::<T>(),
        extract: extract_record::<T>,
    })
}

fn extract_record<T: FromHtml>(extractor: &Extractor, selection: &Selection<'_>) -> Result<FieldMap> {
    let record: T = extractor.extract(selection)?;
    to_field_map(&record)
}

macro_rules! scalar_shape {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldShape for $ty {
                fn shape() -> Shape {
                    Shape::Scalar
                }
            }
        )*
    };
}

scalar_shape!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

impl<T: FieldShape> FieldShape for Option<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: FieldShape> FieldShape for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: FieldShape> FieldShape for Vec<T> {
    fn shape() -> Shape {
        match T::shape() {
            Shape::Scalar => Shape::ScalarSeq,
            Shape::Record(nested) => Shape::RecordSeq(nested),
            Shape::ScalarSeq | Shape::RecordSeq(_) => Shape::Unsupported("sequence of sequences"),
            Shape::Unsupported(kind) => Shape::Unsupported(kind),
        }
    }
}

impl<K, V, S> FieldShape for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::Unsupported("map")
    }
}

impl<K, V> FieldShape for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::Unsupported("map")
    }
}

impl FieldShape for () {
    fn shape() -> Shape {
        Shape::Unsupported("unit")
    }
}
