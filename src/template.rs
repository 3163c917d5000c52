//! Runtime extraction templates
//!
//! A template describes fields the same way a `#[derive(FromHtml)]` type
//! does, but is built at runtime (typically from JSON). Extraction yields the
//! raw [`FieldMap`] since there is no type to coerce into.
//!
//! ```json
//! {
//!   "config": { "trim_text": true },
//!   "fields": [
//!     { "name": "title", "tag": "h1;text" },
//!     { "name": "links", "tag": "a;attr=href", "kind": "list" },
//!     { "name": "author", "tag": ".author;obj", "kind": "record",
//!       "fields": [{ "name": "name", "tag": "span;text" }] }
//!   ]
//! }
//! ```

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::{ExtractConfig, Extractor};
use crate::schema::{FieldDescriptor, Nested, Shape};
use crate::value::FieldMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Scalar,
    List,
    Record,
    Records,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateField {
    pub name: String,
    pub tag: String,
    #[serde(default)]
    pub kind: FieldKind,
    /// Fields of the nested record for `record` and `records`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TemplateField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub config: ExtractConfig,
    pub fields: Vec<TemplateField>,
}

impl Template {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        descriptors(&self.fields)
    }

    pub fn extract_str(&self, html: &str) -> Result<FieldMap> {
        let extractor = Extractor::new(self.config.clone());
        let document = extractor.parse(html);
        extractor.collect(&document.selection(), &self.descriptors())
    }

    pub fn extract_reader<R: Read>(&self, reader: R) -> Result<FieldMap> {
        let extractor = Extractor::new(self.config.clone());
        let document = extractor.load(reader)?;
        extractor.collect(&document.selection(), &self.descriptors())
    }
}

fn descriptors(fields: &[TemplateField]) -> Vec<FieldDescriptor> {
    fields
        .iter()
        .map(|field| {
            let shape = match field.kind {
                FieldKind::Scalar => Shape::Scalar,
                FieldKind::List => Shape::ScalarSeq,
                FieldKind::Record => Shape::Record(Nested::Template(descriptors(&field.fields))),
                FieldKind::Records => Shape::RecordSeq(Nested::Template(descriptors(&field.fields))),
            };
            FieldDescriptor::new(field.name.clone(), field.tag.clone(), shape)
        })
        .collect()
}
