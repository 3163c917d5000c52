//! Fill Rust structs from HTML using CSS selector field tags
//!
//! Each annotated field names a selector and what to pull out of it:
//! - `"h1;text"` - text content
//! - `".body;html"` - inner HTML
//! - `"a;attr=href"` - an attribute
//! - `".author;obj"` - a nested record
//!
//! Fields typed `Vec<_>` collect one value per matched element; elements that
//! fail to extract are skipped. Any other failing field fails the extraction.
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use tagscrape::FromHtml;
//!
//! #[derive(FromHtml, Deserialize, Serialize)]
//! struct Page {
//!     #[css("h1;text")]
//!     title: String,
//!     #[css("a;attr=href")]
//!     links: Vec<String>,
//! }
//!
//! let page: Page = tagscrape::extract_from_str(html)?;
//! ```

pub mod coerce;
pub mod directive;
pub mod error;
pub mod extract;
pub mod ffi;
pub mod schema;
pub mod selection;
pub mod template;
pub mod value;

pub use directive::{parse_directive, Directive, Mode};
pub use error::{Result, ScrapeError};
pub use extract::{extract_from_reader, extract_from_str, map_from_str, ExtractConfig, Extractor};
pub use schema::{record_shape, FieldDescriptor, FieldShape, FromHtml, Nested, Shape};
pub use selection::{Document, Selection};
pub use template::{FieldKind, Template, TemplateField};
pub use value::{to_field_map, FieldMap, Value};

pub use tagscrape_derive::FromHtml;
