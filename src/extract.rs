//! Tag-driven extraction engine
//!
//! For every annotated field the tag is parsed, its selector resolved against
//! the current selection, and a value produced according to the field's shape.
//! A failing field aborts the whole record. Inside sequences a failing element
//! is dropped instead, so a few malformed list items do not void the list.

use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::coerce::from_field_map;
use crate::directive::{parse_directive, Directive, Mode};
use crate::error::{Result, ScrapeError};
use crate::schema::{FieldDescriptor, FromHtml, Nested, Shape};
use crate::selection::{read_source, Document, Selection};
use crate::value::{FieldMap, Value};

/// Extraction options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Trim surrounding whitespace from text-mode values
    pub trim_text: bool,
    /// Parse input as an HTML fragment instead of a full document
    pub fragment: bool,
}

/// Runs field descriptor tables against selections
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Parse `html` according to the configured document kind
    pub fn parse(&self, html: &str) -> Document {
        if self.config.fragment {
            Document::parse_fragment(html)
        } else {
            Document::parse(html)
        }
    }

    pub fn load<R: Read>(&self, reader: R) -> Result<Document> {
        Ok(self.parse(&read_source(reader)?))
    }

    pub fn extract_str<T: FromHtml>(&self, html: &str) -> Result<T> {
        self.extract(&self.parse(html).selection())
    }

    pub fn extract_reader<T: FromHtml, R: Read>(&self, reader: R) -> Result<T> {
        self.extract(&self.load(reader)?.selection())
    }

    /// Field map of `T` extracted from `html`, without coercion
    pub fn map_str<T: FromHtml>(&self, html: &str) -> Result<FieldMap> {
        self.collect(&self.parse(html).selection(), &T::fields())
    }

    /// Extract and coerce a `T` from `selection`
    pub fn extract<T: FromHtml>(&self, selection: &Selection<'_>) -> Result<T> {
        let values = self.collect(selection, &T::fields())?;
        from_field_map(values)
    }

    /// Like [`extract`](Self::extract), assigning into `dest` only on success
    pub fn extract_into<T: FromHtml>(&self, selection: &Selection<'_>, dest: &mut T) -> Result<()> {
        *dest = self.extract(selection)?;
        Ok(())
    }

    /// Build the field map for `fields`, stopping at the first failing field
    pub fn collect(&self, selection: &Selection<'_>, fields: &[FieldDescriptor]) -> Result<FieldMap> {
        let mut values = FieldMap::with_capacity(fields.len());
        for field in fields {
            let value = parse_directive(&field.tag)
                .and_then(|directive| self.dispatch(selection, field, &directive))
                .inspect_err(|error| debug!(field = %field.name, %error, "extraction aborted"))?;
            values.insert(field.name.to_string(), value);
        }
        Ok(values)
    }

    fn dispatch(
        &self,
        selection: &Selection<'_>,
        field: &FieldDescriptor,
        directive: &Directive,
    ) -> Result<Value> {
        trace!(field = %field.name, selector = %directive.selector, mode = ?directive.mode, "dispatching field");

        if let Shape::Unsupported(kind) = &field.shape {
            return Err(unsupported(field, kind));
        }
        let target = selection.resolve(&directive.selector)?;

        match &field.shape {
            Shape::Scalar => self.scalar(&target, field, &directive.mode).map(Value::Text),
            Shape::Record(nested) => self
                .nested(&target, nested)
                .map(Value::Record)
                .map_err(|source| ScrapeError::Nested {
                    field: field.name.to_string(),
                    source: Box::new(source),
                }),
            Shape::ScalarSeq => {
                if directive.mode == Mode::NestedObject {
                    return Err(unsupported(field, "nested object tag on a sequence of scalars"));
                }
                let mut texts = Vec::with_capacity(target.len());
                for (index, element) in target.iter().enumerate() {
                    match self.scalar(&element, field, &directive.mode) {
                        Ok(text) => texts.push(text),
                        Err(error) => debug!(field = %field.name, index, %error, "dropping sequence element"),
                    }
                }
                Ok(Value::Texts(texts))
            }
            Shape::RecordSeq(nested) => {
                let mut records = Vec::with_capacity(target.len());
                for (index, element) in target.iter().enumerate() {
                    match self.nested(&element, nested) {
                        Ok(record) => records.push(record),
                        Err(error) => debug!(field = %field.name, index, %error, "dropping sequence element"),
                    }
                }
                Ok(Value::Records(records))
            }
            Shape::Unsupported(kind) => Err(unsupported(field, kind)),
        }
    }

    fn scalar(&self, target: &Selection<'_>, field: &FieldDescriptor, mode: &Mode) -> Result<String> {
        match mode {
            Mode::Text => {
                let text = target.text();
                if self.config.trim_text {
                    Ok(text.trim().to_string())
                } else {
                    Ok(text)
                }
            }
            Mode::Markup => target.html(),
            Mode::Attribute(name) => target
                .attr(name)
                .map(str::to_string)
                .ok_or_else(|| ScrapeError::AttributeNotFound {
                    name: name.clone(),
                    markup: target.html().unwrap_or_default(),
                }),
            Mode::NestedObject => Err(unsupported(field, "nested object tag on a scalar field")),
        }
    }

    fn nested(&self, target: &Selection<'_>, nested: &Nested) -> Result<FieldMap> {
        match nested {
            Nested::Type { extract, .. } => extract(self, target),
            Nested::Template(fields) => self.collect(target, fields),
        }
    }
}

fn unsupported(field: &FieldDescriptor, kind: &str) -> ScrapeError {
    ScrapeError::UnsupportedFieldKind {
        field: field.name.to_string(),
        kind: kind.to_string(),
    }
}

/// Parse a complete document from `reader` and extract a `T` from its root
pub fn extract_from_reader<T: FromHtml, R: Read>(reader: R) -> Result<T> {
    Extractor::default().extract_reader(reader)
}

/// Parse `html` as a document and extract a `T` from its root
pub fn extract_from_str<T: FromHtml>(html: &str) -> Result<T> {
    Extractor::default().extract_str(html)
}

/// Raw field map for `T`'s tags, skipping the final coercion
pub fn map_from_str<T: FromHtml>(html: &str) -> Result<FieldMap> {
    Extractor::default().map_str::<T>(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::record_shape;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Link {
        title: String,
        href: String,
    }

    impl FromHtml for Link {
        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::new("title", "h1;text", Shape::Scalar),
                FieldDescriptor::new("href", "a;attr=href", Shape::Scalar),
            ]
        }
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Author {
        name: String,
    }

    impl FromHtml for Author {
        fn fields() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::new("name", "span;text", Shape::Scalar)]
        }
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Article {
        author: Author,
        links: Vec<String>,
        comments: Vec<Author>,
    }

    impl FromHtml for Article {
        fn fields() -> Vec<FieldDescriptor> {
            let author = record_shape::<Author>();
            let Shape::Record(nested) = author.clone() else {
                unreachable!()
            };
            vec![
                FieldDescriptor::new("author", ".author;obj", author),
                FieldDescriptor::new("links", "li;attr=data-href", Shape::ScalarSeq),
                FieldDescriptor::new("comments", ".comment;obj", Shape::RecordSeq(nested)),
            ]
        }
    }

    const ARTICLE: &str = r#"
        <div class="author"><span>Name</span></div>
        <ul>
            <li data-href="/one">one</li>
            <li>two</li>
            <li data-href="/three">three</li>
        </ul>
        <div class="comment"><span>Ann</span></div>
        <div class="comment"><span>Bob</span></div>
    "#;

    #[test]
    fn test_scalar_text_and_attribute() {
        let link: Link =
            extract_from_str(r#"<div><h1>Title</h1><a href="/x">link</a></div>"#).unwrap();
        assert_eq!(
            link,
            Link {
                title: "Title".into(),
                href: "/x".into()
            }
        );
    }

    #[test]
    fn test_missing_attribute_fails_scalar_field() {
        let err = extract_from_str::<Link>("<h1>Title</h1><a>no href</a>").unwrap_err();
        assert!(matches!(err, ScrapeError::AttributeNotFound { ref name, .. } if name == "href"));
    }

    #[test]
    fn test_nested_records_and_sequences() {
        let article: Article = extract_from_str(ARTICLE).unwrap();
        assert_eq!(article.author, Author { name: "Name".into() });
        assert_eq!(article.links, vec!["/one", "/three"]);
        assert_eq!(
            article.comments,
            vec![Author { name: "Ann".into() }, Author { name: "Bob".into() }]
        );
    }

    #[test]
    fn test_map_keeps_field_order() {
        let map = map_from_str::<Article>(ARTICLE).unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["author", "links", "comments"]);
        assert_eq!(map["links"], Value::Texts(vec!["/one".into(), "/three".into()]));
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Byline {
        zeta: String,
        alpha: String,
    }

    impl FromHtml for Byline {
        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::new("zeta", "b;text", Shape::Scalar),
                FieldDescriptor::new("alpha", "i;text", Shape::Scalar),
            ]
        }
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Signed {
        byline: Byline,
    }

    impl FromHtml for Signed {
        fn fields() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::new("byline", "p;obj", record_shape::<Byline>())]
        }
    }

    #[test]
    fn test_map_keeps_nested_field_order() {
        let map = map_from_str::<Signed>("<p><b>z</b><i>a</i></p>").unwrap();
        let byline = map["byline"].as_record().unwrap();
        let keys: Vec<&str> = byline.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[derive(Debug, Deserialize, Serialize)]
    struct Reading {
        value: f64,
    }

    impl FromHtml for Reading {
        fn fields() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::new("value", ";text", Shape::Scalar)]
        }
    }

    #[derive(Debug, Deserialize, Serialize)]
    struct Gauge {
        reading: Reading,
    }

    impl FromHtml for Gauge {
        fn fields() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::new("reading", "p;obj", record_shape::<Reading>())]
        }
    }

    #[test]
    fn test_nested_non_finite_float() {
        let gauge: Gauge = extract_from_str("<p>NaN</p>").unwrap();
        assert!(gauge.reading.value.is_nan());
    }

    #[test]
    fn test_markup_mode() {
        let fields = vec![
            FieldDescriptor::new("body", ".post;html", Shape::Scalar),
            FieldDescriptor::new("items", "li;html", Shape::ScalarSeq),
        ];
        let doc = Document::parse(r#"<div class="post"><b>hi</b></div><li><i>a</i></li>"#);
        let map = Extractor::default().collect(&doc.selection(), &fields).unwrap();
        assert_eq!(map["body"], Value::from("<b>hi</b>"));
        assert_eq!(map["items"], Value::Texts(vec!["<i>a</i>".into()]));
    }

    #[test]
    fn test_markup_of_missing_node_fails() {
        let fields = vec![FieldDescriptor::new("body", ".post;html", Shape::Scalar)];
        let doc = Document::parse("<p>nothing here</p>");
        let err = Extractor::default().collect(&doc.selection(), &fields).unwrap_err();
        assert!(matches!(err, ScrapeError::MarkupExtraction { .. }));
    }

    #[test]
    fn test_identity_selector_uses_current_node() {
        let fields = vec![
            FieldDescriptor::new("href", ";attr=href", Shape::Scalar),
            FieldDescriptor::new("label", ";text", Shape::Scalar),
        ];
        let doc = Document::parse(r#"<a href="/x">go</a>"#);
        let link = doc.selection().find("a").unwrap();
        let map = Extractor::default().collect(&link, &fields).unwrap();
        assert_eq!(map["href"], Value::from("/x"));
        assert_eq!(map["label"], Value::from("go"));
    }

    #[test]
    fn test_trim_text_config() {
        let fields = vec![FieldDescriptor::new("title", "h1;text", Shape::Scalar)];
        let extractor = Extractor::new(ExtractConfig {
            trim_text: true,
            ..Default::default()
        });
        let doc = extractor.parse("<h1>\n   Spaced  \n</h1>");
        let map = extractor.collect(&doc.selection(), &fields).unwrap();
        assert_eq!(map["title"], Value::from("Spaced"));
    }

    #[test]
    fn test_unsupported_kind_aborts_before_other_fields() {
        let fields = vec![
            FieldDescriptor::new("title", "h1;text", Shape::Scalar),
            FieldDescriptor::new("callback", ";text", Shape::Unsupported("function")),
        ];
        let doc = Document::parse("<h1>Title</h1>");
        let err = Extractor::default().collect(&doc.selection(), &fields).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::UnsupportedFieldKind { ref field, ref kind } if field == "callback" && kind == "function"
        ));
    }

    #[test]
    fn test_obj_tag_on_scalar_is_unsupported() {
        let scalar = vec![FieldDescriptor::new("title", "h1;obj", Shape::Scalar)];
        let list = vec![FieldDescriptor::new("items", "li;obj", Shape::ScalarSeq)];
        let doc = Document::parse("<h1>Title</h1><li>a</li>");

        for fields in [scalar, list] {
            let err = Extractor::default().collect(&doc.selection(), &fields).unwrap_err();
            assert!(matches!(err, ScrapeError::UnsupportedFieldKind { .. }), "{err:?}");
        }
    }

    #[test]
    fn test_malformed_tag_aborts() {
        let fields = vec![FieldDescriptor::new("title", "h1", Shape::Scalar)];
        let doc = Document::parse("<h1>Title</h1>");
        let err = Extractor::default().collect(&doc.selection(), &fields).unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedTag { .. }));
    }

    #[test]
    fn test_nested_failure_is_wrapped() {
        #[derive(Debug, Deserialize, Serialize)]
        struct Wrapper {
            link: Link,
        }

        impl FromHtml for Wrapper {
            fn fields() -> Vec<FieldDescriptor> {
                vec![FieldDescriptor::new("link", ".card;obj", record_shape::<Link>())]
            }
        }

        let err = extract_from_str::<Wrapper>(r#"<div class="card"><h1>T</h1><a>x</a></div>"#)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Nested { ref field, .. } if field == "link"));
        assert!(matches!(err.root_cause(), ScrapeError::AttributeNotFound { .. }));
    }

    #[test]
    fn test_record_sequence_drops_failing_elements() {
        #[derive(Debug, Deserialize, Serialize)]
        struct Links {
            cards: Vec<Link>,
        }

        impl FromHtml for Links {
            fn fields() -> Vec<FieldDescriptor> {
                let Shape::Record(nested) = record_shape::<Link>() else {
                    unreachable!()
                };
                vec![FieldDescriptor::new("cards", ".card;obj", Shape::RecordSeq(nested))]
            }
        }

        let html = r#"
            <div class="card"><h1>A</h1><a href="/a">a</a></div>
            <div class="card"><h1>B</h1><a>missing</a></div>
            <div class="card"><h1>C</h1><a href="/c">c</a></div>
        "#;
        let links: Links = extract_from_str(html).unwrap();
        let hrefs: Vec<&str> = links.cards.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/a", "/c"]);
    }

    #[test]
    fn test_extract_into_leaves_dest_on_error() {
        let doc = Document::parse("<h1>Only title</h1>");
        let mut link = Link {
            title: "old".into(),
            href: "/old".into(),
        };
        let result = Extractor::default().extract_into(&doc.selection(), &mut link);
        assert!(result.is_err());
        assert_eq!(link.title, "old");

        let doc = Document::parse(r#"<h1>New</h1><a href="/new">n</a>"#);
        Extractor::default()
            .extract_into(&doc.selection(), &mut link)
            .unwrap();
        assert_eq!(link.href, "/new");
    }

    #[test]
    fn test_extract_from_reader() {
        let html = r#"<h1>Title</h1><a href="/x">link</a>"#;
        let link: Link = extract_from_reader(html.as_bytes()).unwrap();
        assert_eq!(link.href, "/x");

        let err = extract_from_reader::<Link, _>(&[0xffu8, 0xfe][..]).unwrap_err();
        assert!(matches!(err, ScrapeError::DocumentParse(_)));
    }

    #[test]
    fn test_no_annotated_fields_is_empty_map() {
        let doc = Document::parse("<p>x</p>");
        let map = Extractor::default().collect(&doc.selection(), &[]).unwrap();
        assert!(map.is_empty());
    }
}
