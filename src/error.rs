//! Error types for tag-driven extraction

use thiserror::Error;

/// Errors produced while parsing tags, selecting nodes or coercing values.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Field tag does not follow `<selector>;<attr=name|text|html|obj>`
    #[error("malformed tag `{tag}`: {reason}")]
    MalformedTag { tag: String, reason: &'static str },

    /// Selector could not be parsed by the CSS engine
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("attribute `{name}` not found in selection: {markup}")]
    AttributeNotFound { name: String, markup: String },

    #[error("could not render markup: {reason}")]
    MarkupExtraction { reason: String },

    /// Destination field type has no extraction rule
    #[error("field `{field}` has an unsupported kind: {kind}")]
    UnsupportedFieldKind { field: String, kind: String },

    /// Extraction of a nested record field failed
    #[error("nested field `{field}`: {source}")]
    Nested {
        field: String,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("failed to parse document: {0}")]
    DocumentParse(#[source] std::io::Error),

    /// Loosely typed values could not be assigned to the destination type
    #[error("coercion failed: {0}")]
    Coercion(String),

    #[error("invalid template: {0}")]
    Template(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Innermost error, looking through nested field wrappers
    pub fn root_cause(&self) -> &ScrapeError {
        match self {
            ScrapeError::Nested { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested() {
        let err = ScrapeError::Nested {
            field: "author".into(),
            source: Box::new(ScrapeError::Nested {
                field: "name".into(),
                source: Box::new(ScrapeError::AttributeNotFound {
                    name: "href".into(),
                    markup: String::new(),
                }),
            }),
        };

        assert!(matches!(
            err.root_cause(),
            ScrapeError::AttributeNotFound { name, .. } if name == "href"
        ));
        assert_eq!(
            err.to_string(),
            "nested field `author`: nested field `name`: attribute `href` not found in selection: "
        );
    }
}
