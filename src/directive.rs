//! Field tag grammar
//!
//! Tags have the form `<selector>;<spec>` where spec is one of
//! `text`, `html`, `attr=<name>` or `obj`. An empty selector means the
//! current node is used as-is.

use serde::Serialize;

use crate::error::{Result, ScrapeError};

/// What to pull out of a resolved selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Concatenated text content
    Text,
    /// Inner HTML of the first matched element
    Markup,
    /// Named attribute of the first matched element
    Attribute(String),
    /// Recurse into a nested record
    NestedObject,
}

/// Parsed form of one field tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub selector: String,
    pub mode: Mode,
}

impl Directive {
    /// True when the directive operates on the current node without narrowing
    pub fn is_identity(&self) -> bool {
        self.selector.is_empty()
    }

    pub fn attribute_name(&self) -> Option<&str> {
        match &self.mode {
            Mode::Attribute(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Parse a raw field tag into a [`Directive`]
pub fn parse_directive(raw: &str) -> Result<Directive> {
    let malformed = |reason| ScrapeError::MalformedTag {
        tag: raw.to_string(),
        reason,
    };

    let parts: Vec<&str> = raw.trim().split(';').collect();
    let [selector, spec] = parts.as_slice() else {
        return Err(malformed("expected exactly one `;` separating selector and spec"));
    };
    let selector = selector.to_string();

    if spec.starts_with("obj") {
        return Ok(Directive {
            selector,
            mode: Mode::NestedObject,
        });
    }

    if spec.starts_with("attr") {
        let (_, name) = spec
            .trim()
            .split_once('=')
            .ok_or_else(|| malformed("attribute spec must be `attr=<name>`"))?;
        if name.is_empty() {
            return Err(malformed("attribute name must not be empty"));
        }
        return Ok(Directive {
            selector,
            mode: Mode::Attribute(name.to_string()),
        });
    }

    let mode = match *spec {
        "text" => Mode::Text,
        "html" => Mode::Markup,
        _ => return Err(malformed("spec must be one of attr/text/html/obj")),
    };

    Ok(Directive { selector, mode })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_text_and_html() {
        let d = parse_directive("div.title;text").unwrap();
        assert_eq!(d.selector, "div.title");
        assert_eq!(d.mode, Mode::Text);
        assert_eq!(d.attribute_name(), None);

        let d = parse_directive(";html").unwrap();
        assert!(d.is_identity());
        assert_eq!(d.mode, Mode::Markup);
    }

    #[test]
    fn test_parse_attribute() {
        let d = parse_directive("x;attr=href").unwrap();
        assert_eq!(d.selector, "x");
        assert_eq!(d.mode, Mode::Attribute("href".into()));
        assert_eq!(d.attribute_name(), Some("href"));

        // Only the first `=` splits
        let d = parse_directive("meta;attr=data-x=y").unwrap();
        assert_eq!(d.attribute_name(), Some("data-x=y"));
    }

    #[test]
    fn test_parse_nested_object() {
        let d = parse_directive(".child;obj").unwrap();
        assert_eq!(d.selector, ".child");
        assert_eq!(d.mode, Mode::NestedObject);

        let d = parse_directive(";object").unwrap();
        assert_eq!(d.mode, Mode::NestedObject);
    }

    #[test]
    fn test_malformed_tags() {
        for tag in ["x;attr", "x;attr=", "x;bogus", "no-semicolon", "a;b;text", "x;Text"] {
            let err = parse_directive(tag).unwrap_err();
            assert!(
                matches!(err, ScrapeError::MalformedTag { tag: ref t, .. } if t.as_str() == tag),
                "expected MalformedTag for {tag:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let d = parse_directive("  li a;attr=href \n").unwrap();
        assert_eq!(d.selector, "li a");
        assert_eq!(d.attribute_name(), Some("href"));
    }

    #[test]
    fn test_directive_serializes_for_diagnostics() {
        let d = parse_directive("a;attr=href").unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["selector"], "a");
        assert_eq!(json["mode"]["attribute"], "href");

        let d = parse_directive("p;text").unwrap();
        assert_eq!(serde_json::to_value(&d).unwrap()["mode"], "text");
    }

    proptest! {
        #[test]
        fn text_tags_keep_their_selector(sel in "[a-zA-Z0-9.#>_=\\[\\]-]{0,24}") {
            let d = parse_directive(&format!("{sel};text")).unwrap();
            prop_assert_eq!(&d.mode, &Mode::Text);
            prop_assert_eq!(d.attribute_name(), None);
            prop_assert_eq!(d.selector, sel);
        }
    }
}
