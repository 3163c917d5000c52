//! Selection adapter over the scraper crate
//!
//! A [`Selection`] is a handle on zero or more matched elements (or the whole
//! document) supporting narrowing by CSS selector and value retrieval.

use std::collections::HashSet;
use std::io::Read;

use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};

/// Parsed HTML document
#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn parse_fragment(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    /// Read a complete UTF-8 document from `reader`
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::parse(&read_source(reader)?))
    }

    /// Selection covering the whole document
    pub fn selection(&self) -> Selection<'_> {
        Selection {
            scope: Scope::Document(&self.html),
        }
    }
}

pub(crate) fn read_source<R: Read>(mut reader: R) -> Result<String> {
    let mut source = String::new();
    reader
        .read_to_string(&mut source)
        .map_err(ScrapeError::DocumentParse)?;
    Ok(source)
}

#[derive(Debug, Clone)]
enum Scope<'a> {
    Document(&'a Html),
    Nodes(Vec<ElementRef<'a>>),
}

/// Zero or more matched nodes of a parsed document
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    scope: Scope<'a>,
}

impl<'a> Selection<'a> {
    pub fn from_element(element: ElementRef<'a>) -> Self {
        Self {
            scope: Scope::Nodes(vec![element]),
        }
    }

    pub fn len(&self) -> usize {
        match &self.scope {
            Scope::Document(_) => 1,
            Scope::Nodes(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descendants of every selected node matching `selector`
    ///
    /// Matches are deduplicated and kept in the order they are encountered.
    pub fn find(&self, selector: &str) -> Result<Selection<'a>> {
        let parsed = Selector::parse(selector).map_err(|e| ScrapeError::Selector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;

        let nodes = match &self.scope {
            Scope::Document(html) => html.select(&parsed).collect(),
            Scope::Nodes(nodes) => {
                let mut seen = HashSet::new();
                nodes
                    .iter()
                    .flat_map(|node| node.select(&parsed))
                    .filter(|found| seen.insert(found.id()))
                    .collect()
            }
        };

        Ok(Selection {
            scope: Scope::Nodes(nodes),
        })
    }

    /// Like [`find`](Self::find), but an empty selector returns the selection itself
    pub fn resolve(&self, selector: &str) -> Result<Selection<'a>> {
        if selector.is_empty() {
            Ok(self.clone())
        } else {
            self.find(selector)
        }
    }

    /// Combined text content of all selected nodes
    pub fn text(&self) -> String {
        match &self.scope {
            Scope::Document(html) => html.root_element().text().collect(),
            Scope::Nodes(nodes) => nodes.iter().flat_map(|node| node.text()).collect(),
        }
    }

    /// Inner HTML of the first selected node
    pub fn html(&self) -> Result<String> {
        match &self.scope {
            Scope::Document(html) => Ok(html.root_element().html()),
            Scope::Nodes(nodes) => nodes
                .first()
                .map(|node| node.inner_html())
                .ok_or_else(|| ScrapeError::MarkupExtraction {
                    reason: "selection is empty".to_string(),
                }),
        }
    }

    /// Attribute of the first selected node, if present
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match &self.scope {
            Scope::Document(_) => None,
            Scope::Nodes(nodes) => nodes.first().and_then(|node| node.value().attr(name)),
        }
    }

    /// Each selected node as its own single-node selection, in order
    pub fn iter(&self) -> impl Iterator<Item = Selection<'a>> {
        let items: Vec<Selection<'a>> = match &self.scope {
            Scope::Document(_) => vec![self.clone()],
            Scope::Nodes(nodes) => nodes.iter().map(|node| Selection::from_element(*node)).collect(),
        };
        items.into_iter()
    }
}
