//! Derive macro for tagscrape
//!
//! `#[derive(FromHtml)]` turns `#[css("selector;spec")]` field attributes into
//! a field descriptor table and makes the type usable as a nested record.

use proc_macro::TokenStream;

mod from_html;
mod serde_names;

/// Derive `tagscrape::FromHtml` and `tagscrape::FieldShape` for a struct
/// with named fields.
///
/// # Attributes
///
/// - `#[css("selector;text")]`, `#[css("selector;html")]`,
///   `#[css("selector;attr=name")]`, `#[css("selector;obj")]`
///
/// Fields without `#[css]` are not extracted and need `#[serde(default)]`.
/// Map keys follow serde's `rename_all` and `rename`; a field whose
/// serialize and deserialize names differ is rejected.
/// Tags are validated when extraction runs, not at compile time.
///
/// # Example
///
/// ```ignore
/// #[derive(FromHtml, Deserialize, Serialize)]
/// struct Article {
///     #[css("h1;text")]
///     title: String,
///     #[css(".author;obj")]
///     author: Author,
/// }
/// ```
#[proc_macro_derive(FromHtml, attributes(css))]
pub fn derive_from_html(input: TokenStream) -> TokenStream {
    from_html::derive_from_html_impl(input)
}
