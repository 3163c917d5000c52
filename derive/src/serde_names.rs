//! Field keys as serde sees them
//!
//! The extracted map is coerced through `Deserialize` and nested records come
//! back through `Serialize`, so a field's key must be its serde name in both
//! directions.

use syn::meta::ParseNestedMeta;
use syn::{Attribute, Field, LitStr, Token};

/// Container-level `rename_all` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        Ok(match lit.value().as_str() {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            _ => return Err(syn::Error::new_spanned(lit, "unknown rename_all rule")),
        })
    }

    /// Apply the rule to a snake_case field name
    pub fn apply(self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Pascal => pascal_case(field),
            RenameRule::Camel => {
                let pascal = pascal_case(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.replace('_', "-").to_ascii_uppercase(),
        }
    }
}

fn pascal_case(field: &str) -> String {
    let mut pascal = String::with_capacity(field.len());
    let mut capitalize = true;
    for ch in field.chars() {
        if ch == '_' {
            capitalize = true;
        } else if capitalize {
            pascal.push(ch.to_ascii_uppercase());
            capitalize = false;
        } else {
            pascal.push(ch);
        }
    }
    pascal
}

/// A serde attribute value that may differ per direction
#[derive(Debug, Clone)]
struct PerDirection<T> {
    serialize: Option<T>,
    deserialize: Option<T>,
}

impl<T> Default for PerDirection<T> {
    fn default() -> Self {
        Self {
            serialize: None,
            deserialize: None,
        }
    }
}

impl<T: Clone> PerDirection<T> {
    fn both(value: T) -> Self {
        Self {
            serialize: Some(value.clone()),
            deserialize: Some(value),
        }
    }
}

/// `rename_all` rules from the container's `#[serde(...)]` attributes
#[derive(Debug, Clone, Default)]
pub struct ContainerNames {
    rename_all: PerDirection<RenameRule>,
}

impl ContainerNames {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut names = ContainerNames::default();
        for_each_serde_meta(attrs, |meta| {
            if meta.path.is_ident("rename_all") {
                names.rename_all = parse_per_direction(&meta, RenameRule::parse)?;
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        })?;
        Ok(names)
    }

    /// Map key for `field`, which must be the same for both directions
    pub fn field_key(&self, field: &Field, unraw: &str) -> syn::Result<String> {
        let mut rename = PerDirection::<String>::default();
        for_each_serde_meta(&field.attrs, |meta| {
            if meta.path.is_ident("rename") {
                rename = parse_per_direction(&meta, |lit| Ok(lit.value()))?;
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        })?;

        let resolve = |explicit: Option<String>, rule: Option<RenameRule>| {
            explicit.unwrap_or_else(|| match rule {
                Some(rule) => rule.apply(unraw),
                None => unraw.to_string(),
            })
        };
        let ser = resolve(rename.serialize, self.rename_all.serialize);
        let de = resolve(rename.deserialize, self.rename_all.deserialize);

        if ser != de {
            return Err(syn::Error::new_spanned(
                field,
                format!(
                    "FromHtml needs one serde name per field, got `{ser}` when serializing and `{de}` when deserializing"
                ),
            ));
        }
        Ok(de)
    }
}

fn for_each_serde_meta(
    attrs: &[Attribute],
    mut f: impl FnMut(ParseNestedMeta) -> syn::Result<()>,
) -> syn::Result<()> {
    for attr in attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(&mut f)?;
        }
    }
    Ok(())
}

/// `key = "v"` or `key(serialize = "a", deserialize = "b")`
fn parse_per_direction<T: Clone>(
    meta: &ParseNestedMeta,
    parse: impl Fn(&LitStr) -> syn::Result<T>,
) -> syn::Result<PerDirection<T>> {
    if meta.input.peek(Token![=]) {
        let lit: LitStr = meta.value()?.parse()?;
        return Ok(PerDirection::both(parse(&lit)?));
    }

    let mut value = PerDirection::default();
    meta.parse_nested_meta(|inner| {
        let lit: LitStr = inner.value()?.parse()?;
        if inner.path.is_ident("serialize") {
            value.serialize = Some(parse(&lit)?);
        } else if inner.path.is_ident("deserialize") {
            value.deserialize = Some(parse(&lit)?);
        } else {
            return Err(inner.error("expected `serialize` or `deserialize`"));
        }
        Ok(())
    })?;
    Ok(value)
}

/// Consume a serde option that does not affect field keys
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}
