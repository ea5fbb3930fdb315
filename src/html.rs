#![forbid(unsafe_code)]

//! Typed lookups over a parsed archive page.
//!
//! Archived Plays.tv markup is only ever queried for "the first element that
//! matches": these helpers return `Option` for that query and turn absence
//! into an [`ExtractionError`] that names the page and selector.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ExtractionError;

pub struct Page {
    url: String,
    document: Html,
}

impl Page {
    pub fn parse(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            document: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Every match in document order.
    pub fn select_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, ExtractionError> {
        let compiled = compile(selector)?;
        Ok(self.document.select(&compiled).collect())
    }

    pub fn first(&self, selector: &str) -> Result<Option<ElementRef<'_>>, ExtractionError> {
        let compiled = compile(selector)?;
        Ok(self.document.select(&compiled).next())
    }

    pub fn require(&self, selector: &str) -> Result<ElementRef<'_>, ExtractionError> {
        self.first(selector)?
            .ok_or_else(|| ExtractionError::MissingElement {
                page: self.url.clone(),
                selector: selector.to_string(),
            })
    }

    /// Concatenated text of the first match, untrimmed.
    pub fn require_text(&self, selector: &str) -> Result<String, ExtractionError> {
        Ok(self.require(selector)?.text().collect())
    }

    pub fn require_attr(&self, selector: &str, attribute: &str) -> Result<String, ExtractionError> {
        self.require(selector)?
            .value()
            .attr(attribute)
            .map(str::to_string)
            .ok_or_else(|| ExtractionError::MissingAttribute {
                page: self.url.clone(),
                selector: selector.to_string(),
                attribute: attribute.to_string(),
            })
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|err| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
        reason: err.to_string(),
    })
}

/// Nearest `<a href>` wrapping `element`.
pub fn enclosing_link(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| {
            let node = ancestor.value();
            node.name() == "a" && node.attr("href").is_some()
        })
}

/// Joins `reference` onto the archive root as a browser would.
pub fn resolve(root: &Url, reference: &str) -> Result<Url, ExtractionError> {
    root.join(reference)
        .map_err(|source| ExtractionError::InvalidUrl {
            input: reference.to_string(),
            source,
        })
}

/// Roots only the path of `href` at the archive, discarding any scheme, host,
/// query or fragment it carried.
pub fn resolve_path(root: &Url, href: &str) -> Result<Url, ExtractionError> {
    resolve(root, href_path(href))
}

/// Path component of a possibly relative URL reference.
///
/// A leading `scheme:` is only recognised when it is made of URL scheme
/// characters, so Wayback paths such as `/web/2019/https://plays.tv/...` keep
/// their embedded original URL.
pub fn href_path(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    let mut rest = &href[..end];

    if let Some((scheme, after)) = rest.split_once(':')
        && is_scheme(scheme)
    {
        rest = after;
    }
    if let Some(authority) = rest.strip_prefix("//") {
        rest = authority.find('/').map_or("", |slash| &authority[slash..]);
    }
    rest
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// File suffix of the last path component, including the dot. Empty when the
/// component has no dot, only a leading one, or ends with one.
pub fn path_suffix(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot < name.len() - 1 => &name[dot..],
        _ => "",
    }
}
