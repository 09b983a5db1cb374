use std::sync::LazyLock;

use quick_xml::escape::escape;
use regex::Regex;
use thiserror::Error;

/// Class token of the element holding the article cards.
pub const CONTAINER_CLASS: &str = "articles-grid";

static DIV_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<div\b[^>]*>").unwrap());
static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpliceError {
    #[error("index document has no <div class=\"articles-grid\"> container")]
    MissingContainer,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Splice {
    /// Updated document with the fragment as the container's first child.
    Inserted(String),
    /// The link target is already in the document; nothing to do.
    AlreadyPresent,
}

/// Byte offset just past the container's opening tag.
pub fn find_container(document: &str) -> Option<usize> {
    DIV_OPEN_RE
        .find_iter(document)
        .find(|m| has_container_class(m.as_str()))
        .map(|m| m.end())
}

fn has_container_class(open_tag: &str) -> bool {
    CLASS_ATTR_RE.captures(open_tag).is_some_and(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .any(|value| value.as_str().split_whitespace().any(|c| c == CONTAINER_CLASS))
    })
}

/// True when the document references `link_target`, either verbatim or in
/// the attribute-escaped form cards are written with.
pub fn contains_article(document: &str, link_target: &str) -> bool {
    document.contains(link_target) || document.contains(&*escape(link_target))
}

/// Insert `fragment` right after the container's opening tag, unless the
/// document already references `link_target`. The rest of the document is kept
/// byte for byte.
pub fn splice(document: &str, link_target: &str, fragment: &str) -> Result<Splice, SpliceError> {
    if contains_article(document, link_target) {
        return Ok(Splice::AlreadyPresent);
    }
    let at = find_container(document).ok_or(SpliceError::MissingContainer)?;

    let mut updated = String::with_capacity(document.len() + fragment.len());
    updated.push_str(&document[..at]);
    updated.push_str(fragment);
    updated.push_str(&document[at..]);
    Ok(Splice::Inserted(updated))
}
