//! `<link>`: a reference from an entry or feed to a web resource.

use std::cmp::Ordering;

use gdata_core::Comparable;
use gdata_parsable::parser;
use gdata_parsable::{
    KindInfo, ParseContext, ParseError, ParseResult, Parsable, ParsableBase, ParsableKind,
    XmlElement, XmlWriter,
};

const IANA_PREFIX: &str = "http://www.iana.org/assignments/relation/";

pub const REL_ALTERNATE: &str = "http://www.iana.org/assignments/relation/alternate";
pub const REL_SELF: &str = "http://www.iana.org/assignments/relation/self";
pub const REL_EDIT: &str = "http://www.iana.org/assignments/relation/edit";
pub const REL_EDIT_MEDIA: &str = "http://www.iana.org/assignments/relation/edit-media";
pub const REL_RELATED: &str = "http://www.iana.org/assignments/relation/related";
pub const REL_ENCLOSURE: &str = "http://www.iana.org/assignments/relation/enclosure";
pub const REL_VIA: &str = "http://www.iana.org/assignments/relation/via";
pub const REL_NEXT: &str = "http://www.iana.org/assignments/relation/next";
pub const REL_PREVIOUS: &str = "http://www.iana.org/assignments/relation/previous";
/// Link to the feed an entry or feed was posted to.
pub const REL_POST: &str = "http://schemas.google.com/g/2005#post";
pub const REL_FEED: &str = "http://schemas.google.com/g/2005#feed";
pub const REL_BATCH: &str = "http://schemas.google.com/g/2005#batch";
pub const REL_DOCS_PARENT: &str = "http://schemas.google.com/docs/2007#parent";

/// Expands the short Atom relation names (`self`, `edit`, ...) to their
/// IANA URIs. A missing or empty relation means `alternate`.
pub fn normalize_relation(rel: Option<&str>) -> String {
    match rel {
        None | Some("") => REL_ALTERNATE.to_owned(),
        Some(rel) if rel.contains(':') => rel.to_owned(),
        Some(rel) => format!("{}{}", IANA_PREFIX, rel),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Link {
    base: ParsableBase,
    uri: String,
    relation_type: String,
    content_type: Option<String>,
    language: Option<String>,
    title: Option<String>,
    length: Option<u64>,
}

impl Link {
    pub fn new(uri: impl Into<String>, relation_type: Option<&str>) -> Self {
        Self {
            uri: uri.into(),
            relation_type: normalize_relation(relation_type),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The relation as an absolute URI.
    pub fn relation_type(&self) -> &str {
        &self.relation_type
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = uri.into();
        self.base.invalidate();
    }

    pub fn set_relation_type(&mut self, relation_type: Option<&str>) {
        self.relation_type = normalize_relation(relation_type);
        self.base.invalidate();
    }

    pub fn set_length(&mut self, length: Option<u64>) {
        self.length = length;
        self.base.invalidate();
    }

    /// Returns true if the link's relation is `rel`, in short or URI form.
    pub fn has_relation(&self, rel: &str) -> bool {
        self.relation_type == normalize_relation(Some(rel))
    }
}

impl Comparable for Link {
    fn compare_with(&self, other: &Self) -> Ordering {
        self.uri
            .cmp(&other.uri)
            .then_with(|| self.relation_type.cmp(&other.relation_type))
    }
}

impl ParsableKind for Link {
    const KIND: KindInfo = KindInfo::atom("link");
}

impl Parsable for Link {
    fn kind_info(&self) -> &'static KindInfo {
        &Self::KIND
    }

    fn base(&self) -> &ParsableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ParsableBase {
        &mut self.base
    }

    fn pre_parse_xml(&mut self, root: &XmlElement, _ctx: &ParseContext<'_>) -> ParseResult<()> {
        self.uri = parser::required_property(root, "href")?.to_owned();
        self.relation_type = normalize_relation(root.attribute("rel"));
        self.content_type = root.attribute("type").map(str::to_owned);
        self.language = root.attribute("hreflang").map(str::to_owned);
        self.title = root.attribute("title").map(str::to_owned);

        self.length = match root.attribute("length") {
            None => None,
            Some(length) => Some(length.parse().map_err(|_| ParseError::NotInteger {
                element: root.qualified_name(),
                value: length.to_owned(),
            })?),
        };
        Ok(())
    }

    fn pre_get_xml(&self, out: &mut XmlWriter) {
        out.attribute("href", &self.uri);
        out.attribute("rel", &self.relation_type);
        out.optional_attribute("type", self.content_type.as_deref());
        out.optional_attribute("hreflang", self.language.as_deref());
        out.optional_attribute("title", self.title.as_deref());
        if let Some(length) = self.length {
            out.attribute("length", &length.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_parsable::{ParseErrorKind, parse_xml, to_xml};

    #[test]
    fn short_relations_are_expanded() {
        let link: Link = parse_xml(
            r#"<link xmlns="http://www.w3.org/2005/Atom" href="http://example.com/feed" rel="self" type="application/atom+xml"/>"#,
        )
        .unwrap();
        assert_eq!(link.relation_type(), REL_SELF);
        assert!(link.has_relation("self"));
        assert!(link.has_relation(REL_SELF));
        assert_eq!(
            to_xml(&link),
            r#"<link xmlns="http://www.w3.org/2005/Atom" href="http://example.com/feed" rel="http://www.iana.org/assignments/relation/self" type="application/atom+xml"/>"#
        );
    }

    #[test]
    fn missing_relation_means_alternate() {
        let link: Link = parse_xml(r#"<link href="http://example.com/"/>"#).unwrap();
        assert_eq!(link.relation_type(), REL_ALTERNATE);
        assert_eq!(Link::new("x", Some("")).relation_type(), REL_ALTERNATE);
        assert_eq!(Link::new("x", Some(REL_DOCS_PARENT)).relation_type(), REL_DOCS_PARENT);
    }

    #[test]
    fn href_is_required_and_length_numeric() {
        let err = parse_xml::<Link>(r#"<link rel="self"/>"#).unwrap_err();
        assert_eq!(err, ParseError::required_property("href", "link"));

        let err = parse_xml::<Link>(r#"<link href="x" length="big"/>"#).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::MalformedProperty);

        let link: Link = parse_xml(r#"<link href="x" rel="enclosure" length="1024"/>"#).unwrap();
        assert_eq!(link.length(), Some(1024));
    }

    #[test]
    fn links_order_by_uri_then_relation() {
        let a = Link::new("http://a", Some("self"));
        let b = Link::new("http://a", Some("edit"));
        assert_eq!(a.compare_with(&b), Ordering::Greater);
        assert_eq!(a.compare_with(&a.clone()), Ordering::Equal);
    }
}
