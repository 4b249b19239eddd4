//! `<category>`: a term from a categorisation scheme.

use std::cmp::Ordering;

use gdata_core::Comparable;
use gdata_parsable::parser;
use gdata_parsable::{
    KindInfo, ParseContext, ParseError, ParseResult, Parsable, ParsableBase, ParsableKind,
    XmlElement, XmlWriter,
};

/// Scheme under which GData entries advertise their kind.
pub const KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Category {
    base: ParsableBase,
    term: String,
    scheme: Option<String>,
    label: Option<String>,
}

impl Category {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
        self.base.invalidate();
    }

    pub fn set_scheme(&mut self, scheme: Option<String>) {
        self.scheme = scheme;
        self.base.invalidate();
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
        self.base.invalidate();
    }

    /// Returns true for the category carrying a GData kind term.
    pub fn is_kind(&self) -> bool {
        self.scheme.as_deref() == Some(KIND_SCHEME)
    }
}

impl Comparable for Category {
    fn compare_with(&self, other: &Self) -> Ordering {
        self.term.cmp(&other.term)
    }
}

impl ParsableKind for Category {
    const KIND: KindInfo = KindInfo::atom("category");
}

impl Parsable for Category {
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
        self.term = parser::required_property(root, "term")?.to_owned();

        if let Some(scheme) = root.attribute("scheme") {
            if scheme.is_empty() {
                return Err(ParseError::required_property("scheme", root.qualified_name()));
            }
            self.scheme = Some(scheme.to_owned());
        }
        self.label = root.attribute("label").map(str::to_owned);
        Ok(())
    }

    fn pre_get_xml(&self, out: &mut XmlWriter) {
        out.attribute("term", &self.term);
        out.optional_attribute("scheme", self.scheme.as_deref());
        out.optional_attribute("label", self.label.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_parsable::{parse_xml, to_xml};

    #[test]
    fn attributes_round_trip() {
        let xml = r#"<category xmlns="http://www.w3.org/2005/Atom" term="rust" scheme="http://example.com/tags" label="Rust &amp; friends"/>"#;
        let category: Category = parse_xml(xml).unwrap();
        assert_eq!(category.term(), "rust");
        assert_eq!(category.label(), Some("Rust & friends"));
        assert_eq!(to_xml(&category), xml);
    }

    #[test]
    fn term_is_required() {
        let err = parse_xml::<Category>(r#"<category xmlns="http://www.w3.org/2005/Atom" label="x"/>"#)
            .unwrap_err();
        assert_eq!(err, ParseError::required_property("term", "category"));
    }

    #[test]
    fn empty_scheme_is_rejected() {
        let err = parse_xml::<Category>(
            r#"<category xmlns="http://www.w3.org/2005/Atom" term="t" scheme=""/>"#,
        )
        .unwrap_err();
        assert_eq!(err, ParseError::required_property("scheme", "category"));
    }

    #[test]
    fn kind_categories_are_recognised() {
        let kind = Category::new("http://schemas.google.com/docs/2007#folder").with_scheme(KIND_SCHEME);
        assert!(kind.is_kind());
        assert!(!Category::new("misc").is_kind());
        assert_eq!(kind.compare_with(&Category::new("a")), Ordering::Greater);
    }
}
