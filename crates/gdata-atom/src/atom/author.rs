//! `<author>`: a person responsible for an entry or feed.

use std::cmp::Ordering;

use gdata_core::Comparable;
use gdata_parsable::parser::{self, ParserOptions};
use gdata_parsable::{
    ATOM_NS, Claim, KindInfo, ParseContext, ParseError, ParseResult, Parsable, ParsableBase,
    ParsableKind, XmlElement, XmlWriter,
};

const PERSON_FIELD: ParserOptions = ParserOptions::NO_DUPES;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Author {
    base: ParsableBase,
    name: Option<String>,
    uri: Option<String>,
    email: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.set_uri(Some(uri.into()));
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.set_email(Some(email.into()));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
        self.base.invalidate();
    }

    pub fn set_uri(&mut self, uri: Option<String>) {
        self.uri = uri;
        self.base.invalidate();
    }

    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email;
        self.base.invalidate();
    }
}

impl Comparable for Author {
    fn compare_with(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl ParsableKind for Author {
    const KIND: KindInfo = KindInfo::atom("author");
}

impl Parsable for Author {
    fn kind_info(&self) -> &'static KindInfo {
        &Self::KIND
    }

    fn base(&self) -> &ParsableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ParsableBase {
        &mut self.base
    }

    fn parse_xml(&mut self, child: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<Claim> {
        if !child.in_namespace(ATOM_NS) {
            return Ok(Claim::Unhandled);
        }

        let options = PERSON_FIELD | ParserOptions::REQUIRED | ParserOptions::NON_EMPTY;
        match child.name.as_str() {
            "name" => parser::string_from_element(child, ctx, options, &mut self.name),
            "uri" => parser::string_from_element(child, ctx, options, &mut self.uri),
            "email" => parser::string_from_element(child, ctx, options, &mut self.email),
            _ => Ok(Claim::Unhandled),
        }
    }

    fn post_parse_xml(&mut self) -> ParseResult<()> {
        if self.name.is_none() {
            return Err(ParseError::required_element("name", "author"));
        }
        Ok(())
    }

    fn get_xml(&self, out: &mut XmlWriter) {
        out.text_element("name", &[], self.name.as_deref().unwrap_or_default());
        out.optional_text_element("uri", self.uri.as_deref());
        out.optional_text_element("email", self.email.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_core::compare_optional;
    use gdata_parsable::{parse_xml, to_xml};

    const ALICE: &str = r#"<author xmlns="http://www.w3.org/2005/Atom"><name>Alice</name><uri>http://example.com/a</uri><email>a@example.com</email></author>"#;

    #[test]
    fn round_trips_byte_for_byte() {
        let author: Author = parse_xml(ALICE).unwrap();
        assert_eq!(author.name(), Some("Alice"));
        assert_eq!(author.uri(), Some("http://example.com/a"));
        assert_eq!(author.email(), Some("a@example.com"));
        assert_eq!(to_xml(&author), ALICE);
    }

    #[test]
    fn whitespace_between_children_is_ignored() {
        let pretty = "<author xmlns=\"http://www.w3.org/2005/Atom\">\n  <name>Alice</name>\n  <uri>http://example.com/a</uri>\n  <email>a@example.com</email>\n</author>\n";
        let author: Author = parse_xml(pretty).unwrap();
        assert_eq!(to_xml(&author), ALICE);
    }

    #[test]
    fn name_is_required() {
        let err = parse_xml::<Author>(r#"<author xmlns="http://www.w3.org/2005/Atom"><uri>x</uri></author>"#)
            .unwrap_err();
        assert_eq!(err, ParseError::required_element("name", "author"));
    }

    #[test]
    fn empty_and_duplicate_fields_are_rejected() {
        let empty = r#"<author xmlns="http://www.w3.org/2005/Atom"><name></name></author>"#;
        assert_eq!(
            parse_xml::<Author>(empty).unwrap_err(),
            ParseError::required_content("name")
        );

        let dup = r#"<author xmlns="http://www.w3.org/2005/Atom"><name>A</name><name>B</name></author>"#;
        assert_eq!(
            parse_xml::<Author>(dup).unwrap_err(),
            ParseError::duplicate_element("name", "author")
        );
    }

    #[test]
    fn builds_in_code() {
        let author = Author::new("Bob <admin>").with_email("bob@example.com");
        assert_eq!(
            to_xml(&author),
            r#"<author xmlns="http://www.w3.org/2005/Atom"><name>Bob &lt;admin&gt;</name><email>bob@example.com</email></author>"#
        );
    }

    #[test]
    fn compares_by_name() {
        let a = Author::new("Alice").with_uri("http://a");
        let a2 = Author::new("Alice");
        let b = Author::new("Bob");
        assert_eq!(a.compare_with(&a2), Ordering::Equal);
        assert_eq!(compare_optional(Some(&a), Some(&b)), Ordering::Less);
        assert_eq!(compare_optional(None, Some(&b)), Ordering::Less);
    }
}
