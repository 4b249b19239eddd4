//! `<generator>`: the agent that produced a feed.

use gdata_parsable::{
    KindInfo, ParseContext, ParseError, ParseResult, Parsable, ParsableBase, ParsableKind,
    XmlElement, XmlWriter,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generator {
    base: ParsableBase,
    name: Option<String>,
    uri: Option<String>,
    version: Option<String>,
}

impl Generator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl ParsableKind for Generator {
    const KIND: KindInfo = KindInfo::atom("generator");
}

impl Parsable for Generator {
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
        if let Some(uri) = root.attribute("uri") {
            if uri.is_empty() {
                return Err(ParseError::required_property("uri", root.qualified_name()));
            }
            self.uri = Some(uri.to_owned());
        }

        match root.text() {
            Some(name) if name.is_empty() => {
                return Err(ParseError::required_content(root.qualified_name()));
            }
            name => self.name = name,
        }
        self.version = root.attribute("version").map(str::to_owned);
        Ok(())
    }

    fn pre_get_xml(&self, out: &mut XmlWriter) {
        out.optional_attribute("uri", self.uri.as_deref());
        out.optional_attribute("version", self.version.as_deref());
    }

    fn get_xml(&self, out: &mut XmlWriter) {
        if let Some(name) = &self.name {
            out.text(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_parsable::{parse_xml, to_xml};

    #[test]
    fn text_content_is_the_name() {
        let xml = r#"<generator xmlns="http://www.w3.org/2005/Atom" uri="http://www.google.com/calendar" version="1.0">Google Calendar</generator>"#;
        let generator: Generator = parse_xml(xml).unwrap();
        assert_eq!(generator.name(), Some("Google Calendar"));
        assert_eq!(generator.version(), Some("1.0"));
        assert_eq!(to_xml(&generator), xml);
    }

    #[test]
    fn empty_uri_is_rejected() {
        let err = parse_xml::<Generator>(r#"<generator xmlns="http://www.w3.org/2005/Atom" uri="">x</generator>"#)
            .unwrap_err();
        assert_eq!(err, ParseError::required_property("uri", "generator"));
    }

    #[test]
    fn nameless_generator_self_closes() {
        let generator = Generator::default().with_uri("http://example.com");
        assert_eq!(
            to_xml(&generator),
            r#"<generator xmlns="http://www.w3.org/2005/Atom" uri="http://example.com"/>"#
        );
    }
}
