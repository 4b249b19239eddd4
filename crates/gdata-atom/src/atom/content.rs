//! `<content>` of an entry: inline text or a reference to out-of-band
//! media.

use gdata_parsable::{XmlElement, XmlWriter};

const DEFAULT_MEDIA_TYPE: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Inline text, serialized with `type="text"`.
    Text(String),
    /// Out-of-band content at `src`.
    Uri {
        src: String,
        content_type: Option<String>,
    },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn uri(src: impl Into<String>) -> Self {
        Self::Uri {
            src: src.into(),
            content_type: None,
        }
    }

    /// The inline text or the URI, whichever this content holds.
    pub fn value(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Uri { src, .. } => src,
        }
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, Self::Uri { .. })
    }

    pub(crate) fn from_element(element: &XmlElement) -> Self {
        match element.attribute("src") {
            Some(src) => Self::Uri {
                src: src.to_owned(),
                content_type: element.attribute("type").map(str::to_owned),
            },
            None => Self::Text(element.text().unwrap_or_default()),
        }
    }

    pub(crate) fn write(&self, out: &mut XmlWriter) {
        match self {
            Self::Text(text) => out.text_element("content", &[("type", "text")], text),
            Self::Uri { src, content_type } => out.empty_element(
                "content",
                &[
                    ("type", content_type.as_deref().unwrap_or(DEFAULT_MEDIA_TYPE)),
                    ("src", src.as_str()),
                ],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_parsable::xml::read_document;

    #[test]
    fn src_attribute_selects_uri_content() {
        let element =
            read_document(r#"<content type="image/png" src="http://example.com/a.png"/>"#).unwrap();
        let content = Content::from_element(&element);
        assert!(content.is_uri());
        assert_eq!(content.value(), "http://example.com/a.png");

        let mut out = XmlWriter::new();
        content.write(&mut out);
        assert_eq!(
            out.as_str(),
            r#"<content type="image/png" src="http://example.com/a.png"/>"#
        );
    }

    #[test]
    fn inline_text() {
        let element = read_document("<content>a &amp; b</content>").unwrap();
        let content = Content::from_element(&element);
        assert_eq!(content, Content::text("a & b"));

        let mut out = XmlWriter::new();
        Content::uri("http://x").write(&mut out);
        content.write(&mut out);
        assert_eq!(
            out.as_str(),
            r#"<content type="text/plain" src="http://x"/><content type="text">a &amp; b</content>"#
        );
    }
}
