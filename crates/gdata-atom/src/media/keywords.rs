//! `<media:keywords>`: a comma-separated keyword list.
//!
//! Commas inside a keyword are percent-encoded as `%2C` so that the list
//! stays splittable.

use gdata_parsable::escape::{join_keywords, split_keywords};
use gdata_parsable::{
    KindInfo, ParseContext, ParseResult, Parsable, ParsableBase, ParsableKind, XmlElement,
    XmlWriter,
};

use crate::MEDIA_NS;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keywords {
    base: ParsableBase,
    keywords: Vec<String>,
}

impl Keywords {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.as_ref().to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn set_keywords<S: AsRef<str>>(&mut self, keywords: &[S]) {
        self.keywords = keywords.iter().map(|k| k.as_ref().to_owned()).collect();
        self.base.invalidate();
    }
}

impl ParsableKind for Keywords {
    const KIND: KindInfo = KindInfo::namespaced("media", MEDIA_NS, "keywords");
}

impl Parsable for Keywords {
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
        self.keywords = split_keywords(&root.text().unwrap_or_default());
        Ok(())
    }

    fn get_xml(&self, out: &mut XmlWriter) {
        out.text(&join_keywords(&self.keywords));
    }
}
