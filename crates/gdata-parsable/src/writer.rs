//! Output sink handed to the serialization hooks.

use crate::document::write_element;
use crate::escape::escape_text;
use crate::parsable::Parsable;
use crate::xml::{ATOM_NS, Namespaces, XmlElement, push_attribute};

/// Accumulates serialized XML.
///
/// Inside `pre_get_xml` only the attribute methods may be used; `get_xml`
/// writes elements.
#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: String,
    /// Prefixes declared on the outermost element.
    bindings: Namespaces,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes ` name="value"`.
    pub fn attribute(&mut self, name: &str, value: &str) {
        push_attribute(&mut self.buf, name, value);
    }

    pub fn optional_attribute(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.attribute(name, value);
        }
    }

    /// Writes `<name attrs...>text</name>`.
    pub fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) {
        self.buf.push('<');
        self.buf.push_str(name);
        for (attr, value) in attributes {
            self.attribute(attr, value);
        }
        self.buf.push('>');
        self.buf.push_str(&escape_text(text));
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
    }

    pub fn optional_text_element(&mut self, name: &str, text: Option<&str>) {
        if let Some(text) = text {
            self.text_element(name, &[], text);
        }
    }

    /// Writes escaped character data.
    pub fn text(&mut self, text: &str) {
        self.buf.push_str(&escape_text(text));
    }

    /// Writes `<name attrs.../>`.
    pub fn empty_element(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.buf.push('<');
        self.buf.push_str(name);
        for (attr, value) in attributes {
            self.attribute(attr, value);
        }
        self.buf.push_str("/>");
    }

    /// Serializes a nested parsable. Its namespaces must already have been
    /// collected onto the outermost element.
    pub fn child(&mut self, child: &dyn Parsable) {
        write_element(child, self, false);
    }

    pub fn children<'a, P, I>(&mut self, children: I)
    where
        P: Parsable + 'a,
        I: IntoIterator<Item = &'a P>,
    {
        for child in children {
            self.child(child);
        }
    }

    /// Re-emits a raw element inside Atom content.
    pub fn raw(&mut self, element: &XmlElement) {
        element.write_to(&mut self.buf, Some(ATOM_NS), &self.bindings);
    }

    pub(crate) fn set_bindings(&mut self, bindings: Namespaces) {
        self.bindings = bindings;
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn close_empty(&mut self) {
        if self.buf.ends_with('>') {
            self.buf.pop();
        }
        self.buf.push_str("/>");
    }

    pub fn into_string(self) -> String {
        self.buf
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}
