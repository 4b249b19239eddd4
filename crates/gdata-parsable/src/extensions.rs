//! The extension slot: content a kind did not recognise, kept for lossless
//! re-serialization.

use serde_json::{Map, Value};

use crate::document::parse_element;
use crate::error::ParseResult;
use crate::kind::ParsableKind;
use crate::parsable::ParseOptions;
use crate::xml::{Namespaces, XmlElement};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    xml: Vec<XmlElement>,
    json: Map<String, Value>,
}

impl Extensions {
    /// Unrecognised child elements, in document order.
    pub fn xml(&self) -> &[XmlElement] {
        &self.xml
    }

    /// Unrecognised JSON members, in document order.
    pub fn json(&self) -> &Map<String, Value> {
        &self.json
    }

    pub fn is_empty(&self) -> bool {
        self.xml.is_empty() && self.json.is_empty()
    }

    pub fn push_xml(&mut self, element: XmlElement) {
        self.xml.push(element);
    }

    pub fn insert_json(&mut self, member: impl Into<String>, value: Value) {
        self.json.insert(member.into(), value);
    }

    /// First unrecognised element with the given namespace and local name.
    pub fn find(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.xml.iter().find(|element| element.is(namespace, name))
    }

    /// Parses the first stored element of kind `K`, if any.
    pub fn parse_as<K: ParsableKind>(&self) -> Option<ParseResult<K>> {
        self.xml
            .iter()
            .find(|element| K::KIND.matches(element))
            .map(|element| parse_element::<K>(element, &ParseOptions::default()))
    }

    pub fn collect_namespaces(&self, namespaces: &mut Namespaces) {
        for element in &self.xml {
            element.collect_namespaces(namespaces);
        }
    }

    pub fn clear(&mut self) {
        self.xml.clear();
        self.json.clear();
    }
}
