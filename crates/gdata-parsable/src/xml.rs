//! An owned, namespace-resolved XML element tree.
//!
//! Documents are read once with `quick-xml`'s namespace-aware reader into
//! [`XmlElement`]s, which the parse pipeline then walks. Elements that no
//! kind recognises are kept as-is and written back out by
//! [`XmlElement::write_to`].

use std::collections::BTreeMap;

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};

use crate::error::{ParseError, ParseResult};
use crate::escape::{escape_attribute, escape_text};

/// Atom 1.0 namespace; unqualified elements in GData documents live here.
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// A namespaced attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub value: String,
}

impl XmlAttribute {
    fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data, CDATA sections included.
    Text(String),
}

/// An element with its resolved namespace, attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Namespace URI; `None` when the element is in no namespace.
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    /// Local name.
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    /// `xmlns` declarations made on this element, keyed by prefix
    /// (`None` for the default namespace).
    pub declarations: Vec<(Option<String>, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an element in the given namespace.
    pub fn new(namespace: Option<&str>, prefix: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_owned),
            prefix: prefix.map(str::to_owned),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns true if the element lives in `namespace`. Elements in no
    /// namespace are treated as Atom.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        match self.namespace.as_deref() {
            Some(ns) => ns == namespace,
            None => namespace == ATOM_NS,
        }
    }

    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.in_namespace(namespace)
    }

    /// `prefix:name`, or the bare name when unprefixed.
    pub fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.name)
    }

    /// Looks up an unqualified attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.is_none() && attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Looks up a namespaced attribute.
    pub fn attribute_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.as_deref() == Some(namespace) && attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// The concatenated character data directly under this element, or
    /// `None` if it has no text nodes at all.
    pub fn text(&self) -> Option<String> {
        let mut texts = self.children.iter().filter_map(|node| match node {
            XmlNode::Text(text) => Some(text.as_str()),
            XmlNode::Element(_) => None,
        });
        let first = texts.next()?;
        let mut out = first.to_owned();
        texts.for_each(|text| out.push_str(text));
        Some(out)
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(XmlAttribute {
            namespace: None,
            prefix: None,
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Records every prefixed namespace used by this subtree.
    pub fn collect_namespaces(&self, namespaces: &mut Namespaces) {
        if let (Some(prefix), Some(uri)) = (self.prefix.as_deref(), self.namespace.as_deref()) {
            namespaces.insert(prefix, uri);
        }
        for attr in &self.attributes {
            if let (Some(prefix), Some(uri)) = (attr.prefix.as_deref(), attr.namespace.as_deref()) {
                namespaces.insert(prefix, uri);
            }
        }
        for child in self.elements() {
            child.collect_namespaces(namespaces);
        }
    }

    /// Serializes the subtree. `default_namespace` is the default namespace
    /// in scope at the insertion point and `bindings` the prefixes declared
    /// by the enclosing document. An unprefixed element in a different
    /// namespace re-declares the default; a prefix that is unbound or bound
    /// to another URI is declared on the element using it.
    pub fn write_to(&self, out: &mut String, default_namespace: Option<&str>, bindings: &Namespaces) {
        let qname = self.qualified_name();
        out.push('<');
        out.push_str(&qname);

        let mut scope = default_namespace;
        if self.prefix.is_none() {
            scope = self.namespace.as_deref();
            if scope != default_namespace {
                push_attribute(out, "xmlns", scope.unwrap_or(""));
            }
        }

        let mut local: Vec<(&str, &str)> = Vec::new();
        for (prefix, uri) in self.prefix_bindings() {
            if bindings.get(prefix) != Some(uri) && !local.iter().any(|(p, _)| *p == prefix) {
                push_attribute(out, &format!("xmlns:{}", prefix), uri);
                local.push((prefix, uri));
            }
        }
        let rebound;
        let bindings = if local.is_empty() {
            bindings
        } else {
            let mut inner = bindings.clone();
            for (prefix, uri) in &local {
                inner.bind(prefix, uri);
            }
            rebound = inner;
            &rebound
        };

        for attr in &self.attributes {
            push_attribute(out, &attr.qualified_name(), &attr.value);
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write_to(out, scope, bindings),
                XmlNode::Text(text) => out.push_str(&escape_text(text)),
            }
        }
        out.push_str("</");
        out.push_str(&qname);
        out.push('>');
    }

    /// `(prefix, uri)` pairs used by the element name and its attributes.
    fn prefix_bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        let own = match (self.prefix.as_deref(), self.namespace.as_deref()) {
            (Some(prefix), Some(uri)) => Some((prefix, uri)),
            _ => None,
        };
        let attributes = self.attributes.iter().filter_map(|attr| {
            match (attr.prefix.as_deref(), attr.namespace.as_deref()) {
                (Some(prefix), Some(uri)) => Some((prefix, uri)),
                _ => None,
            }
        });
        own.into_iter()
            .chain(attributes)
            .filter(|(prefix, _)| *prefix != "xml" && *prefix != "xmlns")
    }
}

/// Prefix to URI map collected from a tree, iterated in prefix order so
/// that declarations are emitted deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces(BTreeMap<String, String>);

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `prefix` as bound to `uri`. The `xml` prefix is implicit and
    /// ignored; the first binding of a prefix wins.
    pub fn insert(&mut self, prefix: &str, uri: &str) {
        if prefix == "xml" || prefix == "xmlns" {
            return;
        }
        self.0
            .entry(prefix.to_owned())
            .or_insert_with(|| uri.to_owned());
    }

    /// Binds `prefix` to `uri`, replacing any earlier binding.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        self.0.insert(prefix.to_owned(), uri.to_owned());
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Appends ` name="value"` with the value escaped.
pub(crate) fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attribute(value));
    out.push('"');
}

fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, name),
        None => name.to_owned(),
    }
}

fn utf8(bytes: &[u8]) -> ParseResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| ParseError::Xml(e.to_string()))
}

fn namespace_of(resolved: ResolveResult<'_>) -> ParseResult<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => utf8(ns.as_ref()).map(Some),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ParseError::Xml(format!(
            "namespace prefix '{}' is not bound",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> ParseResult<XmlElement> {
    let mut element = XmlElement {
        namespace,
        prefix: start
            .name()
            .prefix()
            .map(|p| utf8(p.as_ref()))
            .transpose()?,
        name: utf8(start.local_name().as_ref())?,
        ..XmlElement::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::Xml(e.to_string()))?
            .into_owned();

        match attr.key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => element.declarations.push((None, value)),
            Some(PrefixDeclaration::Named(prefix)) => {
                element.declarations.push((Some(utf8(prefix)?), value))
            }
            None => {
                let (resolved, local) = reader.resolve_attribute(attr.key);
                element.attributes.push(XmlAttribute {
                    namespace: namespace_of(resolved)?,
                    prefix: attr.key.prefix().map(|p| utf8(p.as_ref())).transpose()?,
                    name: utf8(local.as_ref())?,
                    value,
                });
            }
        }
    }

    Ok(element)
}

fn append_text(stack: &mut [XmlElement], text: String) {
    let Some(top) = stack.last_mut() else {
        return;
    };
    if let Some(XmlNode::Text(existing)) = top.children.last_mut() {
        existing.push_str(&text);
    } else {
        top.children.push(XmlNode::Text(text));
    }
}

fn close_element(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => *root = Some(element),
    }
}

/// Reads a complete document into its root element.
///
/// # Errors
///
/// [`ParseError::Xml`] for malformed input, [`ParseError::EmptyDocument`]
/// when there is no root element.
pub fn read_document(text: &str) -> ParseResult<XmlElement> {
    let mut reader = NsReader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        let (namespace, event) = {
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| ParseError::Xml(e.to_string()))?;
            match event {
                Event::Start(_) | Event::Empty(_) => (namespace_of(resolved)?, event),
                _ => (None, event),
            }
        };

        match event {
            Event::Start(ref start) if root.is_none() => {
                let element = open_element(&reader, namespace, start)?;
                stack.push(element);
            }
            Event::Empty(ref start) if root.is_none() => {
                let element = open_element(&reader, namespace, start)?;
                close_element(element, &mut stack, &mut root);
            }
            Event::Start(_) | Event::Empty(_) => {
                return Err(ParseError::Xml(
                    "extra content after the root element".to_owned(),
                ));
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Xml("unexpected closing tag".to_owned()))?;
                close_element(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParseError::Xml(e.to_string()))?;
                append_text(&mut stack, text.into_owned());
            }
            Event::CData(data) => append_text(&mut stack, utf8(&data)?),
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::Xml("unclosed element at end of document".to_owned()));
    }
    root.ok_or(ParseError::EmptyDocument)
}
