//! Parse and serialize walkers.
//!
//! ```text
//!   text ──read_document──► XmlElement ──populate──► K
//!                                          │
//!              pre_parse_xml(root) ────────┤
//!              parse_xml(child) × n ───────┤  Unhandled ─► extension slot
//!              post_parse_xml() ───────────┤
//!              seal ───────────────────────┘
//!
//!   K ──write_element──► <prefix:name xmlns... attrs>children extensions</prefix:name>
//! ```

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{ParseError, ParseResult};
use crate::kind::ParsableKind;
use crate::parsable::{Claim, Origin, ParseContext, ParseOptions, Parsable};
use crate::writer::XmlWriter;
use crate::xml::{ATOM_NS, Namespaces, XmlElement, read_document};

/// Prologue written before standalone documents.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Options for standalone serialization.
#[derive(Debug, Clone, Default)]
pub struct SerializeOptions {
    /// Prepend [`XML_DECLARATION`].
    pub declaration: bool,
}

impl SerializeOptions {
    #[must_use]
    pub fn document() -> Self {
        Self { declaration: true }
    }
}

/// Parses a complete XML document whose root is a `K`.
pub fn parse_xml<K: ParsableKind>(text: &str) -> ParseResult<K> {
    parse_xml_with(text, &ParseOptions::default())
}

pub fn parse_xml_with<K: ParsableKind>(text: &str, options: &ParseOptions) -> ParseResult<K> {
    let root = read_document(text)?;
    // A root in no namespace is matched on its local name alone.
    let matches = match root.namespace {
        Some(_) => K::KIND.matches(&root),
        None => root.name == K::KIND.element_name,
    };
    if !matches {
        return Err(ParseError::WrongRootElement {
            expected: K::KIND.qualified_name().into_owned(),
            found: root.qualified_name(),
        });
    }
    parse_element(&root, options)
}

/// Parses a single element (typically a child offered to `parse_xml`) as a
/// `K`.
pub fn parse_element<K: ParsableKind>(element: &XmlElement, options: &ParseOptions) -> ParseResult<K> {
    let mut parsable = K::default();
    populate(&mut parsable, element, options)?;
    Ok(parsable)
}

/// Runs the four parse phases of `parsable` over `element`.
pub fn populate(
    parsable: &mut dyn Parsable,
    element: &XmlElement,
    options: &ParseOptions,
) -> ParseResult<()> {
    let parent = element.qualified_name();
    let ctx = ParseContext {
        options,
        parent: &parent,
    };
    trace!(element = %parent, "parsing element");

    parsable.pre_parse_xml(element, &ctx).inspect_err(|e| {
        debug!(element = %parent, error = %e, "pre-parse rejected element");
    })?;

    for child in element.elements() {
        match parsable.parse_xml(child, &ctx)? {
            Claim::Handled => {}
            Claim::Unhandled if options.strict => {
                return Err(ParseError::UnhandledContent {
                    element: child.qualified_name(),
                    parent: parent.clone(),
                });
            }
            Claim::Unhandled => {
                trace!(element = %child.qualified_name(), parent = %parent, "stored as extension");
                parsable.base_mut().fallback_xml(child.clone());
            }
        }
    }

    parsable.post_parse_xml()?;
    parsable.base_mut().seal(Origin::Xml);
    Ok(())
}

/// Collects every `(prefix, uri)` pair used by `parsable` and its subtree.
pub fn collect_namespaces(parsable: &dyn Parsable, namespaces: &mut Namespaces) {
    let info = parsable.kind_info();
    if let Some(prefix) = info.namespace_prefix {
        namespaces.insert(prefix, info.namespace_uri);
    }
    parsable.get_namespaces(namespaces);
    parsable.base().extensions().collect_namespaces(namespaces);
}

/// Serializes `parsable` as a standalone element, declaring the Atom
/// default namespace and every collected prefix on it.
pub fn to_xml(parsable: &dyn Parsable) -> String {
    to_xml_with(parsable, &SerializeOptions::default())
}

pub fn to_xml_with(parsable: &dyn Parsable, options: &SerializeOptions) -> String {
    let body = parsable.base().cached_xml().get_or_init(|| {
        let mut out = XmlWriter::new();
        write_element(parsable, &mut out, true);
        out.into_string()
    });

    if options.declaration {
        format!("{}{}", XML_DECLARATION, body)
    } else {
        body.clone()
    }
}

pub(crate) fn write_element(parsable: &dyn Parsable, out: &mut XmlWriter, top_level: bool) {
    let qname = parsable.kind_info().qualified_name();
    out.push_str("<");
    out.push_str(&qname);

    if top_level {
        out.attribute("xmlns", ATOM_NS);
        let mut namespaces = Namespaces::new();
        collect_namespaces(parsable, &mut namespaces);
        for (prefix, uri) in namespaces.iter() {
            out.attribute(&format!("xmlns:{}", prefix), uri);
        }
        out.set_bindings(namespaces);
    }

    parsable.pre_get_xml(out);
    out.push_str(">");
    let content_start = out.len();

    parsable.get_xml(out);
    for element in parsable.base().extensions().xml() {
        out.raw(element);
    }

    if out.len() == content_start {
        out.close_empty();
    } else {
        out.push_str("</");
        out.push_str(&qname);
        out.push_str(">");
    }
}

/// Parses a JSON document whose outermost value is a `K` object.
pub fn parse_json<K: ParsableKind>(text: &str) -> ParseResult<K> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyDocument);
    }
    let value: Value = serde_json::from_str(text).map_err(|e| ParseError::Json(e.to_string()))?;
    parse_json_value(&value)
}

/// Parses an already-decoded JSON value as a `K`.
pub fn parse_json_value<K: ParsableKind>(value: &Value) -> ParseResult<K> {
    let mut parsable = K::default();
    populate_json(&mut parsable, value)?;
    Ok(parsable)
}

pub fn populate_json(parsable: &mut dyn Parsable, value: &Value) -> ParseResult<()> {
    let Value::Object(members) = value else {
        return Err(ParseError::Json("Outermost JSON node is not an object.".to_owned()));
    };

    for (member, value) in members {
        if let Claim::Unhandled = parsable.parse_json(member, value)? {
            parsable.base_mut().fallback_json(member, value);
        }
    }

    parsable.post_parse_json()?;
    parsable.base_mut().seal(Origin::Json);
    Ok(())
}

/// Builds the JSON object for `parsable`, followed by any unrecognised
/// members it was parsed with.
pub fn to_json_value(parsable: &dyn Parsable) -> Value {
    let mut members = Map::new();
    parsable.get_json(&mut members);
    for (member, value) in parsable.base().extensions().json() {
        if !members.contains_key(member) {
            members.insert(member.clone(), value.clone());
        }
    }
    Value::Object(members)
}

pub fn to_json(parsable: &dyn Parsable) -> String {
    to_json_value(parsable).to_string()
}
