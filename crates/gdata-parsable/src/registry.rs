//! Process-wide map from element names and JSON discriminators to kinds.
//!
//! Registration is idempotent per Rust type; a different type claiming a
//! taken key is a configuration error.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use serde_json::Value;
use tracing::{debug, info};

use crate::document::{parse_element, parse_json_value};
use crate::error::{ParseError, ParseResult};
use crate::kind::{KindInfo, ParsableKind};
use crate::parsable::{ParseOptions, Parsable};
use crate::xml::{XmlElement, read_document};

type XmlParser = fn(&XmlElement, &ParseOptions) -> ParseResult<Box<dyn Parsable>>;
type JsonParser = fn(&Value) -> ParseResult<Box<dyn Parsable>>;

#[derive(Clone, Copy)]
struct RegisteredKind {
    type_id: TypeId,
    type_name: &'static str,
    info: KindInfo,
    construct: fn() -> Box<dyn Parsable>,
    parse_xml: XmlParser,
    parse_json: JsonParser,
}

#[derive(Default)]
struct Registry {
    by_element: HashMap<(String, String), RegisteredKind>,
    by_json_kind: HashMap<String, RegisteredKind>,
}

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::default()));

fn construct<K: ParsableKind>() -> Box<dyn Parsable> {
    Box::new(K::default())
}

fn parse_boxed<K: ParsableKind>(
    element: &XmlElement,
    options: &ParseOptions,
) -> ParseResult<Box<dyn Parsable>> {
    Ok(Box::new(parse_element::<K>(element, options)?))
}

fn parse_json_boxed<K: ParsableKind>(value: &Value) -> ParseResult<Box<dyn Parsable>> {
    Ok(Box::new(parse_json_value::<K>(value)?))
}

fn conflict(existing: &RegisteredKind, new: &RegisteredKind) -> ParseError {
    ParseError::RegistryConflict {
        namespace: new.info.namespace_uri.to_owned(),
        name: new.info.element_name.to_owned(),
        existing: existing.type_name,
        new: new.type_name,
    }
}

/// Registers `K` under its namespace and element name, and under its JSON
/// discriminator if it has one.
///
/// # Errors
///
/// [`ParseError::RegistryConflict`] if another kind already holds either key.
pub fn register<K: ParsableKind>() -> ParseResult<()> {
    let entry = RegisteredKind {
        type_id: TypeId::of::<K>(),
        type_name: type_name::<K>(),
        info: K::KIND,
        construct: construct::<K>,
        parse_xml: parse_boxed::<K>,
        parse_json: parse_json_boxed::<K>,
    };
    let key = (
        entry.info.namespace_uri.to_owned(),
        entry.info.element_name.to_owned(),
    );

    let mut registry = REGISTRY.write().unwrap();
    if let Some(existing) = registry.by_element.get(&key) {
        if existing.type_id == entry.type_id {
            return Ok(());
        }
        return Err(conflict(existing, &entry));
    }
    if let Some(json_kind) = entry.info.json_kind {
        if let Some(existing) = registry.by_json_kind.get(json_kind) {
            if existing.type_id != entry.type_id {
                return Err(conflict(existing, &entry));
            }
        }
        registry.by_json_kind.insert(json_kind.to_owned(), entry);
    }

    info!(kind = entry.type_name, element = %entry.info.qualified_name(), "registered parsable kind");
    registry.by_element.insert(key, entry);
    Ok(())
}

fn find(namespace: &str, name: &str) -> Option<RegisteredKind> {
    REGISTRY
        .read()
        .unwrap()
        .by_element
        .get(&(namespace.to_owned(), name.to_owned()))
        .copied()
}

/// Metadata of the kind registered for an element, if any.
pub fn lookup(namespace: &str, name: &str) -> Option<KindInfo> {
    find(namespace, name).map(|entry| entry.info)
}

pub fn is_registered<K: ParsableKind>() -> bool {
    find(K::KIND.namespace_uri, K::KIND.element_name)
        .is_some_and(|entry| entry.type_id == TypeId::of::<K>())
}

/// An empty, unsealed instance of the kind registered for an element.
pub fn construct_kind(namespace: &str, name: &str) -> Option<Box<dyn Parsable>> {
    find(namespace, name).map(|entry| (entry.construct)())
}

/// Parses an element as whichever kind is registered for its name.
pub fn parse_any_element(element: &XmlElement, options: &ParseOptions) -> ParseResult<Box<dyn Parsable>> {
    let namespace = element
        .namespace
        .as_deref()
        .unwrap_or(crate::xml::ATOM_NS);
    let entry = find(namespace, &element.name).ok_or_else(|| ParseError::UnknownKind {
        namespace: namespace.to_owned(),
        name: element.name.clone(),
    })?;
    debug!(kind = entry.type_name, "dispatching on root element");
    (entry.parse_xml)(element, options)
}

/// Parses an XML document as whichever kind is registered for its root.
pub fn parse_any(text: &str) -> ParseResult<Box<dyn Parsable>> {
    parse_any_element(&read_document(text)?, &ParseOptions::default())
}

/// Parses a JSON document as the kind registered for its `kind` member.
pub fn parse_any_json(text: &str) -> ParseResult<Box<dyn Parsable>> {
    let value: Value = serde_json::from_str(text).map_err(|e| ParseError::Json(e.to_string()))?;
    let json_kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::MemberContentMissing {
            member: "kind".to_owned(),
        })?;

    let entry = REGISTRY
        .read()
        .unwrap()
        .by_json_kind
        .get(json_kind)
        .copied()
        .ok_or_else(|| ParseError::UnknownKind {
            namespace: "json".to_owned(),
            name: json_kind.to_owned(),
        })?;
    (entry.parse_json)(&value)
}
