//! The [`Parsable`] trait and the state every parsable carries.
//!
//! A kind specializes parsing and serialization by overriding the hooks
//! below; the walkers in [`crate::document`] drive them and never know the
//! concrete kind. Children a kind leaves [`Claim::Unhandled`] fall back to
//! the extension slot.

use std::any::Any;
use std::fmt;
use std::sync::OnceLock;

use serde_json::{Map, Value};

use crate::error::ParseResult;
use crate::extensions::Extensions;
use crate::kind::KindInfo;
use crate::writer::XmlWriter;
use crate::xml::{Namespaces, XmlElement};

/// Outcome of offering a child element or JSON member to a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The kind consumed the child and recorded it.
    Handled,
    /// The kind does not know the child; the fallback decides.
    Unhandled,
}

impl Claim {
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

/// Where a parsable's current field values came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    #[default]
    Constructed,
    Xml,
    Json,
}

/// Options for a parse run.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Reject unrecognised child elements with `UnhandledContent` instead of
    /// storing them in the extension slot.
    pub strict: bool,
}

impl ParseOptions {
    #[must_use]
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// What a hook sees about the element being parsed.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub options: &'a ParseOptions,
    /// Qualified name of the element whose children are being offered.
    pub parent: &'a str,
}

/// Framework-owned state embedded in every parsable.
#[derive(Debug, Clone, Default)]
pub struct ParsableBase {
    extensions: Extensions,
    origin: Origin,
    sealed: bool,
    cached_xml: OnceLock<String>,
}

impl ParsableBase {
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        self.invalidate();
        &mut self.extensions
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// True once a parse run has completed on this instance.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Drops the cached serialization. Every setter calls this.
    pub fn invalidate(&mut self) {
        self.cached_xml.take();
    }

    pub(crate) fn seal(&mut self, origin: Origin) {
        self.origin = origin;
        self.sealed = true;
        self.cached_xml.take();
    }

    pub(crate) fn fallback_xml(&mut self, element: XmlElement) {
        self.extensions.push_xml(element);
    }

    pub(crate) fn fallback_json(&mut self, member: &str, value: &Value) {
        self.extensions.insert_json(member, value.clone());
    }

    pub(crate) fn cached_xml(&self) -> &OnceLock<String> {
        &self.cached_xml
    }
}

impl PartialEq for ParsableBase {
    fn eq(&self, other: &Self) -> bool {
        self.extensions == other.extensions
    }
}

/// Object-safe access to `Any`, for downcasting `dyn Parsable`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// An element that can parse itself from, and serialize itself to, XML or
/// JSON.
///
/// XML parsing runs `pre_parse_xml` on the root element, `parse_xml` once
/// per child element, then `post_parse_xml`. Serialization runs
/// `pre_get_xml` (attributes) then `get_xml` (children); namespaces are
/// gathered beforehand through `get_namespaces`.
pub trait Parsable: AsAny + fmt::Debug + Send + Sync {
    fn kind_info(&self) -> &'static KindInfo;

    fn base(&self) -> &ParsableBase;

    fn base_mut(&mut self) -> &mut ParsableBase;

    /// Reads attributes and direct text of the root element.
    fn pre_parse_xml(&mut self, _root: &XmlElement, _ctx: &ParseContext<'_>) -> ParseResult<()> {
        Ok(())
    }

    /// Offered each child element in document order.
    fn parse_xml(&mut self, _child: &XmlElement, _ctx: &ParseContext<'_>) -> ParseResult<Claim> {
        Ok(Claim::Unhandled)
    }

    /// Cross-field validation once all children were seen.
    fn post_parse_xml(&mut self) -> ParseResult<()> {
        Ok(())
    }

    /// Writes attributes onto the open start tag.
    fn pre_get_xml(&self, _out: &mut XmlWriter) {}

    /// Writes child elements.
    fn get_xml(&self, _out: &mut XmlWriter) {}

    /// Adds the `(prefix, uri)` pairs used by fields and children. The
    /// kind's own namespace and the extension slot are added by the caller.
    fn get_namespaces(&self, _namespaces: &mut Namespaces) {}

    /// Offered each member of the JSON object.
    fn parse_json(&mut self, _member: &str, _value: &Value) -> ParseResult<Claim> {
        Ok(Claim::Unhandled)
    }

    fn post_parse_json(&mut self) -> ParseResult<()> {
        Ok(())
    }

    fn get_json(&self, _out: &mut Map<String, Value>) {}
}

impl dyn Parsable {
    pub fn is<T: Parsable>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Parsable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Converts a boxed parsable into its concrete kind, handing the box
    /// back on mismatch.
    pub fn downcast<T: Parsable>(self: Box<Self>) -> Result<Box<T>, Box<dyn Parsable>> {
        if self.is::<T>() {
            self.into_any()
                .downcast::<T>()
                .map_err(|_| unreachable!("type checked above"))
        } else {
            Err(self)
        }
    }
}
