//! Static description of a parsable kind.

use std::borrow::Cow;

use crate::parsable::Parsable;
use crate::xml::{ATOM_NS, XmlElement};

/// What a kind serializes to: its element name, namespace and optional
/// JSON discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindInfo {
    pub element_name: &'static str,
    /// Prefix used when serializing; `None` for Atom elements.
    pub namespace_prefix: Option<&'static str>,
    pub namespace_uri: &'static str,
    /// Value of the `kind` member identifying this kind in JSON documents.
    pub json_kind: Option<&'static str>,
}

impl KindInfo {
    /// An unprefixed Atom element.
    pub const fn atom(element_name: &'static str) -> Self {
        Self {
            element_name,
            namespace_prefix: None,
            namespace_uri: ATOM_NS,
            json_kind: None,
        }
    }

    /// An element in an extension namespace, serialized as `prefix:name`.
    pub const fn namespaced(
        prefix: &'static str,
        namespace_uri: &'static str,
        element_name: &'static str,
    ) -> Self {
        Self {
            element_name,
            namespace_prefix: Some(prefix),
            namespace_uri,
            json_kind: None,
        }
    }

    pub const fn with_json_kind(mut self, json_kind: &'static str) -> Self {
        self.json_kind = Some(json_kind);
        self
    }

    pub fn qualified_name(&self) -> Cow<'static, str> {
        match self.namespace_prefix {
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.element_name)),
            None => Cow::Borrowed(self.element_name),
        }
    }

    /// Returns true if `element` is an instance of this kind.
    pub fn matches(&self, element: &XmlElement) -> bool {
        element.is(self.namespace_uri, self.element_name)
    }
}

/// A concrete kind: a [`Parsable`] with static metadata and an empty,
/// unsealed constructor (`Default`).
pub trait ParsableKind: Parsable + Default + 'static {
    const KIND: KindInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names() {
        assert_eq!(KindInfo::atom("author").qualified_name(), "author");
        assert_eq!(
            KindInfo::namespaced("gd", "http://schemas.google.com/g/2005", "reminder")
                .qualified_name(),
            "gd:reminder"
        );
    }

    #[test]
    fn matching_uses_namespace_and_name() {
        let info = KindInfo::namespaced("gd", "urn:gd", "who");
        assert!(info.matches(&XmlElement::new(Some("urn:gd"), Some("g"), "who")));
        assert!(!info.matches(&XmlElement::new(Some("urn:other"), Some("gd"), "who")));
        assert!(KindInfo::atom("entry").matches(&XmlElement::new(None, None, "entry")));
    }
}
