//! Errors raised while parsing XML and JSON documents.
//!
//! Every error aborts the document being parsed; the partially built
//! parsable is dropped.

use std::fmt;
use thiserror::Error;

/// Machine-readable classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    RequiredPropertyMissing,
    RequiredElementMissing,
    MutexedProperties,
    MalformedProperty,
    DuplicateElement,
    RequiredContentMissing,
    UnhandledContent,
    /// The document is not well-formed XML or JSON.
    Syntax,
    EmptyDocument,
    WrongRootElement,
    /// The kind registry was misused.
    Configuration,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredPropertyMissing => "required_property_missing",
            Self::RequiredElementMissing => "required_element_missing",
            Self::MutexedProperties => "mutexed_properties",
            Self::MalformedProperty => "malformed_property",
            Self::DuplicateElement => "duplicate_element",
            Self::RequiredContentMissing => "required_content_missing",
            Self::UnhandledContent => "unhandled_content",
            Self::Syntax => "syntax",
            Self::EmptyDocument => "empty_document",
            Self::WrongRootElement => "wrong_root_element",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error encountered while turning a document into a parsable tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("A required property of a <{element}> element (@{property}) was not present.")]
    RequiredPropertyMissing { property: String, element: String },

    #[error(
        "Values were present for properties @{first} and @{second} of a <{element}> element when only one of the two is allowed."
    )]
    MutexedProperties {
        first: String,
        second: String,
        element: String,
    },

    #[error("A required element (<{parent}/{element}>) was not present.")]
    RequiredElementMissing { element: String, parent: String },

    #[error("A singleton element (<{parent}/{element}>) was duplicated.")]
    DuplicateElement { element: String, parent: String },

    #[error("A <{element}> element was missing required content.")]
    RequiredContentMissing { element: String },

    #[error("The content of a <{element}> element ('{value}') was not in ISO 8601 format.")]
    NotIso8601 { element: String, value: String },

    #[error("The content of a <{element}> element ('{value}') was not an integer.")]
    NotInteger { element: String, value: String },

    #[error("The value of the @{property} property of a <{element}> element ('{value}') was unknown.")]
    UnknownPropertyValue {
        property: String,
        element: String,
        value: String,
    },

    #[error("An unhandled <{element}> element was found in a <{parent}> element.")]
    UnhandledContent { element: String, parent: String },

    #[error("A singleton JSON member ('{member}') was duplicated.")]
    DuplicateMember { member: String },

    #[error("A '{member}' JSON member was missing required content.")]
    MemberContentMissing { member: String },

    #[error("The '{member}' JSON member was not a {expected}.")]
    WrongMemberType {
        member: String,
        expected: &'static str,
    },

    #[error("Error parsing XML: {0}")]
    Xml(String),

    #[error("Error parsing JSON: {0}")]
    Json(String),

    #[error("Empty document.")]
    EmptyDocument,

    #[error("Expected a <{expected}> root element, found <{found}>.")]
    WrongRootElement { expected: String, found: String },

    #[error("No kind is registered for <{name}> in namespace '{namespace}'.")]
    UnknownKind { namespace: String, name: String },

    #[error("Kind {new} cannot be registered for <{name}> in namespace '{namespace}': already taken by {existing}.")]
    RegistryConflict {
        namespace: String,
        name: String,
        existing: &'static str,
        new: &'static str,
    },
}

impl ParseError {
    pub fn required_property(property: impl Into<String>, element: impl Into<String>) -> Self {
        Self::RequiredPropertyMissing {
            property: property.into(),
            element: element.into(),
        }
    }

    pub fn mutexed_properties(
        first: impl Into<String>,
        second: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        Self::MutexedProperties {
            first: first.into(),
            second: second.into(),
            element: element.into(),
        }
    }

    pub fn required_element(element: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::RequiredElementMissing {
            element: element.into(),
            parent: parent.into(),
        }
    }

    pub fn duplicate_element(element: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::DuplicateElement {
            element: element.into(),
            parent: parent.into(),
        }
    }

    pub fn required_content(element: impl Into<String>) -> Self {
        Self::RequiredContentMissing {
            element: element.into(),
        }
    }

    pub fn not_iso8601(element: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotIso8601 {
            element: element.into(),
            value: value.into(),
        }
    }

    pub fn unknown_value(
        property: impl Into<String>,
        element: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::UnknownPropertyValue {
            property: property.into(),
            element: element.into(),
            value: value.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            Self::RequiredPropertyMissing { .. } => ParseErrorKind::RequiredPropertyMissing,
            Self::MutexedProperties { .. } => ParseErrorKind::MutexedProperties,
            Self::RequiredElementMissing { .. } => ParseErrorKind::RequiredElementMissing,
            Self::DuplicateElement { .. } | Self::DuplicateMember { .. } => {
                ParseErrorKind::DuplicateElement
            }
            Self::RequiredContentMissing { .. } | Self::MemberContentMissing { .. } => {
                ParseErrorKind::RequiredContentMissing
            }
            Self::NotIso8601 { .. } | Self::NotInteger { .. } | Self::UnknownPropertyValue { .. } => {
                ParseErrorKind::MalformedProperty
            }
            Self::UnhandledContent { .. } => ParseErrorKind::UnhandledContent,
            Self::WrongMemberType { .. } | Self::Xml(_) | Self::Json(_) => ParseErrorKind::Syntax,
            Self::EmptyDocument => ParseErrorKind::EmptyDocument,
            Self::WrongRootElement { .. } => ParseErrorKind::WrongRootElement,
            Self::UnknownKind { .. } | Self::RegistryConflict { .. } => {
                ParseErrorKind::Configuration
            }
        }
    }
}

/// A specialized Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;
