//! The parsable framework: typed element trees parsed from and serialized
//! to GData XML and JSON documents.
//!
//! # Architecture
//!
//! ```text
//!              ┌────────────┐   read_document   ┌─────────────┐
//!   text ─────►│  xml.rs    │──────────────────►│ XmlElement  │
//!              └────────────┘                   └──────┬──────┘
//!                                                      │ populate (document.rs)
//!                                                      ▼
//!   ┌───────────────┐  hooks   ┌──────────────────────────────────┐
//!   │ parser.rs     │◄─────────│ impl Parsable for K              │
//!   │ field helpers │          │  pre_parse / parse / post_parse  │
//!   └───────────────┘          │  pre_get_xml / get_xml / ns      │
//!                              │  parse_json / get_json           │
//!                              └──────────────┬───────────────────┘
//!                                             │ write_element / to_json_value
//!                                             ▼
//!                                    XmlWriter / serde_json
//! ```
//!
//! Concrete kinds implement [`Parsable`] and [`ParsableKind`]; the
//! [`registry`] maps element names to kinds for documents whose root kind is
//! not known up front.

pub mod document;
pub mod error;
pub mod escape;
pub mod extensions;
pub mod kind;
pub mod parsable;
pub mod parser;
pub mod registry;
pub mod writer;
pub mod xml;

pub use document::{
    SerializeOptions, XML_DECLARATION, collect_namespaces, parse_element, parse_json,
    parse_json_value, parse_xml, parse_xml_with, populate, populate_json, to_json, to_json_value,
    to_xml, to_xml_with,
};
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use extensions::Extensions;
pub use kind::{KindInfo, ParsableKind};
pub use parsable::{AsAny, Claim, Origin, ParseContext, ParseOptions, Parsable, ParsableBase};
pub use parser::ParserOptions;
pub use writer::XmlWriter;
pub use xml::{ATOM_NS, Namespaces, XmlAttribute, XmlElement, XmlNode};
