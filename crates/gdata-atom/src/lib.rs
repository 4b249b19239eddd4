//! Atom, GData and gContact element kinds.
//!
//! Each kind is an instantiation of the `gdata-parsable` framework. Call
//! [`register_kinds`] once before using `gdata_parsable::registry::parse_any`
//! on documents containing these elements.

pub mod atom;
pub mod gcontact;
pub mod gd;
pub mod media;

use gdata_parsable::{ParseResult, registry};

pub use atom::{Author, Category, Content, Entry, Feed, Generator, Link};
pub use gcontact::ExternalId;
pub use gd::{Reminder, ReminderTime};
pub use media::Keywords;

/// GData namespace (`gd:`).
pub const GD_NS: &str = "http://schemas.google.com/g/2005";
/// Contacts namespace (`gContact:`).
pub const GCONTACT_NS: &str = "http://schemas.google.com/contact/2008";
/// OpenSearch 1.1 namespace (`openSearch:`).
pub const OPENSEARCH_NS: &str = "http://a9.com/-/spec/opensearch/1.1/";
/// Media RSS namespace (`media:`).
pub const MEDIA_NS: &str = "http://search.yahoo.com/mrss/";
/// Batch processing namespace (`batch:`).
pub const BATCH_NS: &str = "http://schemas.google.com/gdata/batch";

/// Registers every kind in this crate with the process-wide registry.
///
/// # Errors
///
/// Fails if another kind already claimed one of the element names.
pub fn register_kinds() -> ParseResult<()> {
    registry::register::<Author>()?;
    registry::register::<Category>()?;
    registry::register::<Generator>()?;
    registry::register::<Link>()?;
    registry::register::<Entry>()?;
    registry::register::<Feed>()?;
    registry::register::<Reminder>()?;
    registry::register::<ExternalId>()?;
    registry::register::<Keywords>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_parsable::Parsable;

    #[test]
    fn registration_is_repeatable() {
        register_kinds().unwrap();
        register_kinds().unwrap();
        assert!(registry::is_registered::<Entry>());
        assert!(registry::lookup(GD_NS, "reminder").is_some());
    }

    #[test]
    fn parse_any_dispatches_to_entries() {
        register_kinds().unwrap();
        let parsed = registry::parse_any(
            r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>urn:1</id><title>One</title></entry>"#,
        )
        .unwrap();
        let entry = parsed.downcast_ref::<Entry>().unwrap();
        assert_eq!(entry.id(), Some("urn:1"));
        assert_eq!(parsed.kind_info().element_name, "entry");
    }
}
