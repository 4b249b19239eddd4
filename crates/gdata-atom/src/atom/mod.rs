//! Atom 1.0 (RFC 4287) elements.

pub mod author;
pub mod category;
pub mod content;
pub mod entry;
pub mod feed;
pub mod generator;
pub mod link;

pub use author::Author;
pub use category::Category;
pub use content::Content;
pub use entry::Entry;
pub use feed::Feed;
pub use generator::Generator;
pub use link::Link;

use std::cmp::Ordering;

use gdata_core::Comparable;

/// Appends `item` unless an equal one is already present.
pub(crate) fn add_unique<T: Comparable>(list: &mut Vec<T>, item: T) -> bool {
    if list.iter().any(|existing| existing.compare_with(&item) == Ordering::Equal) {
        return false;
    }
    list.push(item);
    true
}
