//! Ordering contract shared by element kinds that have a natural sort key.
//!
//! Kinds whose only meaningful relation is equality (external IDs, reminders)
//! expose an `equals` predicate instead of implementing [`Comparable`].

use std::cmp::Ordering;

/// A kind with a natural ordering over its identifying fields.
pub trait Comparable {
    /// Compares `self` with `other` by the kind's key.
    fn compare_with(&self, other: &Self) -> Ordering;
}

/// Compares two optional values.
///
/// A missing value sorts before any present one, and a value is always equal
/// to itself without consulting [`Comparable::compare_with`].
pub fn compare_optional<T: Comparable + ?Sized>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) if std::ptr::eq(a, b) => Ordering::Equal,
        (Some(a), Some(b)) => a.compare_with(b),
    }
}
