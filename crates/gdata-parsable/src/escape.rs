//! Escaping for attribute values, element text and keyword lists.

use std::borrow::Cow;

/// Escapes `& < > ' "` for use inside a quoted attribute value.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

/// Escapes `& < >` for use as element content.
pub fn escape_text(value: &str) -> Cow<'_, str> {
    quick_xml::escape::partial_escape(value)
}

/// Joins keywords into a single comma-delimited scalar, percent-encoding
/// commas embedded in individual keywords as `%2C`.
pub fn join_keywords<S: AsRef<str>>(keywords: &[S]) -> String {
    keywords
        .iter()
        .map(|keyword| keyword.as_ref().replace(',', "%2C"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits a comma-delimited keyword scalar, trimming each keyword and
/// decoding `%2C` back into a comma.
pub fn split_keywords(list: &str) -> Vec<String> {
    if list.is_empty() {
        return Vec::new();
    }

    list.split(',')
        .map(|keyword| keyword.trim().replace("%2C", ","))
        .collect()
}
