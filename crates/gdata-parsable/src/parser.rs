//! Helpers implementing the common field patterns for `parse_xml` and
//! `parse_json` hooks.
//!
//! Element helpers are called once the hook has matched the child's name;
//! they record the value and return [`Claim::Handled`], or fail the document.

use std::ops::BitOr;
use std::str::FromStr;

use gdata_core::time::parse_iso8601;
use serde_json::Value;

use crate::document::{parse_element, parse_json_value};
use crate::error::{ParseError, ParseResult};
use crate::kind::ParsableKind;
use crate::parsable::{Claim, ParseContext};
use crate::xml::XmlElement;

/// Flag set controlling how a helper treats its field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions(u8);

impl ParserOptions {
    pub const NONE: Self = Self(0);
    /// A second occurrence is a `DuplicateElement` error.
    pub const NO_DUPES: Self = Self(1 << 0);
    /// Missing content is a `RequiredContentMissing` error.
    pub const REQUIRED: Self = Self(1 << 1);
    /// Empty content is a `RequiredContentMissing` error.
    pub const NON_EMPTY: Self = Self(1 << 2);
    /// Missing content is stored as the empty string.
    pub const DEFAULT: Self = Self(1 << 3);
    /// Unparseable content is skipped instead of failing the document.
    pub const IGNORE_ERROR: Self = Self(1 << 4);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ParserOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

fn check_duplicate<T>(
    dest: &Option<T>,
    child: &XmlElement,
    ctx: &ParseContext<'_>,
    options: ParserOptions,
) -> ParseResult<()> {
    if options.contains(ParserOptions::NO_DUPES) && dest.is_some() {
        return Err(ParseError::duplicate_element(child.qualified_name(), ctx.parent));
    }
    Ok(())
}

/// Checks the content of `child` against the required-ness flags.
fn content(child: &XmlElement, options: ParserOptions) -> ParseResult<Option<String>> {
    let text = child.text();
    let missing = text.is_none() && options.contains(ParserOptions::REQUIRED);
    let empty = text.as_deref() == Some("") && options.contains(ParserOptions::NON_EMPTY);
    if missing || empty {
        return Err(ParseError::required_content(child.qualified_name()));
    }

    if text.is_none() && options.contains(ParserOptions::DEFAULT) {
        return Ok(Some(String::new()));
    }
    Ok(text)
}

/// Stores the text of `child` into `dest`.
pub fn string_from_element(
    child: &XmlElement,
    ctx: &ParseContext<'_>,
    options: ParserOptions,
    dest: &mut Option<String>,
) -> ParseResult<Claim> {
    check_duplicate(dest, child, ctx, options)?;
    *dest = content(child, options)?;
    Ok(Claim::Handled)
}

/// Stores the ISO 8601 timestamp in `child` into `dest` as epoch
/// milliseconds.
pub fn time_from_element(
    child: &XmlElement,
    ctx: &ParseContext<'_>,
    options: ParserOptions,
    dest: &mut Option<i64>,
) -> ParseResult<Claim> {
    check_duplicate(dest, child, ctx, options)?;
    let Some(text) = child.text() else {
        return Err(ParseError::required_content(child.qualified_name()));
    };

    match parse_iso8601(&text) {
        Some(millis) => *dest = Some(millis),
        None if options.contains(ParserOptions::IGNORE_ERROR) => {}
        None => return Err(ParseError::not_iso8601(child.qualified_name(), text)),
    }
    Ok(Claim::Handled)
}

/// Stores the numeric content of `child` into `dest`.
pub fn number_from_element<T: FromStr>(
    child: &XmlElement,
    ctx: &ParseContext<'_>,
    options: ParserOptions,
    dest: &mut Option<T>,
) -> ParseResult<Claim> {
    check_duplicate(dest, child, ctx, options)?;
    let Some(text) = child.text() else {
        return Err(ParseError::required_content(child.qualified_name()));
    };

    match text.trim().parse::<T>() {
        Ok(value) => *dest = Some(value),
        Err(_) if options.contains(ParserOptions::IGNORE_ERROR) => {}
        Err(_) => {
            return Err(ParseError::NotInteger {
                element: child.qualified_name(),
                value: text,
            });
        }
    }
    Ok(Claim::Handled)
}

/// Parses `child` as a `K` into `dest`.
pub fn object_from_element<K: ParsableKind>(
    child: &XmlElement,
    ctx: &ParseContext<'_>,
    options: ParserOptions,
    dest: &mut Option<K>,
) -> ParseResult<Claim> {
    check_duplicate(dest, child, ctx, options)?;
    *dest = Some(parse_element::<K>(child, ctx.options)?);
    Ok(Claim::Handled)
}

/// Parses `child` as a `K` and appends it to `dest`.
pub fn objects_from_element<K: ParsableKind>(
    child: &XmlElement,
    ctx: &ParseContext<'_>,
    dest: &mut Vec<K>,
) -> ParseResult<Claim> {
    dest.push(parse_element::<K>(child, ctx.options)?);
    Ok(Claim::Handled)
}

/// Returns the value of a required attribute of `element`, rejecting an
/// absent or empty one.
pub fn required_property<'a>(element: &'a XmlElement, property: &str) -> ParseResult<&'a str> {
    match element.attribute(property) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ParseError::required_property(property, element.qualified_name())),
    }
}

/// Reads a `true`/`false` attribute. An absent attribute yields `default`,
/// or an error when there is none.
pub fn boolean_from_property(
    element: &XmlElement,
    property: &str,
    default: Option<bool>,
) -> ParseResult<bool> {
    match element.attribute(property) {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(ParseError::unknown_value(
            property,
            element.qualified_name(),
            other,
        )),
        None => default
            .ok_or_else(|| ParseError::required_property(property, element.qualified_name())),
    }
}

fn json_duplicate<T>(member: &str, options: ParserOptions, dest: &Option<T>) -> ParseResult<()> {
    if options.contains(ParserOptions::NO_DUPES) && dest.is_some() {
        return Err(ParseError::DuplicateMember {
            member: member.to_owned(),
        });
    }
    Ok(())
}

fn json_missing(member: &str, options: ParserOptions) -> ParseResult<Claim> {
    if options.contains(ParserOptions::REQUIRED) {
        return Err(ParseError::MemberContentMissing {
            member: member.to_owned(),
        });
    }
    Ok(Claim::Handled)
}

fn wrong_type(member: &str, expected: &'static str) -> ParseError {
    ParseError::WrongMemberType {
        member: member.to_owned(),
        expected,
    }
}

/// Stores a string member. `null` counts as absent.
pub fn string_from_json_member(
    member: &str,
    value: &Value,
    options: ParserOptions,
    dest: &mut Option<String>,
) -> ParseResult<Claim> {
    json_duplicate(member, options, dest)?;
    match value {
        Value::Null if options.contains(ParserOptions::DEFAULT) => {
            *dest = Some(String::new());
            Ok(Claim::Handled)
        }
        Value::Null => json_missing(member, options),
        Value::String(s) if s.is_empty() && options.contains(ParserOptions::NON_EMPTY) => {
            Err(ParseError::MemberContentMissing {
                member: member.to_owned(),
            })
        }
        Value::String(s) => {
            *dest = Some(s.clone());
            Ok(Claim::Handled)
        }
        _ => Err(wrong_type(member, "string")),
    }
}

/// Stores an ISO 8601 string member as epoch milliseconds.
pub fn time_from_json_member(
    member: &str,
    value: &Value,
    options: ParserOptions,
    dest: &mut Option<i64>,
) -> ParseResult<Claim> {
    json_duplicate(member, options, dest)?;
    match value {
        Value::Null => json_missing(member, options),
        Value::String(s) => {
            match parse_iso8601(s) {
                Some(millis) => *dest = Some(millis),
                None if options.contains(ParserOptions::IGNORE_ERROR) => {}
                None => return Err(ParseError::not_iso8601(member, s.as_str())),
            }
            Ok(Claim::Handled)
        }
        _ => Err(wrong_type(member, "string")),
    }
}

/// Stores an integer member. Numeric strings are accepted, as Google APIs
/// encode 64-bit values as strings.
pub fn int64_from_json_member(
    member: &str,
    value: &Value,
    options: ParserOptions,
    dest: &mut Option<i64>,
) -> ParseResult<Claim> {
    json_duplicate(member, options, dest)?;
    let parsed = match value {
        Value::Null => return json_missing(member, options),
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };

    match parsed {
        Some(n) => *dest = Some(n),
        None if options.contains(ParserOptions::IGNORE_ERROR) => {}
        None => return Err(wrong_type(member, "integer")),
    }
    Ok(Claim::Handled)
}

pub fn boolean_from_json_member(
    member: &str,
    value: &Value,
    options: ParserOptions,
    dest: &mut Option<bool>,
) -> ParseResult<Claim> {
    json_duplicate(member, options, dest)?;
    match value {
        Value::Null => json_missing(member, options),
        Value::Bool(b) => {
            *dest = Some(*b);
            Ok(Claim::Handled)
        }
        _ => Err(wrong_type(member, "boolean")),
    }
}

/// Stores an array of strings.
pub fn strv_from_json_member(
    member: &str,
    value: &Value,
    options: ParserOptions,
    dest: &mut Option<Vec<String>>,
) -> ParseResult<Claim> {
    json_duplicate(member, options, dest)?;
    match value {
        Value::Null => json_missing(member, options),
        Value::Array(items) => {
            let strings = items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| wrong_type(member, "string array"))?;
            *dest = Some(strings);
            Ok(Claim::Handled)
        }
        _ => Err(wrong_type(member, "string array")),
    }
}

/// Parses an object member as a `K` into `dest`.
pub fn object_from_json_member<K: ParsableKind>(
    member: &str,
    value: &Value,
    options: ParserOptions,
    dest: &mut Option<K>,
) -> ParseResult<Claim> {
    json_duplicate(member, options, dest)?;
    match value {
        Value::Null => json_missing(member, options),
        _ => {
            *dest = Some(parse_json_value::<K>(value)?);
            Ok(Claim::Handled)
        }
    }
}
