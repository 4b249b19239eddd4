//! `<gd:reminder>`: when and how to notify about an event.
//!
//! A reminder fires either at an absolute time or a number of minutes
//! before the event. On the wire the relative form may be written in days,
//! hours or minutes; it is always read into minutes and written back as
//! `minutes`.

use gdata_core::time::{format_iso8601, parse_iso8601};
use gdata_parsable::{
    KindInfo, ParseContext, ParseError, ParseResult, Parsable, ParsableBase, ParsableKind,
    XmlElement, XmlWriter,
};

use crate::GD_NS;

pub const METHOD_ALERT: &str = "alert";
pub const METHOD_EMAIL: &str = "email";
pub const METHOD_SMS: &str = "sms";

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderTime {
    /// Epoch milliseconds.
    Absolute(i64),
    /// Minutes before the event starts.
    Relative(i64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reminder {
    base: ParsableBase,
    method: Option<String>,
    /// `None` leaves the time to the server's default.
    time: Option<ReminderTime>,
}

impl Reminder {
    pub fn new(method: Option<&str>, time: Option<ReminderTime>) -> Self {
        Self {
            method: method.map(str::to_owned),
            time,
            ..Self::default()
        }
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn time(&self) -> Option<ReminderTime> {
        self.time
    }

    pub fn is_absolute_time(&self) -> bool {
        matches!(self.time, Some(ReminderTime::Absolute(_)))
    }

    /// Absolute time in epoch milliseconds, if the reminder has one.
    pub fn absolute_time(&self) -> Option<i64> {
        match self.time {
            Some(ReminderTime::Absolute(millis)) => Some(millis),
            _ => None,
        }
    }

    /// Minutes before the event, if the reminder is relative.
    pub fn relative_time(&self) -> Option<i64> {
        match self.time {
            Some(ReminderTime::Relative(minutes)) => Some(minutes),
            _ => None,
        }
    }

    pub fn set_method(&mut self, method: Option<&str>) {
        self.method = method.map(str::to_owned);
        self.base.invalidate();
    }

    pub fn set_time(&mut self, time: Option<ReminderTime>) {
        self.time = time;
        self.base.invalidate();
    }

    /// Two reminders are equal when they use the same method and fire at
    /// the same time in the same mode.
    pub fn equals(&self, other: &Self) -> bool {
        self.method == other.method && self.time == other.time
    }
}

fn relative_attribute(root: &XmlElement, name: &str, scale: i64) -> ParseResult<Option<i64>> {
    let Some(value) = root.attribute(name) else {
        return Ok(None);
    };
    let not_integer = || ParseError::NotInteger {
        element: root.qualified_name(),
        value: value.to_owned(),
    };
    let amount: i64 = value.trim().parse().map_err(|_| not_integer())?;
    amount.checked_mul(scale).map(Some).ok_or_else(not_integer)
}

impl ParsableKind for Reminder {
    const KIND: KindInfo = KindInfo::namespaced("gd", GD_NS, "reminder");
}

impl Parsable for Reminder {
    fn kind_info(&self) -> &'static KindInfo {
        &Self::KIND
    }

    fn base(&self) -> &ParsableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ParsableBase {
        &mut self.base
    }

    fn pre_parse_xml(&mut self, root: &XmlElement, _ctx: &ParseContext<'_>) -> ParseResult<()> {
        self.time = match root.attribute("absoluteTime") {
            Some(absolute) => {
                let millis = parse_iso8601(absolute)
                    .ok_or_else(|| ParseError::not_iso8601(root.qualified_name(), absolute))?;
                Some(ReminderTime::Absolute(millis))
            }
            None => {
                let minutes = match relative_attribute(root, "days", MINUTES_PER_DAY)? {
                    Some(minutes) => Some(minutes),
                    None => match relative_attribute(root, "hours", MINUTES_PER_HOUR)? {
                        Some(minutes) => Some(minutes),
                        None => relative_attribute(root, "minutes", 1)?,
                    },
                };
                minutes.map(ReminderTime::Relative)
            }
        };

        self.method = root.attribute("method").map(str::to_owned);
        Ok(())
    }

    fn pre_get_xml(&self, out: &mut XmlWriter) {
        match self.time {
            Some(ReminderTime::Absolute(millis)) => {
                out.optional_attribute("absoluteTime", format_iso8601(millis).as_deref());
            }
            Some(ReminderTime::Relative(minutes)) => {
                out.attribute("minutes", &minutes.to_string());
            }
            None => {}
        }
        out.optional_attribute("method", self.method.as_deref());
    }
}
