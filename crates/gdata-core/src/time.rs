//! Timestamp conversion.
//!
//! Every timestamp held in memory is a count of milliseconds since the UNIX
//! epoch, UTC. On the wire GData uses ISO 8601 date-times
//! (`2009-04-25T15:22:47.000Z`) and bare dates (`2009-04-25`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Sentinel used by wire formats that encode "no timestamp" as a number.
pub const UNSET: i64 = -1;

/// Parses an ISO 8601 / RFC 3339 date-time into epoch milliseconds.
///
/// Date-times without an offset are taken to be UTC.
pub fn parse_iso8601(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Formats epoch milliseconds as `YYYY-MM-DDThh:mm:ss.sssZ`.
pub fn format_iso8601(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parses a bare date (`YYYY-MM-DD` or `YYYYMMDD`) into the epoch
/// milliseconds of its midnight, UTC.
pub fn parse_date(value: &str) -> Option<i64> {
    let fmt = match value.len() {
        10 => "%Y-%m-%d",
        8 => "%Y%m%d",
        _ => return None,
    };

    NaiveDate::parse_from_str(value, fmt)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

/// Formats the UTC date of the given epoch milliseconds as `YYYY-MM-DD`.
pub fn format_date(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Maps an optional timestamp onto the numeric `-1` convention.
pub fn or_unset(millis: Option<i64>) -> i64 {
    millis.unwrap_or(UNSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zulu_datetime_with_millis() {
        assert_eq!(parse_iso8601("2009-04-25T15:22:47.000Z"), Some(1_240_672_967_000));
        assert_eq!(parse_iso8601("2009-04-25T15:22:47.250Z"), Some(1_240_672_967_250));
    }

    #[test]
    fn parses_offset_datetime() {
        assert_eq!(
            parse_iso8601("2009-04-25T17:22:47+02:00"),
            parse_iso8601("2009-04-25T15:22:47Z")
        );
    }

    #[test]
    fn parses_datetime_without_offset_as_utc() {
        assert_eq!(parse_iso8601("2009-04-25T15:22:47"), Some(1_240_672_967_000));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_iso8601("not a date"), None);
        assert_eq!(parse_iso8601(""), None);
    }

    #[test]
    fn formats_with_millis_and_zulu() {
        assert_eq!(
            format_iso8601(1_240_672_967_000).as_deref(),
            Some("2009-04-25T15:22:47.000Z")
        );
    }

    #[test]
    fn formats_epoch_and_negative_times() {
        assert_eq!(format_iso8601(0).as_deref(), Some("1970-01-01T00:00:00.000Z"));
        assert_eq!(format_iso8601(-1000).as_deref(), Some("1969-12-31T23:59:59.000Z"));
    }

    #[test]
    fn dates_in_both_lengths() {
        assert_eq!(parse_date("2009-04-25"), Some(1_240_617_600_000));
        assert_eq!(parse_date("20090425"), Some(1_240_617_600_000));
        assert_eq!(parse_date("2009-4-25"), None);
        assert_eq!(parse_date("2009-13-01"), None);
    }

    #[test]
    fn date_formatting_drops_time_of_day() {
        assert_eq!(format_date(1_240_672_967_000).as_deref(), Some("2009-04-25"));
    }

    #[test]
    fn unset_sentinel() {
        assert_eq!(or_unset(None), -1);
        assert_eq!(or_unset(Some(5)), 5);
    }
}
