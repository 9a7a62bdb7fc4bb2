use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use std::borrow::Cow;

/// Canonical `<dateTime.iso8601>` layout. This is the only layout we ever write.
pub const FULL_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Local time without an offset, interpreted as UTC.
pub const LOCAL_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Dense local time (the layout used by most other XML-RPC implementations), interpreted as UTC.
pub const DENSE_DATETIME: &str = "%Y%m%dT%H:%M:%S%.f";

/// Dense layout with a numeric offset, seen in the wild.
pub const DENSE_OFFSET_DATETIME: &str = "%Y%m%dT%H:%M:%S%.f%z";

fn escape_byte(b: u8) -> Option<&'static str> {
    match b {
        b'<' => Some("&lt;"),
        b'>' => Some("&gt;"),
        b'"' => Some("&quot;"),
        b'\'' => Some("&apos;"),
        b'&' => Some("&amp;"),
        _ => None,
    }
}

/// Escape a string for use as XML characters.
///
/// All five reserved characters are replaced by their predefined entities. Returns the input
/// unchanged (and unallocated) if there is nothing to escape.
pub fn escape_xml(s: &str) -> Cow<str> {
    let first = match s.bytes().position(|b| escape_byte(b).is_some()) {
        Some(pos) => pos,
        None => return Cow::Borrowed(s),
    };

    let mut escaped = String::with_capacity(s.len() + 8);
    escaped.push_str(&s[..first]);
    // all reserved characters are ASCII, so splitting on them never cuts a UTF-8 sequence
    let mut start = first;
    for (i, b) in s.bytes().enumerate().skip(first) {
        if let Some(entity) = escape_byte(b) {
            escaped.push_str(&s[start..i]);
            escaped.push_str(entity);
            start = i + 1;
        }
    }
    escaped.push_str(&s[start..]);

    Cow::Owned(escaped)
}

/// Reverses `escape_xml`.
///
/// Only the five predefined entities are recognized. Any other `&` sequence is kept verbatim.
pub fn unescape_xml(s: &str) -> Cow<str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut unescaped = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        unescaped.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let entity = [
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&apos;", '\''),
            ("&amp;", '&'),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));

        match entity {
            Some(&(entity, c)) => {
                unescaped.push(c);
                rest = &rest[entity.len()..];
            }
            None => {
                unescaped.push('&');
                rest = &rest[1..];
            }
        }
    }
    unescaped.push_str(rest);

    Cow::Owned(unescaped)
}

/// Formats a date-time in the canonical layout.
///
/// `%:z` has no room for seconds, so offsets that are not whole minutes are written as UTC.
pub fn format_datetime(date_time: &DateTime<FixedOffset>) -> String {
    if date_time.offset().local_minus_utc() % 60 != 0 {
        return date_time.with_timezone(&Utc).format(FULL_DATETIME).to_string();
    }
    date_time.format(FULL_DATETIME).to_string()
}

/// Parses the body of a `<dateTime.iso8601>` element.
///
/// Candidate layouts are tried in a fixed order and the first one that consumes the whole input
/// wins. Layouts without an offset are taken to be UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(date_time) = DateTime::parse_from_str(s, FULL_DATETIME) {
        return Some(date_time);
    }

    for layout in &[LOCAL_DATETIME, DENSE_DATETIME] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(Utc.from_utc_datetime(&naive).into());
        }
    }

    DateTime::parse_from_str(s, DENSE_OFFSET_DATETIME).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Timelike, TimeZone};
    use proptest::prelude::*;

    #[test]
    fn escapes_all_reserved_characters() {
        assert_eq!(escape_xml(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
        assert_eq!(escape_xml("plain text ünïcödé"), "plain text ünïcödé");
    }

    #[test]
    fn does_not_allocate_without_reserved_characters() {
        match escape_xml("nothing to see here") {
            Cow::Borrowed(_) => {}
            Cow::Owned(s) => panic!("unexpected allocation for {:?}", s),
        }
    }

    #[test]
    fn keeps_unknown_entities() {
        assert_eq!(unescape_xml("&nbsp;&amp;nbsp;&"), "&nbsp;&nbsp;&");
        assert_eq!(unescape_xml("a &lt; b &gt; c"), "a < b > c");
    }

    #[test]
    fn formats_datetimes() {
        let offset = FixedOffset::west_opt(8 * 3600 + 30 * 60).unwrap();
        let date_time = offset.with_ymd_and_hms(2016, 5, 2, 6, 1, 5).unwrap();

        let formatted = format_datetime(&date_time);
        assert_eq!(formatted, "2016-05-02T06:01:05-08:30");
        assert_eq!(parse_datetime(&formatted), Some(date_time));
    }

    #[test]
    fn formats_utc_with_numeric_offset() {
        let date_time = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap().fixed_offset();
        assert_eq!(format_datetime(&date_time), "2006-01-02T15:04:05+00:00");
    }

    #[test]
    fn writes_sub_minute_offsets_as_utc() {
        let offset = FixedOffset::east_opt(30).unwrap();
        let date_time = offset.timestamp_opt(1_000_000_000, 0).unwrap();

        let formatted = format_datetime(&date_time);
        assert_eq!(formatted, "2001-09-09T01:46:40+00:00");

        let parsed = parse_datetime(&formatted).unwrap();
        assert_eq!(parsed.timestamp(), date_time.timestamp());
        assert_eq!(parsed, date_time);
    }

    #[test]
    fn keeps_fractional_seconds() {
        let date_time = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
            .with_nanosecond(250_000_000).unwrap()
            .fixed_offset();

        let formatted = format_datetime(&date_time);
        assert_eq!(formatted, "2006-01-02T15:04:05.250+00:00");
        assert_eq!(parse_datetime(&formatted), Some(date_time));
    }

    #[test]
    fn parses_legacy_layouts() {
        let expected = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap().fixed_offset();

        assert_eq!(parse_datetime("2006-01-02T15:04:05"), Some(expected));
        assert_eq!(parse_datetime("20060102T15:04:05"), Some(expected));
        assert_eq!(parse_datetime("20060102T08:04:05-0700"), Some(expected));
        assert_eq!(parse_datetime("2006-01-02T08:04:05-07:00"), Some(expected));
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(parse_datetime("not-a-date"), None);
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("2006-01-02"), None);
        assert_eq!(parse_datetime("2006-01-02T15:04:05 trailing"), None);
    }

    proptest! {
        #[test]
        fn unescape_reverses_escape(s in any::<String>()) {
            let escaped = escape_xml(&s);
            prop_assert_eq!(unescape_xml(&escaped), s.as_str());
        }

        #[test]
        fn escape_leaves_no_reserved_characters(s in any::<String>()) {
            let escaped = escape_xml(&s);
            prop_assert!(!escaped.contains(|c: char| matches!(c, '<' | '>' | '"' | '\'')));
            // every remaining `&` starts one of the predefined entities
            for (i, _) in escaped.match_indices('&') {
                let rest = &escaped[i..];
                prop_assert!(
                    ["&lt;", "&gt;", "&quot;", "&apos;", "&amp;"].iter().any(|e| rest.starts_with(e))
                );
            }
        }
    }
}
