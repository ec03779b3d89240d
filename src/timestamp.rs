use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::error::{ConfigError, Result};

/// The timestamp format used when none is configured.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%6N %z";

/// The timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// How timestamp fields are rendered.
///
/// A format is a strftime pattern. Besides the directives `chrono`
/// understands, it accepts `%N` for nanoseconds (`%3N`, `%6N` and `%9N`
/// for a fixed number of digits) and `%L` for milliseconds.
///
/// A timezone is `UTC` (or `GMT`, `Z`, `Etc/UTC`) or a fixed offset written
/// `+09:00`, `+0900`, `+09`, optionally after `UTC`. Named regional zones
/// are not recognized.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use textrec::TimestampFormat;
///
/// let ts = Utc.with_ymd_and_hms(2015, 1, 27, 19, 23, 49).unwrap();
/// let mut out = String::new();
/// TimestampFormat::default().write(&ts, &mut out);
/// assert_eq!(out, "2015-01-27 19:23:49.000000 +0000");
///
/// out.clear();
/// TimestampFormat::new("%Y/%m/%d %H:%M", "+09:00")?.write(&ts, &mut out);
/// assert_eq!(out, "2015/01/28 04:23");
/// # Ok::<(), textrec::Error>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimestampFormat {
    format: String,
    timezone: String,
    /// `format` with the nanosecond directives rewritten for chrono.
    pattern: String,
    offset: FixedOffset,
}

impl TimestampFormat {
    /// Create a timestamp format.
    ///
    /// This fails if `format` has an invalid directive or `timezone` is not
    /// recognized.
    pub fn new(format: &str, timezone: &str) -> Result<TimestampFormat> {
        let pattern = translate(format)
            .filter(|pattern| {
                StrftimeItems::new(pattern).all(|item| item != Item::Error)
            })
            .ok_or_else(|| ConfigError::TimestampFormat(format.to_string()))?;
        let offset = parse_timezone(timezone).ok_or_else(|| {
            ConfigError::UnknownTimezone(timezone.to_string())
        })?;
        Ok(TimestampFormat {
            format: format.to_string(),
            timezone: timezone.to_string(),
            pattern,
            offset,
        })
    }

    /// The format as configured.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The timezone as configured.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Append `ts`, shown in this format's timezone, to `out`.
    pub fn write(&self, ts: &DateTime<Utc>, out: &mut String) {
        let local = ts.with_timezone(&self.offset);
        // The pattern was checked in `new`, so formatting cannot fail.
        let _ = write!(out, "{}", local.format(&self.pattern));
    }
}

impl Default for TimestampFormat {
    fn default() -> TimestampFormat {
        TimestampFormat {
            format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            pattern: "%Y-%m-%d %H:%M:%S.%6f %z".to_string(),
            offset: Utc.fix(),
        }
    }
}

/// Rewrite `%N` and `%L` into chrono's `%f` forms. Every other directive
/// passes through.
fn translate(format: &str) -> Option<String> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let mut width = String::new();
        while let Some(&digit) = chars.peek() {
            if !digit.is_ascii_digit() {
                break;
            }
            width.push(digit);
            chars.next();
        }
        match chars.next() {
            Some('N') => match width.as_str() {
                "" | "9" => out.push_str("%9f"),
                "6" => out.push_str("%6f"),
                "3" => out.push_str("%3f"),
                _ => return None,
            },
            Some('L') if width.is_empty() => out.push_str("%3f"),
            Some(directive) => {
                out.push('%');
                out.push_str(&width);
                out.push(directive);
            }
            None => return None,
        }
    }
    Some(out)
}

fn parse_timezone(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    let utc = ["UTC", "GMT", "UT", "Z", "Etc/UTC", "Etc/GMT"];
    if utc.iter().any(|name| zone.eq_ignore_ascii_case(name)) {
        return Some(Utc.fix());
    }
    let offset = zone
        .strip_prefix("UTC")
        .or_else(|| zone.strip_prefix("GMT"))
        .unwrap_or(zone);
    let sign = match offset.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits = &offset[1..];
    let colon = digits.len() == 5;
    let well_formed = digits.bytes().enumerate().all(|(i, b)| {
        b.is_ascii_digit() || (colon && i == 2 && b == b':')
    });
    if !well_formed {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits, "0"),
        4 => (&digits[..2], &digits[2..]),
        5 => (&digits[..2], &digits[3..]),
        _ => return None,
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
