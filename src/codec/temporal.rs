//! Temporal codecs: date, time, timestamp, timestamptz, interval.
//!
//! The wire units are PostgreSQL's: dates are days since 2000-01-01,
//! times are microseconds since midnight, timestamps are microseconds
//! since 2000-01-01 00:00:00. Conversions to calendar fields use plain
//! civil-calendar arithmetic so the core carries no clock dependency;
//! chrono integration lives in the typed layer.

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::FormatCode;
use crate::value::{Date, Interval, Timestamp, Value, ValueKind};

use super::{Codec, encode_plan, scan_plan, utf8};

/// Days between 1970-01-01 and 2000-01-01.
const UNIX_TO_PG_DAYS: i64 = 10_957;
/// Microseconds per second.
const USECS_PER_SEC: i64 = 1_000_000;
/// Microseconds per day.
const USECS_PER_DAY: i64 = 86_400_000_000;

/// Civil date to days since 1970-01-01 (proleptic Gregorian).
pub(crate) fn civil_to_unix_days(y: i32, m: u32, d: u32) -> i64 {
    let y = y as i64 - i64::from(m <= 2);
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (m as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Days since 1970-01-01 to civil date.
pub(crate) fn unix_days_to_civil(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    ((y + i64::from(m <= 2)) as i32, m, d)
}

fn pg_days_from_ymd(y: i32, m: u32, d: u32) -> Result<i32> {
    if !(1..=9999).contains(&y) || !(1..=12).contains(&m) || !(1..=31).contains(&d) {
        return Err(Error::MalformedText(format!(
            "date {y:04}-{m:02}-{d:02} out of supported range"
        )));
    }
    let days = civil_to_unix_days(y, m, d) - UNIX_TO_PG_DAYS;
    i32::try_from(days).map_err(|_| Error::out_of_range("date", "i32 days"))
}

fn ymd_from_pg_days(days: i32) -> (i32, u32, u32) {
    unix_days_to_civil(days as i64 + UNIX_TO_PG_DAYS)
}

fn parse_date_fields(s: &str) -> Result<(i32, u32, u32)> {
    let mut parts = s.splitn(3, '-');
    let bad = || Error::MalformedText(format!("invalid date: {s:?}"));
    let y: i32 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let m: u32 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let d: u32 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    // Round-trip check catches out-of-range day-of-month.
    let days = pg_days_from_ymd(y, m, d)?;
    if ymd_from_pg_days(days) != (y, m, d) {
        return Err(bad());
    }
    Ok((y, m, d))
}

// === date ===

/// Codec for `date`: i32 days since 2000-01-01, ±infinity sentinels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

fn decode_date(format: FormatCode, bytes: &[u8]) -> Result<Value> {
    match format {
        FormatCode::Binary => {
            let arr: [u8; 4] = bytes
                .try_into()
                .map_err(|_| Error::length("date", bytes.len(), 4))?;
            Ok(Value::Date(Date::from_wire(i32::from_be_bytes(arr))))
        }
        FormatCode::Text => {
            let s = utf8(bytes)?;
            match s {
                "infinity" => Ok(Value::Date(Date::Infinity)),
                "-infinity" => Ok(Value::Date(Date::NegInfinity)),
                _ => {
                    let (y, m, d) = parse_date_fields(s)?;
                    Ok(Value::Date(Date::Finite(pg_days_from_ymd(y, m, d)?)))
                }
            }
        }
    }
}

fn encode_date(format: FormatCode, date: Date, buf: &mut Vec<u8>) -> Result<()> {
    match format {
        FormatCode::Binary => buf.extend_from_slice(&date.to_wire().to_be_bytes()),
        FormatCode::Text => match date {
            Date::Infinity => buf.extend_from_slice(b"infinity"),
            Date::NegInfinity => buf.extend_from_slice(b"-infinity"),
            Date::Finite(days) => {
                let (y, m, d) = ymd_from_pg_days(days);
                buf.extend_from_slice(format!("{y:04}-{m:02}-{d:02}").as_bytes());
            }
        },
    }
    Ok(())
}

impl Codec for DateCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Binary
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Date) {
            return None;
        }
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let date = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Date(d) => *d,
                other => return Err(Error::out_of_range(other.kind_name(), "date")),
            };
            encode_date(format, date, buf)?;
            Ok(IsNull::No)
        })
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Date) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            *out = decode_date(format, bytes)?;
            Ok(())
        })
    }
}

// === time ===

/// Codec for `time`: i64 microseconds since midnight, accepting the
/// 24:00:00 endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeCodec;

fn parse_time_text(s: &str) -> Result<i64> {
    let bad = || Error::MalformedText(format!("invalid time: {s:?}"));
    let (hms, frac) = match s.split_once('.') {
        Some((hms, frac)) => (hms, Some(frac)),
        None => (s, None),
    };
    let mut parts = hms.splitn(3, ':');
    let h: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let m: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let sec: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    if !(0..=24).contains(&h) || !(0..60).contains(&m) || !(0..60).contains(&sec) {
        return Err(bad());
    }
    let mut usecs = ((h * 3600 + m * 60 + sec) * USECS_PER_SEC) as i64;
    if let Some(frac) = frac {
        if frac.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let mut micros: i64 = frac.parse().map_err(|_| bad())?;
        for _ in frac.len()..6 {
            micros *= 10;
        }
        usecs += micros;
    }
    if usecs > USECS_PER_DAY {
        return Err(bad());
    }
    Ok(usecs)
}

fn format_time_text(usecs: i64, buf: &mut Vec<u8>) {
    let secs = usecs.div_euclid(USECS_PER_SEC);
    let micros = usecs.rem_euclid(USECS_PER_SEC);
    let h = secs / 3600;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    if micros == 0 {
        buf.extend_from_slice(format!("{h:02}:{m:02}:{s:02}").as_bytes());
    } else {
        let frac = format!("{micros:06}");
        let frac = frac.trim_end_matches('0');
        buf.extend_from_slice(format!("{h:02}:{m:02}:{s:02}.{frac}").as_bytes());
    }
}

fn decode_time(format: FormatCode, bytes: &[u8]) -> Result<Value> {
    match format {
        FormatCode::Binary => {
            let arr: [u8; 8] = bytes
                .try_into()
                .map_err(|_| Error::length("time", bytes.len(), 8))?;
            let usecs = i64::from_be_bytes(arr);
            if !(0..=USECS_PER_DAY).contains(&usecs) {
                return Err(Error::out_of_range(usecs, "time"));
            }
            Ok(Value::Time(usecs))
        }
        FormatCode::Text => Ok(Value::Time(parse_time_text(utf8(bytes)?)?)),
    }
}

impl Codec for TimeCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Binary
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Time) {
            return None;
        }
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let usecs = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Time(t) => *t,
                other => return Err(Error::out_of_range(other.kind_name(), "time")),
            };
            if !(0..=USECS_PER_DAY).contains(&usecs) {
                return Err(Error::out_of_range(usecs, "time"));
            }
            match format {
                FormatCode::Binary => buf.extend_from_slice(&usecs.to_be_bytes()),
                FormatCode::Text => format_time_text(usecs, buf),
            }
            Ok(IsNull::No)
        })
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Time) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            *out = decode_time(format, bytes)?;
            Ok(())
        })
    }
}

// === timestamp / timestamptz ===

/// Codec for `timestamp` and `timestamptz`: i64 microseconds since
/// 2000-01-01 00:00:00 (UTC for timestamptz), ±infinity sentinels.
///
/// The wire value is timezone-free; `with_tz` only changes the text
/// notation, which carries a `+00` suffix for timestamptz.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec {
    /// True for `timestamptz`.
    pub with_tz: bool,
}

impl TimestampCodec {
    /// The `timestamp` codec.
    pub fn plain() -> Self {
        TimestampCodec { with_tz: false }
    }

    /// The `timestamptz` codec.
    pub fn with_time_zone() -> Self {
        TimestampCodec { with_tz: true }
    }
}

fn parse_timestamp_text(s: &str, with_tz: bool) -> Result<Timestamp> {
    match s {
        "infinity" => return Ok(Timestamp::Infinity),
        "-infinity" => return Ok(Timestamp::NegInfinity),
        _ => {}
    }
    let bad = || Error::MalformedText(format!("invalid timestamp: {s:?}"));
    let (date_part, rest) = s.split_once(' ').ok_or_else(bad)?;

    // Split a trailing +HH[:MM] / -HH[:MM] zone offset, if present.
    let (time_part, offset_secs) = match rest.rfind(['+', '-']) {
        Some(pos) if with_tz => {
            let (time, zone) = rest.split_at(pos);
            let sign: i64 = if zone.starts_with('-') { -1 } else { 1 };
            let zone = &zone[1..];
            let (zh, zm) = match zone.split_once(':') {
                Some((h, m)) => (h, m),
                None => (zone, "0"),
            };
            let zh: i64 = zh.parse().map_err(|_| bad())?;
            let zm: i64 = zm.parse().map_err(|_| bad())?;
            (time, sign * (zh * 3600 + zm * 60))
        }
        _ => (rest, 0),
    };

    let (y, m, d) = parse_date_fields(date_part)?;
    let days = pg_days_from_ymd(y, m, d)? as i64;
    let time_usecs = parse_time_text(time_part)?;
    let usecs = days
        .checked_mul(USECS_PER_DAY)
        .and_then(|v| v.checked_add(time_usecs))
        .and_then(|v| v.checked_sub(offset_secs * USECS_PER_SEC))
        .ok_or_else(|| Error::out_of_range("timestamp", "i64 microseconds"))?;
    Ok(Timestamp::Finite(usecs))
}

fn format_timestamp_text(ts: Timestamp, with_tz: bool, buf: &mut Vec<u8>) {
    match ts {
        Timestamp::Infinity => buf.extend_from_slice(b"infinity"),
        Timestamp::NegInfinity => buf.extend_from_slice(b"-infinity"),
        Timestamp::Finite(usecs) => {
            let days = usecs.div_euclid(USECS_PER_DAY);
            let time_usecs = usecs.rem_euclid(USECS_PER_DAY);
            let (y, m, d) = unix_days_to_civil(days + UNIX_TO_PG_DAYS);
            buf.extend_from_slice(format!("{y:04}-{m:02}-{d:02} ").as_bytes());
            format_time_text(time_usecs, buf);
            if with_tz {
                buf.extend_from_slice(b"+00");
            }
        }
    }
}

impl Codec for TimestampCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Binary
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Timestamp) {
            return None;
        }
        let with_tz = self.with_tz;
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let ts = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Timestamp(ts) => *ts,
                other => return Err(Error::out_of_range(other.kind_name(), "timestamp")),
            };
            match format {
                FormatCode::Binary => buf.extend_from_slice(&ts.to_wire().to_be_bytes()),
                FormatCode::Text => format_timestamp_text(ts, with_tz, buf),
            }
            Ok(IsNull::No)
        })
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Timestamp) {
            return None;
        }
        let with_tz = self.with_tz;
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let ts = match format {
                FormatCode::Binary => {
                    let arr: [u8; 8] = bytes
                        .try_into()
                        .map_err(|_| Error::length("timestamp", bytes.len(), 8))?;
                    Timestamp::from_wire(i64::from_be_bytes(arr))
                }
                FormatCode::Text => parse_timestamp_text(utf8(bytes)?, with_tz)?,
            };
            *out = Value::Timestamp(ts);
            Ok(())
        })
    }
}

// === interval ===

/// Codec for `interval`: (i64 microseconds, i32 days, i32 months).
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalCodec;

fn parse_interval_text(s: &str) -> Result<Interval> {
    let bad = || Error::MalformedText(format!("invalid interval: {s:?}"));
    let mut iv = Interval::default();
    let mut tokens = s.split_whitespace().peekable();
    let mut saw_component = false;

    while let Some(token) = tokens.next() {
        if token.contains(':') {
            // Trailing HH:MM:SS[.ffffff] clock part, optionally signed.
            let (negative, clock) = match token.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, token),
            };
            let usecs = parse_time_text(clock)?;
            iv.microseconds = if negative { -usecs } else { usecs };
            if tokens.next().is_some() {
                return Err(bad());
            }
            saw_component = true;
            break;
        }
        let n: i64 = token.parse().map_err(|_| bad())?;
        let unit = tokens.next().ok_or_else(bad)?;
        match unit {
            "year" | "years" => {
                iv.months = iv
                    .months
                    .checked_add(
                        i32::try_from(n * 12).map_err(|_| Error::out_of_range(n, "interval"))?,
                    )
                    .ok_or_else(|| Error::out_of_range(n, "interval"))?;
            }
            "mon" | "mons" => {
                iv.months = iv
                    .months
                    .checked_add(i32::try_from(n).map_err(|_| Error::out_of_range(n, "interval"))?)
                    .ok_or_else(|| Error::out_of_range(n, "interval"))?;
            }
            "day" | "days" => {
                iv.days = iv
                    .days
                    .checked_add(i32::try_from(n).map_err(|_| Error::out_of_range(n, "interval"))?)
                    .ok_or_else(|| Error::out_of_range(n, "interval"))?;
            }
            _ => return Err(bad()),
        }
        saw_component = true;
    }

    if !saw_component {
        return Err(bad());
    }
    Ok(iv)
}

fn format_interval_text(iv: Interval, buf: &mut Vec<u8>) {
    let mut parts: Vec<String> = Vec::new();
    let years = iv.months / 12;
    let months = iv.months % 12;
    if years != 0 {
        parts.push(format!("{years} {}", if years.abs() == 1 { "year" } else { "years" }));
    }
    if months != 0 {
        parts.push(format!("{months} {}", if months.abs() == 1 { "mon" } else { "mons" }));
    }
    if iv.days != 0 {
        parts.push(format!("{} {}", iv.days, if iv.days.abs() == 1 { "day" } else { "days" }));
    }
    if iv.microseconds != 0 || parts.is_empty() {
        let mut time = Vec::new();
        if iv.microseconds < 0 {
            time.push(b'-');
        }
        format_time_text(iv.microseconds.abs(), &mut time);
        parts.push(String::from_utf8(time).unwrap_or_default());
    }
    buf.extend_from_slice(parts.join(" ").as_bytes());
}

impl Codec for IntervalCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Binary
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Interval) {
            return None;
        }
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let iv = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Interval(iv) => *iv,
                other => return Err(Error::out_of_range(other.kind_name(), "interval")),
            };
            match format {
                FormatCode::Binary => {
                    buf.extend_from_slice(&iv.microseconds.to_be_bytes());
                    buf.extend_from_slice(&iv.days.to_be_bytes());
                    buf.extend_from_slice(&iv.months.to_be_bytes());
                }
                FormatCode::Text => format_interval_text(iv, buf),
            }
            Ok(IsNull::No)
        })
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Interval) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let iv = match format {
                FormatCode::Binary => {
                    if bytes.len() != 16 {
                        return Err(Error::length("interval", bytes.len(), 16));
                    }
                    let (usecs, rest) = crate::wire::read_i64(bytes)?;
                    let (days, rest) = crate::wire::read_i32(rest)?;
                    let (months, _) = crate::wire::read_i32(rest)?;
                    Interval {
                        microseconds: usecs,
                        days,
                        months,
                    }
                }
                FormatCode::Text => parse_interval_text(utf8(bytes)?)?,
            };
            *out = Value::Interval(iv);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_civil_conversion() {
        // 2024-01-15 is 8780 days after 2000-01-01.
        assert_eq!(pg_days_from_ymd(2024, 1, 15).unwrap(), 8780);
        assert_eq!(ymd_from_pg_days(8780), (2024, 1, 15));
        assert_eq!(pg_days_from_ymd(2000, 1, 1).unwrap(), 0);
        assert_eq!(pg_days_from_ymd(1999, 12, 31).unwrap(), -1);
    }

    #[test]
    fn test_date_text_roundtrip() {
        let v = decode_date(FormatCode::Text, b"2024-01-15").unwrap();
        assert_eq!(v, Value::Date(Date::Finite(8780)));
        let mut buf = Vec::new();
        encode_date(FormatCode::Text, Date::Finite(8780), &mut buf).unwrap();
        assert_eq!(buf, b"2024-01-15");
    }

    #[test]
    fn test_date_rejects_bad_day() {
        assert!(decode_date(FormatCode::Text, b"2024-02-30").is_err());
        assert!(decode_date(FormatCode::Text, b"2024-13-01").is_err());
    }

    #[test]
    fn test_date_infinity() {
        let v = decode_date(FormatCode::Text, b"infinity").unwrap();
        assert_eq!(v, Value::Date(Date::Infinity));
        let v = decode_date(FormatCode::Binary, &i32::MIN.to_be_bytes()).unwrap();
        assert_eq!(v, Value::Date(Date::NegInfinity));
    }

    #[test]
    fn test_time_text() {
        assert_eq!(
            parse_time_text("10:30:45").unwrap(),
            (10 * 3600 + 30 * 60 + 45) * USECS_PER_SEC
        );
        assert_eq!(
            parse_time_text("10:30:45.123456").unwrap(),
            (10 * 3600 + 30 * 60 + 45) * USECS_PER_SEC + 123_456
        );
        // Short fractions are zero-extended, not right-aligned.
        assert_eq!(
            parse_time_text("00:00:00.5").unwrap(),
            500_000
        );
    }

    #[test]
    fn test_time_accepts_midnight_end() {
        assert_eq!(parse_time_text("24:00:00").unwrap(), USECS_PER_DAY);
        assert!(parse_time_text("24:00:01").is_err());
    }

    #[test]
    fn test_time_format() {
        let mut buf = Vec::new();
        format_time_text(37_845_123_456, &mut buf);
        assert_eq!(buf, b"10:30:45.123456");
        let mut buf = Vec::new();
        format_time_text(3_600_000_000, &mut buf);
        assert_eq!(buf, b"01:00:00");
    }

    #[test]
    fn test_timestamp_text_roundtrip() {
        let ts = parse_timestamp_text("2024-01-15 10:30:45.5", false).unwrap();
        let expected = 8780 * USECS_PER_DAY + (10 * 3600 + 30 * 60 + 45) * USECS_PER_SEC + 500_000;
        assert_eq!(ts, Timestamp::Finite(expected));

        let mut buf = Vec::new();
        format_timestamp_text(ts, false, &mut buf);
        assert_eq!(buf, b"2024-01-15 10:30:45.5");
    }

    #[test]
    fn test_timestamptz_text_offset() {
        // +02 offset shifts back to UTC.
        let ts = parse_timestamp_text("2024-01-15 12:00:00+02", true).unwrap();
        let expected = 8780 * USECS_PER_DAY + 10 * 3600 * USECS_PER_SEC;
        assert_eq!(ts, Timestamp::Finite(expected));

        let mut buf = Vec::new();
        format_timestamp_text(ts, true, &mut buf);
        assert_eq!(buf, b"2024-01-15 10:00:00+00");
    }

    #[test]
    fn test_timestamp_infinity() {
        assert_eq!(
            parse_timestamp_text("infinity", false).unwrap(),
            Timestamp::Infinity
        );
        assert_eq!(
            parse_timestamp_text("-infinity", true).unwrap(),
            Timestamp::NegInfinity
        );
    }

    #[test]
    fn test_timestamp_before_epoch() {
        let ts = parse_timestamp_text("1999-12-31 23:00:00", false).unwrap();
        assert_eq!(ts, Timestamp::Finite(-3600 * USECS_PER_SEC));
        let mut buf = Vec::new();
        format_timestamp_text(ts, false, &mut buf);
        assert_eq!(buf, b"1999-12-31 23:00:00");
    }

    #[test]
    fn test_interval_parse() {
        let iv = parse_interval_text("1 year 2 mons 3 days 04:05:06.000007").unwrap();
        assert_eq!(
            iv,
            Interval {
                months: 14,
                days: 3,
                microseconds: (4 * 3600 + 5 * 60 + 6) * USECS_PER_SEC + 7,
            }
        );
    }

    #[test]
    fn test_interval_parse_partial() {
        assert_eq!(
            parse_interval_text("5 days").unwrap(),
            Interval { months: 0, days: 5, microseconds: 0 }
        );
        assert_eq!(
            parse_interval_text("-2 mons").unwrap(),
            Interval { months: -2, days: 0, microseconds: 0 }
        );
        assert_eq!(
            parse_interval_text("-00:00:01").unwrap(),
            Interval { months: 0, days: 0, microseconds: -USECS_PER_SEC }
        );
    }

    #[test]
    fn test_interval_parse_rejects_garbage() {
        assert!(parse_interval_text("").is_err());
        assert!(parse_interval_text("5 parsecs").is_err());
        assert!(parse_interval_text("1 day extra").is_err());
    }

    #[test]
    fn test_interval_format() {
        let iv = Interval { months: 14, days: 3, microseconds: 4 * USECS_PER_SEC };
        let mut buf = Vec::new();
        format_interval_text(iv, &mut buf);
        assert_eq!(buf, b"1 year 2 mons 3 days 00:00:04");

        let mut buf = Vec::new();
        format_interval_text(Interval::default(), &mut buf);
        assert_eq!(buf, b"00:00:00");
    }

    #[test]
    fn test_interval_text_roundtrip() {
        for iv in [
            Interval { months: 25, days: -3, microseconds: 59 * USECS_PER_SEC + 1 },
            Interval { months: 0, days: 1, microseconds: 0 },
            Interval::default(),
        ] {
            let mut buf = Vec::new();
            format_interval_text(iv, &mut buf);
            let parsed = parse_interval_text(std::str::from_utf8(&buf).unwrap()).unwrap();
            assert_eq!(parsed, iv, "roundtrip of {buf:?}");
        }
    }
}
