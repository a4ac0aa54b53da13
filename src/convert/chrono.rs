//! Chrono crate conversions (NaiveDate, NaiveTime, NaiveDateTime,
//! DateTime<Utc>, DateTime<Local>).
//!
//! PostgreSQL stores microseconds; chrono carries nanoseconds. Encoding
//! truncates to microsecond precision, a documented lossy step. The
//! date/timestamp infinities have no chrono representation and fail to
//! scan.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::error::{Error, Result};
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};
use crate::value::{Date, Timestamp};

use super::{FromWire, ToWire};

/// PostgreSQL epoch: 2000-01-01
const PG_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2000, 1, 1) {
    Some(d) => d,
    None => panic!("invalid date"),
};

/// Microseconds per second
const USECS_PER_SEC: i64 = 1_000_000;

fn date_to_naive(date: Date) -> Result<NaiveDate> {
    let days = match date {
        Date::Finite(days) => days,
        Date::Infinity | Date::NegInfinity => {
            return Err(Error::out_of_range("date infinity", "NaiveDate"));
        }
    };
    if days >= 0 {
        PG_EPOCH.checked_add_days(chrono::Days::new(days as u64))
    } else {
        PG_EPOCH.checked_sub_days(chrono::Days::new(days.unsigned_abs() as u64))
    }
    .ok_or_else(|| Error::out_of_range(days, "NaiveDate"))
}

fn naive_to_date(date: NaiveDate) -> Date {
    Date::Finite(date.signed_duration_since(PG_EPOCH).num_days() as i32)
}

fn timestamp_to_naive(ts: Timestamp) -> Result<NaiveDateTime> {
    let usecs = match ts {
        Timestamp::Finite(usecs) => usecs,
        Timestamp::Infinity | Timestamp::NegInfinity => {
            return Err(Error::out_of_range("timestamp infinity", "NaiveDateTime"));
        }
    };
    let epoch = PG_EPOCH.and_hms_opt(0, 0, 0).unwrap_or_default();
    epoch
        .checked_add_signed(chrono::Duration::microseconds(usecs))
        .ok_or_else(|| Error::out_of_range(usecs, "NaiveDateTime"))
}

fn naive_to_timestamp(dt: NaiveDateTime) -> Timestamp {
    let epoch = PG_EPOCH.and_hms_opt(0, 0, 0).unwrap_or_default();
    let duration = dt.signed_duration_since(epoch);
    // Truncation to microseconds.
    Timestamp::Finite(duration.num_microseconds().unwrap_or_else(|| {
        if duration.num_seconds() >= 0 { i64::MAX - 1 } else { i64::MIN + 1 }
    }))
}

impl FromWire<'_> for NaiveDate {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        date_to_naive(Date::from_text(oid, bytes)?)
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        date_to_naive(Date::from_binary(oid, bytes)?)
    }
}

impl ToWire for NaiveDate {
    fn natural_oid(&self) -> Oid {
        oid::DATE
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        naive_to_date(*self).encode(oid, format, buf)
    }
}

impl FromWire<'_> for NaiveTime {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::TIME {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "NaiveTime"));
        }
        let s = simdutf8::compat::from_utf8(bytes)
            .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))?;
        NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map_err(|e| Error::MalformedText(format!("invalid time: {e}")))
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::TIME {
            return Err(Error::no_scan_plan(oid, FormatCode::Binary, "NaiveTime"));
        }
        let arr: [u8; 8] = bytes
            .try_into()
            .map_err(|_| Error::length("time", bytes.len(), 8))?;
        let usecs = i64::from_be_bytes(arr);
        let secs = usecs.div_euclid(USECS_PER_SEC);
        let nano = usecs.rem_euclid(USECS_PER_SEC) * 1000;
        NaiveTime::from_num_seconds_from_midnight_opt(secs as u32, nano as u32)
            .ok_or_else(|| Error::out_of_range(usecs, "NaiveTime"))
    }
}

impl ToWire for NaiveTime {
    fn natural_oid(&self) -> Oid {
        oid::TIME
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::TIME } else { oid };
        if oid != oid::TIME {
            return Err(Error::no_encode_plan(oid, format, "NaiveTime"));
        }
        let usecs = (self.num_seconds_from_midnight() as i64) * USECS_PER_SEC
            + (self.nanosecond() as i64) / 1000;
        match format {
            FormatCode::Binary => buf.extend_from_slice(&usecs.to_be_bytes()),
            FormatCode::Text => {
                let s = if usecs % USECS_PER_SEC == 0 {
                    self.format("%H:%M:%S").to_string()
                } else {
                    self.format("%H:%M:%S%.6f").to_string()
                };
                buf.extend_from_slice(s.trim_end_matches('0').as_bytes());
            }
        }
        Ok(IsNull::No)
    }
}

impl FromWire<'_> for NaiveDateTime {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        timestamp_to_naive(Timestamp::from_text(oid, bytes)?)
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        timestamp_to_naive(Timestamp::from_binary(oid, bytes)?)
    }
}

impl ToWire for NaiveDateTime {
    fn natural_oid(&self) -> Oid {
        oid::TIMESTAMP
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        naive_to_timestamp(*self).encode(oid, format, buf)
    }
}

impl FromWire<'_> for DateTime<Utc> {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::TIMESTAMPTZ {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "DateTime<Utc>"));
        }
        Ok(timestamp_to_naive(Timestamp::from_text(oid, bytes)?)?.and_utc())
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::TIMESTAMPTZ {
            return Err(Error::no_scan_plan(oid, FormatCode::Binary, "DateTime<Utc>"));
        }
        Ok(timestamp_to_naive(Timestamp::from_binary(oid, bytes)?)?.and_utc())
    }
}

impl ToWire for DateTime<Utc> {
    fn natural_oid(&self) -> Oid {
        oid::TIMESTAMPTZ
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::TIMESTAMPTZ } else { oid };
        naive_to_timestamp(self.naive_utc()).encode(oid, format, buf)
    }
}

impl FromWire<'_> for DateTime<Local> {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        DateTime::<Utc>::from_text(oid, bytes).map(|dt| dt.with_timezone(&Local))
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        DateTime::<Utc>::from_binary(oid, bytes).map(|dt| dt.with_timezone(&Local))
    }
}

impl ToWire for DateTime<Local> {
    fn natural_oid(&self) -> Oid {
        oid::TIMESTAMPTZ
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        self.with_timezone(&Utc).encode(oid, format, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_date_binary_roundtrip() {
        let original = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut buf = Vec::new();
        original.encode(oid::DATE, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(buf, 8780_i32.to_be_bytes());
        assert_eq!(NaiveDate::from_binary(oid::DATE, &buf).unwrap(), original);
    }

    #[test]
    fn test_date_before_epoch() {
        let original = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let mut buf = Vec::new();
        original.encode(oid::DATE, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(buf, (-1_i32).to_be_bytes());
        assert_eq!(NaiveDate::from_binary(oid::DATE, &buf).unwrap(), original);
    }

    #[test]
    fn test_date_infinity_has_no_chrono_form() {
        assert!(NaiveDate::from_binary(oid::DATE, &i32::MAX.to_be_bytes()).is_err());
    }

    #[test]
    fn test_time_roundtrip() {
        let original = NaiveTime::from_hms_micro_opt(10, 30, 45, 123456).unwrap();
        let mut buf = Vec::new();
        original.encode(oid::TIME, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(NaiveTime::from_binary(oid::TIME, &buf).unwrap(), original);
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let original = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_micro_opt(10, 30, 45, 123456)
            .unwrap();
        let mut buf = Vec::new();
        original
            .encode(oid::TIMESTAMP, FormatCode::Binary, &mut buf)
            .unwrap();
        assert_eq!(NaiveDateTime::from_binary(oid::TIMESTAMP, &buf).unwrap(), original);
    }

    #[test]
    fn test_nanosecond_truncation() {
        let nanos = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_nano_opt(0, 0, 0, 1_500)
            .unwrap();
        let mut buf = Vec::new();
        nanos.encode(oid::TIMESTAMP, FormatCode::Binary, &mut buf).unwrap();
        let back = NaiveDateTime::from_binary(oid::TIMESTAMP, &buf).unwrap();
        assert_eq!(back.and_utc().timestamp_subsec_nanos(), 1_000);
    }

    #[test]
    fn test_timestamptz_utc_roundtrip() {
        let original = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();
        let mut buf = Vec::new();
        original
            .encode(oid::TIMESTAMPTZ, FormatCode::Binary, &mut buf)
            .unwrap();
        assert_eq!(
            DateTime::<Utc>::from_binary(oid::TIMESTAMPTZ, &buf).unwrap(),
            original
        );
    }

    #[test]
    fn test_timestamptz_local_same_instant() {
        let original = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();
        let mut buf = Vec::new();
        original
            .encode(oid::TIMESTAMPTZ, FormatCode::Binary, &mut buf)
            .unwrap();
        let local = DateTime::<Local>::from_binary(oid::TIMESTAMPTZ, &buf).unwrap();
        assert_eq!(local.with_timezone(&Utc), original);
    }

    #[test]
    fn test_text_formats() {
        let d = NaiveDate::from_text(oid::DATE, b"2024-01-15").unwrap();
        assert_eq!(d.year(), 2024);
        let t = NaiveTime::from_text(oid::TIME, b"10:30:45.123456").unwrap();
        assert_eq!(t.nanosecond(), 123_456_000);
        let ts = NaiveDateTime::from_text(oid::TIMESTAMP, b"2024-01-15 10:30:45").unwrap();
        assert_eq!(ts.hour(), 10);
    }
}
