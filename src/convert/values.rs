//! Wire conversions for the crate's own value types: numeric, interval,
//! date/timestamp, network, bit string, and the geometric shapes.
//!
//! These route through the scalar codecs so the typed and dynamic paths
//! share one implementation of each format.

use crate::codec::{
    BitsCodec, BoxCodec, CircleCodec, DateCodec, InetCodec, IntervalCodec, LineCodec,
    LineSegmentCodec, NumericCodec, PathCodec, PointCodec, PolygonCodec, TimestampCodec,
};
use crate::error::{Error, Result};
use crate::geometry::{Circle, Line, LineSegment, Path, PgBox, Point, Polygon};
use crate::numeric::Numeric;
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};
use crate::value::{BitString, Date, Inet, Interval, Timestamp, Value};

use super::{FromWire, ToWire, codec_decode, codec_encode};

fn ts_codec(oid: Oid) -> TimestampCodec {
    if oid == oid::TIMESTAMPTZ {
        TimestampCodec::with_time_zone()
    } else {
        TimestampCodec::plain()
    }
}

fn net_codec(oid: Oid) -> InetCodec {
    if oid == oid::CIDR {
        InetCodec::cidr()
    } else {
        InetCodec::inet()
    }
}

macro_rules! value_wire {
    ($ty:ty, $variant:ident, $make_codec:expr, $natural:expr, $accept:pat, $label:literal) => {
        impl FromWire<'_> for $ty {
            fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(oid, FormatCode::Text, $label));
                }
                let codec = ($make_codec)(oid);
                match codec_decode(&codec, oid, FormatCode::Text, bytes)? {
                    Value::$variant(v) => Ok(v),
                    other => Err(Error::out_of_range(other.kind_name(), $label)),
                }
            }

            fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(oid, FormatCode::Binary, $label));
                }
                let codec = ($make_codec)(oid);
                match codec_decode(&codec, oid, FormatCode::Binary, bytes)? {
                    Value::$variant(v) => Ok(v),
                    other => Err(Error::out_of_range(other.kind_name(), $label)),
                }
            }
        }

        impl ToWire for $ty {
            fn natural_oid(&self) -> Oid {
                $natural
            }

            fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
                let oid = if oid == 0 { $natural } else { oid };
                if !matches!(oid, $accept) {
                    return Err(Error::no_encode_plan(oid, format, $label));
                }
                let codec = ($make_codec)(oid);
                codec_encode(&codec, oid, format, &Value::$variant(self.clone()), buf)
            }
        }
    };
}

value_wire!(
    Numeric,
    Numeric,
    |_: Oid| NumericCodec,
    oid::NUMERIC,
    oid::NUMERIC,
    "numeric"
);
value_wire!(
    Interval,
    Interval,
    |_: Oid| IntervalCodec,
    oid::INTERVAL,
    oid::INTERVAL,
    "interval"
);
value_wire!(Date, Date, |_: Oid| DateCodec, oid::DATE, oid::DATE, "date");
value_wire!(
    Timestamp,
    Timestamp,
    ts_codec,
    oid::TIMESTAMP,
    oid::TIMESTAMP | oid::TIMESTAMPTZ,
    "timestamp"
);
value_wire!(
    Inet,
    Inet,
    net_codec,
    oid::INET,
    oid::INET | oid::CIDR,
    "inet"
);
value_wire!(
    BitString,
    Bits,
    |_: Oid| BitsCodec,
    oid::VARBIT,
    oid::BIT | oid::VARBIT,
    "bit"
);
value_wire!(Point, Point, |_: Oid| PointCodec, oid::POINT, oid::POINT, "point");
value_wire!(Line, Line, |_: Oid| LineCodec, oid::LINE, oid::LINE, "line");
value_wire!(
    LineSegment,
    LineSegment,
    |_: Oid| LineSegmentCodec,
    oid::LSEG,
    oid::LSEG,
    "lseg"
);
value_wire!(PgBox, Box, |_: Oid| BoxCodec, oid::BOX, oid::BOX, "box");
value_wire!(Path, Path, |_: Oid| PathCodec, oid::PATH, oid::PATH, "path");
value_wire!(
    Polygon,
    Polygon,
    |_: Oid| PolygonCodec,
    oid::POLYGON,
    oid::POLYGON,
    "polygon"
);
value_wire!(
    Circle,
    Circle,
    |_: Oid| CircleCodec,
    oid::CIRCLE,
    oid::CIRCLE,
    "circle"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_roundtrip() {
        let n = Numeric::parse_text("3.14159").unwrap();
        let mut buf = Vec::new();
        n.encode(oid::NUMERIC, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(Numeric::from_binary(oid::NUMERIC, &buf).unwrap(), n);
    }

    #[test]
    fn test_numeric_rejects_wrong_oid() {
        assert!(Numeric::from_text(oid::INT4, b"1").is_err());
    }

    #[test]
    fn test_interval_roundtrip() {
        let iv = Interval {
            months: 13,
            days: -2,
            microseconds: 5_000_000,
        };
        let mut buf = Vec::new();
        iv.encode(oid::INTERVAL, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(Interval::from_binary(oid::INTERVAL, &buf).unwrap(), iv);
    }

    #[test]
    fn test_date_text() {
        let d = Date::from_text(oid::DATE, b"2024-01-15").unwrap();
        assert_eq!(d, Date::Finite(8780));
        let mut buf = Vec::new();
        d.encode(oid::DATE, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(buf, b"2024-01-15");
    }

    #[test]
    fn test_timestamp_tz_text_suffix() {
        let ts = Timestamp::Finite(0);
        let mut buf = Vec::new();
        ts.encode(oid::TIMESTAMPTZ, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(buf, b"2000-01-01 00:00:00+00");
        let mut buf = Vec::new();
        ts.encode(oid::TIMESTAMP, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(buf, b"2000-01-01 00:00:00");
    }

    #[test]
    fn test_inet_roundtrip() {
        let inet = Inet::host("192.168.0.1".parse().unwrap());
        let mut buf = Vec::new();
        inet.encode(oid::INET, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(Inet::from_binary(oid::INET, &buf).unwrap(), inet);
    }

    #[test]
    fn test_bits_roundtrip() {
        let bits = BitString::new(3, vec![0b1010_0000]).unwrap();
        let mut buf = Vec::new();
        bits.encode(oid::VARBIT, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(buf, b"101");
        assert_eq!(BitString::from_text(oid::VARBIT, &buf).unwrap(), bits);
    }

    #[test]
    fn test_point_roundtrip() {
        let p = Point { x: 1.0, y: 2.0 };
        let mut buf = Vec::new();
        p.encode(oid::POINT, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(Point::from_binary(oid::POINT, &buf).unwrap(), p);
    }

    #[test]
    fn test_polygon_text_roundtrip() {
        let poly = Polygon {
            points: vec![Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }],
        };
        let mut buf = Vec::new();
        poly.encode(oid::POLYGON, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(Polygon::from_text(oid::POLYGON, &buf).unwrap(), poly);
    }
}
