//! Dynamic value representation.
//!
//! The planning layer works against a tagged sum of the shapes the engine
//! can convert. A scan target is seeded with the shape it wants (for
//! example `Value::Int4(0)`) and the selected plan overwrites it in place;
//! SQL NULL input leaves `Value::Null`. Typed conversions that do not need
//! the dynamic path live in [`crate::convert`].

use std::net::{IpAddr, Ipv4Addr};

use crate::error::{Error, Result};
use crate::geometry::{Circle, Line, LineSegment, Path, PgBox, Point, Polygon};
use crate::numeric::Numeric;
pub use crate::wire::ArrayDimension;

/// Microseconds since midnight, 2000-01-01, UTC — or one of the two
/// timestamp infinities PostgreSQL stores as i64 sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// A finite timestamp, microseconds since 2000-01-01 00:00:00.
    Finite(i64),
    /// The `infinity` sentinel (wire value `i64::MAX`).
    Infinity,
    /// The `-infinity` sentinel (wire value `i64::MIN`).
    NegInfinity,
}

impl Timestamp {
    /// Wire representation: sentinel values for the infinities.
    pub fn to_wire(self) -> i64 {
        match self {
            Timestamp::Finite(us) => us,
            Timestamp::Infinity => i64::MAX,
            Timestamp::NegInfinity => i64::MIN,
        }
    }

    /// Decode the wire representation, recognising the sentinels.
    pub fn from_wire(us: i64) -> Self {
        match us {
            i64::MAX => Timestamp::Infinity,
            i64::MIN => Timestamp::NegInfinity,
            _ => Timestamp::Finite(us),
        }
    }
}

/// Days since 2000-01-01 — or one of the two date infinities PostgreSQL
/// stores as i32 sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Date {
    /// A finite date, days since 2000-01-01.
    Finite(i32),
    /// The `infinity` sentinel (wire value `i32::MAX`).
    Infinity,
    /// The `-infinity` sentinel (wire value `i32::MIN`).
    NegInfinity,
}

impl Date {
    /// Wire representation: sentinel values for the infinities.
    pub fn to_wire(self) -> i32 {
        match self {
            Date::Finite(days) => days,
            Date::Infinity => i32::MAX,
            Date::NegInfinity => i32::MIN,
        }
    }

    /// Decode the wire representation, recognising the sentinels.
    pub fn from_wire(days: i32) -> Self {
        match days {
            i32::MAX => Date::Infinity,
            i32::MIN => Date::NegInfinity,
            _ => Date::Finite(days),
        }
    }
}

/// PostgreSQL interval: the three components are independent because a
/// month has no fixed length in days and a day no fixed length in
/// microseconds (DST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    /// Sub-day component in microseconds.
    pub microseconds: i64,
    /// Day component.
    pub days: i32,
    /// Month component.
    pub months: i32,
}

/// IP host or network address with prefix length (inet/cidr).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inet {
    /// The address.
    pub addr: IpAddr,
    /// Network prefix length in bits.
    pub prefix: u8,
}

impl Inet {
    /// A host address with the full-length prefix for its family.
    pub fn host(addr: IpAddr) -> Self {
        let prefix = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        Inet { addr, prefix }
    }
}

impl Default for Inet {
    fn default() -> Self {
        Inet::host(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

/// Fixed- or variable-length bit string (bit/varbit).
///
/// Bits are stored most-significant-first; the final byte is padded with
/// zero bits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitString {
    /// Number of significant bits.
    pub bit_len: usize,
    /// Packed bits, `(bit_len + 7) / 8` bytes.
    pub bytes: Vec<u8>,
}

impl BitString {
    /// Build from a packed representation, masking unused trailing bits.
    pub fn new(bit_len: usize, mut bytes: Vec<u8>) -> Result<Self> {
        let expected = bit_len.div_ceil(8);
        if bytes.len() != expected {
            return Err(Error::length("bit", bytes.len(), expected));
        }
        let tail_bits = bit_len % 8;
        if tail_bits != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= !0u8 << (8 - tail_bits);
            }
        }
        Ok(BitString { bit_len, bytes })
    }

    /// Value of bit `index`, most significant first.
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.bit_len {
            return None;
        }
        let byte = self.bytes[index / 8];
        Some(byte & (0x80 >> (index % 8)) != 0)
    }

    /// Reject a width other than `n`, the `bit(N)` scan contract.
    ///
    /// The wire payload does not carry the declared column width, so
    /// fixed-width callers apply the check themselves.
    pub fn expect_len(&self, n: usize) -> Result<()> {
        if self.bit_len != n {
            return Err(Error::out_of_range(
                format!("bit string of length {}", self.bit_len),
                "fixed-width bit target",
            ));
        }
        Ok(())
    }
}

/// Which kind of endpoint a range side has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundKind {
    /// Bound value is part of the range.
    Inclusive,
    /// Bound value is excluded from the range.
    Exclusive,
    /// No bound on this side; carries no payload.
    Unbounded,
    /// The range is empty; both sides must be `Empty`.
    #[default]
    Empty,
}

/// A range over some element type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeValue {
    /// Lower endpoint value, present only for Inclusive/Exclusive sides.
    pub lower: Option<Box<Value>>,
    /// Upper endpoint value, present only for Inclusive/Exclusive sides.
    pub upper: Option<Box<Value>>,
    /// Kind of the lower endpoint.
    pub lower_kind: BoundKind,
    /// Kind of the upper endpoint.
    pub upper_kind: BoundKind,
}

impl RangeValue {
    /// The canonical empty range.
    pub fn empty() -> Self {
        RangeValue::default()
    }

    /// True if this is the empty range.
    pub fn is_empty(&self) -> bool {
        self.lower_kind == BoundKind::Empty
    }

    /// Enforce the bound discipline: `Empty` on either side requires
    /// `Empty` on both, and only bounded sides carry a value.
    pub fn validate(&self) -> Result<()> {
        let lower_empty = self.lower_kind == BoundKind::Empty;
        let upper_empty = self.upper_kind == BoundKind::Empty;
        if lower_empty != upper_empty {
            return Err(Error::MalformedBinary(
                "empty range bound paired with a non-empty bound".into(),
            ));
        }
        for (kind, value, side) in [
            (self.lower_kind, &self.lower, "lower"),
            (self.upper_kind, &self.upper, "upper"),
        ] {
            let bounded = matches!(kind, BoundKind::Inclusive | BoundKind::Exclusive);
            if bounded && value.is_none() {
                return Err(Error::MalformedBinary(format!(
                    "{side} range bound is {kind:?} but has no value"
                )));
            }
            if !bounded && value.is_some() {
                return Err(Error::MalformedBinary(format!(
                    "{side} range bound is {kind:?} but carries a value"
                )));
            }
        }
        Ok(())
    }
}

/// An n-dimensional array in row-major order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayValue {
    /// Per-dimension length and lower bound, outermost first.
    pub dims: Vec<ArrayDimension>,
    /// Flat element storage; `Value::Null` marks a NULL slot.
    pub elements: Vec<Value>,
}

impl ArrayValue {
    /// Build an array, validating that the element count matches the
    /// product of the dimension lengths.
    pub fn new(dims: Vec<ArrayDimension>, elements: Vec<Value>) -> Result<Self> {
        let expected: usize = if dims.is_empty() {
            0
        } else {
            dims.iter().map(|d| d.len as usize).product()
        };
        if elements.len() != expected {
            return Err(Error::MalformedBinary(format!(
                "array has {} elements but dimensions require {}",
                elements.len(),
                expected
            )));
        }
        Ok(ArrayValue { dims, elements })
    }

    /// Build a one-dimensional array with lower bound 1.
    pub fn one_dim(elements: Vec<Value>) -> Self {
        let dims = if elements.is_empty() {
            vec![]
        } else {
            vec![ArrayDimension {
                len: elements.len() as i32,
                lower_bound: 1,
            }]
        };
        ArrayValue { dims, elements }
    }

    /// True if any element slot is NULL.
    pub fn contains_nulls(&self) -> bool {
        self.elements.iter().any(Value::is_null)
    }
}

/// A composite (record) value: ordered, positional fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordValue {
    /// Field values in declaration order; `Value::Null` marks NULL.
    pub fields: Vec<Value>,
}

/// The tagged sum of shapes the engine converts.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL NULL.
    #[default]
    Null,
    /// boolean
    Bool(bool),
    /// int2
    Int2(i16),
    /// int4
    Int4(i32),
    /// int8
    Int8(i64),
    /// float4
    Float4(f32),
    /// float8
    Float8(f64),
    /// text / varchar / bpchar / name / unknown
    Text(String),
    /// bytea
    Bytes(Vec<u8>),
    /// uuid, 16 raw bytes
    Uuid([u8; 16]),
    /// date
    Date(Date),
    /// time: microseconds since midnight (86400000000 = 24:00:00 allowed)
    Time(i64),
    /// timestamp / timestamptz
    Timestamp(Timestamp),
    /// interval
    Interval(Interval),
    /// inet / cidr
    Inet(Inet),
    /// numeric
    Numeric(Numeric),
    /// bit / varbit
    Bits(BitString),
    /// "char": a single byte
    QChar(u8),
    /// point
    Point(Point),
    /// line
    Line(Line),
    /// lseg
    LineSegment(LineSegment),
    /// box
    Box(PgBox),
    /// path
    Path(Path),
    /// polygon
    Polygon(Polygon),
    /// circle
    Circle(Circle),
    /// json / jsonb document bytes (UTF-8, version byte stripped)
    Json(Vec<u8>),
    /// any array type
    Array(ArrayValue),
    /// any composite type
    Record(RecordValue),
    /// any range type
    Range(RangeValue),
    /// a label of a user-registered enum type
    EnumLabel(String),
}

/// Discriminant of [`Value`]: the native-shape identity used for plan
/// selection and for the registry's default-kind table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// SQL NULL / no shape preference (generic decode).
    Null,
    /// boolean
    Bool,
    /// int2
    Int2,
    /// int4
    Int4,
    /// int8
    Int8,
    /// float4
    Float4,
    /// float8
    Float8,
    /// text family
    Text,
    /// bytea
    Bytes,
    /// uuid
    Uuid,
    /// date
    Date,
    /// time
    Time,
    /// timestamp family
    Timestamp,
    /// interval
    Interval,
    /// inet family
    Inet,
    /// numeric
    Numeric,
    /// bit family
    Bits,
    /// "char"
    QChar,
    /// point
    Point,
    /// line
    Line,
    /// lseg
    LineSegment,
    /// box
    Box,
    /// path
    Path,
    /// polygon
    Polygon,
    /// circle
    Circle,
    /// json / jsonb
    Json,
    /// array
    Array,
    /// record
    Record,
    /// range
    Range,
    /// enum label
    EnumLabel,
}

impl ValueKind {
    /// Stable name for error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "Null",
            ValueKind::Bool => "Bool",
            ValueKind::Int2 => "Int2",
            ValueKind::Int4 => "Int4",
            ValueKind::Int8 => "Int8",
            ValueKind::Float4 => "Float4",
            ValueKind::Float8 => "Float8",
            ValueKind::Text => "Text",
            ValueKind::Bytes => "Bytes",
            ValueKind::Uuid => "Uuid",
            ValueKind::Date => "Date",
            ValueKind::Time => "Time",
            ValueKind::Timestamp => "Timestamp",
            ValueKind::Interval => "Interval",
            ValueKind::Inet => "Inet",
            ValueKind::Numeric => "Numeric",
            ValueKind::Bits => "Bits",
            ValueKind::QChar => "QChar",
            ValueKind::Point => "Point",
            ValueKind::Line => "Line",
            ValueKind::LineSegment => "LineSegment",
            ValueKind::Box => "Box",
            ValueKind::Path => "Path",
            ValueKind::Polygon => "Polygon",
            ValueKind::Circle => "Circle",
            ValueKind::Json => "Json",
            ValueKind::Array => "Array",
            ValueKind::Record => "Record",
            ValueKind::Range => "Range",
            ValueKind::EnumLabel => "EnumLabel",
        }
    }
}

impl Value {
    /// True for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The native-shape discriminant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int2(_) => ValueKind::Int2,
            Value::Int4(_) => ValueKind::Int4,
            Value::Int8(_) => ValueKind::Int8,
            Value::Float4(_) => ValueKind::Float4,
            Value::Float8(_) => ValueKind::Float8,
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Date(_) => ValueKind::Date,
            Value::Time(_) => ValueKind::Time,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Interval(_) => ValueKind::Interval,
            Value::Inet(_) => ValueKind::Inet,
            Value::Numeric(_) => ValueKind::Numeric,
            Value::Bits(_) => ValueKind::Bits,
            Value::QChar(_) => ValueKind::QChar,
            Value::Point(_) => ValueKind::Point,
            Value::Line(_) => ValueKind::Line,
            Value::LineSegment(_) => ValueKind::LineSegment,
            Value::Box(_) => ValueKind::Box,
            Value::Path(_) => ValueKind::Path,
            Value::Polygon(_) => ValueKind::Polygon,
            Value::Circle(_) => ValueKind::Circle,
            Value::Json(_) => ValueKind::Json,
            Value::Array(_) => ValueKind::Array,
            Value::Record(_) => ValueKind::Record,
            Value::Range(_) => ValueKind::Range,
            Value::EnumLabel(_) => ValueKind::EnumLabel,
        }
    }

    /// Stable shape name for error messages.
    pub fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Signed-integer view of any of the integer variants.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int2(v) => Some(*v as i64),
            Value::Int4(v) => Some(*v as i64),
            Value::Int8(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_sentinels() {
        assert_eq!(Timestamp::from_wire(i64::MAX), Timestamp::Infinity);
        assert_eq!(Timestamp::from_wire(i64::MIN), Timestamp::NegInfinity);
        assert_eq!(Timestamp::from_wire(42), Timestamp::Finite(42));
        assert_eq!(Timestamp::Infinity.to_wire(), i64::MAX);
    }

    #[test]
    fn test_date_sentinels() {
        assert_eq!(Date::from_wire(i32::MAX), Date::Infinity);
        assert_eq!(Date::from_wire(i32::MIN), Date::NegInfinity);
        assert_eq!(Date::from_wire(-10), Date::Finite(-10));
    }

    #[test]
    fn test_bit_string_masks_tail() {
        let bits = BitString::new(4, vec![0b1111_1111]).unwrap();
        assert_eq!(bits.bytes, vec![0b1111_0000]);
        assert_eq!(bits.get(0), Some(true));
        assert_eq!(bits.get(4), None);
        assert!(bits.expect_len(4).is_ok());
        assert!(bits.expect_len(8).is_err());
    }

    #[test]
    fn test_bit_string_length_check() {
        assert!(BitString::new(9, vec![0xFF]).is_err());
    }

    #[test]
    fn test_array_value_dimension_check() {
        let dims = vec![
            ArrayDimension { len: 2, lower_bound: 1 },
            ArrayDimension { len: 2, lower_bound: 1 },
        ];
        assert!(ArrayValue::new(dims.clone(), vec![Value::Null; 4]).is_ok());
        assert!(ArrayValue::new(dims, vec![Value::Null; 3]).is_err());
    }

    #[test]
    fn test_empty_array_has_no_dims() {
        let arr = ArrayValue::one_dim(vec![]);
        assert!(arr.dims.is_empty());
        assert!(!arr.contains_nulls());
    }

    #[test]
    fn test_range_validation() {
        let empty = RangeValue::empty();
        assert!(empty.validate().is_ok());
        assert!(empty.is_empty());

        let bad = RangeValue {
            lower: None,
            upper: Some(Box::new(Value::Int4(5))),
            lower_kind: BoundKind::Empty,
            upper_kind: BoundKind::Exclusive,
        };
        assert!(bad.validate().is_err());

        let unbounded_with_payload = RangeValue {
            lower: Some(Box::new(Value::Int4(1))),
            upper: None,
            lower_kind: BoundKind::Unbounded,
            upper_kind: BoundKind::Unbounded,
        };
        assert!(unbounded_with_payload.validate().is_err());
    }
}
