//! Common PostgreSQL type identifiers.

/// PostgreSQL Object Identifier (OID)
pub type Oid = u32;

/// Data format code in PostgreSQL protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u16)]
pub enum FormatCode {
    /// Text format (human-readable)
    #[default]
    Text = 0,
    /// Binary format (type-specific packed representation)
    Binary = 1,
}

impl FormatCode {
    /// Create a FormatCode from a raw u16 value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => FormatCode::Binary,
            _ => FormatCode::Text, // Default to text for unknown values
        }
    }
}

impl From<u16> for FormatCode {
    fn from(value: u16) -> Self {
        Self::from_u16(value)
    }
}

/// Well-known PostgreSQL type OIDs.
///
/// These come from the `pg_type` catalog and are stable across server
/// versions; they are part of the wire contract. Array types carry the
/// `_`-prefixed name in the catalog and are listed here with an `_ARRAY`
/// suffix.
pub mod oid {
    use super::Oid;

    /// boolean, format 't'/'f'
    pub const BOOL: Oid = 16;
    /// variable-length string, binary values escaped
    pub const BYTEA: Oid = 17;
    /// single character
    pub const QCHAR: Oid = 18;
    /// 63-byte type for storing system identifiers
    pub const NAME: Oid = 19;
    /// ~18 digit integer, 8-byte storage
    pub const INT8: Oid = 20;
    /// -32 thousand to 32 thousand, 2-byte storage
    pub const INT2: Oid = 21;
    /// -2 billion to 2 billion integer, 4-byte storage
    pub const INT4: Oid = 23;
    /// variable-length string, no limit specified
    pub const TEXT: Oid = 25;
    /// object identifier(oid), maximum 4 billion
    pub const OID: Oid = 26;
    /// transaction id
    pub const XID: Oid = 28;
    /// command identifier type, sequence in transaction id
    pub const CID: Oid = 29;
    /// JSON stored as text
    pub const JSON: Oid = 114;
    /// array of json
    pub const JSON_ARRAY: Oid = 199;
    /// geometric point, format '(x,y)'
    pub const POINT: Oid = 600;
    /// geometric line segment, format '\[point1,point2\]'
    pub const LSEG: Oid = 601;
    /// geometric path, format '(point1,...)'
    pub const PATH: Oid = 602;
    /// geometric box, format 'lower left point,upper right point'
    pub const BOX: Oid = 603;
    /// geometric polygon, format '(point1,...)'
    pub const POLYGON: Oid = 604;
    /// geometric line, format '{A,B,C}'
    pub const LINE: Oid = 628;
    /// array of line
    pub const LINE_ARRAY: Oid = 629;
    /// network IP address/netmask, network address
    pub const CIDR: Oid = 650;
    /// array of cidr
    pub const CIDR_ARRAY: Oid = 651;
    /// single-precision floating point number, 4-byte storage
    pub const FLOAT4: Oid = 700;
    /// double-precision floating point number, 8-byte storage
    pub const FLOAT8: Oid = 701;
    /// pseudo-type representing an undetermined type
    pub const UNKNOWN: Oid = 705;
    /// geometric circle, format '<center point,radius>'
    pub const CIRCLE: Oid = 718;
    /// array of circle
    pub const CIRCLE_ARRAY: Oid = 719;
    /// IP address/netmask, host address, netmask optional
    pub const INET: Oid = 869;
    /// array of bool
    pub const BOOL_ARRAY: Oid = 1000;
    /// array of bytea
    pub const BYTEA_ARRAY: Oid = 1001;
    /// array of "char"
    pub const QCHAR_ARRAY: Oid = 1002;
    /// array of name
    pub const NAME_ARRAY: Oid = 1003;
    /// array of int2
    pub const INT2_ARRAY: Oid = 1005;
    /// array of int4
    pub const INT4_ARRAY: Oid = 1007;
    /// array of text
    pub const TEXT_ARRAY: Oid = 1009;
    /// array of xid
    pub const XID_ARRAY: Oid = 1011;
    /// array of cid
    pub const CID_ARRAY: Oid = 1012;
    /// array of bpchar
    pub const BPCHAR_ARRAY: Oid = 1014;
    /// array of varchar
    pub const VARCHAR_ARRAY: Oid = 1015;
    /// array of int8
    pub const INT8_ARRAY: Oid = 1016;
    /// array of point
    pub const POINT_ARRAY: Oid = 1017;
    /// array of lseg
    pub const LSEG_ARRAY: Oid = 1018;
    /// array of path
    pub const PATH_ARRAY: Oid = 1019;
    /// array of box
    pub const BOX_ARRAY: Oid = 1020;
    /// array of float4
    pub const FLOAT4_ARRAY: Oid = 1021;
    /// array of float8
    pub const FLOAT8_ARRAY: Oid = 1022;
    /// array of polygon
    pub const POLYGON_ARRAY: Oid = 1027;
    /// array of oid
    pub const OID_ARRAY: Oid = 1028;
    /// array of inet
    pub const INET_ARRAY: Oid = 1041;
    /// 'char(length)' blank-padded string, fixed storage length
    pub const BPCHAR: Oid = 1042;
    /// 'varchar(length)' non-blank-padded string, variable storage length
    pub const VARCHAR: Oid = 1043;
    /// date
    pub const DATE: Oid = 1082;
    /// time of day
    pub const TIME: Oid = 1083;
    /// date and time
    pub const TIMESTAMP: Oid = 1114;
    /// array of timestamp
    pub const TIMESTAMP_ARRAY: Oid = 1115;
    /// array of date
    pub const DATE_ARRAY: Oid = 1182;
    /// array of time
    pub const TIME_ARRAY: Oid = 1183;
    /// date and time with time zone
    pub const TIMESTAMPTZ: Oid = 1184;
    /// array of timestamptz
    pub const TIMESTAMPTZ_ARRAY: Oid = 1185;
    /// time interval, format 'number units ...'
    pub const INTERVAL: Oid = 1186;
    /// array of interval
    pub const INTERVAL_ARRAY: Oid = 1187;
    /// array of numeric
    pub const NUMERIC_ARRAY: Oid = 1231;
    /// fixed-length bit string
    pub const BIT: Oid = 1560;
    /// array of bit
    pub const BIT_ARRAY: Oid = 1561;
    /// variable-length bit string
    pub const VARBIT: Oid = 1562;
    /// array of varbit
    pub const VARBIT_ARRAY: Oid = 1563;
    /// 'numeric(precision, scale)' arbitrary precision number
    pub const NUMERIC: Oid = 1700;
    /// pseudo-type representing any composite type
    pub const RECORD: Oid = 2249;
    /// array of records
    pub const RECORD_ARRAY: Oid = 2287;
    /// UUID
    pub const UUID: Oid = 2950;
    /// array of uuid
    pub const UUID_ARRAY: Oid = 2951;
    /// Binary JSON
    pub const JSONB: Oid = 3802;
    /// array of jsonb
    pub const JSONB_ARRAY: Oid = 3807;
    /// range of integers
    pub const INT4RANGE: Oid = 3904;
    /// array of int4range
    pub const INT4RANGE_ARRAY: Oid = 3905;
    /// range of numerics
    pub const NUMRANGE: Oid = 3906;
    /// array of numrange
    pub const NUMRANGE_ARRAY: Oid = 3907;
    /// range of timestamps without time zone
    pub const TSRANGE: Oid = 3908;
    /// array of tsrange
    pub const TSRANGE_ARRAY: Oid = 3909;
    /// range of timestamps with time zone
    pub const TSTZRANGE: Oid = 3910;
    /// array of tstzrange
    pub const TSTZRANGE_ARRAY: Oid = 3911;
    /// range of dates
    pub const DATERANGE: Oid = 3912;
    /// array of daterange
    pub const DATERANGE_ARRAY: Oid = 3913;
    /// range of bigints
    pub const INT8RANGE: Oid = 3926;
    /// array of int8range
    pub const INT8RANGE_ARRAY: Oid = 3927;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_code_from_u16() {
        assert_eq!(FormatCode::from_u16(0), FormatCode::Text);
        assert_eq!(FormatCode::from_u16(1), FormatCode::Binary);
        assert_eq!(FormatCode::from_u16(7), FormatCode::Text);
    }
}
