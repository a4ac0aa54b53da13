//! Round-trip properties across the built-in registry.
//!
//! Every value here goes value -> payload -> value through the public
//! registry API, in both wire formats where the codec supports both.

use pgcodec::{
    ArrayDimension, ArrayValue, BitString, BoundKind, Date, FormatCode, Inet, Interval, Numeric,
    Point, RangeValue, RecordValue, Timestamp, TypeRegistry, Value, oid,
};

fn roundtrip(registry: &TypeRegistry, type_oid: u32, format: FormatCode, value: &Value) -> Value {
    let mut buf = Vec::new();
    let is_null = registry
        .encode(type_oid, format, value, &mut buf)
        .unwrap_or_else(|e| panic!("encode oid {type_oid} {format:?}: {e}"));
    assert!(!is_null.is_null(), "non-null value reported as null");
    let mut out = Value::Null;
    registry
        .scan(type_oid, format, Some(&buf), &mut out)
        .unwrap_or_else(|e| panic!("scan oid {type_oid} {format:?}: {e}"));
    out
}

fn assert_roundtrip(registry: &TypeRegistry, type_oid: u32, value: Value) {
    for format in [FormatCode::Binary, FormatCode::Text] {
        let out = roundtrip(registry, type_oid, format, &value);
        assert_eq!(out, value, "oid {type_oid} {format:?}");
    }
}

#[test]
fn test_scalar_roundtrips() {
    let reg = TypeRegistry::with_builtins();
    assert_roundtrip(&reg, oid::BOOL, Value::Bool(true));
    assert_roundtrip(&reg, oid::BOOL, Value::Bool(false));
    assert_roundtrip(&reg, oid::INT2, Value::Int2(-300));
    assert_roundtrip(&reg, oid::INT4, Value::Int4(1 << 30));
    assert_roundtrip(&reg, oid::INT8, Value::Int8(i64::MIN + 1));
    assert_roundtrip(&reg, oid::FLOAT4, Value::Float4(1.25));
    assert_roundtrip(&reg, oid::FLOAT8, Value::Float8(-0.001220703125));
    assert_roundtrip(&reg, oid::TEXT, Value::Text("naïve UTF-8 ☃".into()));
    assert_roundtrip(&reg, oid::VARCHAR, Value::Text(String::new()));
    assert_roundtrip(&reg, oid::BYTEA, Value::Bytes(vec![0, 255, 1, 128]));
    assert_roundtrip(&reg, oid::UUID, Value::Uuid([0xAB; 16]));
}

#[test]
fn test_temporal_roundtrips() {
    let reg = TypeRegistry::with_builtins();
    assert_roundtrip(&reg, oid::DATE, Value::Date(Date::Finite(8780)));
    assert_roundtrip(&reg, oid::DATE, Value::Date(Date::Finite(-365)));
    assert_roundtrip(&reg, oid::DATE, Value::Date(Date::Infinity));
    assert_roundtrip(&reg, oid::TIME, Value::Time(37_845_123_456));
    assert_roundtrip(&reg, oid::TIME, Value::Time(86_400_000_000)); // 24:00:00
    assert_roundtrip(
        &reg,
        oid::TIMESTAMP,
        Value::Timestamp(Timestamp::Finite(758_546_096_789_012)),
    );
    assert_roundtrip(
        &reg,
        oid::TIMESTAMPTZ,
        Value::Timestamp(Timestamp::NegInfinity),
    );
    assert_roundtrip(
        &reg,
        oid::INTERVAL,
        Value::Interval(Interval {
            months: 14,
            days: -3,
            microseconds: 12_345_678,
        }),
    );
}

#[test]
fn test_network_and_bits_roundtrips() {
    let reg = TypeRegistry::with_builtins();
    assert_roundtrip(
        &reg,
        oid::INET,
        Value::Inet(Inet::host("10.1.2.3".parse().unwrap())),
    );
    assert_roundtrip(
        &reg,
        oid::CIDR,
        Value::Inet(Inet {
            addr: "fd00::".parse().unwrap(),
            prefix: 8,
        }),
    );
    assert_roundtrip(
        &reg,
        oid::VARBIT,
        Value::Bits(BitString::new(10, vec![0b1010_1010, 0b1100_0000]).unwrap()),
    );
}

#[test]
fn test_numeric_roundtrips_digit_equal() {
    let reg = TypeRegistry::with_builtins();
    for s in [
        "0",
        "1",
        "-1",
        "3.14159",
        "123.45",
        "-99999999.99999999",
        "0.000000001",
        "123456789012345678901234567890",
        "1.50",
        "NaN",
        "Infinity",
        "-Infinity",
    ] {
        let n = Numeric::parse_text(s).unwrap();
        assert_roundtrip(&reg, oid::NUMERIC, Value::Numeric(n));
    }
}

#[test]
fn test_geometry_roundtrips() {
    let reg = TypeRegistry::with_builtins();
    assert_roundtrip(&reg, oid::POINT, Value::Point(Point { x: 1.5, y: -2.5 }));
    assert_roundtrip(
        &reg,
        oid::CIRCLE,
        Value::Circle(pgcodec::Circle {
            center: Point { x: 0.0, y: 0.0 },
            radius: 2.25,
        }),
    );
    assert_roundtrip(
        &reg,
        oid::POLYGON,
        Value::Polygon(pgcodec::Polygon {
            points: vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 4.0, y: 0.0 },
                Point { x: 2.0, y: 3.0 },
            ],
        }),
    );
}

#[test]
fn test_null_preservation_everywhere() {
    let reg = TypeRegistry::with_builtins();
    for type_oid in [
        oid::BOOL,
        oid::INT4,
        oid::TEXT,
        oid::NUMERIC,
        oid::INT4_ARRAY,
        oid::INT4RANGE,
        oid::JSONB,
    ] {
        for format in [FormatCode::Binary, FormatCode::Text] {
            // Encoding NULL appends nothing and reports Yes.
            let mut buf = Vec::new();
            let is_null = reg.encode(type_oid, format, &Value::Null, &mut buf).unwrap();
            assert!(is_null.is_null(), "oid {type_oid}");
            assert!(buf.is_empty(), "oid {type_oid}");

            // Scanning the absent payload yields NULL.
            let mut out = Value::Null;
            reg.scan(type_oid, format, None, &mut out).unwrap();
            assert_eq!(out, Value::Null, "oid {type_oid}");
        }
    }
}

#[test]
fn test_array_roundtrips() {
    let reg = TypeRegistry::with_builtins();
    assert_roundtrip(
        &reg,
        oid::INT4_ARRAY,
        Value::Array(ArrayValue::one_dim(vec![
            Value::Int4(1),
            Value::Null,
            Value::Int4(3),
        ])),
    );
    assert_roundtrip(
        &reg,
        oid::TEXT_ARRAY,
        Value::Array(ArrayValue::one_dim(vec![
            Value::Text("plain".into()),
            Value::Text("with \"quotes\" and \\slashes\\".into()),
            Value::Text("NULL".into()),
            Value::Text(String::new()),
        ])),
    );
    // Three dimensions, lower bounds preserved in binary.
    let arr = ArrayValue::new(
        vec![
            ArrayDimension { len: 2, lower_bound: 0 },
            ArrayDimension { len: 2, lower_bound: 1 },
            ArrayDimension { len: 2, lower_bound: 2 },
        ],
        (0..8).map(Value::Int4).collect(),
    )
    .unwrap();
    let out = roundtrip(&reg, oid::INT4_ARRAY, FormatCode::Binary, &Value::Array(arr.clone()));
    assert_eq!(out, Value::Array(arr));
}

#[test]
fn test_array_dimensional_integrity() {
    let reg = TypeRegistry::with_builtins();
    let arr = ArrayValue::new(
        vec![
            ArrayDimension { len: 3, lower_bound: 1 },
            ArrayDimension { len: 5, lower_bound: 1 },
            ArrayDimension { len: 2, lower_bound: 1 },
        ],
        (0..30).map(Value::Int4).collect(),
    )
    .unwrap();
    for format in [FormatCode::Binary, FormatCode::Text] {
        let out = roundtrip(&reg, oid::INT4_ARRAY, format, &Value::Array(arr.clone()));
        let Value::Array(out) = out else { panic!("not an array") };
        let product: usize = out.dims.iter().map(|d| d.len as usize).product();
        assert_eq!(out.elements.len(), product);
        assert_eq!(out.elements.len(), 30);
    }
}

#[test]
fn test_nested_array_of_numeric() {
    let reg = TypeRegistry::with_builtins();
    let arr = ArrayValue::one_dim(vec![
        Value::Numeric(Numeric::parse_text("1.5").unwrap()),
        Value::Numeric(Numeric::parse_text("-0.25").unwrap()),
    ]);
    assert_roundtrip(&reg, oid::NUMERIC_ARRAY, Value::Array(arr));
}

#[test]
fn test_range_roundtrips() {
    let reg = TypeRegistry::with_builtins();
    let cases = [
        RangeValue {
            lower: Some(Box::new(Value::Int4(1))),
            upper: Some(Box::new(Value::Int4(5))),
            lower_kind: BoundKind::Inclusive,
            upper_kind: BoundKind::Exclusive,
        },
        RangeValue {
            lower: None,
            upper: Some(Box::new(Value::Int4(5))),
            lower_kind: BoundKind::Unbounded,
            upper_kind: BoundKind::Inclusive,
        },
        RangeValue {
            lower: None,
            upper: None,
            lower_kind: BoundKind::Unbounded,
            upper_kind: BoundKind::Unbounded,
        },
        RangeValue::empty(),
    ];
    for range in cases {
        assert_roundtrip(&reg, oid::INT4RANGE, Value::Range(range));
    }

    // Ranges over other element types.
    assert_roundtrip(
        &reg,
        oid::NUMRANGE,
        Value::Range(RangeValue {
            lower: Some(Box::new(Value::Numeric(Numeric::parse_text("1.5").unwrap()))),
            upper: Some(Box::new(Value::Numeric(Numeric::parse_text("2.5").unwrap()))),
            lower_kind: BoundKind::Inclusive,
            upper_kind: BoundKind::Exclusive,
        }),
    );
    assert_roundtrip(
        &reg,
        oid::TSRANGE,
        Value::Range(RangeValue {
            lower: Some(Box::new(Value::Timestamp(Timestamp::Finite(0)))),
            upper: None,
            lower_kind: BoundKind::Inclusive,
            upper_kind: BoundKind::Unbounded,
        }),
    );
}

#[test]
fn test_json_roundtrips() {
    let reg = TypeRegistry::with_builtins();
    assert_roundtrip(&reg, oid::JSON, Value::Json(br#"{"a":[1,2,3]}"#.to_vec()));
    assert_roundtrip(&reg, oid::JSONB, Value::Json(br#"{"a":[1,2,3]}"#.to_vec()));
}

#[test]
fn test_format_equivalence() {
    let reg = TypeRegistry::with_builtins();
    let values = [
        (oid::BOOL, Value::Bool(true)),
        (oid::INT8, Value::Int8(-40_000_000_000)),
        (oid::TEXT, Value::Text("x,{}\"\\y".into())),
        (
            oid::NUMERIC,
            Value::Numeric(Numeric::parse_text("-12.0045").unwrap()),
        ),
        (oid::DATE, Value::Date(Date::Finite(0))),
        (
            oid::INT4_ARRAY,
            Value::Array(ArrayValue::one_dim(vec![Value::Int4(9), Value::Null])),
        ),
    ];
    for (type_oid, value) in values {
        let from_text = roundtrip(&reg, type_oid, FormatCode::Text, &value);
        let from_binary = roundtrip(&reg, type_oid, FormatCode::Binary, &value);
        assert_eq!(from_text, from_binary, "oid {type_oid}");
    }
}

#[test]
fn test_composite_positional_order() {
    let mut reg = TypeRegistry::with_builtins();
    reg.register_composite(
        "pair",
        90_000,
        vec![("label".into(), oid::TEXT), ("count".into(), oid::INT4)],
    )
    .unwrap();

    let record = Value::Record(RecordValue {
        fields: vec![Value::Text("hi".into()), Value::Int4(42)],
    });
    assert_roundtrip(&reg, 90_000, record);
}
