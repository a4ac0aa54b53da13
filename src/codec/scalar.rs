//! Scalar codecs: bool, integers, floats, text, bytea, uuid, "char".

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::FormatCode;
use crate::value::{Value, ValueKind};
use crate::wire;

use super::{Codec, coerce_into, encode_plan, scan_plan, utf8};

// === Boolean ===

/// Codec for `bool` (oid 16): one byte binary, `t`/`f` text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

fn decode_bool(format: FormatCode, bytes: &[u8]) -> Result<Value> {
    match format {
        FormatCode::Binary => {
            if bytes.len() != 1 {
                return Err(Error::length("bool", bytes.len(), 1));
            }
            Ok(Value::Bool(bytes[0] != 0))
        }
        FormatCode::Text => match bytes {
            b"t" | b"true" | b"TRUE" | b"T" | b"1" => Ok(Value::Bool(true)),
            b"f" | b"false" | b"FALSE" | b"F" | b"0" => Ok(Value::Bool(false)),
            _ => Err(Error::MalformedText(format!(
                "invalid boolean: {:?}",
                String::from_utf8_lossy(bytes)
            ))),
        },
    }
}

impl Codec for BoolCodec {
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
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Bool) {
            return None;
        }
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let b = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Bool(b) => *b,
                other => return Err(Error::out_of_range(other.kind_name(), "bool")),
            };
            match format {
                FormatCode::Binary => buf.push(u8::from(b)),
                FormatCode::Text => buf.push(if b { b't' } else { b'f' }),
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
        let kind = target.kind();
        if !matches!(kind, ValueKind::Null | ValueKind::Bool) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            *out = coerce_into(kind, decode_bool(format, bytes)?)?;
            Ok(())
        })
    }
}

// === Integer types ===

macro_rules! int_codec {
    ($name:ident, $pg_name:literal, $native:ty, $width:expr, $variant:ident) => {
        /// Codec for a fixed-width integer type: big-endian binary,
        /// decimal text. Scans widen freely and narrow with a range
        /// check; encodes accept any integer shape that fits.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $name {
            fn decode(format: FormatCode, bytes: &[u8]) -> Result<Value> {
                match format {
                    FormatCode::Binary => {
                        let arr: [u8; $width] = bytes
                            .try_into()
                            .map_err(|_| Error::length($pg_name, bytes.len(), $width))?;
                        Ok(Value::$variant(<$native>::from_be_bytes(arr)))
                    }
                    FormatCode::Text => {
                        let s = utf8(bytes)?;
                        let v: $native = s.parse().map_err(|e| {
                            Error::MalformedText(format!(concat!("invalid ", $pg_name, ": {}"), e))
                        })?;
                        Ok(Value::$variant(v))
                    }
                }
            }
        }

        impl Codec for $name {
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
                if !matches!(
                    value.kind(),
                    ValueKind::Null | ValueKind::Int2 | ValueKind::Int4 | ValueKind::Int8
                ) {
                    return None;
                }
                encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
                    if value.is_null() {
                        return Ok(IsNull::Yes);
                    }
                    let wide = value
                        .as_int()
                        .ok_or_else(|| Error::out_of_range(value.kind_name(), $pg_name))?;
                    let v = <$native>::try_from(wide)
                        .map_err(|_| Error::out_of_range(wide, $pg_name))?;
                    match format {
                        FormatCode::Binary => buf.extend_from_slice(&v.to_be_bytes()),
                        FormatCode::Text => buf.extend_from_slice(v.to_string().as_bytes()),
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
                let kind = target.kind();
                if !matches!(
                    kind,
                    ValueKind::Null
                        | ValueKind::Int2
                        | ValueKind::Int4
                        | ValueKind::Int8
                        | ValueKind::Float4
                        | ValueKind::Float8
                ) {
                    return None;
                }
                scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
                    let Some(bytes) = src else {
                        *out = Value::Null;
                        return Ok(());
                    };
                    *out = coerce_into(kind, Self::decode(format, bytes)?)?;
                    Ok(())
                })
            }
        }
    };
}

int_codec!(Int2Codec, "int2", i16, 2, Int2);
int_codec!(Int4Codec, "int4", i32, 4, Int4);
int_codec!(Int8Codec, "int8", i64, 8, Int8);

// === Floating point types ===

fn parse_float_text<T>(s: &str, nan: T, inf: T, ninf: T, ty: &'static str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match s {
        "NaN" => Ok(nan),
        "Infinity" => Ok(inf),
        "-Infinity" => Ok(ninf),
        _ => s
            .parse()
            .map_err(|e| Error::MalformedText(format!("invalid {ty}: {e}"))),
    }
}

fn float_text(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "Infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        v.to_string()
    }
}

fn float4_text(v: f32) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f32::INFINITY {
        "Infinity".to_string()
    } else if v == f32::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        v.to_string()
    }
}

macro_rules! float_codec {
    ($name:ident, $pg_name:literal, $native:ty, $width:expr, $variant:ident, $to_text:path) => {
        /// Codec for an IEEE-754 float type: big-endian bits binary,
        /// shortest-round-trip text with the spelled-out specials.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $name {
            fn decode(format: FormatCode, bytes: &[u8]) -> Result<Value> {
                match format {
                    FormatCode::Binary => {
                        let arr: [u8; $width] = bytes
                            .try_into()
                            .map_err(|_| Error::length($pg_name, bytes.len(), $width))?;
                        Ok(Value::$variant(<$native>::from_be_bytes(arr)))
                    }
                    FormatCode::Text => {
                        let s = utf8(bytes)?;
                        Ok(Value::$variant(parse_float_text(
                            s,
                            <$native>::NAN,
                            <$native>::INFINITY,
                            <$native>::NEG_INFINITY,
                            $pg_name,
                        )?))
                    }
                }
            }

            fn to_native(value: &Value) -> Result<$native> {
                match value {
                    Value::Float4(v) => Ok(*v as $native),
                    Value::Float8(v) => {
                        let narrowed = *v as $native;
                        if narrowed.is_infinite() && v.is_finite() {
                            return Err(Error::out_of_range(v, $pg_name));
                        }
                        Ok(narrowed)
                    }
                    Value::Int2(v) => Ok(*v as $native),
                    Value::Int4(v) => Ok(*v as $native),
                    Value::Int8(v) => Ok(*v as $native),
                    other => Err(Error::out_of_range(other.kind_name(), $pg_name)),
                }
            }
        }

        impl Codec for $name {
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
                if !matches!(
                    value.kind(),
                    ValueKind::Null
                        | ValueKind::Float4
                        | ValueKind::Float8
                        | ValueKind::Int2
                        | ValueKind::Int4
                        | ValueKind::Int8
                ) {
                    return None;
                }
                encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
                    if value.is_null() {
                        return Ok(IsNull::Yes);
                    }
                    let v = Self::to_native(value)?;
                    match format {
                        FormatCode::Binary => buf.extend_from_slice(&v.to_be_bytes()),
                        FormatCode::Text => buf.extend_from_slice($to_text(v).as_bytes()),
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
                let kind = target.kind();
                if !matches!(
                    kind,
                    ValueKind::Null | ValueKind::Float4 | ValueKind::Float8
                ) {
                    return None;
                }
                scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
                    let Some(bytes) = src else {
                        *out = Value::Null;
                        return Ok(());
                    };
                    *out = coerce_into(kind, Self::decode(format, bytes)?)?;
                    Ok(())
                })
            }
        }
    };
}

float_codec!(Float4Codec, "float4", f32, 4, Float4, float4_text);
float_codec!(Float8Codec, "float8", f64, 8, Float8, float_text);

// === Text family ===

/// Codec for the text family (text/varchar/bpchar/name/unknown): the
/// payload is the UTF-8 string itself in both formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Text
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        _format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(
            value.kind(),
            ValueKind::Null | ValueKind::Text | ValueKind::EnumLabel
        ) {
            return None;
        }
        encode_plan(|_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Text(s) | Value::EnumLabel(s) => buf.extend_from_slice(s.as_bytes()),
                other => return Err(Error::out_of_range(other.kind_name(), "text")),
            }
            Ok(IsNull::No)
        })
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: crate::types::Oid,
        _format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        let kind = target.kind();
        if !matches!(kind, ValueKind::Null | ValueKind::Text | ValueKind::EnumLabel) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            *out = coerce_into(kind, Value::Text(utf8(bytes)?.to_owned()))?;
            Ok(())
        })
    }
}

// === Bytea ===

/// Codec for `bytea`: raw bytes binary, `\x`-prefixed hex text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteaCodec;

fn decode_hex(hex: &[u8]) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(Error::MalformedText("invalid hex length".into()));
    }
    let mut result = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        result.push((high << 4) | low);
    }
    Ok(result)
}

fn hex_digit(b: u8) -> Result<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(Error::MalformedText(format!(
            "invalid hex digit: {}",
            b as char
        ))),
    }
}

fn encode_hex(bytes: &[u8], out: &mut Vec<u8>) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    out.extend_from_slice(b"\\x");
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize]);
        out.push(HEX[(b & 0x0F) as usize]);
    }
}

impl Codec for ByteaCodec {
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
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Bytes) {
            return None;
        }
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let bytes = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Bytes(b) => b,
                other => return Err(Error::out_of_range(other.kind_name(), "bytea")),
            };
            match format {
                FormatCode::Binary => buf.extend_from_slice(bytes),
                FormatCode::Text => encode_hex(bytes, buf),
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
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Bytes) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let decoded = match format {
                FormatCode::Binary => bytes.to_vec(),
                FormatCode::Text => match bytes.strip_prefix(b"\\x") {
                    Some(hex) => decode_hex(hex)?,
                    None => {
                        return Err(Error::MalformedText(
                            "bytea text payload does not start with \\x".into(),
                        ));
                    }
                },
            };
            *out = Value::Bytes(decoded);
            Ok(())
        })
    }
}

// === UUID ===

/// Codec for `uuid`: 16 raw bytes binary, dashed hex text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCodec;

/// Parse the dashed form `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
pub(crate) fn parse_uuid_text(s: &str) -> Result<[u8; 16]> {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return Err(Error::MalformedText(format!("invalid uuid: {s:?}")));
    }
    let mut out = [0u8; 16];
    let mut idx = 0;
    let mut pos = 0;
    while pos < 36 {
        if matches!(pos, 8 | 13 | 18 | 23) {
            if bytes[pos] != b'-' {
                return Err(Error::MalformedText(format!("invalid uuid: {s:?}")));
            }
            pos += 1;
            continue;
        }
        let high = hex_digit(bytes[pos])?;
        let low = hex_digit(bytes[pos + 1])?;
        out[idx] = (high << 4) | low;
        idx += 1;
        pos += 2;
    }
    Ok(out)
}

/// Render the dashed lowercase form.
pub(crate) fn format_uuid_text(bytes: &[u8; 16]) -> String {
    let mut out = String::with_capacity(36);
    for (i, b) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        out.push_str(&format!("{b:02x}"));
    }
    out
}

impl Codec for UuidCodec {
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
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Uuid) {
            return None;
        }
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let bytes = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Uuid(b) => b,
                other => return Err(Error::out_of_range(other.kind_name(), "uuid")),
            };
            match format {
                FormatCode::Binary => buf.extend_from_slice(bytes),
                FormatCode::Text => buf.extend_from_slice(format_uuid_text(bytes).as_bytes()),
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
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Uuid) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let decoded = match format {
                FormatCode::Binary => {
                    let arr: [u8; 16] = bytes
                        .try_into()
                        .map_err(|_| Error::length("uuid", bytes.len(), 16))?;
                    arr
                }
                FormatCode::Text => parse_uuid_text(utf8(bytes)?)?,
            };
            *out = Value::Uuid(decoded);
            Ok(())
        })
    }
}

// === "char" ===

/// Codec for the single-byte `"char"` type (oid 18).
///
/// Binary only: arbitrary bytes do not survive the text channel, so no
/// text plans are offered.
#[derive(Debug, Clone, Copy, Default)]
pub struct QCharCodec;

impl Codec for QCharCodec {
    fn format_supported(&self, format: FormatCode) -> bool {
        format == FormatCode::Binary
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
        if format != FormatCode::Binary {
            return None;
        }
        if !matches!(value.kind(), ValueKind::Null | ValueKind::QChar) {
            return None;
        }
        encode_plan(|_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::QChar(b) => wire::write_u8(buf, *b),
                other => return Err(Error::out_of_range(other.kind_name(), "\"char\"")),
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
        if format != FormatCode::Binary {
            return None;
        }
        if !matches!(target.kind(), ValueKind::Null | ValueKind::QChar) {
            return None;
        }
        scan_plan(|_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            if bytes.len() != 1 {
                return Err(Error::length("\"char\"", bytes.len(), 1));
            }
            *out = Value::QChar(bytes[0]);
            Ok(())
        })
    }
}
