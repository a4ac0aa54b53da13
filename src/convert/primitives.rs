//! Primitive type implementations (bool, integers, floats).

use crate::codec::decode_numeric_binary;
use crate::error::{Error, Result};
use crate::numeric::Numeric;
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};

use super::{FromWire, ToWire};

fn utf8(bytes: &[u8]) -> Result<&str> {
    simdutf8::compat::from_utf8(bytes)
        .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))
}

// === Boolean ===

impl FromWire<'_> for bool {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::BOOL {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "bool"));
        }
        match bytes {
            b"t" | b"true" | b"TRUE" | b"T" | b"1" => Ok(true),
            b"f" | b"false" | b"FALSE" | b"F" | b"0" => Ok(false),
            _ => Err(Error::MalformedText(format!(
                "invalid boolean: {:?}",
                String::from_utf8_lossy(bytes)
            ))),
        }
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::BOOL {
            return Err(Error::no_scan_plan(oid, FormatCode::Binary, "bool"));
        }
        if bytes.len() != 1 {
            return Err(Error::length("bool", bytes.len(), 1));
        }
        Ok(bytes[0] != 0)
    }
}

impl ToWire for bool {
    fn natural_oid(&self) -> Oid {
        oid::BOOL
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        match oid {
            0 | oid::BOOL => {}
            _ => return Err(Error::no_encode_plan(oid, format, "bool")),
        }
        match format {
            FormatCode::Binary => buf.push(u8::from(*self)),
            FormatCode::Text => buf.push(if *self { b't' } else { b'f' }),
        }
        Ok(IsNull::No)
    }
}

// === Integer types ===

/// Widening binary decode shared by the signed integer targets.
fn int_from_binary(oid: Oid, bytes: &[u8]) -> Result<i64> {
    match oid {
        oid::INT2 => {
            let arr: [u8; 2] = bytes
                .try_into()
                .map_err(|_| Error::length("int2", bytes.len(), 2))?;
            Ok(i16::from_be_bytes(arr) as i64)
        }
        oid::INT4 => {
            let arr: [u8; 4] = bytes
                .try_into()
                .map_err(|_| Error::length("int4", bytes.len(), 4))?;
            Ok(i32::from_be_bytes(arr) as i64)
        }
        oid::INT8 => {
            let arr: [u8; 8] = bytes
                .try_into()
                .map_err(|_| Error::length("int8", bytes.len(), 8))?;
            Ok(i64::from_be_bytes(arr))
        }
        _ => Err(Error::no_scan_plan(oid, FormatCode::Binary, "integer")),
    }
}

fn int_from_text(oid: Oid, bytes: &[u8]) -> Result<i64> {
    if !matches!(oid, oid::INT2 | oid::INT4 | oid::INT8) {
        return Err(Error::no_scan_plan(oid, FormatCode::Text, "integer"));
    }
    utf8(bytes)?
        .parse()
        .map_err(|e| Error::MalformedText(format!("invalid integer: {e}")))
}

/// Range-checked encode shared by every integer source.
fn int_encode(wide: i64, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
    match (oid, format) {
        (oid::INT2, FormatCode::Binary) => {
            let v = i16::try_from(wide).map_err(|_| Error::out_of_range(wide, "int2"))?;
            buf.extend_from_slice(&v.to_be_bytes());
        }
        (oid::INT4, FormatCode::Binary) => {
            let v = i32::try_from(wide).map_err(|_| Error::out_of_range(wide, "int4"))?;
            buf.extend_from_slice(&v.to_be_bytes());
        }
        (oid::INT8, FormatCode::Binary) => {
            buf.extend_from_slice(&wide.to_be_bytes());
        }
        (oid::NUMERIC, FormatCode::Binary) => {
            crate::codec::encode_numeric_binary(&Numeric::from_i64(wide), buf);
        }
        (oid::INT2 | oid::INT4 | oid::INT8 | oid::NUMERIC, FormatCode::Text) => {
            if oid == oid::INT2 {
                i16::try_from(wide).map_err(|_| Error::out_of_range(wide, "int2"))?;
            }
            if oid == oid::INT4 {
                i32::try_from(wide).map_err(|_| Error::out_of_range(wide, "int4"))?;
            }
            buf.extend_from_slice(wide.to_string().as_bytes());
        }
        _ => return Err(Error::no_encode_plan(oid, format, "integer")),
    }
    Ok(IsNull::No)
}

macro_rules! signed_int {
    ($native:ty, $natural:expr, $accept:pat) => {
        impl FromWire<'_> for $native {
            fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(oid, FormatCode::Text, stringify!($native)));
                }
                let wide = int_from_text(oid, bytes)?;
                <$native>::try_from(wide)
                    .map_err(|_| Error::out_of_range(wide, stringify!($native)))
            }

            fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(
                        oid,
                        FormatCode::Binary,
                        stringify!($native),
                    ));
                }
                let wide = int_from_binary(oid, bytes)?;
                <$native>::try_from(wide)
                    .map_err(|_| Error::out_of_range(wide, stringify!($native)))
            }
        }

        impl ToWire for $native {
            fn natural_oid(&self) -> Oid {
                $natural
            }

            fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
                let oid = if oid == 0 { $natural } else { oid };
                int_encode(*self as i64, oid, format, buf)
            }
        }
    };
}

signed_int!(i16, oid::INT2, oid::INT2);
signed_int!(i32, oid::INT4, oid::INT2 | oid::INT4);
signed_int!(i64, oid::INT8, oid::INT2 | oid::INT4 | oid::INT8);

// === i8 / u8 (PostgreSQL has no 1-byte integer; INT2 carries them) ===

impl ToWire for i8 {
    fn natural_oid(&self) -> Oid {
        oid::INT2
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::INT2 } else { oid };
        int_encode(*self as i64, oid, format, buf)
    }
}

impl ToWire for u8 {
    fn natural_oid(&self) -> Oid {
        oid::INT2
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::INT2 } else { oid };
        int_encode(*self as i64, oid, format, buf)
    }
}

// === Unsigned targets: decode rejects negatives ===

macro_rules! unsigned_int {
    ($native:ty, $natural:expr, $accept:pat) => {
        impl FromWire<'_> for $native {
            fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(oid, FormatCode::Text, stringify!($native)));
                }
                let wide = int_from_text(oid, bytes)?;
                <$native>::try_from(wide)
                    .map_err(|_| Error::out_of_range(wide, stringify!($native)))
            }

            fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(
                        oid,
                        FormatCode::Binary,
                        stringify!($native),
                    ));
                }
                let wide = int_from_binary(oid, bytes)?;
                <$native>::try_from(wide)
                    .map_err(|_| Error::out_of_range(wide, stringify!($native)))
            }
        }

        impl ToWire for $native {
            fn natural_oid(&self) -> Oid {
                $natural
            }

            fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
                let oid = if oid == 0 { $natural } else { oid };
                let wide = i64::try_from(*self)
                    .map_err(|_| Error::out_of_range(*self, "int8"))?;
                int_encode(wide, oid, format, buf)
            }
        }
    };
}

// u16 exceeds int2, u32 exceeds int4, so each naturally widens by one.
unsigned_int!(u16, oid::INT4, oid::INT2 | oid::INT4);
unsigned_int!(u32, oid::INT8, oid::INT2 | oid::INT4 | oid::INT8);
unsigned_int!(u64, oid::INT8, oid::INT2 | oid::INT4 | oid::INT8);

// === Floating point types ===

fn float_from_text(bytes: &[u8]) -> Result<f64> {
    let s = utf8(bytes)?;
    match s {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        _ => s
            .parse()
            .map_err(|e| Error::MalformedText(format!("invalid float: {e}"))),
    }
}

impl FromWire<'_> for f32 {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if !matches!(oid, oid::FLOAT4 | oid::NUMERIC) {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "f32"));
        }
        let value = float_from_text(bytes)?;
        if value.is_finite() && (value > f32::MAX as f64 || value < f32::MIN as f64) {
            return Err(Error::out_of_range(value, "f32"));
        }
        Ok(value as f32)
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        match oid {
            oid::FLOAT4 => {
                let arr: [u8; 4] = bytes
                    .try_into()
                    .map_err(|_| Error::length("float4", bytes.len(), 4))?;
                Ok(f32::from_be_bytes(arr))
            }
            oid::NUMERIC => {
                let value = decode_numeric_binary(bytes)?.to_f64();
                let narrowed = value as f32;
                if narrowed.is_infinite() && value.is_finite() {
                    return Err(Error::out_of_range(value, "f32"));
                }
                Ok(narrowed)
            }
            _ => Err(Error::no_scan_plan(oid, FormatCode::Binary, "f32")),
        }
    }
}

impl FromWire<'_> for f64 {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if !matches!(oid, oid::FLOAT4 | oid::FLOAT8 | oid::NUMERIC) {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "f64"));
        }
        float_from_text(bytes)
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        match oid {
            oid::FLOAT4 => {
                let arr: [u8; 4] = bytes
                    .try_into()
                    .map_err(|_| Error::length("float4", bytes.len(), 4))?;
                Ok(f32::from_be_bytes(arr) as f64)
            }
            oid::FLOAT8 => {
                let arr: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| Error::length("float8", bytes.len(), 8))?;
                Ok(f64::from_be_bytes(arr))
            }
            oid::NUMERIC => Ok(decode_numeric_binary(bytes)?.to_f64()),
            _ => Err(Error::no_scan_plan(oid, FormatCode::Binary, "f64")),
        }
    }
}

fn float_to_text(v: f64) -> String {
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

impl ToWire for f32 {
    fn natural_oid(&self) -> Oid {
        oid::FLOAT4
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::FLOAT4 } else { oid };
        match (oid, format) {
            (oid::FLOAT4, FormatCode::Binary) => buf.extend_from_slice(&self.to_be_bytes()),
            (oid::FLOAT8, FormatCode::Binary) => {
                buf.extend_from_slice(&(*self as f64).to_be_bytes());
            }
            (oid::FLOAT4 | oid::FLOAT8, FormatCode::Text) => {
                buf.extend_from_slice(float_to_text(*self as f64).as_bytes());
            }
            _ => return Err(Error::no_encode_plan(oid, format, "f32")),
        }
        Ok(IsNull::No)
    }
}

impl ToWire for f64 {
    fn natural_oid(&self) -> Oid {
        oid::FLOAT8
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::FLOAT8 } else { oid };
        match (oid, format) {
            (oid::FLOAT4, FormatCode::Binary) => {
                let narrowed = *self as f32;
                if narrowed.is_infinite() && self.is_finite() {
                    return Err(Error::out_of_range(self, "float4"));
                }
                buf.extend_from_slice(&narrowed.to_be_bytes());
            }
            (oid::FLOAT8, FormatCode::Binary) => buf.extend_from_slice(&self.to_be_bytes()),
            (oid::FLOAT4 | oid::FLOAT8, FormatCode::Text) => {
                buf.extend_from_slice(float_to_text(*self).as_bytes());
            }
            _ => return Err(Error::no_encode_plan(oid, format, "f64")),
        }
        Ok(IsNull::No)
    }
}
