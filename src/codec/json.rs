//! JSON and JSONB codec.
//!
//! The document bytes pass through opaque; JSONB's binary format
//! prepends a single version byte (currently 1) which is added on encode
//! and required on decode. Structured marshalling belongs to the typed
//! layer (`Json<T>` under the `json` feature).

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::{FormatCode, Oid};
use crate::value::{Value, ValueKind};

use super::{Codec, encode_plan, scan_plan, utf8};

/// The only JSONB binary version in use.
const JSONB_VERSION: u8 = 1;

/// Codec for `json` and `jsonb`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    /// True for `jsonb`, which carries the version byte in binary.
    pub binary_version_byte: bool,
}

impl JsonCodec {
    /// The `json` codec.
    pub fn json() -> Self {
        JsonCodec {
            binary_version_byte: false,
        }
    }

    /// The `jsonb` codec.
    pub fn jsonb() -> Self {
        JsonCodec {
            binary_version_byte: true,
        }
    }
}

/// Strip the version byte of a binary JSONB payload.
pub(crate) fn strip_jsonb_version(bytes: &[u8]) -> Result<&[u8]> {
    match bytes.split_first() {
        Some((&JSONB_VERSION, rest)) => Ok(rest),
        Some((&version, _)) => Err(Error::MalformedBinary(format!(
            "unknown jsonb version number {version}"
        ))),
        None => Err(Error::MalformedBinary("empty jsonb payload".into())),
    }
}

impl Codec for JsonCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Text
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(
            value.kind(),
            ValueKind::Null | ValueKind::Json | ValueKind::Text | ValueKind::Bytes
        ) {
            return None;
        }
        let version_byte = self.binary_version_byte;
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let bytes: &[u8] = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Json(b) | Value::Bytes(b) => b,
                Value::Text(s) => s.as_bytes(),
                other => return Err(Error::out_of_range(other.kind_name(), "json")),
            };
            if version_byte && format == FormatCode::Binary {
                buf.push(JSONB_VERSION);
            }
            buf.extend_from_slice(bytes);
            Ok(IsNull::No)
        })
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        let kind = target.kind();
        if !matches!(
            kind,
            ValueKind::Null | ValueKind::Json | ValueKind::Text | ValueKind::Bytes
        ) {
            return None;
        }
        let version_byte = self.binary_version_byte;
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let bytes = if version_byte && format == FormatCode::Binary {
                strip_jsonb_version(bytes)?
            } else {
                bytes
            };
            *out = match kind {
                ValueKind::Text => Value::Text(utf8(bytes)?.to_owned()),
                ValueKind::Bytes => Value::Bytes(bytes.to_vec()),
                _ => Value::Json(bytes.to_vec()),
            };
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg() -> TypeRegistry {
        TypeRegistry::new()
    }

    fn scan(codec: JsonCodec, format: FormatCode, src: &[u8]) -> Result<Value> {
        let reg = reg();
        let plan = codec.plan_scan(&reg, 0, format, &Value::Null).unwrap();
        let mut out = Value::Null;
        plan.scan(&reg, Some(src), &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_json_passthrough() {
        let v = scan(JsonCodec::json(), FormatCode::Binary, br#"{"a":1}"#).unwrap();
        assert_eq!(v, Value::Json(br#"{"a":1}"#.to_vec()));
    }

    #[test]
    fn test_jsonb_binary_version_prefix() {
        let reg = reg();
        let value = Value::Json(br#"{"a":1}"#.to_vec());
        let plan = JsonCodec::jsonb()
            .plan_encode(&reg, 0, FormatCode::Binary, &value)
            .unwrap();
        let mut buf = Vec::new();
        plan.encode(&reg, &value, &mut buf).unwrap();
        assert_eq!(buf[0], 1);
        assert_eq!(&buf[1..], br#"{"a":1}"#);
    }

    #[test]
    fn test_jsonb_binary_decode_strips_version() {
        let v = scan(JsonCodec::jsonb(), FormatCode::Binary, b"\x01{\"a\":1}").unwrap();
        assert_eq!(v, Value::Json(br#"{"a":1}"#.to_vec()));
    }

    #[test]
    fn test_jsonb_rejects_unknown_version() {
        let err = scan(JsonCodec::jsonb(), FormatCode::Binary, b"\x02{}").unwrap_err();
        assert!(err.to_string().contains("unknown jsonb version number 2"));
        assert!(scan(JsonCodec::jsonb(), FormatCode::Binary, b"").is_err());
    }

    #[test]
    fn test_jsonb_text_has_no_version_byte() {
        let v = scan(JsonCodec::jsonb(), FormatCode::Text, br#"{"a":1}"#).unwrap();
        assert_eq!(v, Value::Json(br#"{"a":1}"#.to_vec()));
    }

    #[test]
    fn test_scan_to_text_and_bytes() {
        let reg = reg();
        let plan = JsonCodec::json()
            .plan_scan(&reg, 0, FormatCode::Text, &Value::Text(String::new()))
            .unwrap();
        let mut out = Value::Text(String::new());
        plan.scan(&reg, Some(b"[1,2]"), &mut out).unwrap();
        assert_eq!(out, Value::Text("[1,2]".into()));
    }
}
