//! Composite (row) codec.
//!
//! Binary layout: i32 field count, then per field a u32 type OID, an i32
//! length (-1 for NULL), and the field payload. Text layout: `(...)`
//! with comma-separated fields, an empty token for NULL, and
//! double-quoted fields where the content requires it.
//!
//! [`CompositeCodec`] is parameterized by declared fields and converts in
//! both directions; [`RecordCodec`] handles the `record` pseudo-type,
//! decoding any composite payload by the OIDs it carries (binary only —
//! the text form does not name its field types).

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::{FormatCode, Oid};
use crate::value::{RecordValue, Value, ValueKind};
use crate::wire;

use super::{Codec, encode_plan, scan_plan, utf8};

/// One declared field of a composite type.
#[derive(Debug, Clone)]
pub struct CompositeField {
    name: String,
    oid: Oid,
}

impl CompositeField {
    /// Build a field descriptor.
    pub fn new(name: impl Into<String>, oid: Oid) -> Self {
        CompositeField {
            name: name.into(),
            oid,
        }
    }

    /// The field name. Names are informational here; scanning is
    /// positional, and mapping by name is a caller concern.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field type OID.
    pub fn oid(&self) -> Oid {
        self.oid
    }
}

/// Codec for a composite type with declared fields.
#[derive(Debug, Clone)]
pub struct CompositeCodec {
    fields: Vec<CompositeField>,
}

impl CompositeCodec {
    /// Build a composite codec over the declared fields.
    pub fn new(fields: Vec<CompositeField>) -> Self {
        CompositeCodec { fields }
    }

    /// The declared fields in order.
    pub fn fields(&self) -> &[CompositeField] {
        &self.fields
    }
}

fn encode_composite_binary(
    registry: &TypeRegistry,
    fields: &[CompositeField],
    record: &RecordValue,
    buf: &mut Vec<u8>,
) -> Result<()> {
    if record.fields.len() != fields.len() {
        return Err(Error::MalformedBinary(format!(
            "composite value has {} fields but the type declares {}",
            record.fields.len(),
            fields.len()
        )));
    }
    wire::write_i32(buf, fields.len() as i32);
    for (i, (field, value)) in fields.iter().zip(&record.fields).enumerate() {
        wire::write_u32(buf, field.oid());
        let slot = wire::reserve_length_slot(buf);
        let is_null = registry
            .encode(field.oid(), FormatCode::Binary, value, buf)
            .map_err(|e| Error::composite_field("encode", i, e))?;
        wire::patch_length_slot(buf, slot, is_null.is_null());
    }
    Ok(())
}

fn decode_composite_binary(
    registry: &TypeRegistry,
    fields: &[CompositeField],
    bytes: &[u8],
) -> Result<RecordValue> {
    let (count, mut rest) = wire::read_i32(bytes)?;
    if count as usize != fields.len() {
        return Err(Error::MalformedBinary(format!(
            "composite payload has {count} fields but the type declares {}",
            fields.len()
        )));
    }
    let mut out = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let (payload_oid, r) = wire::read_u32(rest)?;
        if payload_oid != field.oid() {
            return Err(Error::MalformedBinary(format!(
                "composite field {i} has oid {payload_oid}, expected {}",
                field.oid()
            )));
        }
        let (payload, r) = wire::read_length_prefixed(r)
            .map_err(|e| Error::composite_field("scan", i, e))?;
        rest = r;
        let value = registry
            .decode_value(field.oid(), FormatCode::Binary, payload)
            .map_err(|e| Error::composite_field("scan", i, e))?;
        out.push(value);
    }
    if !rest.is_empty() {
        return Err(Error::MalformedBinary(format!(
            "{} trailing bytes after composite fields",
            rest.len()
        )));
    }
    Ok(RecordValue { fields: out })
}

/// Quote a field iff the raw text would be ambiguous.
fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }
    s.bytes()
        .any(|b| matches!(b, b'(' | b')' | b',' | b'"' | b'\\'))
}

fn push_quoted(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for &b in s.as_bytes() {
        match b {
            b'"' => out.extend_from_slice(b"\"\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            _ => out.push(b),
        }
    }
    out.push(b'"');
}

fn encode_composite_text(
    registry: &TypeRegistry,
    fields: &[CompositeField],
    record: &RecordValue,
    buf: &mut Vec<u8>,
) -> Result<()> {
    if record.fields.len() != fields.len() {
        return Err(Error::MalformedText(format!(
            "composite value has {} fields but the type declares {}",
            record.fields.len(),
            fields.len()
        )));
    }
    buf.push(b'(');
    let mut scratch = Vec::new();
    for (i, (field, value)) in fields.iter().zip(&record.fields).enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        if value.is_null() {
            continue; // the empty token is NULL
        }
        scratch.clear();
        registry
            .encode(field.oid(), FormatCode::Text, value, &mut scratch)
            .map_err(|e| Error::composite_field("encode", i, e))?;
        let text = utf8(&scratch).map_err(|e| Error::composite_field("encode", i, e))?;
        if needs_quoting(text) {
            push_quoted(buf, text);
        } else {
            buf.extend_from_slice(text.as_bytes());
        }
    }
    buf.push(b')');
    Ok(())
}

/// Parse composite text into raw field tokens (None = NULL).
///
/// Three cases per field position: the empty token (NULL), a
/// double-quoted span with `""`- and `\`-escapes, or an unquoted run up
/// to the next `,` or `)`. The terminal `)` is required.
pub(crate) fn parse_composite_text(s: &str) -> Result<Vec<Option<String>>> {
    let mut chars = s.chars();
    if chars.next() != Some('(') {
        return Err(Error::MalformedText(
            "composite text must start with '('".into(),
        ));
    }

    let mut fields = Vec::new();
    let mut rest = chars.as_str();
    loop {
        // One field, ended by ',' or the terminal ')'.
        let (token, r) = parse_field(rest)?;
        fields.push(token);
        rest = r;
        let mut chars = rest.chars();
        match chars.next() {
            Some(',') => {
                rest = chars.as_str();
            }
            Some(')') => {
                if !chars.as_str().is_empty() {
                    return Err(Error::MalformedText(format!(
                        "trailing characters after composite: \"{}\"",
                        chars.as_str()
                    )));
                }
                return Ok(fields);
            }
            _ => {
                return Err(Error::MalformedText(
                    "composite text is missing the terminal ')'".into(),
                ));
            }
        }
    }
}

fn parse_field(s: &str) -> Result<(Option<String>, &str)> {
    let mut chars = s.chars();
    match chars.next() {
        Some(',') | Some(')') => Ok((None, s)), // empty token = NULL
        Some('"') => {
            let mut out = String::new();
            let mut rest = chars.as_str();
            loop {
                let mut inner = rest.chars();
                match inner.next() {
                    Some('\\') => match inner.next() {
                        Some(c) => {
                            out.push(c);
                            rest = inner.as_str();
                        }
                        None => {
                            return Err(Error::MalformedText(
                                "unterminated escape in composite text".into(),
                            ));
                        }
                    },
                    Some('"') => {
                        if inner.as_str().starts_with('"') {
                            out.push('"');
                            inner.next();
                            rest = inner.as_str();
                        } else {
                            return Ok((Some(out), inner.as_str()));
                        }
                    }
                    Some(c) => {
                        out.push(c);
                        rest = inner.as_str();
                    }
                    None => {
                        return Err(Error::MalformedText(
                            "unterminated quoted composite field".into(),
                        ));
                    }
                }
            }
        }
        Some(_) => {
            let end = memchr::memchr2(b',', b')', s.as_bytes()).ok_or_else(|| {
                Error::MalformedText("composite text is missing the terminal ')'".into())
            })?;
            let (token, rest) = s.split_at(end);
            if token.contains(['(', '"', '\\']) {
                return Err(Error::MalformedText(format!(
                    "unquoted composite field contains structural character: {token:?}"
                )));
            }
            Ok((Some(token.to_string()), rest))
        }
        None => Err(Error::MalformedText(
            "composite text is missing the terminal ')'".into(),
        )),
    }
}

fn decode_composite_text(
    registry: &TypeRegistry,
    fields: &[CompositeField],
    s: &str,
) -> Result<RecordValue> {
    let tokens = parse_composite_text(s)?;
    if tokens.len() != fields.len() {
        return Err(Error::MalformedText(format!(
            "composite text has {} fields but the type declares {}",
            tokens.len(),
            fields.len()
        )));
    }
    let mut out = Vec::with_capacity(fields.len());
    for (i, (field, token)) in fields.iter().zip(&tokens).enumerate() {
        let value = registry
            .decode_value(
                field.oid(),
                FormatCode::Text,
                token.as_deref().map(str::as_bytes),
            )
            .map_err(|e| Error::composite_field("scan", i, e))?;
        out.push(value);
    }
    Ok(RecordValue { fields: out })
}

impl Codec for CompositeCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Binary
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Record) {
            return None;
        }
        let fields = self.fields.clone();
        encode_plan(move |reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let record = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Record(r) => r,
                other => return Err(Error::out_of_range(other.kind_name(), "composite")),
            };
            match format {
                FormatCode::Binary => encode_composite_binary(reg, &fields, record, buf)?,
                FormatCode::Text => encode_composite_text(reg, &fields, record, buf)?,
            }
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
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Record) {
            return None;
        }
        let fields = self.fields.clone();
        scan_plan(move |reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let record = match format {
                FormatCode::Binary => decode_composite_binary(reg, &fields, bytes)?,
                FormatCode::Text => decode_composite_text(reg, &fields, utf8(bytes)?)?,
            };
            *out = Value::Record(record);
            Ok(())
        })
    }
}

/// Codec for the `record` pseudo-type: decode-only, binary-only, driven
/// by the field OIDs the payload carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCodec;

fn decode_record_binary(registry: &TypeRegistry, bytes: &[u8]) -> Result<RecordValue> {
    let (count, mut rest) = wire::read_i32(bytes)?;
    if count < 0 {
        return Err(Error::MalformedBinary(format!(
            "negative record field count {count}"
        )));
    }
    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count {
        let (field_oid, r) = wire::read_u32(rest)?;
        let (payload, r) = wire::read_length_prefixed(r)
            .map_err(|e| Error::composite_field("scan", i as usize, e))?;
        rest = r;
        let value = registry
            .decode_value(field_oid, FormatCode::Binary, payload)
            .map_err(|e| Error::composite_field("scan", i as usize, e))?;
        out.push(value);
    }
    if !rest.is_empty() {
        return Err(Error::MalformedBinary(format!(
            "{} trailing bytes after record fields",
            rest.len()
        )));
    }
    Ok(RecordValue { fields: out })
}

impl Codec for RecordCodec {
    fn format_supported(&self, format: FormatCode) -> bool {
        format == FormatCode::Binary
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Binary
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        _format: FormatCode,
        _value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        // The record pseudo-type cannot be encoded: the server refuses
        // anonymous record parameters.
        None
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        if format != FormatCode::Binary {
            return None;
        }
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Record) {
            return None;
        }
        scan_plan(|reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            *out = Value::Record(decode_record_binary(reg, bytes)?);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::oid;

    fn reg() -> TypeRegistry {
        TypeRegistry::with_builtins()
    }

    fn text_int_fields() -> Vec<CompositeField> {
        vec![
            CompositeField::new("label", oid::TEXT),
            CompositeField::new("count", oid::INT4),
        ]
    }

    #[test]
    fn test_binary_encode_layout() {
        let reg = reg();
        let record = RecordValue {
            fields: vec![Value::Text("hi".into()), Value::Int4(42)],
        };
        let mut buf = Vec::new();
        encode_composite_binary(&reg, &text_int_fields(), &record, &mut buf).unwrap();

        let mut expected = Vec::new();
        wire::write_i32(&mut expected, 2);
        wire::write_u32(&mut expected, oid::TEXT);
        wire::write_i32(&mut expected, 2);
        expected.extend_from_slice(b"hi");
        wire::write_u32(&mut expected, oid::INT4);
        wire::write_i32(&mut expected, 4);
        wire::write_i32(&mut expected, 42);
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_binary_roundtrip() {
        let reg = reg();
        let record = RecordValue {
            fields: vec![Value::Text("hi".into()), Value::Int4(42)],
        };
        let mut buf = Vec::new();
        encode_composite_binary(&reg, &text_int_fields(), &record, &mut buf).unwrap();
        let decoded = decode_composite_binary(&reg, &text_int_fields(), &buf).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_binary_null_field() {
        let reg = reg();
        let record = RecordValue {
            fields: vec![Value::Null, Value::Int4(1)],
        };
        let mut buf = Vec::new();
        encode_composite_binary(&reg, &text_int_fields(), &record, &mut buf).unwrap();
        let decoded = decode_composite_binary(&reg, &text_int_fields(), &buf).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_binary_field_count_mismatch() {
        let reg = reg();
        let record = RecordValue {
            fields: vec![Value::Int4(1)],
        };
        let mut buf = Vec::new();
        assert!(encode_composite_binary(&reg, &text_int_fields(), &record, &mut buf).is_err());
    }

    #[test]
    fn test_binary_oid_mismatch_rejected() {
        let reg = reg();
        let mut buf = Vec::new();
        wire::write_i32(&mut buf, 2);
        wire::write_u32(&mut buf, oid::INT8); // wrong: declared TEXT
        wire::write_i32(&mut buf, -1);
        wire::write_u32(&mut buf, oid::INT4);
        wire::write_i32(&mut buf, -1);
        assert!(decode_composite_binary(&reg, &text_int_fields(), &buf).is_err());
    }

    #[test]
    fn test_text_encode() {
        let reg = reg();
        let record = RecordValue {
            fields: vec![Value::Text("hi".into()), Value::Int4(42)],
        };
        let mut buf = Vec::new();
        encode_composite_text(&reg, &text_int_fields(), &record, &mut buf).unwrap();
        assert_eq!(buf, b"(hi,42)");
    }

    #[test]
    fn test_text_null_is_empty_token() {
        let reg = reg();
        let record = RecordValue {
            fields: vec![Value::Null, Value::Null],
        };
        let mut buf = Vec::new();
        encode_composite_text(&reg, &text_int_fields(), &record, &mut buf).unwrap();
        assert_eq!(buf, b"(,)");

        let decoded = decode_composite_text(&reg, &text_int_fields(), "(,)").unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_text_quoting_roundtrip() {
        let reg = reg();
        let record = RecordValue {
            fields: vec![Value::Text("a \"b\\c,(d)".into()), Value::Int4(-1)],
        };
        let mut buf = Vec::new();
        encode_composite_text(&reg, &text_int_fields(), &record, &mut buf).unwrap();
        let decoded =
            decode_composite_text(&reg, &text_int_fields(), std::str::from_utf8(&buf).unwrap())
                .unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_text_missing_terminator_rejected() {
        let reg = reg();
        assert!(decode_composite_text(&reg, &text_int_fields(), "(hi,42").is_err());
        assert!(decode_composite_text(&reg, &text_int_fields(), "(hi,42)x").is_err());
    }

    #[test]
    fn test_positional_order_preserved() {
        let reg = reg();
        let fields = vec![
            CompositeField::new("a", oid::INT4),
            CompositeField::new("b", oid::INT4),
            CompositeField::new("c", oid::INT4),
        ];
        let record = RecordValue {
            fields: vec![Value::Int4(1), Value::Int4(2), Value::Int4(3)],
        };
        let mut buf = Vec::new();
        encode_composite_binary(&reg, &fields, &record, &mut buf).unwrap();
        let decoded = decode_composite_binary(&reg, &fields, &buf).unwrap();
        assert_eq!(decoded.fields, record.fields);
    }

    #[test]
    fn test_record_codec_decodes_by_payload_oids() {
        let reg = reg();
        let record = RecordValue {
            fields: vec![Value::Text("hi".into()), Value::Int4(42)],
        };
        let mut buf = Vec::new();
        encode_composite_binary(&reg, &text_int_fields(), &record, &mut buf).unwrap();
        let decoded = decode_record_binary(&reg, &buf).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_record_codec_is_binary_decode_only() {
        let reg = reg();
        assert!(RecordCodec
            .plan_scan(&reg, oid::RECORD, FormatCode::Text, &Value::Null)
            .is_none());
        assert!(RecordCodec
            .plan_encode(&reg, oid::RECORD, FormatCode::Binary, &Value::Record(RecordValue::default()))
            .is_none());
    }

    #[test]
    fn test_field_error_is_contextual() {
        let reg = reg();
        let err =
            decode_composite_text(&reg, &text_int_fields(), "(hi,abc)").unwrap_err();
        assert!(err.to_string().contains("composite field 1"));
    }
}
