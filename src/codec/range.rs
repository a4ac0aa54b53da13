//! Range codec, parameterized by element type.
//!
//! Binary layout: one flag byte, then a length-prefixed payload for each
//! bounded side. Text layout: `empty`, or `[`/`(` lower `,` upper
//! `]`/`)` with a blank side meaning unbounded and double-quoted bounds
//! where the content requires it.

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::{FormatCode, Oid};
use crate::value::{BoundKind, RangeValue, Value, ValueKind};
use crate::wire;

use super::{Codec, encode_plan, scan_plan, utf8};

/// Range is empty.
const RANGE_EMPTY: u8 = 0x01;
/// Lower bound is inclusive.
const RANGE_LB_INC: u8 = 0x02;
/// Upper bound is inclusive.
const RANGE_UB_INC: u8 = 0x04;
/// Lower bound is -infinity (no payload).
const RANGE_LB_INF: u8 = 0x08;
/// Upper bound is +infinity (no payload).
const RANGE_UB_INF: u8 = 0x10;

/// Codec for a range type over one element type.
#[derive(Debug, Clone, Copy)]
pub struct RangeCodec {
    element_oid: Oid,
}

impl RangeCodec {
    /// Build a range codec over the given element OID. The registry
    /// guarantees the element is registered before this is reachable.
    pub fn new(element_oid: Oid) -> Self {
        RangeCodec { element_oid }
    }

    /// The element type OID.
    pub fn element_oid(&self) -> Oid {
        self.element_oid
    }
}

fn flags_of(range: &RangeValue) -> u8 {
    if range.is_empty() {
        return RANGE_EMPTY;
    }
    let mut flags = 0;
    match range.lower_kind {
        BoundKind::Inclusive => flags |= RANGE_LB_INC,
        BoundKind::Unbounded => flags |= RANGE_LB_INF,
        _ => {}
    }
    match range.upper_kind {
        BoundKind::Inclusive => flags |= RANGE_UB_INC,
        BoundKind::Unbounded => flags |= RANGE_UB_INF,
        _ => {}
    }
    flags
}

fn encode_range_binary(
    registry: &TypeRegistry,
    element_oid: Oid,
    range: &RangeValue,
    buf: &mut Vec<u8>,
) -> Result<()> {
    range.validate()?;
    wire::write_u8(buf, flags_of(range));
    for (value, bound) in [
        (&range.lower, "lower"),
        (&range.upper, "upper"),
    ] {
        if let Some(value) = value {
            let slot = wire::reserve_length_slot(buf);
            let is_null = registry
                .encode(element_oid, FormatCode::Binary, value, buf)
                .map_err(|e| Error::range_bound("encode", bound, e))?;
            if is_null.is_null() {
                return Err(Error::range_bound(
                    "encode",
                    bound,
                    Error::UnrepresentableNull,
                ));
            }
            wire::patch_length_slot(buf, slot, false);
        }
    }
    Ok(())
}

fn decode_range_binary(
    registry: &TypeRegistry,
    element_oid: Oid,
    bytes: &[u8],
) -> Result<RangeValue> {
    let (flags, mut rest) = wire::read_u8(bytes)?;

    if flags & RANGE_EMPTY != 0 {
        if flags != RANGE_EMPTY {
            return Err(Error::MalformedBinary(format!(
                "empty range combined with other flags: {flags:#04x}"
            )));
        }
        if !rest.is_empty() {
            return Err(Error::MalformedBinary(
                "empty range carries bound payload".into(),
            ));
        }
        return Ok(RangeValue::empty());
    }

    let mut read_side = |unbounded: bool, inclusive: bool, bound: &'static str| -> Result<(Option<Box<Value>>, BoundKind)> {
        if unbounded {
            return Ok((None, BoundKind::Unbounded));
        }
        let (payload, r) = wire::read_length_prefixed(rest)
            .map_err(|e| Error::range_bound("scan", bound, e))?;
        rest = r;
        let payload = payload.ok_or_else(|| {
            Error::range_bound("scan", bound, Error::UnrepresentableNull)
        })?;
        let value = registry
            .decode_value(element_oid, FormatCode::Binary, Some(payload))
            .map_err(|e| Error::range_bound("scan", bound, e))?;
        let kind = if inclusive {
            BoundKind::Inclusive
        } else {
            BoundKind::Exclusive
        };
        Ok((Some(Box::new(value)), kind))
    };

    let (lower, lower_kind) = read_side(
        flags & RANGE_LB_INF != 0,
        flags & RANGE_LB_INC != 0,
        "lower",
    )?;
    let (upper, upper_kind) = read_side(
        flags & RANGE_UB_INF != 0,
        flags & RANGE_UB_INC != 0,
        "upper",
    )?;

    if !rest.is_empty() {
        return Err(Error::MalformedBinary(format!(
            "{} trailing bytes after range bounds",
            rest.len()
        )));
    }

    let range = RangeValue {
        lower,
        upper,
        lower_kind,
        upper_kind,
    };
    range.validate()?;
    Ok(range)
}

fn bound_needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }
    s.bytes()
        .any(|b| matches!(b, b'(' | b')' | b'[' | b']' | b',' | b'"' | b'\\'))
}

fn push_quoted(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for &b in s.as_bytes() {
        if b == b'"' || b == b'\\' {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b'"');
}

fn encode_range_text(
    registry: &TypeRegistry,
    element_oid: Oid,
    range: &RangeValue,
    buf: &mut Vec<u8>,
) -> Result<()> {
    range.validate()?;
    if range.is_empty() {
        buf.extend_from_slice(b"empty");
        return Ok(());
    }

    buf.push(if range.lower_kind == BoundKind::Inclusive { b'[' } else { b'(' });
    let mut scratch = Vec::new();
    for (value, bound, separator) in [
        (&range.lower, "lower", b','),
        (
            &range.upper,
            "upper",
            if range.upper_kind == BoundKind::Inclusive { b']' } else { b')' },
        ),
    ] {
        if let Some(value) = value {
            scratch.clear();
            let is_null = registry
                .encode(element_oid, FormatCode::Text, value, &mut scratch)
                .map_err(|e| Error::range_bound("encode", bound, e))?;
            if is_null.is_null() {
                return Err(Error::range_bound(
                    "encode",
                    bound,
                    Error::UnrepresentableNull,
                ));
            }
            let text = utf8(&scratch).map_err(|e| Error::range_bound("encode", bound, e))?;
            if bound_needs_quoting(text) {
                push_quoted(buf, text);
            } else {
                buf.extend_from_slice(text.as_bytes());
            }
        }
        buf.push(separator);
    }
    Ok(())
}

/// Parse one text bound: blank (unbounded), quoted, or an unquoted run
/// up to the delimiter. Returns (token, rest including the delimiter).
fn parse_bound(s: &str) -> Result<(Option<String>, &str)> {
    let s = s.trim_start();
    let mut chars = s.chars();
    match chars.next() {
        Some(',') | Some(']') | Some(')') | None => Ok((None, s)),
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
                                "unterminated escape in range text".into(),
                            ));
                        }
                    },
                    Some('"') => {
                        if inner.as_str().starts_with('"') {
                            out.push('"');
                            inner.next();
                            rest = inner.as_str();
                        } else {
                            return Ok((Some(out), inner.as_str().trim_start()));
                        }
                    }
                    Some(c) => {
                        out.push(c);
                        rest = inner.as_str();
                    }
                    None => {
                        return Err(Error::MalformedText(
                            "unterminated quoted range bound".into(),
                        ));
                    }
                }
            }
        }
        Some(_) => {
            let end = memchr::memchr3(b',', b']', b')', s.as_bytes())
                .ok_or_else(|| Error::MalformedText("unterminated range text".into()))?;
            let (token, rest) = s.split_at(end);
            Ok((Some(token.trim_end().to_string()), rest))
        }
    }
}

fn decode_range_text(
    registry: &TypeRegistry,
    element_oid: Oid,
    s: &str,
) -> Result<RangeValue> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("empty") {
        return Ok(RangeValue::empty());
    }

    let mut chars = trimmed.chars();
    let lower_inclusive = match chars.next() {
        Some('[') => true,
        Some('(') => false,
        _ => {
            return Err(Error::MalformedText(format!(
                "range text must start with '[' or '(': {s:?}"
            )));
        }
    };

    let (lower_token, rest) = parse_bound(chars.as_str())?;
    let mut rest_chars = rest.chars();
    if rest_chars.next() != Some(',') {
        return Err(Error::MalformedText(format!(
            "range text is missing the bound separator: {s:?}"
        )));
    }

    let (upper_token, rest) = parse_bound(rest_chars.as_str())?;
    let mut rest_chars = rest.chars();
    let upper_inclusive = match rest_chars.next() {
        Some(']') => true,
        Some(')') => false,
        _ => {
            return Err(Error::MalformedText(format!(
                "range text must end with ']' or ')': {s:?}"
            )));
        }
    };
    if !rest_chars.as_str().trim().is_empty() {
        return Err(Error::MalformedText(format!(
            "trailing characters after range: \"{}\"",
            rest_chars.as_str()
        )));
    }

    let mut decode_side = |token: Option<String>,
                           inclusive: bool,
                           bound: &'static str|
     -> Result<(Option<Box<Value>>, BoundKind)> {
        match token {
            None => Ok((None, BoundKind::Unbounded)),
            Some(token) => {
                let value = registry
                    .decode_value(element_oid, FormatCode::Text, Some(token.as_bytes()))
                    .map_err(|e| Error::range_bound("scan", bound, e))?;
                let kind = if inclusive {
                    BoundKind::Inclusive
                } else {
                    BoundKind::Exclusive
                };
                Ok((Some(Box::new(value)), kind))
            }
        }
    };

    let (lower, lower_kind) = decode_side(lower_token, lower_inclusive, "lower")?;
    let (upper, upper_kind) = decode_side(upper_token, upper_inclusive, "upper")?;

    Ok(RangeValue {
        lower,
        upper,
        lower_kind,
        upper_kind,
    })
}

impl Codec for RangeCodec {
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
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Range) {
            return None;
        }
        let element_oid = self.element_oid;
        encode_plan(move |reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let range = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Range(r) => r,
                other => return Err(Error::out_of_range(other.kind_name(), "range")),
            };
            match format {
                FormatCode::Binary => encode_range_binary(reg, element_oid, range, buf)?,
                FormatCode::Text => encode_range_text(reg, element_oid, range, buf)?,
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
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Range) {
            return None;
        }
        let element_oid = self.element_oid;
        scan_plan(move |reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let range = match format {
                FormatCode::Binary => decode_range_binary(reg, element_oid, bytes)?,
                FormatCode::Text => decode_range_text(reg, element_oid, utf8(bytes)?)?,
            };
            *out = Value::Range(range);
            Ok(())
        })
    }
}
