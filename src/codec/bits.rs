//! Bit string codec: bit and varbit.
//!
//! Binary layout: i32 bit count followed by the packed bits, most
//! significant first. Text is a run of '0'/'1' characters.

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::FormatCode;
use crate::value::{BitString, Value, ValueKind};
use crate::wire;

use super::{Codec, encode_plan, scan_plan, utf8};

/// Codec for `bit` and `varbit`.
///
/// The wire payload does not carry the declared `bit(N)` width; callers
/// scanning into a fixed-width target apply [`BitString::expect_len`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BitsCodec;

fn decode_bits_binary(bytes: &[u8]) -> Result<BitString> {
    let (bit_len, rest) = wire::read_i32(bytes)?;
    if bit_len < 0 {
        return Err(Error::MalformedBinary(format!(
            "negative bit length {bit_len}"
        )));
    }
    let bit_len = bit_len as usize;
    let expected = bit_len.div_ceil(8);
    if rest.len() != expected {
        return Err(Error::length("bit", rest.len(), expected));
    }
    BitString::new(bit_len, rest.to_vec())
}

fn parse_bits_text(s: &str) -> Result<BitString> {
    let mut bytes = vec![0u8; s.len().div_ceil(8)];
    for (i, c) in s.bytes().enumerate() {
        match c {
            b'1' => bytes[i / 8] |= 0x80 >> (i % 8),
            b'0' => {}
            _ => {
                return Err(Error::MalformedText(format!(
                    "invalid bit string character {:?}",
                    c as char
                )));
            }
        }
    }
    BitString::new(s.len(), bytes)
}

fn format_bits_text(bits: &BitString, buf: &mut Vec<u8>) {
    for i in 0..bits.bit_len {
        buf.push(if bits.get(i) == Some(true) { b'1' } else { b'0' });
    }
}

impl Codec for BitsCodec {
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
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Bits) {
            return None;
        }
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let bits = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Bits(b) => b,
                other => return Err(Error::out_of_range(other.kind_name(), "bit")),
            };
            match format {
                FormatCode::Binary => {
                    wire::write_i32(buf, bits.bit_len as i32);
                    buf.extend_from_slice(&bits.bytes);
                }
                FormatCode::Text => format_bits_text(bits, buf),
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
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Bits) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let bits = match format {
                FormatCode::Binary => decode_bits_binary(bytes)?,
                FormatCode::Text => parse_bits_text(utf8(bytes)?)?,
            };
            *out = Value::Bits(bits);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_binary_roundtrip() {
        let bits = BitString::new(10, vec![0b1010_1010, 0b1100_0000]).unwrap();
        let mut buf = Vec::new();
        wire::write_i32(&mut buf, 10);
        buf.extend_from_slice(&bits.bytes);
        assert_eq!(decode_bits_binary(&buf).unwrap(), bits);
    }

    #[test]
    fn test_bits_text_roundtrip() {
        let bits = parse_bits_text("1010101011").unwrap();
        assert_eq!(bits.bit_len, 10);
        let mut buf = Vec::new();
        format_bits_text(&bits, &mut buf);
        assert_eq!(buf, b"1010101011");
    }

    #[test]
    fn test_bits_text_rejects_other_chars() {
        assert!(parse_bits_text("10x1").is_err());
    }

    #[test]
    fn test_bits_binary_length_check() {
        let mut buf = Vec::new();
        wire::write_i32(&mut buf, 10);
        buf.push(0xFF); // needs two bytes for ten bits
        assert!(decode_bits_binary(&buf).is_err());
    }
}
