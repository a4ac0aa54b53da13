//! NUMERIC wire codec.
//!
//! Binary layout: four i16 header words (ndigits, weight, sign, dscale)
//! followed by ndigits base-10000 digits. The sentinel signs (NaN and the
//! infinities) are headers with zero digits.

use crate::error::{Error, Result};
use crate::numeric::{
    FiniteNumeric, Numeric, SIGN_NAN, SIGN_NEG, SIGN_NINF, SIGN_PINF, SIGN_POS,
};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::FormatCode;
use crate::value::{Value, ValueKind};
use crate::wire;

use super::{Codec, coerce_into, encode_plan, scan_plan, utf8};

/// Codec for `numeric`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericCodec;

/// Decode the binary header and digits.
pub(crate) fn decode_numeric_binary(bytes: &[u8]) -> Result<Numeric> {
    let (ndigits, rest) = wire::read_i16(bytes)?;
    let (weight, rest) = wire::read_i16(rest)?;
    let (sign, rest) = wire::read_i16(rest)?;
    let (dscale, mut rest) = wire::read_i16(rest)?;
    let sign = sign as u16;

    match sign {
        SIGN_NAN => return Ok(Numeric::NaN),
        SIGN_PINF => return Ok(Numeric::Infinity),
        SIGN_NINF => return Ok(Numeric::NegInfinity),
        SIGN_POS | SIGN_NEG => {}
        other => {
            return Err(Error::MalformedBinary(format!(
                "unknown numeric sign word {other:#06x}"
            )));
        }
    }

    if ndigits < 0 {
        return Err(Error::MalformedBinary(format!(
            "negative numeric digit count {ndigits}"
        )));
    }
    if dscale < 0 {
        return Err(Error::MalformedBinary(format!(
            "negative numeric dscale {dscale}"
        )));
    }

    let mut digits = Vec::with_capacity(ndigits as usize);
    for _ in 0..ndigits {
        let (digit, r) = wire::read_i16(rest)?;
        if !(0..=9999).contains(&digit) {
            return Err(Error::MalformedBinary(format!(
                "numeric digit {digit} outside base 10000"
            )));
        }
        digits.push(digit);
        rest = r;
    }
    if !rest.is_empty() {
        return Err(Error::MalformedBinary(
            "trailing bytes after numeric digits".into(),
        ));
    }

    let mut n = FiniteNumeric {
        negative: sign == SIGN_NEG,
        weight,
        dscale: dscale as u16,
        digits,
    };
    n.normalize();
    Ok(Numeric::Finite(n))
}

/// Encode the binary header and digits.
pub(crate) fn encode_numeric_binary(n: &Numeric, buf: &mut Vec<u8>) {
    let (sign, finite) = match n {
        Numeric::NaN => (SIGN_NAN, None),
        Numeric::Infinity => (SIGN_PINF, None),
        Numeric::NegInfinity => (SIGN_NINF, None),
        Numeric::Finite(f) => (if f.negative { SIGN_NEG } else { SIGN_POS }, Some(f)),
    };
    match finite {
        None => {
            wire::write_i16(buf, 0);
            wire::write_i16(buf, 0);
            wire::write_u16(buf, sign);
            wire::write_i16(buf, 0);
        }
        Some(f) => {
            wire::write_i16(buf, f.digits.len() as i16);
            wire::write_i16(buf, f.weight);
            wire::write_u16(buf, sign);
            wire::write_i16(buf, f.dscale as i16);
            for &d in &f.digits {
                wire::write_i16(buf, d);
            }
        }
    }
}

fn numeric_from_value(value: &Value) -> Result<Numeric> {
    match value {
        Value::Numeric(n) => Ok(n.clone()),
        Value::Int2(v) => Ok(Numeric::from_i64(*v as i64)),
        Value::Int4(v) => Ok(Numeric::from_i64(*v as i64)),
        Value::Int8(v) => Ok(Numeric::from_i64(*v)),
        other => Err(Error::out_of_range(other.kind_name(), "numeric")),
    }
}

impl Codec for NumericCodec {
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
                | ValueKind::Numeric
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
            let n = numeric_from_value(value)?;
            match format {
                FormatCode::Binary => encode_numeric_binary(&n, buf),
                FormatCode::Text => {
                    buf.extend_from_slice(n.to_text_canonical().as_bytes());
                }
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
                | ValueKind::Numeric
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
            let n = match format {
                FormatCode::Binary => decode_numeric_binary(bytes)?,
                FormatCode::Text => Numeric::parse_text(utf8(bytes)?)?,
            };
            *out = coerce_into(kind, Value::Numeric(n))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to build NUMERIC binary representation
    fn make_numeric(ndigits: i16, weight: i16, sign: u16, dscale: u16, digits: &[i16]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&ndigits.to_be_bytes());
        buf.extend_from_slice(&weight.to_be_bytes());
        buf.extend_from_slice(&sign.to_be_bytes());
        buf.extend_from_slice(&dscale.to_be_bytes());
        for &d in digits {
            buf.extend_from_slice(&d.to_be_bytes());
        }
        buf
    }

    #[test]
    fn test_decode_simple() {
        // 12345 = 1 * 10000 + 2345, weight=1
        let bytes = make_numeric(2, 1, SIGN_POS, 0, &[1, 2345]);
        let n = decode_numeric_binary(&bytes).unwrap();
        assert_eq!(n.to_display_string(), "12345");
    }

    #[test]
    fn test_decode_decimal() {
        // 123.45: weight=0, dscale=2, digits=[123, 4500]
        let bytes = make_numeric(2, 0, SIGN_POS, 2, &[123, 4500]);
        let n = decode_numeric_binary(&bytes).unwrap();
        assert_eq!(n.to_display_string(), "123.45");
    }

    #[test]
    fn test_decode_negative() {
        let bytes = make_numeric(2, 0, SIGN_NEG, 2, &[123, 4500]);
        let n = decode_numeric_binary(&bytes).unwrap();
        assert_eq!(n.to_display_string(), "-123.45");
    }

    #[test]
    fn test_decode_sentinels() {
        assert_eq!(
            decode_numeric_binary(&make_numeric(0, 0, SIGN_NAN, 0, &[])).unwrap(),
            Numeric::NaN
        );
        assert_eq!(
            decode_numeric_binary(&make_numeric(0, 0, SIGN_PINF, 0, &[])).unwrap(),
            Numeric::Infinity
        );
        assert_eq!(
            decode_numeric_binary(&make_numeric(0, 0, SIGN_NINF, 0, &[])).unwrap(),
            Numeric::NegInfinity
        );
    }

    #[test]
    fn test_decode_rejects_bad_sign() {
        assert!(decode_numeric_binary(&make_numeric(0, 0, 0x1234, 0, &[])).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_digit() {
        assert!(decode_numeric_binary(&make_numeric(1, 0, SIGN_POS, 0, &[10000])).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let bytes = make_numeric(3, 0, SIGN_POS, 0, &[1, 2]);
        assert!(decode_numeric_binary(&bytes).is_err());
    }

    #[test]
    fn test_encode_pi_header() {
        let n = Numeric::parse_text("3.14159").unwrap();
        let mut buf = Vec::new();
        encode_numeric_binary(&n, &mut buf);
        // ndigits=3, weight=0, sign=positive, dscale=5, digits 3|1415|9000
        assert_eq!(buf, make_numeric(3, 0, SIGN_POS, 5, &[3, 1415, 9000]));
    }

    #[test]
    fn test_binary_roundtrip_digit_equal() {
        for s in ["0", "3.14159", "-123.45", "0.0001", "12345", "1.50", "99999999.99999999"] {
            let n = Numeric::parse_text(s).unwrap();
            let mut buf = Vec::new();
            encode_numeric_binary(&n, &mut buf);
            let back = decode_numeric_binary(&buf).unwrap();
            assert_eq!(back, n, "roundtrip of {s}");
            assert_eq!(back.to_display_string(), s, "display of {s}");
        }
    }

    #[test]
    fn test_sentinel_roundtrip() {
        for n in [Numeric::NaN, Numeric::Infinity, Numeric::NegInfinity] {
            let mut buf = Vec::new();
            encode_numeric_binary(&n, &mut buf);
            assert_eq!(buf.len(), 8);
            assert_eq!(decode_numeric_binary(&buf).unwrap(), n);
        }
    }

    #[test]
    fn test_dscale_pad_on_decode() {
        // dscale 4 with a single digit group covering only 10^0.
        let bytes = make_numeric(1, 0, SIGN_POS, 4, &[7]);
        let n = decode_numeric_binary(&bytes).unwrap();
        assert_eq!(n.to_display_string(), "7.0000");
    }
}
