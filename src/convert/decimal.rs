//! Decimal type conversions (rust_decimal crate).
//!
//! Decoding builds the `Decimal` from the base-10000 digits; encoding
//! goes through [`Numeric`]'s text parser, which accepts the plain
//! decimal form `Decimal` renders.

use rust_decimal::Decimal;

use crate::codec::{decode_numeric_binary, encode_numeric_binary};
use crate::error::{Error, Result};
use crate::numeric::Numeric;
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};

use super::{FromWire, ToWire};

fn numeric_to_decimal(n: &Numeric) -> Result<Decimal> {
    let finite = match n {
        Numeric::Finite(f) => f,
        other => {
            return Err(Error::out_of_range(
                format!("{other:?}"),
                "Decimal",
            ));
        }
    };
    if finite.is_zero() {
        let mut zero = Decimal::ZERO;
        let _ = zero.set_scale(u32::from(finite.dscale).min(28));
        return Ok(zero);
    }

    let mut mantissa: i128 = 0;
    for &digit in &finite.digits {
        mantissa = mantissa
            .checked_mul(10_000)
            .and_then(|m| m.checked_add(digit as i128))
            .ok_or_else(|| Error::out_of_range("numeric", "Decimal"))?;
    }
    if finite.negative {
        mantissa = -mantissa;
    }

    let exponent = (finite.weight as i32 - finite.digits.len() as i32 + 1) * 4;
    let mut decimal = Decimal::try_from_i128_with_scale(mantissa, 0)
        .map_err(|e| Error::out_of_range(format!("numeric mantissa: {e}"), "Decimal"))?;
    if exponent > 0 {
        for _ in 0..exponent {
            decimal = decimal
                .checked_mul(Decimal::TEN)
                .ok_or_else(|| Error::out_of_range("numeric", "Decimal"))?;
        }
    } else if exponent < 0 {
        decimal
            .set_scale((-exponent) as u32)
            .map_err(|e| Error::out_of_range(format!("numeric scale: {e}"), "Decimal"))?;
    }

    // Surface the display scale PostgreSQL recorded.
    if finite.dscale > 0 && u32::from(finite.dscale) <= 28 {
        decimal.rescale(u32::from(finite.dscale));
    }
    Ok(decimal)
}

fn decimal_to_numeric(decimal: &Decimal) -> Result<Numeric> {
    Numeric::parse_text(&decimal.to_string())
}

impl FromWire<'_> for Decimal {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::NUMERIC {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "Decimal"));
        }
        let s = simdutf8::compat::from_utf8(bytes)
            .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))?;
        // The sentinels have no Decimal representation; the canonical
        // `<digits>e<exp>` form goes through the Numeric parser.
        numeric_to_decimal(&Numeric::parse_text(s)?)
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::NUMERIC {
            return Err(Error::no_scan_plan(oid, FormatCode::Binary, "Decimal"));
        }
        numeric_to_decimal(&decode_numeric_binary(bytes)?)
    }
}

impl ToWire for Decimal {
    fn natural_oid(&self) -> Oid {
        oid::NUMERIC
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::NUMERIC } else { oid };
        if oid != oid::NUMERIC {
            return Err(Error::no_encode_plan(oid, format, "Decimal"));
        }
        let numeric = decimal_to_numeric(self)?;
        match format {
            FormatCode::Binary => encode_numeric_binary(&numeric, buf),
            FormatCode::Text => buf.extend_from_slice(numeric.to_text_canonical().as_bytes()),
        }
        Ok(IsNull::No)
    }
}
