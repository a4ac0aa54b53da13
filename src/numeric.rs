//! Arbitrary-precision NUMERIC value type.
//!
//! PostgreSQL stores numerics as base-10000 digits with a weight (the
//! power of 10000 of the first digit), a sign word, and a display scale.
//! This module owns that representation and its text grammar; the wire
//! codec in `codec::numeric` reads and writes the binary header around it.
//!
//! Based on PostgreSQL's `numeric.c`:
//! <https://github.com/postgres/postgres/blob/master/src/backend/utils/adt/numeric.c>

use crate::error::{Error, Result};

/// Sign word: positive.
pub const SIGN_POS: u16 = 0x0000;
/// Sign word: negative.
pub const SIGN_NEG: u16 = 0x4000;
/// Sign word: NaN sentinel.
pub const SIGN_NAN: u16 = 0xC000;
/// Sign word: +Infinity sentinel.
pub const SIGN_PINF: u16 = 0xD000;
/// Sign word: -Infinity sentinel.
pub const SIGN_NINF: u16 = 0xF000;

/// Number base of one stored digit.
const NBASE: i32 = 10_000;
/// Decimal digits per stored digit.
const DEC_DIGITS: i32 = 4;

/// A finite numeric in base-10000 normal form.
///
/// Normal form: no leading or trailing zero digit groups; zero is the
/// empty digit vector with weight 0. `dscale` is carried verbatim so a
/// round-trip preserves the displayed precision (`1.50` keeps two
/// fractional digits).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FiniteNumeric {
    /// True for values below zero.
    pub negative: bool,
    /// Power of 10000 of `digits[0]`.
    pub weight: i16,
    /// Number of fractional decimal digits to display.
    pub dscale: u16,
    /// Base-10000 digits, most significant first, each in [0, 9999].
    pub digits: Vec<i16>,
}

/// An arbitrary-precision decimal, including the three sentinel values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Numeric {
    /// A finite value.
    Finite(FiniteNumeric),
    /// Not-a-number.
    NaN,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    NegInfinity,
}

impl Default for Numeric {
    fn default() -> Self {
        Numeric::Finite(FiniteNumeric::default())
    }
}

impl FiniteNumeric {
    /// True for the value zero.
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Drop leading and trailing zero digit groups, fixing up the weight.
    pub(crate) fn normalize(&mut self) {
        let leading = self.digits.iter().take_while(|&&d| d == 0).count();
        if leading > 0 {
            self.digits.drain(..leading);
            self.weight -= leading as i16;
        }
        while self.digits.last() == Some(&0) {
            self.digits.pop();
        }
        if self.digits.is_empty() {
            self.weight = 0;
            self.negative = false;
        }
    }
}

impl Numeric {
    /// Build a numeric from an integer.
    pub fn from_i64(v: i64) -> Self {
        let negative = v < 0;
        let mut abs = v.unsigned_abs();
        let mut digits_rev: Vec<i16> = Vec::new();
        while abs > 0 {
            digits_rev.push((abs % NBASE as u64) as i16);
            abs /= NBASE as u64;
        }
        let weight = digits_rev.len().saturating_sub(1) as i16;
        let mut digits: Vec<i16> = digits_rev.into_iter().rev().collect();
        while digits.last() == Some(&0) {
            digits.pop();
        }
        let mut n = FiniteNumeric {
            negative,
            weight,
            dscale: 0,
            digits,
        };
        n.normalize();
        Numeric::Finite(n)
    }

    /// Convert to i64, rejecting non-integers and out-of-range values.
    pub fn to_i64(&self) -> Result<i64> {
        let n = match self {
            Numeric::Finite(n) => n,
            other => {
                return Err(Error::out_of_range(other.sign_str(), "i64"));
            }
        };
        let mut acc: i128 = 0;
        for (i, &d) in n.digits.iter().enumerate() {
            let power = n.weight as i32 - i as i32;
            if power < 0 {
                // Digits below 10000^0 carry a fractional part.
                return Err(Error::out_of_range("non-integer numeric", "i64"));
            }
            acc = acc
                .checked_mul(NBASE as i128)
                .and_then(|a| a.checked_add(d as i128))
                .ok_or_else(|| Error::out_of_range("numeric", "i64"))?;
        }
        // Account for trailing powers of 10000 beyond the stored digits.
        let stored_max_power = n.weight as i32 - n.digits.len() as i32 + 1;
        if !n.digits.is_empty() {
            for _ in 0..stored_max_power.max(0) {
                acc = acc
                    .checked_mul(NBASE as i128)
                    .ok_or_else(|| Error::out_of_range("numeric", "i64"))?;
            }
        }
        if n.negative {
            acc = -acc;
        }
        i64::try_from(acc).map_err(|_| Error::out_of_range("numeric", "i64"))
    }

    /// Approximate conversion to f64 (lossy; sentinels map to the IEEE
    /// specials).
    pub fn to_f64(&self) -> f64 {
        match self {
            Numeric::NaN => f64::NAN,
            Numeric::Infinity => f64::INFINITY,
            Numeric::NegInfinity => f64::NEG_INFINITY,
            Numeric::Finite(n) => {
                let mut acc = 0.0_f64;
                for (i, &d) in n.digits.iter().enumerate() {
                    let power = n.weight as i32 - i as i32;
                    acc += d as f64 * 10000_f64.powi(power);
                }
                if n.negative { -acc } else { acc }
            }
        }
    }

    fn sign_str(&self) -> &'static str {
        match self {
            Numeric::NaN => "NaN",
            Numeric::Infinity => "Infinity",
            Numeric::NegInfinity => "-Infinity",
            Numeric::Finite(_) => "finite",
        }
    }

    /// Parse the text grammar: `[-]?digits[.digits][eE[+-]digits]` plus
    /// the exactly-cased sentinels `NaN`, `Infinity`, `-Infinity`.
    pub fn parse_text(s: &str) -> Result<Self> {
        match s {
            "NaN" => return Ok(Numeric::NaN),
            "Infinity" => return Ok(Numeric::Infinity),
            "-Infinity" => return Ok(Numeric::NegInfinity),
            _ => {}
        }

        let bytes = s.as_bytes();
        let mut pos = 0;
        let negative = match bytes.first() {
            Some(b'-') => {
                pos += 1;
                true
            }
            Some(b'+') => {
                pos += 1;
                false
            }
            _ => false,
        };

        let int_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == int_start {
            return Err(Error::MalformedText(format!("invalid numeric: {s:?}")));
        }
        let int_part = &s[int_start..pos];

        let frac_part = if pos < bytes.len() && bytes[pos] == b'.' {
            pos += 1;
            let frac_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == frac_start {
                return Err(Error::MalformedText(format!("invalid numeric: {s:?}")));
            }
            &s[frac_start..pos]
        } else {
            ""
        };

        let mut exp10: i32 = 0;
        if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
            pos += 1;
            let exp_str = &s[pos..];
            exp10 = exp_str
                .parse::<i32>()
                .map_err(|_| Error::MalformedText(format!("invalid numeric exponent: {s:?}")))?;
            pos = bytes.len();
        }
        if pos != bytes.len() {
            return Err(Error::MalformedText(format!("invalid numeric: {s:?}")));
        }

        let mantissa: String = format!("{int_part}{frac_part}");
        let exp10 = exp10 - frac_part.len() as i32;
        let dscale = u16::try_from((-exp10).max(0))
            .map_err(|_| Error::MalformedText(format!("numeric scale too large: {s:?}")))?;

        Ok(Numeric::Finite(from_decimal_digits(
            negative, &mantissa, exp10, dscale,
        )?))
    }

    /// Lossless canonical text form `<integer-digits>e<exponent>`.
    ///
    /// Trailing zeros move into the exponent only when the exponent is
    /// non-negative; a fractional tail shorter than dscale is padded.
    pub fn to_text_canonical(&self) -> String {
        let n = match self {
            Numeric::NaN => return "NaN".into(),
            Numeric::Infinity => return "Infinity".into(),
            Numeric::NegInfinity => return "-Infinity".into(),
            Numeric::Finite(n) => n,
        };
        if n.is_zero() {
            return format!("0e-{}", n.dscale);
        }
        let (digits, exp) = decimal_digits_and_exp(n);
        let sign = if n.negative { "-" } else { "" };
        format!("{sign}{digits}e{exp}")
    }

    /// Conventional decimal-point display form honouring dscale.
    pub fn to_display_string(&self) -> String {
        let n = match self {
            Numeric::NaN => return "NaN".into(),
            Numeric::Infinity => return "Infinity".into(),
            Numeric::NegInfinity => return "-Infinity".into(),
            Numeric::Finite(n) => n,
        };
        finite_to_display(n)
    }
}

impl std::fmt::Display for Numeric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Build the normal form from a decimal digit string times 10^exp10.
fn from_decimal_digits(
    negative: bool,
    mantissa: &str,
    mut exp10: i32,
    dscale: u16,
) -> Result<FiniteNumeric> {
    let mut digits_str: String = mantissa.trim_start_matches('0').to_string();
    if digits_str.is_empty() {
        return Ok(FiniteNumeric {
            negative: false,
            weight: 0,
            dscale,
            digits: vec![],
        });
    }

    // Absorb the exponent remainder so it becomes a multiple of 4 by
    // shifting the digit string left (appending zeros).
    let shift = exp10.rem_euclid(DEC_DIGITS);
    if shift != 0 {
        for _ in 0..shift {
            digits_str.push('0');
        }
        exp10 -= shift;
    }

    // Left-pad to a whole number of 4-digit groups.
    let pad = (DEC_DIGITS as usize - digits_str.len() % DEC_DIGITS as usize)
        % DEC_DIGITS as usize;
    let padded = format!("{}{}", "0".repeat(pad), digits_str);

    let mut digits = Vec::with_capacity(padded.len() / DEC_DIGITS as usize);
    for chunk in padded.as_bytes().chunks(DEC_DIGITS as usize) {
        let mut group: i16 = 0;
        for &b in chunk {
            group = group * 10 + (b - b'0') as i16;
        }
        digits.push(group);
    }

    // The last group sits at 10000^(exp10 / 4).
    let last_weight = exp10.div_euclid(DEC_DIGITS);
    let weight = last_weight + digits.len() as i32 - 1;
    let weight = i16::try_from(weight)
        .map_err(|_| Error::out_of_range("numeric weight", "i16"))?;

    let mut n = FiniteNumeric {
        negative,
        weight,
        dscale,
        digits,
    };
    n.normalize();
    Ok(n)
}

/// Expand the normal form into (decimal digit string, base-10 exponent),
/// applying the dscale pad and the non-negative-exponent truncation.
fn decimal_digits_and_exp(n: &FiniteNumeric) -> (String, i32) {
    let mut digits = String::with_capacity(n.digits.len() * 4);
    for (i, &d) in n.digits.iter().enumerate() {
        if i == 0 {
            digits.push_str(&d.to_string());
        } else {
            digits.push_str(&format!("{d:04}"));
        }
    }
    let mut exp = (n.weight as i32 - n.digits.len() as i32 + 1) * DEC_DIGITS;

    // The digit groups may under- or over-represent dscale (1.5 stored
    // with dscale 2, or the group padding of 0.001 stored as 1000e-12):
    // pad or strip so the fractional width matches exactly.
    let want = n.dscale as i32;
    while (-exp).max(0) < want {
        digits.push('0');
        exp -= 1;
    }
    while exp < -want && digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
        exp += 1;
    }

    // Trailing zeros fold into a non-negative exponent only.
    if exp >= 0 {
        while digits.len() > 1 && digits.ends_with('0') {
            digits.pop();
            exp += 1;
        }
    }
    (digits, exp)
}

/// Render the conventional decimal-point form.
fn finite_to_display(n: &FiniteNumeric) -> String {
    let mut result = String::new();
    if n.negative && !n.is_zero() {
        result.push('-');
    }

    if n.is_zero() {
        result.push('0');
        if n.dscale > 0 {
            result.push('.');
            for _ in 0..n.dscale {
                result.push('0');
            }
        }
        return result;
    }

    let dscale = n.dscale as i32;
    if n.weight >= 0 {
        // Some digits before the decimal point.
        for i in 0..=n.weight as usize {
            match n.digits.get(i) {
                Some(&d) if i == 0 => result.push_str(&d.to_string()),
                Some(&d) => result.push_str(&format!("{d:04}")),
                None => result.push_str("0000"),
            }
        }
    } else {
        result.push('0');
    }

    if dscale > 0 {
        result.push('.');
        let mut written = 0;
        // Leading fractional zeros for weights below -1.
        let lead = ((-(n.weight as i32) - 1) * DEC_DIGITS).max(0);
        for _ in 0..lead.min(dscale) {
            result.push('0');
            written += 1;
        }
        let mut idx = if n.weight >= 0 { n.weight as usize + 1 } else { 0 };
        while written < dscale {
            let group = n.digits.get(idx).copied().unwrap_or(0);
            let s = format!("{group:04}");
            for c in s.chars() {
                if written < dscale {
                    result.push(c);
                    written += 1;
                }
            }
            idx += 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Numeric {
        Numeric::parse_text(s).unwrap()
    }

    fn finite(n: &Numeric) -> &FiniteNumeric {
        match n {
            Numeric::Finite(f) => f,
            other => panic!("expected finite, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_integer() {
        let n = parse("12345");
        let f = finite(&n);
        assert!(!f.negative);
        assert_eq!(f.weight, 1);
        assert_eq!(f.digits, vec![1, 2345]);
        assert_eq!(f.dscale, 0);
    }

    #[test]
    fn test_parse_pi() {
        let n = parse("3.14159");
        let f = finite(&n);
        assert_eq!(f.weight, 0);
        assert_eq!(f.digits, vec![3, 1415, 9000]);
        assert_eq!(f.dscale, 5);
    }

    #[test]
    fn test_parse_small_fraction() {
        let n = parse("0.0001");
        let f = finite(&n);
        assert_eq!(f.weight, -1);
        assert_eq!(f.digits, vec![1]);
        assert_eq!(f.dscale, 4);
    }

    #[test]
    fn test_parse_negative_decimal() {
        let n = parse("-123.45");
        let f = finite(&n);
        assert!(f.negative);
        assert_eq!(f.weight, 0);
        assert_eq!(f.digits, vec![123, 4500]);
        assert_eq!(f.dscale, 2);
    }

    #[test]
    fn test_parse_zero_variants() {
        let n = parse("0");
        let f = finite(&n);
        assert!(f.is_zero());
        assert_eq!(f.dscale, 0);

        let n = parse("0.00");
        let f = finite(&n);
        assert!(f.is_zero());
        assert_eq!(f.dscale, 2);
    }

    #[test]
    fn test_parse_e_notation() {
        let n = parse("314159e-5");
        assert_eq!(n, parse("3.14159"));

        let n = parse("12e2");
        let f = finite(&n);
        assert_eq!(f.weight, 0);
        assert_eq!(f.digits, vec![1200]);
        assert_eq!(f.dscale, 0);
    }

    #[test]
    fn test_parse_sentinels() {
        assert_eq!(parse("NaN"), Numeric::NaN);
        assert_eq!(parse("Infinity"), Numeric::Infinity);
        assert_eq!(parse("-Infinity"), Numeric::NegInfinity);
        // Case matters.
        assert!(Numeric::parse_text("nan").is_err());
        assert!(Numeric::parse_text("INFINITY").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Numeric::parse_text("").is_err());
        assert!(Numeric::parse_text("1.").is_err());
        assert!(Numeric::parse_text(".5").is_err());
        assert!(Numeric::parse_text("1,5").is_err());
        assert!(Numeric::parse_text("1e").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for s in [
            "0", "1", "-1", "12345", "123.45", "-123.45", "0.0001", "3.14159",
            "10000", "9999.9999", "-0.5",
        ] {
            assert_eq!(parse(s).to_display_string(), s, "display of {s}");
        }
    }

    #[test]
    fn test_display_preserves_dscale() {
        assert_eq!(parse("1.50").to_display_string(), "1.50");
        assert_eq!(parse("0.00").to_display_string(), "0.00");
    }

    #[test]
    fn test_canonical_text() {
        assert_eq!(parse("3.14159").to_text_canonical(), "314159e-5");
        assert_eq!(parse("1200").to_text_canonical(), "12e2");
        assert_eq!(parse("-1.5").to_text_canonical(), "-15e-1");
        assert_eq!(parse("1.50").to_text_canonical(), "150e-2");
        assert_eq!(parse("0.000000001").to_text_canonical(), "1e-9");
        assert_eq!(parse("NaN").to_text_canonical(), "NaN");
    }

    #[test]
    fn test_canonical_text_preserves_dscale() {
        for s in ["1.50", "0.000000001", "3.14159", "1.000001", "0.00"] {
            let n = parse(s);
            let back = parse(&n.to_text_canonical());
            assert_eq!(back, n, "canonical roundtrip of {s}");
        }
    }

    #[test]
    fn test_canonical_parses_back() {
        for s in ["3.14159", "-123.45", "1200", "0.0001"] {
            let n = parse(s);
            let canonical = n.to_text_canonical();
            let back = parse(&canonical);
            assert_eq!(finite(&back).digits, finite(&n).digits, "{s}");
            assert_eq!(finite(&back).weight, finite(&n).weight, "{s}");
            assert_eq!(finite(&back).negative, finite(&n).negative, "{s}");
        }
    }

    #[test]
    fn test_from_i64() {
        assert_eq!(Numeric::from_i64(0), parse("0"));
        assert_eq!(Numeric::from_i64(12345), parse("12345"));
        assert_eq!(Numeric::from_i64(-7), parse("-7"));
        assert_eq!(Numeric::from_i64(100000000), parse("100000000"));
    }

    #[test]
    fn test_to_i64() {
        assert_eq!(parse("12345").to_i64().unwrap(), 12345);
        assert_eq!(parse("-12345").to_i64().unwrap(), -12345);
        assert_eq!(parse("10000").to_i64().unwrap(), 10000);
        assert!(parse("1.5").to_i64().is_err());
        assert!(parse("NaN").to_i64().is_err());
        assert!(parse("99999999999999999999999").to_i64().is_err());
    }

    #[test]
    fn test_to_f64() {
        assert!((parse("123.45").to_f64() - 123.45).abs() < 1e-9);
        assert!(parse("NaN").to_f64().is_nan());
        assert_eq!(parse("Infinity").to_f64(), f64::INFINITY);
    }

    #[test]
    fn test_trailing_zero_group_normalized() {
        // 1.0000 stores no digit groups after the units group.
        let n = parse("1.0000");
        let f = finite(&n);
        assert_eq!(f.digits, vec![1]);
        assert_eq!(f.weight, 0);
        assert_eq!(f.dscale, 4);
        assert_eq!(parse("1.0000").to_display_string(), "1.0000");
    }
}
