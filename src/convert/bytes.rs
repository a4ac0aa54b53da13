//! Byte type implementations (`&[u8]`, `Vec<u8>`).

use crate::error::{Error, Result};
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};

use super::{FromWire, ToWire};

impl<'a> FromWire<'a> for &'a [u8] {
    fn from_text(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        if oid != oid::BYTEA {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "bytes"));
        }
        // The text form is hex-encoded; borrow-returning targets get the
        // raw payload, owned targets decode it.
        Ok(bytes)
    }

    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        if oid != oid::BYTEA {
            return Err(Error::no_scan_plan(oid, FormatCode::Binary, "bytes"));
        }
        Ok(bytes)
    }
}

impl<'a> FromWire<'a> for Vec<u8> {
    fn from_text(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        if oid != oid::BYTEA {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "Vec<u8>"));
        }
        match bytes.strip_prefix(b"\\x") {
            Some(hex) => decode_hex(hex),
            None => Err(Error::MalformedText(
                "bytea text payload does not start with \\x".into(),
            )),
        }
    }

    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        if oid != oid::BYTEA {
            return Err(Error::no_scan_plan(oid, FormatCode::Binary, "Vec<u8>"));
        }
        Ok(bytes.to_vec())
    }
}

impl ToWire for [u8] {
    fn natural_oid(&self) -> Oid {
        oid::BYTEA
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        match oid {
            0 | oid::BYTEA => {}
            _ => return Err(Error::no_encode_plan(oid, format, "bytes")),
        }
        match format {
            FormatCode::Binary => buf.extend_from_slice(self),
            FormatCode::Text => {
                const HEX: &[u8; 16] = b"0123456789abcdef";
                buf.extend_from_slice(b"\\x");
                for &b in self {
                    buf.push(HEX[(b >> 4) as usize]);
                    buf.push(HEX[(b & 0x0F) as usize]);
                }
            }
        }
        Ok(IsNull::No)
    }
}

impl ToWire for Vec<u8> {
    fn natural_oid(&self) -> Oid {
        oid::BYTEA
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        self.as_slice().encode(oid, format, buf)
    }
}

/// Decode hex string to bytes
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
