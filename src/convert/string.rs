//! String type implementations (&str, String).

use crate::error::{Error, Result};
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};

use super::{FromWire, ToWire};

fn accepts_text(oid: Oid) -> bool {
    matches!(
        oid,
        oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME | oid::UNKNOWN
    )
}

impl<'a> FromWire<'a> for &'a str {
    fn from_text(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        if !accepts_text(oid) {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "str"));
        }
        simdutf8::compat::from_utf8(bytes)
            .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))
    }

    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        if !accepts_text(oid) {
            return Err(Error::no_scan_plan(oid, FormatCode::Binary, "str"));
        }
        simdutf8::compat::from_utf8(bytes)
            .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))
    }
}

impl<'a> FromWire<'a> for String {
    fn from_text(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        <&str>::from_text(oid, bytes).map(str::to_owned)
    }

    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        <&str>::from_binary(oid, bytes).map(str::to_owned)
    }
}

impl ToWire for str {
    fn natural_oid(&self) -> Oid {
        oid::TEXT
    }

    fn encode(&self, oid: Oid, _format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        // The payload is the string itself in both formats, for the text
        // family and for json/jsonb text.
        let _ = oid;
        buf.extend_from_slice(self.as_bytes());
        Ok(IsNull::No)
    }
}

impl ToWire for String {
    fn natural_oid(&self) -> Oid {
        oid::TEXT
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        self.as_str().encode(oid, format, buf)
    }
}
