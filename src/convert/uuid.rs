//! Uuid crate conversions.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};

use super::{FromWire, ToWire};

impl FromWire<'_> for Uuid {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::UUID {
            return Err(Error::no_scan_plan(oid, FormatCode::Text, "Uuid"));
        }
        let s = simdutf8::compat::from_utf8(bytes)
            .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))?;
        Uuid::parse_str(s).map_err(|e| Error::MalformedText(format!("invalid uuid: {e}")))
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::UUID {
            return Err(Error::no_scan_plan(oid, FormatCode::Binary, "Uuid"));
        }
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| Error::length("uuid", bytes.len(), 16))?;
        Ok(Uuid::from_bytes(arr))
    }
}

impl ToWire for Uuid {
    fn natural_oid(&self) -> Oid {
        oid::UUID
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::UUID } else { oid };
        if oid != oid::UUID {
            return Err(Error::no_encode_plan(oid, format, "Uuid"));
        }
        match format {
            FormatCode::Binary => buf.extend_from_slice(self.as_bytes()),
            FormatCode::Text => {
                buf.extend_from_slice(self.hyphenated().to_string().as_bytes());
            }
        }
        Ok(IsNull::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_binary_roundtrip() {
        let original = Uuid::parse_str("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap();
        let mut buf = Vec::new();
        original.encode(oid::UUID, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(Uuid::from_binary(oid::UUID, &buf).unwrap(), original);
    }

    #[test]
    fn test_uuid_text_roundtrip() {
        let original = Uuid::parse_str("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap();
        let mut buf = Vec::new();
        original.encode(oid::UUID, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(buf, b"a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11");
        assert_eq!(Uuid::from_text(oid::UUID, &buf).unwrap(), original);
    }

    #[test]
    fn test_uuid_rejects_wrong_length() {
        assert!(Uuid::from_binary(oid::UUID, &[0; 15]).is_err());
    }
}
