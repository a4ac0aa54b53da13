//! Structured JSON conversions (serde).
//!
//! `Json<T>` wraps any serde-convertible value; the wrapped marshal and
//! unmarshal errors propagate verbatim as [`Error::Marshal`].
//! `serde_json::Value` converts directly.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::strip_jsonb_version;
use crate::error::{Error, Result};
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};

use super::{FromWire, ToWire};

/// Wrapper marking a value for JSON marshalling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

fn json_payload(oid: Oid, format: FormatCode, bytes: &[u8]) -> Result<&[u8]> {
    match oid {
        oid::JSON => Ok(bytes),
        oid::JSONB => {
            if format == FormatCode::Binary {
                strip_jsonb_version(bytes)
            } else {
                Ok(bytes)
            }
        }
        _ => Err(Error::no_scan_plan(oid, format, "Json")),
    }
}

impl<T: DeserializeOwned> FromWire<'_> for Json<T> {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        let payload = json_payload(oid, FormatCode::Text, bytes)?;
        serde_json::from_slice(payload)
            .map(Json)
            .map_err(|e| Error::Marshal(Box::new(e)))
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        let payload = json_payload(oid, FormatCode::Binary, bytes)?;
        serde_json::from_slice(payload)
            .map(Json)
            .map_err(|e| Error::Marshal(Box::new(e)))
    }
}

impl<T: Serialize> ToWire for Json<T> {
    fn natural_oid(&self) -> Oid {
        oid::JSON
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        let oid = if oid == 0 { oid::JSON } else { oid };
        if !matches!(oid, oid::JSON | oid::JSONB) {
            return Err(Error::no_encode_plan(oid, format, "Json"));
        }
        if oid == oid::JSONB && format == FormatCode::Binary {
            buf.push(1);
        }
        let bytes = serde_json::to_vec(&self.0).map_err(|e| Error::Marshal(Box::new(e)))?;
        buf.extend_from_slice(&bytes);
        Ok(IsNull::No)
    }
}

impl FromWire<'_> for serde_json::Value {
    fn from_text(oid: Oid, bytes: &[u8]) -> Result<Self> {
        Json::<serde_json::Value>::from_text(oid, bytes).map(|j| j.0)
    }

    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        Json::<serde_json::Value>::from_binary(oid, bytes).map(|j| j.0)
    }
}

impl ToWire for serde_json::Value {
    fn natural_oid(&self) -> Oid {
        oid::JSON
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        Json(self).encode(oid, format, buf)
    }
}
