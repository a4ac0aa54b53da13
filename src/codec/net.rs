//! Network address codec: inet and cidr.
//!
//! Binary layout: family byte (2 = IPv4, 3 = IPv6), prefix length,
//! is-cidr flag, address byte count, then the address bytes.

use std::net::IpAddr;

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::FormatCode;
use crate::value::{Inet, Value, ValueKind};

use super::{Codec, encode_plan, scan_plan, utf8};

const FAMILY_INET: u8 = 2;
const FAMILY_INET6: u8 = 3;

/// Codec for `inet` and `cidr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InetCodec {
    /// True for `cidr`, which sets the is-cidr byte on the wire.
    pub cidr: bool,
}

impl InetCodec {
    /// The `inet` codec.
    pub fn inet() -> Self {
        InetCodec { cidr: false }
    }

    /// The `cidr` codec.
    pub fn cidr() -> Self {
        InetCodec { cidr: true }
    }
}

fn max_prefix(addr: IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn decode_inet_binary(bytes: &[u8]) -> Result<Inet> {
    if bytes.len() < 4 {
        return Err(Error::MalformedBinary(format!(
            "inet payload too short: {}",
            bytes.len()
        )));
    }
    let family = bytes[0];
    let prefix = bytes[1];
    let addr_len = bytes[3] as usize;
    let addr_bytes = &bytes[4..];
    if addr_bytes.len() != addr_len {
        return Err(Error::MalformedBinary(format!(
            "inet address length {} does not match header {}",
            addr_bytes.len(),
            addr_len
        )));
    }
    let addr = match (family, addr_len) {
        (FAMILY_INET, 4) => {
            let arr: [u8; 4] = addr_bytes.try_into().map_err(|_| {
                Error::MalformedBinary("inet IPv4 address truncated".into())
            })?;
            IpAddr::V4(arr.into())
        }
        (FAMILY_INET6, 16) => {
            let arr: [u8; 16] = addr_bytes.try_into().map_err(|_| {
                Error::MalformedBinary("inet IPv6 address truncated".into())
            })?;
            IpAddr::V6(arr.into())
        }
        _ => {
            return Err(Error::MalformedBinary(format!(
                "unknown inet family {family} with {addr_len} address bytes"
            )));
        }
    };
    if prefix > max_prefix(addr) {
        return Err(Error::MalformedBinary(format!(
            "inet prefix {prefix} exceeds address width"
        )));
    }
    Ok(Inet { addr, prefix })
}

fn encode_inet_binary(inet: Inet, cidr: bool, buf: &mut Vec<u8>) -> Result<()> {
    if inet.prefix > max_prefix(inet.addr) {
        return Err(Error::out_of_range(inet.prefix, "inet prefix"));
    }
    match inet.addr {
        IpAddr::V4(v4) => {
            buf.push(FAMILY_INET);
            buf.push(inet.prefix);
            buf.push(u8::from(cidr));
            buf.push(4);
            buf.extend_from_slice(&v4.octets());
        }
        IpAddr::V6(v6) => {
            buf.push(FAMILY_INET6);
            buf.push(inet.prefix);
            buf.push(u8::from(cidr));
            buf.push(16);
            buf.extend_from_slice(&v6.octets());
        }
    }
    Ok(())
}

fn parse_inet_text(s: &str) -> Result<Inet> {
    let (addr_str, prefix_str) = match s.split_once('/') {
        Some((a, p)) => (a, Some(p)),
        None => (s, None),
    };
    let addr: IpAddr = addr_str
        .parse()
        .map_err(|e| Error::MalformedText(format!("invalid inet {s:?}: {e}")))?;
    let prefix = match prefix_str {
        Some(p) => p
            .parse::<u8>()
            .map_err(|e| Error::MalformedText(format!("invalid inet prefix {s:?}: {e}")))?,
        None => max_prefix(addr),
    };
    if prefix > max_prefix(addr) {
        return Err(Error::MalformedText(format!(
            "inet prefix {prefix} exceeds address width"
        )));
    }
    Ok(Inet { addr, prefix })
}

fn format_inet_text(inet: Inet, cidr: bool) -> String {
    if cidr || inet.prefix != max_prefix(inet.addr) {
        format!("{}/{}", inet.addr, inet.prefix)
    } else {
        inet.addr.to_string()
    }
}

impl Codec for InetCodec {
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
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Inet) {
            return None;
        }
        let cidr = self.cidr;
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let inet = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Inet(inet) => *inet,
                other => return Err(Error::out_of_range(other.kind_name(), "inet")),
            };
            match format {
                FormatCode::Binary => encode_inet_binary(inet, cidr, buf)?,
                FormatCode::Text => {
                    buf.extend_from_slice(format_inet_text(inet, cidr).as_bytes());
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
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Inet) {
            return None;
        }
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let inet = match format {
                FormatCode::Binary => decode_inet_binary(bytes)?,
                FormatCode::Text => parse_inet_text(utf8(bytes)?)?,
            };
            *out = Value::Inet(inet);
            Ok(())
        })
    }
}
