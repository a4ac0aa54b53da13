//! Wire-format primitives.
//!
//! PostgreSQL uses big-endian (network byte order) for all integers. The
//! readers here return `(value, rest)` so callers can walk a payload as a
//! shrinking slice; the writers append to a caller-owned `Vec<u8>`.

use zerocopy::FromBytes;
use zerocopy::byteorder::big_endian::{I16 as I16BE, I32 as I32BE, I64 as I64BE, U32 as U32BE};

use crate::error::{Error, Result};
use crate::types::Oid;

/// Read 1-byte unsigned integer.
#[inline]
pub fn read_u8(data: &[u8]) -> Result<(u8, &[u8])> {
    match data.split_first() {
        Some((&b, rest)) => Ok((b, rest)),
        None => Err(Error::MalformedBinary("read_u8: empty buffer".into())),
    }
}

/// Read 2-byte big-endian signed integer.
#[inline]
pub fn read_i16(data: &[u8]) -> Result<(i16, &[u8])> {
    if data.len() < 2 {
        return Err(Error::MalformedBinary(format!(
            "read_i16: buffer too short: {} < 2",
            data.len()
        )));
    }
    let value = I16BE::ref_from_bytes(&data[..2])
        .map_err(|e| Error::MalformedBinary(format!("read_i16: {e:?}")))?
        .get();
    Ok((value, &data[2..]))
}

/// Read 4-byte big-endian signed integer.
#[inline]
pub fn read_i32(data: &[u8]) -> Result<(i32, &[u8])> {
    if data.len() < 4 {
        return Err(Error::MalformedBinary(format!(
            "read_i32: buffer too short: {} < 4",
            data.len()
        )));
    }
    let value = I32BE::ref_from_bytes(&data[..4])
        .map_err(|e| Error::MalformedBinary(format!("read_i32: {e:?}")))?
        .get();
    Ok((value, &data[4..]))
}

/// Read 4-byte big-endian unsigned integer.
#[inline]
pub fn read_u32(data: &[u8]) -> Result<(u32, &[u8])> {
    if data.len() < 4 {
        return Err(Error::MalformedBinary(format!(
            "read_u32: buffer too short: {} < 4",
            data.len()
        )));
    }
    let value = U32BE::ref_from_bytes(&data[..4])
        .map_err(|e| Error::MalformedBinary(format!("read_u32: {e:?}")))?
        .get();
    Ok((value, &data[4..]))
}

/// Read 8-byte big-endian signed integer.
#[inline]
pub fn read_i64(data: &[u8]) -> Result<(i64, &[u8])> {
    if data.len() < 8 {
        return Err(Error::MalformedBinary(format!(
            "read_i64: buffer too short: {} < 8",
            data.len()
        )));
    }
    let value = I64BE::ref_from_bytes(&data[..8])
        .map_err(|e| Error::MalformedBinary(format!("read_i64: {e:?}")))?
        .get();
    Ok((value, &data[8..]))
}

/// Read 8-byte big-endian IEEE-754 double.
#[inline]
pub fn read_f64(data: &[u8]) -> Result<(f64, &[u8])> {
    let (bits, rest) = read_i64(data)?;
    Ok((f64::from_bits(bits as u64), rest))
}

/// Read fixed-length bytes.
#[inline]
pub fn read_bytes(data: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
    if data.len() < len {
        return Err(Error::MalformedBinary(format!(
            "read_bytes: buffer too short: {} < {}",
            data.len(),
            len
        )));
    }
    Ok((&data[..len], &data[len..]))
}

/// Read a length-prefixed payload: 4-byte length, then that many bytes.
///
/// A length of -1 denotes SQL NULL and yields `None`.
#[inline]
pub fn read_length_prefixed(data: &[u8]) -> Result<(Option<&[u8]>, &[u8])> {
    let (len, rest) = read_i32(data)?;
    if len < 0 {
        if len != -1 {
            return Err(Error::MalformedBinary(format!(
                "negative payload length {len} is not -1"
            )));
        }
        return Ok((None, rest));
    }
    let (payload, rest) = read_bytes(rest, len as usize)?;
    Ok((Some(payload), rest))
}

/// Write 1-byte unsigned integer.
#[inline]
pub fn write_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

/// Write 2-byte big-endian signed integer.
#[inline]
pub fn write_i16(out: &mut Vec<u8>, value: i16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write 2-byte big-endian unsigned integer.
#[inline]
pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write 4-byte big-endian signed integer.
#[inline]
pub fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write 4-byte big-endian unsigned integer.
#[inline]
pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write 8-byte big-endian signed integer.
#[inline]
pub fn write_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Write 8-byte big-endian IEEE-754 double.
#[inline]
pub fn write_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_bits().to_be_bytes());
}

/// Write raw bytes.
#[inline]
pub fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(data);
}

/// Reserve a 4-byte length slot and return its offset for back-patching.
///
/// Variable-length element streams (arrays, composites, ranges) write each
/// element's payload first and patch the length afterwards.
#[inline]
pub fn reserve_length_slot(out: &mut Vec<u8>) -> usize {
    let offset = out.len();
    out.extend_from_slice(&[0, 0, 0, 0]);
    offset
}

/// Patch a previously reserved length slot with the byte count written
/// after it, or with -1 for SQL NULL.
#[inline]
pub fn patch_length_slot(out: &mut [u8], offset: usize, is_null: bool) {
    let len = if is_null {
        -1_i32
    } else {
        (out.len() - offset - 4) as i32
    };
    out[offset..offset + 4].copy_from_slice(&len.to_be_bytes());
}

/// One axis of an n-dimensional array: element count and lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDimension {
    /// Number of elements along this axis.
    pub len: i32,
    /// Index of the first element along this axis (usually 1).
    pub lower_bound: i32,
}

/// Binary array header: dimensions, contains-nulls flag, element OID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayHeader {
    /// Per-dimension length and lower bound, outermost first.
    pub dims: Vec<ArrayDimension>,
    /// Whether any element slot holds SQL NULL (flags bit 0).
    pub contains_nulls: bool,
    /// OID of the element type.
    pub element_oid: Oid,
}

impl ArrayHeader {
    /// Total element count: the product of all dimension lengths.
    ///
    /// A zero-dimension header has cardinality 0 (the empty array).
    pub fn cardinality(&self) -> usize {
        if self.dims.is_empty() {
            return 0;
        }
        self.dims.iter().map(|d| d.len as usize).product()
    }
}

/// Flag bit 0: the element stream contains NULL slots.
const ARRAY_FLAG_HAS_NULLS: i32 = 0b1;

/// Read a binary array header, returning it and the element stream.
pub fn read_array_header(data: &[u8]) -> Result<(ArrayHeader, &[u8])> {
    let (ndim, rest) = read_i32(data)?;
    if ndim < 0 {
        return Err(Error::MalformedBinary(format!(
            "array dimension count {ndim} is negative"
        )));
    }
    let (flags, rest) = read_i32(rest)?;
    let (element_oid, mut rest) = read_u32(rest)?;

    let mut dims = Vec::with_capacity(ndim as usize);
    for _ in 0..ndim {
        let (len, r) = read_i32(rest)?;
        let (lower_bound, r) = read_i32(r)?;
        if len < 0 {
            return Err(Error::MalformedBinary(format!(
                "array dimension length {len} is negative"
            )));
        }
        dims.push(ArrayDimension { len, lower_bound });
        rest = r;
    }

    Ok((
        ArrayHeader {
            dims,
            contains_nulls: flags & ARRAY_FLAG_HAS_NULLS != 0,
            element_oid,
        },
        rest,
    ))
}

/// Write a binary array header.
pub fn write_array_header(out: &mut Vec<u8>, header: &ArrayHeader) {
    write_i32(out, header.dims.len() as i32);
    write_i32(out, if header.contains_nulls { ARRAY_FLAG_HAS_NULLS } else { 0 });
    write_u32(out, header.element_oid);
    for dim in &header.dims {
        write_i32(out, dim.len);
        write_i32(out, dim.lower_bound);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::oid;

    #[test]
    fn test_read_i32() {
        let data = [0x00, 0x00, 0x30, 0x39, 0xFF];
        let (value, rest) = read_i32(&data).unwrap();
        assert_eq!(value, 12345);
        assert_eq!(rest, &[0xFF]);
    }

    #[test]
    fn test_read_i32_short() {
        assert!(read_i32(&[0x00, 0x01]).is_err());
    }

    #[test]
    fn test_read_length_prefixed_null() {
        let mut data = Vec::new();
        write_i32(&mut data, -1);
        let (payload, rest) = read_length_prefixed(&data).unwrap();
        assert_eq!(payload, None);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_read_length_prefixed_value() {
        let mut data = Vec::new();
        write_i32(&mut data, 2);
        data.extend_from_slice(b"hi");
        let (payload, _) = read_length_prefixed(&data).unwrap();
        assert_eq!(payload, Some(&b"hi"[..]));
    }

    #[test]
    fn test_length_slot_patch() {
        let mut out = Vec::new();
        let slot = reserve_length_slot(&mut out);
        out.extend_from_slice(b"abc");
        patch_length_slot(&mut out, slot, false);
        assert_eq!(&out[..4], &3_i32.to_be_bytes());

        let mut out = Vec::new();
        let slot = reserve_length_slot(&mut out);
        patch_length_slot(&mut out, slot, true);
        assert_eq!(&out[..4], &(-1_i32).to_be_bytes());
    }

    #[test]
    fn test_array_header_roundtrip() {
        let header = ArrayHeader {
            dims: vec![
                ArrayDimension { len: 2, lower_bound: 1 },
                ArrayDimension { len: 3, lower_bound: 1 },
            ],
            contains_nulls: true,
            element_oid: oid::INT4,
        };
        let mut out = Vec::new();
        write_array_header(&mut out, &header);
        let (decoded, rest) = read_array_header(&out).unwrap();
        assert_eq!(decoded, header);
        assert!(rest.is_empty());
        assert_eq!(decoded.cardinality(), 6);
    }

    #[test]
    fn test_array_header_zero_dims() {
        let header = ArrayHeader {
            dims: vec![],
            contains_nulls: false,
            element_oid: oid::TEXT,
        };
        let mut out = Vec::new();
        write_array_header(&mut out, &header);
        assert_eq!(out.len(), 12);
        let (decoded, _) = read_array_header(&out).unwrap();
        assert_eq!(decoded.cardinality(), 0);
    }

    #[test]
    fn test_array_header_negative_ndim() {
        let mut out = Vec::new();
        write_i32(&mut out, -1);
        write_i32(&mut out, 0);
        write_u32(&mut out, oid::INT4);
        assert!(read_array_header(&out).is_err());
    }
}
