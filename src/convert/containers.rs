//! Container conversions: `Vec` arrays and tuple composites.
//!
//! `Vec<T>` maps to the matching one-dimensional array type and flattens
//! multi-dimensional payloads on decode (a `Vec` cannot carry
//! dimensions; the dynamic [`crate::value::ArrayValue`] preserves them).
//! `Vec<Option<T>>` carries NULL slots; a bare `Vec<T>` rejects them.
//! `Vec<Vec<T>>` encodes a two-dimensional array and rejects ragged
//! input. Tuples map positionally to composite payloads; composite
//! conversions are binary-only because the text form does not name its
//! field types.

use crate::codec::{array_needs_quoting, array_push_quoted, parse_array_text};
use crate::error::{Error, Result};
use crate::plan::IsNull;
use crate::types::{FormatCode, Oid, oid};
use crate::wire::{self, ArrayDimension, ArrayHeader};

use super::{FromWire, ToWire};

fn decode_array_binary_with<'a, T, F>(bytes: &'a [u8], mut element: F) -> Result<Vec<T>>
where
    F: FnMut(Oid, Option<&'a [u8]>, usize) -> Result<T>,
{
    let (header, mut rest) = wire::read_array_header(bytes)?;
    let cardinality = header.cardinality();
    let mut out = Vec::with_capacity(cardinality);
    for i in 0..cardinality {
        let (payload, r) = wire::read_length_prefixed(rest)
            .map_err(|e| Error::array_element("scan", i, e))?;
        rest = r;
        out.push(element(header.element_oid, payload, i)?);
    }
    if !rest.is_empty() {
        return Err(Error::MalformedBinary(format!(
            "{} trailing bytes after array elements",
            rest.len()
        )));
    }
    Ok(out)
}

fn encode_array_text_with<T, F>(
    elements: &[T],
    buf: &mut Vec<u8>,
    mut element: F,
) -> Result<()>
where
    F: FnMut(&T, &mut Vec<u8>) -> Result<IsNull>,
{
    buf.push(b'{');
    let mut scratch = Vec::new();
    for (i, el) in elements.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        scratch.clear();
        let is_null = element(el, &mut scratch).map_err(|e| Error::array_element("encode", i, e))?;
        if is_null.is_null() {
            buf.extend_from_slice(b"NULL");
            continue;
        }
        let text = simdutf8::compat::from_utf8(&scratch)
            .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))?;
        if array_needs_quoting(text) {
            array_push_quoted(buf, text);
        } else {
            buf.extend_from_slice(text.as_bytes());
        }
    }
    buf.push(b'}');
    Ok(())
}

fn encode_array_binary_with<T, F>(
    elements: &[T],
    element_oid: Oid,
    buf: &mut Vec<u8>,
    mut element: F,
) -> Result<()>
where
    F: FnMut(&T, &mut Vec<u8>) -> Result<IsNull>,
{
    let dims = if elements.is_empty() {
        vec![]
    } else {
        vec![ArrayDimension {
            len: elements.len() as i32,
            lower_bound: 1,
        }]
    };
    // The header's null flag is patched after the element walk.
    let header_at = buf.len();
    wire::write_array_header(
        buf,
        &ArrayHeader {
            dims,
            contains_nulls: false,
            element_oid,
        },
    );
    let mut any_null = false;
    for (i, el) in elements.iter().enumerate() {
        let slot = wire::reserve_length_slot(buf);
        let is_null = element(el, buf).map_err(|e| Error::array_element("encode", i, e))?;
        any_null |= is_null.is_null();
        wire::patch_length_slot(buf, slot, is_null.is_null());
    }
    if any_null {
        buf[header_at + 4..header_at + 8].copy_from_slice(&1_i32.to_be_bytes());
    }
    Ok(())
}

macro_rules! array_wire {
    ($t:ty, $elem_oid:expr, $array_oid:expr, $accept:pat) => {
        impl<'a> FromWire<'a> for Vec<$t> {
            fn from_text(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(oid, FormatCode::Text, "array"));
                }
                let s = simdutf8::compat::from_utf8(bytes)
                    .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))?;
                let (_dims, tokens) = parse_array_text(s)?;
                tokens
                    .iter()
                    .enumerate()
                    .map(|(i, token)| {
                        <$t>::from_wire(
                            $elem_oid,
                            FormatCode::Text,
                            token.as_deref().map(str::as_bytes),
                        )
                        .map_err(|e| Error::array_element("scan", i, e))
                    })
                    .collect()
            }

            fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(oid, FormatCode::Binary, "array"));
                }
                decode_array_binary_with(bytes, |elem_oid, payload, i| {
                    <$t>::from_wire(elem_oid, FormatCode::Binary, payload)
                        .map_err(|e| Error::array_element("scan", i, e))
                })
            }
        }

        impl<'a> FromWire<'a> for Vec<Option<$t>> {
            fn from_text(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(oid, FormatCode::Text, "array"));
                }
                let s = simdutf8::compat::from_utf8(bytes)
                    .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))?;
                let (_dims, tokens) = parse_array_text(s)?;
                tokens
                    .iter()
                    .enumerate()
                    .map(|(i, token)| {
                        Option::<$t>::from_wire(
                            $elem_oid,
                            FormatCode::Text,
                            token.as_deref().map(str::as_bytes),
                        )
                        .map_err(|e| Error::array_element("scan", i, e))
                    })
                    .collect()
            }

            fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
                if !matches!(oid, $accept) {
                    return Err(Error::no_scan_plan(oid, FormatCode::Binary, "array"));
                }
                decode_array_binary_with(bytes, |elem_oid, payload, i| {
                    Option::<$t>::from_wire(elem_oid, FormatCode::Binary, payload)
                        .map_err(|e| Error::array_element("scan", i, e))
                })
            }
        }

        impl ToWire for Vec<$t> {
            fn natural_oid(&self) -> Oid {
                $array_oid
            }

            fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
                let oid = if oid == 0 { $array_oid } else { oid };
                if !matches!(oid, $accept) {
                    return Err(Error::no_encode_plan(oid, format, "array"));
                }
                match format {
                    FormatCode::Binary => encode_array_binary_with(
                        self,
                        $elem_oid,
                        buf,
                        |el, out| el.encode($elem_oid, FormatCode::Binary, out),
                    )?,
                    FormatCode::Text => encode_array_text_with(self, buf, |el, out| {
                        el.encode($elem_oid, FormatCode::Text, out)
                    })?,
                }
                Ok(IsNull::No)
            }
        }

        impl ToWire for Vec<Option<$t>> {
            fn natural_oid(&self) -> Oid {
                $array_oid
            }

            fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
                let oid = if oid == 0 { $array_oid } else { oid };
                if !matches!(oid, $accept) {
                    return Err(Error::no_encode_plan(oid, format, "array"));
                }
                match format {
                    FormatCode::Binary => encode_array_binary_with(
                        self,
                        $elem_oid,
                        buf,
                        |el, out| el.encode($elem_oid, FormatCode::Binary, out),
                    )?,
                    FormatCode::Text => encode_array_text_with(self, buf, |el, out| {
                        el.encode($elem_oid, FormatCode::Text, out)
                    })?,
                }
                Ok(IsNull::No)
            }
        }

        impl ToWire for Vec<Vec<$t>> {
            fn natural_oid(&self) -> Oid {
                $array_oid
            }

            fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
                let oid = if oid == 0 { $array_oid } else { oid };
                if !matches!(oid, $accept) {
                    return Err(Error::no_encode_plan(oid, format, "array"));
                }
                let inner_len = self.first().map(Vec::len).unwrap_or(0);
                if self.iter().any(|row| row.len() != inner_len) {
                    return Err(Error::MalformedBinary(
                        "ragged multi-dimensional array input".into(),
                    ));
                }
                match format {
                    FormatCode::Binary => {
                        let dims = if self.is_empty() || inner_len == 0 {
                            vec![]
                        } else {
                            vec![
                                ArrayDimension {
                                    len: self.len() as i32,
                                    lower_bound: 1,
                                },
                                ArrayDimension {
                                    len: inner_len as i32,
                                    lower_bound: 1,
                                },
                            ]
                        };
                        wire::write_array_header(
                            buf,
                            &ArrayHeader {
                                dims,
                                contains_nulls: false,
                                element_oid: $elem_oid,
                            },
                        );
                        for (i, el) in self.iter().flatten().enumerate() {
                            let slot = wire::reserve_length_slot(buf);
                            let is_null = el
                                .encode($elem_oid, FormatCode::Binary, buf)
                                .map_err(|e| Error::array_element("encode", i, e))?;
                            wire::patch_length_slot(buf, slot, is_null.is_null());
                        }
                    }
                    FormatCode::Text => {
                        buf.push(b'{');
                        for (r, row) in self.iter().enumerate() {
                            if r > 0 {
                                buf.push(b',');
                            }
                            encode_array_text_with(row, buf, |el, out| {
                                el.encode($elem_oid, FormatCode::Text, out)
                            })?;
                        }
                        buf.push(b'}');
                    }
                }
                Ok(IsNull::No)
            }
        }
    };
}

array_wire!(bool, oid::BOOL, oid::BOOL_ARRAY, oid::BOOL_ARRAY);
array_wire!(i16, oid::INT2, oid::INT2_ARRAY, oid::INT2_ARRAY);
array_wire!(i32, oid::INT4, oid::INT4_ARRAY, oid::INT4_ARRAY);
array_wire!(i64, oid::INT8, oid::INT8_ARRAY, oid::INT8_ARRAY);
array_wire!(f32, oid::FLOAT4, oid::FLOAT4_ARRAY, oid::FLOAT4_ARRAY);
array_wire!(f64, oid::FLOAT8, oid::FLOAT8_ARRAY, oid::FLOAT8_ARRAY);
array_wire!(
    String,
    oid::TEXT,
    oid::TEXT_ARRAY,
    oid::TEXT_ARRAY | oid::VARCHAR_ARRAY | oid::BPCHAR_ARRAY | oid::NAME_ARRAY
);
array_wire!(
    crate::numeric::Numeric,
    oid::NUMERIC,
    oid::NUMERIC_ARRAY,
    oid::NUMERIC_ARRAY
);

// === Tuples as composites (binary format only) ===

macro_rules! tuple_wire {
    ($count:expr, $($idx:tt: $T:ident),+) => {
        impl<'a, $($T: FromWire<'a>),+> FromWire<'a> for ($($T,)+) {
            fn from_text(oid: Oid, _bytes: &'a [u8]) -> Result<Self> {
                // The composite text form does not carry field OIDs, so a
                // typed tuple cannot be decoded from it.
                Err(Error::no_scan_plan(oid, FormatCode::Text, "tuple"))
            }

            fn from_binary(_oid: Oid, bytes: &'a [u8]) -> Result<Self> {
                let (count, mut rest) = wire::read_i32(bytes)?;
                if count != $count {
                    return Err(Error::MalformedBinary(format!(
                        "composite payload has {count} fields but the tuple has {}",
                        $count
                    )));
                }
                let mut _index = 0usize;
                let out = ($({
                    let (field_oid, r) = wire::read_u32(rest)?;
                    let (payload, r) = wire::read_length_prefixed(r)
                        .map_err(|e| Error::composite_field("scan", _index, e))?;
                    rest = r;
                    let v = $T::from_wire(field_oid, FormatCode::Binary, payload)
                        .map_err(|e| Error::composite_field("scan", _index, e))?;
                    _index += 1;
                    v
                },)+);
                if !rest.is_empty() {
                    return Err(Error::MalformedBinary(format!(
                        "{} trailing bytes after composite fields",
                        rest.len()
                    )));
                }
                Ok(out)
            }
        }

        impl<$($T: ToWire),+> ToWire for ($($T,)+) {
            fn natural_oid(&self) -> Oid {
                oid::RECORD
            }

            fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
                if format != FormatCode::Binary {
                    return Err(Error::no_encode_plan(oid, format, "tuple"));
                }
                wire::write_i32(buf, $count);
                let mut _index = 0usize;
                $(
                    wire::write_u32(buf, self.$idx.natural_oid());
                    let slot = wire::reserve_length_slot(buf);
                    let is_null = self
                        .$idx
                        .encode(self.$idx.natural_oid(), FormatCode::Binary, buf)
                        .map_err(|e| Error::composite_field("encode", _index, e))?;
                    wire::patch_length_slot(buf, slot, is_null.is_null());
                    _index += 1;
                )+
                Ok(IsNull::No)
            }
        }
    };
}

tuple_wire!(1, 0: T0);
tuple_wire!(2, 0: T0, 1: T1);
tuple_wire!(3, 0: T0, 1: T1, 2: T2);
tuple_wire!(4, 0: T0, 1: T1, 2: T2, 3: T3);
tuple_wire!(5, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4);
tuple_wire!(6, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5);
tuple_wire!(7, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6);
tuple_wire!(8, 0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6, 7: T7);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_binary_roundtrip() {
        let v = vec![1_i32, 2, 3];
        let mut buf = Vec::new();
        v.encode(oid::INT4_ARRAY, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(Vec::<i32>::from_binary(oid::INT4_ARRAY, &buf).unwrap(), v);
    }

    #[test]
    fn test_vec_text_roundtrip() {
        let v = vec!["a".to_string(), "b,c".to_string(), "NULL".to_string()];
        let mut buf = Vec::new();
        v.encode(oid::TEXT_ARRAY, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(buf, br#"{a,"b,c","NULL"}"#);
        assert_eq!(Vec::<String>::from_text(oid::TEXT_ARRAY, &buf).unwrap(), v);
    }

    #[test]
    fn test_vec_option_nulls() {
        let v = vec![Some(1_i32), None, Some(3)];
        let mut buf = Vec::new();
        v.encode(oid::INT4_ARRAY, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(
            Vec::<Option<i32>>::from_binary(oid::INT4_ARRAY, &buf).unwrap(),
            v
        );

        // A non-nullable target rejects the NULL slot.
        let err = Vec::<i32>::from_binary(oid::INT4_ARRAY, &buf).unwrap_err();
        assert!(err.to_string().contains("array element 1"));
    }

    #[test]
    fn test_vec_text_null_token() {
        let v = Vec::<Option<i32>>::from_text(oid::INT4_ARRAY, b"{1,NULL,3}").unwrap();
        assert_eq!(v, vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn test_multi_dim_decode_flattens() {
        let nested = vec![vec![1_i32, 2, 3], vec![4, 5, 6]];
        let mut buf = Vec::new();
        nested.encode(oid::INT4_ARRAY, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(
            Vec::<i32>::from_binary(oid::INT4_ARRAY, &buf).unwrap(),
            vec![1, 2, 3, 4, 5, 6]
        );
    }

    #[test]
    fn test_nested_text_encode() {
        let nested = vec![vec![1_i32, 2, 3], vec![4, 5, 6]];
        let mut buf = Vec::new();
        nested.encode(oid::INT4_ARRAY, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(buf, b"{{1,2,3},{4,5,6}}");
    }

    #[test]
    fn test_ragged_rejected() {
        let ragged = vec![vec![1_i32, 2], vec![3]];
        let err = ragged
            .encode(oid::INT4_ARRAY, FormatCode::Binary, &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("ragged"));
        assert!(ragged
            .encode(oid::INT4_ARRAY, FormatCode::Text, &mut Vec::new())
            .is_err());
    }

    #[test]
    fn test_empty_vec() {
        let v: Vec<i32> = vec![];
        let mut buf = Vec::new();
        v.encode(oid::INT4_ARRAY, FormatCode::Binary, &mut buf).unwrap();
        assert_eq!(buf.len(), 12);
        assert!(Vec::<i32>::from_binary(oid::INT4_ARRAY, &buf).unwrap().is_empty());

        let mut buf = Vec::new();
        v.encode(oid::INT4_ARRAY, FormatCode::Text, &mut buf).unwrap();
        assert_eq!(buf, b"{}");
    }

    #[test]
    fn test_wrong_array_oid_rejected() {
        assert!(Vec::<i32>::from_binary(oid::INT8_ARRAY, &[0; 12]).is_err());
    }

    #[test]
    fn test_tuple_binary_roundtrip() {
        let v = ("hi".to_string(), 42_i32);
        let mut buf = Vec::new();
        v.encode(oid::RECORD, FormatCode::Binary, &mut buf).unwrap();
        let back: (String, i32) = FromWire::from_binary(oid::RECORD, &buf).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_tuple_with_null_field() {
        let v = (Some(1_i32), Option::<String>::None, 3_i64);
        let mut buf = Vec::new();
        v.encode(oid::RECORD, FormatCode::Binary, &mut buf).unwrap();
        let back: (Option<i32>, Option<String>, i64) =
            FromWire::from_binary(oid::RECORD, &buf).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_tuple_arity_mismatch() {
        let v = (1_i32, 2_i32);
        let mut buf = Vec::new();
        v.encode(oid::RECORD, FormatCode::Binary, &mut buf).unwrap();
        assert!(<(i32,)>::from_binary(oid::RECORD, &buf).is_err());
        assert!(<(i32, i32, i32)>::from_binary(oid::RECORD, &buf).is_err());
    }

    #[test]
    fn test_tuple_text_unsupported() {
        assert!(<(i32, i32)>::from_text(oid::RECORD, b"(1,2)").is_err());
    }
}
