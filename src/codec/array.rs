//! N-dimensional array codec, parameterized by element type.
//!
//! Binary layout: array header (see [`crate::wire`]) followed by the
//! row-major element stream of (length, bytes) slots, length -1 for a
//! NULL slot. Text layout: nested `{...}` lists with double-quoted
//! elements where the content requires it and the bare token `NULL` for
//! a NULL slot.

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::{FormatCode, Oid};
use crate::value::{ArrayValue, Value, ValueKind};
use crate::wire::{self, ArrayDimension, ArrayHeader};

use super::{Codec, encode_plan, scan_plan, utf8};

/// Codec for an array type over one element type.
#[derive(Debug, Clone, Copy)]
pub struct ArrayCodec {
    element_oid: Oid,
}

impl ArrayCodec {
    /// Build an array codec over the given element OID. The registry
    /// guarantees the element is registered before this is reachable.
    pub fn new(element_oid: Oid) -> Self {
        ArrayCodec { element_oid }
    }

    /// The element type OID.
    pub fn element_oid(&self) -> Oid {
        self.element_oid
    }
}

fn check_cardinality(arr: &ArrayValue) -> Result<()> {
    let expected: usize = if arr.dims.is_empty() {
        0
    } else {
        arr.dims.iter().map(|d| d.len as usize).product()
    };
    if arr.elements.len() != expected {
        return Err(Error::MalformedBinary(format!(
            "array has {} elements but dimensions require {}",
            arr.elements.len(),
            expected
        )));
    }
    Ok(())
}

fn encode_array_binary(
    registry: &TypeRegistry,
    element_oid: Oid,
    arr: &ArrayValue,
    buf: &mut Vec<u8>,
) -> Result<()> {
    check_cardinality(arr)?;
    wire::write_array_header(
        buf,
        &ArrayHeader {
            dims: arr.dims.clone(),
            contains_nulls: arr.contains_nulls(),
            element_oid,
        },
    );
    for (i, element) in arr.elements.iter().enumerate() {
        let slot = wire::reserve_length_slot(buf);
        let is_null = registry
            .encode(element_oid, FormatCode::Binary, element, buf)
            .map_err(|e| Error::array_element("encode", i, e))?;
        wire::patch_length_slot(buf, slot, is_null.is_null());
    }
    Ok(())
}

fn decode_array_binary(
    registry: &TypeRegistry,
    element_oid: Oid,
    bytes: &[u8],
) -> Result<ArrayValue> {
    let (header, mut rest) = wire::read_array_header(bytes)?;
    let cardinality = header.cardinality();

    let element_ty = registry
        .lookup_by_oid(element_oid)
        .ok_or(Error::UnregisteredType(element_oid))?;
    let plan = element_ty
        .codec()
        .plan_scan(registry, element_oid, FormatCode::Binary, &Value::Null)
        .ok_or_else(|| Error::no_scan_plan(element_oid, FormatCode::Binary, "Null"))?;

    let mut elements = Vec::with_capacity(cardinality);
    for i in 0..cardinality {
        let (payload, r) = wire::read_length_prefixed(rest)
            .map_err(|e| Error::array_element("scan", i, e))?;
        rest = r;
        let mut slot = Value::Null;
        plan.scan(registry, payload, &mut slot)
            .map_err(|e| Error::array_element("scan", i, e))?;
        elements.push(slot);
    }
    if !rest.is_empty() {
        return Err(Error::MalformedBinary(format!(
            "{} trailing bytes after array elements",
            rest.len()
        )));
    }
    ArrayValue::new(header.dims, elements)
}

/// Quote an element iff the raw text would be ambiguous: empty, edged
/// with whitespace, containing a structural character, or spelling NULL.
pub(crate) fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || s.eq_ignore_ascii_case("null") {
        return true;
    }
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }
    s.bytes()
        .any(|b| matches!(b, b',' | b'{' | b'}' | b'"' | b'\\'))
}

pub(crate) fn push_quoted(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for &b in s.as_bytes() {
        if b == b'"' || b == b'\\' {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b'"');
}

fn encode_array_text(
    registry: &TypeRegistry,
    element_oid: Oid,
    arr: &ArrayValue,
    buf: &mut Vec<u8>,
) -> Result<()> {
    check_cardinality(arr)?;
    if arr.dims.is_empty() {
        buf.extend_from_slice(b"{}");
        return Ok(());
    }

    // Per-dimension stride multiples: dims [3,5,2] -> [30,10,2].
    let mut strides = vec![0usize; arr.dims.len()];
    let mut acc = 1usize;
    for (i, dim) in arr.dims.iter().enumerate().rev() {
        acc *= dim.len as usize;
        strides[i] = acc;
    }
    let total = strides[0];

    let mut scratch = Vec::new();
    for i in 0..total {
        for &stride in &strides {
            if i % stride == 0 {
                buf.push(b'{');
            }
        }

        let element = &arr.elements[i];
        if element.is_null() {
            buf.extend_from_slice(b"NULL");
        } else {
            scratch.clear();
            registry
                .encode(element_oid, FormatCode::Text, element, &mut scratch)
                .map_err(|e| Error::array_element("encode", i, e))?;
            let text = utf8(&scratch)
                .map_err(|e| Error::array_element("encode", i, e))?;
            if needs_quoting(text) {
                push_quoted(buf, text);
            } else {
                buf.extend_from_slice(text.as_bytes());
            }
        }

        let mut closed_outermost = false;
        for &stride in &strides {
            if (i + 1) % stride == 0 {
                buf.push(b'}');
                if stride == total {
                    closed_outermost = true;
                }
            }
        }
        if !closed_outermost {
            buf.push(b',');
        }
    }
    Ok(())
}

/// One node of the nested-brace parse.
enum Node {
    Leaf(Option<String>),
    List(Vec<Node>),
}

struct TextParser<'a> {
    rest: &'a str,
}

impl<'a> TextParser<'a> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let mut chars = self.rest.chars();
        let c = chars.next();
        self.rest = chars.as_str();
        c
    }

    fn parse_list(&mut self) -> Result<Node> {
        self.skip_ws();
        if self.bump() != Some('{') {
            return Err(Error::MalformedText("array text must start with '{'".into()));
        }
        let mut items = Vec::new();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Node::List(items));
        }
        loop {
            items.push(self.parse_item()?);
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(Node::List(items));
                }
                _ => {
                    return Err(Error::MalformedText(format!(
                        "expected ',' or '}}' at \"{}\"",
                        self.rest
                    )));
                }
            }
        }
    }

    fn parse_item(&mut self) -> Result<Node> {
        match self.peek() {
            Some('{') => self.parse_list(),
            Some('"') => Ok(Node::Leaf(Some(self.parse_quoted()?))),
            Some(_) => self.parse_bare(),
            None => Err(Error::MalformedText("unterminated array text".into())),
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => {
                        return Err(Error::MalformedText(
                            "unterminated escape in array text".into(),
                        ));
                    }
                },
                Some('"') => {
                    // "" is a literal quote; anything else ends the span.
                    if self.rest.starts_with('"') {
                        self.bump();
                        out.push('"');
                    } else {
                        return Ok(out);
                    }
                }
                Some(c) => out.push(c),
                None => {
                    return Err(Error::MalformedText(
                        "unterminated quoted array element".into(),
                    ));
                }
            }
        }
    }

    fn parse_bare(&mut self) -> Result<Node> {
        self.skip_ws();
        let end = memchr::memchr2(b',', b'}', self.rest.as_bytes())
            .ok_or_else(|| Error::MalformedText("unterminated array element".into()))?;
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        let token = token.trim_end();
        if token.contains(['{', '"']) {
            return Err(Error::MalformedText(format!(
                "unquoted array element contains structural character: {token:?}"
            )));
        }
        if token.eq_ignore_ascii_case("null") {
            Ok(Node::Leaf(None))
        } else {
            Ok(Node::Leaf(Some(token.to_string())))
        }
    }
}

/// Flatten a parse tree, enforcing rectangular shape.
fn flatten(node: &Node, dims: &mut Vec<ArrayDimension>, depth: usize) -> Result<Vec<Option<String>>> {
    match node {
        Node::Leaf(_) => Err(Error::MalformedText(
            "array text nests elements inconsistently".into(),
        )),
        Node::List(items) => {
            let len = items.len() as i32;
            if depth == dims.len() {
                dims.push(ArrayDimension { len, lower_bound: 1 });
            } else if dims[depth].len != len {
                return Err(Error::MalformedText(
                    "ragged multi-dimensional array text".into(),
                ));
            }
            // A level mixes leaves and sublists only in malformed input.
            let has_leaf = items.iter().any(|i| matches!(i, Node::Leaf(_)));
            let has_list = items.iter().any(|i| matches!(i, Node::List(_)));
            if has_leaf && has_list {
                return Err(Error::MalformedText(
                    "array text nests elements inconsistently".into(),
                ));
            }
            let mut out = Vec::new();
            for item in items {
                match item {
                    Node::Leaf(token) => {
                        if depth + 1 != dims.len() {
                            return Err(Error::MalformedText(
                                "array text nests elements inconsistently".into(),
                            ));
                        }
                        out.push(token.clone());
                    }
                    list @ Node::List(_) => {
                        out.extend(flatten(list, dims, depth + 1)?);
                    }
                }
            }
            Ok(out)
        }
    }
}

/// Parse array text into dimensions and flat raw element tokens.
pub(crate) fn parse_array_text(s: &str) -> Result<(Vec<ArrayDimension>, Vec<Option<String>>)> {
    let mut parser = TextParser { rest: s };
    let tree = parser.parse_list()?;
    parser.skip_ws();
    if !parser.rest.is_empty() {
        return Err(Error::MalformedText(format!(
            "trailing characters after array: \"{}\"",
            parser.rest
        )));
    }
    if let Node::List(items) = &tree {
        if items.is_empty() {
            return Ok((vec![], vec![]));
        }
    }
    let mut dims = Vec::new();
    let tokens = flatten(&tree, &mut dims, 0)?;
    Ok((dims, tokens))
}

fn decode_array_text(
    registry: &TypeRegistry,
    element_oid: Oid,
    s: &str,
) -> Result<ArrayValue> {
    let (dims, tokens) = parse_array_text(s)?;

    let element_ty = registry
        .lookup_by_oid(element_oid)
        .ok_or(Error::UnregisteredType(element_oid))?;
    let plan = element_ty
        .codec()
        .plan_scan(registry, element_oid, FormatCode::Text, &Value::Null)
        .ok_or_else(|| Error::no_scan_plan(element_oid, FormatCode::Text, "Null"))?;

    let mut elements = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let mut slot = Value::Null;
        plan.scan(registry, token.as_deref().map(str::as_bytes), &mut slot)
            .map_err(|e| Error::array_element("scan", i, e))?;
        elements.push(slot);
    }
    ArrayValue::new(dims, elements)
}

impl Codec for ArrayCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Binary
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(value.kind(), ValueKind::Null | ValueKind::Array) {
            return None;
        }
        let element_oid = self.element_oid;
        encode_plan(move |reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let arr = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Array(arr) => arr,
                other => return Err(Error::out_of_range(other.kind_name(), "array")),
            };
            match format {
                FormatCode::Binary => encode_array_binary(reg, element_oid, arr, buf)?,
                FormatCode::Text => encode_array_text(reg, element_oid, arr, buf)?,
            }
            Ok(IsNull::No)
        })
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        if !matches!(target.kind(), ValueKind::Null | ValueKind::Array) {
            return None;
        }
        let element_oid = self.element_oid;
        scan_plan(move |reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let arr = match format {
                FormatCode::Binary => decode_array_binary(reg, element_oid, bytes)?,
                FormatCode::Text => decode_array_text(reg, element_oid, utf8(bytes)?)?,
            };
            *out = Value::Array(arr);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::oid;

    fn reg() -> TypeRegistry {
        TypeRegistry::with_builtins()
    }

    fn int_array(values: &[i32]) -> ArrayValue {
        ArrayValue::one_dim(values.iter().map(|&v| Value::Int4(v)).collect())
    }

    #[test]
    fn test_binary_roundtrip_one_dim() {
        let reg = reg();
        let arr = int_array(&[1, 2, 3]);
        let mut buf = Vec::new();
        encode_array_binary(&reg, oid::INT4, &arr, &mut buf).unwrap();
        let decoded = decode_array_binary(&reg, oid::INT4, &buf).unwrap();
        assert_eq!(decoded, arr);
    }

    #[test]
    fn test_binary_roundtrip_two_dim_with_null() {
        let reg = reg();
        let arr = ArrayValue::new(
            vec![
                ArrayDimension { len: 2, lower_bound: 1 },
                ArrayDimension { len: 2, lower_bound: 1 },
            ],
            vec![Value::Int4(1), Value::Null, Value::Int4(3), Value::Int4(4)],
        )
        .unwrap();
        let mut buf = Vec::new();
        encode_array_binary(&reg, oid::INT4, &arr, &mut buf).unwrap();

        // The contains-nulls flag is set.
        let (header, _) = wire::read_array_header(&buf).unwrap();
        assert!(header.contains_nulls);

        let decoded = decode_array_binary(&reg, oid::INT4, &buf).unwrap();
        assert_eq!(decoded, arr);
    }

    #[test]
    fn test_binary_empty_array() {
        let reg = reg();
        let arr = ArrayValue::one_dim(vec![]);
        let mut buf = Vec::new();
        encode_array_binary(&reg, oid::INT4, &arr, &mut buf).unwrap();
        assert_eq!(buf.len(), 12); // header only, no dimension records
        let decoded = decode_array_binary(&reg, oid::INT4, &buf).unwrap();
        assert!(decoded.dims.is_empty());
        assert!(decoded.elements.is_empty());
    }

    #[test]
    fn test_binary_cardinality_mismatch_rejected() {
        let reg = reg();
        let arr = ArrayValue {
            dims: vec![ArrayDimension { len: 3, lower_bound: 1 }],
            elements: vec![Value::Int4(1)],
        };
        let mut buf = Vec::new();
        assert!(encode_array_binary(&reg, oid::INT4, &arr, &mut buf).is_err());
    }

    #[test]
    fn test_text_encode_two_dim() {
        let reg = reg();
        let arr = ArrayValue::new(
            vec![
                ArrayDimension { len: 2, lower_bound: 1 },
                ArrayDimension { len: 3, lower_bound: 1 },
            ],
            [1, 2, 3, 4, 5, 6].iter().map(|&v| Value::Int4(v)).collect(),
        )
        .unwrap();
        let mut buf = Vec::new();
        encode_array_text(&reg, oid::INT4, &arr, &mut buf).unwrap();
        assert_eq!(buf, b"{{1,2,3},{4,5,6}}");
    }

    #[test]
    fn test_text_decode_two_dim() {
        let reg = reg();
        let arr = decode_array_text(&reg, oid::INT4, "{{1,2,3},{4,5,6}}").unwrap();
        assert_eq!(
            arr.dims,
            vec![
                ArrayDimension { len: 2, lower_bound: 1 },
                ArrayDimension { len: 3, lower_bound: 1 },
            ]
        );
        assert_eq!(
            arr.elements,
            [1, 2, 3, 4, 5, 6].iter().map(|&v| Value::Int4(v)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_text_ragged_rejected() {
        let reg = reg();
        assert!(decode_array_text(&reg, oid::INT4, "{{1,2},{3}}").is_err());
        assert!(decode_array_text(&reg, oid::INT4, "{1,{2}}").is_err());
    }

    #[test]
    fn test_text_null_elements() {
        let reg = reg();
        let arr = decode_array_text(&reg, oid::INT4, "{1,NULL,3}").unwrap();
        assert_eq!(
            arr.elements,
            vec![Value::Int4(1), Value::Null, Value::Int4(3)]
        );
        // Case-insensitive.
        let arr = decode_array_text(&reg, oid::INT4, "{null}").unwrap();
        assert_eq!(arr.elements, vec![Value::Null]);
    }

    #[test]
    fn test_text_quoting_of_tricky_strings() {
        let reg = reg();
        let arr = ArrayValue::one_dim(vec![
            Value::Text("plain".into()),
            Value::Text("".into()),
            Value::Text("with,comma".into()),
            Value::Text("NULL".into()),
            Value::Text(" padded ".into()),
            Value::Text("q\"b\\s".into()),
        ]);
        let mut buf = Vec::new();
        encode_array_text(&reg, oid::TEXT, &arr, &mut buf).unwrap();
        assert_eq!(
            buf,
            br#"{plain,"","with,comma","NULL"," padded ","q\"b\\s"}"#.to_vec()
        );

        let decoded = decode_array_text(&reg, oid::TEXT, std::str::from_utf8(&buf).unwrap())
            .unwrap();
        assert_eq!(decoded, arr);
    }

    #[test]
    fn test_text_quoted_null_is_a_string() {
        // A quoted "NULL" stays a string; only the bare token is SQL NULL.
        let reg = reg();
        let arr = decode_array_text(&reg, oid::TEXT, r#"{"NULL",NULL}"#).unwrap();
        assert_eq!(
            arr.elements,
            vec![Value::Text("NULL".into()), Value::Null]
        );
    }

    #[test]
    fn test_text_empty_array() {
        let reg = reg();
        let arr = decode_array_text(&reg, oid::INT4, "{}").unwrap();
        assert!(arr.dims.is_empty());
        let mut buf = Vec::new();
        encode_array_text(&reg, oid::INT4, &ArrayValue::one_dim(vec![]), &mut buf).unwrap();
        assert_eq!(buf, b"{}");
    }

    #[test]
    fn test_text_trailing_garbage_rejected() {
        let reg = reg();
        assert!(decode_array_text(&reg, oid::INT4, "{1,2}x").is_err());
        assert!(decode_array_text(&reg, oid::INT4, "{1,2").is_err());
    }

    #[test]
    fn test_format_equivalence() {
        let reg = reg();
        let arr = int_array(&[7, -3, 0]);

        let mut text = Vec::new();
        encode_array_text(&reg, oid::INT4, &arr, &mut text).unwrap();
        let from_text =
            decode_array_text(&reg, oid::INT4, std::str::from_utf8(&text).unwrap()).unwrap();

        let mut binary = Vec::new();
        encode_array_binary(&reg, oid::INT4, &arr, &mut binary).unwrap();
        let from_binary = decode_array_binary(&reg, oid::INT4, &binary).unwrap();

        assert_eq!(from_text, from_binary);
    }

    #[test]
    fn test_element_error_is_contextual() {
        let reg = reg();
        let err = decode_array_text(&reg, oid::INT4, "{1,abc,3}").unwrap_err();
        assert!(err.to_string().contains("array element 1"));
    }
}
