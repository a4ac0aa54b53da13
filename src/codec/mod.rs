//! Wire codecs.
//!
//! A codec converts between the byte payload of one PostgreSQL type and
//! the dynamic [`Value`] sum, by producing encode and scan plans for a
//! concrete (OID, format, shape) triple. Containers (arrays, composites,
//! ranges) obtain their element codecs through the registry.

mod array;
mod bits;
mod composite;
mod enum_label;
mod geometric;
mod json;
mod net;
mod numeric;
mod range;
mod scalar;
mod temporal;

pub use array::ArrayCodec;
pub use bits::BitsCodec;
pub use composite::{CompositeCodec, CompositeField, RecordCodec};
pub use enum_label::EnumCodec;
pub use geometric::{
    BoxCodec, CircleCodec, LineCodec, LineSegmentCodec, PathCodec, PointCodec, PolygonCodec,
};
pub use json::JsonCodec;
pub use net::InetCodec;
pub use numeric::NumericCodec;
pub use range::RangeCodec;
pub use scalar::{
    BoolCodec, ByteaCodec, Float4Codec, Float8Codec, Int2Codec, Int4Codec, Int8Codec, QCharCodec,
    TextCodec, UuidCodec,
};
pub use temporal::{DateCodec, IntervalCodec, TimeCodec, TimestampCodec};

pub(crate) use array::{
    needs_quoting as array_needs_quoting, parse_array_text, push_quoted as array_push_quoted,
};
pub(crate) use json::strip_jsonb_version;
pub(crate) use numeric::{decode_numeric_binary, encode_numeric_binary};

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::{FormatCode, Oid};
use crate::value::{Value, ValueKind};

/// A wire codec for one PostgreSQL type.
pub trait Codec: Send + Sync + std::fmt::Debug {
    /// Whether this codec can convert the given wire format.
    fn format_supported(&self, format: FormatCode) -> bool;

    /// The format this codec prefers: binary where a fixed-width layout
    /// exists, text otherwise.
    fn preferred_format(&self) -> FormatCode;

    /// Build an encode plan for a value of the given shape, or `None`
    /// when this codec cannot encode that shape in that format.
    fn plan_encode(
        &self,
        registry: &TypeRegistry,
        oid: Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>>;

    /// Build a scan plan for the given target shape, or `None` when this
    /// codec cannot produce that shape in that format. A `Value::Null`
    /// target requests the codec's natural shape (generic decode).
    fn plan_scan(
        &self,
        registry: &TypeRegistry,
        oid: Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>>;

    /// Decode a payload into the codec's natural shape. `None` input is
    /// SQL NULL and yields `Value::Null`.
    fn decode_value(
        &self,
        registry: &TypeRegistry,
        oid: Oid,
        format: FormatCode,
        src: Option<&[u8]>,
    ) -> Result<Value> {
        if src.is_none() {
            return Ok(Value::Null);
        }
        let target = Value::Null;
        let plan = self
            .plan_scan(registry, oid, format, &target)
            .ok_or_else(|| Error::no_scan_plan(oid, format, "Null"))?;
        let mut out = Value::Null;
        plan.scan(registry, src, &mut out)?;
        Ok(out)
    }
}

/// Wrap a stateless closure as a boxed encode plan.
pub(crate) fn encode_plan<F>(f: F) -> Option<Box<dyn EncodePlan>>
where
    F: Fn(&TypeRegistry, &Value, &mut Vec<u8>) -> Result<crate::plan::IsNull>
        + Send
        + Sync
        + 'static,
{
    Some(Box::new(f))
}

/// Wrap a stateless closure as a boxed scan plan.
pub(crate) fn scan_plan<F>(f: F) -> Option<Box<dyn ScanPlan>>
where
    F: Fn(&TypeRegistry, Option<&[u8]>, &mut Value) -> Result<()> + Send + Sync + 'static,
{
    Some(Box::new(f))
}

/// Validate a text payload as UTF-8.
pub(crate) fn utf8(bytes: &[u8]) -> Result<&str> {
    simdutf8::compat::from_utf8(bytes)
        .map_err(|e| Error::MalformedText(format!("invalid UTF-8: {e}")))
}

/// Coerce a decoded value into the shape the scan target asked for.
///
/// A `Null` target kind accepts the natural shape unchanged. Integer
/// shapes cross-convert with range checks; floats widen freely and
/// narrow with an overflow check; numeric converts to the machine shapes
/// it fits. Everything else must match exactly.
pub(crate) fn coerce_into(target: ValueKind, value: Value) -> Result<Value> {
    if target == ValueKind::Null || value.kind() == target || value.is_null() {
        return Ok(value);
    }
    match (target, value) {
        (ValueKind::Int2, v) => Ok(Value::Int2(narrow_int(&v, target)?)),
        (ValueKind::Int4, v) => Ok(Value::Int4(narrow_int(&v, target)?)),
        (ValueKind::Int8, v) => Ok(Value::Int8(narrow_int(&v, target)?)),
        (ValueKind::Float8, Value::Float4(v)) => Ok(Value::Float8(v as f64)),
        (ValueKind::Float8, Value::Numeric(n)) => Ok(Value::Float8(n.to_f64())),
        (ValueKind::Float8, v) => {
            let wide = v.as_int().ok_or_else(|| mismatch(target, &v))?;
            Ok(Value::Float8(wide as f64))
        }
        (ValueKind::Float4, Value::Float8(v)) => Ok(Value::Float4(narrow_float(v)?)),
        (ValueKind::Float4, Value::Numeric(n)) => Ok(Value::Float4(narrow_float(n.to_f64())?)),
        (ValueKind::Text, Value::EnumLabel(s)) => Ok(Value::Text(s)),
        (ValueKind::EnumLabel, Value::Text(s)) => Ok(Value::EnumLabel(s)),
        (t, v) => Err(mismatch(t, &v)),
    }
}

/// Pull a signed integer out of an integer or whole-numeric value and
/// fit it to the target width.
fn narrow_int<T>(value: &Value, target: ValueKind) -> Result<T>
where
    T: TryFrom<i64>,
{
    let wide = match value {
        Value::Numeric(n) => n.to_i64()?,
        other => other.as_int().ok_or_else(|| mismatch(target, other))?,
    };
    T::try_from(wide).map_err(|_| Error::out_of_range(wide, target.name()))
}

fn narrow_float(v: f64) -> Result<f32> {
    let narrowed = v as f32;
    if narrowed.is_infinite() && v.is_finite() {
        return Err(Error::out_of_range(v, "float4"));
    }
    Ok(narrowed)
}

fn mismatch(target: ValueKind, value: &Value) -> Error {
    Error::out_of_range(
        format!("{} value", value.kind_name()),
        target.name(),
    )
}
