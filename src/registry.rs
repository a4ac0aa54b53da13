//! Type registry: the directory of OID-addressed codecs.
//!
//! A registry maps OIDs (and type names, and native value shapes) to
//! type descriptors, and is the entry point for planning and running
//! conversions. The intended discipline is populate-then-read-only:
//! registration takes `&mut self`, every conversion entry point takes
//! `&self`, so a registry shared behind an `Arc` is safe to use from any
//! number of threads once construction is done.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{
    ArrayCodec, BitsCodec, BoolCodec, BoxCodec, ByteaCodec, CircleCodec, Codec, CompositeCodec,
    CompositeField, DateCodec, EnumCodec, Float4Codec, Float8Codec, InetCodec, Int2Codec,
    Int4Codec, Int8Codec, IntervalCodec, JsonCodec, LineCodec, LineSegmentCodec, NumericCodec,
    PathCodec, PointCodec, PolygonCodec, QCharCodec, RangeCodec, RecordCodec, TextCodec,
    TimeCodec, TimestampCodec, UuidCodec,
};
use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::types::{FormatCode, Oid, oid};
use crate::value::{Value, ValueKind};

/// A registered type: name, OID, and the codec that converts it.
///
/// The name is informational; the OID is authoritative.
#[derive(Debug, Clone)]
pub struct PgType {
    name: String,
    oid: Oid,
    codec: Arc<dyn Codec>,
}

impl PgType {
    /// Build a descriptor.
    pub fn new(name: impl Into<String>, oid: Oid, codec: Arc<dyn Codec>) -> Self {
        PgType {
            name: name.into(),
            oid,
            codec,
        }
    }

    /// The catalog name of this type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The OID of this type.
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// The codec converting this type.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }
}

/// The directory of registered types and the conversion entry points.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    by_oid: HashMap<Oid, Arc<PgType>>,
    by_name: HashMap<String, Arc<PgType>>,
    default_kinds: HashMap<ValueKind, String>,
}

impl TypeRegistry {
    /// An empty registry with nothing registered.
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// A registry with every built-in type registered: all scalars,
    /// their array types, `record`, JSON/JSONB, and the built-in ranges.
    pub fn with_builtins() -> Self {
        let mut reg = TypeRegistry::new();
        reg.register_builtins();
        reg
    }

    /// Register a type descriptor, replacing any prior entry with the
    /// same OID.
    pub fn register_type(&mut self, name: impl Into<String>, type_oid: Oid, codec: Arc<dyn Codec>) {
        let name = name.into();
        if let Some(prior) = self.by_oid.remove(&type_oid) {
            self.by_name.remove(prior.name());
        }
        log::debug!("registering type {name} (oid {type_oid})");
        let ty = Arc::new(PgType::new(name.clone(), type_oid, codec));
        self.by_oid.insert(type_oid, Arc::clone(&ty));
        self.by_name.insert(name, ty);
    }

    /// Associate a native value shape with a preferred type name, used
    /// when encoding with OID 0 (type unknown to the caller).
    pub fn register_default_kind(&mut self, kind: ValueKind, name: impl Into<String>) {
        self.default_kinds.insert(kind, name.into());
    }

    /// Register an array type over an already-registered element type.
    pub fn register_array(
        &mut self,
        name: impl Into<String>,
        type_oid: Oid,
        element_oid: Oid,
    ) -> Result<()> {
        if !self.by_oid.contains_key(&element_oid) {
            return Err(Error::UnregisteredType(element_oid));
        }
        self.register_type(name, type_oid, Arc::new(ArrayCodec::new(element_oid)));
        Ok(())
    }

    /// Register a range type over an already-registered element type.
    pub fn register_range(
        &mut self,
        name: impl Into<String>,
        type_oid: Oid,
        element_oid: Oid,
    ) -> Result<()> {
        if !self.by_oid.contains_key(&element_oid) {
            return Err(Error::UnregisteredType(element_oid));
        }
        self.register_type(name, type_oid, Arc::new(RangeCodec::new(element_oid)));
        Ok(())
    }

    /// Register a composite type with the given ordered fields, each of
    /// an already-registered type.
    pub fn register_composite(
        &mut self,
        name: impl Into<String>,
        type_oid: Oid,
        fields: Vec<(String, Oid)>,
    ) -> Result<()> {
        for (_, field_oid) in &fields {
            if !self.by_oid.contains_key(field_oid) {
                return Err(Error::UnregisteredType(*field_oid));
            }
        }
        let fields = fields
            .into_iter()
            .map(|(field_name, field_oid)| CompositeField::new(field_name, field_oid))
            .collect();
        self.register_type(name, type_oid, Arc::new(CompositeCodec::new(fields)));
        Ok(())
    }

    /// Register an enum type restricted to the given labels. An empty
    /// label list accepts any text.
    pub fn register_enum(&mut self, name: impl Into<String>, type_oid: Oid, labels: Vec<String>) {
        self.register_type(name, type_oid, Arc::new(EnumCodec::new(labels)));
    }

    /// Look up a descriptor by OID.
    pub fn lookup_by_oid(&self, type_oid: Oid) -> Option<&Arc<PgType>> {
        self.by_oid.get(&type_oid)
    }

    /// Look up a descriptor by catalog name.
    pub fn lookup_by_name(&self, name: &str) -> Option<&Arc<PgType>> {
        self.by_name.get(name)
    }

    /// Look up the default descriptor for a native value shape.
    pub fn lookup_by_kind(&self, kind: ValueKind) -> Option<&Arc<PgType>> {
        let name = self.default_kinds.get(&kind)?;
        self.by_name.get(name)
    }

    /// Resolve the descriptor for a conversion: by OID, or via the
    /// default-kind table when the caller passes OID 0.
    fn resolve(&self, type_oid: Oid, kind: ValueKind) -> Option<&Arc<PgType>> {
        if type_oid != 0 {
            self.by_oid.get(&type_oid)
        } else {
            self.lookup_by_kind(kind)
        }
    }

    /// Build an encode plan for (oid, format, value shape).
    ///
    /// `None` means no plan was found; `encode` turns that into a
    /// `NoPlan` error, and a driver may instead fall back to a generic
    /// textual path.
    pub fn plan_encode(
        &self,
        type_oid: Oid,
        format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        let ty = self.resolve(type_oid, value.kind())?;
        if !ty.codec().format_supported(format) {
            return None;
        }
        let plan = ty.codec().plan_encode(self, ty.oid(), format, value);
        if plan.is_none() {
            log::trace!(
                "no encode plan: oid {} {:?} from {}",
                ty.oid(),
                format,
                value.kind_name()
            );
        }
        plan
    }

    /// Build a scan plan for (oid, format, target shape).
    pub fn plan_scan(
        &self,
        type_oid: Oid,
        format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        let ty = self.resolve(type_oid, target.kind())?;
        if !ty.codec().format_supported(format) {
            return None;
        }
        let plan = ty.codec().plan_scan(self, ty.oid(), format, target);
        if plan.is_none() {
            log::trace!(
                "no scan plan: oid {} {:?} into {}",
                ty.oid(),
                format,
                target.kind_name()
            );
        }
        plan
    }

    /// Plan and run an encode, appending the payload to `buf`.
    ///
    /// Returns `IsNull::Yes` (appending nothing) for SQL NULL; the
    /// caller owns the length prefix.
    pub fn encode(
        &self,
        type_oid: Oid,
        format: FormatCode,
        value: &Value,
        buf: &mut Vec<u8>,
    ) -> Result<IsNull> {
        let plan = self
            .plan_encode(type_oid, format, value)
            .ok_or_else(|| Error::no_encode_plan(type_oid, format, value.kind_name()))?;
        plan.encode(self, value, buf)
    }

    /// Plan and run a scan, overwriting `target` with the decoded
    /// payload (or `Value::Null` for an absent one).
    pub fn scan(
        &self,
        type_oid: Oid,
        format: FormatCode,
        src: Option<&[u8]>,
        target: &mut Value,
    ) -> Result<()> {
        let plan = self
            .plan_scan(type_oid, format, target)
            .ok_or_else(|| Error::no_scan_plan(type_oid, format, target.kind_name()))?;
        plan.scan(self, src, target)
    }

    /// Decode a payload into the type's natural shape.
    pub fn decode_value(
        &self,
        type_oid: Oid,
        format: FormatCode,
        src: Option<&[u8]>,
    ) -> Result<Value> {
        let ty = self
            .lookup_by_oid(type_oid)
            .ok_or_else(|| Error::no_scan_plan(type_oid, format, "Null"))?;
        ty.codec().decode_value(self, type_oid, format, src)
    }

    fn register_builtins(&mut self) {
        self.register_type("bool", oid::BOOL, Arc::new(BoolCodec));
        self.register_type("bytea", oid::BYTEA, Arc::new(ByteaCodec));
        self.register_type("char", oid::QCHAR, Arc::new(QCharCodec));
        self.register_type("name", oid::NAME, Arc::new(TextCodec));
        self.register_type("int8", oid::INT8, Arc::new(Int8Codec));
        self.register_type("int2", oid::INT2, Arc::new(Int2Codec));
        self.register_type("int4", oid::INT4, Arc::new(Int4Codec));
        self.register_type("text", oid::TEXT, Arc::new(TextCodec));
        self.register_type("unknown", oid::UNKNOWN, Arc::new(TextCodec));
        self.register_type("varchar", oid::VARCHAR, Arc::new(TextCodec));
        self.register_type("bpchar", oid::BPCHAR, Arc::new(TextCodec));
        self.register_type("float4", oid::FLOAT4, Arc::new(Float4Codec));
        self.register_type("float8", oid::FLOAT8, Arc::new(Float8Codec));
        self.register_type("numeric", oid::NUMERIC, Arc::new(NumericCodec));
        self.register_type("uuid", oid::UUID, Arc::new(UuidCodec));
        self.register_type("date", oid::DATE, Arc::new(DateCodec));
        self.register_type("time", oid::TIME, Arc::new(TimeCodec));
        self.register_type("timestamp", oid::TIMESTAMP, Arc::new(TimestampCodec::plain()));
        self.register_type(
            "timestamptz",
            oid::TIMESTAMPTZ,
            Arc::new(TimestampCodec::with_time_zone()),
        );
        self.register_type("interval", oid::INTERVAL, Arc::new(IntervalCodec));
        self.register_type("inet", oid::INET, Arc::new(InetCodec::inet()));
        self.register_type("cidr", oid::CIDR, Arc::new(InetCodec::cidr()));
        self.register_type("bit", oid::BIT, Arc::new(BitsCodec));
        self.register_type("varbit", oid::VARBIT, Arc::new(BitsCodec));
        self.register_type("point", oid::POINT, Arc::new(PointCodec));
        self.register_type("line", oid::LINE, Arc::new(LineCodec));
        self.register_type("lseg", oid::LSEG, Arc::new(LineSegmentCodec));
        self.register_type("box", oid::BOX, Arc::new(BoxCodec));
        self.register_type("path", oid::PATH, Arc::new(PathCodec));
        self.register_type("polygon", oid::POLYGON, Arc::new(PolygonCodec));
        self.register_type("circle", oid::CIRCLE, Arc::new(CircleCodec));
        self.register_type("json", oid::JSON, Arc::new(JsonCodec::json()));
        self.register_type("jsonb", oid::JSONB, Arc::new(JsonCodec::jsonb()));
        self.register_type("record", oid::RECORD, Arc::new(RecordCodec));

        // Array types. The element is always registered above, so the
        // guarded registration cannot fail here.
        let arrays: &[(&str, Oid, Oid)] = &[
            ("_bool", oid::BOOL_ARRAY, oid::BOOL),
            ("_bytea", oid::BYTEA_ARRAY, oid::BYTEA),
            ("_char", oid::QCHAR_ARRAY, oid::QCHAR),
            ("_name", oid::NAME_ARRAY, oid::NAME),
            ("_int2", oid::INT2_ARRAY, oid::INT2),
            ("_int4", oid::INT4_ARRAY, oid::INT4),
            ("_text", oid::TEXT_ARRAY, oid::TEXT),
            ("_bpchar", oid::BPCHAR_ARRAY, oid::BPCHAR),
            ("_varchar", oid::VARCHAR_ARRAY, oid::VARCHAR),
            ("_int8", oid::INT8_ARRAY, oid::INT8),
            ("_point", oid::POINT_ARRAY, oid::POINT),
            ("_lseg", oid::LSEG_ARRAY, oid::LSEG),
            ("_path", oid::PATH_ARRAY, oid::PATH),
            ("_box", oid::BOX_ARRAY, oid::BOX),
            ("_float4", oid::FLOAT4_ARRAY, oid::FLOAT4),
            ("_float8", oid::FLOAT8_ARRAY, oid::FLOAT8),
            ("_polygon", oid::POLYGON_ARRAY, oid::POLYGON),
            ("_line", oid::LINE_ARRAY, oid::LINE),
            ("_circle", oid::CIRCLE_ARRAY, oid::CIRCLE),
            ("_cidr", oid::CIDR_ARRAY, oid::CIDR),
            ("_inet", oid::INET_ARRAY, oid::INET),
            ("_date", oid::DATE_ARRAY, oid::DATE),
            ("_time", oid::TIME_ARRAY, oid::TIME),
            ("_timestamp", oid::TIMESTAMP_ARRAY, oid::TIMESTAMP),
            ("_timestamptz", oid::TIMESTAMPTZ_ARRAY, oid::TIMESTAMPTZ),
            ("_interval", oid::INTERVAL_ARRAY, oid::INTERVAL),
            ("_numeric", oid::NUMERIC_ARRAY, oid::NUMERIC),
            ("_bit", oid::BIT_ARRAY, oid::BIT),
            ("_varbit", oid::VARBIT_ARRAY, oid::VARBIT),
            ("_uuid", oid::UUID_ARRAY, oid::UUID),
            ("_json", oid::JSON_ARRAY, oid::JSON),
            ("_jsonb", oid::JSONB_ARRAY, oid::JSONB),
            ("_record", oid::RECORD_ARRAY, oid::RECORD),
        ];
        for &(name, array_oid, element_oid) in arrays {
            let _ = self.register_array(name, array_oid, element_oid);
        }

        // Range types.
        let ranges: &[(&str, Oid, Oid)] = &[
            ("int4range", oid::INT4RANGE, oid::INT4),
            ("int8range", oid::INT8RANGE, oid::INT8),
            ("numrange", oid::NUMRANGE, oid::NUMERIC),
            ("daterange", oid::DATERANGE, oid::DATE),
            ("tsrange", oid::TSRANGE, oid::TIMESTAMP),
            ("tstzrange", oid::TSTZRANGE, oid::TIMESTAMPTZ),
        ];
        for &(name, range_oid, element_oid) in ranges {
            let _ = self.register_range(name, range_oid, element_oid);
        }

        // Default shapes for encoding with OID 0.
        self.register_default_kind(ValueKind::Bool, "bool");
        self.register_default_kind(ValueKind::Bytes, "bytea");
        self.register_default_kind(ValueKind::QChar, "char");
        self.register_default_kind(ValueKind::Int2, "int2");
        self.register_default_kind(ValueKind::Int4, "int4");
        self.register_default_kind(ValueKind::Int8, "int8");
        self.register_default_kind(ValueKind::Float4, "float4");
        self.register_default_kind(ValueKind::Float8, "float8");
        self.register_default_kind(ValueKind::Text, "text");
        self.register_default_kind(ValueKind::Numeric, "numeric");
        self.register_default_kind(ValueKind::Uuid, "uuid");
        self.register_default_kind(ValueKind::Date, "date");
        self.register_default_kind(ValueKind::Time, "time");
        self.register_default_kind(ValueKind::Timestamp, "timestamp");
        self.register_default_kind(ValueKind::Interval, "interval");
        self.register_default_kind(ValueKind::Inet, "inet");
        self.register_default_kind(ValueKind::Bits, "varbit");
        self.register_default_kind(ValueKind::Point, "point");
        self.register_default_kind(ValueKind::Line, "line");
        self.register_default_kind(ValueKind::LineSegment, "lseg");
        self.register_default_kind(ValueKind::Box, "box");
        self.register_default_kind(ValueKind::Path, "path");
        self.register_default_kind(ValueKind::Polygon, "polygon");
        self.register_default_kind(ValueKind::Circle, "circle");
        self.register_default_kind(ValueKind::Json, "json");
        self.register_default_kind(ValueKind::Record, "record");
    }
}
