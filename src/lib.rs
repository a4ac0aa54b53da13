//! PostgreSQL wire-format type codecs and conversion planning.
//!
//! This crate is the type-conversion core of a PostgreSQL client: it
//! translates, in both directions, between the typed byte payloads of
//! the frontend/backend protocol and Rust values. It performs no I/O —
//! a protocol layer hands it (OID, format, payload) triples and buffers
//! to fill.
//!
//! # Layers
//!
//! - [`TypeRegistry`] maps OIDs, type names, and native value shapes to
//!   codecs, and is the planning entry point.
//! - [`codec`] holds the wire codecs, including the n-dimensional array,
//!   composite, numeric, range, and JSON/JSONB codecs.
//! - [`Value`] is the dynamic value sum the plans convert through.
//! - [`convert`] is the statically-typed counterpart: `FromWire` and
//!   `ToWire` implementations for Rust types, with chrono, uuid,
//!   rust_decimal, and serde integrations behind features.
//!
//! # Example
//!
//! ```
//! use pgcodec::{FormatCode, TypeRegistry, Value, oid};
//!
//! fn main() -> pgcodec::Result<()> {
//!     let registry = TypeRegistry::with_builtins();
//!
//!     // Encode an int4 parameter.
//!     let mut buf = Vec::new();
//!     registry.encode(oid::INT4, FormatCode::Binary, &Value::Int4(42), &mut buf)?;
//!     assert_eq!(buf, 42_i32.to_be_bytes());
//!
//!     // Scan a column payload back.
//!     let mut out = Value::Null;
//!     registry.scan(oid::INT4, FormatCode::Binary, Some(&buf), &mut out)?;
//!     assert_eq!(out, Value::Int4(42));
//!     Ok(())
//! }
//! ```

// private
mod geometry;
mod numeric;
mod value;

// pub
pub mod codec;
pub mod convert;
pub mod error;
pub mod plan;
pub mod registry;
pub mod types;
pub mod wire;

pub use convert::{FromWire, ToWire};
pub use error::{Error, Result};
pub use geometry::{Circle, Line, LineSegment, Path, PgBox, Point, Polygon};
pub use numeric::{FiniteNumeric, Numeric};
pub use plan::{EncodePlan, IsNull, ScanPlan};
pub use registry::{PgType, TypeRegistry};
pub use types::{FormatCode, Oid, oid};
pub use value::{
    ArrayDimension, ArrayValue, BitString, BoundKind, Date, Inet, Interval, RangeValue,
    RecordValue, Timestamp, Value, ValueKind,
};
