//! Error types for pgcodec.

use thiserror::Error;

use crate::types::{FormatCode, Oid};

/// Result type for pgcodec operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for pgcodec.
///
/// Every conversion entry point returns `Result`; plans never panic and
/// never unwind. Outer plans wrap inner errors with the element or field
/// position that failed so a caller can tell which slot of an array,
/// composite, or range produced the error.
#[derive(Debug, Error)]
pub enum Error {
    /// No codec/plan combination matches (oid, format, target shape).
    #[error("no {direction} plan for oid {oid} in {format:?} format with {kind} value")]
    NoPlan {
        /// "encode" or "scan".
        direction: &'static str,
        /// The unresolved type OID.
        oid: Oid,
        /// The requested wire format.
        format: FormatCode,
        /// Name of the native value shape involved.
        kind: &'static str,
    },

    /// Fixed-width type received a payload of the wrong length.
    #[error("invalid {ty} length: {len} (expected {expected})")]
    LengthMismatch {
        /// PostgreSQL type name.
        ty: &'static str,
        /// Actual payload length in bytes.
        len: usize,
        /// Expected payload length in bytes.
        expected: usize,
    },

    /// Payload value cannot fit the requested native target.
    #[error("{value} out of range for {target}")]
    ValueOutOfRange {
        /// Description of the source value.
        value: String,
        /// Name of the target type.
        target: &'static str,
    },

    /// Payload is NULL but the target has no NULL representation.
    #[error("unexpected NULL value for non-nullable target")]
    UnrepresentableNull,

    /// Text payload violates its grammar.
    #[error("malformed text value: {0}")]
    MalformedText(String),

    /// Binary payload truncated, header inconsistent, or otherwise invalid.
    #[error("malformed binary value: {0}")]
    MalformedBinary(String),

    /// A caller-provided JSON marshal/unmarshal reported an error.
    #[error("marshal error: {0}")]
    Marshal(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A registration referenced an OID with no registered type.
    #[error("oid {0} is not registered")]
    UnregisteredType(Oid),

    /// An array element failed to encode or scan.
    #[error("failed to {op} array element {index}: {source}")]
    ArrayElement {
        /// "encode" or "scan".
        op: &'static str,
        /// Zero-based element position in row-major order.
        index: usize,
        /// The element codec's error.
        #[source]
        source: Box<Error>,
    },

    /// A composite field failed to encode or scan.
    #[error("failed to {op} composite field {index}: {source}")]
    CompositeField {
        /// "encode" or "scan".
        op: &'static str,
        /// Zero-based field position.
        index: usize,
        /// The field codec's error.
        #[source]
        source: Box<Error>,
    },

    /// A range bound failed to encode or scan.
    #[error("failed to {op} {bound} range bound: {source}")]
    RangeBound {
        /// "encode" or "scan".
        op: &'static str,
        /// "lower" or "upper".
        bound: &'static str,
        /// The bound codec's error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Build a `NoPlan` error for the encode direction.
    pub fn no_encode_plan(oid: Oid, format: FormatCode, kind: &'static str) -> Self {
        Error::NoPlan {
            direction: "encode",
            oid,
            format,
            kind,
        }
    }

    /// Build a `NoPlan` error for the scan direction.
    pub fn no_scan_plan(oid: Oid, format: FormatCode, kind: &'static str) -> Self {
        Error::NoPlan {
            direction: "scan",
            oid,
            format,
            kind,
        }
    }

    /// Build a `LengthMismatch` error.
    pub fn length(ty: &'static str, len: usize, expected: usize) -> Self {
        Error::LengthMismatch { ty, len, expected }
    }

    /// Build a `ValueOutOfRange` error from a displayable source value.
    pub fn out_of_range(value: impl std::fmt::Display, target: &'static str) -> Self {
        Error::ValueOutOfRange {
            value: value.to_string(),
            target,
        }
    }

    /// Wrap an element error with its array position.
    pub fn array_element(op: &'static str, index: usize, source: Error) -> Self {
        Error::ArrayElement {
            op,
            index,
            source: Box::new(source),
        }
    }

    /// Wrap a field error with its composite position.
    pub fn composite_field(op: &'static str, index: usize, source: Error) -> Self {
        Error::CompositeField {
            op,
            index,
            source: Box::new(source),
        }
    }

    /// Wrap a bound error with its range side.
    pub fn range_bound(op: &'static str, bound: &'static str, source: Error) -> Self {
        Error::RangeBound {
            op,
            bound,
            source: Box::new(source),
        }
    }

    /// Returns true if this error (or its root cause) is a missing plan.
    pub fn is_no_plan(&self) -> bool {
        match self {
            Error::NoPlan { .. } => true,
            Error::ArrayElement { source, .. }
            | Error::CompositeField { source, .. }
            | Error::RangeBound { source, .. } => source.is_no_plan(),
            _ => false,
        }
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}
