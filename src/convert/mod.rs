//! Typed conversion traits.
//!
//! This is the statically-dispatched counterpart of the plan engine:
//! each `FromWire`/`ToWire` implementation is a conversion plan
//! monomorphized for one Rust type. `Option<T>` supplies the null
//! wrapper, the primitive implementations are the built-in wrappers, and
//! [`wire_newtype!`] forwards a newtype to its underlying primitive.
//!
//! The OID parameter lets implementations check the PostgreSQL type and
//! reject incompatible payloads with clear errors.

mod bytes;
mod containers;
mod primitives;
mod string;
mod values;

#[cfg(feature = "with-chrono")]
mod chrono;
#[cfg(feature = "with-rust-decimal")]
mod decimal;
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "with-uuid")]
mod uuid;

#[cfg(feature = "json")]
pub use json::Json;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::plan::IsNull;
use crate::registry::TypeRegistry;
use crate::types::{FormatCode, Oid};
use crate::value::Value;

/// Decode a PostgreSQL payload into a Rust value.
pub trait FromWire<'a>: Sized {
    /// Decode SQL NULL.
    ///
    /// The default rejects NULL; `Option<T>` overrides it.
    fn from_null() -> Result<Self> {
        Err(Error::UnrepresentableNull)
    }

    /// Decode from text format bytes.
    fn from_text(oid: Oid, bytes: &'a [u8]) -> Result<Self>;

    /// Decode from binary format bytes.
    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self>;

    /// Dispatch on format and null-ness.
    fn from_wire(oid: Oid, format: FormatCode, src: Option<&'a [u8]>) -> Result<Self> {
        match src {
            None => Self::from_null(),
            Some(bytes) => match format {
                FormatCode::Text => Self::from_text(oid, bytes),
                FormatCode::Binary => Self::from_binary(oid, bytes),
            },
        }
    }
}

/// Encode a Rust value as a PostgreSQL payload.
///
/// `encode` appends the payload bytes only and reports NULL through the
/// return value; the caller owns the 4-byte length prefix, exactly as
/// with dynamic encode plans.
pub trait ToWire {
    /// The OID this value naturally encodes to.
    fn natural_oid(&self) -> Oid;

    /// Append the payload for the given target OID and format.
    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull>;

    /// Append the payload for the natural OID.
    fn encode_natural(&self, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        self.encode(self.natural_oid(), format, buf)
    }
}

// === Option<T> - NULL handling ===

impl<'a, T: FromWire<'a>> FromWire<'a> for Option<T> {
    fn from_null() -> Result<Self> {
        Ok(None)
    }

    fn from_text(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        T::from_text(oid, bytes).map(Some)
    }

    fn from_binary(oid: Oid, bytes: &'a [u8]) -> Result<Self> {
        T::from_binary(oid, bytes).map(Some)
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn natural_oid(&self) -> Oid {
        match self {
            Some(v) => v.natural_oid(),
            None => 0, // Unknown/NULL
        }
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        match self {
            Some(v) => v.encode(oid, format, buf),
            None => Ok(IsNull::Yes),
        }
    }
}

// === Reference support ===

impl<T: ToWire + ?Sized> ToWire for &T {
    fn natural_oid(&self) -> Oid {
        (*self).natural_oid()
    }

    fn encode(&self, oid: Oid, format: FormatCode, buf: &mut Vec<u8>) -> Result<IsNull> {
        (*self).encode(oid, format, buf)
    }
}

/// Forward `FromWire`/`ToWire` through a newtype whose single field is a
/// wire-convertible type.
///
/// ```
/// use pgcodec::wire_newtype;
///
/// struct UserId(i64);
/// wire_newtype!(UserId => i64);
/// ```
///
/// A newtype that must not be treated as its underlying type simply does
/// not invoke the macro.
#[macro_export]
macro_rules! wire_newtype {
    ($name:ident => $inner:ty) => {
        impl<'a> $crate::convert::FromWire<'a> for $name {
            fn from_text(
                oid: $crate::types::Oid,
                bytes: &'a [u8],
            ) -> $crate::error::Result<Self> {
                <$inner as $crate::convert::FromWire<'a>>::from_text(oid, bytes).map($name)
            }

            fn from_binary(
                oid: $crate::types::Oid,
                bytes: &'a [u8],
            ) -> $crate::error::Result<Self> {
                <$inner as $crate::convert::FromWire<'a>>::from_binary(oid, bytes).map($name)
            }
        }

        impl $crate::convert::ToWire for $name {
            fn natural_oid(&self) -> $crate::types::Oid {
                $crate::convert::ToWire::natural_oid(&self.0)
            }

            fn encode(
                &self,
                oid: $crate::types::Oid,
                format: $crate::types::FormatCode,
                buf: &mut Vec<u8>,
            ) -> $crate::error::Result<$crate::plan::IsNull> {
                $crate::convert::ToWire::encode(&self.0, oid, format, buf)
            }
        }
    };
}

/// Drive a scalar codec without a populated registry. Scalar plans do
/// not consult the registry, so an empty one suffices.
pub(crate) fn codec_decode(
    codec: &dyn Codec,
    oid: Oid,
    format: FormatCode,
    bytes: &[u8],
) -> Result<Value> {
    let reg = TypeRegistry::new();
    codec.decode_value(&reg, oid, format, Some(bytes))
}

/// Encode through a scalar codec without a populated registry.
pub(crate) fn codec_encode(
    codec: &dyn Codec,
    oid: Oid,
    format: FormatCode,
    value: &Value,
    buf: &mut Vec<u8>,
) -> Result<IsNull> {
    let reg = TypeRegistry::new();
    let plan = codec
        .plan_encode(&reg, oid, format, value)
        .ok_or_else(|| Error::no_encode_plan(oid, format, value.kind_name()))?;
    plan.encode(&reg, value, buf)
}
