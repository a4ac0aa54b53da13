//! Enum codec.
//!
//! The wire payload of an enum value is its label text in both formats.
//! A codec registered with declared labels rejects anything outside the
//! set; an empty label list passes any string through.

use crate::error::{Error, Result};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::{FormatCode, Oid};
use crate::value::{Value, ValueKind};

use super::{Codec, encode_plan, scan_plan, utf8};

/// Codec for a user-registered enum type.
#[derive(Debug, Clone, Default)]
pub struct EnumCodec {
    labels: Vec<String>,
}

impl EnumCodec {
    /// Build an enum codec. An empty label list accepts any text.
    pub fn new(labels: Vec<String>) -> Self {
        EnumCodec { labels }
    }

    /// The declared labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn check(&self, label: &str) -> Result<()> {
        if self.labels.is_empty() || self.labels.iter().any(|l| l == label) {
            Ok(())
        } else {
            Err(Error::out_of_range(
                format!("{label:?}"),
                "declared enum labels",
            ))
        }
    }
}

impl Codec for EnumCodec {
    fn format_supported(&self, _format: FormatCode) -> bool {
        true
    }

    fn preferred_format(&self) -> FormatCode {
        FormatCode::Text
    }

    fn plan_encode(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        _format: FormatCode,
        value: &Value,
    ) -> Option<Box<dyn EncodePlan>> {
        if !matches!(
            value.kind(),
            ValueKind::Null | ValueKind::Text | ValueKind::EnumLabel
        ) {
            return None;
        }
        let codec = self.clone();
        encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
            let label = match value {
                Value::Null => return Ok(IsNull::Yes),
                Value::Text(s) | Value::EnumLabel(s) => s,
                other => return Err(Error::out_of_range(other.kind_name(), "enum")),
            };
            codec.check(label)?;
            buf.extend_from_slice(label.as_bytes());
            Ok(IsNull::No)
        })
    }

    fn plan_scan(
        &self,
        _registry: &TypeRegistry,
        _oid: Oid,
        _format: FormatCode,
        target: &Value,
    ) -> Option<Box<dyn ScanPlan>> {
        let kind = target.kind();
        if !matches!(kind, ValueKind::Null | ValueKind::Text | ValueKind::EnumLabel) {
            return None;
        }
        let codec = self.clone();
        scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
            let Some(bytes) = src else {
                *out = Value::Null;
                return Ok(());
            };
            let label = utf8(bytes)?;
            codec.check(label)?;
            *out = match kind {
                ValueKind::Text => Value::Text(label.to_owned()),
                _ => Value::EnumLabel(label.to_owned()),
            };
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood() -> EnumCodec {
        EnumCodec::new(vec!["sad".into(), "ok".into(), "happy".into()])
    }

    #[test]
    fn test_declared_label_roundtrip() {
        let reg = TypeRegistry::new();
        let codec = mood();
        let value = Value::EnumLabel("ok".into());
        let plan = codec.plan_encode(&reg, 0, FormatCode::Text, &value).unwrap();
        let mut buf = Vec::new();
        plan.encode(&reg, &value, &mut buf).unwrap();
        assert_eq!(buf, b"ok");

        let plan = codec.plan_scan(&reg, 0, FormatCode::Text, &Value::Null).unwrap();
        let mut out = Value::Null;
        plan.scan(&reg, Some(b"happy"), &mut out).unwrap();
        assert_eq!(out, Value::EnumLabel("happy".into()));
    }

    #[test]
    fn test_undeclared_label_rejected() {
        let reg = TypeRegistry::new();
        let codec = mood();
        let value = Value::EnumLabel("angry".into());
        let plan = codec.plan_encode(&reg, 0, FormatCode::Text, &value).unwrap();
        assert!(plan.encode(&reg, &value, &mut Vec::new()).is_err());

        let plan = codec.plan_scan(&reg, 0, FormatCode::Text, &Value::Null).unwrap();
        assert!(plan.scan(&reg, Some(b"angry"), &mut Value::Null).is_err());
    }

    #[test]
    fn test_unrestricted_passthrough() {
        let reg = TypeRegistry::new();
        let codec = EnumCodec::default();
        let plan = codec.plan_scan(&reg, 0, FormatCode::Text, &Value::Null).unwrap();
        let mut out = Value::Null;
        plan.scan(&reg, Some(b"anything"), &mut out).unwrap();
        assert_eq!(out, Value::EnumLabel("anything".into()));
    }
}
