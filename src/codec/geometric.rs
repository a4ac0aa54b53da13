//! Geometric codecs: point, line, lseg, box, path, polygon, circle.
//!
//! Binary layouts are concatenated IEEE-754 doubles; path carries a
//! leading closed-flag byte and path/polygon a point count. Text forms
//! are the parenthesised notations owned by [`crate::geometry`].

use crate::error::{Error, Result};
use crate::geometry::{Circle, Line, LineSegment, Path, PgBox, Point, Polygon};
use crate::plan::{EncodePlan, IsNull, ScanPlan};
use crate::registry::TypeRegistry;
use crate::types::FormatCode;
use crate::value::{Value, ValueKind};
use crate::wire;

use super::{Codec, encode_plan, scan_plan, utf8};

fn read_point(data: &[u8]) -> Result<(Point, &[u8])> {
    let (x, rest) = wire::read_f64(data)?;
    let (y, rest) = wire::read_f64(rest)?;
    Ok((Point { x, y }, rest))
}

fn write_point(out: &mut Vec<u8>, p: Point) {
    wire::write_f64(out, p.x);
    wire::write_f64(out, p.y);
}

macro_rules! geo_codec {
    ($codec:ident, $pg_name:literal, $ty:ident, $kind:ident, $variant:ident,
     $decode_binary:expr, $encode_binary:expr, $parse_text:expr, $to_text:expr) => {
        /// Geometric codec; see the module docs for the layouts.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $codec;

        impl Codec for $codec {
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
                if !matches!(value.kind(), ValueKind::Null | ValueKind::$kind) {
                    return None;
                }
                encode_plan(move |_reg: &TypeRegistry, value: &Value, buf: &mut Vec<u8>| {
                    let v = match value {
                        Value::Null => return Ok(IsNull::Yes),
                        Value::$variant(v) => v,
                        other => return Err(Error::out_of_range(other.kind_name(), $pg_name)),
                    };
                    match format {
                        FormatCode::Binary => ($encode_binary)(v, buf)?,
                        FormatCode::Text => {
                            let text: String = ($to_text)(v)?;
                            buf.extend_from_slice(text.as_bytes());
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
                if !matches!(target.kind(), ValueKind::Null | ValueKind::$kind) {
                    return None;
                }
                scan_plan(move |_reg: &TypeRegistry, src: Option<&[u8]>, out: &mut Value| {
                    let Some(bytes) = src else {
                        *out = Value::Null;
                        return Ok(());
                    };
                    let v: $ty = match format {
                        FormatCode::Binary => ($decode_binary)(bytes)?,
                        FormatCode::Text => ($parse_text)(utf8(bytes)?)?,
                    };
                    *out = Value::$variant(v);
                    Ok(())
                })
            }
        }
    };
}

fn decode_point_binary(bytes: &[u8]) -> Result<Point> {
    if bytes.len() != 16 {
        return Err(Error::length("point", bytes.len(), 16));
    }
    let (p, _) = read_point(bytes)?;
    Ok(p)
}

fn encode_point_binary(p: &Point, buf: &mut Vec<u8>) -> Result<()> {
    write_point(buf, *p);
    Ok(())
}

geo_codec!(
    PointCodec,
    "point",
    Point,
    Point,
    Point,
    decode_point_binary,
    encode_point_binary,
    Point::parse_text,
    |p: &Point| p.to_text()
);

fn decode_line_binary(bytes: &[u8]) -> Result<Line> {
    if bytes.len() != 24 {
        return Err(Error::length("line", bytes.len(), 24));
    }
    let (a, rest) = wire::read_f64(bytes)?;
    let (b, rest) = wire::read_f64(rest)?;
    let (c, _) = wire::read_f64(rest)?;
    Ok(Line { a, b, c })
}

fn encode_line_binary(l: &Line, buf: &mut Vec<u8>) -> Result<()> {
    wire::write_f64(buf, l.a);
    wire::write_f64(buf, l.b);
    wire::write_f64(buf, l.c);
    Ok(())
}

geo_codec!(
    LineCodec,
    "line",
    Line,
    Line,
    Line,
    decode_line_binary,
    encode_line_binary,
    Line::parse_text,
    |l: &Line| l.to_text()
);

fn decode_lseg_binary(bytes: &[u8]) -> Result<LineSegment> {
    if bytes.len() != 32 {
        return Err(Error::length("lseg", bytes.len(), 32));
    }
    let (start, rest) = read_point(bytes)?;
    let (end, _) = read_point(rest)?;
    Ok(LineSegment { start, end })
}

fn encode_lseg_binary(seg: &LineSegment, buf: &mut Vec<u8>) -> Result<()> {
    write_point(buf, seg.start);
    write_point(buf, seg.end);
    Ok(())
}

geo_codec!(
    LineSegmentCodec,
    "lseg",
    LineSegment,
    LineSegment,
    LineSegment,
    decode_lseg_binary,
    encode_lseg_binary,
    LineSegment::parse_text,
    |seg: &LineSegment| seg.to_text()
);

fn decode_box_binary(bytes: &[u8]) -> Result<PgBox> {
    if bytes.len() != 32 {
        return Err(Error::length("box", bytes.len(), 32));
    }
    let (p1, rest) = read_point(bytes)?;
    let (p2, _) = read_point(rest)?;
    Ok(PgBox { p1, p2 })
}

fn encode_box_binary(b: &PgBox, buf: &mut Vec<u8>) -> Result<()> {
    write_point(buf, b.p1);
    write_point(buf, b.p2);
    Ok(())
}

geo_codec!(
    BoxCodec,
    "box",
    PgBox,
    Box,
    Box,
    decode_box_binary,
    encode_box_binary,
    PgBox::parse_text,
    |b: &PgBox| b.to_text()
);

fn decode_path_binary(bytes: &[u8]) -> Result<Path> {
    let (closed, rest) = wire::read_u8(bytes)?;
    let (npts, mut rest) = wire::read_i32(rest)?;
    if npts < 0 {
        return Err(Error::MalformedBinary(format!(
            "negative path point count {npts}"
        )));
    }
    let mut points = Vec::with_capacity(npts as usize);
    for _ in 0..npts {
        let (p, r) = read_point(rest)?;
        points.push(p);
        rest = r;
    }
    if !rest.is_empty() {
        return Err(Error::MalformedBinary("trailing bytes after path".into()));
    }
    Ok(Path {
        points,
        closed: closed != 0,
    })
}

fn encode_path_binary(path: &Path, buf: &mut Vec<u8>) -> Result<()> {
    wire::write_u8(buf, u8::from(path.closed));
    wire::write_i32(buf, path.points.len() as i32);
    for p in &path.points {
        write_point(buf, *p);
    }
    Ok(())
}

geo_codec!(
    PathCodec,
    "path",
    Path,
    Path,
    Path,
    decode_path_binary,
    encode_path_binary,
    Path::parse_text,
    |p: &Path| p.to_text()
);

fn decode_polygon_binary(bytes: &[u8]) -> Result<Polygon> {
    let (npts, mut rest) = wire::read_i32(bytes)?;
    if npts < 0 {
        return Err(Error::MalformedBinary(format!(
            "negative polygon point count {npts}"
        )));
    }
    let mut points = Vec::with_capacity(npts as usize);
    for _ in 0..npts {
        let (p, r) = read_point(rest)?;
        points.push(p);
        rest = r;
    }
    if !rest.is_empty() {
        return Err(Error::MalformedBinary("trailing bytes after polygon".into()));
    }
    Ok(Polygon { points })
}

fn encode_polygon_binary(poly: &Polygon, buf: &mut Vec<u8>) -> Result<()> {
    wire::write_i32(buf, poly.points.len() as i32);
    for p in &poly.points {
        write_point(buf, *p);
    }
    Ok(())
}

geo_codec!(
    PolygonCodec,
    "polygon",
    Polygon,
    Polygon,
    Polygon,
    decode_polygon_binary,
    encode_polygon_binary,
    Polygon::parse_text,
    |p: &Polygon| p.to_text()
);

fn decode_circle_binary(bytes: &[u8]) -> Result<Circle> {
    if bytes.len() != 24 {
        return Err(Error::length("circle", bytes.len(), 24));
    }
    let (center, rest) = read_point(bytes)?;
    let (radius, _) = wire::read_f64(rest)?;
    Ok(Circle { center, radius })
}

fn encode_circle_binary(c: &Circle, buf: &mut Vec<u8>) -> Result<()> {
    write_point(buf, c.center);
    wire::write_f64(buf, c.radius);
    Ok(())
}

geo_codec!(
    CircleCodec,
    "circle",
    Circle,
    Circle,
    Circle,
    decode_circle_binary,
    encode_circle_binary,
    Circle::parse_text,
    |c: &Circle| c.to_text()
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_binary_roundtrip() {
        let p = Point { x: 1.5, y: -2.5 };
        let mut buf = Vec::new();
        encode_point_binary(&p, &mut buf).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(decode_point_binary(&buf).unwrap(), p);
    }

    #[test]
    fn test_line_binary_roundtrip() {
        let l = Line { a: 1.0, b: -1.0, c: 0.25 };
        let mut buf = Vec::new();
        encode_line_binary(&l, &mut buf).unwrap();
        assert_eq!(decode_line_binary(&buf).unwrap(), l);
    }

    #[test]
    fn test_path_binary_roundtrip() {
        let path = Path {
            points: vec![Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }],
            closed: true,
        };
        let mut buf = Vec::new();
        encode_path_binary(&path, &mut buf).unwrap();
        assert_eq!(buf.len(), 1 + 4 + 2 * 16);
        assert_eq!(decode_path_binary(&buf).unwrap(), path);
    }

    #[test]
    fn test_polygon_binary_roundtrip() {
        let poly = Polygon {
            points: vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 1.0, y: 0.0 },
                Point { x: 0.5, y: 1.0 },
            ],
        };
        let mut buf = Vec::new();
        encode_polygon_binary(&poly, &mut buf).unwrap();
        assert_eq!(decode_polygon_binary(&buf).unwrap(), poly);
    }

    #[test]
    fn test_circle_binary_roundtrip() {
        let c = Circle {
            center: Point { x: 1.0, y: 2.0 },
            radius: 3.0,
        };
        let mut buf = Vec::new();
        encode_circle_binary(&c, &mut buf).unwrap();
        assert_eq!(decode_circle_binary(&buf).unwrap(), c);
    }

    #[test]
    fn test_truncated_binary_rejected() {
        assert!(decode_point_binary(&[0; 15]).is_err());
        assert!(decode_box_binary(&[0; 31]).is_err());
        assert!(decode_path_binary(&[1, 0, 0, 0, 2, 0]).is_err());
    }
}
