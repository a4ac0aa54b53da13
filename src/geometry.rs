//! Geometric value types and their PostgreSQL text notations.
//!
//! Binary layouts (concatenated IEEE-754 doubles) live in the geometric
//! codec; this module owns the data shapes and the parenthesised text
//! grammar: point `(x,y)`, line `{A,B,C}`, lseg `[(x1,y1),(x2,y2)]`,
//! box `(x1,y1),(x2,y2)`, path `[...]` open / `(...)` closed, polygon
//! `((x1,y1),...)`, circle `<(x,y),r>`. Non-finite coordinates are not
//! representable in the text channel and are rejected.

use std::fmt::Write as _;

use crate::error::{Error, Result};

/// A point on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// An infinite line `Ax + By + C = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Line {
    /// Coefficient A.
    pub a: f64,
    /// Coefficient B.
    pub b: f64,
    /// Coefficient C.
    pub c: f64,
}

/// A finite line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineSegment {
    /// First endpoint.
    pub start: Point,
    /// Second endpoint.
    pub end: Point,
}

/// A rectangle stored as two opposite corners.
///
/// Named `PgBox` because `Box` is taken by the prelude.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PgBox {
    /// First corner (the server normalises to upper right).
    pub p1: Point,
    /// Second corner (the server normalises to lower left).
    pub p2: Point,
}

/// An open or closed sequence of connected points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// The vertices in order.
    pub points: Vec<Point>,
    /// Whether the last point connects back to the first.
    pub closed: bool,
}

/// A closed polygon.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    /// The vertices in order.
    pub points: Vec<Point>,
}

/// A circle with center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Circle {
    /// Center point.
    pub center: Point,
    /// Radius.
    pub radius: f64,
}

/// Render a coordinate, rejecting values the text grammar cannot carry.
fn fmt_coord(out: &mut String, v: f64) -> Result<()> {
    if !v.is_finite() {
        return Err(Error::MalformedText(format!(
            "non-finite coordinate {v} has no text form"
        )));
    }
    let _ = write!(out, "{v}");
    Ok(())
}

/// Cursor over a geometric text payload.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Cursor { rest: s.trim() }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> Result<()> {
        self.skip_ws();
        let mut chars = self.rest.chars();
        match chars.next() {
            Some(found) if found == c => {
                self.rest = chars.as_str();
                Ok(())
            }
            _ => Err(Error::MalformedText(format!(
                "expected '{c}' at \"{}\"",
                self.rest
            ))),
        }
    }

    fn try_eat(&mut self, c: char) -> bool {
        self.skip_ws();
        let mut chars = self.rest.chars();
        if chars.next() == Some(c) {
            self.rest = chars.as_str();
            true
        } else {
            false
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest.chars().next()
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_ws();
        let end = self
            .rest
            .char_indices()
            .find(|&(_, c)| !matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'))
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        if token.is_empty() {
            return Err(Error::MalformedText(format!(
                "expected number at \"{}\"",
                self.rest
            )));
        }
        self.rest = rest;
        let v: f64 = token
            .parse()
            .map_err(|e| Error::MalformedText(format!("invalid number {token:?}: {e}")))?;
        if !v.is_finite() {
            return Err(Error::MalformedText(format!(
                "non-finite coordinate {token:?} is not allowed"
            )));
        }
        Ok(v)
    }

    /// Parse `x,y`, optionally wrapped in parentheses.
    fn point(&mut self) -> Result<Point> {
        let parenthesised = self.try_eat('(');
        let x = self.number()?;
        self.eat(',')?;
        let y = self.number()?;
        if parenthesised {
            self.eat(')')?;
        }
        Ok(Point { x, y })
    }

    fn finish(&mut self) -> Result<()> {
        self.skip_ws();
        if !self.rest.is_empty() {
            return Err(Error::MalformedText(format!(
                "trailing characters: \"{}\"",
                self.rest
            )));
        }
        Ok(())
    }
}

impl Point {
    /// Parse `(x,y)`.
    pub fn parse_text(s: &str) -> Result<Self> {
        let mut cur = Cursor::new(s);
        let p = cur.point()?;
        cur.finish()?;
        Ok(p)
    }

    /// Render `(x,y)`.
    pub fn to_text(self) -> Result<String> {
        let mut out = String::new();
        out.push('(');
        fmt_coord(&mut out, self.x)?;
        out.push(',');
        fmt_coord(&mut out, self.y)?;
        out.push(')');
        Ok(out)
    }
}

impl Line {
    /// Parse `{A,B,C}`.
    pub fn parse_text(s: &str) -> Result<Self> {
        let mut cur = Cursor::new(s);
        cur.eat('{')?;
        let a = cur.number()?;
        cur.eat(',')?;
        let b = cur.number()?;
        cur.eat(',')?;
        let c = cur.number()?;
        cur.eat('}')?;
        cur.finish()?;
        Ok(Line { a, b, c })
    }

    /// Render `{A,B,C}`.
    pub fn to_text(self) -> Result<String> {
        let mut out = String::new();
        out.push('{');
        fmt_coord(&mut out, self.a)?;
        out.push(',');
        fmt_coord(&mut out, self.b)?;
        out.push(',');
        fmt_coord(&mut out, self.c)?;
        out.push('}');
        Ok(out)
    }
}

impl LineSegment {
    /// Parse `[(x1,y1),(x2,y2)]` (brackets optional).
    pub fn parse_text(s: &str) -> Result<Self> {
        let mut cur = Cursor::new(s);
        let bracketed = cur.try_eat('[');
        let start = cur.point()?;
        cur.eat(',')?;
        let end = cur.point()?;
        if bracketed {
            cur.eat(']')?;
        }
        cur.finish()?;
        Ok(LineSegment { start, end })
    }

    /// Render `[(x1,y1),(x2,y2)]`.
    pub fn to_text(self) -> Result<String> {
        Ok(format!(
            "[{},{}]",
            self.start.to_text()?,
            self.end.to_text()?
        ))
    }
}

impl PgBox {
    /// Parse `(x1,y1),(x2,y2)`.
    pub fn parse_text(s: &str) -> Result<Self> {
        let mut cur = Cursor::new(s);
        let p1 = cur.point()?;
        cur.eat(',')?;
        let p2 = cur.point()?;
        cur.finish()?;
        Ok(PgBox { p1, p2 })
    }

    /// Render `(x1,y1),(x2,y2)`.
    pub fn to_text(self) -> Result<String> {
        Ok(format!("{},{}", self.p1.to_text()?, self.p2.to_text()?))
    }
}

impl Path {
    /// Parse `[...]` (open) or `(...)` (closed).
    pub fn parse_text(s: &str) -> Result<Self> {
        let mut cur = Cursor::new(s);
        let (open, close, closed) = if cur.try_eat('[') {
            ('[', ']', false)
        } else {
            cur.eat('(')?;
            ('(', ')', true)
        };
        let _ = open;
        let mut points = Vec::new();
        if cur.peek() != Some(close) {
            loop {
                points.push(cur.point()?);
                if !cur.try_eat(',') {
                    break;
                }
            }
        }
        cur.eat(close)?;
        cur.finish()?;
        Ok(Path { points, closed })
    }

    /// Render `[...]` or `(...)` depending on `closed`.
    pub fn to_text(&self) -> Result<String> {
        let (open, close) = if self.closed { ('(', ')') } else { ('[', ']') };
        let mut out = String::new();
        out.push(open);
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&p.to_text()?);
        }
        out.push(close);
        Ok(out)
    }
}

impl Polygon {
    /// Parse `((x1,y1),...)`.
    pub fn parse_text(s: &str) -> Result<Self> {
        let mut cur = Cursor::new(s);
        cur.eat('(')?;
        let mut points = Vec::new();
        if cur.peek() != Some(')') {
            loop {
                points.push(cur.point()?);
                if !cur.try_eat(',') {
                    break;
                }
            }
        }
        cur.eat(')')?;
        cur.finish()?;
        Ok(Polygon { points })
    }

    /// Render `((x1,y1),...)`.
    pub fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        out.push('(');
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&p.to_text()?);
        }
        out.push(')');
        Ok(out)
    }
}

impl Circle {
    /// Parse `<(x,y),r>`.
    pub fn parse_text(s: &str) -> Result<Self> {
        let mut cur = Cursor::new(s);
        cur.eat('<')?;
        let center = cur.point()?;
        cur.eat(',')?;
        let radius = cur.number()?;
        cur.eat('>')?;
        cur.finish()?;
        Ok(Circle { center, radius })
    }

    /// Render `<(x,y),r>`.
    pub fn to_text(self) -> Result<String> {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.center.to_text()?);
        out.push(',');
        fmt_coord(&mut out, self.radius)?;
        out.push('>');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_roundtrip() {
        let p = Point { x: 1.5, y: -2.25 };
        let text = p.to_text().unwrap();
        assert_eq!(text, "(1.5,-2.25)");
        assert_eq!(Point::parse_text(&text).unwrap(), p);
    }

    #[test]
    fn test_point_whitespace() {
        let p = Point::parse_text(" ( 1 , 2 ) ").unwrap();
        assert_eq!(p, Point { x: 1.0, y: 2.0 });
    }

    #[test]
    fn test_point_rejects_infinity() {
        assert!(Point::parse_text("(Infinity,0)").is_err());
        assert!(Point { x: f64::INFINITY, y: 0.0 }.to_text().is_err());
    }

    #[test]
    fn test_line_roundtrip() {
        let l = Line { a: 1.0, b: -1.0, c: 0.5 };
        let text = l.to_text().unwrap();
        assert_eq!(text, "{1,-1,0.5}");
        assert_eq!(Line::parse_text(&text).unwrap(), l);
    }

    #[test]
    fn test_lseg_roundtrip() {
        let seg = LineSegment {
            start: Point { x: 0.0, y: 0.0 },
            end: Point { x: 3.0, y: 4.0 },
        };
        let text = seg.to_text().unwrap();
        assert_eq!(text, "[(0,0),(3,4)]");
        assert_eq!(LineSegment::parse_text(&text).unwrap(), seg);
    }

    #[test]
    fn test_box_roundtrip() {
        let b = PgBox {
            p1: Point { x: 2.0, y: 2.0 },
            p2: Point { x: 0.0, y: 0.0 },
        };
        let text = b.to_text().unwrap();
        assert_eq!(text, "(2,2),(0,0)");
        assert_eq!(PgBox::parse_text(&text).unwrap(), b);
    }

    #[test]
    fn test_path_open_and_closed() {
        let open = Path {
            points: vec![Point { x: 1.0, y: 2.0 }, Point { x: 3.0, y: 4.0 }],
            closed: false,
        };
        let text = open.to_text().unwrap();
        assert_eq!(text, "[(1,2),(3,4)]");
        assert_eq!(Path::parse_text(&text).unwrap(), open);

        let closed = Path {
            points: open.points.clone(),
            closed: true,
        };
        let text = closed.to_text().unwrap();
        assert_eq!(text, "((1,2),(3,4))");
        assert_eq!(Path::parse_text(&text).unwrap(), closed);
    }

    #[test]
    fn test_polygon_roundtrip() {
        let poly = Polygon {
            points: vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 1.0, y: 0.0 },
                Point { x: 0.5, y: 1.0 },
            ],
        };
        let text = poly.to_text().unwrap();
        assert_eq!(text, "((0,0),(1,0),(0.5,1))");
        assert_eq!(Polygon::parse_text(&text).unwrap(), poly);
    }

    #[test]
    fn test_circle_roundtrip() {
        let c = Circle {
            center: Point { x: 1.0, y: 2.0 },
            radius: 3.5,
        };
        let text = c.to_text().unwrap();
        assert_eq!(text, "<(1,2),3.5>");
        assert_eq!(Circle::parse_text(&text).unwrap(), c);
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(Point::parse_text("(1,2)x").is_err());
        assert!(Circle::parse_text("<(1,2),3> ,").is_err());
    }
}
