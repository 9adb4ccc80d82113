//! Geometric primitives for piping coordinates
//!
//! All coordinates are millimetres on the plant axes E (east), N (north) and
//! U (up). Vector arithmetic goes through `nalgebra::Vector3`; `Coord` is the
//! serialized form carried by points.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Fixed epsilon for exact-equality style comparisons
pub const EPSILON: f64 = 1e-6;

/// Unit suffixes stripped before numeric parsing (matched case-insensitively)
const UNIT_SUFFIXES: &[&str] = &["kg/m", "barg", "bar", "kpa", "mpa", "psi", "deg", "mm", "kg", "nb"];

/// Axis labels in index order
pub const AXIS_NAMES: [&str; 3] = ["E", "N", "U"];

/// A point in plant coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Coord {
    pub e: f64,
    pub n: f64,
    pub u: f64,
}

impl From<[f64; 3]> for Coord {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Coord> for [f64; 3] {
    fn from(c: Coord) -> Self {
        [c.e, c.n, c.u]
    }
}

impl Coord {
    pub const fn new(e: f64, n: f64, u: f64) -> Self {
        Self { e, n, u }
    }

    pub fn vector(&self) -> Vector3<f64> {
        Vector3::new(self.e, self.n, self.u)
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Value on axis 0 (E), 1 (N) or 2 (U)
    pub fn axis(&self, index: usize) -> f64 {
        match index {
            0 => self.e,
            1 => self.n,
            _ => self.u,
        }
    }

    /// Copy with one axis replaced
    pub fn with_axis(mut self, index: usize, value: f64) -> Self {
        match index {
            0 => self.e = value,
            1 => self.n = value,
            _ => self.u = value,
        }
        self
    }

    pub fn distance(&self, other: &Coord) -> f64 {
        distance(self, other)
    }

    /// True when within `tolerance` (Euclidean) of `other`
    pub fn coincides(&self, other: &Coord, tolerance: f64) -> bool {
        distance(self, other) <= tolerance
    }

    /// Point at parameter `t` along the segment from `self` to `to`
    pub fn lerp(&self, to: &Coord, t: f64) -> Coord {
        Coord::from_vector(&(self.vector() + (to.vector() - self.vector()) * t))
    }
}

/// `a - b`
pub fn sub(a: &Coord, b: &Coord) -> Vector3<f64> {
    a.vector() - b.vector()
}

pub fn dot(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b)
}

pub fn magnitude(v: &Vector3<f64>) -> f64 {
    v.norm()
}

/// 3-D Euclidean distance
pub fn distance(a: &Coord, b: &Coord) -> f64 {
    magnitude(&sub(a, b))
}

/// Unit vector, or `None` for a (near) zero-length input
pub fn unit(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let len = v.norm();
    if len > EPSILON {
        Some(v / len)
    } else {
        None
    }
}

/// Scalar equality within the fixed epsilon
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Component-wise vector equality within the fixed epsilon
pub fn approx_eq_coord(a: &Coord, b: &Coord) -> bool {
    approx_eq(a.e, b.e) && approx_eq(a.n, b.n) && approx_eq(a.u, b.u)
}

/// Result of parsing a raw measurement field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Value(f64),
    /// Unparsable input; reads as zero
    Sentinel,
}

impl Measure {
    pub fn value(self) -> f64 {
        match self {
            Measure::Value(v) => v,
            Measure::Sentinel => 0.0,
        }
    }

    pub fn is_sentinel(self) -> bool {
        matches!(self, Measure::Sentinel)
    }
}

/// Parse a coordinate or bore string, stripping known unit suffixes
///
/// Never fails: unparsable text yields `Measure::Sentinel`. Reporting the
/// sentinel is the caller's job.
pub fn parse_measure(raw: &str) -> Measure {
    let mut text = raw.trim();
    let lower = text.to_ascii_lowercase();
    for suffix in UNIT_SUFFIXES {
        if lower.ends_with(suffix) {
            text = text[..text.len() - suffix.len()].trim_end();
            break;
        }
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Measure::Value(v),
        _ => Measure::Sentinel,
    }
}

/// Format a coordinate value with trailing zeros trimmed (4 decimals max)
pub fn format_coord(value: f64) -> String {
    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Fixed-width `(E N U [bore])` token
pub fn point_token(pos: &Coord, bore: Option<f64>) -> String {
    let mut s = format!(
        "({:>12} {:>12} {:>12}",
        format_coord(pos.e),
        format_coord(pos.n),
        format_coord(pos.u)
    );
    if let Some(b) = bore {
        s.push_str(&format!(" {:>8}", format_coord(b)));
    }
    s.push(')');
    s
}
