//! Angle and direction utilities
//!
//! Direction names are for human-readable annotation only; topology decisions
//! never depend on them.

use crate::core::geometry::{sub, Coord, EPSILON};

/// Deflection reported for degenerate legs
pub const DEGENERATE_ANGLE: f64 = 90.0;

/// Secondary axis is named when it reaches this share of the primary
const SECONDARY_AXIS_RATIO: f64 = 0.3;

/// Default per-axis displacement above which travel counts on that axis
pub const DEFAULT_SKEW_THRESHOLD: f64 = 6.0;

/// Deflection angle at a vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendAngle {
    pub degrees: f64,
    /// A leg was (near) zero length; `degrees` is the fallback
    pub degenerate: bool,
}

/// Deflection angle at `vertex` between the legs `leg1 -> vertex` and `vertex -> leg2`
///
/// A straight pass-through is 0°, a square elbow 90°. Callers must flag
/// degenerate results.
pub fn compute_angle(leg1: &Coord, vertex: &Coord, leg2: &Coord) -> BendAngle {
    let incoming = sub(vertex, leg1);
    let outgoing = sub(leg2, vertex);
    let (l1, l2) = (incoming.norm(), outgoing.norm());
    if l1 < EPSILON || l2 < EPSILON {
        return BendAngle {
            degrees: DEGENERATE_ANGLE,
            degenerate: true,
        };
    }
    let cos = (incoming.dot(&outgoing) / (l1 * l2)).clamp(-1.0, 1.0);
    BendAngle {
        degrees: cos.acos().to_degrees(),
        degenerate: false,
    }
}

/// Compass / vertical direction along one plant axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    East,
    West,
    North,
    South,
    Up,
    Down,
}

impl Direction {
    fn along(axis: usize, positive: bool) -> Self {
        match (axis, positive) {
            (0, true) => Direction::East,
            (0, false) => Direction::West,
            (1, true) => Direction::North,
            (1, false) => Direction::South,
            (_, true) => Direction::Up,
            (_, false) => Direction::Down,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::East => write!(f, "EAST"),
            Direction::West => write!(f, "WEST"),
            Direction::North => write!(f, "NORTH"),
            Direction::South => write!(f, "SOUTH"),
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// Axis index with the largest absolute displacement, or `None` when coincident
pub fn dominant_axis(from: &Coord, to: &Coord) -> Option<usize> {
    let d = sub(to, from);
    let mut best = None;
    let mut best_mag = EPSILON;
    for axis in 0..3 {
        if d[axis].abs() > best_mag {
            best_mag = d[axis].abs();
            best = Some(axis);
        }
    }
    best
}

/// Direction of greatest displacement from `from` to `to`
pub fn dominant_direction(from: &Coord, to: &Coord) -> Option<Direction> {
    let axis = dominant_axis(from, to)?;
    Some(Direction::along(axis, to.axis(axis) > from.axis(axis)))
}

/// Human-readable direction, e.g. `NORTH` or `NORTH-EAST`
///
/// A secondary axis is appended when its displacement is at least 30% of the
/// primary one.
pub fn direction_text(from: &Coord, to: &Coord) -> String {
    let Some(primary) = dominant_axis(from, to) else {
        return "NONE".to_string();
    };
    let d = sub(to, from);
    let primary_dir = Direction::along(primary, d[primary] > 0.0);

    let secondary = (0..3)
        .filter(|&axis| axis != primary)
        .max_by(|&a, &b| d[a].abs().total_cmp(&d[b].abs()))
        .filter(|&axis| d[axis].abs() >= SECONDARY_AXIS_RATIO * d[primary].abs());

    match secondary {
        Some(axis) => format!("{}-{}", primary_dir, Direction::along(axis, d[axis] > 0.0)),
        None => primary_dir.to_string(),
    }
}

/// Number of axes whose displacement exceeds `threshold`
pub fn travel_axes(from: &Coord, to: &Coord, threshold: f64) -> usize {
    let d = sub(to, from);
    (0..3).filter(|&axis| d[axis].abs() > threshold).count()
}

/// Travel on two or more axes at once
pub fn is_skew(from: &Coord, to: &Coord, threshold: f64) -> bool {
    travel_axes(from, to, threshold) >= 2
}

/// Heuristic missing vertex for skewed travel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerInference {
    pub corner: Coord,
    /// Axis taken from the destination
    pub axis: usize,
}

/// Best-effort vertex between two points with skewed travel
///
/// Takes the destination value on the dominant axis and the source value on
/// the others. Not guaranteed correct; every use must be reported.
pub fn infer_corner(from: &Coord, to: &Coord) -> Option<CornerInference> {
    let axis = dominant_axis(from, to)?;
    Some(CornerInference {
        corner: from.with_axis(axis, to.axis(axis)),
        axis,
    })
}
