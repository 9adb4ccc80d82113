//! Split strategies for runs that engulf other components
//!
//! Each strategy inspects one run and reports either that it found no inner
//! components (`Attempt::NoOccupants`, so the next strategy is tried) or the
//! un-occupied intervals that should become sub-runs.

use std::collections::HashSet;

use nalgebra::Vector3;
use tracing::trace;

use crate::core::config::Settings;
use crate::core::direction::{dominant_axis, is_skew};
use crate::core::geometry::{distance, sub, Coord, EPSILON};
use crate::entities::component::Component;
use crate::entities::point::Point;

/// Hard cap on path-chain trace steps
pub const TRACE_STEP_CAP: usize = 64;

/// Occupied interval of one inner component along a run's axis
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub refno: String,
    /// Offset of the entry along the axis
    pub entry: f64,
    /// Offset of the exit along the axis
    pub exit: f64,
    pub entry_pos: Coord,
    pub exit_pos: Coord,
}

impl Span {
    pub fn length(&self) -> f64 {
        self.exit - self.entry
    }
}

/// Un-occupied stretch of a run that becomes a sub-run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub from: Coord,
    pub to: Coord,
}

impl Interval {
    pub fn length(&self) -> f64 {
        distance(&self.from, &self.to)
    }
}

/// Outcome of one strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// Nothing engulfed as far as this strategy can tell
    NoOccupants,
    /// Occupants found; the surviving gaps (possibly none)
    Resolved(Vec<Interval>),
}

/// Everything a strategy needs to know about the run being resolved
#[derive(Debug)]
pub struct RunContext<'a> {
    pub run: &'a Component,
    pub start: Coord,
    pub end: Coord,
    /// `end` was reconstructed rather than read from input
    pub end_inferred: bool,
    pub bore: f64,
    /// Candidate inner components (fittings other than the run)
    pub others: Vec<&'a Component>,
    pub settings: &'a Settings,
}

impl RunContext<'_> {
    fn tolerance(&self) -> f64 {
        self.settings.continuity_tolerance
    }

    fn bore_ok(&self, point: &Point) -> bool {
        (point.bore - self.bore).abs() <= self.settings.bore_tolerance
    }
}

/// One heuristic for locating engulfed components
pub trait SplitStrategy {
    fn name(&self) -> &'static str;

    fn attempt(&self, ctx: &RunContext<'_>) -> Attempt;
}

/// Strategies in the order they are tried
pub fn default_chain() -> [&'static dyn SplitStrategy; 3] {
    [&SpanWalk, &PathChainTrace, &DominantAxisScan]
}

/// Walk along the run axis collecting occupied spans
#[derive(Debug, Clone, Copy)]
pub struct SpanWalk;

impl SpanWalk {
    /// Spans of inner components lying on the run axis, sorted by entry
    pub fn spans(&self, ctx: &RunContext<'_>) -> Vec<Span> {
        let axis = sub(&ctx.end, &ctx.start);
        let length = axis.norm();
        if length <= EPSILON {
            return Vec::new();
        }
        let dir = axis / length;
        let tol = ctx.tolerance();

        let mut spans = Vec::new();
        for other in &ctx.others {
            let mut hits: Vec<(f64, Coord)> = Vec::new();
            for point in [other.entry(), other.exit()].into_iter().flatten() {
                if !ctx.bore_ok(point) {
                    continue;
                }
                let rel = sub(&point.pos, &ctx.start);
                let t = rel.dot(&dir);
                let perpendicular = (rel - dir * t).norm();
                if perpendicular > tol || t < -tol || t > length + tol {
                    continue;
                }
                hits.push((t, point.pos));
            }
            if hits.is_empty() {
                continue;
            }

            let (min_t, min_pos) = hits
                .iter()
                .copied()
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .unwrap_or_default();
            let (max_t, max_pos) = hits
                .iter()
                .copied()
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .unwrap_or_default();

            // A neighbour merely touching one end of the run is not engulfed
            let interior = min_t > tol && max_t < length - tol;
            if max_t - min_t <= tol && !interior {
                continue;
            }

            spans.push(Span {
                refno: other.refno.clone(),
                entry: min_t.clamp(0.0, length),
                exit: max_t.clamp(0.0, length),
                entry_pos: min_pos,
                exit_pos: max_pos,
            });
        }

        spans.sort_by(|a, b| a.entry.total_cmp(&b.entry).then(a.exit.total_cmp(&b.exit)));
        spans
    }
}

impl SplitStrategy for SpanWalk {
    fn name(&self) -> &'static str {
        "span-walk"
    }

    fn attempt(&self, ctx: &RunContext<'_>) -> Attempt {
        let spans = self.spans(ctx);
        if spans.is_empty() {
            return Attempt::NoOccupants;
        }
        trace!(refno = %ctx.run.refno, spans = spans.len(), "span walk found occupants");
        let length = distance(&ctx.start, &ctx.end);
        Attempt::Resolved(gaps_between(
            ctx.start,
            ctx.end,
            length,
            &spans,
            ctx.settings.min_pipe_length,
        ))
    }
}

/// Intervals not covered by `spans` along `[0, length]`, keeping those of at least `min_length`
fn gaps_between(
    start: Coord,
    end: Coord,
    length: f64,
    spans: &[Span],
    min_length: f64,
) -> Vec<Interval> {
    let mut gaps = Vec::new();
    let mut cursor = 0.0;
    let mut cursor_pos = start;
    for span in spans {
        if span.entry - cursor >= min_length {
            gaps.push(Interval {
                from: cursor_pos,
                to: span.entry_pos,
            });
        }
        if span.exit > cursor {
            cursor = span.exit;
            cursor_pos = span.exit_pos;
        }
    }
    if length - cursor >= min_length {
        gaps.push(Interval {
            from: cursor_pos,
            to: end,
        });
    }
    gaps
}

/// Follow a chain of connected components out from the run start
#[derive(Debug, Clone, Copy)]
pub struct PathChainTrace;

impl PathChainTrace {
    /// Traversed `(near, far)` endpoint pairs, in order
    pub fn trace(&self, ctx: &RunContext<'_>) -> Vec<(Coord, Coord)> {
        let tol = ctx.tolerance();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut traced = Vec::new();
        let mut pos = ctx.start;

        for _ in 0..TRACE_STEP_CAP {
            let next = ctx.others.iter().find_map(|c| {
                if visited.contains(c.refno.as_str()) || !ctx.bore_ok(c.entry()?) {
                    return None;
                }
                let (a, b) = c.endpoints()?;
                let (near, far) = if a.coincides(&pos, tol) {
                    (a, b)
                } else if b.coincides(&pos, tol) {
                    (b, a)
                } else {
                    return None;
                };
                // Only components that make progress towards the run end
                if distance(&far, &ctx.end) >= distance(&near, &ctx.end) - tol {
                    return None;
                }
                Some((c.refno.as_str(), near, far))
            });

            let Some((refno, near, far)) = next else {
                break;
            };
            visited.insert(refno);
            traced.push((near, far));
            pos = far;
        }
        traced
    }
}

impl SplitStrategy for PathChainTrace {
    fn name(&self) -> &'static str {
        "path-chain"
    }

    fn attempt(&self, ctx: &RunContext<'_>) -> Attempt {
        let traced = self.trace(ctx);
        let Some(&(_, last_far)) = traced.last() else {
            return Attempt::NoOccupants;
        };
        let min_length = ctx.settings.min_pipe_length;

        let mut gaps: Vec<Interval> = traced
            .windows(2)
            .map(|w| Interval {
                from: w[0].1,
                to: w[1].0,
            })
            .filter(|gap| gap.length() >= min_length)
            .collect();

        if !ctx.end_inferred && distance(&last_far, &ctx.end) >= min_length {
            gaps.push(Interval {
                from: last_far,
                to: ctx.end,
            });
        }
        Attempt::Resolved(gaps)
    }
}

/// Scan for inner components colinear on one axis from the run start
///
/// Handles a diagonal run whose inner components all sit on a single
/// plant axis.
#[derive(Debug, Clone, Copy)]
pub struct DominantAxisScan;

impl DominantAxisScan {
    /// Shared split axis and per-component spans, when all candidates agree
    pub fn scan(&self, ctx: &RunContext<'_>) -> Option<(usize, Vec<Span>)> {
        let tol = ctx.tolerance();
        if !is_skew(&ctx.start, &ctx.end, ctx.settings.skew_threshold) {
            return None;
        }
        let reach = distance(&ctx.start, &ctx.end) + tol;

        let mut split_axis: Option<usize> = None;
        let mut spans: Vec<Span> = Vec::new();
        for other in &ctx.others {
            let mut hits: Vec<(f64, Coord)> = Vec::new();
            for point in [other.entry(), other.exit()].into_iter().flatten() {
                if !ctx.bore_ok(point) {
                    continue;
                }
                let d = sub(&point.pos, &ctx.start);
                let differing: Vec<usize> = (0..3).filter(|&a| d[a].abs() > tol).collect();
                let [axis] = differing[..] else {
                    continue;
                };
                match split_axis {
                    None => split_axis = Some(axis),
                    Some(existing) if existing != axis => return None,
                    Some(_) => {}
                }
                let sign = direction_sign(&ctx.start, &ctx.end, axis, ctx.end_inferred);
                let offset = d[axis] * sign;
                if offset > tol && offset <= reach {
                    hits.push((offset, point.pos));
                }
            }

            if hits.is_empty() {
                continue;
            }
            let (entry, entry_pos) = hits
                .iter()
                .copied()
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .unwrap_or_default();
            let (exit, exit_pos) = hits
                .iter()
                .copied()
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .unwrap_or_default();
            spans.push(Span {
                refno: other.refno.clone(),
                entry,
                exit,
                entry_pos,
                exit_pos,
            });
        }

        let axis = split_axis?;
        if spans.is_empty() {
            return None;
        }
        spans.sort_by(|a, b| a.entry.total_cmp(&b.entry).then(a.exit.total_cmp(&b.exit)));
        Some((axis, spans))
    }
}

/// +1 or -1 along `axis` towards the run end; positive when the end is inferred or level
fn direction_sign(start: &Coord, end: &Coord, axis: usize, end_inferred: bool) -> f64 {
    if end_inferred {
        return 1.0;
    }
    if end.axis(axis) < start.axis(axis) {
        -1.0
    } else {
        1.0
    }
}

impl SplitStrategy for DominantAxisScan {
    fn name(&self) -> &'static str {
        "dominant-axis"
    }

    fn attempt(&self, ctx: &RunContext<'_>) -> Attempt {
        let Some((axis, spans)) = self.scan(ctx) else {
            return Attempt::NoOccupants;
        };
        trace!(
            refno = %ctx.run.refno,
            axis,
            primary = ?dominant_axis(&ctx.start, &ctx.end),
            "dominant-axis scan found occupants"
        );
        let min_length = ctx.settings.min_pipe_length;

        let mut gaps = Vec::new();
        let mut cursor = 0.0;
        let mut cursor_pos = ctx.start;
        for span in &spans {
            if span.entry - cursor >= min_length {
                gaps.push(Interval {
                    from: cursor_pos,
                    to: span.entry_pos,
                });
            }
            if span.exit > cursor {
                cursor = span.exit;
                cursor_pos = span.exit_pos;
            }
        }
        if !ctx.end_inferred && distance(&cursor_pos, &ctx.end) >= min_length {
            gaps.push(Interval {
                from: cursor_pos,
                to: ctx.end,
            });
        }
        Attempt::Resolved(gaps)
    }
}

/// Reconstructed end of a run that has only its first endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum EndInference {
    Found { point: Point, from_refno: String },
    /// Candidates extend in more than one direction from the start
    Ambiguous { directions: usize },
    NotFound,
}

/// Farthest axis-aligned, bore-compatible endpoint of any other component
///
/// Components already connected at the start belong to the incoming leg and
/// are ignored.
pub fn infer_run_end(run: &Component, components: &[Component], settings: &Settings) -> EndInference {
    let Some(start) = run.entry() else {
        return EndInference::NotFound;
    };
    let tol = settings.continuity_tolerance;
    let incoming = |c: &Component| {
        c.connection_points()
            .iter()
            .any(|p| p.coincides(&start.pos, tol))
    };

    let mut directions: Vec<Vector3<f64>> = Vec::new();
    let mut best: Option<(f64, &Point, &str)> = None;
    for other in components
        .iter()
        .filter(|c| c.refno != run.refno && !incoming(c))
    {
        for point in [other.entry(), other.exit()].into_iter().flatten() {
            if (point.bore - start.bore).abs() > settings.bore_tolerance {
                continue;
            }
            let d = sub(&point.pos, &start.pos);
            let differing: Vec<usize> = (0..3).filter(|&a| d[a].abs() > tol).collect();
            let [axis] = differing[..] else {
                continue;
            };
            let mut dir = Vector3::zeros();
            dir[axis] = d[axis].signum();
            if !directions.contains(&dir) {
                directions.push(dir);
            }
            let len = d.norm();
            if best.is_none_or(|(best_len, _, _)| len > best_len) {
                best = Some((len, point, other.refno.as_str()));
            }
        }
    }

    match best {
        None => EndInference::NotFound,
        Some(_) if directions.len() > 1 => EndInference::Ambiguous {
            directions: directions.len(),
        },
        Some((_, point, refno)) => EndInference::Found {
            point: point.clone(),
            from_refno: refno.to_string(),
        },
    }
}
