//! Overlap resolution engine
//!
//! Splits runs that physically engulf other components into the sub-runs
//! that remain between them, absorbs gasket thickness, optionally bridges
//! sequence gaps, and finally reports continuity and same-type overlaps.
//! The engine only rewrites what it can justify; everything else is left in
//! place and reported.

mod continuity;
mod gap_fill;
mod gasket;
mod overlap_check;
pub mod strategy;

use tracing::{debug, info};

use crate::core::config::Settings;
use crate::core::geometry::Coord;
use crate::core::refno::{RefnoAllocator, SyntheticTag};
use crate::entities::anomaly::{rules, Anomaly, AnomalyLog};
use crate::entities::component::{Component, Provenance};

pub use continuity::check_continuity;
pub use gap_fill::fill_sequence_gaps;
pub use gasket::absorb_gaskets;
pub use overlap_check::check_same_type_overlaps;
pub use strategy::{
    infer_run_end, Attempt, DominantAxisScan, EndInference, Interval, PathChainTrace,
    RunContext, Span, SpanWalk, SplitStrategy,
};

/// Output of one resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub components: Vec<Component>,
    pub anomalies: Vec<Anomaly>,
}

/// Resolve overlaps with a fresh refno allocator
pub fn resolve_overlaps(components: Vec<Component>, settings: &Settings) -> Resolution {
    let mut alloc = RefnoAllocator::from_components(&components);
    resolve_with(components, settings, &mut alloc)
}

/// Resolve overlaps, drawing synthetic refnos from `alloc`
pub fn resolve_with(
    components: Vec<Component>,
    settings: &Settings,
    alloc: &mut RefnoAllocator,
) -> Resolution {
    alloc.reserve_all(&components);
    let mut log = AnomalyLog::new();

    let mut components = split_runs(components, settings, alloc, &mut log);
    absorb_gaskets(&mut components, settings, &mut log);
    if settings.gap_fill {
        components = fill_sequence_gaps(components, settings, alloc, &mut log);
    }
    check_continuity(&components, settings, &mut log);
    check_same_type_overlaps(&components, settings, &mut log);

    Resolution {
        components,
        anomalies: log.into_vec(),
    }
}

/// Bore difference within tolerance
pub(crate) fn bore_compatible(a: f64, b: f64, settings: &Settings) -> bool {
    (a - b).abs() <= settings.bore_tolerance
}

/// Split every qualifying run, largest bore first
fn split_runs(
    mut components: Vec<Component>,
    settings: &Settings,
    alloc: &mut RefnoAllocator,
    log: &mut AnomalyLog,
) -> Vec<Component> {
    let mut order: Vec<(f64, usize, String)> = components
        .iter()
        .filter(|c| c.kind.is_run() && c.entry().is_some())
        .filter(|c| c.bore() >= settings.min_split_bore)
        .map(|c| (c.bore(), c.ordinal, c.refno.clone()))
        .collect();
    order.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    for (_, _, refno) in order {
        let Some(index) = components.iter().position(|c| c.refno == refno) else {
            continue;
        };
        let Some((strategy, intervals)) = plan_split(&components[index], &components, settings, log)
        else {
            continue;
        };

        let run = &components[index];
        let bore = run.bore();
        let sub_runs: Vec<Component> = intervals
            .iter()
            .map(|iv| {
                Component::synthetic_run(
                    alloc.derive(&run.refno, SyntheticTag::SubRun),
                    run,
                    Provenance::SubRun,
                    (iv.from, bore),
                    (iv.to, bore),
                )
            })
            .collect();

        info!(
            refno = %refno,
            strategy,
            sub_runs = sub_runs.len(),
            "split run around engulfed components"
        );
        components = place_sub_runs(components, index, sub_runs, settings.continuity_tolerance);
    }
    components
}

/// Replace the run at `index` with its sub-runs, moving every component that
/// fills the space between two consecutive sub-runs in between them
///
/// Sub-runs keep their parent's ordinal, so collection order is the only
/// thing that places them around their occupants.
fn place_sub_runs(
    components: Vec<Component>,
    index: usize,
    sub_runs: Vec<Component>,
    tol: f64,
) -> Vec<Component> {
    let mut slots: Vec<Vec<usize>> = vec![Vec::new(); sub_runs.len().saturating_sub(1)];
    for (i, c) in components.iter().enumerate() {
        if i == index || c.kind.is_run() || c.kind.is_point_like() {
            continue;
        }
        let points = c.connection_points();
        if points.is_empty() {
            continue;
        }
        let slot = sub_runs.windows(2).position(|pair| {
            let (Some(a), Some(b)) = (pair[0].exit(), pair[1].entry()) else {
                return false;
            };
            points.iter().all(|p| within_box(p, &a.pos, &b.pos, tol))
        });
        if let Some(slot) = slot {
            slots[slot].push(i);
        }
    }

    for (slot, pair) in slots.iter_mut().zip(sub_runs.windows(2)) {
        let Some(from) = pair[0].exit().map(|p| p.pos) else {
            continue;
        };
        let reach = |i: usize| {
            components[i]
                .connection_points()
                .iter()
                .map(|p| p.distance(&from))
                .fold(f64::INFINITY, f64::min)
        };
        slot.sort_by(|&a, &b| {
            reach(a)
                .total_cmp(&reach(b))
                .then(components[a].ordinal.cmp(&components[b].ordinal))
        });
    }

    let mut taken: Vec<Option<Component>> = components.into_iter().map(Some).collect();
    let mut placed = Vec::with_capacity(sub_runs.len());
    for (n, sub_run) in sub_runs.into_iter().enumerate() {
        placed.push(sub_run);
        for &i in slots.get(n).into_iter().flatten() {
            placed.extend(taken[i].take());
        }
    }

    let mut out = Vec::with_capacity(taken.len() + placed.len());
    let mut placed = Some(placed);
    for (i, component) in taken.into_iter().enumerate() {
        if i == index {
            out.extend(placed.take().into_iter().flatten());
        } else {
            out.extend(component);
        }
    }
    out
}

/// `p` lies in the box spanned by `a` and `b`, grown by `tol` on every axis
fn within_box(p: &Coord, a: &Coord, b: &Coord, tol: f64) -> bool {
    (0..3).all(|axis| {
        let (lo, hi) = (a.axis(axis).min(b.axis(axis)), a.axis(axis).max(b.axis(axis)));
        p.axis(axis) >= lo - tol && p.axis(axis) <= hi + tol
    })
}

/// Decide how `run` should be split; None leaves it unchanged
fn plan_split(
    run: &Component,
    components: &[Component],
    settings: &Settings,
    log: &mut AnomalyLog,
) -> Option<(&'static str, Vec<Interval>)> {
    let start = run.entry()?;
    let (end, end_inferred) = match run.exit() {
        Some(exit) => (exit.pos, false),
        None => match infer_run_end(run, components, settings) {
            EndInference::Found { point, from_refno } => {
                log.push(
                    Anomaly::warning(
                        rules::RUN_END_INFERRED,
                        run,
                        format!(
                            "run has no second endpoint; using the farthest aligned endpoint of {}",
                            from_refno
                        ),
                    )
                    .with_detail("from_refno", &from_refno),
                );
                (point.pos, true)
            }
            EndInference::Ambiguous { directions } => {
                log.push(
                    Anomaly::warning(
                        rules::RUN_END_AMBIGUOUS,
                        run,
                        format!(
                            "run has no second endpoint and aligned candidates lie in {} directions; left unresolved",
                            directions
                        ),
                    )
                    .with_detail("directions", directions),
                );
                return None;
            }
            EndInference::NotFound => {
                debug!(refno = %run.refno, "no candidate end for incomplete run");
                return None;
            }
        },
    };

    let ctx = RunContext {
        run,
        start: start.pos,
        end,
        end_inferred,
        bore: start.bore,
        others: components
            .iter()
            .filter(|c| c.refno != run.refno && c.kind.is_fitting())
            .collect(),
        settings,
    };

    for strategy in strategy::default_chain() {
        match strategy.attempt(&ctx) {
            Attempt::NoOccupants => continue,
            Attempt::Resolved(intervals) if intervals.is_empty() => {
                debug!(
                    refno = %run.refno,
                    strategy = strategy.name(),
                    "occupants found but no gap reaches the minimum pipe length"
                );
                return None;
            }
            Attempt::Resolved(intervals) => return Some((strategy.name(), intervals)),
        }
    }
    None
}

#[cfg(test)]
mod tests;
