//! Sequence-based gap filling
//!
//! Walks fittings in input order and bridges the space between consecutive
//! ones with a synthetic run, but only when the bridge is geometrically
//! plausible: same pipeline, free ends, compatible bores, no fold-back and
//! a direction that agrees with both neighbours.

use std::collections::HashMap;

use nalgebra::Vector3;
use tracing::{debug, warn};

use super::bore_compatible;
use crate::core::config::Settings;
use crate::core::direction::direction_text;
use crate::core::geometry::{distance, format_coord, sub, unit, Coord};
use crate::core::policy::{ConnectionPolicy, SkewClass, Verdict};
use crate::core::refno::{RefnoAllocator, SyntheticTag};
use crate::entities::anomaly::{rules, Anomaly, AnomalyLog};
use crate::entities::component::{Component, ComponentKind, Provenance};

/// Minimum dot product between a bridge and a neighbour's local direction
pub const FULL_ALIGNMENT_DOT: f64 = 0.99;

/// Bridge plausible gaps between consecutive fittings
pub fn fill_sequence_gaps(
    components: Vec<Component>,
    settings: &Settings,
    alloc: &mut RefnoAllocator,
    log: &mut AnomalyLog,
) -> Vec<Component> {
    let components = suppress_oversized_runs(components, settings, log);
    let policy = ConnectionPolicy::from(settings);
    let tol = settings.continuity_tolerance;

    // Supports drawn as a centre point never join the walk; `bridge_supports`
    // only decides whether spanned supports do.
    let mut walk: Vec<&Component> = components
        .iter()
        .filter(|c| !c.kind.is_run() && c.kind != ComponentKind::Skip)
        .filter(|c| c.kind != ComponentKind::Support || settings.bridge_supports)
        .filter(|c| c.entry().is_some() && c.exit().is_some())
        .collect();
    walk.sort_by_key(|c| c.ordinal);

    let mut bridges: HashMap<String, Vec<Component>> = HashMap::new();
    let mut last_bridge: Option<Vector3<f64>> = None;

    for pair in walk.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if prev.pipeline_ref != next.pipeline_ref {
            last_bridge = None;
            continue;
        }
        let (Some(exit), Some(entry)) = (prev.exit(), next.entry()) else {
            continue;
        };
        let gap = distance(&exit.pos, &entry.pos);
        if gap <= tol || gap < settings.min_pipe_length {
            continue;
        }
        if prev.bore() < settings.min_split_bore || next.bore() < settings.min_split_bore {
            continue;
        }
        if touches_other_pipeline(&components, prev, &exit.pos, tol)
            || touches_other_pipeline(&components, next, &entry.pos, tol)
        {
            debug!(prev = %prev.refno, next = %next.refno, "gap sits on a pipeline boundary");
            continue;
        }
        if is_connected(&components, prev, &exit.pos, tol)
            || is_connected(&components, next, &entry.pos, tol)
        {
            continue;
        }
        if !bore_compatible(exit.bore, entry.bore, settings) {
            debug!(prev = %prev.refno, next = %next.refno, "bore change across gap");
            continue;
        }

        let Some(heading) = unit(&sub(&entry.pos, &exit.pos)) else {
            continue;
        };

        if let Some(previous) = last_bridge {
            if policy.is_rollback(&heading, &previous) && !prev.kind.can_turn() {
                warn!(refno = %prev.refno, "bridge would fold back");
                log.push(
                    Anomaly::error(
                        rules::FOLD_BACK,
                        prev,
                        format!(
                            "bridge to {} reverses the previous bridge but {} cannot turn",
                            next.refno, prev.kind
                        ),
                    )
                    .scoped(&next.refno),
                );
                continue;
            }
        }

        if let Verdict::Reject {
            severity,
            rule,
            reason,
        } = policy.validate(&exit.pos, &entry.pos)
        {
            log.push(
                Anomaly::new(severity, rule, prev.refno.clone(), reason)
                    .at(prev.ordinal)
                    .scoped(&next.refno),
            );
            continue;
        }

        if let Some(reason) = misalignment(prev, next, &heading, &policy, &exit.pos, &entry.pos, settings)
        {
            log.push(
                Anomaly::warning(rules::DIRECTION_MISMATCH, prev, reason)
                    .scoped(&next.refno)
                    .with_detail("direction", direction_text(&exit.pos, &entry.pos)),
            );
            continue;
        }

        let bridge = Component::synthetic_run(
            alloc.derive(&prev.refno, SyntheticTag::Bridge),
            prev,
            Provenance::Bridge,
            (exit.pos, exit.bore),
            (entry.pos, entry.bore),
        );
        debug!(refno = %bridge.refno, gap, "bridged sequence gap");
        log.push(
            Anomaly::info(
                rules::GAP_BRIDGED,
                prev,
                format!(
                    "{} mm gap to {} bridged by {}",
                    format_coord(gap),
                    next.refno,
                    bridge.refno
                ),
            )
            .scoped(&next.refno)
            .with_detail("bridge", &bridge.refno),
        );
        last_bridge = Some(heading);
        bridges.entry(prev.refno.clone()).or_default().push(bridge);
    }

    if bridges.is_empty() {
        return components;
    }
    let mut out = Vec::with_capacity(components.len() + bridges.len());
    for component in components {
        let added = bridges.remove(&component.refno);
        out.push(component);
        out.extend(added.into_iter().flatten());
    }
    out
}

/// Drop long input runs whose ends both land on fittings
///
/// Such runs are usually a stale straight drawn across a fitting chain;
/// gap filling re-creates whatever part of them is plausible.
fn suppress_oversized_runs(
    components: Vec<Component>,
    settings: &Settings,
    log: &mut AnomalyLog,
) -> Vec<Component> {
    let tol = settings.continuity_tolerance;
    let fitting_ends: Vec<(usize, Coord)> = components
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.kind.is_run() && c.kind != ComponentKind::Skip)
        .flat_map(|(i, c)| c.connection_points().into_iter().map(move |p| (i, p)))
        .collect();

    let oversized = |c: &Component| {
        if !c.kind.is_run() || c.provenance.is_synthetic() {
            return false;
        }
        let (Some((a, b)), Some(len)) = (c.endpoints(), c.length()) else {
            return false;
        };
        len > settings.oversized_run_length
            && fitting_ends.iter().any(|(_, p)| p.coincides(&a, tol))
            && fitting_ends.iter().any(|(_, p)| p.coincides(&b, tol))
    };

    let mut kept = Vec::with_capacity(components.len());
    for component in components {
        if oversized(&component) {
            log.push(Anomaly::warning(
                rules::OVERSIZED_RUN_SUPPRESSED,
                &component,
                format!(
                    "{} mm run between two fittings removed before gap filling",
                    format_coord(component.length().unwrap_or_default())
                ),
            ));
            continue;
        }
        kept.push(component);
    }
    kept
}

/// Another component already connects at `pos`
fn is_connected(components: &[Component], owner: &Component, pos: &Coord, tol: f64) -> bool {
    components
        .iter()
        .filter(|c| c.refno != owner.refno && c.kind != ComponentKind::Skip)
        .any(|c| c.connection_points().iter().any(|p| p.coincides(pos, tol)))
}

/// A component from a different pipeline connects at `pos`
fn touches_other_pipeline(components: &[Component], owner: &Component, pos: &Coord, tol: f64) -> bool {
    components
        .iter()
        .filter(|c| c.refno != owner.refno && c.pipeline_ref != owner.pipeline_ref)
        .any(|c| c.connection_points().iter().any(|p| p.coincides(pos, tol)))
}

/// Direction a component leaves by, when its geometry fixes one
fn local_exit(c: &Component) -> Option<Vector3<f64>> {
    match c.kind {
        ComponentKind::Bend if c.centre().is_some() => c.exit_direction(),
        k if k.can_turn() => None,
        _ => c.exit_direction(),
    }
}

/// Direction a component is entered by, when its geometry fixes one
fn local_entry(c: &Component) -> Option<Vector3<f64>> {
    match c.kind {
        ComponentKind::Bend if c.centre().is_some() => c.entry_direction(),
        k if k.can_turn() => None,
        _ => c.entry_direction(),
    }
}

/// Reason the bridge disagrees with its neighbours, if it does
fn misalignment(
    prev: &Component,
    next: &Component,
    heading: &Vector3<f64>,
    policy: &ConnectionPolicy,
    from: &Coord,
    to: &Coord,
    settings: &Settings,
) -> Option<String> {
    let exit_dir = local_exit(prev);
    let entry_dir = local_entry(next);

    if exit_dir.is_none() && entry_dir.is_none() {
        let straight = policy.classify(from, to) == SkewClass::Straight;
        if straight || distance(from, to) <= settings.max_diagonal_gap {
            return None;
        }
        return Some(format!(
            "diagonal gap of {} mm to {} with no direction to confirm it",
            format_coord(distance(from, to)),
            next.refno
        ));
    }

    if let Some(dir) = exit_dir {
        if heading.dot(&dir) < FULL_ALIGNMENT_DOT {
            return Some(format!("gap to {} does not continue the exit of {}", next.refno, prev.refno));
        }
    }
    if let Some(dir) = entry_dir {
        if heading.dot(&dir) < FULL_ALIGNMENT_DOT {
            return Some(format!("gap to {} does not line up with its entry", next.refno));
        }
    }
    None
}
