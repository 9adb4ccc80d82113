//! Proximity sequencer
//!
//! Greedy nearest-neighbour ordering used to linearize components for
//! serialization. Misaligned hops beyond tolerance are penalised so a close
//! but wrongly angled neighbour does not beat a farther, aligned one.

use std::collections::BTreeSet;

use nalgebra::Vector3;
use tracing::debug;

use crate::core::config::SequencerSettings;
use crate::core::geometry::{distance, sub, unit, Coord};
use crate::entities::anomaly::{rules, Anomaly, Severity};
use crate::entities::component::Component;

/// Visit order plus any findings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequencing {
    pub order: Vec<String>,
    pub anomalies: Vec<Anomaly>,
    /// Number of times the chain restarted after an over-long hop
    pub restarts: usize,
}

/// Ordered refnos with default sequencer tuning
pub fn sequence(components: &[Component], start: Option<&str>, tolerance: f64) -> Vec<String> {
    sequence_with(components, start, tolerance, &SequencerSettings::default()).order
}

/// How a candidate would be entered from the current position
#[derive(Debug, Clone, Copy)]
struct Hop {
    index: usize,
    raw: f64,
    score: f64,
    far: Coord,
    heading: Option<Vector3<f64>>,
}

pub fn sequence_with(
    components: &[Component],
    start: Option<&str>,
    tolerance: f64,
    tuning: &SequencerSettings,
) -> Sequencing {
    let mut result = Sequencing::default();

    // (ordinal, index) keeps the unvisited set deterministic
    let mut unvisited: BTreeSet<(usize, usize)> = components
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.points.is_empty())
        .map(|(i, c)| (c.ordinal, i))
        .collect();
    let unplaced: Vec<usize> = components
        .iter()
        .enumerate()
        .filter(|(_, c)| c.points.is_empty())
        .map(|(i, _)| i)
        .collect();

    let first = match start {
        Some(refno) => match components.iter().position(|c| c.refno == refno) {
            Some(i) if !components[i].points.is_empty() => Some((components[i].ordinal, i)),
            _ => {
                result.anomalies.push(Anomaly::new(
                    Severity::Warning,
                    rules::UNKNOWN_START,
                    refno,
                    format!("start component {} not found; starting from the first component", refno),
                ));
                unvisited.first().copied()
            }
        },
        None => unvisited.first().copied(),
    };

    let mut cursor = first.map(|key| begin(components, &mut unvisited, key, &mut result.order));

    while !unvisited.is_empty() {
        let Some((position, heading)) = cursor else {
            let Some(key) = unvisited.first().copied() else {
                break;
            };
            cursor = Some(begin(components, &mut unvisited, key, &mut result.order));
            continue;
        };

        let best = unvisited
            .iter()
            .map(|&(_, i)| score(&components[i], i, &position, heading.as_ref(), tolerance, tuning))
            .min_by(|a, b| a.score.total_cmp(&b.score));
        let Some(hop) = best else {
            break;
        };

        if hop.raw > tuning.max_hop {
            debug!(
                refno = %components[hop.index].refno,
                distance = hop.raw,
                "nearest candidate beyond hop limit; restarting chain"
            );
            result.restarts += 1;
            cursor = None;
            continue;
        }

        unvisited.remove(&(components[hop.index].ordinal, hop.index));
        result.order.push(components[hop.index].refno.clone());
        cursor = Some((hop.far, hop.heading.or(heading)));
    }

    result
        .order
        .extend(unplaced.into_iter().map(|i| components[i].refno.clone()));
    result
}

/// Start a chain at `key`, returning the position and heading after it
fn begin(
    components: &[Component],
    unvisited: &mut BTreeSet<(usize, usize)>,
    key: (usize, usize),
    order: &mut Vec<String>,
) -> (Coord, Option<Vector3<f64>>) {
    unvisited.remove(&key);
    let component = &components[key.1];
    order.push(component.refno.clone());
    let position = component
        .exit()
        .map(|p| p.pos)
        .or_else(|| component.connection_points().last().copied())
        .or_else(|| component.centre().map(|p| p.pos))
        .unwrap_or_default();
    (position, component.exit_direction())
}

/// Distance from `position` to a candidate, penalised when misaligned
fn score(
    component: &Component,
    index: usize,
    position: &Coord,
    heading: Option<&Vector3<f64>>,
    tolerance: f64,
    tuning: &SequencerSettings,
) -> Hop {
    let (near, far, forward) = match component.endpoints() {
        Some((entry, exit)) if distance(position, &exit) < distance(position, &entry) => {
            (exit, entry, false)
        }
        Some((entry, exit)) => (entry, exit, true),
        None => {
            let at = component
                .connection_points()
                .into_iter()
                .chain(component.centre().map(|p| p.pos))
                .min_by(|a, b| distance(position, a).total_cmp(&distance(position, b)))
                .unwrap_or_default();
            (at, at, true)
        }
    };

    let raw = distance(position, &near);
    let aligned = unit(&sub(&near, position))
        .zip(heading)
        .is_some_and(|(hop, dir)| hop.dot(dir) > tuning.alignment);
    let score = if raw > tolerance && !aligned {
        raw * tuning.penalty
    } else {
        raw
    };

    let leaving = if forward {
        component.exit_direction()
    } else {
        component.entry_direction().map(|v| -v)
    };
    Hop {
        index,
        raw,
        score,
        far,
        heading: leaving.or_else(|| unit(&sub(&far, &near))),
    }
}
