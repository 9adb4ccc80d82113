//! Run segmentizer
//!
//! Splits over-length straight runs into the fewest equal pieces that keep
//! every piece within the fabrication limit.

use tracing::debug;

use crate::core::geometry::{format_coord, EPSILON};
use crate::core::refno::{RefnoAllocator, SyntheticTag};
use crate::entities::anomaly::{rules, Anomaly};
use crate::entities::component::{Component, Provenance};
use crate::entities::point::Role;

/// Segmented collection plus one notice per split run
#[derive(Debug, Clone, Default)]
pub struct Segmented {
    pub components: Vec<Component>,
    pub anomalies: Vec<Anomaly>,
}

/// Segmentize with a private refno allocator
pub fn segmentize(components: Vec<Component>, max_length: f64) -> Segmented {
    let mut alloc = RefnoAllocator::from_components(&components);
    segmentize_with(components, max_length, &mut alloc)
}

/// Number of equal pieces needed to keep each at or under `max_length`
pub fn piece_count(length: f64, max_length: f64) -> usize {
    if max_length <= 0.0 || length <= max_length {
        return 1;
    }
    // Guard against 40000 / 10000 landing a hair above 4
    ((length / max_length) - EPSILON).ceil().max(1.0) as usize
}

pub fn segmentize_with(
    components: Vec<Component>,
    max_length: f64,
    alloc: &mut RefnoAllocator,
) -> Segmented {
    alloc.reserve_all(&components);
    let mut out = Vec::with_capacity(components.len());
    let mut anomalies = Vec::new();

    for component in components {
        let (Some(length), Some((start, end))) = (component.length(), component.endpoints()) else {
            out.push(component);
            continue;
        };
        if !component.kind.is_run() || length <= max_length || max_length <= 0.0 {
            out.push(component);
            continue;
        }

        let pieces = piece_count(length, max_length);
        let head = component.template_point();
        let tail = component.exit().cloned().unwrap_or_else(|| head.clone());
        debug!(refno = %component.refno, length, pieces, "segmenting run");

        for i in 0..pieces {
            let from = if i == 0 {
                start
            } else {
                start.lerp(&end, i as f64 / pieces as f64)
            };
            let to = if i + 1 == pieces {
                end
            } else {
                start.lerp(&end, (i + 1) as f64 / pieces as f64)
            };
            let mut piece = Component::synthetic_run(
                alloc.derive_indexed(&component.refno, SyntheticTag::Segment, i + 1),
                &component,
                Provenance::Segment,
                (from, head.bore),
                (to, tail.bore),
            );
            piece.points.insert(Role::End2, tail.relocated(to, tail.bore));
            out.push(piece);
        }

        anomalies.push(
            Anomaly::info(
                rules::SEGMENTED,
                &component,
                format!(
                    "{} mm run split into {} pieces of {} mm",
                    format_coord(length),
                    pieces,
                    format_coord(length / pieces as f64)
                ),
            )
            .with_detail("pieces", pieces),
        );
    }

    Segmented {
        components: out,
        anomalies,
    }
}
