//! Sequential snapper
//!
//! For input trusted to be in physical order. Each component's entry is
//! snapped onto the previous exit when the two nearly touch; a larger gap
//! gets a bridging run instead.

use tracing::debug;

use crate::core::geometry::{distance, format_coord};
use crate::core::refno::{RefnoAllocator, SyntheticTag};
use crate::entities::anomaly::{rules, Anomaly};
use crate::entities::component::{Component, ComponentKind, Provenance};
use crate::entities::point::{Point, Role};

/// Snapped collection plus bridge notices
#[derive(Debug, Clone, Default)]
pub struct Snapped {
    pub components: Vec<Component>,
    pub anomalies: Vec<Anomaly>,
}

/// Snap raw input in ordinal order with a private refno allocator
pub fn snap_sequential(mut components: Vec<Component>, tolerance: f64) -> Snapped {
    components.sort_by_key(|c| c.ordinal);
    let mut alloc = RefnoAllocator::from_components(&components);
    snap_with(components, tolerance, &mut alloc)
}

/// Walk components in collection order, snapping or bridging each entry
///
/// The order is taken as given: sub-runs share their parent's ordinal, so
/// resolved output must not be re-sorted before snapping. Each bridge is
/// placed just before the component it leads into.
pub fn snap_with(components: Vec<Component>, tolerance: f64, alloc: &mut RefnoAllocator) -> Snapped {
    alloc.reserve_all(&components);

    let mut out = Vec::with_capacity(components.len());
    let mut anomalies = Vec::new();
    let mut previous: Option<(String, Point)> = None;

    for mut component in components {
        if component.kind == ComponentKind::Skip
            || (component.kind.is_point_like() && !component.points.has_span())
        {
            out.push(component);
            continue;
        }

        let Some(entry) = component.entry().cloned() else {
            debug!(refno = %component.refno, "no entry point; chain reset");
            previous = None;
            out.push(component);
            continue;
        };

        if let Some((prev_refno, exit)) = &previous {
            let gap = distance(&exit.pos, &entry.pos);
            if gap <= tolerance {
                if let Some(point) = component.points.get_mut(Role::End1) {
                    point.pos = exit.pos;
                }
            } else {
                let bridge = Component::synthetic_run(
                    alloc.derive(&component.refno, SyntheticTag::SequenceGap),
                    &component,
                    Provenance::Bridge,
                    (exit.pos, component.bore()),
                    (entry.pos, component.bore()),
                );
                anomalies.push(
                    Anomaly::info(
                        rules::SEQUENCE_BRIDGED,
                        &component,
                        format!(
                            "{} mm gap after {} bridged by {}",
                            format_coord(gap),
                            prev_refno,
                            bridge.refno
                        ),
                    )
                    .with_detail("bridge", &bridge.refno)
                    .with_detail("previous", prev_refno),
                );
                out.push(bridge);
            }
        }

        previous = component
            .exit()
            .cloned()
            .map(|exit| (component.refno.clone(), exit));
        out.push(component);
    }

    Snapped {
        components: out,
        anomalies,
    }
}
