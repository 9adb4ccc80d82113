//! Same-type overlap detection

use crate::core::config::Settings;
use crate::core::geometry::{format_coord, sub, Coord, EPSILON};
use crate::entities::anomaly::{rules, Anomaly, AnomalyLog, Severity};
use crate::entities::component::{Component, ComponentKind};

/// Report collinear pairs of the same kind whose extents overlap
///
/// Overlaps beyond `max_overlap` are errors; shorter ones are warnings.
pub fn check_same_type_overlaps(components: &[Component], settings: &Settings, log: &mut AnomalyLog) {
    let tol = settings.continuity_tolerance;
    let linear: Vec<&Component> = components
        .iter()
        .filter(|c| !matches!(c.kind, ComponentKind::Support | ComponentKind::Skip))
        .filter(|c| c.endpoints().is_some())
        .collect();

    for (i, first) in linear.iter().enumerate() {
        for second in &linear[i + 1..] {
            if first.kind != second.kind {
                continue;
            }
            let Some(overlap) = collinear_overlap(first, second, tol) else {
                continue;
            };
            if overlap <= tol {
                continue;
            }
            let severity = if overlap > settings.max_overlap {
                Severity::Error
            } else {
                Severity::Warning
            };
            log.push(
                Anomaly::new(
                    severity,
                    rules::SAME_TYPE_OVERLAP,
                    first.refno.clone(),
                    format!(
                        "{} overlaps {} by {} mm",
                        first.refno,
                        second.refno,
                        format_coord(overlap)
                    ),
                )
                .at(first.ordinal)
                .scoped(&second.refno)
                .with_detail("other", &second.refno)
                .with_detail("overlap", format_coord(overlap)),
            );
        }
    }
}

/// Length shared by two collinear components, None when not collinear
fn collinear_overlap(first: &Component, second: &Component, tol: f64) -> Option<f64> {
    let (a, b) = first.endpoints()?;
    let (p, q) = second.endpoints()?;
    let axis = sub(&b, &a);
    let length = axis.norm();
    if length <= EPSILON {
        return None;
    }
    let dir = axis / length;

    let project = |c: &Coord| {
        let rel = sub(c, &a);
        let t = rel.dot(&dir);
        (t, (rel - dir * t).norm())
    };
    let (tp, dp) = project(&p);
    let (tq, dq) = project(&q);
    if dp > tol || dq > tol {
        return None;
    }
    let lo = tp.min(tq).max(0.0);
    let hi = tp.max(tq).min(length);
    Some((hi - lo).max(0.0))
}
