//! Endpoint continuity check

use crate::core::config::Settings;
use crate::core::direction::direction_text;
use crate::core::geometry::{format_coord, Coord};
use crate::entities::anomaly::{rules, Anomaly, AnomalyLog};
use crate::entities::component::{Component, ComponentKind};

/// Nearest foreign connection point to an unconnected component
#[derive(Debug, Clone, PartialEq)]
struct Nearest<'a> {
    refno: &'a str,
    distance: f64,
    from: Coord,
    to: Coord,
}

/// Report components whose endpoints match nothing within tolerance
///
/// Both ends free is a warning naming the nearest neighbour; a single free
/// end is informational, since line terminations look exactly like that.
pub fn check_continuity(components: &[Component], settings: &Settings, log: &mut AnomalyLog) {
    let tol = settings.continuity_tolerance;
    let ends: Vec<(usize, Coord)> = components
        .iter()
        .enumerate()
        .flat_map(|(i, c)| c.connection_points().into_iter().map(move |p| (i, p)))
        .collect();

    for (i, component) in components.iter().enumerate() {
        if matches!(component.kind, ComponentKind::Support | ComponentKind::Skip) {
            continue;
        }
        let Some((a, b)) = component.endpoints() else {
            continue;
        };
        let matched = |pos: &Coord| {
            ends.iter()
                .any(|(owner, p)| *owner != i && p.coincides(pos, tol))
        };

        match (matched(&a), matched(&b)) {
            (true, true) => {}
            (false, false) => {
                let mut anomaly = Anomaly::warning(
                    rules::DISCONNECTED,
                    component,
                    "neither endpoint connects to another component",
                );
                if let Some(near) = nearest(components, &ends, i, &a, &b) {
                    anomaly.message = format!(
                        "neither endpoint connects; nearest is {} at {} mm {}. {}",
                        near.refno,
                        format_coord(near.distance),
                        direction_text(&near.from, &near.to),
                        repair_hint(near.distance, tol)
                    );
                    anomaly = anomaly
                        .with_detail("nearest_refno", near.refno)
                        .with_detail("distance", format_coord(near.distance))
                        .with_detail("direction", direction_text(&near.from, &near.to));
                }
                log.push(anomaly);
            }
            (a_ok, _) => {
                let role = if a_ok { 2 } else { 1 };
                log.push(
                    Anomaly::info(
                        rules::OPEN_END,
                        component,
                        format!("endpoint {} is open", role),
                    )
                    .with_detail("role", role),
                );
            }
        }
    }
}

fn nearest<'a>(
    components: &'a [Component],
    ends: &[(usize, Coord)],
    owner: usize,
    a: &Coord,
    b: &Coord,
) -> Option<Nearest<'a>> {
    ends.iter()
        .filter(|(i, _)| *i != owner)
        .flat_map(|(i, p)| {
            [a, b].into_iter().map(move |from| Nearest {
                refno: components[*i].refno.as_str(),
                distance: from.distance(p),
                from: *from,
                to: *p,
            })
        })
        .min_by(|x, y| x.distance.total_cmp(&y.distance))
}

/// Suggested remedy sized to the distance of the nearest neighbour
fn repair_hint(distance: f64, tolerance: f64) -> &'static str {
    if distance <= 5.0 * tolerance {
        "Just outside tolerance; a relaxed repair pass or a larger continuity tolerance should close it."
    } else if distance <= 1000.0 {
        "A short fitting or pipe is probably missing from the source data."
    } else {
        "Component looks isolated; check its pipeline assignment and coordinates."
    }
}
