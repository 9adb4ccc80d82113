//! Gasket thickness absorption

use tracing::debug;

use crate::core::config::Settings;
use crate::core::geometry::format_coord;
use crate::entities::anomaly::{rules, Anomaly, AnomalyLog};
use crate::entities::component::Component;
use crate::entities::point::Role;

/// Extend the neighbour of each thin gasket across the gasket's thickness
///
/// The gasket stays in the collection; only the neighbouring fitting's
/// endpoint moves from gasket point 1 to gasket point 2.
pub fn absorb_gaskets(components: &mut [Component], settings: &Settings, log: &mut AnomalyLog) {
    let tol = settings.continuity_tolerance;

    let gaskets: Vec<usize> = (0..components.len())
        .filter(|&i| components[i].is_gasket())
        .collect();

    for gi in gaskets {
        let gasket = &components[gi];
        let Some((face, far)) = gasket.endpoints() else {
            continue;
        };
        let Some(thickness) = gasket.length() else {
            continue;
        };
        if thickness < settings.gasket_min_length || thickness > settings.gasket_max_length {
            debug!(refno = %gasket.refno, thickness, "gasket outside absorption range");
            continue;
        }

        let mut candidates: Vec<(usize, Role)> = components
            .iter()
            .enumerate()
            .filter(|(i, c)| *i != gi && !c.kind.is_run() && c.kind != gasket.kind)
            .filter_map(|(i, c)| {
                [Role::End1, Role::End2]
                    .into_iter()
                    .find(|role| c.points.get(*role).is_some_and(|p| p.pos.coincides(&face, tol)))
                    .map(|role| (i, role))
            })
            .collect();
        candidates.sort_by_key(|(i, _)| components[*i].ordinal);

        let Some(&(ni, role)) = candidates.first() else {
            debug!(refno = %gasket.refno, "no neighbour at gasket face");
            continue;
        };

        let gasket_refno = gasket.refno.clone();
        let neighbour = &mut components[ni];
        if let Some(point) = neighbour.points.get_mut(role) {
            point.pos = far;
        }
        log.push(
            Anomaly::info(
                rules::GASKET_ABSORBED,
                neighbour,
                format!(
                    "endpoint {} extended {} mm across gasket {}",
                    role,
                    format_coord(thickness),
                    gasket_refno
                ),
            )
            .scoped(&gasket_refno)
            .with_detail("gasket", &gasket_refno),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Coord;
    use crate::entities::component::ComponentKind;

    #[test]
    fn test_flange_absorbs_gasket() {
        let mut components = vec![
            Component::span(
                "FL-1",
                ComponentKind::Flange,
                Coord::new(0.0, 0.0, 0.0),
                Coord::new(0.0, 100.0, 0.0),
                200.0,
            )
            .with_ordinal(0),
            Component::span(
                "GK-1",
                ComponentKind::Skip,
                Coord::new(0.0, 100.0, 0.0),
                Coord::new(0.0, 103.0, 0.0),
                200.0,
            )
            .with_type_code("GASK")
            .with_ordinal(1),
        ];
        let mut log = AnomalyLog::new();
        absorb_gaskets(&mut components, &Settings::default(), &mut log);

        let exit = components[0].exit().unwrap().pos;
        assert_eq!(exit, Coord::new(0.0, 103.0, 0.0));
        assert_eq!(log.len(), 1);
        assert!(log.iter().all(|a| a.rule == rules::GASKET_ABSORBED));
    }

    #[test]
    fn test_straight_run_never_extended() {
        let pipe_only = || {
            vec![
                Component::span(
                    "P-1",
                    ComponentKind::Pipe,
                    Coord::new(0.0, 0.0, 0.0),
                    Coord::new(0.0, 100.0, 0.0),
                    200.0,
                )
                .with_ordinal(0),
                Component::span(
                    "GK-1",
                    ComponentKind::Skip,
                    Coord::new(0.0, 100.0, 0.0),
                    Coord::new(0.0, 103.0, 0.0),
                    200.0,
                )
                .with_type_code("GASK")
                .with_ordinal(1),
            ]
        };

        let mut components = pipe_only();
        let mut log = AnomalyLog::new();
        absorb_gaskets(&mut components, &Settings::default(), &mut log);
        assert_eq!(components, pipe_only());
        assert!(log.is_empty());

        // With a flange on the same face, the flange takes the thickness
        let mut components = pipe_only();
        components.push(
            Component::span(
                "FL-1",
                ComponentKind::Flange,
                Coord::new(0.0, 100.0, 0.0),
                Coord::new(0.0, 250.0, 0.0),
                200.0,
            )
            .with_ordinal(2),
        );
        absorb_gaskets(&mut components, &Settings::default(), &mut log);
        assert_eq!(components[0].exit().unwrap().pos, Coord::new(0.0, 100.0, 0.0));
        assert_eq!(components[2].entry().unwrap().pos, Coord::new(0.0, 103.0, 0.0));
        assert_eq!(log.iter().next().unwrap().refno, "FL-1");
    }

    #[test]
    fn test_thick_gasket_left_alone() {
        let mut components = vec![
            Component::span(
                "FL-1",
                ComponentKind::Flange,
                Coord::new(0.0, 0.0, 0.0),
                Coord::new(0.0, 100.0, 0.0),
                200.0,
            ),
            Component::span(
                "GK-1",
                ComponentKind::Skip,
                Coord::new(0.0, 100.0, 0.0),
                Coord::new(0.0, 150.0, 0.0),
                200.0,
            )
            .with_type_code("GASKET"),
        ];
        let mut log = AnomalyLog::new();
        absorb_gaskets(&mut components, &Settings::default(), &mut log);

        assert_eq!(components[0].exit().unwrap().pos, Coord::new(0.0, 100.0, 0.0));
        assert!(log.is_empty());
    }
}
