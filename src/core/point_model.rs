//! Point model builder
//!
//! Turns a component's raw rows into its `PointDict`, applying configured
//! defaults for missing design values. Every sentinel, overwrite and
//! inference is reported as an anomaly; nothing fails.

use tracing::{debug, warn};

use crate::core::config::{DesignDefaults, Settings};
use crate::core::direction::{compute_angle, infer_corner, is_skew};
use crate::core::geometry::{format_coord, point_token, Coord, AXIS_NAMES};
use crate::entities::anomaly::{rules, Anomaly};
use crate::entities::component::{Component, ComponentKind};
use crate::entities::point::{Point, PointDict, RawRow, RawValue, Role};

/// Points built for one component plus the findings raised while building
#[derive(Debug, Clone, Default)]
pub struct BuiltPoints {
    pub points: PointDict,
    pub anomalies: Vec<Anomaly>,
}

/// Build the point dict for `component` from its raw rows
pub fn build_points(component: &Component, defaults: &DesignDefaults) -> BuiltPoints {
    let mut built = BuiltPoints::default();

    for (index, row) in component.rows.iter().enumerate() {
        let role = match row.role_text().map(|r| r.parse::<Role>()) {
            Some(Ok(role)) => role,
            Some(Err(reason)) => {
                built.anomalies.push(
                    Anomaly::warning(rules::INVALID_ROLE, component, reason).scoped(index),
                );
                continue;
            }
            None => {
                built.anomalies.push(
                    Anomaly::warning(
                        rules::INVALID_ROLE,
                        component,
                        format!("row {} has no positional role and was ignored", index + 1),
                    )
                    .scoped(index),
                );
                continue;
            }
        };

        let point = build_point(component, role, row, defaults, &mut built.anomalies);
        if built.points.insert(role, point).is_some() {
            warn!(refno = %component.refno, role = %role, "duplicate role overwritten");
            built.anomalies.push(
                Anomaly::warning(
                    rules::DUPLICATE_ROLE,
                    component,
                    format!("role {} appears more than once; the later row wins", role),
                )
                .scoped(role),
            );
        }
    }

    if built.points.is_empty() {
        built.anomalies.push(Anomaly::warning(
            rules::EMPTY_POINTS,
            component,
            "no usable rows; component passes through unchanged",
        ));
    } else if built.points.is_half_span() && !component.kind.is_point_like() {
        let missing = if built.points.contains(Role::End1) { "2" } else { "1" };
        built.anomalies.push(
            Anomaly::info(
                rules::INCOMPLETE_SPAN,
                component,
                format!("linear component is missing endpoint {}", missing),
            )
            .with_detail("missing_role", missing),
        );
    }

    built
}

fn build_point(
    component: &Component,
    role: Role,
    row: &RawRow,
    defaults: &DesignDefaults,
    anomalies: &mut Vec<Anomaly>,
) -> Point {
    let mut read = |field: &'static str, value: &Option<RawValue>, required: bool| -> Option<f64> {
        let value = match value {
            Some(v) if !v.is_blank() => v,
            _ => {
                if required {
                    anomalies.push(
                        Anomaly::warning(
                            rules::MISSING_COORDINATE,
                            component,
                            format!("role {} has no {} value; using 0", role, field),
                        )
                        .scoped(format!("{}:{}", role, field)),
                    );
                }
                return None;
            }
        };
        let measure = value.measure();
        if measure.is_sentinel() {
            anomalies.push(
                Anomaly::warning(
                    rules::PARSE_SENTINEL,
                    component,
                    format!("role {} field {} is not a number; read as 0", role, field),
                )
                .scoped(format!("{}:{}", role, field))
                .with_detail("raw", format!("{:?}", value)),
            );
        }
        Some(measure.value())
    };

    let pos = Coord::new(
        read("east", &row.east, true).unwrap_or(0.0),
        read("north", &row.north, true).unwrap_or(0.0),
        read("up", &row.up, true).unwrap_or(0.0),
    );
    let bore = read("bore", &row.bore, false).unwrap_or(0.0);

    let mut design = |field: &'static str, value: &Option<RawValue>, fallback: Option<f64>| {
        match read(field, value, false) {
            Some(v) if v != 0.0 => Some(v),
            _ => fallback,
        }
    };

    Point {
        pos,
        bore,
        radius: design("radius", &row.radius, defaults.radius),
        wall_thickness: design("wall_thickness", &row.wall_thickness, defaults.wall_thickness),
        corrosion_allowance: design(
            "corrosion_allowance",
            &row.corrosion_allowance,
            defaults.corrosion_allowance,
        ),
        insulation_thickness: design(
            "insulation_thickness",
            &row.insulation_thickness,
            defaults.insulation_thickness,
        ),
        weight_per_length: design(
            "weight_per_length",
            &row.weight_per_length,
            defaults.weight_per_length,
        ),
        pressure: design("pressure", &row.pressure, defaults.pressure),
        hydro_pressure: design("hydro_pressure", &row.hydro_pressure, defaults.hydro_pressure),
        material: Some(
            row.material
                .clone()
                .unwrap_or_else(|| defaults.material.clone()),
        ),
        restraint_type: row.restraint_type.clone(),
        node_name: row.node_name.clone(),
    }
}

/// Build points for every component that carries raw rows
///
/// Components without rows keep whatever points they already have.
pub fn build_all(components: &mut [Component], settings: &Settings) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for component in components.iter_mut() {
        if component.rows.is_empty() {
            if component.points.is_empty() {
                anomalies.push(Anomaly::warning(
                    rules::EMPTY_POINTS,
                    component,
                    "no rows and no points; component passes through unchanged",
                ));
            }
            continue;
        }
        let built = build_points(component, &settings.defaults);
        debug!(refno = %component.refno, points = built.points.len(), "built point model");
        component.points = built.points;
        anomalies.extend(built.anomalies);
    }
    anomalies
}

/// Reconstruct missing bend vertices and compute bend angles
pub fn complete_bends(components: &mut [Component], settings: &Settings) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for bend in components
        .iter_mut()
        .filter(|c| c.kind == ComponentKind::Bend)
    {
        let Some((from, to)) = bend.endpoints() else {
            continue;
        };

        if bend.centre().is_none() && is_skew(&from, &to, settings.skew_threshold) {
            if let Some(inferred) = infer_corner(&from, &to) {
                let template = bend.template_point();
                bend.points
                    .insert(Role::Centre, template.relocated(inferred.corner, template.bore));
                anomalies.push(
                    Anomaly::warning(
                        rules::BEND_CORNER_INFERRED,
                        bend,
                        format!(
                            "bend vertex inferred at {} from the {} axis of endpoint 2; \
                             add a role 0 row to the source data to confirm it",
                            point_token(&inferred.corner, None),
                            AXIS_NAMES[inferred.axis]
                        ),
                    )
                    .with_detail("corner_e", format_coord(inferred.corner.e))
                    .with_detail("corner_n", format_coord(inferred.corner.n))
                    .with_detail("corner_u", format_coord(inferred.corner.u)),
                );
            }
        }

        let Some(vertex) = bend.centre().map(|p| p.pos) else {
            continue;
        };
        let angle = compute_angle(&from, &vertex, &to);
        bend.angle = Some(angle.degrees);
        if angle.degenerate {
            anomalies.push(Anomaly::warning(
                rules::BEND_ANGLE_DEGENERATE,
                bend,
                format!(
                    "bend leg has zero length; angle set to {}°",
                    format_coord(angle.degrees)
                ),
            ));
        }
    }
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(rows: Vec<RawRow>) -> Component {
        let mut c = Component::new("P-1", ComponentKind::Pipe).with_ordinal(3);
        c.rows = rows;
        c
    }

    #[test]
    fn test_builds_span_with_defaults() {
        let c = component(vec![
            RawRow::at("1", [0.0, 0.0, 0.0], 200.0),
            RawRow::at("2", [0.0, 1000.0, 0.0], 200.0),
        ]);
        let built = build_points(&c, &DesignDefaults::default());
        assert!(built.anomalies.is_empty());
        assert!(built.points.has_span());
        let p1 = built.points.get(Role::End1).unwrap();
        assert_eq!(p1.corrosion_allowance, Some(3.0));
        assert_eq!(p1.material.as_deref(), Some("A106-B"));
        assert_eq!(p1.wall_thickness, None);
    }

    #[test]
    fn test_zero_design_value_takes_default_but_empty_material_is_kept() {
        let mut row = RawRow::at("1", [0.0, 0.0, 0.0], 100.0);
        row.corrosion_allowance = Some(RawValue::Number(0.0));
        row.wall_thickness = Some(RawValue::Text("6.02mm".to_string()));
        row.material = Some(String::new());
        let built = build_points(&component(vec![row]), &DesignDefaults::default());
        let p = built.points.get(Role::End1).unwrap();
        assert_eq!(p.corrosion_allowance, Some(3.0));
        assert_eq!(p.wall_thickness, Some(6.02));
        assert_eq!(p.material.as_deref(), Some(""));
    }

    #[test]
    fn test_text_coordinates_reparsed_and_sentinel_reported() {
        let mut row = RawRow::at("1", [0.0, 0.0, 0.0], 100.0);
        row.east = Some(RawValue::Text("1250mm".to_string()));
        row.north = Some(RawValue::Text("??".to_string()));
        let built = build_points(&component(vec![row]), &DesignDefaults::default());
        let p = built.points.get(Role::End1).unwrap();
        assert_eq!(p.pos, Coord::new(1250.0, 0.0, 0.0));
        let sentinels: Vec<_> = built
            .anomalies
            .iter()
            .filter(|a| a.rule == rules::PARSE_SENTINEL)
            .collect();
        assert_eq!(sentinels.len(), 1);
        assert_eq!(sentinels[0].ordinal, Some(3));
    }

    #[test]
    fn test_duplicate_role_overwrites_and_warns() {
        let c = component(vec![
            RawRow::at("1", [0.0, 0.0, 0.0], 100.0),
            RawRow::at("1", [5.0, 0.0, 0.0], 100.0),
        ]);
        let built = build_points(&c, &DesignDefaults::default());
        assert_eq!(built.points.get(Role::End1).unwrap().pos.e, 5.0);
        assert!(built.anomalies.iter().any(|a| a.rule == rules::DUPLICATE_ROLE));
        assert!(built.anomalies.iter().any(|a| a.rule == rules::INCOMPLETE_SPAN));
    }

    #[test]
    fn test_no_usable_rows_yields_empty_dict() {
        let mut bad = RawRow::at("EP1", [0.0, 0.0, 0.0], 100.0);
        bad.role = Some(RawValue::Text("EP1".to_string()));
        let built = build_points(&component(vec![bad]), &DesignDefaults::default());
        assert!(built.points.is_empty());
        assert!(built.anomalies.iter().any(|a| a.rule == rules::INVALID_ROLE));
        assert!(built.anomalies.iter().any(|a| a.rule == rules::EMPTY_POINTS));
    }

    #[test]
    fn test_complete_bends_infers_corner_and_angle() {
        let mut bend = Component::new("B-1", ComponentKind::Bend)
            .with_point(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 100.0))
            .with_point(Role::End2, Point::new(Coord::new(150.0, 300.0, 0.0), 100.0));
        let anomalies = complete_bends(std::slice::from_mut(&mut bend), &Settings::default());

        assert_eq!(bend.centre().unwrap().pos, Coord::new(0.0, 300.0, 0.0));
        assert!((bend.angle.unwrap() - 90.0).abs() < 1e-9);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].rule, rules::BEND_CORNER_INFERRED);
    }

    #[test]
    fn test_complete_bends_flags_degenerate_leg() {
        let mut bend = Component::new("B-2", ComponentKind::Bend)
            .with_point(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 100.0))
            .with_point(Role::End2, Point::new(Coord::new(0.0, 300.0, 0.0), 100.0))
            .with_point(Role::Centre, Point::new(Coord::new(0.0, 0.0, 0.0), 100.0));
        let anomalies = complete_bends(std::slice::from_mut(&mut bend), &Settings::default());
        assert_eq!(bend.angle, Some(90.0));
        assert_eq!(anomalies[0].rule, rules::BEND_ANGLE_DEGENERATE);
    }
}
