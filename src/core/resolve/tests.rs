//! Unit tests for the overlap resolution engine

use super::*;
use crate::core::geometry::{approx_eq, distance, Coord};
use crate::entities::anomaly::Severity;
use crate::entities::component::ComponentKind;
use crate::entities::point::{Point, Role};

fn run(refno: &str, from: [f64; 3], to: [f64; 3], bore: f64) -> Component {
    Component::span(refno, ComponentKind::Pipe, from.into(), to.into(), bore)
}

fn fitting(refno: &str, kind: ComponentKind, from: [f64; 3], to: [f64; 3], bore: f64) -> Component {
    Component::span(refno, kind, from.into(), to.into(), bore)
}

fn strict() -> Settings {
    Settings {
        gap_fill: false,
        ..Settings::default()
    }
}

fn sub_runs(resolution: &Resolution) -> Vec<&Component> {
    resolution
        .components
        .iter()
        .filter(|c| c.provenance == Provenance::SubRun)
        .collect()
}

fn scenario_a() -> Vec<Component> {
    vec![
        run("P-1", [0.0, 0.0, 0.0], [0.0, 10_000.0, 0.0], 400.0).with_ordinal(0),
        fitting("V-1", ComponentKind::Valve, [0.0, 5000.0, 0.0], [0.0, 5100.0, 0.0], 400.0)
            .with_ordinal(1),
    ]
}

#[test]
fn test_span_walk_splits_around_engulfed_valve() {
    let resolution = resolve_overlaps(scenario_a(), &strict());
    let subs = sub_runs(&resolution);

    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].endpoints(), Some((Coord::new(0.0, 0.0, 0.0), Coord::new(0.0, 5000.0, 0.0))));
    assert_eq!(
        subs[1].endpoints(),
        Some((Coord::new(0.0, 5100.0, 0.0), Coord::new(0.0, 10_000.0, 0.0)))
    );
    assert!(resolution.components.iter().all(|c| c.refno != "P-1"));
    assert_eq!(subs[0].refno, "P-1_SP1");
    assert_eq!(subs[1].refno, "P-1_SP2");
    assert_eq!(subs[0].parent.as_deref(), Some("P-1"));
}

#[test]
fn test_split_conserves_length() {
    let original = scenario_a();
    let run_length = original[0].length().unwrap();
    let span_length = original[1].length().unwrap();

    let resolution = resolve_overlaps(original, &strict());
    let total: f64 = sub_runs(&resolution)
        .iter()
        .map(|c| c.length().unwrap())
        .sum();

    assert!((total + span_length - run_length).abs() <= strict().continuity_tolerance);
}

#[test]
fn test_sub_runs_inherit_design_attributes() {
    let mut input = scenario_a();
    if let Some(p) = input[0].points.get_mut(Role::End1) {
        p.wall_thickness = Some(12.7);
        p.material = Some("A333-6".to_string());
    }
    let resolution = resolve_overlaps(input, &strict());
    for sub in sub_runs(&resolution) {
        for role in [Role::End1, Role::End2] {
            let p = sub.points.get(role).unwrap();
            assert_eq!(p.wall_thickness, Some(12.7));
            assert_eq!(p.material.as_deref(), Some("A333-6"));
            assert_eq!(p.bore, 400.0);
        }
    }
}

#[test]
fn test_resolution_is_idempotent() {
    let settings = Settings::default();
    let first = resolve_overlaps(scenario_a(), &settings);
    let second = resolve_overlaps(first.components.clone(), &settings);

    assert_eq!(second.components, first.components);
    let known: Vec<&str> = first.anomalies.iter().map(|a| a.id.as_str()).collect();
    let delta: Vec<&Anomaly> = second
        .anomalies
        .iter()
        .filter(|a| !known.contains(&a.id.as_str()))
        .collect();
    assert!(delta.is_empty(), "unexpected new anomalies: {:?}", delta);
}

#[test]
fn test_incompatible_bore_is_not_an_occupant() {
    let input = vec![
        run("P-1", [0.0, 0.0, 0.0], [0.0, 10_000.0, 0.0], 400.0),
        fitting("V-1", ComponentKind::Valve, [0.0, 5000.0, 0.0], [0.0, 5100.0, 0.0], 150.0),
    ];
    let resolution = resolve_overlaps(input, &strict());
    assert!(sub_runs(&resolution).is_empty());
    assert!(resolution.components.iter().any(|c| c.refno == "P-1"));
}

#[test]
fn test_neighbour_at_run_end_is_not_engulfed() {
    let input = vec![
        fitting("FL-1", ComponentKind::Flange, [0.0, -100.0, 0.0], [0.0, 0.0, 0.0], 400.0),
        run("P-1", [0.0, 0.0, 0.0], [0.0, 3000.0, 0.0], 400.0),
        fitting("FL-2", ComponentKind::Flange, [0.0, 3000.0, 0.0], [0.0, 3100.0, 0.0], 400.0),
    ];
    let resolution = resolve_overlaps(input.clone(), &strict());
    assert_eq!(resolution.components, input);
}

#[test]
fn test_occupants_sit_between_their_sub_runs() {
    let input = vec![
        run("P-SMALL", [0.0, 0.0, 0.0], [0.0, 4000.0, 0.0], 100.0).with_ordinal(0),
        run("P-LARGE", [1000.0, 0.0, 0.0], [1000.0, 4000.0, 0.0], 300.0).with_ordinal(1),
        fitting("V-S", ComponentKind::Valve, [0.0, 2000.0, 0.0], [0.0, 2200.0, 0.0], 100.0)
            .with_ordinal(2),
        fitting("V-L", ComponentKind::Valve, [1000.0, 2000.0, 0.0], [1000.0, 2300.0, 0.0], 300.0)
            .with_ordinal(3),
    ];
    let resolution = resolve_overlaps(input, &strict());
    let refnos: Vec<&str> = resolution.components.iter().map(|c| c.refno.as_str()).collect();
    assert_eq!(
        refnos,
        vec!["P-SMALL_SP1", "V-S", "P-SMALL_SP2", "P-LARGE_SP1", "V-L", "P-LARGE_SP2"]
    );
}

#[test]
fn test_path_chain_trace_for_routed_run() {
    // Chord drawn over the flange and elbow that start a routed run
    let input = vec![
        run("P-1", [0.0, 0.0, 0.0], [0.0, 3000.0, 1000.0], 200.0).with_ordinal(0),
        fitting("FL-1", ComponentKind::Flange, [0.0, 0.0, 0.0], [0.0, 100.0, 0.0], 200.0)
            .with_ordinal(1),
        fitting("EL-1", ComponentKind::Bend, [0.0, 100.0, 0.0], [0.0, 400.0, 300.0], 200.0)
            .with_ordinal(2),
    ];
    let resolution = resolve_overlaps(input, &strict());
    let subs = sub_runs(&resolution);

    assert_eq!(subs.len(), 1);
    assert_eq!(
        subs[0].endpoints(),
        Some((Coord::new(0.0, 400.0, 300.0), Coord::new(0.0, 3000.0, 1000.0)))
    );
}

#[test]
fn test_dominant_axis_scan_for_diagonal_run() {
    let input = vec![
        run("P-1", [0.0, 0.0, 0.0], [3000.0, 0.0, 3000.0], 200.0).with_ordinal(0),
        fitting("V-1", ComponentKind::Valve, [0.0, 0.0, 1000.0], [0.0, 0.0, 1200.0], 200.0)
            .with_ordinal(1),
    ];
    let resolution = resolve_overlaps(input, &strict());
    let subs = sub_runs(&resolution);

    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].endpoints(), Some((Coord::new(0.0, 0.0, 0.0), Coord::new(0.0, 0.0, 1000.0))));
    assert_eq!(
        subs[1].endpoints(),
        Some((Coord::new(0.0, 0.0, 1200.0), Coord::new(3000.0, 0.0, 3000.0)))
    );
}

#[test]
fn test_missing_run_end_is_inferred_and_flagged() {
    let half = Component::new("P-1", ComponentKind::Pipe)
        .with_point(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 200.0))
        .with_ordinal(0);
    let input = vec![
        half,
        fitting("V-1", ComponentKind::Valve, [0.0, 1000.0, 0.0], [0.0, 1200.0, 0.0], 200.0)
            .with_ordinal(1),
        fitting("FL-1", ComponentKind::Flange, [0.0, 4000.0, 0.0], [0.0, 4100.0, 0.0], 200.0)
            .with_ordinal(2),
    ];
    let resolution = resolve_overlaps(input, &strict());

    let inferred = resolution
        .anomalies
        .iter()
        .find(|a| a.rule == rules::RUN_END_INFERRED)
        .unwrap();
    assert_eq!(inferred.severity, Severity::Warning);
    assert_eq!(inferred.refno, "P-1");

    // Inferred end is the far face of the flange, so only two gaps survive
    let subs = sub_runs(&resolution);
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[1].endpoints(), Some((Coord::new(0.0, 1200.0, 0.0), Coord::new(0.0, 4000.0, 0.0))));
    assert!(subs.iter().all(|s| s.length().unwrap() >= strict().min_pipe_length));
}

#[test]
fn test_ambiguous_run_end_left_unresolved() {
    let half = Component::new("P-1", ComponentKind::Pipe)
        .with_point(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 200.0));
    let input = vec![
        half,
        fitting("V-1", ComponentKind::Valve, [0.0, 1000.0, 0.0], [0.0, 1200.0, 0.0], 200.0),
        fitting("V-2", ComponentKind::Valve, [1000.0, 0.0, 0.0], [1200.0, 0.0, 0.0], 200.0),
    ];
    let resolution = resolve_overlaps(input, &strict());

    assert!(resolution.anomalies.iter().any(|a| a.rule == rules::RUN_END_AMBIGUOUS));
    assert!(resolution.components.iter().any(|c| c.refno == "P-1"));
}

#[test]
fn test_upstream_flange_does_not_make_run_end_ambiguous() {
    let half = Component::new("P-1", ComponentKind::Pipe)
        .with_point(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 200.0))
        .with_ordinal(1);
    let input = vec![
        fitting("F-0", ComponentKind::Flange, [0.0, -100.0, 0.0], [0.0, 0.0, 0.0], 200.0)
            .with_ordinal(0),
        half,
        fitting("V-1", ComponentKind::Valve, [0.0, 5000.0, 0.0], [0.0, 5100.0, 0.0], 200.0)
            .with_ordinal(2),
        fitting("F-2", ComponentKind::Flange, [0.0, 10_000.0, 0.0], [0.0, 10_100.0, 0.0], 200.0)
            .with_ordinal(3),
    ];
    let resolution = resolve_overlaps(input, &strict());

    assert!(resolution.anomalies.iter().all(|a| a.rule != rules::RUN_END_AMBIGUOUS));
    let inferred = resolution
        .anomalies
        .iter()
        .find(|a| a.rule == rules::RUN_END_INFERRED)
        .unwrap();
    assert_eq!(inferred.detail.get("from_refno").map(String::as_str), Some("F-2"));

    let spans: Vec<_> = sub_runs(&resolution).iter().filter_map(|c| c.endpoints()).collect();
    assert_eq!(
        spans,
        vec![
            (Coord::new(0.0, 0.0, 0.0), Coord::new(0.0, 5000.0, 0.0)),
            (Coord::new(0.0, 5100.0, 0.0), Coord::new(0.0, 10_000.0, 0.0)),
        ]
    );
    assert!(resolution.anomalies.iter().all(|a| a.rule != rules::DISCONNECTED));
}

#[test]
fn test_larger_bore_runs_split_first() {
    let small = Component::new("P-S", ComponentKind::Pipe)
        .with_point(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 100.0))
        .with_ordinal(0);
    let large = Component::new("P-L", ComponentKind::Pipe)
        .with_point(Role::End1, Point::new(Coord::new(1000.0, 0.0, 0.0), 300.0))
        .with_ordinal(1);
    let input = vec![
        small,
        large,
        fitting("FL-S", ComponentKind::Flange, [0.0, 2000.0, 0.0], [0.0, 2100.0, 0.0], 100.0)
            .with_ordinal(2),
        fitting("FL-L", ComponentKind::Flange, [1000.0, 2000.0, 0.0], [1000.0, 2100.0, 0.0], 300.0)
            .with_ordinal(3),
    ];
    let resolution = resolve_overlaps(input, &strict());

    let inferred: Vec<&str> = resolution
        .anomalies
        .iter()
        .filter(|a| a.rule == rules::RUN_END_INFERRED)
        .map(|a| a.refno.as_str())
        .collect();
    assert_eq!(inferred, vec!["P-L", "P-S"]);
}

#[test]
fn test_equal_bore_runs_split_in_ordinal_order() {
    // P-A is listed second but has the lower ordinal, so it is split first
    // and its dropped 5 mm tail is gone before P-B looks for an end.
    let half = Component::new("P-B", ComponentKind::Pipe)
        .with_point(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 200.0))
        .with_ordinal(1);
    let input = vec![
        half,
        run("P-A", [0.0, 3000.0, 0.0], [0.0, 9000.0, 0.0], 200.0).with_ordinal(0),
        fitting("V-1", ComponentKind::Valve, [0.0, 8000.0, 0.0], [0.0, 8995.0, 0.0], 200.0)
            .with_ordinal(2),
    ];
    let resolution = resolve_overlaps(input, &strict());

    assert!(resolution.components.iter().any(|c| c.refno == "P-A_SP1"));
    let inferred = resolution
        .anomalies
        .iter()
        .find(|a| a.rule == rules::RUN_END_INFERRED)
        .unwrap();
    assert_eq!(inferred.refno, "P-B");
    assert_eq!(inferred.detail.get("from_refno").map(String::as_str), Some("V-1"));
}

#[test]
fn test_isolated_component_reported_after_full_resolution() {
    let mut input = scenario_a();
    input.push(run("P-9", [5000.0, 0.0, 0.0], [5000.0, 1000.0, 0.0], 100.0).with_ordinal(2));
    let resolution = resolve_overlaps(input, &Settings::default());

    let disconnected: Vec<&Anomaly> = resolution
        .anomalies
        .iter()
        .filter(|a| a.rule == rules::DISCONNECTED)
        .collect();
    assert_eq!(disconnected.len(), 1);
    let anomaly = disconnected[0];
    assert_eq!(anomaly.severity, Severity::Warning);
    assert_eq!(anomaly.refno, "P-9");
    assert_eq!(anomaly.ordinal, Some(2));
    assert_eq!(anomaly.detail.get("nearest_refno").map(String::as_str), Some("P-1_SP1"));
    let reported: f64 = anomaly.detail["distance"].parse().unwrap();
    assert!(approx_eq(reported, distance(&Coord::new(5000.0, 0.0, 0.0), &Coord::new(0.0, 0.0, 0.0))));
}
