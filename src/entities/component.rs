//! Component entity type - the unit of work of every resolution stage

use serde::{Deserialize, Serialize};

use crate::core::geometry::{distance, sub, unit, Coord};
use crate::entities::point::{Point, PointDict, RawRow, Role};
use nalgebra::Vector3;

/// Resolved component kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Straight run
    Pipe,
    #[serde(alias = "elbow")]
    Bend,
    Tee,
    Flange,
    Valve,
    /// Branch outlet
    Olet,
    ReducerConcentric,
    ReducerEccentric,
    Support,
    /// Not represented downstream (gaskets, bolts, ...)
    Skip,
}

impl ComponentKind {
    /// Straight run eligible for splitting and segmentation
    pub fn is_run(&self) -> bool {
        matches!(self, ComponentKind::Pipe)
    }

    /// Can change the direction of travel
    pub fn can_turn(&self) -> bool {
        matches!(
            self,
            ComponentKind::Bend | ComponentKind::Tee | ComponentKind::Olet
        )
    }

    /// Described by a centre point rather than a span
    pub fn is_point_like(&self) -> bool {
        matches!(self, ComponentKind::Support | ComponentKind::Olet)
    }

    /// In-line fitting that can be engulfed by a run
    pub fn is_fitting(&self) -> bool {
        matches!(
            self,
            ComponentKind::Bend
                | ComponentKind::Tee
                | ComponentKind::Flange
                | ComponentKind::Valve
                | ComponentKind::ReducerConcentric
                | ComponentKind::ReducerEccentric
        )
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComponentKind::Pipe => "PIPE",
            ComponentKind::Bend => "BEND",
            ComponentKind::Tee => "TEE",
            ComponentKind::Flange => "FLANGE",
            ComponentKind::Valve => "VALVE",
            ComponentKind::Olet => "OLET",
            ComponentKind::ReducerConcentric => "REDUCER-CONCENTRIC",
            ComponentKind::ReducerEccentric => "REDUCER-ECCENTRIC",
            ComponentKind::Support => "SUPPORT",
            ComponentKind::Skip => "SKIP",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pipe" => Ok(ComponentKind::Pipe),
            "bend" | "elbow" => Ok(ComponentKind::Bend),
            "tee" => Ok(ComponentKind::Tee),
            "flange" => Ok(ComponentKind::Flange),
            "valve" => Ok(ComponentKind::Valve),
            "olet" => Ok(ComponentKind::Olet),
            "reducer_concentric" => Ok(ComponentKind::ReducerConcentric),
            "reducer_eccentric" => Ok(ComponentKind::ReducerEccentric),
            "support" => Ok(ComponentKind::Support),
            "skip" => Ok(ComponentKind::Skip),
            _ => Err(format!("Invalid component kind: {}", s)),
        }
    }
}

/// Where a component came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Provenance {
    #[default]
    Input,
    /// Remainder of a run split around engulfed fittings
    SubRun,
    /// Pipe synthesized across a coordinate gap
    Bridge,
    /// Piece of an over-length run
    Segment,
}

impl Provenance {
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, Provenance::Input)
    }
}

/// A piping component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Stable identifier
    pub refno: String,

    pub kind: ComponentKind,

    /// Raw input type code (e.g. "GASK")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,

    /// Pipeline reference this component belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_ref: Option<String>,

    /// Input position, used for stable ordering
    #[serde(default)]
    pub ordinal: usize,

    #[serde(default)]
    pub provenance: Provenance,

    /// Refno this component was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Raw rows, consumed by the point-model builder
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<RawRow>,

    /// Resolved per-role points
    #[serde(default, skip_serializing_if = "PointDict::is_empty")]
    pub points: PointDict,

    /// Bend deflection angle in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

impl Component {
    pub fn new(refno: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            refno: refno.into(),
            kind,
            type_code: None,
            pipeline_ref: None,
            ordinal: 0,
            provenance: Provenance::Input,
            parent: None,
            rows: Vec::new(),
            points: PointDict::new(),
            angle: None,
        }
    }

    pub fn with_ordinal(mut self, ordinal: usize) -> Self {
        self.ordinal = ordinal;
        self
    }

    pub fn with_pipeline(mut self, pipeline_ref: impl Into<String>) -> Self {
        self.pipeline_ref = Some(pipeline_ref.into());
        self
    }

    pub fn with_type_code(mut self, code: impl Into<String>) -> Self {
        self.type_code = Some(code.into());
        self
    }

    pub fn with_point(mut self, role: Role, point: Point) -> Self {
        self.points.insert(role, point);
        self
    }

    /// Linear component with both endpoints
    pub fn span(
        refno: impl Into<String>,
        kind: ComponentKind,
        from: Coord,
        to: Coord,
        bore: f64,
    ) -> Self {
        Self::new(refno, kind)
            .with_point(Role::End1, Point::new(from, bore))
            .with_point(Role::End2, Point::new(to, bore))
    }

    /// Synthetic straight run derived from `parent`
    ///
    /// Design attributes come from the parent's role-1 point (or its first
    /// point when it has no role 1); only coordinates and bores are fresh.
    pub fn synthetic_run(
        refno: String,
        parent: &Component,
        provenance: Provenance,
        from: (Coord, f64),
        to: (Coord, f64),
    ) -> Self {
        let template = parent.template_point();
        let mut run = Self::new(refno, ComponentKind::Pipe);
        run.pipeline_ref = parent.pipeline_ref.clone();
        run.ordinal = parent.ordinal;
        run.provenance = provenance;
        run.parent = Some(parent.refno.clone());
        run.points.insert(Role::End1, template.relocated(from.0, from.1));
        run.points.insert(Role::End2, template.relocated(to.0, to.1));
        run
    }

    /// Point whose design attributes synthetic children inherit
    pub fn template_point(&self) -> Point {
        self.points
            .get(Role::End1)
            .or_else(|| self.points.iter().next().map(|(_, p)| p))
            .cloned()
            .unwrap_or_default()
    }

    pub fn entry(&self) -> Option<&Point> {
        self.points.get(Role::End1)
    }

    pub fn exit(&self) -> Option<&Point> {
        self.points.get(Role::End2)
    }

    pub fn centre(&self) -> Option<&Point> {
        self.points.get(Role::Centre)
    }

    pub fn branch(&self) -> Option<&Point> {
        self.points.get(Role::Branch)
    }

    /// Entry and exit coordinates when both exist
    pub fn endpoints(&self) -> Option<(Coord, Coord)> {
        Some((self.entry()?.pos, self.exit()?.pos))
    }

    /// Endpoint-to-endpoint length
    pub fn length(&self) -> Option<f64> {
        self.endpoints().map(|(a, b)| distance(&a, &b))
    }

    /// Nominal bore: role 1, else centre, else any point
    pub fn bore(&self) -> f64 {
        self.entry()
            .or_else(|| self.centre())
            .or_else(|| self.points.iter().next().map(|(_, p)| p))
            .map(|p| p.bore)
            .unwrap_or(0.0)
    }

    /// Coordinates other components may connect to
    pub fn connection_points(&self) -> Vec<Coord> {
        if self.kind.is_point_like() && !self.points.has_span() {
            return self
                .points
                .iter()
                .filter(|(role, _)| matches!(role, Role::Centre | Role::Branch))
                .map(|(_, p)| p.pos)
                .collect();
        }
        self.points
            .iter()
            .filter(|(role, _)| **role != Role::Centre)
            .map(|(_, p)| p.pos)
            .collect()
    }

    /// Skipped gasket body whose thickness should be absorbed
    pub fn is_gasket(&self) -> bool {
        self.kind == ComponentKind::Skip
            && self
                .type_code
                .as_deref()
                .is_some_and(|c| c.trim().to_ascii_uppercase().starts_with("GASK"))
    }

    /// Local direction of travel leaving the exit point
    pub fn exit_direction(&self) -> Option<Vector3<f64>> {
        let exit = self.exit()?.pos;
        let from = match (self.kind, self.centre()) {
            (ComponentKind::Bend, Some(c)) => c.pos,
            _ => self.entry()?.pos,
        };
        unit(&sub(&exit, &from))
    }

    /// Local direction of travel arriving at the entry point
    pub fn entry_direction(&self) -> Option<Vector3<f64>> {
        let entry = self.entry()?.pos;
        let to = match (self.kind, self.centre()) {
            (ComponentKind::Bend, Some(c)) => c.pos,
            _ => self.exit()?.pos,
        };
        unit(&sub(&to, &entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> Component {
        let mut p = Component::span(
            "P-1",
            ComponentKind::Pipe,
            Coord::new(0.0, 0.0, 0.0),
            Coord::new(0.0, 1000.0, 0.0),
            200.0,
        );
        if let Some(pt) = p.points.get_mut(Role::End1) {
            pt.wall_thickness = Some(8.18);
        }
        p
    }

    #[test]
    fn test_component_geometry_accessors() {
        let p = pipe();
        assert_eq!(p.length(), Some(1000.0));
        assert_eq!(p.bore(), 200.0);
        assert_eq!(p.connection_points().len(), 2);
        let dir = p.exit_direction().unwrap();
        assert!((dir.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_synthetic_run_inherits_role1_attributes() {
        let parent = pipe();
        let child = Component::synthetic_run(
            "P-1_SP1".to_string(),
            &parent,
            Provenance::SubRun,
            (Coord::new(0.0, 0.0, 0.0), 200.0),
            (Coord::new(0.0, 400.0, 0.0), 200.0),
        );
        assert_eq!(child.kind, ComponentKind::Pipe);
        assert_eq!(child.parent.as_deref(), Some("P-1"));
        assert!(child.provenance.is_synthetic());
        assert_eq!(child.exit().unwrap().wall_thickness, Some(8.18));
        assert_eq!(child.length(), Some(400.0));
    }

    #[test]
    fn test_gasket_detection() {
        let g = Component::new("G-1", ComponentKind::Skip).with_type_code("gask");
        assert!(g.is_gasket());
        let bolt = Component::new("B-1", ComponentKind::Skip).with_type_code("BOLT");
        assert!(!bolt.is_gasket());
        let flange = Component::new("F-1", ComponentKind::Flange).with_type_code("GASK");
        assert!(!flange.is_gasket());
    }

    #[test]
    fn test_bend_directions_use_centre() {
        let bend = Component::new("B-1", ComponentKind::Bend)
            .with_point(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 100.0))
            .with_point(Role::End2, Point::new(Coord::new(150.0, 150.0, 0.0), 100.0))
            .with_point(Role::Centre, Point::new(Coord::new(0.0, 150.0, 0.0), 100.0));
        let entry = bend.entry_direction().unwrap();
        let exit = bend.exit_direction().unwrap();
        assert!((entry.y - 1.0).abs() < 1e-9);
        assert!((exit.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_kind_parse_and_flags() {
        assert_eq!("reducer-concentric".parse::<ComponentKind>().unwrap(), ComponentKind::ReducerConcentric);
        assert_eq!("ELBOW".parse::<ComponentKind>().unwrap(), ComponentKind::Bend);
        assert!(ComponentKind::Tee.can_turn());
        assert!(!ComponentKind::Valve.can_turn());
        assert!(ComponentKind::Support.is_point_like());
        assert!(ComponentKind::Flange.is_fitting());
        assert!(!ComponentKind::Pipe.is_fitting());
    }
}
