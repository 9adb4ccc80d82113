//! Point entity types - positional roles, per-role points and raw input rows

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::geometry::{parse_measure, Coord, Measure};

/// Positional role of a point within its component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Centre / single point
    #[serde(rename = "0")]
    Centre,
    /// First endpoint
    #[serde(rename = "1")]
    End1,
    /// Second endpoint
    #[serde(rename = "2")]
    End2,
    /// Branch outlet
    #[serde(rename = "3")]
    Branch,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Centre, Role::End1, Role::End2, Role::Branch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Centre => "0",
            Role::End1 => "1",
            Role::End2 => "2",
            Role::Branch => "3",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Role::Centre),
            "1" => Ok(Role::End1),
            "2" => Ok(Role::End2),
            "3" => Ok(Role::Branch),
            other => Err(format!("Invalid point role: '{}'. Use 0, 1, 2 or 3", other)),
        }
    }
}

/// One positional role of a component
///
/// Design attributes are explicit options: `None` means neither the input nor
/// the configured defaults supplied a value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Coordinate (E, N, U) in mm
    pub pos: Coord,

    /// Nominal bore in mm
    #[serde(default)]
    pub bore: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_thickness: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrosion_allowance: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation_thickness: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_length: Option<f64>,

    /// Design pressure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,

    /// Hydrotest pressure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydro_pressure: Option<f64>,

    /// Material code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    /// Support restraint type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restraint_type: Option<String>,

    /// Support node name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl Point {
    pub fn new(pos: Coord, bore: f64) -> Self {
        Self {
            pos,
            bore,
            ..Default::default()
        }
    }

    /// Copy of this point's design attributes at a new coordinate and bore
    pub fn relocated(&self, pos: Coord, bore: f64) -> Self {
        Self {
            pos,
            bore,
            ..self.clone()
        }
    }
}

/// Fixed-key mapping from positional role to point
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointDict(BTreeMap<Role, Point>);

impl PointDict {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a point, returning the one it replaced
    pub fn insert(&mut self, role: Role, point: Point) -> Option<Point> {
        self.0.insert(role, point)
    }

    pub fn get(&self, role: Role) -> Option<&Point> {
        self.0.get(&role)
    }

    pub fn get_mut(&mut self, role: Role) -> Option<&mut Point> {
        self.0.get_mut(&role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains_key(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Role, &Point)> {
        self.0.iter()
    }

    /// Both "1" and "2" present
    pub fn has_span(&self) -> bool {
        self.contains(Role::End1) && self.contains(Role::End2)
    }

    /// Exactly one of "1" and "2" present
    pub fn is_half_span(&self) -> bool {
        self.contains(Role::End1) != self.contains(Role::End2)
    }
}

impl FromIterator<(Role, Point)> for PointDict {
    fn from_iter<I: IntoIterator<Item = (Role, Point)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A raw numeric field as it arrives from upstream collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric reading; text is reparsed with unit stripping
    pub fn measure(&self) -> Measure {
        match self {
            RawValue::Number(v) if v.is_finite() => Measure::Value(*v),
            RawValue::Number(_) => Measure::Sentinel,
            RawValue::Text(s) => parse_measure(s),
        }
    }

    /// Empty text counts as absent
    pub fn is_blank(&self) -> bool {
        matches!(self, RawValue::Text(s) if s.trim().is_empty())
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// One input row of a component, carrying a positional role
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRow {
    /// Positional role ("0".."3"); anything else makes the row unusable
    #[serde(default)]
    pub role: Option<RawValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub east: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub north: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bore: Option<RawValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_thickness: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrosion_allowance: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation_thickness: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_length: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydro_pressure: Option<RawValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restraint_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl RawRow {
    /// Row with a role and numeric coordinates, bore and nothing else
    pub fn at(role: &str, pos: [f64; 3], bore: f64) -> Self {
        Self {
            role: Some(RawValue::Text(role.to_string())),
            east: Some(RawValue::Number(pos[0])),
            north: Some(RawValue::Number(pos[1])),
            up: Some(RawValue::Number(pos[2])),
            bore: Some(RawValue::Number(bore)),
            ..Default::default()
        }
    }

    /// Role field as text (`1` and `"1"` both read as "1")
    pub fn role_text(&self) -> Option<String> {
        match self.role.as_ref()? {
            RawValue::Number(v) if v.fract() == 0.0 => Some(format!("{}", *v as i64)),
            RawValue::Number(v) => Some(v.to_string()),
            RawValue::Text(s) => Some(s.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("1".parse::<Role>().unwrap(), Role::End1);
        assert_eq!(" 3 ".parse::<Role>().unwrap(), Role::Branch);
        assert!("EP1".parse::<Role>().is_err());
        assert_eq!(Role::Centre.to_string(), "0");
    }

    #[test]
    fn test_point_dict_serializes_role_keys() {
        let mut points = PointDict::new();
        points.insert(Role::End2, Point::new(Coord::new(0.0, 1.0, 0.0), 100.0));
        points.insert(Role::End1, Point::new(Coord::new(0.0, 0.0, 0.0), 100.0));

        let json = serde_json::to_string(&points).unwrap();
        assert!(json.find("\"1\"").unwrap() < json.find("\"2\"").unwrap());

        let back: PointDict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, points);
        assert!(back.has_span());
        assert!(!back.is_half_span());
    }

    #[test]
    fn test_relocated_keeps_design_attributes() {
        let mut p = Point::new(Coord::new(0.0, 0.0, 0.0), 200.0);
        p.wall_thickness = Some(8.18);
        p.material = Some("A106-B".to_string());

        let moved = p.relocated(Coord::new(5.0, 0.0, 0.0), 150.0);
        assert_eq!(moved.pos, Coord::new(5.0, 0.0, 0.0));
        assert_eq!(moved.bore, 150.0);
        assert_eq!(moved.wall_thickness, Some(8.18));
        assert_eq!(moved.material.as_deref(), Some("A106-B"));
    }

    #[test]
    fn test_raw_value_measure() {
        assert_eq!(RawValue::from(12.0).measure(), Measure::Value(12.0));
        assert_eq!(RawValue::from("12mm").measure(), Measure::Value(12.0));
        assert!(RawValue::from("twelve").measure().is_sentinel());
        assert!(RawValue::from("  ").is_blank());
    }

    #[test]
    fn test_raw_row_deserializes_mixed_fields() {
        let yaml = "role: \"1\"\neast: 100\nnorth: \"250.5 mm\"\nup: 0\nbore: 400\nmaterial: A333-6\n";
        let row: RawRow = serde_yml::from_str(yaml).unwrap();
        assert_eq!(row.role_text().as_deref(), Some("1"));
        assert_eq!(row.east, Some(RawValue::Number(100.0)));
        assert_eq!(row.north, Some(RawValue::Text("250.5 mm".to_string())));
        assert_eq!(row.material.as_deref(), Some("A333-6"));

        let numeric: RawRow = serde_yml::from_str("role: 2\neast: 1\n").unwrap();
        assert_eq!(numeric.role_text().as_deref(), Some("2"));
    }
}
