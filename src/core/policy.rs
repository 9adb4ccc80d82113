//! Connection validation policy
//!
//! Stateless plausibility rules consulted before a candidate connection or
//! bridging segment is accepted.

use nalgebra::Vector3;

use crate::core::config::Settings;
use crate::core::geometry::{distance, sub, Coord};
use crate::entities::anomaly::{rules, Severity};

/// How many axes a displacement travels on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkewClass {
    /// Zero or one axis
    Straight,
    TwoPlane,
    ThreePlane,
}

/// Outcome of validating a candidate connection
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accept,
    Reject {
        severity: Severity,
        rule: &'static str,
        reason: String,
    },
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Policy limits, copied out of `Settings`
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPolicy {
    pub max_run_length: f64,
    pub skew_2plane_limit: f64,
    pub skew_3plane_limit: f64,
    /// Per-axis displacement counted as travel on that axis
    pub axis_threshold: f64,
    pub rollback_dot_threshold: f64,
}

impl From<&Settings> for ConnectionPolicy {
    fn from(s: &Settings) -> Self {
        Self {
            max_run_length: s.max_run_length,
            skew_2plane_limit: s.skew_2plane_limit,
            skew_3plane_limit: s.skew_3plane_limit,
            axis_threshold: s.skew_threshold,
            rollback_dot_threshold: s.rollback_dot_threshold,
        }
    }
}

impl ConnectionPolicy {
    /// Classify by the number of axes with displacement above the threshold
    pub fn classify(&self, from: &Coord, to: &Coord) -> SkewClass {
        let d = sub(to, from);
        match (0..3).filter(|&a| d[a].abs() > self.axis_threshold).count() {
            0 | 1 => SkewClass::Straight,
            2 => SkewClass::TwoPlane,
            _ => SkewClass::ThreePlane,
        }
    }

    /// Skew in the horizontal plane only (E and N, no U)
    pub fn is_horizontal_skew(&self, from: &Coord, to: &Coord) -> bool {
        let d = sub(to, from);
        d.z.abs() <= self.axis_threshold
            && d.x.abs() > self.axis_threshold
            && d.y.abs() > self.axis_threshold
    }

    /// Validate a candidate connection from `from` to `to`
    pub fn validate(&self, from: &Coord, to: &Coord) -> Verdict {
        let length = distance(from, to);
        if length > self.max_run_length {
            return Verdict::Reject {
                severity: Severity::Warning,
                rule: rules::RUN_TOO_LONG,
                reason: format!(
                    "connection of {:.1} mm exceeds maximum run length {:.1} mm",
                    length, self.max_run_length
                ),
            };
        }
        if self.is_horizontal_skew(from, to) {
            return Verdict::Reject {
                severity: Severity::Warning,
                rule: rules::HORIZONTAL_SKEW,
                reason: format!("{:.1} mm connection is skewed in the horizontal plane", length),
            };
        }
        match self.classify(from, to) {
            SkewClass::ThreePlane if length > self.skew_3plane_limit => Verdict::Reject {
                severity: Severity::Warning,
                rule: rules::SKEW_3PLANE_LIMIT,
                reason: format!(
                    "three-plane skew of {:.1} mm exceeds limit {:.1} mm",
                    length, self.skew_3plane_limit
                ),
            },
            SkewClass::TwoPlane if length > self.skew_2plane_limit => Verdict::Reject {
                severity: Severity::Error,
                rule: rules::SKEW_2PLANE_LIMIT,
                reason: format!(
                    "two-plane skew of {:.1} mm exceeds limit {:.1} mm",
                    length, self.skew_2plane_limit
                ),
            },
            _ => Verdict::Accept,
        }
    }

    /// Current direction nearly reverses the previous one
    ///
    /// Callers still have to check whether the component in between can turn.
    pub fn is_rollback(&self, current: &Vector3<f64>, previous: &Vector3<f64>) -> bool {
        current.dot(previous) < self.rollback_dot_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ConnectionPolicy {
        ConnectionPolicy::from(&Settings::default())
    }

    #[test]
    fn test_straight_connection_accepted() {
        let v = policy().validate(&Coord::new(0.0, 0.0, 0.0), &Coord::new(0.0, 500.0, 0.0));
        assert!(v.is_accept());
    }

    #[test]
    fn test_too_long_rejected() {
        let v = policy().validate(&Coord::new(0.0, 0.0, 0.0), &Coord::new(0.0, 25_000.0, 0.0));
        assert!(matches!(v, Verdict::Reject { rule: rules::RUN_TOO_LONG, .. }));
    }

    #[test]
    fn test_horizontal_skew_rejected_as_warning() {
        let v = policy().validate(&Coord::new(0.0, 0.0, 0.0), &Coord::new(100.0, 100.0, 0.0));
        match v {
            Verdict::Reject { severity, rule, .. } => {
                assert_eq!(severity, Severity::Warning);
                assert_eq!(rule, rules::HORIZONTAL_SKEW);
            }
            Verdict::Accept => panic!("horizontal skew accepted"),
        }
    }

    #[test]
    fn test_vertical_two_plane_skew_limits() {
        let p = policy();
        let o = Coord::new(0.0, 0.0, 0.0);
        assert_eq!(p.classify(&o, &Coord::new(0.0, 1000.0, 1000.0)), SkewClass::TwoPlane);
        assert!(p.validate(&o, &Coord::new(0.0, 1000.0, 1000.0)).is_accept());
        match p.validate(&o, &Coord::new(0.0, 2000.0, 2000.0)) {
            Verdict::Reject { severity, rule, .. } => {
                assert_eq!(severity, Severity::Error);
                assert_eq!(rule, rules::SKEW_2PLANE_LIMIT);
            }
            Verdict::Accept => panic!("over-limit skew accepted"),
        }
    }

    #[test]
    fn test_three_plane_skew_limit_warns() {
        let p = policy();
        let o = Coord::new(0.0, 0.0, 0.0);
        assert_eq!(p.classify(&o, &Coord::new(10.0, 10.0, 10.0)), SkewClass::ThreePlane);
        match p.validate(&o, &Coord::new(2000.0, 2000.0, 2000.0)) {
            Verdict::Reject { severity, rule, .. } => {
                assert_eq!(severity, Severity::Warning);
                assert_eq!(rule, rules::SKEW_3PLANE_LIMIT);
            }
            Verdict::Accept => panic!("over-limit skew accepted"),
        }
    }

    #[test]
    fn test_rollback_detection() {
        let p = policy();
        let north = Vector3::new(0.0, 1.0, 0.0);
        let south = Vector3::new(0.0, -1.0, 0.0);
        let east = Vector3::new(1.0, 0.0, 0.0);
        assert!(p.is_rollback(&south, &north));
        assert!(!p.is_rollback(&east, &north));
        assert!(!p.is_rollback(&north, &north));
    }
}
