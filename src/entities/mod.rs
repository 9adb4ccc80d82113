//! Entity type definitions

pub mod anomaly;
pub mod component;
pub mod point;

pub use anomaly::{Anomaly, AnomalyLog, Severity};
pub use component::{Component, ComponentKind, Provenance};
pub use point::{Point, PointDict, RawRow, RawValue, Role};
