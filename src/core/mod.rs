//! Core module - geometry, policy and the reconstruction stages

pub mod config;
pub mod direction;
pub mod geometry;
pub mod pipeline;
pub mod point_model;
pub mod policy;
pub mod refno;
pub mod resolve;
pub mod segment;
pub mod sequencer;
pub mod snapper;

pub use config::{ConfigError, DesignDefaults, ProcessingMode, SequencerSettings, Settings};
pub use geometry::Coord;
pub use pipeline::{Pipeline, PipelineOutcome};
pub use point_model::{build_all, build_points, complete_bends, BuiltPoints};
pub use policy::{ConnectionPolicy, SkewClass, Verdict};
pub use refno::{RefnoAllocator, SyntheticTag};
pub use resolve::{resolve_overlaps, resolve_with, Resolution};
pub use segment::{segmentize, segmentize_with, Segmented};
pub use sequencer::{sequence, sequence_with, Sequencing};
pub use snapper::{snap_sequential, snap_with, Snapped};
