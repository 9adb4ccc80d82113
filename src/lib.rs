//! PCF Resolver: geometric reconstruction of piping component tables
//!
//! Turns an unordered collection of piping components (pipes, fittings,
//! supports) into a connected, ordered run suitable for isometric output.
//! Engineering endpoints are derived per component, runs are split at the
//! fittings they engulf, small gaps are bridged and everything left over is
//! reported as an anomaly rather than silently dropped.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
