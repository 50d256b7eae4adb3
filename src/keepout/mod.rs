//! Keepout and envelope derivation layer.
//!
//! Translates raw configured outlines and scalar envelope parameters into
//! the per-positioner polygons the collision layers consume.
//!
//! # Contents
//!
//! - [`config`]: petal geometry configuration
//! - [`builder`]: keepout set and fixed envelope construction

pub mod builder;
pub mod config;

pub use builder::{build_keepouts, FixedEnvelopes, KeepoutSet};
pub use config::{GeometryConfig, PointList};
