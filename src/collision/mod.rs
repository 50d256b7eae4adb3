//! Collision evaluation layer.
//!
//! # Architecture
//!
//! ```text
//! SweepDriver            ← WHEN: walks quantized sweeps in lockstep
//!     │ per-step poses
//!     ▼
//! SpatialClassifier      ← WHICH: decision table over envelopes (cases I-IV)
//!     │ placed polygons
//!     ▼
//! Polygon overlap test   ← WHETHER: segment intersection kernel
//! ```
//!
//! [`report`] reduces the sweeps from many evaluations to one earliest
//! collision per positioner.

pub mod classifier;
pub mod driver;
pub mod report;

pub use classifier::{NeighborPose, SpatialClassifier};
pub use driver::{SweepDriver, DEFAULT_TIMESTEP};
pub use report::{earliest_collisions, CollisionSummary};
