//! Core foundation layer.
//!
//! Bottom layer of the kernel with no internal dependencies beyond the error
//! type. All other layers depend on core.
//!
//! # Contents
//!
//! - [`polygon`]: collidable 2-D polygons, transforms, overlap test
//! - [`types`]: poses, axes, collision case taxonomy
//! - [`math`]: angular and polar primitives

pub mod math;
pub mod polygon;
pub mod types;

pub use polygon::{Point2D, Polygon};
pub use types::{Axis, CollisionCase, FixedBoundary, NeighborId, TpPose};
