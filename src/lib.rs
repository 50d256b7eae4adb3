//! KavachAnticol - anti-collision kernel for a robotic fiber positioner petal
//!
//! Given the planned theta/phi rotation schedules of the two-arm robotic
//! positioners on a petal of a focal-plane instrument, this crate determines
//! whether any of them will strike a neighbor, the petal envelope, or the
//! guide-camera envelope during the move, and at what time each strike first
//! occurs. It also exposes the swept geometry needed to animate or debug a
//! move.
//!
//! # Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   collision/                        │  ← Spacetime driver,
//! │        (driver, classifier, report)                 │    case decisions
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   schedule/                         │  ← Move tables,
//! │             (move_table, sweep)                     │    quantized traces
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  positioner/                        │  ← Registry,
//! │           (calibration, registry)                   │    neighbor sets
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   keepout/                          │  ← Envelope and
//! │              (config, builder)                      │    keepout derivation
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │            (polygon, types, math)                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Coordinate frames
//!
//! - **poslocTP**: (theta, phi) in degrees, positioner-local; the frame of
//!   all collision checks and every [`TpPose`].
//! - **Petal (x, y)**: millimeters; the frame of all placed polygons.
//! - **Phi pivot frame**: the local frame of the phi arm keepout prior to
//!   placement, anchored at the phi joint with the nominal arm along +x.
//!
//! # Typical use
//!
//! ```
//! use kavach_anticol::{
//!     CollisionCase, GeometryConfig, MoveTable, PositionerConfig,
//!     PositionerRegistry, SweepDriver, TpPose,
//! };
//!
//! let mut registry = PositionerRegistry::new(GeometryConfig::default()).unwrap();
//! let mut a = PositionerConfig::new("M00001", 101);
//! a.calib.x0 = 150.0;
//! a.calib.y0 = 100.0;
//! registry.add(a).unwrap();
//! let mut b = PositionerConfig::new("M00002", 102);
//! b.calib.x0 = 156.0;
//! b.calib.y0 = 100.0;
//! registry.add(b).unwrap();
//! registry.identify_all_neighbors().unwrap();
//!
//! let driver = SweepDriver::default();
//! let table = MoveTable::from_arrays(&[0.0], &[-100.0], &[0.0], &[10.0], &[0.0]).unwrap();
//! let (sweep_a, _sweep_b) = driver
//!     .between_positioners(
//!         &registry,
//!         "M00001",
//!         TpPose::new(0.0, 0.0),
//!         &table,
//!         "M00002",
//!         TpPose::new(180.0, 0.0),
//!         &MoveTable::new(),
//!     )
//!     .unwrap();
//! assert_eq!(sweep_a.collision_case(), CollisionCase::III);
//! ```
//!
//! # Concurrency
//!
//! The kernel is single-threaded and synchronous; nothing suspends or
//! blocks. It holds no process-wide mutable state, so independent petals (or
//! independent pair evaluations) may run in parallel with one registry and
//! driver each. Polygons are value-like: every transform allocates a fresh
//! one, making them safely shareable read-only.

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Keepout derivation (depends on core)
// ============================================================================
pub mod keepout;

// ============================================================================
// Layer 3: Positioner registry (depends on core, keepout)
// ============================================================================
pub mod positioner;

// ============================================================================
// Layer 4: Schedules and sweeps (depends on core, positioner)
// ============================================================================
pub mod schedule;

// ============================================================================
// Layer 5: Collision evaluation (depends on all layers)
// ============================================================================
pub mod collision;

pub mod error;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use crate::core::{Axis, CollisionCase, FixedBoundary, NeighborId, Point2D, Polygon, TpPose};

// Errors
pub use error::{KavachError, Result};

// Keepout derivation
pub use keepout::{build_keepouts, FixedEnvelopes, GeometryConfig, KeepoutSet, PointList};

// Positioners
pub use positioner::{
    Calibration, KeepoutExpansion, PlacedEnvelopes, PlacedKeepouts, PositionerConfig,
    PositionerRecord, PositionerRegistry, MAX_NEIGHBORS,
};

// Schedules
pub use schedule::{MoveRow, MoveTable, Sweep};

// Collision evaluation
pub use collision::{
    earliest_collisions, CollisionSummary, NeighborPose, SpatialClassifier, SweepDriver,
    DEFAULT_TIMESTEP,
};
