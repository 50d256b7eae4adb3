//! Core data types shared across the kernel.
//!
//! - [`TpPose`]: a (theta, phi) pose in positioner-local degrees (poslocTP)
//! - [`Axis`]: theta/phi axis selector
//! - [`CollisionCase`]: the closed enumeration of collision outcomes
//! - [`NeighborId`]: what a positioner collided with

use serde::{Deserialize, Serialize};

/// A (theta, phi) pose in the poslocTP frame, degrees.
///
/// This is the frame of all collision checks; placement into petal (x, y)
/// millimeters happens in the polygon kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TpPose {
    /// Theta shaft angle in degrees
    pub theta: f64,
    /// Phi shaft angle in degrees
    pub phi: f64,
}

impl TpPose {
    /// Create a new pose.
    #[inline]
    pub fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }

    /// Pose shifted by `(d_theta, d_phi)` degrees.
    #[inline]
    pub fn offset_by(&self, d_theta: f64, d_phi: f64) -> TpPose {
        TpPose::new(self.theta + d_theta, self.phi + d_phi)
    }

    /// Value of the selected axis.
    #[inline]
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Theta => self.theta,
            Axis::Phi => self.phi,
        }
    }
}

/// Selector for one of the two rotation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Central body rotation
    Theta,
    /// Phi arm rotation
    Phi,
}

/// Collision case taxonomy.
///
/// `I` is the no-collision outcome; the others identify what was struck.
/// When multiple cases would fire at the same timestep, the classifier's
/// intrinsic priority (IV, then III, then II) decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionCase {
    /// No collision
    I,
    /// Phi arm against a neighbor's phi arm
    II,
    /// Phi arm against a neighbor's central body
    III,
    /// Phi arm against a retracted neighbor's circular envelope
    IV,
    /// Phi arm against the petal perimeter envelope
    Ptl,
    /// Phi arm against the guide camera envelope
    Gfa,
}

impl CollisionCase {
    /// True for any case other than `I`.
    #[inline]
    pub fn is_collision(&self) -> bool {
        !matches!(self, CollisionCase::I)
    }

    /// True for the fixed-envelope pseudo-cases.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, CollisionCase::Ptl | CollisionCase::Gfa)
    }
}

/// One of the petal's fixed keepout envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixedBoundary {
    /// Petal perimeter
    Ptl,
    /// Guide camera region
    Gfa,
}

impl FixedBoundary {
    /// The collision case reported when this envelope is struck.
    #[inline]
    pub fn case(&self) -> CollisionCase {
        match self {
            FixedBoundary::Ptl => CollisionCase::Ptl,
            FixedBoundary::Gfa => CollisionCase::Gfa,
        }
    }
}

/// Identity of whatever a positioner first collided with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeighborId {
    /// Another positioner, by posid
    Positioner(String),
    /// A fixed petal envelope
    Fixed(FixedBoundary),
}

impl std::fmt::Display for NeighborId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeighborId::Positioner(posid) => write!(f, "{posid}"),
            NeighborId::Fixed(FixedBoundary::Ptl) => write!(f, "PTL"),
            NeighborId::Fixed(FixedBoundary::Gfa) => write!(f, "GFA"),
        }
    }
}
