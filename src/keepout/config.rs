//! Geometry configuration for a petal.
//!
//! Everything the kernel needs to know about the mechanical geometry arrives
//! through [`GeometryConfig`]: raw keepout outlines, envelope scalars, and
//! the petal's placement in focal-plane coordinates. The kernel never reads
//! files or process-wide state; the caller deserializes this from wherever it
//! keeps configuration.

use serde::{Deserialize, Serialize};

use crate::core::polygon::Polygon;
use crate::error::Result;

/// A raw keepout outline as parallel coordinate arrays (mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointList {
    /// X coordinates in mm
    pub x: Vec<f64>,
    /// Y coordinates in mm
    pub y: Vec<f64>,
}

impl PointList {
    /// Create a new point list.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y }
    }

    /// Convert to a polygon, validating lengths and coordinates.
    pub fn to_polygon(&self, close: bool) -> Result<Polygon> {
        Polygon::new(&self.x, &self.y, close)
    }
}

/// Petal-level geometry configuration.
///
/// Defaults carry the measured production positioner outlines and nominal
/// arm lengths; the petal and guide-camera outlines default to a coarse
/// wedge stand-in that real deployments replace with surveyed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Phi arm keepout outline, phi-pivot frame, nominal arm along +x.
    pub keepout_phi: PointList,

    /// Central body keepout outline, theta axis at the origin.
    pub keepout_theta: PointList,

    /// Petal perimeter keepout outline, unplaced petal frame.
    pub keepout_petal: PointList,

    /// Guide camera keepout outline, unplaced petal frame.
    pub keepout_gfa: PointList,

    /// Petal placement: x offset in focal-plane mm.
    pub petal_x0: f64,

    /// Petal placement: y offset in focal-plane mm.
    pub petal_y0: f64,

    /// Petal placement: rotation in degrees.
    pub petal_rotation: f64,

    /// Phi angle (deg, poslocTP) at or above which the arm is provably
    /// inside the retracted envelope Eo.
    pub phi_eo: f64,

    /// Phi angle (deg, poslocTP) at or above which the arm is provably
    /// inside the inner envelope Ei.
    pub phi_ei: f64,

    /// Diameter of the retracted clear-rotation envelope Eo (mm).
    pub envelope_eo: f64,

    /// Diameter of the inner clear-rotation envelope Ei (mm).
    pub envelope_ei: f64,

    /// Diameter of the extreme-range envelope Ee (mm).
    ///
    /// Used only for neighbor-set discovery, never for collision checks.
    pub envelope_ee: f64,

    /// Vertex counts for the circle approximations of Eo / Ei / Ee.
    pub resolution_eo: usize,
    pub resolution_ei: usize,
    pub resolution_ee: usize,

    /// Extra radial margin (mm) applied to Eo when screening against
    /// positioners classified as retracted.
    pub eo_radial_tol: f64,

    /// Ferrule disk diameter (mm) and circle resolution.
    pub ferrule_diameter: f64,
    pub ferrule_resolution: usize,

    /// Full mechanical phi range, internal-TP degrees.
    pub phi_range_min: f64,
    pub phi_range_max: f64,

    /// Number of arc segments replacing the arm tip in the full-range
    /// phi keepout.
    pub arc_resolution: usize,

    /// Nominal theta arm length R1 (mm).
    pub nominal_r1: f64,

    /// Nominal phi arm length R2 (mm).
    pub nominal_r2: f64,
}

impl GeometryConfig {
    /// Radius used when screening a phi arm against a retracted neighbor:
    /// the Eo radius grown by the radial tolerance.
    #[inline]
    pub fn eo_screen_radius(&self) -> f64 {
        self.envelope_eo / 2.0 + self.eo_radial_tol
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            keepout_phi: PointList::new(
                vec![
                    3.967, 3.918, 3.269, 1.712, 1.313, 0.000, -1.324, -2.106, -2.106, -1.324,
                    0.000, 1.313, 1.712, 3.269, 3.918,
                ],
                vec![
                    0.000, 1.014, 1.583, 1.391, 1.959, 2.395, 1.959, 0.848, -0.848, -1.959,
                    -2.395, -1.959, -1.391, -1.583, -1.014,
                ],
            ),
            keepout_theta: PointList::new(
                vec![0.814, 2.083, 2.613, 4.194, 4.893, -1.902, -2.007, -1.139, -0.170],
                vec![-3.236, -2.707, -2.665, -2.761, -1.168, -0.935, -2.665, -3.137, -3.332],
            ),
            keepout_petal: PointList::new(
                vec![
                    40.000, 420.000, 417.699, 410.822, 399.444, 383.689, 363.731, 339.787, 32.361,
                ],
                vec![
                    0.000, 0.000, 43.902, 87.323, 129.787, 170.830, 210.000, 246.870, 23.511,
                ],
            ),
            keepout_gfa: PointList::new(
                vec![376.7, 364.1, 387.5, 400.9],
                vec![100.9, 139.8, 148.7, 107.4],
            ),
            petal_x0: 0.0,
            petal_y0: 0.0,
            petal_rotation: 0.0,
            phi_eo: 150.0,
            phi_ei: 120.0,
            envelope_eo: 5.6,
            envelope_ei: 7.8,
            envelope_ee: 13.95,
            resolution_eo: 32,
            resolution_ei: 32,
            resolution_ee: 32,
            eo_radial_tol: 0.0,
            ferrule_diameter: 1.6,
            ferrule_resolution: 14,
            phi_range_min: -5.0,
            phi_range_max: 185.0,
            arc_resolution: 12,
            nominal_r1: 3.0,
            nominal_r2: 3.0,
        }
    }
}
