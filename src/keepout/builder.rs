//! Derivation of per-positioner keepouts and clear-rotation envelopes.
//!
//! Raw configured outlines become collision-ready polygons here:
//!
//! - the phi arm and central body keepouts, widened by the positioner's
//!   expansion set and corrected for its actual arm lengths
//! - the circle-approximating envelopes Eo / Ei / Ee
//! - the full-range phi arc keepout, used when phi is unpredictable
//! - the placed petal and guide-camera fixed envelopes
//!
//! All outputs are closed, finite polygons. The phi and ferrule keepouts are
//! expressed in the phi-pivot frame and placed with
//! [`Polygon::place_as_phi_arm`]; the central body, the arc keepout, and the
//! envelope circles are expressed relative to the theta axis and placed with
//! [`Polygon::place_as_central_body`] or a plain translation.

use serde::{Deserialize, Serialize};

use crate::core::polygon::{Point2D, Polygon};
use crate::core::types::FixedBoundary;
use crate::error::{KavachError, Result};
use crate::keepout::config::GeometryConfig;
use crate::positioner::calibration::{Calibration, KeepoutExpansion};

/// The petal's two fixed keepout envelopes, placed in petal coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedEnvelopes {
    /// Petal perimeter keepout
    pub petal: Polygon,
    /// Guide camera keepout
    pub gfa: Polygon,
}

impl FixedEnvelopes {
    /// Rotate and translate the raw outlines into petal coordinates.
    pub fn load(cfg: &GeometryConfig) -> Result<Self> {
        let place = |raw: &crate::keepout::config::PointList, what: &str| -> Result<Polygon> {
            let placed = raw
                .to_polygon(true)?
                .rotated(cfg.petal_rotation)
                .translated(cfg.petal_x0, cfg.petal_y0);
            placed.ensure_finite(what)?;
            Ok(placed)
        };
        Ok(Self {
            petal: place(&cfg.keepout_petal, "placing petal envelope")?,
            gfa: place(&cfg.keepout_gfa, "placing guide camera envelope")?,
        })
    }

    /// The placed polygon for one fixed boundary.
    #[inline]
    pub fn polygon(&self, boundary: FixedBoundary) -> &Polygon {
        match boundary {
            FixedBoundary::Ptl => &self.petal,
            FixedBoundary::Gfa => &self.gfa,
        }
    }
}

/// All derived keepout polygons for one positioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeepoutSet {
    /// Phi arm keepout, phi-pivot frame
    pub phi: Polygon,
    /// Central body keepout, theta frame
    pub theta: Polygon,
    /// Phi arm swept over its full mechanical range, theta-arm frame
    pub phi_arc: Polygon,
    /// Ferrule disk at the fiber tip, phi-pivot frame
    pub ferrule: Polygon,
    /// Retracted clear-rotation envelope, centered on the theta axis
    pub eo: Polygon,
    /// Eo grown by the retracted-screen margin
    pub eo_margin: Polygon,
    /// Inner clear-rotation envelope
    pub ei: Polygon,
    /// Extreme-range envelope, for neighbor discovery only
    pub ee: Polygon,
}

/// Build the full keepout set for one positioner.
///
/// The phi outline is widened by the expansion set, then shifted and
/// stretched to absorb the difference between this positioner's measured arm
/// lengths and the nominal ones. The R2 error is clamped non-negative: the
/// true mechanical shape can be longer than nominal but must never be
/// contracted.
pub fn build_keepouts(
    cfg: &GeometryConfig,
    calib: &Calibration,
    expansion: &KeepoutExpansion,
) -> Result<KeepoutSet> {
    let r1_err = calib.r1 - cfg.nominal_r1;
    let r2_err = calib.r2 - cfg.nominal_r2;

    let phi = cfg
        .keepout_phi
        .to_polygon(true)?
        .expanded_radially(expansion.phi_radial)
        .expanded_angularly(expansion.phi_angular)
        .translated(r1_err, 0.0)
        .expanded_x(r1_err, r2_err.max(0.0));
    phi.ensure_finite("building phi keepout")?;

    let theta = cfg
        .keepout_theta
        .to_polygon(true)?
        .expanded_radially(expansion.theta_radial)
        .expanded_angularly(expansion.theta_angular);
    theta.ensure_finite("building central body keepout")?;

    let phi_arc = build_phi_arc(cfg, calib, &phi)?;

    let ferrule = Polygon::circle(cfg.ferrule_diameter, cfg.ferrule_resolution, true)?
        .translated(calib.r2, 0.0);

    let eo = Polygon::circle(cfg.envelope_eo, cfg.resolution_eo, true)?;
    let eo_margin = Polygon::circle(
        cfg.envelope_eo + 2.0 * cfg.eo_radial_tol,
        cfg.resolution_eo,
        true,
    )?;
    let ei = Polygon::circle(cfg.envelope_ei, cfg.resolution_ei, true)?;
    let ee = Polygon::circle(cfg.envelope_ee, cfg.resolution_ee, true)?;

    Ok(KeepoutSet {
        phi,
        theta,
        phi_arc,
        ferrule,
        eo,
        eo_margin,
        ei,
        ee,
    })
}

/// Swept locus of the phi arm over its full mechanical range.
///
/// The built phi keepout is fanned out by half the angular range, its on-axis
/// tip vertex is replaced by an arc polyline at the tip radius, and the
/// composite is rotated to the center of the range (converted to poslocTP via
/// the calibration offsets) and shifted out to the phi pivot. The result
/// lives in the theta-arm frame and is placed with the central-body
/// placement.
fn build_phi_arc(cfg: &GeometryConfig, calib: &Calibration, phi: &Polygon) -> Result<Polygon> {
    if cfg.arc_resolution == 0 {
        return Err(KavachError::InvalidArgument(
            "arc resolution must be at least 1".into(),
        ));
    }
    let angular_range = cfg.phi_range_max - cfg.phi_range_min;
    if !(angular_range > 0.0) {
        return Err(KavachError::InvalidArgument(format!(
            "phi range must be increasing, got [{}, {}]",
            cfg.phi_range_min, cfg.phi_range_max
        )));
    }
    let half_range = angular_range / 2.0;

    let fanned = phi.expanded_angularly(half_range);
    // Open the ring: the closing duplicate would otherwise match the tip twice.
    let mut ring: Vec<Point2D> = fanned.points().to_vec();
    ring.pop();

    let tip_idx = ring
        .iter()
        .position(|p| p.y == 0.0 && p.x > 0.0)
        .ok_or_else(|| {
            KavachError::InvalidArgument(
                "phi keepout has no on-axis tip vertex for the arc construction".into(),
            )
        })?;
    let tip_radius = ring[tip_idx].x;
    ring.rotate_left(tip_idx);

    // Arc ordering follows the ring winding so the splice stays consistent.
    let ccw = fanned.signed_area() >= 0.0;
    let n = cfg.arc_resolution;
    let arc = (0..=n).map(|k| {
        let frac = k as f64 / n as f64;
        let angle_deg = if ccw {
            -half_range + frac * angular_range
        } else {
            half_range - frac * angular_range
        };
        let (sin_a, cos_a) = crate::core::math::sin_cos_deg(angle_deg);
        Point2D::new(tip_radius * cos_a, tip_radius * sin_a)
    });

    let mut points: Vec<Point2D> = arc.collect();
    points.extend_from_slice(&ring[1..]);

    let center_posint = (cfg.phi_range_min + cfg.phi_range_max) / 2.0;
    let center_posloc = center_posint + calib.p0;
    let arc_poly = Polygon::from_points(points, true)?
        .rotated(center_posloc)
        .translated(calib.r1, 0.0);
    arc_poly.ensure_finite("building full-range phi keepout")?;
    Ok(arc_poly)
}
