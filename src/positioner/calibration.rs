//! Per-positioner calibration values and the frame-conversion contract.

use serde::{Deserialize, Serialize};

use crate::core::types::TpPose;
use crate::error::{KavachError, Result};

/// Kinematic calibration of one positioner (mm and degrees).
///
/// `(x0, y0)` locate the theta axis in petal coordinates; `(t0, p0)` are the
/// angular offsets between the internally tracked shaft angles (posintTP) and
/// the positioner-local frame (poslocTP) used for collision checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Theta arm length R1 (mm)
    pub r1: f64,
    /// Phi arm length R2 (mm)
    pub r2: f64,
    /// Theta axis x offset in petal mm
    pub x0: f64,
    /// Theta axis y offset in petal mm
    pub y0: f64,
    /// Theta angular offset in degrees
    pub t0: f64,
    /// Phi angular offset in degrees
    pub p0: f64,
}

impl Calibration {
    /// Fail with [`KavachError::CalibrationInvalid`] unless every value is
    /// finite and the arm lengths are positive.
    pub fn validate(&self, posid: &str) -> Result<()> {
        let values = [self.r1, self.r2, self.x0, self.y0, self.t0, self.p0];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(KavachError::CalibrationInvalid {
                posid: posid.to_string(),
                reason: "non-finite calibration value".into(),
            });
        }
        if self.r1 <= 0.0 || self.r2 <= 0.0 {
            return Err(KavachError::CalibrationInvalid {
                posid: posid.to_string(),
                reason: format!("non-positive arm length (r1={}, r2={})", self.r1, self.r2),
            });
        }
        Ok(())
    }

    /// Convert an internally tracked shaft pose to the poslocTP frame.
    #[inline]
    pub fn posint_to_posloc(&self, tp: TpPose) -> TpPose {
        TpPose::new(tp.theta + self.t0, tp.phi + self.p0)
    }

    /// Convert a poslocTP pose back to internally tracked shaft angles.
    #[inline]
    pub fn posloc_to_posint(&self, tp: TpPose) -> TpPose {
        TpPose::new(tp.theta - self.t0, tp.phi - self.p0)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            r1: 3.0,
            r2: 3.0,
            x0: 0.0,
            y0: 0.0,
            t0: 0.0,
            p0: 0.0,
        }
    }
}

/// Keepout expansion set for one positioner.
///
/// Radial values are mm, angular values degrees. These widen (never shrink)
/// the nominal outlines to absorb calibration uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct KeepoutExpansion {
    /// Radial growth of the phi arm outline (mm)
    pub phi_radial: f64,
    /// Angular fan-out of the phi arm outline (deg)
    pub phi_angular: f64,
    /// Radial growth of the central body outline (mm)
    pub theta_radial: f64,
    /// Angular fan-out of the central body outline (deg)
    pub theta_angular: f64,
}

impl KeepoutExpansion {
    /// Fail unless every value is finite.
    pub fn validate(&self, posid: &str) -> Result<()> {
        let values = [
            self.phi_radial,
            self.phi_angular,
            self.theta_radial,
            self.theta_angular,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(KavachError::CalibrationInvalid {
                posid: posid.to_string(),
                reason: "non-finite keepout expansion".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_matches_nominals() {
        let c = Calibration::default();
        assert_eq!(c.r1, 3.0);
        assert_eq!(c.r2, 3.0);
        assert_eq!(c.x0, 0.0);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let c = Calibration {
            t0: f64::NAN,
            ..Calibration::default()
        };
        assert!(matches!(
            c.validate("M00001"),
            Err(KavachError::CalibrationInvalid { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_arm() {
        let c = Calibration {
            r2: 0.0,
            ..Calibration::default()
        };
        assert!(c.validate("M00001").is_err());
    }

    #[test]
    fn test_frame_conversion_roundtrip() {
        let c = Calibration {
            t0: -12.5,
            p0: 3.25,
            ..Calibration::default()
        };
        let posloc = TpPose::new(100.0, -100.0);
        let posint = c.posloc_to_posint(posloc);
        assert_relative_eq!(posint.theta, 112.5);
        assert_relative_eq!(posint.phi, -103.25);
        let back = c.posint_to_posloc(posint);
        assert_relative_eq!(back.theta, posloc.theta);
        assert_relative_eq!(back.phi, posloc.phi);
    }
}
