//! Spatial collision classification between placed keepouts.
//!
//! Given two positioners at known poses (or one positioner against the fixed
//! envelopes), decide which collision case applies and run the cheapest
//! sufficient polygon test. The decision table exploits the clear-rotation
//! envelopes: an arm provably inside its retracted circle cannot touch
//! anything, and a retracted-classified neighbor is screened with a vertex-
//! in-disk test instead of full polygon overlap.
//!
//! When several cases could fire at the same pose, priority is IV, then III,
//! then II.

use crate::core::types::{CollisionCase, TpPose};
use crate::keepout::builder::FixedEnvelopes;
use crate::keepout::config::GeometryConfig;
use crate::positioner::registry::PositionerRecord;

/// Pose knowledge about a neighbor whose phi may be unpredictable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeighborPose {
    /// Both shaft angles are known.
    Known(TpPose),
    /// Only theta is known; the neighbor's arm is taken over its full
    /// mechanical phi range.
    ThetaOnly(f64),
}

/// Stateless classifier for one petal's envelope thresholds.
#[derive(Debug, Clone, Copy)]
pub struct SpatialClassifier {
    phi_eo: f64,
    phi_ei: f64,
    eo_screen_radius: f64,
}

impl SpatialClassifier {
    /// Capture the envelope thresholds from the petal geometry.
    pub fn new(cfg: &GeometryConfig) -> Self {
        Self {
            phi_eo: cfg.phi_eo,
            phi_ei: cfg.phi_ei,
            eo_screen_radius: cfg.eo_screen_radius(),
        }
    }

    /// Whether the arm is provably inside its retracted envelope.
    #[inline]
    fn within_eo(&self, rec: &PositionerRecord, phi: f64) -> bool {
        phi >= self.phi_eo || rec.classified_as_retracted
    }

    /// Classify the interaction of two positioners at the given poses.
    pub fn between_positioners(
        &self,
        a: &PositionerRecord,
        tp_a: TpPose,
        b: &PositionerRecord,
        tp_b: TpPose,
    ) -> CollisionCase {
        let a_within = self.within_eo(a, tp_a.phi);
        let b_within = self.within_eo(b, tp_b.phi);

        if a_within && b_within {
            return CollisionCase::I;
        }
        if !a_within && b.classified_as_retracted {
            return self.screen_retracted(a, tp_a, b);
        }
        if !b_within && a.classified_as_retracted {
            return self.screen_retracted(b, tp_b, a);
        }
        if tp_a.phi < self.phi_eo && tp_b.phi >= self.phi_ei {
            return arm_vs_body(a, tp_a, b, tp_b.theta);
        }
        if tp_b.phi < self.phi_eo && tp_a.phi >= self.phi_ei {
            return arm_vs_body(b, tp_b, a, tp_a.theta);
        }
        // Both arms are out of their envelopes: body strikes outrank
        // arm-on-arm contact.
        let case = arm_vs_body(a, tp_a, b, tp_b.theta);
        if case.is_collision() {
            return case;
        }
        let case = arm_vs_body(b, tp_b, a, tp_a.theta);
        if case.is_collision() {
            return case;
        }
        if a.placed_phi_arm(tp_a).collides_with(&b.placed_phi_arm(tp_b)) {
            CollisionCase::II
        } else {
            CollisionCase::I
        }
    }

    /// Classify one positioner against the fixed envelopes it can reach.
    ///
    /// Only the envelopes in the positioner's `fixed_cases` set are tested;
    /// the first hit wins.
    pub fn against_fixed(
        &self,
        a: &PositionerRecord,
        tp_a: TpPose,
        fixed: &FixedEnvelopes,
    ) -> CollisionCase {
        let arm = a.placed_phi_arm(tp_a);
        self.fixed_hit(a, &arm, fixed)
    }

    /// Full-range variant of [`SpatialClassifier::against_fixed`]: the arm is
    /// swept over its whole phi range at the given theta.
    pub fn phi_range_fixed(
        &self,
        a: &PositionerRecord,
        theta_a: f64,
        fixed: &FixedEnvelopes,
    ) -> CollisionCase {
        let arc = a.placed_phi_arc(theta_a);
        self.fixed_hit(a, &arc, fixed)
    }

    /// Whether extending `a`'s phi arm anywhere in its range at `theta_a`
    /// could strike the neighbor `b`.
    ///
    /// Used to decide if it is safe to unretract without knowing the exact
    /// phi of either participant.
    pub fn phi_range_between(
        &self,
        a: &PositionerRecord,
        theta_a: f64,
        b: &PositionerRecord,
        b_pose: NeighborPose,
    ) -> CollisionCase {
        let arc = a.placed_phi_arc(theta_a);
        if b.classified_as_retracted
            && arc.collides_with_circle(b.calib.x0, b.calib.y0, self.eo_screen_radius)
        {
            return CollisionCase::IV;
        }
        let theta_b = match b_pose {
            NeighborPose::Known(tp) => tp.theta,
            NeighborPose::ThetaOnly(theta) => theta,
        };
        if arc.collides_with(&b.placed_central_body(theta_b)) {
            return CollisionCase::III;
        }
        let b_arm = match b_pose {
            NeighborPose::Known(tp) => b.placed_phi_arm(tp),
            NeighborPose::ThetaOnly(theta) => b.placed_phi_arc(theta),
        };
        if arc.collides_with(&b_arm) {
            CollisionCase::II
        } else {
            CollisionCase::I
        }
    }

    /// Vertex-in-disk screen of an extended arm against a retracted
    /// neighbor's Eo circle (grown by the configured margin).
    fn screen_retracted(
        &self,
        extended: &PositionerRecord,
        tp: TpPose,
        retracted: &PositionerRecord,
    ) -> CollisionCase {
        let arm = extended.placed_phi_arm(tp);
        if arm.collides_with_circle(
            retracted.calib.x0,
            retracted.calib.y0,
            self.eo_screen_radius,
        ) {
            CollisionCase::IV
        } else {
            CollisionCase::I
        }
    }

    fn fixed_hit(
        &self,
        a: &PositionerRecord,
        arm: &crate::core::polygon::Polygon,
        fixed: &FixedEnvelopes,
    ) -> CollisionCase {
        for &boundary in &a.fixed_cases {
            if arm.collides_with(fixed.polygon(boundary)) {
                return boundary.case();
            }
        }
        CollisionCase::I
    }
}

fn arm_vs_body(
    arm_of: &PositionerRecord,
    tp: TpPose,
    body_of: &PositionerRecord,
    theta_body: f64,
) -> CollisionCase {
    if arm_of
        .placed_phi_arm(tp)
        .collides_with(&body_of.placed_central_body(theta_body))
    {
        CollisionCase::III
    } else {
        CollisionCase::I
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepout::config::GeometryConfig;
    use crate::positioner::registry::{PositionerConfig, PositionerRegistry};

    /// Two positioners on the y = 100 line, `gap` mm apart, away from the
    /// petal boundary.
    fn pair_at_gap(gap: f64, b_retracted: bool) -> PositionerRegistry {
        let mut reg = PositionerRegistry::new(GeometryConfig::default()).unwrap();
        let mut a = PositionerConfig::new("A", 1);
        a.calib.x0 = 150.0;
        a.calib.y0 = 100.0;
        reg.add(a).unwrap();
        let mut b = PositionerConfig::new("B", 2);
        b.calib.x0 = 150.0 + gap;
        b.calib.y0 = 100.0;
        b.classified_as_retracted = b_retracted;
        reg.add(b).unwrap();
        reg
    }

    #[test]
    fn test_both_retracted_is_case_i() {
        let reg = pair_at_gap(6.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        let case = classifier.between_positioners(
            reg.get("A").unwrap(),
            TpPose::new(0.0, 160.0),
            reg.get("B").unwrap(),
            TpPose::new(180.0, 155.0),
        );
        assert_eq!(case, CollisionCase::I);
    }

    #[test]
    fn test_arm_into_neighbor_body_is_case_iii() {
        let reg = pair_at_gap(6.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        // A reaches toward B; B's arm is extended too (φ = 0 is far below
        // the Ei threshold) with its body in the way.
        let case = classifier.between_positioners(
            reg.get("A").unwrap(),
            TpPose::new(0.0, 0.0),
            reg.get("B").unwrap(),
            TpPose::new(180.0, 0.0),
        );
        assert_eq!(case, CollisionCase::III);
    }

    #[test]
    fn test_arm_into_quiet_neighbor_body_is_case_iii() {
        let reg = pair_at_gap(6.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        // B parked just above the Ei threshold: only the A-arm-vs-B-body
        // branch runs.
        let phi_ei = reg.geometry().phi_ei;
        let case = classifier.between_positioners(
            reg.get("A").unwrap(),
            TpPose::new(0.0, 0.0),
            reg.get("B").unwrap(),
            TpPose::new(180.0, phi_ei),
        );
        assert_eq!(case, CollisionCase::III);
    }

    #[test]
    fn test_arm_on_arm_is_case_ii() {
        let reg = pair_at_gap(12.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        // At 12 mm the bodies are out of reach but the extended arms cross
        // mid-gap.
        let case = classifier.between_positioners(
            reg.get("A").unwrap(),
            TpPose::new(0.0, 0.0),
            reg.get("B").unwrap(),
            TpPose::new(180.0, 0.0),
        );
        assert_eq!(case, CollisionCase::II);
    }

    #[test]
    fn test_retracted_neighbor_screen_is_case_iv() {
        let reg = pair_at_gap(6.0, true);
        let classifier = SpatialClassifier::new(reg.geometry());
        let case = classifier.between_positioners(
            reg.get("A").unwrap(),
            TpPose::new(0.0, 0.0),
            reg.get("B").unwrap(),
            TpPose::new(0.0, 0.0), // pose irrelevant once classified retracted
        );
        assert_eq!(case, CollisionCase::IV);
    }

    #[test]
    fn test_retracted_screen_misses_when_clear() {
        let reg = pair_at_gap(12.0, true);
        let classifier = SpatialClassifier::new(reg.geometry());
        // Arm tip reaches ~7 mm; the Eo disk at 12 mm stays clear.
        let case = classifier.between_positioners(
            reg.get("A").unwrap(),
            TpPose::new(0.0, 0.0),
            reg.get("B").unwrap(),
            TpPose::new(0.0, 160.0),
        );
        assert_eq!(case, CollisionCase::I);
    }

    #[test]
    fn test_distant_pair_is_case_i() {
        let reg = pair_at_gap(30.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        let case = classifier.between_positioners(
            reg.get("A").unwrap(),
            TpPose::new(0.0, 0.0),
            reg.get("B").unwrap(),
            TpPose::new(180.0, 0.0),
        );
        assert_eq!(case, CollisionCase::I);
    }

    #[test]
    fn test_classification_is_symmetric_for_case_ii() {
        let reg = pair_at_gap(12.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        let a = reg.get("A").unwrap();
        let b = reg.get("B").unwrap();
        let tp_a = TpPose::new(0.0, 0.0);
        let tp_b = TpPose::new(180.0, 0.0);
        assert_eq!(
            classifier.between_positioners(a, tp_a, b, tp_b),
            classifier.between_positioners(b, tp_b, a, tp_a)
        );
    }

    #[test]
    fn test_fixed_envelope_hit() {
        let mut reg = PositionerRegistry::new(GeometryConfig::default()).unwrap();
        let mut cfg = PositionerConfig::new("EDGE", 1);
        cfg.calib.x0 = 100.0;
        cfg.calib.y0 = 5.0;
        reg.add(cfg).unwrap();
        reg.identify_all_neighbors().unwrap();
        let classifier = SpatialClassifier::new(reg.geometry());
        let rec = reg.get("EDGE").unwrap();
        // Arm pointing down crosses the petal's bottom edge at y = 0.
        let case = classifier.against_fixed(rec, TpPose::new(-90.0, 0.0), reg.fixed());
        assert_eq!(case, CollisionCase::Ptl);
        // Arm pointing up stays inside.
        let case = classifier.against_fixed(rec, TpPose::new(90.0, 0.0), reg.fixed());
        assert_eq!(case, CollisionCase::I);
    }

    #[test]
    fn test_unreachable_fixed_envelopes_are_not_tested() {
        let mut reg = PositionerRegistry::new(GeometryConfig::default()).unwrap();
        let mut cfg = PositionerConfig::new("MID", 1);
        cfg.calib.x0 = 100.0;
        cfg.calib.y0 = 40.0;
        reg.add(cfg).unwrap();
        reg.identify_all_neighbors().unwrap();
        let classifier = SpatialClassifier::new(reg.geometry());
        let rec = reg.get("MID").unwrap();
        assert!(rec.fixed_cases.is_empty());
        let case = classifier.against_fixed(rec, TpPose::new(-90.0, 0.0), reg.fixed());
        assert_eq!(case, CollisionCase::I);
    }

    #[test]
    fn test_phi_range_against_stationary_neighbor() {
        let reg = pair_at_gap(6.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        let a = reg.get("A").unwrap();
        let b = reg.get("B").unwrap();
        // Unretracting anywhere at this theta would strike B's body.
        let case = classifier.phi_range_between(
            a,
            0.0,
            b,
            NeighborPose::Known(TpPose::new(180.0, 0.0)),
        );
        assert_eq!(case, CollisionCase::III);
    }

    #[test]
    fn test_phi_range_clear_when_distant() {
        let reg = pair_at_gap(30.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        let a = reg.get("A").unwrap();
        let b = reg.get("B").unwrap();
        let case = classifier.phi_range_between(a, 0.0, b, NeighborPose::ThetaOnly(180.0));
        assert_eq!(case, CollisionCase::I);
    }

    #[test]
    fn test_phi_range_against_unpredictable_neighbor() {
        let reg = pair_at_gap(13.0, false);
        let classifier = SpatialClassifier::new(reg.geometry());
        let a = reg.get("A").unwrap();
        let b = reg.get("B").unwrap();
        // Both arms swept over their full ranges reach ~6.97 mm each: the
        // arcs overlap at 13 mm even though the bodies stay clear.
        let case = classifier.phi_range_between(a, 0.0, b, NeighborPose::ThetaOnly(180.0));
        assert_eq!(case, CollisionCase::II);
    }
}
