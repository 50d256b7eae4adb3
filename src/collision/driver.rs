//! Spacetime collision driver.
//!
//! Expands move tables into quantized sweeps and walks them in lockstep,
//! running the spatial classifier at every step where anything moved. The
//! first non-trivial case halts the walk and is recorded, write-once, on
//! every participating sweep.
//!
//! The walk itself never fails: a collision is the normal, not exceptional,
//! outcome, reported through the sweep fields.

use log::debug;

use crate::collision::classifier::SpatialClassifier;
use crate::core::types::{CollisionCase, FixedBoundary, NeighborId, TpPose};
use crate::error::{KavachError, Result};
use crate::positioner::registry::PositionerRegistry;
use crate::schedule::move_table::MoveTable;
use crate::schedule::sweep::Sweep;

/// Default quantization timestep in seconds.
pub const DEFAULT_TIMESTEP: f64 = 0.1;

/// Step-by-step collision evaluator for one or two moving positioners.
#[derive(Debug, Clone, Copy)]
pub struct SweepDriver {
    timestep: f64,
    skip: usize,
}

impl SweepDriver {
    /// Driver with the given quantization timestep.
    pub fn new(timestep: f64) -> Result<Self> {
        if !(timestep > 0.0) || !timestep.is_finite() {
            return Err(KavachError::InvalidArgument(format!(
                "timestep must be positive, got {timestep}"
            )));
        }
        Ok(Self { timestep, skip: 0 })
    }

    /// Suppress collision checks for the first `skip` steps of each sweep.
    ///
    /// Step 0 is always skipped regardless: nothing has moved yet.
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// The quantization timestep.
    #[inline]
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Evaluate two positioners' planned moves against each other.
    ///
    /// Returns both sweeps; on a collision each carries the same case and
    /// collision time, with the sample index resolved per sweep.
    pub fn between_positioners(
        &self,
        registry: &PositionerRegistry,
        posid_a: &str,
        init_a: TpPose,
        table_a: &MoveTable,
        posid_b: &str,
        init_b: TpPose,
        table_b: &MoveTable,
    ) -> Result<(Sweep, Sweep)> {
        let rec_a = registry.get(posid_a)?;
        let rec_b = registry.get(posid_b)?;
        let classifier = SpatialClassifier::new(registry.geometry());

        let mut sweep_a = self.build_sweep(posid_a, init_a, table_a)?;
        let mut sweep_b = self.build_sweep(posid_b, init_b, table_b)?;

        let mut remaining = [sweep_a.len(), sweep_b.len()];
        let mut step = [0usize, 0usize];
        while remaining.iter().any(|&r| r > 0) {
            let check = (step[0] >= self.skip && sweep_a.was_moving(step[0]))
                || (step[1] >= self.skip && sweep_b.was_moving(step[1]));
            if check {
                let case = classifier.between_positioners(
                    rec_a,
                    sweep_a.tp()[step[0]],
                    rec_b,
                    sweep_b.tp()[step[1]],
                );
                if case.is_collision() {
                    // Both sweeps agree on the later of the two current
                    // times: the instant both have reached their pose.
                    let time = sweep_a.time()[step[0]].max(sweep_b.time()[step[1]]);
                    let idx_a = index_at_time(&sweep_a, step[0], time);
                    let idx_b = index_at_time(&sweep_b, step[1], time);
                    debug!(
                        "collision {case:?} between {posid_a} and {posid_b} at t={time}"
                    );
                    sweep_a.record_collision(
                        case,
                        NeighborId::Positioner(posid_b.to_string()),
                        time,
                        idx_a,
                    );
                    sweep_b.record_collision(
                        case,
                        NeighborId::Positioner(posid_a.to_string()),
                        time,
                        idx_b,
                    );
                    break;
                }
            }
            advance(&mut remaining, &mut step);
        }
        Ok((sweep_a, sweep_b))
    }

    /// Evaluate one positioner's planned move against the fixed envelopes it
    /// can reach.
    pub fn with_fixed(
        &self,
        registry: &PositionerRegistry,
        posid: &str,
        init: TpPose,
        table: &MoveTable,
    ) -> Result<Sweep> {
        let rec = registry.get(posid)?;
        let classifier = SpatialClassifier::new(registry.geometry());

        let mut sweep = self.build_sweep(posid, init, table)?;
        let mut remaining = [sweep.len()];
        let mut step = [0usize];
        while remaining[0] > 0 {
            if step[0] >= self.skip && sweep.was_moving(step[0]) {
                let case = classifier.against_fixed(rec, sweep.tp()[step[0]], registry.fixed());
                if case.is_collision() {
                    let boundary = match case {
                        CollisionCase::Ptl => FixedBoundary::Ptl,
                        CollisionCase::Gfa => FixedBoundary::Gfa,
                        _ => unreachable!("fixed classifier returns fixed cases only"),
                    };
                    let time = sweep.time()[step[0]];
                    debug!("collision {case:?} between {posid} and {boundary:?} at t={time}");
                    sweep.record_collision(case, NeighborId::Fixed(boundary), time, step[0]);
                    break;
                }
            }
            advance(&mut remaining, &mut step);
        }
        Ok(sweep)
    }

    fn build_sweep(&self, posid: &str, init: TpPose, table: &MoveTable) -> Result<Sweep> {
        let mut sweep = Sweep::new(posid);
        sweep.fill_exact(init, table, 0.0);
        sweep.quantize(self.timestep)?;
        Ok(sweep)
    }
}

impl Default for SweepDriver {
    fn default() -> Self {
        Self {
            timestep: DEFAULT_TIMESTEP,
            skip: 0,
        }
    }
}

/// Advance the lockstep walk: consume one step per participant, holding a
/// finished participant at its final sample.
fn advance<const N: usize>(remaining: &mut [usize; N], step: &mut [usize; N]) {
    for i in 0..N {
        if remaining[i] > 0 {
            remaining[i] -= 1;
            if remaining[i] > 0 {
                step[i] += 1;
            }
        }
    }
}

/// Sample index on `sweep` matching the agreed collision time.
///
/// With equal timesteps this is the current step; a shorter sweep that
/// already parked reports its final sample.
fn index_at_time(sweep: &Sweep, current: usize, time: f64) -> usize {
    if sweep.time()[current] == time {
        return current;
    }
    sweep.time()[current..]
        .iter()
        .position(|&t| t >= time)
        .map(|offset| current + offset)
        .unwrap_or(sweep.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepout::config::GeometryConfig;
    use crate::positioner::registry::{PositionerConfig, PositionerRegistry};

    fn pair_registry(gap: f64) -> PositionerRegistry {
        let mut reg = PositionerRegistry::new(GeometryConfig::default()).unwrap();
        let mut a = PositionerConfig::new("A", 1);
        a.calib.x0 = 150.0;
        a.calib.y0 = 100.0;
        reg.add(a).unwrap();
        let mut b = PositionerConfig::new("B", 2);
        b.calib.x0 = 150.0 + gap;
        b.calib.y0 = 100.0;
        reg.add(b).unwrap();
        reg.identify_all_neighbors().unwrap();
        reg
    }

    /// Phi ramp from 0 to -100 over 10 s while theta holds.
    fn phi_ramp() -> MoveTable {
        MoveTable::from_arrays(&[0.0], &[-100.0], &[0.0], &[10.0], &[0.0]).unwrap()
    }

    #[test]
    fn test_stationary_pair_never_checks() {
        let reg = pair_registry(6.0);
        let driver = SweepDriver::default();
        // Both tables empty: nothing moves, so even overlapping poses are
        // never evaluated.
        let (a, b) = driver
            .between_positioners(
                &reg,
                "A",
                TpPose::new(0.0, 0.0),
                &MoveTable::new(),
                "B",
                TpPose::new(180.0, 0.0),
                &MoveTable::new(),
            )
            .unwrap();
        assert_eq!(a.collision_case(), CollisionCase::I);
        assert_eq!(b.collision_case(), CollisionCase::I);
    }

    #[test]
    fn test_sweep_into_immobile_neighbor_body() {
        let reg = pair_registry(6.0);
        let driver = SweepDriver::default();
        // A swings phi out while B sits with its arm pointing at A.
        let (a, b) = driver
            .between_positioners(
                &reg,
                "A",
                TpPose::new(0.0, 0.0),
                &phi_ramp(),
                "B",
                TpPose::new(180.0, 0.0),
                &MoveTable::new(),
            )
            .unwrap();
        assert_eq!(a.collision_case(), CollisionCase::III);
        assert_eq!(b.collision_case(), CollisionCase::III);
        assert_eq!(
            a.collision_neighbor(),
            Some(&NeighborId::Positioner("B".into()))
        );
        assert_eq!(
            b.collision_neighbor(),
            Some(&NeighborId::Positioner("A".into()))
        );
        assert_eq!(a.collision_time(), b.collision_time());
        assert!(a.collision_time().is_finite());
        // The recorded index points at the agreed time on each sweep.
        let idx = a.collision_idx().unwrap();
        assert_eq!(a.time()[idx], a.collision_time());
    }

    #[test]
    fn test_collision_indices_agree_with_equal_timesteps() {
        let reg = pair_registry(12.0);
        let driver = SweepDriver::default();
        // Mirror-image phi sweeps collide arm-on-arm mid-gap.
        let (a, b) = driver
            .between_positioners(
                &reg,
                "A",
                TpPose::new(0.0, 60.0),
                &MoveTable::from_arrays(&[0.0], &[-60.0], &[0.0], &[6.0], &[0.0]).unwrap(),
                "B",
                TpPose::new(180.0, 60.0),
                &MoveTable::from_arrays(&[0.0], &[-60.0], &[0.0], &[6.0], &[0.0]).unwrap(),
            )
            .unwrap();
        assert_eq!(a.collision_case(), CollisionCase::II);
        assert_eq!(a.collision_idx(), b.collision_idx());
        assert_eq!(a.collision_time(), b.collision_time());
    }

    #[test]
    fn test_first_collision_step_is_minimal() {
        let reg = pair_registry(6.0);
        let driver = SweepDriver::default();
        // A starts with its arm pointing away from B and swings theta until
        // the extended arm runs into B's central body; B holds still with
        // its own arm tucked above the Ei threshold.
        let b_pose = TpPose::new(0.0, 160.0);
        let table = MoveTable::from_arrays(&[-90.0], &[0.0], &[0.0], &[9.0], &[0.0]).unwrap();
        let (a, _) = driver
            .between_positioners(
                &reg,
                "A",
                TpPose::new(90.0, 0.0),
                &table,
                "B",
                b_pose,
                &MoveTable::new(),
            )
            .unwrap();
        assert_eq!(a.collision_case(), CollisionCase::III);
        let idx = a.collision_idx().unwrap();
        assert!(idx > 0);
        // Rewinding one step must be collision-free.
        let classifier = SpatialClassifier::new(reg.geometry());
        let prior = classifier.between_positioners(
            reg.get("A").unwrap(),
            a.tp()[idx - 1],
            reg.get("B").unwrap(),
            b_pose,
        );
        assert_eq!(prior, CollisionCase::I);
    }

    #[test]
    fn test_clear_move_reports_case_i() {
        let reg = pair_registry(30.0);
        let driver = SweepDriver::default();
        let (a, b) = driver
            .between_positioners(
                &reg,
                "A",
                TpPose::new(0.0, 0.0),
                &phi_ramp(),
                "B",
                TpPose::new(180.0, 0.0),
                &phi_ramp(),
            )
            .unwrap();
        assert_eq!(a.collision_case(), CollisionCase::I);
        assert!(a.collision_time().is_infinite());
        assert_eq!(a.collision_idx(), None);
        assert_eq!(b.collision_neighbor(), None);
    }

    #[test]
    fn test_fixed_mode_reports_petal_strike() {
        let mut reg = PositionerRegistry::new(GeometryConfig::default()).unwrap();
        let mut cfg = PositionerConfig::new("EDGE", 1);
        cfg.calib.x0 = 100.0;
        cfg.calib.y0 = 5.0;
        reg.add(cfg).unwrap();
        reg.identify_all_neighbors().unwrap();
        let driver = SweepDriver::default();
        // Swing theta from arm-up to arm-down: the arm leaves the petal.
        let table = MoveTable::from_arrays(&[-180.0], &[0.0], &[0.0], &[18.0], &[0.0]).unwrap();
        let sweep = driver
            .with_fixed(&reg, "EDGE", TpPose::new(90.0, 0.0), &table)
            .unwrap();
        assert_eq!(sweep.collision_case(), CollisionCase::Ptl);
        assert_eq!(
            sweep.collision_neighbor(),
            Some(&NeighborId::Fixed(FixedBoundary::Ptl))
        );
        let idx = sweep.collision_idx().unwrap();
        assert_eq!(sweep.time()[idx], sweep.collision_time());
    }

    #[test]
    fn test_fixed_mode_clear_inside_petal() {
        let mut reg = PositionerRegistry::new(GeometryConfig::default()).unwrap();
        let mut cfg = PositionerConfig::new("MID", 1);
        cfg.calib.x0 = 100.0;
        cfg.calib.y0 = 40.0;
        reg.add(cfg).unwrap();
        reg.identify_all_neighbors().unwrap();
        let driver = SweepDriver::default();
        let table = MoveTable::from_arrays(&[360.0], &[0.0], &[0.0], &[36.0], &[0.0]).unwrap();
        let sweep = driver
            .with_fixed(&reg, "MID", TpPose::new(0.0, 0.0), &table)
            .unwrap();
        assert_eq!(sweep.collision_case(), CollisionCase::I);
    }

    #[test]
    fn test_skip_window_suppresses_early_checks() {
        let reg = pair_registry(6.0);
        // Skip beyond the whole sweep: the guaranteed strike goes unseen.
        let driver = SweepDriver::default().with_skip(10_000);
        let (a, _) = driver
            .between_positioners(
                &reg,
                "A",
                TpPose::new(0.0, 0.0),
                &phi_ramp(),
                "B",
                TpPose::new(180.0, 0.0),
                &MoveTable::new(),
            )
            .unwrap();
        assert_eq!(a.collision_case(), CollisionCase::I);
    }

    #[test]
    fn test_unknown_positioner_is_an_error() {
        let reg = pair_registry(6.0);
        let driver = SweepDriver::default();
        let err = driver
            .with_fixed(&reg, "NOPE", TpPose::new(0.0, 0.0), &MoveTable::new())
            .unwrap_err();
        assert!(matches!(err, KavachError::UnknownPositioner(_)));
    }

    #[test]
    fn test_invalid_timestep_rejected() {
        assert!(SweepDriver::new(0.0).is_err());
        assert!(SweepDriver::new(-1.0).is_err());
        assert!(SweepDriver::new(0.05).is_ok());
    }
}
