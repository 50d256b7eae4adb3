//! Time-sampled motion traces and their lifecycle.
//!
//! A [`Sweep`] records one positioner's planned motion as parallel time and
//! pose arrays. It is filled in two phases ([`Sweep::fill_exact`] expands a
//! move table into the exact piecewise-linear trace, then [`Sweep::quantize`]
//! resamples it onto a fixed timestep) and is afterwards consumed read-only
//! by the spacetime driver, animators, and reporters. The collision fields
//! are write-once: the driver records only the first strike.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::types::{Axis, CollisionCase, NeighborId, TpPose};
use crate::error::{KavachError, Result};
use crate::positioner::calibration::Calibration;
use crate::schedule::move_table::MoveTable;

/// Time-ordered record of a single positioner's planned motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    posid: String,
    time: Vec<f64>,
    tp: Vec<TpPose>,
    was_moving: Vec<bool>,
    collision_case: CollisionCase,
    collision_time: f64,
    collision_idx: Option<usize>,
    collision_neighbor: Option<NeighborId>,
    frozen_time: f64,
}

impl Sweep {
    /// An empty sweep for the given positioner.
    pub fn new(posid: impl Into<String>) -> Self {
        Self {
            posid: posid.into(),
            time: Vec::new(),
            tp: Vec::new(),
            was_moving: Vec::new(),
            collision_case: CollisionCase::I,
            collision_time: f64::INFINITY,
            collision_idx: None,
            collision_neighbor: None,
            frozen_time: f64::INFINITY,
        }
    }

    /// The positioner this sweep belongs to.
    #[inline]
    pub fn posid(&self) -> &str {
        &self.posid
    }

    /// Sample times in seconds, strictly increasing.
    #[inline]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Poses in poslocTP degrees, one per sample time.
    #[inline]
    pub fn tp(&self) -> &[TpPose] {
        &self.tp
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Collision case recorded by the driver (`I` when clean).
    #[inline]
    pub fn collision_case(&self) -> CollisionCase {
        self.collision_case
    }

    /// Time of the first collision, +∞ when clean.
    #[inline]
    pub fn collision_time(&self) -> f64 {
        self.collision_time
    }

    /// Sample index of the first collision.
    #[inline]
    pub fn collision_idx(&self) -> Option<usize> {
        self.collision_idx
    }

    /// What was struck.
    #[inline]
    pub fn collision_neighbor(&self) -> Option<&NeighborId> {
        self.collision_neighbor.as_ref()
    }

    /// Scheduler-imposed freeze time, +∞ when not frozen.
    #[inline]
    pub fn frozen_time(&self) -> f64 {
        self.frozen_time
    }

    /// True once a collision has been recorded.
    #[inline]
    pub fn is_collided(&self) -> bool {
        self.collision_case.is_collision()
    }

    /// Expand a move table into the exact piecewise-linear trace.
    ///
    /// Starts from `(start_time, init)`; each row appends up to three
    /// samples: the end of its prepause, the end of its ramp, and the end of
    /// its postpause, skipping zero-duration phases. Any previous contents
    /// and collision state are discarded.
    pub fn fill_exact(&mut self, init: TpPose, table: &MoveTable, start_time: f64) {
        self.time.clear();
        self.tp.clear();
        self.collision_case = CollisionCase::I;
        self.collision_time = f64::INFINITY;
        self.collision_idx = None;
        self.collision_neighbor = None;
        self.frozen_time = f64::INFINITY;

        self.time.push(start_time);
        self.tp.push(init);
        for row in table.rows() {
            if row.prepause > 0.0 {
                self.push_hold(row.prepause);
            }
            if row.move_time > 0.0 {
                let t = *self.time.last().expect("trace is never empty");
                let pose = self.tp.last().expect("trace is never empty");
                let next = pose.offset_by(row.d_theta, row.d_phi);
                self.time.push(t + row.move_time);
                self.tp.push(next);
            }
            if row.postpause > 0.0 {
                self.push_hold(row.postpause);
            }
        }
        self.recompute_was_moving();
    }

    /// Resample the exact trace onto a uniform timestep.
    ///
    /// Each exact segment is split into `floor(Δt / dt)` steps (at least one
    /// whenever the pose changes across it); the final sample of every
    /// segment is fixed up to coincide exactly with the segment's end time
    /// and pose, so quantization never drifts off the exact trace.
    pub fn quantize(&mut self, dt: f64) -> Result<()> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(KavachError::InvalidArgument(format!(
                "quantization step must be positive, got {dt}"
            )));
        }
        if self.time.len() < 2 {
            return Ok(());
        }
        let mut q_time: Vec<f64> = vec![self.time[0]];
        let mut q_tp: Vec<TpPose> = vec![self.tp[0]];
        for i in 1..self.time.len() {
            let seg_start_time = *q_time.last().expect("trace is never empty");
            let seg_start = *q_tp.last().expect("trace is never empty");
            let seg_dt = self.time[i] - seg_start_time;
            let end = self.tp[i];
            let moved = end != seg_start;
            let mut n = (seg_dt / dt).floor() as usize;
            if n == 0 && moved {
                n = 1;
            }
            if n == 0 {
                // Sub-step hold: absorbed into the next segment's span.
                continue;
            }
            let d_theta = (end.theta - seg_start.theta) / n as f64;
            let d_phi = (end.phi - seg_start.phi) / n as f64;
            for k in 1..n {
                q_time.push(seg_start_time + k as f64 * dt);
                q_tp.push(seg_start.offset_by(k as f64 * d_theta, k as f64 * d_phi));
            }
            q_time.push(self.time[i]);
            q_tp.push(end);
        }
        self.time = q_time;
        self.tp = q_tp;
        self.recompute_was_moving();
        Ok(())
    }

    /// Append zero-motion samples at timestep `dt` until the trace reaches
    /// `max_time`.
    ///
    /// Used to align sweeps whose tables end at different times. The final
    /// appended sample lands exactly on `max_time`.
    pub fn extend(&mut self, dt: f64, max_time: f64) -> Result<()> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(KavachError::InvalidArgument(format!(
                "extension step must be positive, got {dt}"
            )));
        }
        let (start, pose) = match (self.time.last(), self.tp.last()) {
            (Some(&t), Some(&p)) => (t, p),
            _ => {
                return Err(KavachError::InvalidArgument(
                    "cannot extend an empty sweep".into(),
                ))
            }
        };
        if max_time <= start {
            return Ok(());
        }
        let n = ((max_time - start) / dt).floor() as usize;
        for k in 1..=n {
            self.time.push(start + k as f64 * dt);
            self.tp.push(pose);
        }
        if *self.time.last().expect("just pushed") < max_time {
            self.time.push(max_time);
            self.tp.push(pose);
        }
        self.recompute_was_moving();
        Ok(())
    }

    /// Whether the pose changed between samples `k-1` and `k`.
    ///
    /// Always false at `k = 0` and out of range.
    #[inline]
    pub fn was_moving(&self, k: usize) -> bool {
        self.was_moving.get(k).copied().unwrap_or(false)
    }

    /// Axis-restricted variant of [`Sweep::was_moving`].
    pub fn axis_was_moving(&self, k: usize, axis: Axis) -> bool {
        if k == 0 || k >= self.tp.len() {
            return false;
        }
        self.tp[k].axis(axis) != self.tp[k - 1].axis(axis)
    }

    /// Verify the trace is continuous in the positioner's internal frame.
    ///
    /// Converts each sample to internally tracked shaft angles and checks
    /// that no adjacent pair differs by more than `stepsize` degrees on
    /// either axis. A hardstop wrap shows up as an enormous jump and fails
    /// the check.
    pub fn check_continuity(&self, stepsize: f64, calib: &Calibration) -> bool {
        for k in 1..self.tp.len() {
            let a = calib.posloc_to_posint(self.tp[k - 1]);
            let b = calib.posloc_to_posint(self.tp[k]);
            if (b.theta - a.theta).abs() > stepsize || (b.phi - a.phi).abs() > stepsize {
                warn!(
                    "sweep {}: discontinuity at sample {} ({:?} -> {:?})",
                    self.posid,
                    k,
                    self.tp[k - 1],
                    self.tp[k]
                );
                return false;
            }
        }
        true
    }

    /// Record a scheduler-imposed halt. Write-once.
    pub fn register_as_frozen(&mut self, time: f64) {
        if self.frozen_time.is_infinite() {
            self.frozen_time = time;
        }
    }

    /// Record the first collision. Write-once: later calls are ignored.
    pub(crate) fn record_collision(
        &mut self,
        case: CollisionCase,
        neighbor: NeighborId,
        time: f64,
        idx: usize,
    ) {
        if self.collision_case.is_collision() {
            return;
        }
        self.collision_case = case;
        self.collision_neighbor = Some(neighbor);
        self.collision_time = time;
        self.collision_idx = Some(idx);
    }

    fn push_hold(&mut self, duration: f64) {
        let t = *self.time.last().expect("trace is never empty");
        let pose = *self.tp.last().expect("trace is never empty");
        self.time.push(t + duration);
        self.tp.push(pose);
    }

    fn recompute_was_moving(&mut self) {
        self.was_moving = (0..self.tp.len())
            .map(|k| k > 0 && self.tp[k] != self.tp[k - 1])
            .collect();
    }
}
