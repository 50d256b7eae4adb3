//! Move tables: the high-level description of one positioner's planned move.
//!
//! Each row means "wait `prepause`, then ramp (θ, φ) linearly by
//! `(d_theta, d_phi)` over `move_time`, then wait `postpause`". Schedule
//! generators assemble tables row by row with the setters; batch callers
//! build them from row-parallel arrays.

use serde::{Deserialize, Serialize};

use crate::core::types::Axis;
use crate::error::{KavachError, Result};

/// One row of a move table. Angles in degrees, times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MoveRow {
    /// Theta delta over the ramp (deg)
    pub d_theta: f64,
    /// Phi delta over the ramp (deg)
    pub d_phi: f64,
    /// Wait before the ramp (s)
    pub prepause: f64,
    /// Ramp duration (s)
    pub move_time: f64,
    /// Wait after the ramp (s)
    pub postpause: f64,
}

impl MoveRow {
    fn validate(&self, row: usize) -> Result<()> {
        let times = [self.prepause, self.move_time, self.postpause];
        if times.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(KavachError::InvalidArgument(format!(
                "row {row}: pauses and move_time must be finite and non-negative"
            )));
        }
        if !self.d_theta.is_finite() || !self.d_phi.is_finite() {
            return Err(KavachError::InvalidArgument(format!(
                "row {row}: move deltas must be finite"
            )));
        }
        Ok(())
    }
}

/// A move table for one positioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MoveTable {
    rows: Vec<MoveRow>,
}

impl MoveTable {
    /// An empty table (a positioner that holds still).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from row-parallel arrays of equal length.
    pub fn from_arrays(
        d_theta: &[f64],
        d_phi: &[f64],
        prepause: &[f64],
        move_time: &[f64],
        postpause: &[f64],
    ) -> Result<Self> {
        for other in [d_phi.len(), prepause.len(), move_time.len(), postpause.len()] {
            if other != d_theta.len() {
                return Err(KavachError::ShapeMismatch {
                    x_len: d_theta.len(),
                    y_len: other,
                });
            }
        }
        let mut table = Self::new();
        for i in 0..d_theta.len() {
            let row = MoveRow {
                d_theta: d_theta[i],
                d_phi: d_phi[i],
                prepause: prepause[i],
                move_time: move_time[i],
                postpause: postpause[i],
            };
            row.validate(i)?;
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Build from deltas and per-row cruise speeds (deg/s).
    ///
    /// `move_time[i] = max(|d_theta[i]| / theta_speed[i],
    /// |d_phi[i]| / phi_speed[i])`; a zero delta contributes zero time. A
    /// nonzero delta with a non-positive speed is rejected.
    pub fn from_deltas_with_speeds(
        d_theta: &[f64],
        d_phi: &[f64],
        theta_speed: &[f64],
        phi_speed: &[f64],
        prepause: &[f64],
        postpause: &[f64],
    ) -> Result<Self> {
        for other in [
            d_phi.len(),
            theta_speed.len(),
            phi_speed.len(),
            prepause.len(),
            postpause.len(),
        ] {
            if other != d_theta.len() {
                return Err(KavachError::ShapeMismatch {
                    x_len: d_theta.len(),
                    y_len: other,
                });
            }
        }
        let axis_time = |delta: f64, speed: f64, row: usize| -> Result<f64> {
            if delta == 0.0 {
                return Ok(0.0);
            }
            if !(speed > 0.0) {
                return Err(KavachError::InvalidArgument(format!(
                    "row {row}: cruise speed must be positive for a nonzero delta"
                )));
            }
            Ok(delta.abs() / speed)
        };
        let mut move_time = Vec::with_capacity(d_theta.len());
        for i in 0..d_theta.len() {
            let tt = axis_time(d_theta[i], theta_speed[i], i)?;
            let tp = axis_time(d_phi[i], phi_speed[i], i)?;
            move_time.push(tt.max(tp));
        }
        Self::from_arrays(d_theta, d_phi, prepause, &move_time, postpause)
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows in schedule order.
    #[inline]
    pub fn rows(&self) -> &[MoveRow] {
        &self.rows
    }

    /// Set one axis delta on a row, extending the table with null rows as
    /// needed.
    pub fn set_move(&mut self, row: usize, axis: Axis, delta: f64) -> Result<()> {
        if !delta.is_finite() {
            return Err(KavachError::InvalidArgument(format!(
                "row {row}: move delta must be finite"
            )));
        }
        self.ensure_row(row);
        match axis {
            Axis::Theta => self.rows[row].d_theta = delta,
            Axis::Phi => self.rows[row].d_phi = delta,
        }
        Ok(())
    }

    /// Set the ramp duration on a row.
    pub fn set_move_time(&mut self, row: usize, seconds: f64) -> Result<()> {
        self.set_time(row, seconds, |r, s| r.move_time = s)
    }

    /// Set the pre-move pause on a row.
    pub fn set_prepause(&mut self, row: usize, seconds: f64) -> Result<()> {
        self.set_time(row, seconds, |r, s| r.prepause = s)
    }

    /// Set the post-move pause on a row.
    pub fn set_postpause(&mut self, row: usize, seconds: f64) -> Result<()> {
        self.set_time(row, seconds, |r, s| r.postpause = s)
    }

    /// Total scheduled duration: Σ (prepause + move_time + postpause).
    pub fn total_time(&self) -> f64 {
        self.rows
            .iter()
            .map(|r| r.prepause + r.move_time + r.postpause)
            .sum()
    }

    /// Net pose change over the whole table.
    pub fn net_move(&self) -> (f64, f64) {
        self.rows
            .iter()
            .fold((0.0, 0.0), |(t, p), r| (t + r.d_theta, p + r.d_phi))
    }

    fn set_time(&mut self, row: usize, seconds: f64, set: impl Fn(&mut MoveRow, f64)) -> Result<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(KavachError::InvalidArgument(format!(
                "row {row}: time must be finite and non-negative"
            )));
        }
        self.ensure_row(row);
        set(&mut self.rows[row], seconds);
        Ok(())
    }

    fn ensure_row(&mut self, row: usize) {
        if row >= self.rows.len() {
            self.rows.resize(row + 1, MoveRow::default());
        }
    }
}
