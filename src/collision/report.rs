//! Reduction of many evaluated sweeps to per-positioner collision reports.
//!
//! Schedule-level callers evaluate every collidable pair and every fixed
//! case, producing a pile of sweeps in which the same physical strike appears
//! twice (once per participant) and a positioner may appear in several
//! evaluations. This module keeps, per positioner, only its earliest strike,
//! and drops the mirrored duplicate of a pair that collided with each other.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{CollisionCase, NeighborId};
use crate::schedule::sweep::Sweep;

/// One positioner's earliest recorded collision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionSummary {
    /// The positioner the sweep belongs to
    pub posid: String,
    /// What it struck
    pub neighbor: NeighborId,
    /// Collision case
    pub case: CollisionCase,
    /// Collision time in seconds
    pub time: f64,
    /// Sample index on the positioner's sweep
    pub idx: usize,
}

/// Reduce evaluated sweeps to the earliest collision per positioner.
///
/// Clean sweeps are ignored. When both halves of the same pair report the
/// same strike, only the first-seen half survives. Results are ordered by
/// collision time, ties by posid.
pub fn earliest_collisions<'a, I>(sweeps: I) -> Vec<CollisionSummary>
where
    I: IntoIterator<Item = &'a Sweep>,
{
    let mut best: HashMap<String, CollisionSummary> = HashMap::new();
    for sweep in sweeps {
        if !sweep.is_collided() {
            continue;
        }
        let (neighbor, idx) = match (sweep.collision_neighbor(), sweep.collision_idx()) {
            (Some(n), Some(i)) => (n.clone(), i),
            _ => continue,
        };
        let summary = CollisionSummary {
            posid: sweep.posid().to_string(),
            neighbor,
            case: sweep.collision_case(),
            time: sweep.collision_time(),
            idx,
        };
        match best.get(sweep.posid()) {
            Some(prev) if prev.time <= summary.time => {}
            _ => {
                best.insert(summary.posid.clone(), summary);
            }
        }
    }

    let mut summaries: Vec<CollisionSummary> = best.into_values().collect();
    summaries.sort_by(|a, b| {
        a.time
            .partial_cmp(&b.time)
            .expect("collision times are finite")
            .then_with(|| a.posid.cmp(&b.posid))
    });

    // Drop the mirrored half of a positioner pair that struck each other.
    let mut seen: HashSet<(String, String, u64)> = HashSet::new();
    summaries.retain(|s| {
        let NeighborId::Positioner(other) = &s.neighbor else {
            return true;
        };
        let key = if s.posid < *other {
            (s.posid.clone(), other.clone(), s.time.to_bits())
        } else {
            (other.clone(), s.posid.clone(), s.time.to_bits())
        };
        seen.insert(key)
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FixedBoundary, TpPose};
    use crate::schedule::move_table::MoveTable;

    fn collided_sweep(posid: &str, neighbor: NeighborId, case: CollisionCase, time: f64) -> Sweep {
        let table = MoveTable::from_arrays(&[10.0], &[0.0], &[0.0], &[10.0], &[0.0]).unwrap();
        let mut sweep = Sweep::new(posid);
        sweep.fill_exact(TpPose::new(0.0, 0.0), &table, 0.0);
        sweep.quantize(0.1).unwrap();
        sweep.record_collision(case, neighbor, time, (time / 0.1) as usize);
        sweep
    }

    #[test]
    fn test_clean_sweeps_are_ignored() {
        let mut sweep = Sweep::new("A");
        sweep.fill_exact(TpPose::new(0.0, 0.0), &MoveTable::new(), 0.0);
        assert!(earliest_collisions([&sweep]).is_empty());
    }

    #[test]
    fn test_mirrored_pair_reported_once() {
        let a = collided_sweep(
            "A",
            NeighborId::Positioner("B".into()),
            CollisionCase::II,
            2.0,
        );
        let b = collided_sweep(
            "B",
            NeighborId::Positioner("A".into()),
            CollisionCase::II,
            2.0,
        );
        let out = earliest_collisions([&a, &b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].case, CollisionCase::II);
    }

    #[test]
    fn test_earliest_strike_per_positioner_wins() {
        let late = collided_sweep(
            "A",
            NeighborId::Positioner("B".into()),
            CollisionCase::II,
            5.0,
        );
        let early = collided_sweep(
            "A",
            NeighborId::Positioner("C".into()),
            CollisionCase::III,
            1.0,
        );
        let out = earliest_collisions([&late, &early]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].case, CollisionCase::III);
        assert_eq!(out[0].time, 1.0);
    }

    #[test]
    fn test_fixed_strikes_are_kept_and_ordered() {
        let wall = collided_sweep(
            "A",
            NeighborId::Fixed(FixedBoundary::Ptl),
            CollisionCase::Ptl,
            3.0,
        );
        let pair_a = collided_sweep(
            "B",
            NeighborId::Positioner("C".into()),
            CollisionCase::II,
            1.0,
        );
        let pair_b = collided_sweep(
            "C",
            NeighborId::Positioner("B".into()),
            CollisionCase::II,
            1.0,
        );
        let out = earliest_collisions([&wall, &pair_a, &pair_b]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].posid, "B");
        assert_eq!(out[1].posid, "A");
    }
}
