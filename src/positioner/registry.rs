//! Positioner registry: calibrations, derived keepouts, neighbor sets.
//!
//! The registry owns every [`PositionerRecord`] on the petal. Records refer
//! to their neighbors by posid, never by owning pointer; the registry is the
//! single owner and is used by one caller thread at a time.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::polygon::Polygon;
use crate::core::types::{FixedBoundary, TpPose};
use crate::error::{KavachError, Result};
use crate::keepout::builder::{build_keepouts, FixedEnvelopes, KeepoutSet};
use crate::keepout::config::GeometryConfig;
use crate::positioner::calibration::{Calibration, KeepoutExpansion};

/// Hex packing bounds a positioner to at most 6 geometric neighbors;
/// exceeding this is a fatal calibration error.
pub const MAX_NEIGHBORS: usize = 6;

/// Registration data for one positioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionerConfig {
    /// Unique id string (e.g. "M02725")
    pub posid: String,
    /// Device location on the petal
    pub device_loc: u32,
    /// Kinematic calibration
    pub calib: Calibration,
    /// Keepout expansion set
    pub expansion: KeepoutExpansion,
    /// Whether the scheduler has classified this positioner as parked
    /// inside its retracted envelope
    pub classified_as_retracted: bool,
    /// Whether the positioner accepts move commands
    pub ctrl_enabled: bool,
}

impl PositionerConfig {
    /// Registration with nominal calibration and no expansions.
    pub fn new(posid: impl Into<String>, device_loc: u32) -> Self {
        Self {
            posid: posid.into(),
            device_loc,
            calib: Calibration::default(),
            expansion: KeepoutExpansion::default(),
            classified_as_retracted: false,
            ctrl_enabled: true,
        }
    }
}

/// One registered positioner with its derived geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionerRecord {
    /// Unique id string
    pub posid: String,
    /// Device location on the petal
    pub device_loc: u32,
    /// Dense 1-based index for animation sinks
    pub anim_idx: usize,
    /// Kinematic calibration
    pub calib: Calibration,
    /// Keepout expansion set
    pub expansion: KeepoutExpansion,
    /// Parked inside the retracted envelope
    pub classified_as_retracted: bool,
    /// Accepts move commands
    pub ctrl_enabled: bool,
    /// Derived keepout polygons
    pub keepouts: KeepoutSet,
    /// Neighboring posids (≤ [`MAX_NEIGHBORS`])
    pub neighbors: Vec<String>,
    /// Fixed envelopes this positioner can reach
    pub fixed_cases: Vec<FixedBoundary>,
}

/// Placed per-pose polygons for one positioner, for animation sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedKeepouts {
    /// Central body at the current theta
    pub central_body: Polygon,
    /// Phi arm at the current pose
    pub phi_arm: Polygon,
    /// Ferrule disk at the fiber tip
    pub ferrule: Polygon,
}

/// One-shot placed envelope circles for one positioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedEnvelopes {
    pub eo: Polygon,
    pub ei: Polygon,
    pub ee: Polygon,
}

impl PositionerRecord {
    /// Phi arm keepout placed in petal coordinates at `tp`.
    pub fn placed_phi_arm(&self, tp: TpPose) -> Polygon {
        self.keepouts.phi.place_as_phi_arm(
            tp.theta,
            tp.phi,
            self.calib.x0,
            self.calib.y0,
            self.calib.r1,
        )
    }

    /// Central body keepout placed in petal coordinates at `theta`.
    pub fn placed_central_body(&self, theta: f64) -> Polygon {
        self.keepouts
            .theta
            .place_as_central_body(theta, self.calib.x0, self.calib.y0)
    }

    /// Full-range phi arc keepout placed in petal coordinates at `theta`.
    pub fn placed_phi_arc(&self, theta: f64) -> Polygon {
        self.keepouts
            .phi_arc
            .place_as_central_body(theta, self.calib.x0, self.calib.y0)
    }

    /// Ferrule disk placed in petal coordinates at `tp`.
    pub fn placed_ferrule(&self, tp: TpPose) -> Polygon {
        self.keepouts.ferrule.place_as_phi_arm(
            tp.theta,
            tp.phi,
            self.calib.x0,
            self.calib.y0,
            self.calib.r1,
        )
    }

    /// Extreme-range envelope centered on this positioner.
    pub fn placed_ee(&self) -> Polygon {
        self.keepouts.ee.translated(self.calib.x0, self.calib.y0)
    }

    /// All per-pose polygons for an animation frame.
    pub fn placed_keepouts(&self, tp: TpPose) -> PlacedKeepouts {
        PlacedKeepouts {
            central_body: self.placed_central_body(tp.theta),
            phi_arm: self.placed_phi_arm(tp),
            ferrule: self.placed_ferrule(tp),
        }
    }

    /// One-shot envelope circles centered on this positioner.
    pub fn placed_envelopes(&self) -> PlacedEnvelopes {
        let (x0, y0) = (self.calib.x0, self.calib.y0);
        PlacedEnvelopes {
            eo: self.keepouts.eo.translated(x0, y0),
            ei: self.keepouts.ei.translated(x0, y0),
            ee: self.keepouts.ee.translated(x0, y0),
        }
    }
}

/// Registry of all positioners on one petal.
#[derive(Debug, Clone)]
pub struct PositionerRegistry {
    geometry: GeometryConfig,
    fixed: FixedEnvelopes,
    records: Vec<PositionerRecord>,
    index: HashMap<String, usize>,
}

impl PositionerRegistry {
    /// Create a registry for a petal, placing its fixed envelopes.
    pub fn new(geometry: GeometryConfig) -> Result<Self> {
        let fixed = FixedEnvelopes::load(&geometry)?;
        Ok(Self {
            geometry,
            fixed,
            records: Vec::new(),
            index: HashMap::new(),
        })
    }

    /// The petal geometry this registry was built from.
    #[inline]
    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }

    /// The placed fixed envelopes.
    #[inline]
    pub fn fixed(&self) -> &FixedEnvelopes {
        &self.fixed
    }

    /// Number of registered positioners.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in registration order.
    #[inline]
    pub fn records(&self) -> &[PositionerRecord] {
        &self.records
    }

    /// Look up a record by posid.
    pub fn get(&self, posid: &str) -> Result<&PositionerRecord> {
        self.index
            .get(posid)
            .map(|&i| &self.records[i])
            .ok_or_else(|| KavachError::UnknownPositioner(posid.to_string()))
    }

    /// Register a positioner, deriving its keepout set.
    ///
    /// Assigns the next dense 1-based animation index. Duplicate posids are
    /// rejected.
    pub fn add(&mut self, config: PositionerConfig) -> Result<()> {
        if self.index.contains_key(&config.posid) {
            return Err(KavachError::InvalidArgument(format!(
                "positioner {} already registered",
                config.posid
            )));
        }
        config.calib.validate(&config.posid)?;
        config.expansion.validate(&config.posid)?;
        let keepouts = build_keepouts(&self.geometry, &config.calib, &config.expansion)?;
        let anim_idx = self.records.len() + 1;
        debug!(
            "registered positioner {} at device_loc {} (anim {})",
            config.posid, config.device_loc, anim_idx
        );
        self.index.insert(config.posid.clone(), self.records.len());
        self.records.push(PositionerRecord {
            posid: config.posid,
            device_loc: config.device_loc,
            anim_idx,
            calib: config.calib,
            expansion: config.expansion,
            classified_as_retracted: config.classified_as_retracted,
            ctrl_enabled: config.ctrl_enabled,
            keepouts,
            neighbors: Vec::new(),
            fixed_cases: Vec::new(),
        });
        Ok(())
    }

    /// Replace a positioner's calibration and rebuild its derived keepouts.
    pub fn set_calibration(
        &mut self,
        posid: &str,
        calib: Calibration,
        expansion: KeepoutExpansion,
    ) -> Result<()> {
        calib.validate(posid)?;
        expansion.validate(posid)?;
        let keepouts = build_keepouts(&self.geometry, &calib, &expansion)?;
        let i = *self
            .index
            .get(posid)
            .ok_or_else(|| KavachError::UnknownPositioner(posid.to_string()))?;
        let rec = &mut self.records[i];
        rec.calib = calib;
        rec.expansion = expansion;
        rec.keepouts = keepouts;
        Ok(())
    }

    /// Rebuild every positioner's derived keepouts from its stored
    /// calibration.
    ///
    /// Call after mutating the geometry-level configuration (expansion
    /// defaults, envelope scalars) so every derived polygon is current.
    pub fn refresh_calibrations(&mut self) -> Result<()> {
        for rec in &mut self.records {
            rec.calib.validate(&rec.posid)?;
            rec.expansion.validate(&rec.posid)?;
            rec.keepouts = build_keepouts(&self.geometry, &rec.calib, &rec.expansion)?;
        }
        Ok(())
    }

    /// Geometric neighbor discovery for one positioner.
    ///
    /// Another positioner is a neighbor iff the two placed Ee envelopes
    /// overlap. Fixed cases are the fixed envelopes the Ee envelope reaches.
    pub fn identify_neighbors(&mut self, posid: &str) -> Result<()> {
        let i = *self
            .index
            .get(posid)
            .ok_or_else(|| KavachError::UnknownPositioner(posid.to_string()))?;
        let ee = self.records[i].placed_ee();
        let neighbors: Vec<String> = self
            .records
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .filter(|(_, q)| ee.collides_with(&q.placed_ee()))
            .map(|(_, q)| q.posid.clone())
            .collect();
        let fixed_cases = self.reachable_fixed(&ee);
        self.commit_neighbors(i, neighbors, fixed_cases)
    }

    /// Geometric neighbor discovery for every registered positioner.
    pub fn identify_all_neighbors(&mut self) -> Result<()> {
        let posids: Vec<String> = self.records.iter().map(|r| r.posid.clone()).collect();
        for posid in posids {
            self.identify_neighbors(&posid)?;
        }
        Ok(())
    }

    /// Locational neighbor discovery from a precomputed device-location map.
    ///
    /// `location_map` gives, for each device location, the set of adjacent
    /// device locations; neighbors are the registered positioners at those
    /// locations. Fixed cases are still found geometrically.
    pub fn identify_neighbors_by_location(
        &mut self,
        location_map: &HashMap<u32, HashSet<u32>>,
    ) -> Result<()> {
        let by_loc: HashMap<u32, String> = self
            .records
            .iter()
            .map(|r| (r.device_loc, r.posid.clone()))
            .collect();
        for i in 0..self.records.len() {
            let rec = &self.records[i];
            let neighbors: Vec<String> = location_map
                .get(&rec.device_loc)
                .map(|locs| {
                    locs.iter()
                        .filter_map(|loc| by_loc.get(loc))
                        .filter(|p| *p != &rec.posid)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            let fixed_cases = self.reachable_fixed(&rec.placed_ee());
            self.commit_neighbors(i, neighbors, fixed_cases)?;
        }
        Ok(())
    }

    /// Placed per-pose polygons for an animation frame.
    pub fn placed_keepouts(&self, posid: &str, tp: TpPose) -> Result<PlacedKeepouts> {
        Ok(self.get(posid)?.placed_keepouts(tp))
    }

    fn reachable_fixed(&self, placed_ee: &Polygon) -> Vec<FixedBoundary> {
        [FixedBoundary::Ptl, FixedBoundary::Gfa]
            .into_iter()
            .filter(|&b| placed_ee.collides_with(self.fixed.polygon(b)))
            .collect()
    }

    fn commit_neighbors(
        &mut self,
        i: usize,
        neighbors: Vec<String>,
        fixed_cases: Vec<FixedBoundary>,
    ) -> Result<()> {
        let rec = &mut self.records[i];
        if neighbors.len() > MAX_NEIGHBORS {
            warn!(
                "positioner {} has {} neighbors (max {})",
                rec.posid,
                neighbors.len(),
                MAX_NEIGHBORS
            );
            return Err(KavachError::CalibrationInvalid {
                posid: rec.posid.clone(),
                reason: format!(
                    "{} neighbors exceeds the geometric bound of {}",
                    neighbors.len(),
                    MAX_NEIGHBORS
                ),
            });
        }
        debug!(
            "positioner {}: {} neighbors, fixed cases {:?}",
            rec.posid,
            neighbors.len(),
            fixed_cases
        );
        rec.neighbors = neighbors;
        rec.fixed_cases = fixed_cases;
        Ok(())
    }
}
