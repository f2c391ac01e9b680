//! Sampled horizon-distance surface for the 3D plot.
//!
//! The plot itself only consumes a grid of precomputed samples; the samples
//! come from the same [`horizon_distance`] the views use.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::geo::EARTH_RADIUS_KM;
use crate::physics::{horizon_distance, GeometryError};

/// Sampling lattice: observer heights along x, refraction factors along y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub height_range_m: (f64, f64),
    pub height_samples: usize,
    pub refraction_range: (f64, f64),
    pub refraction_samples: usize,
    pub earth_radius_km: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            height_range_m: (1.0, 100.0),
            height_samples: 40,
            refraction_range: (1.0, 1.5),
            refraction_samples: 21,
            earth_radius_km: EARTH_RADIUS_KM,
        }
    }
}

impl GridSpec {
    pub fn key(&self) -> GridKey {
        GridKey(*self)
    }
}

/// Hashable identity of a [`GridSpec`], compared bit-for-bit.
#[derive(Debug, Clone, Copy)]
pub struct GridKey(GridSpec);

impl GridKey {
    fn bits(&self) -> [u64; 7] {
        let s = &self.0;
        [
            s.height_range_m.0.to_bits(),
            s.height_range_m.1.to_bits(),
            s.height_samples as u64,
            s.refraction_range.0.to_bits(),
            s.refraction_range.1.to_bits(),
            s.refraction_samples as u64,
            s.earth_radius_km.to_bits(),
        ]
    }
}

impl PartialEq for GridKey {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for GridKey {}

impl Hash for GridKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// `{x, y, z}` as a surface plot expects it: `z[j][i]` is the horizon
/// distance for height `x[i]` under refraction `y[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Vec<f64>>,
}

impl HorizonGrid {
    pub fn z_range(&self) -> (f64, f64) {
        self.z
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Flat `(height, refraction, horizon)` rows, x varying fastest.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.y.iter().zip(&self.z).flat_map(move |(&k, row)| {
            self.x.iter().zip(row).map(move |(&h, &d)| (h, k, d))
        })
    }
}

/// Highlighted point for the current parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotMarker {
    pub observer_height_m: f64,
    pub refraction_factor: f64,
    pub horizon_distance_km: f64,
}

impl PlotMarker {
    pub fn new(observer_height_m: f64, refraction_factor: f64, earth_radius_km: f64) -> Result<Self, GeometryError> {
        Ok(Self {
            observer_height_m,
            refraction_factor,
            horizon_distance_km: horizon_distance(observer_height_m, earth_radius_km, refraction_factor)?,
        })
    }
}

fn samples(range: (f64, f64), count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![range.0],
        n => (0..n)
            .map(|i| range.0 + (range.1 - range.0) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

pub fn compute_horizon_grid(spec: &GridSpec) -> Result<HorizonGrid, GeometryError> {
    let x = samples(spec.height_range_m, spec.height_samples);
    let y = samples(spec.refraction_range, spec.refraction_samples);

    let mut z = vec![Vec::with_capacity(x.len()); y.len()];
    for (j, i) in iproduct!(0..y.len(), 0..x.len()) {
        z[j].push(horizon_distance(x[i], spec.earth_radius_km, y[j])?);
    }

    Ok(HorizonGrid { x, y, z })
}

/// Grid currently shown by the plot, and the spec it should match.
#[derive(bevy::prelude::Resource, Debug, Clone, Default)]
pub struct PlotState {
    pub spec: GridSpec,
    shown: Option<(GridKey, Arc<HorizonGrid>)>,
}

impl PlotState {
    pub fn new(spec: GridSpec) -> Self {
        Self { spec, shown: None }
    }

    pub fn grid(&self) -> Option<&Arc<HorizonGrid>> {
        self.shown.as_ref().map(|(_, grid)| grid)
    }

    pub fn shown_key(&self) -> Option<GridKey> {
        self.shown.as_ref().map(|(key, _)| *key)
    }

    pub fn publish(&mut self, key: GridKey, grid: Arc<HorizonGrid>) {
        self.shown = Some((key, grid));
    }

    /// True once a grid for the current spec is published.
    pub fn is_current(&self) -> bool {
        self.shown.as_ref().is_some_and(|(key, _)| *key == self.spec.key())
    }
}
