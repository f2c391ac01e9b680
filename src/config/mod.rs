use serde::{Deserialize, Serialize};

use crate::geo::EARTH_RADIUS_KM;
use crate::physics::TelescopeOptics;
use crate::plot::GridSpec;

/// Everything tunable about the scene, loaded from JSON.
///
/// Every section falls back to its defaults when missing, so a config file
/// only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Planet radius in km. Stylized, see [`EARTH_RADIUS_KM`].
    pub earth_radius_km: f64,
    pub simulation: SimulationConfig,
    pub telescope: TelescopeConfig,
    pub animation: AnimationConfig,
    pub plot: GridSpec,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            earth_radius_km: EARTH_RADIUS_KM,
            simulation: SimulationConfig::default(),
            telescope: TelescopeConfig::default(),
            animation: AnimationConfig::default(),
            plot: GridSpec::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub observer_height_m: f64,
    pub ship_height_m: f64,
    pub ship_distance_km: f64,
    pub refraction_factor: f64,
    pub ranges: ParameterRanges,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            observer_height_m: 2.0,
            ship_height_m: 50.0,
            ship_distance_km: 0.0,
            refraction_factor: 1.33,
            ranges: ParameterRanges::default(),
        }
    }
}

impl SimulationConfig {
    /// Same values pulled into the slider ranges, distance at least zero.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f64, (lo, hi): (f64, f64)| v.max(lo).min(hi);
        Self {
            observer_height_m: clamp(self.observer_height_m, self.ranges.observer_height_m),
            ship_height_m: clamp(self.ship_height_m, self.ranges.ship_height_m),
            ship_distance_km: self.ship_distance_km.max(0.0),
            ..self.clone()
        }
    }
}

/// Slider bounds exposed by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterRanges {
    pub observer_height_m: (f64, f64),
    pub ship_height_m: (f64, f64),
    /// The distance slider's ceiling is rounded up to a multiple of this.
    pub distance_step_km: f64,
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            observer_height_m: (1.0, 100.0),
            ship_height_m: (5.0, 100.0),
            distance_step_km: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelescopeConfig {
    pub optics: TelescopeOptics,
    /// Extra on-screen enlargement of the ship inside the eyepiece.
    pub view_magnification: f64,
    /// How far below the horizon the ship starts its rise, as a share of
    /// its drawn height.
    pub rise_factor: f64,
}

impl Default for TelescopeConfig {
    fn default() -> Self {
        Self {
            optics: TelescopeOptics::default(),
            view_magnification: 2.5,
            rise_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub speed_km_per_s: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { speed_km_per_s: 2.0 }
    }
}
