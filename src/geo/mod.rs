use serde::{Deserialize, Serialize};

use crate::physics::{self, GeometryError};

/// Planetary radius used by the demonstration, in kilometres.
///
/// This is intentionally not the real mean radius (~6371 km). The whole
/// scene is tuned against this stylized value, so horizon distances shown to
/// the user come out slightly longer than the textbook figures.
pub const EARTH_RADIUS_KM: f64 = 7320.0;

/// Refraction factor applied when none is given: pure geometry.
pub const DEFAULT_REFRACTION: f64 = 1.0;

pub const METERS_PER_KM: f64 = 1000.0;

/// Planet radius and refraction bundled together, so callers that do not
/// care about either can rely on the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarthModel {
    pub radius_km: f64,
    pub refraction: f64,
}

impl Default for EarthModel {
    fn default() -> Self {
        Self {
            radius_km: EARTH_RADIUS_KM,
            refraction: DEFAULT_REFRACTION,
        }
    }
}

impl EarthModel {
    pub fn with_refraction(refraction: f64) -> Self {
        Self {
            refraction,
            ..Self::default()
        }
    }

    pub fn horizon_distance(&self, height_m: f64) -> Result<f64, GeometryError> {
        physics::horizon_distance(height_m, self.radius_km, self.refraction)
    }

    pub fn max_visible_distance(
        &self,
        observer_height_m: f64,
        object_height_m: f64,
    ) -> Result<f64, GeometryError> {
        physics::max_visible_distance(observer_height_m, object_height_m, self.radius_km, self.refraction)
    }

    pub fn visible_fraction(
        &self,
        distance_km: f64,
        observer_height_m: f64,
        object_height_m: f64,
    ) -> Result<f64, GeometryError> {
        physics::visible_fraction(
            distance_km,
            observer_height_m,
            object_height_m,
            self.radius_km,
            self.refraction,
        )
    }

    pub fn minimum_visible_height(
        &self,
        distance_km: f64,
        observer_height_m: f64,
    ) -> Result<f64, GeometryError> {
        physics::minimum_visible_height(distance_km, observer_height_m, self.radius_km, self.refraction)
    }
}
