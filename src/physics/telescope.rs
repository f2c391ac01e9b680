//! When does the ship show up in the telescope?
//!
//! This is a UX tuning curve rather than optics. The telescope stays aimed
//! at the horizon, so a nearby ship is out of frame; it drifts into view once
//! its magnified silhouette is small enough to take up only a modest slice
//! of the eyepiece.

use serde::{Deserialize, Serialize};

use super::horizon::{horizon_distance, max_visible_distance};
use super::{require_non_negative, require_positive, GeometryError};
use crate::geo::METERS_PER_KM;

/// Share of the apparent field of view the ship occupies when it first
/// becomes discernible.
pub const TARGET_FIELD_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelescopeOptics {
    /// Apparent field of view, degrees.
    pub field_of_view_deg: f64,
    pub magnification: f64,
}

impl Default for TelescopeOptics {
    fn default() -> Self {
        Self {
            field_of_view_deg: 60.0,
            magnification: 20.0,
        }
    }
}

/// Distance from which the object starts fading into the telescope view.
///
/// Takes the object's angular size at the maximum visible distance, scales
/// it to the distance where the magnified object spans
/// [`TARGET_FIELD_FRACTION`] of the field of view, and caps the result at the
/// observer's horizon (and therefore at the maximum visible distance too).
pub fn telescope_visibility_threshold(
    observer_height_m: f64,
    object_height_m: f64,
    optics: &TelescopeOptics,
    earth_radius_km: f64,
    refraction_factor: f64,
) -> Result<f64, GeometryError> {
    let object_height_m = require_non_negative("object_height_m", object_height_m)?;
    let fov_deg = require_positive("field_of_view_deg", optics.field_of_view_deg)?;
    let magnification = require_positive("magnification", optics.magnification)?;

    let max = max_visible_distance(observer_height_m, object_height_m, earth_radius_km, refraction_factor)?;
    let horizon = horizon_distance(observer_height_m, earth_radius_km, refraction_factor)?;
    if max <= 0.0 {
        return Ok(0.0);
    }

    let angular_size_at_max = object_height_m / METERS_PER_KM / max;
    let fov_rad = fov_deg.to_radians();
    let fill_distance = max * angular_size_at_max * magnification / (TARGET_FIELD_FRACTION * fov_rad);

    Ok(fill_distance.min(max).min(horizon))
}
