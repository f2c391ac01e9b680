//! Closed-form horizon geometry.
//!
//! All distances are kilometres and all heights metres. Each function is
//! pure and validates its own inputs; nothing here holds state.

use super::refraction::effective_earth_radius;
use super::telescope::{telescope_visibility_threshold, TelescopeOptics};
use super::{require_non_negative, GeometryError};
use crate::geo::METERS_PER_KM;

/// Distance at which a sea-level point drops below the horizon of an
/// observer standing `height_m` above the surface.
///
/// `d = sqrt(2 * R * k * h / 1000)`
pub fn horizon_distance(
    height_m: f64,
    earth_radius_km: f64,
    refraction_factor: f64,
) -> Result<f64, GeometryError> {
    let r_eff = effective_earth_radius(earth_radius_km, refraction_factor)?;
    let h = require_non_negative("height_m", height_m)?;
    Ok((2.0 * r_eff * h / METERS_PER_KM).sqrt())
}

/// Farthest distance at which the tip of an object is still visible.
pub fn max_visible_distance(
    observer_height_m: f64,
    object_height_m: f64,
    earth_radius_km: f64,
    refraction_factor: f64,
) -> Result<f64, GeometryError> {
    let observer = horizon_distance(observer_height_m, earth_radius_km, refraction_factor)?;
    let object = horizon_distance(object_height_m, earth_radius_km, refraction_factor)?;
    Ok(observer + object)
}

/// Share of the object still above the horizon at `distance_km`, in `[0, 1]`.
///
/// Linear between the observer's horizon (fully visible) and the maximum
/// visible distance (fully hidden). A zero-height object has an empty ramp
/// and disappears as soon as it passes the horizon.
pub fn visible_fraction(
    distance_km: f64,
    observer_height_m: f64,
    object_height_m: f64,
    earth_radius_km: f64,
    refraction_factor: f64,
) -> Result<f64, GeometryError> {
    let d = require_non_negative("distance_km", distance_km)?;
    let horizon = horizon_distance(observer_height_m, earth_radius_km, refraction_factor)?;
    let max = max_visible_distance(observer_height_m, object_height_m, earth_radius_km, refraction_factor)?;

    if d <= horizon {
        return Ok(1.0);
    }
    if d >= max {
        return Ok(0.0);
    }
    Ok(1.0 - (d - horizon) / (max - horizon))
}

/// Height an object needs to show its tip at `distance_km`.
///
/// Inverse of [`horizon_distance`] applied to the stretch beyond the
/// observer's own horizon.
pub fn minimum_visible_height(
    distance_km: f64,
    observer_height_m: f64,
    earth_radius_km: f64,
    refraction_factor: f64,
) -> Result<f64, GeometryError> {
    let d = require_non_negative("distance_km", distance_km)?;
    let r_eff = effective_earth_radius(earth_radius_km, refraction_factor)?;
    let horizon = horizon_distance(observer_height_m, earth_radius_km, refraction_factor)?;

    if d <= horizon {
        return Ok(0.0);
    }
    let beyond = d - horizon;
    Ok(beyond * beyond / (2.0 * r_eff) * METERS_PER_KM)
}

/// Distances that drive both views, derived from the current parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityThresholds {
    pub horizon_distance: f64,
    pub max_visible_distance: f64,
    pub telescope_threshold: f64,
}

impl VisibilityThresholds {
    pub fn compute(
        observer_height_m: f64,
        object_height_m: f64,
        earth_radius_km: f64,
        refraction_factor: f64,
        optics: &TelescopeOptics,
    ) -> Result<Self, GeometryError> {
        Ok(Self {
            horizon_distance: horizon_distance(observer_height_m, earth_radius_km, refraction_factor)?,
            max_visible_distance: max_visible_distance(
                observer_height_m,
                object_height_m,
                earth_radius_km,
                refraction_factor,
            )?,
            telescope_threshold: telescope_visibility_threshold(
                observer_height_m,
                object_height_m,
                optics,
                earth_radius_km,
                refraction_factor,
            )?,
        })
    }

    pub fn sink_range(&self) -> f64 {
        self.max_visible_distance - self.horizon_distance
    }
}

/// Discretized visibility shown in the readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityStatus {
    FullyVisible,
    NotVisible,
    Partial(u8),
}

impl VisibilityStatus {
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction >= 0.99 {
            VisibilityStatus::FullyVisible
        } else if fraction <= 0.01 {
            VisibilityStatus::NotVisible
        } else {
            VisibilityStatus::Partial((fraction * 100.0).round() as u8)
        }
    }
}

impl std::fmt::Display for VisibilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisibilityStatus::FullyVisible => write!(f, "Fully Visible"),
            VisibilityStatus::NotVisible => write!(f, "Not Visible"),
            VisibilityStatus::Partial(percent) => write!(f, "{percent}% Visible"),
        }
    }
}
