pub mod horizon;
pub mod refraction;
pub mod telescope;

use thiserror::Error;

pub use horizon::{
    horizon_distance, max_visible_distance, minimum_visible_height, visible_fraction,
    VisibilityStatus, VisibilityThresholds,
};
pub use telescope::{telescope_visibility_threshold, TelescopeOptics};

/// Raised when a geometry function is handed a value outside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

pub(crate) fn require_non_negative(name: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::InvalidParameter { name, value })
    }
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::InvalidParameter { name, value })
    }
}
