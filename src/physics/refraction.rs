use super::{require_positive, GeometryError};

/// Refraction factors offered by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefractionPreset {
    None,     // 1.0
    Weak,     // 1.1
    Moderate, // 1.2
    Standard, // 1.33
    Strong,   // 1.5
}

impl RefractionPreset {
    pub const ALL: [RefractionPreset; 5] = [
        RefractionPreset::None,
        RefractionPreset::Weak,
        RefractionPreset::Moderate,
        RefractionPreset::Standard,
        RefractionPreset::Strong,
    ];

    pub fn value(&self) -> f64 {
        match self {
            RefractionPreset::None => 1.0,
            RefractionPreset::Weak => 1.1,
            RefractionPreset::Moderate => 1.2,
            RefractionPreset::Standard => 1.33,
            RefractionPreset::Strong => 1.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RefractionPreset::None => "No refraction (k = 1.0)",
            RefractionPreset::Weak => "Weak (k = 1.1)",
            RefractionPreset::Moderate => "Moderate (k = 1.2)",
            RefractionPreset::Standard => "Standard atmosphere (k = 1.33)",
            RefractionPreset::Strong => "Strong (k = 1.5)",
        }
    }

    /// Preset matching `k`, if `k` is one of the offered values.
    pub fn from_value(k: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| (p.value() - k).abs() < 1e-9)
    }
}

/// Radius of the planet as seen by a light ray bent by refraction factor `k`.
pub fn effective_earth_radius(earth_radius_km: f64, k_factor: f64) -> Result<f64, GeometryError> {
    let radius = require_positive("earth_radius_km", earth_radius_km)?;
    let k = require_positive("refraction_factor", k_factor)?;
    Ok(radius * k)
}
