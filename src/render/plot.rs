use bevy::prelude::*;

use bevy::render::render_resource::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;
use crate::plot::{HorizonGrid, PlotMarker};

/// Footprint of the plot along x (height) and z (refraction), world units.
pub const PLOT_EXTENT: f32 = 10.0;
/// Height of the tallest sample, world units.
pub const PLOT_HEIGHT: f32 = 6.0;

/// Maps grid values into the plot's world-space box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotFrame {
    height_range: (f64, f64),
    refraction_range: (f64, f64),
    z_max: f64,
}

impl PlotFrame {
    pub fn for_grid(grid: &HorizonGrid) -> Self {
        let span = |v: &[f64]| {
            let lo = v.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if lo.is_finite() && hi.is_finite() { (lo, hi) } else { (0.0, 1.0) }
        };
        let (_, z_max) = grid.z_range();
        Self {
            height_range: span(&grid.x),
            refraction_range: span(&grid.y),
            z_max: if z_max.is_finite() && z_max > 0.0 { z_max } else { 1.0 },
        }
    }

    fn normalize(value: f64, (lo, hi): (f64, f64)) -> f32 {
        if hi > lo { ((value - lo) / (hi - lo)) as f32 } else { 0.0 }
    }

    pub fn position(&self, height_m: f64, refraction: f64, horizon_km: f64) -> Vec3 {
        Vec3::new(
            Self::normalize(height_m, self.height_range) * PLOT_EXTENT,
            (horizon_km / self.z_max) as f32 * PLOT_HEIGHT,
            Self::normalize(refraction, self.refraction_range) * PLOT_EXTENT,
        )
    }

    pub fn marker_position(&self, marker: &PlotMarker) -> Vec3 {
        self.position(marker.observer_height_m, marker.refraction_factor, marker.horizon_distance_km)
    }
}

/// Flat-shaded, vertex-colored surface through every grid sample.
pub fn create_horizon_mesh(grid: &HorizonGrid) -> Mesh {
    let frame = PlotFrame::for_grid(grid);
    let (z_min, z_max) = grid.z_range();

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut colors = Vec::new();

    for j in 0..grid.y.len().saturating_sub(1) {
        for i in 0..grid.x.len().saturating_sub(1) {
            let corner = |jj: usize, ii: usize| {
                let d = grid.z[jj][ii];
                (
                    frame.position(grid.x[ii], grid.y[jj], d).to_array(),
                    get_color(d as f32, z_min as f32, z_max as f32),
                )
            };
            let (p00, c00) = corner(j, i);
            let (p10, c10) = corner(j, i + 1);
            let (p01, c01) = corner(j + 1, i);
            let (p11, c11) = corner(j + 1, i + 1);

            // Tri 1: 00, 01, 11
            positions.push(p00); normals.push([0.0, 1.0, 0.0]); colors.push(c00);
            positions.push(p01); normals.push([0.0, 1.0, 0.0]); colors.push(c01);
            positions.push(p11); normals.push([0.0, 1.0, 0.0]); colors.push(c11);

            // Tri 2: 00, 11, 10
            positions.push(p00); normals.push([0.0, 1.0, 0.0]); colors.push(c00);
            positions.push(p11); normals.push([0.0, 1.0, 0.0]); colors.push(c11);
            positions.push(p10); normals.push([0.0, 1.0, 0.0]); colors.push(c10);
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    if grid.x.len() > 1 && grid.y.len() > 1 {
        mesh.compute_flat_normals();
    }
    mesh
}

/// Blue (short horizon) through green and yellow to red (long horizon).
pub fn get_color(v: f32, min: f32, max: f32) -> [f32; 4] {
    let t = if max > min { ((v - min) / (max - min)).clamp(0.0, 1.0) } else { 0.0 };
    if t < 0.33 {
        let local_t = t / 0.33;
        [0.1, 0.3 + local_t * 0.5, 0.9 - local_t * 0.5, 1.0]
    } else if t < 0.66 {
        let local_t = (t - 0.33) / 0.33;
        [0.1 + local_t * 0.8, 0.8, 0.4 - local_t * 0.3, 1.0]
    } else {
        let local_t = (t - 0.66) / 0.34;
        [0.9, 0.8 - local_t * 0.6, 0.1, 1.0]
    }
}
