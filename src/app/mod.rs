//! Simulation state container.
//!
//! Owns the mutable parameters and is the only place they change. The
//! renderers receive them by reference and never write back.

use bevy::log::{debug, warn};
use bevy::prelude::Resource;

use crate::animation::{AnimationDriver, Clock};
use crate::config::{AnimationConfig, ParameterRanges, SceneConfig, SimulationConfig, TelescopeConfig};
use crate::physics::{visible_fraction, GeometryError, VisibilityStatus, VisibilityThresholds};
use crate::plot::GridSpec;
use crate::render::{NormalView, ShipDrawState, SmokeAnimation, Surface, TelescopeView};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    pub observer_height_m: f64,
    pub ship_height_m: f64,
    pub ship_distance_km: f64,
    pub refraction_factor: f64,
    pub telescope_enabled: bool,
    pub animation_enabled: bool,
}

impl SimulationParameters {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            observer_height_m: config.observer_height_m,
            ship_height_m: config.ship_height_m,
            ship_distance_km: config.ship_distance_km,
            refraction_factor: config.refraction_factor,
            telescope_enabled: false,
            animation_enabled: false,
        }
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

/// Which views are on screen. Distance never changes this, only the toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    NormalOnly,
    NormalPlusTelescope,
}

/// Ship placement produced by one [`Simulation::render`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub normal: ShipDrawState,
    pub telescope: Option<ShipDrawState>,
}

#[derive(Resource)]
pub struct Simulation {
    params: SimulationParameters,
    defaults: SimulationConfig,
    ranges: ParameterRanges,
    earth_radius_km: f64,
    telescope: TelescopeConfig,
    animation: AnimationDriver,
    smoke: SmokeAnimation,
}

impl Simulation {
    pub fn new(config: &SceneConfig, clock: Box<dyn Clock>) -> Result<Self, GeometryError> {
        let defaults = config.simulation.clamped();
        if defaults != config.simulation {
            warn!(
                "scene values outside slider ranges, using observer {} m, ship {} m, distance {} km",
                defaults.observer_height_m, defaults.ship_height_m, defaults.ship_distance_km
            );
        }
        let mut sim = Self {
            params: SimulationParameters::from_config(&defaults),
            defaults,
            ranges: config.simulation.ranges,
            earth_radius_km: config.earth_radius_km,
            telescope: config.telescope,
            animation: AnimationDriver::new(clock, config.animation.speed_km_per_s),
            smoke: SmokeAnimation::default(),
        };
        sim.clamp_distance()?;
        Ok(sim)
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn ranges(&self) -> &ParameterRanges {
        &self.ranges
    }

    pub fn earth_radius_km(&self) -> f64 {
        self.earth_radius_km
    }

    pub fn telescope_config(&self) -> &TelescopeConfig {
        &self.telescope
    }

    pub fn animation(&self) -> &AnimationDriver {
        &self.animation
    }

    /// Scene config with the current physical parameters as its defaults.
    pub fn scene_config(&self, plot: GridSpec) -> SceneConfig {
        SceneConfig {
            earth_radius_km: self.earth_radius_km,
            simulation: SimulationConfig {
                observer_height_m: self.params.observer_height_m,
                ship_height_m: self.params.ship_height_m,
                ship_distance_km: self.params.ship_distance_km,
                refraction_factor: self.params.refraction_factor,
                ranges: self.ranges,
            },
            telescope: self.telescope,
            animation: AnimationConfig {
                speed_km_per_s: self.animation.speed_km_per_s(),
            },
            plot,
        }
    }

    pub fn thresholds(&self) -> Result<VisibilityThresholds, GeometryError> {
        VisibilityThresholds::compute(
            self.params.observer_height_m,
            self.params.ship_height_m,
            self.earth_radius_km,
            self.params.refraction_factor,
            &self.telescope.optics,
        )
    }

    pub fn visible_fraction(&self) -> Result<f64, GeometryError> {
        visible_fraction(
            self.params.ship_distance_km,
            self.params.observer_height_m,
            self.params.ship_height_m,
            self.earth_radius_km,
            self.params.refraction_factor,
        )
    }

    pub fn visibility_status(&self) -> Result<VisibilityStatus, GeometryError> {
        Ok(VisibilityStatus::from_fraction(self.visible_fraction()?))
    }

    /// Ceiling for the distance slider: the maximum visible distance rounded
    /// up to the configured step.
    pub fn distance_slider_max(&self) -> Result<f64, GeometryError> {
        let max = self.thresholds()?.max_visible_distance;
        let step = self.ranges.distance_step_km;
        if step > 0.0 {
            Ok((max / step).ceil().max(1.0) * step)
        } else {
            Ok(max)
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        if self.params.telescope_enabled {
            ViewMode::NormalPlusTelescope
        } else {
            ViewMode::NormalOnly
        }
    }

    pub fn set_observer_height(&mut self, height_m: f64) -> Result<(), GeometryError> {
        let (lo, hi) = self.ranges.observer_height_m;
        self.update(|p| p.observer_height_m = height_m.max(lo).min(hi))
    }

    pub fn set_ship_height(&mut self, height_m: f64) -> Result<(), GeometryError> {
        let (lo, hi) = self.ranges.ship_height_m;
        self.update(|p| p.ship_height_m = height_m.max(lo).min(hi))
    }

    pub fn set_refraction_factor(&mut self, k: f64) -> Result<(), GeometryError> {
        self.update(|p| p.refraction_factor = k)
    }

    pub fn set_ship_distance(&mut self, distance_km: f64) -> Result<(), GeometryError> {
        self.update(|p| p.ship_distance_km = distance_km.max(0.0))
    }

    /// Apply a change and re-clamp the distance; a change that makes the
    /// geometry invalid is rolled back.
    fn update(&mut self, change: impl FnOnce(&mut SimulationParameters)) -> Result<(), GeometryError> {
        let previous = self.params;
        change(&mut self.params);
        if let Err(err) = self.clamp_distance() {
            self.params = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn set_telescope_enabled(&mut self, enabled: bool) {
        self.params.telescope_enabled = enabled;
    }

    pub fn set_animation_enabled(&mut self, enabled: bool) {
        self.params.animation_enabled = enabled;
        if enabled {
            self.animation.start();
        } else {
            self.animation.stop();
        }
    }

    pub fn set_animation_speed(&mut self, speed_km_per_s: f64) {
        self.animation.set_speed(speed_km_per_s);
    }

    /// Put the physical parameters back to their defaults, in place.
    ///
    /// View toggles and the animation state are left as they are.
    pub fn reset(&mut self) -> Result<(), GeometryError> {
        let defaults = self.defaults.clone();
        self.update(|p| {
            p.observer_height_m = defaults.observer_height_m;
            p.ship_height_m = defaults.ship_height_m;
            p.ship_distance_km = defaults.ship_distance_km;
            p.refraction_factor = defaults.refraction_factor;
        })
    }

    /// Keep the ship inside the visible track after any threshold change.
    fn clamp_distance(&mut self) -> Result<(), GeometryError> {
        let max = self.thresholds()?.max_visible_distance;
        if self.params.ship_distance_km > max {
            debug!(
                "clamping ship distance {:.2} km to {:.2} km",
                self.params.ship_distance_km, max
            );
            self.params.ship_distance_km = max;
        }
        Ok(())
    }

    /// Per-frame update: smoke drifts, and the ship sails if animation is on.
    pub fn advance_frame(&mut self, frame_secs: f64) -> Result<(), GeometryError> {
        self.smoke.advance(frame_secs);
        if self.params.animation_enabled {
            let max = self.thresholds()?.max_visible_distance;
            let before = self.animation.heading();
            self.params.ship_distance_km = self.animation.tick(self.params.ship_distance_km, max);
            if self.animation.heading() != before {
                debug!("ship turned around at {:.2} km", self.params.ship_distance_km);
            }
        }
        Ok(())
    }

    pub fn smoke(&self) -> SmokeAnimation {
        self.smoke
    }

    /// Draw the normal view, then the telescope view if it is enabled and a
    /// surface for it was supplied.
    pub fn render<N, T>(
        &self,
        normal: &mut N,
        telescope: Option<&mut T>,
    ) -> Result<FrameReport, GeometryError>
    where
        N: Surface + ?Sized,
        T: Surface + ?Sized,
    {
        let normal_view = NormalView::new(self.earth_radius_km);
        let normal_state = normal_view.render(normal, &self.params, Some(self.smoke))?;

        let telescope_state = match (self.view_mode(), telescope) {
            (ViewMode::NormalPlusTelescope, Some(surface)) => {
                let view = TelescopeView::new(self.earth_radius_km, self.telescope);
                Some(view.render(surface, &self.params, Some(self.smoke))?.ship)
            }
            _ => None,
        };

        Ok(FrameReport {
            normal: normal_state,
            telescope: telescope_state,
        })
    }
}
