//! Automatic sailing: the ship cruises out to the last point where it is
//! still visible, turns around, comes back to the shore, and repeats.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source, injectable so sailing can be driven by hand.
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Outbound,
    Inbound,
}

/// Start/stop/tick task that moves the ship back and forth.
pub struct AnimationDriver {
    clock: Box<dyn Clock>,
    speed_km_per_s: f64,
    heading: Heading,
    last_tick: Option<Duration>,
}

impl AnimationDriver {
    pub fn new(clock: Box<dyn Clock>, speed_km_per_s: f64) -> Self {
        Self {
            clock,
            speed_km_per_s: speed_km_per_s.abs(),
            heading: Heading::Outbound,
            last_tick: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.last_tick.is_some()
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn speed_km_per_s(&self) -> f64 {
        self.speed_km_per_s
    }

    pub fn set_speed(&mut self, speed_km_per_s: f64) {
        self.speed_km_per_s = speed_km_per_s.abs();
    }

    /// Starting a running driver keeps its current time base.
    pub fn start(&mut self) {
        if self.last_tick.is_none() {
            self.last_tick = Some(self.clock.now());
        }
    }

    /// Stopping twice is harmless.
    pub fn stop(&mut self) {
        self.last_tick = None;
    }

    /// Move the ship by the time elapsed since the previous tick.
    ///
    /// Returns the new distance; a stopped driver returns `distance_km`
    /// untouched.
    pub fn tick(&mut self, distance_km: f64, max_distance_km: f64) -> f64 {
        let Some(last) = self.last_tick else {
            return distance_km;
        };
        let now = self.clock.now();
        self.last_tick = Some(now);
        let elapsed = now.saturating_sub(last).as_secs_f64();
        self.advance(distance_km, elapsed, max_distance_km)
    }

    /// One integration step, turning around at either end of the track.
    pub fn advance(&mut self, distance_km: f64, elapsed_secs: f64, max_distance_km: f64) -> f64 {
        let max = max_distance_km.max(0.0);
        let step = self.speed_km_per_s * elapsed_secs.max(0.0);
        let next = match self.heading {
            Heading::Outbound => distance_km + step,
            Heading::Inbound => distance_km - step,
        };

        if next >= max {
            self.heading = Heading::Inbound;
            max
        } else if next <= 0.0 {
            self.heading = Heading::Outbound;
            0.0
        } else {
            next
        }
    }
}
