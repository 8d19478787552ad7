//! Traffic lights

use rand::Rng;

use smartcab_core::{Heading, Light};

/// Signal at a single intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficLight {
    /// North-south traffic has green when true, east-west otherwise
    north_south_green: bool,
    /// Ticks between flips
    period: u32,
    last_flip: u32,
}

impl TrafficLight {
    pub const PERIODS: [u32; 3] = [3, 4, 5];

    pub fn new(north_south_green: bool, period: u32) -> Self {
        Self {
            north_south_green,
            period: period.max(1),
            last_flip: 0,
        }
    }

    /// Random phase and period
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let period = Self::PERIODS[rng.gen_range(0..Self::PERIODS.len())];
        Self::new(rng.gen_bool(0.5), period)
    }

    /// Flip once `period` ticks have passed since the last flip
    pub fn update(&mut self, t: u32) {
        if t.saturating_sub(self.last_flip) >= self.period {
            self.north_south_green = !self.north_south_green;
            self.last_flip = t;
        }
    }

    /// Signal as seen by traffic travelling along `heading`
    pub fn signal_for(&self, heading: Heading) -> Light {
        if self.north_south_green == heading.is_north_south() {
            Light::Green
        } else {
            Light::Red
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }
}
