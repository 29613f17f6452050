//! Reproducible randomness for user-facing "random seed" presets.
//!
//! `SeededRandom` is a mulberry32 generator: a single 32-bit state advanced
//! by a fixed increment and mixed into the output. The same seed always
//! yields the same sequence, which is what lets a shared seed reproduce a
//! randomized preset exactly.

use glam::Vec3;
use serde::{Deserialize, Serialize};

const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Advance `state` once, returning a value in \[0, 1) and the new state.
pub fn next(state: u32) -> (f64, u32) {
    let state = state.wrapping_add(MULBERRY_INCREMENT);
    let mut t = state;
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    let out = t ^ (t >> 14);
    (out as f64 / TWO_POW_32, state)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Next value in \[0, 1).
    pub fn next_f64(&mut self) -> f64 {
        let (value, state) = next(self.state);
        self.state = state;
        value
    }

    pub fn uniform(&mut self, min: f32, max: f32) -> f32 {
        let t = self.next_f64();
        (min as f64 + t * (max as f64 - min as f64)) as f32
    }
}

/// Which randomized perturbations are active and how strong they are.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizationSettings {
    pub enable_particle_randomization: bool,
    pub enable_color_randomization: bool,
    pub enable_geometry_randomization: bool,
    /// Assigned by the preset resolver the first time any flag is enabled.
    pub random_seed: Option<u32>,
    /// Uniform scale on every perturbation, in \[0, 1\].
    pub intensity_factor: f32,
}

impl Default for RandomizationSettings {
    fn default() -> Self {
        Self {
            enable_particle_randomization: false,
            enable_color_randomization: false,
            enable_geometry_randomization: false,
            random_seed: None,
            intensity_factor: crate::constants::DEFAULT_RANDOM_INTENSITY,
        }
    }
}

impl RandomizationSettings {
    pub fn any_enabled(&self) -> bool {
        self.enable_particle_randomization
            || self.enable_color_randomization
            || self.enable_geometry_randomization
    }
}

/// Applies the enabled perturbations from one shared [`SeededRandom`].
///
/// Disabled perturbations pass their input through untouched and do not
/// consume any random draws, so toggling one flag never shifts the values
/// another flag produces for the same call order.
#[derive(Clone, Debug)]
pub struct Randomizer {
    settings: RandomizationSettings,
    rng: SeededRandom,
}

impl Randomizer {
    pub fn new(settings: RandomizationSettings) -> Self {
        let rng = SeededRandom::new(settings.random_seed.unwrap_or(0));
        Self { settings, rng }
    }

    pub fn settings(&self) -> &RandomizationSettings {
        &self.settings
    }

    /// Perturb each RGB channel of a `0xRRGGBB` color by up to ±30·intensity.
    pub fn jitter_color(&mut self, base: u32) -> u32 {
        if !self.settings.enable_color_randomization {
            return base;
        }
        let variation = self.settings.intensity_factor * 30.0;
        let mut out = 0u32;
        for shift in [16u32, 8, 0] {
            let channel = ((base >> shift) & 0xFF) as f32;
            let jittered = (channel + self.rng.uniform(-variation, variation)).clamp(0.0, 255.0);
            out |= (jittered as u32) << shift;
        }
        out
    }

    /// Offset each axis by up to ±max_offset·intensity.
    pub fn jitter_position(&mut self, base: Vec3, max_offset: f32) -> Vec3 {
        if !self.settings.enable_particle_randomization {
            return base;
        }
        let offset = max_offset * self.settings.intensity_factor;
        Vec3::new(
            base.x + self.rng.uniform(-offset, offset),
            base.y + self.rng.uniform(-offset, offset),
            base.z + self.rng.uniform(-offset, offset),
        )
    }

    /// Scale by a factor within ±20%·intensity.
    pub fn jitter_scale(&mut self, base: f32) -> f32 {
        if !self.settings.enable_geometry_randomization {
            return base;
        }
        let variation = 0.2 * self.settings.intensity_factor;
        base * (1.0 + self.rng.uniform(-variation, variation))
    }
}
