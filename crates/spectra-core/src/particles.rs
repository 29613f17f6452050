//! Audio-driven particle systems and the sacred-geometry overlay.
//!
//! The engine owns one [`ParticleSystem`] per palette color. Activating a
//! preset disposes the previous generation before building the next, and
//! every per-frame update after [`ParticleSystemEngine::shutdown`] is a no-op.

use crate::constants::*;
use crate::geometry::{build_overlay, GeometryBuffer, GeometryKind};
use crate::preset::VisualPreset;
use crate::random::Randomizer;
use crate::spectrum::{Band, FrequencyBands};
use glam::{EulerRot, Quat, Vec3};
use rand::prelude::*;
use std::f32::consts::{PI, TAU};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Active,
    Disposed,
}

/// The band that drives the system at `index` in palette order.
pub fn band_for_system(index: usize) -> Band {
    match index {
        0 => Band::SubBass,
        1 => Band::Bass,
        _ => Band::Mid,
    }
}

/// Split a `0xRRGGBB` color into normalized channels.
pub fn rgb_from_hex(color: u32) -> [f32; 3] {
    [
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
    ]
}

/// HSL to RGB with all components in \[0, 1\].
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s <= 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

/// One palette color's worth of particles.
///
/// All buffers are flat `f32` arrays, three floats per particle (one for the
/// orbit parameters). Trails are particle-major: particle `p`'s slot `s`
/// lives at `(p * TRAIL_LENGTH + s) * 3`, slot 0 being the newest.
#[derive(Clone, Debug)]
pub struct ParticleSystem {
    index: usize,
    color: u32,
    band: Band,
    positions: Vec<f32>,
    velocities: Vec<f32>,
    orbit_radius: Vec<f32>,
    orbit_speed: Vec<f32>,
    orbit_phase: Vec<f32>,
    initial_positions: Vec<f32>,
    trails: Vec<f32>,
    rotation: Vec3,
    state: Lifecycle,
}

impl ParticleSystem {
    fn spawn(
        index: usize,
        color: u32,
        count: usize,
        rng: &mut StdRng,
        randomizer: &mut Randomizer,
    ) -> Self {
        let mut system = Self {
            index,
            color,
            band: band_for_system(index),
            positions: Vec::with_capacity(count * 3),
            velocities: Vec::with_capacity(count * 3),
            orbit_radius: Vec::with_capacity(count),
            orbit_speed: Vec::with_capacity(count),
            orbit_phase: Vec::with_capacity(count),
            initial_positions: Vec::new(),
            trails: Vec::with_capacity(count * TRAIL_LENGTH * 3),
            rotation: Vec3::ZERO,
            state: Lifecycle::Uninitialized,
        };

        for _ in 0..count {
            let radius = rng.gen::<f32>() * SPAWN_RADIUS;
            let theta = rng.gen::<f32>() * TAU;
            let phi = rng.gen::<f32>() * PI;
            let spawn = Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            );
            let spawn = randomizer.jitter_position(spawn, SPAWN_JITTER_OFFSET);
            system.positions.extend_from_slice(&spawn.to_array());
            for _ in 0..3 {
                system
                    .velocities
                    .push(rng.gen_range(-VELOCITY_JITTER..=VELOCITY_JITTER));
            }
            system
                .orbit_radius
                .push(rng.gen_range(ORBIT_RADIUS_MIN..=ORBIT_RADIUS_MAX));
            system
                .orbit_speed
                .push(rng.gen_range(ORBIT_SPEED_MIN..=ORBIT_SPEED_MAX));
            system.orbit_phase.push(rng.gen::<f32>() * TAU);
            for _ in 0..TRAIL_LENGTH {
                system.trails.extend_from_slice(&spawn.to_array());
            }
        }
        system.initial_positions = system.positions.clone();
        system.state = Lifecycle::Active;
        system
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    pub fn initial_positions(&self) -> &[f32] {
        &self.initial_positions
    }

    pub fn trails(&self) -> &[f32] {
        &self.trails
    }

    pub fn orbit_radius(&self) -> &[f32] {
        &self.orbit_radius
    }

    pub fn orbit_speed(&self) -> &[f32] {
        &self.orbit_speed
    }

    pub fn orbit_phase(&self) -> &[f32] {
        &self.orbit_phase
    }

    pub fn position(&self, p: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[p * 3..p * 3 + 3])
    }

    pub fn initial_position(&self, p: usize) -> Vec3 {
        Vec3::from_slice(&self.initial_positions[p * 3..p * 3 + 3])
    }

    pub fn trail_point(&self, p: usize, slot: usize) -> Vec3 {
        let o = (p * TRAIL_LENGTH + slot) * 3;
        Vec3::from_slice(&self.trails[o..o + 3])
    }

    /// Accumulated Euler rotation (radians) of the whole system.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Advance every particle by one frame. No-op unless active.
    pub fn step(&mut self, time: f32, level: f32, rotation_speed: f32) {
        if self.state != Lifecycle::Active {
            return;
        }
        for p in 0..self.len() {
            let o = p * 3;
            let angle = time * self.orbit_speed[p] + self.orbit_phase[p];
            let orbit = self.orbit_radius[p] * level;
            let velocity = Vec3::from_slice(&self.velocities[o..o + 3]);
            let mut pos = Vec3::from_slice(&self.positions[o..o + 3]);
            pos += velocity * level * VELOCITY_BAND_GAIN
                + Vec3::new(angle.cos() * orbit, angle.sin() * orbit, 0.0);

            let t = p * TRAIL_LENGTH * 3;
            self.trails
                .copy_within(t..t + (TRAIL_LENGTH - 1) * 3, t + 3);
            self.trails[t..t + 3].copy_from_slice(&pos.to_array());

            if pos.length() > RESPAWN_RADIUS {
                self.positions[o..o + 3].copy_from_slice(&self.initial_positions[o..o + 3]);
            } else {
                self.positions[o..o + 3].copy_from_slice(&pos.to_array());
            }
        }
        let k = (self.index + 1) as f32;
        self.rotation.y += rotation_speed * k;
        self.rotation.x += rotation_speed * 0.5 * k;
    }

    fn dispose(&mut self) {
        self.positions = Vec::new();
        self.velocities = Vec::new();
        self.orbit_radius = Vec::new();
        self.orbit_speed = Vec::new();
        self.orbit_phase = Vec::new();
        self.initial_positions = Vec::new();
        self.trails = Vec::new();
        self.state = Lifecycle::Disposed;
    }
}

/// The preset's overlay mesh plus its animated transform and material.
#[derive(Clone, Debug)]
pub struct SacredOverlay {
    pub kind: GeometryKind,
    pub buffer: GeometryBuffer,
    /// Accumulated Euler rotation in radians.
    pub rotation: Vec3,
    pub scale: f32,
    pub color_rgb: [f32; 3],
    pub opacity: f32,
}

impl SacredOverlay {
    fn new(kind: GeometryKind, buffer: GeometryBuffer) -> Self {
        Self {
            kind,
            buffer,
            rotation: Vec3::ZERO,
            scale: 1.0,
            color_rgb: hsl_to_rgb(0.0, OVERLAY_SATURATION, OVERLAY_LIGHTNESS),
            opacity: OVERLAY_BASE_OPACITY,
        }
    }

    pub fn update(&mut self, time: f32, bands: &FrequencyBands, preset: &VisualPreset) {
        let driver = OVERLAY_DRIVER_SYSTEM;
        let hue = (time * OVERLAY_HUE_RATE + driver as f32 * OVERLAY_HUE_SYSTEM_STEP).rem_euclid(1.0);
        self.color_rgb = hsl_to_rgb(hue, OVERLAY_SATURATION, OVERLAY_LIGHTNESS);

        let motion = preset.motion_scale();
        let perf = preset.performance_scale();
        self.rotation.y += preset.rotation_speed * motion * perf;
        self.rotation.z += preset.geometry_rotation * motion * perf;

        let level = bands.get(band_for_system(driver));
        if self.kind == GeometryKind::Default && level > EXPANSION_THRESHOLD {
            self.scale = 1.0 + (bands.sub_bass * 0.6 + bands.bass * 0.4) * motion * perf;
            self.rotation.z += (bands.lower_mid + bands.mid) * EXPANSION_TWIST_GAIN * motion;
            let (base, range) = if preset.reduced_motion {
                (0.5, 0.3)
            } else {
                (0.3, 0.7)
            };
            self.opacity = base + level * range * perf;
        } else {
            self.scale = 1.0 + level * OVERLAY_PULSE_GAIN * motion * perf;
            self.opacity = OVERLAY_BASE_OPACITY;
        }
    }
}

pub struct ParticleSystemEngine {
    seed: u64,
    systems: Vec<ParticleSystem>,
    overlay: Option<SacredOverlay>,
    generation: u64,
    state: Lifecycle,
}

impl ParticleSystemEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            systems: Vec::new(),
            overlay: None,
            generation: 0,
            state: Lifecycle::Uninitialized,
        }
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Incremented every time a preset is activated.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn systems(&self) -> &[ParticleSystem] {
        &self.systems
    }

    pub fn overlay(&self) -> Option<&SacredOverlay> {
        self.overlay.as_ref()
    }

    pub fn particle_count(&self) -> usize {
        self.systems.iter().map(ParticleSystem::len).sum()
    }

    /// Replace the live generation with one built from `preset`.
    pub fn activate(&mut self, preset: &VisualPreset) {
        if self.state == Lifecycle::Disposed {
            log::warn!("[particles] activate after shutdown ignored ({})", preset.name);
            return;
        }
        self.dispose_generation();

        let per_system = preset.particles_per_system();
        let mut randomizer = Randomizer::new(preset.randomization.clone());
        let seed = self.seed;
        self.systems = preset
            .color_palette
            .iter()
            .enumerate()
            .map(|(i, &color)| {
                // Derive per-system RNGs from the engine seed so systems are independent
                let mix = seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                let mut rng = StdRng::seed_from_u64(mix);
                let color = randomizer.jitter_color(color);
                ParticleSystem::spawn(i, color, per_system, &mut rng, &mut randomizer)
            })
            .collect();
        let buffer = build_overlay(preset, &mut randomizer);
        self.overlay = Some(SacredOverlay::new(preset.geometry_type, buffer));

        self.generation += 1;
        self.state = Lifecycle::Active;
        log::info!(
            "[particles] activated '{}' (generation {}): {} systems x {} particles",
            preset.name,
            self.generation,
            self.systems.len(),
            per_system
        );
    }

    /// Advance all systems and the overlay by one frame.
    pub fn update(&mut self, time: f32, bands: &FrequencyBands, preset: &VisualPreset) {
        if self.state != Lifecycle::Active {
            return;
        }
        for system in &mut self.systems {
            let level = bands.get(system.band);
            system.step(time, level, preset.rotation_speed);
        }
        if let Some(overlay) = &mut self.overlay {
            overlay.update(time, bands, preset);
        }
    }

    /// Release every buffer. Later activations and updates are ignored.
    pub fn shutdown(&mut self) {
        if self.state == Lifecycle::Disposed {
            return;
        }
        self.dispose_generation();
        self.state = Lifecycle::Disposed;
        log::info!("[particles] engine shut down");
    }

    fn dispose_generation(&mut self) {
        if self.systems.is_empty() && self.overlay.is_none() {
            return;
        }
        for system in &mut self.systems {
            system.dispose();
        }
        log::debug!(
            "[particles] disposed generation {} ({} systems)",
            self.generation,
            self.systems.len()
        );
        self.systems.clear();
        self.overlay = None;
    }
}
