//! Named visual presets and the resolver that merges user overrides into
//! them.
//!
//! All defaulting and clamping happens here: a resolved [`VisualPreset`] has
//! every field set to an in-range value, so the engine, geometry builders
//! and effect registry never deal with partial configuration. Resolved
//! presets are immutable values; changing anything produces a new one.

use crate::constants::*;
use crate::geometry::{FractalKind, GeometryKind, SacredShape};
use crate::random::RandomizationSettings;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PresetError {
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FractalOptions {
    #[serde(rename = "type")]
    pub kind: FractalKind,
    pub iterations: u32,
    pub scale: f32,
    pub angle: f32,
    #[serde(default)]
    pub audio_reactivity: AudioReactivity,
}

impl FractalOptions {
    pub fn for_kind(kind: FractalKind, iterations: u32) -> Self {
        let rules = kind.rules();
        Self {
            kind,
            iterations,
            scale: rules.scale,
            angle: rules.angle,
            audio_reactivity: AudioReactivity::default(),
        }
    }

    /// Segment length handed to the turtle.
    pub fn effective_scale(&self) -> f32 {
        self.scale * self.audio_reactivity.scale_multiplier
    }

    /// Turn angle handed to the turtle.
    pub fn effective_angle(&self) -> f32 {
        self.angle * self.audio_reactivity.rotation_multiplier
    }
}

/// Multipliers on the L-system segment length and turn angle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioReactivity {
    pub scale_multiplier: f32,
    pub rotation_multiplier: f32,
}

impl Default for AudioReactivity {
    fn default() -> Self {
        Self {
            scale_multiplier: 1.0,
            rotation_multiplier: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedGeometryConfig {
    pub primary: SacredShape,
    pub secondary: SacredShape,
    pub blend_factor: f32,
    /// Distance along +Z between the primary and secondary layers.
    pub layer_offset: f32,
}

impl Default for MergedGeometryConfig {
    fn default() -> Self {
        Self {
            primary: SacredShape::Flower,
            secondary: SacredShape::Metatron,
            blend_factor: 0.5,
            layer_offset: 0.5,
        }
    }
}

/// A fully resolved visual configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualPreset {
    pub name: String,
    pub particle_count: u32,
    pub bloom_strength: f32,
    pub particle_size: f32,
    pub rotation_speed: f32,
    /// `0xRRGGBB` colors; one particle system per entry, in order.
    pub color_palette: Vec<u32>,
    /// Overlay shape; presets that name none get the neural web.
    pub geometry_type: GeometryKind,
    pub geometry_scale: f32,
    pub geometry_rotation: f32,
    pub pulse_intensity: f32,
    pub fractal_options: FractalOptions,
    pub merged_geometry_config: MergedGeometryConfig,
    pub camera_speed: f32,
    pub chromatic_aberration: f32,
    pub volumetric_intensity: f32,
    pub psychedelic_intensity: f32,
    pub reduced_motion: bool,
    pub performance_mode: bool,
    pub high_contrast: bool,
    pub randomization: RandomizationSettings,
}

impl VisualPreset {
    fn base(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            particle_count: 24_000,
            bloom_strength: 1.5,
            particle_size: 0.03,
            rotation_speed: 0.001,
            color_palette: vec![0x4444ff, 0xff4444, 0x44ff44],
            geometry_type: GeometryKind::Default,
            geometry_scale: 1.0,
            geometry_rotation: 0.0,
            pulse_intensity: 1.0,
            fractal_options: FractalOptions::for_kind(FractalKind::Dragon, 4),
            merged_geometry_config: MergedGeometryConfig::default(),
            camera_speed: 1.0,
            chromatic_aberration: 0.3,
            volumetric_intensity: 0.3,
            psychedelic_intensity: 0.5,
            reduced_motion: false,
            performance_mode: false,
            high_contrast: false,
            randomization: RandomizationSettings::default(),
        }
    }

    pub fn performance_multiplier(&self) -> f32 {
        if self.performance_mode {
            PERFORMANCE_PARTICLE_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Particles in each of the `color_palette.len()` systems.
    pub fn particles_per_system(&self) -> usize {
        if self.color_palette.is_empty() {
            return 0;
        }
        (self.particle_count as f32 * self.performance_multiplier()
            / self.color_palette.len() as f32)
            .floor() as usize
    }

    /// Animation damping for the reduced-motion accessibility switch.
    pub fn motion_scale(&self) -> f32 {
        if self.reduced_motion {
            REDUCED_MOTION_SCALE
        } else {
            1.0
        }
    }

    /// Animation damping under performance mode.
    pub fn performance_scale(&self) -> f32 {
        if self.performance_mode {
            PERFORMANCE_ANIMATION_SCALE
        } else {
            1.0
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FractalOverrides {
    #[serde(rename = "type")]
    pub kind: Option<FractalKind>,
    pub iterations: Option<i64>,
    pub scale: Option<f32>,
    pub angle: Option<f32>,
    pub audio_reactivity: Option<AudioReactivityOverrides>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioReactivityOverrides {
    pub scale_multiplier: Option<f32>,
    pub rotation_multiplier: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergedGeometryOverrides {
    pub primary: Option<SacredShape>,
    pub secondary: Option<SacredShape>,
    pub blend_factor: Option<f32>,
    pub layer_offset: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RandomizationOverrides {
    pub enable_particle_randomization: Option<bool>,
    pub enable_color_randomization: Option<bool>,
    pub enable_geometry_randomization: Option<bool>,
    pub random_seed: Option<u32>,
    pub intensity_factor: Option<f32>,
}

/// A partial preset as supplied by a UI collaborator. Unset fields keep the
/// value they had before the merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PresetOverrides {
    pub particle_count: Option<i64>,
    pub bloom_strength: Option<f32>,
    pub particle_size: Option<f32>,
    pub rotation_speed: Option<f32>,
    pub color_palette: Option<Vec<u32>>,
    pub geometry_type: Option<GeometryKind>,
    pub geometry_scale: Option<f32>,
    pub geometry_rotation: Option<f32>,
    pub pulse_intensity: Option<f32>,
    pub fractal_options: Option<FractalOverrides>,
    pub merged_geometry_config: Option<MergedGeometryOverrides>,
    pub camera_speed: Option<f32>,
    pub chromatic_aberration: Option<f32>,
    pub volumetric_intensity: Option<f32>,
    pub psychedelic_intensity: Option<f32>,
    pub reduced_motion: Option<bool>,
    pub performance_mode: Option<bool>,
    pub high_contrast: Option<bool>,
    pub randomization: Option<RandomizationOverrides>,
}

impl PresetOverrides {
    fn apply_to(&self, p: &mut VisualPreset) {
        if let Some(v) = self.particle_count {
            p.particle_count = v.clamp(PARTICLE_COUNT_MIN as i64, PARTICLE_COUNT_MAX as i64) as u32;
        }
        set_if(&mut p.bloom_strength, self.bloom_strength);
        set_if(&mut p.particle_size, self.particle_size);
        set_if(&mut p.rotation_speed, self.rotation_speed);
        if let Some(palette) = &self.color_palette {
            p.color_palette = palette.clone();
        }
        set_if(&mut p.geometry_type, self.geometry_type);
        set_if(&mut p.geometry_scale, self.geometry_scale);
        set_if(&mut p.geometry_rotation, self.geometry_rotation);
        set_if(&mut p.pulse_intensity, self.pulse_intensity);
        set_if(&mut p.camera_speed, self.camera_speed);
        set_if(&mut p.chromatic_aberration, self.chromatic_aberration);
        set_if(&mut p.volumetric_intensity, self.volumetric_intensity);
        set_if(&mut p.psychedelic_intensity, self.psychedelic_intensity);
        set_if(&mut p.reduced_motion, self.reduced_motion);
        set_if(&mut p.performance_mode, self.performance_mode);
        set_if(&mut p.high_contrast, self.high_contrast);

        if let Some(f) = &self.fractal_options {
            // A new grammar starts from its own turtle defaults.
            if let Some(kind) = f.kind {
                if kind != p.fractal_options.kind {
                    let rules = kind.rules();
                    p.fractal_options.kind = kind;
                    p.fractal_options.scale = rules.scale;
                    p.fractal_options.angle = rules.angle;
                }
            }
            if let Some(it) = f.iterations {
                p.fractal_options.iterations = it.clamp(0, FRACTAL_ITERATIONS_MAX as i64) as u32;
            }
            set_if(&mut p.fractal_options.scale, f.scale);
            set_if(&mut p.fractal_options.angle, f.angle);
            if let Some(a) = &f.audio_reactivity {
                let ar = &mut p.fractal_options.audio_reactivity;
                set_if(&mut ar.scale_multiplier, a.scale_multiplier);
                set_if(&mut ar.rotation_multiplier, a.rotation_multiplier);
            }
        }

        if let Some(m) = &self.merged_geometry_config {
            set_if(&mut p.merged_geometry_config.primary, m.primary);
            set_if(&mut p.merged_geometry_config.secondary, m.secondary);
            set_if(&mut p.merged_geometry_config.blend_factor, m.blend_factor);
            set_if(&mut p.merged_geometry_config.layer_offset, m.layer_offset);
        }

        if let Some(r) = &self.randomization {
            let s = &mut p.randomization;
            set_if(&mut s.enable_particle_randomization, r.enable_particle_randomization);
            set_if(&mut s.enable_color_randomization, r.enable_color_randomization);
            set_if(&mut s.enable_geometry_randomization, r.enable_geometry_randomization);
            if r.random_seed.is_some() {
                s.random_seed = r.random_seed;
            }
            set_if(&mut s.intensity_factor, r.intensity_factor);
        }
    }
}

#[inline]
fn set_if<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[inline]
fn clamp_finite(v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v.clamp(lo, hi)
    } else {
        fallback
    }
}

fn default_seed() -> u32 {
    rand::random()
}

/// Merges overrides into named presets and enforces the valid ranges.
pub struct PresetResolver {
    templates: FnvHashMap<&'static str, PresetOverrides>,
    order: Vec<&'static str>,
    seed_source: fn() -> u32,
}

impl Default for PresetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetResolver {
    /// Resolver over the built-in preset table.
    pub fn new() -> Self {
        let builtins = builtin_presets();
        let order = builtins.iter().map(|(name, _)| *name).collect();
        Self {
            templates: builtins.into_iter().collect(),
            order,
            seed_source: default_seed,
        }
    }

    /// Replace the entropy used for lazily assigned random seeds.
    pub fn with_seed_source(mut self, seed_source: fn() -> u32) -> Self {
        self.seed_source = seed_source;
        self
    }

    pub fn preset_names(&self) -> &[&'static str] {
        &self.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Resolve the named preset with `overrides` applied on top.
    pub fn resolve(
        &self,
        name: &str,
        overrides: &PresetOverrides,
    ) -> Result<VisualPreset, PresetError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| PresetError::UnknownPreset(name.to_owned()))?;
        let mut preset = VisualPreset::base(name);
        template.apply_to(&mut preset);
        Ok(self.finish(preset, overrides))
    }

    /// Apply `overrides` to an already resolved preset, producing a new one.
    ///
    /// Clamps are re-applied to the merged result, so switching performance
    /// mode on also clamps values chosen before the switch.
    pub fn update(&self, current: &VisualPreset, overrides: &PresetOverrides) -> VisualPreset {
        self.finish(current.clone(), overrides)
    }

    fn finish(&self, mut preset: VisualPreset, overrides: &PresetOverrides) -> VisualPreset {
        overrides.apply_to(&mut preset);
        self.sanitize(&mut preset);
        preset
    }

    fn sanitize(&self, p: &mut VisualPreset) {
        p.particle_count = p.particle_count.clamp(PARTICLE_COUNT_MIN, PARTICLE_COUNT_MAX);
        p.bloom_strength = clamp_finite(p.bloom_strength, 0.0, BLOOM_MAX, 1.5);
        p.particle_size = clamp_finite(p.particle_size, PARTICLE_SIZE_MIN, PARTICLE_SIZE_MAX, 0.03);
        p.rotation_speed = clamp_finite(p.rotation_speed, -1.0, 1.0, 0.001);
        for c in &mut p.color_palette {
            *c &= 0x00FF_FFFF;
        }
        p.geometry_scale = clamp_finite(p.geometry_scale, 0.0, 100.0, 1.0);
        p.geometry_rotation = clamp_finite(p.geometry_rotation, -1.0, 1.0, 0.0);
        p.pulse_intensity = clamp_finite(p.pulse_intensity, 0.0, 10.0, 1.0);
        p.camera_speed = clamp_finite(p.camera_speed, 0.0, 10.0, 1.0);
        p.chromatic_aberration = clamp_finite(p.chromatic_aberration, 0.0, 2.0, 0.3);
        p.volumetric_intensity = clamp_finite(p.volumetric_intensity, 0.0, 2.0, 0.3);
        p.psychedelic_intensity = clamp_finite(p.psychedelic_intensity, 0.0, 2.0, 0.5);

        let f = &mut p.fractal_options;
        f.iterations = f.iterations.min(FRACTAL_ITERATIONS_MAX);
        let defaults = f.kind.rules();
        f.scale = clamp_finite(f.scale, 0.0, 100.0, defaults.scale);
        f.angle = clamp_finite(f.angle, -2.0 * PI, 2.0 * PI, defaults.angle);
        let ar = &mut f.audio_reactivity;
        ar.scale_multiplier = clamp_finite(ar.scale_multiplier, 0.0, 10.0, 1.0);
        ar.rotation_multiplier = clamp_finite(ar.rotation_multiplier, -10.0, 10.0, 1.0);

        let m = &mut p.merged_geometry_config;
        m.blend_factor = clamp_finite(m.blend_factor, 0.0, 1.0, 0.5);
        m.layer_offset = clamp_finite(m.layer_offset, -100.0, 100.0, 0.5);

        let r = &mut p.randomization;
        r.intensity_factor = clamp_finite(r.intensity_factor, 0.0, 1.0, DEFAULT_RANDOM_INTENSITY);
        if r.any_enabled() && r.random_seed.is_none() {
            let seed = (self.seed_source)();
            log::info!("[preset] randomization enabled, assigned seed {}", seed);
            r.random_seed = Some(seed);
        }

        if p.performance_mode {
            p.particle_count = p.particle_count.min(PERFORMANCE_MAX_PARTICLES);
            p.bloom_strength = p.bloom_strength.min(PERFORMANCE_MAX_BLOOM);
            p.fractal_options.iterations =
                p.fractal_options.iterations.min(PERFORMANCE_MAX_FRACTAL_ITERATIONS);
        }
    }
}

fn template(
    particle_count: i64,
    bloom_strength: f32,
    particle_size: f32,
    rotation_speed: f32,
    color_palette: [u32; 3],
) -> PresetOverrides {
    PresetOverrides {
        particle_count: Some(particle_count),
        bloom_strength: Some(bloom_strength),
        particle_size: Some(particle_size),
        rotation_speed: Some(rotation_speed),
        color_palette: Some(color_palette.to_vec()),
        ..Default::default()
    }
}

fn sacred(
    mut base: PresetOverrides,
    kind: GeometryKind,
    scale: f32,
    rotation: f32,
    pulse: f32,
) -> PresetOverrides {
    base.geometry_type = Some(kind);
    base.geometry_scale = Some(scale);
    base.geometry_rotation = Some(rotation);
    base.pulse_intensity = Some(pulse);
    base
}

fn builtin_presets() -> Vec<(&'static str, PresetOverrides)> {
    let golden = 1.618;
    vec![
        (
            "default",
            template(24_000, 1.5, 0.03, 0.001, [0x4444ff, 0xff4444, 0x44ff44]),
        ),
        (
            "cosmic",
            template(40_000, 2.0, 0.02, 0.002, [0xff00ff, 0x00ffff, 0xffff00]),
        ),
        (
            "vortex",
            template(30_000, 1.8, 0.025, 0.003, [0xff8800, 0x0088ff, 0xff0088]),
        ),
        (
            "sacredFlower",
            sacred(
                template(45_000, 2.2, 0.035, 0.0018, [0xffd700, 0x9932cc, 0x00ffff]),
                GeometryKind::Flower,
                golden,
                0.001,
                0.8,
            ),
        ),
        (
            "metatron",
            sacred(
                template(50_000, 2.5, 0.03, 0.002, [0xff1493, 0x4169e1, 0x32cd32]),
                GeometryKind::Metatron,
                1.2,
                0.0015,
                1.0,
            ),
        ),
        (
            "psychedelic",
            sacred(
                template(60_000, 2.8, 0.04, 0.003, [0xff66cc, 0x66ffcc, 0xcc66ff]),
                GeometryKind::Spiral,
                golden,
                0.002,
                1.2,
            ),
        ),
        ("fractalDragon", {
            let mut p = sacred(
                template(55_000, 2.6, 0.035, 0.0025, [0xff3366, 0x33ff66, 0x6633ff]),
                GeometryKind::Fractal,
                1.5,
                0.002,
                1.1,
            );
            p.fractal_options = Some(FractalOverrides {
                kind: Some(FractalKind::Dragon),
                iterations: Some(12),
                scale: Some(0.5),
                angle: Some(PI / 2.0),
                ..Default::default()
            });
            p
        }),
        ("mergedSacred", {
            let mut p = sacred(
                template(65_000, 2.8, 0.035, 0.002, [0x9400d3, 0x4b0082, 0x0000ff]),
                GeometryKind::MergedSacred,
                1.5,
                0.0015,
                1.2,
            );
            p.merged_geometry_config = Some(MergedGeometryOverrides {
                primary: Some(SacredShape::Metatron),
                secondary: Some(SacredShape::Flower),
                blend_factor: Some(0.6),
                layer_offset: Some(0.5),
            });
            p
        }),
        (
            "hyperbolicWeb",
            sacred(
                template(70_000, 3.0, 0.03, 0.0025, [0x00ff00, 0x00ffff, 0xff00ff]),
                GeometryKind::Hyperbolic,
                1.8,
                0.002,
                1.4,
            ),
        ),
    ]
}
